//! Allocation churn against a small arena: live views never overlap, their
//! contents survive growth and neighbour frees, and freeing everything
//! returns the arena to an empty state.

use roarheap_arena::{Arena, ArenaConfig, ArenaError, TypedView};

use proptest::prelude::*;

fn small_arena() -> Arena {
    Arena::new(
        ArenaConfig::new()
            .with_initial_bytes(128)
            .with_max_bytes(1 << 20),
    )
    .unwrap()
}

fn ranges_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.0 + b.1 && b.0 < a.0 + a.1
}

#[test]
fn interleaved_free_and_alloc_keeps_contents() {
    let mut arena = small_arena();
    let mut views = Vec::new();
    for i in 0..32u32 {
        let view = TypedView::from_slice(&mut arena, &[i; 5]).unwrap();
        views.push((i, view));
    }
    // Free every other view, then allocate into the holes.
    let mut kept = Vec::new();
    for (i, view) in views {
        if i % 2 == 0 {
            view.dispose(&mut arena).unwrap();
        } else {
            kept.push((i, view));
        }
    }
    for i in 100..116u32 {
        kept.push((i, TypedView::from_slice(&mut arena, &[i; 5]).unwrap()));
    }
    for (i, view) in &kept {
        assert_eq!(view.to_vec(&arena).unwrap(), vec![*i; 5]);
    }
    for (_, view) in kept {
        view.dispose(&mut arena).unwrap();
    }
    assert_eq!(arena.live_allocations(), 0);
    assert_eq!(arena.used_bytes(), 0);
}

#[test]
fn exhausting_the_ceiling_then_recovering() {
    let mut arena = Arena::new(
        ArenaConfig::new()
            .with_initial_bytes(64)
            .with_max_bytes(256),
    )
    .unwrap();
    let big = TypedView::<u8>::with_len(&mut arena, 200).unwrap();
    let err = TypedView::<u8>::with_len(&mut arena, 100).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, ArenaError::OutOfMemory { .. }));

    big.dispose(&mut arena).unwrap();
    let retry = TypedView::<u8>::with_len(&mut arena, 100).unwrap();
    assert_eq!(retry.len(), 100);
}

proptest! {
    #[test]
    fn live_views_never_overlap(
        ops in proptest::collection::vec((0usize..64, any::<bool>()), 1..80),
    ) {
        let mut arena = small_arena();
        let mut live: Vec<TypedView<u32>> = Vec::new();
        for (len, free_first) in ops {
            if free_first && !live.is_empty() {
                let victim = live.swap_remove(len % live.len());
                victim.dispose(&mut arena).unwrap();
            }
            let view = TypedView::<u32>::with_len(&mut arena, len).unwrap();
            view.fill(&mut arena, len as u32).unwrap();
            live.push(view);
        }

        for (i, a) in live.iter().enumerate() {
            prop_assert_eq!(a.to_vec(&arena).unwrap(), vec![a.len() as u32; a.len()]);
            for b in &live[i + 1..] {
                if a.is_empty() || b.is_empty() {
                    continue;
                }
                prop_assert!(!ranges_overlap(
                    (a.byte_offset(), a.byte_len()),
                    (b.byte_offset(), b.byte_len()),
                ));
            }
            prop_assert!(a.byte_offset() + a.byte_len() <= arena.size());
        }

        for view in live {
            view.dispose(&mut arena).unwrap();
        }
        prop_assert_eq!(arena.used_bytes(), 0);
    }
}
