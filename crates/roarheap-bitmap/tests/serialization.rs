//! Wire-format behaviour through the handle API: canonical encodings,
//! round trips in both formats and modes, the size invariant, and rollback
//! of failed decodes and serializations.

use roarheap_arena::{ArenaConfig, TypedView};
use roarheap_bitmap::{BitmapError, BitmapHandle, BitmapHeap, DecodeMode, Format};
use roarheap_test_utils::fixtures::{dense_block, strided, ROUND_TRIP_VALUES, SCENARIO_VALUES};
use roarheap_test_utils::{init_tracing, park_miller_values, sorted_distinct, PARK_MILLER_SEED};

use proptest::prelude::*;

const FORMATS: [Format; 2] = [Format::Portable, Format::Native];
const MODES: [DecodeMode; 2] = [DecodeMode::Copy, DecodeMode::Frozen];

fn heap() -> BitmapHeap {
    BitmapHeap::new(ArenaConfig::new().with_initial_bytes(4096)).unwrap()
}

fn round_trip(heap: &mut BitmapHeap, values: &[u32], format: Format, mode: DecodeMode) -> Vec<u32> {
    let source = BitmapHandle::from_values(heap, values.iter().copied());
    let bytes = source.serialize(heap, format).unwrap();
    let decoded = BitmapHandle::deserialize(heap, &bytes, format, mode).unwrap();
    let out = decoded.to_vec(heap).unwrap();
    decoded.dispose(heap).unwrap();
    bytes.dispose(heap.arena_mut()).unwrap();
    source.dispose(heap).unwrap();
    out
}

#[test]
fn empty_bitmap_canonical_bytes() {
    let mut heap = heap();
    let empty = BitmapHandle::empty(&mut heap);

    assert_eq!(empty.serialization_size(&heap, Format::Native).unwrap(), 5);
    let native = empty.serialize(&mut heap, Format::Native).unwrap();
    assert_eq!(native.to_vec(heap.arena()).unwrap(), vec![1, 0, 0, 0, 0]);

    assert_eq!(empty.serialization_size(&heap, Format::Portable).unwrap(), 8);
    let portable = empty.serialize(&mut heap, Format::Portable).unwrap();
    assert_eq!(
        portable.to_vec(heap.arena()).unwrap(),
        vec![0x3A, 0x30, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn three_empty_inputs_decode_to_empty() {
    let mut heap = heap();
    let inputs: [&[u8]; 3] = [&[], &[1, 0, 0, 0, 0], &[0x3A, 0x30, 0, 0, 0, 0, 0, 0]];
    let formats = [None, Some(Format::Native), Some(Format::Portable)];

    for (input, only) in inputs.into_iter().zip(formats) {
        let view = TypedView::from_slice(heap.arena_mut(), input).unwrap();
        for format in FORMATS {
            if only.is_some_and(|f| f != format) {
                continue;
            }
            for mode in MODES {
                let h = BitmapHandle::deserialize(&mut heap, &view, format, mode).unwrap();
                assert_eq!(h.cardinality(&heap).unwrap(), 0, "{input:?} {format:?} {mode:?}");
                assert!(h.is_empty(&heap).unwrap());
                h.dispose(&mut heap).unwrap();
            }
        }
        view.dispose(heap.arena_mut()).unwrap();
    }
}

#[test]
fn round_trips_in_every_format_and_mode() {
    init_tracing();
    let mut heap = heap();
    let mut big = dense_block(3, 10_000);
    big.extend(strided(200_000, 7));
    big.extend(ROUND_TRIP_VALUES);

    for values in [&ROUND_TRIP_VALUES[..], &SCENARIO_VALUES[..], &big[..]] {
        let expected = sorted_distinct(values);
        for format in FORMATS {
            for mode in MODES {
                assert_eq!(round_trip(&mut heap, values, format, mode), expected);
            }
        }
    }
    assert_eq!(heap.live_bitmaps(), 0);
    assert_eq!(heap.arena().live_allocations(), 0);
}

#[test]
fn slices_round_trip_without_the_arena() {
    let mut heap = heap();
    let values = park_miller_values(5_000, 0xff_ffff, PARK_MILLER_SEED);
    let source = BitmapHandle::from_values(&mut heap, values.iter().copied());
    for format in FORMATS {
        let bytes = source.serialize_to_vec(&heap, format).unwrap();
        assert_eq!(bytes.len(), source.serialization_size(&heap, format).unwrap());
        let copy = BitmapHandle::deserialize_slice(&mut heap, &bytes, format).unwrap();
        assert_eq!(copy.to_vec(&heap).unwrap(), sorted_distinct(&values));
    }
}

#[test]
fn scenario_size_invariant_survives_optimize() {
    let mut heap = heap();
    let h = BitmapHandle::from_values(&mut heap, SCENARIO_VALUES);
    let check = |heap: &mut BitmapHeap| {
        for format in FORMATS {
            let size = h.serialization_size(heap, format).unwrap();
            let bytes = h.serialize(heap, format).unwrap();
            assert_eq!(bytes.len(), size, "{format:?}");
            bytes.dispose(heap.arena_mut()).unwrap();
        }
    };
    check(&mut heap);
    h.optimize(&mut heap).unwrap();
    check(&mut heap);
    assert_eq!(h.to_vec(&heap).unwrap(), SCENARIO_VALUES.to_vec());
}

#[test]
fn optimize_is_idempotent() {
    let mut heap = heap();
    let mut values: Vec<u32> = (0..50_000).collect();
    values.extend(strided(1 << 24, 4099));
    let h = BitmapHandle::from_values(&mut heap, values.iter().copied());

    h.optimize(&mut heap).unwrap();
    let sizes: Vec<usize> = FORMATS
        .iter()
        .map(|&f| h.serialization_size(&heap, f).unwrap())
        .collect();
    assert!(!h.optimize(&mut heap).unwrap());
    let again: Vec<usize> = FORMATS
        .iter()
        .map(|&f| h.serialization_size(&heap, f).unwrap())
        .collect();
    assert_eq!(sizes, again);
    assert_eq!(h.cardinality(&heap).unwrap(), sorted_distinct(&values).len() as u64);
}

#[test]
fn corrupt_inputs_are_rejected_without_leaks() {
    let mut heap = heap();
    let keep = BitmapHandle::from_values(&mut heap, [1, 2, 3]);
    let good = keep.serialize_to_vec(&heap, Format::Portable).unwrap();

    let cases: Vec<(Vec<u8>, Format)> = vec![
        (vec![9, 0, 0, 0, 0], Format::Native),
        (vec![1, 0, 0], Format::Native),
        (vec![1, 4, 0, 0, 0, 1, 0, 0, 0], Format::Native),
        (vec![2, 0x3A, 0x30], Format::Native),
        (vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0], Format::Portable),
        (good[..good.len() - 1].to_vec(), Format::Portable),
        (good[..10].to_vec(), Format::Portable),
    ];

    for (bytes, format) in cases {
        let view = TypedView::from_slice(heap.arena_mut(), &bytes).unwrap();
        let allocations = heap.arena().live_allocations();
        let used = heap.arena().used_bytes();
        let bitmaps = heap.live_bitmaps();

        for mode in MODES {
            let err = BitmapHandle::deserialize(&mut heap, &view, format, mode).unwrap_err();
            assert!(
                matches!(err, BitmapError::CorruptData { .. }),
                "{bytes:?} {format:?} {mode:?}: {err}"
            );
            assert_eq!(heap.arena().live_allocations(), allocations);
            assert_eq!(heap.arena().used_bytes(), used);
            assert_eq!(heap.live_bitmaps(), bitmaps);
        }
        assert!(BitmapHandle::deserialize_slice(&mut heap, &bytes, format).is_err());
        view.dispose(heap.arena_mut()).unwrap();
    }
    assert_eq!(keep.to_vec(&heap).unwrap(), vec![1, 2, 3]);
}

#[test]
fn failed_serialization_releases_its_buffer() {
    let mut heap: BitmapHeap = BitmapHeap::new(
        ArenaConfig::new()
            .with_initial_bytes(64)
            .with_max_bytes(12_288),
    )
    .unwrap();
    // The portable encoding needs 8208 bytes; leave less than that free.
    let filler = TypedView::<u8>::with_len(heap.arena_mut(), 6_000).unwrap();
    let h = BitmapHandle::from_values(&mut heap, dense_block(0, 20_000));
    let allocations = heap.arena().live_allocations();
    let used = heap.arena().used_bytes();

    let err = h.serialize(&mut heap, Format::Portable).unwrap_err();
    assert!(matches!(err, BitmapError::Arena(ref e) if e.is_retryable()));
    assert_eq!(heap.arena().live_allocations(), allocations);
    assert_eq!(heap.arena().used_bytes(), used);
    assert_eq!(h.cardinality(&heap).unwrap(), 20_000);

    filler.dispose(heap.arena_mut()).unwrap();
    let bytes = h.serialize(&mut heap, Format::Portable).unwrap();
    assert_eq!(bytes.len(), 8_208);
}

#[test]
fn disposed_buffer_cannot_be_decoded() {
    let mut heap = heap();
    let h = BitmapHandle::from_values(&mut heap, [5]);
    let bytes = h.serialize(&mut heap, Format::Native).unwrap();
    bytes.dispose(heap.arena_mut()).unwrap();
    for mode in MODES {
        let err = BitmapHandle::deserialize(&mut heap, &bytes, Format::Native, mode).unwrap_err();
        assert!(err.is_use_after_dispose());
    }
    assert_eq!(heap.live_bitmaps(), 1);
}

proptest! {
    #[test]
    fn size_invariant_holds_for_random_sets(
        values in proptest::collection::vec(any::<u32>(), 0..400),
        block in proptest::option::of(0u16..8),
        optimize in any::<bool>(),
    ) {
        let mut heap = heap();
        let mut all = values;
        if let Some(key) = block {
            all.extend(dense_block(key, 5_000));
        }
        let h = BitmapHandle::from_values(&mut heap, all.iter().copied());
        if optimize {
            h.optimize(&mut heap).unwrap();
        }
        for format in FORMATS {
            let size = h.serialization_size(&heap, format).unwrap();
            let bytes = h.serialize(&mut heap, format).unwrap();
            prop_assert_eq!(bytes.len(), size);
            for mode in MODES {
                let back = BitmapHandle::deserialize(&mut heap, &bytes, format, mode).unwrap();
                prop_assert_eq!(back.to_vec(&heap).unwrap(), sorted_distinct(&all));
                back.dispose(&mut heap).unwrap();
            }
            bytes.dispose(heap.arena_mut()).unwrap();
        }
    }
}
