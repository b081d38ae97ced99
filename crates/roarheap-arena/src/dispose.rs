//! Explicit disposal and scoped release.
//!
//! Arena resources are released by an explicit call, never by `Drop`.
//! [`using`] pairs an acquisition with its release so that the release
//! runs on every exit path of the body, including early `?` returns.

use std::fmt::Display;

use tracing::warn;

use crate::arena::Arena;
use crate::element::Element;
use crate::error::ArenaError;
use crate::view::TypedView;

/// A resource that must be released explicitly against a context `C`.
///
/// `C` is whatever owns the resource's storage: the [`Arena`] for typed
/// views, or a higher-level heap for resources layered on top of it.
pub trait Dispose<C: ?Sized> {
    /// Error returned when release fails (typically a double free).
    type Error;

    /// Release the resource. A second release of the same resource fails.
    fn dispose(self, ctx: &mut C) -> Result<(), Self::Error>;
}

impl<T: Element> Dispose<Arena> for TypedView<T> {
    type Error = ArenaError;

    fn dispose(self, arena: &mut Arena) -> Result<(), ArenaError> {
        TypedView::dispose(self, arena)
    }
}

/// Run `body` with `resource`, then dispose `resource` whatever happened.
///
/// If the body fails, its error is returned and a cleanup failure is only
/// logged. If the body succeeds, a cleanup failure is returned instead of
/// the body's value. The body must not dispose `resource` itself; doing so
/// surfaces as a double-free from the cleanup.
pub fn using<C, R, T, E, F>(ctx: &mut C, resource: R, body: F) -> Result<T, E>
where
    C: ?Sized,
    R: Dispose<C> + Copy,
    R::Error: Display,
    E: From<R::Error>,
    F: FnOnce(&mut C, R) -> Result<T, E>,
{
    let outcome = body(ctx, resource);
    let released = resource.dispose(ctx);
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup)) => Err(cleanup.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            warn!(error = %cleanup, "scoped resource release failed after body error");
            Err(e)
        }
    }
}
