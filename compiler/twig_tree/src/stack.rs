//! Stack growth for recursive tree walks.
//!
//! Deep equality, value conversion, and the search driver recurse once per
//! nesting level. Machine-generated trees (minified code, long linked
//! structures) can nest far deeper than a default thread stack allows, so
//! each recursive step goes through [`ensure_sufficient_stack`].
//!
//! - **Native targets**: grows the stack on demand via `stacker`.
//! - **WASM targets**: plain call; the runtime manages its own stack.

/// Grow when less than this much stack remains (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
const GROWTH: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if the remaining space is below the red
/// zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROWTH, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
