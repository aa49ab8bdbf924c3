//! Logging shims: `tracing` when the feature is on, no-ops otherwise.

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, info, trace};

// Expands to an expression, so it can stand alone in a match arm.
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use {debug, info, trace};
