//! Leveled assertions. The level is fixed at compile time; checks above it compile to nothing.
//!
//! Simple checks are cheap enough to always run. The extreme level re-runs whole relaxation passes
//! and is only raised for tests and the `debug-checks` feature.

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const DISPARITY_ASSERT_LEVEL_DEFINITION: u8 = DISPARITY_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const DISPARITY_ASSERT_LEVEL_DEFINITION: u8 = DISPARITY_ASSERT_EXTREME;

pub const DISPARITY_ASSERT_SIMPLE: u8 = 1;
pub const DISPARITY_ASSERT_MODERATE: u8 = 2;
pub const DISPARITY_ASSERT_EXTREME: u8 = 3;

#[macro_export]
#[doc(hidden)]
macro_rules! disparity_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::DISPARITY_ASSERT_LEVEL_DEFINITION >= $crate::asserts::DISPARITY_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! disparity_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::DISPARITY_ASSERT_LEVEL_DEFINITION >= $crate::asserts::DISPARITY_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! disparity_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::DISPARITY_ASSERT_LEVEL_DEFINITION >= $crate::asserts::DISPARITY_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
