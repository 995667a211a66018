//! NA sentinels per element kind
//!
//! - logical / character: `None`
//! - integer: `i32::MIN`
//! - double: a quiet NaN whose low word is 1954, distinct from ordinary NaN
//! - complex: NA when either part is NA
//! - raw: no NA

use num::complex::Complex64;
use std::rc::Rc;

pub const NA_INTEGER: i32 = i32::MIN;

const NA_REAL_BITS: u64 = 0x7FF0_0000_0000_07A2;
const NA_REAL_LOW_WORD: u32 = 1954;

/// The double NA
#[inline]
pub fn na_real() -> f64 {
    f64::from_bits(NA_REAL_BITS)
}

/// True only for the NA bit pattern, false for other NaNs
#[inline]
pub fn is_na_real(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) as u32 == NA_REAL_LOW_WORD
}

/// True for a NaN that is not NA
#[inline]
pub fn is_nan_not_na(x: f64) -> bool {
    x.is_nan() && !is_na_real(x)
}

#[inline]
pub fn na_complex() -> Complex64 {
    Complex64::new(na_real(), 0.0)
}

#[inline]
pub fn is_na_complex(z: Complex64) -> bool {
    is_na_real(z.re) || is_na_real(z.im)
}

/// Element of an atomic vector with a missing-value sentinel
pub trait Element: Clone {
    fn na() -> Self;

    /// What `is.na` reports for this element (NaN counts for doubles)
    fn is_na(&self) -> bool;
}

impl Element for Option<bool> {
    fn na() -> Self {
        None
    }
    fn is_na(&self) -> bool {
        self.is_none()
    }
}

impl Element for i32 {
    fn na() -> Self {
        NA_INTEGER
    }
    fn is_na(&self) -> bool {
        *self == NA_INTEGER
    }
}

impl Element for f64 {
    fn na() -> Self {
        na_real()
    }
    fn is_na(&self) -> bool {
        self.is_nan()
    }
}

impl Element for Complex64 {
    fn na() -> Self {
        na_complex()
    }
    fn is_na(&self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }
}

impl Element for Option<Rc<str>> {
    fn na() -> Self {
        None
    }
    fn is_na(&self) -> bool {
        self.is_none()
    }
}

impl Element for u8 {
    fn na() -> Self {
        0
    }
    fn is_na(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_na_real_is_distinct_from_nan() {
        assert!(is_na_real(na_real()));
        assert!(!is_na_real(f64::NAN));
        assert!(is_nan_not_na(f64::NAN));
        assert!(!is_nan_not_na(na_real()));
        assert!(!is_na_real(1.0));
    }

    #[test]
    fn test_element_na() {
        assert!(<i32 as Element>::na().is_na());
        assert!(!0i32.is_na());
        assert!(f64::NAN.is_na());
        assert!(!0u8.is_na());
        assert!(is_na_complex(na_complex()));
    }
}
