use crate::{CrpError, Result};
use core::ops::{Add, Div};

/// The concentration parameter of a Chinese restaurant process.
///
/// Guaranteed finite and strictly positive.  The operator impls let the
/// seating-weight formulas read as written, e.g. `mass / (seated + mass)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mass(f64);

impl Mass {
    pub fn new(x: f64) -> Result<Self> {
        if x.is_finite() && x > 0.0 {
            Ok(Self(x))
        } else {
            Err(CrpError::InvalidConcentration(x))
        }
    }

    pub fn unwrap(self) -> f64 {
        self.0
    }

    pub fn ln(self) -> f64 {
        self.0.ln()
    }
}

impl Add<Mass> for f64 {
    type Output = f64;

    fn add(self, other: Mass) -> f64 {
        self + other.0
    }
}

impl Div<f64> for Mass {
    type Output = f64;

    fn div(self, other: f64) -> f64 {
        self.0 / other
    }
}
