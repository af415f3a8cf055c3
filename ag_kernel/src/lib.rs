//! Scalar numeric kernels.
//!
//! [`NumKernel`] is the capability surface a scalar type must provide before
//! the tensor engine will carry it: arithmetic, the transcendentals it can
//! support, ordering turned into numeric booleans, casting and uniform
//! sampling. Implementations exist for `i32`, `f32` and `f64`; a type without
//! an impl simply cannot appear inside an array, so "unsupported scalar kind"
//! is a compile error rather than a runtime one. Operations a kind lacks
//! (exp/ln/tanh on integers) are the only runtime failures and come back as
//! [`KernelError`].

use std::fmt;

use rand::Rng;
use thiserror::Error;

/// A scalar operation was requested on a kind that cannot provide it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("operation '{op}' is not supported for dtype {dtype}")]
    Unsupported {
        op: &'static str,
        dtype: &'static str,
    },
}

impl KernelError {
    fn unsupported(op: &'static str, dtype: &'static str) -> Self {
        KernelError::Unsupported { op, dtype }
    }
}

/// Numeric capabilities of a scalar kind.
///
/// Comparison operations return `Self::ONE` / `Self::ZERO` so that masks stay
/// in the same dtype as their operands. `EPSILON` is the tolerance used by
/// [`eq_tol`](NumKernel::eq_tol) / [`neq_tol`](NumKernel::neq_tol); it is zero
/// for integers, making their comparisons exact.
pub trait NumKernel:
    Copy + PartialEq + PartialOrd + fmt::Debug + fmt::Display + 'static
{
    const DTYPE: &'static str;
    const ZERO: Self;
    const ONE: Self;
    const EPSILON: Self;
    const MIN_VALUE: Self;
    const MAX_VALUE: Self;

    fn neg(self) -> Self;
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;

    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn exp(self) -> Result<Self, KernelError>;
    fn ln(self) -> Result<Self, KernelError>;
    fn tanh(self) -> Result<Self, KernelError>;

    /// Round to `digits` decimal places. Identity for integers.
    fn round_to(self, digits: i32) -> Self;

    fn min(self, rhs: Self) -> Self;
    fn max(self, rhs: Self) -> Self;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;

    /// Draw a sample from `[lo, hi)`.
    fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self;

    fn clamp_to(self, lo: f64, hi: f64) -> Self {
        Self::from_f64(lo).max(self.min(Self::from_f64(hi)))
    }

    fn inv(self) -> Self {
        Self::ONE.div(self)
    }

    fn sq(self) -> Self {
        self.mul(self)
    }

    /// Tolerance equality: |a - b| <= EPSILON, as a numeric boolean.
    fn eq_tol(self, rhs: Self) -> Self {
        if self.sub(rhs).abs() <= Self::EPSILON {
            Self::ONE
        } else {
            Self::ZERO
        }
    }

    fn neq_tol(self, rhs: Self) -> Self {
        if self.sub(rhs).abs() <= Self::EPSILON {
            Self::ZERO
        } else {
            Self::ONE
        }
    }

    fn lt(self, rhs: Self) -> Self {
        if self < rhs { Self::ONE } else { Self::ZERO }
    }

    fn lte(self, rhs: Self) -> Self {
        if self <= rhs { Self::ONE } else { Self::ZERO }
    }

    fn gt(self, rhs: Self) -> Self {
        if self > rhs { Self::ONE } else { Self::ZERO }
    }

    fn gte(self, rhs: Self) -> Self {
        if self >= rhs { Self::ONE } else { Self::ZERO }
    }

    fn sigmoid(self) -> Result<Self, KernelError> {
        Ok(Self::ONE.div(Self::ONE.add(self.neg().exp()?)))
    }

    /// Derivative of sigmoid expressed in terms of the *output* y: y(1 - y).
    fn dsigmoid(self) -> Self {
        self.mul(Self::ONE.sub(self))
    }

    /// Derivative of tanh expressed in terms of the *output* y: 1 - y^2.
    fn dtanh(self) -> Self {
        Self::ONE.sub(self.sq())
    }
}

impl NumKernel for f64 {
    const DTYPE: &'static str = "f64";
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const EPSILON: Self = 1e-6;
    const MIN_VALUE: Self = f64::MIN;
    const MAX_VALUE: Self = f64::MAX;

    fn neg(self) -> Self {
        -self
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn div(self, rhs: Self) -> Self {
        self / rhs
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn exp(self) -> Result<Self, KernelError> {
        Ok(f64::exp(self))
    }

    fn ln(self) -> Result<Self, KernelError> {
        Ok(f64::ln(self))
    }

    fn tanh(self) -> Result<Self, KernelError> {
        Ok(f64::tanh(self))
    }

    fn round_to(self, digits: i32) -> Self {
        let scale = 10f64.powi(digits);
        (self * scale).round() / scale
    }

    fn min(self, rhs: Self) -> Self {
        f64::min(self, rhs)
    }

    fn max(self, rhs: Self) -> Self {
        f64::max(self, rhs)
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self {
        lo + (hi - lo) * rng.gen::<f64>()
    }
}

impl NumKernel for f32 {
    const DTYPE: &'static str = "f32";
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const EPSILON: Self = 1e-6;
    const MIN_VALUE: Self = f32::MIN;
    const MAX_VALUE: Self = f32::MAX;

    fn neg(self) -> Self {
        -self
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn div(self, rhs: Self) -> Self {
        self / rhs
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    fn exp(self) -> Result<Self, KernelError> {
        Ok(f32::exp(self))
    }

    fn ln(self) -> Result<Self, KernelError> {
        Ok(f32::ln(self))
    }

    fn tanh(self) -> Result<Self, KernelError> {
        Ok(f32::tanh(self))
    }

    fn round_to(self, digits: i32) -> Self {
        let scale = 10f32.powi(digits);
        (self * scale).round() / scale
    }

    fn min(self, rhs: Self) -> Self {
        f32::min(self, rhs)
    }

    fn max(self, rhs: Self) -> Self {
        f32::max(self, rhs)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self {
        lo + (hi - lo) * rng.gen::<f32>()
    }
}

impl NumKernel for i32 {
    const DTYPE: &'static str = "i32";
    const ZERO: Self = 0;
    const ONE: Self = 1;
    const EPSILON: Self = 0;
    const MIN_VALUE: Self = i32::MIN;
    const MAX_VALUE: Self = i32::MAX;

    fn neg(self) -> Self {
        -self
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn div(self, rhs: Self) -> Self {
        self / rhs
    }

    fn abs(self) -> Self {
        i32::abs(self)
    }

    // Truncating integer square root through f64.
    fn sqrt(self) -> Self {
        f64::from(self).sqrt() as i32
    }

    fn exp(self) -> Result<Self, KernelError> {
        Err(KernelError::unsupported("exp", Self::DTYPE))
    }

    fn ln(self) -> Result<Self, KernelError> {
        Err(KernelError::unsupported("ln", Self::DTYPE))
    }

    fn tanh(self) -> Result<Self, KernelError> {
        Err(KernelError::unsupported("tanh", Self::DTYPE))
    }

    fn round_to(self, _digits: i32) -> Self {
        self
    }

    fn min(self, rhs: Self) -> Self {
        Ord::min(self, rhs)
    }

    fn max(self, rhs: Self) -> Self {
        Ord::max(self, rhs)
    }

    fn from_f64(v: f64) -> Self {
        v as i32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self {
        rng.gen_range(lo..hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn float_arithmetic_basics() {
        assert_eq!(NumKernel::add(2.0f64, 3.0), 5.0);
        assert_eq!(NumKernel::sub(2.0f64, 3.0), -1.0);
        assert_eq!(NumKernel::mul(2.0f64, 3.0), 6.0);
        assert_eq!(NumKernel::div(3.0f64, 2.0), 1.5);
        assert_eq!(2.0f64.inv(), 0.5);
        assert_eq!(3.0f64.sq(), 9.0);
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(NumKernel::div(7i32, 2), 3);
        assert_eq!(NumKernel::div(-7i32, 2), -3);
    }

    #[test]
    fn integer_sqrt_truncates() {
        assert_eq!(NumKernel::sqrt(8i32), 2);
        assert_eq!(NumKernel::sqrt(9i32), 3);
        assert_eq!(NumKernel::sqrt(15i32), 3);
    }

    #[test]
    fn integer_transcendentals_are_unsupported() {
        assert!(matches!(
            2i32.exp(),
            Err(KernelError::Unsupported { op: "exp", dtype: "i32" })
        ));
        assert!(2i32.ln().is_err());
        assert!(2i32.tanh().is_err());
    }

    #[test]
    fn comparisons_are_numeric_booleans() {
        assert_eq!(1.0f64.lt(2.0), 1.0);
        assert_eq!(2.0f64.lt(1.0), 0.0);
        assert_eq!(2.0f64.gte(2.0), 1.0);
        assert_eq!(3i32.gt(2), 1);
        assert_eq!(2i32.gt(3), 0);
    }

    #[test]
    fn tolerance_equality_uses_epsilon() {
        // within 1e-6 counts as equal for floats
        assert_eq!(1.0f64.eq_tol(1.0 + 1e-9), 1.0);
        assert_eq!(1.0f64.eq_tol(1.0 + 1e-3), 0.0);
        assert_eq!(1.0f64.neq_tol(1.0 + 1e-9), 0.0);
        // integers compare exactly
        assert_eq!(3i32.eq_tol(3), 1);
        assert_eq!(3i32.eq_tol(4), 0);
    }

    #[test]
    fn sigmoid_and_derivatives() {
        let s = 0.0f64.sigmoid().unwrap();
        assert!((s - 0.5).abs() < 1e-12);
        // dsigmoid takes the forward output
        assert!((s.dsigmoid() - 0.25).abs() < 1e-12);
        // the inherent f64::tanh shadows the trait method here
        let t = NumKernel::tanh(0.0f64).unwrap();
        assert!((t.dtanh() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn round_and_clamp() {
        assert_eq!(1.23456f64.round_to(2), 1.23);
        assert_eq!(1.237f64.round_to(2), 1.24);
        assert_eq!(7i32.round_to(3), 7);
        assert_eq!(5.0f64.clamp_to(0.0, 1.0), 1.0);
        assert_eq!((-5i32).clamp_to(0.0, 10.0), 0);
    }

    #[test]
    fn uniform_sampling_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let x = f64::sample_uniform(&mut rng, -1.5, 1.5);
            assert!((-1.5..1.5).contains(&x));
            let n = i32::sample_uniform(&mut rng, -3, 3);
            assert!((-3..3).contains(&n));
        }
    }
}
