//! Complex number value type for complex-domain containers
//!
//! Stored as `(re, im)` pairs, so a `&[Complex64]` buffer is layout-compatible
//! with the interleaved `re, im, re, im, ...` convention used across the
//! engine boundary; `bytemuck` casts between the two views are zero-copy.
//!
//! Arithmetic follows the standard definitions; the transcendental functions
//! cover exactly the elementwise operation family of the expression graph.

use bytemuck::{Pod, Zeroable};
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 128-bit complex number with f64 real and imaginary parts.
///
/// Memory layout: `f64` × 2, interleaved-compatible (`#[repr(C)]`).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Complex64 {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex64 {
    /// Zero complex number
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    /// One (real unit)
    pub const ONE: Self = Self { re: 1.0, im: 0.0 };

    /// Imaginary unit i
    pub const I: Self = Self { re: 0.0, im: 1.0 };

    /// Create a new complex number
    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Create from polar form: `r * e^(i*theta)`
    #[inline]
    pub fn from_polar(r: f64, theta: f64) -> Self {
        Self {
            re: r * theta.cos(),
            im: r * theta.sin(),
        }
    }

    /// Magnitude: `|z| = sqrt(re^2 + im^2)`
    #[inline]
    pub fn abs(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Argument (phase angle) in radians
    #[inline]
    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }

    /// Complex conjugate
    #[inline]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    /// True when the imaginary part is exactly zero (either sign of zero)
    #[inline]
    pub fn is_real(self) -> bool {
        self.im == 0.0
    }

    /// Exponential: `e^z = e^re * (cos im + i sin im)`
    pub fn exp(self) -> Self {
        Self::from_polar(self.re.exp(), self.im)
    }

    /// Principal natural logarithm: `ln|z| + i arg(z)`
    pub fn ln(self) -> Self {
        Self::new(self.abs().ln(), self.arg())
    }

    /// Principal square root, computed in polar form
    pub fn sqrt(self) -> Self {
        Self::from_polar(self.abs().sqrt(), self.arg() / 2.0)
    }

    /// Sine
    pub fn sin(self) -> Self {
        Self::new(
            self.re.sin() * self.im.cosh(),
            self.re.cos() * self.im.sinh(),
        )
    }

    /// Cosine
    pub fn cos(self) -> Self {
        Self::new(
            self.re.cos() * self.im.cosh(),
            -self.re.sin() * self.im.sinh(),
        )
    }

    /// Tangent
    pub fn tan(self) -> Self {
        self.sin() / self.cos()
    }

    /// Hyperbolic sine
    pub fn sinh(self) -> Self {
        Self::new(
            self.re.sinh() * self.im.cos(),
            self.re.cosh() * self.im.sin(),
        )
    }

    /// Hyperbolic cosine
    pub fn cosh(self) -> Self {
        Self::new(
            self.re.cosh() * self.im.cos(),
            self.re.sinh() * self.im.sin(),
        )
    }

    /// Hyperbolic tangent
    pub fn tanh(self) -> Self {
        self.sinh() / self.cosh()
    }

    /// Inverse sine: `-i ln(iz + sqrt(1 - z^2))`
    pub fn asin(self) -> Self {
        let inner = Self::I * self + (Self::ONE - self * self).sqrt();
        -(Self::I * inner.ln())
    }

    /// Inverse cosine: `pi/2 - asin(z)`
    pub fn acos(self) -> Self {
        Self::new(std::f64::consts::FRAC_PI_2, 0.0) - self.asin()
    }

    /// Inverse tangent: `(i/2) (ln(1 - iz) - ln(1 + iz))`
    pub fn atan(self) -> Self {
        let iz = Self::I * self;
        let half_i = Self::new(0.0, 0.5);
        half_i * ((Self::ONE - iz).ln() - (Self::ONE + iz).ln())
    }

    /// Inverse hyperbolic sine: `ln(z + sqrt(z^2 + 1))`
    pub fn asinh(self) -> Self {
        (self + (self * self + Self::ONE).sqrt()).ln()
    }

    /// Inverse hyperbolic cosine: `ln(z + sqrt(z^2 - 1))`
    pub fn acosh(self) -> Self {
        (self + (self * self - Self::ONE).sqrt()).ln()
    }

    /// Inverse hyperbolic tangent: `(1/2) ln((1 + z) / (1 - z))`
    pub fn atanh(self) -> Self {
        let half = Self::new(0.5, 0.0);
        half * ((Self::ONE + self) / (Self::ONE - self)).ln()
    }
}

impl Add for Complex64 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex64 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex64 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex64 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        // z / w = z * conj(w) / |w|^2
        let denom = rhs.re * rhs.re + rhs.im * rhs.im;
        Self::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl Neg for Complex64 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl Zero for Complex64 {
    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

impl One for Complex64 {
    #[inline]
    fn one() -> Self {
        Self::ONE
    }
}

impl From<f64> for Complex64 {
    #[inline]
    fn from(re: f64) -> Self {
        Self::new(re, 0.0)
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < 0.0 {
            write!(f, "{}-{}i", self.re, -self.im)
        } else {
            write!(f, "{}+{}i", self.re, self.im)
        }
    }
}
