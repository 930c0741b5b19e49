//! Quantities that scale affinely with the code-distance parameter `k`.

use std::fmt::{self, Display};
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, QlcError};

/// Exact affine function `slope * k + offset`.
///
/// Two instances are compatible (comparable, summable) only through their
/// symbolic coefficients: `2k + 2` and `4` are different quantities even though
/// they agree at `k = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinearFunction {
    /// Coefficient multiplying `k`.
    pub slope: i64,
    /// Constant term.
    pub offset: i64,
}

impl LinearFunction {
    /// Creates `slope * k + offset`.
    pub const fn new(slope: i64, offset: i64) -> Self {
        Self { slope, offset }
    }

    /// Creates the constant function `value`.
    pub const fn constant(value: i64) -> Self {
        Self::new(0, value)
    }

    /// Evaluates the function at `k`.
    pub fn integer_eval(&self, k: u32) -> i64 {
        self.slope * i64::from(k) + self.offset
    }

    /// Returns `true` if the function does not depend on `k`.
    pub fn is_constant(&self) -> bool {
        self.slope == 0
    }

    /// Returns `true` if the function depends on `k`.
    pub fn is_scalable(&self) -> bool {
        !self.is_constant()
    }

    /// Returns the constant value if the function does not depend on `k`.
    pub fn as_constant(&self) -> Option<i64> {
        self.is_constant().then_some(self.offset)
    }

    /// Divides both coefficients by `divisor`, failing if the result would not
    /// have integer coefficients.
    pub fn exact_integer_div(&self, divisor: i64) -> Result<Self, QlcError> {
        if divisor == 0 || self.slope % divisor != 0 || self.offset % divisor != 0 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "inexact-division",
                    "linear function coefficients are not divisible by the divisor",
                )
                .with_context("function", self.to_string())
                .with_context("divisor", divisor.to_string()),
            ));
        }
        Ok(Self::new(self.slope / divisor, self.offset / divisor))
    }

    /// Multiplies two functions, failing when the product would be quadratic.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, QlcError> {
        if self.is_scalable() && other.is_scalable() {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "non-linear-product",
                    "the product of two scalable quantities is not affine",
                )
                .with_context("lhs", self.to_string())
                .with_context("rhs", other.to_string()),
            ));
        }
        if self.is_constant() {
            Ok(*other * self.offset)
        } else {
            Ok(*self * other.offset)
        }
    }
}

impl Default for LinearFunction {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Add for LinearFunction {
    type Output = LinearFunction;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.slope + rhs.slope, self.offset + rhs.offset)
    }
}

impl Sub for LinearFunction {
    type Output = LinearFunction;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.slope - rhs.slope, self.offset - rhs.offset)
    }
}

impl Mul<i64> for LinearFunction {
    type Output = LinearFunction;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::new(self.slope * rhs, self.offset * rhs)
    }
}

impl std::iter::Sum for LinearFunction {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, item| acc + item)
    }
}

impl Display for LinearFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slope, self.offset) {
            (0, offset) => write!(f, "{offset}"),
            (slope, 0) => write!(f, "{slope}k"),
            (slope, offset) if offset < 0 => write!(f, "{slope}k - {}", -offset),
            (slope, offset) => write!(f, "{slope}k + {offset}"),
        }
    }
}

/// Concrete 2-dimensional shape obtained by evaluating a [`Scalable2D`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shape2D {
    /// Extent along the x axis (columns).
    pub x: i64,
    /// Extent along the y axis (rows).
    pub y: i64,
}

impl Shape2D {
    /// Creates a new shape.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Pair of [`LinearFunction`] describing a footprint.
///
/// The unit (physical qubits or plaquettes) depends on the producer of the
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scalable2D {
    /// Extent along the x axis.
    pub x: LinearFunction,
    /// Extent along the y axis.
    pub y: LinearFunction,
}

impl Scalable2D {
    /// Creates a new scalable footprint.
    pub const fn new(x: LinearFunction, y: LinearFunction) -> Self {
        Self { x, y }
    }

    /// Evaluates the footprint at `k`.
    pub fn to_shape_2d(&self, k: u32) -> Shape2D {
        Shape2D::new(self.x.integer_eval(k), self.y.integer_eval(k))
    }

    /// Multiplies each axis by the matching integer factor.
    pub fn scaled(&self, x: i64, y: i64) -> Self {
        Self::new(self.x * x, self.y * y)
    }
}

impl Add for Scalable2D {
    type Output = Scalable2D;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Scalable2D {
    type Output = Scalable2D;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Display for Scalable2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Greatest common divisor of two non-negative integers.
pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of the provided positive integers (1 when empty).
pub fn lcm<I: IntoIterator<Item = i64>>(values: I) -> i64 {
    values
        .into_iter()
        .fold(1, |acc, value| acc / gcd(acc, value) * value)
}
