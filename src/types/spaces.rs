//! Space-tagged vectors and covariances
//!
//! The per-axis joint filters juggle three kinds of small vectors: the
//! kinematic state `[position, velocity, acceleration]`, the scalar position
//! measurement, and the innovation between the two. Tagging each with a
//! marker type keeps them from being mixed up in the Kalman algebra.

use ::core::marker::PhantomData;
use ::core::ops::{Add, Sub};
use nalgebra::{RealField, SMatrix, SVector, Scalar};

// ============================================================================
// Vector Space Markers
// ============================================================================

/// Marker for kinematic state vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace;

/// Marker for sensor measurement vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSpace;

/// Marker for innovation vectors (measurement minus predicted measurement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnovationSpace;

// ============================================================================
// Typed Vector
// ============================================================================

/// A fixed-size vector bound to one mathematical space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T: Scalar, const N: usize, Space> {
    inner: SVector<T, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a vector from raw components.
    #[inline]
    pub fn from_array(data: [T; N]) -> Self {
        Self::from_svector(SVector::from(data))
    }

    /// Wraps an nalgebra vector.
    #[inline]
    pub fn from_svector(inner: SVector<T, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying nalgebra vector.
    #[inline]
    pub fn as_svector(&self) -> &SVector<T, N> {
        &self.inner
    }

    /// Access element at index.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, index: usize) -> &T {
        &self.inner[index]
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Vector<T, N, Space> {}

impl<T: RealField + Copy, const N: usize, Space> Vector<T, N, Space> {
    /// Creates a zero vector.
    #[inline]
    pub fn zeros() -> Self {
        Self::from_svector(SVector::zeros())
    }
}

/// Kinematic state of one axis: `[position, velocity, acceleration]`.
pub type StateVector<T, const N: usize> = Vector<T, N, StateSpace>;

/// Measured quantity (a single coordinate for the joint filters).
pub type Measurement<T, const M: usize> = Vector<T, M, MeasurementSpace>;

/// Measurement residual.
pub type Innovation<T, const M: usize> = Vector<T, M, InnovationSpace>;

impl<T: RealField + Copy, const N: usize, Space> Add for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_svector(self.inner + rhs.inner)
    }
}

impl<T: RealField + Copy, const N: usize, Space> Sub for Vector<T, N, Space> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_svector(self.inner - rhs.inner)
    }
}

/// Subtracting two measurements yields an innovation, not another measurement.
pub trait ComputeInnovation<T: RealField, const M: usize> {
    /// Residual between this measurement and a predicted one.
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M>;
}

impl<T: RealField + Copy, const M: usize> ComputeInnovation<T, M> for Measurement<T, M> {
    #[inline]
    fn innovation(self, predicted: Measurement<T, M>) -> Innovation<T, M> {
        Innovation::from_svector(self.inner - predicted.inner)
    }
}

// ============================================================================
// Covariance Matrix
// ============================================================================

/// A covariance matrix bound to one vector space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance<T: Scalar, const N: usize, Space> {
    inner: SMatrix<T, N, N>,
    _marker: PhantomData<Space>,
}

impl<T: Scalar, const N: usize, Space> Covariance<T, N, Space> {
    /// Wraps a raw matrix. The caller keeps it symmetric positive semi-definite.
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, N, N>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying matrix.
    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, N, N> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const N: usize, Space: Clone> Copy for Covariance<T, N, Space> where
    SMatrix<T, N, N>: Copy
{
}

impl<T: RealField + Copy, const N: usize, Space> Covariance<T, N, Space> {
    /// Creates a zero covariance.
    #[inline]
    pub fn zeros() -> Self {
        Self::from_matrix(SMatrix::zeros())
    }

    /// Creates `variance * I`.
    #[inline]
    pub fn isotropic(variance: T) -> Self {
        Self::from_matrix(SMatrix::<T, N, N>::identity().scale(variance))
    }

    /// Adds two covariance matrices.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        Self::from_matrix(self.inner + other.inner)
    }

    /// Sum of squared entries (the squared Frobenius norm).
    #[inline]
    pub fn frobenius_norm_squared(&self) -> T {
        self.inner.norm_squared()
    }

    /// Variance of the first state component.
    #[inline]
    pub fn leading_variance(&self) -> T {
        self.inner[(0, 0)]
    }
}

/// Covariance of a kinematic state.
pub type StateCovariance<T, const N: usize> = Covariance<T, N, StateSpace>;

/// Measurement noise covariance (and innovation covariance S = HPHᵀ + R).
pub type MeasurementCovariance<T, const M: usize> = Covariance<T, M, MeasurementSpace>;
