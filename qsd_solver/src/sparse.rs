use ndarray::{linalg::Dot, Array1, Array2};
use num_complex::{Complex, ComplexFloat};
use rand_distr::num_traits::Zero;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An operator which can be applied to a state `|\psi>`
///
/// Operators are always square when used in a system, but the trait itself
/// places no restriction on the shape so that validation can report it.
pub trait Tensor: Dot<Array1<Complex<f64>>, Output = Array1<Complex<f64>>> {
    /// The shape of the operator as `[rows, columns]`
    fn shape(&self) -> [usize; 2];
}

impl Tensor for Array2<Complex<f64>> {
    #[inline]
    fn shape(&self) -> [usize; 2] {
        [self.nrows(), self.ncols()]
    }
}

/// Represents an array, stored as a series of (offset) diagonals
/// Each diagonal stores elements M_{i+offset % `N_0`, i}
/// length of diagonals is shape[1], with a total of shape[0] offsets
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BandedArray<T> {
    diagonals: Vec<Vec<T>>,
    offsets: Vec<usize>,
    shape: [usize; 2],
}

impl<T: Copy + Zero + PartialEq> BandedArray<T> {
    /// Build a banded array from a dense one, dropping diagonals which are identically zero.
    #[must_use]
    pub fn from_dense(dense: &Array2<T>) -> Self {
        let [n_rows, n_cols] = [dense.nrows(), dense.ncols()];
        let (offsets, diagonals) = (0..n_rows)
            .map(|o| {
                let diagonal = (0..n_cols)
                    .map(|i| dense[[(i + o) % n_rows, i]])
                    .collect::<Vec<_>>();
                (o, diagonal)
            })
            .filter(|(_, d)| d.iter().any(|e| !e.is_zero()))
            .unzip();

        BandedArray {
            diagonals,
            offsets,
            shape: [n_rows, n_cols],
        }
    }
}

impl<T: Copy> BandedArray<T> {
    /// # Panics
    ///
    /// Will panic if diagonals are not of length shape[1]
    /// Will panic if len(diagonals) !== len(offsets)
    #[must_use]
    pub fn from_sparse(diagonals: &[Vec<T>], offsets: &[usize], shape: &[usize; 2]) -> Self {
        for d in diagonals {
            assert_eq!(d.len(), shape[1]);
        }
        assert_eq!(diagonals.len(), offsets.len());
        BandedArray {
            diagonals: diagonals.to_vec(),
            offsets: offsets.to_vec(),
            shape: shape.to_owned(),
        }
    }
}

impl<T: ComplexFloat> BandedArray<T> {
    /// The conjugate transpose `M^\dagger`
    #[must_use]
    pub fn adjoint(&self) -> TransposedBandedArray<T> {
        TransposedBandedArray {
            diagonals: conj_diagonals(&self.diagonals),
            offsets: self.offsets.clone(),
            shape: [self.shape[1], self.shape[0]],
        }
    }
}

impl<T: Zero + Copy + std::ops::AddAssign<<T as std::ops::Mul>::Output> + std::ops::Mul>
    Dot<Array1<T>> for BandedArray<T>
{
    type Output = Array1<T>;

    #[inline]
    fn dot(&self, rhs: &Array1<T>) -> Self::Output {
        assert!(self.shape[1] == rhs.len());

        let mut out = Array1::zeros(self.shape[0]);

        for (offset, diagonal) in self.offsets.iter().zip(self.diagonals.iter()) {
            let mut iter_elem = diagonal.iter().zip(rhs.iter());

            // Take the first N_0 - offset
            // These correspond to i=offset..N_0, j=0..N_0-offset
            (*offset..self.shape[0])
                .zip(&mut iter_elem)
                .for_each(|(i, (d, r))| out[i] += *d * *r);

            // In chunks of N_0, starting at N_0-offset
            iter_elem
                .zip((0..self.shape[0]).cycle())
                .for_each(|((d, r), i)| out[i] += *d * *r);
        }

        out
    }
}

/// Represents an array, stored as a series of (offset) diagonals
/// Each diagonal stores elements M_{i, i+offset % `N_1`}
/// length of diagonals is shape[0]
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransposedBandedArray<T> {
    diagonals: Vec<Vec<T>>,
    offsets: Vec<usize>,
    shape: [usize; 2],
}

impl<T: ComplexFloat> TransposedBandedArray<T> {
    /// The conjugate transpose `M^\dagger`
    #[must_use]
    pub fn adjoint(&self) -> BandedArray<T> {
        BandedArray {
            diagonals: conj_diagonals(&self.diagonals),
            offsets: self.offsets.clone(),
            shape: [self.shape[1], self.shape[0]],
        }
    }
}

impl<T: Zero + Copy + std::ops::AddAssign<<T as std::ops::Mul>::Output> + std::ops::Mul>
    Dot<Array1<T>> for TransposedBandedArray<T>
{
    type Output = Array1<T>;

    #[inline]
    fn dot(&self, rhs: &Array1<T>) -> Self::Output {
        assert!(self.shape[1] == rhs.len());

        let mut out = Array1::zeros(self.shape[0]);

        for (offset, diagonal) in self.offsets.iter().zip(self.diagonals.iter()) {
            let mut iter_elem = diagonal.iter().zip(out.iter_mut());

            // Take the first N_1 - offset
            // These correspond to j=offset..N_1, i=0..N_1-offset
            (*offset..self.shape[1])
                .zip(&mut iter_elem)
                .for_each(|(j, (d, o))| *o += *d * rhs[j]);

            iter_elem
                .zip((0..self.shape[1]).cycle())
                .for_each(|((d, o), j)| *o += *d * rhs[j]);
        }

        out
    }
}

impl Tensor for BandedArray<Complex<f64>> {
    #[inline]
    fn shape(&self) -> [usize; 2] {
        self.shape
    }
}

impl Tensor for TransposedBandedArray<Complex<f64>> {
    #[inline]
    fn shape(&self) -> [usize; 2] {
        self.shape
    }
}

fn conj_diagonals<T: ComplexFloat>(diagonals: &[Vec<T>]) -> Vec<Vec<T>> {
    diagonals
        .iter()
        .map(|d| d.iter().map(|i| i.conj()).collect())
        .collect()
}

/// Build the dense conjugate transpose of an operator
#[must_use]
pub fn dense_adjoint(operator: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    operator.t().map(Complex::conj)
}
