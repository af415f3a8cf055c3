//! The strided array container and its shape-preserving operations.

use ag_kernel::{KernelError, NumKernel};
use rand::Rng;

use crate::error::NdResult;
use crate::shape;

/// A dense N-dimensional array: flat row-major storage plus a shape and its
/// stride table. Strides are always the contiguous ones derived from the
/// shape; views never alias, every operation materializes its result.
#[derive(Debug, Clone, PartialEq)]
pub struct NDarray<T: NumKernel> {
    pub(crate) data: Vec<T>,
    pub(crate) shape: Vec<usize>,
    pub(crate) strides: Vec<usize>,
}

impl<T: NumKernel> NDarray<T> {
    /// Internal constructor; callers guarantee `data.len() == product(shape)`.
    pub(crate) fn from_parts(data: Vec<T>, shape: Vec<usize>) -> Self {
        let shape = if shape.is_empty() { vec![1] } else { shape };
        debug_assert_eq!(data.len(), shape::element_count(&shape));
        let strides = shape::strides_from(&shape);
        NDarray { data, shape, strides }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::ZERO)
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::ONE)
    }

    pub fn full(shape: &[usize], value: T) -> Self {
        let shape = if shape.is_empty() { vec![1] } else { shape.to_vec() };
        let count = shape::element_count(&shape);
        Self::from_parts(vec![value; count], shape)
    }

    pub fn scalar(value: T) -> Self {
        Self::from_parts(vec![value], vec![1])
    }

    /// Build an array from flat data; the shape may contain one `-1`.
    pub fn from_vec(data: Vec<T>, shape: &[isize]) -> NdResult<Self> {
        let nshape = shape::prepare_reshape(data.len(), shape)?;
        Ok(Self::from_parts(data, nshape))
    }

    /// Fill a fresh array with uniform samples from `[lo, hi)`.
    pub fn uniform<R: Rng + ?Sized>(lo: T, hi: T, shape: &[usize], rng: &mut R) -> Self {
        let count = shape::element_count(shape);
        let data = (0..count).map(|_| T::sample_uniform(rng, lo, hi)).collect();
        Self::from_parts(data, shape.to_vec())
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Element at a full multi-index.
    pub fn at(&self, indices: &[usize]) -> T {
        self.data[shape::multi_to_linear(indices, &self.strides)]
    }

    /// Same data, new shape (one `-1` allowed).
    pub fn reshape(&self, shape: &[isize]) -> NdResult<Self> {
        let nshape = shape::prepare_reshape(self.count(), shape)?;
        Ok(Self::from_parts(self.data.clone(), nshape))
    }

    /// Permute axes through `table`; an empty table reverses them all.
    /// The result is materialized by walking output offsets in order and
    /// remapping each through the permuted strides.
    pub fn transpose(&self, table: &[usize]) -> NdResult<Self> {
        let reversed;
        let table = if table.is_empty() {
            reversed = shape::prepare_transpose(self.rank());
            &reversed
        } else {
            shape::validate_permutation(table, self.rank())?;
            table
        };

        let nshape = shape::permute(&self.shape, table);
        let nstrides = shape::permute(&self.strides, table);
        let data = (0..self.count())
            .map(|idx| self.data[shape::remap_linear(idx, &nshape, &nstrides)])
            .collect();
        Ok(Self::from_parts(data, nshape))
    }

    /// Full axis reversal.
    pub fn t(&self) -> NdResult<Self> {
        self.transpose(&[])
    }

    /// Map every element, possibly into another scalar kind.
    pub fn apply<V: NumKernel>(&self, f: impl Fn(T) -> V) -> NDarray<V> {
        let data = self.data.iter().map(|&x| f(x)).collect();
        NDarray::from_parts(data, self.shape.clone())
    }

    /// Map every element through a fallible kernel operation; the first
    /// unsupported element aborts the whole map.
    pub fn try_apply<V: NumKernel>(
        &self,
        f: impl Fn(T) -> Result<V, KernelError>,
    ) -> NdResult<NDarray<V>> {
        let data = self
            .data
            .iter()
            .map(|&x| f(x))
            .collect::<Result<Vec<V>, KernelError>>()?;
        Ok(NDarray::from_parts(data, self.shape.clone()))
    }

    /// Convert into another scalar kind through f64.
    pub fn cast<V: NumKernel>(&self) -> NDarray<V> {
        self.apply(|x| V::from_f64(x.to_f64()))
    }

    /// Overwrite every element in place.
    pub fn fill(&mut self, value: T) {
        for x in self.data.iter_mut() {
            *x = value;
        }
    }

    pub fn neg(&self) -> Self {
        self.apply(|x| x.neg())
    }

    pub fn abs(&self) -> Self {
        self.apply(|x| x.abs())
    }

    pub fn sq(&self) -> Self {
        self.apply(|x| x.sq())
    }

    pub fn inv(&self) -> Self {
        self.apply(|x| x.inv())
    }

    pub fn sqrt(&self) -> Self {
        self.apply(|x| x.sqrt())
    }

    pub fn exp(&self) -> NdResult<Self> {
        self.try_apply(|x| x.exp())
    }

    pub fn ln(&self) -> NdResult<Self> {
        self.try_apply(|x| x.ln())
    }

    pub fn tanh(&self) -> NdResult<Self> {
        self.try_apply(|x| x.tanh())
    }

    pub fn sigmoid(&self) -> NdResult<Self> {
        self.try_apply(|x| x.sigmoid())
    }

    /// Sigmoid derivative, taking the forward *output* as input.
    pub fn dsigmoid(&self) -> Self {
        self.apply(|x| x.dsigmoid())
    }

    /// Tanh derivative, taking the forward *output* as input.
    pub fn dtanh(&self) -> Self {
        self.apply(|x| x.dtanh())
    }

    pub fn round_to(&self, digits: i32) -> Self {
        self.apply(|x| x.round_to(digits))
    }

    pub fn clamp_to(&self, lo: f64, hi: f64) -> Self {
        self.apply(|x| x.clamp_to(lo, hi))
    }
}

impl NDarray<i32> {
    /// Evenly spaced integers as a 1-D array.
    pub fn arange(start: i32, len: usize, step: i32) -> Self {
        let data = (0..len).map(|i| start + i as i32 * step).collect();
        Self::from_parts(data, vec![len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn constructors() {
        let z: NDarray<f64> = NDarray::zeros(&[2, 3]);
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z.strides(), &[3, 1]);
        assert!(z.as_slice().iter().all(|&x| x == 0.0));

        let o: NDarray<i32> = NDarray::ones(&[4]);
        assert_eq!(o.as_slice(), &[1, 1, 1, 1]);

        // empty shape collapses to [1]
        let s = NDarray::scalar(7.0f64);
        assert_eq!(s.shape(), &[1]);

        let a = NDarray::arange(1, 5, 2);
        assert_eq!(a.as_slice(), &[1, 3, 5, 7, 9]);
    }

    #[test]
    fn from_vec_checks_count() {
        let a = NDarray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, -1]).unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert!(NDarray::from_vec(vec![1, 2, 3], &[2, 2]).is_err());
    }

    #[test]
    fn reshape_roundtrip() {
        let a = NDarray::from_vec((0..24).collect(), &[2, 3, 4]).unwrap();
        let b = a.reshape(&[4, -1]).unwrap();
        assert_eq!(b.shape(), &[4, 6]);
        let c = b.reshape(&[2, 3, 4]).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn transpose_2d() {
        let a = NDarray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        let t = a.t().unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.as_slice(), &[1, 4, 2, 5, 3, 6]);
        // involution
        assert_eq!(t.t().unwrap(), a);
    }

    #[test]
    fn transpose_permutation_3d() {
        let a = NDarray::from_vec((0..24).collect(), &[2, 3, 4]).unwrap();
        let p = a.transpose(&[1, 2, 0]).unwrap();
        assert_eq!(p.shape(), &[3, 4, 2]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(p.at(&[j, k, i]), a.at(&[i, j, k]));
                }
            }
        }
        assert!(a.transpose(&[0, 0, 1]).is_err());
    }

    #[test]
    fn apply_and_cast() {
        let a = NDarray::from_vec(vec![1.4f64, -2.6, 3.0], &[3]).unwrap();
        assert_eq!(a.abs().as_slice(), &[1.4, 2.6, 3.0]);
        assert_eq!(a.neg().as_slice(), &[-1.4, 2.6, -3.0]);
        let i: NDarray<i32> = a.cast();
        assert_eq!(i.as_slice(), &[1, -2, 3]);
    }

    #[test]
    fn fallible_maps_surface_kernel_errors() {
        let a = NDarray::from_vec(vec![1, 2, 3], &[3]).unwrap();
        assert!(a.exp().is_err());
        assert!(a.tanh().is_err());
        // sqrt stays available for integers
        assert_eq!(a.sqrt().as_slice(), &[1, 1, 1]);
        let f = NDarray::from_vec(vec![0.0f64], &[1]).unwrap();
        assert_eq!(f.sigmoid().unwrap().as_slice(), &[0.5]);
    }

    #[test]
    fn uniform_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = NDarray::uniform(-1.0f64, 1.0, &[10, 10], &mut rng);
        assert_eq!(a.count(), 100);
        assert!(a.as_slice().iter().all(|&x| (-1.0..1.0).contains(&x)));
    }

    #[test]
    fn fill_in_place() {
        let mut a: NDarray<f64> = NDarray::ones(&[2, 2]);
        a.fill(0.0);
        assert!(a.as_slice().iter().all(|&x| x == 0.0));
    }
}
