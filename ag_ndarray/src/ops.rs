//! Combining operations: broadcast elementwise, reductions, arg-reductions,
//! contraction and tiling.
//!
//! Two broadcast strategies coexist. The general one gathers both operands
//! through right-aligned modulo indexing, one output element at a time. The
//! tiled one ([`NDarray::add_tiled`]) materializes both operands at the
//! result shape first and then zips flat storage; it trades memory for a
//! branch-free inner loop.

use ag_kernel::NumKernel;

use crate::array::NDarray;
use crate::error::NdResult;
use crate::shape;

impl<T: NumKernel> NDarray<T> {
    /// Broadcast `self` with `rhs` and combine element pairs with `f`.
    pub fn elementwise<V: NumKernel>(
        &self,
        rhs: &NDarray<T>,
        f: impl Fn(T, T) -> V,
    ) -> NdResult<NDarray<V>> {
        let nshape = shape::broadcast_shapes(&self.shape, &rhs.shape)?;
        let count = shape::element_count(&nshape);

        let mut out_idx = vec![0; nshape.len()];
        let mut l_idx = vec![0; self.rank()];
        let mut r_idx = vec![0; rhs.rank()];
        let mut data = Vec::with_capacity(count);

        for idx in 0..count {
            shape::linear_to_multi(idx, &nshape, &mut out_idx);
            for k in 0..nshape.len() {
                let kk = nshape.len() - 1 - k;
                if k < self.rank() {
                    let i = self.rank() - 1 - k;
                    l_idx[i] = out_idx[kk] % self.shape[i];
                }
                if k < rhs.rank() {
                    let j = rhs.rank() - 1 - k;
                    r_idx[j] = out_idx[kk] % rhs.shape[j];
                }
            }
            let a = self.data[shape::multi_to_linear(&l_idx, &self.strides)];
            let b = rhs.data[shape::multi_to_linear(&r_idx, &rhs.strides)];
            data.push(f(a, b));
        }

        Ok(NDarray::from_parts(data, nshape))
    }

    pub fn add(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.add(b))
    }

    pub fn sub(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.sub(b))
    }

    pub fn mul(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.mul(b))
    }

    pub fn div(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.div(b))
    }

    pub fn minimum(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.min(b))
    }

    pub fn maximum(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.max(b))
    }

    pub fn eq(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.eq_tol(b))
    }

    pub fn neq(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.neq_tol(b))
    }

    pub fn lt(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.lt(b))
    }

    pub fn lte(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.lte(b))
    }

    pub fn gt(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.gt(b))
    }

    pub fn gte(&self, rhs: &Self) -> NdResult<Self> {
        self.elementwise(rhs, |a, b| a.gte(b))
    }

    /// Left-anchored combine: axes where `rhs` outsizes `self` are first
    /// folded down with `f`, so the result keeps `self`'s shape. This is the
    /// gradient-accumulation path, where a broadcast in the forward direction
    /// must become a summation in the backward one.
    pub fn combine_bc_left(
        &self,
        rhs: &Self,
        f: impl Fn(T, T) -> T + Copy,
        start: T,
    ) -> NdResult<Self> {
        let nshape = shape::broadcast_shapes(&self.shape, &rhs.shape)?;
        let mut tmp = rhs.clone();

        for k in 0..rhs.rank() {
            let kr = rhs.rank() - 1 - k;
            let kn = nshape.len() - 1 - k;
            let l0 = if k < self.rank() {
                Some(self.shape[self.rank() - 1 - k])
            } else {
                None
            };
            let n0 = nshape[kn];
            if l0 != Some(n0) && rhs.shape[kr] == n0 {
                tmp = tmp.reduce(Some(kr), true, start, f)?;
            }
        }

        self.elementwise(&tmp, f)
    }

    /// Add with the incoming value reduced down to `self`'s shape.
    pub fn add_bc_left(&self, rhs: &Self) -> NdResult<Self> {
        self.combine_bc_left(rhs, |a, b| a.add(b), T::ZERO)
    }

    pub fn sub_bc_left(&self, rhs: &Self) -> NdResult<Self> {
        self.combine_bc_left(&rhs.neg(), |a, b| a.add(b), T::ZERO)
    }

    pub fn mul_bc_left(&self, rhs: &Self) -> NdResult<Self> {
        self.combine_bc_left(rhs, |a, b| a.mul(b), T::ONE)
    }

    pub fn div_bc_left(&self, rhs: &Self) -> NdResult<Self> {
        self.combine_bc_left(&rhs.inv(), |a, b| a.mul(b), T::ONE)
    }

    /// Addition through the tiling strategy: both operands are lifted to the
    /// result shape by repetition, then zipped flat.
    pub fn add_tiled(&self, rhs: &Self) -> NdResult<Self> {
        let (nshape, lrep, rrep) = shape::broadcast_shapes_tiled(&self.shape, &rhs.shape)?;

        let l = if shape::element_count(&lrep) == 1 {
            self.clone()
        } else {
            self.tile(&lrep)?
        };
        let r = if shape::element_count(&rrep) == 1 {
            rhs.clone()
        } else {
            rhs.tile(&rrep)?
        };

        let data = l
            .as_slice()
            .iter()
            .zip(r.as_slice())
            .map(|(&a, &b)| a.add(b))
            .collect();
        Ok(NDarray::from_parts(data, nshape))
    }

    /// Fold elements with `f` starting from `start`. `None` folds everything
    /// into a single element; `Some(axis)` folds along that axis only.
    pub fn reduce(
        &self,
        axis: Option<usize>,
        keepdims: bool,
        start: T,
        f: impl Fn(T, T) -> T,
    ) -> NdResult<Self> {
        self.reduce_impl(axis, keepdims, start, f, false)
    }

    fn reduce_impl(
        &self,
        axis: Option<usize>,
        keepdims: bool,
        start: T,
        f: impl Fn(T, T) -> T,
        mean: bool,
    ) -> NdResult<Self> {
        let out_shape = shape::prepare_axis_reduce(&self.shape, axis, keepdims)?;

        match axis {
            None => {
                let nb = if mean {
                    T::from_f64(self.count() as f64)
                } else {
                    T::ONE
                };
                let mut res = start;
                for &x in &self.data {
                    res = f(res, x);
                }
                Ok(NDarray::full(&out_shape, res.div(nb)))
            }
            Some(ax) => {
                // iterate the keepdims shape, pinning the reduced axis
                let ishape = shape::prepare_axis_reduce(&self.shape, Some(ax), true)?;
                let nb = if mean {
                    T::from_f64(self.shape[ax] as f64)
                } else {
                    T::ONE
                };

                let count = shape::element_count(&ishape);
                let mut indices = vec![0; ishape.len()];
                let mut data = Vec::with_capacity(count);
                for idx in 0..count {
                    shape::linear_to_multi(idx, &ishape, &mut indices);
                    let mut res = start;
                    for k in 0..self.shape[ax] {
                        indices[ax] = k;
                        res = f(res, self.data[shape::multi_to_linear(&indices, &self.strides)]);
                    }
                    data.push(res.div(nb));
                }
                Ok(NDarray::from_parts(data, out_shape))
            }
        }
    }

    pub fn sum(&self, axis: Option<usize>, keepdims: bool) -> NdResult<Self> {
        self.reduce_impl(axis, keepdims, T::ZERO, |a, b| a.add(b), false)
    }

    pub fn prod(&self, axis: Option<usize>, keepdims: bool) -> NdResult<Self> {
        self.reduce_impl(axis, keepdims, T::ONE, |a, b| a.mul(b), false)
    }

    pub fn mean(&self, axis: Option<usize>, keepdims: bool) -> NdResult<Self> {
        self.reduce_impl(axis, keepdims, T::ZERO, |a, b| a.add(b), true)
    }

    fn arg_reduce(&self, axis: isize, f: impl Fn(T, T) -> T, worst: T) -> NdResult<NDarray<i32>> {
        let (ax, ishape, nshape) = shape::prepare_arg_reduce(&self.shape, axis)?;

        let count = shape::element_count(&nshape);
        let mut indices = vec![0; ishape.len()];
        let mut data = Vec::with_capacity(count);
        for idx in 0..count {
            shape::linear_to_multi(idx, &ishape, &mut indices);
            let mut best = worst;
            let mut best_k = 0usize;
            for k in 0..self.shape[ax] {
                indices[ax] = k;
                let v = self.data[shape::multi_to_linear(&indices, &self.strides)];
                let v0 = f(v, best);
                // ties keep the earliest winner: only a strict improvement moves it
                if v0 != best {
                    best = v0;
                    best_k = k;
                }
            }
            data.push(best_k as i32);
        }

        Ok(NDarray::from_parts(data, nshape))
    }

    /// Index of the smallest element along `axis` (negative axes wrap).
    pub fn argmin(&self, axis: isize) -> NdResult<NDarray<i32>> {
        self.arg_reduce(axis, |a, b| a.min(b), T::MAX_VALUE)
    }

    /// Index of the largest element along `axis` (negative axes wrap).
    pub fn argmax(&self, axis: isize) -> NdResult<NDarray<i32>> {
        self.arg_reduce(axis, |a, b| a.max(b), T::MIN_VALUE)
    }

    /// General contraction: the last axis of `self` against the
    /// second-to-last axis of `rhs`. 1-D operands are promoted with an
    /// identity axis that the result keeps.
    pub fn dot(&self, rhs: &Self) -> NdResult<Self> {
        let plan = shape::prepare_dot(&self.shape, &rhs.shape)?;

        let lhs = if self.rank() == plan.lshape.len() {
            self.clone()
        } else {
            NDarray::from_parts(self.data.clone(), plan.lshape.clone())
        };
        let rhs = if rhs.rank() == plan.rshape.len() {
            rhs.clone()
        } else {
            NDarray::from_parts(rhs.data.clone(), plan.rshape.clone())
        };

        let l = plan.lshape.len();
        let r = plan.rshape.len();
        let piv = plan.lshape[l - 1];

        let count = shape::element_count(&plan.shape);
        let mut indices = vec![0; plan.shape.len()];
        let mut l_idx = vec![0; l];
        let mut r_idx = vec![0; r];
        let mut data = Vec::with_capacity(count);

        for idx in 0..count {
            shape::linear_to_multi(idx, &plan.shape, &mut indices);
            for k in 0..plan.shape.len() {
                if k < l - 1 {
                    l_idx[plan.idx_map[k]] = indices[k];
                } else {
                    r_idx[plan.idx_map[k]] = indices[k];
                }
            }

            let mut sum = T::ZERO;
            for i in 0..piv {
                l_idx[l - 1] = i;
                r_idx[r - 2] = i;
                let a = lhs.data[shape::multi_to_linear(&l_idx, &lhs.strides)];
                let b = rhs.data[shape::multi_to_linear(&r_idx, &rhs.strides)];
                sum = sum.add(a.mul(b));
            }
            data.push(sum);
        }

        Ok(NDarray::from_parts(data, plan.shape))
    }

    /// Same contraction as [`dot`](NDarray::dot), computed as one flattened
    /// 2-D matrix product.
    pub fn matmul(&self, rhs: &Self) -> NdResult<Self> {
        let plan = shape::prepare_matmul(&self.shape, &rhs.shape)?;

        let l = NDarray::from_parts(self.data.clone(), plan.lflat.clone());
        let rp = NDarray::from_parts(rhs.data.clone(), plan.rpromoted.clone());
        let r = NDarray::from_parts(rp.transpose(&plan.table)?.data, plan.rflat.clone());

        let (m, p) = (l.shape[0], l.shape[1]);
        let n = r.shape[1];
        let mut data = vec![T::ZERO; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut sum = T::ZERO;
                for k in 0..p {
                    sum = sum.add(l.data[i * p + k].mul(r.data[k * n + j]));
                }
                data[i * n + j] = sum;
            }
        }

        Ok(NDarray::from_parts(data, plan.shape))
    }

    /// Repeat the array along each axis; repetitions align to the trailing
    /// axes and extra leading entries prepend new axes.
    pub fn tile(&self, reps: &[usize]) -> NdResult<Self> {
        let nshape = shape::prepare_tile(&self.shape, reps)?;

        let count = shape::element_count(&nshape);
        let mut out_idx = vec![0; nshape.len()];
        let mut in_idx = vec![0; self.rank()];
        let mut data = Vec::with_capacity(count);
        for idx in 0..count {
            shape::linear_to_multi(idx, &nshape, &mut out_idx);
            for k in 0..self.rank().min(nshape.len()) {
                let i = self.rank() - 1 - k;
                let j = nshape.len() - 1 - k;
                in_idx[i] = out_idx[j] % self.shape[i];
            }
            data.push(self.data[shape::multi_to_linear(&in_idx, &self.strides)]);
        }

        Ok(NDarray::from_parts(data, nshape))
    }
}
