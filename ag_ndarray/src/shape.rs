//! Shape algebra: pure functions over `&[usize]` shapes.
//!
//! Everything here is planning. The functions validate shapes, resolve
//! broadcasts and produce the index tables the array engine then drives its
//! gather loops with; none of them touch element data.

use crate::error::{NdError, NdResult};

/// Number of elements a shape addresses.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major strides: last axis is contiguous.
pub fn strides_from(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for k in (0..shape.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1] * shape[k + 1];
    }
    strides
}

/// Decompose a linear offset into per-axis indices, written into `indices`.
pub fn linear_to_multi(mut idx: usize, shape: &[usize], indices: &mut [usize]) {
    for k in (0..shape.len()).rev() {
        indices[k] = idx % shape[k];
        idx /= shape[k];
    }
}

/// Recompose per-axis indices into a linear offset under `strides`.
pub fn multi_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices.iter().zip(strides).map(|(i, s)| i * s).sum()
}

/// Reinterpret a linear offset of the row-major layout of `shape` through a
/// different stride table. This is the whole of transpose: walk the output
/// offsets in order and remap each one through the permuted strides.
pub fn remap_linear(mut idx: usize, shape: &[usize], strides: &[usize]) -> usize {
    let mut out = 0;
    for k in (0..shape.len()).rev() {
        out += strides[k] * (idx % shape[k]);
        idx /= shape[k];
    }
    out
}

/// Resolve two shapes right-aligned: axes must match or be 1, missing leading
/// axes count as 1, the result takes the larger extent.
pub fn broadcast_shapes(left: &[usize], right: &[usize]) -> NdResult<Vec<usize>> {
    let rank = left.len().max(right.len());
    let mut nshape = vec![0; rank];

    for k in 0..rank {
        let d0 = if k < left.len() { left[left.len() - 1 - k] } else { 1 };
        let d1 = if k < right.len() { right[right.len() - 1 - k] } else { 1 };
        if d0 != d1 && d0 != 1 && d1 != 1 {
            return Err(NdError::BroadcastMismatch {
                left: left.to_vec(),
                right: right.to_vec(),
            });
        }
        nshape[rank - 1 - k] = d0.max(d1);
    }

    Ok(nshape)
}

/// Broadcast resolution for the tiling strategy: besides the result shape,
/// return the per-axis repetition counts that lift each operand to it. Axes
/// the operand does not cover repeat by the full result extent.
pub fn broadcast_shapes_tiled(
    left: &[usize],
    right: &[usize],
) -> NdResult<(Vec<usize>, Vec<usize>, Vec<usize>)> {
    let nshape = broadcast_shapes(left, right)?;
    let mut lrep = nshape.clone();
    let mut rrep = nshape.clone();

    for k in 0..nshape.len() {
        let kn = nshape.len() - 1 - k;
        if k < left.len() {
            lrep[kn] = nshape[kn] / left[left.len() - 1 - k];
        }
        if k < right.len() {
            rrep[kn] = nshape[kn] / right[right.len() - 1 - k];
        }
    }

    Ok((nshape, lrep, rrep))
}

/// Resolve a requested shape for `count` elements. At most one `-1` entry is
/// allowed and is inferred from the remaining extents.
pub fn prepare_reshape(count: usize, shape: &[isize]) -> NdResult<Vec<usize>> {
    let holes = shape.iter().filter(|&&d| d == -1).count();
    if holes > 1 {
        return Err(NdError::ReshapePlaceholders { shape: shape.to_vec() });
    }
    if shape.iter().any(|&d| d < -1) {
        return Err(NdError::ReshapeCount { count, shape: shape.to_vec() });
    }

    let known: usize = shape
        .iter()
        .filter(|&&d| d != -1)
        .map(|&d| d as usize)
        .product();

    let mut nshape = Vec::with_capacity(shape.len());
    for &d in shape {
        if d == -1 {
            if known == 0 || count % known != 0 {
                return Err(NdError::ReshapeCount { count, shape: shape.to_vec() });
            }
            nshape.push(count / known);
        } else {
            nshape.push(d as usize);
        }
    }

    if element_count(&nshape) != count {
        return Err(NdError::ReshapeCount { count, shape: shape.to_vec() });
    }

    Ok(nshape)
}

/// Default transpose table: reverse all axes.
pub fn prepare_transpose(rank: usize) -> Vec<usize> {
    (0..rank).rev().collect()
}

/// Gather `arr` through a permutation table: `out[i] = arr[table[i]]`.
pub fn permute(arr: &[usize], table: &[usize]) -> Vec<usize> {
    table.iter().map(|&k| arr[k]).collect()
}

/// Check that `table` is a permutation of `0..rank`.
pub fn validate_permutation(table: &[usize], rank: usize) -> NdResult<()> {
    let mut seen = vec![false; rank];
    let ok = table.len() == rank
        && table.iter().all(|&k| {
            if k >= rank || seen[k] {
                false
            } else {
                seen[k] = true;
                true
            }
        });
    if ok {
        Ok(())
    } else {
        Err(NdError::BadPermutation {
            table: table.to_vec(),
            rank,
        })
    }
}

/// Output shape of a reduction. `None` reduces every axis; with `keepdims`
/// the reduced axes stay as extent 1, otherwise they are removed (a shape
/// reduced away entirely collapses to `[1]`).
pub fn prepare_axis_reduce(
    shape: &[usize],
    axis: Option<usize>,
    keepdims: bool,
) -> NdResult<Vec<usize>> {
    match axis {
        None => {
            if keepdims {
                Ok(vec![1; shape.len()])
            } else {
                Ok(vec![1])
            }
        }
        Some(ax) => {
            if ax >= shape.len() {
                return Err(NdError::AxisOutOfRange {
                    axis: ax as isize,
                    rank: shape.len(),
                });
            }
            let mut nshape = shape.to_vec();
            nshape[ax] = 1;
            if !keepdims {
                nshape.remove(ax);
                if nshape.is_empty() {
                    nshape.push(1);
                }
            }
            Ok(nshape)
        }
    }
}

/// Plan an arg-reduction along `axis` (negative axes wrap, Python style).
/// Returns the normalized axis, the iteration shape (reduced axis pinned to
/// extent 1) and the output shape (reduced axis removed).
pub fn prepare_arg_reduce(
    shape: &[usize],
    axis: isize,
) -> NdResult<(usize, Vec<usize>, Vec<usize>)> {
    let rank = shape.len() as isize;
    if axis < -rank || axis >= rank {
        return Err(NdError::AxisOutOfRange {
            axis,
            rank: shape.len(),
        });
    }
    let ax = axis.rem_euclid(rank) as usize;

    let mut ishape = shape.to_vec();
    ishape[ax] = 1;

    let mut nshape: Vec<usize> = shape
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != ax)
        .map(|(_, &v)| v)
        .collect();
    if nshape.is_empty() {
        nshape.push(1);
    }

    Ok((ax, ishape, nshape))
}

/// Index plan for the general N-dimensional contraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPlan {
    /// Left shape, 1-D operands promoted to `[1, n]`.
    pub lshape: Vec<usize>,
    /// Right shape, 1-D operands promoted to `[n, 1]`.
    pub rshape: Vec<usize>,
    /// Result shape: left shape minus its last axis, then right shape minus
    /// its second-to-last axis.
    pub shape: Vec<usize>,
    /// For each result axis, the operand axis it indexes (left axes first).
    pub idx_map: Vec<usize>,
}

/// Plan `left . right`: the last axis of `left` contracts against the
/// second-to-last axis of `right`.
pub fn prepare_dot(left: &[usize], right: &[usize]) -> NdResult<DotPlan> {
    let lshape = if left.len() == 1 {
        vec![1, left[0]]
    } else {
        left.to_vec()
    };
    let rshape = if right.len() == 1 {
        vec![right[0], 1]
    } else {
        right.to_vec()
    };

    let l = lshape.len();
    let r = rshape.len();
    let piv = lshape[l - 1];
    if piv != rshape[r - 2] {
        return Err(NdError::DotMismatch {
            left: left.to_vec(),
            right: right.to_vec(),
        });
    }

    let mut shape = vec![0; l + r - 2];
    let mut idx_map = vec![0; l + r - 2];
    let mut k0 = 0;
    for k in 0..l + r {
        if k == l - 1 || k == l + r - 2 {
            continue;
        }
        if k < l - 1 {
            shape[k0] = lshape[k];
            idx_map[k0] = k;
        } else {
            shape[k0] = rshape[k - l];
            idx_map[k0] = k - l;
        }
        k0 += 1;
    }

    Ok(DotPlan {
        lshape,
        rshape,
        shape,
        idx_map,
    })
}

/// Plan for the 2-D flattening fast path of the contraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatmulPlan {
    /// Promoted right shape, before transposition.
    pub rpromoted: Vec<usize>,
    /// Left flattened to `[m, piv]`.
    pub lflat: Vec<usize>,
    /// Right (transposed) flattened to `[piv, n]`.
    pub rflat: Vec<usize>,
    /// Permutation bringing the right contraction axis to the front while
    /// keeping the last axis in place.
    pub table: Vec<usize>,
    /// Result shape, identical to the general plan's.
    pub shape: Vec<usize>,
}

/// Plan the contraction as a single 2-D matrix product: flatten the left
/// leading axes into rows, rotate the right contraction axis to the front and
/// flatten its trailing axes into columns.
pub fn prepare_matmul(left: &[usize], right: &[usize]) -> NdResult<MatmulPlan> {
    let plan = prepare_dot(left, right)?;
    let piv = *plan.lshape.last().unwrap_or(&1);
    let r = plan.rshape.len();

    let lflat = prepare_reshape(element_count(&plan.lshape), &[-1, piv as isize])?;
    let rflat = prepare_reshape(element_count(&plan.rshape), &[piv as isize, -1])?;

    // [r-2, 0, 1, .., r-3, r-1]
    let mut table = Vec::with_capacity(r);
    table.push(r - 2);
    table.extend(0..r - 2);
    table.push(r - 1);

    Ok(MatmulPlan {
        rpromoted: plan.rshape,
        lflat,
        rflat,
        table,
        shape: plan.shape,
    })
}

/// Result shape of tiling: repetitions align to the trailing axes, extra
/// leading repetition entries prepend new axes.
pub fn prepare_tile(shape: &[usize], reps: &[usize]) -> NdResult<Vec<usize>> {
    if reps.iter().any(|&r| r == 0) {
        return Err(NdError::ZeroRepeat { reps: reps.to_vec() });
    }

    let mut nshape = if shape.len() >= reps.len() {
        shape.to_vec()
    } else {
        reps.to_vec()
    };
    let mut i = reps.len() as isize - 1;
    let mut j = shape.len() as isize - 1;
    while i >= 0 && j >= 0 {
        let k = i.max(j) as usize;
        nshape[k] = shape[j as usize] * reps[i as usize];
        i -= 1;
        j -= 1;
    }

    Ok(nshape)
}
