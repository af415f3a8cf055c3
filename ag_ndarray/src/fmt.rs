//! Nested-bracket rendering, numpy style: innermost axes on one line,
//! elements padded to a common width.

use std::fmt;

use ag_kernel::NumKernel;

use crate::array::NDarray;
use crate::shape;

impl<T: NumKernel> fmt::Display for NDarray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.data.iter().map(|x| x.to_string()).collect();
        let width = cells.iter().map(|c| c.len()).max().unwrap_or(0);
        write_block(f, &cells, &self.shape, 0, 0, width)
    }
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    cells: &[String],
    shape: &[usize],
    dim: usize,
    base: usize,
    width: usize,
) -> fmt::Result {
    if dim == shape.len() - 1 {
        write!(f, "[")?;
        for k in 0..shape[dim] {
            if k > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:>width$}", cells[base + k])?;
        }
        return write!(f, "]");
    }

    let block = shape::element_count(&shape[dim + 1..]);
    write!(f, "[")?;
    for k in 0..shape[dim] {
        if k > 0 {
            writeln!(f)?;
            write!(f, "{:indent$}", "", indent = dim + 1)?;
        }
        write_block(f, cells, shape, dim + 1, base + k * block, width)?;
    }
    write!(f, "]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_vectors_and_matrices() {
        let v = NDarray::from_vec(vec![1, 2, 30], &[3]).unwrap();
        assert_eq!(v.to_string(), "[ 1  2 30]");

        let m = NDarray::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        assert_eq!(m.to_string(), "[[1 2]\n [3 4]]");
    }

    #[test]
    fn renders_rank_three() {
        let a = NDarray::from_vec((0..8).collect::<Vec<i32>>(), &[2, 2, 2]).unwrap();
        assert_eq!(
            a.to_string(),
            "[[[0 1]\n  [2 3]]\n [[4 5]\n  [6 7]]]"
        );
    }
}
