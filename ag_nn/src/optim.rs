//! Plain stochastic gradient descent over a flat parameter list.

use ag_graph::Function;
use ag_ndarray::NdResult;

pub struct Sgd {
    pub lr: f64,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Sgd { lr }
    }

    /// Apply `value <- value - lr * grad` to every parameter.
    pub fn step(&self, params: &[Function]) -> NdResult<()> {
        for param in params {
            param.sgd_step(self.lr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_ndarray::NDarray;

    #[test]
    fn step_updates_every_parameter() {
        let a = Function::variable("a", NDarray::from_vec(vec![1.0], &[1]).unwrap());
        let b = Function::variable("b", NDarray::from_vec(vec![2.0], &[1]).unwrap());
        let y = a.mul(&b);
        y.forward().unwrap();
        y.backward(&NDarray::ones(&[1])).unwrap();

        Sgd::new(0.5).step(&[a.clone(), b.clone()]).unwrap();
        // da = b = 2, db = a = 1
        assert_eq!(a.value().as_slice(), &[0.0]);
        assert_eq!(b.value().as_slice(), &[1.5]);
    }
}
