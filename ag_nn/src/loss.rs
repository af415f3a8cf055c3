//! Mean squared error.

use ag_graph::Function;
use ag_ndarray::{NDarray, NdResult};

/// MSE reported as the mean of 0.5 (p - y)^2. The gradient seeded into the
/// graph is p - y, the derivative of the *summed* halved squares; the 1/n
/// factor is a reporting convention only, matching the training loop this
/// loss was built for.
pub struct MseLoss;

impl MseLoss {
    pub fn loss(&self, target: &NDarray<f64>, prediction: &NDarray<f64>) -> NdResult<f64> {
        let half_sq = prediction.sub(target)?.sq().apply(|v| v * 0.5);
        Ok(half_sq.mean(None, false)?.as_slice()[0])
    }

    pub fn grad(&self, target: &NDarray<f64>, prediction: &NDarray<f64>) -> NdResult<NDarray<f64>> {
        prediction.sub(target)
    }

    /// Seed a backward pass from `output` against `target`.
    pub fn backward(&self, output: &Function, target: &NDarray<f64>) -> NdResult<()> {
        let dy = self.grad(target, &output.value())?;
        output.backward(&dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_and_grad_values() {
        let y = NDarray::from_vec(vec![0.0, 1.0], &[2, 1]).unwrap();
        let p = NDarray::from_vec(vec![1.0, 3.0], &[2, 1]).unwrap();
        let mse = MseLoss;
        // 0.5 * (1 + 4) / 2
        assert!((mse.loss(&y, &p).unwrap() - 1.25).abs() < 1e-12);
        assert_eq!(mse.grad(&y, &p).unwrap().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn perfect_prediction_has_zero_loss() {
        let y = NDarray::from_vec(vec![0.25, 0.75], &[2, 1]).unwrap();
        let mse = MseLoss;
        assert_eq!(mse.loss(&y, &y).unwrap(), 0.0);
        assert!(mse.grad(&y, &y).unwrap().as_slice().iter().all(|&g| g == 0.0));
    }
}
