//! Central-difference gradient estimation, for checking analytic gradients.

/// Estimate d f / d x_i at `at` for every coordinate, with step `eps`.
pub fn central_diff<F>(f: F, at: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grads = Vec::with_capacity(at.len());
    let mut point = at.to_vec();
    for i in 0..at.len() {
        point[i] = at[i] + eps;
        let hi = f(&point);
        point[i] = at[i] - eps;
        let lo = f(&point);
        point[i] = at[i];
        grads.push((hi - lo) / (2.0 * eps));
    }
    grads
}

#[cfg(test)]
mod tests {
    use super::central_diff;

    #[test]
    fn quadratic_gradient() {
        // f(x, y) = x^2 + 3y, grad = (2x, 3)
        let f = |p: &[f64]| p[0] * p[0] + 3.0 * p[1];
        let g = central_diff(f, &[2.0, -1.0], 1e-6);
        assert!((g[0] - 4.0).abs() < 1e-6);
        assert!((g[1] - 3.0).abs() < 1e-6);
    }
}
