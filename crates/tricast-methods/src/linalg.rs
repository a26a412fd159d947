// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Dense solver for the small normal-equation systems used by the
//! least-squares fits (ARIMA stages, ridge meta-learner).

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the system is singular (pivot below `tolerance`),
/// which callers treat as a model-fit failure.
pub(crate) fn solve_linear_system(
    mut a: Vec<Vec<f64>>,
    mut b: Vec<f64>,
    tolerance: f64,
) -> Option<Vec<f64>> {
    let n = a.len();
    if n == 0 || b.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < tolerance {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut acc = b[col];
        for k in col + 1..n {
            acc -= a[col][k] * x[k];
        }
        x[col] = acc / a[col][col];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(x)
}

/// Least squares `argmin_beta ||X beta - y||^2 + lambda ||beta||^2` via the
/// normal equations. With `ridge_skip_first` the first column (by
/// convention the intercept) is left unpenalized.
pub(crate) fn ridge_fit(
    rows: &[Vec<f64>],
    targets: &[f64],
    lambda: f64,
    ridge_skip_first: bool,
) -> Option<Vec<f64>> {
    let n = rows.len();
    if n == 0 || targets.len() != n {
        return None;
    }
    let p = rows[0].len();
    if p == 0 || rows.iter().any(|r| r.len() != p) {
        return None;
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, y) in rows.iter().zip(targets.iter()) {
        for i in 0..p {
            xty[i] += row[i] * y;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }
    for (i, row) in xtx.iter_mut().enumerate() {
        if !(ridge_skip_first && i == 0) {
            row[i] += lambda;
        }
    }

    solve_linear_system(xtx, xty, 1e-12)
}

#[cfg(test)]
mod tests {
    use super::{ridge_fit, solve_linear_system};

    #[test]
    fn solves_a_known_2x2_system() {
        // 2x + y = 5, x - y = 1 -> x = 2, y = 1
        let solution = solve_linear_system(
            vec![vec![2.0, 1.0], vec![1.0, -1.0]],
            vec![5.0, 1.0],
            1e-12,
        )
        .expect("system is regular");
        assert!((solution[0] - 2.0).abs() < 1e-12);
        assert!((solution[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn singular_system_returns_none() {
        let result = solve_linear_system(
            vec![vec![1.0, 2.0], vec![2.0, 4.0]],
            vec![3.0, 6.0],
            1e-12,
        );
        assert!(result.is_none());
    }

    #[test]
    fn rejects_shape_mismatches() {
        assert!(solve_linear_system(vec![vec![1.0, 2.0]], vec![1.0], 1e-12).is_none());
        assert!(solve_linear_system(vec![], vec![], 1e-12).is_none());
    }

    #[test]
    fn ridge_with_zero_lambda_recovers_exact_coefficients() {
        // y = 3 + 2 * x, rows carry an explicit intercept column.
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let beta = ridge_fit(&rows, &targets, 0.0, true).expect("regular fit");
        assert!((beta[0] - 3.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ridge_shrinks_coefficients_toward_zero() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let exact = ridge_fit(&rows, &targets, 0.0, true).expect("exact fit");
        let shrunk = ridge_fit(&rows, &targets, 50.0, true).expect("ridge fit");
        assert!(shrunk[1].abs() < exact[1].abs());
    }
}
