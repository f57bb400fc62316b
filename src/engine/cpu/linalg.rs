//! Decomposition and solver kernels for the reference engine
//!
//! LU (Doolittle, partial pivoting) is generic over the scalar field; QR
//! (Householder reflections) and SVD (one-sided Jacobi) operate in real
//! space, which bounds the decomposition support of this engine to the
//! real domain.

use super::field::Field;
use crate::container::DenseMatrix;
use crate::engine::{EngineFailure, EngineResult};

fn singular() -> EngineFailure {
    EngineFailure::computation("matrix is singular to working precision")
}

fn not_square(op: &str, m: usize, n: usize) -> EngineFailure {
    EngineFailure::computation(format!("{op}: matrix must be square, got {m}x{n}"))
}

/// Combined LU factors with the recorded row swaps
struct LuCombined<T> {
    /// m x n working buffer: U on and above the diagonal, L multipliers below
    lu: Vec<T>,
    /// `swaps[col]` is the row swapped into `col` at elimination step `col`
    swaps: Vec<usize>,
    /// True when a pivot column had no nonzero entry
    rank_deficient: bool,
}

/// LU decomposition with partial pivoting (Doolittle algorithm).
///
/// Zero pivot columns are skipped rather than rejected, so singular
/// matrices still factor; solver paths check `rank_deficient`.
fn lu_combined<T: Field>(a: &DenseMatrix<T>) -> LuCombined<T> {
    let (m, n) = (a.rows(), a.cols());
    let k = m.min(n);
    let mut lu: Vec<T> = a.data().to_vec();
    let mut swaps = vec![0usize; k];
    let mut rank_deficient = false;

    for col in 0..k {
        // pivot: max modulus in column col, rows col..m
        let mut pivot_row = col;
        let mut max_val = lu[col * n + col].modulus();
        for row in (col + 1)..m {
            let val = lu[row * n + col].modulus();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }
        swaps[col] = pivot_row;

        if pivot_row != col {
            for j in 0..n {
                lu.swap(col * n + j, pivot_row * n + j);
            }
        }

        let pivot = lu[col * n + col];
        if pivot.modulus() == 0.0 {
            // column already eliminated; nothing below to clear
            rank_deficient = true;
            continue;
        }

        // multipliers (L column)
        for row in (col + 1)..m {
            lu[row * n + col] = lu[row * n + col] / pivot;
        }

        // update trailing submatrix
        for row in (col + 1)..m {
            let multiplier = lu[row * n + col];
            for j in (col + 1)..n {
                let update = multiplier * lu[col * n + j];
                lu[row * n + j] = lu[row * n + j] - update;
            }
        }
    }

    LuCombined {
        lu,
        swaps,
        rank_deficient,
    }
}

/// Two-output LU factorization: `A = L * U` with L row-permuted.
///
/// L is m x k with the permutation folded back in (the MATLAB two-output
/// convention), U is k x n upper-triangular.
pub(crate) fn lu_factor<T: Field>(a: &DenseMatrix<T>) -> (DenseMatrix<T>, DenseMatrix<T>) {
    let (m, n) = (a.rows(), a.cols());
    let k = m.min(n);
    let fac = lu_combined(a);

    // L from the strict lower triangle, unit diagonal
    let mut l = vec![T::zero(); m * k];
    for i in 0..m {
        for j in 0..k.min(i) {
            l[i * k + j] = fac.lu[i * n + j];
        }
        if i < k {
            l[i * k + i] = T::one();
        }
    }
    // fold the permutation back: rows were swapped at steps 0..k in order,
    // so undoing them in reverse on L gives P^T L
    for col in (0..k).rev() {
        let piv = fac.swaps[col];
        if piv != col {
            for j in 0..k {
                l.swap(col * k + j, piv * k + j);
            }
        }
    }

    let mut u = vec![T::zero(); k * n];
    for i in 0..k {
        for j in i..n {
            u[i * n + j] = fac.lu[i * n + j];
        }
    }

    (
        DenseMatrix::from_raw(m, k, l),
        DenseMatrix::from_raw(k, n, u),
    )
}

/// Solve the square system `A * X = B` via pivoted LU
pub(crate) fn solve<T: Field>(
    a: &DenseMatrix<T>,
    b: &DenseMatrix<T>,
) -> EngineResult<DenseMatrix<T>> {
    let (m, n) = (a.rows(), a.cols());
    if m != n {
        return Err(not_square("solve", m, n));
    }
    if b.rows() != n {
        return Err(EngineFailure::computation(format!(
            "solve: right-hand side has {} rows, expected {n}",
            b.rows()
        )));
    }
    let fac = lu_combined(a);
    if fac.rank_deficient {
        return Err(singular());
    }
    let nrhs = b.cols();
    let mut x: Vec<T> = b.data().to_vec();

    // apply the recorded row swaps to B
    for (col, &piv) in fac.swaps.iter().enumerate() {
        if piv != col {
            for j in 0..nrhs {
                x.swap(col * nrhs + j, piv * nrhs + j);
            }
        }
    }
    // forward substitution with unit-diagonal L
    for i in 0..n {
        for p in 0..i {
            let l_ip = fac.lu[i * n + p];
            for j in 0..nrhs {
                let update = l_ip * x[p * nrhs + j];
                x[i * nrhs + j] = x[i * nrhs + j] - update;
            }
        }
    }
    // back substitution with U
    for i in (0..n).rev() {
        let diag = fac.lu[i * n + i];
        if diag.modulus() < f64::EPSILON {
            return Err(singular());
        }
        for p in (i + 1)..n {
            let u_ip = fac.lu[i * n + p];
            for j in 0..nrhs {
                let update = u_ip * x[p * nrhs + j];
                x[i * nrhs + j] = x[i * nrhs + j] - update;
            }
        }
        for j in 0..nrhs {
            x[i * nrhs + j] = x[i * nrhs + j] / diag;
        }
    }
    Ok(DenseMatrix::from_raw(n, nrhs, x))
}

/// Matrix inverse via LU solve against the identity
pub(crate) fn inverse<T: Field>(a: &DenseMatrix<T>) -> EngineResult<DenseMatrix<T>> {
    let (m, n) = (a.rows(), a.cols());
    if m != n {
        return Err(not_square("inv", m, n));
    }
    let mut eye = vec![T::zero(); n * n];
    for i in 0..n {
        eye[i * n + i] = T::one();
    }
    solve(a, &DenseMatrix::from_raw(n, n, eye))
}

/// QR decomposition using Householder reflections.
///
/// Full form: Q is m x m orthogonal, R is m x n upper-trapezoidal. Thin
/// form: Q is m x k, R is k x n, with k = min(m, n).
pub(crate) fn qr_factor(a: &DenseMatrix<f64>, thin: bool) -> (DenseMatrix<f64>, DenseMatrix<f64>) {
    let (m, n) = (a.rows(), a.cols());
    let k = m.min(n);

    let mut r: Vec<f64> = a.data().to_vec();
    let q_cols = if thin { k } else { m };
    let mut q = vec![0.0f64; m * q_cols];
    for i in 0..q_cols.min(m) {
        q[i * q_cols + i] = 1.0;
    }

    for col in 0..k {
        // x = R[col:m, col]
        let x_len = m - col;
        let mut v: Vec<f64> = (0..x_len).map(|i| r[(col + i) * n + col]).collect();

        let norm_x = v.iter().map(|&x| x * x).sum::<f64>().sqrt();
        if norm_x < f64::EPSILON {
            continue;
        }
        // alpha = -sign(x[0]) * ||x||; v = x - alpha * e1, normalized
        let alpha = if v[0] >= 0.0 { -norm_x } else { norm_x };
        v[0] -= alpha;
        let v_norm = v.iter().map(|&x| x * x).sum::<f64>().sqrt();
        if v_norm < f64::EPSILON {
            continue;
        }
        for val in &mut v {
            *val /= v_norm;
        }

        // R[col:m, col:n] -= 2 v (v^T R[col:m, col:n])
        let mut w = vec![0.0f64; n - col];
        for (i, &vi) in v.iter().enumerate() {
            for (j, wj) in w.iter_mut().enumerate() {
                *wj += vi * r[(col + i) * n + (col + j)];
            }
        }
        for (i, &vi) in v.iter().enumerate() {
            for (j, &wj) in w.iter().enumerate() {
                r[(col + i) * n + (col + j)] -= 2.0 * vi * wj;
            }
        }

        // Q[:, col:m] = Q[:, col:m] (I - 2 v v^T)
        for row in 0..m {
            let mut dot = 0.0;
            for (i, &vi) in v.iter().enumerate() {
                if col + i < q_cols {
                    dot += q[row * q_cols + (col + i)] * vi;
                }
            }
            for (i, &vi) in v.iter().enumerate() {
                if col + i < q_cols {
                    q[row * q_cols + (col + i)] -= 2.0 * dot * vi;
                }
            }
        }
    }

    let r_rows = if thin { k } else { m };
    let mut r_out = vec![0.0f64; r_rows * n];
    for i in 0..r_rows {
        for j in i.min(n)..n {
            r_out[i * n + j] = r[i * n + j];
        }
    }
    (
        DenseMatrix::from_raw(m, q_cols, q),
        DenseMatrix::from_raw(r_rows, n, r_out),
    )
}

/// Least-squares solve of the overdetermined system `A * X = B` via thin QR
pub(crate) fn lstsq(
    a: &DenseMatrix<f64>,
    b: &DenseMatrix<f64>,
) -> EngineResult<DenseMatrix<f64>> {
    let (m, n) = (a.rows(), a.cols());
    if m < n {
        return Err(EngineFailure::computation(
            "mldivide: underdetermined systems are not supported",
        ));
    }
    if b.rows() != m {
        return Err(EngineFailure::computation(format!(
            "mldivide: right-hand side has {} rows, expected {m}",
            b.rows()
        )));
    }
    let (q, r) = qr_factor(a, true);
    let qtb = super::kernels::matmul(&super::kernels::transpose(&q), b)?;

    // back substitution with the n x n upper triangle of R
    let nrhs = qtb.cols();
    let mut x: Vec<f64> = qtb.data().to_vec();
    for i in (0..n).rev() {
        let diag = r.get(i, i);
        if diag.abs() < f64::EPSILON {
            return Err(singular());
        }
        for p in (i + 1)..n {
            let r_ip = r.get(i, p);
            for j in 0..nrhs {
                x[i * nrhs + j] -= r_ip * x[p * nrhs + j];
            }
        }
        for j in 0..nrhs {
            x[i * nrhs + j] /= diag;
        }
    }
    Ok(DenseMatrix::from_raw(n, nrhs, x))
}

/// Real SVD factors: thin U (m x k), singular values (descending), VT (k x n)
pub(crate) struct SvdFactors {
    pub u: DenseMatrix<f64>,
    pub s: Vec<f64>,
    pub vt: DenseMatrix<f64>,
}

/// SVD via the One-Sided Jacobi algorithm.
///
/// Columns of a working copy are repeatedly rotated pairwise until they
/// are mutually orthogonal; the rotations accumulate into V, the surviving
/// column norms are the singular values, and the normalized columns are U.
/// Wide inputs are handled by factoring the transpose and swapping U/VT.
pub(crate) fn svd_factor(a: &DenseMatrix<f64>) -> SvdFactors {
    let (m, n) = (a.rows(), a.cols());
    let k = m.min(n);

    let transpose_input = m < n;
    let (work_m, work_n) = if transpose_input { (n, m) } else { (m, n) };

    let mut b: Vec<f64> = if transpose_input {
        let mut bt = vec![0.0; work_m * work_n];
        for i in 0..m {
            for j in 0..n {
                bt[j * work_n + i] = a.get(i, j);
            }
        }
        bt
    } else {
        a.data().to_vec()
    };

    // V accumulates the column rotations
    let mut v = vec![0.0f64; work_n * work_n];
    for i in 0..work_n {
        v[i * work_n + i] = 1.0;
    }

    let tol = (work_n as f64) * f64::EPSILON;
    let max_sweeps = 30;

    for _sweep in 0..max_sweeps {
        let mut off_diag_sum = 0.0f64;
        for p in 0..work_n {
            for q in (p + 1)..work_n {
                // Gram elements of columns p and q
                let (mut a_pp, mut a_qq, mut a_pq) = (0.0, 0.0, 0.0);
                for i in 0..work_m {
                    let bp = b[i * work_n + p];
                    let bq = b[i * work_n + q];
                    a_pp += bp * bp;
                    a_qq += bq * bq;
                    a_pq += bp * bq;
                }
                off_diag_sum += a_pq * a_pq;
                if a_pq.abs() < tol * (a_pp * a_qq).sqrt() {
                    continue;
                }

                // numerically stable rotation parameters
                let tau_den = 2.0 * a_pq;
                let (c, s) = if tau_den.abs() < 1e-300 {
                    (1.0, 0.0)
                } else {
                    let tau = (a_qq - a_pp) / tau_den;
                    let t = if tau >= 0.0 {
                        1.0 / (tau + (1.0 + tau * tau).sqrt())
                    } else {
                        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                    };
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    (c, t * c)
                };

                rotate_columns(&mut b, work_m, work_n, p, q, c, s);
                rotate_columns(&mut v, work_n, work_n, p, q, c, s);
            }
        }
        if off_diag_sum.sqrt() < tol {
            break;
        }
    }

    // singular values are the column norms; U columns normalize in place
    let mut norms = vec![0.0f64; work_n];
    for (j, norm) in norms.iter_mut().enumerate() {
        let mut sq = 0.0;
        for i in 0..work_m {
            sq += b[i * work_n + j] * b[i * work_n + j];
        }
        *norm = sq.sqrt();
        if *norm > f64::EPSILON {
            for i in 0..work_m {
                b[i * work_n + j] /= *norm;
            }
        }
    }

    // sort descending, keeping U and V columns aligned
    let mut order: Vec<usize> = (0..work_n).collect();
    order.sort_by(|&i, &j| {
        norms[j]
            .partial_cmp(&norms[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let work_k = work_m.min(work_n);
    let s_sorted: Vec<f64> = order.iter().take(work_k).map(|&i| norms[i]).collect();
    let mut u_sorted = vec![0.0f64; work_m * work_k];
    for (new_idx, &old_idx) in order.iter().take(work_k).enumerate() {
        for i in 0..work_m {
            u_sorted[i * work_k + new_idx] = b[i * work_n + old_idx];
        }
    }
    let mut vt_sorted = vec![0.0f64; work_k * work_n];
    for (new_idx, &old_idx) in order.iter().take(work_k).enumerate() {
        for j in 0..work_n {
            vt_sorted[new_idx * work_n + j] = v[j * work_n + old_idx];
        }
    }

    if transpose_input {
        // A^T = U' S V'^T  =>  A = V' S U'^T
        let mut u_final = vec![0.0f64; m * k];
        for i in 0..k {
            for j in 0..m {
                u_final[j * k + i] = vt_sorted[i * work_n + j];
            }
        }
        let mut vt_final = vec![0.0f64; k * n];
        for i in 0..work_m {
            for j in 0..work_k {
                vt_final[j * n + i] = u_sorted[i * work_k + j];
            }
        }
        SvdFactors {
            u: DenseMatrix::from_raw(m, k, u_final),
            s: s_sorted,
            vt: DenseMatrix::from_raw(k, n, vt_final),
        }
    } else {
        SvdFactors {
            u: DenseMatrix::from_raw(m, k, u_sorted),
            s: s_sorted,
            vt: DenseMatrix::from_raw(k, n, vt_sorted),
        }
    }
}

#[inline]
fn rotate_columns(data: &mut [f64], rows: usize, cols: usize, p: usize, q: usize, c: f64, s: f64) {
    for i in 0..rows {
        let vp = data[i * cols + p];
        let vq = data[i * cols + q];
        data[i * cols + p] = c * vp - s * vq;
        data[i * cols + q] = s * vp + c * vq;
    }
}

/// Moore-Penrose pseudo-inverse via SVD
pub(crate) fn pinv(a: &DenseMatrix<f64>) -> DenseMatrix<f64> {
    let (m, n) = (a.rows(), a.cols());
    let f = svd_factor(a);
    let smax = f.s.first().copied().unwrap_or(0.0);
    let cutoff = m.max(n) as f64 * smax * f64::EPSILON;

    // pinv(A) = V S^+ U^T, assembled column by column
    let mut out = vec![0.0f64; n * m];
    for (idx, &sv) in f.s.iter().enumerate() {
        if sv <= cutoff {
            continue;
        }
        let inv = 1.0 / sv;
        for i in 0..n {
            let v_i = f.vt.get(idx, i);
            for j in 0..m {
                out[i * m + j] += v_i * inv * f.u.get(j, idx);
            }
        }
    }
    DenseMatrix::from_raw(n, m, out)
}

/// Largest singular value
pub(crate) fn matrix_norm2(a: &DenseMatrix<f64>) -> f64 {
    svd_factor(a).s.first().copied().unwrap_or(0.0)
}
