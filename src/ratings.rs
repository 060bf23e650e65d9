//! Sparse rating-matrix helpers.
//!
//! All matrices are CSR [`CsMat<f64>`] with the owning entity type as rows.
//! Row permutation works on the raw arrays and transposition goes through a
//! storage conversion, so the sparsity pattern, explicit zeros included,
//! survives unchanged. This keeps the held-out matrix and its
//! running-statistics companions aligned entry by entry.

use sprs::{CsMat, TriMat};

use crate::bpmf_error::BpmfError;

/// Build a CSR matrix from `(row, col, value)` triplets. Duplicates are summed.
pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> CsMat<f64> {
    let mut tri = TriMat::with_capacity((rows, cols), triplets.len());
    for &(r, c, v) in triplets {
        tri.add_triplet(r, c, v);
    }
    tri.to_csr()
}

/// Convert to CSR if the caller handed in a CSC matrix.
pub fn ensure_csr(m: CsMat<f64>) -> CsMat<f64> {
    if m.is_csr() { m } else { m.to_other_storage() }
}

fn raw_parts(m: &CsMat<f64>) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    let mut indptr = Vec::with_capacity(m.rows() + 1);
    let mut indices = Vec::with_capacity(m.nnz());
    let mut data = Vec::with_capacity(m.nnz());
    indptr.push(0);
    for row in m.outer_iterator() {
        indices.extend_from_slice(row.indices());
        data.extend_from_slice(row.data());
        indptr.push(indices.len());
    }
    (indptr, indices, data)
}

/// Grow `m` to `rows × cols`, keeping every stored entry where it is.
pub fn resize(m: &CsMat<f64>, rows: usize, cols: usize) -> CsMat<f64> {
    debug_assert!(rows >= m.rows() && cols >= m.cols());
    let (mut indptr, indices, data) = raw_parts(m);
    let last = *indptr.last().unwrap_or(&0);
    indptr.resize(rows + 1, last);
    CsMat::new((rows, cols), indptr, indices, data)
}

/// Transpose into a new CSR matrix; row indices stay sorted.
pub fn transpose(m: &CsMat<f64>) -> CsMat<f64> {
    m.transpose_view().to_csr()
}

/// Reorder rows so that new row `i` is old row `perm[i]`.
pub fn permute_rows(m: &CsMat<f64>, perm: &[usize]) -> CsMat<f64> {
    debug_assert_eq!(perm.len(), m.rows());
    let mut indptr = Vec::with_capacity(m.rows() + 1);
    let mut indices = Vec::with_capacity(m.nnz());
    let mut data = Vec::with_capacity(m.nnz());
    indptr.push(0);
    for &old in perm {
        if let Some(row) = m.outer_view(old) {
            indices.extend_from_slice(row.indices());
            data.extend_from_slice(row.data());
        }
        indptr.push(indices.len());
    }
    CsMat::new(m.shape(), indptr, indices, data)
}

/// Number of stored entries in row `i`.
pub fn row_nnz(m: &CsMat<f64>, i: usize) -> usize {
    m.outer_view(i).map_or(0, |row| row.nnz())
}

/// Offsets of each row's first entry in `m.indices()` / `m.data()`, plus
/// the total at the end.
pub fn row_ptr(m: &CsMat<f64>) -> Vec<usize> {
    let mut ptr = Vec::with_capacity(m.rows() + 1);
    ptr.push(0);
    let mut acc = 0;
    for row in m.outer_iterator() {
        acc += row.nnz();
        ptr.push(acc);
    }
    ptr
}

/// Mean of all stored values.
pub fn mean_value(m: &CsMat<f64>) -> f64 {
    let sum: f64 = m.data().iter().sum();
    sum / m.nnz() as f64
}

/// Verify that `b` is the transpose of `a` in shape and per-line counts.
pub fn check_transpose(a: &CsMat<f64>, b: &CsMat<f64>) -> Result<(), BpmfError> {
    if a.rows() != b.cols() {
        return Err(BpmfError::DimensionMismatch {
            what: "transposed columns",
            expected: a.rows(),
            found: b.cols(),
        });
    }
    if a.cols() != b.rows() {
        return Err(BpmfError::DimensionMismatch {
            what: "transposed rows",
            expected: a.cols(),
            found: b.rows(),
        });
    }
    let mut col_counts = vec![0usize; a.cols()];
    for row in a.outer_iterator() {
        for &c in row.indices() {
            col_counts[c] += 1;
        }
    }
    for (j, &expected) in col_counts.iter().enumerate() {
        let found = row_nnz(b, j);
        if found != expected {
            return Err(BpmfError::InvariantViolation(format!(
                "row {j} of transpose holds {found} entries, column holds {expected}"
            )));
        }
    }
    Ok(())
}
