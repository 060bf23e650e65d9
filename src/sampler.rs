//! Conjugate Gaussian update of a single entity.
//!
//! Given the entity's prior `N(μ, Λ⁻¹)`, its ratings `r_j` against opposite
//! vectors `v_j` and noise precision `α`, the posterior precision and linear
//! term are
//!
//! ```text
//! Λ* = Λ + α Σ v_j v_jᵀ
//! rr = Λ μ + α Σ v_j (r_j − r̄)
//! ```
//!
//! With `Λ* = L Lᵀ`, the draw `u = L⁻ᵀ (L⁻¹ rr + z)`, `z ~ N(0, I)`, is a
//! sample of `N(Λ*⁻¹ rr, Λ*⁻¹)`. [`Strategy`] only changes how `L` is
//! obtained; every variant yields the same `u` up to rounding.

use nalgebra::{Cholesky, DMatrix, DVector, DVectorView, Dyn};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::bpmf_error::BpmfError;
use crate::config::SamplerConfig;

/// How the posterior precision is factorized, chosen by row density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Factor the prior once, then one rank-1 update per rating.
    Incremental,
    /// Accumulate `Σ v vᵀ` (upper triangle), mirror, factor once.
    FullCholesky,
    /// As [`Strategy::FullCholesky`], with the accumulation split over rayon
    /// tasks and combined by summation.
    ParallelFullCholesky,
}

impl Strategy {
    pub fn select(nnz: usize, cfg: &SamplerConfig) -> Self {
        if nnz < cfg.incremental_below {
            Strategy::Incremental
        } else if nnz < cfg.parallel_from {
            Strategy::FullCholesky
        } else {
            Strategy::ParallelFullCholesky
        }
    }
}

/// Gaussian prior in (mean, precision) form.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianPrior {
    pub mu: DVector<f64>,
    pub lambda: DMatrix<f64>,
}

impl GaussianPrior {
    /// `N(0, I)` in `k` dimensions.
    pub fn standard(k: usize) -> Self {
        Self {
            mu: DVector::zeros(k),
            lambda: DMatrix::identity(k, k),
        }
    }

    pub fn dim(&self) -> usize {
        self.mu.len()
    }

    pub fn check_dim(&self, k: usize) -> Result<(), BpmfError> {
        if self.mu.len() != k {
            return Err(BpmfError::DimensionMismatch {
                what: "prior mean",
                expected: k,
                found: self.mu.len(),
            });
        }
        if self.lambda.shape() != (k, k) {
            return Err(BpmfError::DimensionMismatch {
                what: "prior precision rows",
                expected: k,
                found: self.lambda.nrows(),
            });
        }
        Ok(())
    }
}

/// Everything one draw depends on.
#[derive(Debug, Clone, Copy)]
pub struct PosteriorInput<'a> {
    /// Entity index, reported on failure.
    pub entity: usize,
    pub prior: &'a GaussianPrior,
    /// Opposite entity of every rating.
    pub indices: &'a [usize],
    pub values: &'a [f64],
    /// Opposite factor matrix, one column per opposite entity.
    pub opposite: &'a DMatrix<f64>,
    pub alpha: f64,
    pub mean_rating: f64,
}

impl PosteriorInput<'_> {
    fn nnz(&self) -> usize {
        self.indices.len()
    }

    fn not_pd(&self) -> BpmfError {
        BpmfError::NotPositiveDefinite {
            entity: self.entity,
            nnz: self.nnz(),
        }
    }
}

/// `mm += v vᵀ`, upper triangle only.
fn add_upper(mm: &mut DMatrix<f64>, v: &DVectorView<'_, f64>) {
    let k = v.len();
    for j in 0..k {
        for i in 0..=j {
            mm[(i, j)] += v[j] * v[i];
        }
    }
}

/// Copy the upper triangle onto the lower one.
fn mirror_upper(mm: &mut DMatrix<f64>) {
    let k = mm.nrows();
    for j in 1..k {
        for i in 0..j {
            mm[(j, i)] = mm[(i, j)];
        }
    }
}

/// Cholesky factor of `Λ*` and the linear term `rr`.
pub fn factorize(
    strategy: Strategy,
    input: &PosteriorInput<'_>,
    parallel_grain: usize,
) -> Result<(Cholesky<f64, Dyn>, DVector<f64>), BpmfError> {
    let k = input.prior.dim();
    let alpha = input.alpha;
    let mean = input.mean_rating;
    let mut rr = &input.prior.lambda * &input.prior.mu;

    let chol = match strategy {
        Strategy::Incremental => {
            let mut chol =
                Cholesky::new(input.prior.lambda.clone()).ok_or_else(|| input.not_pd())?;
            for (&j, &r) in input.indices.iter().zip(input.values) {
                let col = input.opposite.column(j);
                chol.rank_one_update(&col, alpha);
                rr.axpy((r - mean) * alpha, &col, 1.0);
            }
            chol
        }
        Strategy::FullCholesky => {
            let mut mm = DMatrix::zeros(k, k);
            for (&j, &r) in input.indices.iter().zip(input.values) {
                let col = input.opposite.column(j);
                add_upper(&mut mm, &col);
                rr.axpy((r - mean) * alpha, &col, 1.0);
            }
            mirror_upper(&mut mm);
            Cholesky::new(&input.prior.lambda + mm * alpha).ok_or_else(|| input.not_pd())?
        }
        Strategy::ParallelFullCholesky => {
            let zeros = || (DMatrix::<f64>::zeros(k, k), DVector::<f64>::zeros(k));
            let (mut mm, lin) = input
                .indices
                .par_iter()
                .zip(input.values.par_iter())
                .with_min_len(parallel_grain.max(1))
                .fold(zeros, |(mut mm, mut lin), (&j, &r)| {
                    let col = input.opposite.column(j);
                    add_upper(&mut mm, &col);
                    lin.axpy((r - mean) * alpha, &col, 1.0);
                    (mm, lin)
                })
                .reduce(zeros, |(a, x), (b, y)| (a + b, x + y));
            mirror_upper(&mut mm);
            rr += lin;
            Cholesky::new(&input.prior.lambda + mm * alpha).ok_or_else(|| input.not_pd())?
        }
    };
    Ok((chol, rr))
}

/// Draw one posterior sample using the standard-normal vector `noise`.
pub fn draw(
    strategy: Strategy,
    input: &PosteriorInput<'_>,
    noise: &DVector<f64>,
    parallel_grain: usize,
) -> Result<DVector<f64>, BpmfError> {
    let k = input.prior.dim();
    if noise.len() != k {
        return Err(BpmfError::DimensionMismatch {
            what: "noise vector",
            expected: k,
            found: noise.len(),
        });
    }
    let (chol, mut rr) = factorize(strategy, input, parallel_grain)?;
    let l = chol.l();
    if !l.solve_lower_triangular_mut(&mut rr) {
        return Err(input.not_pd());
    }
    rr += noise;
    if !l.tr_solve_lower_triangular_mut(&mut rr) {
        return Err(input.not_pd());
    }
    Ok(rr)
}

/// `k` independent standard-normal draws.
pub fn standard_normal<R: Rng>(rng: &mut R, k: usize) -> DVector<f64> {
    DVector::from_iterator(k, (0..k).map(|_| rng.sample::<f64, _>(StandardNormal)))
}
