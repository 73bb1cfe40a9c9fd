//! Synthetic overlap and noise injection for training data.
//!
//! Real patients rarely present a textbook symptom set. Two transforms make
//! the encoded training matrix less clean:
//!
//! - [`inject_overlap`]: for each class, a few random symptom columns of
//!   every *other* class's rows are resampled from this class's values;
//! - [`inject_noise`]: every cell flips independently with probability `p`.
//!
//! Neither transform changes the matrix shape. Both draw from one seeded
//! generator so a training run is reproducible.

use crate::error::{MedPredictError, Result};
use crate::primitives::Matrix;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Parameters of the perturbation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationConfig {
    /// Columns shared per class during overlap injection
    pub overlap_features: usize,
    /// Per-cell flip probability
    pub noise_probability: f64,
    /// Seed; `None` draws from OS entropy
    pub random_state: Option<u64>,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            overlap_features: 3,
            noise_probability: 0.05,
            random_state: Some(42),
        }
    }
}

impl PerturbationConfig {
    /// Checks that the noise probability lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` otherwise.
    pub fn validate(&self) -> Result<()> {
        check_probability(self.noise_probability)
    }

    /// Generator for this configuration.
    pub fn rng(&self) -> StdRng {
        match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(MedPredictError::invalid_hyperparameter(
            "noise_probability",
            p,
            "0.0..=1.0",
        ))
    }
}

/// Overlap injection.
///
/// For each class in ascending label order, picks `k` distinct columns
/// (`k` clamped to the column count). For every row of every other class,
/// each picked cell is overwritten with a value drawn with replacement from
/// the current class's rows at that column. Later classes may overwrite
/// cells touched by earlier ones.
///
/// # Errors
///
/// Returns `DimensionMismatch` if `labels` does not have one entry per row.
pub fn inject_overlap<R: Rng + ?Sized>(
    x: &mut Matrix<f32>,
    labels: &[usize],
    k: usize,
    rng: &mut R,
) -> Result<()> {
    let (n_rows, n_cols) = x.shape();
    if labels.len() != n_rows {
        return Err(MedPredictError::dimension_mismatch(
            "labels",
            n_rows,
            labels.len(),
        ));
    }
    let k = k.min(n_cols);
    if k == 0 || n_rows == 0 {
        return Ok(());
    }

    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    for &class in &classes {
        let own_rows: Vec<usize> = (0..n_rows).filter(|&r| labels[r] == class).collect();
        let other_rows: Vec<usize> = (0..n_rows).filter(|&r| labels[r] != class).collect();
        let columns = sample(rng, n_cols, k).into_vec();
        let pick = Uniform::from(0..own_rows.len());

        for &col in &columns {
            for &row in &other_rows {
                let donor = own_rows[pick.sample(rng)];
                let value = x.get(donor, col);
                x.set(row, col, value);
            }
        }
        debug!(class, ?columns, rows = other_rows.len(), "injected overlap");
    }

    Ok(())
}

/// Noise injection: flips every 0/1 cell independently with probability `p`.
///
/// `p = 0` leaves `x` untouched; `p = 1` flips every cell.
///
/// # Errors
///
/// Returns `InvalidHyperparameter` if `p` is outside `[0, 1]`.
pub fn inject_noise<R: Rng + ?Sized>(x: &mut Matrix<f32>, p: f64, rng: &mut R) -> Result<()> {
    check_probability(p)?;
    if p == 0.0 {
        return Ok(());
    }

    let (n_rows, n_cols) = x.shape();
    let mut flipped = 0usize;
    for row in 0..n_rows {
        for col in 0..n_cols {
            if rng.gen_bool(p) {
                let value = x.get(row, col);
                x.set(row, col, 1.0 - value);
                flipped += 1;
            }
        }
    }
    debug!(p, flipped, cells = n_rows * n_cols, "injected noise");
    Ok(())
}

/// Training-set transform: overlap, then noise.
///
/// # Errors
///
/// See [`inject_overlap`] and [`inject_noise`].
pub fn perturb_training<R: Rng + ?Sized>(
    x: &mut Matrix<f32>,
    labels: &[usize],
    config: &PerturbationConfig,
    rng: &mut R,
) -> Result<()> {
    config.validate()?;
    inject_overlap(x, labels, config.overlap_features, rng)?;
    inject_noise(x, config.noise_probability, rng)
}

/// Evaluation-set transform: noise only.
///
/// # Errors
///
/// See [`inject_noise`].
pub fn perturb_evaluation<R: Rng + ?Sized>(
    x: &mut Matrix<f32>,
    config: &PerturbationConfig,
    rng: &mut R,
) -> Result<()> {
    inject_noise(x, config.noise_probability, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_matrix() -> (Matrix<f32>, Vec<usize>) {
        // Class 0 has columns 0-1 set, class 1 has columns 2-3 set
        let x = Matrix::from_vec(
            4,
            4,
            vec![
                1.0, 1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 1.0, //
                0.0, 0.0, 1.0, 1.0,
            ],
        )
        .expect("4x4");
        (x, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_noise_zero_is_identity() {
        let (mut x, _) = block_matrix();
        let before = x.clone();
        inject_noise(&mut x, 0.0, &mut StdRng::seed_from_u64(1)).expect("valid p");
        assert_eq!(x, before);
    }

    #[test]
    fn test_noise_one_flips_every_cell() {
        let (mut x, _) = block_matrix();
        let before = x.clone();
        inject_noise(&mut x, 1.0, &mut StdRng::seed_from_u64(1)).expect("valid p");
        for (after, orig) in x.as_slice().iter().zip(before.as_slice()) {
            assert_eq!(*after, 1.0 - orig);
        }
    }

    #[test]
    fn test_noise_rejects_bad_probability() {
        let (mut x, _) = block_matrix();
        for p in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                inject_noise(&mut x, p, &mut StdRng::seed_from_u64(1)),
                Err(MedPredictError::InvalidHyperparameter { .. })
            ));
        }
    }

    #[test]
    fn test_noise_rate_roughly_p() {
        let mut x = Matrix::zeros(100, 100);
        inject_noise(&mut x, 0.05, &mut StdRng::seed_from_u64(42)).expect("valid p");
        let ones = x.as_slice().iter().filter(|&&v| v == 1.0).count();
        assert!((300..=700).contains(&ones), "flipped {ones} of 10000 cells");
    }

    #[test]
    fn test_overlap_preserves_shape_and_binary_values() {
        let (mut x, y) = block_matrix();
        inject_overlap(&mut x, &y, 3, &mut StdRng::seed_from_u64(42)).expect("valid labels");
        assert_eq!(x.shape(), (4, 4));
        assert!(x.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_overlap_is_cumulative_across_classes() {
        // k clamps to all 4 columns. Class 0 overwrites class 1 rows with its
        // own values, then class 1 donates those same values back.
        let (mut x, y) = block_matrix();
        inject_overlap(&mut x, &y, 10, &mut StdRng::seed_from_u64(3)).expect("valid labels");
        for row in x.rows() {
            assert_eq!(row, &[1.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_overlap_single_class_is_noop() {
        let (mut x, _) = block_matrix();
        let before = x.clone();
        inject_overlap(&mut x, &[0, 0, 0, 0], 2, &mut StdRng::seed_from_u64(1)).expect("valid");
        assert_eq!(x, before);
    }

    #[test]
    fn test_overlap_zero_k_is_noop() {
        let (mut x, y) = block_matrix();
        let before = x.clone();
        inject_overlap(&mut x, &y, 0, &mut StdRng::seed_from_u64(1)).expect("valid");
        assert_eq!(x, before);
    }

    #[test]
    fn test_overlap_label_length_mismatch() {
        let (mut x, _) = block_matrix();
        assert!(matches!(
            inject_overlap(&mut x, &[0, 1], 1, &mut StdRng::seed_from_u64(1)),
            Err(MedPredictError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let config = PerturbationConfig::default();
        let (mut a, y) = block_matrix();
        let (mut b, _) = block_matrix();
        perturb_training(&mut a, &y, &config, &mut config.rng()).expect("valid");
        perturb_training(&mut b, &y, &config, &mut config.rng()).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn test_evaluation_gets_noise_only() {
        let config = PerturbationConfig {
            noise_probability: 0.0,
            ..PerturbationConfig::default()
        };
        let (mut x, _) = block_matrix();
        let before = x.clone();
        perturb_evaluation(&mut x, &config, &mut config.rng()).expect("valid");
        assert_eq!(x, before);
    }

    #[test]
    fn test_config_defaults() {
        let config = PerturbationConfig::default();
        assert_eq!(config.overlap_features, 3);
        assert!((config.noise_probability - 0.05).abs() < 1e-12);
        assert_eq!(config.random_state, Some(42));
        assert!(config.validate().is_ok());
    }
}
