//! Two-component Gaussian mixture over the length ratio, fit by expectation-maximisation.
//!
//! The fit is a pure function of the samples and [`EmSettings`]: iteration count and
//! tolerance bound the loop, and the seed fixes the initial jitter so repeated fits
//! of the same corpus produce identical parameters.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One Gaussian component with its mixing weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianComponent {
    pub mean: f64,
    pub variance: f64,
    pub weight: f64,
}

impl GaussianComponent {
    /// log(weight * N(x | mean, variance))
    fn weighted_log_density(&self, x: f64) -> f64 {
        let diff = x - self.mean;
        self.weight.ln() - 0.5 * ((2.0 * PI * self.variance).ln() + diff * diff / self.variance)
    }

    fn is_valid(&self) -> bool {
        self.mean.is_finite()
            && self.variance.is_finite()
            && self.variance > 0.0
            && self.weight.is_finite()
            && self.weight > 0.0
            && self.weight <= 1.0
    }
}

/// Fitted mixture; component 0 always has the smaller mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mixture {
    pub components: [GaussianComponent; 2],
}

impl Mixture {
    /// Posterior probability of each component given `x`
    pub fn responsibilities(&self, x: f64) -> [f64; 2] {
        let a = self.components[0].weighted_log_density(x);
        let b = self.components[1].weighted_log_density(x);
        let max = a.max(b);
        let ea = (a - max).exp();
        let eb = (b - max).exp();
        let total = ea + eb;
        [ea / total, eb / total]
    }

    pub fn log_likelihood(&self, samples: &[f64]) -> f64 {
        samples
            .iter()
            .map(|&x| {
                let a = self.components[0].weighted_log_density(x);
                let b = self.components[1].weighted_log_density(x);
                let max = a.max(b);
                max + ((a - max).exp() + (b - max).exp()).ln()
            })
            .sum()
    }

    /// Parameters are finite, variances positive and weights sum to one
    pub fn validate(&self) -> Result<(), String> {
        if !self.components.iter().all(GaussianComponent::is_valid) {
            return Err(format!("invalid mixture component parameters: {:?}", self.components));
        }
        let weight_sum = self.components[0].weight + self.components[1].weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(format!("mixture weights sum to {weight_sum}, expected 1"));
        }
        if self.components[0].mean > self.components[1].mean {
            return Err("mixture components are not ordered by mean".to_string());
        }
        Ok(())
    }

    fn max_parameter_change(&self, other: &Mixture) -> f64 {
        self.components
            .iter()
            .zip(other.components.iter())
            .map(|(a, b)| {
                (a.mean - b.mean)
                    .abs()
                    .max((a.variance - b.variance).abs())
                    .max((a.weight - b.weight).abs())
            })
            .fold(0.0, f64::max)
    }
}

/// Iteration controls for [`fit_em`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmSettings {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub variance_floor: f64,
    pub seed: u64,
}

/// Result of a successful EM run
#[derive(Debug, Clone, PartialEq)]
pub struct EmOutcome {
    pub mixture: Mixture,
    /// Responsibilities of the final mixture for every sample
    pub responsibilities: Vec<[f64; 2]>,
    pub iterations: usize,
    pub converged: bool,
    pub log_likelihood: f64,
}

/// A component lost all of its mass or both components merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collapsed;

/// Fit two Gaussians to `samples`
///
/// Callers guarantee at least two samples with non-zero variance.
pub fn fit_em(samples: &[f64], settings: &EmSettings) -> Result<EmOutcome, Collapsed> {
    let mut mixture = initial_mixture(samples, settings);
    let n = samples.len() as f64;
    let mut responsibilities = vec![[0.5, 0.5]; samples.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iterations {
        iterations += 1;

        // E step
        for (r, &x) in responsibilities.iter_mut().zip(samples) {
            *r = mixture.responsibilities(x);
        }

        // M step
        let mut next = mixture;
        for k in 0..2 {
            let mass: f64 = responsibilities.iter().map(|r| r[k]).sum();
            if mass < 1e-9 * n {
                return Err(Collapsed);
            }
            let mean = responsibilities
                .iter()
                .zip(samples)
                .map(|(r, &x)| r[k] * x)
                .sum::<f64>()
                / mass;
            let variance = responsibilities
                .iter()
                .zip(samples)
                .map(|(r, &x)| r[k] * (x - mean) * (x - mean))
                .sum::<f64>()
                / mass;
            next.components[k] = GaussianComponent {
                mean,
                variance: variance.max(settings.variance_floor),
                weight: mass / n,
            };
        }

        let change = next.max_parameter_change(&mixture);
        mixture = next;
        if change < settings.tolerance {
            converged = true;
            break;
        }
    }

    if mixture.components[0].mean > mixture.components[1].mean {
        mixture.components.swap(0, 1);
    }
    if (mixture.components[1].mean - mixture.components[0].mean).abs() < 1e-9 {
        return Err(Collapsed);
    }

    for (r, &x) in responsibilities.iter_mut().zip(samples) {
        *r = mixture.responsibilities(x);
    }

    Ok(EmOutcome {
        log_likelihood: mixture.log_likelihood(samples),
        mixture,
        responsibilities,
        iterations,
        converged,
    })
}

/// Split the sorted samples at the median; each half seeds one component
fn initial_mixture(samples: &[f64], settings: &EmSettings) -> Mixture {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let (lower, upper) = sorted.split_at(sorted.len() / 2);

    let (_, pooled_variance) = mean_variance(&sorted);
    let pooled_std = pooled_variance.sqrt();
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);

    let mut component = |half: &[f64]| {
        let (mean, variance) = mean_variance(half);
        let jitter: f64 = rng.gen_range(-0.01..0.01);
        GaussianComponent {
            mean: mean + jitter * pooled_std,
            variance: variance.max(settings.variance_floor),
            weight: 0.5,
        }
    };

    Mixture {
        components: [component(lower), component(upper)],
    }
}

/// Mean and population variance; (0, 0) for an empty slice
pub fn mean_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance)
}
