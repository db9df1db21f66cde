use crate::entities::allocation::{Allocation, OptimizationStatus};
use crate::errors::CoreError;
use crate::services::price_table::ReturnTable;
use crate::services::stats;
use serde::{Deserialize, Serialize};

/// What to do when the solver cannot reach a stationary point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Return equal weights tagged [`OptimizationStatus::Unoptimized`].
    EqualWeight,
    /// Fail with [`CoreError::OptimizationFallback`].
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerPolicy {
    pub min_weight: f64,
    pub max_weight: f64,
    pub trading_days: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub on_failure: FallbackPolicy,
}

impl Default for OptimizerPolicy {
    fn default() -> Self {
        Self {
            min_weight: 0.05,
            max_weight: 0.5,
            trading_days: 252.0,
            max_iterations: 1000,
            tolerance: 1e-10,
            on_failure: FallbackPolicy::EqualWeight,
        }
    }
}

impl OptimizerPolicy {
    /// Checks that `n` weights can satisfy both the box and the sum constraint.
    pub fn check_feasible(&self, n: usize) -> Result<(), CoreError> {
        if n == 0 {
            return Err(CoreError::invalid("cannot optimize an empty selection"));
        }
        if !(self.min_weight.is_finite() && self.max_weight.is_finite())
            || self.min_weight < 0.0
            || self.max_weight > 1.0
            || self.min_weight > self.max_weight
        {
            return Err(CoreError::invalid(format!(
                "weight bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
                self.min_weight, self.max_weight
            )));
        }
        let n_f = n as f64;
        if n_f * self.min_weight > 1.0 + FEASIBILITY_SLACK
            || n_f * self.max_weight < 1.0 - FEASIBILITY_SLACK
        {
            return Err(CoreError::invalid(format!(
                "{n} weights in [{}, {}] cannot sum to 1",
                self.min_weight, self.max_weight
            )));
        }
        Ok(())
    }
}

const FEASIBILITY_SLACK: f64 = 1e-12;
const MIN_STEP: f64 = 1e-14;
const MAX_STEP: f64 = 16.0;
const PROJECTION_ROUNDS: usize = 200;

/// Annualised Sharpe-like objective for fixed daily moments.
struct SharpeObjective {
    mean: Vec<f64>,
    cov: Vec<Vec<f64>>,
    trading_days: f64,
}

impl SharpeObjective {
    fn value(&self, w: &[f64]) -> Option<f64> {
        let variance = stats::dot(w, &stats::mat_vec(&self.cov, w));
        if !variance.is_finite() || variance <= 0.0 {
            return None;
        }
        let annual_return = self.trading_days * stats::dot(&self.mean, w);
        let annual_vol = (self.trading_days * variance).sqrt();
        let value = annual_return / annual_vol;
        value.is_finite().then_some(value)
    }

    fn gradient(&self, w: &[f64]) -> Option<Vec<f64>> {
        let cov_w = stats::mat_vec(&self.cov, w);
        let variance = stats::dot(w, &cov_w);
        if !variance.is_finite() || variance <= 0.0 {
            return None;
        }
        let sigma = variance.sqrt();
        let ret = stats::dot(&self.mean, w);
        let scale = self.trading_days.sqrt();
        let grad: Vec<f64> = self
            .mean
            .iter()
            .zip(&cov_w)
            .map(|(m, cw)| scale * (m / sigma - ret * cw / (sigma * variance)))
            .collect();
        grad.iter().all(|g| g.is_finite()).then_some(grad)
    }
}

enum SolveOutcome {
    Converged {
        weights: Vec<f64>,
        iterations: usize,
        sharpe: f64,
    },
    Failed(String),
}

/// Maximises the annualised Sharpe-like ratio of the columns of `returns`
/// subject to `min_weight <= w_i <= max_weight` and `sum(w) = 1`, starting
/// from equal weights.
pub fn optimize(returns: &ReturnTable, policy: &OptimizerPolicy) -> Result<Allocation, CoreError> {
    let n = returns.columns().len();
    policy.check_feasible(n)?;
    if returns.rows() < 2 {
        return Err(CoreError::insufficient(
            "aligned return rows for covariance estimation",
            2,
            returns.rows(),
        ));
    }

    let columns: Vec<&[f64]> = returns.columns().iter().map(|(_, v)| v.as_slice()).collect();
    let mean: Option<Vec<f64>> = columns.iter().map(|c| stats::mean(c)).collect();
    let cov = stats::covariance_matrix(&columns);
    let symbols: Vec<String> = returns.columns().iter().map(|(s, _)| s.clone()).collect();
    let equal = vec![1.0 / n as f64; n];

    let outcome = match (mean, cov) {
        (Some(mean), Some(cov)) => solve(
            &SharpeObjective {
                mean,
                cov,
                trading_days: policy.trading_days,
            },
            equal.clone(),
            policy,
        ),
        _ => SolveOutcome::Failed("return moments could not be estimated".to_string()),
    };

    match outcome {
        SolveOutcome::Converged {
            weights,
            iterations,
            sharpe,
        } => Ok(Allocation {
            weights: symbols.into_iter().zip(weights).collect(),
            status: OptimizationStatus::Optimized { iterations, sharpe },
        }),
        SolveOutcome::Failed(reason) => match policy.on_failure {
            FallbackPolicy::EqualWeight => Ok(Allocation {
                weights: symbols.into_iter().zip(equal).collect(),
                status: OptimizationStatus::Unoptimized { reason },
            }),
            FallbackPolicy::Error => Err(CoreError::OptimizationFallback(reason)),
        },
    }
}

/// Projected gradient ascent with a backtracking step. A point counts as
/// stationary once no step along the projected gradient improves the
/// objective, or once the move / gain drops below tolerance.
fn solve(objective: &SharpeObjective, start: Vec<f64>, policy: &OptimizerPolicy) -> SolveOutcome {
    let lo = policy.min_weight;
    let hi = policy.max_weight;
    let mut w = start;
    let Some(mut value) = objective.value(&w) else {
        return SolveOutcome::Failed("portfolio variance is zero or undefined".to_string());
    };
    let mut step = 1.0;

    for iteration in 1..=policy.max_iterations {
        let Some(grad) = objective.gradient(&w) else {
            return SolveOutcome::Failed(format!("gradient undefined at iteration {iteration}"));
        };

        let mut accepted = None;
        let mut alpha = step;
        while alpha >= MIN_STEP {
            let trial: Vec<f64> = w.iter().zip(&grad).map(|(x, g)| x + alpha * g).collect();
            let candidate = project_capped_simplex(&trial, lo, hi);
            if let Some(candidate_value) = objective.value(&candidate) {
                if candidate_value > value {
                    accepted = Some((candidate, candidate_value));
                    break;
                }
            }
            alpha *= 0.5;
        }

        let Some((candidate, candidate_value)) = accepted else {
            return SolveOutcome::Converged {
                weights: w,
                iterations: iteration - 1,
                sharpe: value,
            };
        };

        let moved = w
            .iter()
            .zip(&candidate)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        let gain = candidate_value - value;
        w = candidate;
        value = candidate_value;
        step = (alpha * 2.0).min(MAX_STEP);

        if moved <= policy.tolerance || gain <= policy.tolerance * (1.0 + value.abs()) {
            return SolveOutcome::Converged {
                weights: w,
                iterations: iteration,
                sharpe: value,
            };
        }
    }

    SolveOutcome::Failed(format!(
        "no convergence within {} iterations",
        policy.max_iterations
    ))
}

/// Euclidean projection of `v` onto `{w : lo <= w_i <= hi, sum(w) = 1}`.
///
/// The projection is `clamp(v_i - tau, lo, hi)` for the shift `tau` that makes
/// the sum one. `tau` is bracketed by bisection, then solved exactly over the
/// coordinates that end up strictly inside the box.
pub fn project_capped_simplex(v: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let clamped_sum = |tau: f64| -> f64 { v.iter().map(|x| (x - tau).clamp(lo, hi)).sum() };

    let v_min = v.iter().copied().fold(f64::INFINITY, f64::min);
    let v_max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut tau_lo = v_min - hi;
    let mut tau_hi = v_max - lo;
    for _ in 0..PROJECTION_ROUNDS {
        let mid = 0.5 * (tau_lo + tau_hi);
        if clamped_sum(mid) > 1.0 {
            tau_lo = mid;
        } else {
            tau_hi = mid;
        }
        if tau_hi - tau_lo <= f64::EPSILON * (1.0 + mid.abs()) {
            break;
        }
    }
    let mut tau = 0.5 * (tau_lo + tau_hi);

    let free: Vec<usize> = (0..v.len())
        .filter(|&i| {
            let x = v[i] - tau;
            x > lo && x < hi
        })
        .collect();
    if !free.is_empty() {
        let fixed: f64 = (0..v.len())
            .filter(|i| !free.contains(i))
            .map(|i| (v[i] - tau).clamp(lo, hi))
            .sum();
        let free_sum: f64 = free.iter().map(|&i| v[i]).sum();
        let exact = (free_sum + fixed - 1.0) / free.len() as f64;
        if free.iter().all(|&i| {
            let x = v[i] - exact;
            x >= lo && x <= hi
        }) {
            tau = exact;
        }
    }

    v.iter().map(|x| (x - tau).clamp(lo, hi)).collect()
}
