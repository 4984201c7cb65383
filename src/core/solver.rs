use log::debug;
use serde::Serialize;

use super::engine::project;
use super::error::{InvalidReason, ProjectionError, require_finite, require_non_negative};
use super::types::ProjectionInput;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    RequiredContribution,
    RequiredPrincipal,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_future_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub future_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_future_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub achieved_future_value: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Bisects the contribution or principal needed for `base` to reach the
/// target future value at the end of its horizon.
///
/// Future value must be non-decreasing in the searched input, which holds
/// for any rate above -100% per period.
pub fn solve_goal(
    base: &ProjectionInput,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, ProjectionError> {
    validate_config(config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_value = evaluate_candidate(base, config.goal_type, config.search_min)?;
    let high_value = evaluate_candidate(base, config.goal_type, config.search_max)?;
    let target = config.target_future_value;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if reaches(low_value, target) {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower bound.".to_string();
    } else if !reaches(high_value, target) {
        feasible = false;
        message = "Target is not reachable within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let future_value = evaluate_candidate(base, config.goal_type, mid)?;
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                future_value,
            });

            if reaches(future_value, target) {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        // `hi` always reaches the target.
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            match config.goal_type {
                GoalType::RequiredContribution => "Solved required contribution.".to_string(),
                GoalType::RequiredPrincipal => "Solved required principal.".to_string(),
            }
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let achieved_future_value = match solved_value {
        Some(value) => Some(evaluate_candidate(base, config.goal_type, value)?),
        None => None,
    };

    debug!(
        "goal {:?} for target {:.2}: solved {:?} after {} iterations",
        config.goal_type,
        target,
        solved_value,
        iterations.len()
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_future_value: target,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_future_value,
        iterations,
        converged,
        feasible,
        message,
    })
}

/// Upper search bound that reaches `target` on its own: the target divided
/// by what one unit of the searched input grows to, never below the target.
pub fn default_search_max(
    base: &ProjectionInput,
    goal_type: GoalType,
    target: f64,
) -> Result<f64, ProjectionError> {
    let mut unit = *base;
    match goal_type {
        GoalType::RequiredContribution => {
            unit.principal = 0.0;
            unit.periodic_contribution = 1.0;
        }
        GoalType::RequiredPrincipal => {
            unit.principal = 1.0;
            unit.periodic_contribution = 0.0;
        }
    }
    let unit_value = project(&unit)?.future_value;
    let bound = target / unit_value;
    if unit_value > 0.0 && bound.is_finite() && bound > target {
        Ok(bound)
    } else {
        Ok(target)
    }
}

/// Share of a savings goal already covered, as a percentage in `[0, 100]`.
pub fn goal_progress_percent(accumulated: f64, target: f64) -> f64 {
    if !accumulated.is_finite() || !target.is_finite() || target <= 0.0 {
        return 0.0;
    }
    (accumulated / target * 100.0).clamp(0.0, 100.0)
}

fn reaches(future_value: f64, target: f64) -> bool {
    future_value + 1e-9 >= target
}

fn evaluate_candidate(
    base: &ProjectionInput,
    goal_type: GoalType,
    candidate_value: f64,
) -> Result<f64, ProjectionError> {
    let mut input = *base;
    match goal_type {
        GoalType::RequiredContribution => input.periodic_contribution = candidate_value,
        GoalType::RequiredPrincipal => input.principal = candidate_value,
    }
    Ok(project(&input)?.future_value)
}

fn validate_config(config: GoalSolveConfig) -> Result<(), ProjectionError> {
    require_non_negative("target future value", config.target_future_value)?;
    require_non_negative("search min", config.search_min)?;
    require_non_negative("search max", config.search_max)?;
    if config.search_max < config.search_min {
        return Err(ProjectionError::invalid(
            "search max",
            InvalidReason::EmptySearchRange,
        ));
    }
    if require_finite("tolerance", config.tolerance)? <= 0.0 {
        return Err(ProjectionError::invalid(
            "tolerance",
            InvalidReason::NonPositive,
        ));
    }
    if config.max_iterations == 0 {
        return Err(ProjectionError::invalid(
            "max iterations",
            InvalidReason::NonPositive,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn base_input() -> ProjectionInput {
        ProjectionInput {
            principal: 0.0,
            periodic_contribution: 0.0,
            annual_rate_percent: 5.0,
            frequency: Frequency::Monthly,
            years: 10,
        }
    }

    fn contribution_config() -> GoalSolveConfig {
        GoalSolveConfig {
            goal_type: GoalType::RequiredContribution,
            target_future_value: 20_000.0,
            search_min: 0.0,
            search_max: 1_000.0,
            tolerance: 0.01,
            max_iterations: 64,
        }
    }

    #[test]
    fn required_contribution_matches_closed_form() {
        let config = contribution_config();
        let result = solve_goal(&base_input(), config).expect("must solve");

        assert!(result.feasible);
        assert!(result.converged);
        assert_close(
            result.solved_value.expect("value expected"),
            128.797_697,
            config.tolerance,
        );
        let achieved = result.achieved_future_value.expect("future value expected");
        assert!(achieved + 1e-9 >= config.target_future_value);
        assert!(!result.iterations.is_empty());
    }

    #[test]
    fn zero_rate_required_principal_is_target_minus_contributions() {
        let mut base = base_input();
        base.annual_rate_percent = 0.0;
        base.periodic_contribution = 50.0;
        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredPrincipal,
            target_future_value: 10_000.0,
            search_min: 0.0,
            search_max: 50_000.0,
            tolerance: 0.5,
            max_iterations: 64,
        };

        let result = solve_goal(&base, config).expect("must solve");
        assert!(result.feasible);
        assert_close(
            result.solved_value.expect("value expected"),
            4_000.0,
            config.tolerance,
        );
    }

    #[test]
    fn lower_bound_already_meeting_target_short_circuits() {
        let mut base = base_input();
        base.principal = 50_000.0;

        let result = solve_goal(&base, contribution_config()).expect("must return result");
        assert!(result.feasible);
        assert!(result.converged);
        assert_eq!(result.solved_value, Some(0.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn reports_infeasible_when_bounds_too_low() {
        let config = GoalSolveConfig {
            search_max: 10.0,
            ..contribution_config()
        };

        let result = solve_goal(&base_input(), config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
        assert!(result.achieved_future_value.is_none());
    }

    #[test]
    fn iteration_cap_returns_feasible_estimate() {
        let config = GoalSolveConfig {
            max_iterations: 3,
            tolerance: 1e-6,
            ..contribution_config()
        };

        let result = solve_goal(&base_input(), config).expect("must return result");
        assert!(result.feasible);
        assert!(!result.converged);
        assert_eq!(result.iterations.len(), 3);
        let achieved = result.achieved_future_value.expect("future value expected");
        assert!(achieved + 1e-9 >= config.target_future_value);
    }

    #[test]
    fn rejects_invalid_config() {
        let cases = [
            (
                GoalSolveConfig {
                    search_min: 10.0,
                    search_max: 5.0,
                    ..contribution_config()
                },
                InvalidReason::EmptySearchRange,
            ),
            (
                GoalSolveConfig {
                    tolerance: 0.0,
                    ..contribution_config()
                },
                InvalidReason::NonPositive,
            ),
            (
                GoalSolveConfig {
                    max_iterations: 0,
                    ..contribution_config()
                },
                InvalidReason::NonPositive,
            ),
            (
                GoalSolveConfig {
                    target_future_value: f64::NAN,
                    ..contribution_config()
                },
                InvalidReason::NonFinite,
            ),
            (
                GoalSolveConfig {
                    search_min: -1.0,
                    ..contribution_config()
                },
                InvalidReason::Negative,
            ),
        ];

        for (config, reason) in cases {
            let err = solve_goal(&base_input(), config).expect_err("must reject config");
            assert_eq!(err.reason(), reason);
        }
    }

    #[test]
    fn invalid_base_input_propagates() {
        let mut base = base_input();
        base.years = 0;

        let err = solve_goal(&base, contribution_config()).expect_err("must reject input");
        assert_eq!(err.field(), "years");
    }

    #[test]
    fn default_bound_covers_principal_lost_to_negative_rate() {
        let base = ProjectionInput {
            principal: 0.0,
            periodic_contribution: 0.0,
            annual_rate_percent: -20.0,
            frequency: Frequency::Annual,
            years: 10,
        };
        let target = 10_000.0;

        let search_max =
            default_search_max(&base, GoalType::RequiredPrincipal, target).expect("valid input");
        assert_close(search_max, target / 0.8f64.powi(10), 1e-6);

        let config = GoalSolveConfig {
            goal_type: GoalType::RequiredPrincipal,
            target_future_value: target,
            search_min: 0.0,
            search_max,
            tolerance: 0.01,
            max_iterations: 64,
        };
        let result = solve_goal(&base, config).expect("must solve");
        assert!(result.feasible);
        assert_close(
            result.solved_value.expect("value expected"),
            93_132.257_461_547_85,
            0.02,
        );
    }

    #[test]
    fn default_bound_is_target_when_growth_helps() {
        let search_max = default_search_max(&base_input(), GoalType::RequiredPrincipal, 5_000.0)
            .expect("valid input");
        assert_eq!(search_max, 5_000.0);

        let search_max =
            default_search_max(&base_input(), GoalType::RequiredContribution, 5_000.0)
                .expect("valid input");
        assert_eq!(search_max, 5_000.0);
    }

    #[test]
    fn progress_is_clamped_percentage() {
        assert_close(goal_progress_percent(250.0, 1_000.0), 25.0, 1e-12);
        assert_eq!(goal_progress_percent(1_500.0, 1_000.0), 100.0);
        assert_eq!(goal_progress_percent(-10.0, 1_000.0), 0.0);
        assert_eq!(goal_progress_percent(100.0, 0.0), 0.0);
        assert_eq!(goal_progress_percent(f64::NAN, 100.0), 0.0);
    }
}
