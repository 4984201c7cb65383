mod currency;
mod engine;
mod error;
mod solver;
mod types;

pub use currency::convert;
pub use engine::project;
pub use error::{InvalidReason, ProjectionError};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, default_search_max,
    goal_progress_percent, solve_goal,
};
pub use types::{Frequency, ProjectionInput, ProjectionResult, YearlyBreakdown};
