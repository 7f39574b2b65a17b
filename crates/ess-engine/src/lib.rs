pub mod engine;
pub mod parallel;
pub mod validator;

pub use engine::{ExecutionMode, Planner};
pub use parallel::ParallelSearch;
pub use validator::{LegCheck, PlanValidator, ValidationReport};
