pub mod cli;
pub mod types;

pub use cli::run_harness;
pub use types::{HarnessError, HarnessResult};
