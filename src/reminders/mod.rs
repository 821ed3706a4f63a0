pub mod notifier;
pub mod scheduler;

pub use scheduler::{run_sweep, spawn};
