//! Engine module: CLI surface and progress reporting

pub mod arg_parser;
pub mod cli;
pub mod progress;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{handle_run, setup_opts};
pub use progress::{KdamProgress, NoProgress, ProgressReporter, Task};
