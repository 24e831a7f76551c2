pub mod config;
pub mod logger;
pub mod tempfiles;
pub mod uniqgen_toml;

pub use config::*;
pub use logger::setup_logging;
pub use tempfiles::{discard_temp, prepare_output_work_path, rename_temp_to_final, temp_path_for};
pub use uniqgen_toml::{UniqgenToml, apply_file_to_opts, load_uniqgen_toml};
