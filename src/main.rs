//! uniqgen CLI: generate exactly N unique names into a CSV file.

use clap::Parser;
use std::time::Instant;
use uniqgen::engine::arg_parser::Cli;
use uniqgen::Result;
use uniqgen::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
