//! CLI command handler: layer defaults, settings file and flags, then run one generation.

use anyhow::{Context, bail};
use colored::Colorize;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{KdamProgress, NoProgress, ProgressReporter};
use crate::pipeline::describe_reason;
use crate::sink::CsvSink;
use crate::source::{RandomNameFactory, SourceFactory, WordListFactory, load_word_list};
use crate::utils::{
    PackagePaths, apply_file_to_opts, discard_temp, load_uniqgen_toml,
    prepare_output_work_path, rename_temp_to_final, setup_logging,
};
use crate::{ChannelCapacity, Opts, Outcome, Result, SourceKind, Status};

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $cli.$cli_field.clone() {
            $opts.$($opts_field).+ = v;
        }
    };
}

fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    apply_cli_opt!(cli, opts, count => pipeline.target);
    apply_cli_opt!(cli, opts, output => output);
    apply_cli_opt!(cli, opts, header => header);
    apply_cli_opt!(cli, opts, threads => pipeline.workers);
    apply_cli_opt!(cli, opts, batch => pipeline.batch_size);
    apply_cli_opt!(cli, opts, stall_candidates => pipeline.stall_candidates);
    if let Some(cap) = cli.channel_cap {
        opts.pipeline.channel = ChannelCapacity::Bounded(cap);
    }
    if cli.unbounded == Some(true) {
        opts.pipeline.channel = ChannelCapacity::Unbounded;
    }
    apply_cli_opt!(cli, opts, source => source);
    apply_cli_opt!(cli, opts, seed => seed);
    if let Some(ref p) = cli.words {
        opts.words = Some(p.clone());
    }
    apply_cli_opt!(cli, opts, mode => word_mode);
    apply_cli_opt!(cli, opts, skip_header => skip_header);
    apply_cli_opt!(cli, opts, column => column);
    apply_cli_opt!(cli, opts, upper => uppercase);
    apply_cli_opt!(cli, opts, progress => progress);
    apply_cli_opt!(cli, opts, strict => strict);
    apply_cli_opt!(cli, opts, verbose => verbose);
}

/// Defaults → settings file → CLI flags.
pub fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()));
    if let Some(file) = load_uniqgen_toml(&config_path) {
        debug!("Loaded settings from {}", config_path.display());
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    opts
}

fn setup_progress(opts: &Opts) -> (Arc<dyn ProgressReporter>, Option<Arc<KdamProgress>>) {
    if opts.progress {
        let bars = Arc::new(KdamProgress::new(
            opts.pipeline.target,
            opts.pipeline.workers,
            opts.pipeline.batch_size,
        ));
        (Arc::clone(&bars) as Arc<dyn ProgressReporter>, Some(bars))
    } else {
        (Arc::new(NoProgress), None)
    }
}

/// Write the CSV through a temp file; rename on success or partial, remove on error.
fn generate_to_csv<F: SourceFactory>(opts: &Opts, factory: &F) -> Result<Outcome> {
    let temp_path = prepare_output_work_path(&opts.output)?;
    let mut sink = CsvSink::create(&temp_path, Some(opts.header.as_str()))
        .with_context(|| format!("create output {}", temp_path.display()))?;
    let (progress, bars) = setup_progress(opts);

    let result = crate::run(&opts.pipeline, factory, &mut sink, progress);
    drop(sink);
    if let Some(bars) = bars {
        bars.finish();
    }
    match result {
        Ok(outcome) => {
            rename_temp_to_final(&temp_path, &opts.output)?;
            Ok(outcome)
        }
        Err(e) => {
            discard_temp(&temp_path);
            Err(e).context("generation failed")
        }
    }
}

fn report_outcome(outcome: &Outcome, output: &Path) {
    let wrote = format!("Wrote {}/{} unique names", outcome.accepted, outcome.target);
    let wrote = match outcome.status {
        Status::Success => wrote.green(),
        Status::Partial => wrote.yellow(),
    };
    info!("{} to {}", wrote, output.display());
    let detail = format!(
        "{}; {} batches, {} candidates, {} duplicates, {} past target",
        describe_reason(outcome.reason),
        outcome.stats.batches,
        outcome.stats.received,
        outcome.stats.duplicates,
        outcome.stats.surplus
    );
    info!("{}", detail.white());
}

/// Run one generation from CLI args.
pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose.unwrap_or(false));
    let mut opts = setup_opts(cli);

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;
    opts.pipeline.cancel = Some(Arc::clone(&cancel_requested));

    info!("Generator setup...");
    info!("Type: {:?}", opts.source);
    info!(
        "Threads={}, batch={}",
        opts.pipeline.workers, opts.pipeline.batch_size
    );
    info!("Saving location: {}", opts.output.display());
    info!("Generation size (lines): {}", opts.pipeline.target);

    let outcome = match opts.source {
        SourceKind::Random => {
            info!("Random seed for generation: {}", opts.seed);
            generate_to_csv(&opts, &RandomNameFactory::new(opts.seed))?
        }
        SourceKind::List => {
            let Some(ref path) = opts.words else {
                bail!("--source list needs a word list (--words PATH)");
            };
            let words = load_word_list(path, opts.skip_header, opts.column)?;
            info!("Word list: {} entries ({:?})", words.len(), opts.word_mode);
            let factory =
                WordListFactory::new(words, opts.word_mode, opts.seed).uppercase(opts.uppercase);
            generate_to_csv(&opts, &factory)?
        }
    };
    report_outcome(&outcome, &opts.output);

    if opts.strict && outcome.status == Status::Partial {
        bail!(
            "strict mode: only {} of {} names generated",
            outcome.accepted,
            outcome.target
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "uniqgen",
            "-n",
            "42",
            "--threads",
            "2",
            "--unbounded",
            "--source",
            "list",
            "--mode",
            "stride",
            "-c",
            "/nonexistent/.uniqgen.toml",
        ]);
        let opts = setup_opts(&cli);
        assert_eq!(opts.pipeline.target, 42);
        assert_eq!(opts.pipeline.workers, 2);
        assert_eq!(opts.pipeline.channel, ChannelCapacity::Unbounded);
        assert_eq!(opts.source, SourceKind::List);
        assert_eq!(opts.word_mode, crate::source::WordMode::Stride);
        assert!(!opts.strict);
    }

    #[test]
    fn test_cli_wins_over_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".uniqgen.toml");
        std::fs::write(&config, "[settings]\ncount = 10\nbatch = 7\nstrict = true\n").unwrap();
        let config_arg = config.to_string_lossy().to_string();
        let cli = Cli::parse_from(["uniqgen", "--count", "99", "-c", config_arg.as_str()]);
        let opts = setup_opts(&cli);
        assert_eq!(opts.pipeline.target, 99);
        assert_eq!(opts.pipeline.batch_size, 7);
        assert!(opts.strict);
    }

    #[test]
    fn test_generate_to_csv_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = Opts {
            output: dir.path().join("out.csv"),
            ..Default::default()
        };
        opts.pipeline.target = 25;
        opts.pipeline.workers = 2;
        opts.pipeline.batch_size = 10;

        let outcome = generate_to_csv(&opts, &RandomNameFactory::new(1)).unwrap();
        assert!(outcome.is_success());
        let text = std::fs::read_to_string(&opts.output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name");
        assert_eq!(lines.len(), 26);
        assert!(!dir.path().join("out.csv.tmp").exists());
        report_outcome(&outcome, &opts.output);
    }
}
