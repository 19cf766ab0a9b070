use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::future::join_all;
use serde_json::json;
use sizefit::error::HasRecoverySuggestion;
use sizefit::format::{mime_from_extension, sniff_format};
use sizefit::validate::{format_bytes, parse_target_kb, target_bytes};
use sizefit::{CancelToken, FitError, FitOutcome, Fitter, SearchConfig};
use sizefit_scale::cpu::Filter;
use tracing_subscriber::EnvFilter;

/// Shrink images to a target file size.
#[derive(Parser, Debug)]
#[command(name = "sizefit")]
#[command(about = "Re-encode JPEG/PNG images to land at or just under a target size")]
#[command(long_about = "Re-encode JPEG/PNG images so each output lands as close as possible to, \
and preferably under, the requested size. Resolution and quality are searched automatically; \
aspect ratio is always preserved.")]
struct Args {
    /// Input images (JPEG or PNG)
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Target size in kilobytes (1 KB = 1024 bytes)
    #[arg(short, long)]
    target_kb: String,

    /// Directory for outputs (defaults to next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Override the declared mime type instead of guessing from the extension
    #[arg(long)]
    mime: Option<String>,

    /// Print one JSON report per input instead of text
    #[arg(long)]
    json: bool,

    /// Intervals in the width ladder
    #[arg(long, default_value_t = 20)]
    scale_steps: u32,

    /// Quality binary-search iterations per width
    #[arg(long, default_value_t = 12)]
    max_iterations: u32,

    /// Stop sweeping once a result is within this many bytes of the target
    /// (either side) and not over it
    #[arg(long, default_value_t = 1024)]
    tolerance: u64,

    /// Resampling filter
    #[arg(long, value_enum, default_value_t = Filter::Lanczos3)]
    filter: Filter,

    /// Never return a result over the target; prefer the closest one under it
    #[arg(long)]
    require_fit: bool,

    /// Give up on an input after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Give up on an input after this many encode calls
    #[arg(long)]
    max_encodes: Option<usize>,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            scale_steps: self.scale_steps,
            max_quality_iterations: self.max_iterations,
            early_exit_tolerance: self.tolerance,
            filter: self.filter,
            require_fit: self.require_fit,
            deadline: self.timeout_secs.map(Duration::from_secs),
            max_encode_calls: self.max_encodes,
            ..SearchConfig::default()
        }
    }
}

struct Job {
    input: PathBuf,
    output: PathBuf,
    outcome: FitOutcome,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let target = target_bytes(parse_target_kb(&args.target_kb)?)?;
    let config = args.search_config();
    config.validate()?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling after the current encode");
                cancel.cancel();
            }
        });
    }

    let tasks = args.inputs.iter().cloned().map(|input| {
        let fitter = Fitter::with_config(config.clone()).with_cancel_token(cancel.clone());
        let out_dir = args.out_dir.clone();
        let mime = args.mime.clone();
        tokio::task::spawn_blocking(move || process_one(&fitter, input, out_dir, mime, target))
    });

    let mut failures = 0usize;
    for (input, joined) in args.inputs.iter().zip(join_all(tasks).await) {
        match joined.context("worker panicked")? {
            Ok(job) => report(&job, args.json),
            Err(e) => {
                failures += 1;
                report_error(input, &e, args.json);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, args.inputs.len());
    }
    Ok(())
}

fn process_one(
    fitter: &Fitter<sizefit::ImageCodec>,
    input: PathBuf,
    out_dir: Option<PathBuf>,
    mime: Option<String>,
    target: u64,
) -> Result<Job, FitError> {
    let display = input.display().to_string();
    let bytes = std::fs::read(&input).map_err(|e| FitError::io("read_input", Some(display.clone()), e))?;

    let mime = mime
        .or_else(|| mime_from_extension(&input).map(str::to_string))
        .or_else(|| sniff_format(&bytes).map(|f| f.mime().to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let outcome = fitter
        .fit(&bytes, &mime, target)
        .map_err(|e| e.with_context(display.clone()))?;

    let output = output_path(&input, out_dir.as_deref(), outcome.format.extension());
    std::fs::write(&output, &outcome.bytes)
        .map_err(|e| FitError::io("write_output", Some(output.display().to_string()), e))?;

    Ok(Job {
        input,
        output,
        outcome,
    })
}

/// `<dir>/<stem>.fit.<ext>`, where `dir` defaults to the input's directory.
fn output_path(input: &Path, out_dir: Option<&Path>, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}.fit.{}", stem, ext))
}

fn report(job: &Job, as_json: bool) {
    let o = &job.outcome;
    if as_json {
        let value = json!({
            "input": job.input.display().to_string(),
            "output": job.output.display().to_string(),
            "mime": o.mime(),
            "bytes": o.len(),
            "target_bytes": o.target_bytes,
            "width": o.width,
            "height": o.height,
            "quality": o.quality,
            "encode_calls": o.encode_calls,
            "via_fallback": o.via_fallback,
        });
        println!("{}", value);
    } else {
        println!(
            "{} → {}: {} (target {}), {}x{} q={}, {} encodes{}",
            job.input.display(),
            job.output.display(),
            format_bytes(o.len()),
            format_bytes(o.target_bytes),
            o.width,
            o.height,
            o.quality,
            o.encode_calls,
            if o.via_fallback { ", fallback" } else { "" }
        );
    }
}

fn report_error(input: &Path, error: &FitError, as_json: bool) {
    if as_json {
        let value = json!({
            "input": input.display().to_string(),
            "error": error.category(),
            "message": error.to_string(),
            "suggestion": error.recovery_suggestion(),
        });
        println!("{}", value);
    } else {
        tracing::error!(input = %input.display(), category = error.category(), "{}", error);
        if let Some(hint) = error.recovery_suggestion() {
            eprintln!("  hint: {}", hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_defaults_next_to_input() {
        let p = output_path(Path::new("/tmp/photos/cat.png"), None, "jpg");
        assert_eq!(p, PathBuf::from("/tmp/photos/cat.fit.jpg"));
    }

    #[test]
    fn output_path_honours_out_dir() {
        let p = output_path(Path::new("cat.jpeg"), Some(Path::new("/out")), "jpg");
        assert_eq!(p, PathBuf::from("/out/cat.fit.jpg"));
    }

    #[test]
    fn cli_flags_map_to_config() {
        let args = Args::parse_from([
            "sizefit",
            "a.jpg",
            "--target-kb",
            "200",
            "--scale-steps",
            "10",
            "--timeout-secs",
            "5",
            "--require-fit",
        ]);
        let config = args.search_config();
        assert_eq!(config.scale_steps, 10);
        assert_eq!(config.deadline, Some(Duration::from_secs(5)));
        assert_eq!(config.max_quality_iterations, 12);
        assert!(config.require_fit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tolerance_help_describes_both_sides() {
        use clap::CommandFactory;

        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("(either side) and not over it"), "{}", help);

        let args = Args::parse_from(["sizefit", "a.jpg", "--target-kb", "1", "--tolerance", "512"]);
        assert_eq!(args.search_config().early_exit_tolerance, 512);
    }
}
