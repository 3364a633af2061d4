use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use report_reader_core::{Config, ProgressStageController, ResultViewModel, Stage};
use report_reader_http::{HttpTransport, ReportUpload};

/// Medical Report Reader - Upload a medical report image to analyze its contents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the report image to analyze
    report_path: PathBuf,

    /// Processing endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Multipart field name carrying the report
    #[arg(long)]
    field_name: Option<String>,

    /// Time spent on the "Extracting Text" stage, in milliseconds
    #[arg(long)]
    extract_delay_ms: Option<u64>,

    /// Time spent on the "Analyzing with AI" stage, in milliseconds
    #[arg(long)]
    analyze_delay_ms: Option<u64>,

    /// Give up on the request after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Also write the results to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the final result as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Command line flags win over everything resolved before them.
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(field_name) = &args.field_name {
        config.field_name = field_name.clone();
    }
    if let Some(ms) = args.extract_delay_ms {
        config.delays.extracting = Duration::from_millis(ms);
    }
    if let Some(ms) = args.analyze_delay_ms {
        config.delays.analyzing = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Some(Duration::from_secs(secs));
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Plain text rendering of a finished submission.
fn render_report(file_name: &str, vm: &ResultViewModel, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", heading("Report:", color), file_name));
    if let Some(text) = vm.visible_text() {
        out.push_str(&format!("\n{}\n{}\n", heading("Extracted Text:", color), text));
    }
    if let Some(analysis) = vm.visible_analysis() {
        out.push_str(&format!("\n{}\n{}\n", heading("AI Analysis:", color), analysis));
    }
    out
}

fn progress_bar(hidden: bool) -> anyhow::Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    if !args.report_path.exists() {
        anyhow::bail!("Report file not found: {}", args.report_path.display());
    }

    // Resolve config from CLI flags > env vars > config file > defaults
    let mut config = Config::resolve(args.config.as_deref())?;
    apply_args(&mut config, &args);
    log::debug!("resolved config: {config:?}");

    let transport = HttpTransport::new(&config)?;
    let controller = ProgressStageController::new(transport, config.delays);
    let pb = progress_bar(args.json)?;
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut sub = controller.start_submission(ReportUpload::new(&args.report_path));
    let mut ticker = tokio::time::interval(Duration::from_millis(300));
    let mut tick = 0usize;
    let mut last = ResultViewModel::default();

    loop {
        tokio::select! {
            maybe_vm = sub.next() => match maybe_vm {
                Some(vm) => {
                    pb.set_position(u64::from(vm.percent));
                    pb.set_message(vm.animated_label(tick));
                    last = vm;
                }
                None => break,
            },
            _ = ticker.tick() => {
                tick = tick.wrapping_add(1);
                pb.set_message(last.animated_label(tick));
            }
            _ = tokio::signal::ctrl_c() => {
                controller.teardown();
                pb.abandon();
                anyhow::bail!("Interrupted");
            }
        }
    }

    let color = !args.no_color;
    let file_name = display_name(&args.report_path);

    match last.stage {
        Stage::Complete => {
            pb.finish_with_message(last.label());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&last)?);
            } else {
                print!("{}", render_report(&file_name, &last, color));
            }
            if let Some(path) = &args.output {
                std::fs::write(path, render_report(&file_name, &last, false))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            Ok(())
        }
        Stage::Failed => {
            pb.abandon();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&last)?);
            }
            let reason = last.error.unwrap_or_default();
            if color {
                anyhow::bail!("{}", reason.red());
            }
            anyhow::bail!("{reason}");
        }
        stage => {
            pb.abandon();
            anyhow::bail!("Submission ended unexpectedly while {stage}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_resolved_config() {
        let args = Args::parse_from([
            "report-reader",
            "scan.png",
            "--endpoint",
            "http://localhost:8080/process-report",
            "--extract-delay-ms",
            "0",
            "--timeout-secs",
            "5",
        ]);
        let mut config = Config::default();
        apply_args(&mut config, &args);

        assert_eq!(config.endpoint, "http://localhost:8080/process-report");
        assert_eq!(config.delays.extracting, Duration::ZERO);
        assert_eq!(config.delays.analyzing, Config::default().delays.analyzing);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.field_name, "reportImage");
    }

    #[test]
    fn report_lists_both_results() {
        let vm = ResultViewModel {
            stage: Stage::Complete,
            percent: 100,
            extracted_text: Some("Hemoglobin 13.5 g/dL".into()),
            analysis: Some("Within normal range.".into()),
            ..ResultViewModel::default()
        };
        let text = render_report("cbc.png", &vm, false);
        assert_eq!(
            text,
            "Report: cbc.png\n\nExtracted Text:\nHemoglobin 13.5 g/dL\n\nAI Analysis:\nWithin normal range.\n"
        );
    }

    #[test]
    fn failed_report_hides_partial_text() {
        let vm = ResultViewModel {
            stage: Stage::Failed,
            extracted_text: Some("partial".into()),
            error: Some("network error".into()),
            ..ResultViewModel::default()
        };
        assert_eq!(render_report("x.png", &vm, false), "Report: x.png\n");
    }
}
