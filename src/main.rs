use anyhow::{Context, Result};
use clap::Parser;
use paramdiff::config::{Config, OutputFormat};
use paramdiff::runner::{parse_file_path, run_comparison, ComparisonReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paramdiff", about = "Compare game script/config files and list parameter changes")]
#[command(version)]
struct Cli {
    /// Original file or directory
    original: String,

    /// Modified file or directory
    modified: String,

    /// Context lines around each change (overrides config)
    #[arg(short, long)]
    context: Option<usize>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Size threshold in bytes above which the line diff is skipped (overrides config)
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Only report which files changed
    #[arg(long)]
    no_diff: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Apply CLI overrides to config
    if let Some(context) = cli.context {
        config.context_lines = context;
    }
    if let Some(max_bytes) = cli.max_bytes {
        config.max_text_bytes = max_bytes;
    }
    if cli.no_diff {
        config.include_diff = false;
    }
    if cli.json {
        config.output = OutputFormat::Json;
    }
    config.validate()?;

    let original = parse_file_path(&cli.original)
        .with_context(|| format!("Original path '{}' does not exist", cli.original.trim()))?;
    // A missing modified file is reported as a removal, so it only needs to be non-blank.
    let modified_input = cli.modified.trim();
    anyhow::ensure!(!modified_input.is_empty(), "Modified path is empty");
    let modified = PathBuf::from(modified_input);

    let report = run_comparison(original, modified, config.compare_options())
        .await
        .map_err(anyhow::Error::msg)?;

    match config.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", render_text(&report)),
    }
    Ok(())
}

fn render_text(report: &ComparisonReport) -> String {
    let mut out = String::new();
    if report.results.is_empty() {
        out.push_str("No differences.\n");
    }
    for result in &report.results {
        out.push_str(&format!("== {} [{}]\n", result.path(), result.kind()));
        if let Some(diff) = result.diff().filter(|d| !d.is_empty()) {
            out.push_str(diff);
            if !diff.ends_with('\n') {
                out.push('\n');
            }
        }
        if result.diff_truncated() {
            out.push_str("(diff skipped: file too large, parameters compared instead)\n");
        }
        if let Some(changes) = result.param_changes() {
            out.push_str("Parameter changes:\n");
            for change in changes {
                out.push_str(&format!(
                    "  {}: {} -> {}\n",
                    change.name,
                    display_value(&change.old_value),
                    display_value(&change.new_value)
                ));
            }
        }
    }
    let s = &report.summary;
    out.push_str(&format!(
        "\n{} added, {} removed, {} modified (text), {} modified (binary)\n",
        s.added, s.removed, s.modified_text, s.modified_binary
    ));
    out
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}
