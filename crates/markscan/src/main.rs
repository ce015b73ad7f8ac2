//! Scan a photographed bubble answer sheet, score it against an answer
//! key, and print the report as JSON on stdout.

use std::path::PathBuf;

use clap::Parser;
use markscan_grade::{AnswerKeyEntry, ScanResult, SheetConfig, scan};
use tracing_subscriber::EnvFilter;

/// Scan a photographed bubble answer sheet and print the scored
/// report as JSON.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path to the sheet photo (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Path to the answer key: a JSON array of
    /// `{"question": "1", "correct_answer": ["A"]}` entries.
    /// Without a key every resolved answer scores as incorrect.
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Test identifier echoed back in the report.
    #[arg(long, default_value = "")]
    test_id: String,

    /// Path to a JSON `SheetConfig` overriding the template defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let key: Vec<AnswerKeyEntry> = match &args.key {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading key {}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("parsing key: {e}"))?
        }
        None => Vec::new(),
    };

    let config: SheetConfig = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading config {}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("parsing config: {e}"))?
        }
        None => SheetConfig::default(),
    };

    let image_bytes = std::fs::read(&args.input)
        .map_err(|e| format!("reading image {}: {e}", args.input.display()))?;

    let result: ScanResult = scan(&image_bytes, &key, &args.test_id, &config)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    Ok(())
}
