//! PDF Watermark CLI tool
//!
//! Stamps a rotated, per-recipient text watermark onto every page of a PDF,
//! writing one output file per recipient name.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use pdf_watermark::clock::{parse_date_arg, Clock, FixedClock, SystemClock};
use pdf_watermark::pipeline::{load_recipients, run, RunOptions};

/// PDF Watermark - personalized watermarked copies of a document
#[derive(Parser)]
#[command(name = "pdf-watermark")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # One output per name, written next to out.pdf
    pdf-watermark report.pdf out.pdf --names \"Jane Doe\" \"John Smith\"

    # Read names from a file, one per line
    pdf-watermark report.pdf out.pdf --name-file names.txt

    # Pin the stamped date
    pdf-watermark report.pdf out.pdf --names Alice --date 01-15-2024")]
struct Cli {
    /// Input PDF file
    input: PathBuf,

    /// Output base path; per-recipient filenames derive from its stem
    output: PathBuf,

    /// Recipient names
    #[arg(long, num_args = 1.., value_name = "NAME")]
    names: Option<Vec<String>>,

    /// Path to a file containing recipient names, one per line
    #[arg(long, value_name = "PATH")]
    name_file: Option<PathBuf>,

    /// Date to stamp instead of today (MM-DD-YYYY or YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    date: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let recipients = load_recipients(cli.names, cli.name_file.as_deref())?;

    let clock: Box<dyn Clock> = match cli.date.as_deref() {
        Some(arg) => Box::new(FixedClock(parse_date_arg(arg)?)),
        None => Box::new(SystemClock),
    };

    let options = RunOptions {
        input_path: cli.input,
        output_base: cli.output,
        recipients,
    };

    let written = run(&options, clock.as_ref())?;
    eprintln!("Wrote {} file(s)", written.len());

    Ok(())
}
