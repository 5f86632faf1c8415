//! Recipient orchestration
//!
//! Iterates a recipient list in order, producing one watermarked copy of the
//! source document per name. Processing is sequential and aborts on the
//! first error; there is no per-recipient recovery.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::clock::{format_date, Clock};
use crate::error::{Error, Result};
use crate::pdf::{count_pages, watermark_document, WatermarkSpec};

/// One watermarking run: a source document, an output base path, and the
/// recipients to produce copies for.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source PDF path; must exist
    pub input_path: PathBuf,
    /// Base path whose stem and parent directory the output names derive from
    pub output_base: PathBuf,
    /// Recipient names, in output order. Duplicates are not filtered; a
    /// duplicate name regenerates and overwrites the same file.
    pub recipients: Vec<String>,
}

/// Watermark the source once per recipient.
///
/// The input path is checked once, up front; a missing input fails before
/// any file is written. Returns the output paths in the order written.
pub fn run(options: &RunOptions, clock: &dyn Clock) -> Result<Vec<PathBuf>> {
    if !options.input_path.exists() {
        return Err(Error::FileNotFound(options.input_path.clone()));
    }

    let page_count = count_pages(&options.input_path)?;
    let total = options.recipients.len();
    log::info!(
        "watermarking {} ({} pages) for {} recipient(s)",
        options.input_path.display(),
        page_count,
        total
    );

    let date = clock.today();
    let mut written = Vec::with_capacity(total);

    for (i, person) in options.recipients.iter().enumerate() {
        let spec = WatermarkSpec::for_recipient(person, &date);
        let output_path = derive_output_path(&options.output_base, person, &date);
        log::info!("[{}/{}] {} -> {}", i + 1, total, person, output_path.display());

        watermark_document(&options.input_path, &spec, &output_path)?;
        written.push(output_path);
    }

    Ok(written)
}

/// Derive the output filename for one recipient:
/// `{parent}/{stem}_{person with spaces -> underscores}_{MM-DD-YYYY}.pdf`.
///
/// The base path's extension is discarded; `.pdf` is always appended.
pub fn derive_output_path(output_base: &Path, person: &str, date: &NaiveDate) -> PathBuf {
    let stem = output_base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!(
        "{}_{}_{}.pdf",
        stem,
        person.replace(' ', "_"),
        format_date(date)
    );

    match output_base.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Resolve the recipient list from an explicit name list or a name file.
///
/// Explicit names win when both are supplied. Name files are one name per
/// line; blank lines are skipped. Neither source is a configuration error.
pub fn load_recipients(
    names: Option<Vec<String>>,
    name_file: Option<&Path>,
) -> Result<Vec<String>> {
    match (names, name_file) {
        (Some(names), _) => Ok(names),
        (None, Some(path)) => {
            let text = fs::read_to_string(path)?;
            Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect())
        }
        (None, None) => Err(Error::NoRecipients),
    }
}
