//! Directory-to-directory translation of `.txt` and `.json` files
//!
//! Files are processed one at a time in file-name order. A file whose name already
//! exists in the output directory is skipped without touching the translator. Bad input
//! or a failed translation marks that one file as failed and the batch moves on; an
//! output directory that cannot be written aborts the batch.

use crate::error::{MtError, MtResult};
use crate::pipeline::ContentTranslator;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info, warn};

/// Kind of files a batch reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Whole file is one string
    #[default]
    Text,
    /// File is a JSON document; every string leaf is translated
    Json,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Text => "txt",
            FileFormat::Json => "json",
        }
    }

    fn matches(self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some(self.extension())
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Text => write!(f, "text"),
            FileFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for FileFormat {
    type Err = MtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(FileFormat::Text),
            "json" => Ok(FileFormat::Json),
            other => Err(MtError::Config(format!(
                "unknown file format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Where to read from, where to write to, and which files to pick up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: FileFormat,
}

impl BatchConfig {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        format: FileFormat,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            format,
        }
    }
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Translated,
    /// Output already existed
    Skipped,
    Failed(MtError),
}

/// Per-file results of a batch, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl BatchReport {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Translated => self.translated += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
        self.files.push((path, outcome));
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Outcome recorded for the input file called `name`
    pub fn outcome_of(&self, name: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|(path, _)| path.file_name().and_then(|n| n.to_str()) == Some(name))
            .map(|(_, outcome)| outcome)
    }
}

/// Translate every matching file of `config.input_dir` into `config.output_dir`
///
/// # Returns
/// A report with one entry per input file
///
/// # Errors
/// - `MtError::Input` when the input directory cannot be listed
/// - `MtError::Output` when the output directory cannot be created or a file cannot be
///   written; files processed before that keep their output
pub async fn run_batch(
    translator: &ContentTranslator,
    config: &BatchConfig,
) -> MtResult<BatchReport> {
    let inputs = list_inputs(&config.input_dir, config.format).await?;
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        format = %config.format,
        files = inputs.len(),
        provider = translator.provider_name(),
        "starting batch"
    );

    fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| MtError::output(&config.output_dir, e))?;

    let mut report = BatchReport::default();

    for input in inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let output = config.output_dir.join(name);

        let exists = fs::try_exists(&output)
            .await
            .map_err(|e| MtError::output(&output, e))?;
        if exists {
            info!(file = %input.display(), "output exists, skipping");
            report.record(input, FileOutcome::Skipped);
            continue;
        }

        match translate_file(translator, &input, config.format).await {
            Ok(contents) => {
                write_atomically(&output, &contents).await?;
                info!(file = %input.display(), output = %output.display(), "translated");
                report.record(input, FileOutcome::Translated);
            }
            Err(err) => {
                warn!(file = %input.display(), error = %err, "translation failed");
                report.record(input, FileOutcome::Failed(err));
            }
        }
    }

    info!(
        translated = report.translated,
        skipped = report.skipped,
        failed = report.failed,
        "batch finished"
    );

    Ok(report)
}

/// Files in `dir` with the extension of `format`, sorted by name
async fn list_inputs(dir: &Path, format: FileFormat) -> MtResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| MtError::input(dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| MtError::input(dir, e))? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|kind| kind.is_file())
            .unwrap_or(false);
        if is_file && format.matches(&path) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Read, translate and serialize one file
async fn translate_file(
    translator: &ContentTranslator,
    path: &Path,
    format: FileFormat,
) -> MtResult<String> {
    let bytes = fs::read(path).await.map_err(|e| MtError::input(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| MtError::input(path, e))?;
    debug!(file = %path.display(), chars = text.chars().count(), "read input");

    match format {
        FileFormat::Text => translator.translate_string(&text).await,
        FileFormat::Json => {
            let value: Value =
                serde_json::from_str(&text).map_err(|e| MtError::input(path, e))?;
            let translated = translator.translate_value(&value).await?;
            serde_json::to_string_pretty(&translated).map_err(|e| MtError::input(path, e))
        }
    }
}

/// Write `contents` next to `path` and rename it into place
async fn write_atomically(path: &Path, contents: &str) -> MtResult<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MtError::output(path, "invalid file name"))?;
    let temp = path.with_file_name(format!(".{}.partial", file_name));

    fs::write(&temp, contents)
        .await
        .map_err(|e| MtError::output(&temp, e))?;

    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(MtError::output(path, e));
    }
    Ok(())
}
