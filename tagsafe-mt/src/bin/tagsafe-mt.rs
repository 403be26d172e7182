use clap::{Arg, ArgMatches, Command, value_parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tagsafe_mt::{
    BatchConfig, ContentTranslator, FileFormat, FileOutcome, GoogleTranslateProvider,
    MachineTranslator, MockMode, MockTranslator, RetryPolicy, TranslationSettings, run_batch,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log filter from `RUST_LOG` when it is set and valid, else `info` (`debug` when verbose)
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(default))
        }
        None => EnvFilter::new(default),
    }
}

fn cli() -> Command {
    Command::new("tagsafe-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate a directory of text or JSON files, keeping {{ placeholders }} and HTML tags intact")
        .arg(
            Arg::new("input")
                .help("Directory with the source files")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("Directory for the translated files (created if missing)")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(2),
        )
        .arg(
            Arg::new("target-locale")
                .long("target")
                .short('t')
                .help("Target language code (e.g., fr, es, de)")
                .required(true),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code, or 'auto' to detect it")
                .default_value("auto"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Kind of files to translate")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("chunk-threshold")
                .long("chunk-threshold")
                .help("Strings longer than this many characters are translated in chunks")
                .value_parser(value_parser!(usize))
                .default_value("4000"),
        )
        .arg(
            Arg::new("chunk-limit")
                .long("chunk-limit")
                .help("Maximum characters per chunk")
                .value_parser(value_parser!(usize))
                .default_value("4000"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .help("Attempts per translator call, the first one included")
                .value_parser(value_parser!(u32))
                .default_value("4"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .help("Time limit for one translator call, in seconds")
                .value_parser(value_parser!(u64))
                .default_value("30"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use a mock translator that returns text unchanged")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every chunk and retry")
                .action(clap::ArgAction::SetTrue),
        )
}

fn settings_from(matches: &ArgMatches) -> TranslationSettings {
    let mut settings = TranslationSettings::new(
        matches.get_one::<String>("source-locale").unwrap(),
        matches.get_one::<String>("target-locale").unwrap(),
    );
    settings.chunk_threshold = *matches.get_one::<usize>("chunk-threshold").unwrap();
    settings.chunk_limit = *matches.get_one::<usize>("chunk-limit").unwrap();
    settings.retry = RetryPolicy {
        max_attempts: *matches.get_one::<u32>("retries").unwrap(),
        call_timeout: Duration::from_secs(*matches.get_one::<u64>("timeout-secs").unwrap()),
        ..RetryPolicy::default()
    };
    settings
}

async fn run(matches: &ArgMatches) -> Result<bool, Box<dyn std::error::Error>> {
    let translator: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::NoOp))
    } else {
        Arc::new(GoogleTranslateProvider::from_env()?)
    };

    let translator = ContentTranslator::new(translator, settings_from(matches))?;
    let config = BatchConfig::new(
        matches.get_one::<PathBuf>("input").unwrap(),
        matches.get_one::<PathBuf>("output").unwrap(),
        matches.get_one::<String>("format").unwrap().parse::<FileFormat>()?,
    );

    info!(
        provider = translator.provider_name(),
        source = %translator.settings().source_locale,
        target_locale = %translator.settings().target_locale,
        "translator ready"
    );

    let report = run_batch(&translator, &config).await?;
    for (path, outcome) in &report.files {
        if let FileOutcome::Failed(err) = outcome {
            error!(file = %path.display(), error = %err, "failed");
        }
    }
    Ok(report.is_success())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), matches.get_flag("verbose")))
        .init();

    match run(&matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("some files could not be translated");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
