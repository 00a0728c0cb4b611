// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanscribe — batch OCR of scanned PDFs into text and DOCX.
//
// Entry point. Loads the configuration, initialises logging, validates the
// configuration (doctor reports it instead), and dispatches to the
// conversion, export, word-count, and doctor commands.

mod preflight;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use scanscribe_core::config::DEFAULT_CONFIG_FILE;
use scanscribe_core::human_errors::humanize_error;
use scanscribe_core::{AppConfig, BatchReport, Result, ScanscribeError};
use scanscribe_document::export::convert_text_folder;
use scanscribe_document::wordcount;
use scanscribe_document::{
    DocumentPipeline, PdftoppmRasterizer, PipelineSettings, RecognitionEngine, TesseractEngine,
    discover_sources,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every PDF in the input folder to a text file
    Convert {
        /// Write a JSON summary of the run to this file
        #[arg(long)]
        report: Option<PathBuf>,
        /// Recognition backend
        #[arg(long, value_enum, default_value_t = EngineKind::Tesseract)]
        engine: EngineKind,
    },
    /// Convert every text file in the output folder to DOCX
    Docx,
    /// Count words in text and DOCX files and write a CSV
    Count,
    /// Check that external tools and folders are in place
    Doctor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// The tesseract command-line engine at `tesseract_path`
    Tesseract,
    /// Pure-Rust ocrs models (needs the `ocrs` build feature)
    Ocrs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config);
    init_tracing(config.as_ref().ok());

    // Doctor reports validation problems as a check instead of refusing to run.
    let config = config.and_then(|config| {
        if needs_valid_config(&cli.command) {
            config.validate()?;
        }
        Ok(config)
    });
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            report_fatal(&err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Commands::Convert { report, engine } => convert(&config, engine, report.as_deref()),
        Commands::Docx => export_docx(&config),
        Commands::Count => count_words(&config),
        Commands::Doctor => Ok(doctor(&config)),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn needs_valid_config(command: &Commands) -> bool {
    !matches!(command, Commands::Doctor)
}

/// `RUST_LOG` wins; otherwise the configured `logging_level`, otherwise `info`.
fn init_tracing(config: Option<&AppConfig>) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(config)),
        )
        .init();
}

fn fallback_filter(config: Option<&AppConfig>) -> EnvFilter {
    let level = config
        .and_then(|config| config.log_level().ok())
        .unwrap_or(LevelFilter::INFO);
    EnvFilter::default().add_directive(level.into())
}

fn report_fatal(err: &ScanscribeError) {
    let human = humanize_error(err);
    error!(error = %err, "Run aborted");
    eprintln!("error: {}\n  {}", human.message, human.suggestion);
}

// -- Commands -----------------------------------------------------------------

fn convert(config: &AppConfig, engine: EngineKind, report_path: Option<&Path>) -> Result<bool> {
    let sources = discover_sources(&config.input_folder)?;
    if sources.is_empty() {
        warn!(folder = %config.input_folder.display(), "No PDF files found");
    }
    std::fs::create_dir_all(&config.output_folder)?;

    let pipeline = DocumentPipeline::new(
        PdftoppmRasterizer::new(&config.pdftoppm_path),
        build_engine(engine, config)?,
        PipelineSettings::from_config(config),
    );
    let report = pipeline.run_batch(&sources);

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Run report written");
    }

    print_summary(&report);
    Ok(report.all_converted())
}

fn build_engine(kind: EngineKind, config: &AppConfig) -> Result<Box<dyn RecognitionEngine>> {
    match kind {
        EngineKind::Tesseract => Ok(Box::new(TesseractEngine::new(&config.tesseract_path))),
        EngineKind::Ocrs => build_ocrs_engine(),
    }
}

#[cfg(feature = "ocrs")]
fn build_ocrs_engine() -> Result<Box<dyn RecognitionEngine>> {
    use scanscribe_document::{OcrsConfig, OcrsEngine};
    Ok(Box::new(OcrsEngine::new(OcrsConfig::default())?))
}

#[cfg(not(feature = "ocrs"))]
fn build_ocrs_engine() -> Result<Box<dyn RecognitionEngine>> {
    Err(ScanscribeError::Dependency(
        "this build has no ocrs engine; rebuild with `--features ocrs`".into(),
    ))
}

fn print_summary(report: &BatchReport) {
    println!(
        "Converted {} of {} documents.",
        report.converted_count(),
        report.documents.len()
    );
    for failed in report.failed() {
        println!("  failed: {}", failed.source.display());
        if let Some(ref detail) = failed.error {
            println!("    {detail}");
        }
        if let Some(ref suggestion) = failed.suggestion {
            println!("    try: {suggestion}");
        }
    }
}

fn export_docx(config: &AppConfig) -> Result<bool> {
    let outcomes = convert_text_folder(
        &config.output_folder,
        &config.docx_output_folder,
        &config.output_prefix,
        &config.output_suffix,
    )?;
    let converted = outcomes.iter().filter(|o| o.is_converted()).count();
    println!("Converted {} of {} text files to DOCX.", converted, outcomes.len());
    Ok(converted == outcomes.len())
}

fn count_words(config: &AppConfig) -> Result<bool> {
    let counts = wordcount::write_report(config.word_count_folder(), &config.word_count_output_path)?;
    println!(
        "Word counts for {} files saved to {}",
        counts.len(),
        config.word_count_output_path.display()
    );
    Ok(true)
}

fn doctor(config: &AppConfig) -> bool {
    let report = preflight::run_preflight(config);
    print!("{}", report.render());
    report.all_passed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_defaults() {
        let cli = Cli::try_parse_from(["scanscribe", "convert"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        match cli.command {
            Commands::Convert { report, engine } => {
                assert_eq!(report, None);
                assert_eq!(engine, EngineKind::Tesseract);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scanscribe", "convert", "--config", "alt.toml", "--report", "run.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(cli.command, Commands::Convert { report: Some(_), .. }));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        assert!(Cli::try_parse_from(["scanscribe", "convert", "--engine", "magic"]).is_err());
    }

    #[cfg(not(feature = "ocrs"))]
    #[test]
    fn ocrs_without_feature_is_a_dependency_error() {
        let err = build_engine(EngineKind::Ocrs, &AppConfig::default()).err().unwrap();
        assert!(matches!(err, ScanscribeError::Dependency(_)));
    }

    #[test]
    fn only_doctor_runs_on_an_unvalidated_config() {
        assert!(!needs_valid_config(&Commands::Doctor));
        assert!(needs_valid_config(&Commands::Docx));
        assert!(needs_valid_config(&Commands::Count));
        assert!(needs_valid_config(&Commands::Convert {
            report: None,
            engine: EngineKind::Tesseract,
        }));
    }

    #[test]
    fn fallback_filter_follows_logging_level() {
        let config = |level: &str| AppConfig {
            logging_level: level.into(),
            ..AppConfig::default()
        };
        assert_eq!(
            fallback_filter(Some(&config("WARNING"))).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            fallback_filter(Some(&config("CRITICAL"))).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
        assert_eq!(
            fallback_filter(Some(&config("nonsense"))).max_level_hint(),
            Some(LevelFilter::INFO)
        );
        assert_eq!(fallback_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn convert_with_empty_input_fails_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            input_folder: dir.path().join("pdfs"),
            output_folder: dir.path().join("txt"),
            ..AppConfig::default()
        };
        std::fs::create_dir(&config.input_folder).unwrap();

        let err = convert(&config, EngineKind::Tesseract, None).unwrap_err();
        assert!(matches!(err, ScanscribeError::Config(_)));
        assert!(!config.output_folder.exists());
    }
}
