// src/main.rs
use std::path::PathBuf;

use clap::Parser;
use tax_doc_extractor::config::PipelineConfig;
use tax_doc_extractor::document::loader::load_document;
use tax_doc_extractor::storage::StorageManager;
use tax_doc_extractor::utils::{self, AppError};

/// Command Line Interface for the tax document extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parsed document: a JSON DocumentInput, or plain text
    #[arg(short, long)]
    input: PathBuf,

    /// Original filename used for classification hints (defaults to the input's name)
    #[arg(short, long)]
    filename: Option<String>,

    /// Output directory for extraction records
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Print the record to stdout instead of saving it
    #[arg(long)]
    stdout: bool,

    /// Minimum classification score before a type is accepted (default: 0.3)
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Distribution amount above which a note is added (default: 100000)
    #[arg(long)]
    distribution_threshold: Option<f64>,

    /// Debug logging when RUST_LOG is not set
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG overrides --verbose)
    utils::logging::setup_logging(if args.verbose {
        utils::logging::VERBOSE_DIRECTIVE
    } else {
        utils::logging::DEFAULT_DIRECTIVE
    });
    tracing::info!("Starting processing for args: {:?}", args);

    if let Some(min) = args.min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(AppError::Config(format!("--min-confidence must be within [0, 1], got {}", min)));
        }
    }

    // 3. Resolve configuration (env, then CLI overrides)
    let config = PipelineConfig::from_env().with_overrides(args.min_confidence, args.distribution_threshold);
    tracing::debug!("Using {:?}", config);

    // 4. Load the document
    let input = load_document(&args.input, args.filename.as_deref())?;

    // 5. Run the pipeline
    let record = tax_doc_extractor::process_document_with_config(&input, &config);

    for flag in &record.red_flags {
        tracing::warn!("Red flag: {}", flag);
    }

    // 6. Emit the result
    if args.stdout {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let storage = StorageManager::new(&args.output_dir)?;
    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let path = storage.save_record(&record, &stem)?;
    tracing::info!("Saved extraction record to: {}", path.display());

    match storage.save_metadata(&record, &stem, input.document_id.as_deref(), &input.filename) {
        Ok(path) => tracing::info!("Saved metadata to: {}", path.display()),
        Err(e) => tracing::error!("Failed to save metadata: {}", e),
    }

    tracing::info!(
        "Processing finished: {} (confidence {:.2})",
        record.classification.document_type_internal,
        record.classification.confidence_score
    );

    Ok(())
}
