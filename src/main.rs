//! natdoc: extract metadata and render documentation from NatSpec-annotated contracts.
//!
//! - `natdoc inspect Counter.sol` prints the rendered README (or `-f json` entity dump)
//! - `natdoc validate metadata.json` checks a persisted record
//! - `natdoc build drafts/fhe-counter` packages a draft into `dist`
//! - `natdoc publish drafts/fhe-counter/dist --catalog starters` copies it into the catalog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use natdoc::metadata::{self, MetadataDefaults, Profile};
use natdoc::pipeline::{self, BuildOptions, PipelineError, PublishOptions};
use natdoc::render::{self, Document};
use natdoc::{parser, toc};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "natdoc",
    version,
    about = "Extract metadata and render documentation from NatSpec-annotated Solidity contracts"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). NATDOC_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract entities from one contract and print the rendered document
    Inspect {
        file: PathBuf,

        /// Output format: markdown (default) or json
        #[arg(short = 'f', long, default_value = "markdown")]
        format: String,

        /// Handlebars template (markdown only)
        #[arg(short = 't', long)]
        template: Option<PathBuf>,
    },
    /// Validate a persisted metadata.json
    Validate {
        file: PathBuf,

        /// Skip the minimum description length
        #[arg(long)]
        lenient: bool,
    },
    /// Build a draft directory into a dist package
    Build {
        draft: PathBuf,

        /// Output directory (default: <draft>/dist)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Handlebars template for README.md
        #[arg(short = 't', long)]
        template: Option<PathBuf>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        chapter: Option<String>,

        /// Starter name (default: draft directory name)
        #[arg(long)]
        name: Option<String>,

        /// Contract file when contracts/ holds more than one
        #[arg(long)]
        contract: Option<PathBuf>,

        #[arg(long)]
        lenient: bool,
    },
    /// Copy a built dist into the catalog
    Publish {
        dist: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        /// Replace an existing entry of the same name
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("NATDOC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an error chain; pipeline aborts also list every collected cause.
fn report(err: &anyhow::Error) {
    let causes = err
        .downcast_ref::<PipelineError>()
        .map(|e| &e.errors)
        .or_else(|| {
            err.downcast_ref::<metadata::ValidationReport>()
                .map(|r| &r.errors)
        });
    match causes {
        Some(causes) => {
            eprintln!("error: {}", err);
            for cause in causes {
                eprintln!("  - {}", cause);
            }
        }
        None => eprintln!("error: {:#}", err),
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Inspect {
            file,
            format,
            template,
        } => inspect(&file, &format, template.as_deref()),
        Command::Validate { file, lenient } => validate(&file, lenient),
        Command::Build {
            draft,
            output,
            template,
            category,
            chapter,
            name,
            contract,
            lenient,
        } => {
            let options = BuildOptions {
                output_path: output,
                template_path: template,
                category,
                chapter,
                starter_name: name,
                contract,
                lenient,
            };
            let out = pipeline::build(&draft, &options)?;
            println!("built {} -> {}", out.metadata.name, out.dist.display());
            Ok(())
        }
        Command::Publish {
            dist,
            catalog,
            force,
        } => {
            let options = PublishOptions {
                force,
                ..Default::default()
            };
            let out = pipeline::publish(&dist, &catalog, &options)?;
            let verb = if out.replaced { "replaced" } else { "published" };
            println!("{} {} -> {}", verb, out.name, out.target.display());
            Ok(())
        }
    }
}

/// Render one contract without touching the filesystem beyond reading it.
fn inspect(file: &Path, format: &str, template: Option<&Path>) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let entities = parser::extract_entities(&source);
    let concepts = metadata::detect_concepts(&source);
    let operations = metadata::detect_operations(&source);
    let contract = entities
        .iter()
        .find(|e| e.kind == natdoc::model::EntityKind::Contract);

    // Inspection works on any file, so fall back to the file stem for the name.
    let defaults = MetadataDefaults {
        name: contract
            .is_none()
            .then(|| file.file_stem().map(|s| toc::github_slug(&s.to_string_lossy())))
            .flatten(),
        ..Default::default()
    };
    let meta = metadata::synthesize(contract, &defaults, &concepts, &operations)
        .with_context(|| format!("cannot build metadata for {}", file.display()))?;

    let template = match template {
        Some(path) => Some(render::read_template(path)?),
        None => None,
    };
    let renderer = render::create_renderer(format, template)?;
    let doc = Document {
        metadata: &meta,
        entities: &entities,
    };
    print!("{}", renderer.render(&doc)?);
    Ok(())
}

fn validate(file: &Path, lenient: bool) -> Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", file.display()))?;
    let profile = if lenient {
        Profile::Lenient
    } else {
        Profile::Strict
    };
    metadata::validate_value(&value, profile)
        .with_context(|| format!("{} is invalid", file.display()))?;
    println!("{} is valid", file.display());
    Ok(())
}
