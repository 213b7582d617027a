use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use syllabx_api::RestApi;
use syllabx_core::{Embedder, HashingEmbedder, ProgramKey, DEFAULT_EMBEDDING_DIM};
use syllabx_ranking::{RankResponse, ScoringPolicy};
use syllabx_storage::{
    ContextConfig, ContextHandle, IndexBuilder, Ingestor, Registry, ServiceContext,
    PROGRAM_METADATA_FILE, REGISTRY_FILE,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Explainable semantic ranking of academic programs
#[derive(Parser, Debug)]
#[command(name = "syllabx")]
#[command(about = "Rank academic programs by syllabus alignment", long_about = None)]
struct Args {
    /// Directory holding registry.json, university_metadata.json and raw_pdfs/
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Directory holding the index artifacts
    #[arg(long, default_value = "./vector_store", global = true)]
    index_dir: PathBuf,

    /// Scoring policy JSON file
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Embedding dimension
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM, global = true)]
    dim: usize,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8000)]
        http_port: u16,
    },
    /// Build the syllabus index from the registry
    BuildIndex,
    /// Rank programs for one interest and print JSON
    Rank {
        interest: String,
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print full explainability instead of the API view
        #[arg(long)]
        explain: bool,
    },
    /// Register a local syllabus document as a new version
    Ingest {
        #[arg(long)]
        college: String,
        #[arg(long)]
        program: String,
        #[arg(long)]
        academic_year: Option<String>,
        file: PathBuf,
    },
    /// Re-download active syllabi with a source URL and register changes
    CheckUpdates,
    /// Report programs with more than one active registry entry
    ValidateRegistry,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(args.dim)?);
    let registry_path = args.data_dir.join(REGISTRY_FILE);

    match &args.command {
        Command::Serve { http_port } => serve(&args, embedder, *http_port).await,
        Command::BuildIndex => {
            let registry = Registry::load(&registry_path)
                .with_context(|| format!("loading {}", registry_path.display()))?;
            let report = IndexBuilder::new(embedder.as_ref(), &args.data_dir)
                .build_and_save(&registry, &args.index_dir)?;
            for (key, reason) in &report.skipped {
                warn!("Skipped {}: {}", key, reason);
            }
            info!(
                "Indexed {} programs ({} units) into {:?}",
                report.programs_indexed, report.units_indexed, args.index_dir
            );
            Ok(())
        }
        Command::Rank {
            interest,
            limit,
            explain,
        } => {
            let context = ServiceContext::load(context_config(&args)?, embedder)?;
            let ranking = context.rank(interest, *limit)?;
            let json = if *explain {
                serde_json::to_string_pretty(&ranking.results)?
            } else {
                serde_json::to_string_pretty(&RankResponse::from_ranked(&ranking.results))?
            };
            println!("{}", json);
            Ok(())
        }
        Command::Ingest {
            college,
            program,
            academic_year,
            file,
        } => {
            let mut registry = Registry::load_or_default(&registry_path)?;
            let key = ProgramKey::new(college.clone(), program.clone());
            let ingested = Ingestor::new(&args.data_dir).ingest_file(
                &mut registry,
                &key,
                academic_year.as_deref(),
                file,
                chrono::Local::now().date_naive(),
            )?;
            registry.save(&registry_path)?;
            info!("{}: {:?} ({})", key, ingested.outcome, ingested.file_path);
            Ok(())
        }
        Command::CheckUpdates => {
            let mut registry = Registry::load(&registry_path)
                .with_context(|| format!("loading {}", registry_path.display()))?;
            let report = Ingestor::new(&args.data_dir)
                .check_for_updates(&mut registry, &reqwest::Client::new(), chrono::Local::now().date_naive())
                .await;
            registry.save(&registry_path)?;

            for (key, reason) in &report.failed {
                warn!("Error checking {}: {}", key, reason);
            }
            if report.needs_rebuild() {
                info!("Updates detected for {} programs. Run build-index to rebuild.", report.updated.len());
            } else {
                info!("All syllabi are up to date");
            }
            Ok(())
        }
        Command::ValidateRegistry => {
            let registry = Registry::load(&registry_path)
                .with_context(|| format!("loading {}", registry_path.display()))?;
            let violations = registry.integrity_violations();
            for violation in &violations {
                let chosen = &registry.entries()[violation.chosen];
                println!(
                    "{}: {} active entries (positions {:?}), resolving to {}",
                    violation.key,
                    violation.positions.len(),
                    violation.positions,
                    chosen.file_path
                );
            }
            if registry.unparsed_count() > 0 {
                println!("{} malformed entries", registry.unparsed_count());
            }
            if violations.is_empty() && registry.unparsed_count() == 0 {
                println!("Registry OK: {} entries", registry.entries().len());
                Ok(())
            } else {
                anyhow::bail!("registry has {} integrity violations", violations.len() + registry.unparsed_count())
            }
        }
    }
}

fn context_config(args: &Args) -> anyhow::Result<ContextConfig> {
    let policy = match &args.policy {
        Some(path) => load_policy(path)?,
        None => ScoringPolicy::default(),
    };
    Ok(ContextConfig {
        index_dir: args.index_dir.clone(),
        metadata_path: args.data_dir.join(PROGRAM_METADATA_FILE),
        policy,
    })
}

fn load_policy(path: &Path) -> anyhow::Result<ScoringPolicy> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let policy = ScoringPolicy::from_json(&json).with_context(|| format!("invalid policy {}", path.display()))?;
    info!("Loaded scoring policy from {:?}", path);
    Ok(policy)
}

async fn serve(args: &Args, embedder: Arc<dyn Embedder>, http_port: u16) -> anyhow::Result<()> {
    info!("Starting SyllabX v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Index directory: {:?}", args.index_dir);
    info!("HTTP API port: {}", http_port);

    let handle = Arc::new(
        ContextHandle::load(context_config(args)?, embedder).context("refusing to start without a valid index")?,
    );
    info!("Index loaded: {} units", handle.current().info().index_size);

    let handle_http = handle.clone();
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(handle_http, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("SyllabX started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
