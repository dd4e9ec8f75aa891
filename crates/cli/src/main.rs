//! Tessera command line.
//!
//! `tessera inspect` shows how a query is decoded, scored and judged against
//! a schema without touching any data. `tessera render` assembles a compound
//! document from a JSON dataset.
//!
//! Both print JSON on stdout and exit with status 2 when the request is
//! rejected. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tessera_document::{DocumentEngine, DocumentError, EngineConfig, MemoryStore};
use tessera_query::limits::breakdown;
use tessera_query::{
    Criteria, LimitsEnforcer, MetadataRegistry, QueryError, parse_filter, validate_criteria,
};
use tracing::{debug, info, warn};

/// Exit status for a rejected request.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
#[command(about = "Inspect query safety and render compound documents", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: EngineConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode, score and validate a query without fetching data
    Inspect {
        /// Schema file (`{"types": [...]}`)
        #[arg(long)]
        schema: PathBuf,

        /// Primary resource type
        #[arg(long = "type")]
        resource_type: String,

        /// Query string, e.g. `include=author&page[size]=5`
        #[arg(default_value = "")]
        query: String,
    },

    /// Assemble a document from a JSON dataset
    Render {
        /// Schema file (`{"types": [...]}`)
        #[arg(long)]
        schema: PathBuf,

        /// Dataset file (`{"resources": [...]}`)
        #[arg(long)]
        data: PathBuf,

        /// Primary resource type
        #[arg(long = "type")]
        resource_type: String,

        /// Render a single resource instead of a collection
        #[arg(long)]
        id: Option<String>,

        /// Query string, e.g. `include=author&page[size]=5`
        #[arg(default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Command::Inspect {
            schema,
            resource_type,
            query,
        } => inspect(&cli.config, &schema, &resource_type, &query),
        Command::Render {
            schema,
            data,
            resource_type,
            id,
            query,
        } => render(&cli.config, &schema, &data, &resource_type, id.as_deref(), &query).await,
    }
}

/// Installs the tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tessera={level},tessera_query={level},tessera_document={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_schema(path: &Path) -> anyhow::Result<MetadataRegistry> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let registry = MetadataRegistry::from_json(&raw)
        .with_context(|| format!("invalid schema {}", path.display()))?;
    debug!(path = %path.display(), types = registry.types().count(), "Schema loaded");
    Ok(registry)
}

fn load_dataset(path: &Path) -> anyhow::Result<MemoryStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let store = MemoryStore::from_json(&raw)
        .with_context(|| format!("invalid dataset {}", path.display()))?;
    debug!(path = %path.display(), resources = store.len(), "Dataset loaded");
    Ok(store)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn error_json(err: &QueryError) -> Value {
    json!({
        "status": err.status_code().to_string(),
        "code": err.code(),
        "detail": err.to_string(),
    })
}

fn inspect(
    config: &EngineConfig,
    schema: &Path,
    resource_type: &str,
    query: &str,
) -> anyhow::Result<ExitCode> {
    let registry = load_schema(schema)?;

    let criteria = match Criteria::from_query(query, config.default_page_size) {
        Ok(criteria) => criteria,
        Err(err) => {
            warn!(resource_type, code = err.code(), "Query rejected while decoding");
            print_json(&json!({
                "resource_type": resource_type,
                "accepted": false,
                "error": error_json(&err),
            }))?;
            return Ok(ExitCode::from(EXIT_REJECTED));
        }
    };

    let filter = criteria.filter.as_ref().map(|f| f.to_value());
    let round_trip = match &filter {
        Some(value) => parse_filter(value).ok().as_ref() == criteria.filter.as_ref(),
        None => true,
    };
    let complexity = breakdown(&criteria);

    let verdict = validate_criteria(&registry, resource_type, &criteria).and_then(|()| {
        LimitsEnforcer::new(config.limits())
            .enforce(resource_type, &criteria)
            .map_err(QueryError::from)
    });

    let mut report = json!({
        "resource_type": resource_type,
        "criteria": serde_json::to_value(&criteria)?,
        "filter": filter.unwrap_or(Value::Null),
        "filter_round_trip": round_trip,
        "complexity": {
            "include": complexity.include,
            "fields": complexity.fields,
            "sort": complexity.sort,
            "pagination": complexity.pagination,
            "total": complexity.total(),
        },
        "accepted": verdict.is_ok(),
    });

    let code = match verdict {
        Ok(()) => {
            info!(resource_type, score = complexity.total(), "Query accepted");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report["error"] = error_json(&err);
            ExitCode::from(EXIT_REJECTED)
        }
    };
    print_json(&report)?;
    Ok(code)
}

async fn render(
    config: &EngineConfig,
    schema: &Path,
    data: &Path,
    resource_type: &str,
    id: Option<&str>,
    query: &str,
) -> anyhow::Result<ExitCode> {
    let registry = load_schema(schema)?;
    let store = Arc::new(load_dataset(data)?);
    let engine = DocumentEngine::new(config, Arc::new(registry), store.clone())
        .with_primary_fetcher(store.clone());

    let result = match Criteria::from_query(query, config.default_page_size) {
        Ok(criteria) => match id {
            Some(id) => engine.serve_resource(resource_type, id, &criteria).await,
            None => engine.serve_collection(resource_type, &criteria).await,
        },
        Err(err) => Err(DocumentError::from(err)),
    };

    match result {
        Ok(document) => {
            info!(
                resource_type,
                included = document.included().len(),
                fetches = store.fetch_count(),
                "Document rendered"
            );
            print_json(&document.to_json())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(DocumentError::Query(err)) => {
            print_json(&json!({ "errors": [error_json(&err)] }))?;
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(err @ DocumentError::Fetch(_)) => {
            Err(anyhow::Error::new(err).context("failed to fetch data"))
        }
    }
}
