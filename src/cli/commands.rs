use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::{Bindings, RouteCompiler, RoutePlan};
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::meta::{load_manifest, ParamDescriptor};
use crate::params::ParamResolver;
use crate::pipeline::RequestContext;
use crate::processor::Processor;
use crate::registry::MethodTable;
use crate::runtime_config::RuntimeConfig;
use crate::services::{
    PaginationProcessor, RateLimitProcessor, RateLimiter, PAGINATED, RATE_LIMITED,
};

/// Inspect controller manifests without running an application.
#[derive(Parser, Debug)]
#[command(name = "nubes", version)]
#[command(about = "Plan and check nubes controller manifests", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every planned route with its pipeline
    Routes {
        /// Controller manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Application config (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Parameter kinds registered by the application (repeatable)
        #[arg(long = "kind", value_delimiter = ',')]
        kinds: Vec<String>,

        /// Class annotations with application processors (repeatable)
        #[arg(long = "annotation", value_delimiter = ',')]
        annotations: Vec<String>,
    },
    /// Plan every route and fail on the first configuration error
    Check {
        #[arg(short, long)]
        manifest: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long = "kind", value_delimiter = ',')]
        kinds: Vec<String>,

        #[arg(long = "annotation", value_delimiter = ',')]
        annotations: Vec<String>,
    },
}

/// Stand-in for a resolver that only exists in the application binary.
struct DeclaredKind;

impl ParamResolver for DeclaredKind {
    fn resolve(&self, _: &ParamDescriptor, _: &RequestContext) -> Result<Option<Value>, PipelineError> {
        Ok(None)
    }
}

/// Stand-in for a processor that only exists in the application binary.
struct DeclaredProcessor(String);

impl Processor for DeclaredProcessor {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Load a manifest and plan all of its routes.
pub fn plan_manifest(
    manifest: &Path,
    config: Option<&Path>,
    kinds: &[String],
    annotations: &[String],
) -> anyhow::Result<Vec<RoutePlan>> {
    let mut app_config = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    RuntimeConfig::from_env().apply(&mut app_config);
    app_config.validate()?;

    let metadata = load_manifest(manifest)?;

    let mut bindings = Bindings::new(MethodTable::new());
    bindings.processors.register(
        PAGINATED,
        Arc::new(PaginationProcessor::new(app_config.pagination.clone())),
    );
    bindings.processors.register(
        RATE_LIMITED,
        Arc::new(RateLimitProcessor::new(Arc::new(RateLimiter::new(
            app_config.rate_limit.clone(),
        )))),
    );
    for annotation in annotations {
        bindings
            .processors
            .register(annotation.as_str(), Arc::new(DeclaredProcessor(annotation.clone())));
    }
    for kind in kinds {
        bindings.resolvers.register(kind.as_str(), Arc::new(DeclaredKind));
    }

    let plans = RouteCompiler::new(&metadata, &bindings)
        .plan_all()
        .with_context(|| format!("invalid manifest {}", manifest.display()))?;
    Ok(plans)
}

/// Execute a parsed command, writing its report to `out`.
pub fn run(command: &Commands, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Routes {
            manifest,
            config,
            kinds,
            annotations,
        } => {
            let plans = plan_manifest(manifest, config.as_deref(), kinds, annotations)?;
            for plan in &plans {
                writeln!(out, "{plan}")?;
            }
            writeln!(out, "{} route(s)", plans.len())?;
        }
        Commands::Check {
            manifest,
            config,
            kinds,
            annotations,
        } => {
            let plans = plan_manifest(manifest, config.as_deref(), kinds, annotations)?;
            let controllers: BTreeSet<&str> = plans.iter().map(|p| &*p.controller).collect();
            writeln!(
                out,
                "ok: {} route(s) in {} controller(s)",
                plans.len(),
                controllers.len()
            )?;
        }
    }
    Ok(())
}

/// CLI logging defaults: pretty and quiet unless the environment says otherwise.
/// `--verbose` always wins for the level.
pub fn apply_log_overrides(config: &mut LogConfig, verbose: bool, level_set: bool, format_set: bool) {
    if !format_set {
        config.format = LogFormat::Pretty;
    }
    if verbose {
        config.log_level = "debug".to_string();
    } else if !level_set {
        config.log_level = "warn".to_string();
    }
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    apply_log_overrides(
        &mut log_config,
        cli.verbose,
        std::env::var_os("NUBES_LOG_LEVEL").is_some(),
        std::env::var_os("NUBES_LOG_FORMAT").is_some(),
    );
    init_logging(&log_config)?;

    let stdout = std::io::stdout();
    run(&cli.command, &mut stdout.lock())
}
