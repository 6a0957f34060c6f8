//! Server Configurator - CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use server_configurator::config::BUILTIN_TABLE;
use server_configurator::metrics::DeprecationMetrics;
use server_configurator::{
    ConfiguratorConfig, DeprecationRegistry, ServerSeries, ServerVersion, StartupTarget,
    SystemResolver, UpgradeChecker,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "server-configurator",
    about = "Check server variables for deprecations and resolve managed server targets",
    version
)]
struct Args {
    /// Path to configuration file (built-in table only if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not merge the built-in deprecation table into the configuration
    #[arg(long)]
    no_builtin: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print the built-in deprecation table and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Target release series (e.g. "8.0")
    #[arg(short, long)]
    series: Option<ServerSeries>,

    /// Target server version (e.g. "8.0.34"); implies the series
    #[arg(long, value_name = "VERSION")]
    server_version: Option<ServerVersion>,

    /// List every deprecated variable of the series
    #[arg(long)]
    review: bool,

    /// Managed server to resolve; its related connections are listed too
    #[arg(long, value_name = "NAME")]
    server: Option<String>,

    /// Emit the upgrade report as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    metrics: bool,

    /// Variables in use to check
    variables: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        println!("{}", BUILTIN_TABLE);
        return Ok(());
    }

    let config = load_config(&args)?;

    // Population aborts on the first duplicate or invalid row
    let registry = DeprecationRegistry::from_config(&config)
        .context("Failed to build deprecation registry")?;

    if args.validate {
        println!(
            "Configuration is valid: {} deprecated variables, {} managed servers",
            registry.len(),
            config.servers.len()
        );
        return Ok(());
    }

    let metrics = Arc::new(DeprecationMetrics::with_config(&config.metrics)?);
    metrics.record_registry(&registry);

    if let Some(name) = &args.server {
        show_server(&config, name).await?;
    }

    let series = match (args.series, args.server_version) {
        (Some(series), Some(version)) if !series.contains(&version) => {
            anyhow::bail!("Version {} is not part of series {}", version, series);
        }
        (Some(series), _) => Some(series),
        (None, Some(version)) => Some(
            ServerSeries::of(&version)
                .with_context(|| format!("Version {} is not in a known series", version))?,
        ),
        (None, None) => None,
    };

    if let Some(series) = series {
        let mut checker = UpgradeChecker::new(&registry);
        if config.metrics.enabled {
            checker = checker.with_metrics(metrics.clone());
        }

        if args.review {
            for finding in checker.pending_review(series) {
                println!("{}", finding.message());
            }
        }

        if !args.variables.is_empty() {
            let report = checker.check(&args.variables, series, args.server_version);
            if args.json {
                println!("{}", report.to_json()?);
            } else if report.is_clean() {
                println!("No deprecated variables in use for {}", series);
            } else {
                for finding in &report.findings {
                    println!("{}", finding.message());
                }
            }
        }
    } else if args.review || !args.variables.is_empty() {
        anyhow::bail!("--series or --server-version is required to check variables");
    }

    if args.metrics && config.metrics.enabled {
        print!("{}", metrics.encode()?);
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ConfiguratorConfig> {
    let Some(path) = &args.config else {
        info!("Using built-in deprecation table");
        return ConfiguratorConfig::builtin();
    };

    info!(path = ?path, "Loading configuration");
    let config = ConfiguratorConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))?;

    if args.no_builtin {
        return Ok(config);
    }

    let merged = config.with_builtin_variables()?;
    merged.validate()?;
    Ok(merged)
}

/// Resolve a managed server off the async runtime and print its connections.
async fn show_server(config: &ConfiguratorConfig, name: &str) -> Result<()> {
    let server = config
        .find_server(name)
        .with_context(|| format!("Managed server not found: {}", name))?;
    let mut target = StartupTarget::from_managed(server);

    let (target, resolved) = tokio::task::spawn_blocking(move || {
        let resolved = target.resolved_address(SystemResolver);
        (target, resolved)
    })
    .await?;

    let endpoint = format!("{}:{}", target.host_name(), target.port());
    match resolved {
        Ok(address) => println!("{} ({}) -> {}", name, endpoint, address),
        Err(e) => println!("{} ({}) -> unresolved: {}", name, endpoint, e),
    }

    for connection in target.related_connections(&config.connections) {
        let user = connection
            .user_name
            .as_deref()
            .map(|u| format!("{}@", u))
            .unwrap_or_default();
        println!(
            "  {} [{}{}:{}]",
            connection.name, user, connection.host_name, connection.port
        );
    }

    Ok(())
}
