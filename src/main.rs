use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use reqwest::blocking::Client;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use almanac::config::{Config, Overrides};
use almanac::download::{self, Selection};
use almanac::layout::Layout;
use almanac::materialize::{HttpMaterializer, Materializer, OfflineMaterializer, RefreshPolicy};
use almanac::registry::csv_registry::CsvRegistry;
use almanac::registry::Location;
use almanac::translation::LocaleTree;
use almanac::Runner;

/// Collects extension data into data.json
#[derive(Parser, Debug)]
#[command(name = "almanac")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download, collect and write {output}/data.json
    Collect {
        /// Output directory
        #[arg(value_name = "OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Stop after this many extensions
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Merge translated trees
        #[arg(long)]
        translate: bool,

        /// Only use versions that are already downloaded
        #[arg(long)]
        offline: bool,

        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// Download versions without collecting them
    Download {
        /// Output directory
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Extensions as `id` or `id==version` (default: all)
        #[arg(value_name = "VERSIONS")]
        versions: Vec<String>,

        /// Download versions that were already downloaded
        #[arg(long, value_enum)]
        overwrite: Option<Overwrite>,

        #[command(flatten)]
        registry: RegistryArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct RegistryArgs {
    /// URL or path of extensions.csv
    #[arg(long, value_name = "URL")]
    extensions_url: Option<String>,

    /// URL or path of extension_versions.csv
    #[arg(long, value_name = "URL")]
    extension_versions_url: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Overwrite {
    /// Re-download everything
    Any,
    /// Keep what is already there
    None,
    /// Re-download versions without a release date
    Live,
}

fn refresh_policy(overwrite: Option<Overwrite>) -> RefreshPolicy {
    match overwrite {
        Some(Overwrite::Any) => RefreshPolicy::Any,
        Some(Overwrite::None) => RefreshPolicy::None,
        Some(Overwrite::Live) => RefreshPolicy::Live,
        None => RefreshPolicy::Refuse,
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let client = Client::builder()
        .user_agent(concat!("almanac/", env!("CARGO_PKG_VERSION")))
        .build()?;

    match args.command {
        Command::Collect {
            output,
            limit,
            translate,
            offline,
            registry,
        } => {
            let overrides = Overrides {
                output,
                limit,
                translate,
                offline,
                extensions: registry.extensions_url,
                extension_versions: registry.extension_versions_url,
            };
            let config = Config::load(args.config.as_ref(), &overrides)?;
            info!("Collecting into {}", config.output.display());

            let layout = Layout::new(&config.output);
            let source = registry_source(&config, client.clone());
            let materializer: Box<dyn Materializer> = if config.offline {
                Box::new(OfflineMaterializer::new(layout.clone()))
            } else {
                Box::new(HttpMaterializer::new(layout.clone(), client))
            };

            let mut runner = Runner::new(layout.clone(), Box::new(source), materializer)
                .with_limit(config.limit);
            if config.translate {
                runner = runner.with_translator(Box::new(LocaleTree::new(layout)));
            }
            let document = runner.run()?;
            info!("Collected {} extensions", document.extensions.len());
        }
        Command::Download {
            output,
            versions,
            overwrite,
            registry,
        } => {
            let selection = Selection::parse(versions.as_slice())?;
            let overrides = Overrides {
                output: Some(output),
                extensions: registry.extensions_url,
                extension_versions: registry.extension_versions_url,
                ..Default::default()
            };
            let config = Config::load(args.config.as_ref(), &overrides)?;

            let layout = Layout::new(&config.output);
            let source = registry_source(&config, client.clone());
            let materializer = HttpMaterializer::new(layout, client).with_policy(refresh_policy(overwrite));

            download::download(&source, &materializer, &selection)?;
        }
    }

    Ok(())
}

fn registry_source(config: &Config, client: Client) -> CsvRegistry {
    info!(
        "Using registry {} and {}",
        config.registry.extensions, config.registry.extension_versions
    );
    CsvRegistry::new(
        Location::parse(&config.registry.extensions),
        Location::parse(&config.registry.extension_versions),
        client,
    )
}
