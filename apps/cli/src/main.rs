//! om-manifest - query Ops Manager staged manifests from the command line
//!
//! # Examples
//!
//! ```bash
//! # Read a property of a job from the staged p-mysql manifest
//! om-manifest --product p-mysql get --job mysql --lens cf_mysql.mysql.port --type int
//!
//! # List jobs and instance groups of a manifest saved to disk
//! om-manifest --file manifest.yml jobs
//! ```
//!
//! Exits with 1 when a lookup finds nothing usable and 2 on any other error.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use om_manifest::{
    FetchError, FileSource, Manifest, ManifestError, ManifestSource, OpsManagerAPI,
    OpsManagerSource, Properties,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};

/// Query BOSH manifests staged by Ops Manager
#[derive(Parser, Debug)]
#[command(name = "om-manifest")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "product"])))]
struct Cli {
    /// Manifest file on disk (bare or wrapped in `manifest:`)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Staged product type to fetch from Ops Manager (uses OPSMAN_* variables)
    #[arg(short, long)]
    product: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value at a lens in a job's properties
    Get {
        /// Job, partitioned job prefix or instance group name
        #[arg(short, long)]
        job: String,

        /// Dotted path into the properties, e.g. `a.b.c`
        #[arg(short, long)]
        lens: String,

        /// Type the value must have
        #[arg(long = "type", value_enum, default_value = "any")]
        value_type: ValueType,
    },

    /// List jobs and instance groups
    Jobs,

    /// Print the manifest document
    Raw,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ValueType {
    String,
    Int,
    Bool,
    Any,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_status_for(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Get {
            job,
            lens,
            value_type,
        } => {
            let manifest = load(&cli).await?;
            let resolved = manifest.job_named(job)?;
            debug!("Reading '{}' from '{}'", lens, resolved.name());
            println!("{}", lookup(resolved.properties(), lens, *value_type)?);
        }
        Commands::Jobs => {
            let manifest = load(&cli).await?;
            print_jobs(&manifest);
        }
        Commands::Raw => print!("{}", raw(&cli).await?),
    }
    Ok(())
}

fn source_for(cli: &Cli) -> Result<Box<dyn ManifestSource>> {
    match (&cli.file, &cli.product) {
        (Some(path), _) => Ok(Box::new(FileSource::new(path))),
        (None, Some(product)) => {
            let api = OpsManagerAPI::from_env().context("Ops Manager is not configured")?;
            Ok(Box::new(OpsManagerSource::new(api, product.as_str())))
        }
        (None, None) => anyhow::bail!("either --file or --product is required"),
    }
}

async fn load(cli: &Cli) -> Result<Manifest> {
    let source = source_for(cli)?;
    let manifest = source
        .load()
        .await
        .with_context(|| format!("failed to load manifest from {}", source.describe()))?;
    Ok(manifest)
}

async fn raw(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let product = cli
        .product
        .as_deref()
        .context("either --file or --product is required")?;
    let api = OpsManagerAPI::from_env().context("Ops Manager is not configured")?;
    Ok(api.get_raw_staged_product_manifest(product).await?)
}

fn lookup(properties: &Properties, lens: &str, value_type: ValueType) -> Result<String> {
    let rendered = match value_type {
        ValueType::String => properties.find_string(lens)?.to_string(),
        ValueType::Int => properties.find_int(lens)?.to_string(),
        ValueType::Bool => properties.find_bool(lens)?.to_string(),
        ValueType::Any => properties.find(lens)?.to_string(),
    };
    Ok(rendered)
}

fn print_jobs(manifest: &Manifest) {
    if !manifest.jobs().is_empty() {
        println!("jobs:");
        for name in manifest.job_names() {
            println!("  {}", name);
        }
    }

    if !manifest.instance_groups().is_empty() {
        println!("instance_groups:");
        for group in manifest.instance_groups() {
            println!("  {} (instances: {})", group.name(), group.instances());
            for job in group.jobs() {
                println!("    {}", job.name());
            }
        }
    }
}

/// 1 for recoverable lookup failures, 2 for everything else
fn exit_status_for(err: &anyhow::Error) -> u8 {
    let manifest_error = err.downcast_ref::<ManifestError>().or_else(|| {
        match err.downcast_ref::<FetchError>() {
            Some(FetchError::Manifest(inner)) => Some(inner),
            _ => None,
        }
    });

    match manifest_error {
        Some(e) if !e.is_fatal() => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> Properties {
        Properties::from_yaml("port: 3306\ntls: {enabled: true}\nname: mysql\n").unwrap()
    }

    #[test]
    fn test_lookup_respects_type() {
        let props = properties();

        assert_eq!(lookup(&props, "port", ValueType::Int).unwrap(), "3306");
        assert_eq!(lookup(&props, "tls.enabled", ValueType::Bool).unwrap(), "true");
        assert_eq!(lookup(&props, "name", ValueType::Any).unwrap(), "mysql");
        assert!(lookup(&props, "port", ValueType::String).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let props = properties();

        let missing = lookup(&props, "tls.cert", ValueType::Any).unwrap_err();
        assert_eq!(exit_status_for(&missing), 1);

        let wrong_type = lookup(&props, "name", ValueType::Int).unwrap_err();
        assert_eq!(exit_status_for(&wrong_type), 1);

        let mismatch = lookup(&props, "port.number", ValueType::Any).unwrap_err();
        assert_eq!(exit_status_for(&mismatch), 2);

        let not_found: anyhow::Error = FetchError::from(ManifestError::JobNotFound {
            name: "redis".to_string(),
        })
        .into();
        assert_eq!(exit_status_for(&not_found), 2);
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["om-manifest", "jobs"]).is_err());
        assert!(
            Cli::try_parse_from(["om-manifest", "--file", "a.yml", "--product", "cf", "jobs"])
                .is_err()
        );

        let cli = Cli::try_parse_from([
            "om-manifest",
            "--file",
            "manifest.yml",
            "get",
            "--job",
            "mysql",
            "--lens",
            "port",
            "--type",
            "int",
        ])
        .unwrap();
        match cli.command {
            Commands::Get { value_type, .. } => assert_eq!(value_type, ValueType::Int),
            other => panic!("Expected Get, got {:?}", other),
        }
    }
}
