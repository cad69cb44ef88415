//! # objmap-cli
//!
//! Command-line interface for objmap catalogs.
//!
//! Loads a catalog manifest, runs discovery passes over it, and prints the
//! configuration a mapping-plan compiler would receive.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use objmap_config::{CatalogManifest, ModuleSet, Profile, Registry};
use objmap_meta::{Capability, ModuleCatalog, TypeDescriptor, TypeKey};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "objmap")]
#[command(about = "objmap configuration inspector")]
#[command(version)]
struct Cli {
    /// Path to the catalog manifest (YAML or JSON)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Run a discovery pass and print the resulting profiles
    Scan {
        /// Module names, or type paths with --by-type
        #[arg(required = true)]
        targets: Vec<String>,

        /// Scan the modules defining the given types
        #[arg(long)]
        by_type: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },

    /// List catalog modules and their types
    Modules {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    profiles: &'a [Profile],
    mappers: Vec<&'a str>,
}

#[derive(Serialize)]
struct ModuleReport {
    name: String,
    dynamic: bool,
    types: Vec<TypeReport>,
}

#[derive(Serialize)]
struct TypeReport {
    key: TypeKey,
    public: bool,
    concrete: bool,
    profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_map: Option<TypeKey>,
    /// Why the type's metadata cannot be introspected; `scan` fails on it
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TypeReport {
    fn new(descriptor: &TypeDescriptor) -> Self {
        let (auto_map, error) = match descriptor.auto_map() {
            Ok(auto_map) => (auto_map.map(|auto_map| auto_map.source.clone()), None),
            Err(e) => {
                tracing::warn!("Cannot introspect {}: {}", descriptor.key(), e);
                (None, Some(e.to_string()))
            }
        };

        Self {
            key: descriptor.key().clone(),
            public: descriptor.is_public(),
            concrete: descriptor.is_concrete(),
            profile: descriptor.has_capability(Capability::Profile),
            auto_map,
            error,
        }
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Arc<ModuleCatalog>> {
    let manifest = CatalogManifest::from_path(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;
    Ok(Arc::new(manifest.into_catalog()?))
}

fn emit<T: Serialize>(value: &T, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn scan(
    catalog: Arc<ModuleCatalog>,
    targets: Vec<String>,
    by_type: bool,
    format: Format,
) -> anyhow::Result<()> {
    let set = if by_type {
        let keys = targets
            .iter()
            .map(|target| TypeKey::parse(target))
            .collect::<Result<Vec<_>, _>>()?;
        ModuleSet::types(keys)
    } else {
        ModuleSet::names(targets)
    };

    let mut registry = Registry::with_catalog(catalog);
    registry.add_maps(set)?;

    let report = ScanReport {
        profiles: registry.profiles(),
        mappers: registry.mappers().iter().map(|m| m.name()).collect(),
    };
    emit(&report, format)
}

fn modules(catalog: &ModuleCatalog, format: Format) -> anyhow::Result<()> {
    let mut report = Vec::new();
    for name in catalog.module_names() {
        let module = catalog.resolve(&name)?;
        let types = module
            .types()
            .iter()
            .map(|descriptor| TypeReport::new(descriptor))
            .collect();
        report.push(ModuleReport {
            name,
            dynamic: module.is_dynamic(),
            types,
        });
    }
    emit(&report, format)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = load_catalog(&cli.manifest)?;

    match cli.command {
        Commands::Scan {
            targets,
            by_type,
            format,
        } => {
            tracing::info!("Scanning {:?}", targets);
            scan(catalog, targets, by_type, format)
        }
        Commands::Modules { format } => modules(&catalog, format),
    }
}
