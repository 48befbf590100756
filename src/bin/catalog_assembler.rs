//! catalog-assembler CLI
//!
//! Usage:
//!   catalog-assembler generate-from --url <URL> --type <TYPE> <TARGET>
//!   catalog-assembler generate --config <FILE> --type <TYPE> <TARGET>

use anyhow::{Context, Result};
use catalog_assembler::{
    contract, fetch_from_externals_with, generate_filesystem, output, Catalog, ExternalSpec,
    FetchOptions, GithubClient, RepositorySpec,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog-assembler")]
#[command(about = "Generates a partial file-based catalog from external repository releases")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum parallel repository fetches
    #[arg(short, long, global = true)]
    jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a partial catalog from a single repository given as flags
    GenerateFrom {
        /// URL of the repository to pull
        #[arg(long)]
        url: String,

        /// Type of resource to pull
        #[arg(long = "type")]
        resource_type: String,

        /// Name of the repository to pull
        #[arg(long)]
        name: Option<String>,

        /// Comma-separated release tags to ignore while pulling
        #[arg(long, default_value = "")]
        ignore_versions: String,

        /// Contract file to pull from each release
        #[arg(long, default_value = contract::FILENAME)]
        catalog_name: String,

        /// Resource bundle to pull from each release
        #[arg(long, default_value = contract::RESOURCES_NAME)]
        resource_tarball_name: String,

        /// Folder to generate the catalog in
        target: PathBuf,
    },

    /// Generate a partial catalog from an externals config file
    Generate {
        /// YAML file listing the external repositories
        #[arg(long)]
        config: PathBuf,

        /// Type of resource to write out
        #[arg(long = "type")]
        resource_type: String,

        /// Folder to generate the catalog in
        target: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut options = FetchOptions::default();
    if let Some(jobs) = cli.jobs {
        options.concurrency = jobs.max(1);
    }

    match cli.command {
        Commands::GenerateFrom {
            url,
            resource_type,
            name,
            ignore_versions,
            catalog_name,
            resource_tarball_name,
            target,
        } => {
            let mut repo = RepositorySpec::new(url, resource_type.clone());
            if let Some(name) = name {
                repo.name = name;
            }
            repo.ignore_versions = catalog_assembler::external::parse_ignore_versions(&ignore_versions);
            repo.catalog_name = catalog_name;
            repo.resources_tarball_name = resource_tarball_name;

            let external = ExternalSpec {
                repositories: vec![repo],
            };
            run(&external, &resource_type, &target, &options)
        }

        Commands::Generate {
            config,
            resource_type,
            target,
        } => {
            let external = ExternalSpec::from_file(&config)
                .with_context(|| format!("cannot load externals config {}", config.display()))?;
            run(&external, &resource_type, &target, &options)
        }
    }
}

fn run(
    external: &ExternalSpec,
    resource_type: &str,
    target: &PathBuf,
    options: &FetchOptions,
) -> Result<()> {
    output::action(&format!(
        "Generating a partial catalog from {} repository(ies) (type: {})",
        external.repositories.len(),
        resource_type
    ));

    let client = GithubClient::new();
    let pb = output::spinner("fetching releases");
    let result = fetch_from_externals_with(external, &client, options);
    pb.finish_and_clear();
    let catalog = result.context("fetch failed")?;

    for (key, artifact) in catalog.iter() {
        output::detail(&format!("{} (from {})", key, artifact.source_repository));
    }
    if catalog.is_empty() {
        output::warning("no resources found; writing an empty catalog");
    }

    generate_filesystem(target, &catalog, resource_type)
        .with_context(|| format!("cannot generate catalog in {}", target.display()))?;

    output::success(&format!(
        "wrote {} resource(s) to {}",
        count_of_type(&catalog, resource_type),
        target.display()
    ));
    Ok(())
}

fn count_of_type(catalog: &Catalog, resource_type: &str) -> usize {
    catalog.of_type(resource_type).count()
}
