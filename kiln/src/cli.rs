// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_common::{init, OutputDestination, OutputFormat};

use kiln::{
    build::{BuildContext, Driver},
    config::Config,
    install::Installer,
    package::Packager,
    recipe::Recipe,
    registry::Registry,
    remove::Remover,
    revdep::{self, Revdep},
    search,
    source::{GitFetcher, HttpFetcher, Provisioner, Sha256Digester, TarExtractor},
};

#[derive(Debug, Parser)]
#[command(name = "kiln", about = "Source-based package manager for LFS-style systems")]
pub struct Command {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Debug, Parser)]
pub struct Global {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Subcommands {
    /// Build and install a recipe
    Build { recipe: PathBuf },
    /// Install a pre-built package archive
    Install { archive: PathBuf },
    /// Remove an installed package
    Remove { name: String },
    /// Show metadata for an installed package
    Info { name: String },
    /// Search the recipe tree
    Search { term: String },
    /// Scan for and optionally repair broken shared-library references
    Revdep {
        #[arg(long)]
        fix: bool,
    },
}

pub fn process() -> Result<ExitCode, Error> {
    let command = Command::parse();

    let level = match command.global.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    init(OutputFormat::Text, level, OutputDestination::Stderr);

    let config = Config::gather()?;

    match command.subcommand {
        Subcommands::Build { recipe } => build(&config, &recipe),
        Subcommands::Install { archive } => install(&config, &archive),
        Subcommands::Remove { name } => remove(&config, &name),
        Subcommands::Info { name } => info(&config, &name),
        Subcommands::Search { term } => search_cmd(&config, &term),
        Subcommands::Revdep { fix } => revdep_cmd(&config, fix),
    }
}

fn build(config: &Config, recipe_path: &PathBuf) -> Result<ExitCode, Error> {
    let recipe = Recipe::from_path(recipe_path).map_err(|source| Error::InvalidRecipe { source })?;

    let work_dir = config.tmproot.join("build").join(&recipe.name);
    let stage_root = config.tmproot.join("stage").join(&recipe.name);
    let log_file = config.tmproot.join("logs").join(format!("{}.log", recipe.name));
    fs_err::create_dir_all(log_file.parent().unwrap())?;
    fs_err::create_dir_all(&config.sources)?;

    let fetcher: Box<dyn kiln::source::Fetcher> = match recipe.vcs {
        kiln::recipe::Vcs::Http => Box::new(HttpFetcher),
        kiln::recipe::Vcs::Git => Box::new(GitFetcher),
    };
    let extractor = TarExtractor;
    let digester = Sha256Digester;

    let provisioner = Provisioner {
        sources_cache: &config.sources,
        work_dir: &work_dir,
        fetcher: fetcher.as_ref(),
        extractor: &extractor,
        digester: &digester,
    };

    let source_top = provisioner.provision(&recipe).map_err(|source| Error::Source { source })?;

    let ctx = BuildContext {
        source_top,
        stage_root: stage_root.clone(),
        log_file,
    };

    let driver = Driver { config };
    driver.run(&recipe, &ctx).map_err(|source| Error::Build { source })?;

    let packager = Packager {
        pkgout: &config.pkgout,
        codec: config.pkgcomp,
    };
    let archive = packager
        .package(&stage_root, &recipe.name, &recipe.version)
        .map_err(|source| Error::Package { source })?;

    let registry = Registry::open(&config.registro)?;
    let installer = Installer {
        registry: &registry,
        root: &PathBuf::from("/"),
        jobs: config.jobs,
        strip: config.strip,
    };
    installer
        .install(&archive, &recipe.name, &recipe.version, recipe_path, recipe.toolchain)
        .map_err(|source| Error::Install { source })?;

    println!("built and installed {} {}", recipe.name, recipe.version);
    Ok(ExitCode::SUCCESS)
}

fn install(config: &Config, archive: &PathBuf) -> Result<ExitCode, Error> {
    let registry = Registry::open(&config.registro)?;
    let installer = Installer {
        registry: &registry,
        root: &PathBuf::from("/"),
        jobs: config.jobs,
        strip: config.strip,
    };

    let (name, version) = parse_archive_name(archive).ok_or_else(|| Error::UnsupportedArchive)?;
    installer
        .install(archive, &name, &version, archive, false)
        .map_err(|source| Error::Install { source })?;

    println!("installed {name} {version}");
    Ok(ExitCode::SUCCESS)
}

fn remove(config: &Config, name: &str) -> Result<ExitCode, Error> {
    let registry = Registry::open(&config.registro)?;
    let remover = Remover {
        registry: &registry,
        root: &PathBuf::from("/"),
    };

    match remover.remove(name) {
        Ok(event) => {
            println!("removed {}", event.name);
            Ok(ExitCode::SUCCESS)
        }
        Err(kiln::remove::Error::UnknownPackage(name)) => {
            eprintln!("unknown package: {name}");
            Ok(ExitCode::from(7))
        }
        Err(source) => Err(Error::Remove { source }),
    }
}

fn info(config: &Config, name: &str) -> Result<ExitCode, Error> {
    let registry = Registry::open(&config.registro)?;
    match search::info(&registry, name) {
        Ok(metadata) => {
            println!("name: {}", metadata.name);
            println!("version: {}", metadata.version);
            println!("recipe: {}", metadata.recipe_path);
            println!("built: {}", metadata.built_at);
            Ok(ExitCode::SUCCESS)
        }
        Err(search::Error::UnknownPackage(name)) => {
            eprintln!("unknown package: {name}");
            Ok(ExitCode::from(8))
        }
    }
}

fn search_cmd(config: &Config, term: &str) -> Result<ExitCode, Error> {
    let hits = search::search(&config.repo, term);
    for hit in hits {
        println!("{} {} ({})", hit.name, hit.version, hit.path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn revdep_cmd(config: &Config, fix: bool) -> Result<ExitCode, Error> {
    let registry = Registry::open(&config.registro)?;
    let revdep = Revdep {
        root: &PathBuf::from("/"),
        extra_lib_dirs: &[],
    };

    let missing = revdep.check();
    revdep::log_summary(&missing);

    if !fix || missing.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let owners = revdep.owners(&missing, &registry)?;
    for (soname, owner) in owners {
        match search::find_by_stem(&config.repo, &owner) {
            Some(recipe_path) => {
                println!("rebuilding {owner} to restore {soname}");
                build(config, &recipe_path)?;
            }
            None => eprintln!("cannot locate recipe for {owner} to restore {soname}"),
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_archive_name(archive: &std::path::Path) -> Option<(String, String)> {
    let stem = archive.file_name()?.to_str()?;
    let stem = stem
        .strip_suffix(".tar.xz")
        .or_else(|| stem.strip_suffix(".tar.gz"))
        .or_else(|| stem.strip_suffix(".tar.bz2"))?;
    let (name, version) = stem.rsplit_once('-')?;
    Some((name.to_string(), version.to_string()))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("configuration error")]
    Config(#[from] kiln::config::Error),
    #[error("invalid recipe")]
    InvalidRecipe { source: kiln::recipe::Error },
    #[error("source provisioning failed")]
    Source { source: kiln::source::Error },
    #[error("build failed")]
    Build { source: kiln::build::Error },
    #[error("packaging failed")]
    Package { source: kiln::package::Error },
    #[error("install failed")]
    Install { source: kiln::install::Error },
    #[error("remove failed")]
    Remove { source: kiln::remove::Error },
    #[error("registry error")]
    Registry(#[from] kiln::registry::Error),
    #[error("unsupported archive filename")]
    UnsupportedArchive,
}
