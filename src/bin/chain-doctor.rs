// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use walkdir::WalkDir;

use chain_doctor::{check_paths, CheckOptions, Manifest};

/// Checks that field references in builder chains match the record each
/// chain is pointed at.
#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A directory holding one package's dumps, or explicit dump files.
    #[arg(value_name = "dir|package.json|package.yaml")]
    paths: Vec<PathBuf>,

    /// Annotate every checked expression.
    #[arg(long, short)]
    verbose: bool,

    /// Role manifest replacing the bundled toyorm one.
    #[arg(long, value_name = "roles.json")]
    manifest: Option<PathBuf>,
}

fn is_dump(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

fn package_files(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    if let [dir] = paths.as_slice() {
        if dir.is_dir() {
            let files: Vec<PathBuf> = WalkDir::new(dir)
                .max_depth(1) // Do not recurse
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_dump(p))
                .collect();
            if files.is_empty() {
                bail!("no package dumps found in {}", dir.display());
            }
            return Ok(files);
        }
    }

    for path in &paths {
        if !path.is_file() {
            bail!("{} is not a file", path.display());
        }
    }
    Ok(paths)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let manifest = match &cli.manifest {
        Some(path) => Some(
            Manifest::from_path(path)
                .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        ),
        None => None,
    };
    let options = CheckOptions {
        verbose: cli.verbose,
        manifest,
    };

    let files = package_files(cli.paths)?;
    let report = check_paths(&files, &options)?;
    print!("{report}");
    Ok(())
}
