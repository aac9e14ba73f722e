// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::chain::{ChainWalker, CheckError, Environment};
use crate::diagnostics::{Diagnostics, Report};
use crate::frontend;
use crate::model::Program;
use crate::registry::{Manifest, RoleTable};

/// Configuration for a check run.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Annotate every examined expression in the report.
    pub verbose: bool,
    /// Replaces the bundled role manifest.
    pub manifest: Option<Manifest>,
}

impl CheckOptions {
    pub fn manifest(&self) -> &Manifest {
        self.manifest.as_ref().unwrap_or_else(|| Manifest::bundled())
    }
}

/// Checks every builder chain in `program`.
pub fn check(program: &Program, options: &CheckOptions) -> Result<Report> {
    let roles = RoleTable::discover(program, options.manifest())
        .context("failed to bootstrap the method role registry")?;
    let diagnostics = walk(program, &roles)?;
    info!(
        "checked {} expressions in {} files, {} diagnostics",
        diagnostics.checked_count(),
        program.files().len(),
        diagnostics.len()
    );
    Ok(diagnostics.report(program, options.verbose))
}

/// Loads package dumps and checks them as one package.
pub fn check_paths<P: AsRef<Path>>(paths: &[P], options: &CheckOptions) -> Result<Report> {
    let program = frontend::load(paths).context("failed to load package dumps")?;
    check(&program, options)
}

/// Walks every file in load order, threading one package-level environment
/// through all of them.
pub fn walk(program: &Program, roles: &RoleTable) -> Result<Diagnostics, CheckError> {
    let mut walker = ChainWalker::new(program, roles);
    let mut env = Environment::new();
    for file in program.files() {
        for decl in &file.decls {
            env = walker.visit(*decl, env)?;
        }
    }
    Ok(walker.into_diagnostics())
}
