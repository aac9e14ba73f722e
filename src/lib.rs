// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod chain;
mod checker;
pub mod diagnostics;
pub mod frontend;
pub mod model;
pub mod registry;
pub mod schema;

pub use chain::{ChainContext, ChainWalker, CheckError, Environment};
pub use checker::{check, check_paths, walk, CheckOptions};
pub use diagnostics::{Diagnostic, DiagnosticKind, Report};
pub use frontend::{FrontendError, PackageDump, ProgramBuilder};
pub use model::Program;
pub use registry::{Manifest, Role, RoleTable};

#[cfg(test)]
mod tests;
