// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Front-end adapter.
//!
//! The checker never parses or resolves source text itself. An external
//! front end writes a *package dump* (JSON or YAML, see [`dump`]) with the
//! syntax forest, symbols and types it resolved; this module lowers one or
//! more dumps into a [`Program`]. Embedders that already hold a resolved
//! tree can skip the dump and drive [`ProgramBuilder`] directly.

mod builder;
pub mod dump;
mod error;
mod lower;
mod type_expr;

use std::path::Path;

pub use builder::ProgramBuilder;
pub use dump::PackageDump;
pub use error::FrontendError;
pub use lower::lower;

use crate::model::Program;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
}

impl DumpFormat {
    /// `.json` is JSON; anything else is read as YAML when YAML support is
    /// compiled in.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DumpFormat::Json),
            #[cfg(feature = "yaml")]
            _ => Some(DumpFormat::Yaml),
            #[cfg(not(feature = "yaml"))]
            _ => None,
        }
    }
}

pub fn parse_dump(
    text: &str,
    format: DumpFormat,
    origin: &str,
) -> Result<PackageDump, FrontendError> {
    let parsed = match format {
        DumpFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        #[cfg(feature = "yaml")]
        DumpFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| FrontendError::Parse {
        path: origin.to_owned(),
        detail,
    })
}

pub fn read_dump(path: &Path) -> Result<PackageDump, FrontendError> {
    let origin = path.display().to_string();
    let format = DumpFormat::from_path(path)
        .ok_or_else(|| FrontendError::UnsupportedFormat(origin.clone()))?;
    let text = std::fs::read_to_string(path).map_err(|source| FrontendError::Io {
        path: origin.clone(),
        source,
    })?;
    parse_dump(&text, format, &origin)
}

/// Reads every dump in `paths` and merges them into one program.
pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Program, FrontendError> {
    let dumps = paths
        .iter()
        .map(|path| read_dump(path.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    lower(&dumps)
}
