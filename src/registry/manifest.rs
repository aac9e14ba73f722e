// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use lazy_static::lazy_static;
use serde::Deserialize;

use crate::schema::TagConfig;

use super::{RegistryError, Role};

const BUNDLED_MANIFEST_JSON: &str = include_str!("./toyorm.json");

/// Declarative description of a builder library's chain surface.
///
/// Only methods with a special role are listed; every method of a
/// `chain_sources` type that returns the builder type is a Preserve method.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub library: String,
    /// Type every chain method returns, e.g. `*toyorm.ToyBrick`.
    pub builder: String,
    /// Parameter type marking field-reference arguments.
    pub field_selection: String,
    /// Symbol of the builtin that names a struct field, e.g. `unsafe.Offsetof`.
    pub field_offset: String,
    #[serde(default)]
    pub tag: TagConfig,
    #[serde(default)]
    pub chain_sources: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodRole>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MethodRole {
    pub receiver: String,
    pub name: String,
    pub role: Role,
}

lazy_static! {
    static ref BUNDLED: Manifest = Manifest::from_json(BUNDLED_MANIFEST_JSON)
        .expect("failed to load bundled role manifest");
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        if !manifest.methods.iter().any(|m| m.role == Role::Entry) {
            return Err(RegistryError::NoEntry);
        }
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Manifest for the toyorm builder API.
    pub fn bundled() -> &'static Manifest {
        &BUNDLED
    }
}
