// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Method role registry.
//!
//! Roles are data: a [`Manifest`] names the builder type, the handful of
//! methods with a special role and the types whose builder-returning methods
//! keep a chain going. [`RoleTable::discover`] checks the manifest against
//! the library surface present in the program and resolves every role to a
//! method symbol, so calls reached through aliases or wrapper variables are
//! classified by identity rather than by name. A registry that fails to
//! bootstrap is never used partially.

mod manifest;

use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{ObjId, ObjectKind, Program, Signature, TypeId, TypeTable};
use crate::schema::TagConfig;

pub use manifest::{Manifest, MethodRole};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Opens a chain on the record type of its argument.
    Entry,
    /// Keeps the chain's context; field arguments refer to the top record.
    Preserve,
    /// Pushes the record type of the selected field.
    Descend,
    /// Pops back to the enclosing record type.
    Ascend,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid role manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("failed to read role manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("role manifest declares no entry method")]
    NoEntry,
    #[error("{what} type `{expr}` is not declared by the library surface")]
    UnknownType { what: &'static str, expr: String },
    #[error("method `({receiver}).{name}` is not declared by the library surface")]
    MissingMethod { receiver: String, name: String },
    #[error("method `{method}` has an unexpected signature: {expected}")]
    BadSignature {
        method: String,
        expected: &'static str,
    },
    #[error("field offset builtin `{0}` is not declared")]
    MissingFieldOffset(String),
}

/// Resolved roles for one program.
#[derive(Clone, Debug)]
pub struct RoleTable {
    roles: BTreeMap<ObjId, Role>,
    builder: TypeId,
    field_selection: TypeId,
    field_offset: ObjId,
    tag: TagConfig,
}

impl RoleTable {
    pub fn discover(program: &Program, manifest: &Manifest) -> Result<Self, RegistryError> {
        let types = program.types();
        let builder = find_type(types, &manifest.builder).ok_or_else(|| {
            RegistryError::UnknownType {
                what: "builder",
                expr: manifest.builder.clone(),
            }
        })?;
        let field_selection = find_type(types, &manifest.field_selection).ok_or_else(|| {
            RegistryError::UnknownType {
                what: "field selection",
                expr: manifest.field_selection.clone(),
            }
        })?;
        let field_offset = program
            .lookup_object(&manifest.field_offset)
            .filter(|id| {
                matches!(
                    program.object(*id).kind,
                    ObjectKind::Builtin | ObjectKind::Func
                )
            })
            .ok_or_else(|| RegistryError::MissingFieldOffset(manifest.field_offset.clone()))?;

        let mut roles = BTreeMap::new();

        for source in &manifest.chain_sources {
            let (base, by_pointer) = match source.trim().strip_prefix('*') {
                Some(base) => (base, true),
                None => (source.trim(), false),
            };
            let Some(info) = types.named(base).and_then(|owner| {
                types.named_info(owner).map(|info| (owner, info))
            }) else {
                return Err(RegistryError::UnknownType {
                    what: "chain source",
                    expr: source.clone(),
                });
            };
            let (owner, info) = info;
            for method in &info.methods {
                let obj = program.object(*method);
                // `T` only has the methods declared on `T`; `*T` has both.
                if !by_pointer && obj.recv != Some(owner) {
                    continue;
                }
                if single_result(program, *method) == Some(builder) {
                    roles.insert(*method, Role::Preserve);
                }
            }
        }

        for entry in &manifest.methods {
            let method = find_method(program, &entry.receiver, &entry.name).ok_or_else(|| {
                RegistryError::MissingMethod {
                    receiver: entry.receiver.clone(),
                    name: entry.name.clone(),
                }
            })?;
            validate(program, method, entry.role, builder, field_selection)?;
            debug!(
                "{:?} role for `{}`",
                entry.role,
                program.object(method).key
            );
            roles.insert(method, entry.role);
        }

        debug!(
            "role registry for {}: {} methods",
            if manifest.library.is_empty() {
                "<unnamed library>"
            } else {
                manifest.library.as_str()
            },
            roles.len()
        );

        Ok(RoleTable {
            roles,
            builder,
            field_selection,
            field_offset,
            tag: manifest.tag.clone(),
        })
    }

    pub fn role_of(&self, method: ObjId) -> Option<Role> {
        self.roles.get(&method).copied()
    }

    pub fn builder(&self) -> TypeId {
        self.builder
    }

    pub fn field_selection(&self) -> TypeId {
        self.field_selection
    }

    pub fn is_field_offset(&self, obj: ObjId) -> bool {
        self.field_offset == obj
    }

    pub fn tag(&self) -> &TagConfig {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjId, Role)> + '_ {
        self.roles.iter().map(|(id, role)| (*id, *role))
    }
}

fn validate(
    program: &Program,
    method: ObjId,
    role: Role,
    builder: TypeId,
    field_selection: TypeId,
) -> Result<(), RegistryError> {
    let bad = |expected| RegistryError::BadSignature {
        method: program.object(method).key.to_string(),
        expected,
    };
    let sig = program
        .object(method)
        .ty
        .and_then(|ty| program.types().signature(ty))
        .ok_or_else(|| bad("not a function"))?;
    if sig.single_result() != Some(builder) {
        return Err(bad("must return the builder type"));
    }
    match role {
        Role::Entry if sig.params.is_empty() => Err(bad("entry takes the record value")),
        Role::Descend if sig.params.first() != Some(&field_selection) => {
            Err(bad("descend takes a field selection first"))
        }
        Role::Ascend if !sig.params.is_empty() => Err(bad("ascend takes no arguments")),
        _ => Ok(()),
    }
}

fn single_result(program: &Program, method: ObjId) -> Option<TypeId> {
    program
        .object(method)
        .ty
        .and_then(|ty| program.types().signature(ty))
        .and_then(Signature::single_result)
}

/// Looks up `T` or `*T` without interning anything new.
fn find_type(types: &TypeTable, expr: &str) -> Option<TypeId> {
    let expr = expr.trim();
    match expr.strip_prefix('*') {
        Some(rest) => find_type(types, rest).and_then(|elem| types.find_pointer(elem)),
        None => types.named(expr),
    }
}

// Methods on `*T` may be declared with a value receiver.
fn find_method(program: &Program, receiver: &str, name: &str) -> Option<ObjId> {
    let receiver = receiver.trim();
    program
        .lookup_object(&format!("({receiver}).{name}"))
        .or_else(|| {
            receiver
                .strip_prefix('*')
                .and_then(|base| program.lookup_object(&format!("({base}).{name}")))
        })
}
