// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Flattened field namespaces of record types.
//!
//! A [`FieldTable`] lists every field a record answers to by name, including
//! fields promoted from embedded structs, under the alias given in its
//! struct tag or else its declared name. Tables are built on first use and
//! kept for the whole run; a failed build is cached as well so every caller
//! that needs the table sees the same error.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Pos, StructType, TypeId, TypeTable};

// Embedding deeper than this is treated as malformed input.
const MAX_EMBED_DEPTH: usize = 32;

/// Which struct tag carries field attributes and which attribute renames a
/// field.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TagConfig {
    pub key: String,
    pub alias: String,
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            key: "toyorm".to_owned(),
            alias: "alias".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Name as declared in the struct.
    pub name: String,
    /// Name the field is looked up by: its alias if tagged, else `name`.
    pub key: String,
    pub ty: TypeId,
    /// Record type the field refers to when it is struct shaped (`T`, `*T`,
    /// `[]T`, `[]*T`).
    pub record: Option<TypeId>,
    pub pos: Option<Pos>,
}

impl FieldDescriptor {
    pub fn is_struct(&self) -> bool {
        self.record.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldTable {
    fields: Vec<FieldDescriptor>,
    index: BTreeMap<String, usize>,
}

impl FieldTable {
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index.get(key).map(|idx| &self.fields[*idx])
    }

    /// Fields in promotion order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn insert(&mut self, field: FieldDescriptor) -> Result<(), SchemaError> {
        if let Some(existing) = self.get(&field.key) {
            return Err(SchemaError::DuplicateKey {
                key: field.key,
                first: existing.pos,
                second: field.pos,
            });
        }
        self.index.insert(field.key.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate key {key}")]
    DuplicateKey {
        key: String,
        first: Option<Pos>,
        second: Option<Pos>,
    },
    #[error("type {0} is not a struct")]
    NotAStruct(String),
}

impl SchemaError {
    /// Position the error is reported at.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            SchemaError::DuplicateKey { second, .. } => *second,
            SchemaError::NotAStruct(_) => None,
        }
    }
}

/// Memo of field tables per record type.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tag: TagConfig,
    tables: BTreeMap<TypeId, Result<Rc<FieldTable>, SchemaError>>,
}

impl SchemaCache {
    pub fn new(tag: TagConfig) -> Self {
        SchemaCache {
            tag,
            tables: BTreeMap::new(),
        }
    }

    pub fn resolve(
        &mut self,
        types: &TypeTable,
        record: TypeId,
    ) -> Result<Rc<FieldTable>, SchemaError> {
        if let Some(cached) = self.tables.get(&record) {
            return cached.clone();
        }
        let built = match types.struct_of(record) {
            Some(st) => {
                let mut table = FieldTable::default();
                flatten(types, st, &self.tag, &mut table, 0).map(|_| Rc::new(table))
            }
            None => Err(SchemaError::NotAStruct(types.display(record))),
        };
        match &built {
            Ok(table) => debug!(
                "field table of {}: {} keys",
                types.display(record),
                table.len()
            ),
            Err(err) => debug!("field table of {} failed: {err}", types.display(record)),
        }
        self.tables.insert(record, built.clone());
        built
    }
}

fn flatten(
    types: &TypeTable,
    st: &StructType,
    tag: &TagConfig,
    table: &mut FieldTable,
    depth: usize,
) -> Result<(), SchemaError> {
    for field in &st.fields {
        if field.embedded {
            // Only embedded structs promote fields; `*Base` does not.
            if let Some(inner) = types.struct_of(field.ty) {
                if depth >= MAX_EMBED_DEPTH {
                    warn!("embedding of {} is too deep, skipping", field.name);
                    continue;
                }
                flatten(types, inner, tag, table, depth + 1)?;
            }
            continue;
        }
        let key = field
            .tag
            .as_deref()
            .and_then(|text| lookup_tag(text, &tag.key))
            .and_then(|value| attribute(&value, &tag.alias))
            .unwrap_or_else(|| field.name.clone());
        table.insert(FieldDescriptor {
            name: field.name.clone(),
            key,
            ty: field.ty,
            record: types.record_type(field.ty),
            pos: field.pos,
        })?;
    }
    Ok(())
}

/// Value stored under `key` in a conventional `k1:"v1" k2:"v2"` struct tag.
pub fn lookup_tag(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        if name_len == 0 || !rest[name_len..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];
        rest = &rest[name_len + 1..];

        // Find the closing quote, skipping escaped characters.
        let bytes = rest.as_bytes();
        let mut end = 1;
        while end < bytes.len() && bytes[end] != b'"' {
            if bytes[end] == b'\\' {
                end += 1;
            }
            end += 1;
        }
        if end >= bytes.len() {
            return None;
        }
        let quoted = &rest[..=end];
        rest = &rest[end + 1..];

        if name == key {
            return serde_json::from_str::<String>(quoted).ok();
        }
    }
}

/// Splits a tag value of the form `name:value;flag;name2:value2` into trimmed
/// attributes. Names are lower-cased.
pub fn attributes(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| match part.split_once(':') {
            Some((name, val)) => (name.trim().to_lowercase(), val.trim().to_owned()),
            None => (part.trim().to_lowercase(), String::new()),
        })
        .collect()
}

fn attribute(value: &str, name: &str) -> Option<String> {
    let name = name.to_lowercase();
    attributes(value)
        .into_iter()
        .find(|(attr, _)| *attr == name)
        .map(|(_, val)| val)
}
