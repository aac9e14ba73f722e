// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reader for the textual type expressions used in package dumps and role
//! manifests: `*T`, `[]T`, `[N]T`, `map[K]V`, `interface{}`, predeclared
//! names and (optionally package qualified) named types.

use log::debug;

use crate::model::{TypeId, TypeTable};

use super::FrontendError;

const PREDECLARED: &[&str] = &[
    "bool",
    "byte",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

/// Parses `expr`, interning every composite type it mentions.
///
/// Unqualified names must already be declared. Package qualified names that
/// were never declared become opaque named types so that foreign types only
/// need declaring when their shape matters.
pub(crate) fn parse(table: &mut TypeTable, expr: &str) -> Result<TypeId, FrontendError> {
    let text = expr.trim();
    if text.is_empty() {
        return Err(bad(expr, "empty type"));
    }

    if let Some(rest) = text.strip_prefix('*') {
        let elem = parse(table, rest)?;
        return Ok(table.pointer(elem));
    }

    if let Some(rest) = text.strip_prefix("[]") {
        let elem = parse(table, rest)?;
        return Ok(table.slice(elem));
    }

    if let Some(rest) = text.strip_prefix("map[") {
        let close = matching_bracket(rest).ok_or_else(|| bad(expr, "unbalanced `[`"))?;
        let key = parse(table, &rest[..close])?;
        let value = parse(table, &rest[close + 1..])?;
        return Ok(table.map(key, value));
    }

    if let Some(rest) = text.strip_prefix('[') {
        let close = matching_bracket(rest).ok_or_else(|| bad(expr, "unbalanced `[`"))?;
        let len = rest[..close].trim();
        if len.is_empty() || !len.chars().all(|c| c.is_ascii_digit() || c == '_') {
            return Err(bad(expr, "array length must be a constant"));
        }
        let elem = parse(table, &rest[close + 1..])?;
        return Ok(table.array(elem));
    }

    if text == "interface{}" || text == "any" {
        return Ok(table.interface());
    }

    if PREDECLARED.contains(&text) {
        return Ok(table.basic(text));
    }

    if !is_qualified_ident(text) {
        return Err(bad(expr, "not a type name"));
    }

    if let Some(id) = table.named(text) {
        return Ok(id);
    }

    if text.contains('.') {
        debug!("declaring opaque foreign type `{text}`");
        return Ok(table.declare_named(text, None));
    }

    Err(FrontendError::UnknownType(text.to_owned()))
}

/// Splits a trailing `...T` variadic marker off a parameter type.
pub(crate) fn strip_variadic(expr: &str) -> (&str, bool) {
    match expr.trim().strip_prefix("...") {
        Some(rest) => (rest, true),
        None => (expr, false),
    }
}

fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_qualified_ident(text: &str) -> bool {
    text.split('.').all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {
                chars.all(|c| c.is_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

fn bad(expr: &str, detail: &str) -> FrontendError {
    FrontendError::BadTypeExpr {
        expr: expr.to_owned(),
        detail: detail.to_owned(),
    }
}
