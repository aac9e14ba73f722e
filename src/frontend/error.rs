// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Failures while turning front-end output into a [`Program`](crate::model::Program).
/// All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },
    #[error("unsupported dump format for {0}")]
    UnsupportedFormat(String),
    #[error("invalid position `{0}`, expected `line:col` or `file:line:col`")]
    BadPosition(String),
    #[error("invalid type expression `{expr}`: {detail}")]
    BadTypeExpr { expr: String, detail: String },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("type `{0}` is declared twice with different definitions")]
    ConflictingType(String),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("object `{0}` is declared twice")]
    DuplicateObject(String),
    #[error("method receiver `{0}` is not a named type")]
    BadReceiver(String),
    #[error("`...` is only allowed on the last parameter of `{0}`")]
    MisplacedVariadic(String),
}
