// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Diagnostics keyed by the expression that triggered them, and the textual
//! report rendered from them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{NodeId, Pos, Program};
use crate::schema::SchemaError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A field selector names a field of another record type.
    TypeMismatch,
    /// A field name literal is not a key of the record's field table.
    FieldNotFound,
    /// A descend argument does not select a struct-shaped field.
    NotAStructField,
    /// The record's field table could not be built.
    Schema(SchemaError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Offending location.
    pub pos: Pos,
    /// Declaration the offending location conflicts with.
    pub reference: Option<Pos>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, pos: Pos, reference: Option<Pos>) -> Self {
        Diagnostic {
            kind,
            pos,
            reference,
        }
    }

    pub fn message(&self, program: &Program) -> String {
        let at = program.display_pos(self.pos);
        let reference = match self.reference {
            Some(pos) => program.display_pos(pos).to_string(),
            None => "<unknown>".to_owned(),
        };
        match &self.kind {
            DiagnosticKind::TypeMismatch => format!("{at} type must same as {reference}"),
            DiagnosticKind::FieldNotFound => format!("{at} field not found in {reference}"),
            DiagnosticKind::NotAStructField => format!("{at} is not a struct field"),
            DiagnosticKind::Schema(SchemaError::DuplicateKey { key, .. }) => {
                format!("{at} duplicate key {key} (first declared at {reference})")
            }
            DiagnosticKind::Schema(err) => format!("{at} {err}"),
        }
    }
}

/// Append-only store of examined expressions and their diagnostics.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    checked: BTreeSet<NodeId>,
    errors: BTreeMap<NodeId, Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn mark_checked(&mut self, expr: NodeId) {
        self.checked.insert(expr);
    }

    pub fn push(&mut self, expr: NodeId, diagnostic: Diagnostic) {
        self.checked.insert(expr);
        self.errors.entry(expr).or_default().push(diagnostic);
    }

    pub fn is_checked(&self, expr: NodeId) -> bool {
        self.checked.contains(&expr)
    }

    pub fn at(&self, expr: NodeId) -> &[Diagnostic] {
        self.errors.get(&expr).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Total number of diagnostics.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every diagnostic, in report order.
    pub fn iter<'a>(&'a self, program: &Program) -> impl Iterator<Item = &'a Diagnostic> {
        self.sorted(program)
            .into_iter()
            .flat_map(move |expr| self.at(expr).iter())
    }

    // Examined expressions by source position; node identity breaks ties.
    fn sorted(&self, program: &Program) -> Vec<NodeId> {
        let mut exprs: Vec<NodeId> = self.checked.iter().copied().collect();
        exprs.sort_by_key(|expr| (program.pos(*expr), *expr));
        exprs
    }

    pub fn report(&self, program: &Program, verbose: bool) -> Report {
        let entries = self
            .sorted(program)
            .into_iter()
            .map(|expr| ReportEntry {
                expr,
                location: program.display_pos(program.pos(expr)).to_string(),
                messages: self.at(expr).iter().map(|d| d.message(program)).collect(),
            })
            .collect();
        Report { entries, verbose }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    pub expr: NodeId,
    pub location: String,
    pub messages: Vec<String>,
}

/// Rendered outcome of a run.
///
/// The plain form lists one line per diagnostic. The verbose form lists
/// every examined expression as `<pos> ok` or `<pos> has error:` followed
/// by its diagnostics, each indented by a tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub verbose: bool,
}

impl Report {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            if self.verbose {
                if entry.messages.is_empty() {
                    lines.push(format!("{} ok", entry.location));
                } else {
                    lines.push(format!("{} has error:", entry.location));
                }
                lines.extend(entry.messages.iter().map(|m| format!("\t{m}")));
            } else {
                lines.extend(entry.messages.iter().cloned());
            }
        }
        lines
    }

    pub fn diagnostic_count(&self) -> usize {
        self.entries.iter().map(|e| e.messages.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostic_count() == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
