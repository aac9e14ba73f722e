// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use log::warn;

use crate::diagnostics::DiagnosticKind;
use crate::model::{LitKind, Node, NodeId, TypeId};

use super::{ChainWalker, CheckError};

impl ChainWalker<'_> {
    /// Arguments of `call` passed for field-selection parameters: fixed
    /// parameters by index, plus every trailing argument when the callee's
    /// variadic parameter is `...FieldSelection`.
    pub(crate) fn field_selection_args(&self, call: NodeId) -> Vec<NodeId> {
        let program = self.program;
        let (args, spread) = match &program.node(call).node {
            Node::Call { args, spread, .. } => (args.as_slice(), *spread),
            _ => return Vec::new(),
        };
        let Some(sig) = program.callee_signature(call) else {
            return Vec::new();
        };
        let selection = self.roles.field_selection();

        let fixed = if sig.variadic {
            sig.params.len().saturating_sub(1)
        } else {
            sig.params.len()
        };
        let mut selected: Vec<NodeId> = sig
            .params
            .iter()
            .take(fixed)
            .zip(args.iter())
            .filter(|(param, _)| **param == selection)
            .map(|(_, arg)| *arg)
            .collect();

        let variadic_selection = sig.variadic
            && sig
                .params
                .last()
                .and_then(|last| program.types().slice_elem(*last))
                == Some(selection);
        if variadic_selection {
            let rest = args.get(fixed..).unwrap_or_default();
            match (spread, rest.last()) {
                // `f(xs...)`: look inside a spread slice literal.
                (true, Some(last)) => {
                    if let Node::CompositeLit { elts } = &program.node(*last).node {
                        selected.extend(elts.iter().copied());
                    }
                }
                _ => selected.extend(rest.iter().copied()),
            }
        }
        selected
    }

    /// Checks field references among `args` against `expected`.
    pub(crate) fn check_args(
        &mut self,
        expected: TypeId,
        args: &[NodeId],
    ) -> Result<(), CheckError> {
        let program = self.program;
        for &arg in args {
            match &program.node(arg).node {
                Node::CompositeLit { elts } => {
                    let is_map = program
                        .expr_type(arg)
                        .is_some_and(|ty| program.types().is_map(ty));
                    if is_map {
                        self.check_args(expected, elts)?;
                    }
                }
                Node::KeyValue { key, .. } => self.check_args(expected, &[*key])?,
                Node::BasicLit {
                    kind: LitKind::String,
                    raw,
                } => {
                    self.diagnostics.mark_checked(arg);
                    let table = match self.schemas.resolve(program.types(), expected) {
                        Ok(table) => table,
                        Err(err) => {
                            self.report_schema(arg, err);
                            continue;
                        }
                    };
                    let name = self.decode_literal(arg, raw)?;
                    if table.get(&name).is_none() {
                        let reference = self.decl_pos(expected);
                        self.report(
                            arg,
                            DiagnosticKind::FieldNotFound,
                            program.pos(arg),
                            reference,
                        );
                    }
                }
                Node::Call { fun, args: inner, .. } if self.is_field_offset(*fun) => {
                    self.diagnostics.mark_checked(arg);
                    let Some(selector) = inner.first().copied() else {
                        warn!(
                            "{}: field offset call without argument",
                            program.display_pos(program.pos(arg))
                        );
                        continue;
                    };
                    let Node::Selector { x, .. } = &program.node(selector).node else {
                        warn!(
                            "{}: field offset argument is not a selector",
                            program.display_pos(program.pos(selector))
                        );
                        continue;
                    };
                    let actual = program
                        .expr_type(*x)
                        .and_then(|ty| program.types().record_type(ty));
                    if actual != Some(expected) {
                        let reference = self.decl_pos(expected);
                        self.report(
                            arg,
                            DiagnosticKind::TypeMismatch,
                            program.pos(selector),
                            reference,
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolves the record a descend argument selects from `current`.
    /// Reports and returns `None` when the field is not struct shaped.
    pub(crate) fn check_struct_field(
        &mut self,
        field: NodeId,
        current: TypeId,
    ) -> Result<Option<TypeId>, CheckError> {
        let program = self.program;
        match &program.node(field).node {
            Node::Call { fun, args, .. } if self.is_field_offset(*fun) => {
                self.diagnostics.mark_checked(field);
                let Some(selector) = args.first().copied() else {
                    return Ok(None);
                };
                let Node::Selector { sel, .. } = &program.node(selector).node else {
                    warn!(
                        "{}: field offset argument is not a selector",
                        program.display_pos(program.pos(selector))
                    );
                    return Ok(None);
                };
                let record = program
                    .expr_type(selector)
                    .and_then(|ty| program.types().record_type(ty));
                if record.is_some() {
                    return Ok(record);
                }
                self.report(
                    field,
                    DiagnosticKind::NotAStructField,
                    program.pos(*sel),
                    None,
                );
            }
            Node::BasicLit {
                kind: LitKind::String,
                raw,
            } => {
                self.diagnostics.mark_checked(field);
                let table = match self.schemas.resolve(program.types(), current) {
                    Ok(table) => table,
                    Err(err) => {
                        self.report_schema(field, err);
                        return Ok(None);
                    }
                };
                let name = self.decode_literal(field, raw)?;
                if let Some(record) = table.get(&name).and_then(|f| f.record) {
                    return Ok(Some(record));
                }
                self.report(
                    field,
                    DiagnosticKind::NotAStructField,
                    program.pos(field),
                    None,
                );
            }
            _ => {}
        }
        Ok(None)
    }

    fn is_field_offset(&self, fun: NodeId) -> bool {
        self.program
            .ident_object(fun)
            .is_some_and(|obj| self.roles.is_field_offset(obj))
    }

    fn decode_literal(&self, lit: NodeId, raw: &str) -> Result<String, CheckError> {
        decode_string_literal(raw).ok_or_else(|| CheckError::UndecodableLiteral {
            pos: self
                .program
                .display_pos(self.program.pos(lit))
                .to_string(),
            raw: raw.to_owned(),
        })
    }
}

/// Text of a string literal: `"..."` with escapes, or a raw `` `...` ``.
pub fn decode_string_literal(raw: &str) -> Option<String> {
    if let Some(inner) = raw
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
    {
        // Carriage returns are discarded from raw literals.
        return Some(inner.replace('\r', ""));
    }
    serde_json::from_str::<String>(raw).ok()
}
