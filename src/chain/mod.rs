// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Chain context engine.
//!
//! [`ChainWalker`] walks a program in pre-order and tracks, for every
//! builder-typed value, the stack of record types its chain currently
//! points at. Calls are resolved through their receiver: either another
//! call, resolved recursively, or a variable whose context is looked up in
//! the [`Environment`]. The role of the called method then decides the
//! resulting context, and field arguments are checked against the record on
//! top of the stack.
//!
//! Resolved calls are memoized by node identity, so a chain that is reached
//! again through another binding yields the same context and reports its
//! diagnostics once.

mod args;
mod bindings;
mod context;

use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::model::{Node, NodeId, Pos, Program, TypeId};
use crate::registry::{Role, RoleTable};
use crate::schema::{SchemaCache, SchemaError};

pub use args::decode_string_literal;
pub use context::{ChainContext, Environment, RecordStack};

/// Malformed input the walk cannot continue past.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    #[error("{pos}: entry call needs a struct value argument ({detail})")]
    BadEntry { pos: String, detail: String },
    #[error("{pos}: cannot decode string literal {raw}")]
    UndecodableLiteral { pos: String, raw: String },
}

pub struct ChainWalker<'a> {
    program: &'a Program,
    roles: &'a RoleTable,
    schemas: SchemaCache,
    memo: BTreeMap<NodeId, ChainContext>,
    diagnostics: Diagnostics,
}

impl<'a> ChainWalker<'a> {
    pub fn new(program: &'a Program, roles: &'a RoleTable) -> Self {
        ChainWalker {
            program,
            roles,
            schemas: SchemaCache::new(roles.tag().clone()),
            memo: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Context a call resolved to, if it has been resolved.
    pub fn memoized(&self, call: NodeId) -> Option<&ChainContext> {
        self.memo.get(&call)
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Visits `node` and its subtree, returning the environment that holds
    /// after it. Blocks get a child scope; what is bound inside a block is
    /// not visible after it.
    pub fn visit(&mut self, node: NodeId, env: Environment) -> Result<Environment, CheckError> {
        let program = self.program;
        match &program.node(node).node {
            Node::Block { stmts } => {
                let mut inner = env.child();
                for stmt in stmts {
                    inner = self.visit(*stmt, inner)?;
                }
                Ok(env)
            }
            Node::Assign { lhs, rhs, .. } => {
                let env = self.bind_all(lhs, rhs, env)?;
                self.visit_children(node, env)
            }
            Node::ValueDecl { names, values } => {
                let env = self.bind_all(names, values, env)?;
                self.visit_children(node, env)
            }
            Node::Call { .. } => {
                self.resolve_call(node, &env)?;
                self.visit_children(node, env)
            }
            Node::Ident { .. }
            | Node::Selector { .. }
            | Node::CompositeLit { .. }
            | Node::KeyValue { .. }
            | Node::BasicLit { .. }
            | Node::Unary { .. }
            | Node::Other { .. } => self.visit_children(node, env),
        }
    }

    fn visit_children(
        &mut self,
        node: NodeId,
        mut env: Environment,
    ) -> Result<Environment, CheckError> {
        for child in self.program.node(node).node.children() {
            env = self.visit(child, env)?;
        }
        Ok(env)
    }

    /// Resolves the context a method call leaves its chain in.
    ///
    /// Only calls of the form `recv.Method(...)` take part in chains; any
    /// other call resolves to [`ChainContext::Untracked`] and is not
    /// memoized.
    pub fn resolve_call(
        &mut self,
        call: NodeId,
        env: &Environment,
    ) -> Result<ChainContext, CheckError> {
        let program = self.program;
        let (fun, args) = match &program.node(call).node {
            Node::Call { fun, args, .. } => (*fun, args.as_slice()),
            _ => return Ok(ChainContext::Untracked),
        };
        let (recv, sel) = match &program.node(fun).node {
            Node::Selector { x, sel } => (*x, *sel),
            _ => return Ok(ChainContext::Untracked),
        };
        if let Some(ctx) = self.memo.get(&call) {
            return Ok(ctx.clone());
        }

        let receiver = match &program.node(recv).node {
            Node::Call { .. } => self.resolve_call(recv, env)?,
            _ => program
                .ident_object(recv)
                .and_then(|obj| env.lookup(obj))
                .cloned()
                .unwrap_or_default(),
        };

        let role = program
            .ident_object(sel)
            .and_then(|method| self.roles.role_of(method));

        let ctx = match (role, receiver.top()) {
            (Some(Role::Entry), _) => self.apply_entry(call, args)?,
            (Some(Role::Preserve), Some(top)) => {
                let selected = self.field_selection_args(call);
                self.check_args(top, &selected)?;
                receiver
            }
            (Some(Role::Descend), Some(top)) => {
                let selected = self.field_selection_args(call);
                self.check_args(top, &selected)?;
                let target = match args.first() {
                    Some(field) => self.check_struct_field(*field, top)?,
                    None => None,
                };
                match target {
                    Some(record) => receiver.descend(record),
                    None => ChainContext::Invalid,
                }
            }
            (Some(Role::Ascend), Some(_)) => receiver.ascend(),
            // Untracked and invalid chains, and calls outside the registry,
            // pass the receiver's context through.
            _ => receiver,
        };

        debug!(
            "{} resolves to {:?}",
            program.display_pos(program.pos(call)),
            ctx
        );
        self.memo.insert(call, ctx.clone());
        Ok(ctx)
    }

    fn apply_entry(&mut self, call: NodeId, args: &[NodeId]) -> Result<ChainContext, CheckError> {
        let program = self.program;
        let bad = |detail: String| CheckError::BadEntry {
            pos: program.display_pos(program.pos(call)).to_string(),
            detail,
        };
        let arg = *args.first().ok_or_else(|| bad("no argument".to_owned()))?;
        let ty = program
            .expr_type(arg)
            .ok_or_else(|| bad("argument has no type".to_owned()))?;
        let record = program
            .types()
            .record_type(ty)
            .ok_or_else(|| bad(format!("got {}", program.types().display(ty))))?;
        Ok(ChainContext::entry(record))
    }

    pub(crate) fn decl_pos(&self, record: TypeId) -> Option<Pos> {
        self.program
            .types()
            .named_info(record)
            .and_then(|named| named.pos)
    }

    pub(crate) fn report(
        &mut self,
        expr: NodeId,
        kind: DiagnosticKind,
        pos: Pos,
        reference: Option<Pos>,
    ) {
        debug!("{}: {:?}", self.program.display_pos(pos), kind);
        self.diagnostics
            .push(expr, Diagnostic::new(kind, pos, reference));
    }

    /// Records a schema failure once per expression; a descend by name
    /// consults the same table twice.
    pub(crate) fn report_schema(&mut self, expr: NodeId, err: SchemaError) {
        let pos = err.pos().unwrap_or_else(|| self.program.pos(expr));
        let reference = match &err {
            SchemaError::DuplicateKey { first, .. } => *first,
            SchemaError::NotAStruct(_) => None,
        };
        let diagnostic = Diagnostic::new(DiagnosticKind::Schema(err), pos, reference);
        if self.diagnostics.at(expr).contains(&diagnostic) {
            return;
        }
        debug!(
            "{}: {:?}",
            self.program.display_pos(pos),
            diagnostic.kind
        );
        self.diagnostics.push(expr, diagnostic);
    }
}
