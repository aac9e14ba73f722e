// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::model::{ObjId, TypeId};

/// Immutable stack of record types; pushing and popping share the tail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordStack {
    top: TypeId,
    below: Option<Rc<RecordStack>>,
    depth: usize,
}

impl RecordStack {
    pub fn new(root: TypeId) -> Self {
        RecordStack {
            top: root,
            below: None,
            depth: 1,
        }
    }

    pub fn top(&self) -> TypeId {
        self.top
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push(&self, record: TypeId) -> Self {
        RecordStack {
            top: record,
            below: Some(Rc::new(self.clone())),
            depth: self.depth + 1,
        }
    }

    /// The stack without its top, or `None` at the root.
    pub fn pop(&self) -> Option<Self> {
        self.below.as_deref().cloned()
    }

    /// Records from the root up to the top.
    pub fn records(&self) -> Vec<TypeId> {
        let mut records = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(stack) = current {
            records.push(stack.top);
            current = stack.below.as_deref();
        }
        records.reverse();
        records
    }
}

/// What a builder-typed value is known to point at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChainContext {
    /// No entry call has been seen on this path.
    #[default]
    Untracked,
    /// A descend failed; field checks are suppressed on this path.
    Invalid,
    Tracked(RecordStack),
}

impl ChainContext {
    pub fn entry(record: TypeId) -> Self {
        ChainContext::Tracked(RecordStack::new(record))
    }

    pub fn top(&self) -> Option<TypeId> {
        match self {
            ChainContext::Tracked(stack) => Some(stack.top()),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ChainContext::Tracked(stack) => stack.depth(),
            _ => 0,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ChainContext::Invalid)
    }

    pub fn records(&self) -> Vec<TypeId> {
        match self {
            ChainContext::Tracked(stack) => stack.records(),
            _ => Vec::new(),
        }
    }

    pub fn descend(&self, record: TypeId) -> Self {
        match self {
            ChainContext::Tracked(stack) => ChainContext::Tracked(stack.push(record)),
            other => other.clone(),
        }
    }

    /// Pops one level; the root record is never popped.
    pub fn ascend(&self) -> Self {
        match self {
            ChainContext::Tracked(stack) => match stack.pop() {
                Some(below) => ChainContext::Tracked(below),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Scope {
    bindings: BTreeMap<ObjId, ChainContext>,
    parent: Option<Rc<Scope>>,
}

/// Builder bindings visible at a program point.
///
/// Cloning is cheap and yields an independent environment. A child scope
/// reads through to its parent; its writes shadow the parent's bindings and
/// are dropped with the child.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    scope: Rc<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Environment {
            scope: Rc::new(Scope {
                bindings: BTreeMap::new(),
                parent: Some(self.scope.clone()),
            }),
        }
    }

    pub fn lookup(&self, obj: ObjId) -> Option<&ChainContext> {
        let mut scope = Some(self.scope.as_ref());
        while let Some(current) = scope {
            if let Some(ctx) = current.bindings.get(&obj) {
                return match ctx {
                    ChainContext::Untracked => None,
                    _ => Some(ctx),
                };
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Binds `obj` in this scope. Binding [`ChainContext::Untracked`] hides
    /// any outer binding of `obj`.
    pub fn bind(&mut self, obj: ObjId, ctx: ChainContext) {
        Rc::make_mut(&mut self.scope).bindings.insert(obj, ctx);
    }
}
