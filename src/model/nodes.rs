// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{ObjId, Pos, TypeId};

/// Stable identity of a syntax node for the lifetime of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Clone, Debug)]
pub enum Node {
    // Identifier use or definition. `def` marks declaration sites.
    Ident {
        name: String,
        obj: Option<ObjId>,
        def: bool,
    },

    // x.sel; `sel` is always an Ident node.
    Selector {
        x: NodeId,
        sel: NodeId,
    },

    Call {
        fun: NodeId,
        args: Vec<NodeId>,
        spread: bool,
    },

    CompositeLit {
        elts: Vec<NodeId>,
    },

    KeyValue {
        key: NodeId,
        value: NodeId,
    },

    // `raw` is the literal exactly as written, quotes included.
    BasicLit {
        kind: LitKind,
        raw: String,
    },

    Unary {
        op: String,
        x: NodeId,
    },

    Block {
        stmts: Vec<NodeId>,
    },

    Assign {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
        define: bool,
    },

    ValueDecl {
        names: Vec<NodeId>,
        values: Vec<NodeId>,
    },

    // Any other syntax; only its children matter to the checker.
    Other {
        label: String,
        children: Vec<NodeId>,
    },
}

impl Node {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Ident { .. } | Node::BasicLit { .. } => Vec::new(),
            Node::Selector { x, sel } => vec![*x, *sel],
            Node::Call { fun, args, .. } => {
                let mut children = Vec::with_capacity(args.len() + 1);
                children.push(*fun);
                children.extend(args.iter().copied());
                children
            }
            Node::CompositeLit { elts } => elts.clone(),
            Node::KeyValue { key, value } => vec![*key, *value],
            Node::Unary { x, .. } => vec![*x],
            Node::Block { stmts } => stmts.clone(),
            Node::Assign { lhs, rhs, .. } => lhs.iter().chain(rhs.iter()).copied().collect(),
            Node::ValueDecl { names, values } => {
                names.iter().chain(values.iter()).copied().collect()
            }
            Node::Other { children, .. } => children.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeData {
    pub node: Node,
    pub pos: Pos,
    pub ty: Option<TypeId>,
}
