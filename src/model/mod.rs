// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Semantic model consumed by the chain checker.
//!
//! The model is what an external parser and resolver hand over: a forest of
//! syntax nodes with stable identities, resolved symbols and interned types.
//! Everything is arena allocated and addressed by small copyable ids so that
//! analysis passes can key side tables by node identity without ever
//! touching the tree itself.
//!
//! * `nodes.rs` holds the closed set of syntax node kinds.
//! * `types.rs` holds the type table with identity-comparable [`TypeId`]s.
//!
//! Models are produced by [`ProgramBuilder`](crate::frontend::ProgramBuilder).

mod nodes;
mod types;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use nodes::{LitKind, Node, NodeData, NodeId};
pub use types::{NamedType, Signature, StructField, StructType, Type, TypeId, TypeTable};

/// Source position of a node or declaration.
///
/// `file` indexes [`Program::files`]; ordering follows file load order first
/// and then line and column, which is the order diagnostics are reported in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub file: u32,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(file: u32, line: u32, col: u32) -> Self {
        Pos { file, line, col }
    }
}

/// Identity of a resolved symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Var,
    Const,
    Func,
    Method,
    Builtin,
    TypeName,
    Package,
    Field,
}

/// A resolved symbol. `key` is the package-wide identity the front end used
/// for it (for methods: `(T).Name` or `(*T).Name`).
#[derive(Clone, Debug)]
pub struct Object {
    pub key: Rc<str>,
    pub name: String,
    pub kind: ObjectKind,
    pub ty: Option<TypeId>,
    pub recv: Option<TypeId>,
    pub pos: Option<Pos>,
}

/// One source unit of the analysed package.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: Rc<str>,
    pub decls: Vec<NodeId>,
}

/// A fully resolved package: syntax forest, symbols and types.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub(crate) files: Vec<SourceFile>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) types: TypeTable,
    pub(crate) objects: Vec<Object>,
    pub(crate) object_keys: BTreeMap<Rc<str>, ObjId>,
}

impl Program {
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file_name(&self, file: u32) -> &str {
        self.files
            .get(file as usize)
            .map(|f| f.name.as_ref())
            .unwrap_or("<unknown>")
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn pos(&self, id: NodeId) -> Pos {
        self.node(id).pos
    }

    /// Static type the resolver recorded for an expression.
    pub fn expr_type(&self, id: NodeId) -> Option<TypeId> {
        self.node(id).ty
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        self.types.get(id)
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, obj)| (ObjId(idx as u32), obj))
    }

    pub fn lookup_object(&self, key: &str) -> Option<ObjId> {
        self.object_keys.get(key).copied()
    }

    /// Symbol an identifier, or the selected name of a selector, resolves to.
    pub fn ident_object(&self, id: NodeId) -> Option<ObjId> {
        match &self.node(id).node {
            Node::Ident { obj, .. } => *obj,
            Node::Selector { sel, .. } => self.ident_object(*sel),
            _ => None,
        }
    }

    /// Signature of the function or method a call targets.
    pub fn callee_signature(&self, call: NodeId) -> Option<&Signature> {
        match &self.node(call).node {
            Node::Call { fun, .. } => self
                .expr_type(*fun)
                .and_then(|ty| self.types.signature(ty)),
            _ => None,
        }
    }

    /// Renders a position as `file:line:col`.
    pub fn display_pos(&self, pos: Pos) -> DisplayPos<'_> {
        DisplayPos { program: self, pos }
    }
}

pub struct DisplayPos<'a> {
    program: &'a Program,
    pos: Pos,
}

impl fmt::Display for DisplayPos<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.program.file_name(self.pos.file),
            self.pos.line,
            self.pos.col
        )
    }
}
