// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::model::{
    LitKind, Node, NodeData, NodeId, ObjId, Object, ObjectKind, Pos, Program, Signature,
    SourceFile, StructField, StructType, Type, TypeId,
};

use super::{type_expr, FrontendError};

/// Incrementally assembles a [`Program`].
///
/// Expression types are derived from their parts whenever the caller does
/// not supply one: identifiers take their symbol's type, calls take the
/// single result of their callee, field selectors take the field's type and
/// `&x` takes a pointer to the type of `x`. [`ProgramBuilder::set_type`]
/// overrides any derived type.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    file_ids: BTreeMap<String, u32>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Program {
        self.program
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Registers a source file, returning the id of an existing one with the
    /// same name.
    pub fn file(&mut self, name: &str) -> u32 {
        if let Some(id) = self.file_ids.get(name) {
            return *id;
        }
        let id = self.program.files.len() as u32;
        self.program.files.push(SourceFile {
            name: name.into(),
            decls: Vec::new(),
        });
        self.file_ids.insert(name.to_owned(), id);
        id
    }

    pub fn push_decl(&mut self, file: u32, decl: NodeId) {
        if let Some(source) = self.program.files.get_mut(file as usize) {
            source.decls.push(decl);
        }
    }

    // Types

    pub fn declare_type(&mut self, name: &str, pos: Option<Pos>) -> TypeId {
        self.program.types.declare_named(name, pos)
    }

    pub fn basic(&mut self, name: &str) -> TypeId {
        self.program.types.basic(name)
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.program.types.pointer(elem)
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.program.types.slice(elem)
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.program.types.map(key, value)
    }

    pub fn interface(&mut self) -> TypeId {
        self.program.types.interface()
    }

    pub fn parse_type(&mut self, expr: &str) -> Result<TypeId, FrontendError> {
        type_expr::parse(&mut self.program.types, expr)
    }

    /// Gives the named type `named` a struct underlying type.
    pub fn define_struct(
        &mut self,
        named: TypeId,
        fields: Vec<StructField>,
    ) -> Result<(), FrontendError> {
        let st = self.program.types.structure(StructType { fields });
        self.set_underlying(named, st)
    }

    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> Result<(), FrontendError> {
        let display = self.program.types.display(named);
        match self.program.types.get_mut(named) {
            Type::Named(info) if info.underlying.is_some() => {
                Err(FrontendError::ConflictingType(display))
            }
            Type::Named(info) => {
                info.underlying = Some(underlying);
                Ok(())
            }
            _ => Err(FrontendError::BadReceiver(display)),
        }
    }

    pub fn signature(&mut self, params: Vec<TypeId>, variadic: bool, results: Vec<TypeId>) -> TypeId {
        self.program.types.signature_type(Signature {
            params,
            variadic,
            results,
        })
    }

    // Symbols

    pub fn object(
        &mut self,
        key: &str,
        name: &str,
        kind: ObjectKind,
        ty: Option<TypeId>,
        pos: Option<Pos>,
    ) -> Result<ObjId, FrontendError> {
        if self.program.object_keys.contains_key(key) {
            return Err(FrontendError::DuplicateObject(key.to_owned()));
        }
        let id = ObjId(self.program.objects.len() as u32);
        let key: Rc<str> = key.into();
        self.program.objects.push(Object {
            key: key.clone(),
            name: name.to_owned(),
            kind,
            ty,
            recv: None,
            pos,
        });
        self.program.object_keys.insert(key, id);
        Ok(id)
    }

    /// Declares a method on `recv` (`T` or `*T`) and attaches it to the
    /// method set of the underlying named type. The method's key is
    /// `(recv).name`.
    pub fn method(&mut self, recv: TypeId, name: &str, sig: TypeId) -> Result<ObjId, FrontendError> {
        let owner = self
            .program
            .types
            .method_owner(recv)
            .ok_or_else(|| FrontendError::BadReceiver(self.program.types.display(recv)))?;
        let key = format!("({}).{}", self.program.types.display(recv), name);
        let id = self.object(&key, name, ObjectKind::Method, Some(sig), None)?;
        self.program.objects[id.index()].recv = Some(recv);
        if let Type::Named(info) = self.program.types.get_mut(owner) {
            info.methods.push(id);
        }
        Ok(id)
    }

    pub fn lookup_object(&self, key: &str) -> Option<ObjId> {
        self.program.lookup_object(key)
    }

    // Syntax

    fn push(&mut self, node: Node, pos: Pos, ty: Option<TypeId>) -> NodeId {
        let id = NodeId(self.program.nodes.len() as u32);
        self.program.nodes.push(NodeData { node, pos, ty });
        id
    }

    pub fn set_type(&mut self, node: NodeId, ty: TypeId) {
        self.program.nodes[node.index()].ty = Some(ty);
    }

    pub fn ident(&mut self, name: &str, obj: Option<ObjId>, pos: Pos) -> NodeId {
        self.ident_node(name, obj, false, pos)
    }

    /// Identifier at a declaration site (`x := ...`, `var x = ...`).
    pub fn def_ident(&mut self, name: &str, obj: Option<ObjId>, pos: Pos) -> NodeId {
        self.ident_node(name, obj, true, pos)
    }

    fn ident_node(&mut self, name: &str, obj: Option<ObjId>, def: bool, pos: Pos) -> NodeId {
        let ty = obj.and_then(|o| self.program.objects[o.index()].ty);
        self.push(
            Node::Ident {
                name: name.to_owned(),
                obj,
                def,
            },
            pos,
            ty,
        )
    }

    /// `x.sel` where `sel` is an identifier node.
    pub fn selector(&mut self, x: NodeId, sel: NodeId) -> NodeId {
        let ty = self
            .program
            .expr_type(sel)
            .or_else(|| self.field_selection_type(x, sel));
        let pos = self.program.pos(x);
        self.push(Node::Selector { x, sel }, pos, ty)
    }

    fn field_selection_type(&self, x: NodeId, sel: NodeId) -> Option<TypeId> {
        let name = match &self.program.node(sel).node {
            Node::Ident { name, .. } => name.as_str(),
            _ => return None,
        };
        let types = &self.program.types;
        let mut base = self.program.expr_type(x)?;
        if let Type::Pointer(elem) = types.get(base) {
            base = *elem;
        }
        self.find_field(base, name, 0)
    }

    // Depth-first search through embedded members, matching promotion order.
    fn find_field(&self, ty: TypeId, name: &str, depth: usize) -> Option<TypeId> {
        if depth > 8 {
            return None;
        }
        let st = self.program.types.struct_of(ty)?;
        if let Some(field) = st.fields.iter().find(|f| f.name == name) {
            return Some(field.ty);
        }
        st.fields
            .iter()
            .filter(|f| f.embedded)
            .find_map(|f| self.find_field(f.ty, name, depth + 1))
    }

    pub fn call(&mut self, fun: NodeId, args: Vec<NodeId>) -> NodeId {
        self.call_node(fun, args, false)
    }

    /// Call whose last argument is spread with `...`.
    pub fn call_spread(&mut self, fun: NodeId, args: Vec<NodeId>) -> NodeId {
        self.call_node(fun, args, true)
    }

    fn call_node(&mut self, fun: NodeId, args: Vec<NodeId>, spread: bool) -> NodeId {
        let ty = self
            .program
            .expr_type(fun)
            .and_then(|t| self.program.types.signature(t))
            .and_then(Signature::single_result);
        let pos = self.program.pos(fun);
        self.push(Node::Call { fun, args, spread }, pos, ty)
    }

    pub fn composite(&mut self, ty: Option<TypeId>, elts: Vec<NodeId>, pos: Pos) -> NodeId {
        self.push(Node::CompositeLit { elts }, pos, ty)
    }

    pub fn key_value(&mut self, key: NodeId, value: NodeId) -> NodeId {
        let pos = self.program.pos(key);
        self.push(Node::KeyValue { key, value }, pos, None)
    }

    pub fn lit(&mut self, kind: LitKind, raw: &str, pos: Pos) -> NodeId {
        let ty = match kind {
            LitKind::String => Some(self.basic("string")),
            LitKind::Int => Some(self.basic("int")),
            LitKind::Float => Some(self.basic("float64")),
            LitKind::Char => Some(self.basic("rune")),
            LitKind::Imag => Some(self.basic("complex128")),
        };
        self.push(
            Node::BasicLit {
                kind,
                raw: raw.to_owned(),
            },
            pos,
            ty,
        )
    }

    /// Interpreted string literal holding `text`.
    pub fn string_lit(&mut self, text: &str, pos: Pos) -> NodeId {
        let raw = serde_json::Value::String(text.to_owned()).to_string();
        self.lit(LitKind::String, &raw, pos)
    }

    pub fn unary(&mut self, op: &str, x: NodeId, pos: Pos) -> NodeId {
        let ty = self.program.expr_type(x).and_then(|t| match op {
            "&" => Some(self.program.types.pointer(t)),
            "*" => match self.program.types.get(t) {
                Type::Pointer(elem) => Some(*elem),
                _ => None,
            },
            _ => Some(t),
        });
        self.push(
            Node::Unary {
                op: op.to_owned(),
                x,
            },
            pos,
            ty,
        )
    }

    pub fn block(&mut self, stmts: Vec<NodeId>, pos: Pos) -> NodeId {
        self.push(Node::Block { stmts }, pos, None)
    }

    pub fn assign(&mut self, lhs: Vec<NodeId>, rhs: Vec<NodeId>, define: bool) -> NodeId {
        let pos = self.first_pos(&lhs, &rhs);
        self.push(Node::Assign { lhs, rhs, define }, pos, None)
    }

    pub fn value_decl(&mut self, names: Vec<NodeId>, values: Vec<NodeId>) -> NodeId {
        let pos = self.first_pos(&names, &values);
        self.push(Node::ValueDecl { names, values }, pos, None)
    }

    pub fn other(&mut self, label: &str, children: Vec<NodeId>, pos: Pos) -> NodeId {
        self.push(
            Node::Other {
                label: label.to_owned(),
                children,
            },
            pos,
            None,
        )
    }

    fn first_pos(&self, first: &[NodeId], second: &[NodeId]) -> Pos {
        first
            .iter()
            .chain(second.iter())
            .next()
            .map(|id| self.program.pos(*id))
            .unwrap_or_default()
    }
}
