// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::{ObjId, Pos};

/// Identity of a type. Two expressions have the same type exactly when their
/// `TypeId`s are equal; named types are interned by qualified name and
/// composite types by their components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub enum Type {
    Basic(Rc<str>),
    Named(NamedType),
    Pointer(TypeId),
    Slice(TypeId),
    Array(TypeId),
    Map(TypeId, TypeId),
    Struct(StructType),
    Signature(Signature),
    Interface,
}

#[derive(Clone, Debug)]
pub struct NamedType {
    pub name: Rc<str>,
    pub pos: Option<Pos>,
    pub underlying: Option<TypeId>,
    pub methods: Vec<ObjId>,
}

#[derive(Clone, Debug, Default)]
pub struct StructType {
    pub fields: Vec<StructField>,
}

#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
    pub tag: Option<String>,
    pub pos: Option<Pos>,
}

#[derive(Clone, Debug, Default)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub variadic: bool,
    pub results: Vec<TypeId>,
}

impl Signature {
    pub fn single_result(&self) -> Option<TypeId> {
        match self.results.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TypeKey {
    Basic(Rc<str>),
    Pointer(TypeId),
    Slice(TypeId),
    Array(TypeId),
    Map(TypeId, TypeId),
    Interface,
}

#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
    named: BTreeMap<Rc<str>, TypeId>,
    interned: HashMap<TypeKey, TypeId>,
}

impl TypeTable {
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    fn intern(&mut self, key: TypeKey, ty: Type) -> TypeId {
        if let Some(id) = self.interned.get(&key) {
            return *id;
        }
        let id = self.push(ty);
        self.interned.insert(key, id);
        id
    }

    pub fn named(&self, name: &str) -> Option<TypeId> {
        self.named.get(name).copied()
    }

    /// Declares a named type, or returns the existing one with that name.
    pub(crate) fn declare_named(&mut self, name: &str, pos: Option<Pos>) -> TypeId {
        if let Some(&id) = self.named.get(name) {
            if let Type::Named(named) = self.get_mut(id) {
                if named.pos.is_none() {
                    named.pos = pos;
                }
            }
            return id;
        }
        let name: Rc<str> = name.into();
        let id = self.push(Type::Named(NamedType {
            name: name.clone(),
            pos,
            underlying: None,
            methods: Vec::new(),
        }));
        self.named.insert(name, id);
        id
    }

    pub(crate) fn basic(&mut self, name: &str) -> TypeId {
        let name: Rc<str> = name.into();
        self.intern(TypeKey::Basic(name.clone()), Type::Basic(name))
    }

    pub(crate) fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKey::Pointer(elem), Type::Pointer(elem))
    }

    pub(crate) fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKey::Slice(elem), Type::Slice(elem))
    }

    pub(crate) fn array(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKey::Array(elem), Type::Array(elem))
    }

    pub(crate) fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeKey::Map(key, value), Type::Map(key, value))
    }

    pub(crate) fn interface(&mut self) -> TypeId {
        self.intern(TypeKey::Interface, Type::Interface)
    }

    pub(crate) fn structure(&mut self, st: StructType) -> TypeId {
        self.push(Type::Struct(st))
    }

    pub(crate) fn signature_type(&mut self, sig: Signature) -> TypeId {
        self.push(Type::Signature(sig))
    }

    /// Looks up an already interned pointer type without creating one.
    pub fn find_pointer(&self, elem: TypeId) -> Option<TypeId> {
        self.interned.get(&TypeKey::Pointer(elem)).copied()
    }

    /// Strips names down to the underlying type.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut current = id;
        // Named chains are short; the bound protects against malformed input.
        for _ in 0..16 {
            match self.get(current) {
                Type::Named(NamedType {
                    underlying: Some(next),
                    ..
                }) => current = *next,
                _ => break,
            }
        }
        current
    }

    pub fn struct_of(&self, id: TypeId) -> Option<&StructType> {
        match self.get(self.underlying(id)) {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn signature(&self, id: TypeId) -> Option<&Signature> {
        match self.get(self.underlying(id)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_map(&self, id: TypeId) -> bool {
        matches!(self.get(self.underlying(id)), Type::Map(..))
    }

    pub fn slice_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Slice(elem) => Some(*elem),
            _ => None,
        }
    }

    /// The named struct type a value of type `id` refers to, looking through
    /// pointers, slices and arrays (`*T`, `[]T`, `[]*T`, ...).
    pub fn record_type(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Pointer(elem) | Type::Slice(elem) | Type::Array(elem) => {
                self.record_type(*elem)
            }
            Type::Named(_) if self.struct_of(id).is_some() => Some(id),
            _ => None,
        }
    }

    /// Named type that owns the methods of `id` (`T` for both `T` and `*T`).
    pub fn method_owner(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Named(_) => Some(id),
            Type::Pointer(elem) if matches!(self.get(*elem), Type::Named(_)) => Some(*elem),
            _ => None,
        }
    }

    pub fn named_info(&self, id: TypeId) -> Option<&NamedType> {
        match self.get(id) {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Renders a type the way the type-expression parser reads it.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Basic(name) => name.to_string(),
            Type::Named(named) => named.name.to_string(),
            Type::Pointer(elem) => format!("*{}", self.display(*elem)),
            Type::Slice(elem) => format!("[]{}", self.display(*elem)),
            Type::Array(elem) => format!("[_]{}", self.display(*elem)),
            Type::Map(k, v) => format!("map[{}]{}", self.display(*k), self.display(*v)),
            Type::Struct(_) => "struct{...}".to_owned(),
            Type::Signature(sig) => {
                let params: Vec<String> = sig.params.iter().map(|p| self.display(*p)).collect();
                let results: Vec<String> =
                    sig.results.iter().map(|r| self.display(*r)).collect();
                format!("func({}) ({})", params.join(", "), results.join(", "))
            }
            Type::Interface => "interface{}".to_owned(),
        }
    }
}
