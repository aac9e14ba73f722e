// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Serde shapes of the package dump written by an external parser and
//! resolver. A dump may describe the analysed package, a library surface or
//! both; several dumps are merged into one program.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PackageDump {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub files: Vec<FileDump>,
    #[serde(default)]
    pub types: Vec<TypeDump>,
    #[serde(default)]
    pub objects: Vec<ObjectDump>,
}

#[derive(Debug, Deserialize)]
pub struct FileDump {
    pub name: String,
    #[serde(default)]
    pub decls: Vec<NodeDump>,
}

#[derive(Debug, Deserialize)]
pub struct TypeDump {
    pub name: String,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldDump>>,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDump>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDump {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MethodDump {
    pub name: String,
    /// Declared on `*T` rather than `T`.
    #[serde(default)]
    pub pointer: bool,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKindDump {
    Var,
    Const,
    Func,
    Builtin,
    Type,
    Package,
    Field,
}

#[derive(Debug, Deserialize)]
pub struct ObjectDump {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: ObjectKindDump,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    /// Signature parts for funcs and builtins.
    #[serde(default)]
    pub params: Option<Vec<String>>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentDump {
    pub name: String,
    #[serde(default)]
    pub obj: Option<String>,
    #[serde(default)]
    pub def: bool,
    pub at: String,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LitKindDump {
    #[default]
    String,
    Int,
    Float,
    Char,
    Imag,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDump {
    Ident(IdentDump),
    Selector {
        x: Box<NodeDump>,
        sel: IdentDump,
        #[serde(rename = "type", default)]
        ty: Option<String>,
    },
    Call {
        fun: Box<NodeDump>,
        #[serde(default)]
        args: Vec<NodeDump>,
        #[serde(default)]
        spread: bool,
        #[serde(rename = "type", default)]
        ty: Option<String>,
    },
    Composite {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        elts: Vec<NodeDump>,
        at: String,
    },
    KeyValue {
        key: Box<NodeDump>,
        value: Box<NodeDump>,
    },
    Lit {
        #[serde(default)]
        lit: LitKindDump,
        value: String,
        at: String,
    },
    Unary {
        op: String,
        x: Box<NodeDump>,
        at: String,
    },
    Block {
        #[serde(default)]
        stmts: Vec<NodeDump>,
        at: String,
    },
    Assign {
        lhs: Vec<NodeDump>,
        rhs: Vec<NodeDump>,
        #[serde(default)]
        define: bool,
    },
    Var {
        names: Vec<IdentDump>,
        #[serde(default)]
        values: Vec<NodeDump>,
    },
    Other {
        label: String,
        #[serde(default)]
        children: Vec<NodeDump>,
        at: String,
    },
}
