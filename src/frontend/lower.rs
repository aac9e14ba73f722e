// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use log::debug;

use crate::model::{LitKind, NodeId, ObjectKind, Pos, Program, StructField, TypeId};

use super::dump::{
    IdentDump, LitKindDump, MethodDump, NodeDump, ObjectDump, ObjectKindDump, PackageDump,
    TypeDump,
};
use super::{type_expr, FrontendError, ProgramBuilder};

/// Merges package dumps into one program.
///
/// Named types are declared across every dump before any of them is
/// defined, so a package dump may refer to types that only a library
/// surface dump describes and vice versa.
pub fn lower(dumps: &[PackageDump]) -> Result<Program, FrontendError> {
    let mut builder = ProgramBuilder::new();

    for dump in dumps {
        for file in &dump.files {
            builder.file(&file.name);
        }
    }

    for dump in dumps {
        for ty in &dump.types {
            let pos = parse_pos_opt(&mut builder, ty.at.as_deref(), None)?;
            builder.declare_type(&ty.name, pos);
        }
    }

    for dump in dumps {
        for ty in &dump.types {
            define_type(&mut builder, ty)?;
        }
    }

    for dump in dumps {
        for ty in &dump.types {
            let named = builder.declare_type(&ty.name, None);
            for method in &ty.methods {
                declare_method(&mut builder, named, &ty.name, method)?;
            }
        }
    }

    for dump in dumps {
        for obj in &dump.objects {
            declare_object(&mut builder, obj)?;
        }
    }

    for dump in dumps {
        if let Some(package) = &dump.package {
            debug!("lowering package `{package}`");
        }
        for file in &dump.files {
            let file_id = builder.file(&file.name);
            for decl in &file.decls {
                let node = lower_node(&mut builder, decl, file_id)?;
                builder.push_decl(file_id, node);
            }
        }
    }

    Ok(builder.finish())
}

fn define_type(builder: &mut ProgramBuilder, ty: &TypeDump) -> Result<(), FrontendError> {
    let named = builder.declare_type(&ty.name, None);
    if let Some(fields) = &ty.fields {
        let mut lowered = Vec::with_capacity(fields.len());
        for field in fields {
            let pos = parse_pos_opt(builder, field.at.as_deref(), None)?;
            lowered.push(StructField {
                name: field.name.clone(),
                ty: builder.parse_type(&field.ty)?,
                embedded: field.embedded,
                tag: field.tag.clone(),
                pos,
            });
        }
        builder.define_struct(named, lowered)?;
    } else if let Some(underlying) = &ty.underlying {
        let underlying = builder.parse_type(underlying)?;
        builder.set_underlying(named, underlying)?;
    }
    Ok(())
}

fn declare_method(
    builder: &mut ProgramBuilder,
    named: TypeId,
    owner: &str,
    method: &MethodDump,
) -> Result<(), FrontendError> {
    let recv = if method.pointer {
        builder.pointer(named)
    } else {
        named
    };
    let context = format!("{owner}.{}", method.name);
    let sig = signature(builder, &context, &method.params, &method.results)?;
    builder.method(recv, &method.name, sig)?;
    Ok(())
}

fn signature(
    builder: &mut ProgramBuilder,
    context: &str,
    params: &[String],
    results: &[String],
) -> Result<TypeId, FrontendError> {
    let mut lowered = Vec::with_capacity(params.len());
    let mut variadic = false;
    for (idx, param) in params.iter().enumerate() {
        let (text, is_variadic) = type_expr::strip_variadic(param);
        if is_variadic {
            if idx + 1 != params.len() {
                return Err(FrontendError::MisplacedVariadic(context.to_owned()));
            }
            variadic = true;
            let elem = builder.parse_type(text)?;
            lowered.push(builder.slice(elem));
        } else {
            lowered.push(builder.parse_type(text)?);
        }
    }
    let results = results
        .iter()
        .map(|r| builder.parse_type(r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(builder.signature(lowered, variadic, results))
}

fn declare_object(builder: &mut ProgramBuilder, obj: &ObjectDump) -> Result<(), FrontendError> {
    let kind = match obj.kind {
        ObjectKindDump::Var => ObjectKind::Var,
        ObjectKindDump::Const => ObjectKind::Const,
        ObjectKindDump::Func => ObjectKind::Func,
        ObjectKindDump::Builtin => ObjectKind::Builtin,
        ObjectKindDump::Type => ObjectKind::TypeName,
        ObjectKindDump::Package => ObjectKind::Package,
        ObjectKindDump::Field => ObjectKind::Field,
    };
    let ty = match (&obj.params, &obj.ty) {
        (Some(params), _) => Some(signature(builder, &obj.id, params, &obj.results)?),
        (None, Some(ty)) => Some(builder.parse_type(ty)?),
        (None, None) => None,
    };
    let pos = parse_pos_opt(builder, obj.at.as_deref(), None)?;
    let name = obj
        .name
        .clone()
        .unwrap_or_else(|| default_name(&obj.id).to_owned());
    builder.object(&obj.id, &name, kind, ty, pos)?;
    Ok(())
}

// `pkg.Name#3` -> `Name`
fn default_name(id: &str) -> &str {
    let base = id.split('#').next().unwrap_or(id);
    base.rsplit('.').next().unwrap_or(base)
}

fn lower_node(
    builder: &mut ProgramBuilder,
    node: &NodeDump,
    file: u32,
) -> Result<NodeId, FrontendError> {
    let id = match node {
        NodeDump::Ident(ident) => lower_ident(builder, ident, file, false)?,
        NodeDump::Selector { x, sel, ty } => {
            let x = lower_node(builder, x, file)?;
            let sel = lower_ident(builder, sel, file, false)?;
            let id = builder.selector(x, sel);
            override_type(builder, id, ty.as_deref())?
        }
        NodeDump::Call {
            fun,
            args,
            spread,
            ty,
        } => {
            let fun = lower_node(builder, fun, file)?;
            let args = lower_all(builder, args, file)?;
            let id = if *spread {
                builder.call_spread(fun, args)
            } else {
                builder.call(fun, args)
            };
            override_type(builder, id, ty.as_deref())?
        }
        NodeDump::Composite { ty, elts, at } => {
            let ty = builder.parse_type(ty)?;
            let elts = lower_all(builder, elts, file)?;
            let pos = parse_pos(builder, at, Some(file))?;
            builder.composite(Some(ty), elts, pos)
        }
        NodeDump::KeyValue { key, value } => {
            let key = lower_node(builder, key, file)?;
            let value = lower_node(builder, value, file)?;
            builder.key_value(key, value)
        }
        NodeDump::Lit { lit, value, at } => {
            let kind = match lit {
                LitKindDump::String => LitKind::String,
                LitKindDump::Int => LitKind::Int,
                LitKindDump::Float => LitKind::Float,
                LitKindDump::Char => LitKind::Char,
                LitKindDump::Imag => LitKind::Imag,
            };
            let pos = parse_pos(builder, at, Some(file))?;
            builder.lit(kind, value, pos)
        }
        NodeDump::Unary { op, x, at } => {
            let x = lower_node(builder, x, file)?;
            let pos = parse_pos(builder, at, Some(file))?;
            builder.unary(op, x, pos)
        }
        NodeDump::Block { stmts, at } => {
            let stmts = lower_all(builder, stmts, file)?;
            let pos = parse_pos(builder, at, Some(file))?;
            builder.block(stmts, pos)
        }
        NodeDump::Assign { lhs, rhs, define } => {
            let lhs = lower_all(builder, lhs, file)?;
            let rhs = lower_all(builder, rhs, file)?;
            builder.assign(lhs, rhs, *define)
        }
        NodeDump::Var { names, values } => {
            let names = names
                .iter()
                .map(|name| lower_ident(builder, name, file, true))
                .collect::<Result<Vec<_>, _>>()?;
            let values = lower_all(builder, values, file)?;
            builder.value_decl(names, values)
        }
        NodeDump::Other {
            label,
            children,
            at,
        } => {
            let children = lower_all(builder, children, file)?;
            let pos = parse_pos(builder, at, Some(file))?;
            builder.other(label, children, pos)
        }
    };
    Ok(id)
}

fn lower_all(
    builder: &mut ProgramBuilder,
    nodes: &[NodeDump],
    file: u32,
) -> Result<Vec<NodeId>, FrontendError> {
    nodes
        .iter()
        .map(|node| lower_node(builder, node, file))
        .collect()
}

fn lower_ident(
    builder: &mut ProgramBuilder,
    ident: &IdentDump,
    file: u32,
    force_def: bool,
) -> Result<NodeId, FrontendError> {
    let obj = match &ident.obj {
        Some(key) => Some(
            builder
                .lookup_object(key)
                .ok_or_else(|| FrontendError::UnknownObject(key.clone()))?,
        ),
        None => None,
    };
    let pos = parse_pos(builder, &ident.at, Some(file))?;
    let id = if ident.def || force_def {
        builder.def_ident(&ident.name, obj, pos)
    } else {
        builder.ident(&ident.name, obj, pos)
    };
    override_type(builder, id, ident.ty.as_deref())
}

fn override_type(
    builder: &mut ProgramBuilder,
    id: NodeId,
    ty: Option<&str>,
) -> Result<NodeId, FrontendError> {
    if let Some(ty) = ty {
        let ty = builder.parse_type(ty)?;
        builder.set_type(id, ty);
    }
    Ok(id)
}

fn parse_pos_opt(
    builder: &mut ProgramBuilder,
    text: Option<&str>,
    file: Option<u32>,
) -> Result<Option<Pos>, FrontendError> {
    text.map(|text| parse_pos(builder, text, file)).transpose()
}

/// Reads `file:line:col`, or `line:col` relative to `file`.
pub(crate) fn parse_pos(
    builder: &mut ProgramBuilder,
    text: &str,
    file: Option<u32>,
) -> Result<Pos, FrontendError> {
    let bad = || FrontendError::BadPosition(text.to_owned());
    let mut parts = text.rsplitn(3, ':');
    let col = parts.next().and_then(|c| c.trim().parse::<u32>().ok());
    let line = parts.next().and_then(|l| l.trim().parse::<u32>().ok());
    let (line, col) = match (line, col) {
        (Some(line), Some(col)) => (line, col),
        _ => return Err(bad()),
    };
    let file = match parts.next() {
        Some(name) if !name.is_empty() => builder.file(name),
        Some(_) => return Err(bad()),
        None => file.ok_or_else(bad)?,
    };
    Ok(Pos::new(file, line, col))
}
