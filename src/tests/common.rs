// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Programs built in memory for engine tests: the toyorm chain surface plus a
//! `main.go` file whose statements are added one per line.

use crate::chain::{ChainWalker, Environment};
use crate::diagnostics::Diagnostics;
use crate::frontend::ProgramBuilder;
use crate::model::{LitKind, NodeId, ObjId, ObjectKind, Pos, Program, StructField, TypeId};
use crate::registry::{Manifest, RoleTable};

#[derive(Clone, Copy)]
pub struct Lib {
    pub brick: TypeId,
    pub selection: TypeId,
    pub model_default: TypeId,
    pub model: ObjId,
    pub debug: ObjId,
    pub limit: ObjId,
    pub order_by: ObjId,
    pub where_: ObjId,
    pub preload: ObjId,
    pub join: ObjId,
    pub enter: ObjId,
    pub swap: ObjId,
    pub or: ObjId,
    pub or_condition: ObjId,
    pub find: ObjId,
    pub offsetof: ObjId,
}

fn surface(b: &mut ProgramBuilder) -> Lib {
    let lib_file = b.file("toyorm/toy.go");
    let at = |line| Some(Pos::new(lib_file, line, 6));

    let toy = b.declare_type("toyorm.Toy", at(10));
    let brick_named = b.declare_type("toyorm.ToyBrick", at(20));
    let or_named = b.declare_type("toyorm.ToyBrickOr", at(30));
    let and_named = b.declare_type("toyorm.ToyBrickAnd", at(31));
    let result = b.declare_type("toyorm.Result", at(40));
    for named in [toy, brick_named, or_named, and_named, result] {
        b.define_struct(named, vec![]).unwrap();
    }

    let selection = b.declare_type("toyorm.FieldSelection", at(50));
    let iface = b.interface();
    b.set_underlying(selection, iface).unwrap();

    let uint32 = b.basic("uint32");
    let time = b.parse_type("time.Time").unwrap();
    let model_default = b.declare_type("toyorm.ModelDefault", at(60));
    b.define_struct(
        model_default,
        vec![
            field("ID", uint32, Some(Pos::new(lib_file, 61, 2))),
            field("CreatedAt", time, Some(Pos::new(lib_file, 62, 2))),
            field("UpdatedAt", time, Some(Pos::new(lib_file, 63, 2))),
        ],
    )
    .unwrap();

    let brick = b.pointer(brick_named);
    let toy_ptr = b.pointer(toy);
    let or_ptr = b.pointer(or_named);
    let result_ptr = b.pointer(result);
    let selections = b.slice(selection);
    let anys = b.slice(iface);
    let string = b.basic("string");
    let int = b.basic("int");
    let error = b.basic("error");
    let uintptr = b.basic("uintptr");

    let model_sig = b.signature(vec![iface], false, vec![brick]);
    let plain_sig = b.signature(vec![], false, vec![brick]);
    let limit_sig = b.signature(vec![int], false, vec![brick]);
    let order_sig = b.signature(vec![selections], true, vec![brick]);
    let where_sig = b.signature(vec![string, selection, anys], true, vec![brick]);
    let preload_sig = b.signature(vec![selection], false, vec![brick]);
    let or_sig = b.signature(vec![], false, vec![or_ptr]);
    let find_sig = b.signature(vec![iface], false, vec![result_ptr, error]);
    let offset_sig = b.signature(vec![iface], false, vec![uintptr]);

    Lib {
        brick,
        selection,
        model_default,
        model: b.method(toy_ptr, "Model", model_sig).unwrap(),
        debug: b.method(brick, "Debug", plain_sig).unwrap(),
        limit: b.method(brick, "Limit", limit_sig).unwrap(),
        order_by: b.method(brick, "OrderBy", order_sig).unwrap(),
        where_: b.method(brick, "Where", where_sig).unwrap(),
        preload: b.method(brick, "Preload", preload_sig).unwrap(),
        join: b.method(brick, "Join", preload_sig).unwrap(),
        enter: b.method(brick, "Enter", plain_sig).unwrap(),
        swap: b.method(brick, "Swap", plain_sig).unwrap(),
        or: b.method(brick, "Or", or_sig).unwrap(),
        or_condition: b.method(or_ptr, "Condition", where_sig).unwrap(),
        find: b.method(brick, "Find", find_sig).unwrap(),
        offsetof: b
            .object(
                "unsafe.Offsetof",
                "Offsetof",
                ObjectKind::Builtin,
                Some(offset_sig),
                None,
            )
            .unwrap(),
    }
}

pub fn field(name: &str, ty: TypeId, pos: Option<Pos>) -> StructField {
    StructField {
        name: name.to_owned(),
        ty,
        embedded: false,
        tag: None,
        pos,
    }
}

pub struct Fixture {
    pub b: ProgramBuilder,
    pub lib: Lib,
    pub file: u32,
    pub toy: ObjId,
    decl_line: u32,
    line: u32,
    col: u32,
    vars: u32,
}

// Statements start below the type declarations.
const FIRST_STMT_LINE: u32 = 100;

impl Fixture {
    pub fn new() -> Self {
        let mut b = ProgramBuilder::new();
        let file = b.file("main.go");
        let lib = surface(&mut b);
        let toy_ptr = b.parse_type("*toyorm.Toy").unwrap();
        let toy = b
            .object("main.toy", "toy", ObjectKind::Var, Some(toy_ptr), None)
            .unwrap();
        Fixture {
            b,
            lib,
            file,
            toy,
            decl_line: 1,
            line: FIRST_STMT_LINE,
            col: 1,
            vars: 0,
        }
    }

    /// Declares a named struct in `main.go`; each field is on its own line.
    pub fn record(&mut self, name: &str, fields: &[(&str, &str)]) -> TypeId {
        let tagged: Vec<(&str, &str, Option<&str>)> =
            fields.iter().map(|(n, t)| (*n, *t, None)).collect();
        self.tagged_record(name, &tagged)
    }

    /// Like [`Fixture::record`]; a field named `_` embeds its type.
    pub fn tagged_record(&mut self, name: &str, fields: &[(&str, &str, Option<&str>)]) -> TypeId {
        let named = self
            .b
            .declare_type(name, Some(Pos::new(self.file, self.decl_line, 6)));
        self.decl_line += 1;
        let mut lowered = Vec::new();
        for (field_name, ty_expr, tag) in fields {
            let ty = self.b.parse_type(ty_expr).unwrap();
            let pos = Some(Pos::new(self.file, self.decl_line, 2));
            self.decl_line += 1;
            let embedded = *field_name == "_";
            let name = if embedded {
                ty_expr.trim_start_matches('*').rsplit('.').next().unwrap()
            } else {
                *field_name
            };
            lowered.push(StructField {
                name: name.to_owned(),
                ty,
                embedded,
                tag: tag.map(str::to_owned),
                pos,
            });
        }
        self.decl_line += 1;
        self.b.define_struct(named, lowered).unwrap();
        named
    }

    /// The scenario schema: `Product{ID, Name, Detail *Detail}` and
    /// `Detail{ID, ProductID, Name}`.
    pub fn shop(&mut self) -> (TypeId, TypeId) {
        let detail = self.record(
            "Detail",
            &[("ID", "uint32"), ("ProductID", "uint32"), ("Name", "string")],
        );
        let product = self.record(
            "Product",
            &[("ID", "uint32"), ("Name", "string"), ("Detail", "*Detail")],
        );
        (product, detail)
    }

    pub fn decl_pos(&self, record: TypeId) -> Pos {
        self.b
            .program()
            .types()
            .named_info(record)
            .and_then(|n| n.pos)
            .unwrap()
    }

    pub fn pos(&self, node: NodeId) -> Pos {
        self.b.program().pos(node)
    }

    fn next_pos(&mut self) -> Pos {
        let pos = Pos::new(self.file, self.line, self.col);
        self.col += 4;
        pos
    }

    pub fn var(&mut self, name: &str, ty: TypeId) -> ObjId {
        self.vars += 1;
        let key = format!("main.{name}#{}", self.vars);
        self.b
            .object(&key, name, ObjectKind::Var, Some(ty), None)
            .unwrap()
    }

    pub fn brick_var(&mut self, name: &str) -> ObjId {
        let brick = self.lib.brick;
        self.var(name, brick)
    }

    pub fn use_var(&mut self, obj: ObjId) -> NodeId {
        let pos = self.next_pos();
        let name = self.b.program().object(obj).name.clone();
        self.b.ident(&name, Some(obj), pos)
    }

    pub fn def_var(&mut self, obj: ObjId) -> NodeId {
        let pos = self.next_pos();
        let name = self.b.program().object(obj).name.clone();
        self.b.def_ident(&name, Some(obj), pos)
    }

    /// `recv.Method(args...)`.
    pub fn call(&mut self, recv: NodeId, method: ObjId, args: Vec<NodeId>) -> NodeId {
        let pos = self.next_pos();
        let name = self.b.program().object(method).name.clone();
        let sel = self.b.ident(&name, Some(method), pos);
        let fun = self.b.selector(recv, sel);
        self.b.call(fun, args)
    }

    /// `recv.Method(args...)` with the last argument spread.
    pub fn call_spread(&mut self, recv: NodeId, method: ObjId, args: Vec<NodeId>) -> NodeId {
        let pos = self.next_pos();
        let name = self.b.program().object(method).name.clone();
        let sel = self.b.ident(&name, Some(method), pos);
        let fun = self.b.selector(recv, sel);
        self.b.call_spread(fun, args)
    }

    /// `toy.Model(&Record{})`.
    pub fn model(&mut self, record: TypeId) -> NodeId {
        let toy = self.toy;
        let recv = self.use_var(toy);
        let arg = self.address_of(record);
        let model = self.lib.model;
        self.call(recv, model, vec![arg])
    }

    pub fn composite(&mut self, ty: TypeId, elts: Vec<NodeId>) -> NodeId {
        let pos = self.next_pos();
        self.b.composite(Some(ty), elts, pos)
    }

    pub fn address_of(&mut self, record: TypeId) -> NodeId {
        let pos = self.next_pos();
        let lit = self.composite(record, vec![]);
        self.b.unary("&", lit, pos)
    }

    /// `Offsetof(Record{}.field)`.
    pub fn offsetof(&mut self, record: TypeId, field: &str) -> NodeId {
        let pos = self.next_pos();
        let fun = self.b.ident("Offsetof", Some(self.lib.offsetof), pos);
        let lit = self.composite(record, vec![]);
        let sel_pos = self.next_pos();
        let sel = self.b.ident(field, None, sel_pos);
        let selector = self.b.selector(lit, sel);
        self.b.call(fun, vec![selector])
    }

    /// Interpreted string literal.
    pub fn name(&mut self, text: &str) -> NodeId {
        let pos = self.next_pos();
        self.b.string_lit(text, pos)
    }

    /// Literal exactly as written.
    pub fn raw_lit(&mut self, raw: &str) -> NodeId {
        let pos = self.next_pos();
        self.b.lit(LitKind::String, raw, pos)
    }

    pub fn int(&mut self, value: &str) -> NodeId {
        let pos = self.next_pos();
        self.b.lit(LitKind::Int, value, pos)
    }

    pub fn key_value(&mut self, key: NodeId, value: NodeId) -> NodeId {
        self.b.key_value(key, value)
    }

    /// `target := value` or `target = value`.
    pub fn assign(&mut self, target: ObjId, value: NodeId, define: bool) -> NodeId {
        let lhs = if define {
            self.def_var(target)
        } else {
            self.use_var(target)
        };
        self.b.assign(vec![lhs], vec![value], define)
    }

    /// `var target = value`.
    pub fn var_decl(&mut self, target: ObjId, value: NodeId) -> NodeId {
        let name = self.def_var(target);
        self.b.value_decl(vec![name], vec![value])
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let pos = self.next_pos();
        self.b.block(stmts, pos)
    }

    /// Adds a top-level statement and moves to the next line.
    pub fn stmt(&mut self, node: NodeId) -> NodeId {
        let file = self.file;
        self.b.push_decl(file, node);
        self.line += 1;
        self.col = 1;
        node
    }

    /// Moves to the next line without adding a statement.
    pub fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    pub fn finish(self) -> Program {
        self.b.finish()
    }
}

pub fn roles(program: &Program) -> RoleTable {
    RoleTable::discover(program, Manifest::bundled()).unwrap()
}

/// Walks `program` with the bundled manifest.
pub fn diagnostics(program: &Program) -> Diagnostics {
    let roles = roles(program);
    crate::walk(program, &roles).unwrap()
}

/// Walks `program`, keeping the walker around for memo inspection.
pub fn with_walker<R>(program: &Program, f: impl FnOnce(&mut ChainWalker<'_>) -> R) -> R {
    let roles = roles(program);
    let mut walker = ChainWalker::new(program, &roles);
    let mut env = Environment::new();
    for file in program.files() {
        for decl in &file.decls {
            env = walker.visit(*decl, env).unwrap();
        }
    }
    f(&mut walker)
}
