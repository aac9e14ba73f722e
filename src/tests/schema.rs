// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::common::Fixture;
use crate::schema::{attributes, lookup_tag, SchemaCache, SchemaError, TagConfig};

fn keys(fx: &Fixture, record: crate::model::TypeId) -> Vec<String> {
    let mut cache = SchemaCache::new(TagConfig::default());
    let table = cache.resolve(fx.b.program().types(), record).unwrap();
    table.iter().map(|f| f.key.clone()).collect()
}

#[test]
fn promoted_fields_come_first_in_declaration_order() {
    let mut fx = Fixture::new();
    let detail = fx.record("Detail", &[("ID", "uint32")]);
    let product = fx.tagged_record(
        "Product",
        &[
            ("_", "toyorm.ModelDefault", None),
            ("Name", "string", None),
            ("Detail", "*Detail", None),
        ],
    );

    assert_eq!(
        keys(&fx, product),
        ["ID", "CreatedAt", "UpdatedAt", "Name", "Detail"]
    );

    let mut cache = SchemaCache::new(TagConfig::default());
    let table = cache.resolve(fx.b.program().types(), product).unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(table.get("Detail").unwrap().record, Some(detail));
    assert_eq!(
        table.get("ID").unwrap().pos,
        fx.b
            .program()
            .types()
            .struct_of(fx.lib.model_default)
            .unwrap()
            .fields[0]
            .pos
    );
}

#[test]
fn alias_replaces_the_declared_name() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[
            ("ID", "uint32", Some(r#"toyorm:"primary key""#)),
            ("Name", "string", Some(r#"json:"name" toyorm:"index;alias:title""#)),
        ],
    );

    let mut cache = SchemaCache::new(TagConfig::default());
    let table = cache.resolve(fx.b.program().types(), user).unwrap();
    assert!(table.get("Name").is_none());
    let title = table.get("title").unwrap();
    assert_eq!(title.name, "Name");
    assert_eq!(table.get("ID").unwrap().key, "ID");
}

#[test]
fn alias_lookup_follows_the_tag_config() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[("Name", "string", Some(r#"orm:"Rename: title ""#))],
    );

    let mut cache = SchemaCache::new(TagConfig {
        key: "orm".to_owned(),
        alias: "rename".to_owned(),
    });
    let table = cache.resolve(fx.b.program().types(), user).unwrap();
    assert_eq!(table.get("title").unwrap().name, "Name");

    // The default tag key ignores the `orm` tag.
    assert_eq!(keys(&fx, user), ["Name"]);
}

#[test]
fn colliding_keys_are_an_error() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[
            ("Name", "string", None),
            ("Title", "string", Some(r#"toyorm:"alias:Name""#)),
        ],
    );
    let fields = fx.b.program().types().struct_of(user).unwrap().fields.clone();

    let mut cache = SchemaCache::new(TagConfig::default());
    let err = cache.resolve(fx.b.program().types(), user).unwrap_err();
    assert_eq!(
        err,
        SchemaError::DuplicateKey {
            key: "Name".to_owned(),
            first: fields[0].pos,
            second: fields[1].pos,
        }
    );
    assert_eq!(err.pos(), fields[1].pos);
}

#[test]
fn plain_field_colliding_with_promoted_field_is_an_error() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[("_", "toyorm.ModelDefault", None), ("ID", "string", None)],
    );

    let mut cache = SchemaCache::new(TagConfig::default());
    let err = cache.resolve(fx.b.program().types(), user).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateKey { ref key, .. } if key == "ID"));
}

#[test]
fn failures_are_cached() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[
            ("A", "string", Some(r#"toyorm:"alias:X""#)),
            ("B", "string", Some(r#"toyorm:"alias:X""#)),
        ],
    );

    let mut cache = SchemaCache::new(TagConfig::default());
    let first = cache.resolve(fx.b.program().types(), user).unwrap_err();
    let second = cache.resolve(fx.b.program().types(), user).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn embedded_pointer_contributes_nothing() {
    let mut fx = Fixture::new();
    let user = fx.tagged_record(
        "User",
        &[("_", "*toyorm.ModelDefault", None), ("Name", "string", None)],
    );
    assert_eq!(keys(&fx, user), ["Name"]);
}

#[test]
fn struct_shaped_fields_know_their_record() {
    let mut fx = Fixture::new();
    let tag = fx.record("Tag", &[("Label", "string")]);
    let post = fx.record(
        "Post",
        &[
            ("Tags", "[]Tag"),
            ("Pinned", "[]*Tag"),
            ("Main", "Tag"),
            ("Title", "string"),
            ("Meta", "map[string]Tag"),
        ],
    );

    let mut cache = SchemaCache::new(TagConfig::default());
    let table = cache.resolve(fx.b.program().types(), post).unwrap();
    for key in ["Tags", "Pinned", "Main"] {
        let field = table.get(key).unwrap();
        assert!(field.is_struct(), "{key}");
        assert_eq!(field.record, Some(tag));
    }
    assert!(!table.get("Title").unwrap().is_struct());
    assert!(!table.get("Meta").unwrap().is_struct());
}

#[test]
fn non_struct_records_are_rejected() {
    let fx = Fixture::new();
    let mut cache = SchemaCache::new(TagConfig::default());
    let err = cache
        .resolve(fx.b.program().types(), fx.lib.selection)
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::NotAStruct("toyorm.FieldSelection".to_owned())
    );
    assert_eq!(err.pos(), None);
}

#[test]
fn tag_lookup() {
    let tag = r#"json:"name,omitempty" toyorm:"index;alias:title""#;
    assert_eq!(lookup_tag(tag, "toyorm").as_deref(), Some("index;alias:title"));
    assert_eq!(lookup_tag(tag, "json").as_deref(), Some("name,omitempty"));
    assert_eq!(lookup_tag(tag, "xml"), None);

    assert_eq!(lookup_tag(r#"toyorm:"a\"b""#, "toyorm").as_deref(), Some("a\"b"));
    assert_eq!(lookup_tag("", "toyorm"), None);
    // Malformed tags stop the scan.
    assert_eq!(lookup_tag(r#"toyorm"index""#, "toyorm"), None);
    assert_eq!(lookup_tag(r#"toyorm:"index"#, "toyorm"), None);
}

#[test]
fn tag_attributes() {
    assert_eq!(
        attributes(" Primary Key ; ALIAS: title ;; default:0 "),
        [
            ("primary key".to_owned(), String::new()),
            ("alias".to_owned(), "title".to_owned()),
            ("default".to_owned(), "0".to_owned()),
        ]
    );
    assert!(attributes("").is_empty());
    // Only the first colon separates name and value.
    assert_eq!(
        attributes("type:VARCHAR(10):x"),
        [("type".to_owned(), "VARCHAR(10):x".to_owned())]
    );
}
