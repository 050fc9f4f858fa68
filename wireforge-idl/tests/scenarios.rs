//! Whole-schema parse-and-resolve scenarios exercising the public entry
//! point end to end, as opposed to a single internal function.

use wireforge_core::error::ErrorKind;
use wireforge_idl::ast::TypeKind;
use wireforge_idl::parse_and_resolve;

#[test]
fn s1_schema_resolves_cleanly() {
    let schema = parse_and_resolve("namespace t { class p { public string n; public uint64 i; } }").unwrap();
    let p = schema.records.iter().find(|r| r.name == "p").unwrap();
    assert_eq!(p.members.len(), 2);
    assert!(p.members.iter().all(|m| m.types[0].kind == TypeKind::Primitive));
    assert_eq!(schema.namespace_full_name(p.namespace), "t");
}

#[test]
fn s3_union_schema_resolves_both_variants() {
    let schema = parse_and_resolve(
        "class cacheserver { public uint32 ttl; } \
         class httpserver { public uint32 size; public uint32 mimesize; } \
         class endpoint { public union (cacheserver=cache, httpserver=http) entry; }",
    )
    .unwrap();
    let endpoint = schema.records.iter().find(|r| r.name == "endpoint").unwrap();
    let entry = &endpoint.members[0];
    assert_eq!(entry.types.len(), 2);
    assert_eq!(entry.types[0].tag.as_deref(), Some("cache"));
    assert_eq!(entry.types[1].tag.as_deref(), Some("http"));
    assert!(entry.types.iter().all(|t| t.kind == TypeKind::Record));
}

#[test]
fn s4_enum_field_resolves_to_enumeration() {
    let schema = parse_and_resolve("enum color { red, green, blue } class widget { public color c; }").unwrap();
    let widget = schema.records.iter().find(|r| r.name == "widget").unwrap();
    assert_eq!(widget.members[0].types[0].kind, TypeKind::Enumeration);
    let color = &schema.enums[widget.members[0].types[0].resolved_id.unwrap() as usize];
    assert_eq!(color.symbols, vec!["red", "green", "blue"]);
}

#[test]
fn s6_map_value_resolves_to_surrounding_namespace_record() {
    let schema = parse_and_resolve(
        "namespace app { class person { public string name; } class x { public map(uint64) person list; } }",
    )
    .unwrap();
    let x = schema.records.iter().find(|r| r.name == "x").unwrap();
    assert_eq!(x.members[0].types[0].kind, TypeKind::Record);
}

#[test]
fn s6_non_primitive_map_key_is_bad_member_type() {
    let err = parse_and_resolve(
        "class person { public string name; } class x { public map(persontype) person list; }",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadMemberType);
}

#[test]
fn malformed_schema_reports_cursor_context() {
    let err = parse_and_resolve("class x { badaccess uint8 a; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadAccessType);
    // The diagnostic is rendered straight into the message rather than the
    // separate `context` slot, since this is a text-position failure, not a
    // codec error wrapping a lower-level one with `with_context`.
    assert!(err.to_string().contains("badaccess"));
}
