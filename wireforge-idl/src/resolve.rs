//! Second parser pass: turns every [`TypeReference`] and [`Parent`] left
//! unresolved by [`crate::parser::parse`] into a concrete primitive, record,
//! or enum.
//!
//! Two passes over the already-built tree:
//!
//! 1. Walk every record and enum once, building a `fully qualified name ->
//!    record/enum id` table.
//! 2. For each member's type references (and each parent), walk the
//!    namespace chain outward from where the reference was written —
//!    innermost namespace first, then its parent, and so on up to the root —
//!    trying `<chain>::<name>` at each level. The first match wins. If
//!    nothing in the chain matches, fall back to the primitive table.
//!    Otherwise the schema is rejected.

use std::collections::HashMap;

use tracing::{debug_span, trace};
use wireforge_core::error::{bail, ensure, Result};

use crate::ast::{EnumId, NamespaceId, RecordId, Schema, TypeKind};
use crate::primitive;

#[derive(Debug, Clone, Copy)]
enum Entry {
    Record(RecordId),
    Enumeration(EnumId),
}

/// Resolve every type reference and parent reference in `schema` in place.
pub fn resolve(schema: &mut Schema) -> Result<()> {
    let _span = debug_span!("resolve", records = schema.records.len(), enums = schema.enums.len()).entered();
    let table = build_table(schema)?;

    for record_idx in 0..schema.records.len() {
        for parent_idx in 0..schema.records[record_idx].parents.len() {
            resolve_parent(schema, &table, record_idx, parent_idx)?;
        }
        for member_idx in 0..schema.records[record_idx].members.len() {
            resolve_member(schema, &table, record_idx, member_idx)?;
        }
    }
    Ok(())
}

fn build_table(schema: &Schema) -> Result<HashMap<String, Entry>> {
    let mut table = HashMap::new();
    for (id, record) in schema.records.iter().enumerate() {
        let qname = schema.qualified_name(record.namespace, &record.name);
        ensure!(!table.contains_key(&qname), BadClass, "duplicate fully qualified class name {:?}", qname);
        table.insert(qname, Entry::Record(id as RecordId));
    }
    for (id, en) in schema.enums.iter().enumerate() {
        let qname = schema.qualified_name(en.namespace, &en.name);
        ensure!(!table.contains_key(&qname), BadClass, "duplicate fully qualified enum name {:?}", qname);
        table.insert(qname, Entry::Enumeration(id as EnumId));
    }
    Ok(table)
}

/// `declared_namespace`, then its parent, and so on up to the root.
fn namespace_chain(schema: &Schema, declared_namespace: NamespaceId) -> Vec<NamespaceId> {
    let mut chain = vec![declared_namespace];
    let mut ns = declared_namespace;
    while let Some(parent) = schema.namespaces[ns as usize].parent {
        chain.push(parent);
        ns = parent;
    }
    chain
}

fn resolve_name(
    schema: &Schema,
    table: &HashMap<String, Entry>,
    declared_namespace: NamespaceId,
    name: &str,
) -> Option<(TypeKind, u32, Option<NamespaceId>)> {
    for ns in namespace_chain(schema, declared_namespace) {
        let candidate = schema.qualified_name(ns, name);
        if let Some(entry) = table.get(&candidate) {
            return Some(match *entry {
                Entry::Record(id) => (TypeKind::Record, id, Some(ns)),
                Entry::Enumeration(id) => (TypeKind::Enumeration, id, Some(ns)),
            });
        }
    }
    None
}

fn resolve_parent(
    schema: &mut Schema,
    table: &HashMap<String, Entry>,
    record_idx: usize,
    parent_idx: usize,
) -> Result<()> {
    let (name, declared_namespace) = {
        let parent = &schema.records[record_idx].parents[parent_idx];
        (parent.name.clone(), parent.declared_namespace)
    };
    match resolve_name(schema, table, declared_namespace, &name) {
        Some((TypeKind::Record, id, _)) => {
            trace!(class = %schema.records[record_idx].name, parent = %name, "resolved parent class");
            schema.records[record_idx].parents[parent_idx].resolved = Some(id);
            Ok(())
        }
        _ => bail!(
            BadClass,
            "cannot resolve parent class {:?} of class {:?}: not a known class in scope",
            name,
            schema.records[record_idx].name
        ),
    }
}

fn resolve_member(
    schema: &mut Schema,
    table: &HashMap<String, Entry>,
    record_idx: usize,
    member_idx: usize,
) -> Result<()> {
    let type_count = schema.records[record_idx].members[member_idx].types.len();
    for type_idx in 0..type_count {
        let (name, declared_namespace) = {
            let t = &schema.records[record_idx].members[member_idx].types[type_idx];
            (t.name.clone(), t.declared_namespace)
        };
        if let Some((kind, id, resolved_ns)) = resolve_name(schema, table, declared_namespace, &name) {
            let t = &mut schema.records[record_idx].members[member_idx].types[type_idx];
            t.kind = kind;
            t.resolved_id = Some(id);
            t.resolved_namespace = resolved_ns;
        } else if primitive::is_primitive(&name) {
            schema.records[record_idx].members[member_idx].types[type_idx].kind = TypeKind::Primitive;
        } else {
            bail!(
                BadMemberType,
                "cannot resolve type {:?} referenced by member {:?} of class {:?}",
                name,
                schema.records[record_idx].members[member_idx].name,
                schema.records[record_idx].name
            );
        }
    }

    if let Some(key_type) = schema.records[record_idx].members[member_idx].key_type.clone() {
        ensure!(
            primitive::is_primitive(&key_type),
            BadMemberType,
            "map key type {:?} on member {:?} of class {:?} must be a primitive type",
            key_type,
            schema.records[record_idx].members[member_idx].name,
            schema.records[record_idx].name
        );
    }
    trace!(
        class = %schema.records[record_idx].name,
        member = %schema.records[record_idx].members[member_idx].name,
        "resolved member"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn resolves_primitive_members() {
        let mut schema = parse("class p { public string n; public uint64 i; }").unwrap();
        resolve(&mut schema).unwrap();
        for member in &schema.records[0].members {
            assert_eq!(member.types[0].kind, TypeKind::Primitive);
        }
    }

    #[test]
    fn resolves_record_reference_across_namespace() {
        let mut schema = parse(
            "namespace app { class address { public string city; } class person { public address home; } }",
        )
        .unwrap();
        resolve(&mut schema).unwrap();
        let person = schema.records.iter().find(|r| r.name == "person").unwrap();
        assert_eq!(person.members[0].types[0].kind, TypeKind::Record);
    }

    #[test]
    fn resolves_outward_through_enclosing_namespaces() {
        // `color` lives at the top level; `widget` is nested two namespaces
        // deep and refers to it unqualified. The outward walk must find it.
        let mut schema = parse(
            "enum color { red, green } namespace outer { namespace inner { class widget { public color hue; } } }",
        )
        .unwrap();
        resolve(&mut schema).unwrap();
        let widget = schema.records.iter().find(|r| r.name == "widget").unwrap();
        assert_eq!(widget.members[0].types[0].kind, TypeKind::Enumeration);
    }

    #[test]
    fn unresolvable_member_type_is_bad_member_type() {
        let mut schema = parse("class p { public nosuchtype x; }").unwrap();
        let err = resolve(&mut schema).unwrap_err();
        assert_eq!(err.kind(), wireforge_core::error::ErrorKind::BadMemberType);
    }

    #[test]
    fn map_key_must_be_primitive() {
        let mut schema = parse(
            "class person { public uint8 age; } class registry { public map(person) person people; }",
        )
        .unwrap();
        let err = resolve(&mut schema).unwrap_err();
        assert_eq!(err.kind(), wireforge_core::error::ErrorKind::BadMemberType);
    }

    #[test]
    fn parent_class_resolves() {
        let mut schema = parse("class base { public uint8 x; } class derived : public base { public uint8 y; }").unwrap();
        resolve(&mut schema).unwrap();
        assert_eq!(schema.records[1].parents[0].resolved, Some(0));
    }

    #[test]
    fn unresolvable_parent_is_bad_class() {
        let mut schema = parse("class derived : public nosuchbase { public uint8 y; }").unwrap();
        let err = resolve(&mut schema).unwrap_err();
        assert_eq!(err.kind(), wireforge_core::error::ErrorKind::BadClass);
    }

    #[test]
    fn aliased_namespace_paths_produce_duplicate_qualified_name() {
        let mut schema =
            parse("namespace a { namespace b { class x { public uint8 v; } } } namespace a::b { class x { public uint8 v; } }")
                .unwrap();
        let err = resolve(&mut schema).unwrap_err();
        assert_eq!(err.kind(), wireforge_core::error::ErrorKind::BadClass);
    }
}
