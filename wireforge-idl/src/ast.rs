//! The schema tree: namespaces, records, and enumerations, as produced by
//! [`crate::parser::parse`] and mutated in place by [`crate::resolve::resolve`].
//!
//! Nodes live in flat arenas indexed by integer handles rather than as
//! owned trees with `Rc<RefCell<_>>` back-pointers: a namespace's parent is
//! just another index into the same arena, resolution only ever writes
//! into an `Option`/`enum` slot already reserved at parse time, and there
//! is no need for interior mutability or reference counting to thread a
//! back-reference through an owning tree.

/// Index into [`Schema::namespaces`]. The root (unnamed) namespace is
/// always index `0`.
pub type NamespaceId = u32;
/// Index into [`Schema::records`].
pub type RecordId = u32;
/// Index into [`Schema::enums`].
pub type EnumId = u32;

/// The root namespace's id; always present, always unnamed, always
/// parentless.
pub const ROOT_NAMESPACE: NamespaceId = 0;

#[derive(Debug, Default)]
pub struct Schema {
    pub namespaces: Vec<NamespaceNode>,
    pub records: Vec<Record>,
    pub enums: Vec<Enum>,
}

impl Schema {
    /// A schema containing only the implicit root namespace.
    pub fn new() -> Self {
        Schema {
            namespaces: vec![NamespaceNode { name: String::new(), parent: None, children: Vec::new() }],
            records: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// Fully qualified name of a namespace: parent chain joined by `::`,
    /// empty for the root. Records and enums prepend this (with `::`
    /// separator, unless the namespace is the root) to their own name.
    pub fn namespace_full_name(&self, ns: NamespaceId) -> String {
        let node = &self.namespaces[ns as usize];
        match node.parent {
            None => node.name.clone(),
            Some(parent) => {
                let parent_full = self.namespace_full_name(parent);
                if parent_full.is_empty() {
                    node.name.clone()
                } else {
                    format!("{}::{}", parent_full, node.name)
                }
            }
        }
    }

    pub fn qualified_name(&self, ns: NamespaceId, own_name: &str) -> String {
        let prefix = self.namespace_full_name(ns);
        if prefix.is_empty() {
            own_name.to_string()
        } else {
            format!("{}::{}", prefix, own_name)
        }
    }
}

#[derive(Debug)]
pub struct NamespaceNode {
    /// Empty only for the root namespace.
    pub name: String,
    pub parent: Option<NamespaceId>,
    pub children: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Namespace(NamespaceId),
    Record(RecordId),
    Enum(EnumId),
}

#[derive(Debug)]
pub struct Enum {
    pub name: String,
    pub namespace: NamespaceId,
    /// Ordinal is position in this list; there are no explicit numeric
    /// values in the IDL.
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    Private,
}

/// Record attributes. `packed` is the sole attribute the grammar
/// currently recognizes. It is parsed and round-tripped but does not
/// change generated codec behavior; reserved for a future
/// C-struct-layout code path that was never built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordAttributes {
    pub packed: bool,
}

#[derive(Debug)]
pub struct Parent {
    pub access: Access,
    /// As written in source, possibly `::`-qualified.
    pub name: String,
    pub id: u32,
    pub declared_namespace: NamespaceId,
    pub resolved: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Scalar,
    Sequence,
    Mapping,
    Union,
}

#[derive(Debug)]
pub struct Member {
    pub access: Access,
    pub modifier: Modifier,
    /// One entry for `Scalar`/`Sequence`/`Mapping`; one or more (one per
    /// variant) for `Union`.
    pub types: Vec<TypeReference>,
    pub name: String,
    pub id: u32,
    /// Only set when `modifier == Mapping`; names the (unresolved) key
    /// primitive, validated against the primitive table during resolution.
    pub key_type: Option<String>,
    pub default: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Unresolved,
    Primitive,
    Record,
    Enumeration,
}

#[derive(Debug)]
pub struct TypeReference {
    pub name: String,
    /// Union variant tag; defaults to `e_<index>` when not written
    /// explicitly (assigned by the parser, not here).
    pub tag: Option<String>,
    pub declared_namespace: NamespaceId,
    pub resolved_namespace: Option<NamespaceId>,
    pub kind: TypeKind,
    /// Set once resolved: a `RecordId` when `kind == Record`, an `EnumId`
    /// when `kind == Enumeration`. Unused (and meaningless) for primitives.
    pub resolved_id: Option<u32>,
}

impl TypeReference {
    pub fn new(name: String, declared_namespace: NamespaceId) -> Self {
        TypeReference {
            name,
            tag: None,
            declared_namespace,
            resolved_namespace: None,
            kind: TypeKind::Unresolved,
            resolved_id: None,
        }
    }
}

#[derive(Debug)]
pub struct Record {
    pub name: String,
    pub namespace: NamespaceId,
    pub attributes: RecordAttributes,
    pub parents: Vec<Parent>,
    pub members: Vec<Member>,
}
