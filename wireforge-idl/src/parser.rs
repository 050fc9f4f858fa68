//! Recursive-descent parser over schema source text.
//!
//! ```text
//! File       := StmtList
//! StmtList   := Stmt*
//! Stmt       := Namespace | Record | Enum
//! Namespace  := 'namespace' HQID '{' StmtList '}'
//! Record     := 'class' Ident AttrList [ ':' ParentList ] '{' MemberList '}'
//! AttrList   := Ident*
//! ParentList := Parent (',' Parent)*
//! Parent     := Access HQID
//! Enum       := 'enum' Ident '{' [ Ident (',' Ident)* ] '}'
//! MemberList := Member*
//! Member     := Access TypeSpec Ident ';'
//! TypeSpec   := HQID | 'array' HQID | 'map' '(' HQID ')' HQID | 'union' '(' UVariant (',' UVariant)* ')'
//! UVariant   := HQID [ '=' Ident ]
//! Access     := 'public' | 'protected' | 'private'
//! ```
//!
//! This pass only builds the tree; it never resolves a [`TypeReference`]
//! or [`Parent`] — that's [`crate::resolve::resolve`]'s job, run as a
//! second pass once the whole tree exists.

use tracing::debug_span;
use wireforge_core::cursor::Cursor;
use wireforge_core::error::{bail, ensure, Result};

use crate::ast::{
    Access, Enum, Member, Modifier, NamespaceNode, Parent, Record, RecordAttributes, Schema, Statement, TypeReference,
    EnumId, NamespaceId, RecordId, ROOT_NAMESPACE,
};
use crate::lexer::{expect_byte, is_first_identifier, parse_hierarchical_identifier, parse_identifier, skip_ws_and_comments};

/// Parse a complete schema source file into a tree. Type references and
/// parent references are left unresolved; call [`crate::resolve::resolve`]
/// on the result before handing it to the code generator.
pub fn parse(source: &str) -> Result<Schema> {
    let mut parser = Parser { cur: Cursor::new(source.as_bytes()), schema: Schema::new() };
    let children = parser.parse_statement_list(ROOT_NAMESPACE)?;
    parser.schema.namespaces[ROOT_NAMESPACE as usize].children = children;
    skip_ws_and_comments(&mut parser.cur)?;
    ensure!(
        parser.cur.at_end(),
        BadObjectType,
        "unexpected trailing content after top-level statements\n{}",
        parser.cur.diagnostic()
    );
    Ok(parser.schema)
}

struct Parser<'a> {
    cur: Cursor<'a>,
    schema: Schema,
}

impl<'a> Parser<'a> {
    fn statement_name(&self, stmt: Statement) -> &str {
        match stmt {
            Statement::Namespace(id) => &self.schema.namespaces[id as usize].name,
            Statement::Record(id) => &self.schema.records[id as usize].name,
            Statement::Enum(id) => &self.schema.enums[id as usize].name,
        }
    }

    fn parse_statement_list(&mut self, ns: NamespaceId) -> Result<Vec<Statement>> {
        let mut stmts = Vec::new();
        loop {
            skip_ws_and_comments(&mut self.cur)?;
            if self.cur.at_end() || self.cur.peek()? == b'}' {
                break;
            }
            let keyword = parse_identifier(&mut self.cur)?;
            let stmt = match keyword.as_str() {
                "namespace" => Statement::Namespace(self.parse_namespace(ns)?),
                "class" => Statement::Record(self.parse_record(ns)?),
                "enum" => Statement::Enum(self.parse_enum(ns)?),
                other => bail!(
                    BadObjectType,
                    "bad identifier type, expected one of 'namespace', 'class', 'enum', found {:?}\n{}",
                    other,
                    self.cur.diagnostic()
                ),
            };
            let name = self.statement_name(stmt).to_string();
            ensure!(
                !stmts.iter().any(|&s| self.statement_name(s) == name),
                BadNamespace,
                "duplicate name {:?} in namespace\n{}",
                name,
                self.cur.diagnostic()
            );
            stmts.push(stmt);
        }
        Ok(stmts)
    }

    fn parse_namespace(&mut self, parent: NamespaceId) -> Result<NamespaceId> {
        skip_ws_and_comments(&mut self.cur)?;
        let name = parse_hierarchical_identifier(&mut self.cur)?;
        let _span = debug_span!("parse_namespace", name = %name).entered();
        expect_byte(&mut self.cur, b'{')?;
        let ns_id = self.schema.namespaces.len() as NamespaceId;
        self.schema.namespaces.push(NamespaceNode { name, parent: Some(parent), children: Vec::new() });
        let children = self.parse_statement_list(ns_id)?;
        self.schema.namespaces[ns_id as usize].children = children;
        expect_byte(&mut self.cur, b'}')?;
        Ok(ns_id)
    }

    fn parse_access(&mut self) -> Result<Access> {
        let ident = parse_identifier(&mut self.cur)?;
        match ident.as_str() {
            "public" => Ok(Access::Public),
            "protected" => Ok(Access::Protected),
            "private" => Ok(Access::Private),
            other => bail!(
                BadAccessType,
                "bad access type, expected 'public', 'protected', or 'private', found {:?}\n{}",
                other,
                self.cur.diagnostic()
            ),
        }
    }

    fn parse_parent_list(&mut self, ns: NamespaceId, next_id: &mut u32) -> Result<Vec<Parent>> {
        let mut parents = Vec::new();
        loop {
            let access = self.parse_access()?;
            skip_ws_and_comments(&mut self.cur)?;
            let name = parse_hierarchical_identifier(&mut self.cur)?;
            parents.push(Parent { access, name, id: *next_id, declared_namespace: ns, resolved: None });
            *next_id += 1;
            skip_ws_and_comments(&mut self.cur)?;
            if !self.cur.at_end() && self.cur.peek()? == b',' {
                self.cur.advance(1)?;
                skip_ws_and_comments(&mut self.cur)?;
                continue;
            }
            break;
        }
        Ok(parents)
    }

    fn parse_record(&mut self, ns: NamespaceId) -> Result<RecordId> {
        skip_ws_and_comments(&mut self.cur)?;
        let name = parse_identifier(&mut self.cur)?;
        let _span = debug_span!("parse_record", name = %name).entered();
        skip_ws_and_comments(&mut self.cur)?;

        let mut attributes = RecordAttributes::default();
        loop {
            if self.cur.at_end() || !is_first_identifier(self.cur.peek()?) {
                break;
            }
            let attr = parse_identifier(&mut self.cur)?;
            if attr == "packed" {
                attributes.packed = true;
            }
            skip_ws_and_comments(&mut self.cur)?;
        }

        let mut next_id = 1u32;
        let mut parents = Vec::new();
        if !self.cur.at_end() && self.cur.peek()? == b':' {
            self.cur.advance(1)?;
            skip_ws_and_comments(&mut self.cur)?;
            parents = self.parse_parent_list(ns, &mut next_id)?;
            skip_ws_and_comments(&mut self.cur)?;
        }

        expect_byte(&mut self.cur, b'{')?;
        let mut members = Vec::new();
        loop {
            skip_ws_and_comments(&mut self.cur)?;
            if self.cur.peek()? == b'}' {
                self.cur.advance(1)?;
                break;
            }
            let member = self.parse_member(ns, next_id)?;
            ensure!(
                !members.iter().any(|m: &Member| m.name == member.name),
                BadClassMember,
                "duplicate member name {:?} in class {:?}\n{}",
                member.name,
                name,
                self.cur.diagnostic()
            );
            next_id += 1;
            members.push(member);
        }
        if !self.cur.at_end() && self.cur.peek()? == b';' {
            bail!(BadClass, "semicolon is not expected at the end of a class\n{}", self.cur.diagnostic());
        }

        let id = self.schema.records.len() as RecordId;
        self.schema.records.push(Record { name, namespace: ns, attributes, parents, members });
        Ok(id)
    }

    fn parse_member(&mut self, ns: NamespaceId, id: u32) -> Result<Member> {
        let access = self.parse_access()?;
        skip_ws_and_comments(&mut self.cur)?;
        let head = parse_hierarchical_identifier(&mut self.cur)?;
        let (modifier, types, key_type) = match head.as_str() {
            "array" => {
                skip_ws_and_comments(&mut self.cur)?;
                let elem = parse_hierarchical_identifier(&mut self.cur)?;
                (Modifier::Sequence, vec![TypeReference::new(elem, ns)], None)
            }
            "map" => {
                expect_byte(&mut self.cur, b'(')?;
                skip_ws_and_comments(&mut self.cur)?;
                let key = parse_hierarchical_identifier(&mut self.cur)?;
                expect_byte(&mut self.cur, b')')?;
                skip_ws_and_comments(&mut self.cur)?;
                let value = parse_hierarchical_identifier(&mut self.cur)?;
                (Modifier::Mapping, vec![TypeReference::new(value, ns)], Some(key))
            }
            "union" => {
                expect_byte(&mut self.cur, b'(')?;
                let mut variants = Vec::new();
                let mut untagged_count = 0u32;
                loop {
                    skip_ws_and_comments(&mut self.cur)?;
                    let variant_type = parse_hierarchical_identifier(&mut self.cur)?;
                    skip_ws_and_comments(&mut self.cur)?;
                    let mut tref = TypeReference::new(variant_type, ns);
                    if !self.cur.at_end() && self.cur.peek()? == b'=' {
                        self.cur.advance(1)?;
                        skip_ws_and_comments(&mut self.cur)?;
                        tref.tag = Some(parse_identifier(&mut self.cur)?);
                    } else {
                        tref.tag = Some(format!("e_{}", untagged_count));
                        untagged_count += 1;
                    }
                    ensure!(
                        !variants.iter().any(|v: &TypeReference| v.tag == tref.tag),
                        BadClassMember,
                        "duplicate union variant tag {:?}\n{}",
                        tref.tag,
                        self.cur.diagnostic()
                    );
                    variants.push(tref);
                    skip_ws_and_comments(&mut self.cur)?;
                    if !self.cur.at_end() && self.cur.peek()? == b',' {
                        self.cur.advance(1)?;
                        continue;
                    }
                    break;
                }
                expect_byte(&mut self.cur, b')')?;
                (Modifier::Union, variants, None)
            }
            scalar => (Modifier::Scalar, vec![TypeReference::new(scalar.to_string(), ns)], None),
        };
        skip_ws_and_comments(&mut self.cur)?;
        let name = parse_identifier(&mut self.cur)?;
        expect_byte(&mut self.cur, b';')?;
        Ok(Member {
            access,
            modifier,
            types,
            name: name.clone(),
            id,
            key_type,
            default: None,
            display_name: name,
        })
    }

    fn parse_enum(&mut self, ns: NamespaceId) -> Result<EnumId> {
        skip_ws_and_comments(&mut self.cur)?;
        let name = parse_identifier(&mut self.cur)?;
        let _span = debug_span!("parse_enum", name = %name).entered();
        expect_byte(&mut self.cur, b'{')?;
        let mut symbols = Vec::new();
        skip_ws_and_comments(&mut self.cur)?;
        if !self.cur.at_end() && self.cur.peek()? != b'}' {
            loop {
                let symbol = parse_identifier(&mut self.cur)?;
                ensure!(
                    !symbols.contains(&symbol),
                    BadClassMember,
                    "duplicate enum symbol {:?}\n{}",
                    symbol,
                    self.cur.diagnostic()
                );
                symbols.push(symbol);
                skip_ws_and_comments(&mut self.cur)?;
                if !self.cur.at_end() && self.cur.peek()? == b',' {
                    self.cur.advance(1)?;
                    skip_ws_and_comments(&mut self.cur)?;
                    continue;
                }
                break;
            }
        }
        expect_byte(&mut self.cur, b'}')?;
        if !self.cur.at_end() && self.cur.peek()? == b';' {
            bail!(BadClass, "semicolon is not expected at the end of an enum\n{}", self.cur.diagnostic());
        }
        let id = self.schema.enums.len() as EnumId;
        self.schema.enums.push(Enum { name, namespace: ns, symbols });
        Ok(id)
    }
}
