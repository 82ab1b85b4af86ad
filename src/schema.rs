//! The schema oracle consulted while building paths.
//!
//! The surrounding data-binding layer owns the real per-element-type schema
//! registry; the selection language only ever asks it one question: does
//! element type `E` declare a child element or attribute matching name `N`.
//! Modeling that as an explicit trait keeps the parser free of any global
//! registry and lets tests supply small hand-built schemas.

use crate::ast::QName;
use std::collections::HashMap;

/// Answers declared-child lookups for a schema of element types.
///
/// Element types are identified by opaque string keys. Both the requested
/// name and the declared name may contain wildcards; a declaration matches if
/// either side's pattern covers the other.
pub trait SchemaLookup {
    /// Returns the type key of the child element declared by `parent` that
    /// matches `name`, or `None` if no such child is declared.
    fn child_element(&self, parent: &str, name: &QName) -> Option<String>;

    /// Whether `parent` declares an attribute matching `name`.
    fn has_attribute(&self, parent: &str, name: &QName) -> bool;
}

/// A lookup that declares everything. Used when no root element type is
/// configured, degrading the parser to syntax-only validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unvalidated;

impl SchemaLookup for Unvalidated {
    fn child_element(&self, _parent: &str, _name: &QName) -> Option<String> {
        Some(String::new())
    }

    fn has_attribute(&self, _parent: &str, _name: &QName) -> bool {
        true
    }
}

fn names_match(declared: &QName, requested: &QName) -> bool {
    declared.matches(requested) || requested.matches(declared)
}

#[derive(Debug, Clone, Default)]
struct TypeDecl {
    elements: Vec<(QName, String)>,
    attributes: Vec<QName>,
}

/// An in-memory schema registry: per-element-type declarations of child
/// elements (with their own type keys) and attributes.
///
/// Declaring a child under a wildcard name (e.g. local name `*`) makes the
/// type open to arbitrary children of that shape, mirroring the undeclared
/// marker of the real metadata registry.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    types: HashMap<String, TypeDecl>,
}

impl StaticSchema {
    pub fn new() -> Self {
        StaticSchema::default()
    }

    /// Declares a child element of `parent` with the given name and child
    /// type key.
    pub fn add_element(
        &mut self,
        parent: impl Into<String>,
        name: QName,
        child_type: impl Into<String>,
    ) -> &mut Self {
        self.types
            .entry(parent.into())
            .or_default()
            .elements
            .push((name, child_type.into()));
        self
    }

    /// Declares an attribute of `parent`.
    pub fn add_attribute(&mut self, parent: impl Into<String>, name: QName) -> &mut Self {
        self.types
            .entry(parent.into())
            .or_default()
            .attributes
            .push(name);
        self
    }
}

impl SchemaLookup for StaticSchema {
    fn child_element(&self, parent: &str, name: &QName) -> Option<String> {
        let decl = self.types.get(parent)?;
        decl.elements
            .iter()
            .find(|(declared, _)| names_match(declared, name))
            .map(|(_, ty)| ty.clone())
    }

    fn has_attribute(&self, parent: &str, name: &QName) -> bool {
        self.types
            .get(parent)
            .is_some_and(|decl| decl.attributes.iter().any(|declared| names_match(declared, name)))
    }
}
