//! The concrete instance tree selection expressions are evaluated against:
//! named elements carrying an optional text value, ordered attributes, and
//! ordered child elements.

use crate::ast::QName;

/// One element instance in a parsed tree.
///
/// Only data that was actually set or parsed is present here; the evaluator
/// treats presence in this tree as the definition of "exists". The chainable
/// `with_*` constructors make literal trees easy to write in tests and
/// embedding code.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    pub text: Option<String>,
    pub attributes: Vec<(QName, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Element {
            name,
            text: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// First attribute matching the pattern name.
    pub fn attribute(&self, pattern: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| pattern.matches(name))
            .map(|(_, value)| value.as_str())
    }

    /// First child element matching the pattern name.
    pub fn child(&self, pattern: &QName) -> Option<&Element> {
        self.children.iter().find(|c| pattern.matches(&c.name))
    }
}

/// A borrowed view of a node a path resolved to: either an element or one of
/// its attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Element(&'a Element),
    Attribute { name: &'a QName, value: &'a str },
}

impl<'a> NodeRef<'a> {
    /// The node's textual value: an element's text content or an attribute's
    /// string value. An element with no text value yields `None`.
    pub fn value(&self) -> Option<&'a str> {
        match self {
            NodeRef::Element(e) => e.text.as_deref(),
            NodeRef::Attribute { value, .. } => Some(value),
        }
    }
}
