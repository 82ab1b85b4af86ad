//! An XPath-like selection-expression language for typed element trees:
//! parse `title,link(@href),media:group[yt:duration > 60]`-style expressions,
//! evaluate their conditions against element instances, and project trees
//! down to the selected parts.
//!
//! Expressions are parsed under an explicit [`ParseContext`] carrying the
//! parse mode, namespace bindings, and an optional [`SchemaLookup`] that
//! validates every path step as it is built. The parsed [`Selector`] and
//! [`ElementCondition`] values are immutable and reusable across threads.
//!
//! ```
//! use select_expr::{Element, NodeRef, ParseContext, QName, evaluate, parse_condition, project};
//!
//! let ctx = ParseContext::new();
//! let root = select_expr::parse_selection("title,category[@term = 'news']", &ctx)?;
//!
//! let entry = Element::new(QName::new("entry"))
//!     .with_child(Element::new(QName::new("title")).with_text("Breaking"))
//!     .with_child(Element::new(QName::new("category")).with_attribute(QName::new("term"), "news"));
//!
//! let partial = project(&root, &entry).expect("something selected");
//! assert_eq!(partial.children.len(), 2);
//!
//! let cond = parse_condition("category/@term = 'news'", &ctx)?;
//! assert!(evaluate(&cond, NodeRef::Element(&entry)));
//! # Ok::<(), select_expr::SelectError>(())
//! ```

pub mod ast;
pub mod element;
pub mod engine;
pub mod error;
mod lexer;
pub mod matchers;
pub mod namespace;
pub mod parser;
pub mod path;
pub mod schema;

pub use ast::{ElementCondition, Literal, Operation, QName, Selector};
pub use element::{Element, NodeRef};
pub use engine::{evaluate, project, resolve};
pub use error::SelectError;
pub use namespace::NamespaceContext;
pub use parser::{ParseContext, ParseMode, parse_condition, parse_selection};
pub use path::{Path, PathStep, StepKind};
pub use schema::{SchemaLookup, StaticSchema, Unvalidated};
