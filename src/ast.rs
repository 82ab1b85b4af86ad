//! Defines the parsed representation of selection expressions: qualified
//! names, comparison operations, typed literals, condition trees, and
//! selectors.

use crate::path::Path;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::fmt;

/// A qualified name: an optional namespace URI plus a local name.
///
/// `*` is a wildcard in either position. A `QName` produced by the parser is
/// a pattern; [`QName::matches`] tests it against the concrete name of an
/// instance node or a schema declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    ns: Option<String>,
    local: String,
}

/// The wildcard name component.
pub const WILDCARD: &str = "*";

impl QName {
    /// A name with no namespace.
    pub fn new(local: impl Into<String>) -> Self {
        QName {
            ns: None,
            local: local.into(),
        }
    }

    /// A name qualified by a namespace URI. Pass [`WILDCARD`] as the URI to
    /// match any namespace.
    pub fn namespaced(ns: impl Into<String>, local: impl Into<String>) -> Self {
        QName {
            ns: Some(ns.into()),
            local: local.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn is_wildcard_local(&self) -> bool {
        self.local == WILDCARD
    }

    pub fn is_wildcard_namespace(&self) -> bool {
        self.ns.as_deref() == Some(WILDCARD)
    }

    /// Tests this name, interpreted as a pattern, against a concrete name.
    /// Wildcards are honored on the pattern side only.
    pub fn matches(&self, concrete: &QName) -> bool {
        let ns_ok = self.is_wildcard_namespace() || self.ns == concrete.ns;
        let local_ok = self.is_wildcard_local() || self.local == concrete.local;
        ns_ok && local_ok
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// A comparison operation between a resolved path value and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operation {
    /// The canonical word form of the comparator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Eq => "eq",
            Operation::Neq => "ne",
            Operation::Gt => "gt",
            Operation::Gte => "gte",
            Operation::Lt => "lt",
            Operation::Lte => "lte",
        }
    }
}

/// A typed right-hand comparison operand, parsed eagerly at parse time.
#[derive(Debug, Clone)]
pub enum Literal {
    String(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::String(a), Literal::String(b)) => a == b,
            // NaN literals are structurally equal so that parsing the same
            // expression twice yields equal ASTs.
            (Literal::Number(a), Literal::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Literal::Date(a), Literal::Date(b)) => a == b,
            (Literal::DateTime(a), Literal::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

/// A boolean predicate over an element or attribute node.
///
/// Conditions are pure: evaluation has no side effects, so the order in which
/// `And`/`Or` operands are evaluated is not observable.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementCondition {
    /// Matches unconditionally.
    All,
    /// Never matches.
    None,
    Not(Box<ElementCondition>),
    And(Box<ElementCondition>, Box<ElementCondition>),
    Or(Box<ElementCondition>, Box<ElementCondition>),
    /// True iff the path resolves to at least one present node.
    Existence(Path),
    /// True iff some node the path resolves to compares true against the
    /// literal under `op`.
    Comparison {
        path: Path,
        op: Operation,
        value: Literal,
    },
}

impl ElementCondition {
    pub fn not(inner: ElementCondition) -> Self {
        ElementCondition::Not(Box::new(inner))
    }

    pub fn and(left: ElementCondition, right: ElementCondition) -> Self {
        ElementCondition::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: ElementCondition, right: ElementCondition) -> Self {
        ElementCondition::Or(Box::new(left), Box::new(right))
    }
}

/// One projection directive: a path, an optional filter condition, and an
/// optional list of nested selectors scoped relative to the path.
///
/// A selector with no nested selectors selects the full subtree at its path;
/// with nested selectors it selects only the named descendants recursively.
/// The parser returns a root selector with an empty path whose nested
/// selectors are the comma-separated list of the expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub path: Path,
    pub condition: Option<ElementCondition>,
    pub sub_selectors: Vec<Selector>,
}

impl Selector {
    pub fn new(path: Path) -> Self {
        Selector {
            path,
            condition: None,
            sub_selectors: Vec::new(),
        }
    }
}
