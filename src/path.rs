//! Paths: ordered, schema-validated sequences of element/attribute steps
//! from a context element.

use crate::ast::QName;
use crate::error::SelectError;
use crate::schema::SchemaLookup;
use std::fmt;

/// The kind of node a path step addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Element,
    Attribute,
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub kind: StepKind,
    pub name: QName,
}

impl PathStep {
    pub fn element(name: QName) -> Self {
        PathStep {
            kind: StepKind::Element,
            name,
        }
    }

    pub fn attribute(name: QName) -> Self {
        PathStep {
            kind: StepKind::Attribute,
            name,
        }
    }
}

/// An immutable path relative to a context element.
///
/// Steps are validated against the declared schema as the path is built, not
/// deferred to evaluation. The empty path selects the context node itself.
/// An attribute step terminates the path: nothing may follow it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    steps: Vec<PathStep>,
    selects_attribute: bool,
    /// Type key of the element the path lands on, when built against a
    /// schema. Seeds validation of nested paths scoped below this one.
    selected_type: Option<String>,
}

impl Path {
    /// The empty path: selects the context element itself.
    pub fn root() -> Self {
        Path::default()
    }

    /// The empty path scoped to a known element type.
    pub fn root_of(selected_type: impl Into<String>) -> Self {
        Path {
            selected_type: Some(selected_type.into()),
            ..Path::default()
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the path ends on an attribute step.
    pub fn selects_attribute(&self) -> bool {
        self.selects_attribute
    }

    /// Type key of the element selected by the path, when known.
    pub fn selected_type(&self) -> Option<&str> {
        self.selected_type.as_deref()
    }

    /// Starts a builder for a path scoped below this one: validation resumes
    /// from the element type this path selects.
    pub fn build_from<'s>(&self, schema: &'s dyn SchemaLookup) -> Builder<'s> {
        Builder {
            schema,
            current_type: self.selected_type.clone(),
            from_attribute: self.selects_attribute,
            steps: Vec::new(),
            selects_attribute: false,
        }
    }

    /// Starts a builder relative to an optional root element type. With
    /// `None`, steps are accepted without schema validation.
    pub fn builder<'s>(schema: &'s dyn SchemaLookup, root_type: Option<&str>) -> Builder<'s> {
        Builder {
            schema,
            current_type: root_type.map(str::to_owned),
            from_attribute: false,
            steps: Vec::new(),
            selects_attribute: false,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, ".");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            if step.kind == StepKind::Attribute {
                write!(f, "@")?;
            }
            write!(f, "{}", step.name)?;
        }
        Ok(())
    }
}

/// Incremental path construction with per-step schema validation.
///
/// `add_if_element`/`add_if_attribute` return `Ok(false)` when the schema
/// declares no matching child of that kind, and `Err` when the step is
/// structurally invalid (extending an attribute path).
pub struct Builder<'s> {
    schema: &'s dyn SchemaLookup,
    /// Element type at the tip of the path; `None` means unvalidated.
    current_type: Option<String>,
    /// True when the builder is scoped below an attribute path, in which
    /// case no step at all may be added.
    from_attribute: bool,
    steps: Vec<PathStep>,
    selects_attribute: bool,
}

impl<'s> Builder<'s> {
    /// Attempts to extend the path by an element step.
    pub fn add_if_element(&mut self, name: QName) -> Result<bool, SelectError> {
        self.check_extensible(&name)?;
        if let Some(ty) = self.current_type.take() {
            let Some(child_type) = self.schema.child_element(&ty, &name) else {
                self.current_type = Some(ty);
                return Ok(false);
            };
            self.current_type = Some(child_type);
        }
        self.steps.push(PathStep::element(name));
        Ok(true)
    }

    /// Attempts to extend the path by an attribute step.
    pub fn add_if_attribute(&mut self, name: QName) -> Result<bool, SelectError> {
        self.check_extensible(&name)?;
        if let Some(ty) = &self.current_type
            && !self.schema.has_attribute(ty, &name)
        {
            return Ok(false);
        }
        self.steps.push(PathStep::attribute(name));
        self.selects_attribute = true;
        Ok(true)
    }

    fn check_extensible(&self, name: &QName) -> Result<(), SelectError> {
        if self.from_attribute || self.selects_attribute {
            return Err(SelectError::Path(format!(
                "cannot add step '{}' after an attribute step",
                name
            )));
        }
        Ok(())
    }

    /// Finalizes the accumulated steps into an immutable [`Path`].
    pub fn build(self) -> Path {
        Path {
            steps: self.steps,
            selects_attribute: self.selects_attribute,
            selected_type: if self.selects_attribute {
                None
            } else {
                self.current_type
            },
        }
    }
}
