//! Evaluation of parsed expressions against element trees: path resolution,
//! condition evaluation, and partial-tree projection.

use crate::ast::{ElementCondition, Selector};
use crate::element::{Element, NodeRef};
use crate::matchers;
use crate::path::{Path, PathStep, StepKind};

/// Resolves `path` against a context node, returning every node it reaches.
///
/// Each element step fans out over all matching children, so a path through
/// repeated elements yields one node per instance. The empty path resolves to
/// the context node itself. Paths cannot descend below an attribute, so any
/// step applied to an attribute node resolves to nothing.
pub fn resolve<'a>(path: &Path, context: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let mut current = vec![context];
    for step in path.steps() {
        let mut next = Vec::new();
        for node in current {
            let NodeRef::Element(element) = node else {
                continue;
            };
            match step.kind {
                StepKind::Element => {
                    for child in &element.children {
                        if step.name.matches(&child.name) {
                            next.push(NodeRef::Element(child));
                        }
                    }
                }
                StepKind::Attribute => {
                    for (name, value) in &element.attributes {
                        if step.name.matches(name) {
                            next.push(NodeRef::Attribute { name, value });
                        }
                    }
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }
    current
}

/// Evaluates a condition against a context node.
///
/// Paths inside the condition that resolve to several instances quantify
/// existentially: the condition holds if any instance satisfies it.
pub fn evaluate(condition: &ElementCondition, context: NodeRef<'_>) -> bool {
    match condition {
        ElementCondition::All => true,
        ElementCondition::None => false,
        ElementCondition::Not(inner) => !evaluate(inner, context),
        ElementCondition::And(left, right) => evaluate(left, context) && evaluate(right, context),
        ElementCondition::Or(left, right) => evaluate(left, context) || evaluate(right, context),
        ElementCondition::Existence(path) => !resolve(path, context).is_empty(),
        ElementCondition::Comparison { path, op, value } => resolve(path, context)
            .iter()
            .filter_map(NodeRef::value)
            .any(|instance| matchers::matches(*op, instance, value)),
    }
}

/// Projects an element tree through a selector, keeping only the selected
/// parts.
///
/// Returns the partial copy, or `None` when nothing under `element` is
/// selected. The root selector's own condition is checked against `element`
/// first; its path is ignored (the caller chose the context). A selector with
/// no nested selectors keeps the full subtree at its path; with nested
/// selectors it keeps name and text of elements along the way and recurses.
pub fn project(selector: &Selector, element: &Element) -> Option<Element> {
    if let Some(condition) = &selector.condition
        && !evaluate(condition, NodeRef::Element(element))
    {
        log::trace!("condition rejected element '{}'", element.name);
        return None;
    }
    if selector.sub_selectors.is_empty() {
        return Some(element.clone());
    }
    let walks: Vec<Walk<'_>> = selector
        .sub_selectors
        .iter()
        .map(|s| Walk {
            remaining: s.path.steps(),
            selector: s,
        })
        .collect();
    retain(element, &walks)
}

/// A selector part-way through its path while descending the tree.
#[derive(Clone, Copy)]
struct Walk<'a> {
    remaining: &'a [PathStep],
    selector: &'a Selector,
}

/// Copies the parts of `element` that some walk selects. `None` when no walk
/// selects anything here or below.
fn retain(element: &Element, walks: &[Walk<'_>]) -> Option<Element> {
    let mut kept = Element::new(element.name.clone());
    kept.text = element.text.clone();
    let mut selected = false;

    // Walks whose next step is an attribute of this element select attribute
    // values directly.
    for walk in walks {
        if let [step] = walk.remaining
            && step.kind == StepKind::Attribute
        {
            for (name, value) in &element.attributes {
                if step.name.matches(name)
                    && walk.selector.condition.as_ref().is_none_or(|c| {
                        evaluate(c, NodeRef::Attribute { name, value })
                    })
                    && !kept.attributes.iter().any(|(n, v)| n == name && v == value)
                {
                    kept.attributes.push((name.clone(), value.clone()));
                    selected = true;
                }
            }
        }
    }

    // Each source child is visited once, and every walk that touches it
    // contributes to one union: selectors terminating here restart their
    // sub-selections below the child, walks still descending carry on, and
    // the child is copied at most once.
    for child in &element.children {
        let mut keep_whole = false;
        let mut child_walks: Vec<Walk<'_>> = Vec::new();
        for walk in walks {
            let [step, rest @ ..] = walk.remaining else {
                continue;
            };
            if step.kind != StepKind::Element || !step.name.matches(&child.name) {
                continue;
            }
            if !rest.is_empty() {
                child_walks.push(Walk {
                    remaining: rest,
                    selector: walk.selector,
                });
                continue;
            }
            // Terminal: the selector's condition gates only its own
            // selection of the child.
            let sel = walk.selector;
            if let Some(condition) = &sel.condition
                && !evaluate(condition, NodeRef::Element(child))
            {
                log::trace!("condition rejected element '{}'", child.name);
                continue;
            }
            if sel.sub_selectors.is_empty() {
                keep_whole = true;
            } else {
                child_walks.extend(sel.sub_selectors.iter().map(|s| Walk {
                    remaining: s.path.steps(),
                    selector: s,
                }));
            }
        }
        if keep_whole {
            kept.children.push(child.clone());
            selected = true;
        } else if !child_walks.is_empty()
            && let Some(projected) = retain(child, &child_walks)
        {
            kept.children.push(projected);
            selected = true;
        }
    }

    if selected { Some(kept) } else { None }
}
