//! Type-aware comparison of instance text against typed literals.
//!
//! The literal's static type picks the matcher; the instance side is always
//! raw text from the element tree. Instance text that does not parse as the
//! literal's type is a non-match, never an error: for numbers it coerces to
//! NaN (matching native float comparison semantics), for dates and
//! date-times the comparison is simply false.

use crate::ast::{Literal, Operation};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Applies `op` between the resolved instance value and the literal.
pub fn matches(op: Operation, instance: &str, literal: &Literal) -> bool {
    match literal {
        Literal::String(s) => by_ordering(op, instance.cmp(s.as_str())),
        Literal::Number(n) => match_number(op, instance, *n),
        Literal::Date(d) => match NaiveDate::parse_from_str(instance.trim(), "%Y-%m-%d") {
            Ok(v) => by_ordering(op, v.cmp(d)),
            Err(_) => false,
        },
        Literal::DateTime(dt) => match parse_date_time(instance.trim()) {
            Ok(v) => by_ordering(op, v.cmp(dt)),
            Err(_) => false,
        },
    }
}

/// Parses an ISO 8601 date-time, with or without a zone offset. Offset-less
/// values are taken as UTC. Comparison is by instant, so values with
/// different offsets order correctly.
pub fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).or_else(|e| {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| e)
    })
}

/// Numeric comparison per IEEE-754, except that the literal `NaN` is a
/// matchable sentinel: `eq NaN` tests for NaN-ness, `ne NaN` for its
/// absence, and ordering against `NaN` is always false.
fn match_number(op: Operation, instance: &str, literal: f64) -> bool {
    let value: f64 = instance.trim().parse().unwrap_or(f64::NAN);
    if literal.is_nan() {
        return match op {
            Operation::Eq => value.is_nan(),
            Operation::Neq => !value.is_nan(),
            _ => false,
        };
    }
    match op {
        Operation::Eq => value == literal,
        Operation::Neq => value != literal,
        Operation::Gt => value > literal,
        Operation::Gte => value >= literal,
        Operation::Lt => value < literal,
        Operation::Lte => value <= literal,
    }
}

fn by_ordering(op: Operation, ordering: Ordering) -> bool {
    match op {
        Operation::Eq => ordering == Ordering::Equal,
        Operation::Neq => ordering != Ordering::Equal,
        Operation::Gt => ordering == Ordering::Greater,
        Operation::Gte => ordering != Ordering::Less,
        Operation::Lt => ordering == Ordering::Less,
        Operation::Lte => ordering != Ordering::Greater,
    }
}
