//! Token-level `nom` combinators for the selection grammar: names, string
//! and number literals, whitespace handling, and the exact-text keyword
//! predicate.
//!
//! Keywords (`and`, `or`, `not`, `xs`, `date`, ...) are not reserved words:
//! they lex as plain NCNAMEs and only become keywords when the grammar asks
//! for one in operator position, so element and attribute names may legally
//! collide with them.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{opt, recognize},
    sequence::{delimited, pair},
};

/// Why a parse attempt failed at some position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reason {
    /// Ordinary recognition failure; backtrackable through `alt`.
    Nom(nom::error::ErrorKind),
    /// Recognition failure with a human-readable description of what was
    /// expected; raised as `Failure` once the grammar has committed.
    Message(String),
    /// Schema rejected a path step, or a name is structurally invalid.
    Path(String),
    /// A literal's text does not match its declared type.
    Literal(String),
}

/// The error type carried through every combinator, recording the remaining
/// input at the point of failure.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PError<'a> {
    pub input: &'a str,
    pub reason: Reason,
}

impl<'a> PError<'a> {
    pub fn message(input: &'a str, message: impl Into<String>) -> nom::Err<Self> {
        nom::Err::Error(PError {
            input,
            reason: Reason::Message(message.into()),
        })
    }

    pub fn path(input: &'a str, message: impl Into<String>) -> nom::Err<Self> {
        nom::Err::Failure(PError {
            input,
            reason: Reason::Path(message.into()),
        })
    }

    pub fn literal(input: &'a str, message: impl Into<String>) -> nom::Err<Self> {
        nom::Err::Failure(PError {
            input,
            reason: Reason::Literal(message.into()),
        })
    }
}

impl<'a> nom::error::ParseError<&'a str> for PError<'a> {
    fn from_error_kind(input: &'a str, kind: nom::error::ErrorKind) -> Self {
        PError {
            input,
            reason: Reason::Nom(kind),
        }
    }

    fn append(_input: &'a str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

pub(crate) type PResult<'a, O> = IResult<&'a str, O, PError<'a>>;

/// Wraps a parser to consume surrounding whitespace.
pub(crate) fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = PError<'a>>
where
    F: Parser<&'a str, Output = O, Error = PError<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

/// An XML NCNAME: a letter or underscore, then letters, digits, `_`, `-`,
/// and `.`.
pub(crate) fn ncname(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
    ))
    .parse(input)
}

/// A name component in a name test: an NCNAME or the `*` wildcard.
pub(crate) fn name_part(input: &str) -> PResult<'_, &str> {
    alt((tag("*"), ncname)).parse(input)
}

/// A single- or double-quoted string. Unquoting strips the surrounding
/// quotes verbatim; there is no escape processing.
pub(crate) fn string_literal(input: &str) -> PResult<'_, String> {
    alt((
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
    ))
    .parse(input)
    .map(|(rest, s)| (rest, s.to_string()))
}

/// A number literal: optional sign, digits, optional fraction, optional
/// exponent. The value is reparsed from exactly the consumed slice. `NaN`
/// and `INF` are not numbers; they are contextual keywords handled by the
/// grammar.
pub(crate) fn number(input: &str) -> PResult<'_, f64> {
    let (i, _) = opt(one_of("+-")).parse(input)?;
    let (i, _) = digit1(i)?;
    let (i, _) = opt(pair(char('.'), digit0)).parse(i)?;
    let (rest, _) = opt((one_of("eE"), opt(one_of("+-")), digit1)).parse(i)?;
    let text = &input[..input.len() - rest.len()];
    match text.parse() {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(PError::message(input, format!("invalid number '{}'", text))),
    }
}

/// Matches an NCNAME whose exact text is `kw`. Fails (backtrackable) on any
/// other name, which is how contextual keywords are disambiguated from
/// element and attribute names.
pub(crate) fn keyword<'a>(kw: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = PError<'a>> {
    move |input: &'a str| {
        let (rest, name) = ncname(input)?;
        if name == kw {
            Ok((rest, name))
        } else {
            Err(PError::message(input, format!("expected '{}'", kw)))
        }
    }
}
