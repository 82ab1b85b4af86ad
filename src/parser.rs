//! The selection-expression grammar, written as `nom` ordered-choice
//! recursive descent.
//!
//! Two entry points mirror the two textual grammars: [`parse_selection`] for
//! full selection expressions (`field1,field2[cond](sub1,sub2),@attr` with
//! optional leading `xmlns` declarations) and [`parse_condition`] for a
//! standalone condition expression. Both are pure functions over an explicit
//! [`ParseContext`]; nothing is shared across parses.
//!
//! Ambiguity between contextual keywords and path names is resolved by
//! ordered choice with bounded lookahead: keyword alternatives are tried
//! first and backtrack freely until a committing token (`not(`, `xs:date(`,
//! an opening bracket, a comparator) has been consumed, after which failures
//! are fatal. Path validation failures and malformed typed literals are
//! always fatal, never backtracked.

use crate::ast::{ElementCondition, Literal, Operation, QName, Selector, WILDCARD};
use crate::error::SelectError;
use crate::lexer::{PError, PResult, Reason, keyword, name_part, ncname, number, string_literal, ws};
use crate::namespace::NamespaceContext;
use crate::path::{Builder, Path};
use crate::schema::{SchemaLookup, Unvalidated};
use chrono::NaiveDate;
use nom::{
    Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, opt},
    sequence::preceded,
};

/// How qualified names and attribute markers in the expression text are
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Namespace-prefixed steps; `@` required for attribute steps.
    #[default]
    Xml,
    /// No namespace prefixes; `@` is optional, and an element step that the
    /// schema rejects is retried as an attribute step.
    Json,
}

const DEFAULT_MAX_DEPTH: usize = 32;

static UNVALIDATED: Unvalidated = Unvalidated;

/// Everything a parse needs, fixed up front: parse mode, the root element
/// type paths are validated against, seed namespace bindings, the schema
/// oracle, and the condition nesting cap.
///
/// With no root type, path steps are accepted without schema validation
/// (syntax-only mode). Inline `xmlns` declarations extend a per-parse copy
/// of the seed bindings and are discarded when the parse completes.
pub struct ParseContext<'s> {
    mode: ParseMode,
    root_type: Option<String>,
    bindings: NamespaceContext,
    schema: &'s dyn SchemaLookup,
    max_depth: usize,
}

impl ParseContext<'static> {
    /// A context with no schema validation.
    pub fn new() -> Self {
        ParseContext {
            mode: ParseMode::default(),
            root_type: None,
            bindings: NamespaceContext::new(),
            schema: &UNVALIDATED,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for ParseContext<'static> {
    fn default() -> Self {
        ParseContext::new()
    }
}

impl<'s> ParseContext<'s> {
    /// A context that validates paths against `schema`, starting from the
    /// element type `root_type`.
    pub fn with_schema(schema: &'s dyn SchemaLookup, root_type: impl Into<String>) -> Self {
        ParseContext {
            mode: ParseMode::default(),
            root_type: Some(root_type.into()),
            bindings: NamespaceContext::new(),
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seeds a namespace binding available to every parse under this
    /// context (e.g. the application's default namespace).
    pub fn with_binding(mut self, alias: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bindings.add(alias, uri);
        self
    }

    /// Caps condition nesting (parentheses and `not(...)`) so pathological
    /// expressions fail predictably instead of exhausting the stack.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn root_path(&self) -> Path {
        match &self.root_type {
            Some(ty) => Path::root_of(ty.clone()),
            None => Path::root(),
        }
    }
}

/// Parses a full selection expression into a root [`Selector`] whose nested
/// selectors are the comma-separated list of the expression. An expression
/// that is empty (after namespace declarations) selects everything: the root
/// selector has no sub-selectors.
pub fn parse_selection(text: &str, ctx: &ParseContext<'_>) -> Result<Selector, SelectError> {
    let mut namespaces = ctx.bindings.clone();
    let mut rest = text.trim();

    // Leading namespace declarations. A field that merely starts like one
    // (an element named `xmlns`) fails before the declaration commits and
    // falls through to the selector list.
    loop {
        match namespace_declaration(rest) {
            Ok((r, (alias, uri))) => {
                namespaces.add(alias, uri);
                rest = r;
            }
            Err(nom::Err::Failure(e)) => return Err(to_error(text, e)),
            Err(_) => break,
        }
    }

    let grammar = Grammar {
        mode: ctx.mode,
        schema: ctx.schema,
        namespaces,
        max_depth: ctx.max_depth,
    };
    let root = ctx.root_path();

    let mut selector = Selector::new(root.clone());
    if !rest.trim().is_empty() {
        let (rem, subs) = finish(text, grammar.selectors(rest, &root))?;
        expect_eof(text, rem)?;
        selector.sub_selectors = subs;
    }
    log::debug!(
        "parsed selection '{}': {} selector(s)",
        text,
        selector.sub_selectors.len()
    );
    Ok(selector)
}

/// Parses a standalone condition expression (the grammar used inside
/// `[...]`), relative to the context's root element type.
pub fn parse_condition(text: &str, ctx: &ParseContext<'_>) -> Result<ElementCondition, SelectError> {
    let grammar = Grammar {
        mode: ctx.mode,
        schema: ctx.schema,
        namespaces: ctx.bindings.clone(),
        max_depth: ctx.max_depth,
    };
    let root = ctx.root_path();
    let (rem, condition) = finish(text, grammar.or_expr(text.trim(), &root, 0))?;
    expect_eof(text, rem)?;
    Ok(condition)
}

fn finish<'i, O>(expression: &str, result: PResult<'i, O>) -> Result<(&'i str, O), SelectError> {
    result.map_err(|err| match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => to_error(expression, e),
        nom::Err::Incomplete(_) => SelectError::Syntax(
            expression.to_string(),
            "unexpected end of input".to_string(),
        ),
    })
}

fn expect_eof(expression: &str, remainder: &str) -> Result<(), SelectError> {
    if remainder.trim().is_empty() {
        Ok(())
    } else {
        Err(SelectError::Syntax(
            expression.to_string(),
            format!(
                "parser did not consume all input, remainder: '{}'",
                remainder.trim()
            ),
        ))
    }
}

fn to_error(expression: &str, e: PError<'_>) -> SelectError {
    let at = if e.input.trim().is_empty() {
        "end of input".to_string()
    } else {
        let token: String = e.input.trim_start().chars().take(24).collect();
        format!("'{}'", token)
    };
    match e.reason {
        Reason::Path(m) => SelectError::Path(m),
        Reason::Literal(m) => SelectError::Literal(m),
        Reason::Message(m) => {
            SelectError::Syntax(expression.to_string(), format!("{} at {}", m, at))
        }
        Reason::Nom(_) => {
            SelectError::Syntax(expression.to_string(), format!("unexpected token at {}", at))
        }
    }
}

/// Escalates a backtrackable recognition error into a fatal one; applied
/// after the grammar has committed to a production.
fn commit<O>(result: PResult<'_, O>) -> PResult<'_, O> {
    result.map_err(|err| match err {
        nom::Err::Error(e) => nom::Err::Failure(e),
        other => other,
    })
}

fn expect<'i, O>(result: PResult<'i, O>, what: &str) -> PResult<'i, O> {
    result.map_err(|err| match err {
        nom::Err::Error(e) => nom::Err::Failure(PError {
            input: e.input,
            reason: Reason::Message(format!("expected {}", what)),
        }),
        other => other,
    })
}

/// `xmlns (':' NCNAME)? '=' STRING`. Backtrackable until `=` is seen.
fn namespace_declaration(input: &str) -> PResult<'_, (String, String)> {
    let (i, _) = ws(keyword("xmlns")).parse(input)?;
    let (i, alias) = opt(preceded(ws(char(':')), ncname)).parse(i)?;
    let (i, _) = ws(char('=')).parse(i)?;
    let (i, uri) = expect(ws(string_literal).parse(i), "a quoted namespace URI")?;
    Ok((i, (alias.unwrap_or("").to_string(), uri)))
}

/// The grammar proper: immutable per-parse state threaded through the rule
/// methods. The current path scope is passed explicitly so that conditions
/// and nested selectors validate relative to the selector they follow.
struct Grammar<'c> {
    mode: ParseMode,
    schema: &'c dyn SchemaLookup,
    namespaces: NamespaceContext,
    max_depth: usize,
}

impl<'c> Grammar<'c> {
    /// `selector (',' selector)*`
    fn selectors<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, Vec<Selector>> {
        let (mut rest, first) = self.selector(input, scope)?;
        let mut out = vec![first];
        while let Ok((r, _)) = ws(char(',')).parse(rest) {
            let (r, next) = expect(self.selector(r, scope), "a selector after ','")?;
            out.push(next);
            rest = r;
        }
        Ok((rest, out))
    }

    /// `selectionPathExpr ('[' orExpr ']')? ('(' selectors ')')?`
    fn selector<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, Selector> {
        let (i, path) = self.selection_path(input, scope)?;

        let (i, condition) = match ws(char('[')).parse(i) {
            Ok((r, _)) => {
                let (r, cond) = commit(self.or_expr(r, &path, 0))?;
                let (r, _) = expect(ws(char(']')).parse(r), "']'")?;
                (r, Some(cond))
            }
            Err(_) => (i, None),
        };

        let (i, sub_selectors) = match ws(char('(')).parse(i) {
            Ok((r, _)) => {
                let (r, subs) = commit(self.selectors(r, &path))?;
                let (r, _) = expect(ws(char(')')).parse(r), "')'")?;
                (r, subs)
            }
            Err(_) => (i, Vec::new()),
        };

        Ok((
            i,
            Selector {
                path,
                condition,
                sub_selectors,
            },
        ))
    }

    /// `andExpr ('or' andExpr)*`
    fn or_expr<'i>(&self, input: &'i str, scope: &Path, depth: usize) -> PResult<'i, ElementCondition> {
        let (mut rest, mut value) = self.and_expr(input, scope, depth)?;
        while let Ok((r, _)) = ws(keyword("or")).parse(rest) {
            let (r, right) = expect(self.and_expr(r, scope, depth), "a condition after 'or'")?;
            value = ElementCondition::or(value, right);
            rest = r;
        }
        Ok((rest, value))
    }

    /// `finalExpr ('and' finalExpr)*`
    fn and_expr<'i>(&self, input: &'i str, scope: &Path, depth: usize) -> PResult<'i, ElementCondition> {
        let (mut rest, mut value) = self.final_expr(input, scope, depth)?;
        while let Ok((r, _)) = ws(keyword("and")).parse(rest) {
            let (r, right) = expect(self.final_expr(r, scope, depth), "a condition after 'and'")?;
            value = ElementCondition::and(value, right);
            rest = r;
        }
        Ok((rest, value))
    }

    /// `'not' '(' orExpr ')' | 'true' '(' ')' | 'false' '(' ')'
    ///  | '(' orExpr ')' | comparisonOrExistenceExpr`
    ///
    /// The keyword alternatives only commit once their `(` is seen, so
    /// elements named `not`, `true`, or `false` still work as paths.
    fn final_expr<'i>(&self, input: &'i str, scope: &Path, depth: usize) -> PResult<'i, ElementCondition> {
        if depth >= self.max_depth {
            return Err(nom::Err::Failure(PError {
                input,
                reason: Reason::Message(format!(
                    "condition nesting exceeds {} levels",
                    self.max_depth
                )),
            }));
        }

        if let Ok((r, _)) = (ws(keyword("not")), ws(char('('))).parse(input) {
            let (r, inner) = commit(self.or_expr(r, scope, depth + 1))?;
            let (r, _) = expect(ws(char(')')).parse(r), "')'")?;
            return Ok((r, ElementCondition::not(inner)));
        }
        if let Ok((r, _)) = (ws(keyword("true")), ws(char('('))).parse(input) {
            let (r, _) = expect(ws(char(')')).parse(r), "')'")?;
            return Ok((r, ElementCondition::All));
        }
        if let Ok((r, _)) = (ws(keyword("false")), ws(char('('))).parse(input) {
            let (r, _) = expect(ws(char(')')).parse(r), "')'")?;
            return Ok((r, ElementCondition::None));
        }
        if let Ok((r, _)) = ws(char('(')).parse(input) {
            let (r, inner) = commit(self.or_expr(r, scope, depth + 1))?;
            let (r, _) = expect(ws(char(')')).parse(r), "')'")?;
            return Ok((r, inner));
        }
        self.comparison_or_existence(input, scope)
    }

    /// `dateOrDateTimeComparison | otherComparison`
    fn comparison_or_existence<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, ElementCondition> {
        match self.date_comparison(input, scope) {
            Ok(ok) => Ok(ok),
            Err(nom::Err::Failure(e)) => Err(nom::Err::Failure(e)),
            Err(_) => self.other_comparison(input, scope),
        }
    }

    /// `'xs' ':' ('date'|'dateTime') '(' predicateExpr ')' comparator
    ///  'xs' ':' <same> '(' STRING ')'`
    ///
    /// The right-hand literal is parsed eagerly; a lexically invalid date or
    /// date-time is a parse error, not an evaluation-time mismatch.
    fn date_comparison<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, ElementCondition> {
        let (i, _) = ws(keyword("xs")).parse(input)?;
        let (i, _) = ws(char(':')).parse(i)?;
        let (i, is_date_time) = alt((
            map(keyword("dateTime"), |_| true),
            map(keyword("date"), |_| false),
        ))
        .parse(i)?;
        let type_name = if is_date_time { "xs:dateTime" } else { "xs:date" };
        // Committed from the opening parenthesis on: nothing else in the
        // grammar starts with `xs:date(`.
        let (i, _) = ws(char('(')).parse(i)?;
        let (i, path) = commit(self.predicate_expr(i, scope))?;
        let (i, _) = expect(ws(char(')')).parse(i), "')'")?;
        let (i, op) = expect(self.comparator(i), "a comparator")?;
        let (i, _) = expect(ws(keyword("xs")).parse(i), type_name)?;
        let (i, _) = expect(ws(char(':')).parse(i), type_name)?;
        let (i, _) = expect(
            ws(keyword(if is_date_time { "dateTime" } else { "date" })).parse(i),
            type_name,
        )?;
        let (i, _) = expect(ws(char('(')).parse(i), "'('")?;
        let literal_input = i;
        let (i, text) = expect(ws(string_literal).parse(i), "a quoted literal")?;
        let (i, _) = expect(ws(char(')')).parse(i), "')'")?;

        let value = if is_date_time {
            match crate::matchers::parse_date_time(&text) {
                Ok(dt) => Literal::DateTime(dt),
                Err(_) => {
                    return Err(PError::literal(
                        literal_input,
                        format!("invalid xs:dateTime literal '{}'", text),
                    ));
                }
            }
        } else {
            match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(d) => Literal::Date(d),
                Err(_) => {
                    return Err(PError::literal(
                        literal_input,
                        format!("invalid xs:date literal '{}'", text),
                    ));
                }
            }
        };

        Ok((i, ElementCondition::Comparison { path, op, value }))
    }

    /// `predicateExpr (comparator (STRING | NUMBER | 'NaN' | 'INF'))?`
    ///
    /// With no comparator this is an existence test.
    fn other_comparison<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, ElementCondition> {
        let (i, path) = self.predicate_expr(input, scope)?;
        match self.comparator(i) {
            Ok((r, op)) => {
                let (r, value) = expect(self.comparison_literal(r), "a literal after comparator")?;
                Ok((r, ElementCondition::Comparison { path, op, value }))
            }
            Err(nom::Err::Failure(e)) => Err(nom::Err::Failure(e)),
            Err(_) => Ok((i, ElementCondition::Existence(path))),
        }
    }

    fn comparison_literal<'i>(&self, input: &'i str) -> PResult<'i, Literal> {
        ws(alt((
            map(string_literal, Literal::String),
            map(number, Literal::Number),
            map(keyword("NaN"), |_| Literal::Number(f64::NAN)),
            map(keyword("INF"), |_| Literal::Number(f64::INFINITY)),
        )))
        .parse(input)
    }

    /// Word or symbol comparators are interchangeable.
    fn comparator<'i>(&self, input: &'i str) -> PResult<'i, Operation> {
        ws(alt((
            map(keyword("eq"), |_| Operation::Eq),
            map(keyword("ne"), |_| Operation::Neq),
            map(keyword("gte"), |_| Operation::Gte),
            map(keyword("gt"), |_| Operation::Gt),
            map(keyword("lte"), |_| Operation::Lte),
            map(keyword("lt"), |_| Operation::Lt),
            map(tag("!="), |_| Operation::Neq),
            map(tag("="), |_| Operation::Eq),
            map(tag(">="), |_| Operation::Gte),
            map(tag(">"), |_| Operation::Gt),
            map(tag("<="), |_| Operation::Lte),
            map(tag("<"), |_| Operation::Lt),
        )))
        .parse(input)
    }

    /// `selectionPathExpr | 'text' '(' ')'`
    ///
    /// `text()` yields the empty path: the node's own textual value.
    fn predicate_expr<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, Path> {
        if let Ok((r, _)) = (ws(keyword("text")), ws(char('(')), ws(char(')'))).parse(input) {
            return Ok((r, scope.build_from(self.schema).build()));
        }
        self.selection_path(input, scope)
    }

    /// `pathStep ('/' pathStep)*`, each step validated as it is added.
    fn selection_path<'i>(&self, input: &'i str, scope: &Path) -> PResult<'i, Path> {
        let mut builder = scope.build_from(self.schema);
        let (mut rest, _) = self.path_step(input, &mut builder)?;
        while let Ok((r, _)) = ws(char('/')).parse(rest) {
            let (r, _) = commit(self.path_step(r, &mut builder))?;
            rest = r;
        }
        Ok((rest, builder.build()))
    }

    /// `'@'? nameTest`
    fn path_step<'i>(&self, input: &'i str, builder: &mut Builder<'_>) -> PResult<'i, ()> {
        let (i, at) = opt(ws(char('@'))).parse(input)?;
        let is_attribute = at.is_some();
        let (rest, (prefix, local)) = self.name_test(i)?;
        let name = self.build_qname(i, prefix, local, is_attribute)?;

        let added = if is_attribute {
            add_or_fail(i, builder.add_if_attribute(name.clone()))?
        } else {
            let mut added = add_or_fail(i, builder.add_if_element(name.clone()))?;
            if !added && self.mode == ParseMode::Json {
                // JSON has no element/attribute distinction, so the '@'
                // marker is optional: retry the rejected step as an
                // attribute.
                added = add_or_fail(i, builder.add_if_attribute(name.clone()))?;
            }
            added
        };
        if !added {
            return Err(PError::path(i, format!("invalid path step: {}", name)));
        }
        Ok((rest, ()))
    }

    /// `('*'|NCNAME) (':' ('*'|NCNAME))?`, purely lexical; resolution to a
    /// [`QName`] happens in `build_qname`.
    fn name_test<'i>(&self, input: &'i str) -> PResult<'i, (Option<&'i str>, &'i str)> {
        let (i, left) = ws(name_part).parse(input)?;
        let (i, right) = opt(preceded(ws(char(':')), name_part)).parse(i)?;
        Ok((
            i,
            match right {
                Some(r) => (Some(left), r),
                None => (None, left),
            },
        ))
    }

    fn build_qname<'i>(
        &self,
        input: &'i str,
        prefix: Option<&str>,
        local: &str,
        is_attribute: bool,
    ) -> Result<QName, nom::Err<PError<'i>>> {
        match prefix {
            Some(alias) => {
                if self.mode == ParseMode::Json {
                    return Err(PError::path(
                        input,
                        format!(
                            "namespace prefixes are not used in JSON parse mode: {}:{}",
                            alias, local
                        ),
                    ));
                }
                if alias == WILDCARD {
                    return Ok(QName::namespaced(WILDCARD, local));
                }
                match self.namespaces.resolve(alias) {
                    Some(uri) => Ok(QName::namespaced(uri, local)),
                    None => Err(PError::path(
                        input,
                        format!("undeclared namespace alias '{}'", alias),
                    )),
                }
            }
            None => {
                // The default namespace applies to unprefixed element names
                // in XML mode; attribute names never take it.
                if self.mode == ParseMode::Xml && !is_attribute {
                    if let Some(uri) = self.namespaces.default_namespace() {
                        return Ok(QName::namespaced(uri, local));
                    }
                }
                Ok(QName::new(local))
            }
        }
    }
}

fn add_or_fail<'i>(input: &'i str, result: Result<bool, SelectError>) -> Result<bool, nom::Err<PError<'i>>> {
    result.map_err(|e| PError::path(input, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::StepKind;
    use crate::schema::StaticSchema;

    fn feed_schema() -> StaticSchema {
        let mut schema = StaticSchema::new();
        schema
            .add_element("entry", QName::new("title"), "text")
            .add_element("entry", QName::new("published"), "dateTime")
            .add_element("entry", QName::new("category"), "category")
            .add_element(
                "entry",
                QName::namespaced("http://search.yahoo.com/mrss/", "group"),
                "media.group",
            )
            .add_element(
                "media.group",
                QName::namespaced("http://gdata.youtube.com/schemas/2007", "duration"),
                "yt.duration",
            )
            .add_element("entry", QName::new("link"), "link")
            .add_attribute("link", QName::new("href"))
            .add_attribute("category", QName::new("term"));
        schema
    }

    fn ctx(schema: &StaticSchema) -> ParseContext<'_> {
        ParseContext::with_schema(schema, "entry")
            .with_binding("media", "http://search.yahoo.com/mrss/")
            .with_binding("yt", "http://gdata.youtube.com/schemas/2007")
    }

    #[test]
    fn test_single_field_selector() {
        let schema = feed_schema();
        let root = parse_selection("title", &ctx(&schema)).unwrap();
        assert!(root.path.is_root());
        assert_eq!(root.sub_selectors.len(), 1);
        let sel = &root.sub_selectors[0];
        assert_eq!(sel.path.to_string(), "title");
        assert!(sel.condition.is_none());
        assert!(sel.sub_selectors.is_empty());
    }

    #[test]
    fn test_comma_separated_selectors_with_attribute() {
        let schema = feed_schema();
        let root = parse_selection("title,link(@href)", &ctx(&schema)).unwrap();
        assert_eq!(root.sub_selectors.len(), 2);
        let link = &root.sub_selectors[1];
        assert_eq!(link.sub_selectors.len(), 1);
        let href = &link.sub_selectors[0];
        assert_eq!(href.path.steps()[0].kind, StepKind::Attribute);
        assert!(href.path.selects_attribute());
    }

    #[test]
    fn test_prefixed_path_with_condition() {
        let schema = feed_schema();
        let root = parse_selection("media:group[yt:duration > 60]", &ctx(&schema)).unwrap();
        let sel = &root.sub_selectors[0];
        assert_eq!(
            sel.path.steps()[0].name,
            QName::namespaced("http://search.yahoo.com/mrss/", "group")
        );
        match sel.condition.as_ref().unwrap() {
            ElementCondition::Comparison { path, op, value } => {
                assert_eq!(
                    path.steps()[0].name,
                    QName::namespaced("http://gdata.youtube.com/schemas/2007", "duration")
                );
                assert_eq!(*op, Operation::Gt);
                assert_eq!(*value, Literal::Number(60.0));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_namespace_declarations() {
        let schema = feed_schema();
        let ctx = ParseContext::with_schema(&schema, "entry");
        let root = parse_selection(
            "xmlns:m=\"http://search.yahoo.com/mrss/\" m:group",
            &ctx,
        )
        .unwrap();
        assert_eq!(
            root.sub_selectors[0].path.steps()[0].name,
            QName::namespaced("http://search.yahoo.com/mrss/", "group")
        );
        // Inline declarations do not leak into later parses.
        assert!(matches!(
            parse_selection("m:group", &ctx),
            Err(SelectError::Path(_))
        ));
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let mut schema = StaticSchema::new();
        schema
            .add_element("entry", QName::namespaced("urn:atom", "link"), "link")
            .add_attribute("link", QName::new("href"));
        let ctx = ParseContext::with_schema(&schema, "entry").with_binding("", "urn:atom");
        let root = parse_selection("link/@href", &ctx).unwrap();
        let steps = root.sub_selectors[0].path.steps();
        assert_eq!(steps[0].name, QName::namespaced("urn:atom", "link"));
        assert_eq!(steps[1].name, QName::new("href"));
    }

    #[test]
    fn test_undeclared_step_is_a_path_error() {
        let schema = feed_schema();
        let err = parse_selection("nonexistent", &ctx(&schema)).unwrap_err();
        assert!(matches!(err, SelectError::Path(_)), "got {:?}", err);
    }

    #[test]
    fn test_undeclared_alias_is_a_path_error() {
        let schema = feed_schema();
        let err = parse_selection("bogus:group", &ctx(&schema)).unwrap_err();
        assert!(matches!(err, SelectError::Path(_)));
    }

    #[test]
    fn test_unterminated_bracket_is_a_syntax_error_at_eof() {
        let schema = feed_schema();
        let err = parse_selection("title[", &ctx(&schema)).unwrap_err();
        match err {
            SelectError::Syntax(_, message) => {
                assert!(message.contains("end of input"), "message: {}", message)
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_is_a_syntax_error() {
        let schema = feed_schema();
        let err = parse_selection("title ]", &ctx(&schema)).unwrap_err();
        assert!(matches!(err, SelectError::Syntax(..)));
    }

    #[test]
    fn test_not_true_parses_to_not_all() {
        let cond = parse_condition("not(true())", &ParseContext::new()).unwrap();
        assert_eq!(
            cond,
            ElementCondition::Not(Box::new(ElementCondition::All))
        );
        let cond = parse_condition("false()", &ParseContext::new()).unwrap();
        assert_eq!(cond, ElementCondition::None);
    }

    #[test]
    fn test_keywords_are_contextual() {
        // Elements named like keywords still work in path position.
        let cond = parse_condition("not and true", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::And(l, r) => {
                assert!(matches!(*l, ElementCondition::Existence(_)));
                assert!(matches!(*r, ElementCondition::Existence(_)));
            }
            other => panic!("expected and, got {:?}", other),
        }
        let sel = parse_selection("text", &ParseContext::new()).unwrap();
        assert_eq!(sel.sub_selectors[0].path.to_string(), "text");
    }

    #[test]
    fn test_or_and_precedence() {
        // a or b and c == Or(a, And(b, c))
        let cond = parse_condition("a or b and c", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Or(_, right) => {
                assert!(matches!(*right, ElementCondition::And(..)));
            }
            other => panic!("expected or at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_existence_by_omission_and_text_self_path() {
        let cond = parse_condition("category", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Existence(path) => assert_eq!(path.to_string(), "category"),
            other => panic!("expected existence, got {:?}", other),
        }
        let cond = parse_condition("text() = 'Foo'", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Comparison { path, op, value } => {
                assert!(path.is_root());
                assert_eq!(op, Operation::Eq);
                assert_eq!(value, Literal::String("Foo".to_string()));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_comparator_aliases() {
        for (expr, op) in [
            ("a eq '1'", Operation::Eq),
            ("a = '1'", Operation::Eq),
            ("a ne '1'", Operation::Neq),
            ("a != '1'", Operation::Neq),
            ("a gt '1'", Operation::Gt),
            ("a > '1'", Operation::Gt),
            ("a gte '1'", Operation::Gte),
            ("a >= '1'", Operation::Gte),
            ("a lt '1'", Operation::Lt),
            ("a < '1'", Operation::Lt),
            ("a lte '1'", Operation::Lte),
            ("a <= '1'", Operation::Lte),
        ] {
            let cond = parse_condition(expr, &ParseContext::new()).unwrap();
            match cond {
                ElementCondition::Comparison { op: parsed, .. } => {
                    assert_eq!(parsed, op, "expr: {}", expr)
                }
                other => panic!("expected comparison for {}, got {:?}", expr, other),
            }
        }
    }

    #[test]
    fn test_fractional_literal_kept_exact() {
        let cond = parse_condition("duration > 60.5", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Comparison { value, .. } => {
                assert_eq!(value, Literal::Number(60.5))
            }
            other => panic!("expected comparison, got {:?}", other),
        }
        let cond = parse_condition("rating eq -2.25e1", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Comparison { value, .. } => {
                assert_eq!(value, Literal::Number(-22.5))
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_and_inf_literals() {
        let cond = parse_condition("a ne NaN", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Comparison { value, .. } => {
                assert_eq!(value, Literal::Number(f64::NAN))
            }
            other => panic!("expected comparison, got {:?}", other),
        }
        let cond = parse_condition("a lt INF", &ParseContext::new()).unwrap();
        match cond {
            ElementCondition::Comparison { value, .. } => {
                assert_eq!(value, Literal::Number(f64::INFINITY))
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_date_comparison_literal_is_parsed_eagerly() {
        let schema = feed_schema();
        let cond = parse_condition(
            "xs:date(published) gte xs:date(\"2020-01-01\")",
            &ctx(&schema),
        )
        .unwrap();
        match cond {
            ElementCondition::Comparison { op, value, .. } => {
                assert_eq!(op, Operation::Gte);
                assert!(matches!(value, Literal::Date(_)));
            }
            other => panic!("expected comparison, got {:?}", other),
        }

        let err = parse_condition(
            "xs:date(published) eq xs:date(\"not-a-date\")",
            &ctx(&schema),
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::Literal(_)), "got {:?}", err);
    }

    #[test]
    fn test_date_time_comparison() {
        let cond = parse_condition(
            "xs:dateTime(updated) lt xs:dateTime(\"2021-03-04T05:06:07Z\")",
            &ParseContext::new(),
        )
        .unwrap();
        match cond {
            ElementCondition::Comparison { value, .. } => {
                assert!(matches!(value, Literal::DateTime(_)))
            }
            other => panic!("expected comparison, got {:?}", other),
        }
        // Mixing the two type names is a syntax error.
        assert!(
            parse_condition(
                "xs:date(updated) lt xs:dateTime(\"2021-03-04T05:06:07Z\")",
                &ParseContext::new(),
            )
            .is_err()
        );
    }

    #[test]
    fn test_json_mode_attribute_fallback_and_prefix_rejection() {
        let schema = feed_schema();
        let json = ParseContext::with_schema(&schema, "entry").with_mode(ParseMode::Json);
        // `term` is declared only as an attribute of `category`; without the
        // '@' marker it still parses in JSON mode.
        let root = parse_selection("category/term", &json).unwrap();
        let steps = root.sub_selectors[0].path.steps();
        assert_eq!(steps[1].kind, StepKind::Attribute);

        assert!(matches!(
            parse_selection("media:group", &json),
            Err(SelectError::Path(_))
        ));
    }

    #[test]
    fn test_wildcard_steps() {
        let schema = feed_schema();
        let root = parse_selection("*", &ctx(&schema)).unwrap();
        assert!(root.sub_selectors[0].path.steps()[0].name.is_wildcard_local());

        let root = parse_selection("*:group", &ctx(&schema)).unwrap();
        assert!(root.sub_selectors[0].path.steps()[0].name.is_wildcard_namespace());
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let ctx = ParseContext::new().with_max_depth(8);
        let expr = format!("{}a{}", "not(".repeat(20), ")".repeat(20));
        let err = parse_condition(&expr, &ctx).unwrap_err();
        assert!(matches!(err, SelectError::Syntax(..)));
    }

    #[test]
    fn test_empty_selection_selects_everything() {
        let root = parse_selection("", &ParseContext::new()).unwrap();
        assert!(root.sub_selectors.is_empty());
        assert!(root.path.is_root());
    }

    #[test]
    fn test_round_trip_parse_stability() {
        let schema = feed_schema();
        let exprs = [
            "title",
            "title,link(@href)",
            "media:group[yt:duration > 60]",
            "category[@term = 'news' and not(text() = 'x')]",
            "published[xs:date(text()) gte xs:date('2020-01-01')]",
        ];
        for expr in exprs {
            let a = parse_selection(expr, &ctx(&schema)).unwrap();
            let b = parse_selection(expr, &ctx(&schema)).unwrap();
            assert_eq!(a, b, "expr: {}", expr);
        }
    }

    #[test]
    fn test_field_named_xmlns_is_not_a_declaration() {
        let root = parse_selection("xmlns", &ParseContext::new()).unwrap();
        assert_eq!(root.sub_selectors[0].path.to_string(), "xmlns");
    }
}
