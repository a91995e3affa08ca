//! Parser for Figure source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! a [`Document`](types::Document) defined in
//! [`parser_types`](super::parser_types). The public entry point is
//! [`build_document`].
//!
//! Parsing fails fast: the first unresolvable token produces a single
//! diagnostic.

use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    source::FileId,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
    /// Error code overriding the generic unexpected-token code
    Code(ErrorCode),
}

type Input<'src> = FigureTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type FigureTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Helper to create a Cut error at the current position
fn cut_error_with_label<'src>(
    input: &Input<'src>,
    label: &'static str,
) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::StartOffset(input.eof_offset()));
    e.push(Context::Label(label));
    ErrMode::Cut(e)
}

/// Parse one token matching `predicate` and return its span
fn token_matching<'src>(
    input: &mut Input<'src>,
    predicate: impl Fn(&Token<'_>) -> bool,
    label: &'static str,
) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| predicate(&token.token).then_some(token.span))
        .context(Context::Label(label))
        .parse_next(input)
}

fn dot<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::Dot), "`.`")
}

fn colon<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::Colon), "`:`")
}

fn comma<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::Comma), "`,`")
}

fn left_bracket<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::LeftBracket), "`[`")
}

fn right_bracket<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::RightBracket), "`]`")
}

fn left_brace<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::LeftBrace), "`{`")
}

fn right_brace<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::RightBrace), "`}`")
}

fn section_end<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::SectionEnd), "`[]`")
}

fn include_keyword<'src>(input: &mut Input<'src>) -> IResult<Span> {
    token_matching(input, |token| matches!(token, Token::Include), "`#include`")
}

/// Parse string literal
fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

/// Parse a field key: identifier, array index, or `@`
fn field_key<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(name.to_string(), token.span)),
        Token::Integer(index) if *index >= 0 => Some(Spanned::new(index.to_string(), token.span)),
        Token::At => Some(Spanned::new(types::WILDCARD_KEY.to_string(), token.span)),
        _ => None,
    })
    .context(Context::Label("field key"))
    .parse_next(input)
}

/// Parse one segment of a reference path: identifier or array index
fn path_segment<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(name.to_string(), token.span)),
        Token::Integer(index) if *index >= 0 => Some(Spanned::new(index.to_string(), token.span)),
        _ => None,
    })
    .context(Context::Label("path segment"))
    .parse_next(input)
}

/// Parse one segment of a section header path
fn section_segment<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Segment>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let segment = match &token.token {
            Token::Identifier(name) => types::Segment::Name(name.to_string()),
            Token::Integer(index) if *index >= 0 => types::Segment::Name(index.to_string()),
            Token::Macro(names) => {
                types::Segment::Macro(names.iter().map(|name| name.to_string()).collect())
            }
            Token::At => types::Segment::Wildcard,
            _ => return None,
        };
        Some(Spanned::new(segment, token.span))
    })
    .context(Context::Label("section name"))
    .parse_next(input)
}

/// Parse a literal scalar: string, multiline string, integer, or float
fn scalar<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let span = token.span;
        match &token.token {
            Token::StringLiteral(s) => Some(types::Value::String(Spanned::new(s.clone(), span))),
            Token::MultilineString(raw) => Some(types::Value::MultilineString(Spanned::new(
                raw.to_string(),
                span,
            ))),
            Token::Integer(n) => Some(types::Value::Integer(Spanned::new(*n, span))),
            Token::Float(n) => Some(types::Value::Float(Spanned::new(*n, span))),
            _ => None,
        }
    })
    .parse_next(input)
}

/// Parse a reference: `name(.segment)*`
///
/// A chain directly followed by `:` is a key, so the value is missing.
fn reference<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    let start_remaining = input.eof_offset();

    let first = any
        .verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::Identifier(name) => Some(Spanned::new(name.to_string(), token.span)),
            _ => None,
        })
        .parse_next(input)?;

    let rest: Vec<Spanned<String>> = repeat(0.., |input: &mut Input<'src>| {
        dot(input)?;
        cut_err(input, path_segment)
    })
    .parse_next(input)?;

    // Disambiguation: `a: b.c: 1` leaves `a` without a value
    let checkpoint = input.checkpoint();
    let followed_by_colon = colon(input).is_ok();
    input.reset(&checkpoint);
    if followed_by_colon {
        let mut e = ContextError::new();
        e.push(Context::StartOffset(start_remaining));
        e.push(Context::Code(ErrorCode::E102));
        e.push(Context::Label("value"));
        return Err(ErrMode::Cut(e));
    }

    let span = rest
        .last()
        .map_or(first.span(), |last| first.span().union(last.span()));
    let path = std::iter::once(first.into_inner())
        .chain(rest.into_iter().map(Spanned::into_inner))
        .collect::<Vec<_>>()
        .join(".");

    Ok(types::Value::Identifier(Spanned::new(path, span)))
}

/// Parse an empty list written as `[]`
fn empty_list<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    section_end
        .map(|span| types::Value::List(Spanned::new(Vec::new(), span)))
        .parse_next(input)
}

/// Parse a list literal: `[value, value ...]`
///
/// Commas between items are optional.
fn list<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    let open = left_bracket(input)?;

    cut_err(input, |input| {
        let items: Vec<types::Value> = repeat(0.., terminated(value, opt(comma))).parse_next(input)?;
        let close = right_bracket(input)?;
        Ok(types::Value::List(Spanned::new(items, open.union(close))))
    })
}

/// Parse a map literal: `{field, field ...}`
///
/// Commas between fields are optional.
fn map<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    let open = left_brace(input)?;

    cut_err(input, |input| {
        let fields: Vec<types::Field> = repeat(0.., terminated(field, opt(comma))).parse_next(input)?;
        let close = right_brace(input)?;
        Ok(types::Value::Map(Spanned::new(fields, open.union(close))))
    })
}

/// Parse any field value
fn value<'src>(input: &mut Input<'src>) -> IResult<types::Value> {
    alt((scalar, reference, empty_list, list, map))
        .context(Context::Label("value"))
        .parse_next(input)
}

/// Parse a field: `key`, `key: value`, or `key.field`
fn field<'src>(input: &mut Input<'src>) -> IResult<types::Field> {
    let key = field_key(input)?;

    if opt(dot).parse_next(input)?.is_some() {
        let child = cut_err(input, field)?;
        return Ok(types::Field::with_child(key, child));
    }

    if opt(colon).parse_next(input)?.is_some() {
        let value = cut_err(input, value)?;
        return Ok(types::Field::with_value(key, value));
    }

    Ok(types::Field::bare(key))
}

/// Parse a section path: `segment(.segment)*`
fn section_root<'src>(input: &mut Input<'src>) -> IResult<types::SectionRoot> {
    let segment = section_segment(input)?;

    let children: Vec<Spanned<types::Segment>> = repeat(0.., |input: &mut Input<'src>| {
        dot(input)?;
        cut_err(input, section_segment)
    })
    .parse_next(input)?;

    // Build the child chain from the innermost segment outwards
    let child = children
        .into_iter()
        .rev()
        .fold(None, |child: Option<types::SectionChild>, segment| {
            Some(types::SectionChild {
                segment,
                child: child.map(Box::new),
            })
        });

    Ok(types::SectionRoot { segment, child })
}

/// Parse a section: `[root, root.child] fields... []?`
///
/// The field list runs until the next section, include, `[]` marker, or
/// the end of input.
fn section<'src>(input: &mut Input<'src>) -> IResult<types::Section> {
    let open = left_bracket(input)?;

    cut_err(input, |input| {
        let first = section_root(input)?;
        let rest: Vec<types::SectionRoot> =
            repeat(0.., preceded(opt(comma), section_root)).parse_next(input)?;
        let close = right_bracket(input)?;

        let fields: Vec<types::Field> = repeat(0.., field).parse_next(input)?;
        let end = opt(section_end).parse_next(input)?;

        let last = end
            .or_else(|| fields.last().map(types::Field::span))
            .unwrap_or(close);

        let mut roots = vec![first];
        roots.extend(rest);

        Ok(types::Section {
            roots,
            fields,
            span: open.union(last),
        })
    })
}

/// Parse an include directive: `#include "a" ("," "b")*`
fn include<'src>(input: &mut Input<'src>) -> IResult<types::Include> {
    let keyword = include_keyword(input)?;

    cut_err(input, |input| {
        let first = string_literal(input)?;
        let rest: Vec<Spanned<String>> =
            repeat(0.., preceded(opt(comma), string_literal)).parse_next(input)?;

        let mut files = vec![first];
        files.extend(rest);

        let span = files
            .last()
            .map_or(keyword, |last| keyword.union(last.span()));

        Ok(types::Include { files, span })
    })
}

fn entry<'src>(input: &mut Input<'src>) -> IResult<types::Entry> {
    alt((
        include.map(types::Entry::Include),
        section.map(types::Entry::Section),
        field.map(types::Entry::Field),
    ))
    .parse_next(input)
}

/// Parse entries until the end of input
fn document<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Entry>> {
    let entries: Vec<types::Entry> = repeat(0.., entry).parse_next(input)?;

    if input.eof_offset() > 0 {
        return Err(cut_error_with_label(input, "`[`, `#include` or a field key"));
    }

    Ok(entries)
}

/// Convert a winnow error into a diagnostic.
///
/// Extracts position information from error context (StartOffset) and
/// points the primary label at the offending token. Tokens consumed by the
/// construct that failed get a secondary label.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let context = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => Some(e),
        ErrMode::Incomplete(_) => None,
    };

    let start_remaining = context.and_then(|e| {
        e.context().find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(*n),
            _ => None,
        })
    });
    let code = context
        .and_then(|e| {
            e.context().find_map(|ctx| match ctx {
                Context::Code(code) => Some(*code),
                _ => None,
            })
        })
        .unwrap_or(ErrorCode::E100);
    let expected = context
        .and_then(|e| {
            e.context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some(*label),
                    _ => None,
                })
                .last()
        })
        .unwrap_or("more input");

    // Calculate offsets from remaining token counts
    let end_offset = tokens.len().saturating_sub(current_remaining);
    let start_offset = start_remaining.map_or(end_offset, |r| tokens.len().saturating_sub(r));

    let consumed = (start_offset < end_offset)
        .then(|| tokens[start_offset].span.union(tokens[end_offset - 1].span));
    let last_span = tokens.last().map(|t| t.span).unwrap_or_default();

    if code == ErrorCode::E102 {
        let span = consumed
            .or_else(|| tokens.get(end_offset).map(|t| t.span))
            .unwrap_or(last_span);

        return Diagnostic::error("expected value")
            .with_code(ErrorCode::E102)
            .with_label(span, "this key starts a new field")
            .with_help("give the previous key a value, or remove its `:`");
    }

    let (diagnostic, primary) = match tokens.get(end_offset) {
        Some(found) => (
            Diagnostic::error(format!(
                "unexpected token `{}`: expected {expected}",
                found.token
            ))
            .with_code(ErrorCode::E100)
            .with_label(found.span, "unexpected token"),
            found.span,
        ),
        None => (
            Diagnostic::error(format!("unexpected end of input: expected {expected}"))
                .with_code(ErrorCode::E101)
                .with_label(last_span, "input ends here")
                .with_help("ensure input is complete"),
            last_span,
        ),
    };

    match consumed {
        Some(span) if span != primary => diagnostic.with_secondary_label(span, "while parsing this"),
        _ => diagnostic,
    }
}

/// Reject tokens nested deeper than `max_depth`.
///
/// The parser and every later pass recurse once per level, so the depth is
/// bounded before any of them runs. A level is an open `[` or `{`, a `.` in
/// a key or path, or a segment of the enclosing section header.
fn check_nesting(tokens: &[PositionedToken<'_>], max_depth: usize) -> Result<(), Diagnostic> {
    let mut section = 0;
    let mut open: usize = 0;
    let mut chain = 0;
    let mut in_header = false;
    let mut prev: Option<&Token<'_>> = None;

    for token in tokens {
        let after_dot = matches!(prev, Some(Token::Dot));
        match &token.token {
            Token::Dot => chain += 1,
            _ if !after_dot => chain = 0,
            _ => {}
        }

        match &token.token {
            Token::LeftBracket if open == 0 && !matches!(prev, Some(Token::Colon)) => {
                in_header = true;
                section = 0;
                open = 1;
            }
            Token::LeftBracket | Token::LeftBrace => open += 1,
            Token::RightBracket | Token::RightBrace => {
                open = open.saturating_sub(1);
                if open == 0 {
                    in_header = false;
                }
            }
            Token::Include if open == 0 => section = 0,
            Token::SectionEnd if open == 0 && !matches!(prev, Some(Token::Colon)) => section = 0,
            _ => {}
        }

        let depth = if in_header {
            section = section.max(chain + 1);
            section
        } else {
            section + open + chain
        };
        if depth > max_depth {
            return Err(Diagnostic::error(format!(
                "nesting depth exceeds the limit of {max_depth}"
            ))
            .with_code(ErrorCode::E103)
            .with_label(token.span, "nested too deeply")
            .with_help("flatten the structure or raise `max_nesting_depth`"));
        }

        prev = Some(&token.token);
    }

    Ok(())
}

/// Build a document from the tokens of one file
///
/// Input nested deeper than `max_depth` fails with E103 before parsing.
pub fn build_document<'src>(
    tokens: &'src [PositionedToken<'src>],
    file: FileId,
    max_depth: usize,
) -> Result<types::Document, Diagnostic> {
    check_nesting(tokens, max_depth)?;

    let mut token_slice = TokenSlice::new(tokens);

    match document.parse_next(&mut token_slice) {
        Ok(entries) => Ok(types::Document::new(file, entries)),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    // Test helpers
    fn parse_tokens(input: &str) -> Vec<PositionedToken<'_>> {
        tokenize(input, FileId::default()).expect("Failed to tokenize input")
    }

    /// Helper to create a token at a specific position
    fn make_token<'a>(token: Token<'a>, offset: usize, length: usize) -> PositionedToken<'a> {
        PositionedToken {
            token,
            span: Span::new(FileId::default(), offset..offset + length),
        }
    }

    #[test]
    fn test_field_key_variants() {
        let tokens = parse_tokens("name 0 @");
        let mut slice = TokenSlice::new(&tokens);

        assert_eq!(field_key(&mut slice).unwrap().inner(), "name");
        assert_eq!(field_key(&mut slice).unwrap().inner(), "0");
        assert_eq!(field_key(&mut slice).unwrap().inner(), "@");
    }

    #[test]
    fn test_field_key_rejects_negative_index() {
        let tokens = parse_tokens("-1");
        let mut slice = TokenSlice::new(&tokens);

        assert!(field_key(&mut slice).is_err());
    }

    #[test]
    fn test_reference_path() {
        let tokens = parse_tokens("servers.0.host");
        let mut slice = TokenSlice::new(&tokens);

        let value = reference(&mut slice).unwrap();
        let types::Value::Identifier(path) = value else {
            panic!("Expected Identifier value");
        };
        assert_eq!(path.inner(), "servers.0.host");
        assert_eq!(path.span().range(), 0..14);
    }

    #[test]
    fn test_reference_followed_by_colon_is_cut() {
        let tokens = parse_tokens("b.c: 1");
        let mut slice = TokenSlice::new(&tokens);

        let result = reference(&mut slice);
        assert!(matches!(result, Err(ErrMode::Cut(_))));
    }

    #[test]
    fn test_section_root_chain() {
        let tokens = parse_tokens("a.%{x,y}.@");
        let mut slice = TokenSlice::new(&tokens);

        let root = section_root(&mut slice).unwrap();
        let segments: Vec<&types::Segment> =
            root.segments().into_iter().map(|s| s.inner()).collect();
        assert_eq!(
            segments,
            [
                &types::Segment::Name("a".into()),
                &types::Segment::Macro(vec!["x".into(), "y".into()]),
                &types::Segment::Wildcard,
            ]
        );
    }

    #[test]
    fn test_empty_list_from_section_end_token() {
        let tokens = parse_tokens("[]");
        let mut slice = TokenSlice::new(&tokens);

        let value = value(&mut slice).unwrap();
        assert!(matches!(value, types::Value::List(items) if items.is_empty()));
    }

    #[test]
    fn test_convert_error_points_at_found_token() {
        let tokens = vec![
            make_token(Token::LeftBracket, 0, 1),
            make_token(Token::Identifier("a"), 1, 1),
            make_token(Token::Colon, 3, 1),
        ];

        let mut err = ContextError::new();
        err.push(Context::Label("`]`"));
        err.push(Context::StartOffset(2));

        let diag = convert_error(ErrMode::Cut(err), &tokens, 1);

        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.message(), "unexpected token `:`: expected `]`");
        assert_eq!(diag.primary_span().unwrap().range(), 3..4);
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.labels()[1].span().range(), 1..2);
    }

    #[test]
    fn test_convert_error_at_eof() {
        let tokens = vec![
            make_token(Token::Identifier("a"), 0, 1),
            make_token(Token::Colon, 1, 1),
        ];

        let mut err = ContextError::new();
        err.push(Context::Label("value"));
        err.push(Context::StartOffset(0));

        let diag = convert_error(ErrMode::Cut(err), &tokens, 0);

        assert_eq!(diag.code(), Some(ErrorCode::E101));
        assert_eq!(diag.message(), "unexpected end of input: expected value");
        assert_eq!(diag.primary_span().unwrap().range(), 1..2);
    }

    #[test]
    fn test_convert_error_expected_value() {
        let tokens = vec![
            make_token(Token::Identifier("a"), 0, 1),
            make_token(Token::Colon, 1, 1),
            make_token(Token::Identifier("b"), 3, 1),
            make_token(Token::Colon, 4, 1),
        ];

        let mut err = ContextError::new();
        err.push(Context::StartOffset(2));
        err.push(Context::Code(ErrorCode::E102));
        err.push(Context::Label("value"));

        let diag = convert_error(ErrMode::Cut(err), &tokens, 1);

        assert_eq!(diag.code(), Some(ErrorCode::E102));
        assert_eq!(diag.primary_span().unwrap().range(), 3..4);
    }

    #[test]
    fn test_convert_error_without_start_offset() {
        let tokens = vec![make_token(Token::RightBrace, 0, 1)];

        let mut err = ContextError::new();
        err.push(Context::Label("field key"));

        let diag = convert_error(ErrMode::Backtrack(err), &tokens, 1);

        assert_eq!(diag.primary_span().unwrap().range(), 0..1);
        assert_eq!(diag.labels().len(), 1);
    }

    #[test]
    fn test_check_nesting_counts_open_delimiters() {
        let tokens = parse_tokens("a: [[{b: 1}]]");

        assert!(check_nesting(&tokens, 3).is_ok());

        let diag = check_nesting(&tokens, 2).unwrap_err();
        assert_eq!(diag.code(), Some(ErrorCode::E103));
        assert_eq!(diag.primary_span().unwrap().range(), 5..6);
    }

    #[test]
    fn test_check_nesting_adds_section_path_and_dotted_key() {
        let tokens = parse_tokens("[s.t] x.y: 1");

        assert!(check_nesting(&tokens, 3).is_ok());

        let diag = check_nesting(&tokens, 2).unwrap_err();
        assert_eq!(diag.primary_span().unwrap().range(), 7..8);
    }

    #[test]
    fn test_check_nesting_resets_after_section_end() {
        let tokens = parse_tokens("[a.b.c] x: 1 [] y.z: 2");

        assert!(check_nesting(&tokens, 3).is_ok());
    }

    #[test]
    fn test_build_document_rejects_deep_nesting() {
        let source = format!("a: {}{}", "[".repeat(500), "]".repeat(500));
        let tokens = parse_tokens(&source);

        let diag = build_document(&tokens, FileId::default(), 128).unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E103));
    }
}
