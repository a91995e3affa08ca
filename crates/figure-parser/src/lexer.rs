//! Lexical analyzer for Figure source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace and `#`/`;` line comments are skipped and never reach the
//! parser.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{digit1, multispace0, multispace1},
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{CompileError, Diagnostic, DiagnosticCollector, ErrorCode},
    source::FileId,
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse one escape sequence after the backslash.
///
/// Unknown escapes yield the escaped character itself, so `\%` is `%`.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    preceded(
        '\\',
        none_of(['\n', '\r']).map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        }),
    )
    .parse_next(input)
}

/// Parse the contents of a quoted string up to (not including) `quote`.
fn string_body<'a>(input: &mut Input<'a>, quote: char) -> IResult<'a, String> {
    repeat(0.., alt((string_escape, none_of([quote, '\\', '\n', '\r']))))
        .fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        })
        .parse_next(input)
}

/// Parse a single-line string literal in double or single quotes.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    let quote = one_of(['"', '\'']).parse_next(input)?;

    // Commit after the opening quote so the error spans the whole literal
    cut_err(terminated(
        |input: &mut Input<'a>| string_body(input, quote),
        quote,
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E001,
        message: "unterminated string literal",
        help: Some("close the string on the same line, or use `\"\"\"` for multiline text"),
        start: start_pos,
    })
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse a `"""` or `'''` string, keeping the raw body.
fn multiline_string<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    let delimiter = alt((literal("\"\"\""), literal("'''"))).parse_next(input)?;

    cut_err(terminated(take_until(0.., delimiter), delimiter))
        .context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "unterminated multiline string",
            help: Some("add the closing delimiter"),
            start: start_pos,
        })
        .map(Token::MultilineString)
        .parse_next(input)
}

/// Parse `#include` or `%include` with word boundary checking
fn include_keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((literal("#include"), literal("%include"))),
        peek(not(one_of(is_identifier_char))),
    )
    .value(Token::Include)
    .parse_next(input)
}

/// Split and validate the body of an expansion macro.
fn macro_alternatives(body: &str) -> Option<Vec<&str>> {
    body.split(',')
        .map(str::trim)
        .map(|name| {
            let valid = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(is_identifier_char);
            valid.then_some(name)
        })
        .collect()
}

/// Parse an expansion macro: `%{dev,prod}`
fn expansion_macro<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    "%{".parse_next(input)?;

    cut_err(
        terminated(take_while(0.., |c: char| c != '}' && c != '\n'), '}')
            .verify_map(macro_alternatives),
    )
    .context(LexerDiagnostic {
        code: ErrorCode::E005,
        message: "malformed expansion macro",
        help: Some("list identifiers separated by commas: `%{dev,prod}`"),
        start: start_pos,
    })
    .map(Token::Macro)
    .parse_next(input)
}

/// Parse a float literal: `-?[0-9]+\.[0-9]+`
fn float_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    (opt('-'), digit1, '.', digit1)
        .take()
        .verify_map(|text: &str| text.parse::<f64>().ok())
        .map(Token::Float)
        .parse_next(input)
}

/// Parse an integer literal: `-?[0-9]+`
fn integer_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    let text = (opt('-'), digit1).take().parse_next(input)?;

    text.parse::<i64>().map(Token::Integer).map_err(|_| {
        ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E004,
                message: "integer literal out of range",
                help: Some("integers must fit in a signed 64-bit value"),
                start: start_pos,
            },
        ))
    })
}

/// A `:` or `.` after optional whitespace: what follows a key.
fn key_continuation<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    (multispace0, one_of([':', '.'])).void().parse_next(input)
}

/// Parse a number.
///
/// Directly after a `.` only integers are accepted, so the path
/// `list.0.1` lexes as `list . 0 . 1` rather than `list . 0.1`. The same
/// split applies to a key such as `0.1: x`, recognized by the `:` or `.`
/// that follows it.
fn number<'a>(input: &mut Input<'a>, after_dot: bool) -> IResult<'a, Token<'a>> {
    if !after_dot {
        let float = terminated(float_literal, not(key_continuation));
        if let Some(token) = opt(float).parse_next(input)? {
            return Ok(token);
        }
    }
    integer_literal(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    // Start with letter or underscore, followed by alphanumeric or underscore
    take_while(1.., is_identifier_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse punctuation (order matters - `[]` before `[`)
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("[]").value(Token::SectionEnd),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '@'.value(Token::At),
        '.'.value(Token::Dot),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Parse a line comment starting with `#` or `;`
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    (
        not(include_keyword),
        one_of(['#', ';']),
        take_while(0.., |c: char| c != '\n'),
    )
        .void()
        .parse_next(input)
}

/// Skip whitespace and comments. Matches zero or more times, so never fails.
fn skip_trivia<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    repeat(0.., alt((multispace1.void(), line_comment))).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(
    input: &mut Input<'a>,
    file: FileId,
    after_dot: bool,
) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        include_keyword,  // Must come before comments and macros
        multiline_string, // Must come before string_literal
        string_literal,
        expansion_macro,
        |input: &mut Input<'a>| number(input, after_dot),
        identifier,
        punctuation,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(file, start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    file: FileId,
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for one file.
    fn new(file: FileId) -> Self {
        Self {
            file,
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Whether the next token starts right after a `.` token.
    fn follows_dot(&self, position: usize) -> bool {
        self.tokens
            .last()
            .is_some_and(|last| last.token == Token::Dot && last.span.end() == position)
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while skip_trivia(&mut input).is_ok() && !input.is_empty() {
            let after_dot = self.follows_dot(input.current_token_start());

            match positioned_token(&mut input, self.file, after_dot) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();

                    let diagnostic = self.convert_err_mode(e, error_pos);
                    let unterminated_block = diagnostic.code() == Some(ErrorCode::E003);
                    self.diagnostics.emit(diagnostic);

                    // Everything after an unclosed `"""` belongs to the string
                    if unterminated_block {
                        break;
                    }
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, CompileError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to E002 (unexpected character)
    /// if no diagnostic context is found.
    fn convert_err_mode(
        &self,
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(self.file, *start..error_pos.max(*start));

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(self.file, error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize one source file, collecting every lexical error.
///
/// Attempts to recover from errors and continue tokenizing, so a single
/// pass reports all issues in the file.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully parsed
/// - `Err(CompileError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str, file: FileId) -> Result<Vec<PositionedToken<'_>>, CompileError> {
    let located_input = LocatingSlice::new(input);
    let mut lexer = Lexer::new(file);
    lexer.tokenize(located_input);
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token<'_>> {
        tokenize(input, FileId::default())
            .expect("input should tokenize")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn lex_error_codes(input: &str) -> Vec<ErrorCode> {
        tokenize(input, FileId::default())
            .expect_err("input should fail to tokenize")
            .diagnostics()
            .iter()
            .filter_map(Diagnostic::code)
            .collect()
    }

    #[test]
    fn test_simple_field() {
        assert_eq!(
            lex(r#"key: "value""#),
            vec![
                Token::Identifier("key"),
                Token::Colon,
                Token::StringLiteral("value".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_and_comments_are_discarded() {
        let tokens = lex("# heading\n  a: 1 ; trailing\n\tb: 2\n");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a"),
                Token::Colon,
                Token::Integer(1),
                Token::Identifier("b"),
                Token::Colon,
                Token::Integer(2),
            ]
        );
    }

    #[test]
    fn test_include_keywords() {
        assert_eq!(
            lex(r#"#include "a.fig", "b.fig""#),
            vec![
                Token::Include,
                Token::StringLiteral("a.fig".to_string()),
                Token::Comma,
                Token::StringLiteral("b.fig".to_string()),
            ]
        );
        assert_eq!(lex(r#"%include 'c.fig'"#)[0], Token::Include);
    }

    #[test]
    fn test_include_word_boundary() {
        // `#includes` is an ordinary comment
        assert!(lex("#includes are great").is_empty());
    }

    #[test]
    fn test_section_header_tokens() {
        assert_eq!(
            lex("[test.%{dev, prod}]"),
            vec![
                Token::LeftBracket,
                Token::Identifier("test"),
                Token::Dot,
                Token::Macro(vec!["dev", "prod"]),
                Token::RightBracket,
            ]
        );
        assert_eq!(
            lex("[@.key] []"),
            vec![
                Token::LeftBracket,
                Token::At,
                Token::Dot,
                Token::Identifier("key"),
                Token::RightBracket,
                Token::SectionEnd,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("42"), vec![Token::Integer(42)]);
        assert_eq!(lex("-7"), vec![Token::Integer(-7)]);
        assert_eq!(lex("3.25"), vec![Token::Float(3.25)]);
        assert_eq!(lex("-0.5"), vec![Token::Float(-0.5)]);
    }

    #[test]
    fn test_numbers_after_dot_are_path_segments() {
        assert_eq!(
            lex("list.0.1: 2.5"),
            vec![
                Token::Identifier("list"),
                Token::Dot,
                Token::Integer(0),
                Token::Dot,
                Token::Integer(1),
                Token::Colon,
                Token::Float(2.5),
            ]
        );
    }

    #[test]
    fn test_index_keys_are_not_floats() {
        assert_eq!(
            lex("0.1: 2.5"),
            vec![
                Token::Integer(0),
                Token::Dot,
                Token::Integer(1),
                Token::Colon,
                Token::Float(2.5),
            ]
        );
        assert_eq!(
            lex("{0.0 : 1.5}"),
            vec![
                Token::LeftBrace,
                Token::Integer(0),
                Token::Dot,
                Token::Integer(0),
                Token::Colon,
                Token::Float(1.5),
                Token::RightBrace,
            ]
        );
        assert_eq!(lex("a: 1.5\nb: 2")[2], Token::Float(1.5));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            lex(r#""a\"b\n\tc\\d\%""#),
            vec![Token::StringLiteral("a\"b\n\tc\\d%".to_string())]
        );
        assert_eq!(
            lex(r"'it\'s'"),
            vec![Token::StringLiteral("it's".to_string())]
        );
        assert_eq!(
            lex(r#"'say "hi"'"#),
            vec![Token::StringLiteral("say \"hi\"".to_string())]
        );
        assert_eq!(lex(r#""""#), vec![Token::StringLiteral(String::new())]);
    }

    #[test]
    fn test_multiline_string_keeps_raw_body() {
        assert_eq!(
            lex("text: \"\"\"\n  line one\n  line two\n\"\"\""),
            vec![
                Token::Identifier("text"),
                Token::Colon,
                Token::MultilineString("\n  line one\n  line two\n"),
            ]
        );
        assert_eq!(
            lex("'''single'''"),
            vec![Token::MultilineString("single")]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("ab: 12", FileId::default()).unwrap();

        assert_eq!(tokens[0].span.range(), 0..2);
        assert_eq!(tokens[1].span.range(), 2..3);
        assert_eq!(tokens[2].span.range(), 4..6);
    }

    #[test]
    fn test_error_unterminated_string() {
        assert_eq!(lex_error_codes("a: \"open\nb: 1"), vec![ErrorCode::E001]);
    }

    #[test]
    fn test_error_unterminated_string_span() {
        let err = tokenize("a: \"open", FileId::default()).unwrap_err();
        let span = err.diagnostics()[0].primary_span().unwrap();

        assert_eq!(span.range(), 3..8);
    }

    #[test]
    fn test_error_unexpected_character() {
        assert_eq!(lex_error_codes("a: $"), vec![ErrorCode::E002]);
    }

    #[test]
    fn test_error_unterminated_multiline_stops_lexing() {
        assert_eq!(
            lex_error_codes("a: \"\"\"never closed\n$ $ $"),
            vec![ErrorCode::E003]
        );
    }

    #[test]
    fn test_error_integer_overflow() {
        assert_eq!(
            lex_error_codes("big: 99999999999999999999"),
            vec![ErrorCode::E004]
        );
    }

    #[test]
    fn test_error_malformed_macro() {
        assert_eq!(lex_error_codes("[%{dev,}]"), vec![ErrorCode::E005]);
        assert_eq!(lex_error_codes("[%{1abc}]"), vec![ErrorCode::E005]);
    }

    #[test]
    fn test_multiple_errors_collected() {
        assert_eq!(
            lex_error_codes("a: $\nb: ^\nc: 1"),
            vec![ErrorCode::E002, ErrorCode::E002]
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for generating valid identifier strings.
    fn valid_identifier_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,20}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Valid identifiers always tokenize to a single identifier token.
    fn check_valid_identifiers_tokenize(id: &str) -> Result<(), TestCaseError> {
        let source = format!("{id}: 1");
        let tokens = tokenize(&source, FileId::default());

        prop_assert!(tokens.is_ok(), "Failed to tokenize `{id}`: {tokens:?}");
        let tokens = tokens.unwrap();
        prop_assert_eq!(&tokens[0].token, &Token::Identifier(id));
        Ok(())
    }

    /// Any i64 written in decimal round-trips through the lexer.
    fn check_integers_tokenize(n: i64) -> Result<(), TestCaseError> {
        let source = format!("n: {n}");
        let tokens = tokenize(&source, FileId::default());

        prop_assert!(tokens.is_ok(), "Failed to tokenize `{n}`: {tokens:?}");
        prop_assert_eq!(&tokens.unwrap()[2].token, &Token::Integer(n));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn valid_identifiers_tokenize(id in valid_identifier_strategy()) {
            check_valid_identifiers_tokenize(&id)?;
        }

        #[test]
        fn integers_tokenize(n in any::<i64>()) {
            check_integers_tokenize(n)?;
        }
    }
}
