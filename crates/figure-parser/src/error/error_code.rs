//! Error codes for the Figure diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Include errors
//! - `E3xx` - Section expansion errors
//! - `E4xx` - Reference resolution and merge errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that does not start any token.
    E002,

    /// Unterminated multiline string.
    ///
    /// A `"""` or `'''` string was opened but never closed.
    E003,

    /// Integer literal out of range.
    ///
    /// Integers must fit in a signed 64-bit value.
    E004,

    /// Malformed expansion macro.
    ///
    /// A `%{...}` macro must list one or more comma-separated identifiers.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete construct was parsed.
    E101,

    /// Expected value.
    ///
    /// A `:` was not followed by a value. A dotted name directly followed by
    /// another `:` is a key, not a reference.
    E102,

    /// Nesting too deep.
    ///
    /// Lists, maps, dotted keys and the enclosing section path together
    /// nest deeper than the configured limit.
    E103,

    // =========================================================================
    // Include Errors (E2xx)
    // =========================================================================
    /// Included file could not be loaded.
    ///
    /// The file does not exist or could not be read.
    E200,

    /// Include cycle.
    ///
    /// A file includes itself, directly or through other files.
    E201,

    /// Include depth exceeded.
    ///
    /// Includes are nested deeper than the configured limit.
    E202,

    // =========================================================================
    // Expansion Errors (E3xx)
    // =========================================================================
    /// Expansion limit exceeded.
    ///
    /// The macros of one section header produce more paths than allowed.
    E300,

    // =========================================================================
    // Resolution Errors (E4xx)
    // =========================================================================
    /// Undefined reference.
    ///
    /// A reference names a path that is defined neither in the enclosing
    /// maps nor at the top level.
    E400,

    /// Invalid reference target.
    ///
    /// A reference resolves to a list. Only scalars and maps can be
    /// referenced.
    E401,

    /// List and map conflict.
    ///
    /// A list was merged with a map (or the other way round), or a list
    /// element was deleted or assigned past the end of the list.
    E402,

    /// Broadcast value is not a map.
    ///
    /// The `@` key must be assigned a map.
    E403,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            // Include errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            // Expansion errors
            ErrorCode::E300 => "E300",
            // Resolution errors
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            ErrorCode::E403 => "E403",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated multiline string",
            ErrorCode::E004 => "integer out of range",
            ErrorCode::E005 => "malformed expansion macro",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "expected value",
            ErrorCode::E103 => "nesting too deep",
            // Include errors
            ErrorCode::E200 => "include not found",
            ErrorCode::E201 => "include cycle",
            ErrorCode::E202 => "include depth exceeded",
            // Expansion errors
            ErrorCode::E300 => "expansion limit exceeded",
            // Resolution errors
            ErrorCode::E400 => "undefined reference",
            ErrorCode::E401 => "invalid reference target",
            ErrorCode::E402 => "list and map conflict",
            ErrorCode::E403 => "broadcast requires a map",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
