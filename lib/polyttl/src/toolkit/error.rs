use oxilangtag::LanguageTagParseError;
use oxiri::IriParseError;
use std::error::Error;
use std::ops::Range;
use std::{fmt, io};

/// A position in a text i.e. a `line` number starting from 0, a `column` number starting from 0 (in number of code points) and a global file `offset` starting from 0 (in number of bytes).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
    pub offset: u64,
}

/// An error in the syntax of the parsed file.
///
/// It is composed of a structured [kind](TurtleSyntaxErrorKind) and a byte range in the input.
#[derive(Debug)]
pub struct TurtleSyntaxError {
    kind: TurtleSyntaxErrorKind,
    location: Range<TextPosition>,
}

/// The kind of a [`TurtleSyntaxError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TurtleSyntaxErrorKind {
    /// The input is not valid UTF-8.
    #[error("invalid UTF-8 byte sequence")]
    InvalidEncoding,
    /// No token can be recognized at the current position.
    #[error("{0}")]
    InvalidToken(String),
    /// The parser expected another token class at the current position.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    /// An IRI, a string or a long string is missing its closing delimiter.
    #[error("unterminated {0}")]
    UnterminatedConstruct(&'static str),
    /// A `\uXXXX`, `\UXXXXXXXX`, `%HH`, `\X` or string escape is malformed.
    #[error("invalid escape sequence: {0}")]
    InvalidEscape(String),
    /// A numeric escape names a surrogate or a code point beyond U+10FFFF.
    #[error("the code point {0:X} is not a valid Unicode scalar value")]
    InvalidCodePoint(u32),
    /// A prefixed name uses a prefix that has not been declared.
    #[error("the prefix {0}: has not been declared")]
    UndefinedPrefix(String),
    /// A line of a line-oriented format is not terminated by a `.`.
    #[error("the statement is not terminated by a '.'")]
    MissingStatementTerminator,
    /// An IRI is invalid or cannot be resolved against the current base.
    #[error("invalid IRI '{iri}': {error}")]
    InvalidIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    /// A language tag is not valid according to BCP47.
    #[error("invalid language tag '{tag}': {error}")]
    InvalidLanguageTag {
        tag: String,
        #[source]
        error: LanguageTagParseError,
    },
    /// The quads of a parser have already been pulled once.
    #[error("the parser output has already been consumed")]
    AlreadyConsumed,
}

impl TurtleSyntaxError {
    pub(crate) fn new(kind: TurtleSyntaxErrorKind, location: Range<TextPosition>) -> Self {
        Self { kind, location }
    }

    /// The location of the error inside of the file.
    #[inline]
    pub fn location(&self) -> Range<TextPosition> {
        self.location.clone()
    }

    /// What went wrong.
    #[inline]
    pub fn kind(&self) -> &TurtleSyntaxErrorKind {
        &self.kind
    }
}

impl fmt::Display for TurtleSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.start.offset + 1 >= self.location.end.offset {
            write!(
                f,
                "Parser error at line {} column {}: {}",
                self.location.start.line + 1,
                self.location.start.column + 1,
                self.kind
            )
        } else if self.location.start.line == self.location.end.line {
            write!(
                f,
                "Parser error at line {} between columns {} and {}: {}",
                self.location.start.line + 1,
                self.location.start.column + 1,
                self.location.end.column + 1,
                self.kind
            )
        } else {
            write!(
                f,
                "Parser error between line {} column {} and line {} column {}: {}",
                self.location.start.line + 1,
                self.location.start.column + 1,
                self.location.end.line + 1,
                self.location.end.column + 1,
                self.kind
            )
        }
    }
}

impl Error for TurtleSyntaxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl From<TurtleSyntaxError> for io::Error {
    #[inline]
    fn from(error: TurtleSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

/// A parsing error.
///
/// It is the union of [`TurtleSyntaxError`] and [`std::io::Error`].
#[derive(Debug, thiserror::Error)]
pub enum TurtleParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] TurtleSyntaxError),
}

impl From<TurtleParseError> for io::Error {
    #[inline]
    fn from(error: TurtleParseError) -> Self {
        match error {
            TurtleParseError::Io(error) => error,
            TurtleParseError::Syntax(error) => error.into(),
        }
    }
}
