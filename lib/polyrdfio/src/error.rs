use polyttl::TextPosition;
use std::io;
use std::ops::Range;

/// Error returned during RDF format parsing.
#[derive(Debug, thiserror::Error)]
pub enum RdfParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] RdfSyntaxError),
}

impl RdfParseError {
    pub(crate) fn msg(msg: &'static str) -> Self {
        Self::Syntax(RdfSyntaxError {
            inner: SyntaxErrorKind::Msg(msg),
        })
    }
}

impl From<RdfParseError> for io::Error {
    #[inline]
    fn from(error: RdfParseError) -> Self {
        match error {
            RdfParseError::Io(error) => error,
            RdfParseError::Syntax(error) => error.into(),
        }
    }
}

impl From<polyttl::TurtleParseError> for RdfParseError {
    #[inline]
    fn from(error: polyttl::TurtleParseError) -> Self {
        match error {
            polyttl::TurtleParseError::Syntax(e) => Self::Syntax(e.into()),
            polyttl::TurtleParseError::Io(e) => Self::Io(e),
        }
    }
}

impl From<polyrdfxml::RdfXmlParseError> for RdfParseError {
    #[inline]
    fn from(error: polyrdfxml::RdfXmlParseError) -> Self {
        match error {
            polyrdfxml::RdfXmlParseError::Syntax(e) => Self::Syntax(e.into()),
            polyrdfxml::RdfXmlParseError::Io(e) => Self::Io(e),
        }
    }
}

/// An error in the syntax of the parsed file.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RdfSyntaxError {
    inner: SyntaxErrorKind,
}

#[derive(Debug, thiserror::Error)]
enum SyntaxErrorKind {
    #[error(transparent)]
    Turtle(#[from] polyttl::TurtleSyntaxError),
    #[error(transparent)]
    RdfXml(#[from] polyrdfxml::RdfXmlSyntaxError),
    #[error("{0}")]
    Msg(&'static str),
}

impl RdfSyntaxError {
    /// The location of the error inside of the file, when known.
    ///
    /// The RDF/XML parser reports byte offsets only, not full text positions.
    #[inline]
    pub fn location(&self) -> Option<Range<TextPosition>> {
        match &self.inner {
            SyntaxErrorKind::Turtle(e) => Some(e.location()),
            SyntaxErrorKind::RdfXml(_) | SyntaxErrorKind::Msg(_) => None,
        }
    }
}

impl From<polyttl::TurtleSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: polyttl::TurtleSyntaxError) -> Self {
        Self {
            inner: SyntaxErrorKind::Turtle(error),
        }
    }
}

impl From<polyrdfxml::RdfXmlSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: polyrdfxml::RdfXmlSyntaxError) -> Self {
        Self {
            inner: SyntaxErrorKind::RdfXml(error),
        }
    }
}

impl From<RdfSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfSyntaxError) -> Self {
        match error.inner {
            SyntaxErrorKind::Turtle(error) => error.into(),
            SyntaxErrorKind::RdfXml(error) => error.into(),
            SyntaxErrorKind::Msg(msg) => Self::new(io::ErrorKind::InvalidData, msg),
        }
    }
}
