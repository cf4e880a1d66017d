use oxilangtag::LanguageTagParseError;
use oxiri::IriParseError;
use std::io;
use std::sync::Arc;

/// Error returned during RDF/XML parsing.
#[derive(Debug, thiserror::Error)]
pub enum RdfXmlParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] RdfXmlSyntaxError),
}

impl From<RdfXmlParseError> for io::Error {
    #[inline]
    fn from(error: RdfXmlParseError) -> Self {
        match error {
            RdfXmlParseError::Io(error) => error,
            RdfXmlParseError::Syntax(error) => error.into(),
        }
    }
}

#[doc(hidden)]
impl From<quick_xml::Error> for RdfXmlParseError {
    #[inline]
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(error) => {
                Self::Io(Arc::try_unwrap(error).unwrap_or_else(|e| io::Error::new(e.kind(), e)))
            }
            _ => Self::Syntax(RdfXmlSyntaxError {
                kind: RdfXmlSyntaxErrorKind::Xml(error),
                position: None,
            }),
        }
    }
}

/// An error in the syntax of the parsed file.
///
/// It is composed of a structured [kind](RdfXmlSyntaxErrorKind) and, when
/// known, the byte offset the underlying XML reader had reached.
#[derive(Debug)]
pub struct RdfXmlSyntaxError {
    pub(crate) kind: RdfXmlSyntaxErrorKind,
    pub(crate) position: Option<u64>,
}

/// The kind of a [`RdfXmlSyntaxError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RdfXmlSyntaxErrorKind {
    /// An error in the XML itself.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// An IRI is invalid or cannot be resolved against the in-scope base.
    #[error("error while parsing IRI '{iri}': {error}")]
    InvalidIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    /// An `xml:lang` value is not valid according to BCP47.
    #[error("error while parsing language tag '{tag}': {error}")]
    InvalidLanguageTag {
        tag: String,
        #[source]
        error: LanguageTagParseError,
    },
    /// The document declares an encoding other than UTF-8.
    #[error("only the UTF-8 encoding is supported by the RDF/XML parser, found {0}")]
    InvalidEncoding(String),
    /// The same `rdf:ID` value is used twice in the document.
    #[error("{0} has already been used as rdf:ID value")]
    DuplicateRdfId(String),
    /// A reserved RDF name is used as an element or attribute where it is not allowed.
    #[error("forbidden use of {0}")]
    ForbiddenRdfConstruct(String),
    /// `rdf:parseType="Literal"` combined with attributes that contradict it.
    #[error("rdf:parseType=\"Literal\" cannot be combined with rdf:resource, rdf:nodeID, rdf:datatype or property attributes")]
    InvalidParseTypeCombination,
    /// Another structural error, e.g. an unbalanced document.
    #[error("{0}")]
    Msg(String),
}

impl RdfXmlSyntaxError {
    /// Builds an error from a printable error message.
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self {
            kind: RdfXmlSyntaxErrorKind::Msg(msg.into()),
            position: None,
        }
    }

    pub(crate) fn new(kind: RdfXmlSyntaxErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    pub(crate) fn with_position(mut self, position: u64) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }

    /// What went wrong.
    #[inline]
    pub fn kind(&self) -> &RdfXmlSyntaxErrorKind {
        &self.kind
    }

    /// The byte offset the XML reader had reached when the error was found, if known.
    #[inline]
    pub fn position(&self) -> Option<u64> {
        self.position
    }
}

impl std::fmt::Display for RdfXmlSyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(position) = self.position {
            write!(f, "{} at byte offset {position}", self.kind)
        } else {
            self.kind.fmt(f)
        }
    }
}

impl std::error::Error for RdfXmlSyntaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<RdfXmlSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfXmlSyntaxError) -> Self {
        match error.kind {
            RdfXmlSyntaxErrorKind::Xml(error) => match error {
                quick_xml::Error::Io(error) => {
                    Arc::try_unwrap(error).unwrap_or_else(|e| Self::new(e.kind(), e))
                }
                _ => Self::new(io::ErrorKind::InvalidData, error),
            },
            RdfXmlSyntaxErrorKind::Msg(msg) => Self::new(io::ErrorKind::InvalidData, msg),
            _ => Self::new(io::ErrorKind::InvalidData, error.kind.to_string()),
        }
    }
}
