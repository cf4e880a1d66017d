//! A [N-Quads](https://www.w3.org/TR/n-quads/) streaming parser implemented by [`NQuadsParser`].

use crate::line_formats::LineScanner;
use crate::toolkit::{EmissionDriver, TurtleParseError};
use oxrdf::Quad;
use std::io::Read;

/// A [N-Quads](https://www.w3.org/TR/n-quads/) streaming parser.
///
/// Count the number of people:
/// ```
/// use oxrdf::{NamedNodeRef, vocab::rdf};
/// use polyttl::NQuadsParser;
///
/// let file = r#"<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> <http://example.com/g> .
/// <http://example.com/foo> <http://schema.org/name> "Foo" <http://example.com/g> .
/// <http://example.com/bar> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let schema_person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for quad in NQuadsParser::new().for_reader(file.as_bytes()) {
///     let quad = quad?;
///     if quad.predicate == rdf::TYPE && quad.object == schema_person.into() {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NQuadsParser {
    lenient: bool,
}

impl NQuadsParser {
    /// Builds a new [`NQuadsParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assumes the file is valid to make parsing faster.
    ///
    /// It will skip some validations (IRI and language tag well-formedness).
    ///
    /// Note that if the file is actually not valid, the parser might emit broken RDF.
    #[inline]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Parses a N-Quads file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNQuadsParser<R> {
        ReaderNQuadsParser {
            inner: EmissionDriver::new(LineScanner::new(reader, true, self.lenient)),
        }
    }

    /// Parses a N-Quads file from a byte slice.
    ///
    /// ```
    /// use polyttl::NQuadsParser;
    ///
    /// let file = r#"<http://example.com/foo> <http://schema.org/name> "Foo" <http://example.com/g> ."#;
    /// let quads = NQuadsParser::new()
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(1, quads.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderNQuadsParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Parses a N-Quads file from a [`Read`] implementation.
///
/// Can be built using [`NQuadsParser::for_reader`].
#[must_use]
pub struct ReaderNQuadsParser<R: Read> {
    inner: EmissionDriver<LineScanner<R>>,
}

impl<R: Read> Iterator for ReaderNQuadsParser<R> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_quad()
    }
}
