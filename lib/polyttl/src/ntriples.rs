//! A [N-Triples](https://www.w3.org/TR/n-triples/) streaming parser implemented by [`NTriplesParser`].

use crate::line_formats::LineScanner;
use crate::toolkit::{EmissionDriver, TurtleParseError};
use oxrdf::Triple;
use std::io::Read;

/// A [N-Triples](https://www.w3.org/TR/n-triples/) streaming parser.
///
/// Count the number of people:
/// ```
/// use oxrdf::{NamedNodeRef, vocab::rdf};
/// use polyttl::NTriplesParser;
///
/// let file = r#"<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/foo> <http://schema.org/name> "Foo" .
/// <http://example.com/bar> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let schema_person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for triple in NTriplesParser::new().for_reader(file.as_bytes()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person.into() {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesParser {
    lenient: bool,
}

impl NTriplesParser {
    /// Builds a new [`NTriplesParser`].
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

    /// Parses a N-Triples file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNTriplesParser<R> {
        ReaderNTriplesParser {
            inner: EmissionDriver::new(LineScanner::new(reader, false, self.lenient)),
        }
    }

    /// Parses a N-Triples file from a byte slice.
    ///
    /// ```
    /// use polyttl::NTriplesParser;
    ///
    /// let file = r#"<http://example.com/foo> <http://schema.org/name> "Foo" ."#;
    /// let triples = NTriplesParser::new()
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(1, triples.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderNTriplesParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Parses a N-Triples file from a [`Read`] implementation.
///
/// Can be built using [`NTriplesParser::for_reader`].
#[must_use]
pub struct ReaderNTriplesParser<R: Read> {
    inner: EmissionDriver<LineScanner<R>>,
}

impl<R: Read> Iterator for ReaderNTriplesParser<R> {
    type Item = Result<Triple, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next_quad()?.map(|q| Triple::new(q.subject, q.predicate, q.object)))
    }
}
