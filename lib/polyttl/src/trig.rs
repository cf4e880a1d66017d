//! A [TriG](https://www.w3.org/TR/trig/) streaming parser implemented by [`TriGParser`].

use crate::terse::TerseParser;
use crate::toolkit::{EmissionDriver, TurtleParseError};
use oxiri::{Iri, IriParseError};
use oxrdf::Quad;
use std::collections::HashMap;
use std::io::Read;

/// A [TriG](https://www.w3.org/TR/trig/) streaming parser.
///
/// Count the number of people:
/// ```
/// use oxrdf::{NamedNodeRef, vocab::rdf};
/// use polyttl::TriGParser;
///
/// let file = br#"@base <http://example.com/> .
/// @prefix schema: <http://schema.org/> .
/// <g> {
///     <foo> a schema:Person ;
///         schema:name "Foo" .
///     <bar> a schema:Person ;
///         schema:name "Bar" .
/// }"#;
///
/// let schema_person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for quad in TriGParser::new().for_reader(file.as_ref()) {
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
pub struct TriGParser {
    lenient: bool,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, Iri<String>>,
}

impl TriGParser {
    /// Builds a new [`TriGParser`].
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

    /// The IRI to resolve the relative IRIs of the document against.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Declares a prefix, as if the document started with a `@prefix` directive.
    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes
            .insert(prefix_name.into(), Iri::parse(prefix_iri.into())?);
        Ok(self)
    }

    /// Parses a TriG file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTriGParser<R> {
        ReaderTriGParser {
            inner: EmissionDriver::new(TerseParser::new(
                reader,
                true,
                self.lenient,
                self.base,
                self.prefixes,
            )),
        }
    }

    /// Parses a TriG file from a byte slice.
    ///
    /// ```
    /// use polyttl::TriGParser;
    ///
    /// let file = r#"@prefix ex: <http://ex/> . ex:g { ex:s ex:p "x" . }"#;
    /// let quads = TriGParser::new()
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(quads[0].graph_name.to_string(), "<http://ex/g>");
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderTriGParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Parses a TriG file from a [`Read`] implementation.
///
/// Can be built using [`TriGParser::for_reader`].
#[must_use]
pub struct ReaderTriGParser<R: Read> {
    inner: EmissionDriver<TerseParser<R>>,
}

impl<R: Read> ReaderTriGParser<R> {
    /// The prefixes declared in the part of the document parsed so far.
    pub fn prefixes(&self) -> TriGPrefixesIter<'_> {
        TriGPrefixesIter {
            inner: self.inner.producer().prefixes().iter(),
        }
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.producer().base_iri()
    }
}

impl<R: Read> Iterator for ReaderTriGParser<R> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_quad()
    }
}

/// Iterator on the file prefixes.
///
/// See [`ReaderTriGParser::prefixes`].
pub struct TriGPrefixesIter<'a> {
    inner: std::collections::hash_map::Iter<'a, String, Iri<String>>,
}

impl<'a> Iterator for TriGPrefixesIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.next()?;
        Some((key.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::xsd;
    use oxrdf::{GraphName, Literal, Term};

    fn parse(input: &str) -> Result<Vec<Quad>, TurtleParseError> {
        TriGParser::new().for_slice(input).collect()
    }

    #[test]
    fn named_graph_blocks_set_the_graph() {
        let quads = parse("@prefix ex: <http://ex/> .\nex:g { ex:s ex:p \"x\" . }").unwrap();
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].subject.to_string(), "<http://ex/s>");
        assert_eq!(
            quads[0].object,
            Term::from(Literal::new_simple_literal("x"))
        );
        let Term::Literal(literal) = &quads[0].object else {
            panic!("expected a literal");
        };
        assert_eq!(literal.datatype(), xsd::STRING);
        assert_eq!(quads[0].graph_name.to_string(), "<http://ex/g>");
    }

    #[test]
    fn graph_keyword_blocks_are_equivalent() {
        let quads = parse(
            "GRAPH <http://a/g> { <http://a/s> <http://a/p> <http://a/o> . }\n\
             graph _:g { <http://a/s> <http://a/p> <http://a/o> . }",
        )
        .unwrap();
        assert_eq!(quads[0].graph_name.to_string(), "<http://a/g>");
        assert!(matches!(quads[1].graph_name, GraphName::BlankNode(_)));
    }

    #[test]
    fn default_graph_blocks_stay_in_the_default_graph() {
        let quads = parse("{ <http://a/s> <http://a/p> <http://a/o> . }").unwrap();
        assert_eq!(quads[0].graph_name, GraphName::DefaultGraph);
    }

    #[test]
    fn graph_blocks_hold_many_statements() {
        let quads = parse(
            "<http://a/g> {\n<http://a/s> <http://a/p> <http://a/o> .\n\
             <http://a/s2> <http://a/p> <http://a/o> ; <http://a/q> \"v\" .\n}\n\
             <http://a/s3> <http://a/p> <http://a/o> .",
        )
        .unwrap();
        assert_eq!(quads.len(), 4);
        assert!(quads[..3]
            .iter()
            .all(|q| q.graph_name.to_string() == "<http://a/g>"));
        assert_eq!(quads[3].graph_name, GraphName::DefaultGraph);
    }

    #[test]
    fn collections_inherit_the_active_graph() {
        let quads =
            parse("@prefix ex: <http://ex/> .\nex:g { ex:s ex:p ( 1 2 ) . }").unwrap();
        assert_eq!(quads.len(), 5);
        assert!(quads
            .iter()
            .all(|q| q.graph_name.to_string() == "<http://ex/g>"));
    }

    #[test]
    fn anonymous_graph_labels_are_allowed() {
        let quads = parse("GRAPH [] { <http://a/s> <http://a/p> <http://a/o> . }").unwrap();
        assert!(matches!(quads[0].graph_name, GraphName::BlankNode(_)));
        let quads = parse("[] { <http://a/s> <http://a/p> <http://a/o> . }").unwrap();
        assert!(matches!(quads[0].graph_name, GraphName::BlankNode(_)));
    }

    #[test]
    fn empty_graph_blocks_are_fine() {
        assert_eq!(parse("<http://a/g> { }").unwrap(), []);
    }

    #[test]
    fn unclosed_graph_blocks_are_errors() {
        assert!(parse("<http://a/g> { <http://a/s> <http://a/p> <http://a/o> .").is_err());
    }

    #[test]
    fn base_updates_are_visible_to_later_statements() {
        let mut parser = TriGParser::new().for_reader(
            "@base <http://example.com/> .\n<s> <p> <o> .".as_bytes(),
        );
        parser.next().unwrap().unwrap();
        assert_eq!(parser.base_iri(), Some("http://example.com/"));
        assert_eq!(
            parser.prefixes().count(),
            0
        );
    }
}
