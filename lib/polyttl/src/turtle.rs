//! A [Turtle](https://www.w3.org/TR/turtle/) streaming parser implemented by [`TurtleParser`].

use crate::terse::TerseParser;
use crate::toolkit::{EmissionDriver, TurtleParseError};
use oxiri::{Iri, IriParseError};
use oxrdf::Triple;
use std::collections::HashMap;
use std::io::Read;

/// A [Turtle](https://www.w3.org/TR/turtle/) streaming parser.
///
/// Count the number of people:
/// ```
/// use oxrdf::{NamedNodeRef, vocab::rdf};
/// use polyttl::TurtleParser;
///
/// let file = br#"@base <http://example.com/> .
/// @prefix schema: <http://schema.org/> .
/// <foo> a schema:Person ;
///     schema:name "Foo" .
/// <bar> a schema:Person ;
///     schema:name "Bar" ."#;
///
/// let schema_person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for triple in TurtleParser::new().for_reader(file.as_ref()) {
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
pub struct TurtleParser {
    lenient: bool,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, Iri<String>>,
}

impl TurtleParser {
    /// Builds a new [`TurtleParser`].
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

    /// Parses a Turtle file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTurtleParser<R> {
        ReaderTurtleParser {
            inner: EmissionDriver::new(TerseParser::new(
                reader,
                false,
                self.lenient,
                self.base,
                self.prefixes,
            )),
        }
    }

    /// Parses a Turtle file from a byte slice.
    ///
    /// ```
    /// use polyttl::TurtleParser;
    ///
    /// let file = r#"@prefix ex: <http://example.com/> . ex:s ex:p ( 1 2 ) ."#;
    /// let triples = TurtleParser::new()
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(5, triples.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderTurtleParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Parses a Turtle file from a [`Read`] implementation.
///
/// Can be built using [`TurtleParser::for_reader`].
#[must_use]
pub struct ReaderTurtleParser<R: Read> {
    inner: EmissionDriver<TerseParser<R>>,
}

impl<R: Read> ReaderTurtleParser<R> {
    /// The prefixes declared in the part of the document parsed so far.
    ///
    /// ```
    /// use polyttl::TurtleParser;
    ///
    /// let file = br#"@prefix schema: <http://schema.org/> .
    /// <http://example.com/s> schema:name "Foo" ."#;
    /// let mut parser = TurtleParser::new().for_reader(file.as_ref());
    /// assert_eq!(parser.prefixes().count(), 0); // No triple read yet
    /// parser.next().unwrap()?;
    /// assert_eq!(
    ///     parser.prefixes().collect::<Vec<_>>(),
    ///     [("schema", "http://schema.org/")]
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn prefixes(&self) -> TurtlePrefixesIter<'_> {
        TurtlePrefixesIter {
            inner: self.inner.producer().prefixes().iter(),
        }
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.producer().base_iri()
    }
}

impl<R: Read> Iterator for ReaderTurtleParser<R> {
    type Item = Result<Triple, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(
            self.inner
                .next_quad()?
                .map(|q| Triple::new(q.subject, q.predicate, q.object)),
        )
    }
}

/// Iterator on the file prefixes.
///
/// See [`ReaderTurtleParser::prefixes`].
pub struct TurtlePrefixesIter<'a> {
    inner: std::collections::hash_map::Iter<'a, String, Iri<String>>,
}

impl<'a> Iterator for TurtlePrefixesIter<'a> {
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
    use crate::toolkit::TurtleSyntaxErrorKind;
    use oxrdf::vocab::{rdf, xsd};
    use oxrdf::{Literal, NamedNode, Subject, Term};

    fn parse(input: &str) -> Result<Vec<Triple>, TurtleParseError> {
        TurtleParser::new().for_slice(input).collect()
    }

    fn syntax_kind(input: &str) -> TurtleSyntaxErrorKind {
        match parse(input).expect_err("the document should be invalid") {
            TurtleParseError::Syntax(e) => match e.kind() {
                TurtleSyntaxErrorKind::UndefinedPrefix(p) => {
                    TurtleSyntaxErrorKind::UndefinedPrefix(p.clone())
                }
                TurtleSyntaxErrorKind::UnexpectedToken { expected, found } => {
                    TurtleSyntaxErrorKind::UnexpectedToken {
                        expected: *expected,
                        found: found.clone(),
                    }
                }
                TurtleSyntaxErrorKind::InvalidIri { iri, .. } => {
                    TurtleSyntaxErrorKind::InvalidToken(iri.clone())
                }
                other => TurtleSyntaxErrorKind::InvalidToken(other.to_string()),
            },
            TurtleParseError::Io(e) => panic!("unexpected I/O error: {e}"),
        }
    }

    #[test]
    fn collections_expand_to_first_rest_chains() {
        let triples = parse("@prefix ex: <http://ex/> .\nex:s ex:p ( 1 2 ) .").unwrap();
        assert_eq!(triples.len(), 5);
        let Term::BlankNode(head) = &triples[0].object else {
            panic!("the list head should be a blank node");
        };
        assert_eq!(triples[0].subject.to_string(), "<http://ex/s>");
        assert_eq!(
            triples[1],
            Triple::new(
                head.clone(),
                rdf::FIRST,
                Literal::new_typed_literal("1", xsd::INTEGER)
            )
        );
        assert_eq!(triples[1].subject, Subject::BlankNode(head.clone()));
        let Term::BlankNode(second) = &triples[2].object else {
            panic!("the list tail should be a blank node");
        };
        assert_eq!(triples[2].predicate, rdf::REST);
        assert_eq!(
            triples[3],
            Triple::new(
                second.clone(),
                rdf::FIRST,
                Literal::new_typed_literal("2", xsd::INTEGER)
            )
        );
        assert_eq!(
            triples[4],
            Triple::new(second.clone(), rdf::REST, rdf::NIL)
        );
        assert_ne!(head, second);
    }

    #[test]
    fn empty_collections_are_nil_without_triples() {
        let triples = parse("<http://a/s> <http://a/p> () .").unwrap();
        assert_eq!(
            triples,
            [Triple::new(
                NamedNode::new_unchecked("http://a/s"),
                NamedNode::new_unchecked("http://a/p"),
                rdf::NIL
            )]
        );
    }

    #[test]
    fn sole_blank_node_property_list_emits_only_inner_triples() {
        let triples = parse("[ <http://a/p> <http://a/o> ] .").unwrap();
        assert_eq!(triples.len(), 1);
        assert!(matches!(triples[0].subject, Subject::BlankNode(_)));
        assert_eq!(triples[0].predicate.as_str(), "http://a/p");
    }

    #[test]
    fn blank_node_property_lists_nest() {
        let triples =
            parse("<http://a/s> <http://a/p> [ <http://a/q> \"v\" ; <http://a/r> true ] .")
                .unwrap();
        // Inner triples come out before the enclosing one
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[0].predicate.as_str(), "http://a/q");
        assert_eq!(
            triples[1].object,
            Literal::new_typed_literal("true", xsd::BOOLEAN).into()
        );
        assert_eq!(triples[2].subject.to_string(), "<http://a/s>");
        assert_eq!(Term::from(triples[0].subject.clone()), triples[2].object);
    }

    #[test]
    fn semicolons_and_commas_share_the_context() {
        let triples = parse(
            "@prefix ex: <http://ex/> .\nex:s ex:p ex:a , ex:b ;; ex:q ex:c ; .",
        )
        .unwrap();
        assert_eq!(triples.len(), 3);
        assert!(triples.iter().all(|t| t.subject.to_string() == "<http://ex/s>"));
        assert_eq!(triples[0].predicate, triples[1].predicate);
        assert_eq!(triples[2].predicate.as_str(), "http://ex/q");
    }

    #[test]
    fn a_expands_to_rdf_type() {
        let triples = parse("<http://a/s> a <http://a/C> .").unwrap();
        assert_eq!(triples[0].predicate, rdf::TYPE);
    }

    #[test]
    fn relative_iris_resolve_against_the_base() {
        let triples = parse("@base <http://example.com/dir/> .\n<s> <#p> <../o> .").unwrap();
        assert_eq!(triples[0].subject.to_string(), "<http://example.com/dir/s>");
        assert_eq!(
            triples[0].predicate.as_str(),
            "http://example.com/dir/#p"
        );
        assert_eq!(triples[0].object.to_string(), "<http://example.com/o>");
    }

    #[test]
    fn sparql_style_directives_take_no_dot() {
        let triples = parse(
            "PREFIX ex: <http://ex/>\nBASE <http://example.com/>\nex:s ex:p <o> .",
        )
        .unwrap();
        assert_eq!(triples[0].object.to_string(), "<http://example.com/o>");
    }

    #[test]
    fn prefix_declarations_may_shadow() {
        let triples = parse(
            "@prefix ex: <http://one/> .\nex:s ex:p ex:o .\n@prefix ex: <http://two/> .\nex:s ex:p ex:o .",
        )
        .unwrap();
        assert_eq!(triples[0].subject.to_string(), "<http://one/s>");
        assert_eq!(triples[1].subject.to_string(), "<http://two/s>");
    }

    #[test]
    fn undefined_prefixes_are_reported() {
        assert!(matches!(
            syntax_kind("ex:s <http://a/p> <http://a/o> ."),
            TurtleSyntaxErrorKind::UndefinedPrefix(p) if p == "ex"
        ));
    }

    #[test]
    fn graph_blocks_are_rejected_in_turtle() {
        assert!(parse("<http://a/g> { <http://a/s> <http://a/p> <http://a/o> . }").is_err());
        assert!(parse("{ <http://a/s> <http://a/p> <http://a/o> . }").is_err());
    }

    #[test]
    fn literals_carry_language_or_datatype() {
        let triples = parse(
            "<http://a/s> <http://a/p> \"x\"@en-GB , \"4.5\"^^<http://www.w3.org/2001/XMLSchema#float> , 4.5 , 1e0 .",
        )
        .unwrap();
        let Term::Literal(lang) = &triples[0].object else {
            panic!("expected a literal");
        };
        assert_eq!(lang.language(), Some("en-gb"));
        assert_eq!(lang.datatype(), rdf::LANG_STRING);
        let Term::Literal(float) = &triples[1].object else {
            panic!("expected a literal");
        };
        assert_eq!(float.datatype().as_str(), "http://www.w3.org/2001/XMLSchema#float");
        let Term::Literal(decimal) = &triples[2].object else {
            panic!("expected a literal");
        };
        assert_eq!(decimal.datatype(), xsd::DECIMAL);
        assert_eq!(decimal.value(), "4.5");
        let Term::Literal(double) = &triples[3].object else {
            panic!("expected a literal");
        };
        assert_eq!(double.datatype(), xsd::DOUBLE);
    }

    #[test]
    fn labeled_blank_nodes_are_renamed_but_stable() {
        let triples = parse("_:x <http://a/p> _:y .\n_:x <http://a/q> _:x .").unwrap();
        let Subject::BlankNode(x) = &triples[0].subject else {
            panic!("expected a blank node");
        };
        assert_eq!(triples[1].subject, triples[0].subject);
        assert_eq!(triples[1].object, Term::from(x.clone()));
        assert_ne!(triples[0].object, Term::from(x.clone()));
    }

    #[test]
    fn anonymous_blank_nodes_are_always_fresh() {
        let triples = parse("[] <http://a/p> [] .").unwrap();
        let Subject::BlankNode(s) = &triples[0].subject else {
            panic!("expected a blank node");
        };
        assert_ne!(Term::from(s.clone()), triples[0].object);
    }

    #[test]
    fn missing_dot_is_an_error() {
        assert!(matches!(
            syntax_kind("<http://a/s> <http://a/p> <http://a/o>"),
            TurtleSyntaxErrorKind::UnexpectedToken { expected: "'.'", .. }
        ));
    }

    #[test]
    fn long_strings_may_span_lines() {
        let triples = parse("<http://a/s> <http://a/p> \"\"\"a \"quoted\" line\nand another\"\"\" .").unwrap();
        let Term::Literal(literal) = &triples[0].object else {
            panic!("expected a literal");
        };
        assert_eq!(literal.value(), "a \"quoted\" line\nand another");
    }

    #[test]
    fn emission_order_is_deterministic() {
        let file = "@prefix ex: <http://ex/> .\nex:s ex:p ( ex:a [ ex:q ex:b ] ) , \"x\" .";
        let first = parse(file).unwrap();
        let second = parse(file).unwrap();
        assert_eq!(first, second);
    }
}
