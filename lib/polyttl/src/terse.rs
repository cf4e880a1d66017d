//! Shared parser implementation for Turtle and TriG.

use crate::lexer::{Token, TurtleTokenizer};
use crate::toolkit::{
    BlankNodeScope, QuadProducer, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind,
};
use oxilangtag::LanguageTag;
use oxiri::Iri;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::mem;

/// A graph label or a plain subject, before we know which one it is.
enum Label {
    Named(NamedNode),
    Blank(BlankNode),
}

impl From<Label> for Subject {
    fn from(label: Label) -> Self {
        match label {
            Label::Named(n) => n.into(),
            Label::Blank(b) => b.into(),
        }
    }
}

impl From<Label> for GraphName {
    fn from(label: Label) -> Self {
        match label {
            Label::Named(n) => n.into(),
            Label::Blank(b) => b.into(),
        }
    }
}

/// Recursive-descent parser for the Turtle and TriG grammars.
///
/// One call to [`step`](QuadProducer::step) consumes one top-level statement
/// (or one statement of a graph block) and pushes every quad that statement
/// yields. `with_graph_name` enables the TriG graph constructs; without it
/// every emitted quad lives in the default graph.
pub struct TerseParser<R: Read> {
    tokens: TurtleTokenizer<R>,
    current: Token,
    primed: bool,
    with_graph_name: bool,
    lenient: bool,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, Iri<String>>,
    blank_nodes: BlankNodeScope,
    current_graph: GraphName,
    in_graph_block: bool,
}

impl<R: Read> TerseParser<R> {
    pub fn new(
        source: R,
        with_graph_name: bool,
        lenient: bool,
        base: Option<Iri<String>>,
        prefixes: HashMap<String, Iri<String>>,
    ) -> Self {
        Self {
            tokens: TurtleTokenizer::new(source),
            current: Token::End,
            primed: false,
            with_graph_name,
            lenient,
            base,
            prefixes,
            blank_nodes: BlankNodeScope::default(),
            current_graph: GraphName::DefaultGraph,
            in_graph_block: false,
        }
    }

    pub fn prefixes(&self) -> &HashMap<String, Iri<String>> {
        &self.prefixes
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.base.as_ref().map(Iri::as_str)
    }
}

impl<R: Read> QuadProducer for TerseParser<R> {
    fn step(&mut self, sink: &mut VecDeque<Quad>) -> Result<bool, TurtleParseError> {
        if !self.primed {
            self.primed = true;
            self.advance()?;
        }
        if self.in_graph_block {
            self.parse_graph_block_statement(sink)?;
            return Ok(true);
        }
        if self.current == Token::End {
            return Ok(false);
        }
        self.parse_statement(sink)?;
        Ok(true)
    }
}

impl<R: Read> TerseParser<R> {
    fn advance(&mut self) -> Result<(), TurtleParseError> {
        self.current = self.tokens.next_token()?;
        Ok(())
    }

    fn take(&mut self) -> Token {
        mem::replace(&mut self.current, Token::End)
    }

    fn parse_statement(&mut self, sink: &mut VecDeque<Quad>) -> Result<(), TurtleParseError> {
        match &self.current {
            Token::AtKeyword(kw) if kw == "prefix" => {
                self.advance()?;
                self.parse_prefix_declaration()?;
                self.expect(Token::Dot, "'.'")
            }
            Token::AtKeyword(kw) if kw == "base" => {
                self.advance()?;
                self.parse_base_declaration()?;
                self.expect(Token::Dot, "'.'")
            }
            Token::Prefix => {
                self.advance()?;
                self.parse_prefix_declaration()
            }
            Token::Base => {
                self.advance()?;
                self.parse_base_declaration()
            }
            Token::Graph if self.with_graph_name => {
                self.advance()?;
                let graph = self.parse_graph_label()?;
                self.expect(Token::LCurly, "'{'")?;
                self.current_graph = graph;
                self.in_graph_block = true;
                Ok(())
            }
            Token::LCurly if self.with_graph_name => {
                self.advance()?;
                self.current_graph = GraphName::DefaultGraph;
                self.in_graph_block = true;
                Ok(())
            }
            Token::LSquare => {
                self.advance()?;
                if self.current == Token::RSquare {
                    self.advance()?;
                    if self.with_graph_name && self.current == Token::LCurly {
                        // `[] { ... }`: an anonymous graph label
                        self.advance()?;
                        self.current_graph = self.blank_nodes.fresh().into();
                        self.in_graph_block = true;
                        Ok(())
                    } else {
                        let subject: Subject = self.blank_nodes.fresh().into();
                        self.parse_predicate_object_list(&subject, sink)?;
                        self.expect(Token::Dot, "'.'")
                    }
                } else {
                    let subject: Subject = self.blank_nodes.fresh().into();
                    self.parse_predicate_object_list(&subject, sink)?;
                    self.expect(Token::RSquare, "']'")?;
                    if !matches!(self.current, Token::Dot | Token::End) {
                        self.parse_predicate_object_list(&subject, sink)?;
                    }
                    self.expect(Token::Dot, "'.'")
                }
            }
            Token::LParen => {
                self.parse_triples(sink)?;
                self.expect(Token::Dot, "'.'")
            }
            Token::IriRef(_) | Token::PrefixedName { .. } | Token::BlankNodeLabel(_) => {
                let label = self.parse_label()?;
                if self.with_graph_name && self.current == Token::LCurly {
                    // The term was a graph label after all
                    self.advance()?;
                    self.current_graph = label.into();
                    self.in_graph_block = true;
                    Ok(())
                } else {
                    self.parse_predicate_object_list(&label.into(), sink)?;
                    self.expect(Token::Dot, "'.'")
                }
            }
            _ => Err(self.unexpected("a directive, a graph block or a subject")),
        }
    }

    /// One statement of a `{ ... }` block, or its closing brace.
    fn parse_graph_block_statement(
        &mut self,
        sink: &mut VecDeque<Quad>,
    ) -> Result<(), TurtleParseError> {
        if self.current == Token::RCurly {
            self.advance()?;
            self.in_graph_block = false;
            self.current_graph = GraphName::DefaultGraph;
            return Ok(());
        }
        self.parse_triples(sink)?;
        match self.current {
            Token::Dot => self.advance(),
            Token::RCurly => Ok(()),
            _ => Err(self.unexpected("'.' or '}'")),
        }
    }

    // [16] triples ::= subject predicateObjectList
    //                | blankNodePropertyList predicateObjectList?
    //                | collection predicateObjectList
    fn parse_triples(&mut self, sink: &mut VecDeque<Quad>) -> Result<(), TurtleParseError> {
        match &self.current {
            Token::LSquare => {
                self.advance()?;
                if self.current == Token::RSquare {
                    self.advance()?;
                    let subject: Subject = self.blank_nodes.fresh().into();
                    self.parse_predicate_object_list(&subject, sink)
                } else {
                    let subject: Subject = self.blank_nodes.fresh().into();
                    self.parse_predicate_object_list(&subject, sink)?;
                    self.expect(Token::RSquare, "']'")?;
                    if matches!(self.current, Token::Dot | Token::RCurly | Token::End) {
                        // Sole-subject form, no outer triple
                        Ok(())
                    } else {
                        self.parse_predicate_object_list(&subject, sink)
                    }
                }
            }
            Token::LParen => {
                self.advance()?;
                let subject: Subject = if self.current == Token::RParen {
                    self.advance()?;
                    rdf::NIL.into()
                } else {
                    let head = self.blank_nodes.fresh();
                    self.parse_collection_items(head.clone(), sink)?;
                    head.into()
                };
                self.parse_predicate_object_list(&subject, sink)
            }
            Token::IriRef(_) | Token::PrefixedName { .. } | Token::BlankNodeLabel(_) => {
                let label = self.parse_label()?;
                self.parse_predicate_object_list(&label.into(), sink)
            }
            _ => Err(self.unexpected("an RDF subject")),
        }
    }

    // [7] labelOrSubject ::= iri | BlankNode
    fn parse_label(&mut self) -> Result<Label, TurtleParseError> {
        match self.take() {
            Token::IriRef(iri) => {
                let node = self.resolve_iri(&iri)?;
                self.advance()?;
                Ok(Label::Named(node))
            }
            Token::PrefixedName { prefix, local } => {
                let node = self.expand_prefixed_name(&prefix, &local)?;
                self.advance()?;
                Ok(Label::Named(node))
            }
            Token::BlankNodeLabel(label) => {
                let node = self.blank_nodes.labeled(&label);
                self.advance()?;
                Ok(Label::Blank(node))
            }
            token => Err(self.unexpected_token(&token, "an IRI or a blank node")),
        }
    }

    fn parse_graph_label(&mut self) -> Result<GraphName, TurtleParseError> {
        if self.current == Token::LSquare {
            self.advance()?;
            self.expect(Token::RSquare, "']'")?;
            return Ok(self.blank_nodes.fresh().into());
        }
        Ok(self.parse_label()?.into())
    }

    // [17] predicateObjectList ::= verb objectList (';' (verb objectList)?)*
    fn parse_predicate_object_list(
        &mut self,
        subject: &Subject,
        sink: &mut VecDeque<Quad>,
    ) -> Result<(), TurtleParseError> {
        loop {
            let predicate = self.parse_verb()?;
            self.parse_object(subject, &predicate, sink)?;
            while self.current == Token::Comma {
                self.advance()?;
                self.parse_object(subject, &predicate, sink)?;
            }
            if self.current != Token::Semicolon {
                return Ok(());
            }
            while self.current == Token::Semicolon {
                self.advance()?;
            }
            if !matches!(
                self.current,
                Token::A | Token::IriRef(_) | Token::PrefixedName { .. }
            ) {
                // Trailing ';' before the statement end
                return Ok(());
            }
        }
    }

    // [19] verb ::= predicate | 'a'
    fn parse_verb(&mut self) -> Result<NamedNode, TurtleParseError> {
        match self.take() {
            Token::A => {
                self.advance()?;
                Ok(rdf::TYPE.into())
            }
            Token::IriRef(iri) => {
                let node = self.resolve_iri(&iri)?;
                self.advance()?;
                Ok(node)
            }
            Token::PrefixedName { prefix, local } => {
                let node = self.expand_prefixed_name(&prefix, &local)?;
                self.advance()?;
                Ok(node)
            }
            token => Err(self.unexpected_token(&token, "a predicate")),
        }
    }

    // [22] object ::= iri | BlankNode | collection | blankNodePropertyList | literal
    fn parse_object(
        &mut self,
        subject: &Subject,
        predicate: &NamedNode,
        sink: &mut VecDeque<Quad>,
    ) -> Result<(), TurtleParseError> {
        let object: Term = match self.take() {
            Token::IriRef(iri) => {
                let node = self.resolve_iri(&iri)?;
                self.advance()?;
                node.into()
            }
            Token::PrefixedName { prefix, local } => {
                let node = self.expand_prefixed_name(&prefix, &local)?;
                self.advance()?;
                node.into()
            }
            Token::BlankNodeLabel(label) => {
                let node = self.blank_nodes.labeled(&label);
                self.advance()?;
                node.into()
            }
            Token::String(value) => {
                self.advance()?;
                self.parse_literal_suffix(value)?.into()
            }
            Token::Integer(value) => {
                self.advance()?;
                Literal::new_typed_literal(value, xsd::INTEGER).into()
            }
            Token::Decimal(value) => {
                self.advance()?;
                Literal::new_typed_literal(value, xsd::DECIMAL).into()
            }
            Token::Double(value) => {
                self.advance()?;
                Literal::new_typed_literal(value, xsd::DOUBLE).into()
            }
            Token::True => {
                self.advance()?;
                Literal::new_typed_literal("true", xsd::BOOLEAN).into()
            }
            Token::False => {
                self.advance()?;
                Literal::new_typed_literal("false", xsd::BOOLEAN).into()
            }
            Token::LSquare => {
                self.advance()?;
                if self.current == Token::RSquare {
                    self.advance()?;
                    self.blank_nodes.fresh().into()
                } else {
                    // The inner triples come out before the enclosing one,
                    // the object subject is only complete at the ']'
                    let node = self.blank_nodes.fresh();
                    self.parse_predicate_object_list(&node.clone().into(), sink)?;
                    self.expect(Token::RSquare, "']'")?;
                    node.into()
                }
            }
            Token::LParen => {
                self.advance()?;
                if self.current == Token::RParen {
                    self.advance()?;
                    rdf::NIL.into()
                } else {
                    // The enclosing triple knows its object (the list head)
                    // right away, so it comes out before the chain
                    let head = self.blank_nodes.fresh();
                    self.emit(sink, subject.clone(), predicate.clone(), head.clone().into());
                    self.parse_collection_items(head, sink)?;
                    return Ok(());
                }
            }
            token => return Err(self.unexpected_token(&token, "an RDF object")),
        };
        self.emit(sink, subject.clone(), predicate.clone(), object);
        Ok(())
    }

    /// Parses the items of a non-empty collection, `(` already consumed.
    ///
    /// Emits the `rdf:first`/`rdf:rest` chain head to tail: `2n + 1` triples
    /// for `n` items.
    fn parse_collection_items(
        &mut self,
        head: BlankNode,
        sink: &mut VecDeque<Quad>,
    ) -> Result<(), TurtleParseError> {
        let mut current = head;
        loop {
            self.parse_object(&current.clone().into(), &rdf::FIRST.into(), sink)?;
            if self.current == Token::RParen {
                self.advance()?;
                self.emit(sink, current.into(), rdf::REST.into(), rdf::NIL.into());
                return Ok(());
            }
            let next = self.blank_nodes.fresh();
            self.emit(
                sink,
                current.into(),
                rdf::REST.into(),
                next.clone().into(),
            );
            current = next;
        }
    }

    // [27] RDFLiteral ::= String (LANGTAG | '^^' iri)?
    fn parse_literal_suffix(&mut self, value: String) -> Result<Literal, TurtleParseError> {
        Ok(match self.take() {
            Token::AtKeyword(tag) => {
                self.advance()?;
                if !self.lenient {
                    if let Err(error) = LanguageTag::parse(tag.clone()) {
                        return Err(self.syntax_error(
                            TurtleSyntaxErrorKind::InvalidLanguageTag { tag, error },
                        ));
                    }
                }
                Literal::new_language_tagged_literal_unchecked(value, tag.to_ascii_lowercase())
            }
            Token::HatHat => {
                self.advance()?;
                let datatype = self.parse_datatype()?;
                Literal::new_typed_literal(value, datatype)
            }
            token => {
                self.current = token;
                Literal::new_simple_literal(value)
            }
        })
    }

    fn parse_datatype(&mut self) -> Result<NamedNode, TurtleParseError> {
        let datatype = match self.take() {
            Token::IriRef(iri) => {
                let node = self.resolve_iri(&iri)?;
                self.advance()?;
                node
            }
            Token::PrefixedName { prefix, local } => {
                let node = self.expand_prefixed_name(&prefix, &local)?;
                self.advance()?;
                node
            }
            token => return Err(self.unexpected_token(&token, "a datatype IRI")),
        };
        if !self.lenient && datatype == rdf::LANG_STRING {
            return Err(self.syntax_error(TurtleSyntaxErrorKind::UnexpectedToken {
                expected: "a datatype other than rdf:langString on a literal without a language tag",
                found: datatype.to_string(),
            }));
        }
        Ok(datatype)
    }

    // [9] prefixID / [12] sparqlPrefix, without the trailing '.'
    fn parse_prefix_declaration(&mut self) -> Result<(), TurtleParseError> {
        let name = match self.take() {
            Token::PrefixedName { prefix, local } if local.is_empty() => {
                self.advance()?;
                prefix
            }
            token => return Err(self.unexpected_token(&token, "a prefix name like 'ex:'")),
        };
        match self.take() {
            Token::IriRef(iri) => {
                let iri = self.resolve_iri_value(&iri)?;
                self.advance()?;
                self.prefixes.insert(name, iri);
                Ok(())
            }
            token => Err(self.unexpected_token(&token, "the prefix IRI")),
        }
    }

    // [10] base / [13] sparqlBase, without the trailing '.'
    fn parse_base_declaration(&mut self) -> Result<(), TurtleParseError> {
        match self.take() {
            Token::IriRef(iri) => {
                let iri = self.resolve_iri_value(&iri)?;
                self.advance()?;
                self.base = Some(iri);
                Ok(())
            }
            token => Err(self.unexpected_token(&token, "the base IRI")),
        }
    }

    /// Resolves an IRI reference against the current base.
    fn resolve_iri_value(&self, iri: &str) -> Result<Iri<String>, TurtleParseError> {
        if let Some(base) = &self.base {
            if self.lenient {
                Ok(base.resolve_unchecked(iri))
            } else {
                base.resolve(iri).map_err(|error| {
                    self.syntax_error(TurtleSyntaxErrorKind::InvalidIri {
                        iri: iri.to_owned(),
                        error,
                    })
                })
            }
        } else if self.lenient {
            Ok(Iri::parse_unchecked(iri.to_owned()))
        } else {
            Iri::parse(iri.to_owned()).map_err(|error| {
                self.syntax_error(TurtleSyntaxErrorKind::InvalidIri {
                    iri: iri.to_owned(),
                    error,
                })
            })
        }
    }

    fn resolve_iri(&self, iri: &str) -> Result<NamedNode, TurtleParseError> {
        Ok(NamedNode::new_unchecked(
            self.resolve_iri_value(iri)?.into_inner(),
        ))
    }

    fn expand_prefixed_name(
        &self,
        prefix: &str,
        local: &str,
    ) -> Result<NamedNode, TurtleParseError> {
        let Some(namespace) = self.prefixes.get(prefix) else {
            return Err(
                self.syntax_error(TurtleSyntaxErrorKind::UndefinedPrefix(prefix.to_owned()))
            );
        };
        let iri = format!("{}{local}", namespace.as_str());
        if !self.lenient {
            if let Err(error) = Iri::parse(iri.as_str()) {
                return Err(self.syntax_error(TurtleSyntaxErrorKind::InvalidIri { iri, error }));
            }
        }
        Ok(NamedNode::new_unchecked(iri))
    }

    fn emit(&self, sink: &mut VecDeque<Quad>, subject: Subject, predicate: NamedNode, object: Term) {
        sink.push_back(Quad::new(
            subject,
            predicate,
            object,
            self.current_graph.clone(),
        ));
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), TurtleParseError> {
        if self.current == token {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> TurtleParseError {
        self.syntax_error(TurtleSyntaxErrorKind::UnexpectedToken {
            expected,
            found: self.current.to_string(),
        })
    }

    fn unexpected_token(&self, token: &Token, expected: &'static str) -> TurtleParseError {
        self.syntax_error(TurtleSyntaxErrorKind::UnexpectedToken {
            expected,
            found: token.to_string(),
        })
    }

    fn syntax_error(&self, kind: TurtleSyntaxErrorKind) -> TurtleParseError {
        TurtleSyntaxError::new(kind, self.tokens.location()).into()
    }
}
