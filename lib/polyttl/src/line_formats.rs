//! Shared scanner implementation for N-Triples and N-Quads.

use crate::toolkit::{
    BlankNodeScope, QuadProducer, StreamReader, TextPosition, TurtleParseError, TurtleSyntaxError,
    TurtleSyntaxErrorKind,
};
use memchr::memchr2;
use oxilangtag::LanguageTag;
use oxiri::Iri;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use std::io::Read;

/// Line-by-line scanner for the line-oriented RDF formats.
///
/// Each input line holds at most one statement: subject, predicate, object,
/// an optional graph term when `with_graph_name` is set, and a terminating
/// `.`. Empty lines and `#` comment lines yield nothing.
pub struct LineScanner<R: Read> {
    reader: StreamReader<R>,
    with_graph_name: bool,
    lenient: bool,
    blank_nodes: BlankNodeScope,
}

impl<R: Read> LineScanner<R> {
    pub fn new(source: R, with_graph_name: bool, lenient: bool) -> Self {
        Self {
            reader: StreamReader::new(source),
            with_graph_name,
            lenient,
            blank_nodes: BlankNodeScope::default(),
        }
    }

    /// Reads the next line, handling `\r\n`, `\r` and `\n` terminators.
    fn next_line(&mut self) -> Result<Option<(String, TextPosition)>, TurtleParseError> {
        if self.reader.peek(0)?.is_none() {
            return Ok(None);
        }
        let start = self.reader.position();
        let mut line = String::new();
        loop {
            match self.reader.peek(0)? {
                None => break,
                Some('\n') => {
                    self.reader.consume(1)?;
                    break;
                }
                Some('\r') => {
                    self.reader.consume(1)?;
                    if self.reader.peek(0)? == Some('\n') {
                        self.reader.consume(1)?;
                    }
                    break;
                }
                Some(c) => {
                    self.reader.consume(c.len_utf8())?;
                    line.push(c);
                }
            }
        }
        Ok(Some((line, start)))
    }

    fn scan_line(
        &mut self,
        line: &str,
        start: TextPosition,
    ) -> Result<Option<Quad>, TurtleSyntaxError> {
        let mut cursor = LineCursor {
            line,
            i: 0,
            start,
            lenient: self.lenient,
        };
        cursor.skip_whitespace();
        match cursor.peek() {
            None | Some(b'#') => return Ok(None),
            _ => (),
        }
        let subject: Subject = match cursor.peek() {
            Some(b'<') => cursor.parse_iri_ref()?.into(),
            Some(b'_') => cursor.parse_blank_node(&mut self.blank_nodes)?.into(),
            _ => {
                return Err(cursor.unexpected("an IRI or a blank node as subject"));
            }
        };
        cursor.skip_whitespace();
        let predicate = match cursor.peek() {
            Some(b'<') => cursor.parse_iri_ref()?,
            _ => return Err(cursor.unexpected("an IRI as predicate")),
        };
        cursor.skip_whitespace();
        let object: Term = match cursor.peek() {
            Some(b'<') => cursor.parse_iri_ref()?.into(),
            Some(b'_') => cursor.parse_blank_node(&mut self.blank_nodes)?.into(),
            Some(b'"') => cursor.parse_literal()?.into(),
            _ => {
                return Err(cursor.unexpected("an IRI, a blank node or a literal as object"));
            }
        };
        cursor.skip_whitespace();
        let graph_name = if self.with_graph_name {
            let graph_name: Option<GraphName> = match cursor.peek() {
                Some(b'<') => Some(cursor.parse_iri_ref()?.into()),
                Some(b'_') => Some(cursor.parse_blank_node(&mut self.blank_nodes)?.into()),
                _ => None,
            };
            cursor.skip_whitespace();
            graph_name.unwrap_or(GraphName::DefaultGraph)
        } else {
            GraphName::DefaultGraph
        };
        match cursor.peek() {
            Some(b'.') => cursor.i += 1,
            None => {
                return Err(cursor.error(TurtleSyntaxErrorKind::MissingStatementTerminator));
            }
            _ => return Err(cursor.unexpected("'.'")),
        }
        cursor.skip_whitespace();
        match cursor.peek() {
            None | Some(b'#') => Ok(Some(Quad::new(subject, predicate, object, graph_name))),
            _ => Err(cursor.unexpected("the end of the line")),
        }
    }
}

impl<R: Read> QuadProducer for LineScanner<R> {
    fn step(&mut self, sink: &mut std::collections::VecDeque<Quad>) -> Result<bool, TurtleParseError> {
        let Some((line, start)) = self.next_line()? else {
            return Ok(false);
        };
        if let Some(quad) = self.scan_line(&line, start)? {
            sink.push_back(quad);
        }
        Ok(true)
    }
}

struct LineCursor<'a> {
    line: &'a str,
    i: usize,
    start: TextPosition,
    lenient: bool,
}

impl LineCursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.line.as_bytes().get(self.i).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.line[self.i..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.i += 1;
        }
    }

    fn position(&self) -> TextPosition {
        TextPosition {
            line: self.start.line,
            column: u64::try_from(self.line[..self.i].chars().count()).unwrap_or(u64::MAX),
            offset: self.start.offset + u64::try_from(self.i).unwrap_or(u64::MAX),
        }
    }

    fn error(&self, kind: TurtleSyntaxErrorKind) -> TurtleSyntaxError {
        TurtleSyntaxError::new(kind, self.position()..self.position())
    }

    fn unexpected(&self, expected: &'static str) -> TurtleSyntaxError {
        self.error(TurtleSyntaxErrorKind::UnexpectedToken {
            expected,
            found: match self.peek_char() {
                Some(c) => format!("'{}'", c.escape_debug()),
                None => "the end of the line".to_owned(),
            },
        })
    }

    // [8] IRIREF, the line-format production without relative references
    fn parse_iri_ref(&mut self) -> Result<NamedNode, TurtleSyntaxError> {
        self.i += 1;
        let mut iri = String::new();
        loop {
            let rest = &self.line.as_bytes()[self.i..];
            let Some(stop) = memchr2(b'>', b'\\', rest) else {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct("IRI")));
            };
            let chunk = &self.line[self.i..self.i + stop];
            if let Some(c) = chunk
                .chars()
                .find(|&c| c <= '\u{20}' || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`'))
            {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(format!(
                    "the character '{}' is not allowed in IRIs",
                    c.escape_debug()
                ))));
            }
            iri.push_str(chunk);
            self.i += stop;
            if rest[stop] == b'>' {
                self.i += 1;
                break;
            }
            iri.push(self.decode_escape(false)?);
        }
        if self.lenient {
            Ok(NamedNode::new_unchecked(iri))
        } else {
            match Iri::parse(iri.as_str()) {
                Ok(_) => Ok(NamedNode::new_unchecked(iri)),
                Err(error) => Err(self.error(TurtleSyntaxErrorKind::InvalidIri { iri, error })),
            }
        }
    }

    // [141s] BLANK_NODE_LABEL
    fn parse_blank_node(
        &mut self,
        scope: &mut BlankNodeScope,
    ) -> Result<BlankNode, TurtleSyntaxError> {
        if self.line.as_bytes().get(self.i + 1) != Some(&b':') {
            return Err(self.unexpected("'_:'"));
        }
        self.i += 2;
        let mut label = String::new();
        match self.peek_char() {
            Some(c) if crate::lexer::is_pn_chars_u(c) || c.is_ascii_digit() => {
                self.i += c.len_utf8();
                label.push(c);
            }
            _ => {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(
                    "a blank node label cannot be empty".into(),
                )));
            }
        }
        loop {
            match self.peek_char() {
                Some(c) if crate::lexer::is_pn_chars(c) => {
                    self.i += c.len_utf8();
                    label.push(c);
                }
                Some('.') => {
                    // Dots only belong to the label when more label characters follow
                    let mut dots = 0;
                    while self.line.as_bytes().get(self.i + dots) == Some(&b'.') {
                        dots += 1;
                    }
                    match self.line[self.i + dots..].chars().next() {
                        Some(c) if crate::lexer::is_pn_chars(c) => {
                            self.i += dots;
                            for _ in 0..dots {
                                label.push('.');
                            }
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(scope.labeled(&label))
    }

    // [9] literals: '"' content '"' followed by '@' language or '^^' datatype
    fn parse_literal(&mut self) -> Result<Literal, TurtleSyntaxError> {
        self.i += 1;
        let mut value = String::new();
        loop {
            let rest = &self.line.as_bytes()[self.i..];
            let Some(stop) = memchr2(b'"', b'\\', rest) else {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct(
                    "string literal",
                )));
            };
            value.push_str(&self.line[self.i..self.i + stop]);
            self.i += stop;
            if rest[stop] == b'"' {
                self.i += 1;
                break;
            }
            value.push(self.decode_escape(true)?);
        }
        match self.peek() {
            Some(b'@') => {
                self.i += 1;
                let tag = self.parse_language_tag()?;
                Ok(Literal::new_language_tagged_literal_unchecked(
                    value,
                    tag.to_ascii_lowercase(),
                ))
            }
            Some(b'^') => {
                if self.line.as_bytes().get(self.i + 1) != Some(&b'^') {
                    return Err(self.unexpected("'^^'"));
                }
                self.i += 2;
                if self.peek() != Some(b'<') {
                    return Err(self.unexpected("the datatype IRI"));
                }
                let datatype = self.parse_iri_ref()?;
                if !self.lenient && datatype == rdf::LANG_STRING {
                    return Err(self.error(TurtleSyntaxErrorKind::UnexpectedToken {
                        expected:
                            "a datatype other than rdf:langString on a literal without a language tag",
                        found: datatype.to_string(),
                    }));
                }
                Ok(Literal::new_typed_literal(value, datatype))
            }
            _ => Ok(Literal::new_simple_literal(value)),
        }
    }

    fn parse_language_tag(&mut self) -> Result<String, TurtleSyntaxError> {
        let from = self.i;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
            self.i += 1;
        }
        if self.i == from {
            return Err(self.unexpected("a language tag"));
        }
        while self.peek() == Some(b'-') {
            self.i += 1;
            let block = self.i;
            while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric()) {
                self.i += 1;
            }
            if self.i == block {
                return Err(self.unexpected("a language subtag"));
            }
        }
        let tag = &self.line[from..self.i];
        if !self.lenient {
            if let Err(error) = LanguageTag::parse(tag.to_owned()) {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidLanguageTag {
                    tag: tag.to_owned(),
                    error,
                }));
            }
        }
        Ok(tag.to_owned())
    }

    // [153s] ECHAR and [157s] UCHAR
    fn decode_escape(&mut self, with_echar: bool) -> Result<char, TurtleSyntaxError> {
        let bytes = self.line.as_bytes();
        let c = match bytes.get(self.i + 1) {
            Some(b'u') => return self.decode_hex_escape(4),
            Some(b'U') => return self.decode_hex_escape(8),
            Some(b't') if with_echar => '\t',
            Some(b'b') if with_echar => '\u{08}',
            Some(b'n') if with_echar => '\n',
            Some(b'r') if with_echar => '\r',
            Some(b'f') if with_echar => '\u{0C}',
            Some(b'"') if with_echar => '"',
            Some(b'\'') if with_echar => '\'',
            Some(b'\\') if with_echar => '\\',
            Some(&b) => {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidEscape(format!(
                    "\\{}",
                    char::from(b).escape_debug()
                ))));
            }
            None => {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct("escape")));
            }
        };
        self.i += 2;
        Ok(c)
    }

    fn decode_hex_escape(&mut self, len: usize) -> Result<char, TurtleSyntaxError> {
        let bytes = self.line.as_bytes();
        let mut code_point: u32 = 0;
        for j in 0..len {
            let digit = match bytes.get(self.i + 2 + j) {
                Some(b @ b'0'..=b'9') => u32::from(b - b'0'),
                Some(b @ b'a'..=b'f') => u32::from(b - b'a') + 10,
                Some(b @ b'A'..=b'F') => u32::from(b - b'A') + 10,
                _ => {
                    return Err(self.error(TurtleSyntaxErrorKind::InvalidEscape(
                        if len == 4 { "\\u" } else { "\\U" }.to_owned()
                            + " needs 4 or 8 hexadecimal digits",
                    )));
                }
            };
            code_point = code_point * 16 + digit;
        }
        let c = char::from_u32(code_point)
            .ok_or_else(|| self.error(TurtleSyntaxErrorKind::InvalidCodePoint(code_point)))?;
        self.i += 2 + len;
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Subject;
    use std::collections::VecDeque;

    fn quads(input: &str, with_graph_name: bool) -> Result<Vec<Quad>, TurtleParseError> {
        let mut scanner = LineScanner::new(input.as_bytes(), with_graph_name, false);
        let mut sink = VecDeque::new();
        while scanner.step(&mut sink)? {}
        Ok(sink.into_iter().collect())
    }

    #[test]
    fn one_triple_per_line() {
        let quads = quads(
            "# header\n<http://a/s> <http://a/p> \"hello\" .\n\n<http://a/s> <http://a/p> <http://a/o> . # note\n",
            false,
        )
        .unwrap();
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].subject.to_string(), "<http://a/s>");
        assert_eq!(quads[0].object.to_string(), "\"hello\"");
        assert_eq!(quads[1].object.to_string(), "<http://a/o>");
    }

    #[test]
    fn graph_terms_need_the_quad_mode() {
        let result = quads(
            "<http://a/s> <http://a/p> \"o\"@en-GB <http://a/g> .",
            true,
        )
        .unwrap();
        assert_eq!(result[0].graph_name.to_string(), "<http://a/g>");
        assert_eq!(result[0].object.to_string(), "\"o\"@en-gb");
        assert!(quads("<http://a/s> <http://a/p> \"o\" <http://a/g> .", false).is_err());
    }

    #[test]
    fn blank_node_labels_are_stable_within_a_document() {
        let quads = quads("_:a <http://a/p> _:b .\n_:b <http://a/p> _:a .", false).unwrap();
        let Subject::BlankNode(first) = &quads[0].subject else {
            panic!("expected a blank node");
        };
        assert_eq!(Term::from(first.clone()), quads[1].object);
        assert_ne!(quads[0].object, quads[1].object);
    }

    #[test]
    fn escapes_are_decoded() {
        let quads = quads(
            r#"<http://a/s> <http://a/p> "a\nbé\U0001F600" ."#,
            false,
        )
        .unwrap();
        assert_eq!(
            quads[0].object.to_string(),
            "\"a\\nb\u{00E9}\u{1F600}\""
        );
    }

    #[test]
    fn missing_terminator_is_reported() {
        let error = quads("<http://a/s> <http://a/p> \"o\"", false).unwrap_err();
        let TurtleParseError::Syntax(error) = error else {
            panic!("expected a syntax error");
        };
        assert!(matches!(
            error.kind(),
            TurtleSyntaxErrorKind::MissingStatementTerminator
        ));
    }

    #[test]
    fn surrogate_escapes_are_rejected() {
        let error = quads(r#"<http://a/s> <http://a/p> "\uD83D" ."#, false).unwrap_err();
        let TurtleParseError::Syntax(error) = error else {
            panic!("expected a syntax error");
        };
        assert!(matches!(
            error.kind(),
            TurtleSyntaxErrorKind::InvalidCodePoint(0xD83D)
        ));
    }

    #[test]
    fn relative_iris_are_rejected_in_strict_mode() {
        assert!(quads("<s> <http://a/p> <http://a/o> .", false).is_err());
        let lenient: Vec<_> = {
            let mut scanner = LineScanner::new(
                "<s> <http://a/p> <http://a/o> .".as_bytes(),
                false,
                true,
            );
            let mut sink = VecDeque::new();
            while scanner.step(&mut sink).unwrap() {}
            sink.into_iter().collect()
        };
        assert_eq!(lenient.len(), 1);
    }
}
