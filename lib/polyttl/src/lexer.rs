//! Tokenizer for the combined Turtle + TriG grammar.

use crate::toolkit::{
    StreamReader, TextPosition, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind,
};
use std::fmt;
use std::io::Read;
use std::ops::Range;

/// A token of the Turtle/TriG grammar, with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<...>`, with `\u`/`\U` escapes resolved and without the angle brackets.
    IriRef(String),
    /// `prefix:local`, with the local `\` escapes resolved.
    PrefixedName { prefix: String, local: String },
    /// `_:label`, without `_:` and without a trailing `.`.
    BlankNodeLabel(String),
    /// A short or long string, with ECHAR and UCHAR escapes resolved.
    String(String),
    Integer(String),
    Decimal(String),
    Double(String),
    /// `@prefix`, `@base` or a language tag, without the leading `@`.
    AtKeyword(String),
    A,
    True,
    False,
    Graph,
    Prefix,
    Base,
    Dot,
    Semicolon,
    Comma,
    LSquare,
    RSquare,
    LParen,
    RParen,
    LCurly,
    RCurly,
    HatHat,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IriRef(iri) => write!(f, "<{iri}>"),
            Self::PrefixedName { prefix, local } => write!(f, "{prefix}:{local}"),
            Self::BlankNodeLabel(label) => write!(f, "_:{label}"),
            Self::String(_) => f.write_str("a string literal"),
            Self::Integer(value) | Self::Decimal(value) | Self::Double(value) => {
                f.write_str(value)
            }
            Self::AtKeyword(value) => write!(f, "@{value}"),
            Self::A => f.write_str("'a'"),
            Self::True => f.write_str("'true'"),
            Self::False => f.write_str("'false'"),
            Self::Graph => f.write_str("'GRAPH'"),
            Self::Prefix => f.write_str("'PREFIX'"),
            Self::Base => f.write_str("'BASE'"),
            Self::Dot => f.write_str("'.'"),
            Self::Semicolon => f.write_str("';'"),
            Self::Comma => f.write_str("','"),
            Self::LSquare => f.write_str("'['"),
            Self::RSquare => f.write_str("']'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LCurly => f.write_str("'{'"),
            Self::RCurly => f.write_str("'}'"),
            Self::HatHat => f.write_str("'^^'"),
            Self::End => f.write_str("end of file"),
        }
    }
}

/// A streaming tokenizer for Turtle and TriG documents.
///
/// Tokens are recognized longest-match, keywords only at word boundaries.
/// Values are handed out already decoded (see [`Token`]).
pub struct TurtleTokenizer<R: Read> {
    reader: StreamReader<R>,
    token_start: TextPosition,
}

impl<R: Read> TurtleTokenizer<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: StreamReader::new(source),
            token_start: TextPosition::default(),
        }
    }

    /// The span of the last token, for error reporting.
    pub fn location(&self) -> Range<TextPosition> {
        self.token_start..self.reader.position()
    }

    /// Recognizes the next token. Returns [`Token::End`] once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, TurtleParseError> {
        self.skip_whitespace_and_comments()?;
        self.token_start = self.reader.position();
        let Some(c) = self.reader.peek(0)? else {
            return Ok(Token::End);
        };
        match c {
            '<' => self.recognize_iri_ref(),
            '"' | '\'' => self.recognize_string(c),
            '@' => self.recognize_at_keyword(),
            '_' => self.recognize_blank_node_label(),
            '^' => {
                if self.reader.peek(1)? == Some('^') {
                    self.reader.consume(2)?;
                    Ok(Token::HatHat)
                } else {
                    Err(self.error(TurtleSyntaxErrorKind::InvalidToken(
                        "'^' must be doubled into the '^^' datatype marker".into(),
                    )))
                }
            }
            '.' => {
                if matches!(self.reader.peek(1)?, Some('0'..='9')) {
                    self.recognize_number()
                } else {
                    self.reader.consume(1)?;
                    Ok(Token::Dot)
                }
            }
            ';' => self.punctuation(Token::Semicolon),
            ',' => self.punctuation(Token::Comma),
            '[' => self.punctuation(Token::LSquare),
            ']' => self.punctuation(Token::RSquare),
            '(' => self.punctuation(Token::LParen),
            ')' => self.punctuation(Token::RParen),
            '{' => self.punctuation(Token::LCurly),
            '}' => self.punctuation(Token::RCurly),
            '0'..='9' | '+' | '-' => self.recognize_number(),
            _ => self.recognize_pname_or_keyword(),
        }
    }

    fn punctuation(&mut self, token: Token) -> Result<Token, TurtleParseError> {
        self.reader.consume(1)?;
        Ok(token)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), TurtleParseError> {
        loop {
            match self.reader.peek(0)? {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.reader.consume(1)?;
                }
                Some('#') => {
                    // Line comment, runs to the end of the line
                    while !matches!(self.reader.peek(0)?, None | Some('\r' | '\n')) {
                        let width = self.peek_width(0)?;
                        self.reader.consume(width)?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek_width(&mut self, offset: usize) -> Result<usize, TurtleParseError> {
        Ok(self.reader.peek(offset)?.map_or(0, char::len_utf8))
    }

    // [18] IRIREF ::= '<' ([^#x00-#x20<>"{}|^`\] | UCHAR)* '>'
    fn recognize_iri_ref(&mut self) -> Result<Token, TurtleParseError> {
        self.reader.consume(1)?;
        let mut iri = String::new();
        loop {
            let Some(c) = self.reader.peek(0)? else {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct("IRI")));
            };
            match c {
                '>' => {
                    self.reader.consume(1)?;
                    return Ok(Token::IriRef(iri));
                }
                '\\' => {
                    let c = self.recognize_unicode_escape()?;
                    Self::check_iri_char(c).map_err(|kind| self.error_at_cursor(kind))?;
                    iri.push(c);
                }
                _ => {
                    Self::check_iri_char(c).map_err(|kind| self.error_at_cursor(kind))?;
                    self.reader.consume(c.len_utf8())?;
                    iri.push(c);
                }
            }
        }
    }

    fn check_iri_char(c: char) -> Result<(), TurtleSyntaxErrorKind> {
        if c <= '\u{20}' || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
            Err(TurtleSyntaxErrorKind::InvalidToken(format!(
                "the character '{}' is not allowed in IRIs",
                c.escape_debug()
            )))
        } else {
            Ok(())
        }
    }

    // [22]/[23] short strings, [24]/[25] long strings
    fn recognize_string(&mut self, delimiter: char) -> Result<Token, TurtleParseError> {
        let long_delimiter = if delimiter == '"' { "\"\"\"" } else { "'''" };
        if self.reader.peek_prefix(long_delimiter, false)? {
            return self.recognize_long_string(delimiter);
        }
        self.reader.consume(1)?;
        let mut string = String::new();
        loop {
            let Some(c) = self.reader.peek(0)? else {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct(
                    "string literal",
                )));
            };
            match c {
                c if c == delimiter => {
                    self.reader.consume(1)?;
                    return Ok(Token::String(string));
                }
                '\\' => string.push(self.recognize_string_escape()?),
                '\n' | '\r' => {
                    return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(
                        "line jumps are not allowed in string literals, use \\n".into(),
                    )));
                }
                _ => {
                    self.reader.consume(c.len_utf8())?;
                    string.push(c);
                }
            }
        }
    }

    fn recognize_long_string(&mut self, delimiter: char) -> Result<Token, TurtleParseError> {
        self.reader.consume(3)?;
        let mut string = String::new();
        loop {
            let Some(c) = self.reader.peek(0)? else {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct(
                    "long string literal",
                )));
            };
            match c {
                c if c == delimiter => {
                    if self.reader.peek(1)? == Some(delimiter)
                        && self.reader.peek(2)? == Some(delimiter)
                    {
                        // A longer delimiter run keeps its leading quotes in the content
                        if self.reader.peek(3)? == Some(delimiter) {
                            self.reader.consume(1)?;
                            string.push(delimiter);
                        } else {
                            self.reader.consume(3)?;
                            return Ok(Token::String(string));
                        }
                    } else {
                        self.reader.consume(1)?;
                        string.push(delimiter);
                    }
                }
                '\\' => string.push(self.recognize_string_escape()?),
                _ => {
                    self.reader.consume(c.len_utf8())?;
                    string.push(c);
                }
            }
        }
    }

    // [159s] ECHAR ::= '\' [tbnrf"'\] plus UCHAR
    fn recognize_string_escape(&mut self) -> Result<char, TurtleParseError> {
        match self.reader.peek(1)? {
            Some('u' | 'U') => self.recognize_unicode_escape(),
            Some('t') => self.echar('\t'),
            Some('b') => self.echar('\u{08}'),
            Some('n') => self.echar('\n'),
            Some('r') => self.echar('\r'),
            Some('f') => self.echar('\u{0C}'),
            Some('"') => self.echar('"'),
            Some('\'') => self.echar('\''),
            Some('\\') => self.echar('\\'),
            Some(c) => Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidEscape(format!(
                "\\{c}"
            )))),
            None => Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct(
                "string literal",
            ))),
        }
    }

    fn echar(&mut self, decoded: char) -> Result<char, TurtleParseError> {
        self.reader.consume(2)?;
        Ok(decoded)
    }

    // [26] UCHAR ::= '\u' HEX{4} | '\U' HEX{8}
    fn recognize_unicode_escape(&mut self) -> Result<char, TurtleParseError> {
        let len = match self.reader.peek(1)? {
            Some('u') => 4,
            Some('U') => 8,
            Some(c) => {
                return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidEscape(format!(
                    "\\{c}"
                ))));
            }
            None => {
                return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct("escape")));
            }
        };
        let mut code_point: u32 = 0;
        for i in 0..len {
            let digit = match self.reader.peek(2 + i)? {
                Some(c @ '0'..='9') => u32::from(c) - u32::from('0'),
                Some(c @ 'a'..='f') => u32::from(c) - u32::from('a') + 10,
                Some(c @ 'A'..='F') => u32::from(c) - u32::from('A') + 10,
                _ => {
                    return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidEscape(
                        if len == 4 { "\\u" } else { "\\U" }.to_owned()
                            + "needs 4 or 8 hexadecimal digits",
                    )));
                }
            };
            code_point = code_point * 16 + digit;
        }
        let c = char::from_u32(code_point)
            .ok_or_else(|| self.error_at_cursor(TurtleSyntaxErrorKind::InvalidCodePoint(code_point)))?;
        self.reader.consume(2 + len)?;
        Ok(c)
    }

    // [39] langtag-like tokens: '@' [a-zA-Z]+ ('-' [a-zA-Z0-9]+)*
    fn recognize_at_keyword(&mut self) -> Result<Token, TurtleParseError> {
        self.reader.consume(1)?;
        let mut value = String::new();
        if !matches!(self.reader.peek(0)?, Some(c) if c.is_ascii_alphabetic()) {
            return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(
                "a language tag or directive keyword must follow '@'".into(),
            )));
        }
        while let Some(c) = self.reader.peek(0)? {
            if c.is_ascii_alphabetic() {
                self.reader.consume(1)?;
                value.push(c);
            } else {
                break;
            }
        }
        while self.reader.peek(0)? == Some('-')
            && matches!(self.reader.peek(1)?, Some(c) if c.is_ascii_alphanumeric())
        {
            self.reader.consume(1)?;
            value.push('-');
            while let Some(c) = self.reader.peek(0)? {
                if c.is_ascii_alphanumeric() {
                    self.reader.consume(1)?;
                    value.push(c);
                } else {
                    break;
                }
            }
        }
        Ok(Token::AtKeyword(value))
    }

    // [141s] BLANK_NODE_LABEL ::= '_:' (PN_CHARS_U | [0-9]) ((PN_CHARS | '.')* PN_CHARS)?
    fn recognize_blank_node_label(&mut self) -> Result<Token, TurtleParseError> {
        if self.reader.peek(1)? != Some(':') {
            return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidToken(
                "'_' must start a '_:' blank node label".into(),
            )));
        }
        self.reader.consume(2)?;
        let mut label = String::new();
        match self.reader.peek(0)? {
            Some(c) if is_pn_chars_u(c) || c.is_ascii_digit() => {
                self.reader.consume(c.len_utf8())?;
                label.push(c);
            }
            _ => {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(
                    "a blank node label cannot be empty".into(),
                )));
            }
        }
        loop {
            match self.reader.peek(0)? {
                Some(c) if is_pn_chars(c) => {
                    self.reader.consume(c.len_utf8())?;
                    label.push(c);
                }
                Some('.') => {
                    // Dots are only part of the label when more label characters follow
                    let mut dots = 1;
                    while self.reader.peek(dots)? == Some('.') {
                        dots += 1;
                    }
                    if matches!(self.reader.peek(dots)?, Some(c) if is_pn_chars(c)) {
                        self.reader.consume(dots)?;
                        for _ in 0..dots {
                            label.push('.');
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(Token::BlankNodeLabel(label))
    }

    // [19] INTEGER, [20] DECIMAL, [21] DOUBLE with [154s] EXPONENT
    fn recognize_number(&mut self) -> Result<Token, TurtleParseError> {
        let mut i = 0;
        if matches!(self.reader.peek(0)?, Some('+' | '-')) {
            i += 1;
        }
        let digits_before = self.count_digits(i)?;
        i += digits_before;
        let mut has_dot = false;
        let mut digits_after = 0;
        if self.reader.peek(i)? == Some('.') {
            digits_after = self.count_digits(i + 1)?;
            if digits_after > 0 || matches!(self.reader.peek(i + 1)?, Some('e' | 'E')) {
                has_dot = true;
                i += 1 + digits_after;
            }
        }
        if matches!(self.reader.peek(i)?, Some('e' | 'E')) {
            if digits_before == 0 && digits_after == 0 {
                return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidToken(
                    "a double needs digits before its exponent".into(),
                )));
            }
            i += 1;
            if matches!(self.reader.peek(i)?, Some('+' | '-')) {
                i += 1;
            }
            let exponent_digits = self.count_digits(i)?;
            if exponent_digits == 0 {
                return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidToken(
                    "a double exponent cannot be empty".into(),
                )));
            }
            i += exponent_digits;
            return Ok(Token::Double(self.reader.consume(i)?));
        }
        if has_dot && digits_after > 0 {
            return Ok(Token::Decimal(self.reader.consume(i)?));
        }
        if digits_before == 0 {
            return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidToken(
                "a number needs at least one digit".into(),
            )));
        }
        // A trailing '.' with no digits after it is the statement terminator
        Ok(Token::Integer(self.reader.consume(i)?))
    }

    fn count_digits(&mut self, from: usize) -> Result<usize, TurtleParseError> {
        let mut count = 0;
        while matches!(self.reader.peek(from + count)?, Some('0'..='9')) {
            count += 1;
        }
        Ok(count)
    }

    // [139s] PNAME_NS, [140s] PNAME_LN, plus the bare keywords
    fn recognize_pname_or_keyword(&mut self) -> Result<Token, TurtleParseError> {
        let mut word = String::new();
        match self.reader.peek(0)? {
            Some(':') => {}
            Some(c) if is_pn_chars_base(c) => {
                self.reader.consume(c.len_utf8())?;
                word.push(c);
                loop {
                    match self.reader.peek(0)? {
                        Some(c) if is_pn_chars(c) => {
                            self.reader.consume(c.len_utf8())?;
                            word.push(c);
                        }
                        Some('.') => {
                            let mut dots = 1;
                            while self.reader.peek(dots)? == Some('.') {
                                dots += 1;
                            }
                            match self.reader.peek(dots)? {
                                Some(c) if is_pn_chars(c) => {
                                    self.reader.consume(dots)?;
                                    for _ in 0..dots {
                                        word.push('.');
                                    }
                                }
                                Some(':') => {
                                    return Err(self.error_at_cursor(
                                        TurtleSyntaxErrorKind::InvalidToken(format!(
                                            "the prefix '{word}.' may not end with '.'"
                                        )),
                                    ));
                                }
                                _ => break,
                            }
                        }
                        _ => break,
                    }
                }
            }
            Some(c) => {
                return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidToken(format!(
                    "unexpected character '{}'",
                    c.escape_debug()
                ))));
            }
            None => return Ok(Token::End),
        }
        if self.reader.peek(0)? == Some(':') {
            self.reader.consume(1)?;
            let local = self.recognize_pn_local()?;
            return Ok(Token::PrefixedName {
                prefix: word,
                local,
            });
        }
        // Keywords are only recognized at a word boundary, which the scan
        // loop above guarantees
        Ok(match word.as_str() {
            "a" => Token::A,
            "true" => Token::True,
            "false" => Token::False,
            _ if word.eq_ignore_ascii_case("graph") => Token::Graph,
            _ if word.eq_ignore_ascii_case("prefix") => Token::Prefix,
            _ if word.eq_ignore_ascii_case("base") => Token::Base,
            _ => {
                return Err(self.error(TurtleSyntaxErrorKind::InvalidToken(format!(
                    "unexpected keyword '{word}'"
                ))));
            }
        })
    }

    // [168s] PN_LOCAL ::= (PN_CHARS_U | ':' | [0-9] | PLX) ((PN_CHARS | '.' | ':' | PLX)* (PN_CHARS | ':' | PLX))?
    fn recognize_pn_local(&mut self) -> Result<String, TurtleParseError> {
        let mut local = String::new();
        let mut first = true;
        loop {
            match self.reader.peek(0)? {
                Some(c)
                    if c == ':'
                        || if first {
                            is_pn_chars_u(c) || c.is_ascii_digit()
                        } else {
                            is_pn_chars(c)
                        } =>
                {
                    self.reader.consume(c.len_utf8())?;
                    local.push(c);
                }
                Some('%') => {
                    let (a, b) = (self.reader.peek(1)?, self.reader.peek(2)?);
                    match (a, b) {
                        (Some(a), Some(b)) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit() => {
                            self.reader.consume(3)?;
                            local.push('%');
                            local.push(a);
                            local.push(b);
                        }
                        _ => {
                            return Err(self.error_at_cursor(
                                TurtleSyntaxErrorKind::InvalidEscape(
                                    "'%' must be followed by two hexadecimal digits in prefixed names"
                                        .into(),
                                ),
                            ));
                        }
                    }
                }
                Some('\\') => match self.reader.peek(1)? {
                    Some(
                        c @ ('_' | '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*'
                        | '+' | ',' | ';' | '=' | '/' | '?' | '#' | '@' | '%'),
                    ) => {
                        self.reader.consume(2)?;
                        local.push(c);
                    }
                    Some(c) => {
                        return Err(self.error_at_cursor(TurtleSyntaxErrorKind::InvalidEscape(
                            format!("'\\{c}' is not a valid prefixed name escape"),
                        )));
                    }
                    None => {
                        return Err(self.error(TurtleSyntaxErrorKind::UnterminatedConstruct(
                            "prefixed name escape",
                        )));
                    }
                },
                Some('.') if !first => {
                    // Trailing dots belong to the next statement, inner dots to the name
                    let mut dots = 1;
                    while self.reader.peek(dots)? == Some('.') {
                        dots += 1;
                    }
                    if matches!(self.reader.peek(dots)?, Some(c) if is_pn_chars(c) || matches!(c, ':' | '%' | '\\'))
                    {
                        self.reader.consume(dots)?;
                        for _ in 0..dots {
                            local.push('.');
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
            first = false;
        }
        Ok(local)
    }

    fn error(&self, kind: TurtleSyntaxErrorKind) -> TurtleParseError {
        TurtleSyntaxError::new(kind, self.token_start..self.reader.position()).into()
    }

    /// An error attached to the lookahead the cursor is stuck on.
    fn error_at_cursor(&self, kind: TurtleSyntaxErrorKind) -> TurtleParseError {
        TurtleSyntaxError::new(kind, self.reader.position()..self.reader.position()).into()
    }
}

// [157s] PN_CHARS_BASE
pub(crate) fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

// [158s] PN_CHARS_U ::= PN_CHARS_BASE | '_'
pub(crate) fn is_pn_chars_u(c: char) -> bool {
    is_pn_chars_base(c) || c == '_'
}

// [160s] PN_CHARS ::= PN_CHARS_U | '-' | [0-9] | #x00B7 | [#x0300-#x036F] | [#x203F-#x2040]
pub(crate) fn is_pn_chars(c: char) -> bool {
    is_pn_chars_u(c)
        || matches!(c,
            '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut tokenizer = TurtleTokenizer::new(input.as_bytes());
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token().unwrap();
            if token == Token::End {
                return tokens;
            }
            tokens.push(token);
        }
    }

    fn error_kind(input: &str) -> TurtleSyntaxErrorKind {
        let mut tokenizer = TurtleTokenizer::new(input.as_bytes());
        loop {
            match tokenizer.next_token() {
                Ok(Token::End) => panic!("no error in {input}"),
                Ok(_) => (),
                Err(TurtleParseError::Syntax(e)) => {
                    return match e.kind() {
                        TurtleSyntaxErrorKind::InvalidToken(m) => {
                            TurtleSyntaxErrorKind::InvalidToken(m.clone())
                        }
                        TurtleSyntaxErrorKind::UnterminatedConstruct(c) => {
                            TurtleSyntaxErrorKind::UnterminatedConstruct(*c)
                        }
                        TurtleSyntaxErrorKind::InvalidEscape(m) => {
                            TurtleSyntaxErrorKind::InvalidEscape(m.clone())
                        }
                        TurtleSyntaxErrorKind::InvalidCodePoint(c) => {
                            TurtleSyntaxErrorKind::InvalidCodePoint(*c)
                        }
                        _ => panic!("unexpected kind"),
                    };
                }
                Err(e) => panic!("unexpected I/O error: {e}"),
            }
        }
    }

    #[test]
    fn punctuation_and_keywords() {
        assert_eq!(
            tokens("a true false GRAPH prefix . ; , [ ] ( ) { } ^^"),
            [
                Token::A,
                Token::True,
                Token::False,
                Token::Graph,
                Token::Prefix,
                Token::Dot,
                Token::Semicolon,
                Token::Comma,
                Token::LSquare,
                Token::RSquare,
                Token::LParen,
                Token::RParen,
                Token::LCurly,
                Token::RCurly,
                Token::HatHat,
            ]
        );
    }

    #[test]
    fn iri_refs_decode_uchar() {
        assert_eq!(
            tokens("<http://example.com/\\u00E9>"),
            [Token::IriRef("http://example.com/\u{00E9}".into())]
        );
        assert!(matches!(
            error_kind("<http://example.com/ >"),
            TurtleSyntaxErrorKind::InvalidToken(_)
        ));
        assert!(matches!(
            error_kind("<http://example.com/x"),
            TurtleSyntaxErrorKind::UnterminatedConstruct("IRI")
        ));
    }

    #[test]
    fn uchar_bounds() {
        assert!(matches!(
            error_kind(r#""\uD800""#),
            TurtleSyntaxErrorKind::InvalidCodePoint(0xD800)
        ));
        assert!(matches!(
            error_kind(r#""\U00110000""#),
            TurtleSyntaxErrorKind::InvalidCodePoint(0x0011_0000)
        ));
        assert_eq!(
            tokens(r#""\U0010FFFF""#),
            [Token::String("\u{10FFFF}".into())]
        );
    }

    #[test]
    fn strings_decode_echar() {
        assert_eq!(
            tokens(r#""a\tb\\c\"d""#),
            [Token::String("a\tb\\c\"d".into())]
        );
        assert_eq!(tokens(r#"'x''y'"#), [
            Token::String("x".into()),
            Token::String("y".into())
        ]);
        assert!(matches!(
            error_kind(r#""a\xb""#),
            TurtleSyntaxErrorKind::InvalidEscape(_)
        ));
    }

    #[test]
    fn long_strings_allow_inner_delimiters() {
        assert_eq!(
            tokens("\"\"\"a\"b\"\"c\nd\"\"\""),
            [Token::String("a\"b\"\"c\nd".into())]
        );
        // A run of four delimiters keeps one quote in the content
        assert_eq!(tokens("\"\"\"b\"\"\"\""), [Token::String("b\"".into())]);
        assert_eq!(tokens("''''''"), [Token::String(String::new())]);
    }

    #[test]
    fn numbers_follow_longest_match() {
        assert_eq!(
            tokens("4 -2.5 +1e3 1.e3 .5"),
            [
                Token::Integer("4".into()),
                Token::Decimal("-2.5".into()),
                Token::Double("+1e3".into()),
                Token::Double("1.e3".into()),
                Token::Decimal(".5".into()),
            ]
        );
        // The trailing dot is a statement terminator, not part of the number
        assert_eq!(
            tokens("5."),
            [Token::Integer("5".into()), Token::Dot]
        );
    }

    #[test]
    fn at_keywords_and_language_tags() {
        assert_eq!(
            tokens("@prefix @base @en-GB-x-private"),
            [
                Token::AtKeyword("prefix".into()),
                Token::AtKeyword("base".into()),
                Token::AtKeyword("en-GB-x-private".into()),
            ]
        );
    }

    #[test]
    fn blank_node_labels_drop_the_trailing_dot() {
        assert_eq!(
            tokens("_:b1."),
            [Token::BlankNodeLabel("b1".into()), Token::Dot]
        );
        assert_eq!(
            tokens("_:a.b.c."),
            [Token::BlankNodeLabel("a.b.c".into()), Token::Dot]
        );
    }

    #[test]
    fn prefixed_names_unescape_the_local_part() {
        assert_eq!(
            tokens(r"ex:with\,comma"),
            [Token::PrefixedName {
                prefix: "ex".into(),
                local: "with,comma".into()
            }]
        );
        assert_eq!(
            tokens("ex:%41b."),
            [
                Token::PrefixedName {
                    prefix: "ex".into(),
                    local: "%41b".into()
                },
                Token::Dot
            ]
        );
        assert_eq!(
            tokens(":x a:"),
            [
                Token::PrefixedName {
                    prefix: String::new(),
                    local: "x".into()
                },
                Token::PrefixedName {
                    prefix: "a".into(),
                    local: String::new()
                }
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("# a comment\n5 # trailing\n"),
            [Token::Integer("5".into())]
        );
    }
}
