use crate::toolkit::error::{TextPosition, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind};
use std::io::Read;
use std::str;

pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A UTF-8 character cursor over a byte source.
///
/// The cursor exposes bounded lookahead with [`peek`](StreamReader::peek) and
/// [`peek_prefix`](StreamReader::peek_prefix) and moves forward only, with
/// [`consume`](StreamReader::consume). The underlying source is read in chunks
/// on demand, so lookahead never requires the whole input to be in memory.
pub struct StreamReader<R: Read> {
    source: R,
    buffer: Vec<u8>,
    start: usize,
    eof: bool,
    chunk_size: usize,
    position: TextPosition,
    last_char_was_cr: bool,
}

impl<R: Read> StreamReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            start: 0,
            eof: false,
            chunk_size: chunk_size.max(16),
            position: TextPosition::default(),
            last_char_was_cr: false,
        }
    }

    /// The position of the cursor in the input.
    pub fn position(&self) -> TextPosition {
        self.position
    }

    /// Returns the character `offset` code points after the cursor without consuming anything.
    ///
    /// Returns `None` if the input ends before that character.
    pub fn peek(&mut self, offset: usize) -> Result<Option<char>, TurtleParseError> {
        let mut i = self.start;
        let mut remaining = offset;
        loop {
            let Some((c, width)) = self.decode_at(i)? else {
                return Ok(None);
            };
            if remaining == 0 {
                return Ok(Some(c));
            }
            remaining -= 1;
            i += width;
        }
    }

    /// Checks whether the input at the cursor starts with `word`.
    pub fn peek_prefix(
        &mut self,
        word: &str,
        case_insensitive: bool,
    ) -> Result<bool, TurtleParseError> {
        let word = word.as_bytes();
        self.ensure_available(word.len())?;
        let Some(data) = self.buffer.get(self.start..self.start + word.len()) else {
            return Ok(false);
        };
        Ok(if case_insensitive {
            data.eq_ignore_ascii_case(word)
        } else {
            data == word
        })
    }

    /// Advances the cursor by exactly `n_bytes` bytes and returns the skipped slice.
    ///
    /// The skipped range must have been peeked before, so it is known to hold
    /// whole, valid UTF-8 characters.
    pub fn consume(&mut self, n_bytes: usize) -> Result<String, TurtleParseError> {
        self.ensure_available(n_bytes)?;
        debug_assert!(
            self.start + n_bytes <= self.buffer.len(),
            "consume({n_bytes}) beyond the peeked input"
        );
        let end = (self.start + n_bytes).min(self.buffer.len());
        let skipped = str::from_utf8(&self.buffer[self.start..end])
            .map_err(|_| self.encoding_error())?
            .to_owned();
        for c in skipped.chars() {
            match c {
                '\r' => {
                    self.position.line += 1;
                    self.position.column = 0;
                    self.last_char_was_cr = true;
                }
                '\n' => {
                    if !self.last_char_was_cr {
                        self.position.line += 1;
                    }
                    self.position.column = 0;
                    self.last_char_was_cr = false;
                }
                _ => {
                    self.position.column += 1;
                    self.last_char_was_cr = false;
                }
            }
        }
        self.position.offset += u64::try_from(end - self.start).unwrap_or(0);
        self.start = end;
        if self.start >= self.chunk_size {
            self.buffer.copy_within(self.start.., 0);
            self.buffer.truncate(self.buffer.len() - self.start);
            self.start = 0;
        }
        Ok(skipped)
    }

    /// Decodes the character starting at buffer index `i`, refilling as needed.
    fn decode_at(&mut self, i: usize) -> Result<Option<(char, usize)>, TurtleParseError> {
        self.ensure_available(i - self.start + 4)?;
        let Some(&byte) = self.buffer.get(i) else {
            return Ok(None);
        };
        let (mut code_point, bytes_needed, mut lower_boundary, mut upper_boundary) = match byte {
            0x00..=0x7F => return Ok(Some((char::from(byte), 1))),
            0xC2..=0xDF => (u32::from(byte) & 0x1F, 1, 0x80, 0xBF),
            0xE0..=0xEF => (
                u32::from(byte) & 0xF,
                2,
                if byte == 0xE0 { 0xA0 } else { 0x80 },
                if byte == 0xED { 0x9F } else { 0xBF },
            ),
            0xF0..=0xF4 => (
                u32::from(byte) & 0x7,
                3,
                if byte == 0xF0 { 0x90 } else { 0x80 },
                if byte == 0xF4 { 0x8F } else { 0xBF },
            ),
            _ => return Err(self.encoding_error().into()),
        };
        for j in 1..=bytes_needed {
            let Some(&byte) = self.buffer.get(i + j) else {
                // The input ends in the middle of a character
                return Err(self.encoding_error().into());
            };
            if byte < lower_boundary || upper_boundary < byte {
                return Err(self.encoding_error().into());
            }
            lower_boundary = 0x80;
            upper_boundary = 0xBF;
            code_point = (code_point << 6) | (u32::from(byte) & 0x3F);
        }
        match char::from_u32(code_point) {
            Some(c) => Ok(Some((c, bytes_needed + 1))),
            None => Err(self.encoding_error().into()),
        }
    }

    /// Makes sure at least `n` unconsumed bytes are buffered, unless the input ends before.
    fn ensure_available(&mut self, n: usize) -> Result<(), TurtleParseError> {
        while !self.eof && self.buffer.len() - self.start < n {
            let old_len = self.buffer.len();
            self.buffer.resize(old_len + self.chunk_size, 0);
            let read = self.source.read(&mut self.buffer[old_len..])?;
            self.buffer.truncate(old_len + read);
            self.eof = read == 0;
        }
        Ok(())
    }

    fn encoding_error(&self) -> TurtleSyntaxError {
        TurtleSyntaxError::new(
            TurtleSyntaxErrorKind::InvalidEncoding,
            self.position..self.position,
        )
    }
}
