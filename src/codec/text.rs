//! Delimited decimal encoding: `1, -2, 3`.

use std::io;
use std::io::prelude::*;

use super::CodecError;

pub const DELIMITER: &str = ", ";

/// Longest token the decoder buffers: `-2147483648` plus room for surrounding whitespace.
pub const MAX_TOKEN_LEN: usize = 32;

pub struct TextDecoder<R> {
    inner: R,
    token: Vec<u8>,
}

impl<R: BufRead> TextDecoder<R> {
    pub fn new(inner: R) -> Self {
        TextDecoder {
            inner,
            token: Vec::new(),
        }
    }

    /// Skips leading whitespace and reports whether anything is left.
    pub fn at_end(&mut self) -> io::Result<bool> {
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(true);
            }

            let blank = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            if blank == 0 {
                return Ok(false);
            }
            self.inner.consume(blank);
        }
    }

    pub fn decode(&mut self) -> Result<i32, CodecError> {
        if self.at_end()? {
            return Err(CodecError::EndOfStream);
        }

        self.token.clear();
        if self.read_token()? {
            self.skip_delimiter_tail()?;
        }

        let token = String::from_utf8_lossy(&self.token);
        let token = token.trim();

        return token.parse::<i32>().map_err(|_| CodecError::Malformed(token.to_string()));
    }

    /// Moves bytes up to the next `,` into the token and consumes the `,` itself.
    /// Returns whether a delimiter was found. Fails once the token outgrows [`MAX_TOKEN_LEN`].
    fn read_token(&mut self) -> Result<bool, CodecError> {
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(false);
            }

            let (take, delimited) = match buf.iter().position(|&b| b == b',') {
                Some(pos) => (pos, true),
                None => (buf.len(), false),
            };

            let room = MAX_TOKEN_LEN - self.token.len();
            if take > room {
                self.token.extend_from_slice(&buf[..room]);
                self.inner.consume(room);

                let prefix = String::from_utf8_lossy(&self.token);
                return Err(CodecError::Malformed(format!("{}...", prefix.trim())));
            }

            self.token.extend_from_slice(&buf[..take]);
            if delimited {
                self.inner.consume(take + 1);
                return Ok(true);
            }
            self.inner.consume(take);
        }
    }

    fn skip_delimiter_tail(&mut self) -> Result<(), CodecError> {
        let tail = DELIMITER.as_bytes()[1];

        let next = self.inner.fill_buf()?.first().copied();

        match next {
            Some(b) if b == tail => {
                self.inner.consume(1);
                Ok(())
            }
            _ => {
                let token = String::from_utf8_lossy(&self.token).into_owned();
                Err(CodecError::Malformed(format!("{},", token)))
            }
        }
    }
}

pub struct TextEncoder<W> {
    inner: W,
    dirty: bool,
}

impl<W: Write> TextEncoder<W> {
    pub fn new(inner: W) -> Self {
        TextEncoder { inner, dirty: false }
    }

    pub fn encode(&mut self, value: i32) -> io::Result<()> {
        if self.dirty {
            self.inner.write_all(DELIMITER.as_bytes())?;
        }
        write!(self.inner, "{}", value)?;
        self.dirty = true;

        return Ok(());
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
