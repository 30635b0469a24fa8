//! Integer stream encodings.
//!
//! A [`Codec`] is a factory value selecting one of the two supported on-disk encodings. It creates matched
//! [`IntReader`] / [`IntWriter`] pairs, so a file written by one codec is always read back by the same one.
//!
//! * [`Codec::Binary`] - raw 4-byte big-endian two's-complement integers, no header, no delimiters.
//! * [`Codec::Text`] - ASCII decimal integers joined by `", "`, no header, no trailing delimiter.
//!
//! Neither format carries a length prefix: the end of the file is the end of the data.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

pub mod binary;
pub mod text;

use binary::{BinaryDecoder, BinaryEncoder};
use text::{TextDecoder, TextEncoder};

/// Integer stream error.
#[derive(Debug)]
pub enum CodecError {
    /// No more values in the stream. Expected loop terminator, never a failure.
    EndOfStream,
    /// Common I/O error.
    IO(io::Error),
    /// The stream ends in the middle of a binary value.
    Truncated { trailing: usize },
    /// A text token could not be parsed as an integer.
    Malformed(String),
}

impl CodecError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, CodecError::EndOfStream)
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            CodecError::IO(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            CodecError::EndOfStream => write!(f, "end of stream"),
            CodecError::IO(err) => write!(f, "I/O operation failed: {}", err),
            CodecError::Truncated { trailing } => {
                write!(f, "stream truncated: {} trailing byte(s) do not form a value", trailing)
            }
            CodecError::Malformed(token) => write!(f, "malformed integer token: {:?}", token),
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::IO(err)
    }
}

/// Integer stream encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Binary,
    Text,
}

impl Codec {
    /// Opens a buffered reader over the file.
    pub fn create_reader(&self, path: &Path) -> io::Result<IntReader<io::BufReader<fs::File>>> {
        self.create_reader_with_capacity(path, None)
    }

    /// Opens a reader over the file using `buf_size` bytes of read buffer if set.
    pub fn create_reader_with_capacity(
        &self,
        path: &Path,
        buf_size: Option<usize>,
    ) -> io::Result<IntReader<io::BufReader<fs::File>>> {
        let file = fs::File::open(path)?;
        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(self.reader(reader));
    }

    /// Creates (or truncates) the file and opens a buffered writer over it.
    pub fn create_writer(&self, path: &Path) -> io::Result<IntWriter<io::BufWriter<fs::File>>> {
        self.create_writer_with_capacity(path, None)
    }

    /// Creates (or truncates) the file using `buf_size` bytes of write buffer if set.
    pub fn create_writer_with_capacity(
        &self,
        path: &Path,
        buf_size: Option<usize>,
    ) -> io::Result<IntWriter<io::BufWriter<fs::File>>> {
        let file = fs::File::create(path)?;
        let writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        return Ok(self.writer(writer));
    }

    /// Wraps an arbitrary buffered source.
    pub fn reader<R: BufRead>(&self, inner: R) -> IntReader<R> {
        let decoder = match self {
            Codec::Binary => Decoder::Binary(BinaryDecoder::new(inner)),
            Codec::Text => Decoder::Text(TextDecoder::new(inner)),
        };

        IntReader {
            decoder,
            cache: Lookahead::default(),
            eof: false,
        }
    }

    /// Wraps an arbitrary sink.
    pub fn writer<W: Write>(&self, inner: W) -> IntWriter<W> {
        let encoder = match self {
            Codec::Binary => Encoder::Binary(BinaryEncoder::new(inner)),
            Codec::Text => Encoder::Text(TextEncoder::new(inner)),
        };

        IntWriter { encoder }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::Text
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Codec::Binary),
            "text" | "txt" => Ok(Codec::Text),
            other => Err(format!("unknown codec: {}", other)),
        }
    }
}

impl Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Binary => write!(f, "binary"),
            Codec::Text => write!(f, "text"),
        }
    }
}

/// Single-slot peek buffer in front of a stream.
#[derive(Debug, Clone, Copy, Default)]
struct Lookahead {
    has_value: bool,
    value: i32,
}

enum Decoder<R> {
    Binary(BinaryDecoder<R>),
    Text(TextDecoder<R>),
}

impl<R: BufRead> Decoder<R> {
    fn at_end(&mut self) -> io::Result<bool> {
        match self {
            Decoder::Binary(decoder) => decoder.at_end(),
            Decoder::Text(decoder) => decoder.at_end(),
        }
    }

    fn decode(&mut self) -> Result<i32, CodecError> {
        match self {
            Decoder::Binary(decoder) => decoder.decode(),
            Decoder::Text(decoder) => decoder.decode(),
        }
    }
}

/// Forward-only integer cursor with a one-value lookahead slot.
///
/// `read_value`, `read_block`, `read_all` and `is_eof` address the stream behind the slot, while
/// `cached_value` and `cache_next_value` manage the slot itself. Once end of stream has been observed
/// the reader stays at end of stream.
pub struct IntReader<R> {
    decoder: Decoder<R>,
    cache: Lookahead,
    eof: bool,
}

impl<R: BufRead> IntReader<R> {
    /// Reads the next value from the stream.
    /// Fails with [`CodecError::EndOfStream`] if the stream is exhausted.
    pub fn read_value(&mut self) -> Result<i32, CodecError> {
        if self.eof {
            return Err(CodecError::EndOfStream);
        }

        let result = self.decoder.decode();
        if let Err(CodecError::EndOfStream) = result {
            self.eof = true;
        }

        return result;
    }

    /// Fills `buf` with up to `buf.len()` values and returns the number of values read.
    /// Reaching the end of the stream is not an error.
    pub fn read_block(&mut self, buf: &mut [i32]) -> Result<usize, CodecError> {
        let mut n = 0;

        for slot in buf.iter_mut() {
            match self.read_value() {
                Ok(value) => *slot = value,
                Err(CodecError::EndOfStream) => break,
                Err(err) => return Err(err),
            }
            n += 1;
        }

        return Ok(n);
    }

    /// Appends every remaining value to `buf` and returns the number of values read.
    pub fn read_all(&mut self, buf: &mut Vec<i32>) -> Result<usize, CodecError> {
        let start = buf.len();

        loop {
            match self.read_value() {
                Ok(value) => buf.push(value),
                Err(CodecError::EndOfStream) => break,
                Err(err) => return Err(err),
            }
        }

        return Ok(buf.len() - start);
    }

    /// Checks whether the stream holds no further values.
    pub fn is_eof(&mut self) -> Result<bool, CodecError> {
        if !self.eof {
            self.eof = self.decoder.at_end()?;
        }

        return Ok(self.eof);
    }

    /// Returns the value held by the lookahead slot, reading ahead if the slot is empty.
    /// Fails with [`CodecError::EndOfStream`] if nothing is left to peek.
    pub fn cached_value(&mut self) -> Result<i32, CodecError> {
        if !self.cache.has_value && !self.cache_next_value() {
            return Err(CodecError::EndOfStream);
        }

        return Ok(self.cache.value);
    }

    /// Replaces the slot content with the next stream value.
    /// Returns `false` if there is none; read failures are treated as the end of the stream.
    pub fn cache_next_value(&mut self) -> bool {
        match self.read_value() {
            Ok(value) => {
                self.cache = Lookahead { has_value: true, value };
                true
            }
            Err(CodecError::EndOfStream) => {
                self.cache.has_value = false;
                false
            }
            Err(err) => {
                log::warn!("stream read failed, treating it as end of stream: {}", err);
                self.cache.has_value = false;
                self.eof = true;
                false
            }
        }
    }
}

enum Encoder<W> {
    Binary(BinaryEncoder<W>),
    Text(TextEncoder<W>),
}

/// Append-only integer sink.
pub struct IntWriter<W> {
    encoder: Encoder<W>,
}

impl<W: Write> IntWriter<W> {
    pub fn write_value(&mut self, value: i32) -> io::Result<()> {
        match &mut self.encoder {
            Encoder::Binary(encoder) => encoder.encode(value),
            Encoder::Text(encoder) => encoder.encode(value),
        }
    }

    pub fn write_block(&mut self, values: &[i32]) -> io::Result<()> {
        for value in values {
            self.write_value(*value)?;
        }

        return Ok(());
    }

    /// Flushes buffered data and returns the underlying sink.
    pub fn close(self) -> io::Result<W> {
        let mut inner = match self.encoder {
            Encoder::Binary(encoder) => encoder.into_inner(),
            Encoder::Text(encoder) => encoder.into_inner(),
        };
        inner.flush()?;

        return Ok(inner);
    }
}
