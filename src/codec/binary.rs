//! Fixed-width big-endian encoding.

use std::io;
use std::io::prelude::*;

use super::CodecError;

const VALUE_SIZE: usize = std::mem::size_of::<i32>();

pub struct BinaryDecoder<R> {
    inner: R,
}

impl<R: BufRead> BinaryDecoder<R> {
    pub fn new(inner: R) -> Self {
        BinaryDecoder { inner }
    }

    pub fn at_end(&mut self) -> io::Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    pub fn decode(&mut self) -> Result<i32, CodecError> {
        let mut bytes = [0u8; VALUE_SIZE];
        let mut filled = 0;

        // read_exact would hide how many bytes of a partial value were present
        while filled < VALUE_SIZE {
            match self.inner.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::IO(err)),
            }
        }

        match filled {
            0 => Err(CodecError::EndOfStream),
            VALUE_SIZE => Ok(i32::from_be_bytes(bytes)),
            trailing => Err(CodecError::Truncated { trailing }),
        }
    }
}

pub struct BinaryEncoder<W> {
    inner: W,
}

impl<W: Write> BinaryEncoder<W> {
    pub fn new(inner: W) -> Self {
        BinaryEncoder { inner }
    }

    pub fn encode(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_all(&value.to_be_bytes())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use rstest::*;

    use super::{BinaryDecoder, BinaryEncoder};
    use crate::codec::CodecError;

    #[rstest]
    #[case(0, [0x00, 0x00, 0x00, 0x00])]
    #[case(1, [0x00, 0x00, 0x00, 0x01])]
    #[case(-1, [0xff, 0xff, 0xff, 0xff])]
    #[case(258, [0x00, 0x00, 0x01, 0x02])]
    #[case(i32::MAX, [0x7f, 0xff, 0xff, 0xff])]
    #[case(i32::MIN, [0x80, 0x00, 0x00, 0x00])]
    fn test_encoding(#[case] value: i32, #[case] bytes: [u8; 4]) {
        let mut encoder = BinaryEncoder::new(Vec::new());
        encoder.encode(value).unwrap();
        assert_eq!(encoder.into_inner(), bytes.to_vec());

        let mut decoder = BinaryDecoder::new(Cursor::new(bytes.to_vec()));
        assert_eq!(decoder.decode().unwrap(), value);
        assert_eq!(decoder.at_end().unwrap(), true);
    }

    #[rstest]
    #[case(vec![0x01], 1)]
    #[case(vec![0x00, 0x00, 0x00, 0x05, 0x01, 0x02, 0x03], 3)]
    fn test_truncated(#[case] bytes: Vec<u8>, #[case] expected_trailing: usize) {
        let mut decoder = BinaryDecoder::new(Cursor::new(bytes));

        let result = loop {
            match decoder.decode() {
                Ok(_) => continue,
                Err(err) => break err,
            }
        };

        match result {
            CodecError::Truncated { trailing } => assert_eq!(trailing, expected_trailing),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_end_of_stream() {
        let mut decoder = BinaryDecoder::new(Cursor::new(Vec::new()));
        assert!(decoder.decode().unwrap_err().is_end_of_stream());
    }
}
