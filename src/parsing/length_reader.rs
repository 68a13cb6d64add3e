use std::cmp;
use std::io::{self, Read};

/// Reads exactly `length` bytes from the inner reader, then reports the end of the body.
pub struct LengthReader<R>
where
    R: Read,
{
    inner: R,
    remaining: u64,
}

impl<R> LengthReader<R>
where
    R: Read,
{
    pub fn new(inner: R, length: u64) -> LengthReader<R> {
        LengthReader {
            inner,
            remaining: length,
        }
    }
}

impl<R> Read for LengthReader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let count = cmp::min(buf.len() as u64, self.remaining) as usize;
        let n = self.inner.read(&mut buf[..count])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before the end of the body",
            ));
        }

        self.remaining -= n as u64;
        Ok(n)
    }
}

#[test]
fn test_read_stops_at_length() {
    let mut reader = LengthReader::new(&b"hello world"[..], 5);
    let mut body = Vec::new();

    reader.read_to_end(&mut body).unwrap();
    assert_eq!(body, b"hello");
}

#[test]
fn test_read_tiny_buf() {
    let mut reader = LengthReader::new(&b"hello"[..], 5);
    let mut buf = [0u8; 2];

    assert_eq!(reader.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"he");
    assert_eq!(reader.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"ll");
    assert_eq!(reader.read(&mut buf).unwrap(), 1);
    assert_eq!(&buf[..1], b"o");
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_read_short_body() {
    let mut reader = LengthReader::new(&b"hel"[..], 5);
    let mut body = Vec::new();

    let err = reader.read_to_end(&mut body).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}
