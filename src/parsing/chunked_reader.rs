use std::cmp;
use std::io::{self, BufReader, Read};
use std::str;

use crate::parsing::buffers::{self, trim_ows, MAX_LINE_LEN};

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn parse_chunk_size(line: &[u8]) -> io::Result<u64> {
    // chunk extensions are ignored
    let size = line.iter().position(|&b| b == b';').map_or(line, |idx| &line[..idx]);
    let size = str::from_utf8(trim_ows(size)).map_err(|_| invalid("cannot decode chunk size as utf-8"))?;
    u64::from_str_radix(size, 16).map_err(|_| invalid("cannot decode chunk size as hex"))
}

enum State {
    Size,
    Data { remaining: u64 },
    Done,
}

/// Decodes a body sent with `Transfer-Encoding: chunked`.
pub struct ChunkedReader<R>
where
    R: Read,
{
    inner: BufReader<R>,
    state: State,
    line: Vec<u8>,
}

impl<R> ChunkedReader<R>
where
    R: Read,
{
    pub fn new(reader: BufReader<R>) -> ChunkedReader<R> {
        ChunkedReader {
            inner: reader,
            state: State::Size,
            line: Vec::new(),
        }
    }

    fn read_line(&mut self) -> io::Result<()> {
        buffers::read_line(&mut self.inner, &mut self.line, MAX_LINE_LEN).map(|_| ())
    }

    fn read_chunk_size(&mut self) -> io::Result<u64> {
        self.read_line()?;
        parse_chunk_size(&self.line)
    }

    fn read_chunk_end(&mut self) -> io::Result<()> {
        self.read_line()?;
        if self.line.is_empty() {
            Ok(())
        } else {
            Err(invalid("invalid chunk, error in chunked encoding"))
        }
    }

    fn read_trailers(&mut self) -> io::Result<()> {
        loop {
            self.read_line()?;
            if self.line.is_empty() {
                return Ok(());
            }
            debug!("ignoring trailer {:?}", String::from_utf8_lossy(&self.line));
        }
    }
}

impl<R> Read for ChunkedReader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.state {
                State::Done => return Ok(0),
                State::Size => {
                    let size = self.read_chunk_size()?;
                    debug!("chunk size is {}", size);

                    if size == 0 {
                        self.read_trailers()?;
                        self.state = State::Done;
                    } else {
                        self.state = State::Data { remaining: size };
                    }
                }
                State::Data { remaining } => {
                    if buf.is_empty() {
                        return Ok(0);
                    }

                    let count = cmp::min(buf.len() as u64, remaining) as usize;
                    let n = self.inner.read(&mut buf[..count])?;
                    if n == 0 {
                        return Err(io::ErrorKind::UnexpectedEof.into());
                    }

                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        self.read_chunk_end()?;
                        self.state = State::Size;
                    } else {
                        self.state = State::Data { remaining };
                    }

                    return Ok(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, Read};

    use super::{parse_chunk_size, ChunkedReader};

    fn decode(raw: &[u8]) -> io::Result<Vec<u8>> {
        let mut reader = ChunkedReader::new(BufReader::new(raw));
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        Ok(body)
    }

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size(b"1a").unwrap(), 26);
        assert_eq!(parse_chunk_size(b"FF;name=value").unwrap(), 255);
        assert_eq!(parse_chunk_size(b"0 ").unwrap(), 0);
        assert!(parse_chunk_size(b"zz").is_err());
        assert!(parse_chunk_size(b"").is_err());
    }

    #[test]
    fn test_decode_chunks() {
        let body = decode(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n").unwrap();
        assert_eq!(body, b"Wikipedia");
    }

    #[test]
    fn test_decode_with_trailers() {
        let body = decode(b"3\r\nabc\r\n0\r\nX-Trailer: 1\r\n\r\n").unwrap();
        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_decode_truncated_chunk() {
        let err = decode(b"a\r\nabc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_missing_chunk_end() {
        let err = decode(b"3\r\nabcdef\r\n0\r\n\r\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
