use std::io::{self, BufRead, BufReader, Read};

/// Maximum length of a single line in a response head.
pub const MAX_LINE_LEN: u64 = 16 * 1024;

/// Read a line terminated by `\n` or `\r\n` into `buf`, without the line ending.
///
/// Returns `UnexpectedEof` if the stream ends before the line ending and `InvalidData` if
/// no line ending is found within `max_buf_len` bytes.
pub fn read_line<R>(reader: &mut BufReader<R>, buf: &mut Vec<u8>, max_buf_len: u64) -> io::Result<usize>
where
    R: Read,
{
    buf.clear();
    let n = reader.take(max_buf_len).read_until(b'\n', buf)?;

    if buf.ends_with(b"\r\n") {
        buf.truncate(buf.len() - 2);
    } else if buf.ends_with(b"\n") {
        buf.truncate(buf.len() - 1);
    } else if n as u64 == max_buf_len {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "line too long"));
    } else {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }

    Ok(n)
}

/// Trim spaces and horizontal tabs, the optional whitespace around header values.
pub fn trim_ows(buf: &[u8]) -> &[u8] {
    let is_ows = |b: &u8| *b == b' ' || *b == b'\t';
    match buf.iter().position(|b| !is_ows(b)) {
        Some(start) => {
            let end = buf.iter().rposition(|b| !is_ows(b)).map_or(start, |n| n + 1);
            &buf[start..end]
        }
        None => &[],
    }
}

#[test]
fn test_read_line_lf() {
    let mut reader = BufReader::new(&b"hello\nworld\n"[..]);
    let mut line = Vec::new();

    assert_eq!(read_line(&mut reader, &mut line, MAX_LINE_LEN).ok(), Some(6));
    assert_eq!(line, b"hello");

    assert_eq!(read_line(&mut reader, &mut line, MAX_LINE_LEN).ok(), Some(6));
    assert_eq!(line, b"world");
}

#[test]
fn test_read_line_crlf() {
    let mut reader = BufReader::new(&b"HTTP/1.1 200 OK\r\n\r\n"[..]);
    let mut line = Vec::new();

    assert_eq!(read_line(&mut reader, &mut line, MAX_LINE_LEN).ok(), Some(17));
    assert_eq!(line, b"HTTP/1.1 200 OK");

    assert_eq!(read_line(&mut reader, &mut line, MAX_LINE_LEN).ok(), Some(2));
    assert_eq!(line, b"");
}

#[test]
fn test_read_line_truncated() {
    let mut reader = BufReader::new(&b"X-ProxyMesh-IP: 1.2"[..]);
    let mut line = Vec::new();

    assert_eq!(
        read_line(&mut reader, &mut line, MAX_LINE_LEN).unwrap_err().kind(),
        io::ErrorKind::UnexpectedEof
    );
}

#[test]
fn test_read_line_beyond_limit() {
    let mut reader = BufReader::new(&b"1234567890\n"[..]);
    let mut line = Vec::new();

    assert_eq!(
        read_line(&mut reader, &mut line, 5).unwrap_err().kind(),
        io::ErrorKind::InvalidData
    );
    assert_eq!(line, b"12345");
}

#[test]
fn test_trim_ows() {
    assert_eq!(trim_ows(b" \t1.2.3.4 \t"), b"1.2.3.4");
    assert_eq!(trim_ows(b"value"), b"value");
    assert_eq!(trim_ows(b"   "), b"");
}
