use std::io::{self, BufReader, Read};

use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};

use crate::error::{InvalidResponseKind, Result};
use crate::parsing::{ChunkedReader, HeaderList, LengthReader, ResponseHead};

/// Reader for a response body, framed according to the response head.
pub enum BodyReader<R>
where
    R: Read,
{
    Empty,
    Chunked(ChunkedReader<R>),
    Length(LengthReader<BufReader<R>>),
    Close(BufReader<R>),
}

impl<R> Read for BodyReader<R>
where
    R: Read,
{
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BodyReader::Empty => Ok(0),
            BodyReader::Chunked(r) => r.read(buf),
            BodyReader::Length(r) => r.read(buf),
            BodyReader::Close(r) => r.read(buf),
        }
    }
}

fn is_chunked(headers: &HeaderList) -> bool {
    // Only the last transfer coding decides the framing.
    headers
        .get_all(TRANSFER_ENCODING.as_str())
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .last()
        .map_or(false, |v| v.eq_ignore_ascii_case("chunked"))
}

impl<R> BodyReader<R>
where
    R: Read,
{
    pub fn new(head: &ResponseHead, reader: BufReader<R>) -> Result<BodyReader<R>> {
        let status = head.status;

        if status.is_informational()
            || status == http::StatusCode::NO_CONTENT
            || status == http::StatusCode::NOT_MODIFIED
        {
            debug!("status {} has no body", status.as_u16());
            Ok(BodyReader::Empty)
        } else if is_chunked(&head.headers) {
            debug!("body is chunked");
            Ok(BodyReader::Chunked(ChunkedReader::new(reader)))
        } else if let Some(val) = head.headers.get(CONTENT_LENGTH.as_str()) {
            let len: u64 = val
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or(InvalidResponseKind::ContentLength)?;
            debug!("body has length {}", len);
            Ok(BodyReader::Length(LengthReader::new(reader, len)))
        } else {
            debug!("body is delimited by the end of the connection");
            Ok(BodyReader::Close(reader))
        }
    }
}

#[cfg(test)]
mod test {
    use http::header::HeaderValue;

    use super::is_chunked;
    use crate::parsing::HeaderList;

    #[test]
    fn test_is_chunked() {
        let mut headers = HeaderList::new();
        assert!(!is_chunked(&headers));

        headers.append("Transfer-Encoding", HeaderValue::from_static("gzip, Chunked"));
        assert!(is_chunked(&headers));

        headers.append("transfer-encoding", HeaderValue::from_static("identity"));
        assert!(!is_chunked(&headers));
    }
}
