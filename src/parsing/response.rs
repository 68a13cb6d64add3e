use std::borrow::Cow;
use std::io::{self, BufReader, Read};

use http::header::{HeaderName, HeaderValue};
use http::StatusCode;

use crate::error::{InvalidResponseKind, Result};
use crate::parsing::buffers::{self, trim_ows, MAX_LINE_LEN};
use crate::parsing::{BodyReader, HeaderList};

/// Status line and header block of a response.
#[derive(Clone, Debug)]
pub struct ResponseHead {
    pub version: String,
    pub status: StatusCode,
    pub reason: String,
    pub headers: HeaderList,
}

fn read_head_line<R>(reader: &mut BufReader<R>, line: &mut Vec<u8>) -> Result
where
    R: Read,
{
    match buffers::read_line(reader, line, MAX_LINE_LEN) {
        Ok(_) => Ok(()),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
            ) =>
        {
            Err(InvalidResponseKind::Truncated.into())
        }
        Err(err) if err.kind() == io::ErrorKind::InvalidData => Err(InvalidResponseKind::LineTooLong.into()),
        Err(err) => Err(err.into()),
    }
}

fn parse_status_line(line: &[u8]) -> Result<(String, StatusCode, String)> {
    let line = String::from_utf8_lossy(line);
    let mut parts = line.trim_start().splitn(3, ' ');

    let version = parts.next().ok_or(InvalidResponseKind::StatusLine)?;
    if !version.starts_with("HTTP/") {
        return Err(InvalidResponseKind::StatusLine.into());
    }

    let code = parts.next().ok_or(InvalidResponseKind::StatusLine)?;
    let status = StatusCode::from_bytes(code.as_bytes()).map_err(|_| InvalidResponseKind::StatusCode)?;
    let reason = parts.next().unwrap_or("").trim();

    Ok((version.to_owned(), status, reason.to_owned()))
}

/// Read a response head from the reader, stopping right after the blank line which ends it.
///
/// Header names keep the casing used by the server. Fields with an invalid name are dropped,
/// fields with an invalid value and folded lines make the whole head invalid.
pub fn parse_response_head<R>(reader: &mut BufReader<R>, max_headers: usize) -> Result<ResponseHead>
where
    R: Read,
{
    let mut line = Vec::new();

    read_head_line(reader, &mut line)?;
    let (version, status, reason) = parse_status_line(&line)?;

    let mut headers = HeaderList::new();

    loop {
        read_head_line(reader, &mut line)?;
        if line.is_empty() {
            break;
        } else if line[0] == b' ' || line[0] == b'\t' {
            // obsolete line folding
            return Err(InvalidResponseKind::Header.into());
        } else if headers.len() == max_headers {
            return Err(InvalidResponseKind::TooManyHeaders.into());
        }

        let col = line
            .iter()
            .position(|&c| c == b':')
            .ok_or(InvalidResponseKind::Header)?;

        let name = &line[..col];
        if let Err(err) = HeaderName::from_bytes(name) {
            warn!(
                "Dropped invalid response header {:?}: {}",
                String::from_utf8_lossy(name),
                err
            );
            continue;
        }

        let value = HeaderValue::from_bytes(trim_ows(&line[col + 1..])).map_err(|_| InvalidResponseKind::Header)?;
        headers.append(String::from_utf8_lossy(name).into_owned(), value);
    }

    debug!("parsed response head: {} {} with {} headers", version, status, headers.len());

    Ok(ResponseHead {
        version,
        status,
        reason,
        headers,
    })
}

/// Read a complete response, head and body, from the reader.
pub fn parse_response<R>(reader: R, max_headers: usize) -> Result<Response>
where
    R: Read,
{
    let mut reader = BufReader::new(reader);
    let head = parse_response_head(&mut reader, max_headers)?;

    let mut body = Vec::new();
    BodyReader::new(&head, reader)?.read_to_end(&mut body)?;

    Ok(Response {
        status: head.status,
        reason: head.reason,
        headers: head.headers,
        body,
    })
}

/// `Response` represents a response returned by the target server, after the tunnel.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    reason: String,
    headers: HeaderList,
    body: Vec<u8>,
}

impl Response {
    /// Get the status code of this `Response`.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the reason phrase of this `Response`.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Get the headers of this `Response`.
    #[inline]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Checks if the status code of this `Response` was a success code.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the body of this `Response`.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the body of this `Response` as text, invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.body)
    }
}
