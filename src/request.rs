use std::io::{prelude::*, BufWriter};

use http::header::{ACCEPT, CONNECTION, HOST, PROXY_AUTHORIZATION, USER_AGENT};
use http::{Method, Version};
use url::Url;

use crate::error::{ErrorKind, Result};
use crate::parsing::{parse_response, Response};
use crate::tunnel::ProxyHeaders;

/// How the request target is written on the request line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestForm {
    /// Path and query, for requests sent to the origin or through a tunnel.
    Origin,
    /// Full URL, for plain http requests sent to a proxy.
    Absolute,
}

/// A GET request to the target server, sent once the connection or tunnel is ready.
#[derive(Debug)]
pub struct PreparedRequest<'a> {
    url: &'a Url,
    form: RequestForm,
    user_agent: &'a str,
    extra: Option<&'a ProxyHeaders>,
    proxy_auth: Option<String>,
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| ErrorKind::InvalidUrl(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_owned(),
    })
}

impl<'a> PreparedRequest<'a> {
    pub fn new(url: &'a Url, form: RequestForm, user_agent: &'a str) -> PreparedRequest<'a> {
        PreparedRequest {
            url,
            form,
            user_agent,
            extra: None,
            proxy_auth: None,
        }
    }

    /// Attach headers meant for the proxy, for plain http requests which the proxy forwards itself.
    pub fn proxy_headers(mut self, extra: &'a ProxyHeaders, proxy_auth: Option<String>) -> PreparedRequest<'a> {
        self.extra = Some(extra);
        self.proxy_auth = proxy_auth;
        self
    }

    pub fn write_request<W>(&self, writer: W) -> Result
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);
        let method = Method::GET;
        let version = Version::HTTP_11;

        let target = match (self.form, self.url.query()) {
            (RequestForm::Absolute, _) => self.url.as_str().to_owned(),
            (RequestForm::Origin, Some(query)) => format!("{}?{}", self.url.path(), query),
            (RequestForm::Origin, None) => self.url.path().to_owned(),
        };

        debug!("{} {} {:?}", method.as_str(), target, version);

        write!(writer, "{} {} {:?}\r\n", method.as_str(), target, version)?;
        write!(writer, "{}: {}\r\n", canonical(HOST.as_str()), host_header(self.url)?)?;
        write!(writer, "{}: {}\r\n", canonical(USER_AGENT.as_str()), self.user_agent)?;
        write!(writer, "{}: */*\r\n", canonical(ACCEPT.as_str()))?;
        write!(writer, "{}: close\r\n", canonical(CONNECTION.as_str()))?;

        if let Some(extra) = self.extra {
            if let Some(auth) = &self.proxy_auth {
                if !extra.contains(PROXY_AUTHORIZATION.as_str()) {
                    write!(writer, "Proxy-Authorization: {}\r\n", auth)?;
                }
            }

            for (name, value) in extra.iter() {
                if name.eq_ignore_ascii_case(HOST.as_str()) {
                    continue;
                }
                write!(writer, "{}: ", name)?;
                writer.write_all(value.as_bytes())?;
                write!(writer, "\r\n")?;
            }
        }

        write!(writer, "\r\n")?;
        writer.flush()?;

        Ok(())
    }

    /// Write the request to the stream and read the whole response.
    pub fn send<S>(&self, mut stream: S, max_headers: usize) -> Result<Response>
    where
        S: Read + Write,
    {
        self.write_request(&mut stream)?;
        let resp = parse_response(stream, max_headers)?;
        debug!("status code {}", resp.status().as_u16());
        Ok(resp)
    }
}

/// Capitalize each dash separated word of a lowercase header name.
fn canonical(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
