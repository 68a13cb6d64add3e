//! One-shot check that a proxy receives the headers sent to it and returns the expected header.

use http::StatusCode;
use url::Url;

use crate::config::RunnerConfig;
use crate::exchange::HeaderExchangeRecord;
use crate::parsing::{HeaderList, Response};
use crate::request::{PreparedRequest, RequestForm};
use crate::streams::{CancelToken, ProxyStream};
use crate::tunnel::{ProxyEndpoint, ProxyHeaders, TunnelClient};
use crate::{ErrorKind, Result};

/// Where the expected header was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderSource {
    /// In the proxy's answer to the CONNECT request.
    Tunnel,
    /// In the response of the target server, or of the proxy for plain http requests.
    Response,
}

/// Result of a successful check.
#[derive(Clone, Debug)]
pub struct Outcome {
    header: String,
    value: String,
    source: HeaderSource,
    exchange: HeaderExchangeRecord,
    status: StatusCode,
}

impl Outcome {
    /// Name of the header which was checked.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Value of the header, invalid UTF-8 sequences replaced.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the header came from the CONNECT answer or from the final response.
    pub fn source(&self) -> HeaderSource {
        self.source
    }

    /// Headers exchanged with the proxy.
    pub fn exchange(&self) -> &HeaderExchangeRecord {
        &self.exchange
    }

    /// Status of the final response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Issues one request through the proxy and looks for the expected header.
#[derive(Debug)]
pub struct Runner {
    config: RunnerConfig,
    client: TunnelClient,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Runner {
        let client = TunnelClient::new(config.tunnel_settings());
        Runner { config, client }
    }

    /// Description of the check, printed before running it.
    pub fn banner(&self) -> String {
        let title = "Testing proxy headers";
        let mut out = format!("{}\n{}\n", title, "=".repeat(title.len()));
        out += &format!("Proxy URL: {}\n", self.config.get_proxy_url());
        out += &format!("Test URL: {}\n", self.config.get_test_url());
        out += &format!("Checking for header: {}\n", self.config.get_proxy_header());
        if let Some((name, value)) = self.config.get_send_header() {
            out += &format!("Sending header: {}: {}\n", name, value);
        }
        out
    }

    /// The `[PASS]` or `[FAIL]` line for the result of `run`.
    pub fn report(&self, result: &Result<Outcome>) -> String {
        match result {
            Ok(outcome) if self.config.is_verbose() => {
                format!("[PASS] Received header {}: {}", outcome.header, outcome.value)
            }
            Ok(outcome) => format!("[PASS] Received header {}", outcome.header),
            Err(err) => format!("[FAIL] {}", err),
        }
    }

    /// Run the check.
    ///
    /// https URLs go through a CONNECT tunnel; the header is looked up in the proxy's answer
    /// to the CONNECT request first, then in the target's response. Plain http URLs are sent
    /// to the proxy directly and the header is looked up in the response. The timeout of the
    /// configuration bounds the whole exchange.
    pub fn run(&self) -> Result<Outcome> {
        let proxy = ProxyEndpoint::parse(self.config.get_proxy_url())?;
        let url = Url::parse(self.config.get_test_url())
            .map_err(|_| ErrorKind::InvalidUrl(self.config.get_test_url().to_owned()))?;
        let headers = self.config.proxy_headers()?;

        match url.scheme() {
            "https" => self.run_tunnel(&proxy, &url, headers),
            "http" => self.run_forward(&proxy, &url, headers),
            _ => Err(ErrorKind::InvalidUrl(url.to_string()).into()),
        }
    }

    fn run_tunnel(&self, proxy: &ProxyEndpoint, url: &Url, headers: ProxyHeaders) -> Result<Outcome> {
        let host = url.host_str().ok_or_else(|| ErrorKind::InvalidUrl(url.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ErrorKind::InvalidUrl(url.to_string()))?;
        let target = format!("{}:{}", host, port);

        let settings = self.client.settings();
        let cancel = CancelToken::new();

        let (exchange, resp) = self.client.guarded(&cancel, |deadline| {
            let (exchange, stream) = self.client.open_tls(proxy, &target, &headers, deadline, &cancel)?;
            debug!("tunnel established, proxy sent {} headers", exchange.received().len());

            let resp = PreparedRequest::new(url, RequestForm::Origin, settings.get_user_agent())
                .send(stream, settings.max_headers)?;
            Ok((exchange, resp))
        })?;

        self.check(exchange, &resp, true)
    }

    fn run_forward(&self, proxy: &ProxyEndpoint, url: &Url, headers: ProxyHeaders) -> Result<Outcome> {
        let settings = self.client.settings();
        let cancel = CancelToken::new();

        let resp = self.client.guarded(&cancel, |deadline| {
            let stream = ProxyStream::connect(proxy, settings, deadline, &cancel)?;
            PreparedRequest::new(url, RequestForm::Absolute, settings.get_user_agent())
                .proxy_headers(&headers, proxy.basic_auth())
                .send(stream, settings.max_headers)
        })?;

        if resp.status() == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
            return Err(ErrorKind::ProxyRefused {
                status: resp.status(),
                reason: resp.reason().to_owned(),
                headers: resp.headers().clone(),
            }
            .into());
        }

        // Without a tunnel the proxy's answer is the response itself.
        let exchange = HeaderExchangeRecord::from_parts(headers, resp.status(), resp.headers().clone());
        self.check(exchange, &resp, false)
    }

    fn check(&self, exchange: HeaderExchangeRecord, resp: &Response, tunnelled: bool) -> Result<Outcome> {
        let name = self.config.get_proxy_header();

        if !resp.is_success() {
            return Err(ErrorKind::UnexpectedStatus(resp.status()).into());
        }

        let from_tunnel = if tunnelled { find(exchange.received(), name) } else { None };
        let found = from_tunnel
            .map(|v| (v, HeaderSource::Tunnel))
            .or_else(|| find(resp.headers(), name).map(|v| (v, HeaderSource::Response)));

        match found {
            Some((value, source)) => Ok(Outcome {
                header: name.to_owned(),
                value,
                source,
                status: resp.status(),
                exchange,
            }),
            None => Err(ErrorKind::HeaderNotFound(name.to_owned()).into()),
        }
    }
}

fn find(headers: &HeaderList, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

#[cfg(test)]
mod test {
    use super::Runner;
    use crate::config::RunnerConfig;
    use crate::ErrorKind;

    #[test]
    fn test_banner() {
        let runner = Runner::new(
            RunnerConfig::new("http://proxy:31280")
                .test_url("https://api.ipify.org?format=json")
                .send_header("X-ProxyMesh-Country", "US"),
        );

        assert_eq!(
            runner.banner(),
            "Testing proxy headers\n\
             =====================\n\
             Proxy URL: http://proxy:31280\n\
             Test URL: https://api.ipify.org?format=json\n\
             Checking for header: X-ProxyMesh-IP\n\
             Sending header: X-ProxyMesh-Country: US\n"
        );
    }

    #[test]
    fn test_report_failure() {
        let runner = Runner::new(RunnerConfig::new("http://proxy:31280"));
        let line = runner.report(&Err(ErrorKind::HeaderNotFound("X-ProxyMesh-IP".into()).into()));
        assert_eq!(line, "[FAIL] Header 'X-ProxyMesh-IP' not found in response");
    }

    #[test]
    fn test_run_rejects_unsupported_scheme() {
        let runner = Runner::new(RunnerConfig::new("http://127.0.0.1:9").test_url("ftp://example.com/file"));
        let err = runner.run().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_run_rejects_bad_proxy_url() {
        let runner = Runner::new(RunnerConfig::new("socks5://127.0.0.1:1080"));
        let err = runner.run().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidProxyUrl(_)));
    }
}
