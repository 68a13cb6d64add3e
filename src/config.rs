//! Configuration of the proxy header check, read from the environment.

use std::env;
use std::time::Duration;

use crate::tunnel::{ProxyHeaders, TunnelSettings};
use crate::{ErrorKind, Result};

/// URL requested when `TEST_URL` is not set.
pub const DEFAULT_TEST_URL: &str = "https://api.ipify.org?format=json";
/// Header expected from the proxy when `PROXY_HEADER` is not set.
pub const DEFAULT_PROXY_HEADER: &str = "X-ProxyMesh-IP";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn get_env(name: &str) -> Option<String> {
    let upper = name.to_ascii_uppercase();
    match env::var(&upper).or_else(|_| env::var(name.to_ascii_lowercase())) {
        Ok(s) if s.trim().is_empty() => None,
        Ok(s) => Some(s),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!("Environment variable {} contains non-unicode characters", upper);
            None
        }
    }
}

/// Settings of a single proxy header check.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    proxy_url: String,
    test_url: String,
    proxy_header: String,
    send_header: Option<(String, String)>,
    timeout: Duration,
    verbose: bool,
    accept_invalid_certs: bool,
}

impl RunnerConfig {
    /// Create a configuration for this proxy, everything else at its default.
    pub fn new(proxy_url: impl Into<String>) -> RunnerConfig {
        RunnerConfig {
            proxy_url: proxy_url.into(),
            test_url: DEFAULT_TEST_URL.to_owned(),
            proxy_header: DEFAULT_PROXY_HEADER.to_owned(),
            send_header: None,
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            accept_invalid_certs: false,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// * `PROXY_URL` or `HTTPS_PROXY`: proxy URL, required.
    /// * `TEST_URL`: URL to request, defaults to [`DEFAULT_TEST_URL`].
    /// * `PROXY_HEADER`: header expected in the responses, defaults to [`DEFAULT_PROXY_HEADER`].
    /// * `SEND_PROXY_HEADER` and `SEND_PROXY_VALUE`: header sent to the proxy, only when both are set.
    /// * `PROXY_TIMEOUT`: deadline of the tunnel setup in seconds, defaults to 30.
    pub fn from_env() -> Result<RunnerConfig> {
        RunnerConfig::from_lookup(get_env)
    }

    /// Read the configuration through a lookup function, `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<RunnerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let proxy_url = lookup("PROXY_URL")
            .or_else(|| lookup("HTTPS_PROXY"))
            .ok_or_else(|| ErrorKind::MissingConfig("PROXY_URL or HTTPS_PROXY".into()))?;

        let mut config = RunnerConfig::new(proxy_url);

        if let Some(url) = lookup("TEST_URL") {
            config.test_url = url;
        }
        if let Some(header) = lookup("PROXY_HEADER") {
            config.proxy_header = header;
        }
        if let (Some(name), Some(value)) = (lookup("SEND_PROXY_HEADER"), lookup("SEND_PROXY_VALUE")) {
            config.send_header = Some((name, value));
        }
        if let Some(timeout) = lookup("PROXY_TIMEOUT") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid PROXY_TIMEOUT value {:?}", timeout),
            }
        }

        Ok(config)
    }

    /// Set the URL requested through the proxy.
    pub fn test_url(mut self, url: impl Into<String>) -> RunnerConfig {
        self.test_url = url.into();
        self
    }

    /// Set the header expected from the proxy.
    pub fn proxy_header(mut self, name: impl Into<String>) -> RunnerConfig {
        self.proxy_header = name.into();
        self
    }

    /// Set a header sent to the proxy.
    pub fn send_header(mut self, name: impl Into<String>, value: impl Into<String>) -> RunnerConfig {
        self.send_header = Some((name.into(), value.into()));
        self
    }

    /// Set the deadline of the whole check, from dialing the proxy to the final response.
    pub fn timeout(mut self, timeout: Duration) -> RunnerConfig {
        self.timeout = timeout;
        self
    }

    /// Report the value of the header on success.
    pub fn verbose(mut self, verbose: bool) -> RunnerConfig {
        self.verbose = verbose;
        self
    }

    /// Accept any certificate from the target server.
    ///
    /// # Danger
    /// Only meant for local test servers with self-signed certificates.
    pub fn danger_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> RunnerConfig {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// URL of the proxy, as configured.
    pub fn get_proxy_url(&self) -> &str {
        &self.proxy_url
    }

    /// URL requested through the proxy.
    pub fn get_test_url(&self) -> &str {
        &self.test_url
    }

    /// Name of the header expected back.
    pub fn get_proxy_header(&self) -> &str {
        &self.proxy_header
    }

    /// Header sent to the proxy, if any, as a name and value.
    pub fn get_send_header(&self) -> Option<(&str, &str)> {
        self.send_header.as_ref().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Whether the value of the received header is printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Headers to send to the proxy.
    pub fn proxy_headers(&self) -> Result<ProxyHeaders> {
        let mut headers = ProxyHeaders::new();
        if let Some((name, value)) = &self.send_header {
            headers.insert(name.as_str(), value.as_str())?;
        }
        Ok(headers)
    }

    /// Settings of the tunnel client.
    pub fn tunnel_settings(&self) -> TunnelSettings {
        TunnelSettings::default()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
    }
}
