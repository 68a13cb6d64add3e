use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("proxy-headers/", env!("CARGO_PKG_VERSION"));

/// Settings used to open tunnels.
///
/// This replaces the string keyed settings of crawling frameworks with an explicit struct.
/// Every setter consumes and returns the settings so they can be chained.
///
/// ```
/// use std::time::Duration;
/// use proxy_headers::TunnelSettings;
///
/// let settings = TunnelSettings::default()
///     .connect_timeout(Duration::from_secs(5))
///     .timeout(Duration::from_secs(20));
/// ```
#[derive(Clone, Debug)]
pub struct TunnelSettings {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_headers: usize,
    pub(crate) accept_invalid_certs: bool,
    pub(crate) accept_invalid_hostnames: bool,
    pub(crate) user_agent: String,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        TunnelSettings {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            timeout: None,
            max_headers: 100,
            accept_invalid_certs: false,
            accept_invalid_hostnames: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl TunnelSettings {
    /// Sets the connect timeout of each TCP connection attempt to the proxy.
    ///
    /// The default is 30 seconds.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Sets the read and write timeout of the socket.
    ///
    /// The default is 30 seconds.
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = duration;
        self
    }

    /// Sets a deadline over the whole tunnel setup, from the first connection attempt to the
    /// end of the proxy's response head.
    ///
    /// When it elapses the socket is shut down and the setup fails with `Timeout`.
    /// There is no deadline by default.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the maximum number of headers accepted in a response head.
    ///
    /// The default is 100.
    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    /// Sets the `User-Agent` sent with requests to the target.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets if certificates of TLS peers should be accepted even when they are invalid.
    ///
    /// # Danger
    /// Use this setting with care. This will accept **any** TLS certificate valid or not.
    /// If you are using self signed certificates, it is much safer to add their root CA
    /// to the system trust store.
    pub fn danger_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Sets if certificates of TLS peers should be accepted even when they do not match the hostname.
    ///
    /// # Danger
    /// Use this setting with care. This will accept TLS certificates that do not match the hostname.
    pub fn danger_accept_invalid_hostnames(mut self, accept_invalid_hostnames: bool) -> Self {
        self.accept_invalid_hostnames = accept_invalid_hostnames;
        self
    }

    /// Get the user agent sent with requests to the target.
    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the deadline over the tunnel setup, if any.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
