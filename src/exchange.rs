use http::StatusCode;

use crate::parsing::HeaderList;
use crate::tunnel::{ProxyHeaders, TunnelResponse};

/// Both sides of the header exchange with a proxy during a tunnel setup.
///
/// Built once the proxy has answered and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderExchangeRecord {
    sent: ProxyHeaders,
    status: StatusCode,
    received: HeaderList,
}

impl HeaderExchangeRecord {
    /// Record the headers sent with a CONNECT request and the proxy's answer to it.
    pub fn new(sent: ProxyHeaders, response: &TunnelResponse) -> HeaderExchangeRecord {
        HeaderExchangeRecord::from_parts(sent, response.status(), response.headers().clone())
    }

    /// Build a record from its parts, for exchanges which did not go through a tunnel.
    pub fn from_parts(sent: ProxyHeaders, status: StatusCode, received: HeaderList) -> HeaderExchangeRecord {
        HeaderExchangeRecord { sent, status, received }
    }

    /// Headers sent to the proxy, in wire order.
    pub fn sent(&self) -> &ProxyHeaders {
        &self.sent
    }

    /// Headers returned by the proxy, with their original casing.
    pub fn received(&self) -> &HeaderList {
        &self.received
    }

    /// Status code returned by the proxy.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Value of a header sent to the proxy, if it is valid UTF-8.
    pub fn sent_header(&self, name: &str) -> Option<&str> {
        self.sent.get_str(name)
    }

    /// Value of a header the proxy returned, if it is valid UTF-8. Lookup ignores case.
    pub fn received_header(&self, name: &str) -> Option<&str> {
        self.received.get_str(name)
    }

    /// Check if a header with this name was sent to the proxy.
    pub fn was_sent(&self, name: &str) -> bool {
        self.sent.contains(name)
    }

    /// Check if the proxy returned a header with this name.
    pub fn was_received(&self, name: &str) -> bool {
        self.received.contains(name)
    }
}

#[test]
fn test_record_both_sides() {
    use http::HeaderValue;

    let sent = ProxyHeaders::from_pairs(vec![("X-ProxyMesh-Country", "US")]).unwrap();
    let mut received = HeaderList::new();
    received.append("X-ProxyMesh-IP", HeaderValue::from_static("1.2.3.4"));

    let record = HeaderExchangeRecord::from_parts(sent, StatusCode::OK, received);

    assert_eq!(record.status(), StatusCode::OK);
    assert!(record.was_sent("x-proxymesh-country"));
    assert_eq!(record.sent_header("X-PROXYMESH-COUNTRY"), Some("US"));
    assert!(record.was_received("X-ProxyMesh-IP"));
    assert_eq!(record.received_header("x-proxymesh-ip"), Some("1.2.3.4"));
    assert!(!record.was_received("X-ProxyMesh-Country"));
}
