use std::convert::TryInto;

use http::header::HeaderValue;

use crate::parsing::HeaderList;
use crate::{Error, ErrorKind, Result};

fn validate_name(name: &str) -> Result {
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        Ok(())
    } else {
        Err(ErrorKind::InvalidHeaderName(name.to_owned()).into())
    }
}

/// Extra headers sent to the proxy with the CONNECT request.
///
/// Names may only contain ASCII letters, digits and `-`. They are compared case-insensitively,
/// but written on the wire exactly as given and in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyHeaders {
    inner: HeaderList,
}

impl ProxyHeaders {
    /// Create an empty set of headers.
    pub fn new() -> ProxyHeaders {
        ProxyHeaders::default()
    }

    /// Build headers from a list of pairs, in order.
    ///
    /// ```
    /// let headers = proxy_headers::ProxyHeaders::from_pairs(vec![("X-ProxyMesh-Country", "US")]).unwrap();
    /// assert_eq!(headers.get_str("x-proxymesh-country"), Some("US"));
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<ProxyHeaders>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: TryInto<HeaderValue>,
        Error: From<V::Error>,
    {
        let mut headers = ProxyHeaders::new();
        for (name, value) in pairs {
            headers.insert(name, value)?;
        }
        Ok(headers)
    }

    /// Set a header, replacing an existing header with the same name.
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Result
    where
        K: Into<String>,
        V: TryInto<HeaderValue>,
        Error: From<V::Error>,
    {
        let name = name.into();
        validate_name(&name)?;
        let value = value.try_into()?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Add a header, keeping existing headers with the same name.
    pub fn append<K, V>(&mut self, name: K, value: V) -> Result
    where
        K: Into<String>,
        V: TryInto<HeaderValue>,
        Error: From<V::Error>,
    {
        let name = name.into();
        validate_name(&name)?;
        let value = value.try_into()?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the first value for this name.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.inner.get(name)
    }

    /// Get the first value for this name if it is visible ASCII.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.inner.get_str(name)
    }

    /// Check if a header with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    /// Iterate over the headers in the order they will be written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.inner.iter()
    }

    /// View the headers as a `HeaderList`.
    pub fn as_list(&self) -> &HeaderList {
        &self.inner
    }
}

#[cfg(test)]
mod test {
    use super::ProxyHeaders;
    use crate::ErrorKind;

    #[test]
    fn test_insert_valid_names() {
        let mut headers = ProxyHeaders::new();
        headers.insert("X-ProxyMesh-Country", "US").unwrap();
        headers.insert("X-Proxy-Auth", String::from("secret")).unwrap();
        headers.insert("Proxy-Authorization2", "x").unwrap();
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_insert_rejects_invalid_names() {
        let mut headers = ProxyHeaders::new();
        for name in &["", "X Proxy", "X_Proxy", "X-Proxy:", "X-Próxy"] {
            let err = headers.insert(*name, "1").unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidHeaderName(_)), "{:?}", name);
        }
        assert!(headers.is_empty());
    }

    #[test]
    fn test_insert_rejects_invalid_values() {
        let mut headers = ProxyHeaders::new();
        let err = headers.insert("X-Proxy-Auth", "secret\r\nX-Injected: 1").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Http(_)));
    }

    #[test]
    fn test_insert_replaces_and_keeps_order() {
        let mut headers = ProxyHeaders::new();
        headers.insert("X-A", "1").unwrap();
        headers.insert("X-B", "2").unwrap();
        headers.insert("x-a", "3").unwrap();

        let fields: Vec<_> = headers.iter().map(|(n, v)| (n, v.to_str().unwrap())).collect();
        assert_eq!(fields, vec![("x-a", "3"), ("X-B", "2")]);
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut headers = ProxyHeaders::new();
        headers.append("X-A", "1").unwrap();
        headers.append("X-A", "2").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_str("x-a"), Some("1"));
    }
}
