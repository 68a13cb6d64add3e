use std::fmt;

use http::header::{HeaderName, HeaderValue};

/// An ordered list of header fields which keeps the casing of the names it was given.
///
/// `http::HeaderMap` normalizes names to lowercase, which loses the exact spelling used by
/// a proxy. This list keeps every field in the order it was received or inserted, allows
/// several values for the same name, and looks names up case-insensitively.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderList {
    /// Create an empty list.
    pub fn new() -> HeaderList {
        HeaderList { entries: Vec::new() }
    }

    /// Number of fields, counting repeated names once per value.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a field at the end of the list, keeping existing fields with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: HeaderValue) {
        self.entries.push((name.into(), value));
    }

    /// Set a field, replacing the first field with the same name in place and removing the others.
    ///
    /// If no field has this name, it is added at the end of the list.
    pub fn insert(&mut self, name: impl Into<String>, value: HeaderValue) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => {
                let mut pos = 0;
                self.entries.retain(|(n, _)| {
                    let keep = pos <= idx || !n.eq_ignore_ascii_case(&name);
                    pos += 1;
                    keep
                });
                self.entries[idx] = (name, value);
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Remove every field with this name. Returns the number of fields removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// Get the first value for this name.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    /// Get the first value for this name if it is visible ASCII.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get every value for this name, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Check if a field with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate over the fields in order, with the names as they were given.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Convert to a `HeaderMap`, losing the original casing of the names.
    ///
    /// Names which are not valid HTTP tokens are skipped.
    pub fn to_header_map(&self) -> http::HeaderMap {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
                map.append(name, value.clone());
            }
        }
        map
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(n, v)| (n, v))).finish()
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = (&'a str, &'a HeaderValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a HeaderValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
