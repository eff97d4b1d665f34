//! Inbound request as seen by the gate.
//!
//! The hosting layer extracts what it knows about the caller; the gate never
//! touches the HTTP stack directly.

use std::collections::HashMap;
use std::net::IpAddr;

/// Transport facts about one inbound request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Caller address, if the hosting layer could determine one.
    pub source_addr: Option<IpAddr>,
    /// Peer certificate subject (`C=US, ST=Ohio, ...`).
    pub peer_subject: Option<String>,
    /// Header values keyed by lowercase name.
    headers: HashMap<String, String>,
    /// Query-string parameters.
    query: HashMap<String, String>,
}

impl InboundRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_addr(mut self, addr: IpAddr) -> Self {
        self.source_addr = Some(addr);
        self
    }

    pub fn with_peer_subject(mut self, subject: impl Into<String>) -> Self {
        self.peer_subject = Some(subject.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Parse a certificate subject of the form `K=V, K=V` into attributes.
///
/// Parts without `=` are ignored; keys and values are trimmed. The result is
/// sorted but keeps repeated attributes, so two subjects compare equal only
/// when they carry the same multiset of pairs.
pub fn parse_subject(subject: &str) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = subject
        .split(',')
        .filter_map(|part| part.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect();
    attrs.sort();
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_parse_subject() {
        let attrs = parse_subject("C=US, ST=Ohio, L=Westerville, O=Example Corp, CN=hook.example.com");
        assert_eq!(attrs.len(), 5);
        assert!(attrs.contains(&pair("O", "Example Corp")));
        assert!(attrs.contains(&pair("CN", "hook.example.com")));
    }

    #[test]
    fn test_parse_subject_skips_malformed_parts() {
        let attrs = parse_subject("C=US, garbage, =empty, ST = Ohio");
        assert_eq!(attrs, vec![pair("C", "US"), pair("ST", "Ohio")]);
    }

    #[test]
    fn test_parse_subject_keeps_repeated_attributes() {
        let attrs = parse_subject("C=US, O=Evil, O=Example");
        assert_eq!(
            attrs,
            vec![pair("C", "US"), pair("O", "Evil"), pair("O", "Example")]
        );
        assert_ne!(attrs, parse_subject("C=US, O=Example"));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let req = InboundRequest::new().with_header("X-Webhook-Password", "pw");
        assert_eq!(req.header("x-webhook-password"), Some("pw"));
        assert_eq!(req.header("X-WEBHOOK-PASSWORD"), Some("pw"));
    }
}
