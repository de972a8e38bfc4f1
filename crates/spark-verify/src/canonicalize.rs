//! String-to-verify construction.
//!
//! The sender signs the following byte string:
//!
//! ```text
//! lowercase(<X-VaultAPISignature-* name>) ":" trim(<value>) "\n"   (sorted, one per header)
//! <raw body> "\n"
//! <X-VaultAPISignature-URL value>
//! ```
//!
//! Header names are matched against the `X-VaultAPISignature-` prefix without
//! regard to case. The body is appended byte-for-byte as received; it must
//! never be parsed and re-serialized.

use std::collections::HashMap;
use std::fmt;

/// Prefix of every header that participates in the signature.
pub const SIGNATURE_HEADER_PREFIX: &str = "X-VaultAPISignature-";

/// Header naming the signing certificate.
pub const CERTIFICATE_ID_HEADER: &str = "X-VaultAPISignature-CertificateId";

/// Header carrying the destination URL as signed by the sender.
pub const SIGNATURE_URL_HEADER: &str = "X-VaultAPISignature-URL";

/// Header carrying the detached signature. Outside the signed prefix.
pub const SIGNATURE_HEADER: &str = "X-VaultAPI-SignatureV2";

/// Request headers with case-insensitive lookup and a deterministic order.
///
/// Entries are kept sorted by (lowercased name, name, value), so any two
/// header maps with the same contents produce the same iteration order
/// regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders {
    entries: Vec<(String, String)>,
}

impl SignedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, keeping the entry order canonical.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let entry = (name.into(), value.into());
        let key = sort_key(&entry);
        let pos = self
            .entries
            .binary_search_by(|probe| sort_key(probe).cmp(&key))
            .unwrap_or_else(|pos| pos);
        self.entries.insert(pos, entry);
    }

    /// Look up a header value ignoring case.
    ///
    /// An exact-case match wins over other casings of the same name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the certificate identifier header, under any casing.
    pub fn certificate_id(&self) -> Option<&str> {
        self.get(CERTIFICATE_ID_HEADER)
    }

    /// Value of the signed URL header, under any casing.
    pub fn signature_url(&self) -> Option<&str> {
        self.get(SIGNATURE_URL_HEADER)
    }

    /// Value of the detached signature header, under any casing.
    pub fn signature(&self) -> Option<&str> {
        self.get(SIGNATURE_HEADER)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sort_key(entry: &(String, String)) -> (String, &str, &str) {
    (entry.0.to_ascii_lowercase(), entry.0.as_str(), entry.1.as_str())
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignedHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<&HashMap<String, String>> for SignedHeaders {
    fn from(map: &HashMap<String, String>) -> Self {
        map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

/// The exact byte string the sender signed.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalString(Vec<u8>);

impl CanonicalString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CanonicalString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalString({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Whether `name` belongs to the signed header family, ignoring case.
pub fn is_signature_header(name: &str) -> bool {
    let prefix = SIGNATURE_HEADER_PREFIX.as_bytes();
    name.len() >= prefix.len() && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Trim leading and trailing whitespace and control characters.
fn trim_value(value: &str) -> &str {
    value.trim_matches(|c: char| c <= ' ')
}

/// Build the string-to-verify.
///
/// `url` is the value of the signed URL header; `None` omits the trailing
/// segment. Zero matching headers contribute nothing. Never fails.
pub fn canonicalize(headers: &SignedHeaders, body: &[u8], url: Option<&str>) -> CanonicalString {
    let mut lines: Vec<(String, &str)> = headers
        .iter()
        .filter(|(name, _)| is_signature_header(name))
        .map(|(name, value)| (name.to_ascii_lowercase(), trim_value(value)))
        .collect();
    lines.sort_unstable();

    let header_len: usize = lines.iter().map(|(n, v)| n.len() + v.len() + 2).sum();
    let url = url.unwrap_or_default();
    let mut out = Vec::with_capacity(header_len + body.len() + 1 + url.len());

    for (name, value) in &lines {
        out.extend_from_slice(name.as_bytes());
        out.push(b':');
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }
    out.extend_from_slice(body);
    out.push(b'\n');
    out.extend_from_slice(url.as_bytes());

    CanonicalString(out)
}

/// Build the string-to-verify using the URL carried in `headers`.
pub fn canonicalize_request(headers: &SignedHeaders, body: &[u8]) -> CanonicalString {
    canonicalize(headers, body, headers.signature_url())
}
