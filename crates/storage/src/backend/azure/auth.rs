//! Shared Key request signing.
//!
//! The table service is signed with Shared Key Lite; blob, queue and file
//! requests with full Shared Key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::header::HeaderMap;
use sha2::Sha256;
use url::Url;

use crate::error::{Result, StorageError};

type HmacSha256 = Hmac<Sha256>;

/// Standard headers signed by full Shared Key, after the verb.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Which signature layout a service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SigningScheme {
    /// Shared Key Lite: `x-ms-date` and the resource with `?comp=` only.
    Table,
    /// Shared Key: verb, standard headers, `x-ms-*` headers, resource and
    /// every query parameter.
    BlobQueueFile,
}

impl SigningScheme {
    /// Scheme name used in the `Authorization` header.
    pub(super) const fn authorization_kind(self) -> &'static str {
        match self {
            Self::Table => "SharedKeyLite",
            Self::BlobQueueFile => "SharedKey",
        }
    }
}

/// Build the string-to-sign for a request.
///
/// Expects `x-ms-date` to already be present in `headers`. `content_length`
/// is the body size; zero is signed as an empty value.
pub(super) fn string_to_sign(
    scheme: SigningScheme,
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    content_length: usize,
    account: &str,
) -> String {
    match scheme {
        SigningScheme::Table => {
            let date = header_str(headers, "x-ms-date");
            format!("{date}\n{}", lite_resource(account, url))
        }
        SigningScheme::BlobQueueFile => {
            let mut s = format!("{method}\n");
            for name in SIGNED_HEADERS {
                if name == "content-length" {
                    if content_length > 0 {
                        s.push_str(&content_length.to_string());
                    }
                } else {
                    s.push_str(header_str(headers, name));
                }
                s.push('\n');
            }
            s.push_str(&canonicalized_headers(headers));
            s.push_str(&full_resource(account, url));
            s
        }
    }
}

/// HMAC-SHA256 the string-to-sign with the decoded account key.
pub(super) fn sign(key: &[u8], string_to_sign: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| StorageError::InvalidInput(format!("unusable account key: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// `x-ms-*` headers, lowercased and sorted, one `name:value\n` each.
fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut pairs: Vec<(&str, &str)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default().trim()))
        .collect();
    pairs.sort_unstable();

    pairs
        .into_iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}

/// `/{account}{path}`, plus `?comp=` when the request carries one.
fn lite_resource(account: &str, url: &Url) -> String {
    let mut resource = format!("/{account}{}", url.path());
    if let Some((_, comp)) = url.query_pairs().find(|(key, _)| key == "comp") {
        resource.push_str("?comp=");
        resource.push_str(&comp);
    }
    resource
}

/// `/{account}{path}` followed by `\nname:value` for every query parameter,
/// names lowercased and sorted, repeated values joined with commas.
fn full_resource(account: &str, url: &Url) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| (name.to_lowercase(), value.into_owned()))
        .collect();
    params.sort();

    let mut resource = format!("/{account}{}", url.path());
    let mut last: Option<String> = None;
    for (name, value) in params {
        if last.as_deref() == Some(name.as_str()) {
            resource.push(',');
        } else {
            resource.push('\n');
            resource.push_str(&name);
            resource.push(':');
        }
        resource.push_str(&value);
        last = Some(name);
    }
    resource
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    const DATE: &str = "Mon, 19 Oct 2026 10:00:00 GMT";

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_blob_string_to_sign() {
        let url = Url::parse("https://acct.blob.core.windows.net/images/a.png").unwrap();
        let headers = headers(&[
            ("x-ms-version", "2021-08-06"),
            ("x-ms-date", DATE),
            ("x-ms-blob-type", "BlockBlob"),
            ("content-type", "image/png"),
        ]);

        let s = string_to_sign(
            SigningScheme::BlobQueueFile,
            &Method::PUT,
            &url,
            &headers,
            4,
            "acct",
        );

        let expected = [
            "PUT",
            "",
            "",
            "4",
            "",
            "image/png",
            "",
            "",
            "",
            "",
            "",
            "",
            "x-ms-blob-type:BlockBlob",
            "x-ms-date:Mon, 19 Oct 2026 10:00:00 GMT",
            "x-ms-version:2021-08-06",
            "/acct/images/a.png",
        ]
        .join("\n");
        assert_eq!(s, expected);
    }

    #[test]
    fn test_empty_body_signs_empty_length() {
        let url = Url::parse("https://acct.queue.core.windows.net/orders").unwrap();
        let headers = headers(&[("x-ms-date", DATE)]);

        let s = string_to_sign(
            SigningScheme::BlobQueueFile,
            &Method::PUT,
            &url,
            &headers,
            0,
            "acct",
        );

        assert!(s.starts_with("PUT\n\n\n\n"));
        assert!(s.ends_with(&format!("x-ms-date:{DATE}\n/acct/orders")));
    }

    #[test]
    fn test_table_string_to_sign() {
        let url = Url::parse("https://acct.table.core.windows.net/Tables").unwrap();
        let headers = headers(&[("x-ms-date", DATE)]);

        let s = string_to_sign(SigningScheme::Table, &Method::POST, &url, &headers, 24, "acct");

        assert_eq!(s, format!("{DATE}\n/acct/Tables"));
    }

    #[test]
    fn test_full_resource_lists_sorted_parameters() {
        let url = Url::parse(concat!(
            "https://acct.queue.core.windows.net/orders/messages/m1",
            "?popreceipt=AgAA%2Bxyz&NumOfMessages=1"
        ))
        .unwrap();
        assert_eq!(
            full_resource("acct", &url),
            "/acct/orders/messages/m1\nnumofmessages:1\npopreceipt:AgAA+xyz"
        );

        let url =
            Url::parse("http://127.0.0.1:10000/devstoreaccount1/c?restype=container").unwrap();
        assert_eq!(
            full_resource("devstoreaccount1", &url),
            "/devstoreaccount1/devstoreaccount1/c\nrestype:container"
        );
    }

    #[test]
    fn test_lite_resource_includes_comp_only() {
        let url =
            Url::parse("https://acct.table.core.windows.net/Orders()?comp=x&NextRowKey=1").unwrap();
        assert_eq!(lite_resource("acct", &url), "/acct/Orders()?comp=x");
    }

    #[test]
    fn test_sign_known_vector() {
        let signature = sign(b"secret", "GET\n\n\n\n/acct/c").unwrap();
        assert_eq!(signature, "vDknViHbFvnDzOaUiee9dg35Oa+n22/UJ8kcCciF75k=");
    }
}
