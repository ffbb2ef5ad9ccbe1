//! Importing text from an HTTPS URL.
//!
//! URLs are validated before any network activity. The body's charset comes from the
//! `Content-Type` header when present, otherwise from the same streaming detector used for
//! files.

use crate::detect::EncodingDetector;
use crate::error::{Error, Result};
use crate::worker::WorkerEvent;
use crossbeam_channel::Sender;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Upper bound on an imported body.
const MAX_BODY: u64 = 16 * 1024 * 1024;

const URL_PATTERN: &str = r"(?i)^https://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}|localhost|\d{1,3}(?:\.\d{1,3}){3})(?::\d{1,5})?(?:[/?#]\S*)?$";

fn url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_PATTERN).ok()).as_ref()
}

/// Trim and check `input`. Only `https://` URLs with a plausible host pass.
pub fn validate_url(input: &str) -> Result<String> {
    let url = input.trim();
    let invalid = || Error::InvalidUrl { url: url.to_string() };
    if !url.get(..8).is_some_and(|s| s.eq_ignore_ascii_case("https://")) {
        return Err(invalid());
    }
    match url_regex() {
        Some(re) if re.is_match(url) => Ok(url.to_string()),
        _ => Err(invalid()),
    }
}

/// GET `url` and decode the body to text.
pub fn fetch_text(url: &str, timeout: Duration) -> Result<String> {
    let url = validate_url(url)?;
    let network = |message: String| Error::Network { url: url.clone(), message };

    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = match agent.get(&url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            return Err(network(format!("HTTP {code} {}", resp.status_text())));
        }
        Err(e @ ureq::Error::Transport(_)) => return Err(network(e.to_string())),
    };

    let declared = response
        .header("content-type")
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let body = read_body(response.into_reader(), MAX_BODY).map_err(|e| network(e.to_string()))?;
    let Some(body) = body else {
        return Err(network(format!("response too large (over {} MiB)", MAX_BODY / (1024 * 1024))));
    };

    let encoding = declared.unwrap_or_else(|| sniff(&body));
    let (text, _, _) = encoding.decode(&body);
    tracing::info!(target: "web", url = %url, bytes = body.len(), encoding = encoding.name(), "fetched");
    Ok(text.into_owned())
}

/// Read at most `limit` bytes. `None` when the body is longer than that.
fn read_body(reader: impl Read, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit + 1).read_to_end(&mut body)?;
    Ok((body.len() as u64 <= limit).then_some(body))
}

fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_string())
    })
}

fn sniff(body: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(body);
    detector.close();
    detector.result().map_or(UTF_8, |g| g.encoding)
}

/// Fetch on a background thread. Sends exactly one `Fetched` event.
pub fn spawn_fetch(
    url: String,
    timeout: Duration,
    generation: u64,
    tx: Sender<WorkerEvent>,
) -> Result<()> {
    thread::Builder::new()
        .name("scratchpad-fetch".into())
        .spawn({
            let url = url.clone();
            move || {
                let result = fetch_text(&url, timeout);
                if let Err(e) = &result {
                    tracing::warn!(target: "web", url = %url, error = %e, "fetch failed");
                }
                let _ = tx.send(WorkerEvent::Fetched { generation, result });
            }
        })
        .map(|_| ())
        .map_err(|e| Error::Network { url, message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_http_is_rejected_before_any_request() {
        let err = fetch_text("http://example.com", Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn accepts_reasonable_https_urls() {
        for url in [
            "https://example.com",
            "  https://example.com/path/file.txt?x=1#top ",
            "HTTPS://Sub.Example.co.uk:8443/a",
            "https://localhost:3000/raw",
            "https://192.168.0.1/notes.txt",
        ] {
            assert!(validate_url(url).is_ok(), "{url}");
        }
        assert_eq!(validate_url(" https://example.com ").unwrap(), "https://example.com");
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "",
            "example.com",
            "ftp://example.com",
            "https://",
            "https://nodot",
            "https://exa mple.com",
            "https://-bad-.com",
            "javascript:alert(1)",
        ] {
            assert!(validate_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn oversized_bodies_are_refused_not_truncated() {
        assert_eq!(read_body(&b"abcd"[..], 4).unwrap(), Some(b"abcd".to_vec()));
        assert_eq!(read_body(&b"abcde"[..], 4).unwrap(), None);
        assert_eq!(read_body(&b""[..], 4).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn charset_parameter_is_extracted() {
        assert_eq!(
            charset_from_content_type("text/plain; charset=\"ISO-8859-1\"").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(charset_from_content_type("text/plain; format=flowed"), None);
        assert_eq!(charset_from_content_type("text/plain"), None);
    }

    #[test]
    fn undeclared_bodies_are_sniffed() {
        assert_eq!(sniff(b"plain"), UTF_8);
        assert_eq!(sniff(b"\xFF\xFEh\x00"), encoding_rs::UTF_16LE);
    }
}
