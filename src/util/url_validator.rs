use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors raised while validating the feed URL or the proxy endpoint.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The feed URL points at a loopback or private address the proxy can never reach.
    #[error("Feed URL must be publicly reachable: {0}")]
    NotPublic(String),
    /// The proxy endpoint is plain HTTP on a non-local host.
    #[error("Insecure proxy URL: HTTPS required (except localhost for testing)")]
    InsecureProxy,
}

/// Validates the syndication URL that is handed to the proxy.
///
/// The proxy fetches this URL on our behalf, so it must be an http(s) URL on
/// a public host. Loopback, private, link-local and unspecified addresses are
/// rejected.
///
/// # Examples
///
/// ```
/// use postfeed::util::validate_feed_url;
///
/// assert!(validate_feed_url("https://medium.com/feed/@someone").is_ok());
/// assert!(validate_feed_url("http://localhost/feed").is_err());
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http_url(url_str)?;

    if let Some(host) = url.host_str() {
        if host.eq_ignore_ascii_case("localhost") {
            return Err(UrlValidationError::NotPublic(host.to_owned()));
        }

        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if let Ok(ip) = bare.parse::<IpAddr>() {
            if is_non_public_ip(&ip) {
                return Err(UrlValidationError::NotPublic(ip.to_string()));
            }
        }
    }

    Ok(url)
}

/// Validates the RSS-to-JSON proxy endpoint.
///
/// HTTPS is required. Plain HTTP is accepted only for `localhost` and
/// `127.0.0.1` so tests can point the aggregator at a local mock server.
pub fn validate_proxy_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = parse_http_url(url_str)?;

    if url.scheme() == "http" {
        let local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
        if !local {
            return Err(UrlValidationError::InsecureProxy);
        }
        tracing::warn!(proxy = %url, "Using non-HTTPS feed proxy (localhost only)");
    }

    Ok(url)
}

fn parse_http_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_non_public_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
