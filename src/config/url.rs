//! Authorization endpoint URL assembly

use super::options::Origin;

/// Build the authorization URL from an origin and an upload path
///
/// Without a protocol the URL is protocol-relative (`//host...`). With
/// neither protocol nor host there is no authority to address, so the URL is
/// just the path on the current origin and any port is ignored.
/// Trailing `:` and `/` on the protocol are dropped so `http`, `http:` and
/// `http://` all produce `http://`.
pub fn authorization_url(origin: &Origin, path: &str) -> String {
    let mut url = match (origin.protocol.as_deref(), origin.host.as_deref()) {
        (Some(protocol), _) => {
            let scheme = protocol.trim_end_matches(['/', ':']);
            format!("{}://", scheme)
        }
        (None, Some(_)) => "//".to_string(),
        (None, None) => return path.to_string(),
    };

    if let Some(host) = origin.host.as_deref() {
        url.push_str(host);
    }

    if let Some(port) = origin.port {
        url.push(':');
        url.push_str(&port.to_string());
    }

    url.push_str(path);
    url
}
