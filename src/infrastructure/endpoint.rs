use crate::types::constants::schemes;
use crate::types::{KeepaliveError, Result};
use url::Url;

/// Turns channel addresses into WebSocket URLs.
///
/// Relative addresses are resolved against the base URL, the way a browser
/// resolves them against the page location.
#[derive(Debug, Clone, Default)]
pub struct EndpointResolver {
    base: Option<Url>,
}

impl EndpointResolver {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let base = base_url.map(Url::parse).transpose()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Resolves `address` and rewrites its scheme to the WebSocket equivalent
    pub fn resolve(&self, address: &str) -> Result<String> {
        let url = match &self.base {
            Some(base) => base.join(address)?,
            None => Url::parse(address)?,
        };
        http_to_ws_endpoint(url)
    }
}

/// Converts an HTTP(S) URL to its WebSocket equivalent
pub fn http_to_ws_endpoint(mut url: Url) -> Result<String> {
    let scheme = match url.scheme() {
        schemes::HTTP | schemes::WS => schemes::WS,
        schemes::HTTPS | schemes::WSS => schemes::WSS,
        other => return Err(KeepaliveError::InvalidScheme(other.to_string())),
    };

    url.set_scheme(scheme)
        .map_err(|_| KeepaliveError::InvalidScheme(url.scheme().to_string()))?;

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_address_joins_base() {
        let resolver = EndpointResolver::new(Some("http://localhost:3000/app/index.html")).unwrap();
        assert_eq!(
            resolver.resolve("/ws/common").unwrap(),
            "ws://localhost:3000/ws/common"
        );
    }

    #[test]
    fn test_https_becomes_wss() {
        let resolver = EndpointResolver::new(Some("https://example.com/")).unwrap();
        assert_eq!(
            resolver.resolve("/ws/chat?room=1").unwrap(),
            "wss://example.com/ws/chat?room=1"
        );
    }

    #[test]
    fn test_absolute_address_overrides_base() {
        let resolver = EndpointResolver::new(Some("https://example.com/")).unwrap();
        assert_eq!(
            resolver.resolve("http://other.host:8080/ws").unwrap(),
            "ws://other.host:8080/ws"
        );
    }

    #[test]
    fn test_websocket_schemes_are_kept() {
        let resolver = EndpointResolver::default();
        assert_eq!(resolver.resolve("ws://a/b").unwrap(), "ws://a/b");
        assert_eq!(resolver.resolve("wss://a/b").unwrap(), "wss://a/b");
    }

    #[test]
    fn test_relative_address_without_base_fails() {
        let resolver = EndpointResolver::default();
        assert!(matches!(
            resolver.resolve("/ws/common"),
            Err(KeepaliveError::UrlParse(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme_fails() {
        let resolver = EndpointResolver::default();
        match resolver.resolve("ftp://example.com/ws") {
            Err(KeepaliveError::InvalidScheme(scheme)) => assert_eq!(scheme, "ftp"),
            other => panic!("expected InvalidScheme, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base_url_fails() {
        assert!(EndpointResolver::new(Some("not a url")).is_err());
    }
}
