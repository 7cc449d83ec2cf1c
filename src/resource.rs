//! Resource identifiers
//!
//! A resource identifier names fetchable content: either a remote URL or a
//! local file. Raw input is trimmed and parsed once; characters that are not
//! URL-safe (spaces, non-ASCII) are percent-encoded by the parser. Only
//! schemes the loader can actually open are accepted.

use crate::error::{FetchError, FetchResult};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// URL schemes that can be opened
const OPENABLE_SCHEMES: &[&str] = &["http", "https", "file"];

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Fetched over HTTP(S)
    Remote(Url),
    /// Read from the local filesystem
    Local(PathBuf),
}

/// Immutable, validated resource identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    key: String,
    resource: Resource,
}

impl ResourceId {
    /// Parse a raw identifier; bare relative names resolve against the
    /// working directory
    pub fn parse(raw: &str) -> FetchResult<Self> {
        Self::parse_with_base(raw, None)
    }

    /// Parse a raw identifier, resolving bare `name.ext` resources against
    /// `resource_dir` when one is given
    pub fn parse_with_base(raw: &str, resource_dir: Option<&Path>) -> FetchResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FetchError::invalid_id(raw, "empty identifier"));
        }

        if has_scheme(trimmed) {
            return Self::from_url(parse_url(trimmed)?);
        }

        let path = Path::new(trimmed);
        let path = match resource_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        Ok(Self {
            key: path.display().to_string(),
            resource: Resource::Local(path),
        })
    }

    /// Build an identifier from an already parsed URL
    pub fn from_url(url: Url) -> FetchResult<Self> {
        check_url(&url)?;

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::invalid_id(url.as_str(), "not a local file path"))?;
            return Ok(Self {
                key: url.to_string(),
                resource: Resource::Local(path),
            });
        }

        Ok(Self {
            key: url.to_string(),
            resource: Resource::Remote(url),
        })
    }

    /// Cache key for this identifier
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Where the content lives
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Whether fetching this identifier goes over the network
    pub fn is_remote(&self) -> bool {
        matches!(self.resource, Resource::Remote(_))
    }

    /// The filename a download would be saved under: the last URL path
    /// segment or the local file name
    pub fn file_name(&self) -> Option<String> {
        match &self.resource {
            Resource::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Resource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Whether a URL uses a scheme we can open
pub fn can_open(url: &Url) -> bool {
    OPENABLE_SCHEMES.contains(&url.scheme())
}

/// Parse raw input as an absolute URL we can open. `file` URLs need no
/// host; every other scheme does.
pub fn parse_url(raw: &str) -> FetchResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::invalid_id(raw, "empty identifier"));
    }
    let url = Url::parse(trimmed).map_err(|e| FetchError::invalid_id(trimmed, e.to_string()))?;
    check_url(&url)?;
    Ok(url)
}

fn check_url(url: &Url) -> FetchResult<()> {
    if !can_open(url) {
        return Err(FetchError::invalid_id(
            url.as_str(),
            format!("cannot open '{}' URLs", url.scheme()),
        ));
    }
    if url.scheme() != "file" && url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::invalid_id(url.as_str(), "missing host"));
    }
    Ok(())
}

/// Starts with `scheme:` where the scheme is two or more characters, so
/// Windows drive letters stay paths
fn has_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_https_url() {
        let id = ResourceId::parse("https://example.com/a.png").unwrap();
        assert!(id.is_remote());
        assert_eq!(id.key(), "https://example.com/a.png");
        assert_eq!(id.file_name().as_deref(), Some("a.png"));
    }

    #[test]
    fn parse_encodes_unsafe_characters() {
        let id = ResourceId::parse("  https://example.com/my lunch.png ").unwrap();
        assert_eq!(id.key(), "https://example.com/my%20lunch.png");
    }

    #[test]
    fn empty_is_invalid() {
        for raw in ["", "   "] {
            let err = ResourceId::parse(raw).unwrap_err();
            assert!(matches!(err, FetchError::InvalidIdentifier { .. }));
        }
    }

    #[test]
    fn malformed_url_is_invalid() {
        assert!(matches!(
            ResourceId::parse("https://").unwrap_err(),
            FetchError::InvalidIdentifier { .. }
        ));
    }

    #[test]
    fn unopenable_scheme_is_invalid() {
        let err = ResourceId::parse("ftp://example.com/a.png").unwrap_err();
        assert!(err.to_string().contains("cannot open 'ftp'"));

        for raw in [
            "javascript:alert(1)",
            "data:image/png;base64,AAAA",
            "mailto:chef@example.com",
        ] {
            let err = ResourceId::parse(raw).unwrap_err();
            assert!(
                matches!(err, FetchError::InvalidIdentifier { .. }),
                "{raw} was not rejected"
            );
        }
    }

    #[test]
    fn single_slash_http_is_never_a_path() {
        // The URL parser repairs `http:/host` into `http://host`
        let id = ResourceId::parse("http:/example.com/a.png").unwrap();
        assert!(id.is_remote());
        assert_eq!(id.key(), "http://example.com/a.png");
    }

    #[test]
    fn host_less_http_is_invalid() {
        for raw in ["http:", "http://"] {
            assert!(
                matches!(
                    ResourceId::parse(raw).unwrap_err(),
                    FetchError::InvalidIdentifier { .. }
                ),
                "{raw} was not rejected"
            );
        }
    }

    #[test]
    fn parse_url_shares_identifier_rules() {
        assert!(parse_url("https://example.com/page").is_ok());
        assert!(parse_url("file:///tmp/page.html").is_ok());
        for raw in ["", "not a url", "javascript:alert(1)", "https://"] {
            assert!(parse_url(raw).is_err(), "{raw} was not rejected");
        }
    }

    #[test]
    fn file_url_is_local() {
        let id = ResourceId::parse("file:///tmp/a.png").unwrap();
        assert_eq!(id.resource(), &Resource::Local(PathBuf::from("/tmp/a.png")));
    }

    #[test]
    fn bare_name_resolves_against_resource_dir() {
        let id = ResourceId::parse_with_base("lunch.jpg", Some(Path::new("/assets"))).unwrap();
        assert_eq!(id.resource(), &Resource::Local(PathBuf::from("/assets/lunch.jpg")));

        let id = ResourceId::parse_with_base("/abs/lunch.jpg", Some(Path::new("/assets"))).unwrap();
        assert_eq!(id.resource(), &Resource::Local(PathBuf::from("/abs/lunch.jpg")));
    }

    #[test]
    fn drive_letter_is_not_a_scheme() {
        assert!(!has_scheme("C:\\images\\a.png"));
        assert!(!has_scheme("lunch.png"));
        assert!(!has_scheme("./menu:today.png"));
        assert!(has_scheme("https://x"));
        assert!(has_scheme("mailto:chef@example.com"));

        let id = ResourceId::parse("C:\\images\\a.png").unwrap();
        assert!(!id.is_remote());
    }
}
