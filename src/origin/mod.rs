//! Origin Gate
//!
//! Decides whether a cross-origin caller may receive a response. The
//! request's `Origin` is parsed into a scheme/host pair and compared with
//! each configured allow rule in order:
//!
//! * `*` matches everything
//! * `https://comics.example.org` matches that exact scheme and host
//! * `comics.example.org` (no scheme) matches that host under whatever
//!   scheme the request used
//!
//! Requests without an `Origin` header are not cross-origin and always pass.

pub mod middleware;

pub const WILDCARD: &str = "*";
const DEFAULT_SCHEME: &str = "http";

/// Scheme and host of an origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginDescriptor {
    pub scheme: String,
    pub host: String,
}

impl OriginDescriptor {
    /// Parse an origin header value
    ///
    /// Values without a `scheme://` prefix are taken whole as the host with
    /// an `http` scheme.
    pub fn parse(value: &str) -> Self {
        match split_absolute(value) {
            Some((scheme, host)) => Self { scheme, host },
            None => Self {
                scheme: DEFAULT_SCHEME.to_string(),
                host: value.to_string(),
            },
        }
    }
}

/// One entry of the configured allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowRule {
    Any,
    /// `scheme` is `None` for bare-host rules
    Origin { scheme: Option<String>, host: String },
}

impl AllowRule {
    pub fn parse(rule: &str) -> Self {
        if rule == WILDCARD {
            return AllowRule::Any;
        }
        match split_absolute(rule) {
            Some((scheme, host)) => AllowRule::Origin { scheme: Some(scheme), host },
            None => AllowRule::Origin { scheme: None, host: rule.to_string() },
        }
    }

    pub fn matches(&self, request: &OriginDescriptor) -> bool {
        match self {
            AllowRule::Any => true,
            AllowRule::Origin { scheme, host } => {
                let scheme = scheme.as_deref().unwrap_or(&request.scheme);
                scheme == request.scheme && *host == request.host
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Reject,
}

/// Evaluate a request origin against the allow-list
pub fn evaluate(origin: Option<&str>, allow_list: &[String]) -> GateDecision {
    let origin = match origin {
        Some(origin) => OriginDescriptor::parse(origin),
        None => return GateDecision::Allow,
    };
    if allow_list.iter().any(|rule| AllowRule::parse(rule).matches(&origin)) {
        GateDecision::Allow
    } else {
        GateDecision::Reject
    }
}

/// Split `scheme://authority[/path]` into lower-cased scheme and host
///
/// Userinfo, path, query and fragment are dropped; a port stays part of the
/// host.
fn split_absolute(value: &str) -> Option<(String, String)> {
    let (scheme, rest) = value.split_once("://")?;
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once('@').map(|(_, host)| host).unwrap_or(authority);
    Some((scheme.to_ascii_lowercase(), host.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(list: &[&str]) -> Vec<String> {
        list.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_parse_absolute_origin() {
        let parsed = OriginDescriptor::parse("https://Comics.Example.org:8443/reader?x=1");
        assert_eq!(parsed.scheme, "https");
        assert_eq!(parsed.host, "comics.example.org:8443");
    }

    #[test]
    fn test_parse_bare_origin_defaults_to_http() {
        let parsed = OriginDescriptor::parse("localhost:3000");
        assert_eq!(parsed, OriginDescriptor { scheme: "http".to_string(), host: "localhost:3000".to_string() });
    }

    #[test]
    fn test_parse_ignores_userinfo() {
        assert_eq!(OriginDescriptor::parse("http://user@example.com").host, "example.com");
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let allow = rules(&["https://only.example.com", "*"]);
        for origin in ["https://a.com", "http://b.org:81", "null", "file://"] {
            assert_eq!(evaluate(Some(origin), &allow), GateDecision::Allow, "{}", origin);
        }
    }

    #[test]
    fn test_missing_origin_always_allowed() {
        assert_eq!(evaluate(None, &[]), GateDecision::Allow);
        assert_eq!(evaluate(None, &rules(&["https://x.com"])), GateDecision::Allow);
    }

    #[test]
    fn test_bare_rule_inherits_request_scheme() {
        let allow = rules(&["example.com"]);
        assert_eq!(evaluate(Some("https://example.com"), &allow), GateDecision::Allow);
        assert_eq!(evaluate(Some("http://example.com"), &allow), GateDecision::Allow);
        assert_eq!(evaluate(Some("https://evil.com"), &allow), GateDecision::Reject);
    }

    #[test]
    fn test_scheme_qualified_rule_requires_same_scheme() {
        let allow = rules(&["https://example.com"]);
        assert_eq!(evaluate(Some("https://example.com"), &allow), GateDecision::Allow);
        assert_eq!(evaluate(Some("http://example.com"), &allow), GateDecision::Reject);
        assert_eq!(evaluate(Some("https://example.com:8443"), &allow), GateDecision::Reject);
    }

    #[test]
    fn test_bare_request_origin_matches_http_rule() {
        let allow = rules(&["http://example.com"]);
        assert_eq!(evaluate(Some("example.com"), &allow), GateDecision::Allow);
    }

    #[test]
    fn test_empty_allow_list_rejects_cross_origin() {
        assert_eq!(evaluate(Some("https://example.com"), &[]), GateDecision::Reject);
    }

    #[test]
    fn test_host_comparison_is_exact() {
        let allow = rules(&["example.com"]);
        assert_eq!(evaluate(Some("https://sub.example.com"), &allow), GateDecision::Reject);
        assert_eq!(evaluate(Some("https://example.com.evil.net"), &allow), GateDecision::Reject);
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!(AllowRule::parse("*"), AllowRule::Any);
        assert_eq!(
            AllowRule::parse("HTTPS://Reader.App"),
            AllowRule::Origin { scheme: Some("https".to_string()), host: "reader.app".to_string() }
        );
        assert_eq!(
            AllowRule::parse("reader.app"),
            AllowRule::Origin { scheme: None, host: "reader.app".to_string() }
        );
    }
}
