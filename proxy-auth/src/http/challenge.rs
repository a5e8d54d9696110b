use http::{HeaderValue, Response, StatusCode};
use http::header::{HeaderName, PROXY_AUTHENTICATE, WWW_AUTHENTICATE};

use proxy_auth_core::error::ProxyAuthError;
use proxy_auth_core::logging::trace;
use proxy_auth_core::ProxyAuthResult;

pub const NTLM_SCHEME: &str = "NTLM";

/// Scheme to token mapping from a response's challenge headers, in header order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthChallenges {
    challenges: Vec<(String, String)>,
}

impl AuthChallenges {
    /// Token for `scheme`, matched ASCII case-insensitively. A bare scheme yields `""`.
    pub fn get(&self, scheme: &str) -> Option<&str> {
        self.challenges.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(scheme))
            .map(|(_, token)| token.as_str())
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.get(scheme).is_some()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.challenges.iter().map(|(scheme, token)| (scheme.as_str(), token.as_str()))
    }

    fn insert(&mut self, scheme: String, token: String) {
        if !self.contains(&scheme) {
            self.challenges.push((scheme, token));
        }
    }
}

/// Parses the challenges a proxy (407) or origin server (401) sent with `response`.
pub fn parse_auth_challenge<B>(response: &Response<B>) -> ProxyAuthResult<AuthChallenges> {
    let header = challenge_header_name(response);
    let values = response.headers().get_all(&header);
    if values.iter().next().is_none() {
        return Err(ProxyAuthError::challenge_header(format!("response carries no {} header", header)));
    }
    parse_challenge_headers(values)
}

fn challenge_header_name<B>(response: &Response<B>) -> HeaderName {
    match response.status() {
        StatusCode::PROXY_AUTHENTICATION_REQUIRED => PROXY_AUTHENTICATE,
        StatusCode::UNAUTHORIZED => WWW_AUTHENTICATE,
        _ if response.headers().contains_key(PROXY_AUTHENTICATE) => PROXY_AUTHENTICATE,
        _ => WWW_AUTHENTICATE,
    }
}

/// Parses every challenge in `values`. Each value may hold several comma separated
/// challenges; auth-params following a scheme stay attached to it.
pub fn parse_challenge_headers<'a, I>(values: I) -> ProxyAuthResult<AuthChallenges>
where
    I: IntoIterator<Item = &'a HeaderValue>,
{
    let mut parsed: Vec<(String, String)> = Vec::new();
    for value in values {
        let value = value.to_str()
            .map_err(|_| ProxyAuthError::challenge_header("challenge header is not visible ASCII"))?;
        for element in split_unquoted_commas(value) {
            let element = element.trim();
            if element.is_empty() {
                continue;
            }
            let (first, rest) = element.split_once(char::is_whitespace).unwrap_or((element, ""));
            if first.contains('=') {
                // auth-param belonging to the previous challenge
                if let Some((_, token)) = parsed.last_mut() {
                    if !token.is_empty() {
                        token.push_str(", ");
                    }
                    token.push_str(element);
                }
                continue;
            }
            parsed.push((first.to_string(), rest.trim().to_string()));
        }
    }

    let mut challenges = AuthChallenges::default();
    for (scheme, token) in parsed {
        challenges.insert(scheme, token);
    }
    if challenges.is_empty() {
        return Err(ProxyAuthError::challenge_header("no challenge could be parsed from the response"));
    }
    trace!(schemes = ?challenges.iter().map(|(scheme, _)| scheme).collect::<Vec<_>>(), "parsed auth challenges");
    Ok(challenges)
}

fn split_unquoted_commas(value: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (idx, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                elements.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    elements.push(&value[start..]);
    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, headers: &[(HeaderName, &str)]) -> Response<()> {
        let mut builder = Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn proxy_status_reads_proxy_authenticate() {
        let response = response(StatusCode::PROXY_AUTHENTICATION_REQUIRED, &[
            (WWW_AUTHENTICATE, "Basic realm=\"origin\""),
            (PROXY_AUTHENTICATE, "NTLM TlRMTVNTUAACAAAA"),
        ]);
        let challenges = parse_auth_challenge(&response).unwrap();
        assert_eq!(challenges.get(NTLM_SCHEME), Some("TlRMTVNTUAACAAAA"));
        assert!(!challenges.contains("Basic"));
    }

    #[test]
    fn unauthorized_status_reads_www_authenticate() {
        let response = response(StatusCode::UNAUTHORIZED, &[
            (PROXY_AUTHENTICATE, "NTLM proxy"),
            (WWW_AUTHENTICATE, "NTLM origin"),
        ]);
        assert_eq!(parse_auth_challenge(&response).unwrap().get(NTLM_SCHEME), Some("origin"));
    }

    #[test]
    fn other_status_prefers_proxy_header() {
        let both = response(StatusCode::OK, &[
            (WWW_AUTHENTICATE, "NTLM origin"),
            (PROXY_AUTHENTICATE, "NTLM proxy"),
        ]);
        assert_eq!(parse_auth_challenge(&both).unwrap().get(NTLM_SCHEME), Some("proxy"));

        let origin_only = response(StatusCode::OK, &[(WWW_AUTHENTICATE, "NTLM origin")]);
        assert_eq!(parse_auth_challenge(&origin_only).unwrap().get(NTLM_SCHEME), Some("origin"));
    }

    #[test]
    fn multiple_header_lines_and_bare_schemes() {
        let response = response(StatusCode::PROXY_AUTHENTICATION_REQUIRED, &[
            (PROXY_AUTHENTICATE, "Negotiate"),
            (PROXY_AUTHENTICATE, "NTLM"),
            (PROXY_AUTHENTICATE, "Basic realm=\"corp\""),
        ]);
        let challenges = parse_auth_challenge(&response).unwrap();
        assert_eq!(challenges.len(), 3);
        assert_eq!(challenges.get("Negotiate"), Some(""));
        assert_eq!(challenges.get(NTLM_SCHEME), Some(""));
        assert_eq!(challenges.get("Basic"), Some("realm=\"corp\""));
    }

    #[test]
    fn quoted_commas_do_not_split_challenges() {
        let value = HeaderValue::from_static("Digest realm=\"a, b\", nonce=\"x\\\"y\", NTLM TlRMTVNTUAACAAAA==, Basic");
        let challenges = parse_challenge_headers([&value]).unwrap();
        assert_eq!(challenges.get("Digest"), Some("realm=\"a, b\", nonce=\"x\\\"y\""));
        assert_eq!(challenges.get(NTLM_SCHEME), Some("TlRMTVNTUAACAAAA=="));
        assert_eq!(challenges.get("Basic"), Some(""));
    }

    #[test]
    fn scheme_lookup_ignores_case() {
        let value = HeaderValue::from_static("ntlm abc");
        let challenges = parse_challenge_headers([&value]).unwrap();
        assert_eq!(challenges.get("NTLM"), Some("abc"));
        assert_eq!(challenges.get("Ntlm"), Some("abc"));
    }

    #[test]
    fn first_occurrence_wins() {
        let first = HeaderValue::from_static("NTLM first");
        let second = HeaderValue::from_static("ntlm second");
        let challenges = parse_challenge_headers([&first, &second]).unwrap();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges.get(NTLM_SCHEME), Some("first"));
    }

    #[test]
    fn missing_header_is_an_error() {
        let response = response(StatusCode::PROXY_AUTHENTICATION_REQUIRED, &[]);
        let err = parse_auth_challenge(&response).unwrap_err();
        assert!(matches!(err, ProxyAuthError::ChallengeHeader(_)));
    }

    #[test]
    fn empty_or_opaque_values_are_errors() {
        let empty = HeaderValue::from_static(" , ");
        assert!(matches!(parse_challenge_headers([&empty]), Err(ProxyAuthError::ChallengeHeader(_))));

        let opaque = HeaderValue::from_bytes(b"NTLM \xff\xfe").unwrap();
        assert!(matches!(parse_challenge_headers([&opaque]), Err(ProxyAuthError::ChallengeHeader(_))));
    }
}
