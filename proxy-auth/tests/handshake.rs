use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{Request, Response, StatusCode};
use http::header::{PROXY_AUTHENTICATE, PROXY_AUTHORIZATION};

use ntlm_proxy_auth::http::{NTLMHandshakeState, NTLMHttpAuthenticator};
use ntlm_proxy_auth::util::auth::ntlm::{
    AVPair, AVPairId, NTLMAuthenticateMessageBody, NTLMChallengeMessageBody, NTLMClientEngine,
    NTLMClientSession, NTLMMode, NTLMNegotiateFlags, NTLMVersion,
};
use ntlm_proxy_auth::{ProxyAuthError, ProxyAuthResult};

/// Calls made on the fake engine and its sessions, in order.
type CallLog = Rc<RefCell<Vec<String>>>;

struct FakeEngine {
    log: CallLog,
}

struct FakeSession {
    log: CallLog,
    identity: Option<(String, String)>,
}

impl NTLMClientEngine for FakeEngine {
    type Session = FakeSession;

    fn create_client_session(&self, version: NTLMVersion, mode: NTLMMode) -> ProxyAuthResult<FakeSession> {
        self.log.borrow_mut().push(format!("create {version:?} {mode:?}"));
        Ok(FakeSession { log: self.log.clone(), identity: None })
    }
}

impl NTLMClientSession for FakeSession {
    type Challenge = Vec<u8>;

    fn generate_negotiate_message(&mut self) -> ProxyAuthResult<Vec<u8>> {
        self.log.borrow_mut().push("negotiate".into());
        Ok(b"TYPE1".to_vec())
    }

    fn set_user_info(&mut self, user: &str, _password: &str, domain: &str) {
        self.log.borrow_mut().push(format!("user {domain}|{user}"));
        self.identity = Some((domain.into(), user.into()));
    }

    fn parse_challenge_message(&self, bytes: &[u8]) -> ProxyAuthResult<Vec<u8>> {
        if bytes.starts_with(b"TYPE2") {
            Ok(bytes.to_vec())
        } else {
            Err(ProxyAuthError::parse_error("not a TYPE2 token"))
        }
    }

    fn process_challenge_message(&mut self, challenge: Vec<u8>) -> ProxyAuthResult<()> {
        self.log.borrow_mut().push(format!("process {}", String::from_utf8_lossy(&challenge)));
        Ok(())
    }

    fn generate_authenticate_message(&mut self) -> ProxyAuthResult<Vec<u8>> {
        let (domain, user) = self.identity.clone().unwrap_or_default();
        Ok(format!("TYPE3 {domain}|{user}").into_bytes())
    }
}

fn fake_authenticator() -> (NTLMHttpAuthenticator<FakeEngine>, CallLog) {
    let log = CallLog::default();
    (NTLMHttpAuthenticator::with_engine(FakeEngine { log: log.clone() }), log)
}

fn proxy_challenge(value: &str) -> Response<()> {
    Response::builder()
        .status(StatusCode::PROXY_AUTHENTICATION_REQUIRED)
        .header(PROXY_AUTHENTICATE, value)
        .body(())
        .unwrap()
}

fn connect_request() -> Request<()> {
    Request::builder()
        .method("CONNECT")
        .uri("example.com:443")
        .body(())
        .unwrap()
}

fn authorization(request: &Request<()>) -> Option<String> {
    request.headers()
        .get(PROXY_AUTHORIZATION)
        .map(|value| value.to_str().unwrap().to_string())
}

fn decoded_authorization(request: &Request<()>) -> Result<Vec<u8>> {
    let header = authorization(request).ok_or_else(|| anyhow::anyhow!("no Proxy-Authorization header"))?;
    let token = header.strip_prefix("NTLM ").ok_or_else(|| anyhow::anyhow!("not an NTLM header: {header}"))?;
    Ok(STANDARD.decode(token)?)
}

#[test]
fn full_handshake_with_fake_engine() -> Result<()> {
    let (mut authenticator, log) = fake_authenticator();
    let mut request = connect_request();

    // Scenario A
    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "DOMAIN\\user", "pw")?;
    assert_eq!(authorization(&request), Some(format!("NTLM {}", STANDARD.encode(b"TYPE1"))));
    assert_eq!(authenticator.state(), NTLMHandshakeState::Type1Generated);

    // Scenario B
    let challenge = format!("NTLM {}", STANDARD.encode(b"TYPE2 challenge"));
    authenticator.authenticate(&mut request, &proxy_challenge(&challenge), "DOMAIN\\user", "pw")?;
    assert_eq!(decoded_authorization(&request)?, b"TYPE3 DOMAIN|user");
    assert_eq!(authenticator.state(), NTLMHandshakeState::Type3Generated);
    assert!(authenticator.is_complete());

    // Scenario C
    let err = authenticator.authenticate(&mut request, &proxy_challenge(&challenge), "DOMAIN\\user", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::AuthenticationRejected(_)));
    assert_eq!(decoded_authorization(&request)?, b"TYPE3 DOMAIN|user");

    assert_eq!(*log.borrow(), vec![
        "create V2 ConnectionOriented".to_string(),
        "negotiate".to_string(),
        "user DOMAIN|user".to_string(),
        "process TYPE2 challenge".to_string(),
    ]);
    Ok(())
}

#[test]
fn bare_username_has_empty_domain() -> Result<()> {
    let (mut authenticator, _) = fake_authenticator();
    let mut request = connect_request();
    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "bob", "pw")?;
    let challenge = format!("NTLM {}", STANDARD.encode(b"TYPE2"));
    authenticator.authenticate(&mut request, &proxy_challenge(&challenge), "bob", "pw")?;
    assert_eq!(decoded_authorization(&request)?, b"TYPE3 |bob");
    Ok(())
}

#[test]
fn first_call_ignores_credentials() -> Result<()> {
    for (username, password) in [("", ""), ("CORP\\alice", "pw"), ("\\", "ünïcødé")] {
        let (mut authenticator, _) = fake_authenticator();
        let mut request = connect_request();
        authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), username, password)?;
        assert!(authorization(&request).unwrap().starts_with("NTLM "));
        assert_eq!(authenticator.state(), NTLMHandshakeState::Type1Generated);
    }
    Ok(())
}

#[test]
fn missing_ntlm_challenge_fails_in_every_state() -> Result<()> {
    let basic = proxy_challenge("Basic realm=\"corp\"");
    let ntlm_type2 = proxy_challenge(&format!("NTLM {}", STANDARD.encode(b"TYPE2")));

    let (mut authenticator, log) = fake_authenticator();
    let mut request = connect_request();
    let err = authenticator.authenticate(&mut request, &basic, "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::MissingChallenge(_)));
    assert!(log.borrow().is_empty());
    assert_eq!(authorization(&request), None);

    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "alice", "pw")?;
    let err = authenticator.authenticate(&mut request, &basic, "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::MissingChallenge(_)));
    assert_eq!(authenticator.state(), NTLMHandshakeState::Type1Generated);

    authenticator.authenticate(&mut request, &ntlm_type2, "alice", "pw")?;
    let err = authenticator.authenticate(&mut request, &basic, "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::MissingChallenge(_)));
    Ok(())
}

#[test]
fn absent_challenge_header_is_a_header_error() {
    let (mut authenticator, log) = fake_authenticator();
    let mut request = connect_request();
    let response = Response::builder()
        .status(StatusCode::PROXY_AUTHENTICATION_REQUIRED)
        .body(())
        .unwrap();
    let err = authenticator.authenticate(&mut request, &response, "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::ChallengeHeader(_)));
    assert!(log.borrow().is_empty());
}

#[test]
fn malformed_base64_leaves_negotiate_header_in_place() -> Result<()> {
    let (mut authenticator, _) = fake_authenticator();
    let mut request = connect_request();
    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "alice", "pw")?;
    let negotiate_header = authorization(&request);

    let err = authenticator.authenticate(&mut request, &proxy_challenge("NTLM !!not-base64!!"), "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::DecodeError(_)));
    assert_eq!(authorization(&request), negotiate_header);
    assert_eq!(authenticator.state(), NTLMHandshakeState::Type1Generated);

    // the failed attempt consumed the session
    let challenge = format!("NTLM {}", STANDARD.encode(b"TYPE2"));
    let err = authenticator.authenticate(&mut request, &proxy_challenge(&challenge), "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::PreconditionFailed(_)));
    assert_eq!(authorization(&request), negotiate_header);
    Ok(())
}

#[test]
fn malformed_challenge_bytes_are_a_parse_error() -> Result<()> {
    let (mut authenticator, _) = fake_authenticator();
    let mut request = connect_request();
    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "alice", "pw")?;
    let challenge = format!("NTLM {}", STANDARD.encode(b"garbage"));
    let err = authenticator.authenticate(&mut request, &proxy_challenge(&challenge), "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::ParseError(_)));
    assert_eq!(authenticator.state(), NTLMHandshakeState::Type1Generated);
    Ok(())
}

fn synthesised_type2(with_timestamp: bool) -> String {
    let mut target_info = vec![
        AVPair::new(AVPairId::NbDomainName, "CORP".encode_utf16().flat_map(u16::to_le_bytes).collect()),
    ];
    if with_timestamp {
        target_info.push(AVPair::new(AVPairId::Timestamp, 0x01d9_5a3c_2b1e_0f00_u64.to_le_bytes().to_vec()));
    }
    let flags = NTLMNegotiateFlags::UNICODE_ENCODING
        | NTLMNegotiateFlags::NTLM_SESSION_SECURITY
        | NTLMNegotiateFlags::EXTENDED_SESSION_SECURITY
        | NTLMNegotiateFlags::USE_128_BIT_ENCRYPTION
        | NTLMNegotiateFlags::KEY_EXCHANGE;
    let challenge = NTLMChallengeMessageBody::with_server_challenge("CORP".into(), flags, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef], target_info);
    format!("NTLM {}", STANDARD.encode(challenge.as_bytes()))
}

#[test]
fn default_engine_completes_the_handshake() -> Result<()> {
    for with_timestamp in [false, true] {
        let mut authenticator = NTLMHttpAuthenticator::new();
        let mut request = connect_request();

        authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "CORP\\alice", "Password")?;
        let negotiate = decoded_authorization(&request)?;
        assert_eq!(&negotiate[0..8], b"NTLMSSP\0");
        assert_eq!(&negotiate[8..12], &[1, 0, 0, 0]);

        authenticator.authenticate(&mut request, &proxy_challenge(&synthesised_type2(with_timestamp)), "CORP\\alice", "Password")?;
        let bytes = decoded_authorization(&request)?;
        let (_, authenticate) = NTLMAuthenticateMessageBody::parse(&bytes).map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(authenticate.user_name(), "alice");
        assert_eq!(authenticate.domain_name(), "CORP");
        assert_eq!(authenticate.encrypted_session_key().len(), 16);
        assert_eq!(authenticate.mic() != &[0; 16], with_timestamp);
        assert!(authenticator.is_complete());

        let err = authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "CORP\\alice", "Password").unwrap_err();
        assert!(matches!(err, ProxyAuthError::AuthenticationRejected(_)));
        assert_eq!(decoded_authorization(&request)?, bytes);
    }
    Ok(())
}

#[test]
fn default_engine_rejects_a_truncated_challenge() -> Result<()> {
    let mut authenticator = NTLMHttpAuthenticator::new();
    let mut request = connect_request();
    authenticator.authenticate(&mut request, &proxy_challenge("NTLM"), "alice", "pw")?;
    let truncated = format!("NTLM {}", STANDARD.encode(b"NTLMSSP\0\x02\0\0\0"));
    let err = authenticator.authenticate(&mut request, &proxy_challenge(&truncated), "alice", "pw").unwrap_err();
    assert!(matches!(err, ProxyAuthError::ParseError(_)));
    Ok(())
}
