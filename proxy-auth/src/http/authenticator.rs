use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderValue, Request, Response};
use http::header::PROXY_AUTHORIZATION;
use serde::{Deserialize, Serialize};

use proxy_auth_core::error::ProxyAuthError;
use proxy_auth_core::logging::{debug, trace};
use proxy_auth_core::ProxyAuthResult;

use crate::http::challenge::{NTLM_SCHEME, parse_auth_challenge};
use crate::util::auth::ntlm::{NTLMClientConfig, NTLMClientEngine, NTLMClientProvider, NTLMClientSession, NTLMMode, NTLMVersion};
use crate::util::auth::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NTLMHandshakeState {
    /// Nothing sent yet.
    #[default]
    ChallengeReceived,
    Type1Generated,
    /// Authenticate message sent. Another challenge means the proxy refused it.
    Type3Generated,
}

impl NTLMHandshakeState {
    pub fn next(self) -> ProxyAuthResult<Self> {
        match self {
            NTLMHandshakeState::ChallengeReceived => Ok(NTLMHandshakeState::Type1Generated),
            NTLMHandshakeState::Type1Generated => Ok(NTLMHandshakeState::Type3Generated),
            NTLMHandshakeState::Type3Generated => Err(ProxyAuthError::authentication_rejected(
                "proxy challenged again after the NTLM authenticate message",
            )),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == NTLMHandshakeState::Type3Generated
    }
}

/// Drives one NTLM handshake against one proxy connection.
///
/// Call [`authenticate`](Self::authenticate) with each challenge response; it sets the
/// request's `Proxy-Authorization` header to the next token. An instance is single-use:
/// start a fresh one for every connection attempt.
pub struct NTLMHttpAuthenticator<E: NTLMClientEngine = NTLMClientProvider> {
    engine: E,
    version: NTLMVersion,
    mode: NTLMMode,
    state: NTLMHandshakeState,
    session: Option<E::Session>,
}

impl NTLMHttpAuthenticator<NTLMClientProvider> {
    pub fn new() -> Self {
        Self::with_config(NTLMClientConfig::default())
    }

    pub fn with_config(config: NTLMClientConfig) -> Self {
        let (version, mode) = (config.version(), config.mode());
        Self {
            engine: NTLMClientProvider::new(config),
            version,
            mode,
            state: NTLMHandshakeState::default(),
            session: None,
        }
    }
}

impl Default for NTLMHttpAuthenticator<NTLMClientProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: NTLMClientEngine> NTLMHttpAuthenticator<E> {
    /// Uses `engine` for an NTLMv2 connection-oriented handshake.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            version: NTLMVersion::V2,
            mode: NTLMMode::ConnectionOriented,
            state: NTLMHandshakeState::default(),
            session: None,
        }
    }

    pub fn state(&self) -> NTLMHandshakeState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine session, once the negotiate message has been generated.
    pub fn session(&self) -> Option<&E::Session> {
        self.session.as_ref()
    }

    /// Advances the handshake given the proxy's challenge `response`.
    ///
    /// `username` may be `DOMAIN\user`. The request is only modified when the call succeeds.
    pub fn authenticate<B, R>(&mut self, request: &mut Request<B>, response: &Response<R>, username: &str, password: &str) -> ProxyAuthResult<()> {
        let challenges = parse_auth_challenge(response)?;
        let token = challenges.get(NTLM_SCHEME)
            .ok_or_else(|| ProxyAuthError::missing_challenge(NTLM_SCHEME))?;
        let next = self.state.next()?;

        if self.state == NTLMHandshakeState::ChallengeReceived {
            self.send_negotiate(request)?;
        } else {
            self.send_authenticate(request, token, username, password)?;
        }

        debug!(from = ?self.state, to = ?next, "NTLM handshake advanced");
        self.state = next;
        Ok(())
    }

    fn send_negotiate<B>(&mut self, request: &mut Request<B>) -> ProxyAuthResult<()> {
        let mut session = self.engine.create_client_session(self.version, self.mode)?;
        let negotiate = session.generate_negotiate_message()?;
        set_authorization(request, &negotiate)?;
        self.session = Some(session);
        Ok(())
    }

    fn send_authenticate<B>(&mut self, request: &mut Request<B>, token: &str, username: &str, password: &str) -> ProxyAuthResult<()> {
        let mut session = self.session.take()
            .ok_or_else(|| ProxyAuthError::precondition_failed("handshake session was consumed by an earlier failed attempt"))?;
        let user = User::from_qualified_name(username, password);
        let challenge_bytes = STANDARD.decode(token).map_err(ProxyAuthError::decode_error)?;
        trace!(len = challenge_bytes.len(), "decoded NTLM challenge");

        session.set_user_info(&user.username, &user.password, &user.domain);
        let challenge = session.parse_challenge_message(&challenge_bytes)?;
        session.process_challenge_message(challenge)?;
        let authenticate = session.generate_authenticate_message()?;
        set_authorization(request, &authenticate)?;
        self.session = Some(session);
        Ok(())
    }
}

fn set_authorization<B>(request: &mut Request<B>, token: &[u8]) -> ProxyAuthResult<()> {
    let value = HeaderValue::from_str(&format!("{} {}", NTLM_SCHEME, STANDARD.encode(token)))
        .map_err(ProxyAuthError::engine_error)?;
    request.headers_mut().insert(PROXY_AUTHORIZATION, value);
    Ok(())
}
