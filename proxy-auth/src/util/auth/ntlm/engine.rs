use serde::{Deserialize, Serialize};

use proxy_auth_core::ProxyAuthResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NTLMVersion {
    V1,
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NTLMMode {
    ConnectionOriented,
    Connectionless,
}

/// Creates client sessions. The handshake state machine only ever talks to the engine
/// through this trait, so tests can substitute a deterministic implementation.
pub trait NTLMClientEngine {
    type Session: NTLMClientSession;

    fn create_client_session(&self, version: NTLMVersion, mode: NTLMMode) -> ProxyAuthResult<Self::Session>;
}

/// One client side NTLM exchange. Methods are called in declaration order.
pub trait NTLMClientSession {
    type Challenge;

    /// Type 1 message, generated from an empty session.
    fn generate_negotiate_message(&mut self) -> ProxyAuthResult<Vec<u8>>;

    fn set_user_info(&mut self, user: &str, password: &str, domain: &str);

    fn parse_challenge_message(&self, bytes: &[u8]) -> ProxyAuthResult<Self::Challenge>;

    /// Derives the session's key material from the server challenge.
    fn process_challenge_message(&mut self, challenge: Self::Challenge) -> ProxyAuthResult<()>;

    /// Type 3 message built from the processed challenge.
    fn generate_authenticate_message(&mut self) -> ProxyAuthResult<Vec<u8>>;
}
