use rand::RngCore;
use rand::rngs::ThreadRng;

use proxy_auth_core::error::ProxyAuthError;
use proxy_auth_core::logging::{debug, trace};
use proxy_auth_core::ProxyAuthResult;

use crate::util::auth::ntlm::{AV_FLAG_MIC_PRESENT, AVPair, NTLMClientConfig, NTLMClientEngine, NTLMClientSession, NTLMMode, NTLMVersion};
use crate::util::auth::ntlm::ntlm_authenticate_message::NTLMAuthenticateMessageBody;
use crate::util::auth::ntlm::ntlm_challenge_message::NTLMChallengeMessageBody;
use crate::util::auth::ntlm::ntlm_message::{NTLMMessage, NTLMNegotiateFlags, to_parse_error};
use crate::util::auth::ntlm::ntlm_negotiate_message::NTLMNegotiateMessageBody;
use crate::util::crypto::filetime_now;
use crate::util::crypto::ntlm_v1::compute_ntlm_v1_response;
use crate::util::crypto::ntlm_v2::{compute_ntlm_v2_response, ntowf_v2};
use crate::util::crypto::session_keys::{compute_mic, NTLMSessionKeys, rc4_encrypt};

/// The built-in engine. Sessions it creates speak connection-oriented NTLMv1 or NTLMv2.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NTLMClientProvider {
    config: NTLMClientConfig,
}

impl NTLMClientProvider {
    pub fn new(config: NTLMClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NTLMClientConfig {
        &self.config
    }
}

impl NTLMClientEngine for NTLMClientProvider {
    type Session = NTLMClientContext;

    fn create_client_session(&self, version: NTLMVersion, mode: NTLMMode) -> ProxyAuthResult<NTLMClientContext> {
        if mode == NTLMMode::Connectionless {
            return Err(ProxyAuthError::precondition_failed("connectionless NTLM is not supported"));
        }
        debug!(?version, "creating NTLM client session");
        Ok(NTLMClientContext::new(
            version,
            self.config.negotiate_flags(),
            self.config.workstation().unwrap_or_default().into(),
        ))
    }
}

pub struct NTLMClientContext {
    pub(crate) version: NTLMVersion,
    pub(crate) offered_flags: NTLMNegotiateFlags,
    pub(crate) domain_name: Option<String>,
    pub(crate) user_name: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) work_station: String,
    pub(crate) negotiate_message: Option<Vec<u8>>,
    pub(crate) challenge_message: Option<Vec<u8>>,
    pub(crate) authenticate_message: Option<NTLMAuthenticateMessageBody>,
    pub(crate) mic_required: bool,
    pub(crate) session_keys: Option<NTLMSessionKeys>,
}

impl NTLMClientContext {
    pub fn new(version: NTLMVersion, offered_flags: NTLMNegotiateFlags, work_station: String) -> Self {
        Self {
            version,
            offered_flags,
            domain_name: None,
            user_name: None,
            password: None,
            work_station,
            negotiate_message: None,
            challenge_message: None,
            authenticate_message: None,
            mic_required: false,
            session_keys: None,
        }
    }

    pub fn version(&self) -> NTLMVersion {
        self.version
    }

    /// Flags agreed with the server, once the challenge has been processed.
    pub fn negotiated_flags(&self) -> Option<NTLMNegotiateFlags> {
        self.authenticate_message.as_ref().map(|message| message.negotiate_flags())
    }

    pub fn session_keys(&self) -> Option<&NTLMSessionKeys> {
        self.session_keys.as_ref()
    }

    fn negotiate_flags_for(&self, server_flags: NTLMNegotiateFlags) -> NTLMNegotiateFlags {
        let mut flags = self.offered_flags & server_flags;
        if server_flags.contains(NTLMNegotiateFlags::UNICODE_ENCODING) {
            flags.insert(NTLMNegotiateFlags::UNICODE_ENCODING);
            flags.remove(NTLMNegotiateFlags::OEM_ENCODING);
        } else {
            flags.insert(NTLMNegotiateFlags::OEM_ENCODING);
            flags.remove(NTLMNegotiateFlags::UNICODE_ENCODING);
        }
        flags
    }
}

impl std::fmt::Debug for NTLMClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NTLMClientContext")
            .field("version", &self.version)
            .field("offered_flags", &self.offered_flags)
            .field("domain_name", &self.domain_name)
            .field("user_name", &self.user_name)
            .field("work_station", &self.work_station)
            .finish_non_exhaustive()
    }
}

impl NTLMClientSession for NTLMClientContext {
    type Challenge = NTLMChallengeMessageBody;

    fn generate_negotiate_message(&mut self) -> ProxyAuthResult<Vec<u8>> {
        let message = NTLMNegotiateMessageBody::new(self.offered_flags).as_bytes();
        trace!(len = message.len(), "generated NTLM negotiate message");
        self.negotiate_message = Some(message.clone());
        Ok(message)
    }

    fn set_user_info(&mut self, user: &str, password: &str, domain: &str) {
        self.user_name = Some(user.into());
        self.password = Some(password.into());
        self.domain_name = Some(domain.into());
    }

    fn parse_challenge_message(&self, bytes: &[u8]) -> ProxyAuthResult<NTLMChallengeMessageBody> {
        let (_, message) = NTLMMessage::parse(bytes).map_err(to_parse_error)?;
        let challenge = match message {
            NTLMMessage::Challenge(challenge) => challenge,
            other => return Err(ProxyAuthError::parse_error(format!("expected an NTLM challenge message, got {}", other.name()))),
        };
        trace!(?challenge, "parsed NTLM challenge message");
        Ok(challenge)
    }

    fn process_challenge_message(&mut self, challenge: NTLMChallengeMessageBody) -> ProxyAuthResult<()> {
        if self.negotiate_message.is_none() {
            return Err(ProxyAuthError::precondition_failed("challenge received before a negotiate message was generated"));
        }
        let (user_name, password, domain_name) = match (&self.user_name, &self.password, &self.domain_name) {
            (Some(user_name), Some(password), Some(domain_name)) => (user_name.clone(), password.clone(), domain_name.clone()),
            _ => return Err(ProxyAuthError::precondition_failed("user info must be set before processing a challenge")),
        };

        let flags = self.negotiate_flags_for(challenge.negotiate_flags());
        let mut client_challenge = [0_u8; 8];
        ThreadRng::default().fill_bytes(&mut client_challenge);

        let (lm_challenge_response, nt_challenge_response, key_exchange_key) = match self.version {
            NTLMVersion::V2 => {
                let response_key_nt = ntowf_v2(&password, &user_name, &domain_name)?;
                let mut target_info = challenge.target_info().to_vec();
                let timestamp = AVPair::timestamp(&target_info);
                if timestamp.is_some() {
                    AVPair::insert_flag(&mut target_info, AV_FLAG_MIC_PRESENT);
                }
                let response = compute_ntlm_v2_response(
                    &response_key_nt,
                    challenge.server_challenge(),
                    &client_challenge,
                    timestamp.unwrap_or_else(filetime_now),
                    &AVPair::list_as_bytes(&target_info),
                )?;
                // With a server timestamp the MIC protects the exchange and LMv2 is omitted
                self.mic_required = timestamp.is_some();
                let lm_challenge_response = if self.mic_required {
                    vec![0; 24]
                } else {
                    response.lm_challenge_response
                };
                (lm_challenge_response, response.nt_challenge_response, response.session_base_key)
            }
            NTLMVersion::V1 => {
                let response = compute_ntlm_v1_response(
                    &password,
                    challenge.server_challenge(),
                    &client_challenge,
                    flags.contains(NTLMNegotiateFlags::EXTENDED_SESSION_SECURITY),
                )?;
                self.mic_required = false;
                (response.lm_challenge_response, response.nt_challenge_response, response.key_exchange_key)
            }
        };

        let (exported_session_key, encrypted_session_key) = if flags.contains(NTLMNegotiateFlags::KEY_EXCHANGE) {
            let mut exported_session_key = vec![0_u8; 16];
            ThreadRng::default().fill_bytes(&mut exported_session_key);
            let encrypted_session_key = rc4_encrypt(&key_exchange_key, &exported_session_key)?;
            (exported_session_key, encrypted_session_key)
        } else {
            (key_exchange_key, Vec::new())
        };

        debug!(?flags, mic = self.mic_required, "processed NTLM challenge");
        self.session_keys = Some(NTLMSessionKeys::derive(flags, &exported_session_key));
        self.challenge_message = Some(if challenge.raw_bytes().is_empty() {
            challenge.as_bytes()
        } else {
            challenge.raw_bytes().to_vec()
        });
        self.authenticate_message = Some(NTLMAuthenticateMessageBody::new(
            flags,
            domain_name,
            user_name,
            self.work_station.clone(),
            lm_challenge_response,
            nt_challenge_response,
            encrypted_session_key,
        ));
        Ok(())
    }

    fn generate_authenticate_message(&mut self) -> ProxyAuthResult<Vec<u8>> {
        let message = self.authenticate_message.as_mut()
            .ok_or_else(|| ProxyAuthError::precondition_failed("no processed challenge to authenticate against"))?;
        if self.mic_required {
            let (Some(keys), Some(negotiate), Some(challenge)) = (&self.session_keys, &self.negotiate_message, &self.challenge_message) else {
                return Err(ProxyAuthError::precondition_failed("handshake transcript is incomplete"));
            };
            message.set_mic([0; 16]);
            let mic = compute_mic(&keys.exported_session_key, negotiate, challenge, &message.as_bytes())?;
            message.set_mic(mic);
        }
        let bytes = message.as_bytes();
        trace!(len = bytes.len(), "generated NTLM authenticate message");
        Ok(bytes)
    }
}
