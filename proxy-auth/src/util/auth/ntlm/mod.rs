mod config;
mod engine;
mod ntlm_av_pair;
mod ntlm_client_provider;
mod ntlm_message;
mod ntlm_negotiate_message;
mod ntlm_challenge_message;
mod ntlm_authenticate_message;

pub use config::*;
pub use engine::*;
pub use ntlm_av_pair::{AV_FLAG_MIC_PRESENT, AVPair, AVPairId};
pub use ntlm_message::{NTLM_SIGNATURE, NTLMProductVersion};

pub type NTLMClientProvider = ntlm_client_provider::NTLMClientProvider;
pub type NTLMClientContext = ntlm_client_provider::NTLMClientContext;
pub type NTLMMessage = ntlm_message::NTLMMessage;
pub type NTLMNegotiateFlags = ntlm_message::NTLMNegotiateFlags;
pub type NTLMNegotiateMessageBody = ntlm_negotiate_message::NTLMNegotiateMessageBody;
pub type NTLMChallengeMessageBody = ntlm_challenge_message::NTLMChallengeMessageBody;
pub type NTLMAuthenticateMessageBody = ntlm_authenticate_message::NTLMAuthenticateMessageBody;
