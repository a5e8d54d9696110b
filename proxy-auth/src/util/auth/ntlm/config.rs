use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::util::auth::ntlm::{NTLMMode, NTLMNegotiateFlags, NTLMVersion};

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(name = "NTLMClientConfigBuilder", pattern = "owned")]
pub struct NTLMClientConfig {
    #[builder(default = "NTLMVersion::V2")]
    version: NTLMVersion,
    #[builder(default = "NTLMMode::ConnectionOriented")]
    mode: NTLMMode,
    /// Sent in the authenticate message; proxies generally ignore it.
    #[builder(default, setter(into, strip_option))]
    workstation: Option<String>,
    #[builder(default = "NTLMNegotiateFlags::client_default()")]
    negotiate_flags: NTLMNegotiateFlags,
}

impl NTLMClientConfig {
    pub fn builder() -> NTLMClientConfigBuilder {
        NTLMClientConfigBuilder::default()
    }

    pub fn version(&self) -> NTLMVersion {
        self.version
    }

    pub fn mode(&self) -> NTLMMode {
        self.mode
    }

    pub fn workstation(&self) -> Option<&str> {
        self.workstation.as_deref()
    }

    pub fn negotiate_flags(&self) -> NTLMNegotiateFlags {
        self.negotiate_flags
    }
}

impl Default for NTLMClientConfig {
    fn default() -> Self {
        Self {
            version: NTLMVersion::V2,
            mode: NTLMMode::ConnectionOriented,
            workstation: None,
            negotiate_flags: NTLMNegotiateFlags::client_default(),
        }
    }
}
