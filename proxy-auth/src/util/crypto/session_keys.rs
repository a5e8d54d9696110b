use digest::Digest;
use md5::Md5;
use rc4::{KeyInit, Rc4, StreamCipher};
use rc4::consts::U16;

use proxy_auth_core::error::ProxyAuthError;
use proxy_auth_core::ProxyAuthResult;

use crate::util::auth::ntlm::NTLMNegotiateFlags;
use crate::util::crypto::hmac_md5;

const CLIENT_SIGNING_MAGIC: &[u8] = b"session key to client-to-server signing key magic constant\0";
const SERVER_SIGNING_MAGIC: &[u8] = b"session key to server-to-client signing key magic constant\0";
const CLIENT_SEALING_MAGIC: &[u8] = b"session key to client-to-server sealing key magic constant\0";
const SERVER_SEALING_MAGIC: &[u8] = b"session key to server-to-client sealing key magic constant\0";

/// Key material held by a session after the challenge is processed.
#[derive(Clone, PartialEq, Eq)]
pub struct NTLMSessionKeys {
    pub exported_session_key: Vec<u8>,
    pub client_signing_key: Vec<u8>,
    pub server_signing_key: Vec<u8>,
    pub client_sealing_key: Vec<u8>,
    pub server_sealing_key: Vec<u8>,
}

impl NTLMSessionKeys {
    pub fn derive(flags: NTLMNegotiateFlags, exported_session_key: &[u8]) -> Self {
        Self {
            exported_session_key: exported_session_key.to_vec(),
            client_signing_key: sign_key(flags, exported_session_key, CLIENT_SIGNING_MAGIC),
            server_signing_key: sign_key(flags, exported_session_key, SERVER_SIGNING_MAGIC),
            client_sealing_key: seal_key(flags, exported_session_key, CLIENT_SEALING_MAGIC),
            server_sealing_key: seal_key(flags, exported_session_key, SERVER_SEALING_MAGIC),
        }
    }
}

impl std::fmt::Debug for NTLMSessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NTLMSessionKeys").finish_non_exhaustive()
    }
}

fn sign_key(flags: NTLMNegotiateFlags, exported_session_key: &[u8], magic: &[u8]) -> Vec<u8> {
    if !flags.contains(NTLMNegotiateFlags::EXTENDED_SESSION_SECURITY) {
        return Vec::new();
    }
    Md5::new()
        .chain_update(exported_session_key)
        .chain_update(magic)
        .finalize()
        .to_vec()
}

fn seal_key(flags: NTLMNegotiateFlags, exported_session_key: &[u8], magic: &[u8]) -> Vec<u8> {
    if flags.contains(NTLMNegotiateFlags::EXTENDED_SESSION_SECURITY) {
        let key = if flags.contains(NTLMNegotiateFlags::USE_128_BIT_ENCRYPTION) {
            exported_session_key
        } else if flags.contains(NTLMNegotiateFlags::USE_56_BIT_ENCRYPTION) {
            truncate(exported_session_key, 7)
        } else {
            truncate(exported_session_key, 5)
        };
        Md5::new()
            .chain_update(key)
            .chain_update(magic)
            .finalize()
            .to_vec()
    } else if flags.contains(NTLMNegotiateFlags::LAN_MANAGER_SESSION_KEY) {
        if flags.contains(NTLMNegotiateFlags::USE_56_BIT_ENCRYPTION) {
            [truncate(exported_session_key, 7), &[0xA0][..]].concat()
        } else {
            [truncate(exported_session_key, 5), &[0xE5, 0x38, 0xB0][..]].concat()
        }
    } else {
        exported_session_key.to_vec()
    }
}

fn truncate(key: &[u8], length: usize) -> &[u8] {
    &key[..length.min(key.len())]
}

pub fn rc4_encrypt(key: &[u8], data: &[u8]) -> ProxyAuthResult<Vec<u8>> {
    let mut rc4 = Rc4::<U16>::new_from_slice(key)
        .map_err(|_| ProxyAuthError::crypto_error("Invalid length for RC4 key"))?;
    let mut output = data.to_vec();
    rc4.apply_keystream(&mut output);
    Ok(output)
}

/// MIC over the three handshake messages; `authenticate` must carry a zeroed MIC field.
pub fn compute_mic(exported_session_key: &[u8], negotiate: &[u8], challenge: &[u8], authenticate: &[u8]) -> ProxyAuthResult<[u8; 16]> {
    let digest = hmac_md5(exported_session_key, &[negotiate, challenge, authenticate])?;
    let mut mic = [0; 16];
    mic.copy_from_slice(&digest);
    Ok(mic)
}
