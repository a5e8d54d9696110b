use digest::Digest;
use md4::Md4;
use md5::Md5;

use proxy_auth_core::ProxyAuthResult;

use crate::byte_helper::to_utf16_bytes;
use crate::util::crypto::des::des_long_encrypt;
use crate::util::crypto::hmac_md5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NTLMv1Response {
    pub nt_challenge_response: Vec<u8>,
    pub lm_challenge_response: Vec<u8>,
    pub session_base_key: Vec<u8>,
    pub key_exchange_key: Vec<u8>,
}

/// NTLMv1 responses. With extended session security the client challenge is mixed into
/// the DES input; without it the LM response repeats the NT response.
pub fn compute_ntlm_v1_response(password: &str, server_challenge: &[u8], client_challenge: &[u8], extended_session_security: bool) -> ProxyAuthResult<NTLMv1Response> {
    let response_key_nt = ntowf_v1(password);
    let session_base_key = Md4::digest(&response_key_nt).to_vec();

    if extended_session_security {
        let challenge_hash = Md5::new()
            .chain_update(server_challenge)
            .chain_update(client_challenge)
            .finalize();
        let nt_challenge_response = des_long_encrypt(&response_key_nt, &challenge_hash.as_slice()[0..8])?;
        let lm_challenge_response = [client_challenge, &[0_u8; 16][..]].concat();
        let key_exchange_key = hmac_md5(&session_base_key, &[server_challenge, &lm_challenge_response[0..8]])?;
        Ok(NTLMv1Response {
            nt_challenge_response,
            lm_challenge_response,
            session_base_key,
            key_exchange_key,
        })
    } else {
        let nt_challenge_response = des_long_encrypt(&response_key_nt, server_challenge)?;
        Ok(NTLMv1Response {
            lm_challenge_response: nt_challenge_response.clone(),
            nt_challenge_response,
            key_exchange_key: session_base_key.clone(),
            session_base_key,
        })
    }
}

pub fn ntowf_v1(password: &str) -> Vec<u8> {
    let mut pass_hash = Md4::new();
    pass_hash.update(to_utf16_bytes(password));
    pass_hash.finalize().as_slice().into()
}
