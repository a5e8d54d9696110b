use digest::Digest;
use md4::Md4;

use proxy_auth_core::ProxyAuthResult;

use crate::byte_helper::{to_utf16_bytes, u64_to_bytes};
use crate::util::crypto::hmac_md5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NTLMv2Response {
    pub nt_challenge_response: Vec<u8>,
    pub lm_challenge_response: Vec<u8>,
    pub session_base_key: Vec<u8>,
}

/// Computes the client's NTLMv2 and LMv2 responses for a server challenge.
///
/// `target_info` is the serialized AV pair list the client echoes back, including the
/// terminating `MsvAvEOL`. `time` is a FILETIME.
pub fn compute_ntlm_v2_response(response_key_nt: &[u8], server_challenge: &[u8], client_challenge: &[u8], time: u64, target_info: &[u8]) -> ProxyAuthResult<NTLMv2Response> {
    let temp = [
        &[1_u8, 1][..],
        &[0_u8; 6][..],
        &u64_to_bytes(time)[..],
        client_challenge,
        &[0_u8; 4][..],
        target_info,
        &[0_u8; 4][..],
    ].concat();
    let nt_proof_str = hmac_md5(response_key_nt, &[server_challenge, &temp[..]])?;
    let nt_challenge_response = [nt_proof_str.as_slice(), &temp[..]].concat();

    // ResponseKeyLM equals ResponseKeyNT for NTLMv2
    let lm_proof = hmac_md5(response_key_nt, &[server_challenge, client_challenge])?;
    let lm_challenge_response = [lm_proof.as_slice(), client_challenge].concat();

    let session_base_key = hmac_md5(response_key_nt, &[&nt_proof_str[..]])?;
    Ok(NTLMv2Response {
        nt_challenge_response,
        lm_challenge_response,
        session_base_key,
    })
}

pub fn ntowf_v2(password: &str, user: &str, domain: &str) -> ProxyAuthResult<Vec<u8>> {
    let password_hash = Md4::digest(to_utf16_bytes(password));
    let text = user.to_uppercase() + domain;
    hmac_md5(password_hash.as_slice(), &[&to_utf16_bytes(&text)[..]])
}
