use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use md5::Md5;

use proxy_auth_core::error::ProxyAuthError;
use proxy_auth_core::ProxyAuthResult;

pub mod des;
pub mod ntlm_v1;
pub mod ntlm_v2;
pub mod session_keys;

/// Seconds between 1601-01-01 and the Unix epoch.
const FILETIME_UNIX_OFFSET_SECS: u64 = 11_644_473_600;

pub(crate) fn new_hmac_from_slice(slice: &[u8]) -> ProxyAuthResult<Hmac<Md5>> {
    <Hmac<Md5>>::new_from_slice(slice).map_err(|_| ProxyAuthError::crypto_error("Invalid length for key"))
}

pub(crate) fn hmac_md5(key: &[u8], parts: &[&[u8]]) -> ProxyAuthResult<Vec<u8>> {
    let mut hmac = new_hmac_from_slice(key)?;
    for part in parts {
        hmac.update(part);
    }
    Ok(hmac.finalize().into_bytes().to_vec())
}

/// Current time as a Windows FILETIME (100ns ticks since 1601).
pub fn filetime_now() -> u64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (since_epoch.as_secs() + FILETIME_UNIX_OFFSET_SECS) * 10_000_000 + (since_epoch.subsec_nanos() / 100) as u64
}
