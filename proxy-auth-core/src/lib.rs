//! Shared plumbing for the NTLM proxy authentication crates: the error type every
//! layer returns and the feature-gated logging macros.

use error::ProxyAuthError;

pub mod error;
pub mod logging;

pub type ProxyAuthResult<T, E = ProxyAuthError> = Result<T, E>;
