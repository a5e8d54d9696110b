//! # NTLM Proxy Auth
//!
//! Client side **NTLM** authentication for HTTP proxies, as specified in
//! [\[MS-NLMP\]](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-nlmp/b38c36ed-2804-4868-a9ff-8dd3182128e4).
//!
//! This crate provides:
//! - **HTTP layer** ([`http`]): The three step handshake state machine that answers a
//!   `407 Proxy Authentication Required` response by setting `Proxy-Authorization`, and the
//!   challenge header parser it relies on.
//! - **Utilities** ([`util`]): The NTLM client engine (negotiate, challenge and authenticate
//!   messages, AV pairs, configuration) and the NTLMv1/NTLMv2 cryptography behind it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::{Request, Response};
//! use ntlm_proxy_auth::http::NTLMHttpAuthenticator;
//!
//! fn connect(send: impl Fn(&Request<()>) -> Response<()>) -> proxy_auth_core::ProxyAuthResult<Response<()>> {
//!     let mut authenticator = NTLMHttpAuthenticator::new();
//!     let mut request = Request::builder().method("CONNECT").uri("example.com:443").body(()).unwrap();
//!     let mut response = send(&request);
//!     while response.status() == http::StatusCode::PROXY_AUTHENTICATION_REQUIRED {
//!         authenticator.authenticate(&mut request, &response, "CORP\\alice", "secret")?;
//!         response = send(&request);
//!     }
//!     Ok(response)
//! }
//! ```

pub mod http;
pub mod util;
mod byte_helper;

pub use proxy_auth_core::error::ProxyAuthError;
pub use proxy_auth_core::ProxyAuthResult;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`. Does nothing if one is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
