/// NTLM client: wire messages, the protocol engine interface and its default implementation.
pub mod auth;
/// NTLMv1/NTLMv2 response computation and session key derivation.
pub mod crypto;
