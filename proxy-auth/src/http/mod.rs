//! HTTP glue: challenge header parsing and the proxy handshake driver.

pub use authenticator::*;
pub use challenge::*;

mod authenticator;
mod challenge;
