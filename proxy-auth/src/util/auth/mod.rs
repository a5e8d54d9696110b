pub use user::*;

pub mod ntlm;
mod user;
