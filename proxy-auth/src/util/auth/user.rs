use std::fmt::{Debug, Formatter};

#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub domain: String,
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(domain: String, username: String, password: String) -> Self {
        Self { domain, username, password }
    }

    /// Splits a `DOMAIN\user` name on its first backslash. A bare `user` gets an empty domain.
    pub fn from_qualified_name(name: &str, password: &str) -> Self {
        let (domain, username) = name.split_once('\\').unwrap_or(("", name));
        Self::new(domain.into(), username.into(), password.into())
    }
}

impl Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
