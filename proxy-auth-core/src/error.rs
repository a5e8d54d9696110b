use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ProxyAuthError {
    MissingChallenge(ProxyAuthMissingChallengeError),
    ChallengeHeader(ProxyAuthChallengeHeaderError),
    DecodeError(ProxyAuthDecodeError),
    ParseError(ProxyAuthParseError),
    CryptoError(ProxyAuthCryptoError),
    PreconditionFailed(ProxyAuthPreconditionFailedError),
    EngineError(ProxyAuthEngineError),
    AuthenticationRejected(ProxyAuthRejectedError),
}

impl ProxyAuthError {
    pub fn missing_challenge<T: Into<ProxyAuthMissingChallengeError>>(scheme: T) -> Self {
        Self::MissingChallenge(scheme.into())
    }

    pub fn challenge_header<T: Into<ProxyAuthChallengeHeaderError>>(error: T) -> Self {
        Self::ChallengeHeader(error.into())
    }

    pub fn decode_error<T: Into<ProxyAuthDecodeError>>(error: T) -> Self {
        Self::DecodeError(error.into())
    }

    pub fn parse_error<T: Into<ProxyAuthParseError>>(error: T) -> Self {
        Self::ParseError(error.into())
    }

    pub fn crypto_error<T: Into<ProxyAuthCryptoError>>(error: T) -> Self {
        Self::CryptoError(error.into())
    }

    pub fn precondition_failed<T: Into<ProxyAuthPreconditionFailedError>>(error: T) -> Self {
        Self::PreconditionFailed(error.into())
    }

    pub fn engine_error<T: Into<ProxyAuthEngineError>>(error: T) -> Self {
        Self::EngineError(error.into())
    }

    pub fn authentication_rejected<T: Into<ProxyAuthRejectedError>>(error: T) -> Self {
        Self::AuthenticationRejected(error.into())
    }
}

#[derive(Debug)]
pub struct ProxyAuthMissingChallengeError {
    scheme: String,
}

impl ProxyAuthMissingChallengeError {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl<T: Into<String>> From<T> for ProxyAuthMissingChallengeError {
    fn from(value: T) -> Self {
        Self {
            scheme: value.into()
        }
    }
}

impl Display for ProxyAuthMissingChallengeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bad proxy response, no {} challenge", self.scheme)
    }
}

#[derive(Debug)]
pub struct ProxyAuthChallengeHeaderError {
    message: String,
}

impl<T: Into<String>> From<T> for ProxyAuthChallengeHeaderError {
    fn from(value: T) -> Self {
        Self {
            message: value.into()
        }
    }
}

impl Display for ProxyAuthChallengeHeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid authentication challenge header: {}", self.message)
    }
}

#[derive(Debug)]
pub struct ProxyAuthDecodeError {
    error: Box<dyn Error + Send + Sync>,
}

impl<T: Into<Box<dyn Error + Send + Sync>>> From<T> for ProxyAuthDecodeError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for ProxyAuthDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decoding challenge token failed with error: {}", self.error)
    }
}

#[derive(Debug)]
pub struct ProxyAuthParseError {
    error: Box<dyn Error + Send + Sync>,
}

impl<T: Into<Box<dyn Error + Send + Sync>>> From<T> for ProxyAuthParseError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for ProxyAuthParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse failed with error: {}", self.error)
    }
}

#[derive(Debug)]
pub struct ProxyAuthCryptoError {
    message: String,
}

impl<T: Into<String>> From<T> for ProxyAuthCryptoError {
    fn from(value: T) -> Self {
        Self {
            message: value.into()
        }
    }
}

impl Display for ProxyAuthCryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Crypto operation failed with error: {}", self.message)
    }
}

#[derive(Debug)]
pub struct ProxyAuthPreconditionFailedError {
    message: String,
}

impl<T: Into<String>> From<T> for ProxyAuthPreconditionFailedError {
    fn from(value: T) -> Self {
        Self {
            message: value.into()
        }
    }
}

impl Display for ProxyAuthPreconditionFailedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation failed with unmet precondition: {}", self.message)
    }
}

#[derive(Debug)]
pub struct ProxyAuthEngineError {
    error: Box<dyn Error + Send + Sync>,
}

impl<T: Into<Box<dyn Error + Send + Sync>>> From<T> for ProxyAuthEngineError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for ProxyAuthEngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[derive(Debug)]
pub struct ProxyAuthRejectedError {
    message: String,
}

impl<T: Into<String>> From<T> for ProxyAuthRejectedError {
    fn from(value: T) -> Self {
        Self {
            message: value.into()
        }
    }
}

impl Display for ProxyAuthRejectedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Authorization is not accepted by the proxy server: {}", self.message)
    }
}

impl Display for ProxyAuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingChallenge(x) => write!(f, "{}", x),
            Self::ChallengeHeader(x) => write!(f, "{}", x),
            Self::DecodeError(x) => write!(f, "{}", x),
            Self::ParseError(x) => write!(f, "{}", x),
            Self::CryptoError(x) => write!(f, "{}", x),
            Self::PreconditionFailed(x) => write!(f, "{}", x),
            Self::EngineError(x) => write!(f, "{}", x),
            Self::AuthenticationRejected(x) => write!(f, "{}", x),
        }
    }
}

impl std::error::Error for ProxyAuthError {}
