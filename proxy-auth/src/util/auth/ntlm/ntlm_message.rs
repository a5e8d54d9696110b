use bitflags::bitflags;
use nom::bytes::complete::take;
use nom::Err::Error;
use nom::error::ErrorKind;
use nom::IResult;
use nom::number::complete::{le_u16, le_u32};
use serde::{Deserialize, Serialize};

use proxy_auth_core::error::ProxyAuthError;

use crate::byte_helper::{u16_to_bytes, u32_to_bytes};
use crate::util::auth::ntlm::{NTLMAuthenticateMessageBody, NTLMChallengeMessageBody, NTLMNegotiateMessageBody};

pub const NTLM_SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub enum NTLMMessage {
    Negotiate(NTLMNegotiateMessageBody),
    Challenge(NTLMChallengeMessageBody),
    Authenticate(NTLMAuthenticateMessageBody),
}

impl NTLMMessage {
    pub fn parse(bytes: &[u8]) -> IResult<&[u8], Self> {
        let (_, msg_type) = take(8_usize)(bytes)
            .and_then(|(remaining, _)| le_u32(remaining))?;
        match msg_type {
            0x01 => {
                let (remaining, body) = NTLMNegotiateMessageBody::parse(bytes)?;
                Ok((remaining, NTLMMessage::Negotiate(body)))
            },
            0x02 => {
                let (remaining, body) = NTLMChallengeMessageBody::parse(bytes)?;
                Ok((remaining, NTLMMessage::Challenge(body)))
            },
            0x03 => {
                let (remaining, body) = NTLMAuthenticateMessageBody::parse(bytes)?;
                Ok((remaining, NTLMMessage::Authenticate(body)))
            },
            _ => Err(Error(nom::error::Error::new(bytes, ErrorKind::Fail)))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NTLMMessage::Negotiate(_) => "negotiate",
            NTLMMessage::Challenge(_) => "challenge",
            NTLMMessage::Authenticate(_) => "authenticate",
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            NTLMMessage::Negotiate(msg) => msg.as_bytes(),
            NTLMMessage::Challenge(msg) => msg.as_bytes(),
            NTLMMessage::Authenticate(msg) => msg.as_bytes(),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
    pub struct NTLMNegotiateFlags: u32 {
        const UNICODE_ENCODING = 0x01;
        const OEM_ENCODING = 0x02;
        const REQUEST_TARGET = 0x04;
        const SIGN = 0x10;
        const SEAL = 0x20;
        const DATAGRAM = 0x40;
        const LAN_MANAGER_SESSION_KEY = 0x80;
        const NTLM_SESSION_SECURITY = 0x200;
        const ANONYMOUS = 0x800;
        const DOMAIN_NAME_SUPPLIED = 0x1000;
        const WORKSTATION_NAME_SUPPLIED = 0x2000;
        const ALWAYS_SIGN = 0x8000;
        const TARGET_TYPE_DOMAIN = 0x10000;
        const TARGET_TYPE_SERVER = 0x20000;
        const EXTENDED_SESSION_SECURITY = 0x80000;
        const IDENTIFY = 0x100000;
        const REQUEST_NON_NT_SESSION_KEY = 0x400000;
        const TARGET_INFO = 0x800000;
        const VERSION = 0x2000000;
        const USE_128_BIT_ENCRYPTION = 0x20000000;
        const KEY_EXCHANGE = 0x40000000;
        const USE_56_BIT_ENCRYPTION = 0x80000000;
    }
}

impl NTLMNegotiateFlags {
    /// Flags a connection-oriented HTTP client offers in its negotiate message.
    pub fn client_default() -> Self {
        Self::UNICODE_ENCODING
            | Self::OEM_ENCODING
            | Self::REQUEST_TARGET
            | Self::NTLM_SESSION_SECURITY
            | Self::ALWAYS_SIGN
            | Self::EXTENDED_SESSION_SECURITY
            | Self::USE_128_BIT_ENCRYPTION
            | Self::KEY_EXCHANGE
            | Self::USE_56_BIT_ENCRYPTION
    }
}

/// Version structure carried in challenge and authenticate messages. Informational only.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct NTLMProductVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
    pub revision: u8,
}

impl NTLMProductVersion {
    pub fn parse(bytes: &[u8]) -> IResult<&[u8], Self> {
        let (remaining, major_minor) = take(2_usize)(bytes)?;
        let (remaining, build) = le_u16(remaining)?;
        let (remaining, _) = take(3_usize)(remaining)?;
        let (remaining, revision) = take(1_usize)(remaining)?;
        Ok((remaining, Self {
            major: major_minor[0],
            minor: major_minor[1],
            build,
            revision: revision[0],
        }))
    }

    pub fn as_bytes(&self) -> [u8; 8] {
        let build = u16_to_bytes(self.build);
        [self.major, self.minor, build[0], build[1], 0, 0, 0, self.revision]
    }
}

impl Default for NTLMProductVersion {
    fn default() -> Self {
        Self {
            major: 6,
            minor: 1,
            build: 7600,
            revision: 15,
        }
    }
}

/// Reads the (length, offset) pair of a security buffer, skipping the max-length field.
pub(crate) fn parse_ntlm_buffer_fields(bytes: &[u8]) -> IResult<&[u8], (u16, u32)> {
    let (remaining, length) = le_u16(bytes)?;
    let (remaining, buffer_offset) = take(2_usize)(remaining).and_then(|(remaining, _)| le_u32(remaining))?;
    Ok((remaining, (length, buffer_offset)))
}

pub(crate) fn ntlm_buffer_fields(length: usize, offset: usize) -> Vec<u8> {
    let length = u16_to_bytes(length as u16);
    [&length[..], &length[..], &u32_to_bytes(offset as u32)[..]].concat()
}

pub(crate) fn get_buffer(length: u16, offset: u32, buffer: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (remaining, slice) = take(offset as usize)(buffer)
        .and_then(|(remaining, _)| take(length as usize)(remaining))?;
    Ok((remaining, slice.to_vec()))
}

pub(crate) fn verify_header<'a>(bytes: &'a [u8], signature: &[u8], message_type: u32, expected_type: u32) -> Result<(), nom::Err<nom::error::Error<&'a [u8]>>> {
    if signature != NTLM_SIGNATURE || message_type != expected_type {
        return Err(Error(nom::error::Error::new(bytes, ErrorKind::Verify)));
    }
    Ok(())
}

pub(crate) fn to_parse_error<I>(err: nom::Err<nom::error::Error<I>>) -> ProxyAuthError {
    match err {
        nom::Err::Incomplete(_) => ProxyAuthError::parse_error("incomplete NTLM message"),
        nom::Err::Error(x) | nom::Err::Failure(x) => {
            ProxyAuthError::parse_error(format!("malformed NTLM message ({:?})", x.code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_message_type() {
        let negotiate = NTLMNegotiateMessageBody::new(NTLMNegotiateFlags::client_default());
        let (_, message) = NTLMMessage::parse(&negotiate.as_bytes()).unwrap();
        assert_eq!(message, NTLMMessage::Negotiate(negotiate));
    }

    #[test]
    fn rejects_unknown_message_type() {
        let mut bytes = NTLM_SIGNATURE.to_vec();
        bytes.extend_from_slice(&u32_to_bytes(7));
        bytes.extend_from_slice(&[0; 24]);
        assert!(NTLMMessage::parse(&bytes).is_err());
    }

    #[test]
    fn flag_values_match_wire_format() {
        assert_eq!(NTLMNegotiateFlags::UNICODE_ENCODING.bits(), 0x0000_0001);
        assert_eq!(NTLMNegotiateFlags::EXTENDED_SESSION_SECURITY.bits(), 0x0008_0000);
        assert_eq!(NTLMNegotiateFlags::KEY_EXCHANGE.bits(), 0x4000_0000);
        assert_eq!(NTLMNegotiateFlags::client_default().bits(), 0xE008_8207);
    }

    #[test]
    fn product_version_layout() {
        let version = NTLMProductVersion::default();
        let bytes = version.as_bytes();
        assert_eq!(bytes, [6, 1, 0xB0, 0x1D, 0, 0, 0, 15]);
        let (_, parsed) = NTLMProductVersion::parse(&bytes).unwrap();
        assert_eq!(parsed, version);
    }

    #[test]
    fn buffer_out_of_range_is_error() {
        let bytes = [0_u8; 16];
        assert!(get_buffer(8, 12, &bytes).is_err());
        assert_eq!(get_buffer(4, 12, &bytes).unwrap().1, vec![0; 4]);
    }
}
