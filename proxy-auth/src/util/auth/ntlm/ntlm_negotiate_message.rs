use nom::bytes::complete::take;
use nom::combinator::map;
use nom::IResult;
use nom::number::complete::le_u32;
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use crate::byte_helper::u32_to_bytes;
use crate::util::auth::ntlm::ntlm_message::{get_buffer, ntlm_buffer_fields, NTLM_SIGNATURE, NTLMNegotiateFlags, parse_ntlm_buffer_fields, verify_header};

const NEGOTIATE_HEADER_LENGTH: usize = 32;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct NTLMNegotiateMessageBody {
    signature: String,
    negotiate_flags: NTLMNegotiateFlags,
    domain_name: String,
    workstation: String,
}

impl NTLMNegotiateMessageBody {
    /// A negotiate message with empty domain and workstation buffers.
    pub fn new(negotiate_flags: NTLMNegotiateFlags) -> Self {
        Self {
            signature: "NTLMSSP\0".into(),
            negotiate_flags: negotiate_flags
                - NTLMNegotiateFlags::DOMAIN_NAME_SUPPLIED
                - NTLMNegotiateFlags::WORKSTATION_NAME_SUPPLIED
                - NTLMNegotiateFlags::VERSION,
            domain_name: String::new(),
            workstation: String::new(),
        }
    }

    pub fn parse(bytes: &[u8]) -> IResult<&[u8], Self> {
        let (remaining, (signature, message_type, negotiate_flags, domain_info, workstation_info)) = tuple((
            take(8_usize),
            le_u32,
            map(le_u32, NTLMNegotiateFlags::from_bits_truncate),
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
        ))(bytes)?;
        verify_header(bytes, signature, message_type, 0x01)?;

        // Negotiate strings are always OEM encoded
        let (_, domain_name) = get_buffer(domain_info.0, domain_info.1, bytes)?;
        let (_, workstation) = get_buffer(workstation_info.0, workstation_info.1, bytes)?;
        Ok((remaining, Self {
            signature: String::from_utf8_lossy(signature).into(),
            negotiate_flags,
            domain_name: String::from_utf8_lossy(&domain_name).into(),
            workstation: String::from_utf8_lossy(&workstation).into(),
        }))
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let domain_offset = NEGOTIATE_HEADER_LENGTH;
        let workstation_offset = domain_offset + self.domain_name.len();
        [
            &NTLM_SIGNATURE[..], // 0 - 8
            &u32_to_bytes(0x01)[..], // 8 - 12
            &u32_to_bytes(self.negotiate_flags.bits())[..], // 12 - 16
            &ntlm_buffer_fields(self.domain_name.len(), domain_offset)[..], // 16 - 24
            &ntlm_buffer_fields(self.workstation.len(), workstation_offset)[..], // 24 - 32
            self.domain_name.as_bytes(),
            self.workstation.as_bytes(),
        ].concat()
    }
}

impl NTLMNegotiateMessageBody {
    pub fn signature(&self) -> &String {
        &self.signature
    }

    pub fn negotiate_flags(&self) -> NTLMNegotiateFlags {
        self.negotiate_flags
    }

    pub fn domain_name(&self) -> &String {
        &self.domain_name
    }

    pub fn workstation(&self) -> &String {
        &self.workstation
    }
}
