use nom::bytes::complete::take;
use nom::combinator::map;
use nom::IResult;
use nom::number::complete::le_u32;
use nom::sequence::tuple;
use rand::RngCore;
use rand::rngs::ThreadRng;
use serde::{Deserialize, Serialize};

use crate::byte_helper::{from_utf16_bytes, to_utf16_bytes, u32_to_bytes};
use crate::util::auth::ntlm::ntlm_av_pair::AVPair;
use crate::util::auth::ntlm::ntlm_message::{get_buffer, ntlm_buffer_fields, NTLM_SIGNATURE, NTLMNegotiateFlags, NTLMProductVersion, parse_ntlm_buffer_fields, verify_header};

const CHALLENGE_HEADER_LENGTH: usize = 56;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct NTLMChallengeMessageBody {
    signature: String,
    target_name: String,
    negotiate_flags: NTLMNegotiateFlags,
    server_challenge: [u8; 8],
    target_info: Vec<AVPair>,
    version: Option<NTLMProductVersion>,
    #[serde(skip)]
    raw_bytes: Vec<u8>,
}

impl NTLMChallengeMessageBody {
    /// Builds a server challenge with a random nonce, as a proxy would send it.
    pub fn new(target_name: String, negotiate_flags: NTLMNegotiateFlags, target_info: Vec<AVPair>) -> Self {
        let mut server_challenge = [0; 8];
        ThreadRng::default().fill_bytes(&mut server_challenge);
        Self::with_server_challenge(target_name, negotiate_flags, server_challenge, target_info)
    }

    pub fn with_server_challenge(target_name: String, negotiate_flags: NTLMNegotiateFlags, server_challenge: [u8; 8], target_info: Vec<AVPair>) -> Self {
        NTLMChallengeMessageBody {
            signature: "NTLMSSP\0".into(),
            target_name,
            negotiate_flags: negotiate_flags | NTLMNegotiateFlags::TARGET_INFO | NTLMNegotiateFlags::VERSION,
            server_challenge,
            target_info,
            version: Some(NTLMProductVersion::default()),
            raw_bytes: Vec::new(),
        }
    }

    pub fn parse(bytes: &[u8]) -> IResult<&[u8], Self> {
        let (remaining, (signature, message_type, target_name_info, negotiate_flags, server_challenge, _)) = tuple((
            take(8_usize),
            le_u32,
            parse_ntlm_buffer_fields,
            map(le_u32, NTLMNegotiateFlags::from_bits_truncate),
            take(8_usize),
            take(8_usize),
        ))(bytes)?;
        verify_header(bytes, signature, message_type, 0x02)?;

        // Early NTLM servers end the message after the reserved field
        let (remaining, target_info_info) = if remaining.len() >= 8 {
            parse_ntlm_buffer_fields(remaining)?
        } else {
            (remaining, (0, 0))
        };
        let (remaining, version) = if negotiate_flags.contains(NTLMNegotiateFlags::VERSION) && remaining.len() >= 8 {
            let (remaining, version) = NTLMProductVersion::parse(remaining)?;
            (remaining, Some(version))
        } else {
            (remaining, None)
        };

        let (_, target_name) = get_buffer(target_name_info.0, target_name_info.1, bytes)?;
        let target_name = if negotiate_flags.contains(NTLMNegotiateFlags::UNICODE_ENCODING) {
            from_utf16_bytes(&target_name)
        } else {
            String::from_utf8_lossy(&target_name).into()
        };

        let (_, target_info) = get_buffer(target_info_info.0, target_info_info.1, bytes)?;
        let target_info = if target_info.is_empty() {
            Vec::new()
        } else {
            match AVPair::parse_list(&target_info) {
                Ok((_, pairs)) => pairs,
                Err(_) => return Err(nom::Err::Error(nom::error::Error::new(bytes, nom::error::ErrorKind::Verify))),
            }
        };

        let mut challenge = [0; 8];
        challenge.copy_from_slice(server_challenge);
        Ok((remaining, Self {
            signature: String::from_utf8_lossy(signature).into(),
            target_name,
            negotiate_flags,
            server_challenge: challenge,
            target_info,
            version,
            raw_bytes: bytes.to_vec(),
        }))
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let name = if self.negotiate_flags.contains(NTLMNegotiateFlags::UNICODE_ENCODING) {
            to_utf16_bytes(&self.target_name)
        } else {
            self.target_name.as_bytes().to_vec()
        };
        let target_info = AVPair::list_as_bytes(&self.target_info);
        let name_offset = CHALLENGE_HEADER_LENGTH;
        let target_info_offset = name_offset + name.len();
        [
            &NTLM_SIGNATURE[..], // 0 - 8
            &u32_to_bytes(0x02)[..], // 8 - 12
            &ntlm_buffer_fields(name.len(), name_offset)[..], // 12 - 20
            &u32_to_bytes(self.negotiate_flags.bits())[..], // 20 - 24
            &self.server_challenge[..], // 24 - 32
            &[0; 8][..], // 32 - 40
            &ntlm_buffer_fields(target_info.len(), target_info_offset)[..], // 40 - 48
            &self.version.unwrap_or_default().as_bytes()[..], // 48 - 56
            &name[..],
            &target_info[..],
        ].concat()
    }
}

impl NTLMChallengeMessageBody {
    pub fn signature(&self) -> &String {
        &self.signature
    }

    pub fn target_name(&self) -> &String {
        &self.target_name
    }

    pub fn negotiate_flags(&self) -> NTLMNegotiateFlags {
        self.negotiate_flags
    }

    pub fn server_challenge(&self) -> &[u8; 8] {
        &self.server_challenge
    }

    pub fn target_info(&self) -> &[AVPair] {
        &self.target_info
    }

    pub fn version(&self) -> Option<NTLMProductVersion> {
        self.version
    }

    /// The message exactly as received; empty for locally built challenges.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }
}
