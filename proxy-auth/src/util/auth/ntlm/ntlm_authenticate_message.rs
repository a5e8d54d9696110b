use nom::bytes::complete::take;
use nom::combinator::map;
use nom::IResult;
use nom::number::complete::le_u32;
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use crate::byte_helper::{from_utf16_bytes, to_utf16_bytes, u32_to_bytes};
use crate::util::auth::ntlm::ntlm_message::{get_buffer, ntlm_buffer_fields, NTLM_SIGNATURE, NTLMNegotiateFlags, NTLMProductVersion, parse_ntlm_buffer_fields, verify_header};

/// Fixed part of the message including the Version and MIC fields.
const AUTHENTICATE_HEADER_LENGTH: usize = 88;
pub(crate) const MIC_OFFSET: usize = 72;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct NTLMAuthenticateMessageBody {
    signature: String,
    negotiate_flags: NTLMNegotiateFlags,
    domain_name: String,
    user_name: String,
    work_station: String,
    lm_challenge_response: Vec<u8>,
    nt_challenge_response: Vec<u8>,
    encrypted_session_key: Vec<u8>,
    version: NTLMProductVersion,
    mic: [u8; 16],
}

impl NTLMAuthenticateMessageBody {
    pub fn new(
        negotiate_flags: NTLMNegotiateFlags,
        domain_name: String,
        user_name: String,
        work_station: String,
        lm_challenge_response: Vec<u8>,
        nt_challenge_response: Vec<u8>,
        encrypted_session_key: Vec<u8>,
    ) -> Self {
        Self {
            signature: "NTLMSSP\0".into(),
            negotiate_flags: negotiate_flags | NTLMNegotiateFlags::VERSION,
            domain_name,
            user_name,
            work_station,
            lm_challenge_response,
            nt_challenge_response,
            encrypted_session_key,
            version: NTLMProductVersion::default(),
            mic: [0; 16],
        }
    }

    pub fn parse(bytes: &[u8]) -> IResult<&[u8], Self> {
        let (remaining, (
            signature,
            message_type,
            lm_challenge_info,
            nt_challenge_info,
            domain_name_info,
            user_name_info,
            work_station_info,
            encrypted_session_key_info,
            negotiate_flags,
        )) = tuple((
            take(8_usize),
            le_u32,
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
            parse_ntlm_buffer_fields,
            map(le_u32, NTLMNegotiateFlags::from_bits_truncate),
        ))(bytes)?;
        verify_header(bytes, signature, message_type, 0x03)?;

        // Version and MIC are only present when the payload starts after them
        let payload_start = [
            lm_challenge_info,
            nt_challenge_info,
            domain_name_info,
            user_name_info,
            work_station_info,
            encrypted_session_key_info,
        ].iter()
            .filter(|(length, _)| *length > 0)
            .map(|(_, offset)| *offset as usize)
            .min()
            .unwrap_or(bytes.len());
        let (remaining, version, mic) = if payload_start >= AUTHENTICATE_HEADER_LENGTH {
            let (remaining, version) = NTLMProductVersion::parse(remaining)?;
            let (remaining, mic) = take(16_usize)(remaining)?;
            let mut mic_bytes = [0; 16];
            mic_bytes.copy_from_slice(mic);
            (remaining, version, mic_bytes)
        } else {
            (remaining, NTLMProductVersion::default(), [0; 16])
        };

        let unicode = negotiate_flags.contains(NTLMNegotiateFlags::UNICODE_ENCODING);
        let decode = |raw: Vec<u8>| if unicode {
            from_utf16_bytes(&raw)
        } else {
            String::from_utf8_lossy(&raw).into()
        };

        let (_, lm_challenge_response) = get_buffer(lm_challenge_info.0, lm_challenge_info.1, bytes)?;
        let (_, nt_challenge_response) = get_buffer(nt_challenge_info.0, nt_challenge_info.1, bytes)?;
        let (_, domain_name) = get_buffer(domain_name_info.0, domain_name_info.1, bytes)?;
        let (_, user_name) = get_buffer(user_name_info.0, user_name_info.1, bytes)?;
        let (_, work_station) = get_buffer(work_station_info.0, work_station_info.1, bytes)?;
        let (_, encrypted_session_key) = get_buffer(
            encrypted_session_key_info.0,
            encrypted_session_key_info.1,
            bytes,
        )?;
        Ok((
            remaining,
            Self {
                signature: String::from_utf8_lossy(signature).into(),
                negotiate_flags,
                domain_name: decode(domain_name),
                user_name: decode(user_name),
                work_station: decode(work_station),
                lm_challenge_response,
                nt_challenge_response,
                encrypted_session_key,
                version,
                mic,
            },
        ))
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let encode = |text: &str| if self.negotiate_flags.contains(NTLMNegotiateFlags::UNICODE_ENCODING) {
            to_utf16_bytes(text)
        } else {
            text.as_bytes().to_vec()
        };
        let domain_name = encode(&self.domain_name);
        let user_name = encode(&self.user_name);
        let work_station = encode(&self.work_station);

        let lm_offset = AUTHENTICATE_HEADER_LENGTH;
        let nt_offset = lm_offset + self.lm_challenge_response.len();
        let domain_offset = nt_offset + self.nt_challenge_response.len();
        let user_offset = domain_offset + domain_name.len();
        let work_station_offset = user_offset + user_name.len();
        let session_key_offset = work_station_offset + work_station.len();

        [
            &NTLM_SIGNATURE[..], // 0 - 8
            &u32_to_bytes(0x03)[..], // 8 - 12
            &ntlm_buffer_fields(self.lm_challenge_response.len(), lm_offset)[..], // 12 - 20
            &ntlm_buffer_fields(self.nt_challenge_response.len(), nt_offset)[..], // 20 - 28
            &ntlm_buffer_fields(domain_name.len(), domain_offset)[..], // 28 - 36
            &ntlm_buffer_fields(user_name.len(), user_offset)[..], // 36 - 44
            &ntlm_buffer_fields(work_station.len(), work_station_offset)[..], // 44 - 52
            &ntlm_buffer_fields(self.encrypted_session_key.len(), session_key_offset)[..], // 52 - 60
            &u32_to_bytes(self.negotiate_flags.bits())[..], // 60 - 64
            &self.version.as_bytes()[..], // 64 - 72
            &self.mic[..], // 72 - 88
            &self.lm_challenge_response[..],
            &self.nt_challenge_response[..],
            &domain_name[..],
            &user_name[..],
            &work_station[..],
            &self.encrypted_session_key[..],
        ].concat()
    }

    pub fn set_mic(&mut self, mic: [u8; 16]) {
        self.mic = mic;
    }
}

impl NTLMAuthenticateMessageBody {
    pub fn signature(&self) -> &String {
        &self.signature
    }

    pub fn negotiate_flags(&self) -> NTLMNegotiateFlags {
        self.negotiate_flags
    }

    pub fn domain_name(&self) -> &String {
        &self.domain_name
    }

    pub fn user_name(&self) -> &String {
        &self.user_name
    }

    pub fn work_station(&self) -> &String {
        &self.work_station
    }

    pub fn lm_challenge_response(&self) -> &[u8] {
        &self.lm_challenge_response
    }

    pub fn nt_challenge_response(&self) -> &[u8] {
        &self.nt_challenge_response
    }

    pub fn encrypted_session_key(&self) -> &[u8] {
        &self.encrypted_session_key
    }

    pub fn mic(&self) -> &[u8; 16] {
        &self.mic
    }
}
