use nom::bytes::complete::take;
use nom::IResult;
use nom::number::complete::le_u16;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::byte_helper::{bytes_to_u64, u16_to_bytes, u32_to_bytes};

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Copy, Clone)]
pub enum AVPairId {
    EOL = 0x00,
    NbComputerName = 0x01,
    NbDomainName = 0x02,
    DnsComputerName = 0x03,
    DnsDomainName = 0x04,
    DnsTreeName = 0x05,
    Flags = 0x06,
    Timestamp = 0x07,
    SingleHost = 0x08,
    TargetName = 0x09,
    ChannelBindings = 0x0A,
}

/// `MsvAvFlags` bit indicating the authenticate message carries a MIC.
pub const AV_FLAG_MIC_PRESENT: u32 = 0x02;

/// One entry of the challenge's target info list. Unknown ids are kept verbatim so the
/// list can be echoed back to the server unchanged.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct AVPair {
    id: u16,
    value: Vec<u8>,
}

impl AVPair {
    pub fn new(id: AVPairId, value: Vec<u8>) -> Self {
        Self {
            id: id as u16,
            value,
        }
    }

    pub fn kind(&self) -> Option<AVPairId> {
        AVPairId::try_from(self.id).ok()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Parses pairs up to and excluding the terminating `MsvAvEOL`.
    pub fn parse_list(bytes: &[u8]) -> IResult<&[u8], Vec<AVPair>> {
        let mut pairs = Vec::new();
        let mut remaining = bytes;
        loop {
            let (rest, id) = le_u16(remaining)?;
            let (rest, length) = le_u16(rest)?;
            let (rest, value) = take(length as usize)(rest)?;
            remaining = rest;
            if id == AVPairId::EOL as u16 {
                break;
            }
            pairs.push(AVPair { id, value: value.to_vec() });
        }
        Ok((remaining, pairs))
    }

    /// Serializes the pairs followed by `MsvAvEOL`.
    pub fn list_as_bytes(pairs: &[AVPair]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for pair in pairs {
            bytes.extend_from_slice(&u16_to_bytes(pair.id));
            bytes.extend_from_slice(&u16_to_bytes(pair.value.len() as u16));
            bytes.extend_from_slice(&pair.value);
        }
        bytes.extend_from_slice(&[0; 4]);
        bytes
    }

    pub fn find(pairs: &[AVPair], id: AVPairId) -> Option<&AVPair> {
        pairs.iter().find(|pair| pair.kind() == Some(id))
    }

    /// The server's FILETIME from `MsvAvTimestamp`, if present and well formed.
    pub fn timestamp(pairs: &[AVPair]) -> Option<u64> {
        Self::find(pairs, AVPairId::Timestamp)
            .filter(|pair| pair.value.len() == 8)
            .map(|pair| bytes_to_u64(&pair.value))
    }

    /// Sets `flag` in `MsvAvFlags`, adding the pair when the server did not send one. A
    /// malformed value is replaced.
    pub fn insert_flag(pairs: &mut Vec<AVPair>, flag: u32) {
        match pairs.iter_mut().find(|pair| pair.kind() == Some(AVPairId::Flags)) {
            Some(pair) => {
                let current = match pair.value[..] {
                    [a, b, c, d] => u32::from_le_bytes([a, b, c, d]),
                    _ => 0,
                };
                pair.value = u32_to_bytes(current | flag).to_vec();
            }
            None => pairs.push(AVPair::new(AVPairId::Flags, u32_to_bytes(flag).to_vec())),
        }
    }
}
