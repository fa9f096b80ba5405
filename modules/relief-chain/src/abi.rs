//! Just enough of the Solidity ABI for the relief contract's view functions.

use sha3::{Digest, Keccak256};

use crate::error::{ChainError, Result};

const WORD: usize = 32;

/// First four bytes of the keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Parse a `0x`-optional hex string of exactly 32 bytes.
pub fn parse_bytes32(hash: &str) -> Result<[u8; 32]> {
    let hex_part = hash.trim().trim_start_matches("0x");
    if hex_part.len() != 64 {
        return Err(ChainError::InvalidHash(format!(
            "expected 64 hex characters, got {}",
            hex_part.len()
        )));
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(hex_part, &mut out)
        .map_err(|e| ChainError::InvalidHash(e.to_string()))?;
    Ok(out)
}

/// Calldata for a call with static 32-byte arguments, as `0x` hex.
pub fn encode_call(selector: [u8; 4], args: &[[u8; 32]]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    format!("0x{}", hex::encode(data))
}

/// Return data split into 32-byte words.
pub struct Words<'a>(&'a [u8]);

impl<'a> Words<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self(data)
    }

    fn slice(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.0.len())
            .ok_or_else(|| {
                ChainError::Decode(format!(
                    "return data too short: need {start}+{len}, have {}",
                    self.0.len()
                ))
            })?;
        Ok(&self.0[start..end])
    }

    fn word(&self, index: usize) -> Result<&'a [u8]> {
        self.slice(index * WORD, WORD)
    }

    fn uint_at_offset(&self, offset: usize) -> Result<u128> {
        let word = self.slice(offset, WORD)?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(ChainError::Decode("uint256 exceeds u128".to_string()));
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(low))
    }

    pub fn uint(&self, index: usize) -> Result<u128> {
        self.uint_at_offset(index * WORD)
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        Ok(self.uint(index)? != 0)
    }

    pub fn address(&self, index: usize) -> Result<String> {
        let word = self.word(index)?;
        Ok(format!("0x{}", hex::encode(&word[12..])))
    }

    /// Dynamic string whose head slot `index` holds its byte offset.
    pub fn string(&self, index: usize) -> Result<String> {
        let offset = usize::try_from(self.uint(index)?)
            .map_err(|_| ChainError::Decode("string offset out of range".to_string()))?;
        let len = usize::try_from(self.uint_at_offset(offset)?)
            .map_err(|_| ChainError::Decode("string length out of range".to_string()))?;
        let bytes = self.slice(offset + WORD, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| ChainError::Decode(e.to_string()))
    }
}

/// `getDisasterDetails(bytes32)` return values, amounts in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasterDetails {
    pub title: String,
    pub metadata: String,
    pub target_amount: u128,
    pub total_donated: u128,
    pub creator: String,
    pub timestamp: u128,
    pub is_active: bool,
}

pub fn decode_disaster_details(data: &[u8]) -> Result<DisasterDetails> {
    let words = Words::new(data);
    Ok(DisasterDetails {
        title: words.string(0)?,
        metadata: words.string(1)?,
        target_amount: words.uint(2)?,
        total_donated: words.uint(3)?,
        creator: words.address(4)?,
        timestamp: words.uint(5)?,
        is_active: words.bool(6)?,
    })
}
