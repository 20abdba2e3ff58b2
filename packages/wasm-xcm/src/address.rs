//! SS58 address encoding and decoding
//!
//! Bridges the checksummed, network-prefixed account strings users type in and
//! the raw 32-byte keys that XCM junctions and the wrapper contract expect.
//!
//! Uses the official bs58 crate for base58 encoding, matching the Substrate ecosystem.
//! See: https://docs.substrate.io/reference/address-formats/

use std::fmt;

use crate::error::WasmXcmError;
use crate::types::AddressFormat;
use blake2::{Blake2b512, Digest};

/// SS58 prefix for checksum calculation
const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Number of checksum bytes carried by 32-byte account addresses
const CHECKSUM_LEN: usize = 2;

/// A checksum-verified account: the display string and the key it encodes
///
/// Can only be obtained from [`AddressCodec::decode`] or by encoding a raw key,
/// so `raw` always matches `display`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountRef {
    display: String,
    raw: [u8; 32],
    format: AddressFormat,
}

impl AccountRef {
    /// Build from a raw key, rendering it under `format`
    pub fn from_raw(raw: [u8; 32], format: AddressFormat) -> Self {
        AccountRef {
            display: encode_with_format(&raw, format),
            raw,
            format,
        }
    }

    /// Checksummed SS58 form
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Raw 32-byte public key
    pub fn raw(&self) -> &[u8; 32] {
        &self.raw
    }

    /// Network format the display string was encoded with
    pub fn format(&self) -> AddressFormat {
        self.format
    }

    /// `0x`-prefixed bytes32 hex, as accepted by the wrapper contract
    pub fn to_bytes32_hex(&self) -> String {
        format!("0x{}", hex::encode(self.raw))
    }

    /// Same key, displayed under another network prefix
    pub fn reencode(&self, format: AddressFormat) -> AccountRef {
        AccountRef::from_raw(self.raw, format)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Codec bound to a canonical network format
///
/// Decoding accepts every recognized [`AddressFormat`]; encoding always uses
/// the canonical one, so `encode(decode(a).raw) == a` holds for canonical
/// addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressCodec {
    format: AddressFormat,
}

impl AddressCodec {
    pub fn new(format: AddressFormat) -> Self {
        AddressCodec { format }
    }

    pub fn format(&self) -> AddressFormat {
        self.format
    }

    /// Decode and checksum-verify a display address
    pub fn decode(&self, display: &str) -> Result<AccountRef, WasmXcmError> {
        let display = display.trim();
        let (raw, prefix) = decode_ss58(display)?;
        let format = AddressFormat::from_prefix(prefix)
            .ok_or(WasmXcmError::UnsupportedAddressVersion(prefix))?;

        Ok(AccountRef {
            display: display.to_string(),
            raw,
            format,
        })
    }

    /// Encode a raw key under the canonical format
    pub fn encode(&self, raw: &[u8; 32]) -> String {
        encode_with_format(raw, self.format)
    }
}

impl Default for AddressCodec {
    fn default() -> Self {
        AddressCodec::new(AddressFormat::Polkadot)
    }
}

/// Encode a public key to SS58 address format
///
/// # Arguments
/// * `public_key` - 32-byte public key
/// * `prefix` - Network prefix (0 for Polkadot, 2 for Kusama, 42 for generic Substrate)
pub fn encode_ss58(public_key: &[u8], prefix: u16) -> Result<String, WasmXcmError> {
    if public_key.len() != 32 {
        return Err(WasmXcmError::InvalidInput(format!(
            "Public key must be 32 bytes, got {}",
            public_key.len()
        )));
    }

    // Build payload: prefix + public key
    let mut payload = encode_prefix(prefix)?;
    payload.extend_from_slice(public_key);

    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    Ok(bs58::encode(&payload).into_string())
}

/// Decode an SS58 address to public key and prefix
///
/// Does not check whether the prefix is one we accept; see [`AddressCodec::decode`].
pub fn decode_ss58(address: &str) -> Result<([u8; 32], u16), WasmXcmError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| WasmXcmError::InvalidAddressFormat(format!("Invalid base58: {}", e)))?;

    if decoded.is_empty() {
        return Err(WasmXcmError::InvalidAddressFormat(
            "Empty address".to_string(),
        ));
    }

    let (prefix, prefix_len) = decode_prefix(&decoded)?;

    if decoded.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(WasmXcmError::InvalidAddressFormat(format!(
            "Invalid address length: {}",
            decoded.len()
        )));
    }

    let checksum_start = decoded.len() - CHECKSUM_LEN;
    let payload = &decoded[..checksum_start];
    let expected_checksum = ss58_checksum(payload);

    if decoded[checksum_start..] != expected_checksum[..CHECKSUM_LEN] {
        return Err(WasmXcmError::InvalidAddressFormat(
            "Invalid checksum".to_string(),
        ));
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&decoded[prefix_len..checksum_start]);

    Ok((public_key, prefix))
}

/// Validate an SS58 address
pub fn validate_address(address: &str, expected_prefix: Option<u16>) -> bool {
    match decode_ss58(address) {
        Ok((_, prefix)) => expected_prefix.map_or(true, |expected| prefix == expected),
        Err(_) => false,
    }
}

/// Get address format from address string
pub fn get_address_format(address: &str) -> Result<AddressFormat, WasmXcmError> {
    let (_, prefix) = decode_ss58(address)?;
    AddressFormat::from_prefix(prefix).ok_or(WasmXcmError::UnsupportedAddressVersion(prefix))
}

/// Known formats all have single-byte prefixes, so this cannot fail
fn encode_with_format(raw: &[u8; 32], format: AddressFormat) -> String {
    let mut payload = Vec::with_capacity(1 + 32 + CHECKSUM_LEN);
    payload.push(format.prefix() as u8);
    payload.extend_from_slice(raw);
    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(&payload).into_string()
}

/// Encode SS58 prefix (supports single and two-byte prefixes)
fn encode_prefix(prefix: u16) -> Result<Vec<u8>, WasmXcmError> {
    if prefix < 64 {
        Ok(vec![prefix as u8])
    } else if prefix < 16384 {
        // Two-byte encoding per SS58 spec
        let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
        Ok(vec![first, second])
    } else {
        Err(WasmXcmError::InvalidInput(format!(
            "Invalid prefix: {}",
            prefix
        )))
    }
}

/// Decode SS58 prefix from raw bytes
fn decode_prefix(data: &[u8]) -> Result<(u16, usize), WasmXcmError> {
    if data[0] < 64 {
        Ok((data[0] as u16, 1))
    } else if data[0] < 128 {
        if data.len() < 2 {
            return Err(WasmXcmError::InvalidAddressFormat(
                "Address too short for two-byte prefix".to_string(),
            ));
        }
        let lower = (data[0] & 0b0011_1111) << 2 | (data[1] >> 6);
        let upper = data[1] & 0b0011_1111;
        Ok((((upper as u16) << 8) | (lower as u16), 2))
    } else {
        // 128..=255 are reserved by the SS58 registry
        Err(WasmXcmError::UnsupportedAddressVersion(data[0] as u16))
    }
}

/// Calculate SS58 checksum (Blake2b-512 of "SS58PRE" || payload)
fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let result = hasher.finalize();
    let mut checksum = [0u8; 64];
    checksum.copy_from_slice(&result);
    checksum
}
