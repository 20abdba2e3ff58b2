//! XCM program parsing
//!
//! Decodes raw program bytes and checks they have the teleport shape produced
//! by [`super::build_teleport`], e.g. before handing a message from elsewhere
//! to the weight precompile.

use parity_scale_codec::DecodeLimit;
use serde::Serialize;

use super::types::{
    AssetFilter, AssetTransferFilter, Junction, Junctions, Location, XcmInstruction, XcmProgram,
    MAX_XCM_DECODE_DEPTH,
};
use crate::address::AccountRef;
use crate::error::WasmXcmError;
use crate::types::{serialize_u128, AddressFormat};

/// Summary of a teleport program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTeleport {
    /// XCM version tag
    pub version: u8,
    /// Top-level instruction names in order
    pub instructions: Vec<String>,
    /// Destination parachain
    pub destination_para_id: u32,
    /// Beneficiary (SS58 encoded)
    pub beneficiary: String,
    /// Beneficiary as bytes32 hex
    pub beneficiary_hex: String,
    /// Total withdrawn on the origin (in planck)
    #[serde(serialize_with = "serialize_u128")]
    pub withdraw_amount: u128,
    /// Fee paid on the origin (in planck)
    #[serde(serialize_with = "serialize_u128")]
    pub local_fee: u128,
    /// Fee teleported for remote execution (in planck)
    #[serde(serialize_with = "serialize_u128")]
    pub remote_fee: u128,
    /// Amount left for the beneficiary before remote execution costs
    #[serde(serialize_with = "serialize_u128")]
    pub amount: u128,
}

/// Decode a version-tagged program, rejecting trailing bytes
pub fn parse_program(bytes: &[u8]) -> Result<XcmProgram, WasmXcmError> {
    let mut input = bytes;
    Ok(XcmProgram::decode_all_with_depth_limit(
        MAX_XCM_DECODE_DEPTH,
        &mut input,
    )?)
}

/// Decode a program from hex (with or without 0x prefix)
pub fn parse_program_hex(hex: &str) -> Result<XcmProgram, WasmXcmError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let bytes =
        hex::decode(hex).map_err(|e| WasmXcmError::InvalidInput(format!("Invalid hex: {}", e)))?;
    parse_program(&bytes)
}

/// Decode and verify a teleport program
///
/// # Arguments
/// * `bytes` - SCALE encoded `VersionedXcm`
/// * `format` - Network format used to render the beneficiary
pub fn parse_teleport(bytes: &[u8], format: AddressFormat) -> Result<ParsedTeleport, WasmXcmError> {
    let program = parse_program(bytes)?;
    summarize_teleport(&program, format)
}

/// Verify `program` has the teleport shape and summarize it
pub fn summarize_teleport(
    program: &XcmProgram,
    format: AddressFormat,
) -> Result<ParsedTeleport, WasmXcmError> {
    let instructions = program.instructions();
    let names: Vec<String> = instructions.iter().map(|i| i.name().to_string()).collect();

    let [withdraw, pay_fees, transfer] = instructions else {
        return Err(invalid(format!(
            "Expected 3 top-level instructions, got {}",
            instructions.len()
        )));
    };

    let withdraw_amount = match withdraw {
        XcmInstruction::WithdrawAsset(assets) => match assets.as_slice() {
            [asset] if asset.id.0 == Location::parent() => asset.amount(),
            _ => return Err(invalid("WithdrawAsset must hold one parent asset")),
        },
        other => return Err(out_of_order(0, "WithdrawAsset", other)),
    };

    let local_fee = match pay_fees {
        XcmInstruction::PayFees { asset } if asset.id.0 == Location::parent() => asset.amount(),
        XcmInstruction::PayFees { .. } => {
            return Err(invalid("PayFees must use the parent asset"))
        }
        other => return Err(out_of_order(1, "PayFees", other)),
    };

    let XcmInstruction::InitiateTransfer {
        destination,
        remote_fees,
        preserve_origin,
        assets,
        remote_xcm,
    } = transfer
    else {
        return Err(out_of_order(2, "InitiateTransfer", transfer));
    };

    let destination_para_id = match destination {
        Location {
            parents: 1,
            interior: Junctions::X1(Junction::Parachain(id)),
        } => *id,
        _ => return Err(invalid("Destination must be a sibling parachain")),
    };

    let remote_fee = match remote_fees {
        Some(AssetTransferFilter::Teleport(AssetFilter::Definite(fee_assets))) => {
            match fee_assets.as_slice() {
                [asset] if asset.id.0 == Location::parent() => asset.amount(),
                _ => return Err(invalid("Remote fees must hold one parent asset")),
            }
        }
        _ => return Err(invalid("Remote fees must be a definite teleport")),
    };

    if *preserve_origin {
        return Err(invalid("Teleport must not preserve origin"));
    }
    if !assets
        .iter()
        .all(|filter| matches!(filter, AssetTransferFilter::Teleport(_)))
        || assets.is_empty()
    {
        return Err(invalid("Transferred assets must all be teleported"));
    }

    let beneficiary_raw = match remote_xcm.as_slice() {
        [XcmInstruction::DepositAsset {
            beneficiary:
                Location {
                    parents: 0,
                    interior: Junctions::X1(Junction::AccountId32 { id, .. }),
                },
            ..
        }] => *id,
        _ => {
            return Err(invalid(
                "Remote program must be a single DepositAsset to an AccountId32",
            ))
        }
    };

    let reserve = local_fee
        .checked_add(remote_fee)
        .ok_or_else(|| invalid("Fee total overflows u128"))?;
    let amount = withdraw_amount
        .checked_sub(reserve)
        .ok_or_else(|| invalid("Withdrawn amount does not cover fees"))?;

    let beneficiary = AccountRef::from_raw(beneficiary_raw, format);

    Ok(ParsedTeleport {
        version: program.version(),
        instructions: names,
        destination_para_id,
        beneficiary: beneficiary.display().to_string(),
        beneficiary_hex: beneficiary.to_bytes32_hex(),
        withdraw_amount,
        local_fee,
        remote_fee,
        amount,
    })
}

fn invalid(msg: impl Into<String>) -> WasmXcmError {
    WasmXcmError::InvalidProgram(msg.into())
}

fn out_of_order(position: usize, expected: &str, found: &XcmInstruction) -> WasmXcmError {
    invalid(format!(
        "Instruction {} must be {}, found {}",
        position,
        expected,
        found.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressCodec;
    use crate::types::TeleportRequest;
    use crate::xcm::builder::{build_teleport, FeeSchedule, PAS_UNITS};
    use crate::xcm::types::{Asset, WildAsset};
    use parity_scale_codec::Encode;

    const GOLDEN_TELEPORT: &str = "0x050c00040100000700e40b54023001000002286bee31010100a10f0100000401000002286bee000400010204040d01020400010100acbf9f8faa01b5393e504ff45b22bdec9526807502ec994ad5e24a48f39b6b53";

    #[test]
    fn test_parse_golden_message() {
        let program = parse_program_hex(GOLDEN_TELEPORT).unwrap();
        let parsed = summarize_teleport(&program, AddressFormat::Substrate).unwrap();

        assert_eq!(parsed.version, 5);
        assert_eq!(
            parsed.instructions,
            ["WithdrawAsset", "PayFees", "InitiateTransfer"]
        );
        assert_eq!(parsed.destination_para_id, 1000);
        assert_eq!(parsed.withdraw_amount, PAS_UNITS);
        assert_eq!(parsed.local_fee, 1_000_000_000);
        assert_eq!(parsed.remote_fee, 1_000_000_000);
        assert_eq!(parsed.amount, 8_000_000_000);
        assert_eq!(
            parsed.beneficiary,
            "5FyD1xa3jfLFg65TpRK7fQiUMcajGJvY6M715jNDABtPsQt7"
        );
    }

    #[test]
    fn test_parse_built_program() {
        let beneficiary = AddressCodec::default()
            .decode("13mEPECpownFgBYbssfq23V8xjm2oarxieMVoKAKME4L8JXn")
            .unwrap();
        let req = TeleportRequest::new(1005, beneficiary.clone(), 1_000_000_000_000);
        let program = build_teleport(&req, &FeeSchedule::default()).unwrap();

        let parsed = parse_teleport(&program.encode(), AddressFormat::Polkadot).unwrap();
        assert_eq!(parsed.destination_para_id, 1005);
        assert_eq!(parsed.amount, 1_000_000_000_000);
        assert_eq!(parsed.beneficiary, beneficiary.display());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = hex::decode(&GOLDEN_TELEPORT[2..]).unwrap();
        bytes.push(0);
        assert!(matches!(
            parse_program(&bytes),
            Err(WasmXcmError::ScaleDecodeError(_))
        ));
    }

    #[test]
    fn test_rejects_top_level_deposit() {
        let program = XcmProgram::new(vec![
            XcmInstruction::WithdrawAsset(vec![Asset::parent_fungible(PAS_UNITS)]),
            XcmInstruction::DepositAsset {
                assets: AssetFilter::Wild(WildAsset::AllCounted(1)),
                beneficiary: Location::account_id32([1u8; 32]),
            },
            XcmInstruction::PayFees {
                asset: Asset::parent_fungible(1),
            },
        ]);
        assert!(matches!(
            summarize_teleport(&program, AddressFormat::Polkadot),
            Err(WasmXcmError::InvalidProgram(_))
        ));
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!(matches!(
            parse_program_hex("0xzz"),
            Err(WasmXcmError::InvalidInput(_))
        ));
    }
}
