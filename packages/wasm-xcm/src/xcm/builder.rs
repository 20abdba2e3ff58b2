//! Teleport message building
//!
//! Pure constructor: given a validated [`TeleportRequest`] and the fee
//! schedule, produce the XCM program. Submission is the chain client's job.

use serde::{Deserialize, Serialize};

use super::types::{
    Asset, AssetFilter, AssetTransferFilter, Location, WildAsset, XcmInstruction, XcmProgram,
};
use crate::error::WasmXcmError;
use crate::types::{deserialize_u128, serialize_u128, TeleportRequest};

/// 1 PAS = 10^10 planck on the Paseo relay
pub const PAS_UNITS: u128 = 10_000_000_000;
/// 1 PAS cent = 10^8 planck
pub const PAS_CENTS: u128 = 100_000_000;

/// Fixed fees reserved on top of every teleport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    /// Paid on the origin chain with `PayFees`
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub local_fee: u128,
    /// Teleported alongside the assets to pay execution on the destination
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub remote_fee: u128,
}

impl FeeSchedule {
    pub fn new(local_fee: u128, remote_fee: u128) -> Self {
        FeeSchedule {
            local_fee,
            remote_fee,
        }
    }

    /// Total withdrawn on top of the transferred amount
    pub fn reserve(&self) -> Result<u128, WasmXcmError> {
        self.local_fee
            .checked_add(self.remote_fee)
            .ok_or_else(|| WasmXcmError::InvalidInput("Fee reserve overflows u128".to_string()))
    }

    /// Fail with `AmountBelowFeeReserve` unless `amount` exceeds the reserve
    pub fn check_amount(&self, amount: u128) -> Result<u128, WasmXcmError> {
        let reserve = self.reserve()?;
        if amount <= reserve {
            return Err(WasmXcmError::AmountBelowFeeReserve { amount, reserve });
        }
        Ok(reserve)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            local_fee: 10 * PAS_CENTS,
            remote_fee: 10 * PAS_CENTS,
        }
    }
}

/// Build the teleport program for `req`
///
/// Emits `WithdrawAsset`, `PayFees` and `InitiateTransfer` in that order; the
/// beneficiary deposit is nested in the transfer's remote program.
pub fn build_teleport(
    req: &TeleportRequest,
    fees: &FeeSchedule,
) -> Result<XcmProgram, WasmXcmError> {
    if req.amount == 0 {
        return Err(WasmXcmError::InvalidInput(
            "Teleport amount must be greater than zero".to_string(),
        ));
    }
    let reserve = fees.check_amount(req.amount)?;
    let withdraw_amount = req.amount.checked_add(reserve).ok_or_else(|| {
        WasmXcmError::InvalidInput("Teleport amount plus fees overflows u128".to_string())
    })?;

    let remote_xcm = vec![XcmInstruction::DepositAsset {
        assets: AssetFilter::Wild(WildAsset::AllCounted(1)),
        beneficiary: Location::account_id32(*req.beneficiary.raw()),
    }];

    let instructions = vec![
        XcmInstruction::WithdrawAsset(vec![Asset::parent_fungible(withdraw_amount)]),
        XcmInstruction::PayFees {
            asset: Asset::parent_fungible(fees.local_fee),
        },
        XcmInstruction::InitiateTransfer {
            destination: Location::sibling(req.destination_para_id),
            remote_fees: Some(AssetTransferFilter::Teleport(AssetFilter::Definite(vec![
                Asset::parent_fungible(fees.remote_fee),
            ]))),
            preserve_origin: false,
            assets: vec![AssetTransferFilter::Teleport(AssetFilter::Wild(
                WildAsset::AllCounted(1),
            ))],
            remote_xcm,
        },
    ];

    tracing::debug!(
        para_id = req.destination_para_id,
        amount = %req.amount,
        withdraw = %withdraw_amount,
        "Built teleport program"
    );

    Ok(XcmProgram::new(instructions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountRef;
    use crate::types::AddressFormat;
    use parity_scale_codec::Encode;

    /// Message submitted to the XCM precompile on Polkadot Hub testnet:
    /// withdraw 1 PAS, pay 10 cents locally, teleport 10 cents of remote fees.
    const GOLDEN_TELEPORT: &str = "050c00040100000700e40b54023001000002286bee31010100a10f0100000401000002286bee000400010204040d01020400010100acbf9f8faa01b5393e504ff45b22bdec9526807502ec994ad5e24a48f39b6b53";

    fn golden_beneficiary() -> AccountRef {
        let raw: [u8; 32] =
            hex::decode("acbf9f8faa01b5393e504ff45b22bdec9526807502ec994ad5e24a48f39b6b53")
                .unwrap()
                .try_into()
                .unwrap();
        AccountRef::from_raw(raw, AddressFormat::Substrate)
    }

    #[test]
    fn test_matches_golden_message() {
        let req = TeleportRequest::new(1000, golden_beneficiary(), 8 * 100_000_000 * 10);
        let program = build_teleport(&req, &FeeSchedule::default()).unwrap();
        assert_eq!(hex::encode(program.encode()), GOLDEN_TELEPORT);
        assert_eq!(program.to_hex(), format!("0x{}", GOLDEN_TELEPORT));
    }

    #[test]
    fn test_instruction_order_and_nesting() {
        let req = TeleportRequest::new(1005, golden_beneficiary(), PAS_UNITS);
        let program = build_teleport(&req, &FeeSchedule::default()).unwrap();

        let names: Vec<_> = program.instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["WithdrawAsset", "PayFees", "InitiateTransfer"]);

        match &program.instructions()[2] {
            XcmInstruction::InitiateTransfer {
                destination,
                preserve_origin,
                remote_xcm,
                ..
            } => {
                assert_eq!(*destination, Location::sibling(1005));
                assert!(!preserve_origin);
                assert_eq!(remote_xcm.len(), 1);
                assert_eq!(remote_xcm[0].name(), "DepositAsset");
            }
            other => panic!("Expected InitiateTransfer, got {:?}", other),
        }
    }

    #[test]
    fn test_withdraw_includes_fee_buffer() {
        let fees = FeeSchedule::new(3, 4);
        let req = TeleportRequest::new(1000, golden_beneficiary(), 100);
        let program = build_teleport(&req, &fees).unwrap();

        match &program.instructions()[0] {
            XcmInstruction::WithdrawAsset(assets) => assert_eq!(assets[0].amount(), 107),
            other => panic!("Expected WithdrawAsset, got {:?}", other),
        }
        match &program.instructions()[1] {
            XcmInstruction::PayFees { asset } => assert_eq!(asset.amount(), 3),
            other => panic!("Expected PayFees, got {:?}", other),
        }
    }

    #[test]
    fn test_amount_below_fee_reserve() {
        let fees = FeeSchedule::default();
        let reserve = fees.reserve().unwrap();
        let req = TeleportRequest::new(1000, golden_beneficiary(), reserve);
        assert_eq!(
            build_teleport(&req, &fees),
            Err(WasmXcmError::AmountBelowFeeReserve {
                amount: reserve,
                reserve
            })
        );
    }

    #[test]
    fn test_deterministic() {
        let req = TeleportRequest::new(1000, golden_beneficiary(), PAS_UNITS);
        let a = build_teleport(&req, &FeeSchedule::default()).unwrap();
        let b = build_teleport(&req, &FeeSchedule::default()).unwrap();
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_overflow_rejected() {
        let req = TeleportRequest::new(1000, golden_beneficiary(), u128::MAX);
        assert!(matches!(
            build_teleport(&req, &FeeSchedule::default()),
            Err(WasmXcmError::InvalidInput(_))
        ));
    }
}
