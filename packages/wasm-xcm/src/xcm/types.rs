//! XCM v5 types with their SCALE wire layout
//!
//! Only the subset needed to express a teleport is modelled. Variant indices
//! follow the `staging-xcm` v5 definitions so the encoded bytes are accepted
//! by the destination chain as-is.

use parity_scale_codec::{Decode, Encode, Error as CodecError, Input, Output};

/// Version tag of [`XcmProgram`] on the wire (`VersionedXcm::V5`)
pub const XCM_VERSION: u8 = 5;

/// Nesting limit when decoding untrusted programs
pub const MAX_XCM_DECODE_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum NetworkId {
    #[codec(index = 0)]
    ByGenesis([u8; 32]),
    #[codec(index = 2)]
    Polkadot,
    #[codec(index = 3)]
    Kusama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Junction {
    #[codec(index = 0)]
    Parachain(#[codec(compact)] u32),
    #[codec(index = 1)]
    AccountId32 {
        network: Option<NetworkId>,
        id: [u8; 32],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Junctions {
    #[codec(index = 0)]
    Here,
    #[codec(index = 1)]
    X1(Junction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Location {
    pub parents: u8,
    pub interior: Junctions,
}

impl Location {
    /// The relay chain's native asset as seen from a parachain: `(1, Here)`
    pub fn parent() -> Self {
        Location {
            parents: 1,
            interior: Junctions::Here,
        }
    }

    /// Sibling parachain: `(1, X1(Parachain(id)))`
    pub fn sibling(para_id: u32) -> Self {
        Location {
            parents: 1,
            interior: Junctions::X1(Junction::Parachain(para_id)),
        }
    }

    /// Local account on the executing chain: `(0, X1(AccountId32))`
    pub fn account_id32(id: [u8; 32]) -> Self {
        Location {
            parents: 0,
            interior: Junctions::X1(Junction::AccountId32 { network: None, id }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct AssetId(pub Location);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Fungibility {
    #[codec(index = 0)]
    Fungible(#[codec(compact)] u128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Asset {
    pub id: AssetId,
    pub fun: Fungibility,
}

impl Asset {
    /// Fungible amount of the parent (relay native) asset
    pub fn parent_fungible(amount: u128) -> Self {
        Asset {
            id: AssetId(Location::parent()),
            fun: Fungibility::Fungible(amount),
        }
    }

    pub fn amount(&self) -> u128 {
        match self.fun {
            Fungibility::Fungible(amount) => amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum WildAsset {
    #[codec(index = 0)]
    All,
    #[codec(index = 2)]
    AllCounted(#[codec(compact)] u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum AssetFilter {
    #[codec(index = 0)]
    Definite(Vec<Asset>),
    #[codec(index = 1)]
    Wild(WildAsset),
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum AssetTransferFilter {
    #[codec(index = 0)]
    Teleport(AssetFilter),
    #[codec(index = 1)]
    ReserveDeposit(AssetFilter),
    #[codec(index = 2)]
    ReserveWithdraw(AssetFilter),
}

/// One XCM instruction
///
/// `DepositAsset` is only valid inside `InitiateTransfer::remote_xcm` for the
/// programs this crate builds.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum XcmInstruction {
    #[codec(index = 0)]
    WithdrawAsset(Vec<Asset>),
    #[codec(index = 13)]
    DepositAsset {
        assets: AssetFilter,
        beneficiary: Location,
    },
    #[codec(index = 48)]
    PayFees { asset: Asset },
    #[codec(index = 49)]
    InitiateTransfer {
        destination: Location,
        remote_fees: Option<AssetTransferFilter>,
        preserve_origin: bool,
        assets: Vec<AssetTransferFilter>,
        remote_xcm: Vec<XcmInstruction>,
    },
}

impl XcmInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            XcmInstruction::WithdrawAsset(_) => "WithdrawAsset",
            XcmInstruction::DepositAsset { .. } => "DepositAsset",
            XcmInstruction::PayFees { .. } => "PayFees",
            XcmInstruction::InitiateTransfer { .. } => "InitiateTransfer",
        }
    }
}

/// A version-tagged, ordered XCM program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcmProgram {
    instructions: Vec<XcmInstruction>,
}

impl XcmProgram {
    pub fn new(instructions: Vec<XcmInstruction>) -> Self {
        XcmProgram { instructions }
    }

    pub fn version(&self) -> u8 {
        XCM_VERSION
    }

    pub fn instructions(&self) -> &[XcmInstruction] {
        &self.instructions
    }

    /// SCALE bytes as hex with `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }
}

impl Encode for XcmProgram {
    fn size_hint(&self) -> usize {
        1 + self.instructions.size_hint()
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.push_byte(XCM_VERSION);
        self.instructions.encode_to(dest);
    }
}

impl Decode for XcmProgram {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let version = input.read_byte()?;
        if version != XCM_VERSION {
            return Err("Unsupported XCM version".into());
        }
        let instructions = Vec::<XcmInstruction>::decode(input)?;
        Ok(XcmProgram { instructions })
    }
}
