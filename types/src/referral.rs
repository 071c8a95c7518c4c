//! Referral records and address kinds.

use serde::{Deserialize, Serialize};

use crate::{Address, CodeHash, TypeError};

/// Kind of address a referral or ANV record belongs to.
///
/// Persisted as a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum AddressType {
    /// No type recorded yet (an ancestor whose ANV was only ever credited
    /// through its descendants).
    #[default]
    Unset = 0,
    /// Key-hash wallet address.
    Wallet = 1,
    /// Script-hash address.
    Script = 2,
    /// Script address carrying parameters.
    ParameterizedScript = 3,
}

impl AddressType {
    /// Whether addresses of this kind take part in reward distribution.
    pub fn is_rewardable(self) -> bool {
        matches!(self, AddressType::Wallet | AddressType::Script)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AddressType {
    type Error = TypeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(AddressType::Unset),
            1 => Ok(AddressType::Wallet),
            2 => Ok(AddressType::Script),
            3 => Ok(AddressType::ParameterizedScript),
            other => Err(TypeError::UnknownAddressType(other)),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(t: AddressType) -> Self {
        t.as_byte()
    }
}

/// A referral links a new address to the referral code of its inviter.
///
/// Immutable once inserted; only explicit removal takes it out of the store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Referral {
    /// Unique code identifying this referral.
    pub code_hash: CodeHash,
    /// The address being referred.
    pub pub_key_id: Address,
    /// Code hash of the inviter's own referral.
    pub previous_referral: CodeHash,
    pub address_type: AddressType,
}

impl Referral {
    pub fn new(
        code_hash: CodeHash,
        pub_key_id: Address,
        previous_referral: CodeHash,
        address_type: AddressType,
    ) -> Self {
        Self {
            code_hash,
            pub_key_id,
            previous_referral,
            address_type,
        }
    }
}
