use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use solana_pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// A Solana public key, written as base58 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Pubkey);

impl Address {
    /// Wraps an existing public key.
    #[must_use]
    pub const fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Builds an address from its raw 32 bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Pubkey::new_from_array(bytes))
    }

    /// The wrapped public key.
    #[must_use]
    pub const fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

impl From<Pubkey> for Address {
    fn from(value: Pubkey) -> Self {
        Self(value)
    }
}

impl From<Address> for Pubkey {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a string is not a Solana address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The string is empty.
    #[error("empty string")]
    Empty,
    /// The string is not valid base58.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),
    /// The decoded key is not 32 bytes long.
    #[error("decoded length is {0} bytes, expected 32")]
    InvalidLength(usize),
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AddressError::InvalidLength(b.len()))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

/// A caller-supplied address that failed validation, tagged with the
/// parameter it was passed as.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field}: {value:?} is not a valid Solana address ({reason})")]
pub struct InvalidAddress {
    /// Name of the offending parameter (`reference`, `recipient`, ...).
    pub field: &'static str,
    /// The rejected input, after trimming.
    pub value: String,
    /// What was wrong with it.
    pub reason: AddressError,
}

/// Anything that can be turned into an [`Address`].
///
/// Strings are trimmed before decoding. Already-typed keys pass through.
pub trait AddressInput {
    /// Converts `self`, reporting failures against `field`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAddress`] when the input is not a base58 encoded 32-byte key.
    fn into_address(self, field: &'static str) -> Result<Address, InvalidAddress>;
}

impl AddressInput for Address {
    fn into_address(self, _field: &'static str) -> Result<Address, InvalidAddress> {
        Ok(self)
    }
}

impl AddressInput for &Address {
    fn into_address(self, _field: &'static str) -> Result<Address, InvalidAddress> {
        Ok(*self)
    }
}

impl AddressInput for Pubkey {
    fn into_address(self, _field: &'static str) -> Result<Address, InvalidAddress> {
        Ok(Address(self))
    }
}

impl AddressInput for &str {
    fn into_address(self, field: &'static str) -> Result<Address, InvalidAddress> {
        let value = self.trim();
        Address::from_str(value).map_err(|reason| InvalidAddress {
            field,
            value: value.to_owned(),
            reason,
        })
    }
}

impl AddressInput for String {
    fn into_address(self, field: &'static str) -> Result<Address, InvalidAddress> {
        self.as_str().into_address(field)
    }
}

impl AddressInput for &String {
    fn into_address(self, field: &'static str) -> Result<Address, InvalidAddress> {
        self.as_str().into_address(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_base58() {
        let addr = Address::from_bytes([7; 32]);
        let text = addr.to_string();
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_system_program_is_all_zero() {
        let addr: Address = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(addr, Address::from_bytes([0; 32]));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!("".parse::<Address>(), Err(AddressError::Empty));
        assert!(matches!(
            "not-base58-0OIl".parse::<Address>(),
            Err(AddressError::InvalidBase58(_))
        ));
        assert!(matches!(
            "abc".parse::<Address>(),
            Err(AddressError::InvalidLength(3))
        ));
    }

    #[test]
    fn test_input_trims_and_names_field() {
        let addr = Address::from_bytes([9; 32]);
        let padded = format!("  {addr}\n");
        assert_eq!(padded.into_address("recipient").unwrap(), addr);

        let err = "   ".into_address("reference").unwrap_err();
        assert_eq!(err.field, "reference");
        assert_eq!(err.reason, AddressError::Empty);
        assert!(err.to_string().starts_with("Invalid reference"));
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::from_bytes([3; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address>("\"xyz\"").is_err());
    }
}
