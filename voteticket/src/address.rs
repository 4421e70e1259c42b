use crate::hash::keccak_parts;
use crate::Error;
use secp256k1::{PublicKey, SecretKey};
use std::fmt;

/// A 20-byte account-style address derived from a secp256k1 public key.
///
/// Two public keys are never compared directly anywhere in this crate;
/// identity checks always go through their derived addresses.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    pub fn new(inner: [u8; 20]) -> Self {
        EthAddress(inner)
    }

    /// Decode from hex text, with or without a leading `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, Error> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let mut inner = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut inner[..]).map_err(|e| match e {
            hex::FromHexError::InvalidStringLength | hex::FromHexError::OddLength => {
                Error::AddressBadLen
            }
            hex::FromHexError::InvalidHexCharacter { .. } => Error::BadHex,
        })?;
        Ok(EthAddress(inner))
    }

    /// Bare lowercase hex, no `0x` prefix (the wire form used throughout).
    pub fn to_hex_string(&self) -> String {
        format!("{:x}", self)
    }

    pub fn to_array(&self) -> [u8; 20] {
        self.0
    }
}

impl AsRef<[u8]> for EthAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..]))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self)
    }
}

/// Derivation of the account address for a key.
pub trait ToEthAddress {
    fn to_eth_address(&self) -> EthAddress;
}

impl ToEthAddress for PublicKey {
    fn to_eth_address(&self) -> EthAddress {
        let bytes = self.serialize();
        // Uncompressed encoding carries a 0x04 format byte; the address is
        // the last 20 bytes of keccak256 over the raw 64 key bytes.
        let hash = keccak_parts(&[&bytes[1..]]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        EthAddress(address)
    }
}

impl ToEthAddress for SecretKey {
    fn to_eth_address(&self) -> EthAddress {
        PublicKey::from_secret_key(self).to_eth_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn address_is_deterministic() {
        let secret = SecretKey::random(&mut OsRng);
        let public = PublicKey::from_secret_key(&secret);
        assert_eq!(public.to_eth_address(), public.to_eth_address());
        assert_eq!(secret.to_eth_address(), public.to_eth_address());
    }

    #[test]
    fn distinct_keys_distinct_addresses() {
        let a = SecretKey::random(&mut OsRng).to_eth_address();
        let b = SecretKey::random(&mut OsRng).to_eth_address();
        assert_ne!(a, b);
    }

    #[test]
    fn hex_round_trip() {
        let addr = EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        assert_eq!(
            addr.to_hex_string(),
            "aea5db67524e02a263b9339fe6667d6b577f3d4c"
        );
        let prefixed = EthAddress::from_hex("0xaea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        assert_eq!(addr, prefixed);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            EthAddress::from_hex("zzz5db67524e02a263b9339fe6667d6b577f3d4c"),
            Err(Error::BadHex)
        ));
        assert!(matches!(
            EthAddress::from_hex("aea5db67"),
            Err(Error::AddressBadLen)
        ));
        // Odd number of digits, as produced by sloppy manual truncation.
        assert!(matches!(
            EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4"),
            Err(Error::AddressBadLen)
        ));
    }
}
