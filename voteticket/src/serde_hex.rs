use crate::{EthAddress, RecoverableSignature};
use secp256k1::PublicKey;
use std::borrow::Cow;
use std::convert::TryInto;

pub use hex_buffer_serde::Hex;

// a single-purpose type for use in `#[serde(with)]`
pub enum EthAddressHex {}

impl Hex<EthAddress> for EthAddressHex {
    type Error = String;

    fn create_bytes(address: &EthAddress) -> Cow<[u8]> {
        address.to_array().to_vec().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<EthAddress, String> {
        let inner: [u8; 20] = bytes
            .try_into()
            .map_err(|_| "address must be 20 bytes".to_string())?;
        Ok(EthAddress::new(inner))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum RecoverableSignatureHex {}

impl Hex<RecoverableSignature> for RecoverableSignatureHex {
    type Error = String;

    fn create_bytes(sig: &RecoverableSignature) -> Cow<[u8]> {
        sig.to_bytes().to_vec().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<RecoverableSignature, String> {
        RecoverableSignature::from_bytes(bytes).map_err(|e| format!("{}", e))
    }
}

// a single-purpose type for use in `#[serde(with)]`
pub enum SecpPublicKeyHex {}

impl Hex<PublicKey> for SecpPublicKeyHex {
    type Error = String;

    fn create_bytes(public_key: &PublicKey) -> Cow<[u8]> {
        public_key.serialize().to_vec().into()
    }

    fn from_bytes(bytes: &[u8]) -> Result<PublicKey, String> {
        PublicKey::parse_slice(bytes, None).map_err(|e| format!("{:?}", e))
    }
}
