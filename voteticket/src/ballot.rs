use crate::Error;
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, NewAead},
    Aes256Gcm,
};
use num_enum::TryFromPrimitive;
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, SecretKey, SharedSecret};
use sha2::Sha256;
use std::convert::TryInto;

/// The three admissible ballot decisions. Anything else never enters the
/// cipher: construction goes through `TryFromPrimitive` and fails loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum Decision {
    Abstain = 0,
    Yea = 1,
    No = 2,
}

impl Decision {
    pub fn from_u32(value: u32) -> Result<Self, Error> {
        let byte: u8 = value.try_into().map_err(|_| Error::InvalidDecision(value))?;
        Decision::try_from_primitive(byte).map_err(|_| Error::InvalidDecision(value))
    }
}

/// IV length of a vote envelope; the envelope wire form is
/// `iv[12] ‖ ciphertext ‖ tag[16]`.
pub const ENVELOPE_IV_LEN: usize = 12;

/// Symmetric ballot key derived between voter and manager.
pub type BallotKey = [u8; 32];

/// ECDH between the session secret and the manager's recovered public key,
/// then SHA-256 over the 33-byte compressed encoding of the shared point.
/// No salt or info is mixed in; the shared point is already unique per
/// (session key, manager key) pair. Symmetric: either side derives the same
/// key from its own secret and the other's public key.
pub fn derive_shared_secret(
    session_secret: &SecretKey,
    manager_key: &PublicKey,
) -> Result<BallotKey, Error> {
    let shared = SharedSecret::<Sha256>::new(manager_key, session_secret)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(shared.as_ref());
    Ok(key)
}

/// Encrypt one ballot decision under a derived ballot key.
///
/// The decision is padded to 4 bytes little-endian before sealing; a fresh
/// random IV is drawn on every call and travels in the clear at the head of
/// the envelope.
pub fn encrypt_vote(decision: Decision, key: &BallotKey) -> Result<Vec<u8>, Error> {
    let mut iv = [0u8; ENVELOPE_IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_vote_with_iv(decision, key, &iv)
}

pub(crate) fn encrypt_vote_with_iv(
    decision: Decision,
    key: &BallotKey,
    iv: &[u8; ENVELOPE_IV_LEN],
) -> Result<Vec<u8>, Error> {
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
    let plaintext = (decision as u32).to_le_bytes();

    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(iv), plaintext.as_ref())
        .map_err(|_| Error::EncryptionFailed)?;

    let mut envelope = Vec::with_capacity(ENVELOPE_IV_LEN + ciphertext.len());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open a vote envelope, returning the 4-byte padded plaintext.
///
/// Tag verification failure is reported as `AuthenticationFailed`, distinct
/// from malformed input, so tampering and wrong-key use are detectable.
pub fn decrypt_vote(envelope: &[u8], key: &BallotKey) -> Result<Vec<u8>, Error> {
    if envelope.len() <= ENVELOPE_IV_LEN {
        return Err(Error::EnvelopeTooShort);
    }
    let (iv, ciphertext) = envelope.split_at(ENVELOPE_IV_LEN);

    let cipher = Aes256Gcm::new(GenericArray::from_slice(key));
    cipher
        .decrypt(GenericArray::from_slice(iv), ciphertext)
        .map_err(|_| Error::AuthenticationFailed)
}

/// Decode a decrypted 4-byte plaintext back into a decision.
pub fn decode_decision(plaintext: &[u8]) -> Result<Decision, Error> {
    let bytes: [u8; 4] = plaintext.try_into().map_err(|_| Error::BallotBadLen)?;
    Decision::from_u32(u32::from_le_bytes(bytes))
}
