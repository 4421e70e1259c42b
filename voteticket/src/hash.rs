use crate::RecoverableSignature;
use secp256k1::{Message, SecretKey};
use tiny_keccak::{Hasher, Keccak};

/// A keccak-256 digest that signatures are made over.
pub struct EthHash([u8; 32]);

impl EthHash {
    /// Hash a message the way `personal_sign` does: the message is framed
    /// with the `"\x19Ethereum Signed Message:\n"` prefix and its decimal
    /// byte length before hashing, so a wallet signature over plain text
    /// can never be replayed as a signature over a transaction.
    pub fn personal_message(message: impl AsRef<[u8]>) -> EthHash {
        let message = message.as_ref();
        let msg_size = message.len().to_string();
        let prefix = b"\x19Ethereum Signed Message:\n";
        keccak_hash_parts(&[prefix.as_ref(), msg_size.as_ref(), message])
    }

    /// Start a domain-separated digest: the tag string is hashed first and
    /// its digest becomes the leading bytes of the final pre-image.
    pub fn tagged(tag: &str) -> EthHashBuilder {
        let tag_hash = keccak_hash_parts(&[tag.as_bytes()]);
        let mut hasher = Keccak::v256();
        hasher.update(tag_hash.as_ref());
        EthHashBuilder(hasher)
    }

    pub fn sign_by(&self, secret: &SecretKey) -> RecoverableSignature {
        let message = Message::parse(&self.0);
        let (signature, recovery_id) = secp256k1::sign(&message, secret);
        RecoverableSignature::new(signature, recovery_id)
    }

    pub(crate) fn to_message(&self) -> Message {
        Message::parse(&self.0)
    }
}

impl AsRef<[u8]> for EthHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Incremental digest over ordered byte fields. Field order is part of the
/// contract: reordering two fields yields a different digest.
pub struct EthHashBuilder(Keccak);

impl EthHashBuilder {
    pub fn add(mut self, content: impl AsRef<[u8]>) -> Self {
        self.0.update(content.as_ref());
        self
    }

    pub fn build(self) -> EthHash {
        let mut bytes = [0u8; 32];
        self.0.finalize(&mut bytes[..]);
        EthHash(bytes)
    }
}

pub(crate) fn keccak_parts(chunks: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for chunk in chunks {
        hasher.update(chunk);
    }
    let mut bytes = [0u8; 32];
    hasher.finalize(&mut bytes[..]);
    bytes
}

fn keccak_hash_parts(chunks: &[&[u8]]) -> EthHash {
    EthHash(keccak_parts(chunks))
}
