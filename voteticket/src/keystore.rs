use crate::{Error, EthAddress, ToEthAddress};
use rand::rngs::OsRng;
use secp256k1::{PublicKey, SecretKey};
use std::collections::HashMap;

/// Storage key under which the session private scalar is persisted.
pub const SESSION_KEY_STORAGE_KEY: &str = "voting-session-key";

/// Minimal key-value capability over whatever session-scoped storage the
/// host provides (browser sessionStorage, a file, an in-memory map in
/// tests). The store owns the only writer of [`SESSION_KEY_STORAGE_KEY`].
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str);
}

/// In-memory storage, used in tests and anywhere no persistence is wanted.
#[derive(Default)]
pub struct MemorySessionStorage(HashMap<String, String>);

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }
}

/// The ephemeral secp256k1 keypair identifying a voter within one session.
///
/// Stable for the lifetime of the session, unlinkable across sessions.
#[derive(Clone)]
pub struct SessionKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl SessionKeyPair {
    fn from_secret(secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key(&secret);
        SessionKeyPair { secret, public }
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn address(&self) -> EthAddress {
        self.public.to_eth_address()
    }

    /// Uncompressed public key hex, the form submitted in a registration.
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public.serialize()[..])
    }
}

/// Owns the per-session keypair and its persistence.
///
/// The exclusive `&mut self` borrow on `current_key` is what serializes
/// first-access generation: two concurrent generations for one session
/// cannot be expressed.
pub struct SessionKeyStore<S: SessionStorage> {
    storage: S,
}

impl<S: SessionStorage> SessionKeyStore<S> {
    pub fn new(storage: S) -> Self {
        SessionKeyStore { storage }
    }

    /// Return the session keypair, generating and persisting it on first use.
    ///
    /// A present-but-corrupt stored scalar is an error, never a silent
    /// regeneration: regenerating would unlink a voter from a registration
    /// already made with the old key.
    pub fn current_key(&mut self) -> Result<SessionKeyPair, Error> {
        if let Some(stored) = self.storage.get(SESSION_KEY_STORAGE_KEY) {
            let mut scalar = [0u8; 32];
            hex::decode_to_slice(&stored, &mut scalar[..])
                .map_err(|_| Error::StoredKeyCorrupt)?;
            let secret = SecretKey::parse(&scalar).map_err(|_| Error::StoredKeyCorrupt)?;
            return Ok(SessionKeyPair::from_secret(secret));
        }

        let secret = SecretKey::random(&mut OsRng);
        self.storage
            .put(SESSION_KEY_STORAGE_KEY, &hex::encode(secret.serialize()));
        Ok(SessionKeyPair::from_secret(secret))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
