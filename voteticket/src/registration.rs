use crate::*;
use secp256k1::{PublicKey, SecretKey};

/// The human-readable message a voter signs with their wallet to register a
/// session key for a voting session. Signed verbatim through the wallet's
/// `personal_sign`; the manager recovers the voter's account from the
/// signature over this exact text.
pub fn registration_message(
    contract: &EthAddress,
    voting_id: &str,
    manager: &EthAddress,
    session_address: &EthAddress,
) -> String {
    format!(
        "\nSgxRegister\nContract: {contract:x} {voting_id}\nAddress: {manager:x}\nSession: {session:x}",
        contract = contract,
        voting_id = voting_id,
        manager = manager,
        session = session_address,
    )
}

/// The bundle submitted to the session manager to register a voter.
/// Serializes to the manager's wire shape: camelCase keys, bare hex values.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// The voter's real account address.
    #[serde(with = "EthAddressHex")]
    pub sender: EthAddress,

    /// Wallet signature over [`registration_message`].
    #[serde(with = "RecoverableSignatureHex")]
    pub sign: RecoverableSignature,

    /// The session public key being authorized, uncompressed.
    #[serde(with = "SecpPublicKeyHex")]
    pub session_key: PublicKey,
}

/// External wallet capability: signs an ASCII message on behalf of an
/// account, returning a recoverable signature. The browser wallet
/// implements this out-of-process; [`LocalWallet`] implements it in-process
/// for headless clients and tests.
pub trait WalletSigner {
    fn sign_message(
        &self,
        message: &str,
        account: &EthAddress,
    ) -> Result<RecoverableSignature, Error>;
}

/// In-process wallet holding a single account key, signing with the
/// personal-message framing an external wallet would use.
pub struct LocalWallet {
    secret: SecretKey,
}

impl LocalWallet {
    pub fn new(secret: SecretKey) -> Self {
        LocalWallet { secret }
    }

    pub fn address(&self) -> EthAddress {
        self.secret.to_eth_address()
    }
}

impl WalletSigner for LocalWallet {
    fn sign_message(
        &self,
        message: &str,
        account: &EthAddress,
    ) -> Result<RecoverableSignature, Error> {
        if *account != self.address() {
            return Err(Error::Signer(format!("unknown account {:?}", account)));
        }
        Ok(EthHash::personal_message(message).sign_by(&self.secret))
    }
}

/// Build and sign a registration request binding `session` to the voting
/// session identified by `(contract, voting_id, manager)`.
///
/// The returned bundle is handed to the backend as-is; this crate does not
/// interpret the ticket the backend answers with beyond `validate_ticket`.
pub fn build_registration<W: WalletSigner>(
    wallet: &W,
    context: &AccountContext,
    contract: &EthAddress,
    voting_id: &str,
    manager: &EthAddress,
    session: &SessionKeyPair,
) -> Result<RegistrationRequest, Error> {
    let sender = context
        .account()
        .ok_or_else(|| Error::Signer("no account selected".to_string()))?;
    let message = registration_message(contract, voting_id, manager, &session.address());
    let sign = wallet.sign_message(&message, &sender)?;
    Ok(RegistrationRequest {
        sender,
        sign,
        session_key: *session.public(),
    })
}

/// Notification interface for wallet account switches.
pub trait AccountWatcher {
    fn account_changed(&mut self, account: &EthAddress);
}

/// The currently selected wallet account, passed explicitly to the
/// operations that need it. Watchers are notified on every change so
/// callers can drop state tied to the previous account.
#[derive(Default)]
pub struct AccountContext {
    account: Option<EthAddress>,
    watchers: Vec<Box<dyn AccountWatcher>>,
}

impl AccountContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: EthAddress) -> Self {
        AccountContext {
            account: Some(account),
            watchers: Vec::new(),
        }
    }

    pub fn account(&self) -> Option<EthAddress> {
        self.account
    }

    pub fn set_account(&mut self, account: EthAddress) {
        self.account = Some(account);
        for watcher in self.watchers.iter_mut() {
            watcher.account_changed(&account);
        }
    }

    pub fn watch(&mut self, watcher: Box<dyn AccountWatcher>) {
        self.watchers.push(watcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySessionStorage, SessionKeyStore};
    use rand::rngs::OsRng;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn message_template_is_exact() {
        let contract = EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        let manager = EthAddress::from_hex("a7dab260472557b5eef526589a4f37a0f5f81569").unwrap();
        let session = EthAddress::from_hex("00112233445566778899aabbccddeeff00112233").unwrap();
        let message = registration_message(&contract, "v1", &manager, &session);
        assert_eq!(
            message,
            "\nSgxRegister\nContract: aea5db67524e02a263b9339fe6667d6b577f3d4c v1\nAddress: a7dab260472557b5eef526589a4f37a0f5f81569\nSession: 00112233445566778899aabbccddeeff00112233"
        );
    }

    #[test]
    fn registration_signature_recovers_to_wallet_account() {
        let wallet = LocalWallet::new(SecretKey::random(&mut OsRng));
        let context = AccountContext::with_account(wallet.address());
        let mut store = SessionKeyStore::new(MemorySessionStorage::new());
        let session = store.current_key().unwrap();

        let contract = EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        let manager = EthAddress::from_hex("a7dab260472557b5eef526589a4f37a0f5f81569").unwrap();

        let request =
            build_registration(&wallet, &context, &contract, "v1", &manager, &session).unwrap();
        assert_eq!(request.sender, wallet.address());

        // The manager's view: recover the signer from the rebuilt message.
        let message = registration_message(&contract, "v1", &manager, &session.address());
        let recovered = request
            .sign
            .recover_pub_key(&EthHash::personal_message(&message))
            .unwrap();
        assert_eq!(recovered.to_eth_address(), wallet.address());
        assert_eq!(request.session_key, *session.public());
    }

    #[test]
    fn wallet_rejects_unknown_account() {
        let wallet = LocalWallet::new(SecretKey::random(&mut OsRng));
        let other = SecretKey::random(&mut OsRng).to_eth_address();
        assert!(matches!(
            wallet.sign_message("whatever", &other),
            Err(Error::Signer(_))
        ));
    }

    #[test]
    fn no_account_selected_is_an_error() {
        let wallet = LocalWallet::new(SecretKey::random(&mut OsRng));
        let context = AccountContext::new();
        let mut store = SessionKeyStore::new(MemorySessionStorage::new());
        let session = store.current_key().unwrap();
        let contract = EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        let manager = EthAddress::from_hex("a7dab260472557b5eef526589a4f37a0f5f81569").unwrap();
        assert!(matches!(
            build_registration(&wallet, &context, &contract, "v1", &manager, &session),
            Err(Error::Signer(_))
        ));
    }

    #[test]
    fn request_serializes_to_manager_wire_shape() {
        let wallet = LocalWallet::new(SecretKey::random(&mut OsRng));
        let context = AccountContext::with_account(wallet.address());
        let mut store = SessionKeyStore::new(MemorySessionStorage::new());
        let session = store.current_key().unwrap();
        let contract = EthAddress::from_hex("aea5db67524e02a263b9339fe6667d6b577f3d4c").unwrap();
        let manager = EthAddress::from_hex("a7dab260472557b5eef526589a4f37a0f5f81569").unwrap();

        let request =
            build_registration(&wallet, &context, &contract, "v1", &manager, &session).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(
            json["sender"].as_str().unwrap(),
            wallet.address().to_hex_string()
        );
        assert_eq!(json["sign"].as_str().unwrap().len(), 130);
        assert_eq!(
            json["sessionKey"].as_str().unwrap(),
            session.public_key_hex()
        );
    }

    struct Probe(Rc<Cell<u32>>);

    impl AccountWatcher for Probe {
        fn account_changed(&mut self, _account: &EthAddress) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn watchers_see_account_switches() {
        let count = Rc::new(Cell::new(0));
        let mut context = AccountContext::new();
        context.watch(Box::new(Probe(count.clone())));

        let first = SecretKey::random(&mut OsRng).to_eth_address();
        let second = SecretKey::random(&mut OsRng).to_eth_address();
        context.set_account(first);
        context.set_account(second);

        assert_eq!(count.get(), 2);
        assert_eq!(context.account(), Some(second));
    }
}
