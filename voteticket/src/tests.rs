use super::*;
use rand::rngs::OsRng;
use secp256k1::{PublicKey, SecretKey};

const CONTRACT: &str = "aea5db67524e02a263b9339fe6667d6b577f3d4c";
const VOTING_ID: &str = "v1";

#[test]
fn end_to_end_registration_and_vote() {
    // The session manager service, played locally: a fresh keypair whose
    // address is the only thing the voter is told up front.
    let manager_secret = SecretKey::random(&mut OsRng);
    let manager_public = PublicKey::from_secret_key(&manager_secret);
    let manager_address = manager_secret.to_eth_address();

    // The voter's wallet and selected account.
    let wallet = LocalWallet::new(SecretKey::random(&mut OsRng));
    let context = AccountContext::with_account(wallet.address());

    // Per-browser-session key, generated on first use and persisted.
    let mut key_store = SessionKeyStore::new(MemorySessionStorage::new());
    let session = key_store.current_key().unwrap();

    // Build the signed registration request.
    let request = build_registration(
        &wallet,
        &context,
        &EthAddress::from_hex(CONTRACT).unwrap(),
        VOTING_ID,
        &manager_address,
        &session,
    )
    .unwrap();

    // Manager side: recover the voter's account from the registration
    // signature before accepting the session key.
    let message = registration_message(
        &EthAddress::from_hex(CONTRACT).unwrap(),
        VOTING_ID,
        &manager_address,
        &session.address(),
    );
    let signer = request
        .sign
        .recover_pub_key(&EthHash::personal_message(&message))
        .unwrap();
    assert_eq!(signer.to_eth_address(), request.sender);

    // Manager issues the ticket: its signature over the ticket digest.
    let digest = ticket_digest(CONTRACT, VOTING_ID, &request.sender.to_hex_string()).unwrap();
    let ticket = digest.sign_by(&manager_secret);

    // Voter side: validate the ticket and recover the manager's key from it.
    let validation = validate_ticket(&digest, &ticket, &manager_address).unwrap();
    assert!(validation.is_valid);

    // Encrypt the ballot under the ECDH key between session key and the
    // recovered manager key.
    let voter_key =
        derive_shared_secret(session.secret(), &validation.manager_public_key).unwrap();
    let envelope = encrypt_vote(Decision::Yea, &voter_key).unwrap();

    // The voter can re-open its own envelope for confirmation.
    let confirmed = decrypt_vote(&envelope, &voter_key).unwrap();
    assert_eq!(decode_decision(&confirmed).unwrap(), Decision::Yea);

    // Manager side: same key from the other direction, then decrypt.
    let manager_key = derive_shared_secret(&manager_secret, session.public()).unwrap();
    assert_eq!(voter_key, manager_key);
    let tallied = decrypt_vote(&envelope, &manager_key).unwrap();
    assert_eq!(decode_decision(&tallied).unwrap(), Decision::Yea);

    // A tampered envelope is rejected outright, distinguishable from a
    // mere decision mismatch.
    let mut tampered = envelope.clone();
    tampered[ENVELOPE_IV_LEN + 1] ^= 0xff;
    assert!(matches!(
        decrypt_vote(&tampered, &manager_key),
        Err(Error::AuthenticationFailed)
    ));

    // A ticket from an impostor manager fails validation without erroring.
    let impostor = SecretKey::random(&mut OsRng);
    let forged = digest.sign_by(&impostor);
    let validation = validate_ticket(&digest, &forged, &manager_address).unwrap();
    assert!(!validation.is_valid);

    // And a third party without either secret derives the wrong key.
    let outsider = SecretKey::random(&mut OsRng);
    let outsider_key = derive_shared_secret(&outsider, &manager_public).unwrap();
    assert!(matches!(
        decrypt_vote(&envelope, &outsider_key),
        Err(Error::AuthenticationFailed)
    ));
}
