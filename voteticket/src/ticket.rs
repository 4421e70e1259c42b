use crate::{Error, EthAddress, EthHash, ToEthAddress};
use secp256k1::{PublicKey, RecoveryId, Signature};

/// Domain-separation tag for ticket digests. The tag is hashed and prefixed
/// to the digest pre-image, so a ticket signature can never be confused with
/// a signature issued for any other purpose.
pub const TICKET_DOMAIN_TAG: &str = "SgxVotingTicket(address,bytes,address)";

/// The digest a session manager signs when issuing a ticket.
///
/// Pre-image layout is fixed: `keccak256(tag) ‖ contract[20] ‖ votingId ‖ voter[20]`.
/// `contract` and `voter` arrive as hex text (optional `0x` prefix) and are
/// decoded to raw bytes first; the voting id is taken as UTF-8 verbatim.
pub fn ticket_digest(contract: &str, voting_id: &str, voter: &str) -> Result<EthHash, Error> {
    let contract = EthAddress::from_hex(contract)?;
    let voter = EthAddress::from_hex(voter)?;
    Ok(EthHash::tagged(TICKET_DOMAIN_TAG)
        .add(&contract)
        .add(voting_id)
        .add(&voter)
        .build())
}

/// An ECDSA signature bundled with its recovery id, enabling public-key
/// recovery instead of requiring the verifier to know the signer's key.
#[derive(Clone)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    pub(crate) fn new(signature: Signature, recovery_id: RecoveryId) -> Self {
        Self {
            signature,
            recovery_id,
        }
    }

    /// Parse the 65-byte wire form `r[32] ‖ s[32] ‖ v[1]`.
    ///
    /// `v` is accepted both raw (0..=3) and in the RPC convention (27..=30)
    /// used by wallets; anything else is a validation error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 65 {
            return Err(Error::SignatureBadLen(bytes.len()));
        }

        let signature = Signature::parse_standard_slice(&bytes[..64])?;
        let v = bytes[64];
        let raw = if v >= 27 { v.wrapping_sub(27) } else { v };
        let recovery_id =
            RecoveryId::parse(raw).map_err(|_| Error::SignatureBadRecoveryId(v))?;
        Ok(Self {
            signature,
            recovery_id,
        })
    }

    pub fn from_hex(mut hex_str: &str) -> Result<Self, Error> {
        if hex_str.starts_with("0x") {
            hex_str = &hex_str[2..];
        }
        let bytes = hex::decode(hex_str).map_err(|_| Error::BadHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&self.signature.serialize());
        bytes[64] = self.recovery_id.serialize();
        bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.to_bytes()[..])
    }

    /// Reconstruct the unique public key consistent with this signature over
    /// the given digest.
    pub fn recover_pub_key(&self, message_hash: &EthHash) -> Result<PublicKey, Error> {
        let public =
            secp256k1::recover(&message_hash.to_message(), &self.signature, &self.recovery_id)?;
        Ok(public)
    }
}

/// Outcome of checking a ticket against the expected session manager.
///
/// A well-formed signature always yields a recovered key and address;
/// `is_valid` tells whether that address is the manager the caller expected.
pub struct TicketValidation {
    pub manager_public_key: PublicKey,
    pub resolved_address: EthAddress,
    pub is_valid: bool,
}

/// Verify a ticket: recover the signer from `signature` over `digest` and
/// compare the derived address with `expected`.
///
/// Malformed input surfaces as `Err`; a signer other than `expected` is a
/// successful validation with `is_valid == false`. No side effects.
pub fn validate_ticket(
    digest: &EthHash,
    signature: &RecoverableSignature,
    expected: &EthAddress,
) -> Result<TicketValidation, Error> {
    let manager_public_key = signature.recover_pub_key(digest)?;
    let resolved_address = manager_public_key.to_eth_address();
    Ok(TicketValidation {
        manager_public_key,
        resolved_address,
        is_valid: resolved_address == *expected,
    })
}
