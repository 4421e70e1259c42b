use thiserror::Error;

/// Error types
///
/// Address mismatches discovered during ticket validation are *not* errors:
/// they are reported through [`TicketValidation::is_valid`](crate::TicketValidation)
/// so callers can tell "bad data" from "wrong signer".
#[derive(Debug, Error)]
pub enum Error {
    #[error("voteticket: invalid hexadecimal input")]
    BadHex,

    #[error("voteticket: invalid address - wrong length")]
    AddressBadLen,

    #[error("voteticket: invalid signature - expected 65 bytes, got {0}")]
    SignatureBadLen(usize),

    #[error("voteticket: invalid signature - recovery id {0} out of range")]
    SignatureBadRecoveryId(u8),

    #[error("voteticket: secp256k1 error: {0:?}")]
    Secp256k1(secp256k1::Error),

    #[error("voteticket: invalid ballot decision: {0}")]
    InvalidDecision(u32),

    #[error("voteticket: vote envelope too short to contain an IV")]
    EnvelopeTooShort,

    #[error("voteticket: decrypted ballot has wrong length")]
    BallotBadLen,

    #[error("voteticket: ballot authentication failed")]
    AuthenticationFailed,

    #[error("voteticket: ballot encryption failed")]
    EncryptionFailed,

    #[error("voteticket: stored session key is corrupt")]
    StoredKeyCorrupt,

    #[error("voteticket: wallet signer error: {0}")]
    Signer(String),
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Error::Secp256k1(e)
    }
}
