#[macro_use]
extern crate serde;

mod address;
mod ballot;
mod error;
mod hash;
mod keystore;
mod registration;
mod serde_hex;
mod ticket;

pub use secp256k1::{PublicKey, SecretKey};

pub use address::*;
pub use ballot::*;
pub use error::*;
pub use hash::*;
pub use keystore::*;
pub use registration::*;
pub use serde_hex::*;
pub use ticket::*;

#[cfg(test)]
mod tests;
