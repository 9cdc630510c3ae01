//! Core types and interfaces for a QBFT-style, single-decree BFT consensus engine.
//!
//! The crate is `no_std` and only relies on `alloc`.

#![no_std]
#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

extern crate alloc;

mod committee;
mod context;
mod hash;
mod height;
mod identifier;
mod interfaces;
mod message;
mod operator;
mod round;
mod signed_message;
mod signing;
mod threshold;
mod value;

pub mod limits;
pub mod merkle;

pub use committee::{Committee, Member};
pub use context::{Context, ValueError};
pub use hash::Hash;
pub use height::Height;
pub use identifier::Identifier;
pub use interfaces::{Network, NetworkError, RoundTimer, Storage, StorageError};
pub use message::{Body, Message, MessageType, Prepared, UnknownMessageType};
pub use operator::OperatorId;
pub use round::Round;
pub use signed_message::{AggregateSignature, SignedMessage};
pub use signing::{Domain, PrivateKey, PublicKey, Signature, SigningScheme};
pub use threshold::Thresholds;
pub use value::{Value, ValueRoot};
