//! Round-indexed store of signed consensus messages.
//!
//! The container answers the queries the protocol needs (deduplication,
//! quorum detection) without enforcing any protocol rule itself.

#![no_std]
#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

extern crate alloc;

mod container;
pub use container::{MsgContainer, UniqueSigners};
