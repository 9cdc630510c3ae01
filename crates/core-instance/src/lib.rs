//! Per-height QBFT instance: state, message validation and the
//! propose / prepare / commit / round-change transitions.

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

mod error;
pub use error::Error;

mod params;
pub use params::{Params, DEFAULT_ROUND_CUTOFF};

mod state;
pub use state::State;

mod instance;
pub use instance::{Decision, Environment, Instance};

mod handle;

pub mod validation;
