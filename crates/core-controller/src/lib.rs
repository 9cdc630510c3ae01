//! The controller owns the most recent instances of one consensus stream,
//! starts instances height after height, routes messages to them and
//! persists and announces their decisions.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]

mod controller;
pub use controller::{Controller, Decided};

mod decided;

mod error;
pub use error::{DecidedError, Error, SideEffectError};

mod history;
pub use history::History;

mod params;
pub use params::{Params, DEFAULT_HISTORY_CAPACITY};
