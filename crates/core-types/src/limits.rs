//! Size bounds of the canonical encoding.
//!
//! These bounds are part of the digest layout and therefore of the
//! signature-verification contract.

/// Maximum number of signed messages in a justification list.
pub const MAX_JUSTIFICATIONS: usize = 13;

/// Maximum number of signers on a single signed message.
pub const MAX_SIGNERS: usize = 13;

/// Maximum length of a protocol identifier, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 56;

/// Maximum length of a value payload, in bytes.
pub const MAX_VALUE_LEN: usize = 4 * 1024 * 1024;

/// Maximum length of an encoded signature, in bytes.
pub const MAX_SIGNATURE_LEN: usize = 96;
