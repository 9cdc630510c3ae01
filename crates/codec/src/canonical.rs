//! Canonical fixed-offset binary encoding of signed consensus messages.
//!
//! Fixed-size fields are laid out inline, little-endian. Variable-size fields
//! are replaced inline by a `u32` offset, relative to the start of their
//! container, and appended after the fixed part in field order. A list of
//! variable-size items starts with a table of `u32` offsets, one per item.
//!
//! ```text
//! SignedMessage := signers_offset:u32 signatures_offset:u32 message_offset:u32
//!                  signers:[u64] signatures:[bytes] message:Message
//!
//! Message := type:u8 height:u64 round:u64 identifier_offset:u32 root:[u8;32]
//!            prepared_round:u64 value_offset:u32 round_changes_offset:u32
//!            prepares_offset:u32
//!            identifier:bytes value:bytes round_changes:[SignedMessage]
//!            prepares:[SignedMessage]
//! ```

use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian as LE};
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use qbft_core_types::limits::{
    MAX_IDENTIFIER_LEN, MAX_JUSTIFICATIONS, MAX_SIGNATURE_LEN, MAX_SIGNERS, MAX_VALUE_LEN,
};
use qbft_core_types::{
    AggregateSignature, Body, Context, Hash, Height, Identifier, Message, MessageType, OperatorId,
    Prepared, Round, SignedMessage, SigningScheme, UnknownMessageType, Value,
};

use crate::Codec;

const OFFSET_LEN: usize = 4;

const SIGNED_MESSAGE_FIXED_LEN: usize = 3 * OFFSET_LEN;

// type + height + round + identifier offset + root + prepared round + 3 offsets
const MESSAGE_FIXED_LEN: usize = 1 + 8 + 8 + OFFSET_LEN + 32 + 8 + 3 * OFFSET_LEN;

/// Maximum length of an encoded signed message, in bytes.
pub const MAX_ENCODED_LEN: usize = 4 * MAX_VALUE_LEN;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unexpected end of input: need {needed} bytes, got {got}")]
    UnexpectedEof { needed: usize, got: usize },

    #[error("invalid offset {offset}, expected {expected}")]
    InvalidOffset { offset: usize, expected: usize },

    #[error("invalid length {len} for {field}")]
    InvalidLength { field: &'static str, len: usize },

    #[error("{field} exceeds bound: {len} > {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("signers and signatures differ in length: {signers} signers, {signatures} signatures")]
    SignerSignatureMismatch { signers: usize, signatures: usize },

    #[error(transparent)]
    UnknownMessageType(#[from] UnknownMessageType),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("root does not match the carried value")]
    RootMismatch,

    #[error("unexpected {field} in {msg_type} message")]
    UnexpectedField {
        field: &'static str,
        msg_type: MessageType,
    },
}

/// The canonical codec for [`SignedMessage`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct CanonicalCodec;

impl<Ctx: Context> Codec<SignedMessage<Ctx>> for CanonicalCodec {
    type Error = Error;

    fn decode(&self, bytes: Bytes) -> Result<SignedMessage<Ctx>, Self::Error> {
        check_bound("message", bytes.len(), MAX_ENCODED_LEN)?;
        Decoder::<Ctx>::default().signed_message(&bytes)
    }

    fn encode(&self, msg: &SignedMessage<Ctx>) -> Result<Bytes, Self::Error> {
        let mut buf = BytesMut::new();
        encode_signed_message(msg, &mut buf)?;
        Ok(buf.freeze())
    }
}

fn check_bound(field: &'static str, len: usize, max: usize) -> Result<(), Error> {
    if len > max {
        return Err(Error::TooLong { field, len, max });
    }

    Ok(())
}

fn encode_signed_message<Ctx: Context>(
    msg: &SignedMessage<Ctx>,
    buf: &mut BytesMut,
) -> Result<(), Error> {
    check_bound("signers", msg.signers.len(), MAX_SIGNERS)?;

    if msg.signers.len() != msg.signature.len() {
        return Err(Error::SignerSignatureMismatch {
            signers: msg.signers.len(),
            signatures: msg.signature.len(),
        });
    }

    let mut signers = BytesMut::with_capacity(msg.signers.len() * 8);
    for id in &msg.signers {
        signers.put_u64_le(id.as_u64());
    }

    let signatures = msg
        .signature
        .signatures()
        .iter()
        .map(<Ctx::SigningScheme as SigningScheme>::encode_signature)
        .collect::<Vec<_>>();

    for signature in &signatures {
        check_bound("signature", signature.len(), MAX_SIGNATURE_LEN)?;
    }

    let mut signatures_buf = BytesMut::new();
    encode_variable_list(&signatures, &mut signatures_buf);

    let mut message = BytesMut::new();
    encode_message(&msg.message, &mut message)?;

    let mut offset = SIGNED_MESSAGE_FIXED_LEN;
    buf.reserve(offset + signers.len() + signatures_buf.len() + message.len());

    for part in [&signers, &signatures_buf, &message] {
        buf.put_u32_le(offset as u32);
        offset += part.len();
    }

    buf.put_slice(&signers);
    buf.put_slice(&signatures_buf);
    buf.put_slice(&message);

    Ok(())
}

fn encode_message<Ctx: Context>(msg: &Message<Ctx>, buf: &mut BytesMut) -> Result<(), Error> {
    let identifier = msg.identifier.as_bytes();
    check_bound("identifier", identifier.len(), MAX_IDENTIFIER_LEN)?;

    let value = msg.value().map(|v| v.data().clone()).unwrap_or_default();
    check_bound("value", value.len(), MAX_VALUE_LEN)?;

    let round_changes = encode_justifications(msg.round_change_justification())?;
    let prepares = encode_justifications(msg.prepare_justification())?;

    let root = msg.value_root().unwrap_or(Hash::ZERO);
    let prepared_round = msg.prepared_round().map_or(0, |r| r.as_u64());

    buf.reserve(
        MESSAGE_FIXED_LEN + identifier.len() + value.len() + round_changes.len() + prepares.len(),
    );

    let mut offset = MESSAGE_FIXED_LEN;

    buf.put_u8(msg.msg_type().tag());
    buf.put_u64_le(msg.height.as_u64());
    buf.put_u64_le(msg.round.as_u64());
    buf.put_u32_le(offset as u32);
    offset += identifier.len();
    buf.put_slice(root.as_bytes());
    buf.put_u64_le(prepared_round);
    buf.put_u32_le(offset as u32);
    offset += value.len();
    buf.put_u32_le(offset as u32);
    offset += round_changes.len();
    buf.put_u32_le(offset as u32);

    buf.put_slice(identifier);
    buf.put_slice(&value);
    buf.put_slice(&round_changes);
    buf.put_slice(&prepares);

    Ok(())
}

fn encode_justifications<Ctx: Context>(msgs: &[SignedMessage<Ctx>]) -> Result<BytesMut, Error> {
    check_bound("justifications", msgs.len(), MAX_JUSTIFICATIONS)?;

    let items = msgs
        .iter()
        .map(|msg| {
            let mut item = BytesMut::new();
            encode_signed_message(msg, &mut item)?;
            Ok(item)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut buf = BytesMut::new();
    encode_variable_list(&items, &mut buf);
    Ok(buf)
}

fn encode_variable_list<T: AsRef<[u8]>>(items: &[T], buf: &mut BytesMut) {
    let mut offset = items.len() * OFFSET_LEN;

    for item in items {
        buf.put_u32_le(offset as u32);
        offset += item.as_ref().len();
    }

    for item in items {
        buf.put_slice(item.as_ref());
    }
}

fn read_u32_at(bytes: &[u8], at: usize) -> Result<usize, Error> {
    let end = at + OFFSET_LEN;
    let slice = bytes.get(at..end).ok_or(Error::UnexpectedEof {
        needed: end,
        got: bytes.len(),
    })?;

    Ok(LE::read_u32(slice) as usize)
}

/// Split a container into its variable parts, given the offsets read from its fixed part.
fn split_parts<'a>(
    bytes: &'a [u8],
    fixed_len: usize,
    offsets: &[usize],
) -> Result<Vec<&'a [u8]>, Error> {
    let mut expected = fixed_len;
    let mut parts = Vec::with_capacity(offsets.len());

    for (i, &offset) in offsets.iter().enumerate() {
        if i == 0 && offset != fixed_len {
            return Err(Error::InvalidOffset {
                offset,
                expected: fixed_len,
            });
        }

        if offset < expected || offset > bytes.len() {
            return Err(Error::InvalidOffset { offset, expected });
        }

        let end = offsets.get(i + 1).copied().unwrap_or(bytes.len());
        if end < offset || end > bytes.len() {
            return Err(Error::InvalidOffset {
                offset: end,
                expected: offset,
            });
        }

        parts.push(&bytes[offset..end]);
        expected = offset;
    }

    Ok(parts)
}

fn decode_variable_list<'a>(
    bytes: &'a [u8],
    field: &'static str,
    max: usize,
) -> Result<Vec<&'a [u8]>, Error> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let first = read_u32_at(bytes, 0)?;
    if first == 0 || first % OFFSET_LEN != 0 || first > bytes.len() {
        return Err(Error::InvalidLength { field, len: first });
    }

    let count = first / OFFSET_LEN;
    check_bound(field, count, max)?;

    let offsets = (0..count)
        .map(|i| read_u32_at(bytes, i * OFFSET_LEN))
        .collect::<Result<Vec<_>, _>>()?;

    split_parts(bytes, first, &offsets)
}

struct Decoder<Ctx> {
    _marker: PhantomData<Ctx>,
}

impl<Ctx> Default for Decoder<Ctx> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Ctx: Context> Decoder<Ctx> {
    fn signed_message(&self, bytes: &[u8]) -> Result<SignedMessage<Ctx>, Error> {
        if bytes.len() < SIGNED_MESSAGE_FIXED_LEN {
            return Err(Error::UnexpectedEof {
                needed: SIGNED_MESSAGE_FIXED_LEN,
                got: bytes.len(),
            });
        }

        let offsets = (0..3)
            .map(|i| read_u32_at(bytes, i * OFFSET_LEN))
            .collect::<Result<Vec<_>, _>>()?;

        let parts = split_parts(bytes, SIGNED_MESSAGE_FIXED_LEN, &offsets)?;
        let (signers, signatures, message) = (parts[0], parts[1], parts[2]);

        if signers.len() % 8 != 0 {
            return Err(Error::InvalidLength {
                field: "signers",
                len: signers.len(),
            });
        }

        check_bound("signers", signers.len() / 8, MAX_SIGNERS)?;

        let signers = signers
            .chunks_exact(8)
            .map(|chunk| OperatorId::new(LE::read_u64(chunk)))
            .collect::<Vec<_>>();

        let signatures = decode_variable_list(signatures, "signatures", MAX_SIGNERS)?;

        if signers.len() != signatures.len() {
            return Err(Error::SignerSignatureMismatch {
                signers: signers.len(),
                signatures: signatures.len(),
            });
        }

        let signatures = signatures
            .into_iter()
            .map(|bytes| {
                check_bound("signature", bytes.len(), MAX_SIGNATURE_LEN)?;
                <Ctx::SigningScheme as SigningScheme>::decode_signature(bytes)
                    .map_err(|e| Error::InvalidSignature(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let message = self.message(message)?;

        Ok(SignedMessage::new(
            message,
            signers,
            AggregateSignature::new(signatures),
        ))
    }

    fn message(&self, bytes: &[u8]) -> Result<Message<Ctx>, Error> {
        if bytes.len() < MESSAGE_FIXED_LEN {
            return Err(Error::UnexpectedEof {
                needed: MESSAGE_FIXED_LEN,
                got: bytes.len(),
            });
        }

        let msg_type = MessageType::try_from(bytes[0])?;
        let height = Height::new(LE::read_u64(&bytes[1..9]));
        let round = Round::new(LE::read_u64(&bytes[9..17]));
        let identifier_offset = read_u32_at(bytes, 17)?;

        let mut root = [0u8; 32];
        root.copy_from_slice(&bytes[21..53]);
        let root = Hash::new(root);

        let prepared_round = LE::read_u64(&bytes[53..61]);
        let value_offset = read_u32_at(bytes, 61)?;
        let round_changes_offset = read_u32_at(bytes, 65)?;
        let prepares_offset = read_u32_at(bytes, 69)?;

        let parts = split_parts(
            bytes,
            MESSAGE_FIXED_LEN,
            &[
                identifier_offset,
                value_offset,
                round_changes_offset,
                prepares_offset,
            ],
        )?;

        let (identifier, value, round_changes, prepares) = (parts[0], parts[1], parts[2], parts[3]);

        check_bound("identifier", identifier.len(), MAX_IDENTIFIER_LEN)?;
        check_bound("value", value.len(), MAX_VALUE_LEN)?;

        let unexpected = |field| Error::UnexpectedField { field, msg_type };

        // Justifications only nest Propose > RoundChange > Prepare, which
        // bounds the recursion below.
        let (round_changes, prepares) = match msg_type {
            MessageType::Propose => (
                self.justifications(round_changes, MessageType::RoundChange, msg_type)?,
                self.justifications(prepares, MessageType::Prepare, msg_type)?,
            ),

            MessageType::RoundChange => {
                if !round_changes.is_empty() {
                    return Err(unexpected("round change justification"));
                }

                let prepares = self.justifications(prepares, MessageType::Prepare, msg_type)?;

                (Vec::new(), prepares)
            }

            MessageType::Prepare | MessageType::Commit => {
                if !round_changes.is_empty() || !prepares.is_empty() {
                    return Err(unexpected("justification"));
                }

                (Vec::new(), Vec::new())
            }
        };

        let identifier = Identifier::new(Bytes::copy_from_slice(identifier));

        let body = match msg_type {
            MessageType::Propose => {
                if prepared_round != 0 {
                    return Err(unexpected("prepared round"));
                }

                let value = Value::new(Bytes::copy_from_slice(value));
                if value.root() != root {
                    return Err(Error::RootMismatch);
                }

                Body::Propose {
                    value,
                    round_change_justification: round_changes,
                    prepare_justification: prepares,
                }
            }

            MessageType::Prepare | MessageType::Commit => {
                if prepared_round != 0 {
                    return Err(unexpected("prepared round"));
                }
                if !value.is_empty() {
                    return Err(unexpected("value"));
                }

                if msg_type == MessageType::Prepare {
                    Body::Prepare { root }
                } else {
                    Body::Commit { root }
                }
            }

            MessageType::RoundChange => {
                let prepared = if prepared_round == 0 {
                    if !value.is_empty() {
                        return Err(unexpected("value"));
                    }
                    if root != Hash::ZERO {
                        return Err(unexpected("root"));
                    }
                    if !prepares.is_empty() {
                        return Err(unexpected("prepare justification"));
                    }

                    None
                } else {
                    let value = Value::new(Bytes::copy_from_slice(value));
                    if value.root() != root {
                        return Err(Error::RootMismatch);
                    }

                    Some(Prepared::new(Round::new(prepared_round), value))
                };

                Body::RoundChange {
                    prepared,
                    prepare_justification: prepares,
                }
            }
        };

        Ok(Message::new(identifier, height, round, body))
    }

    /// Decode a justification list of a `parent` message, whose items must
    /// all be of type `expected`.
    ///
    /// The type of each item is checked before the item is decoded.
    fn justifications(
        &self,
        bytes: &[u8],
        expected: MessageType,
        parent: MessageType,
    ) -> Result<Vec<SignedMessage<Ctx>>, Error> {
        let field = match expected {
            MessageType::RoundChange => "round change justification",
            _ => "prepare justification",
        };

        decode_variable_list(bytes, "justifications", MAX_JUSTIFICATIONS)?
            .into_iter()
            .map(|item| {
                if peek_type(item)? != expected {
                    return Err(Error::UnexpectedField {
                        field,
                        msg_type: parent,
                    });
                }

                self.signed_message(item)
            })
            .collect()
    }
}

/// Read the type of an encoded signed message without decoding it.
fn peek_type(bytes: &[u8]) -> Result<MessageType, Error> {
    let message = read_u32_at(bytes, 2 * OFFSET_LEN)?;

    let tag = *bytes.get(message).ok_or(Error::UnexpectedEof {
        needed: message + 1,
        got: bytes.len(),
    })?;

    Ok(MessageType::try_from(tag)?)
}

