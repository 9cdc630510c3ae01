//! Merkle digesting of protocol data.
//!
//! Every digestible item is reduced to 32-byte chunks which are then
//! Merkleized into a binary tree padded with zero subtrees up to a fixed
//! limit. Variable-length items additionally mix their length into the root,
//! so that two lists with a different number of trailing zero elements never
//! share a root.

use alloc::vec::Vec;

use sha3::{Digest, Sha3_256};

use crate::Hash;

/// Size of a Merkle chunk, in bytes.
pub const CHUNK_SIZE: usize = 32;

/// A single Merkle leaf.
pub type Chunk = [u8; CHUNK_SIZE];

/// Hash the concatenation of two chunks.
pub fn hash_pair(left: &Chunk, right: &Chunk) -> Chunk {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Merkleize the given chunks into a tree with room for `limit` leaves.
///
/// Missing leaves are zero chunks; their subtrees are never materialized,
/// which keeps large limits cheap.
pub fn merkleize(chunks: Vec<Chunk>, limit: usize) -> Hash {
    // Oversized inputs are rejected by the codec, never truncated here.
    let depth = limit
        .max(chunks.len())
        .max(1)
        .next_power_of_two()
        .trailing_zeros();

    let mut layer = chunks;
    let mut zero = [0u8; CHUNK_SIZE];

    for _ in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero);
        }

        layer = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();

        zero = hash_pair(&zero, &zero);
    }

    Hash::new(layer.first().copied().unwrap_or(zero))
}

/// Mix the length of a variable-length item into its root.
pub fn mix_in_length(root: Hash, len: usize) -> Hash {
    Hash::new(hash_pair(root.as_bytes(), &u64_chunk(len as u64)))
}

/// Encode an integer as a little-endian, zero-padded chunk.
pub fn u64_chunk(n: u64) -> Chunk {
    let mut chunk = [0u8; CHUNK_SIZE];
    chunk[..8].copy_from_slice(&n.to_le_bytes());
    chunk
}

/// Split bytes into zero-padded chunks.
pub fn pack_bytes(bytes: &[u8]) -> Vec<Chunk> {
    bytes
        .chunks(CHUNK_SIZE)
        .map(|part| {
            let mut chunk = [0u8; CHUNK_SIZE];
            chunk[..part.len()].copy_from_slice(part);
            chunk
        })
        .collect()
}

/// Root of a byte list of at most `max_len` bytes.
pub fn bytes_root(bytes: &[u8], max_len: usize) -> Hash {
    let limit = max_len.div_ceil(CHUNK_SIZE);
    mix_in_length(merkleize(pack_bytes(bytes), limit), bytes.len())
}

/// Root of a list of at most `max_len` items, given the roots of the items.
pub fn list_root(roots: impl IntoIterator<Item = Hash>, max_len: usize) -> Hash {
    let chunks: Vec<Chunk> = roots.into_iter().map(Hash::into_bytes).collect();
    let len = chunks.len();
    mix_in_length(merkleize(chunks, max_len), len)
}

/// Root of a fixed-size container, given the roots of its fields in order.
pub fn container_root(fields: &[Chunk]) -> Hash {
    merkleize(fields.to_vec(), fields.len())
}

/// Signing root of a message root under a signing domain.
pub fn signing_root(message_root: Hash, domain: &[u8; 4]) -> Hash {
    let mut domain_chunk = [0u8; CHUNK_SIZE];
    domain_chunk[..4].copy_from_slice(domain);
    Hash::new(hash_pair(message_root.as_bytes(), &domain_chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_tree_is_zero_subtree() {
        let zero = [0u8; CHUNK_SIZE];
        let level1 = hash_pair(&zero, &zero);
        let level2 = hash_pair(&level1, &level1);

        assert_eq!(merkleize(vec![], 4), Hash::new(level2));
        assert_eq!(merkleize(vec![], 1), Hash::ZERO);
    }

    #[test]
    fn padding_matches_explicit_zero_leaves() {
        let a = [1u8; CHUNK_SIZE];
        let b = [2u8; CHUNK_SIZE];
        let c = [3u8; CHUNK_SIZE];
        let zero = [0u8; CHUNK_SIZE];

        let explicit = merkleize(vec![a, b, c, zero], 4);
        let implicit = merkleize(vec![a, b, c], 4);
        assert_eq!(explicit, implicit);

        let expected = hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &zero));
        assert_eq!(implicit, Hash::new(expected));
    }

    #[test]
    fn length_is_mixed_in() {
        assert_ne!(bytes_root(&[], 64), bytes_root(&[0], 64));
        assert_ne!(bytes_root(&[0; 32], 64), bytes_root(&[0; 31], 64));
    }

    #[test]
    fn field_order_matters() {
        let a = u64_chunk(1);
        let b = u64_chunk(2);
        assert_ne!(container_root(&[a, b]), container_root(&[b, a]));
    }

    #[test]
    fn signing_root_depends_on_domain() {
        let root = bytes_root(b"hello", 64);
        assert_ne!(signing_root(root, &[0, 0, 0, 1]), signing_root(root, &[0, 0, 0, 2]));
    }
}
