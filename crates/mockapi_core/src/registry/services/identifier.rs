//! Identifier generation for endpoints.
//!
//! Identifiers are short URL-safe strings. The default generator draws a random prefix from
//! the thread RNG and appends a per-generator sequence number, so two identifiers produced by
//! the same generator never collide and identifiers stay hard to guess.
use std::{
    borrow::Borrow,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// URL-safe alphabet, 6 bits per character.
const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";
const RANDOM_CHARS: usize = 8;
const MIN_SEQUENCE_CHARS: usize = 2;

/// Opaque handle of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EndpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EndpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Source of endpoint identifiers.
///
/// The registry checks every generated identifier against its live keys, so an
/// implementation only has to make collisions unlikely, not impossible.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> EndpointId;
}

/// Default generator: 8 random characters followed by a base-64 sequence number.
#[derive(Debug, Default)]
pub struct ShortIdGenerator {
    sequence: AtomicU64,
}

impl ShortIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ShortIdGenerator {
    fn generate(&self) -> EndpointId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut id = String::with_capacity(RANDOM_CHARS + 6);
        let mut rng = rand::rng();
        for _ in 0..RANDOM_CHARS {
            id.push(ALPHABET[rng.random_range(0..ALPHABET.len())] as char);
        }
        push_sequence(&mut id, sequence);
        EndpointId(id)
    }
}

/// Little-endian base-64 encoding, padded to `MIN_SEQUENCE_CHARS`.
fn push_sequence(id: &mut String, mut sequence: u64) {
    let mut written = 0;
    while sequence > 0 || written < MIN_SEQUENCE_CHARS {
        id.push(ALPHABET[(sequence & 0x3f) as usize] as char);
        sequence >>= 6;
        written += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;

    #[test]
    fn unit_short_id_shape() {
        let generator = ShortIdGenerator::new();
        for _ in 0..1_000 {
            let id = generator.generate();
            assert!((7..=14).contains(&id.as_str().len()), "unexpected length: {id}");
            assert!(id.as_str().bytes().all(|b| ALPHABET.contains(&b)), "not url-safe: {id}");
        }
    }

    #[test]
    fn unit_short_id_sequence_suffix() {
        let mut id = String::new();
        push_sequence(&mut id, 0);
        assert_eq!(id, "00");

        let mut id = String::new();
        push_sequence(&mut id, 64 * 64);
        assert_eq!(id, "001");
    }

    #[test]
    fn unit_short_id_distinct() {
        let generator = ShortIdGenerator::new();
        let ids: HashSet<EndpointId> = (0..10_000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn unit_short_id_distinct_across_threads() {
        let generator = Arc::new(ShortIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..1_000).map(|_| generator.generate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.extend(handle.join().unwrap());
        }
        assert_eq!(ids.len(), 8_000);
    }

    #[test]
    fn unit_endpoint_id_borrows_as_str() {
        let mut set = HashSet::new();
        set.insert(EndpointId::new("abc"));
        assert!(set.contains("abc"));
        assert_eq!(EndpointId::from("abc").to_string(), "abc");
    }
}
