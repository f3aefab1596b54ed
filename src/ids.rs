use crate::entities::item::ItemId;
use sha1::{Digest, Sha1};
use std::sync::atomic::{AtomicU64, Ordering};

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ItemId;
}

/// 24-hex-char ids: the first 12 bytes of SHA-1(seed, counter).
#[derive(Debug)]
pub struct ObjectIdGenerator {
    seed: u64,
    counter: AtomicU64,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(nanos ^ (u64::from(std::process::id()) << 32))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for ObjectIdGenerator {
    fn next_id(&self) -> ItemId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut sha1 = Sha1::new();
        sha1.update(self.seed.to_le_bytes());
        sha1.update(count.to_le_bytes());
        let digest = sha1.finalize();
        let hex: String = digest[..12].iter().map(|byte| format!("{byte:02x}")).collect();
        ItemId(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_24_lowercase_hex_chars() {
        let ids = ObjectIdGenerator::with_seed(7);
        let id = ids.next_id();
        assert_eq!(id.as_str().len(), 24);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids = ObjectIdGenerator::with_seed(7);
        let seen: HashSet<ItemId> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let a = ObjectIdGenerator::with_seed(42);
        let b = ObjectIdGenerator::with_seed(42);
        assert_eq!(a.next_id(), b.next_id());
        assert_ne!(a.next_id(), ObjectIdGenerator::with_seed(43).next_id());
    }
}
