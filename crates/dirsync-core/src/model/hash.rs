//! SHA-256 digests over canonical field encodings.

use sha2::{Digest, Sha256};

/// Incremental digest over a sequence of length-prefixed fields.
///
/// The length prefix keeps adjacent fields from bleeding into each other, so
/// two values digest equal iff they encode the same fields in the same order.
pub(crate) struct FieldDigest {
    hasher: Sha256,
}

impl FieldDigest {
    pub(crate) fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub(crate) fn field(&mut self, value: &str) {
        self.hasher.update((value.len() as u64).to_be_bytes());
        self.hasher.update(value.as_bytes());
    }

    pub(crate) fn flag(&mut self, value: bool) {
        self.field(if value { "true" } else { "false" });
    }

    pub(crate) fn count(&mut self, value: usize) {
        self.hasher.update((value as u64).to_be_bytes());
    }

    pub(crate) fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
