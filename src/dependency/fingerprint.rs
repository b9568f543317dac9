//! Dependency set fingerprints
//!
//! SHA-256 over the sorted dependencies, encoded as unpadded URL-safe base64.
//! Every field is terminated by a NUL byte so that shifting characters
//! between fields cannot produce the same digest input.

use super::Dependency;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Fingerprint a collection of dependencies, regardless of its order
pub fn fingerprint<'a, I>(dependencies: I) -> String
where
    I: IntoIterator<Item = &'a Dependency>,
{
    let mut sorted: Vec<&Dependency> = dependencies.into_iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for dep in sorted {
        for field in [dep.group(), dep.module(), dep.version()] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
    }

    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
