//! Profile fingerprinting
//!
//! Reports are never stored; a stable digest of the input profile is
//! logged with each analysis so runs can be correlated without logging
//! the figures themselves.

use crate::models::FinancialProfile;
use sha2::{Digest, Sha256};
use std::io::Write;

/// SHA-256 of the profile's JSON form, hex encoded.
/// Expenses serialize in key order, so equal profiles hash equally.
pub fn profile_digest(profile: &FinancialProfile) -> String {
    let mut hasher = Sha256::new();

    // Stream JSON straight into the hasher
    if serde_json::to_writer(HashWriter(&mut hasher), profile).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Short prefix of the digest for log lines
pub fn short_digest(profile: &FinancialProfile) -> String {
    let mut digest = profile_digest(profile);
    digest.truncate(12);
    digest
}

/// Adapter to allow writing into a Digest via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<H: Digest> Write for HashWriter<'_, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
