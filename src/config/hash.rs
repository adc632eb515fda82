//! Input fingerprinting for run reports.
//!
//! A fingerprint is a SHA-256 over the desired VLAN and the inventory, so two
//! reports can be matched to the same inputs without storing either.

use sha2::{Digest, Sha256};

use super::inventory::Inventory;
use super::spec::DesiredVlan;

/// Hasher for computing input fingerprints.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of a whole run.
    ///
    /// Device order is significant: it is also the report order.
    #[must_use]
    pub fn fingerprint(&self, desired: &DesiredVlan, inventory: &Inventory) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.hash_desired(desired).as_bytes());
        hasher.update(self.hash_inventory(inventory).as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Computes a hash of the desired VLAN.
    #[must_use]
    pub fn hash_desired(&self, desired: &DesiredVlan) -> String {
        let mut hasher = Sha256::new();

        hasher.update(desired.id.get().to_be_bytes());
        hasher.update(desired.name.as_str().as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Computes a hash of the inventory.
    #[must_use]
    pub fn hash_inventory(&self, inventory: &Inventory) -> String {
        let mut hasher = Sha256::new();

        for device in inventory {
            // NUL separators keep ("ab","c") distinct from ("a","bc")
            hasher.update(device.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(device.address.as_bytes());
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Returns a short form of a fingerprint for display.
    #[must_use]
    pub fn short(fingerprint: &str) -> &str {
        &fingerprint[..12.min(fingerprint.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceTarget;

    fn inventory(entries: &[(&str, &str)]) -> Inventory {
        Inventory::from_devices(
            entries
                .iter()
                .map(|(name, address)| DeviceTarget::new(*name, *address))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let hasher = ConfigHasher::new();
        let desired = DesiredVlan::parse("10", "SALES").unwrap();
        let inv = inventory(&[("sw1", "10.0.0.1")]);

        let a = hasher.fingerprint(&desired, &inv);
        let b = hasher.fingerprint(&desired, &inv);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let hasher = ConfigHasher::new();
        let inv = inventory(&[("sw1", "10.0.0.1"), ("sw2", "10.0.0.2")]);
        let sales = DesiredVlan::parse("10", "SALES").unwrap();
        let voice = DesiredVlan::parse("10", "VOICE").unwrap();

        assert_ne!(hasher.fingerprint(&sales, &inv), hasher.fingerprint(&voice, &inv));

        let reordered = inventory(&[("sw2", "10.0.0.2"), ("sw1", "10.0.0.1")]);
        assert_ne!(hasher.fingerprint(&sales, &inv), hasher.fingerprint(&sales, &reordered));
    }

    #[test]
    fn test_field_boundaries_are_hashed() {
        let hasher = ConfigHasher::new();
        let a = inventory(&[("ab", "c")]);
        let b = inventory(&[("a", "bc")]);
        assert_ne!(hasher.hash_inventory(&a), hasher.hash_inventory(&b));
    }

    #[test]
    fn test_short() {
        assert_eq!(ConfigHasher::short("abcdef0123456789"), "abcdef012345");
        assert_eq!(ConfigHasher::short("abc"), "abc");
    }
}
