/*!
 The checks a receipt must pass, and the identity hash that ties a receipt to one machine.

 # Identity Hash

 The receipt stores a SHA-1 digest (type `5`) of the concatenation of:

 1. The machine identifier, see [`HostIdentity`](crate::util::identity::HostIdentity)
 2. The opaque value (type `4`)
 3. The bundle identifier (type `2`), as the raw `DER` bytes of the attribute value

 A receipt copied to another machine produces a different digest.
*/

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::util::bundle::BundleInfo;

/// Controls which checks [`ReceiptValidator`](crate::receipt::parser::ReceiptValidator) performs
///
/// The structural checks and the presence of the bundle identifier and version are always
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Recompute the identity hash and compare it to the stored one
    pub verify_identity_hash: bool,
    /// If set, the receipt's bundle identifier must equal this
    pub expected_bundle_identifier: Option<String>,
    /// If set, the receipt's app version must equal this
    pub expected_version: Option<String>,
}

impl Default for ValidationPolicy {
    /// The default policy verifies the identity hash and does not expect a specific bundle.
    fn default() -> Self {
        Self {
            verify_identity_hash: true,
            expected_bundle_identifier: None,
            expected_version: None,
        }
    }
}

impl ValidationPolicy {
    /// Require the receipt to belong to the bundle described by `info`
    pub fn expect_bundle(mut self, info: &BundleInfo) -> Self {
        self.expected_bundle_identifier = Some(info.identifier.clone());
        self.expected_version = info.short_version.clone();
        self
    }

    /// Skip the identity hash check
    pub fn without_identity_hash(mut self) -> Self {
        self.verify_identity_hash = false;
        self
    }
}

/// Compute the identity hash for a machine, opaque value, and raw bundle identifier
pub fn identity_hash(machine_id: &[u8], opaque_value: &[u8], bundle_identifier: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(machine_id);
    hasher.update(opaque_value);
    hasher.update(bundle_identifier);
    hasher.finalize().to_vec()
}

/// Compare two digests in constant time
pub(crate) fn digests_match(computed: &[u8], stored: &[u8]) -> bool {
    bool::from(computed.ct_eq(stored))
}
