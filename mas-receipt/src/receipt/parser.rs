/*!
 The two entry points used to read receipts: [`decode()`] and [`is_valid()`].

 [`decode()`] reports why a receipt could not be read. [`is_valid()`] always answers with a
 `bool` so a tampered or missing receipt does not reveal which check it failed.
*/

use std::{fs, path::Path};

use tracing::debug;

use crate::{
    error::{receipt::ReceiptError, validation::ValidationFailure},
    receipt::{
        container::ReceiptContainer,
        fields::{ReceiptAttributes, ReceiptField},
        validation::{digests_match, identity_hash, ValidationPolicy},
    },
    util::identity::{HostIdentity, NetworkInterface},
};

/// Read the receipt at `path` and decode its attributes
///
/// # Example:
///
/// ```no_run
/// use mas_receipt::receipt::parser::decode;
///
/// let attributes = decode("/Applications/Example.app/Contents/_MASReceipt/receipt").unwrap();
/// println!("{:?}", attributes.bundle_identifier());
/// ```
pub fn decode<P: AsRef<Path>>(path: P) -> Result<ReceiptAttributes, ReceiptError> {
    let container = read_container(path.as_ref())?;
    Ok(ReceiptAttributes::from(&container))
}

/// Check the receipt at `path` with the default [`ValidationPolicy`] against this machine
///
/// Any failure, including a missing or malformed file, yields `false`.
pub fn is_valid<P: AsRef<Path>>(path: P) -> bool {
    ReceiptValidator::default().is_valid(path)
}

/// Read the whole file, then decode it
fn read_container(path: &Path) -> Result<ReceiptContainer, ReceiptError> {
    let bytes = fs::read(path).map_err(|why| ReceiptError::NotFound {
        path: path.to_path_buf(),
        why,
    })?;
    let container = ReceiptContainer::from_bytes(&bytes)?;
    debug!(
        path = %path.display(),
        attributes = container.len(),
        "decoded receipt"
    );
    Ok(container)
}

/// Validates receipts according to a [`ValidationPolicy`], using `H` to identify the machine
#[derive(Debug, Clone)]
pub struct ReceiptValidator<H = NetworkInterface> {
    policy: ValidationPolicy,
    identity: H,
}

impl Default for ReceiptValidator<NetworkInterface> {
    /// The default policy, identifying the machine by [`NetworkInterface::default()`]
    fn default() -> Self {
        Self::new(ValidationPolicy::default(), NetworkInterface::default())
    }
}

impl<H: HostIdentity> ReceiptValidator<H> {
    pub fn new(policy: ValidationPolicy, identity: H) -> Self {
        Self { policy, identity }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Whether the receipt at `path` passes every check the policy enables
    pub fn is_valid<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.check(path) {
            Ok(_) => true,
            Err(why) => {
                debug!(%why, "receipt rejected");
                false
            }
        }
    }

    /// Check the receipt at `path`, returning its attributes or the first check it failed
    pub fn check<P: AsRef<Path>>(&self, path: P) -> Result<ReceiptAttributes, ValidationFailure> {
        let container = read_container(path.as_ref())?;
        self.check_container(&container)
    }

    /// Check a receipt that has already been read into memory
    pub fn check_bytes(&self, bytes: &[u8]) -> Result<ReceiptAttributes, ValidationFailure> {
        let container = ReceiptContainer::from_bytes(bytes).map_err(ReceiptError::from)?;
        self.check_container(&container)
    }

    fn check_container(
        &self,
        container: &ReceiptContainer,
    ) -> Result<ReceiptAttributes, ValidationFailure> {
        let attributes = ReceiptAttributes::from(container);

        let bundle_identifier = attributes
            .bundle_identifier()
            .ok_or(ValidationFailure::MissingField(ReceiptField::BundleIdentifier))?;
        let app_version = attributes
            .app_version()
            .ok_or(ValidationFailure::MissingField(ReceiptField::AppVersion))?;

        if let Some(expected) = &self.policy.expected_bundle_identifier {
            if expected != bundle_identifier {
                return Err(ValidationFailure::BundleIdentifierMismatch {
                    expected: expected.clone(),
                    found: bundle_identifier.to_string(),
                });
            }
        }
        if let Some(expected) = &self.policy.expected_version {
            if expected != app_version {
                return Err(ValidationFailure::VersionMismatch {
                    expected: expected.clone(),
                    found: app_version.to_string(),
                });
            }
        }

        if self.policy.verify_identity_hash {
            self.verify_identity_hash(&attributes)?;
        }

        Ok(attributes)
    }

    /// Recompute the identity hash from this machine and compare it to the stored digest
    fn verify_identity_hash(&self, attributes: &ReceiptAttributes) -> Result<(), ValidationFailure> {
        let bundle_identifier = attributes
            .bundle_identifier_bytes()
            .ok_or(ValidationFailure::MissingField(ReceiptField::BundleIdentifier))?;
        let opaque_value = attributes
            .opaque_value()
            .ok_or(ValidationFailure::MissingField(ReceiptField::OpaqueValue))?;
        let stored = attributes
            .hash()
            .ok_or(ValidationFailure::MissingField(ReceiptField::Hash))?;

        let machine_id = self.identity.machine_identifier()?;
        let computed = identity_hash(&machine_id, opaque_value, bundle_identifier);

        if digests_match(&computed, stored) {
            Ok(())
        } else {
            Err(ValidationFailure::HashMismatch)
        }
    }
}
