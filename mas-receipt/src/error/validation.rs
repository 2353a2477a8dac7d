/*!
 Reasons a receipt can fail validation.
*/

use thiserror::Error;

use crate::{
    error::{identity::HostIdentityError, receipt::ReceiptError},
    receipt::fields::ReceiptField,
};

/// Reasons a receipt can fail validation
///
/// [`is_valid()`](crate::receipt::parser::is_valid) collapses all of these into `false`;
/// only [`ReceiptValidator::check()`](crate::receipt::parser::ReceiptValidator::check) exposes them.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("{0}")]
    Decode(#[from] ReceiptError),
    #[error("Receipt is missing the {0} field")]
    MissingField(ReceiptField),
    #[error("Receipt bundle identifier {found:?} does not match {expected:?}")]
    BundleIdentifierMismatch { expected: String, found: String },
    #[error("Receipt version {found:?} does not match {expected:?}")]
    VersionMismatch { expected: String, found: String },
    #[error("Unable to determine machine identifier: {0}")]
    HostIdentity(#[from] HostIdentityError),
    #[error("Receipt identity hash does not match this machine")]
    HashMismatch,
}
