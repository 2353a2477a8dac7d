/*!
 Errors that can happen when reading an application bundle.
*/

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can happen when reading an application bundle
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("No application bundle found at {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to read Info.plist: {0}")]
    CannotRead(plist::Error),
    #[error("Invalid data found at {0}, expected {1}")]
    InvalidType(String, String),
    #[error("Info.plist is missing the {0} key")]
    MissingKey(String),
}
