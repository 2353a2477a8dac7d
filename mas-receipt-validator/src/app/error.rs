/*!
Errors that can happen during the application's runtime
*/

use thiserror::Error;

use mas_receipt::error::bundle::BundleError;

/// Errors that can happen during the application's runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid options!\n{0}")]
    InvalidOptions(String),
    #[error("{0}")]
    BundleError(#[from] BundleError),
}
