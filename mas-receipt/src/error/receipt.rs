/*!
 Errors that can happen when decoding a receipt file.
*/

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::error::der::DerError;

/// Errors that can happen when decoding a receipt file
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The path does not resolve to a readable file
    #[error("Unable to read receipt at {path:?}: {why}")]
    NotFound {
        path: PathBuf,
        #[source]
        why: io::Error,
    },
    /// The bytes are not a receipt container
    #[error("Malformed receipt: {0}")]
    MalformedReceipt(#[from] DerError),
}
