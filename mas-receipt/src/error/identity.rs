/*!
 Errors that can happen when reading the machine identifier of the host.
*/

use std::io;

use thiserror::Error;

/// Errors that can happen when reading the machine identifier of the host
#[derive(Debug, Error)]
pub enum HostIdentityError {
    #[error("Unable to query network interface {0}: {1}")]
    InterfaceUnavailable(String, io::Error),
    #[error("Network interface {0} has no hardware address")]
    NoAddress(String),
    #[error("Invalid hardware address: {0:?}")]
    InvalidAddress(String),
}
