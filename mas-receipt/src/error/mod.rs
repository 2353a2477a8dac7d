/*!
 Errors that can happen when reading, decoding, and validating receipt data.
*/

pub mod bundle;
pub mod der;
pub mod identity;
pub mod receipt;
pub mod validation;
