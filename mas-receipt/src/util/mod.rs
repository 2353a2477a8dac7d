/*!
 This module defines common utilities used to read and validate receipts.
*/

pub mod bundle;
pub mod dates;
pub mod der;
pub mod identity;
