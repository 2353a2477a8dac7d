/*!
 This module contains the receipt container, its semantic view, and the logic used to validate it.
*/

pub mod container;
pub mod fields;
pub mod in_app;
pub mod parser;
pub mod validation;
