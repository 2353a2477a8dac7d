pub mod json;
pub mod reporter;
pub mod txt;
