pub mod error;
pub mod options;
pub mod report_type;
pub mod runtime;
pub mod sanitizers;
