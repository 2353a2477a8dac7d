use std::path::PathBuf;

use mas_receipt::{receipt::fields::ReceiptAttributes, util::bundle::BundleInfo};

/// The outcome of checking a single receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The receipt file that was checked
    pub receipt_path: PathBuf,
    /// Whether the receipt passed every enabled check
    pub valid: bool,
    /// The decoded attributes, if the receipt could be read
    pub attributes: Option<ReceiptAttributes>,
    /// Why the receipt could not be read or failed validation
    pub problem: Option<String>,
    /// The identity the application bundle declares, if a bundle was checked
    pub bundle: Option<BundleInfo>,
}

impl Report {
    /// The receipt's bundle identifier, if it could be decoded
    pub fn bundle_identifier(&self) -> Option<&str> {
        self.attributes.as_ref()?.bundle_identifier()
    }

    /// The receipt's app version, if it could be decoded
    pub fn app_version(&self) -> Option<&str> {
        self.attributes.as_ref()?.app_version()
    }
}

/// Defines behavior for rendering a [`Report`] to the desired output format
pub trait Reporter<'a> {
    /// Create a new reporter with a reference to the finished report
    fn new(report: &'a Report) -> Self;
    /// Render the whole report
    fn render(&self) -> String;
}
