use mas_receipt::{
    receipt::{fields::ReceiptAttributes, in_app::InAppPurchase},
    util::dates::format_receipt_date,
};

use crate::{
    app::sanitizers::sanitize_terminal,
    reporters::reporter::{Report, Reporter},
};

/// Placeholder for fields the receipt does not contain
const UNKNOWN: &str = "Unknown";

pub struct TXT<'a> {
    /// The report to render
    pub report: &'a Report,
}

impl<'a> Reporter<'a> for TXT<'a> {
    fn new(report: &'a Report) -> Self {
        TXT { report }
    }

    fn render(&self) -> String {
        let mut out_s = String::new();

        self.add_field(
            &mut out_s,
            "Receipt",
            &self.report.receipt_path.display().to_string(),
            "",
        );
        if self.report.valid {
            self.add_line(&mut out_s, "Receipt is valid", "");
        } else {
            self.add_line(&mut out_s, "Receipt is NOT valid", "");
        }
        self.add_field(
            &mut out_s,
            "Bundle identifier",
            self.report.bundle_identifier().unwrap_or(UNKNOWN),
            "",
        );
        self.add_field(
            &mut out_s,
            "App version",
            self.report.app_version().unwrap_or(UNKNOWN),
            "",
        );

        if let Some(attributes) = &self.report.attributes {
            self.format_details(&mut out_s, attributes);
        }

        if let Some(bundle) = &self.report.bundle {
            self.add_field(&mut out_s, "Bundle declares", &bundle.identifier, "");
            if let Some(version) = &bundle.short_version {
                self.add_field(&mut out_s, "Bundle version", version, "");
            }
        }

        if let Some(problem) = &self.report.problem {
            self.add_field(&mut out_s, "Problem", problem, "");
        }

        out_s
    }
}

impl<'a> TXT<'a> {
    /// Add the optional receipt fields, skipping the ones that are missing
    fn format_details(&self, out_s: &mut String, attributes: &ReceiptAttributes) {
        if let Some(version) = attributes.original_app_version() {
            self.add_field(out_s, "Original app version", version, "");
        }
        if let Some(receipt_type) = attributes.receipt_type() {
            self.add_field(out_s, "Receipt type", receipt_type, "");
        }
        if let Some(date) = attributes.creation_date() {
            self.add_field(out_s, "Created", &format_receipt_date(date), "");
        }
        if let Some(date) = attributes.expiration_date() {
            self.add_field(out_s, "Expires", &format_receipt_date(date), "");
        }
        if let Some(opaque) = attributes.opaque_value() {
            self.add_field(out_s, "Opaque value", &hex::encode(opaque), "");
        }
        if let Some(hash) = attributes.hash() {
            self.add_field(out_s, "Hash", &hex::encode(hash), "");
        }

        let purchases = attributes.in_app_purchases();
        if !purchases.is_empty() {
            self.add_line(out_s, &format!("In-app purchases: {}", purchases.len()), "");
            for purchase in purchases {
                self.format_purchase(out_s, purchase, "    ");
            }
        }
    }

    /// Format a single in-app purchase on one line
    fn format_purchase(&self, out_s: &mut String, purchase: &InAppPurchase, indent: &str) {
        let mut line = purchase
            .product_identifier
            .as_deref()
            .unwrap_or(UNKNOWN)
            .to_string();

        if let Some(transaction) = &purchase.transaction_identifier {
            line.push_str(&format!(" ({transaction})"));
        }
        if let Some(quantity) = purchase.quantity {
            if quantity != 1 {
                line.push_str(&format!(" x{quantity}"));
            }
        }
        if let Some(date) = &purchase.purchase_date {
            line.push_str(&format!(", purchased {}", format_receipt_date(date)));
        }
        if let Some(date) = &purchase.subscription_expiration_date {
            line.push_str(&format!(", expires {}", format_receipt_date(date)));
        }
        if let Some(date) = &purchase.cancellation_date {
            line.push_str(&format!(", cancelled {}", format_receipt_date(date)));
        }

        self.add_line(out_s, &line, indent);
    }

    fn add_field(&self, string: &mut String, label: &str, value: &str, indent: &str) {
        self.add_line(string, &format!("{label}: {value}"), indent);
    }

    fn add_line(&self, string: &mut String, part: &str, indent: &str) {
        if !part.is_empty() {
            string.push_str(indent);
            string.push_str(&sanitize_terminal(part));
            string.push('\n');
        }
    }
}
