use base64::{prelude::BASE64_STANDARD, Engine};
use json::{from, object, JsonValue};

use mas_receipt::{
    receipt::{
        fields::{FieldValue, ReceiptAttributes},
        in_app::InAppPurchase,
    },
    util::{bundle::BundleInfo, dates::format_receipt_date},
};

use crate::reporters::reporter::{Report, Reporter};

/// Indentation used when pretty printing the report
const INDENT: u16 = 2;

pub struct JSON<'a> {
    /// The report to render
    pub report: &'a Report,
}

impl<'a> Reporter<'a> for JSON<'a> {
    fn new(report: &'a Report) -> Self {
        JSON { report }
    }

    fn render(&self) -> String {
        let mut json_report = object! {
            receipt: self.report.receipt_path.display().to_string(),
            valid: self.report.valid,
            bundleIdentifier: self.report.bundle_identifier(),
            appVersion: self.report.app_version(),
        };

        json_report["attributes"] = match &self.report.attributes {
            Some(attributes) => self.format_attributes(attributes),
            None => JsonValue::Null,
        };
        json_report["bundle"] = match &self.report.bundle {
            Some(bundle) => self.format_bundle(bundle),
            None => JsonValue::Null,
        };
        json_report["problem"] = from(self.report.problem.as_deref());

        json_report.pretty(INDENT)
    }
}

impl<'a> JSON<'a> {
    /// Every attribute in file order, including duplicates and unknown type codes
    fn format_attributes(&self, attributes: &ReceiptAttributes) -> JsonValue {
        JsonValue::Array(
            attributes
                .iter()
                .map(|(field, value)| {
                    let mut json_attribute = object! {
                        key: field.name().into_owned(),
                        code: field.code(),
                    };
                    let (kind, json_value) = self.format_value(value);
                    json_attribute["type"] = from(kind);
                    json_attribute["value"] = json_value;
                    json_attribute
                })
                .collect(),
        )
    }

    fn format_value(&self, value: &FieldValue) -> (&'static str, JsonValue) {
        match value {
            FieldValue::String(text) => ("string", from(text.as_str())),
            FieldValue::Bytes(bytes) => ("bytes", from(BASE64_STANDARD.encode(bytes))),
            FieldValue::Date(date) => ("date", from(format_receipt_date(date))),
            FieldValue::Purchase(purchase) => ("purchase", self.format_purchase(purchase)),
        }
    }

    fn format_purchase(&self, purchase: &InAppPurchase) -> JsonValue {
        let mut json_purchase = object! {
            quantity: purchase.quantity,
            productIdentifier: purchase.product_identifier.as_deref(),
            transactionIdentifier: purchase.transaction_identifier.as_deref(),
            originalTransactionIdentifier: purchase.original_transaction_identifier.as_deref(),
            webOrderLineItemId: purchase.web_order_line_item_id,
        };
        json_purchase["purchaseDate"] =
            from(purchase.purchase_date.as_ref().map(format_receipt_date));
        json_purchase["originalPurchaseDate"] =
            from(purchase.original_purchase_date.as_ref().map(format_receipt_date));
        json_purchase["subscriptionExpirationDate"] =
            from(purchase.subscription_expiration_date.as_ref().map(format_receipt_date));
        json_purchase["cancellationDate"] =
            from(purchase.cancellation_date.as_ref().map(format_receipt_date));
        json_purchase
    }

    fn format_bundle(&self, bundle: &BundleInfo) -> JsonValue {
        object! {
            identifier: bundle.identifier.as_str(),
            shortVersion: bundle.short_version.as_deref(),
            version: bundle.version.as_deref(),
        }
    }
}
