/*!
 Logic and containers for the in-app purchase receipts nested inside an app receipt.

 Each purchase is stored as the value of its own attribute with type code `17`. The value is another
 set of attribute records using the `17xx` codes described
 [here](https://developer.apple.com/library/archive/releasenotes/General/ValidateAppStoreReceipt/Chapters/ReceiptFields.html#//apple_ref/doc/uid/TP40010573-CH106-SW12).
*/

use chrono::{DateTime, Utc};

use crate::{
    error::der::DerError,
    receipt::{
        container::{parse_attribute_set, ReceiptAttribute},
        fields::{decode_integer, decode_string},
    },
    util::{dates::parse_receipt_date, der::DerReader},
};

const QUANTITY: i64 = 1701;
const PRODUCT_IDENTIFIER: i64 = 1702;
const TRANSACTION_IDENTIFIER: i64 = 1703;
const PURCHASE_DATE: i64 = 1704;
const ORIGINAL_TRANSACTION_IDENTIFIER: i64 = 1705;
const ORIGINAL_PURCHASE_DATE: i64 = 1706;
const SUBSCRIPTION_EXPIRATION_DATE: i64 = 1708;
const WEB_ORDER_LINE_ITEM_ID: i64 = 1711;
const CANCELLATION_DATE: i64 = 1712;

/// A single in-app purchase receipt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InAppPurchase {
    /// The number of items purchased
    pub quantity: Option<i64>,
    /// The product identifier of the item that was purchased
    pub product_identifier: Option<String>,
    /// The transaction identifier of the item that was purchased
    pub transaction_identifier: Option<String>,
    /// For a restored or renewed transaction, the identifier of the original transaction
    pub original_transaction_identifier: Option<String>,
    /// The date and time that the item was purchased
    pub purchase_date: Option<DateTime<Utc>>,
    /// For a restored or renewed transaction, the date of the original transaction
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The expiration date for an auto-renewable subscription
    pub subscription_expiration_date: Option<DateTime<Utc>>,
    /// The primary key identifying subscription purchases
    pub web_order_line_item_id: Option<i64>,
    /// For a transaction refunded by Apple customer support, the time of the refund
    pub cancellation_date: Option<DateTime<Utc>>,
    /// Records this library does not interpret or could not decode
    pub other: Vec<ReceiptAttribute>,
}

impl InAppPurchase {
    /// Decode a purchase from the value of a type `17` attribute
    pub(crate) fn from_der(value: &[u8]) -> Result<Self, DerError> {
        let mut reader = DerReader::new(value);
        let set = reader.read_element()?;
        reader.finish()?;

        let mut purchase = Self::default();
        for attribute in parse_attribute_set(set)? {
            if !purchase.apply(&attribute) {
                purchase.other.push(attribute);
            }
        }
        Ok(purchase)
    }

    /// Store a record in its field; returns `false` if the record was not used
    fn apply(&mut self, attribute: &ReceiptAttribute) -> bool {
        let value = &attribute.value;
        match attribute.kind {
            QUANTITY => set_once(&mut self.quantity, decode_integer(value).ok()),
            PRODUCT_IDENTIFIER => set_once(&mut self.product_identifier, decode_string(value).ok()),
            TRANSACTION_IDENTIFIER => {
                set_once(&mut self.transaction_identifier, decode_string(value).ok())
            }
            ORIGINAL_TRANSACTION_IDENTIFIER => set_once(
                &mut self.original_transaction_identifier,
                decode_string(value).ok(),
            ),
            PURCHASE_DATE => set_once(&mut self.purchase_date, decode_date(value)),
            ORIGINAL_PURCHASE_DATE => set_once(&mut self.original_purchase_date, decode_date(value)),
            SUBSCRIPTION_EXPIRATION_DATE => {
                set_once(&mut self.subscription_expiration_date, decode_date(value))
            }
            WEB_ORDER_LINE_ITEM_ID => {
                set_once(&mut self.web_order_line_item_id, decode_integer(value).ok())
            }
            CANCELLATION_DATE => set_once(&mut self.cancellation_date, decode_date(value)),
            _ => false,
        }
    }

    /// Whether Apple customer support refunded this purchase
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_date.is_some()
    }

    /// Whether this purchase is an auto-renewable subscription that is active at `now`
    pub fn is_active_subscription(&self, now: &DateTime<Utc>) -> bool {
        match self.subscription_expiration_date {
            Some(expiration) => !self.is_cancelled() && expiration > *now,
            None => false,
        }
    }
}

/// Fill `slot` with the first decoded value; later duplicates are left for [`InAppPurchase::other`]
fn set_once<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(value)) => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}

/// Dates for purchases that have not happened, i.e. a missing cancellation, are empty strings
fn decode_date(value: &[u8]) -> Option<DateTime<Utc>> {
    decode_string(value)
        .ok()
        .and_then(|date| parse_receipt_date(&date))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        fixtures::{attribute, attribute_set, ia5, integer, utf8},
        receipt::{container::ReceiptAttribute, in_app::InAppPurchase},
    };

    #[test]
    fn can_parse_purchase() {
        let value = attribute_set(&[
            attribute(1701, 1, &integer(1)),
            attribute(1702, 1, &utf8("com.example.App.pro")),
            attribute(1703, 1, &utf8("1000000012345678")),
            attribute(1705, 1, &utf8("1000000012345678")),
            attribute(1704, 1, &ia5("2013-08-01T07:00:00Z")),
            attribute(1706, 1, &ia5("2013-08-01T07:00:00Z")),
            attribute(1712, 1, &ia5("")),
        ]);
        let purchase = InAppPurchase::from_der(&value).unwrap();

        let date = Utc.with_ymd_and_hms(2013, 8, 1, 7, 0, 0).unwrap();
        let expected = InAppPurchase {
            quantity: Some(1),
            product_identifier: Some("com.example.App.pro".to_string()),
            transaction_identifier: Some("1000000012345678".to_string()),
            original_transaction_identifier: Some("1000000012345678".to_string()),
            purchase_date: Some(date),
            original_purchase_date: Some(date),
            subscription_expiration_date: None,
            web_order_line_item_id: None,
            cancellation_date: None,
            other: vec![ReceiptAttribute {
                kind: 1712,
                version: 1,
                value: ia5(""),
            }],
        };

        assert_eq!(purchase, expected);
        assert!(!purchase.is_cancelled());
    }

    #[test]
    fn can_check_subscription() {
        let value = attribute_set(&[
            attribute(1702, 1, &utf8("com.example.App.monthly")),
            attribute(1708, 1, &ia5("2014-01-01T00:00:00Z")),
            attribute(1711, 1, &integer(1000000000000001)),
        ]);
        let purchase = InAppPurchase::from_der(&value).unwrap();

        assert_eq!(purchase.web_order_line_item_id, Some(1000000000000001));
        let before = Utc.with_ymd_and_hms(2013, 12, 31, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2014, 1, 2, 0, 0, 0).unwrap();
        assert!(purchase.is_active_subscription(&before));
        assert!(!purchase.is_active_subscription(&after));
    }

    #[test]
    fn cancelled_subscription_is_inactive() {
        let value = attribute_set(&[
            attribute(1708, 1, &ia5("2014-01-01T00:00:00Z")),
            attribute(1712, 1, &ia5("2013-12-01T00:00:00Z")),
        ]);
        let purchase = InAppPurchase::from_der(&value).unwrap();

        let before = Utc.with_ymd_and_hms(2013, 12, 31, 0, 0, 0).unwrap();
        assert!(purchase.is_cancelled());
        assert!(!purchase.is_active_subscription(&before));
    }

    #[test]
    fn preserves_unknown_and_duplicate_records() {
        let value = attribute_set(&[
            attribute(1702, 1, &utf8("first")),
            attribute(1702, 1, &utf8("second")),
            attribute(1719, 1, &integer(0)),
        ]);
        let purchase = InAppPurchase::from_der(&value).unwrap();

        assert_eq!(purchase.product_identifier.as_deref(), Some("first"));
        let kinds: Vec<i64> = purchase.other.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![1702, 1719]);
    }

    #[test]
    fn cant_parse_non_set() {
        assert!(InAppPurchase::from_der(&integer(1)).is_err());
        assert!(InAppPurchase::from_der(&[]).is_err());
    }
}
