/*!
 The semantic view of a receipt: attribute-type codes mapped to named, decoded values.

 The main data type used to represent this view is [`ReceiptAttributes`].
*/

use std::{
    borrow::Cow,
    fmt::{Display, Formatter, Result as FmtResult},
};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::der::DerError,
    receipt::{
        container::{ReceiptAttribute, ReceiptContainer},
        in_app::InAppPurchase,
    },
    util::{dates::parse_receipt_date, der::DerReader},
};

/// The meaning of an attribute-type code
///
/// Apple documents the receipt fields [here](https://developer.apple.com/library/archive/releasenotes/General/ValidateAppStoreReceipt/Chapters/ReceiptFields.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReceiptField {
    /// The environment the receipt was issued in, i.e. `Production`
    ReceiptType,
    /// The app's bundle identifier, matches `CFBundleIdentifier`
    BundleIdentifier,
    /// The app's version, matches `CFBundleShortVersionString` on macOS
    AppVersion,
    /// An opaque value used, with other data, to compute the identity hash
    OpaqueValue,
    /// The SHA-1 identity hash
    Hash,
    /// The date the receipt was created
    CreationDate,
    /// The receipt for a single in-app purchase
    InAppPurchases,
    /// The version of the app that was originally purchased
    OriginalAppVersion,
    /// The date the receipt expires
    ExpirationDate,
    /// An attribute-type code this library does not interpret
    Unknown(i64),
}

impl ReceiptField {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::ReceiptType,
            2 => Self::BundleIdentifier,
            3 => Self::AppVersion,
            4 => Self::OpaqueValue,
            5 => Self::Hash,
            12 => Self::CreationDate,
            17 => Self::InAppPurchases,
            19 => Self::OriginalAppVersion,
            21 => Self::ExpirationDate,
            other => Self::Unknown(other),
        }
    }

    /// The attribute-type code stored in the receipt
    pub fn code(&self) -> i64 {
        match self {
            Self::ReceiptType => 0,
            Self::BundleIdentifier => 2,
            Self::AppVersion => 3,
            Self::OpaqueValue => 4,
            Self::Hash => 5,
            Self::CreationDate => 12,
            Self::InAppPurchases => 17,
            Self::OriginalAppVersion => 19,
            Self::ExpirationDate => 21,
            Self::Unknown(code) => *code,
        }
    }

    /// The key used for this field in the attribute mapping
    ///
    /// Unknown fields are keyed by their code, i.e. `attribute42`.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::ReceiptType => Cow::Borrowed("receiptType"),
            Self::BundleIdentifier => Cow::Borrowed("bundleIdentifier"),
            Self::AppVersion => Cow::Borrowed("appVersion"),
            Self::OpaqueValue => Cow::Borrowed("opaqueValue"),
            Self::Hash => Cow::Borrowed("hash"),
            Self::CreationDate => Cow::Borrowed("creationDate"),
            Self::InAppPurchases => Cow::Borrowed("inAppPurchases"),
            Self::OriginalAppVersion => Cow::Borrowed("originalAppVersion"),
            Self::ExpirationDate => Cow::Borrowed("expirationDate"),
            Self::Unknown(code) => Cow::Owned(format!("attribute{code}")),
        }
    }

    /// Given a key from the attribute mapping, return the field it names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "receiptType" => Some(Self::ReceiptType),
            "bundleIdentifier" => Some(Self::BundleIdentifier),
            "appVersion" => Some(Self::AppVersion),
            "opaqueValue" => Some(Self::OpaqueValue),
            "hash" => Some(Self::Hash),
            "creationDate" => Some(Self::CreationDate),
            "inAppPurchases" => Some(Self::InAppPurchases),
            "originalAppVersion" => Some(Self::OriginalAppVersion),
            "expirationDate" => Some(Self::ExpirationDate),
            other => other
                .strip_prefix("attribute")
                .and_then(|code| code.parse::<i64>().ok())
                .map(Self::from_code),
        }
    }
}

impl Display for ReceiptField {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.name())
    }
}

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text data
    String(String),
    /// Opaque bytes, or a value this library could not interpret
    Bytes(Vec<u8>),
    /// A timestamp
    Date(DateTime<Utc>),
    /// A nested in-app purchase receipt
    Purchase(InAppPurchase),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_purchase(&self) -> Option<&InAppPurchase> {
        match self {
            Self::Purchase(purchase) => Some(purchase),
            _ => None,
        }
    }

    /// Interpret an attribute according to the meaning of its type code
    ///
    /// Values that do not have the expected encoding are kept as [`FieldValue::Bytes`].
    fn decode(field: &ReceiptField, attribute: &ReceiptAttribute) -> Self {
        let decoded = match field {
            ReceiptField::ReceiptType
            | ReceiptField::BundleIdentifier
            | ReceiptField::AppVersion
            | ReceiptField::OriginalAppVersion => decode_string(&attribute.value).map(Self::String),
            ReceiptField::CreationDate | ReceiptField::ExpirationDate => {
                decode_string(&attribute.value).map(|text| match parse_receipt_date(&text) {
                    Some(date) => Self::Date(date),
                    None => Self::String(text),
                })
            }
            ReceiptField::InAppPurchases => {
                InAppPurchase::from_der(&attribute.value).map(Self::Purchase)
            }
            ReceiptField::OpaqueValue | ReceiptField::Hash | ReceiptField::Unknown(_) => {
                Ok(Self::Bytes(attribute.value.clone()))
            }
        };

        decoded.unwrap_or_else(|why| {
            debug!(field = %field, %why, "keeping undecodable receipt field as bytes");
            Self::Bytes(attribute.value.clone())
        })
    }
}

/// Read a value that holds a single `DER` string element
pub(crate) fn decode_string(value: &[u8]) -> Result<String, DerError> {
    let mut reader = DerReader::new(value);
    let element = reader.read_element()?;
    reader.finish()?;
    element.as_string().map(String::from)
}

/// Read a value that holds a single `DER` integer element
pub(crate) fn decode_integer(value: &[u8]) -> Result<i64, DerError> {
    let mut reader = DerReader::new(value);
    let element = reader.read_element()?;
    reader.finish()?;
    element.as_integer()
}

/// The attributes of a receipt, keyed by [`ReceiptField`], in file order
///
/// # Background
///
/// Canonical receipts contain each attribute-type code once, except for in-app purchases which
/// appear once per purchase. Duplicates are preserved; [`get()`](Self::get) returns the first
/// occurrence and [`get_last()`](Self::get_last) the last. Fields missing from the receipt are
/// missing here too.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiptAttributes {
    entries: Vec<(ReceiptField, FieldValue)>,
    /// The undecoded value of the first bundle identifier, as the identity hash covers it
    bundle_identifier_bytes: Option<Vec<u8>>,
}

impl From<&ReceiptContainer> for ReceiptAttributes {
    fn from(container: &ReceiptContainer) -> Self {
        Self {
            bundle_identifier_bytes: container
                .first(ReceiptField::BundleIdentifier.code())
                .map(|attribute| attribute.value.clone()),
            entries: container
                .attributes()
                .iter()
                .map(|attribute| {
                    let field = ReceiptField::from_code(attribute.kind);
                    let value = FieldValue::decode(&field, attribute);
                    (field, value)
                })
                .collect(),
        }
    }
}

impl ReceiptAttributes {
    /// The first value stored for `field`
    pub fn get(&self, field: ReceiptField) -> Option<&FieldValue> {
        self.get_all(field).next()
    }

    /// The last value stored for `field`
    pub fn get_last(&self, field: ReceiptField) -> Option<&FieldValue> {
        self.get_all(field).last()
    }

    /// Every value stored for `field`, in file order
    pub fn get_all(&self, field: ReceiptField) -> impl Iterator<Item = &FieldValue> {
        self.entries
            .iter()
            .filter(move |(key, _)| *key == field)
            .map(|(_, value)| value)
    }

    /// The first value stored under a mapping key, i.e. `bundleIdentifier`
    pub fn get_by_name(&self, name: &str) -> Option<&FieldValue> {
        ReceiptField::from_name(name).and_then(|field| self.get(field))
    }

    pub fn contains(&self, field: ReceiptField) -> bool {
        self.get(field).is_some()
    }

    /// Iterate over every field and value, in file order
    pub fn iter(&self) -> impl Iterator<Item = (&ReceiptField, &FieldValue)> {
        self.entries.iter().map(|(field, value)| (field, value))
    }

    /// Gets the number of attributes, including duplicates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bundle_identifier(&self) -> Option<&str> {
        self.get(ReceiptField::BundleIdentifier)
            .and_then(FieldValue::as_str)
    }

    /// The raw `DER` encoding of the bundle identifier, including its tag and length
    pub fn bundle_identifier_bytes(&self) -> Option<&[u8]> {
        self.bundle_identifier_bytes.as_deref()
    }

    pub fn app_version(&self) -> Option<&str> {
        self.get(ReceiptField::AppVersion).and_then(FieldValue::as_str)
    }

    pub fn original_app_version(&self) -> Option<&str> {
        self.get(ReceiptField::OriginalAppVersion)
            .and_then(FieldValue::as_str)
    }

    pub fn receipt_type(&self) -> Option<&str> {
        self.get(ReceiptField::ReceiptType).and_then(FieldValue::as_str)
    }

    pub fn opaque_value(&self) -> Option<&[u8]> {
        self.get(ReceiptField::OpaqueValue)
            .and_then(FieldValue::as_bytes)
    }

    pub fn hash(&self) -> Option<&[u8]> {
        self.get(ReceiptField::Hash).and_then(FieldValue::as_bytes)
    }

    pub fn creation_date(&self) -> Option<&DateTime<Utc>> {
        self.get(ReceiptField::CreationDate)
            .and_then(FieldValue::as_date)
    }

    pub fn expiration_date(&self) -> Option<&DateTime<Utc>> {
        self.get(ReceiptField::ExpirationDate)
            .and_then(FieldValue::as_date)
    }

    /// Every in-app purchase in the receipt, in file order
    pub fn in_app_purchases(&self) -> Vec<&InAppPurchase> {
        self.get_all(ReceiptField::InAppPurchases)
            .filter_map(FieldValue::as_purchase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::env::current_dir;

    use chrono::{TimeZone, Utc};

    use crate::{
        fixtures::{attribute, attribute_set, ia5, integer, utf8, OPAQUE_VALUE},
        receipt::{
            container::ReceiptContainer,
            fields::{FieldValue, ReceiptAttributes, ReceiptField},
        },
    };

    fn attributes_from(bytes: &[u8]) -> ReceiptAttributes {
        ReceiptAttributes::from(&ReceiptContainer::from_bytes(bytes).unwrap())
    }

    #[test]
    fn can_round_trip_codes() {
        for code in [0, 2, 3, 4, 5, 12, 17, 19, 21, 1, 42, -3] {
            assert_eq!(ReceiptField::from_code(code).code(), code);
        }
    }

    #[test]
    fn can_look_up_names() {
        assert_eq!(
            ReceiptField::from_name("bundleIdentifier"),
            Some(ReceiptField::BundleIdentifier)
        );
        assert_eq!(
            ReceiptField::from_name("attribute42"),
            Some(ReceiptField::Unknown(42))
        );
        assert_eq!(
            ReceiptField::from_name("attribute2"),
            Some(ReceiptField::BundleIdentifier)
        );
        assert_eq!(ReceiptField::from_name("attribute"), None);
        assert_eq!(ReceiptField::from_name("nonsense"), None);
        assert_eq!(ReceiptField::Unknown(42).to_string(), "attribute42");
        assert_eq!(ReceiptField::AppVersion.to_string(), "appVersion");
    }

    #[test]
    fn can_decode_bundle_identity() {
        let attributes = attributes_from(&attribute_set(&[
            attribute(2, 1, &utf8("com.example.App")),
            attribute(3, 1, &utf8("1.0")),
        ]));

        assert_eq!(attributes.bundle_identifier(), Some("com.example.App"));
        assert_eq!(attributes.app_version(), Some("1.0"));
        assert_eq!(
            attributes.get_by_name("bundleIdentifier"),
            Some(&FieldValue::String("com.example.App".to_string()))
        );
        assert_eq!(
            attributes.get_by_name("appVersion"),
            Some(&FieldValue::String("1.0".to_string()))
        );
        assert_eq!(
            attributes.bundle_identifier_bytes(),
            Some(utf8("com.example.App").as_slice())
        );
        assert!(!attributes.contains(ReceiptField::Hash));
        assert!(attributes.hash().is_none());
    }

    #[test]
    fn can_decode_fixture() {
        let receipt_path = current_dir()
            .unwrap()
            .as_path()
            .join("test_data/receipt/Valid");
        let bytes = std::fs::read(receipt_path).unwrap();
        let attributes = attributes_from(&bytes);

        assert_eq!(attributes.len(), 9);
        assert_eq!(attributes.receipt_type(), Some("ProductionSandbox"));
        assert_eq!(attributes.bundle_identifier(), Some("com.example.App"));
        assert_eq!(attributes.app_version(), Some("1.0"));
        assert_eq!(attributes.original_app_version(), Some("1.0"));
        assert_eq!(attributes.opaque_value(), Some(OPAQUE_VALUE.as_slice()));
        assert_eq!(attributes.hash().map(<[u8]>::len), Some(20));
        assert_eq!(
            attributes.creation_date(),
            Some(&Utc.with_ymd_and_hms(2013, 8, 1, 7, 0, 0).unwrap())
        );
        assert_eq!(attributes.in_app_purchases().len(), 1);
        assert_eq!(
            attributes.get(ReceiptField::Unknown(42)),
            Some(&FieldValue::Bytes(vec![0xCA, 0xFE]))
        );
    }

    #[test]
    fn preserves_unknown_fields() {
        let attributes = attributes_from(&attribute_set(&[
            attribute(2, 1, &utf8("com.example.App")),
            attribute(1000, 1, &[1, 2, 3]),
        ]));

        assert_eq!(
            attributes.get_by_name("attribute1000"),
            Some(&FieldValue::Bytes(vec![1, 2, 3]))
        );
        let keys: Vec<String> = attributes
            .iter()
            .map(|(field, _)| field.name().into_owned())
            .collect();
        assert_eq!(keys, vec!["bundleIdentifier", "attribute1000"]);
    }

    #[test]
    fn selects_first_and_last_duplicate() {
        let attributes = attributes_from(&attribute_set(&[
            attribute(3, 1, &utf8("1.0")),
            attribute(3, 1, &utf8("2.0")),
        ]));

        assert_eq!(attributes.app_version(), Some("1.0"));
        assert_eq!(
            attributes.get_last(ReceiptField::AppVersion),
            Some(&FieldValue::String("2.0".to_string()))
        );
        assert_eq!(attributes.get_all(ReceiptField::AppVersion).count(), 2);
    }

    #[test]
    fn keeps_undecodable_values_as_bytes() {
        // A bundle identifier that is not wrapped in a string element
        let attributes = attributes_from(&attribute_set(&[attribute(
            2,
            1,
            b"com.example.App",
        )]));

        assert!(attributes.bundle_identifier().is_none());
        assert_eq!(
            attributes.get(ReceiptField::BundleIdentifier),
            Some(&FieldValue::Bytes(b"com.example.App".to_vec()))
        );
    }

    #[test]
    fn keeps_unparseable_dates_as_strings() {
        let attributes = attributes_from(&attribute_set(&[
            attribute(12, 1, &ia5("")),
            attribute(21, 1, &ia5("2014-01-01T00:00:00Z")),
        ]));

        assert_eq!(
            attributes.get(ReceiptField::CreationDate),
            Some(&FieldValue::String(String::new()))
        );
        assert!(attributes.creation_date().is_none());
        assert_eq!(
            attributes.expiration_date(),
            Some(&Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn keeps_invalid_purchase_as_bytes() {
        let attributes = attributes_from(&attribute_set(&[attribute(17, 1, &integer(1))]));

        assert!(attributes.in_app_purchases().is_empty());
        assert_eq!(
            attributes.get(ReceiptField::InAppPurchases),
            Some(&FieldValue::Bytes(integer(1)))
        );
    }

    #[test]
    fn empty_receipt_has_no_fields() {
        let attributes = attributes_from(&attribute_set(&[]));
        assert!(attributes.is_empty());
        assert!(attributes.bundle_identifier().is_none());
        assert!(attributes.app_version().is_none());
    }
}
