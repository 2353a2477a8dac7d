/*!
 Contains logic to locate the receipt inside an application bundle and read the identity the bundle claims.
*/

use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};

use crate::error::bundle::BundleError;

/// Location of the receipt relative to the bundle root
pub const RECEIPT_PATH: &str = "Contents/_MASReceipt/receipt";
/// Location of the bundle's property list relative to the bundle root
pub const INFO_PLIST_PATH: &str = "Contents/Info.plist";
/// Key holding the bundle identifier in `Info.plist`
pub const BUNDLE_IDENTIFIER_KEY: &str = "CFBundleIdentifier";
/// Key holding the user-visible version in `Info.plist`; this is the version receipts carry
pub const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";
/// Key holding the build number in `Info.plist`
pub const BUNDLE_VERSION_KEY: &str = "CFBundleVersion";

/// Represents an application bundle on disk, i.e. `/Applications/Example.app`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBundle {
    path: PathBuf,
}

/// The identity an application bundle declares in its `Info.plist`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    /// The `CFBundleIdentifier`, i.e. `com.example.App`
    pub identifier: String,
    /// The `CFBundleShortVersionString`, i.e. `1.0`
    pub short_version: Option<String>,
    /// The `CFBundleVersion`, i.e. `42`
    pub version: Option<String>,
}

impl AppBundle {
    /// Open the bundle at `path`; the directory must exist
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(BundleError::NotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// The root directory of the bundle
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the App Store places the receipt inside the bundle
    pub fn receipt_path(&self) -> PathBuf {
        self.path.join(RECEIPT_PATH)
    }

    /// Where the bundle's property list lives
    pub fn info_plist_path(&self) -> PathBuf {
        self.path.join(INFO_PLIST_PATH)
    }

    /// Read the identity declared in the bundle's `Info.plist`
    pub fn info(&self) -> Result<BundleInfo, BundleError> {
        let plist = Value::from_file(self.info_plist_path()).map_err(BundleError::CannotRead)?;
        BundleInfo::from_plist(&plist)
    }
}

impl BundleInfo {
    /// Extract the bundle identity from a parsed `Info.plist`
    pub fn from_plist(plist: &Value) -> Result<Self, BundleError> {
        let root = plist.as_dictionary().ok_or_else(|| {
            BundleError::InvalidType("root".to_string(), "dictionary".to_string())
        })?;

        Ok(Self {
            identifier: extract_string_key(root, BUNDLE_IDENTIFIER_KEY)?
                .ok_or_else(|| BundleError::MissingKey(BUNDLE_IDENTIFIER_KEY.to_string()))?,
            short_version: extract_string_key(root, SHORT_VERSION_KEY)?,
            version: extract_string_key(root, BUNDLE_VERSION_KEY)?,
        })
    }
}

/// Get a string value from a dictionary, failing if the key holds something else
fn extract_string_key(dictionary: &Dictionary, key: &str) -> Result<Option<String>, BundleError> {
    match dictionary.get(key) {
        Some(value) => value
            .as_string()
            .map(|value| Some(value.to_string()))
            .ok_or_else(|| BundleError::InvalidType(key.to_string(), "string".to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::env::current_dir;

    use plist::{Dictionary, Value};

    use crate::{
        error::bundle::BundleError,
        util::bundle::{AppBundle, BundleInfo},
    };

    #[test]
    fn can_read_bundle_info() {
        let bundle_path = current_dir()
            .unwrap()
            .as_path()
            .join("test_data/bundle/Example.app");
        let bundle = AppBundle::new(&bundle_path).unwrap();

        assert_eq!(
            bundle.receipt_path(),
            bundle_path.join("Contents/_MASReceipt/receipt")
        );

        let expected = BundleInfo {
            identifier: "com.example.App".to_string(),
            short_version: Some("1.0".to_string()),
            version: Some("42".to_string()),
        };
        assert_eq!(bundle.info().unwrap(), expected);
    }

    #[test]
    fn cant_open_missing_bundle() {
        let bundle_path = current_dir()
            .unwrap()
            .as_path()
            .join("test_data/bundle/Missing.app");
        assert!(matches!(
            AppBundle::new(bundle_path),
            Err(BundleError::NotFound(_))
        ));
    }

    #[test]
    fn cant_read_missing_info_plist() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = AppBundle::new(dir.path()).unwrap();
        assert!(matches!(bundle.info(), Err(BundleError::CannotRead(_))));
    }

    #[test]
    fn can_read_info_without_versions() {
        let mut root = Dictionary::new();
        root.insert(
            "CFBundleIdentifier".to_string(),
            Value::String("com.example.App".to_string()),
        );
        let info = BundleInfo::from_plist(&Value::Dictionary(root)).unwrap();

        assert_eq!(info.identifier, "com.example.App");
        assert!(info.short_version.is_none());
        assert!(info.version.is_none());
    }

    #[test]
    fn cant_read_info_without_identifier() {
        let info = BundleInfo::from_plist(&Value::Dictionary(Dictionary::new()));
        assert!(matches!(info, Err(BundleError::MissingKey(key)) if key == "CFBundleIdentifier"));
    }

    #[test]
    fn cant_read_info_with_wrong_types() {
        let mut root = Dictionary::new();
        root.insert("CFBundleIdentifier".to_string(), Value::Boolean(true));
        let info = BundleInfo::from_plist(&Value::Dictionary(root));
        assert!(matches!(info, Err(BundleError::InvalidType(..))));

        let info = BundleInfo::from_plist(&Value::Array(vec![]));
        assert!(matches!(info, Err(BundleError::InvalidType(..))));
    }
}
