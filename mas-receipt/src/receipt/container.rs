/*!
 Logic and containers for the raw attribute records stored in a receipt.

 # Internal Representation

 The receipt file is a [`PKCS #7`](https://datatracker.ietf.org/doc/html/rfc2315) `ContentInfo`:

 ```txt
 ContentInfo ::= SEQUENCE {
     contentType  OBJECT IDENTIFIER,          -- signedData
     content      [0] EXPLICIT SignedData
 }
 SignedData ::= SEQUENCE {
     version           INTEGER,
     digestAlgorithms  SET,
     encapContentInfo  SEQUENCE {
         eContentType  OBJECT IDENTIFIER,     -- data
         eContent      [0] EXPLICIT OCTET STRING
     },
     ...
 }
 ```

 The `eContent` octets hold the payload, a set of attribute records:

 ```txt
 Payload ::= SET OF ReceiptAttribute
 ReceiptAttribute ::= SEQUENCE {
     type     INTEGER,
     version  INTEGER,
     value    OCTET STRING
 }
 ```
*/

use crate::{
    error::der::DerError,
    util::der::{DerReader, Element, CONTEXT_0, INTEGER, OBJECT_IDENTIFIER, SEQUENCE, SET},
};

/// `1.2.840.113549.1.7.2`, `PKCS #7` signed data
const OID_SIGNED_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02];
/// `1.2.840.113549.1.7.1`, `PKCS #7` data
const OID_DATA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01];

/// A single tag-length-value record from the receipt payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptAttribute {
    /// The attribute-type code, see [`ReceiptField`](crate::receipt::fields::ReceiptField)
    pub kind: i64,
    /// The attribute version; Apple reserves this field
    pub version: i64,
    /// The value bytes, usually another `DER` element
    pub value: Vec<u8>,
}

/// The decoded receipt: every attribute record, in the order it appears in the file
///
/// Duplicate attribute-type codes are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptContainer {
    attributes: Vec<ReceiptAttribute>,
}

impl ReceiptContainer {
    /// Decode a receipt from the raw file contents
    ///
    /// Both the full `PKCS #7` envelope and the bare attribute set are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DerError> {
        let mut reader = DerReader::new(bytes);
        let root = reader.read_element()?;
        reader.finish()?;

        let attributes = match root.tag {
            SEQUENCE => {
                let payload = unwrap_signed_data(root)?;
                let mut payload_reader = DerReader::new(&payload);
                let set = payload_reader.read_expected(SET)?;
                payload_reader.finish()?;
                parse_attribute_set(set)?
            }
            SET => parse_attribute_set(root)?,
            _ => return Err(DerError::InvalidHeader),
        };

        Ok(Self { attributes })
    }

    /// All attribute records, in file order
    pub fn attributes(&self) -> &[ReceiptAttribute] {
        &self.attributes
    }

    /// The first attribute with the given type code
    pub fn first(&self, kind: i64) -> Option<&ReceiptAttribute> {
        self.attributes.iter().find(|attribute| attribute.kind == kind)
    }

    /// The last attribute with the given type code
    pub fn last(&self, kind: i64) -> Option<&ReceiptAttribute> {
        self.attributes
            .iter()
            .rev()
            .find(|attribute| attribute.kind == kind)
    }

    /// Gets the number of attribute records
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Walk the `PKCS #7` envelope and get the payload octets
///
/// Signatures and certificates are skipped; this only checks the envelope's structure.
fn unwrap_signed_data(content_info: Element) -> Result<Vec<u8>, DerError> {
    let mut content_info = content_info.reader();
    if content_info.read_expected(OBJECT_IDENTIFIER)?.contents != OID_SIGNED_DATA {
        return Err(DerError::InvalidHeader);
    }
    let explicit = content_info.read_expected(CONTEXT_0)?;

    let signed_data = explicit.reader().read_expected(SEQUENCE)?;
    let mut signed_data = signed_data.reader();
    // version
    signed_data.read_expected(INTEGER)?;
    // digestAlgorithms
    signed_data.read_expected(SET)?;

    let encap_content_info = signed_data.read_expected(SEQUENCE)?;
    let mut encap_content_info = encap_content_info.reader();
    if encap_content_info.read_expected(OBJECT_IDENTIFIER)?.contents != OID_DATA {
        return Err(DerError::InvalidHeader);
    }
    let econtent = encap_content_info.read_expected(CONTEXT_0)?;

    let octets = econtent.reader().read_element()?.as_octets()?;
    Ok(octets.into_owned())
}

/// Read every `ReceiptAttribute` in a `SET`
pub(crate) fn parse_attribute_set(set: Element) -> Result<Vec<ReceiptAttribute>, DerError> {
    let set = set.expect(SET)?;
    let mut reader = set.reader();
    let mut attributes = vec![];

    while !reader.is_empty() {
        let record = reader.read_expected(SEQUENCE)?;
        let mut fields = record.reader();

        let kind = fields.read_element()?.as_integer()?;
        let version = fields.read_element()?.as_integer()?;
        let value = fields.read_element()?.as_octets()?.into_owned();
        fields.finish()?;

        attributes.push(ReceiptAttribute {
            kind,
            version,
            value,
        });
    }

    Ok(attributes)
}
