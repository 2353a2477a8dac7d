/*!
 Builders for synthetic receipts used across the test suite.
*/

use crate::{
    receipt::validation::identity_hash,
    util::der::{
        CONTEXT_0, IA5_STRING, INTEGER, OBJECT_IDENTIFIER, OCTET_STRING, SEQUENCE, SET,
        UTF8_STRING,
    },
};

/// The machine identifier the fixtures under `test_data` were issued for
pub(crate) const MACHINE_ID: [u8; 6] = [0x00, 0x1b, 0x63, 0x84, 0x45, 0xe6];
/// The opaque value the fixtures under `test_data` carry
pub(crate) const OPAQUE_VALUE: [u8; 16] = [
    0x5f, 0x1c, 0x3b, 0x9a, 0x02, 0x44, 0x7e, 0xd1, 0x88, 0x10, 0xc3, 0x6b, 0x29, 0xf0, 0x4d, 0x95,
];

/// Encode a single element
pub(crate) fn tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = contents.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let len_bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|byte| *byte == 0)
            .collect();
        out.push(0x80 | len_bytes.len() as u8);
        out.extend(len_bytes);
    }
    out.extend_from_slice(contents);
    out
}

/// Encode a minimal two's complement `INTEGER`
pub(crate) fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(INTEGER, &bytes[start..])
}

pub(crate) fn utf8(text: &str) -> Vec<u8> {
    tlv(UTF8_STRING, text.as_bytes())
}

pub(crate) fn ia5(text: &str) -> Vec<u8> {
    tlv(IA5_STRING, text.as_bytes())
}

pub(crate) fn octets(bytes: &[u8]) -> Vec<u8> {
    tlv(OCTET_STRING, bytes)
}

/// Encode a `ReceiptAttribute` record
pub(crate) fn attribute(kind: i64, version: i64, value: &[u8]) -> Vec<u8> {
    let mut contents = integer(kind);
    contents.extend(integer(version));
    contents.extend(octets(value));
    tlv(SEQUENCE, &contents)
}

/// Encode a set of already encoded records
pub(crate) fn attribute_set(records: &[Vec<u8>]) -> Vec<u8> {
    tlv(SET, &records.concat())
}

/// Wrap a payload in a `PKCS #7` signed data envelope without any signer
pub(crate) fn pkcs7(payload: &[u8]) -> Vec<u8> {
    let signed_data_oid = tlv(
        OBJECT_IDENTIFIER,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x02],
    );
    let data_oid = tlv(
        OBJECT_IDENTIFIER,
        &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x07, 0x01],
    );

    let encap_content_info = tlv(
        SEQUENCE,
        &[data_oid, tlv(CONTEXT_0, &octets(payload))].concat(),
    );
    let signed_data = tlv(
        SEQUENCE,
        &[integer(1), tlv(SET, &[]), encap_content_info, tlv(SET, &[])].concat(),
    );
    tlv(
        SEQUENCE,
        &[signed_data_oid, tlv(CONTEXT_0, &signed_data)].concat(),
    )
}

/// Build a signed receipt for `bundle_identifier` whose identity hash matches `machine_id`
pub(crate) fn signed_receipt(bundle_identifier: &str, version: &str, machine_id: &[u8]) -> Vec<u8> {
    let bundle_identifier = utf8(bundle_identifier);
    let hash = identity_hash(machine_id, &OPAQUE_VALUE, &bundle_identifier);
    pkcs7(&attribute_set(&[
        attribute(2, 1, &bundle_identifier),
        attribute(3, 1, &utf8(version)),
        attribute(4, 1, &OPAQUE_VALUE),
        attribute(5, 1, &hash),
        attribute(12, 1, &ia5("2013-08-01T07:00:00Z")),
    ]))
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{integer, tlv};

    #[test]
    fn can_encode_integers() {
        assert_eq!(integer(0), vec![0x02, 0x01, 0x00]);
        assert_eq!(integer(128), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(integer(1701), vec![0x02, 0x02, 0x06, 0xA5]);
        assert_eq!(integer(-1), vec![0x02, 0x01, 0xFF]);
    }

    #[test]
    fn can_encode_long_lengths() {
        let encoded = tlv(0x04, &[0; 300]);
        assert_eq!(&encoded[..4], &[0x04, 0x82, 0x01, 0x2C]);
        assert_eq!(encoded.len(), 304);
    }
}
