//! Property-based tests for the mozLz4 codec.
//!
//! Any payload survives an encode/decode round trip, and damaged containers
//! fail closed instead of yielding a partial payload.

use arc2zen::services::mozlz4::{decode, decode_json, encode, encode_json, MAGIC};
use arc2zen::types::errors::CodecError;
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_session_like() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,12}", "https://[a-z]{1,10}\\.test/[a-z0-9]{0,8}", any::<bool>()), 0..20)
        .prop_map(|tabs| {
            let tabs: Vec<Value> = tabs
                .into_iter()
                .map(|(title, url, pinned)| {
                    json!({"entries": [{"url": url, "title": title}], "index": 1, "pinned": pinned})
                })
                .collect();
            json!({"version": ["sessionrestore", 1], "windows": [{"tabs": tabs}]})
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_bytes_round_trip(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let encoded = encode(&payload).unwrap();
        prop_assert_eq!(&encoded[..8], &MAGIC[..]);
        prop_assert_eq!(decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn prop_encode_is_deterministic(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(encode(&payload).unwrap(), encode(&payload).unwrap());
    }

    #[test]
    fn prop_json_round_trip(doc in arb_session_like()) {
        let encoded = encode_json(&doc).unwrap();
        let decoded: Value = decode_json(&encoded).unwrap();
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn prop_damaged_magic_is_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..512),
        at in 0usize..8,
        flip in 1u8..=255,
    ) {
        let mut encoded = encode(&payload).unwrap();
        encoded[at] ^= flip;
        prop_assert!(matches!(decode(&encoded), Err(CodecError::BadMagic)));
    }

    #[test]
    fn prop_truncated_block_is_rejected(payload in prop::collection::vec(any::<u8>(), 1..1024)) {
        let encoded = encode(&payload).unwrap();
        prop_assert!(decode(&encoded[..encoded.len() - 1]).is_err());
    }

    #[test]
    fn prop_wrong_declared_length_is_rejected(
        payload in prop::collection::vec(any::<u8>(), 1..1024),
        grow in any::<bool>(),
    ) {
        let mut encoded = encode(&payload).unwrap();
        let declared = if grow { payload.len() + 1 } else { payload.len() - 1 };
        encoded[8..12].copy_from_slice(&(declared as u32).to_le_bytes());
        prop_assert!(decode(&encoded).is_err());
    }
}

#[test]
fn short_header_is_truncated() {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&[1, 0]);
    assert!(matches!(decode(&bytes), Err(CodecError::Truncated(10))));
}

#[test]
fn absurd_declared_length_is_refused_before_decompressing() {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(&[0x10, b'a']);
    assert!(matches!(decode(&bytes), Err(CodecError::LengthMismatch { .. })));
}
