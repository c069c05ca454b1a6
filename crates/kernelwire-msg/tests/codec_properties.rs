//! Property-based tests for the envelope codec.
//!
//! - decode(encode(m)) == m for every key, including the empty one
//! - any change to a signed frame is rejected under a non-empty key
//! - an empty key accepts whatever sits in the signature frame

use bytes::Bytes;
use kernelwire_msg::{decode, encode_envelope, Header, Message, Signer, WireError, DELIMITER};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn header_strategy() -> impl Strategy<Value = Header> {
    ("[a-f0-9-]{1,36}", ".{0,16}", ".{0,16}", "[a-z_]{1,24}").prop_map(
        |(msg_id, username, session, msg_type)| Header {
            msg_id,
            username,
            session,
            msg_type,
        },
    )
}

// Zero header for unsolicited messages, or a real one.
fn parent_strategy() -> impl Strategy<Value = Header> {
    prop_oneof![Just(Header::default()), header_strategy()]
}

// Arbitrary JSON, nested a few levels: floats, bools, arrays, objects
// and non-ASCII keys all included.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |f| f.is_finite())
            .prop_map(Value::from),
        "\\PC{0,16}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("\\PC{0,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn content_strategy() -> impl Strategy<Value = Value> {
    json_strategy()
}

fn metadata_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("\\PC{0,8}", json_strategy(), 0..4)
        .prop_map(|m| m.into_iter().collect())
}

fn message_strategy() -> impl Strategy<Value = Message> {
    (
        header_strategy(),
        parent_strategy(),
        metadata_strategy(),
        content_strategy(),
    )
        .prop_map(|(header, parent_header, metadata, content)| Message {
            header,
            parent_header,
            metadata,
            content,
            buffers: Vec::new(),
        })
}

fn identities_strategy() -> impl Strategy<Value = Vec<Bytes>> {
    prop::collection::vec(
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_filter("identity must not be the delimiter", |id| id != DELIMITER)
            .prop_map(Bytes::from),
        0..4,
    )
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

#[test]
fn prop_roundtrip_for_any_key() {
    proptest!(|(
        key in key_strategy(),
        identities in identities_strategy(),
        msg in message_strategy(),
    )| {
        let signer = Signer::new(&key).unwrap();
        let frames = encode_envelope(&identities, &msg, &signer).unwrap();

        let (decoded, ids) = decode(&frames, &signer).unwrap();
        prop_assert_eq!(decoded, msg);
        prop_assert_eq!(ids, identities);
    });
}

#[test]
fn prop_flipped_bit_in_signed_frame_is_rejected() {
    proptest!(|(
        key in prop::collection::vec(any::<u8>(), 1..64),
        msg in message_strategy(),
        frame in 0usize..4,
        byte_seed in any::<usize>(),
        bit in 0u8..8,
    )| {
        let signer = Signer::new(&key).unwrap();
        let mut frames = encode_envelope(&[], &msg, &signer).unwrap();

        // Layout: delimiter, signature, then the four signed frames.
        let target = 2 + frame;
        let mut tampered = frames[target].to_vec();
        let idx = byte_seed % tampered.len();
        tampered[idx] ^= 1 << bit;
        frames[target] = Bytes::from(tampered);

        let err = decode(&frames, &signer).unwrap_err();
        prop_assert!(matches!(err, WireError::Signature(_)));
    });
}

#[test]
fn prop_flipped_bit_in_signature_is_rejected() {
    proptest!(|(
        key in prop::collection::vec(any::<u8>(), 1..64),
        msg in message_strategy(),
        byte_seed in any::<usize>(),
        bit in 0u8..8,
    )| {
        let signer = Signer::new(&key).unwrap();
        let mut frames = encode_envelope(&[], &msg, &signer).unwrap();

        let mut sig = frames[1].to_vec();
        let idx = byte_seed % sig.len();
        sig[idx] ^= 1 << bit;
        frames[1] = Bytes::from(sig);

        prop_assert!(decode(&frames, &signer).unwrap_err().is_signature_error());
    });
}

#[test]
fn prop_empty_key_accepts_any_signature_frame() {
    proptest!(|(
        msg in message_strategy(),
        junk in prop::collection::vec(any::<u8>(), 0..80),
    )| {
        let signer = Signer::unauthenticated();
        let mut frames = encode_envelope(&[], &msg, &signer).unwrap();
        prop_assert!(frames[1].is_empty());

        frames[1] = Bytes::from(junk);
        let (decoded, _) = decode(&frames, &signer).unwrap();
        prop_assert_eq!(decoded, msg);
    });
}

#[test]
fn prop_decode_never_panics_on_arbitrary_frames() {
    proptest!(|(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..10),
        with_delimiter in any::<bool>(),
        key in key_strategy(),
    )| {
        let signer = Signer::new(&key).unwrap();
        let mut frames: Vec<Bytes> = frames.into_iter().map(Bytes::from).collect();
        if with_delimiter {
            let at = frames.len() / 2;
            frames.insert(at, Bytes::from_static(DELIMITER));
        }
        let _ = decode(&frames, &signer);
    });
}
