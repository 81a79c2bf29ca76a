//! Exact wire bytes, field ordering and decode failures of the payload codec.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(non_snake_case)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use dualcast_core::protocol::payload::{self, ticks_to_utc, utc_to_ticks, Decimal128, FieldOrder};
use dualcast_core::{payload_object, ErrorKind};

#[derive(Debug, PartialEq)]
struct ChatLine {
    timestamp: DateTime<Utc>,
    text: String,
}

// Declared out of order on purpose: wire order is by name.
payload_object!(ChatLine { timestamp: DateTime<Utc>, text: String });

#[derive(Debug, PartialEq)]
struct Profile {
    zeta: u8,
    alpha: u8,
    user_id: u8,
    username: u8,
    Mid: u8,
}

payload_object!(Profile { zeta: u8, alpha: u8, user_id: u8, username: u8, Mid: u8 });

fn hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[test]
fn primitive_layout_is_little_endian() {
    assert_eq!(hex(&payload::to_bytes(&true)), "01");
    assert_eq!(hex(&payload::to_bytes(&0x0102i16)), "0201");
    assert_eq!(hex(&payload::to_bytes(&1i32)), "01000000");
    assert_eq!(hex(&payload::to_bytes(&-1i64)), "ffffffffffffffff");
    assert_eq!(hex(&payload::to_bytes(&1.0f32)), "0000803f");
}

#[test]
fn text_and_options() {
    assert_eq!(hex(&payload::to_bytes(&String::from("hi"))), "020000006869");
    assert_eq!(hex(&payload::to_bytes(&None::<String>)), "ffffffff");
    assert_eq!(hex(&payload::to_bytes(&Some(String::from("hi")))), "020000006869");
    assert_eq!(hex(&payload::to_bytes(&None::<i32>)), "00");
    assert_eq!(hex(&payload::to_bytes(&Some(5i32))), "0105000000");
    assert_eq!(hex(&payload::to_bytes(&None::<Vec<i32>>)), "00");
}

#[test]
fn collections_carry_presence_and_count() {
    assert_eq!(
        hex(&payload::to_bytes(&vec![1i32, 2])),
        "01020000000100000002000000"
    );
    assert_eq!(hex(&payload::to_bytes(&HashMap::<String, i32>::new())), "0100000000");
    assert_eq!(hex(&payload::to_bytes(&(7i32, String::from("x")))), "070000000100000078");
}

#[test]
fn uuid_uses_guid_byte_layout() {
    let id = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
    assert_eq!(
        hex(&payload::to_bytes(&id)),
        "33221100554477668899aabbccddeeff"
    );
}

#[test]
fn decimal_is_four_words() {
    let d = Decimal128::new(15, 1).unwrap();
    assert_eq!(
        hex(&payload::to_bytes(&d)),
        "0f000000000000000000000000000100"
    );
}

#[test]
fn instants_are_ticks_since_year_one() {
    let at = ticks_to_utc(638_000_000_000_000_000).unwrap();
    assert_eq!(at.to_rfc3339(), "2022-09-28T22:13:20+00:00");
    assert_eq!(utc_to_ticks(&at), 638_000_000_000_000_000);
    assert_eq!(hex(&payload::to_bytes(&at)), "0000b3a69ea1da08");
    assert_eq!(utc_to_ticks(&DateTime::<Utc>::from_timestamp(0, 0).unwrap()), 621_355_968_000_000_000);
}

#[test]
fn object_fields_follow_name_order() {
    let line = ChatLine {
        text: String::from("hi"),
        timestamp: ticks_to_utc(638_000_000_000_000_000).unwrap(),
    };
    let bytes = payload::to_bytes(&line);
    // presence, then `text`, then `timestamp`
    assert_eq!(hex(&bytes), "01020000006869".to_owned() + "0000b3a69ea1da08");

    let p = Profile { zeta: 1, alpha: 2, user_id: 3, username: 4, Mid: 5 };
    // byte order: "Mid" < "alpha" < "user_id" < "username" < "zeta"
    assert_eq!(hex(&payload::to_bytes(&p)), "010502030401");
}

#[test]
fn encoding_is_deterministic() {
    let line = ChatLine {
        text: String::from("same"),
        timestamp: ticks_to_utc(1).unwrap(),
    };
    let first = payload::to_bytes(&line);
    for _ in 0..10 {
        assert_eq!(payload::to_bytes(&line), first);
    }
}

#[test]
fn field_order_does_not_depend_on_cache_state() {
    static A: FieldOrder = FieldOrder::new(&["b", "c", "a"]);
    let b = FieldOrder::new(&["c", "a", "b"]);
    assert_eq!(A.names(), ["a", "b", "c"]);
    assert_eq!(A.names(), b.names());
}

#[test]
fn truncated_and_inconsistent_input_fails() {
    let cases: Vec<(&str, Vec<u8>)> = vec![
        ("empty buffer as i32", vec![]),
        ("short i32", vec![1, 0]),
    ];
    for (name, raw) in cases {
        let err = payload::from_bytes::<i32>(&raw).expect_err(name);
        assert_eq!(err.kind(), ErrorKind::Decode, "{name}");
    }

    // count says 3 elements, only one present
    let err = payload::from_bytes::<Vec<i32>>(&hex::decode("010300000001000000").unwrap())
        .expect_err("count past end");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // string length past the end
    let err = payload::from_bytes::<String>(&hex::decode("0a00000068").unwrap())
        .expect_err("length past end");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // null string into a required field
    let err = payload::from_bytes::<String>(&hex::decode("ffffffff").unwrap())
        .expect_err("null into String");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // absent collection into a required field
    let err = payload::from_bytes::<Vec<u8>>(&[0]).expect_err("null into Vec");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // negative count
    let err = payload::from_bytes::<Vec<u8>>(&hex::decode("01ffffffff").unwrap())
        .expect_err("negative count");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // trailing bytes
    let err = payload::from_bytes::<u8>(&[1, 2]).expect_err("trailing");
    assert_eq!(err.kind(), ErrorKind::Decode);

    // array length mismatch
    let err = payload::from_bytes::<[u8; 2]>(&hex::decode("0103000000010203").unwrap())
        .expect_err("array length");
    assert_eq!(err.kind(), ErrorKind::Decode);
}
