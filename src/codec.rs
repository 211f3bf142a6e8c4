//! JSON and XML encoding helpers.
//!
//! JSON goes through `serde_json`, XML through `quick-xml`'s serde support.
//! Encoding or decoding errors fail the test.

use std::io::{Cursor, Read};

use serde::{Serialize, de::DeserializeOwned};

use crate::context::{OrFatal, TestContext};

/// Pretty-printed JSON for `value`, indented by two spaces.
///
/// ```
/// use testkit::{Harness, codec::to_json};
///
/// Harness::run(|t| {
///     let json = to_json(t, &serde_json::json!({ "a": 1 }));
///     assert_eq!(json, b"{\n  \"a\": 1\n}");
/// });
/// ```
#[track_caller]
pub fn to_json<T>(ctx: &(impl TestContext + ?Sized), value: &T) -> Vec<u8>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec_pretty(value).or_fatal(ctx, || "encode JSON".to_owned())
}

/// [`to_json`] wrapped in a reader.
#[track_caller]
pub fn to_json_reader<T>(ctx: &(impl TestContext + ?Sized), value: &T) -> Cursor<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    Cursor::new(to_json(ctx, value))
}

/// Decode a `T` from JSON `data`.
#[track_caller]
pub fn from_json<T>(ctx: &(impl TestContext + ?Sized), data: &[u8]) -> T
where
    T: DeserializeOwned,
{
    serde_json::from_slice(data).or_fatal(ctx, || "decode JSON".to_owned())
}

/// Decode a `T` from JSON read from `reader`.
#[track_caller]
pub fn from_json_reader<T>(ctx: &(impl TestContext + ?Sized), reader: impl Read) -> T
where
    T: DeserializeOwned,
{
    serde_json::from_reader(reader).or_fatal(ctx, || "decode JSON".to_owned())
}

/// XML for `value`; the root element is named after its type.
#[track_caller]
pub fn to_xml<T>(ctx: &(impl TestContext + ?Sized), value: &T) -> Vec<u8>
where
    T: Serialize + ?Sized,
{
    quick_xml::se::to_string(value)
        .or_fatal(ctx, || "encode XML".to_owned())
        .into_bytes()
}

/// Decode a `T` from XML `data`.
#[track_caller]
pub fn from_xml<T>(ctx: &(impl TestContext + ?Sized), data: &[u8]) -> T
where
    T: DeserializeOwned,
{
    quick_xml::de::from_reader(data).or_fatal(ctx, || "decode XML".to_owned())
}
