//! Serde helpers for the shapes the Tibber endpoints actually send.
//!
//! With the `tracing` feature enabled, API responses are also checked for fields the typed
//! models do not capture, which is how schema additions are noticed.

#[cfg(feature = "api")]
use {serde::de::DeserializeOwned, serde_json::Value};
use {
    serde::{Deserialize as _, Deserializer, Serializer},
    serde_with::{DeserializeAs, SerializeAs},
};

/// A `serde_as` adapter that accepts a string or an integer and yields a `String`.
///
/// The legacy endpoint echoes subscription ids as numbers, the current one as strings. Use
/// `#[serde_as(as = "Option<StringFromAny>")]` for optional ids.
pub struct StringFromAny;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum TextOrInteger {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl<'de> DeserializeAs<'de, String> for StringFromAny {
    fn deserialize_as<D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match TextOrInteger::deserialize(deserializer)? {
            TextOrInteger::Text(text) => text,
            TextOrInteger::Unsigned(n) => n.to_string(),
            TextOrInteger::Signed(n) => n.to_string(),
        })
    }
}

impl SerializeAs<String> for StringFromAny {
    fn serialize_as<S>(source: &String, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(source)
    }
}

/// Deserializes an API response, logging every field the target type ignores.
///
/// Unknown fields never fail deserialization. When deserialization does fail, the JSON path of
/// the offending value is logged before the error is returned.
#[cfg(all(feature = "api", feature = "tracing"))]
pub(crate) fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    use std::any::type_name;

    let type_name = type_name::<T>();
    tracing::trace!(%type_name, json = %value, "deserializing response");

    let original = value.clone();
    let mut ignored = Vec::new();

    let result: T = serde_ignored::deserialize(value, |path| ignored.push(path.to_string()))
        .inspect_err(|_| {
            let text = original.to_string();
            let deserializer = &mut serde_json::Deserializer::from_str(&text);
            let located: Result<T, _> = serde_path_to_error::deserialize(deserializer);
            if let Err(e) = located {
                let path = e.path().to_string();
                tracing::error!(
                    %type_name,
                    %path,
                    value = %describe(&original, &path),
                    error = %e.inner(),
                    "unable to deserialize response"
                );
            }
        })?;

    for path in ignored {
        tracing::warn!(
            %type_name,
            field = %path,
            value = %describe(&original, &path),
            "unknown field in API response"
        );
    }

    Ok(result)
}

#[cfg(all(feature = "api", not(feature = "tracing")))]
pub(crate) fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Converts a `serde_ignored` / `serde_path_to_error` path (`data.viewer.homes[0].id`,
/// `data.viewer.homes.0.id`, `?` for options) into a JSON pointer.
#[cfg(all(feature = "api", feature = "tracing"))]
fn json_pointer(path: &str) -> String {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty() && *segment != "?")
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
            pointer
        })
}

#[cfg(all(feature = "api", feature = "tracing"))]
fn describe(value: &Value, path: &str) -> String {
    value
        .pointer(&json_pointer(path))
        .map_or_else(|| "<unable to retrieve>".to_owned(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_with::serde_as;

    use super::*;

    #[serde_as]
    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Frame {
        #[serde_as(as = "Option<StringFromAny>")]
        id: Option<String>,
    }

    #[test]
    fn ids_accept_strings_and_integers() {
        let cases = [
            (serde_json::json!({"id": "0"}), Some("0")),
            (serde_json::json!({"id": 1}), Some("1")),
            (serde_json::json!({"id": -7}), Some("-7")),
            (serde_json::json!({"id": u64::MAX}), Some("18446744073709551615")),
            (serde_json::json!({"id": null}), None),
            (serde_json::json!({}), None),
        ];

        for (json, expected) in cases {
            let frame: Frame = serde_json::from_value(json.clone()).expect("valid frame");
            assert_eq!(frame.id.as_deref(), expected, "input {json}");
        }
    }

    #[test]
    fn ids_reject_other_shapes() {
        serde_json::from_value::<Frame>(serde_json::json!({"id": {"nested": 1}})).unwrap_err();
        serde_json::from_value::<Frame>(serde_json::json!({"id": 1.5})).unwrap_err();
    }

    #[test]
    fn ids_serialize_as_strings() {
        let frame = Frame {
            id: Some("1".to_owned()),
        };

        assert_eq!(
            serde_json::to_value(&frame).expect("serializable"),
            serde_json::json!({"id": "1"})
        );
    }

    #[cfg(feature = "api")]
    mod responses {
        use serde::Deserialize;

        use super::super::deserialize_with_warnings;

        #[derive(Debug, Deserialize, PartialEq)]
        struct Home {
            id: String,
            #[serde(default)]
            nickname: Option<String>,
        }

        #[test]
        fn unknown_fields_do_not_fail() {
            let home: Home = deserialize_with_warnings(serde_json::json!({
                "id": "home-1",
                "timeZone": "Europe/Oslo",
                "features": {"realTimeConsumptionEnabled": true}
            }))
            .expect("deserialization failed");

            assert_eq!(home.id, "home-1");
            assert_eq!(home.nickname, None);
        }

        #[test]
        fn missing_required_field_fails() {
            let result: crate::Result<Home> =
                deserialize_with_warnings(serde_json::json!({"nickname": "cabin"}));

            result.unwrap_err();
        }

        #[cfg(feature = "tracing")]
        #[test]
        fn pointers_follow_both_path_notations() {
            use super::super::{describe, json_pointer};

            assert_eq!(json_pointer("data.viewer.homes[0].id"), "/data/viewer/homes/0/id");
            assert_eq!(json_pointer("data.viewer.homes.0.id"), "/data/viewer/homes/0/id");
            assert_eq!(json_pointer("data.?.viewer"), "/data/viewer");
            assert_eq!(json_pointer(""), "");

            let value = serde_json::json!({"data": {"homes": [{"id": "a"}, {"id": "b"}]}});
            assert_eq!(describe(&value, "data.homes[1].id"), "\"b\"");
            assert_eq!(describe(&value, "data.homes[5].id"), "<unable to retrieve>");
        }

        #[cfg(feature = "tracing")]
        #[test]
        fn unknown_fields_are_logged() {
            use std::io;
            use std::sync::{Arc, Mutex};

            use tracing_subscriber::layer::SubscriberExt as _;

            #[derive(Clone, Default)]
            struct Captured(Arc<Mutex<Vec<u8>>>);

            impl io::Write for Captured {
                fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                    self.0.lock().expect("lock").extend_from_slice(buf);
                    Ok(buf.len())
                }

                fn flush(&mut self) -> io::Result<()> {
                    Ok(())
                }
            }

            let captured = Captured::default();
            let writer = captured.clone();
            let subscriber = tracing_subscriber::registry().with(
                tracing_subscriber::fmt::layer()
                    .with_writer(move || writer.clone())
                    .with_ansi(false),
            );

            tracing::subscriber::with_default(subscriber, || {
                let home: Home = deserialize_with_warnings(serde_json::json!({
                    "id": "home-1",
                    "appNickname": "cabin"
                }))
                .expect("deserialization should succeed");
                assert_eq!(home.id, "home-1");
            });

            let output = String::from_utf8(captured.0.lock().expect("lock").clone())
                .expect("utf8 output");
            assert!(output.contains("unknown field"), "output: {output}");
            assert!(output.contains("appNickname"), "output: {output}");
            assert!(output.contains("cabin"), "output: {output}");
        }
    }
}
