//! Wire codec for callable payloads.
//!
//! Mirrors the Firebase JS SDK implementation in
//! `packages/functions/src/serializer.ts`. Plain JSON passes through
//! unchanged; integers outside the range JavaScript can represent exactly
//! travel as proto wrapper objects so the backend does not silently round
//! them.

use serde_json::{Map, Number, Value as JsonValue};

use crate::functions::error::{internal_error, FunctionsResult};

pub const LONG_TYPE: &str = "type.googleapis.com/google.protobuf.Int64Value";
pub const UNSIGNED_LONG_TYPE: &str = "type.googleapis.com/google.protobuf.UInt64Value";

/// Largest integer JavaScript represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

fn wrap_long(type_url: &str, value: String) -> JsonValue {
    let mut wrapper = Map::new();
    wrapper.insert("@type".to_string(), JsonValue::String(type_url.to_string()));
    wrapper.insert("value".to_string(), JsonValue::String(value));
    JsonValue::Object(wrapper)
}

/// Encodes a JSON value for the request body.
///
/// Null, booleans, strings, floats and in-range integers are kept as-is;
/// arrays and objects are encoded element by element. Only integers whose
/// magnitude exceeds `MAX_SAFE_INTEGER` get wrapped.
pub fn encode(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(number) => encode_number(number),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(encode).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(key, value)| (key, encode(value)))
                .collect(),
        ),
        other => other,
    }
}

fn encode_number(number: Number) -> JsonValue {
    if let Some(signed) = number.as_i64() {
        if signed > MAX_SAFE_INTEGER || signed < -MAX_SAFE_INTEGER {
            return wrap_long(LONG_TYPE, signed.to_string());
        }
        return JsonValue::Number(number);
    }
    if let Some(unsigned) = number.as_u64() {
        // Only reachable above i64::MAX, which is always past the safe range.
        return wrap_long(UNSIGNED_LONG_TYPE, unsigned.to_string());
    }
    JsonValue::Number(number)
}

/// Decodes a response body, unwrapping proto-typed longs back into numbers.
///
/// An object carrying an unrecognised `@type`, or a wrapper whose `value`
/// does not parse as a number, is rejected the way the JS SDK rejects it.
pub fn decode(value: JsonValue) -> FunctionsResult<JsonValue> {
    match value {
        JsonValue::Object(map) => {
            if let Some(type_url) = map.get("@type").and_then(JsonValue::as_str) {
                return match type_url {
                    LONG_TYPE | UNSIGNED_LONG_TYPE => decode_wrapped_long(&map),
                    _ => Err(decode_error(&JsonValue::Object(map.clone()))),
                };
            }
            let mut decoded = Map::with_capacity(map.len());
            for (key, value) in map {
                decoded.insert(key, decode(value)?);
            }
            Ok(JsonValue::Object(decoded))
        }
        JsonValue::Array(items) => {
            let mut decoded = Vec::with_capacity(items.len());
            for item in items {
                decoded.push(decode(item)?);
            }
            Ok(JsonValue::Array(decoded))
        }
        other => Ok(other),
    }
}

fn decode_wrapped_long(map: &Map<String, JsonValue>) -> FunctionsResult<JsonValue> {
    let raw = map.get("value");
    match raw {
        Some(JsonValue::String(text)) => {
            if let Ok(signed) = text.parse::<i64>() {
                return Ok(JsonValue::Number(signed.into()));
            }
            if let Ok(unsigned) = text.parse::<u64>() {
                return Ok(JsonValue::Number(unsigned.into()));
            }
            if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
                return Ok(JsonValue::Number(number));
            }
            Err(decode_error(&JsonValue::Object(map.clone())))
        }
        Some(JsonValue::Number(number)) => Ok(JsonValue::Number(number.clone())),
        _ => Err(decode_error(&JsonValue::Object(map.clone()))),
    }
}

fn decode_error(value: &JsonValue) -> crate::functions::error::FunctionsError {
    internal_error(format!("Data cannot be decoded from JSON: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_values_pass_through_encode() {
        assert_eq!(encode(json!(null)), json!(null));
        assert_eq!(encode(json!(true)), json!(true));
        assert_eq!(encode(json!("hello")), json!("hello"));
        assert_eq!(encode(json!(17)), json!(17));
        assert_eq!(encode(json!(-42)), json!(-42));
        assert_eq!(encode(json!(1.5)), json!(1.5));
    }

    #[test]
    fn containers_are_encoded_recursively() {
        assert_eq!(
            encode(json!({ "list": [1, 2, 3], "nested": { "flag": false } })),
            json!({ "list": [1, 2, 3], "nested": { "flag": false } })
        );
    }

    #[test]
    fn integers_past_the_safe_range_are_wrapped() {
        assert_eq!(
            encode(json!(9_007_199_254_740_992_i64)),
            json!({
                "@type": LONG_TYPE,
                "value": "9007199254740992"
            })
        );
        assert_eq!(
            encode(json!(-9_007_199_254_740_992_i64)),
            json!({
                "@type": LONG_TYPE,
                "value": "-9007199254740992"
            })
        );
        assert_eq!(
            encode(json!(18_446_744_073_709_551_615_u64)),
            json!({
                "@type": UNSIGNED_LONG_TYPE,
                "value": "18446744073709551615"
            })
        );
    }

    #[test]
    fn boundary_integers_stay_plain() {
        assert_eq!(
            encode(json!(9_007_199_254_740_991_i64)),
            json!(9_007_199_254_740_991_i64)
        );
        assert_eq!(
            encode(json!(-9_007_199_254_740_991_i64)),
            json!(-9_007_199_254_740_991_i64)
        );
    }

    #[test]
    fn wrapped_longs_decode_back_to_numbers() {
        let long = json!({ "@type": LONG_TYPE, "value": "420" });
        assert_eq!(decode(long).unwrap(), json!(420));

        let negative = json!({ "@type": LONG_TYPE, "value": "-9223372036854775808" });
        assert_eq!(decode(negative).unwrap(), json!(i64::MIN));

        let unsigned = json!({ "@type": UNSIGNED_LONG_TYPE, "value": "18446744073709551615" });
        assert_eq!(decode(unsigned).unwrap(), json!(u64::MAX));
    }

    #[test]
    fn numeric_wrapper_values_are_accepted() {
        let long = json!({ "@type": LONG_TYPE, "value": 30 });
        assert_eq!(decode(long).unwrap(), json!(30));
    }

    #[test]
    fn wrapped_longs_decode_inside_containers() {
        let body = json!({
            "list": [{ "@type": LONG_TYPE, "value": "1" }],
            "message": "hello"
        });
        assert_eq!(
            decode(body).unwrap(),
            json!({ "list": [1], "message": "hello" })
        );
    }

    #[test]
    fn unknown_type_url_is_rejected() {
        let value = json!({ "@type": "something/unsupported", "value": "x" });
        let error = decode(value).unwrap_err();
        assert_eq!(error.code_str(), "functions/internal");
        assert!(error
            .message()
            .starts_with("Data cannot be decoded from JSON:"));
    }

    #[test]
    fn unparsable_wrapper_value_is_rejected() {
        let value = json!({ "@type": LONG_TYPE, "value": "not-a-number" });
        assert!(decode(value).is_err());

        let missing = json!({ "@type": LONG_TYPE });
        assert!(decode(missing).is_err());
    }

    #[test]
    fn null_round_trips() {
        assert_eq!(decode(json!(null)).unwrap(), json!(null));
        assert_eq!(decode(json!({ "value": null })).unwrap(), json!({ "value": null }));
    }
}
