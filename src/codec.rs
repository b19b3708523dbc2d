//! Conversions between console form values and the firmware's 0/1 wire flags.
//!
//! The firmware only ever sends and expects integers for switches. Decoding is
//! asymmetric: only values that compare equal to zero read as `false`, anything
//! else the device hands back reads as `true`.

#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// A boolean as the firmware encodes it on the wire.
#[derive(Clone, Copy, Debug, Default, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum WireBool {
    #[default]
    Off = 0,
    On = 1,
}

impl From<WireBool> for u8 {
    fn from(value: WireBool) -> Self {
        value as u8
    }
}

impl From<WireBool> for Value {
    fn from(value: WireBool) -> Self {
        Value::from(u8::from(value))
    }
}

/// Encode a UI boolean for the firmware.
pub fn to_wire(value: bool) -> WireBool {
    if value { WireBool::On } else { WireBool::Off }
}

/// Decode a firmware flag.
///
/// A value is `false` exactly when it compares loosely equal to `0` in the
/// browser: numeric zero, `false`, blank or zero-valued strings, and arrays
/// that stringify to one of those. `null` and objects are `true`.
pub fn from_wire(value: &Value) -> bool {
    !loosely_zero(value)
}

fn loosely_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|n| n == 0.0),
        Value::Bool(b) => !b,
        Value::String(s) => numeric_zero(s),
        Value::Array(items) => match items.as_slice() {
            [] => true,
            [item] => stringifies_to_zero(item),
            _ => false,
        },
        Value::Null | Value::Object(_) => false,
    }
}

/// Whether the array-join form of `item` reads as numeric zero.
fn stringifies_to_zero(item: &Value) -> bool {
    match item {
        Value::Null => true,
        Value::Number(n) => n.as_f64().is_some_and(|n| n == 0.0),
        Value::String(s) => numeric_zero(s),
        Value::Array(_) => loosely_zero(item),
        Value::Bool(_) | Value::Object(_) => false,
    }
}

/// String to number conversion compared against zero; blank is zero.
fn numeric_zero(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return true;
    }

    // 0x/0o/0b literals are zero only when every digit is
    if let Some(prefix) = s.get(..2)
        && matches!(prefix, "0x" | "0X" | "0o" | "0O" | "0b" | "0B")
    {
        let digits = &s[2..];
        return !digits.is_empty() && digits.bytes().all(|b| b == b'0');
    }

    // only plain decimal syntax; f64::from_str also takes "inf" and "nan"
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
        && s.parse::<f64>().is_ok_and(|n| n == 0.0)
}

/// Decode an integer flag.
pub fn from_wire_int(value: i64) -> bool {
    value != 0
}

/// A two-state switch widget rendered by the page.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Toggle {
    fn is_checked(&self) -> bool;

    /// Flip the widget the way a user click would, firing its change handlers.
    fn click(&self);
}

/// Bring `toggle` into the `checked` state, clicking it only if it differs.
pub fn sync_toggle<T: Toggle + ?Sized>(toggle: &T, checked: bool) {
    if toggle.is_checked() != checked {
        toggle.click();
    }
}
