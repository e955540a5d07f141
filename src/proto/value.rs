// Thu Aug 27 2026 - Alex

use crate::proto::ProtoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared interpretation of a search value. The scanner itself only sees
/// raw bytes; the type travels with the request so results can be rendered
/// back the way the user asked for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int32,
    Int64,
    Float,
    Double,
    String,
    String16,
    ByteArray,
}

impl ValueType {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Int32 => 0,
            Self::Int64 => 1,
            Self::Float => 2,
            Self::Double => 3,
            Self::String => 4,
            Self::String16 => 5,
            Self::ByteArray => 6,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, ProtoError> {
        match value {
            0 => Ok(Self::Int32),
            1 => Ok(Self::Int64),
            2 => Ok(Self::Float),
            3 => Ok(Self::Double),
            4 => Ok(Self::String),
            5 => Ok(Self::String16),
            6 => Ok(Self::ByteArray),
            other => Err(ProtoError::UnknownValueType(other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::String16 => write!(f, "string16"),
            Self::ByteArray => write!(f, "bytes"),
        }
    }
}

impl FromStr for ValueType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int32" | "i32" => Ok(Self::Int32),
            "int64" | "i64" => Ok(Self::Int64),
            "float" | "f32" => Ok(Self::Float),
            "double" | "f64" => Ok(Self::Double),
            "string" | "str" => Ok(Self::String),
            "string16" | "utf16" => Ok(Self::String16),
            "bytes" | "bytearray" | "hex" => Ok(Self::ByteArray),
            other => Err(ProtoError::InvalidValue("value type", other.to_string())),
        }
    }
}

/// Turn user-entered text into the little-endian byte pattern to scan for.
pub fn parse_value(text: &str, value_type: ValueType) -> Result<Vec<u8>, ProtoError> {
    match value_type {
        ValueType::Int32 => text
            .parse::<i32>()
            .map(|v| v.to_le_bytes().to_vec())
            .map_err(|e| ProtoError::InvalidValue("int32", e.to_string())),
        ValueType::Int64 => text
            .parse::<i64>()
            .map(|v| v.to_le_bytes().to_vec())
            .map_err(|e| ProtoError::InvalidValue("int64", e.to_string())),
        ValueType::Float => text
            .parse::<f32>()
            .map(|v| v.to_le_bytes().to_vec())
            .map_err(|e| ProtoError::InvalidValue("float", e.to_string())),
        ValueType::Double => text
            .parse::<f64>()
            .map(|v| v.to_le_bytes().to_vec())
            .map_err(|e| ProtoError::InvalidValue("double", e.to_string())),
        ValueType::String => Ok(text.as_bytes().to_vec()),
        ValueType::String16 => Ok(text
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect()),
        ValueType::ByteArray => parse_hex(text),
    }
}

/// Render raw matched bytes back to a display string for the declared type.
/// Bytes of an unexpected width fall back to a hex dump.
pub fn render_value(bytes: &[u8], value_type: ValueType) -> String {
    match value_type {
        ValueType::Int32 => match <[u8; 4]>::try_from(bytes) {
            Ok(raw) => i32::from_le_bytes(raw).to_string(),
            Err(_) => hex_string(bytes),
        },
        ValueType::Int64 => match <[u8; 8]>::try_from(bytes) {
            Ok(raw) => i64::from_le_bytes(raw).to_string(),
            Err(_) => hex_string(bytes),
        },
        ValueType::Float => match <[u8; 4]>::try_from(bytes) {
            Ok(raw) => f32::from_le_bytes(raw).to_string(),
            Err(_) => hex_string(bytes),
        },
        ValueType::Double => match <[u8; 8]>::try_from(bytes) {
            Ok(raw) => f64::from_le_bytes(raw).to_string(),
            Err(_) => hex_string(bytes),
        },
        ValueType::String => String::from_utf8_lossy(bytes).into_owned(),
        ValueType::String16 => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        ValueType::ByteArray => hex_string(bytes),
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, ProtoError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(ProtoError::InvalidValue("hex", text.to_string()));
    }

    // An odd digit count gets a leading zero, "ABC" scans as 0A BC.
    let padded = if cleaned.len() % 2 != 0 {
        format!("0{}", cleaned)
    } else {
        cleaned
    };

    padded
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let hex = std::str::from_utf8(pair).unwrap_or_default();
            u8::from_str_radix(hex, 16)
                .map_err(|_| ProtoError::InvalidValue("hex", text.to_string()))
        })
        .collect()
}

fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
