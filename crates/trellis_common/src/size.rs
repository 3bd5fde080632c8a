//! Byte-size values with unit parsing and display.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// An amount of memory stored in bytes.
///
/// Supports parsing from strings like "10MB", "512KB", "1GB", "2048B" and bare
/// numeric values (interpreted as bytes). Units are binary multiples, so
/// "1KB" is 1024 bytes. Displays using the largest unit that divides evenly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Creates a size from a number of bytes.
    pub const fn b(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Creates a size from a number of kibibytes.
    pub const fn kib(n: u64) -> Self {
        Self(n * KIB)
    }

    /// Creates a size from a number of mebibytes.
    pub const fn mib(n: u64) -> Self {
        Self(n * MIB)
    }

    /// Returns the size in bytes.
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Returns the size in bytes as a `usize`, saturating on 32-bit targets.
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSize({self})")
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        if b >= GIB && b % GIB == 0 {
            write!(f, "{}GB", b / GIB)
        } else if b >= MIB && b % MIB == 0 {
            write!(f, "{}MB", b / MIB)
        } else if b >= KIB && b % KIB == 0 {
            write!(f, "{}KB", b / KIB)
        } else {
            write!(f, "{b}B")
        }
    }
}

/// Error type for parsing byte-size strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseByteSizeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseByteSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid byte size: '{}'", self.input)
    }
}

impl std::error::Error for ParseByteSizeError {}

impl FromStr for ByteSize {
    type Err = ParseByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseByteSizeError {
            input: s.to_string(),
        };

        let upper = s.to_ascii_uppercase();
        let (num, multiplier) = if let Some(num) = upper
            .strip_suffix("GIB")
            .or_else(|| upper.strip_suffix("GB"))
        {
            (num, GIB)
        } else if let Some(num) = upper
            .strip_suffix("MIB")
            .or_else(|| upper.strip_suffix("MB"))
        {
            (num, MIB)
        } else if let Some(num) = upper
            .strip_suffix("KIB")
            .or_else(|| upper.strip_suffix("KB"))
        {
            (num, KIB)
        } else if let Some(num) = upper.strip_suffix('B') {
            (num, 1)
        } else {
            (upper.as_str(), 1)
        };

        let val: u64 = num.trim().parse().map_err(|_| err())?;
        val.checked_mul(multiplier).map(ByteSize).ok_or_else(err)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ByteSizeVisitor;

        impl Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a byte count or a size string such as \"10MB\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom(format!("byte size cannot be negative: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}
