//! 12-byte object identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::{DriverError, Result};

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// A 12-byte identifier: 4-byte big-endian seconds, 5 bytes unique to the
/// process, and a 3-byte big-endian counter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    /// Encoded length in bytes.
    pub const LEN: usize = 12;

    /// Generates a new identifier.
    pub fn new() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let process = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..=COUNTER_MASK)))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; Self::LEN];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Wraps raw bytes.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> [u8; Self::LEN] {
        self.0
    }

    /// Returns the creation time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Returns the lowercase hex form.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::LEN * 2 || !s.is_ascii() {
            return Err(DriverError::Encoding(format!(
                "invalid object id {:?}: expected {} hex characters",
                s,
                Self::LEN * 2
            )));
        }
        let mut bytes = [0u8; Self::LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|e| {
                DriverError::Encoding(format!("invalid object id {:?}: {}", s, e))
            })?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}
