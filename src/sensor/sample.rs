//! sample.rs
//! Immutable temperature sample and its fixed 16-byte wire record.
//!
//! Record layout (little-endian, never varies at runtime):
//! - bytes 0..8   timestamp_ns (u64, monotonic)
//! - bytes 8..12  temp_mc      (i32, milli-degrees C)
//! - bytes 12..16 flags        (u32, bit0 NEW, bit1 ALERT)

use std::fmt;

use crate::error::ReadError;

/// Size in bytes of one binary sample record.
pub const RECORD_SIZE: usize = 16;

/// Sample flag bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SampleFlags(u32);

impl SampleFlags {
    pub const NEW: SampleFlags = SampleFlags(1 << 0);
    pub const ALERT: SampleFlags = SampleFlags(1 << 1);

    pub const fn empty() -> Self {
        SampleFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        SampleFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: SampleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: SampleFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for SampleFlags {
    type Output = SampleFlags;

    fn bitor(self, rhs: SampleFlags) -> SampleFlags {
        SampleFlags(self.0 | rhs.0)
    }
}

/// One generated measurement. Never mutated after the generator builds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp_ns: u64,
    pub temp_mc: i32,
    pub flags: SampleFlags,
}

impl Sample {
    pub fn new(timestamp_ns: u64, temp_mc: i32, flags: SampleFlags) -> Self {
        Self { timestamp_ns, temp_mc, flags }
    }

    #[inline]
    pub fn is_alert(&self) -> bool {
        self.flags.contains(SampleFlags::ALERT)
    }

    /// Temperature in degrees Celsius (display only).
    pub fn celsius(&self) -> f64 {
        self.temp_mc as f64 / 1000.0
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        out[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        out[12..16].copy_from_slice(&self.flags.bits().to_le_bytes());
        out
    }

    /// Decodes one record from the front of `buf`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ReadError> {
        let record: &[u8; RECORD_SIZE] = buf
            .get(..RECORD_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ReadError::ShortBuffer { needed: RECORD_SIZE, got: buf.len() })?;

        let mut ts = [0u8; 8];
        let mut temp = [0u8; 4];
        let mut flags = [0u8; 4];
        ts.copy_from_slice(&record[0..8]);
        temp.copy_from_slice(&record[8..12]);
        flags.copy_from_slice(&record[12..16]);

        Ok(Self {
            timestamp_ns: u64::from_le_bytes(ts),
            temp_mc: i32::from_le_bytes(temp),
            flags: SampleFlags::from_bits(u32::from_le_bytes(flags)),
        })
    }

    /// Writes one record into the front of `buf`, returning bytes written.
    /// A buffer shorter than one record is rejected untouched.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, ReadError> {
        if buf.len() < RECORD_SIZE {
            return Err(ReadError::ShortBuffer { needed: RECORD_SIZE, got: buf.len() });
        }
        buf[..RECORD_SIZE].copy_from_slice(&self.to_bytes());
        Ok(RECORD_SIZE)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.3}s temp={:.1}C alert={}",
            self.timestamp_ns as f64 / 1e9,
            self.celsius(),
            u8::from(self.is_alert())
        )
    }
}
