use std::borrow::Cow;
use std::fmt;

use crate::core::{Error, Result};

pub const NAME_SIZE: usize = 16;
pub const VALUE_SIZE: usize = 64;
pub const RECORD_SIZE: usize = 104;

pub const NAME_OFFSET: usize = 0;
pub const STATUS_OFFSET: usize = 16;
pub const TIME_OFFSET: usize = 24;
pub const LOCK_OFFSET: usize = 32;
pub const VALUE_OFFSET: usize = 33;

/// Lifecycle state a worker publishes in its slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Slot initialized, worker has not announced itself yet.
    #[default]
    None,
    Ready,
    /// Terminal for the worker's lifetime.
    Stopped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::None => "None",
            Status::Ready => "Ready",
            Status::Stopped => "Stopped",
        }
    }

    fn to_wire(self) -> u32 {
        match self {
            Status::None => 0,
            Status::Ready => 1,
            Status::Stopped => 2,
        }
    }

    fn from_wire(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Status::None),
            1 => Ok(Status::Ready),
            2 => Ok(Status::Stopped),
            _ => Err(Error::Corrupt("unknown slot status")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One worker slot. The zero value is an unannounced slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: [u8; NAME_SIZE],
    pub status: Status,
    pub time: u64,
    /// 0 = unlocked, 1 = claims exclusive progress.
    pub lock: u8,
    pub value: [u8; VALUE_SIZE],
}

impl Default for Record {
    fn default() -> Self {
        Self {
            name: [0u8; NAME_SIZE],
            status: Status::None,
            time: 0,
            lock: 0,
            value: [0u8; VALUE_SIZE],
        }
    }
}

impl Record {
    pub fn ready() -> Self {
        Self {
            status: Status::Ready,
            ..Self::default()
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[NAME_OFFSET..NAME_OFFSET + NAME_SIZE].copy_from_slice(&self.name);
        buf[STATUS_OFFSET..STATUS_OFFSET + 4].copy_from_slice(&self.status.to_wire().to_le_bytes());
        buf[TIME_OFFSET..TIME_OFFSET + 8].copy_from_slice(&self.time.to_le_bytes());
        buf[LOCK_OFFSET] = self.lock;
        buf[VALUE_OFFSET..VALUE_OFFSET + VALUE_SIZE].copy_from_slice(&self.value);
        buf
    }

    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Result<Self> {
        let mut name = [0u8; NAME_SIZE];
        name.copy_from_slice(&bytes[NAME_OFFSET..NAME_OFFSET + NAME_SIZE]);
        let mut status_raw = [0u8; 4];
        status_raw.copy_from_slice(&bytes[STATUS_OFFSET..STATUS_OFFSET + 4]);
        let status = Status::from_wire(u32::from_le_bytes(status_raw))?;
        let mut time_raw = [0u8; 8];
        time_raw.copy_from_slice(&bytes[TIME_OFFSET..TIME_OFFSET + 8]);
        let mut value = [0u8; VALUE_SIZE];
        value.copy_from_slice(&bytes[VALUE_OFFSET..VALUE_OFFSET + VALUE_SIZE]);
        Ok(Self {
            name,
            status,
            time: u64::from_le_bytes(time_raw),
            lock: bytes[LOCK_OFFSET],
            value,
        })
    }

    pub fn set_name(&mut self, name: &[u8]) {
        fill_truncated(&mut self.name, name);
    }

    pub fn set_value(&mut self, value: &[u8]) {
        fill_truncated(&mut self.value, value);
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(until_nul(&self.name))
    }

    pub fn value(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(until_nul(&self.value))
    }

    pub fn has_value(&self) -> bool {
        self.value[0] != 0
    }

    pub fn is_locked(&self) -> bool {
        self.lock != 0
    }
}

/// Copies as much of `src` as fits and zeroes the rest; excess bytes are dropped.
fn fill_truncated(dst: &mut [u8], src: &[u8]) {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);
    dst[len..].fill(0);
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}
