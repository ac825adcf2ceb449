//! Heart-rate strap input.
//!
//! Decodes the standard Heart Rate Measurement characteristic and turns
//! strap readings into the outbound messages the server expects.

use crate::error::SensorError;
use crate::protocol::Outbound;
use tracing::{debug, info};

/// Flags bit selecting a 16-bit little-endian BPM field.
const FLAG_HR_U16: u8 = 0x01;

/// Decode a Heart Rate Measurement payload into beats per minute.
///
/// Byte 0 holds flags; bit 0 clear means the BPM is one byte, set means two
/// bytes little-endian. Trailing fields (energy, RR intervals) are ignored.
pub fn parse_heart_rate_measurement(bytes: &[u8]) -> Result<u16, SensorError> {
    let Some(&flags) = bytes.first() else {
        return Err(SensorError::Truncated { len: 0, needed: 2 });
    };
    if flags & FLAG_HR_U16 == 0 {
        match bytes.get(1) {
            Some(&bpm) => Ok(u16::from(bpm)),
            None => Err(SensorError::Truncated {
                len: bytes.len(),
                needed: 2,
            }),
        }
    } else {
        match bytes.get(1..3) {
            Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(SensorError::Truncated {
                len: bytes.len(),
                needed: 3,
            }),
        }
    }
}

/// Tracks strap connectivity and produces `live_hr` / `ble_*` messages.
#[derive(Debug, Clone, Default)]
pub struct LiveHeartRateRelay {
    connected: bool,
    last_bpm: Option<u16>,
}

impl LiveHeartRateRelay {
    /// Create a relay that has not seen the strap yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading. `bpm` is ignored while disconnected.
    pub fn update(&mut self, bpm: u16, connected: bool) -> Vec<Outbound> {
        let mut out = Vec::new();
        if !connected {
            if self.connected {
                info!("heart rate strap disconnected");
                out.push(Outbound::BleDisconnected);
            }
            self.connected = false;
            return out;
        }
        if bpm == 0 {
            return out;
        }
        if !self.connected {
            info!(bpm, "heart rate strap connected");
            out.push(Outbound::BleReconnected);
            self.connected = true;
        }
        self.last_bpm = Some(bpm);
        match Outbound::live_hr(bpm) {
            Some(msg) => out.push(msg),
            None => debug!(bpm, "live heart rate out of range, not relayed"),
        }
        out
    }

    /// Whether the strap is currently connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Most recent non-zero reading.
    #[must_use]
    pub const fn last_bpm(&self) -> Option<u16> {
        self.last_bpm
    }
}
