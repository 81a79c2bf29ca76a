//! Instants, durations and identifiers.
//!
//! Time values travel as a single i64 count of 100 ns ticks. Instants count
//! from `0001-01-01T00:00:00Z`; UUIDs use the mixed-endian GUID byte layout
//! (first three groups little-endian).

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{DualcastError, Result};

use super::{Payload, PayloadReader, PayloadWriter};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Seconds between `0001-01-01T00:00:00Z` and the Unix epoch.
const EPOCH_OFFSET_SECS: i64 = 62_135_596_800;

/// Ticks since `0001-01-01T00:00:00Z`; saturates outside the i64 range.
pub fn utc_to_ticks(at: &DateTime<Utc>) -> i64 {
    at.timestamp()
        .saturating_add(EPOCH_OFFSET_SECS)
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(i64::from(at.timestamp_subsec_nanos()) / NANOS_PER_TICK)
}

/// Inverse of [`utc_to_ticks`]; `None` when outside chrono's range.
pub fn ticks_to_utc(ticks: i64) -> Option<DateTime<Utc>> {
    let secs = ticks.div_euclid(TICKS_PER_SECOND) - EPOCH_OFFSET_SECS;
    let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(secs, nanos as u32)
}

impl Payload for DateTime<Utc> {
    fn encode(&self, w: &mut PayloadWriter) {
        w.put_i64(utc_to_ticks(self));
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let ticks = r.get_i64()?;
        ticks_to_utc(ticks)
            .ok_or_else(|| DualcastError::decode(format!("instant out of range: {ticks} ticks")))
    }
}

impl Payload for NaiveDateTime {
    fn encode(&self, w: &mut PayloadWriter) {
        w.put_i64(utc_to_ticks(&self.and_utc()));
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        DateTime::<Utc>::decode(r).map(|at| at.naive_utc())
    }
}

impl Payload for TimeDelta {
    fn encode(&self, w: &mut PayloadWriter) {
        let ticks = self
            .num_seconds()
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add(i64::from(self.subsec_nanos()) / NANOS_PER_TICK);
        w.put_i64(ticks);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let ticks = r.get_i64()?;
        TimeDelta::try_seconds(ticks / TICKS_PER_SECOND)
            .and_then(|secs| {
                secs.checked_add(&TimeDelta::nanoseconds(
                    (ticks % TICKS_PER_SECOND) * NANOS_PER_TICK,
                ))
            })
            .ok_or_else(|| DualcastError::decode(format!("duration out of range: {ticks} ticks")))
    }
}

impl Payload for Duration {
    fn encode(&self, w: &mut PayloadWriter) {
        let secs = i64::try_from(self.as_secs()).unwrap_or(i64::MAX);
        let ticks = secs
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add(i64::from(self.subsec_nanos()) / NANOS_PER_TICK);
        w.put_i64(ticks);
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let ticks = r.get_i64()?;
        if ticks < 0 {
            return Err(DualcastError::decode(format!(
                "negative duration {ticks} ticks for std::time::Duration"
            )));
        }
        Ok(Duration::new(
            (ticks / TICKS_PER_SECOND) as u64,
            ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as u32,
        ))
    }
}

impl Payload for Uuid {
    fn encode(&self, w: &mut PayloadWriter) {
        w.put_slice(&self.to_bytes_le());
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let raw: [u8; 16] = r
            .get_slice(16)?
            .try_into()
            .map_err(|_| DualcastError::decode("uuid: expected 16 bytes"))?;
        Ok(Uuid::from_bytes_le(raw))
    }
}
