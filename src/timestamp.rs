//! Wall-clock timestamps stored in inodes.

use core::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds and microseconds since the UNIX epoch, UTC.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: i64,
    pub micros: u32,
}

impl Timestamp {
    pub const ENCODED_SIZE: usize = 12;

    pub fn new(secs: i64, micros: u32) -> Self {
        Timestamp { secs, micros }
    }

    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp::new(d.as_secs() as i64, d.subsec_micros()),
            Err(e) => {
                let d = e.duration();
                Timestamp::new(-(d.as_secs() as i64), d.subsec_micros())
            }
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..8].copy_from_slice(&self.secs.to_le_bytes());
        buf[8..12].copy_from_slice(&self.micros.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut secs = [0u8; 8];
        secs.copy_from_slice(&buf[0..8]);
        let mut micros = [0u8; 4];
        micros.copy_from_slice(&buf[8..12]);
        Timestamp::new(i64::from_le_bytes(secs), u32::from_le_bytes(micros))
    }
}

/// Converts days since 1970-01-01 into a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Renders as `YYYY-MM-DD HH:MM:SS.ssssssZ`.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.secs.div_euclid(86_400);
        let secs_of_day = self.secs.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}Z",
            year,
            month,
            day,
            secs_of_day / 3600,
            secs_of_day % 3600 / 60,
            secs_of_day % 60,
            self.micros,
        )
    }
}
