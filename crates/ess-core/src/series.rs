use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tick spacing: 15 minutes.
pub const DEFAULT_STEP_SECONDS: i64 = 15 * 60;

/// One price sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub price: f64,
}

/// Struct-of-Arrays price storage with strictly increasing, uniformly spaced
/// timestamps.
///
/// Index `i` in `timestamps` and `prices` is one tick. The invariant is checked
/// once on construction; the series is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    timestamps: Vec<i64>,
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from ticks already in chronological order.
    pub fn new<I>(ticks: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = PriceTick>,
    {
        let ticks = ticks.into_iter();
        let mut series = Self::with_capacity(ticks.size_hint().0);
        for tick in ticks {
            series.timestamps.push(tick.timestamp);
            series.prices.push(tick.price);
        }
        series.check_invariant()?;
        Ok(series)
    }

    /// Build a series of `prices` starting at `start_ts`, one tick every
    /// `step` seconds.
    pub fn from_prices(start_ts: i64, step: i64, prices: &[f64]) -> Result<Self, SeriesError> {
        Self::new(prices.iter().enumerate().map(|(i, &price)| PriceTick {
            timestamp: start_ts + i as i64 * step,
            price,
        }))
    }

    fn with_capacity(cap: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(cap),
            prices: Vec::with_capacity(cap),
        }
    }

    fn check_invariant(&self) -> Result<(), SeriesError> {
        if let Some(index) = self.prices.iter().position(|p| !p.is_finite()) {
            return Err(SeriesError::NonFinitePrice { index });
        }
        let step = match self.step() {
            Some(step) => step,
            None => return Ok(()),
        };
        for (i, pair) in self.timestamps.windows(2).enumerate() {
            let found = pair[1] - pair[0];
            if found <= 0 {
                return Err(SeriesError::NonIncreasing { index: i + 1 });
            }
            if found != step {
                return Err(SeriesError::IrregularStep {
                    index: i + 1,
                    expected: step,
                    found,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    #[inline]
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    #[inline]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Spacing between consecutive ticks, if there are at least two.
    pub fn step(&self) -> Option<i64> {
        match self.timestamps.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }

    pub fn tick(&self, index: usize) -> Option<PriceTick> {
        Some(PriceTick {
            timestamp: *self.timestamps.get(index)?,
            price: *self.prices.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = PriceTick> + '_ {
        self.timestamps
            .iter()
            .zip(&self.prices)
            .map(|(&timestamp, &price)| PriceTick { timestamp, price })
    }

    /// Get a sub-range as a new series (copies data).
    pub fn slice(&self, start: usize, end: usize) -> PriceSeries {
        let end = end.min(self.len());
        let start = start.min(end);
        PriceSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            prices: self.prices[start..end].to_vec(),
        }
    }

    /// Load prices from a CSV file using memory-mapped I/O.
    ///
    /// Expected format: a header row, then `timestamp,price` rows. Extra
    /// columns are ignored. See [`PriceSeries::parse_csv_bytes`].
    pub fn from_csv(path: &Path) -> Result<Self, CsvError> {
        let file = std::fs::File::open(path)?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        Self::parse_csv_bytes(&mmap[..])
    }

    /// Parse CSV from raw bytes (testable without files).
    ///
    /// Timestamps may be ISO-8601 (`2024-09-18T14:45:00Z`, `+01:00` style
    /// offsets, a space instead of `T`) or plain Unix seconds. Rows are sorted
    /// by timestamp before the series invariant is checked.
    pub fn parse_csv_bytes(data: &[u8]) -> Result<Self, CsvError> {
        let len = data.len();
        let mut ticks = Vec::with_capacity(len / 32);

        // Skip header row
        let mut pos = match memchr::memchr(b'\n', data) {
            Some(nl) => nl + 1,
            None => return Ok(Self::default()),
        };
        let mut line_no = 1;

        while pos < len {
            line_no += 1;
            let line_end = memchr::memchr(b'\n', &data[pos..])
                .map(|i| pos + i)
                .unwrap_or(len);

            let line = data[pos..line_end].trim_ascii();
            if !line.is_empty() {
                let tick = parse_row(line).map_err(|reason| CsvError::Parse {
                    line: line_no,
                    reason,
                })?;
                ticks.push(tick);
            }

            pos = line_end + 1;
        }

        ticks.sort_by_key(|t| t.timestamp);
        Ok(Self::new(ticks)?)
    }
}

impl Serialize for PriceSeries {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

fn parse_row(line: &[u8]) -> Result<PriceTick, String> {
    let ts_end = memchr::memchr(b',', line).ok_or("expected at least 2 columns")?;
    let rest = &line[ts_end + 1..];
    let price_end = memchr::memchr(b',', rest).unwrap_or(rest.len());

    let timestamp = parse_timestamp(unquote(&line[..ts_end]))?;
    let price_bytes = unquote(&rest[..price_end]);
    let price: f64 = fast_float::parse(price_bytes).map_err(|_| {
        format!("bad price: {}", String::from_utf8_lossy(price_bytes))
    })?;

    Ok(PriceTick { timestamp, price })
}

fn unquote(field: &[u8]) -> &[u8] {
    let field = field.trim_ascii();
    field
        .strip_prefix(b"\"")
        .and_then(|f| f.strip_suffix(b"\""))
        .unwrap_or(field)
}

/// Parse a timestamp to Unix epoch seconds.
///
/// Handles `2024-09-18T14:45:00Z`, `2024-09-18 14:45:00`,
/// `2024-09-18T14:45:00.000+02:00` and plain integers.
pub fn parse_timestamp(bytes: &[u8]) -> Result<i64, String> {
    if !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit) {
        let s = std::str::from_utf8(bytes).map_err(|_| "non-UTF8 timestamp".to_string())?;
        return s.parse().map_err(|_| format!("bad unix timestamp: {s}"));
    }

    let s = std::str::from_utf8(bytes).map_err(|_| "non-UTF8 timestamp".to_string())?;
    if s.len() < 19 {
        return Err(format!("timestamp too short: {s}"));
    }

    let year: i32 = component(s, 0..4, "year")?;
    let month: u32 = component(s, 5..7, "month")?;
    let day: u32 = component(s, 8..10, "day")?;
    let hour: i64 = component(s, 11..13, "hour")?;
    let minute: i64 = component(s, 14..16, "minute")?;
    let second: i64 = component(s, 17..19, "second")?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(format!("date out of range: {s}"));
    }

    let mut tail = &s[19..];
    if let Some(frac) = tail.strip_prefix('.') {
        tail = frac.trim_start_matches(|c: char| c.is_ascii_digit());
    }
    let offset = parse_utc_offset(tail).ok_or_else(|| format!("bad UTC offset: {s}"))?;

    let days = days_from_civil(year, month, day);
    Ok(days * 86400 + hour * 3600 + minute * 60 + second - offset)
}

fn component<T: std::str::FromStr>(s: &str, range: std::ops::Range<usize>, name: &str) -> Result<T, String> {
    s.get(range)
        .and_then(|part| part.parse().ok())
        .ok_or_else(|| format!("bad {name}: {s}"))
}

/// Offset in seconds east of UTC. Empty and `Z` mean UTC.
fn parse_utc_offset(tail: &str) -> Option<i64> {
    if tail.is_empty() || tail == "Z" {
        return Some(0);
    }
    let sign = match tail.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = tail[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = digits[2..].parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Format Unix seconds as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(ts: i64) -> String {
    let (year, month, day) = civil_from_days(ts.div_euclid(86400));
    let secs = ts.rem_euclid(86400);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        secs / 3600,
        secs % 3600 / 60,
        secs % 60
    )
}

/// Convert civil date to days since Unix epoch (Howard Hinnant algorithm).
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let doy = (153 * m as u64 + 2) / 5 + day as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe as i64 - 719468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe as i64 + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Violations of the series invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("timestamp at tick {index} does not increase")]
    NonIncreasing { index: usize },
    #[error("irregular step at tick {index}: expected {expected}s, found {found}s")]
    IrregularStep { index: usize, expected: i64, found: i64 },
    #[error("price at tick {index} is not finite")]
    NonFinitePrice { index: usize },
}

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),
}
