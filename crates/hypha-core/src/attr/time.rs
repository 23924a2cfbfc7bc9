//! Time-indexed attribute values.
//!
//! Dynamic attributes map time to values in one of two representations:
//! [`TimestampMap`] (point timestamps) or [`IntervalMap`] (intervals with
//! open/closed ends). A per-graph [`TimeIndexStore`] inverts the mapping
//! and answers "which elements are active at time t".
//!
//! Timestamps are finite doubles; NaN is rejected at the boundary.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use roaring::RoaringBitmap;

use crate::attr::value::{AttrType, AttrValue};
use crate::config::TimeRepresentation;
use crate::error::{Error, Result};

/// A totally ordered point in time.
///
/// Wraps an f64 ordered with `total_cmp`; construction rejects NaN.
#[derive(Debug, Clone, Copy)]
pub struct TimePoint(f64);

impl TimePoint {
    /// Wraps a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] for NaN.
    pub fn new(t: f64) -> Result<Self> {
        if t.is_nan() {
            return Err(Error::InvalidTime("timestamp is NaN"));
        }
        Ok(Self(t))
    }

    /// The raw timestamp.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for TimePoint {}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time interval with independently open or closed ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    low: f64,
    high: f64,
    lopen: bool,
    ropen: bool,
}

impl Interval {
    /// Creates a closed interval `[low, high]`.
    ///
    /// # Errors
    ///
    /// See [`Interval::with_bounds`].
    pub fn new(low: f64, high: f64) -> Result<Self> {
        Self::with_bounds(low, high, false, false)
    }

    /// Creates an interval with explicit open/closed flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] for NaN bounds, inverted bounds, and
    /// degenerate intervals with an open end.
    pub fn with_bounds(low: f64, high: f64, lopen: bool, ropen: bool) -> Result<Self> {
        if low.is_nan() || high.is_nan() {
            return Err(Error::InvalidTime("interval bound is NaN"));
        }
        if low > high {
            return Err(Error::InvalidTime("interval bounds are inverted"));
        }
        if low == high && (lopen || ropen) {
            return Err(Error::InvalidTime("degenerate interval with an open end"));
        }
        Ok(Self {
            low,
            high,
            lopen,
            ropen,
        })
    }

    /// Lower bound.
    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound.
    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// True if the lower end excludes its bound.
    #[must_use]
    pub fn is_low_open(&self) -> bool {
        self.lopen
    }

    /// True if the upper end excludes its bound.
    #[must_use]
    pub fn is_high_open(&self) -> bool {
        self.ropen
    }

    /// Whether the interval contains the time point.
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        let above_low = t > self.low || (!self.lopen && t == self.low);
        let below_high = t < self.high || (!self.ropen && t == self.high);
        above_low && below_high
    }

    /// Whether the two intervals share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.high < other.low || other.high < self.low {
            return false;
        }
        if self.high == other.low {
            return !self.ropen && !other.lopen;
        }
        if other.high == self.low {
            return !other.ropen && !self.lopen;
        }
        true
    }
}

impl Eq for Interval {}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.low
            .total_cmp(&other.low)
            .then(self.high.total_cmp(&other.high))
            .then(self.lopen.cmp(&other.lopen))
            .then(self.ropen.cmp(&other.ropen))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lopen { '(' } else { '[' };
        let close = if self.ropen { ')' } else { ']' };
        write!(f, "{open}{}, {}{close}", self.low, self.high)
    }
}

/// Characters forcing the value field of the interval text form into
/// quotes.
const SPECIAL_CHARS: &[char] = &[';', ',', '(', ')', '[', ']', '"', '\''];

/// Formats an interval with an optional value field.
///
/// The value is quoted when it contains a special character or is blank;
/// backslash and double-quote inside are escaped with backslash.
#[must_use]
pub fn format_interval_with_value(interval: &Interval, value: Option<&str>) -> String {
    let open = if interval.lopen { '(' } else { '[' };
    let close = if interval.ropen { ')' } else { ']' };
    match value {
        None => format!("{open}{}, {}{close}", interval.low, interval.high),
        Some(text) => {
            let needs_quotes = text.is_empty() || text.contains(SPECIAL_CHARS);
            if needs_quotes {
                let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
                format!("{open}{}, {}, \"{escaped}\"{close}", interval.low, interval.high)
            } else {
                format!("{open}{}, {}, {text}{close}", interval.low, interval.high)
            }
        }
    }
}

/// Parses the interval text form, returning the interval and the raw
/// value field if present.
///
/// # Errors
///
/// Returns [`Error::InvalidTimeFormat`] on malformed text.
pub fn parse_interval_text(text: &str) -> Result<(Interval, Option<String>)> {
    let trimmed = text.trim();
    let malformed = || Error::InvalidTimeFormat(text.to_string());

    let mut chars = trimmed.chars();
    let lopen = match chars.next() {
        Some('[') => false,
        Some('(') => true,
        _ => return Err(malformed()),
    };
    let ropen = match trimmed.chars().last() {
        Some(']') => false,
        Some(')') => true,
        _ => return Err(malformed()),
    };
    let inner = &trimmed[1..trimmed.len() - 1];

    let fields = split_fields(inner).ok_or_else(malformed)?;
    if fields.len() < 2 || fields.len() > 3 {
        return Err(malformed());
    }

    let low: f64 = fields[0].trim().parse().map_err(|_| malformed())?;
    let high: f64 = fields[1].trim().parse().map_err(|_| malformed())?;
    if low.is_nan() || high.is_nan() {
        return Err(malformed());
    }
    let interval = Interval::with_bounds(low, high, lopen, ropen)?;

    let value = match fields.get(2) {
        None => None,
        Some(raw) => Some(unquote_field(raw).ok_or_else(malformed)?),
    };
    Ok((interval, value))
}

/// Splits on commas outside quotes. Returns None on an unterminated quote.
fn split_fields(inner: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in inner.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if in_quotes || escaped {
        return None;
    }
    fields.push(current);
    Some(fields)
}

/// Strips quotes and resolves escapes from a raw value field.
fn unquote_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('"') {
        return Some(trimmed.to_string());
    }
    if trimmed.len() < 2 || !trimmed.ends_with('"') {
        return None;
    }
    let body = &trimmed[1..trimmed.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            match c {
                '\\' | '"' => out.push(c),
                _ => return None,
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            // Unescaped quote inside the body.
            return None;
        } else {
            out.push(c);
        }
    }
    if escaped {
        return None;
    }
    Some(out)
}

/// Values keyed by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampMap {
    value_type: AttrType,
    map: BTreeMap<TimePoint, AttrValue>,
}

impl TimestampMap {
    /// Creates an empty map for scalar values of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for non-scalar value types.
    pub fn new(value_type: AttrType) -> Result<Self> {
        if !value_type.is_scalar() {
            return Err(Error::UnsupportedType(value_type.to_string()));
        }
        Ok(Self {
            value_type,
            map: BTreeMap::new(),
        })
    }

    /// The declared value type.
    #[must_use]
    pub fn value_type(&self) -> &AttrType {
        &self.value_type
    }

    /// Sets the value at a timestamp, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] for NaN and [`Error::TypeMismatch`]
    /// on a value of the wrong type.
    pub fn put(&mut self, t: f64, value: AttrValue) -> Result<Option<AttrValue>> {
        let point = TimePoint::new(t)?;
        if value.attr_type() != self.value_type {
            return Err(Error::TypeMismatch {
                column: "<timestamp value>".to_string(),
                expected: self.value_type.to_string(),
                actual: value.attr_type().to_string(),
            });
        }
        Ok(self.map.insert(point, value))
    }

    /// Removes the value at a timestamp.
    pub fn remove(&mut self, t: f64) -> Option<AttrValue> {
        let point = TimePoint::new(t).ok()?;
        self.map.remove(&point)
    }

    /// The value at an exact timestamp.
    #[must_use]
    pub fn get(&self, t: f64) -> Option<&AttrValue> {
        let point = TimePoint::new(t).ok()?;
        self.map.get(&point)
    }

    /// Values whose timestamps fall in `[low, high]`.
    pub fn range(&self, low: f64, high: f64) -> impl Iterator<Item = (f64, &AttrValue)> {
        let start = TimePoint::new(low.min(high)).unwrap_or(TimePoint(f64::NEG_INFINITY));
        let end = TimePoint::new(low.max(high)).unwrap_or(TimePoint(f64::INFINITY));
        self.map
            .range((Bound::Included(start), Bound::Included(end)))
            .map(|(point, value)| (point.get(), value))
    }

    /// All timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.map.keys().map(|point| point.get())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true when no timestamp is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Values keyed by interval.
///
/// Intervals may overlap; entries are kept in interval order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalMap {
    value_type: AttrType,
    entries: Vec<(Interval, AttrValue)>,
}

impl IntervalMap {
    /// Creates an empty map for scalar values of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for non-scalar value types.
    pub fn new(value_type: AttrType) -> Result<Self> {
        if !value_type.is_scalar() {
            return Err(Error::UnsupportedType(value_type.to_string()));
        }
        Ok(Self {
            value_type,
            entries: Vec::new(),
        })
    }

    /// The declared value type.
    #[must_use]
    pub fn value_type(&self) -> &AttrType {
        &self.value_type
    }

    /// Sets the value on an interval, replacing an entry with an equal
    /// interval (all four fields must match).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] on a value of the wrong type.
    pub fn put(&mut self, interval: Interval, value: AttrValue) -> Result<Option<AttrValue>> {
        if value.attr_type() != self.value_type {
            return Err(Error::TypeMismatch {
                column: "<interval value>".to_string(),
                expected: self.value_type.to_string(),
                actual: value.attr_type().to_string(),
            });
        }
        match self.entries.binary_search_by(|(iv, _)| iv.cmp(&interval)) {
            Ok(pos) => {
                let old = std::mem::replace(&mut self.entries[pos].1, value);
                Ok(Some(old))
            }
            Err(pos) => {
                self.entries.insert(pos, (interval, value));
                Ok(None)
            }
        }
    }

    /// Removes the entry with an exactly matching interval.
    pub fn remove(&mut self, interval: &Interval) -> Option<AttrValue> {
        match self.entries.binary_search_by(|(iv, _)| iv.cmp(interval)) {
            Ok(pos) => Some(self.entries.remove(pos).1),
            Err(_) => None,
        }
    }

    /// The exact entry for an interval, if present.
    #[must_use]
    pub fn get(&self, interval: &Interval) -> Option<&AttrValue> {
        self.entries
            .binary_search_by(|(iv, _)| iv.cmp(interval))
            .ok()
            .map(|pos| &self.entries[pos].1)
    }

    /// Values whose interval contains the time point.
    pub fn values_at(&self, t: f64) -> impl Iterator<Item = &AttrValue> {
        self.entries
            .iter()
            .filter(move |(iv, _)| iv.contains(t))
            .map(|(_, value)| value)
    }

    /// Entries whose interval overlaps the query interval.
    pub fn overlapping(&self, query: &Interval) -> impl Iterator<Item = (&Interval, &AttrValue)> {
        let query = *query;
        self.entries
            .iter()
            .filter(move |(iv, _)| iv.overlaps(&query))
            .map(|(iv, value)| (iv, value))
    }

    /// All intervals in order.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.entries.iter().map(|(iv, _)| iv)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no interval is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reverse time index: time -> elements with a dynamic value there.
///
/// One instance per element kind, matching the configured representation.
#[derive(Debug)]
pub(crate) enum TimeIndexStore {
    /// Timestamp representation: exact points.
    Timestamp(BTreeMap<TimePoint, RoaringBitmap>),
    /// Interval representation: interval keys, scanned in order.
    Interval(BTreeMap<Interval, RoaringBitmap>),
}

impl TimeIndexStore {
    pub(crate) fn new(representation: TimeRepresentation) -> Self {
        match representation {
            TimeRepresentation::Timestamp => Self::Timestamp(BTreeMap::new()),
            TimeRepresentation::Interval => Self::Interval(BTreeMap::new()),
        }
    }

    pub(crate) fn add_timestamp(&mut self, point: TimePoint, elem: u32) {
        match self {
            Self::Timestamp(map) => {
                map.entry(point).or_default().insert(elem);
            }
            Self::Interval(_) => {
                debug_assert!(false, "timestamp key on an interval-representation index");
            }
        }
    }

    pub(crate) fn remove_timestamp(&mut self, point: TimePoint, elem: u32) {
        if let Self::Timestamp(map) = self {
            if let Some(bitmap) = map.get_mut(&point) {
                bitmap.remove(elem);
                if bitmap.is_empty() {
                    map.remove(&point);
                }
            }
        }
    }

    pub(crate) fn add_interval(&mut self, interval: Interval, elem: u32) {
        match self {
            Self::Interval(map) => {
                map.entry(interval).or_default().insert(elem);
            }
            Self::Timestamp(_) => {
                debug_assert!(false, "interval key on a timestamp-representation index");
            }
        }
    }

    pub(crate) fn remove_interval(&mut self, interval: &Interval, elem: u32) {
        if let Self::Interval(map) = self {
            if let Some(bitmap) = map.get_mut(interval) {
                bitmap.remove(elem);
                if bitmap.is_empty() {
                    map.remove(interval);
                }
            }
        }
    }

    /// Elements with a dynamic value exactly at (timestamps) or covering
    /// (intervals) the time point.
    ///
    /// Interval lookup scans the interval keys whose lower bound does not
    /// exceed `t`; cost is linear in the number of such keys.
    pub(crate) fn elements_at(&self, t: f64) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        match self {
            Self::Timestamp(map) => {
                if let Ok(point) = TimePoint::new(t) {
                    if let Some(bitmap) = map.get(&point) {
                        result |= bitmap;
                    }
                }
            }
            Self::Interval(map) => {
                for (interval, bitmap) in map {
                    if interval.low() > t {
                        break;
                    }
                    if interval.contains(t) {
                        result |= bitmap;
                    }
                }
            }
        }
        result
    }

    /// Elements with a dynamic value inside the closed query range.
    pub(crate) fn elements_in(&self, low: f64, high: f64) -> RoaringBitmap {
        let mut result = RoaringBitmap::new();
        let Ok(query) = Interval::new(low.min(high), low.max(high)) else {
            return result;
        };
        match self {
            Self::Timestamp(map) => {
                let start = Bound::Included(TimePoint(query.low()));
                let end = Bound::Included(TimePoint(query.high()));
                for bitmap in map.range((start, end)).map(|(_, bitmap)| bitmap) {
                    result |= bitmap;
                }
            }
            Self::Interval(map) => {
                for (interval, bitmap) in map {
                    if interval.low() > query.high() {
                        break;
                    }
                    if interval.overlaps(&query) {
                        result |= bitmap;
                    }
                }
            }
        }
        result
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Timestamp(map) => map.clear(),
            Self::Interval(map) => map.clear(),
        }
    }

    #[cfg(test)]
    pub(crate) fn key_count(&self) -> usize {
        match self {
            Self::Timestamp(map) => map.len(),
            Self::Interval(map) => map.len(),
        }
    }
}
