//! Purpose: Turn a nullable numeric or textual timestamp token into an absolute instant.
//! Exports: `LayoutCache`, `SHARED_LAYOUT_CACHE`, `read_time`, `parse_time`, `time_from_epoch_seconds`, `layout_names`.
//! Role: Temporal leaf of the binding resolver; owns layout inference for ambiguous text.
//! Invariants: Native JSON numbers are Unix epoch seconds, truncated to microseconds.
//! Invariants: The layout cache is a hint only; a miss always falls back to the full ordered scan.
//! Invariants: Cache slots are atomics, so sharing one across workers is race-free.

mod layouts;

use std::sync::atomic::{AtomicUsize, Ordering};

use time::OffsetDateTime;

use crate::core::error::{Error, Representation};
use crate::core::token::{TokenCursor, TokenKind};

pub use layouts::LayoutError;
use layouts::LAYOUTS;

/// Single-slot memory of the most recent layout that parsed successfully.
#[derive(Debug)]
pub struct LayoutCache {
    // Layout index + 1; zero means empty.
    slot: AtomicUsize,
}

impl LayoutCache {
    pub const fn new() -> Self {
        Self {
            slot: AtomicUsize::new(0),
        }
    }

    fn get(&self) -> Option<usize> {
        match self.slot.load(Ordering::Relaxed) {
            0 => None,
            slot => Some(slot - 1),
        }
    }

    fn record(&self, index: usize) {
        self.slot.store(index + 1, Ordering::Relaxed);
    }

    /// Name of the cached layout, if any.
    pub fn current(&self) -> Option<&'static str> {
        self.get()
            .and_then(|index| LAYOUTS.get(index))
            .map(|layout| layout.name())
    }

    pub fn clear(&self) {
        self.slot.store(0, Ordering::Relaxed);
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide cache used by decoders with the shared cache policy.
pub static SHARED_LAYOUT_CACHE: LayoutCache = LayoutCache::new();

/// Names of the supported layouts in scan order.
pub fn layout_names() -> impl Iterator<Item = &'static str> {
    LAYOUTS.iter().map(|layout| layout.name())
}

pub fn time_from_epoch_seconds(seconds: f64) -> Result<OffsetDateTime, Error> {
    if !seconds.is_finite() {
        return Err(Error::malformed(Representation::Time, seconds.to_string())
            .with_message("epoch seconds must be finite"));
    }
    let micros = (seconds * 1_000_000.0) as i64;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).map_err(|err| {
        Error::malformed(Representation::Time, seconds.to_string())
            .with_message("epoch seconds out of range")
            .with_source(err)
    })
}

/// Parses timestamp text, consulting `cache` first when one is supplied.
pub fn parse_time(text: &str, cache: Option<&LayoutCache>) -> Result<OffsetDateTime, Error> {
    let layouts = &*LAYOUTS;
    let cached = cache.and_then(LayoutCache::get);
    if let Some(layout) = cached.and_then(|index| layouts.get(index)) {
        if let Ok(ts) = layout.parse(text) {
            tracing::trace!(layout = layout.name(), "timestamp layout cache hit");
            return Ok(ts);
        }
        tracing::trace!(layout = layout.name(), "timestamp layout cache miss");
    }

    let mut last_err = None;
    for (index, layout) in layouts.iter().enumerate() {
        if cached == Some(index) {
            continue;
        }
        match layout.parse(text) {
            Ok(ts) => {
                if let Some(cache) = cache {
                    cache.record(index);
                }
                return Ok(ts);
            }
            Err(err) => last_err = Some((layout.name(), err)),
        }
    }

    if let Some(seconds) = textual_epoch(text) {
        return time_from_epoch_seconds(seconds);
    }

    let err = Error::malformed(Representation::Time, text);
    Err(match last_err {
        Some((name, source)) => err
            .with_message(format!("no timestamp layout matched (last tried: {name})"))
            .with_source(source),
        None => err.with_message("no timestamp layout matched"),
    })
}

/// Epoch seconds rendered as float text, e.g. "1.6250976005E9".
///
/// Bare digit runs are rejected so compact dates such as "20210701" stay malformed.
fn textual_epoch(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.contains(['.', 'e', 'E']) {
        return None;
    }
    text.parse::<f64>().ok().filter(|seconds| seconds.is_finite())
}

/// Reads a nullable timestamp token: native numbers are epoch seconds, strings are layout-parsed.
pub fn read_time(
    cursor: &mut dyn TokenCursor,
    cache: Option<&LayoutCache>,
) -> Result<Option<OffsetDateTime>, Error> {
    if cursor.kind() == TokenKind::Number {
        return match cursor.number_or_null()? {
            Some(seconds) => time_from_epoch_seconds(seconds).map(Some),
            None => Ok(None),
        };
    }
    let Some(text) = cursor.string_or_null()? else {
        return Ok(None);
    };
    parse_time(&text, cache).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{LayoutCache, layout_names, parse_time, read_time, time_from_epoch_seconds};
    use crate::core::error::{ErrorKind, Representation};
    use crate::core::token::Token;
    use std::borrow::Cow;
    use time::macros::datetime;

    #[test]
    fn epoch_seconds_keep_microseconds() {
        let ts = time_from_epoch_seconds(1625097600.5).expect("epoch");
        assert_eq!(ts, datetime!(2021-07-01 00:00:00.5 UTC));

        let ts = time_from_epoch_seconds(1.0000019).expect("epoch");
        assert_eq!(ts, datetime!(1970-01-01 00:00:01.000001 UTC));
    }

    #[test]
    fn non_finite_epoch_is_malformed() {
        let err = time_from_epoch_seconds(f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed(Representation::Time));
    }

    #[test]
    fn numeric_token_is_epoch() {
        let ts = read_time(&mut Token::Number(1625097600.5), None)
            .expect("read")
            .expect("present");
        assert_eq!(ts, datetime!(2021-07-01 00:00:00.500000 UTC));
    }

    #[test]
    fn null_token_is_absent() {
        assert_eq!(read_time(&mut Token::Null, None).expect("read"), None);
    }

    #[test]
    fn string_token_is_layout_parsed() {
        let mut token = Token::Str(Cow::Borrowed("2021-07-01 12:30:00"));
        let ts = read_time(&mut token, None).expect("read").expect("present");
        assert_eq!(ts, datetime!(2021-07-01 12:30:00 UTC));
    }

    #[test]
    fn successful_layout_is_cached() {
        let cache = LayoutCache::new();
        assert_eq!(cache.current(), None);
        parse_time("2021-07-01T12:30:00Z", Some(&cache)).expect("parse");
        let first = cache.current().expect("cached layout");

        parse_time("2021-07-02T08:00:00Z", Some(&cache)).expect("parse");
        assert_eq!(cache.current(), Some(first));

        parse_time("07/01/2021", Some(&cache)).expect("parse");
        assert_ne!(cache.current(), Some(first));

        cache.clear();
        assert_eq!(cache.current(), None);
    }

    #[test]
    fn stale_cache_never_rejects() {
        let cache = LayoutCache::new();
        parse_time("07/01/2021", Some(&cache)).expect("prime");
        let ts = parse_time("2021-07-01 12:30:00", Some(&cache)).expect("parse");
        assert_eq!(ts, datetime!(2021-07-01 12:30:00 UTC));
    }

    #[test]
    fn textual_epoch_is_accepted_after_layouts() {
        let ts = parse_time("1.6250976005E9", None).expect("parse");
        assert_eq!(ts, datetime!(2021-07-01 00:00:00.5 UTC));
    }

    #[test]
    fn bare_digit_strings_are_not_epochs() {
        for text in ["20210701", "12345", " 1625097600 "] {
            let err = parse_time(text, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed(Representation::Time), "{text}");
            assert_eq!(err.raw(), Some(text));
        }
        let ts = parse_time("1625097600.0", None).expect("decimal epoch");
        assert_eq!(ts, datetime!(2021-07-01 00:00:00 UTC));
    }

    #[test]
    fn unmatched_text_reports_last_layout() {
        let err = parse_time("not a time", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed(Representation::Time));
        assert_eq!(err.raw(), Some("not a time"));
        let last = layout_names().last().expect("layouts");
        assert!(err.message().expect("message").contains(last));
        assert!(std::error::Error::source(&err).is_some());
    }
}
