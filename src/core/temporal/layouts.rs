// Ordered timestamp layout table and the piecewise matcher that applies one layout.
use std::fmt;
use std::num::NonZeroU8;
use std::sync::LazyLock;

use time::error::{ComponentRange, InvalidFormatDescription, ParseFromDescription};
use time::format_description::{self, BorrowedFormatItem};
use time::parsing::Parsed;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Clone, Copy, Debug)]
enum Piece {
    /// `time` format description.
    Items(&'static str),
    /// Optional `.`/`,` fraction of a second.
    Fraction,
    /// `±hhmm` or `±hh:mm`; `zulu` also accepts a bare `Z`.
    Offset { colon: bool, zulu: bool },
    /// Alphabetic zone abbreviation such as `MST`, read as a zero offset.
    ZoneName,
}

use Piece::{Fraction, Items, Offset, ZoneName};

struct LayoutSpec {
    name: &'static str,
    pieces: &'static [Piece],
}

const fn spec(name: &'static str, pieces: &'static [Piece]) -> LayoutSpec {
    LayoutSpec { name, pieces }
}

// Order matters: the first layout that consumes the whole input wins.
// Every `[second]` may carry a trailing fraction and 24-hour fields take one or two digits.
const LAYOUT_SPECS: &[LayoutSpec] = &[
    spec("date", &[Items("[year]-[month]-[day]")]),
    spec(
        "datetime",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
        ],
    ),
    spec(
        "day-mon-yy",
        &[Items("[day]-[month repr:short case_sensitive:false]-[year repr:last_two]")],
    ),
    spec(
        "day-mon-yy-clock",
        &[
            Items(
                "[day]-[month repr:short case_sensitive:false]-[year repr:last_two] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
        ],
    ),
    spec(
        "day-mon-yy-clock12",
        &[
            Items(
                "[day]-[month repr:short case_sensitive:false]-[year repr:last_two] [hour repr:12]:[minute]:[second]",
            ),
            Fraction,
            Items(" [period]"),
        ],
    ),
    spec(
        "day-mon-yy-dotted-micros12",
        &[Items(
            "[day]-[month repr:short case_sensitive:false]-[year repr:last_two] [hour repr:12].[minute].[second].[subsecond digits:6] [period]",
        )],
    ),
    spec(
        "iso-offset",
        &[
            Items("[year]-[month]-[day]T[hour padding:none]:[minute]:[second]"),
            Fraction,
            Offset {
                colon: false,
                zulu: false,
            },
        ],
    ),
    spec(
        "rfc3339",
        &[
            Items("[year]-[month]-[day]T[hour padding:none]:[minute]:[second]"),
            Fraction,
            Offset {
                colon: true,
                zulu: true,
            },
        ],
    ),
    spec(
        "iso-local",
        &[
            Items("[year]-[month]-[day]T[hour padding:none]:[minute]:[second]"),
            Fraction,
        ],
    ),
    spec(
        "rfc1123-numeric",
        &[
            Items(
                "[weekday repr:short case_sensitive:false], [day] [month repr:short case_sensitive:false] [year] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" "),
            Offset {
                colon: false,
                zulu: false,
            },
        ],
    ),
    spec(
        "rfc1123",
        &[
            Items(
                "[weekday repr:short case_sensitive:false], [day] [month repr:short case_sensitive:false] [year] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" "),
            ZoneName,
        ],
    ),
    spec(
        "rfc822-numeric",
        &[
            Items(
                "[day] [month repr:short case_sensitive:false] [year repr:last_two] [hour padding:none]:[minute] ",
            ),
            Offset {
                colon: false,
                zulu: false,
            },
        ],
    ),
    spec(
        "rfc822",
        &[
            Items(
                "[day] [month repr:short case_sensitive:false] [year repr:last_two] [hour padding:none]:[minute] ",
            ),
            ZoneName,
        ],
    ),
    spec(
        "rfc850",
        &[
            Items(
                "[weekday case_sensitive:false], [day]-[month repr:short case_sensitive:false]-[year repr:last_two] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" "),
            ZoneName,
        ],
    ),
    spec(
        "ctime",
        &[
            Items(
                "[weekday repr:short case_sensitive:false] [month repr:short case_sensitive:false] [day padding:space] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" [year]"),
        ],
    ),
    spec(
        "unix-date",
        &[
            Items(
                "[weekday repr:short case_sensitive:false] [month repr:short case_sensitive:false] [day padding:space] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" "),
            ZoneName,
            Items(" [year]"),
        ],
    ),
    spec(
        "ruby-date",
        &[
            Items(
                "[weekday repr:short case_sensitive:false] [month repr:short case_sensitive:false] [day] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
            Items(" "),
            Offset {
                colon: false,
                zulu: false,
            },
            Items(" [year]"),
        ],
    ),
    spec(
        "display",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Items(" "),
            Offset {
                colon: false,
                zulu: false,
            },
            Items(" "),
            ZoneName,
        ],
    ),
    spec(
        "day-month-year",
        &[Items("[day] [month repr:short case_sensitive:false] [year]")],
    ),
    spec(
        "datetime-spaced-offset-colon",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Items(" "),
            Offset {
                colon: true,
                zulu: false,
            },
        ],
    ),
    spec(
        "datetime-spaced-offset",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Items(" "),
            Offset {
                colon: false,
                zulu: false,
            },
        ],
    ),
    spec(
        "datetime-zulu-colon",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Offset {
                colon: true,
                zulu: true,
            },
        ],
    ),
    spec(
        "datetime-zulu",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Offset {
                colon: false,
                zulu: true,
            },
        ],
    ),
    spec(
        "datetime-zone-name",
        &[
            Items("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
            Items(" "),
            ZoneName,
        ],
    ),
    spec(
        "kitchen",
        &[Items("[hour repr:12 padding:none]:[minute][period]")],
    ),
    spec(
        "stamp",
        &[
            Items(
                "[month repr:short case_sensitive:false] [day padding:space] [hour padding:none]:[minute]:[second]",
            ),
            Fraction,
        ],
    ),
    spec(
        "us-short-yy",
        &[Items("[month padding:none]/[day padding:none]/[year repr:last_two]")],
    ),
    spec("us-yy", &[Items("[month]/[day]/[year repr:last_two]")]),
    spec(
        "us-short",
        &[Items("[month padding:none]/[day padding:none]/[year]")],
    ),
    spec("us", &[Items("[month]/[day]/[year]")]),
    spec(
        "us-clock",
        &[Items("[month]/[day]/[year] [hour padding:none]:[minute]")],
    ),
    spec(
        "us-clock-seconds",
        &[
            Items("[month]/[day]/[year] [hour padding:none]:[minute]:[second]"),
            Fraction,
        ],
    ),
    spec(
        "us-clock12",
        &[
            Items("[month]/[day]/[year] [hour repr:12]:[minute]:[second]"),
            Fraction,
            Items(" [period]"),
        ],
    ),
    spec(
        "datetime-minutes",
        &[Items("[year]-[month]-[day] [hour padding:none]:[minute]")],
    ),
    spec(
        "iso-minutes",
        &[Items("[year]-[month]-[day]T[hour padding:none]:[minute]")],
    ),
    spec(
        "slashed-datetime",
        &[
            Items("[year]/[month]/[day] [hour padding:none]:[minute]:[second]"),
            Fraction,
        ],
    ),
];

#[derive(Debug)]
pub enum LayoutError {
    Items(ParseFromDescription),
    Component(ComponentRange),
    Offset,
    ZoneName,
    Trailing(usize),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Items(err) => write!(f, "{err}"),
            LayoutError::Component(err) => write!(f, "{err}"),
            LayoutError::Offset => f.write_str("expected a numeric zone offset"),
            LayoutError::ZoneName => f.write_str("expected a zone abbreviation"),
            LayoutError::Trailing(count) => write!(f, "{count} unparsed trailing bytes"),
        }
    }
}

impl std::error::Error for LayoutError {}

impl From<ComponentRange> for LayoutError {
    fn from(err: ComponentRange) -> Self {
        LayoutError::Component(err)
    }
}

enum CompiledPiece {
    Items(Vec<BorrowedFormatItem<'static>>),
    Fraction,
    Offset { colon: bool, zulu: bool },
    ZoneName,
}

pub struct Layout {
    name: &'static str,
    pieces: Vec<CompiledPiece>,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parse(&self, input: &str) -> Result<OffsetDateTime, LayoutError> {
        let mut rest = input.as_bytes();
        let mut parsed = Parsed::new();
        let mut fraction = None;
        let mut offset = None;

        for piece in &self.pieces {
            rest = match piece {
                CompiledPiece::Items(items) => {
                    parsed.parse_items(rest, items).map_err(LayoutError::Items)?
                }
                CompiledPiece::Fraction => {
                    let (nanos, rest) = take_fraction(rest);
                    fraction = fraction.or(nanos);
                    rest
                }
                CompiledPiece::Offset { colon, zulu } => {
                    let (value, rest) = take_offset(rest, *colon, *zulu)?;
                    offset = Some(value);
                    rest
                }
                CompiledPiece::ZoneName => {
                    let rest = take_zone_name(rest)?;
                    offset.get_or_insert(UtcOffset::UTC);
                    rest
                }
            };
        }
        if !rest.is_empty() {
            return Err(LayoutError::Trailing(rest.len()));
        }
        assemble(&parsed, fraction, offset.unwrap_or(UtcOffset::UTC))
    }
}

pub static LAYOUTS: LazyLock<Vec<Layout>> = LazyLock::new(compile_layouts);

fn compile_layouts() -> Vec<Layout> {
    LAYOUT_SPECS
        .iter()
        .filter_map(|spec| match compile(spec) {
            Ok(layout) => Some(layout),
            Err(err) => {
                tracing::error!(layout = spec.name, %err, "skipping invalid timestamp layout");
                None
            }
        })
        .collect()
}

fn compile(spec: &LayoutSpec) -> Result<Layout, InvalidFormatDescription> {
    let pieces = spec
        .pieces
        .iter()
        .map(|piece| {
            Ok(match *piece {
                Piece::Items(description) => {
                    CompiledPiece::Items(format_description::parse_borrowed::<1>(description)?)
                }
                Piece::Fraction => CompiledPiece::Fraction,
                Piece::Offset { colon, zulu } => CompiledPiece::Offset { colon, zulu },
                Piece::ZoneName => CompiledPiece::ZoneName,
            })
        })
        .collect::<Result<Vec<_>, InvalidFormatDescription>>()?;
    Ok(Layout {
        name: spec.name,
        pieces,
    })
}

fn take_fraction(input: &[u8]) -> (Option<u32>, &[u8]) {
    let [separator, rest @ ..] = input else {
        return (None, input);
    };
    if !matches!(*separator, b'.' | b',') {
        return (None, input);
    }
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return (None, input);
    }
    let mut nanos = 0u32;
    for position in 0..9 {
        let digit = if position < digits {
            u32::from(rest[position] - b'0')
        } else {
            0
        };
        nanos = nanos * 10 + digit;
    }
    (Some(nanos), &rest[digits..])
}

fn two_digits(input: &[u8]) -> Option<(i8, &[u8])> {
    match input {
        [a, b, rest @ ..] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some((((a - b'0') * 10 + (b - b'0')) as i8, rest))
        }
        _ => None,
    }
}

fn take_offset(input: &[u8], colon: bool, zulu: bool) -> Result<(UtcOffset, &[u8]), LayoutError> {
    if zulu {
        if let [b'Z', rest @ ..] = input {
            return Ok((UtcOffset::UTC, rest));
        }
    }
    let (sign, rest) = match input {
        [b'+', rest @ ..] => (1i8, rest),
        [b'-', rest @ ..] => (-1i8, rest),
        _ => return Err(LayoutError::Offset),
    };
    let (hours, rest) = two_digits(rest).ok_or(LayoutError::Offset)?;
    let rest = if colon {
        match rest {
            [b':', rest @ ..] => rest,
            _ => return Err(LayoutError::Offset),
        }
    } else {
        rest
    };
    let (minutes, rest) = two_digits(rest).ok_or(LayoutError::Offset)?;
    let offset = UtcOffset::from_hms(sign * hours, sign * minutes, 0)?;
    Ok((offset, rest))
}

fn take_zone_name(input: &[u8]) -> Result<&[u8], LayoutError> {
    let upper = input.iter().take_while(|b| b.is_ascii_uppercase()).count();
    let accepted = match upper {
        3 => true,
        4 => input[3] == b'T' || &input[..4] == b"WITA",
        5 => input[4] == b'T',
        _ => false,
    };
    if accepted {
        Ok(&input[upper..])
    } else {
        Err(LayoutError::ZoneName)
    }
}

fn assemble(
    parsed: &Parsed,
    fraction: Option<u32>,
    offset: UtcOffset,
) -> Result<OffsetDateTime, LayoutError> {
    let year = match (parsed.year(), parsed.year_last_two()) {
        (Some(year), _) => year,
        (None, Some(yy)) if yy >= 69 => 1900 + i32::from(yy),
        (None, Some(yy)) => 2000 + i32::from(yy),
        (None, None) => 0,
    };
    let month = parsed.month().unwrap_or(Month::January);
    let day = parsed.day().map_or(1, NonZeroU8::get);
    let hour = match (parsed.hour_24(), parsed.hour_12()) {
        (Some(hour), _) => hour,
        (None, Some(hour)) => {
            let pm = parsed.hour_12_is_pm().unwrap_or(false);
            hour.get() % 12 + if pm { 12 } else { 0 }
        }
        (None, None) => 0,
    };
    let minute = parsed.minute().unwrap_or(0);
    let second = parsed.second().unwrap_or(0);
    let nanos = fraction.or(parsed.subsecond()).unwrap_or(0);

    let date = Date::from_calendar_date(year, month, day)?;
    let time = Time::from_hms_nano(hour, minute, second, nanos)?;
    Ok(PrimitiveDateTime::new(date, time).assume_offset(offset))
}
