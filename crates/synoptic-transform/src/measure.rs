//! Measurement transforms: millimetre values and clock positions.

use std::sync::LazyLock;

use regex::Regex;
use synoptic_model::ReportType;

use crate::error::{Result, TransformError};
use crate::registry::{Transform, TransformInput, TransformKind};

static MEASUREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<number>\d+(?:[.,]\d+)?)\s*(?P<unit>mm|cm|millimet(?:er|re)s?|centimet(?:er|re)s?)?\b",
    )
    .expect("Invalid measurement regex")
});

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<hour>\d{1,2})(?:\s*[:h]\s*(?P<minute>\d{2}))?(?P<oclock>\s*o\s*'?\s*clock)?",
    )
    .expect("Invalid clock regex")
});

/// Formats with at most two decimals and no trailing zeros.
fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// First measurement in millimetres. A value with a unit wins over a bare
/// number; centimetres are converted.
pub fn millimetres(raw: &str) -> Result<String> {
    let mut bare: Option<f64> = None;
    for caps in MEASUREMENT.captures_iter(raw) {
        let number: f64 = caps["number"]
            .replace(',', ".")
            .parse()
            .map_err(|_| TransformError::invalid("mm", raw, "not a number"))?;
        match caps.name("unit").map(|u| u.as_str().to_ascii_lowercase()) {
            Some(unit) if unit.starts_with('c') => return Ok(format_number(number * 10.0)),
            Some(_) => return Ok(format_number(number)),
            None => {
                bare.get_or_insert(number);
            }
        }
    }
    bare.map(format_number)
        .ok_or_else(|| TransformError::invalid("mm", raw, "no measurement"))
}

/// Clock position in the canonical form of the report type: `H o'clock` for
/// operative reports, `HH:MM` for pathology reports.
pub fn clock_position(raw: &str, report_type: ReportType) -> Result<String> {
    let mut fallback = None;
    let mut chosen = None;
    for caps in CLOCK.captures_iter(raw) {
        if caps.name("minute").is_some() || caps.name("oclock").is_some() {
            chosen = Some(caps);
            break;
        }
        if fallback.is_none() {
            fallback = Some(caps);
        }
    }
    let caps = chosen
        .or(fallback)
        .ok_or_else(|| TransformError::invalid("clock_position", raw, "no clock position"))?;

    let hour: u32 = caps["hour"]
        .parse()
        .map_err(|_| TransformError::invalid("clock_position", raw, "bad hour"))?;
    let minute: u32 = match caps.name("minute") {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| TransformError::invalid("clock_position", raw, "bad minute"))?,
        None => 0,
    };
    if !(1..=12).contains(&hour) || minute >= 60 {
        return Err(TransformError::invalid(
            "clock_position",
            raw,
            "outside the clock face",
        ));
    }
    Ok(match report_type {
        ReportType::Alpha if minute == 0 => format!("{hour} o'clock"),
        ReportType::Alpha => format!("{hour}:{minute:02} o'clock"),
        ReportType::Numeric => format!("{hour:02}:{minute:02}"),
    })
}

pub struct Millimetres;

impl Transform for Millimetres {
    fn name(&self) -> &'static str {
        "mm"
    }

    fn description(&self) -> &'static str {
        "Measurement in millimetres"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Cleaning
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        millimetres(&input.value.primary)
    }
}

pub struct ClockPosition;

impl Transform for ClockPosition {
    fn name(&self) -> &'static str {
        "clock_position"
    }

    fn description(&self) -> &'static str {
        "Clock position in the report type's canonical form"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Cleaning
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        clock_position(&input.value.primary, input.report_type)
    }
}
