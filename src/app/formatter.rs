use crate::app::config::{DateFormat, Settings, READABLE_TEMPLATE};
use crate::app::models::CompletedTask;
use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike};
use std::fmt::Display;
use std::path::Path;

pub const LOG_HEADER: &str = "# Task Log\n\nThis file contains a log of completed tasks.\n\n---\n";

/// Fallback abbreviations keyed by minutes east of UTC. Lookup is first match,
/// so -300 and -240 each have an entry that can never be reached.
const OFFSET_ABBREVIATIONS: &[(i32, &str)] = &[
    (-480, "PST"),
    (-420, "PDT"),
    (-360, "MST"),
    (-300, "MDT"),
    (-300, "CST"),
    (-240, "CDT"),
    (-240, "EST"),
    (-180, "EDT"),
    (0, "UTC"),
    (60, "CET"),
    (120, "EET"),
];

pub struct EntryFormatter;

impl EntryFormatter {
    /// Builds one log entry: optional heading and source reference, the task
    /// line verbatim, then the `---` separator.
    pub fn format_entry(task: &CompletedTask, source: &str, settings: &Settings) -> String {
        let mut parts = Vec::new();

        if settings.include_timestamp {
            parts.push(format!("## {}", format_local_date(&task.completed_at, settings)));
        }

        if settings.include_source_file {
            parts.push(format!("**Source:** [[{}]]", source_basename(source)));
            parts.push(format!("**Line:** {}", task.line_number));
        }

        parts.push(task.full_line.clone());
        parts.push("---\n".to_string());

        parts.join("\n")
    }
}

/// File name without its extension, as used in `[[wiki links]]`.
pub fn source_basename(source: &str) -> String {
    let normalized = source.replace('\\', "/");
    Path::new(&normalized)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(normalized)
}

/// Formats a wall-clock instant, naming its zone after the system time zone.
pub fn format_local_date(instant: &DateTime<Local>, settings: &Settings) -> String {
    render_date(instant, settings, &local_timezone_abbreviation(instant))
}

pub fn format_date<Tz>(instant: &DateTime<Tz>, settings: &Settings) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    render_date(instant, settings, &timezone_abbreviation(instant))
}

fn render_date<Tz: TimeZone>(instant: &DateTime<Tz>, settings: &Settings, timezone: &str) -> String {
    let year = instant.year();
    let month = format!("{:02}", instant.month());
    let day = format!("{:02}", instant.day());
    let hours = instant.hour();
    let hours24 = format!("{:02}", hours);
    let hour12 = match hours {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    let meridiem = if hours >= 12 { "PM" } else { "AM" };
    let minutes = format!("{:02}", instant.minute());
    let seconds = format!("{:02}", instant.second());
    let millis = format!("{:03}", instant.timestamp_subsec_millis().min(999));

    match settings.date_format {
        DateFormat::Readable => format!(
            "{}-{}-{} {}:{} {} {}",
            year, month, day, hour12, minutes, meridiem, timezone
        ),
        DateFormat::IsoDateTimeMs => format!(
            "{}-{}-{}T{}:{}:{}.{}Z",
            year, month, day, hours24, minutes, seconds, millis
        ),
        DateFormat::IsoDate => format!("{}-{}-{}", year, month, day),
        DateFormat::IsoDateTime => {
            format!("{}-{}-{} {}:{}:{}", year, month, day, hours24, minutes, seconds)
        }
        DateFormat::UsDate => format!("{}/{}/{}", month, day, year),
        DateFormat::EuDate => format!("{}/{}/{}", day, month, year),
        DateFormat::Custom => {
            let template = if settings.custom_date_format.is_empty() {
                READABLE_TEMPLATE
            } else {
                settings.custom_date_format.as_str()
            };
            // Plain find/replace in this exact order; no escaping.
            template
                .replace("YYYY", &year.to_string())
                .replace("MM", &month)
                .replace("DD", &day)
                .replace("HH", &hours24)
                .replace('h', &hour12.to_string())
                .replace("mm", &minutes)
                .replace("ss", &seconds)
                .replace("sss", &millis)
                .replace('A', meridiem)
                .replace("TZ", timezone)
        }
    }
}

/// Short name of the system time zone at `instant`, e.g. `EST` or `CEST`.
///
/// Falls back to [`timezone_abbreviation`] when the zone cannot be determined
/// or disagrees with the instant's offset (a `TZ` override, for one).
pub fn local_timezone_abbreviation(instant: &DateTime<Local>) -> String {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|zone| abbreviation_in_zone(&zone, instant))
        .unwrap_or_else(|| timezone_abbreviation(instant))
}

/// Abbreviation of the IANA zone `zone` at `instant`. `None` if the zone is
/// unknown or its offset at that moment differs from the instant's.
pub fn abbreviation_in_zone<Tz: TimeZone>(zone: &str, instant: &DateTime<Tz>) -> Option<String> {
    let tz: chrono_tz::Tz = zone.parse().ok()?;
    let zoned = instant.with_timezone(&tz);
    (zoned.offset().fix() == instant.offset().fix()).then(|| zoned.format("%Z").to_string())
}

/// Named zone if the offset knows its own name, otherwise the fixed table,
/// otherwise `±HH:MM`.
pub fn timezone_abbreviation<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let named = instant.offset().to_string();
    if !named.is_empty() && named.chars().all(|c| c.is_ascii_alphabetic()) {
        return named;
    }
    let minutes = instant.offset().fix().local_minus_utc() / 60;
    abbreviation_for_offset(minutes)
}

pub fn abbreviation_for_offset(minutes_east: i32) -> String {
    if let Some((_, abbr)) = OFFSET_ABBREVIATIONS
        .iter()
        .find(|(offset, _)| *offset == minutes_east)
    {
        return abbr.to_string();
    }
    let sign = if minutes_east >= 0 { '+' } else { '-' };
    let abs = minutes_east.abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}
