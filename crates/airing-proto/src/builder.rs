//! Timetable generation from two CSV sheets.
//!
//! * URL sheet: `channel,url`: where each channel streams.
//! * Program sheet: `start_time,day_category,program_name,channels`: one
//!   row per recurring program.  `channels` may list several channel names
//!   separated by `、` or `,`; the first one with a known URL is used.
//!
//! Both sheets start with a header row.  The output is the canonical JSON
//! document read by `Schedule::from_json_str`.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, TimetableError};
use crate::schedule::{Day, Hour, ProgramEntry, Schedule};

/// Which days a program row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCategory {
    Daily,
    Weekdays,
    Weekend,
    Saturday,
    Sunday,
}

impl DayCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "每天" => Some(Self::Daily),
            "平日" => Some(Self::Weekdays),
            "週末" => Some(Self::Weekend),
            "週六" => Some(Self::Saturday),
            "週日" => Some(Self::Sunday),
            other => match other.to_ascii_lowercase().as_str() {
                "daily" | "everyday" => Some(Self::Daily),
                "weekdays" => Some(Self::Weekdays),
                "weekend" => Some(Self::Weekend),
                "saturday" => Some(Self::Saturday),
                "sunday" => Some(Self::Sunday),
                _ => None,
            },
        }
    }

    pub fn days(self) -> Vec<Day> {
        match self {
            Self::Daily => Day::all().collect(),
            Self::Weekdays => vec![
                Day::MONDAY,
                Day::TUESDAY,
                Day::WEDNESDAY,
                Day::THURSDAY,
                Day::FRIDAY,
            ],
            Self::Weekend => vec![Day::SATURDAY, Day::SUNDAY],
            Self::Saturday => vec![Day::SATURDAY],
            Self::Sunday => vec![Day::SUNDAY],
        }
    }
}

/// Rewrites YouTube `/live/<id>` and `/watch?v=<id>` links to their
/// `/embed/<id>` form.  Embed links and other hosts pass through.
pub fn embed_url(url: &str) -> String {
    if url.contains("/embed/") {
        return url.to_string();
    }
    let video_id = Regex::new(r"(youtube\.com/live/|youtube\.com/watch\?v=)([a-zA-Z0-9_-]+)")
        .ok()
        .and_then(|re| re.captures(url))
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string());
    match video_id {
        Some(id) => format!("https://www.youtube.com/embed/{id}"),
        None => url.to_string(),
    }
}

/// First channel in `channels` that has a URL; otherwise the first name.
pub fn pick_channel(channels: &str, urls: &HashMap<String, String>) -> (String, Option<String>) {
    let names: Vec<&str> = channels
        .split(['、', ','])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    for name in &names {
        if let Some(url) = urls.get(*name) {
            return (name.to_string(), Some(url.clone()));
        }
    }
    let first = names.first().copied().unwrap_or_default().to_string();
    (first, None)
}

/// Minimal CSV reader: commas, double-quoted fields with `""` escapes,
/// LF or CRLF line ends.  A quote only opens a quoted field as its first
/// character; anywhere else it is literal.  Returns `(line_number, fields)`,
/// blank lines dropped.
pub fn parse_csv(content: &str) -> Vec<(usize, Vec<String>)> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = content.trim_start_matches('\u{feff}').chars().peekable();

    let mut finish_row = |row: &mut Vec<String>, field: &mut String, at: usize| {
        row.push(std::mem::take(field));
        if row.iter().any(|f| !f.trim().is_empty()) {
            rows.push((at, std::mem::take(row)));
        } else {
            row.clear();
        }
    };

    while let Some(c) = chars.next() {
        let at_start = std::mem::replace(&mut field_start, false);
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' if in_quotes => in_quotes = false,
            '"' if at_start => in_quotes = true,
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                field_start = true;
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => field_start = at_start,
            '\n' if !in_quotes => {
                finish_row(&mut row, &mut field, row_line);
                line += 1;
                row_line = line;
                field_start = true;
            }
            '\n' => {
                line += 1;
                field.push(c);
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        finish_row(&mut row, &mut field, row_line);
    }
    rows
}

/// Channel → stream URL, header row skipped.
pub fn parse_url_map(content: &str) -> HashMap<String, String> {
    parse_csv(content)
        .into_iter()
        .skip(1)
        .filter_map(|(_, fields)| match fields.as_slice() {
            [channel, url, ..] if !channel.trim().is_empty() => {
                Some((channel.trim().to_string(), url.trim().to_string()))
            }
            _ => None,
        })
        .collect()
}

/// Result of a build, with the rows that were dropped and why.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub schedule: Schedule,
    pub programs: usize,
    pub skipped: Vec<String>,
}

pub fn build_schedule(urls_csv: &str, table_csv: &str) -> Result<BuildReport> {
    let urls = parse_url_map(urls_csv);
    let mut schedule = Schedule::empty();
    let mut programs = 0;
    let mut skipped = Vec::new();

    for (line, fields) in parse_csv(table_csv).into_iter().skip(1) {
        let [start_time, category, program_name, channels] = fields.as_slice() else {
            return Err(TimetableError::CsvRow {
                file: "program table".into(),
                line,
                reason: format!("expected 4 fields, found {}", fields.len()),
            });
        };

        let Some(hour) = start_time
            .trim()
            .split(':')
            .next()
            .and_then(|h| h.trim().parse::<u32>().ok())
            .and_then(Hour::new)
        else {
            warn!("Skipping row {} with invalid start time {:?}", line, start_time);
            skipped.push(format!("line {line}: invalid start time {start_time:?}"));
            continue;
        };

        let Some(category) = DayCategory::parse(category) else {
            warn!("Skipping row {} with unknown day category {:?}", line, category);
            skipped.push(format!("line {line}: unknown day category {category:?}"));
            continue;
        };

        let (channel, watch_url) = pick_channel(channels, &urls);
        let mut entry = ProgramEntry::new(channel, program_name.trim());
        if let Some(watch_url) = watch_url {
            let embed = embed_url(&watch_url);
            if embed != watch_url {
                entry = entry.with_live_url(watch_url);
            }
            entry = entry.with_embed_url(embed);
        }

        for day in category.days() {
            schedule.slot_mut(day, hour).push_unique(entry.clone());
        }
        programs += 1;
    }

    Ok(BuildReport {
        schedule,
        programs,
        skipped,
    })
}

/// Reads both sheets, writes the JSON document to `out`.
pub fn build_files(urls: &Path, table: &Path, out: &Path) -> Result<BuildReport> {
    let urls_csv = std::fs::read_to_string(urls).map_err(|e| TimetableError::io(urls, e))?;
    let table_csv = std::fs::read_to_string(table).map_err(|e| TimetableError::io(table, e))?;
    let report = build_schedule(&urls_csv, &table_csv)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TimetableError::io(parent, e))?;
    }
    let json = report.schedule.to_json_pretty()?;
    std::fs::write(out, json).map_err(|e| TimetableError::io(out, e))?;
    info!(
        "Wrote {} ({} programs, {} rows skipped)",
        out.display(),
        report.programs,
        report.skipped.len()
    );
    Ok(report)
}
