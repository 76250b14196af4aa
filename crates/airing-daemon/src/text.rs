//! Plain-text painter for render frames.
//!
//! Columns are sized by display width, so CJK program names line up with
//! ASCII ones.

use airing_proto::lookup::PlaybackTarget;
use airing_proto::protocol::{GuideState, GuideStatus};
use airing_proto::render::{Choice, ContentFrame, RenderFrame, ScheduleGrid};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TIME_COL: usize = 6;
const DAY_COL: usize = 16;
const CURRENT_MARK: &str = "▶ ";

/// Pads or truncates `text` to exactly `width` display columns.
pub fn fit(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        // Keep one column for the ellipsis
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn day_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.take(2)).collect(),
        None => String::new(),
    }
}

/// Time column plus seven day columns, Sunday first; the current cell is
/// marked.
pub fn paint_grid(grid: &ScheduleGrid) -> String {
    let mut out = String::new();

    let mut header = fit("", TIME_COL);
    if let Some(row) = grid.rows.first() {
        for cell in &row.cells {
            header.push(' ');
            header.push_str(&fit(&day_label(cell.day.name()), DAY_COL));
        }
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for row in &grid.rows {
        let mut line = fit(&row.hour.key(), TIME_COL);
        for cell in &row.cells {
            let names = cell
                .programs
                .iter()
                .map(|p| p.program_name.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            let text = if cell.current {
                format!("{}{}", CURRENT_MARK, names)
            } else {
                names
            };
            line.push(' ');
            line.push_str(&fit(&text, DAY_COL));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn describe_target(target: &PlaybackTarget) -> String {
    match target {
        PlaybackTarget::Embed { url } => url.clone(),
        PlaybackTarget::External { url } => format!("open externally: {}", url),
        PlaybackTarget::Unavailable => "no stream".to_string(),
    }
}

fn choice_line(choice: &Choice) -> String {
    format!(
        "[{}] {} - {} ({})",
        choice.index,
        choice.channel,
        choice.program_name,
        describe_target(&choice.target)
    )
}

pub fn paint_content(content: &ContentFrame) -> String {
    let mut out = String::new();
    match content {
        ContentFrame::Live {
            playing,
            alternatives,
        } => {
            out.push_str(&format!("On air: {}\n", choice_line(playing)));
            for alt in alternatives {
                out.push_str(&format!("  also: {}\n", choice_line(alt)));
            }
        }
        ContentFrame::Standby { message } => {
            out.push_str(message);
            out.push('\n');
        }
        ContentFrame::Selection { choices } => {
            out.push_str("Several programs on air, pick one:\n");
            for choice in choices {
                out.push_str(&format!("  {}\n", choice_line(choice)));
            }
        }
    }
    out
}

/// Header, content, next-program line, then the grid if the schedule view
/// is up.
pub fn paint_frame(frame: &RenderFrame) -> String {
    let view = if frame.schedule_visible { "schedule" } else { "live" };
    let mut out = format!("{} [{}]\n", frame.moment, view);
    out.push_str(&paint_content(&frame.content));
    out.push_str(&format!("Next: {}\n", frame.next_summary));
    if frame.schedule_visible {
        out.push('\n');
        out.push_str(&paint_grid(&frame.grid));
    }
    out
}

pub fn paint_state(state: &GuideState) -> String {
    match &state.status {
        GuideStatus::Loading => "Loading timetable...\n".to_string(),
        GuideStatus::Failed { message } => format!("{}\n", message),
        GuideStatus::Ready { frame } => paint_frame(frame),
    }
}
