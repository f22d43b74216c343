use colored::Colorize;

use crate::models::{CampStatus, RequestStatus, Urgency};

/// Format a unit count with color by stock level
pub fn format_units(units: u32) -> String {
    let text = format!("{} units", units);
    match units {
        0 => text.red().to_string(),
        1..=4 => text.yellow().to_string(),
        _ => text.green().to_string(),
    }
}

/// Shorten an id for table display
pub fn format_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 12 {
        id.to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_urgency(urgency: Urgency) -> String {
    match urgency {
        Urgency::Critical => urgency.to_string().red().bold().to_string(),
        Urgency::Urgent => urgency.to_string().yellow().to_string(),
        Urgency::Normal => urgency.to_string(),
    }
}

pub fn format_request_status(status: RequestStatus) -> String {
    match status {
        RequestStatus::Pending => status.to_string().yellow().to_string(),
        RequestStatus::Fulfilled => status.to_string().green().to_string(),
        RequestStatus::Cancelled => status.to_string().dimmed().to_string(),
    }
}

pub fn format_camp_status(status: CampStatus) -> String {
    match status {
        CampStatus::Ongoing => status.to_string().green().to_string(),
        CampStatus::Cancelled => status.to_string().red().to_string(),
        CampStatus::Completed => status.to_string().dimmed().to_string(),
        CampStatus::Scheduled | CampStatus::Upcoming => status.to_string().cyan().to_string(),
    }
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Printed width of a cell, ignoring ANSI color sequences
fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // CSI sequence runs until its final letter
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn pad_cell(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text));
    format!("{}{}", text, " ".repeat(padding))
}

/// Print a table row with columns. Colored cells line up with plain ones.
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&pad_cell(col, *width));
        row.push_str("  ");
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("short"), "short");
        assert_eq!(
            format_id("5f1c2b7e-9d2a-4c1e-8a55-0f4e3b2a1c9d"),
            "5f1c2b...1c9d"
        );
    }

    #[test]
    fn test_format_id_multibyte() {
        assert_eq!(format_id("दाता-१२३४५६७८९०"), "दाता-१...७८९०");
    }

    #[test]
    fn test_pad_cell_ignores_color_codes() {
        let plain = pad_cell("urgent", 10);
        let colored = pad_cell("\x1b[33murgent\x1b[0m", 10);
        assert_eq!(plain, "urgent    ");
        assert_eq!(colored, "\x1b[33murgent\x1b[0m    ");
        assert_eq!(visible_width("\x1b[1;31mcritical\x1b[0m"), 8);
        assert_eq!(pad_cell("toolongvalue", 4), "toolongvalue");
    }

    #[test]
    fn test_format_units_text() {
        colored::control::set_override(false);
        assert_eq!(format_units(0), "0 units");
        assert_eq!(format_units(12), "12 units");
    }
}
