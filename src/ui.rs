use anyhow::Result;
use colored::{ColoredString, Colorize};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Ask before doing something destructive; `yes` skips the prompt
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Status tag bucket, by what an operator should make of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Up,
    Leader,
    Offline,
    Down,
    Unknown,
}

/// Classify a status tag as reported by the cluster
pub fn classify(status: &str) -> Health {
    let lower = status.trim().to_lowercase();
    if lower.ends_with("|l") {
        Health::Leader
    } else if lower.starts_with("up") || lower.starts_with("healthy") {
        Health::Up
    } else if lower.starts_with("offline") || lower.starts_with("tombstone") {
        Health::Offline
    } else if lower.starts_with("down") || lower.starts_with("unhealthy") || lower.starts_with("err") {
        Health::Down
    } else {
        Health::Unknown
    }
}

/// Colour a status tag without changing its text
pub fn paint_status(status: &str) -> ColoredString {
    match classify(status) {
        Health::Up => status.green(),
        Health::Leader => status.green().bold(),
        Health::Offline => status.yellow(),
        Health::Down => status.red(),
        Health::Unknown => status.normal(),
    }
}

/// Left-align `cells` into columns `widths` wide
pub fn row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Column widths fitting every row
pub fn widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}
