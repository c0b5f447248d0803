// src/schedule_parser.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::month_calendar::{MonthContext, MAX_DAYS};
use crate::work_stats::{compute_stats, WorkStats};

// --- Import Format ---

const DELIMITER: u8 = b';';
/// Day-number header and weekday header precede the employee rows.
const HEADER_LINES: usize = 2;
const MIN_LINES: usize = HEADER_LINES + 1;

// --- Employee Records ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub name: String,
    /// Always `MAX_DAYS` slots; slots past the month length are blank or stale.
    pub schedule: Vec<String>,
}

pub type Roster = Vec<EmployeeRecord>;

impl EmployeeRecord {
    pub fn new(name: impl Into<String>, schedule: Vec<String>) -> Self {
        let mut schedule = schedule;
        schedule.resize(MAX_DAYS, String::new());
        Self {
            name: name.into(),
            schedule,
        }
    }

    /// Slots that belong to the active month.
    pub fn active_schedule(&self, month: &MonthContext) -> &[String] {
        let end = month.active_days().min(self.schedule.len());
        &self.schedule[..end]
    }

    /// Raw token for a 1-based day, blank when out of range.
    pub fn shift_on(&self, day: u32) -> &str {
        day.checked_sub(1)
            .and_then(|index| self.schedule.get(index as usize))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn stats(&self, month: &MonthContext) -> WorkStats {
        compute_stats(&self.schedule, month.active_days())
    }
}

// --- Parsing ---

/// Parses the semicolon-delimited schedule export into a roster.
///
/// Blank lines are dropped before anything else. The first two remaining
/// lines are headers. Rows with fewer than two cells or an empty name are
/// skipped. Every record gets exactly `MAX_DAYS` slots.
pub fn parse(text: &str) -> Result<Roster> {
    let lines: Vec<&str> = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < MIN_LINES {
        return Err(AppError::Format(format!(
            "expected at least {} non-blank lines, found {}",
            MIN_LINES,
            lines.len()
        )));
    }

    let body = lines[HEADER_LINES..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(body.as_bytes());

    let mut employees = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 2 {
            debug!("Skipping row {}: fewer than 2 cells", row + MIN_LINES);
            continue;
        }

        let name = record.get(0).unwrap_or("").trim();
        if name.is_empty() {
            debug!("Skipping row {}: empty name", row + MIN_LINES);
            continue;
        }

        let schedule = (1..=MAX_DAYS)
            .map(|day| record.get(day).map(str::trim).unwrap_or("").to_string())
            .collect();

        employees.push(EmployeeRecord {
            name: name.to_string(),
            schedule,
        });
    }

    if employees.is_empty() {
        return Err(AppError::Format("Brak danych w pliku CSV".to_string()));
    }

    Ok(employees)
}

// --- Serialization ---

/// Writes a roster back into the import shape: two header lines followed by
/// one line per employee with all `MAX_DAYS` slots.
pub fn serialize(roster: &[EmployeeRecord], month: &MonthContext) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let days = 1..=MAX_DAYS as u32;
    let mut day_header = vec![String::new()];
    day_header.extend(days.clone().map(|day| day.to_string()));
    writer.write_record(&day_header)?;

    let mut weekday_header = vec![String::new()];
    weekday_header.extend(days.map(|day| month.weekday_abbreviation(day).to_string()));
    writer.write_record(&weekday_header)?;

    for employee in roster {
        let mut row = Vec::with_capacity(MAX_DAYS + 1);
        row.push(employee.name.as_str());
        row.extend((1..=MAX_DAYS as u32).map(|day| employee.shift_on(day)));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| AppError::Format(e.to_string()))
}

// --- Filename Hints ---

// Nominative and genitive forms, with and without Polish diacritics.
const POLISH_MONTHS: [(&str, u32); 33] = [
    ("styczen", 1),
    ("styczeń", 1),
    ("stycznia", 1),
    ("luty", 2),
    ("lutego", 2),
    ("marzec", 3),
    ("marca", 3),
    ("kwiecien", 4),
    ("kwiecień", 4),
    ("kwietnia", 4),
    ("maj", 5),
    ("maja", 5),
    ("czerwiec", 6),
    ("czerwca", 6),
    ("lipiec", 7),
    ("lipca", 7),
    ("sierpien", 8),
    ("sierpień", 8),
    ("sierpnia", 8),
    ("wrzesien", 9),
    ("wrzesień", 9),
    ("września", 9),
    ("wrzesnia", 9),
    ("pazdziernik", 10),
    ("październik", 10),
    ("października", 10),
    ("pazdziernika", 10),
    ("listopad", 11),
    ("listopada", 11),
    ("grudzien", 12),
    ("grudzień", 12),
    ("grudnia", 12),
    ("grudzienia", 12),
];

static NUMERIC_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-_.](\d{1,2})[-_.]").expect("valid month regex"));
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"20\d{2}[-_](\d{1,2})").expect("valid year-month regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"202\d").expect("valid year regex"));

fn month_from_capture(re: &Regex, haystack: &str) -> Option<u32> {
    let num: u32 = re.captures(haystack)?.get(1)?.as_str().parse().ok()?;
    (1..=12).contains(&num).then_some(num)
}

/// Infers the reporting month (1-12) from an import filename.
pub fn detect_month(filename: &str) -> Option<u32> {
    let lower = filename.to_lowercase();

    if let Some(&(_, month)) = POLISH_MONTHS.iter().find(|(name, _)| lower.contains(name)) {
        return Some(month);
    }

    month_from_capture(&NUMERIC_MONTH, &lower).or_else(|| month_from_capture(&YEAR_MONTH, &lower))
}

/// Infers the reporting year from the first `202x` substring of a filename.
pub fn detect_year(filename: &str) -> Option<i32> {
    YEAR.find(filename)?.as_str().parse().ok()
}
