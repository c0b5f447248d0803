// src/views.rs
//! Presentation-ready data for the table, daily summary, individual and
//! comparison views. Nothing here renders; callers format the structs.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::duplicate_resolver::resolve_duplicates;
use crate::error::{AppError, Result};
use crate::group_assigner::{assign_group, GroupRules};
use crate::month_calendar::MonthContext;
use crate::schedule_parser::EmployeeRecord;
use crate::shift_classifier::{classify, ShiftCategory};
use crate::work_stats::{monthly_norm, MonthlyNorm, ShiftBreakdown, WorkStats};

pub const MIN_COMPARE: usize = 2;

// --- Shared Cells ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub token: String,
    pub category: ShiftCategory,
    pub weekend: bool,
}

fn day_cells(employee: &EmployeeRecord, month: &MonthContext) -> Vec<DayCell> {
    employee
        .active_schedule(month)
        .iter()
        .zip(1u32..)
        .map(|(token, day)| DayCell {
            day,
            token: token.clone(),
            category: classify(token),
            weekend: month.is_weekend(day),
        })
        .collect()
}

/// Case-insensitive substring match on the employee name.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    filter.is_empty() || name.to_lowercase().contains(&filter.to_lowercase())
}

// --- Full Table ---

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub name: String,
    pub group: Option<String>,
    pub stats: WorkStats,
    pub cells: Vec<DayCell>,
}

/// Rows of the full schedule table after filtering.
///
/// Groups follow the position in the filtered list, so a narrowed search
/// re-bands the rows the same way the unfiltered table would for a roster of
/// that size.
pub fn table_rows(
    roster: &[EmployeeRecord],
    month: &MonthContext,
    rules: &GroupRules,
    filter: &str,
) -> Vec<TableRow> {
    let filtered: Vec<&EmployeeRecord> = roster
        .iter()
        .filter(|e| matches_filter(&e.name, filter))
        .collect();
    let total = filtered.len();

    filtered
        .into_iter()
        .enumerate()
        .map(|(index, employee)| TableRow {
            name: employee.name.clone(),
            group: assign_group(index, total, rules).map(str::to_string),
            stats: employee.stats(month),
            cells: day_cells(employee, month),
        })
        .collect()
}

// --- Daily Summary ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyEntry {
    pub name: String,
    pub token: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    pub category: ShiftCategory,
    pub label: &'static str,
    pub entries: Vec<DailyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub day: u32,
    /// Only non-empty buckets, in chart order.
    pub buckets: Vec<CategoryBucket>,
    /// One count per chartable category, zeros included.
    pub counts: Vec<(ShiftCategory, usize)>,
}

pub fn daily_summary(
    roster: &[EmployeeRecord],
    day: u32,
    month: &MonthContext,
    rules: &GroupRules,
) -> Result<DailySummary> {
    if !month.contains_day(day) {
        return Err(AppError::InvalidDay(day));
    }

    let mut buckets: Vec<CategoryBucket> = ShiftCategory::CHARTABLE
        .iter()
        .map(|&category| CategoryBucket {
            category,
            label: category.label(),
            entries: Vec::new(),
        })
        .collect();

    for (index, employee) in roster.iter().enumerate() {
        let token = employee.shift_on(day);
        let category = classify(token);
        if category == ShiftCategory::Empty {
            continue;
        }
        if let Some(bucket) = buckets.iter_mut().find(|b| b.category == category) {
            bucket.entries.push(DailyEntry {
                name: employee.name.clone(),
                token: token.to_string(),
                group: assign_group(index, roster.len(), rules).map(str::to_string),
            });
        }
    }

    let counts = buckets
        .iter()
        .map(|b| (b.category, b.entries.len()))
        .collect();
    buckets.retain(|b| !b.entries.is_empty());

    Ok(DailySummary {
        day,
        buckets,
        counts,
    })
}

// --- Individual View ---

#[derive(Debug, Clone, Serialize)]
pub struct IndividualView {
    pub name: String,
    pub stats: WorkStats,
    pub breakdown: ShiftBreakdown,
    pub norm: Option<MonthlyNorm>,
    /// Blank cells before day 1 so the grid starts on Monday.
    pub leading_blanks: u32,
    pub calendar: Vec<DayCell>,
}

pub fn individual_view(
    roster: &[EmployeeRecord],
    name: &str,
    month: &MonthContext,
) -> Result<IndividualView> {
    let employee = roster
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| AppError::EmployeeNotFound(name.to_string()))?;

    Ok(IndividualView {
        name: employee.name.clone(),
        stats: employee.stats(month),
        breakdown: ShiftBreakdown::from_schedule(&employee.schedule, month.active_days()),
        norm: monthly_norm(month.month),
        leading_blanks: month.first_weekday_offset,
        calendar: day_cells(employee, month),
    })
}

// --- Compare View ---

#[derive(Debug, Clone, Serialize)]
pub struct CompareRow {
    pub name: String,
    pub group: Option<String>,
    pub stats: WorkStats,
    pub cells: Vec<DayCell>,
}

pub fn compare_view<S: AsRef<str>>(
    roster: &[EmployeeRecord],
    selected_names: &[S],
    month: &MonthContext,
    rules: &GroupRules,
) -> Result<Vec<CompareRow>> {
    let picked: Vec<&EmployeeRecord> = roster
        .iter()
        .filter(|e| selected_names.iter().any(|n| n.as_ref() == e.name))
        .collect();

    // repeated or unknown names do not count toward the minimum
    let distinct = picked
        .iter()
        .map(|e| e.name.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    if distinct < MIN_COMPARE {
        return Err(AppError::NotEnoughSelected { selected: distinct });
    }

    let rows = resolve_duplicates(&picked, roster, rules)
        .into_iter()
        .map(|employee| {
            let position = roster.iter().position(|e| e.name == employee.name);
            CompareRow {
                name: employee.name.clone(),
                group: position
                    .and_then(|p| assign_group(p, roster.len(), rules))
                    .map(str::to_string),
                stats: employee.stats(month),
                cells: day_cells(employee, month),
            }
        })
        .collect();

    Ok(rows)
}
