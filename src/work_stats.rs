// src/work_stats.rs
use serde::Serialize;

use crate::shift_classifier::{classify, ShiftCategory};

// --- Business Rule Constants ---

/// Every counted work shift is booked as a flat 12h block.
pub const SHIFT_HOURS: u32 = 12;

// Days off: no work day, no hours. Compared case-insensitively.
const DAY_OFF_TOKENS: [&str; 2] = ["X", "ZW"];
// Absent. Exact match only, "n" is an ordinary token.
const ABSENT_TOKEN: &str = "N";
// Vacation and sick leave count the day but book no hours.
const ZERO_HOUR_TOKENS: [&str; 4] = ["U", "u", "S", "s"];

// --- Work Statistics ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkStats {
    pub total_hours: u32,
    pub work_days: u32,
}

fn is_day_off(token: &str) -> bool {
    token == ABSENT_TOKEN
        || DAY_OFF_TOKENS
            .iter()
            .any(|off| token.eq_ignore_ascii_case(off))
}

/// Computes worked days and hours over the first `active_day_count` slots.
pub fn compute_stats<S: AsRef<str>>(schedule: &[S], active_day_count: usize) -> WorkStats {
    let mut stats = WorkStats::default();

    for token in schedule.iter().take(active_day_count) {
        let token = token.as_ref().trim();
        if token.is_empty() || is_day_off(token) {
            continue;
        }

        stats.work_days += 1;
        if !ZERO_HOUR_TOKENS.contains(&token) {
            stats.total_hours += SHIFT_HOURS;
        }
    }

    stats
}

// --- Per-Category Breakdown (individual view) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub days: u32,
    pub hours: u32,
}

impl CategoryTally {
    fn add_shift(&mut self) {
        self.days += 1;
        self.hours += SHIFT_HOURS;
    }

    fn add_day(&mut self) {
        self.days += 1;
    }
}

/// Day counts per category for one employee. `NP1`/`NP2` overtime is kept
/// apart from the regular `P1`/`P2` shifts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShiftBreakdown {
    pub day1: CategoryTally,
    pub day2: CategoryTally,
    pub night_ot1: CategoryTally,
    pub night_ot2: CategoryTally,
    pub special_day1: CategoryTally,
    pub special_day2: CategoryTally,
    pub special_ot1: CategoryTally,
    pub special_ot2: CategoryTally,
    pub off_duty: CategoryTally,
    pub other: CategoryTally,
}

impl ShiftBreakdown {
    pub fn from_schedule<S: AsRef<str>>(schedule: &[S], active_day_count: usize) -> Self {
        let mut breakdown = Self::default();

        for token in schedule.iter().take(active_day_count) {
            let token = token.as_ref().trim();
            match token {
                "" => {}
                "NP1" => breakdown.special_ot1.add_shift(),
                "NP2" => breakdown.special_ot2.add_shift(),
                _ => match classify(token) {
                    ShiftCategory::Day1 => breakdown.day1.add_shift(),
                    ShiftCategory::Day2 => breakdown.day2.add_shift(),
                    ShiftCategory::NightOT1 => breakdown.night_ot1.add_shift(),
                    ShiftCategory::NightOT2 => breakdown.night_ot2.add_shift(),
                    ShiftCategory::SpecialDay1 => breakdown.special_day1.add_shift(),
                    ShiftCategory::SpecialDay2 => breakdown.special_day2.add_shift(),
                    ShiftCategory::OffDuty => breakdown.off_duty.add_day(),
                    ShiftCategory::Other => breakdown.other.add_day(),
                    ShiftCategory::Empty => {}
                },
            }
        }

        breakdown
    }

    /// Labelled tallies in chart order, zero entries included.
    pub fn chart_entries(&self) -> Vec<(&'static str, CategoryTally)> {
        vec![
            ("1 - Dniówka", self.day1),
            ("2 - Nocka", self.day2),
            ("N1 - Nadg. Dzienne", self.night_ot1),
            ("N2 - Nadg. Nocne", self.night_ot2),
            ("P1 - PWRO5 Dzień", self.special_day1),
            ("P2 - PWRO5 Nocka", self.special_day2),
            ("NP1 - Nadg. PWRO5 Dzień", self.special_ot1),
            ("NP2 - Nadg. PWRO5 Nocka", self.special_ot2),
            ("Wolne", self.off_duty),
            ("Inne", self.other),
        ]
    }
}

// --- Monthly Norms (12h system) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyNorm {
    pub month: u32,
    pub name: &'static str,
    pub hours: u32,
}

impl MonthlyNorm {
    /// Number of 12h shifts needed to reach the norm, rounded up.
    pub fn shift_days(&self) -> u32 {
        self.hours.div_ceil(SHIFT_HOURS)
    }
}

const MONTHLY_NORMS: [(&str, u32); 12] = [
    ("Styczeń", 168),
    ("Luty", 160),
    ("Marzec", 168),
    ("Kwiecień", 176),
    ("Maj", 160),
    ("Czerwiec", 168),
    ("Lipiec", 184),
    ("Sierpień", 168),
    ("Wrzesień", 176),
    ("Październik", 184),
    ("Listopad", 160),
    ("Grudzień", 176),
];

pub fn monthly_norm(month: u32) -> Option<MonthlyNorm> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHLY_NORMS
        .get(index)
        .map(|&(name, hours)| MonthlyNorm { month, name, hours })
}
