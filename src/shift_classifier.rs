// src/shift_classifier.rs
use serde::{Deserialize, Serialize};

// --- Shift Categories ---

/// Semantic category of a raw shift token.
///
/// Always derived from the token through [`classify`]; never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCategory {
    Day1,
    Day2,
    NightOT1,
    NightOT2,
    SpecialDay1,
    SpecialDay2,
    OffDuty,
    Other,
    Empty,
}

impl ShiftCategory {
    /// Categories shown in summaries and charts, in display order.
    pub const CHARTABLE: [ShiftCategory; 8] = [
        ShiftCategory::Day1,
        ShiftCategory::Day2,
        ShiftCategory::NightOT1,
        ShiftCategory::NightOT2,
        ShiftCategory::SpecialDay1,
        ShiftCategory::SpecialDay2,
        ShiftCategory::OffDuty,
        ShiftCategory::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ShiftCategory::Day1 => "1",
            ShiftCategory::Day2 => "2",
            ShiftCategory::NightOT1 => "N1",
            ShiftCategory::NightOT2 => "N2",
            ShiftCategory::SpecialDay1 => "P1",
            ShiftCategory::SpecialDay2 => "P2",
            ShiftCategory::OffDuty => "Off",
            ShiftCategory::Other => "Other",
            ShiftCategory::Empty => "Empty",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftCategory::Day1 => "1 - Dniówka",
            ShiftCategory::Day2 => "2 - Nocka",
            ShiftCategory::NightOT1 => "N1 - Nadgodziny Dzienne",
            ShiftCategory::NightOT2 => "N2 - Nadgodziny Nocne",
            ShiftCategory::SpecialDay1 => "P1 - PWRO5 Dzień (+ NP1 - Nadgodziny)",
            ShiftCategory::SpecialDay2 => "P2 - PWRO5 Nocka (+ NP2 - Nadgodziny)",
            ShiftCategory::OffDuty => "Wolne / Nieobecni (N, X, u, ZW)",
            ShiftCategory::Other => "Inne (S, U, etc.)",
            ShiftCategory::Empty => "",
        }
    }
}

// --- Token Constants ---

const SPECIAL_PREFIX: &str = "P";
const SPECIAL_OVERTIME_PREFIX: &str = "NP";
const NIGHT_PREFIX: &str = "N";
const OFF_DUTY_ALIASES: [&str; 3] = ["X", "u", "ZW"];

// --- Classification ---

/// Maps a raw shift token to its category. First matching rule wins.
pub fn classify(token: &str) -> ShiftCategory {
    let token = token.trim();
    if token.is_empty() {
        return ShiftCategory::Empty;
    }

    if token.starts_with(SPECIAL_PREFIX) || token.starts_with(SPECIAL_OVERTIME_PREFIX) {
        return match token {
            "NP1" | "P1" => ShiftCategory::SpecialDay1,
            "NP2" | "P2" => ShiftCategory::SpecialDay2,
            _ if token.contains('1') => ShiftCategory::SpecialDay1,
            _ if token.contains('2') => ShiftCategory::SpecialDay2,
            // bare "P"/"NP" and anything else under this prefix is malformed
            _ => ShiftCategory::Other,
        };
    }

    let plain_digit = !token.contains('P') && !token.contains('N');
    if plain_digit && token.contains('1') {
        return ShiftCategory::Day1;
    }
    if plain_digit && token.contains('2') {
        return ShiftCategory::Day2;
    }

    if token.starts_with(NIGHT_PREFIX) && !token.starts_with(SPECIAL_OVERTIME_PREFIX) {
        match token {
            "N1" => return ShiftCategory::NightOT1,
            "N2" => return ShiftCategory::NightOT2,
            "N" => return ShiftCategory::OffDuty,
            _ => {}
        }
    }

    if OFF_DUTY_ALIASES.contains(&token) {
        return ShiftCategory::OffDuty;
    }

    ShiftCategory::Other
}
