// src/schedule_state.rs
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::group_assigner::{GroupColorSpec, GroupColors, GroupRangeRule, GroupRules};
use crate::month_calendar::{
    compute_month_context, current_work_day, MonthContext, WORK_DAY_START_HOUR,
};
use crate::schedule_parser::{detect_month, detect_year, parse, EmployeeRecord, Roster};
use crate::storage::{
    load_json, remove_key, save_json, KeyValueStore, KEY_GROUP_COLORS, KEY_GROUP_RANGES,
    KEY_SCHEDULE_DATA, KEY_SELECTED_MONTH, KEY_SELECTED_YEAR, KEY_THEME,
};
use crate::views::{matches_filter, MIN_COMPARE};

// --- Theme ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    // Stored as a bare word; anything but "dark" means light.
    fn from_stored(raw: &str) -> Self {
        match raw.trim().trim_matches('"') {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// --- Status Banner ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Imported(usize),
    Restored(usize),
    Cleared,
    Failed(String),
}

/// Transient banner text shown after a state change.
pub fn status_message(outcome: &StatusOutcome) -> String {
    match outcome {
        StatusOutcome::Imported(count) => format!("✓ Załadowano {} pracowników", count),
        StatusOutcome::Restored(count) => format!("✓ Przywrócono {} pracowników", count),
        StatusOutcome::Cleared => "✓ Dane zostały usunięte".to_string(),
        StatusOutcome::Failed(message) => format!("✗ Błąd: {}", message),
    }
}

/// "Aktualnie: 14 - zmiana nocna" before 06:00, "Aktualnie: 14" after.
pub fn current_day_label(now: NaiveDateTime) -> String {
    let day = current_work_day(now);
    if now.hour() < WORK_DAY_START_HOUR {
        format!("Aktualnie: {} - zmiana nocna", day)
    } else {
        format!("Aktualnie: {}", day)
    }
}

// --- Application State ---

/// Everything the views need, owned in one place. Mutations that outlive the
/// process go through the store passed to each call.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    roster: Roster,
    month: MonthContext,
    rules: GroupRules,
    colors: GroupColors,
    theme: Theme,
    selected_day: u32,
    selected: Vec<String>,
}

impl ScheduleState {
    /// Empty state for the month containing `now`.
    pub fn new(now: NaiveDateTime) -> Result<Self> {
        let month = compute_month_context(now.year(), now.month())?;
        Ok(Self {
            roster: Vec::new(),
            month,
            rules: GroupRules::default(),
            colors: GroupColors::default(),
            theme: Theme::default(),
            selected_day: current_work_day(now).min(month.days_in_month),
            selected: Vec::new(),
        })
    }

    /// Restores persisted state. Each missing or unreadable value falls back
    /// to its default independently.
    pub fn load(
        store: &dyn KeyValueStore,
        default_month: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let mut state = Self::new(now)?;

        let year = load_json::<i32>(store, KEY_SELECTED_YEAR).unwrap_or(now.year());
        let month = load_json::<u32>(store, KEY_SELECTED_MONTH)
            .or(default_month)
            .unwrap_or(now.month());
        match compute_month_context(year, month) {
            Ok(ctx) => state.month = ctx,
            Err(e) => warn!("Ignoring stored month {}/{}: {}", month, year, e),
        }
        state.selected_day = state.selected_day.min(state.month.days_in_month);

        if let Ok(Some(raw)) = store.get(KEY_THEME) {
            state.theme = Theme::from_stored(&raw);
        }
        if let Some(rules) = load_json::<GroupRules>(store, KEY_GROUP_RANGES) {
            state.rules = rules;
        }
        if let Some(colors) = load_json::<GroupColors>(store, KEY_GROUP_COLORS) {
            state.colors = colors;
        }
        if let Some(roster) = load_json::<Vec<EmployeeRecord>>(store, KEY_SCHEDULE_DATA) {
            // older snapshots may carry short schedules
            state.roster = roster
                .into_iter()
                .map(|e| EmployeeRecord::new(e.name, e.schedule))
                .collect();
            info!("Loaded {} employees from store", state.roster.len());
        }

        Ok(state)
    }

    // --- Accessors ---

    pub fn roster(&self) -> &[EmployeeRecord] {
        &self.roster
    }

    pub fn month(&self) -> &MonthContext {
        &self.month
    }

    pub fn rules(&self) -> &GroupRules {
        &self.rules
    }

    pub fn colors(&self) -> &GroupColors {
        &self.colors
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn selected_day(&self) -> u32 {
        self.selected_day
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn has_data(&self) -> bool {
        !self.roster.is_empty()
    }

    // --- Import / Clear ---

    /// Replaces the roster with the parsed `text`. On failure nothing changes.
    pub fn import(
        &mut self,
        store: &mut dyn KeyValueStore,
        text: &str,
        filename: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<usize> {
        let roster = match parse(text) {
            Ok(roster) => roster,
            Err(e) => {
                warn!("Import rejected: {}", e);
                return Err(e);
            }
        };

        let month_hint = filename.and_then(detect_month);
        let year_hint = filename.and_then(detect_year);
        if month_hint.is_some() || year_hint.is_some() {
            let month = month_hint.unwrap_or(self.month.month);
            let year = year_hint.unwrap_or(now.year());
            self.set_month(store, year, month)?;
        }

        self.roster = roster;
        save_json(store, KEY_SCHEDULE_DATA, &self.roster);
        self.selected
            .retain(|name| self.roster.iter().any(|e| &e.name == name));
        self.selected_day = self.selected_day.min(self.month.days_in_month);

        info!(
            "Imported {} employees for {}/{}",
            self.roster.len(),
            self.month.month,
            self.month.year
        );
        Ok(self.roster.len())
    }

    pub fn clear(&mut self, store: &mut dyn KeyValueStore) {
        self.roster.clear();
        self.selected.clear();
        remove_key(store, KEY_SCHEDULE_DATA);
        info!("Schedule data cleared");
    }

    // --- Month / Theme / Groups ---

    pub fn set_month(&mut self, store: &mut dyn KeyValueStore, year: i32, month: u32) -> Result<()> {
        let ctx = compute_month_context(year, month)?;
        self.month = ctx;
        self.selected_day = self.selected_day.min(ctx.days_in_month);
        save_json(store, KEY_SELECTED_MONTH, &month);
        save_json(store, KEY_SELECTED_YEAR, &year);
        Ok(())
    }

    pub fn toggle_theme(&mut self, store: &mut dyn KeyValueStore) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(e) = store.set(KEY_THEME, self.theme.as_str()) {
            warn!("Failed to persist theme: {}", e);
        }
        self.theme
    }

    pub fn update_group_rule(
        &mut self,
        store: &mut dyn KeyValueStore,
        code: &str,
        rule: GroupRangeRule,
    ) -> Result<()> {
        if let Err(e) = self.rules.update(code, rule) {
            warn!("Rejected range edit: {}", e);
            return Err(e);
        }
        save_json(store, KEY_GROUP_RANGES, &self.rules);
        Ok(())
    }

    pub fn reset_group_rules(&mut self, store: &mut dyn KeyValueStore) {
        self.rules = GroupRules::default();
        remove_key(store, KEY_GROUP_RANGES);
    }

    pub fn update_group_color(
        &mut self,
        store: &mut dyn KeyValueStore,
        code: &str,
        spec: GroupColorSpec,
    ) -> Result<()> {
        self.colors.update(code, spec)?;
        save_json(store, KEY_GROUP_COLORS, &self.colors);
        Ok(())
    }

    // --- Selection ---

    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.roster.iter().any(|e| e.name == name) {
            return Err(AppError::EmployeeNotFound(name.to_string()));
        }
        if !self.selected.iter().any(|n| n == name) {
            self.selected.push(name.to_string());
        }
        Ok(())
    }

    pub fn deselect(&mut self, name: &str) {
        self.selected.retain(|n| n != name);
    }

    /// Flips membership; returns whether `name` is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        if self.selected.iter().any(|n| n == name) {
            self.deselect(name);
            Ok(false)
        } else {
            self.select(name)?;
            Ok(true)
        }
    }

    /// Selects every employee whose name matches `filter`.
    pub fn select_all(&mut self, filter: &str) {
        for employee in &self.roster {
            if matches_filter(&employee.name, filter)
                && !self.selected.iter().any(|n| n == &employee.name)
            {
                self.selected.push(employee.name.clone());
            }
        }
    }

    pub fn reset_selection(&mut self) {
        self.selected.clear();
    }

    pub fn can_compare(&self) -> bool {
        self.selected.len() >= MIN_COMPARE
    }

    // --- Day Selection ---

    pub fn select_day(&mut self, day: u32) -> Result<()> {
        if !self.month.contains_day(day) {
            return Err(AppError::InvalidDay(day));
        }
        self.selected_day = day;
        Ok(())
    }

    /// Follows the work-day clock. Returns true when the selected day moved.
    pub fn tick(&mut self, now: NaiveDateTime) -> bool {
        let work_day = current_work_day(now);
        if work_day != self.selected_day && self.month.contains_day(work_day) {
            info!("Work day changed: {} -> {}", self.selected_day, work_day);
            self.selected_day = work_day;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const DAY_HEADER: &str = ";1;2;3;4;5;6;7;8;9;10;11;12;13;14;15;16;17;18;19;20;21;22;23;24;25;26;27;28;29;30;31";

    fn at(date_time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date_time, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| panic!("Invalid datetime string format: {}", date_time))
    }

    fn sample_csv() -> String {
        format!(
            "{}\n;Śr;Cz;Pt\nJan Kowalski;1;2;X\nAnna Nowak;N1;;U\nPiotr Zieliński;P1;NP2;N\n",
            DAY_HEADER
        )
    }

    fn loaded_state(store: &mut MemoryStore) -> ScheduleState {
        let now = at("2025-10-15 12:00:00");
        let mut state = ScheduleState::load(store, None, now).unwrap();
        state
            .import(store, &sample_csv(), Some("grafik_pazdziernik_2025.csv"), now)
            .unwrap();
        state
    }

    #[test]
    fn status_messages() {
        assert_eq!(
            status_message(&StatusOutcome::Imported(3)),
            "✓ Załadowano 3 pracowników"
        );
        assert_eq!(
            status_message(&StatusOutcome::Restored(62)),
            "✓ Przywrócono 62 pracowników"
        );
        assert_eq!(status_message(&StatusOutcome::Cleared), "✓ Dane zostały usunięte");
        assert_eq!(
            status_message(&StatusOutcome::Failed("oops".to_string())),
            "✗ Błąd: oops"
        );
    }

    #[test]
    fn current_day_label_marks_night_shift() {
        assert_eq!(
            current_day_label(at("2025-10-15 04:00:00")),
            "Aktualnie: 14 - zmiana nocna"
        );
        assert_eq!(current_day_label(at("2025-10-15 08:00:00")), "Aktualnie: 15");
    }

    #[test]
    fn load_from_empty_store_uses_defaults() {
        let store = MemoryStore::new();
        let state = ScheduleState::load(&store, None, at("2025-02-20 10:00:00")).unwrap();
        assert!(!state.has_data());
        assert_eq!(state.month().month, 2);
        assert_eq!(state.month().days_in_month, 28);
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(state.selected_day(), 20);
        assert_eq!(state.rules(), &GroupRules::default());
    }

    #[test]
    fn load_prefers_stored_month_over_default() {
        let mut store = MemoryStore::new();
        let now = at("2025-10-15 12:00:00");
        assert_eq!(ScheduleState::load(&store, Some(3), now).unwrap().month().month, 3);

        store.set(KEY_SELECTED_MONTH, "11").unwrap();
        assert_eq!(ScheduleState::load(&store, Some(3), now).unwrap().month().month, 11);
    }

    #[test]
    fn load_survives_corrupt_values() {
        let mut store = MemoryStore::new();
        store.set(KEY_SCHEDULE_DATA, "{ broken").unwrap();
        store.set(KEY_SELECTED_MONTH, "42").unwrap();
        store.set(KEY_GROUP_RANGES, "[1,2,3]").unwrap();
        store.set(KEY_THEME, "dark").unwrap();

        let state = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        assert!(!state.has_data());
        assert_eq!(state.month().month, 10);
        assert_eq!(state.rules(), &GroupRules::default());
        assert_eq!(state.theme(), Theme::Dark);
    }

    #[test]
    fn import_persists_roster_and_detected_month() {
        let mut store = MemoryStore::new();
        let state = loaded_state(&mut store);
        assert_eq!(state.roster().len(), 3);
        assert_eq!(state.month().month, 10);
        assert_eq!(state.month().year, 2025);

        let restored = ScheduleState::load(&store, None, at("2026-01-05 12:00:00")).unwrap();
        assert_eq!(restored.roster(), state.roster());
        assert_eq!(restored.month().month, 10);
        assert_eq!(restored.month().year, 2025);
        assert!(restored.roster().iter().all(|e| e.schedule.len() == 31));
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let mut store = MemoryStore::new();
        let mut state = loaded_state(&mut store);
        let before = state.roster().to_vec();

        let result = state.import(
            &mut store,
            "only\ntwo",
            Some("grafik_marzec.csv"),
            at("2025-10-15 12:00:00"),
        );
        assert!(matches!(result, Err(AppError::Format(_))));
        assert_eq!(state.roster(), before.as_slice());
        assert_eq!(state.month().month, 10);
    }

    #[test]
    fn import_without_month_hint_keeps_current_month() {
        let mut store = MemoryStore::new();
        let now = at("2025-06-10 12:00:00");
        let mut state = ScheduleState::load(&store, None, now).unwrap();
        state.import(&mut store, &sample_csv(), Some("export.csv"), now).unwrap();
        assert_eq!(state.month().month, 6);
        assert_eq!(store.get(KEY_SELECTED_MONTH).unwrap(), None);
    }

    #[test]
    fn import_with_only_a_year_hint_keeps_month_and_sets_year() {
        let mut store = MemoryStore::new();
        let now = at("2025-06-10 12:00:00");
        let mut state = ScheduleState::load(&store, None, now).unwrap();
        state
            .import(&mut store, &sample_csv(), Some("grafik_2026.csv"), now)
            .unwrap();
        assert_eq!(state.month().month, 6);
        assert_eq!(state.month().year, 2026);
        assert_eq!(store.get(KEY_SELECTED_YEAR).unwrap().as_deref(), Some("2026"));
    }

    #[test]
    fn clear_removes_snapshot() {
        let mut store = MemoryStore::new();
        let mut state = loaded_state(&mut store);
        state.select("Jan Kowalski").unwrap();
        state.clear(&mut store);
        assert!(!state.has_data());
        assert!(state.selected().is_empty());
        assert_eq!(store.get(KEY_SCHEDULE_DATA).unwrap(), None);
    }

    #[test]
    fn theme_toggle_persists_bare_word() {
        let mut store = MemoryStore::new();
        let mut state = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        assert_eq!(state.toggle_theme(&mut store), Theme::Dark);
        assert_eq!(store.get(KEY_THEME).unwrap().as_deref(), Some("dark"));
        assert_eq!(state.toggle_theme(&mut store), Theme::Light);
    }

    #[test]
    fn group_rule_edits_persist_and_rejections_do_not() {
        let mut store = MemoryStore::new();
        let mut state = loaded_state(&mut store);

        state
            .update_group_rule(&mut store, "D", GroupRangeRule::Fixed { from: 1, to: 2 })
            .unwrap();
        let bad = state.update_group_rule(&mut store, "D", GroupRangeRule::Fixed { from: 3, to: 1 });
        assert!(bad.is_err());

        let restored = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        assert_eq!(
            restored.rules().get("D"),
            Some(&GroupRangeRule::Fixed { from: 1, to: 2 })
        );

        state.reset_group_rules(&mut store);
        assert_eq!(state.rules(), &GroupRules::default());
        assert_eq!(store.get(KEY_GROUP_RANGES).unwrap(), None);
    }

    #[test]
    fn selection_is_ordered_and_deduplicated() {
        let mut store = MemoryStore::new();
        let mut state = loaded_state(&mut store);

        state.select("Anna Nowak").unwrap();
        state.select("Jan Kowalski").unwrap();
        state.select("Anna Nowak").unwrap();
        assert_eq!(state.selected(), ["Anna Nowak", "Jan Kowalski"]);
        assert!(state.can_compare());

        assert!(!state.toggle("Anna Nowak").unwrap());
        assert!(!state.can_compare());
        assert!(matches!(
            state.select("Nobody"),
            Err(AppError::EmployeeNotFound(_))
        ));

        state.reset_selection();
        state.select_all("nowak");
        assert_eq!(state.selected(), ["Anna Nowak"]);
        state.select_all("");
        assert_eq!(state.selected().len(), 3);
    }

    #[test]
    fn select_day_respects_month_length() {
        let mut store = MemoryStore::new();
        let mut state = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        state.set_month(&mut store, 2025, 2).unwrap();
        assert!(matches!(state.select_day(29), Err(AppError::InvalidDay(29))));
        state.select_day(28).unwrap();
        assert_eq!(state.selected_day(), 28);
        assert!(state.set_month(&mut store, 2025, 13).is_err());
        assert_eq!(state.month().month, 2);
    }

    #[test]
    fn tick_follows_the_six_oclock_boundary() {
        let store = MemoryStore::new();
        let mut state = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        assert_eq!(state.selected_day(), 15);

        assert!(!state.tick(at("2025-10-16 05:59:00")));
        assert!(state.tick(at("2025-10-16 06:00:00")));
        assert_eq!(state.selected_day(), 16);
        assert!(!state.tick(at("2025-10-16 06:01:00")));
    }

    #[test]
    fn tick_ignores_days_outside_the_month() {
        let mut store = MemoryStore::new();
        let mut state = ScheduleState::load(&store, None, at("2025-10-15 12:00:00")).unwrap();
        state.set_month(&mut store, 2025, 2).unwrap();
        state.select_day(10).unwrap();
        assert!(!state.tick(at("2025-10-30 12:00:00")));
        assert_eq!(state.selected_day(), 10);
    }
}
