// src/group_assigner.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{AppError, Result};

pub type GroupCode = String;

// --- Range Rules ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupRangeRule {
    /// 1-based inclusive row numbers.
    Fixed { from: u32, to: u32 },
    /// The last `count` rows of the roster.
    LastN { count: u32 },
    /// The `count` rows right before the range of a `LastN` group.
    #[serde(rename = "before_last")]
    BeforeGroup { count: u32, reference: GroupCode },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    pub code: GroupCode,
    pub rule: GroupRangeRule,
}

/// Ordered rule set; on overlap the earliest rule claims the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRules {
    rules: Vec<GroupRule>,
}

impl Default for GroupRules {
    /// Yard (last 24), M (14 before Yard), then the head-of-roster blocks.
    fn default() -> Self {
        Self::new(vec![
            rule("Y", GroupRangeRule::LastN { count: 24 }),
            rule(
                "M",
                GroupRangeRule::BeforeGroup {
                    count: 14,
                    reference: "Y".to_string(),
                },
            ),
            rule("D", GroupRangeRule::Fixed { from: 1, to: 6 }),
            rule("S", GroupRangeRule::Fixed { from: 7, to: 10 }),
            rule("L", GroupRangeRule::Fixed { from: 11, to: 11 }),
            rule("K", GroupRangeRule::Fixed { from: 12, to: 24 }),
        ])
    }
}

fn rule(code: &str, rule: GroupRangeRule) -> GroupRule {
    GroupRule {
        code: code.to_string(),
        rule,
    }
}

impl GroupRules {
    pub fn new(rules: Vec<GroupRule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&GroupRangeRule> {
        self.rules.iter().find(|r| r.code == code).map(|r| &r.rule)
    }

    /// Zero-based half-open index range a rule covers for a roster size.
    pub fn resolve_range(&self, rule: &GroupRangeRule, roster_size: usize) -> Range<usize> {
        match rule {
            GroupRangeRule::Fixed { from, to } => {
                let start = (*from as usize).saturating_sub(1);
                let end = (*to as usize).max(start);
                start..end
            }
            GroupRangeRule::LastN { count } => {
                roster_size.saturating_sub(*count as usize)..roster_size
            }
            GroupRangeRule::BeforeGroup { count, reference } => match self.get(reference) {
                Some(GroupRangeRule::LastN { count: ref_count }) => {
                    let end = roster_size.saturating_sub(*ref_count as usize);
                    end.saturating_sub(*count as usize)..end
                }
                _ => 0..0,
            },
        }
    }

    /// Validates and stores a rule. Existing codes keep their position,
    /// new codes are evaluated last. Invalid rules leave the set untouched.
    pub fn update(&mut self, code: &str, new_rule: GroupRangeRule) -> Result<()> {
        self.validate(code, &new_rule)?;
        match self.rules.iter_mut().find(|r| r.code == code) {
            Some(existing) => existing.rule = new_rule,
            None => self.rules.push(rule(code, new_rule)),
        }
        Ok(())
    }

    fn validate(&self, code: &str, new_rule: &GroupRangeRule) -> Result<()> {
        let invalid = |reason: &str| AppError::InvalidRange {
            group: code.to_string(),
            reason: reason.to_string(),
        };

        if code.trim().is_empty() {
            return Err(invalid("group code must not be empty"));
        }

        match new_rule {
            GroupRangeRule::Fixed { from, to } => {
                if *from < 1 || *to < 1 {
                    return Err(invalid("row numbers must be positive"));
                }
                if to < from {
                    return Err(invalid("'to' must not be smaller than 'from'"));
                }
            }
            GroupRangeRule::LastN { count } => {
                if *count < 1 {
                    return Err(invalid("count must be positive"));
                }
            }
            GroupRangeRule::BeforeGroup { count, reference } => {
                if *count < 1 {
                    return Err(invalid("count must be positive"));
                }
                if reference == code {
                    return Err(invalid("a group cannot reference itself"));
                }
                if !matches!(self.get(reference), Some(GroupRangeRule::LastN { .. })) {
                    return Err(invalid("reference must be an existing 'last N' group"));
                }
            }
        }

        Ok(())
    }
}

// --- Group Assignment ---

/// Group of the row at `index`, first matching rule wins.
pub fn assign_group(index: usize, roster_size: usize, rules: &GroupRules) -> Option<&str> {
    if index >= roster_size {
        return None;
    }
    rules
        .iter()
        .find(|r| rules.resolve_range(&r.rule, roster_size).contains(&index))
        .map(|r| r.code.as_str())
}

// --- Group Colors (presentation only) ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupColorSpec {
    pub light: String,
    pub dark: String,
    pub light_text: String,
    pub dark_text: String,
}

impl GroupColorSpec {
    pub fn new(light: &str, dark: &str, light_text: &str, dark_text: &str) -> Self {
        Self {
            light: light.to_string(),
            dark: dark.to_string(),
            light_text: light_text.to_string(),
            dark_text: dark_text.to_string(),
        }
    }
}

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid color regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupColors {
    colors: BTreeMap<GroupCode, GroupColorSpec>,
}

impl Default for GroupColors {
    fn default() -> Self {
        let colors = [
            ("Y", GroupColorSpec::new("#d1fae5", "#064e3b", "#065f46", "#a7f3d0")),
            ("M", GroupColorSpec::new("#fef9c3", "#713f12", "#854d0e", "#fde68a")),
            ("D", GroupColorSpec::new("#ffedd5", "#7c2d12", "#9a3412", "#fed7aa")),
            ("S", GroupColorSpec::new("#dbeafe", "#1e3a8a", "#1e40af", "#bfdbfe")),
            ("L", GroupColorSpec::new("#e0f2fe", "#0c4a6e", "#075985", "#bae6fd")),
            ("K", GroupColorSpec::new("#fff7ed", "#78350f", "#9a3412", "#fdba74")),
        ]
        .into_iter()
        .map(|(code, spec)| (code.to_string(), spec))
        .collect();
        Self { colors }
    }
}

impl GroupColors {
    pub fn get(&self, code: &str) -> Option<&GroupColorSpec> {
        self.colors.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupCode, &GroupColorSpec)> {
        self.colors.iter()
    }

    pub fn update(&mut self, code: &str, spec: GroupColorSpec) -> Result<()> {
        for value in [&spec.light, &spec.dark, &spec.light_text, &spec.dark_text] {
            if !HEX_COLOR.is_match(value) {
                return Err(AppError::InvalidColor {
                    group: code.to_string(),
                    value: value.clone(),
                });
            }
        }
        self.colors.insert(code.to_string(), spec);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_for(roster_size: usize, rules: &GroupRules) -> Vec<Option<String>> {
        (0..roster_size)
            .map(|i| assign_group(i, roster_size, rules).map(str::to_string))
            .collect()
    }

    #[test]
    fn last_n_matches_tail_only() {
        let rules = GroupRules::new(vec![rule("Y", GroupRangeRule::LastN { count: 5 })]);
        let groups = groups_for(20, &rules);
        for (i, group) in groups.iter().enumerate() {
            assert_eq!(group.is_some(), (15..=19).contains(&i), "index {i}");
        }
    }

    #[test]
    fn before_last_matches_rows_preceding_reference() {
        let rules = GroupRules::new(vec![
            rule("Y", GroupRangeRule::LastN { count: 5 }),
            rule(
                "M",
                GroupRangeRule::BeforeGroup {
                    count: 3,
                    reference: "Y".to_string(),
                },
            ),
        ]);
        let groups = groups_for(20, &rules);
        for (i, group) in groups.iter().enumerate() {
            let expected = match i {
                12..=14 => Some("M"),
                15..=19 => Some("Y"),
                _ => None,
            };
            assert_eq!(group.as_deref(), expected, "index {i}");
        }
    }

    #[test]
    fn before_last_with_missing_or_wrong_reference_matches_nothing() {
        let missing = GroupRules::new(vec![rule(
            "M",
            GroupRangeRule::BeforeGroup {
                count: 3,
                reference: "Y".to_string(),
            },
        )]);
        assert!(groups_for(20, &missing).iter().all(Option::is_none));

        let wrong_kind = GroupRules::new(vec![
            rule("Y", GroupRangeRule::Fixed { from: 1, to: 2 }),
            rule(
                "M",
                GroupRangeRule::BeforeGroup {
                    count: 3,
                    reference: "Y".to_string(),
                },
            ),
        ]);
        let groups = groups_for(20, &wrong_kind);
        assert_eq!(groups[0].as_deref(), Some("Y"));
        assert!(groups[2..].iter().all(Option::is_none));
    }

    #[test]
    fn fixed_range_is_one_based_inclusive() {
        let rules = GroupRules::new(vec![rule("D", GroupRangeRule::Fixed { from: 2, to: 4 })]);
        let groups = groups_for(6, &rules);
        assert_eq!(groups[0], None);
        assert_eq!(groups[1].as_deref(), Some("D"));
        assert_eq!(groups[3].as_deref(), Some("D"));
        assert_eq!(groups[4], None);
    }

    #[test]
    fn first_rule_wins_on_overlap() {
        let rules = GroupRules::new(vec![
            rule("A", GroupRangeRule::Fixed { from: 1, to: 3 }),
            rule("B", GroupRangeRule::Fixed { from: 2, to: 5 }),
        ]);
        let groups = groups_for(6, &rules);
        assert_eq!(groups[1].as_deref(), Some("A"));
        assert_eq!(groups[2].as_deref(), Some("A"));
        assert_eq!(groups[3].as_deref(), Some("B"));
    }

    #[test]
    fn small_rosters_do_not_underflow() {
        let rules = GroupRules::default();
        let groups = groups_for(10, &rules);
        // every row falls into the last 24
        assert!(groups.iter().all(|g| g.as_deref() == Some("Y")));
        assert!(assign_group(0, 0, &rules).is_none());
    }

    #[test]
    fn positions_past_the_roster_have_no_group() {
        let rules = GroupRules::default();
        // fixed D rows 1-6 must not claim rows that do not exist
        assert_eq!(assign_group(2, 2, &rules), None);
        assert_eq!(assign_group(30, 10, &rules), None);
        assert_eq!(assign_group(9, 10, &rules), Some("Y"));
    }

    #[test]
    fn default_rules_reproduce_original_layout() {
        let rules = GroupRules::default();
        let groups = groups_for(62, &rules);
        assert_eq!(groups[0].as_deref(), Some("D"));
        assert_eq!(groups[5].as_deref(), Some("D"));
        assert_eq!(groups[6].as_deref(), Some("S"));
        assert_eq!(groups[9].as_deref(), Some("S"));
        assert_eq!(groups[10].as_deref(), Some("L"));
        assert_eq!(groups[11].as_deref(), Some("K"));
        assert_eq!(groups[23].as_deref(), Some("K"));
        assert!(groups[24..38].iter().all(|g| g.as_deref() == Some("M")));
        assert!(groups[38..].iter().all(|g| g.as_deref() == Some("Y")));
    }

    #[test]
    fn update_rejects_invalid_ranges_and_keeps_prior_rule() {
        let mut rules = GroupRules::default();
        let before = rules.clone();

        let inverted = rules.update("D", GroupRangeRule::Fixed { from: 5, to: 2 });
        assert!(matches!(inverted, Err(AppError::InvalidRange { .. })));

        let zero = rules.update("D", GroupRangeRule::Fixed { from: 0, to: 2 });
        assert!(zero.is_err());

        let zero_count = rules.update("Y", GroupRangeRule::LastN { count: 0 });
        assert!(zero_count.is_err());

        let bad_reference = rules.update(
            "M",
            GroupRangeRule::BeforeGroup {
                count: 3,
                reference: "D".to_string(),
            },
        );
        assert!(bad_reference.is_err());

        let self_reference = rules.update(
            "Y",
            GroupRangeRule::BeforeGroup {
                count: 3,
                reference: "Y".to_string(),
            },
        );
        assert!(self_reference.is_err());

        assert_eq!(rules, before);
    }

    #[test]
    fn update_replaces_in_place_and_appends_new_codes() {
        let mut rules = GroupRules::default();
        rules
            .update("D", GroupRangeRule::Fixed { from: 1, to: 3 })
            .unwrap();
        assert_eq!(
            rules.get("D"),
            Some(&GroupRangeRule::Fixed { from: 1, to: 3 })
        );
        assert_eq!(rules.iter().nth(2).map(|r| r.code.as_str()), Some("D"));

        rules
            .update("Z", GroupRangeRule::Fixed { from: 30, to: 31 })
            .unwrap();
        assert_eq!(rules.iter().last().map(|r| r.code.as_str()), Some("Z"));
        assert_eq!(rules.len(), 7);
    }

    #[test]
    fn rules_round_trip_through_json_in_order() {
        let rules = GroupRules::default();
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.contains("\"kind\":\"before_last\""));
        let back: GroupRules = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }

    #[test]
    fn color_updates_require_hex_values() {
        let mut colors = GroupColors::default();
        assert!(colors.get("Y").is_some());

        let bad = GroupColorSpec::new("green", "#000", "#fff", "#ffffff");
        assert!(matches!(
            colors.update("Y", bad),
            Err(AppError::InvalidColor { .. })
        ));

        let good = GroupColorSpec::new("#00ff00", "#000", "#fff", "#ffffff");
        colors.update("Y", good.clone()).unwrap();
        assert_eq!(colors.get("Y"), Some(&good));
    }
}
