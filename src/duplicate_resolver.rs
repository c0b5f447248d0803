// src/duplicate_resolver.rs
use std::collections::{HashMap, HashSet};

use crate::group_assigner::{assign_group, GroupRules};
use crate::schedule_parser::EmployeeRecord;

/// First name plus the uppercased initial of the last name ("Jan K").
/// Names with a single token are returned as-is.
pub fn employee_key(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) if parts.len() >= 2 => {
            let initial: String = last.chars().take(1).flat_map(char::to_uppercase).collect();
            format!("{} {}", first, initial)
        }
        _ => full_name.to_string(),
    }
}

/// Group of an employee by the first roster position carrying that name.
fn group_by_name<'r>(
    name: &str,
    full_roster: &[EmployeeRecord],
    rules: &'r GroupRules,
) -> Option<&'r str> {
    let position = full_roster.iter().position(|e| e.name == name)?;
    assign_group(position, full_roster.len(), rules)
}

/// Collapses a comparison selection.
///
/// Exact name repeats keep their first occurrence. After that, an employee
/// whose key matches an earlier one from a different group is dropped; the
/// same key inside one group is kept. Order of survivors is preserved.
pub fn resolve_duplicates<'a>(
    selected: &[&'a EmployeeRecord],
    full_roster: &[EmployeeRecord],
    rules: &GroupRules,
) -> Vec<&'a EmployeeRecord> {
    let mut seen_names = HashSet::new();
    let unique: Vec<&EmployeeRecord> = selected
        .iter()
        .copied()
        .filter(|e| seen_names.insert(e.name.as_str()))
        .collect();

    // key -> group of the first employee that claimed it
    let mut first_by_key: HashMap<String, Option<&str>> = HashMap::new();
    let mut dropped = HashSet::new();

    for employee in &unique {
        let group = group_by_name(&employee.name, full_roster, rules);
        match first_by_key.get(&employee_key(&employee.name)) {
            Some(first_group) if *first_group != group => {
                dropped.insert(employee.name.as_str());
            }
            Some(_) => {}
            None => {
                first_by_key.insert(employee_key(&employee.name), group);
            }
        }
    }

    unique
        .into_iter()
        .filter(|e| !dropped.contains(e.name.as_str()))
        .collect()
}
