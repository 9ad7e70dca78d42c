use std::collections::HashMap;

use crate::models::{BirthdayGroup, NormalizedStudent};

/// Students sharing a birthday regardless of year, keyed `DD-MM`. Keys keep
/// the order they were first seen in; single-member keys are dropped.
pub fn group_shared_birthdays(students: &[NormalizedStudent]) -> Vec<BirthdayGroup> {
    let mut groups: Vec<BirthdayGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for student in students {
        let Some(born) = student.birth_date else {
            continue;
        };
        let key = born.format("%d-%m").to_string();
        let position = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(BirthdayGroup {
                day_month: key,
                names: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].names.push(student.full_name.clone());
    }

    groups.retain(|group| group.names.len() > 1);
    groups
}
