use std::fmt::Write;

use chrono::NaiveDate;

use crate::city::city_from_text;
use crate::models::{BirthdayGroup, NormalizedStudent, StatisticsSnapshot};
use crate::normalize::DISPLAY_DATE_FORMAT;

const UNKNOWN_CITY: &str = "Tidak diketahui";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySummary {
    pub city: String,
    pub count: usize,
}

/// Students per city using only the address/birthplace heuristic, most
/// common first and alphabetical among equal counts.
pub fn summarize_by_city(students: &[NormalizedStudent]) -> Vec<CitySummary> {
    let mut map: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for student in students {
        let city = city_from_text(student)
            .filter(|city| !city.is_empty())
            .unwrap_or_else(|| UNKNOWN_CITY.to_string());
        *map.entry(city).or_insert(0) += 1;
    }

    let mut summaries: Vec<CitySummary> = map
        .into_iter()
        .map(|(city, count)| CitySummary { city, count })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    summaries
}

pub fn build_report(
    cohort: &str,
    today: NaiveDate,
    students: &[NormalizedStudent],
    stats: &StatisticsSnapshot<'_>,
    birthdays: &[BirthdayGroup],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Roster Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        cohort,
        today.format(DISPLAY_DATE_FORMAT)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headcount");
    let _ = writeln!(output, "- Total: {}", stats.total);
    let _ = writeln!(output, "- Male: {} (A: {}, B: {})", stats.male, stats.male_a, stats.male_b);
    let _ = writeln!(
        output,
        "- Female: {} (A: {}, B: {})",
        stats.female, stats.female_a, stats.female_b
    );
    let _ = writeln!(output, "- Class A: {}", stats.section_a);
    let _ = writeln!(output, "- Class B: {}", stats.section_b);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Age Extremes");
    match (stats.youngest, stats.oldest) {
        (Some(youngest), Some(oldest)) => {
            let _ = writeln!(output, "- Youngest: {} ({})", youngest.full_name, age_label(youngest));
            let _ = writeln!(output, "- Oldest: {} ({})", oldest.full_name, age_label(oldest));
        }
        _ => {
            let _ = writeln!(output, "No student has a valid birth date.");
        }
    }

    let invalid_dates = students.iter().filter(|s| s.age.is_none()).count();
    if invalid_dates > 0 {
        let _ = writeln!(output, "- Invalid birth dates: {invalid_dates}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Shared Birthdays");
    if birthdays.is_empty() {
        let _ = writeln!(output, "No shared birthdays.");
    } else {
        for group in birthdays {
            let _ = writeln!(output, "- {}: {}", group.day_month, group.names.join(", "));
        }
    }

    let cities = summarize_by_city(students);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Cities");
    if cities.is_empty() {
        let _ = writeln!(output, "No students on the roster.");
    } else {
        for summary in cities.iter().take(10) {
            let _ = writeln!(output, "- {}: {}", summary.city, summary.count);
        }
    }

    output
}

fn age_label(student: &NormalizedStudent) -> String {
    student
        .age
        .map(|age| format!("{age} years"))
        .unwrap_or_else(|| "-".to_string())
}
