use crate::models::{NormalizedStudent, StatisticsSnapshot};

pub const MALE: &str = "Laki-Laki";
pub const FEMALE: &str = "Perempuan";
pub const SECTION_A: &str = "A";
pub const SECTION_B: &str = "B";

/// Counts and age extremes in one pass. Among equal ages the earliest
/// student wins "youngest" and the latest wins "oldest", the same result a
/// stable ascending sort by age would give at its two ends.
pub fn compute_statistics(students: &[NormalizedStudent]) -> StatisticsSnapshot<'_> {
    let mut snapshot = StatisticsSnapshot {
        total: students.len(),
        male: 0,
        female: 0,
        section_a: 0,
        section_b: 0,
        male_a: 0,
        male_b: 0,
        female_a: 0,
        female_b: 0,
        oldest: None,
        youngest: None,
    };
    let mut oldest_age = i32::MIN;
    let mut youngest_age = i32::MAX;

    for student in students {
        let male = student.sex == MALE;
        let female = student.sex == FEMALE;
        let in_a = student.class_section == SECTION_A;
        let in_b = student.class_section == SECTION_B;

        snapshot.male += usize::from(male);
        snapshot.female += usize::from(female);
        snapshot.section_a += usize::from(in_a);
        snapshot.section_b += usize::from(in_b);
        snapshot.male_a += usize::from(male && in_a);
        snapshot.male_b += usize::from(male && in_b);
        snapshot.female_a += usize::from(female && in_a);
        snapshot.female_b += usize::from(female && in_b);

        let Some(age) = student.age else {
            continue;
        };
        if age < youngest_age {
            youngest_age = age;
            snapshot.youngest = Some(student);
        }
        if age >= oldest_age {
            oldest_age = age;
            snapshot.oldest = Some(student);
        }
    }

    snapshot
}
