use chrono::{Datelike, NaiveDate};

use crate::models::{NormalizedStudent, RawStudentRecord};

pub const INVALID_DATE: &str = "Tanggal tidak valid";
pub const BIRTH_DATE_FORMAT: &str = "%d-%m-%Y";
pub const DISPLAY_DATE_FORMAT: &str = "%d %B %Y";
const MESSAGING_PREFIX: &str = "https://wa.me/62";

pub fn normalize_roster(records: &[RawStudentRecord], today: NaiveDate) -> Vec<NormalizedStudent> {
    records
        .iter()
        .map(|record| normalize_record(record, today))
        .collect()
}

pub fn normalize_record(record: &RawStudentRecord, today: NaiveDate) -> NormalizedStudent {
    let birth_date = record
        .tgllahir
        .as_deref()
        .and_then(parse_birth_date);
    let age = birth_date.map(|born| age_on(born, today));
    let birth_date_display = birth_date
        .map(|born| born.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string());
    let phone = text(&record.notelp);

    NormalizedStudent {
        id: text(&record.nrp),
        full_name: title_case(&text(&record.nama)),
        program: title_case(&text(&record.program_studi)),
        semester: text(&record.semester),
        class_section: text(&record.pararel).to_uppercase(),
        advisor: title_case(&text(&record.dosen_wali)),
        status: text(&record.status),
        birth_date,
        birth_date_display,
        birth_place: title_case(&text(&record.tmplahir)),
        entry_date: text(&record.tglmasuk),
        sex: title_case(&text(&record.jenis_kelamin)),
        nationality: text(&record.warga),
        religion: title_case(&text(&record.agama)),
        blood_type: text(&record.golongan_darah),
        address: title_case(&text(&record.alamat)),
        messaging_link: messaging_link(&phone),
        phone,
        school_of_origin: title_case(&text(&record.asal_sekolah)),
        graduation_date: text(&record.tgllulus),
        admission_pathway: title_case(&text(&record.jalur_penerimaan)),
        age,
    }
}

/// `DD-MM-YYYY` with exactly four unsigned year digits; chrono's `%Y` alone
/// would also take `05` or `+2005`.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let (_, year) = value.rsplit_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT).ok()
}

/// Whole years between `born` and `today`; the count goes up on the
/// birthday itself.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let before_birthday = (today.month(), today.day()) < (born.month(), born.day());
    today.year() - born.year() - i32::from(before_birthday)
}

/// Only one leading zero is dropped before the country code is prepended.
pub fn messaging_link(phone: &str) -> String {
    if phone.is_empty() {
        return String::new();
    }
    let local = phone.strip_prefix('0').unwrap_or(phone);
    format!("{MESSAGING_PREFIX}{local}")
}

/// Upper-cases every letter that does not directly follow another letter and
/// lower-cases the rest, so `laki-laki` becomes `Laki-Laki`.
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            output.push(ch);
            previous_is_letter = false;
        }
    }

    output
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record_born(tgllahir: &str) -> RawStudentRecord {
        RawStudentRecord {
            nama: Some("siti aminah".to_string()),
            tgllahir: Some(tgllahir.to_string()),
            ..RawStudentRecord::default()
        }
    }

    #[test]
    fn age_increments_exactly_on_birthday() {
        let born = date(2005, 5, 1);
        assert_eq!(age_on(born, date(2025, 4, 30)), 19);
        assert_eq!(age_on(born, date(2025, 5, 1)), 20);
        assert_eq!(age_on(born, date(2025, 12, 31)), 20);
    }

    #[test]
    fn valid_birth_date_sets_age_and_display() {
        let student = normalize_record(&record_born("01-05-2005"), date(2025, 6, 1));
        assert_eq!(student.age, Some(20));
        assert_eq!(student.birth_date, Some(date(2005, 5, 1)));
        assert_eq!(student.birth_date_display, "01 May 2005");
    }

    #[test]
    fn malformed_birth_date_uses_placeholder() {
        for bad in [
            "2005-05-01",
            "31-02-2005",
            "kemarin",
            "",
            "01-05-05",
            "01-05-205",
            "01-05-+2005",
            "01-05-20055",
        ] {
            let student = normalize_record(&record_born(bad), date(2025, 6, 1));
            assert_eq!(student.age, None, "input {bad:?}");
            assert_eq!(student.birth_date, None);
            assert_eq!(student.birth_date_display, INVALID_DATE);
        }
    }

    #[test]
    fn short_year_is_excluded_from_extremes() {
        let today = date(2025, 6, 1);
        let students = vec![
            normalize_record(&record_born("01-05-05"), today),
            normalize_record(&record_born("01-05-2003"), today),
        ];
        let stats = crate::stats::compute_statistics(&students);
        assert_eq!(stats.oldest.and_then(|s| s.age), Some(22));
        assert_eq!(parse_birth_date("01-05-2003"), Some(date(2003, 5, 1)));
    }

    #[test]
    fn missing_fields_default_to_empty_text() {
        let student = normalize_record(&RawStudentRecord::default(), date(2025, 6, 1));
        assert_eq!(student.full_name, "");
        assert_eq!(student.address, "");
        assert_eq!(student.class_section, "");
        assert_eq!(student.messaging_link, "");
        assert_eq!(student.age, None);
        assert_eq!(student.birth_date_display, INVALID_DATE);
    }

    #[test]
    fn casing_is_applied_per_field() {
        let raw = RawStudentRecord {
            nama: Some("BUDI santoso".to_string()),
            pararel: Some("a".to_string()),
            jenis_kelamin: Some("laki-laki".to_string()),
            alamat: Some("jl. merdeka no. 5, kota surabaya".to_string()),
            golongan_darah: Some("o".to_string()),
            ..RawStudentRecord::default()
        };
        let student = normalize_record(&raw, date(2025, 6, 1));

        assert_eq!(student.full_name, "Budi Santoso");
        assert_eq!(student.class_section, "A");
        assert_eq!(student.sex, "Laki-Laki");
        assert_eq!(student.address, "Jl. Merdeka No. 5, Kota Surabaya");
        assert_eq!(student.blood_type, "o");
    }

    #[test]
    fn messaging_link_strips_a_single_zero() {
        assert_eq!(messaging_link("081234567890"), "https://wa.me/6281234567890");
        assert_eq!(messaging_link("0081234"), "https://wa.me/62081234");
        assert_eq!(messaging_link("81234"), "https://wa.me/6281234");
        assert_eq!(messaging_link(""), "");
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("2nd floor"), "2Nd Floor");
        assert_eq!(title_case("  surabaya  "), "  Surabaya  ");
    }
}
