//! Grounding payload for answer synthesis.
//!
//! Everything the inference service may rely on is written into one text
//! prompt: today's date, the transcript, the normalized roster, the computed
//! statistics, shared birthdays, the question and a fixed instruction policy.
//! The same inputs always produce the same payload.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{BirthdayGroup, NormalizedStudent, StatisticsSnapshot};
use crate::normalize::DISPLAY_DATE_FORMAT;
use crate::session::Session;

pub const REFUSAL: &str = "Maaf, aku tidak bisa menjawab pertanyaan itu berdasarkan data yang ada.";
pub const CLARIFICATION: &str = "Maaf, maksudmu siapa atau apa ya?";
const NOT_AVAILABLE: &str = "Tidak tersedia";

/// Who the assistant speaks for. Only the reference campus changes answers
/// (distance questions are measured from it).
#[derive(Debug, Clone)]
pub struct AssistantProfile {
    pub cohort: String,
    pub campus: String,
    pub data_source: String,
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self {
            cohort: "Teknik Komputer angkatan 2023".to_string(),
            campus: "Politeknik Elektronika Negeri Surabaya".to_string(),
            data_source: "https://mis.pens.ac.id".to_string(),
        }
    }
}

pub struct QueryContext<'a> {
    pub today: NaiveDate,
    pub session: &'a Session,
    pub students: &'a [NormalizedStudent],
    pub statistics: &'a StatisticsSnapshot<'a>,
    pub birthdays: &'a [BirthdayGroup],
    pub question: &'a str,
}

impl QueryContext<'_> {
    pub fn render(&self, profile: &AssistantProfile) -> String {
        let today = self.today.format(DISPLAY_DATE_FORMAT).to_string();
        let mut output = String::new();

        let _ = writeln!(output, "Hari ini tanggal {today}.");
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Kamu adalah chatbot yang HANYA menjawab pertanyaan tentang mahasiswa {} \
             secara ramah, seperti teman sendiri. Analisis data mahasiswa di bawah ini \
             untuk memberikan jawaban yang akurat.",
            profile.cohort
        );
        let _ = writeln!(output);

        let _ = writeln!(output, "**Riwayat Percakapan**:");
        let _ = write!(output, "{}", self.session.transcript());
        let _ = writeln!(output);

        let _ = writeln!(output, "**Data Mahasiswa**:");
        let _ = writeln!(output, "{}", pretty_json(self.students));
        let _ = writeln!(output);

        let _ = writeln!(output, "**Statistik yang Sudah Dihitung**:");
        write_statistics(&mut output, self.statistics);
        let _ = writeln!(output);

        let _ = writeln!(output, "**Mahasiswa dengan Tanggal Lahir yang Sama (Tanpa Tahun)**:");
        let _ = writeln!(output, "{}", pretty_json(&birthday_map(self.birthdays)));
        let _ = writeln!(output);

        let _ = writeln!(output, "**Pertanyaan Pengguna**:");
        let _ = writeln!(output, "{}", self.question);
        let _ = writeln!(output);

        let _ = writeln!(output, "**Instruksi**:");
        for (number, rule) in instruction_policy(&today, profile).iter().enumerate() {
            let _ = writeln!(output, "{}. {}", number + 1, rule);
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "**Informasi Tambahan**:");
        let facts = [
            format!("Mahasiswa {} berasal dari kampus {}.", profile.cohort, profile.campus),
            format!(
                "Seluruh data diambil dari {}. Tidak perlu menyebut sumber ini terus-menerus jika tidak diminta.",
                profile.data_source
            ),
            "Penanya adalah pengguna yang beragam. Tanyakan siapa dirinya jika mereka ingin \
             mengetahui informasi pribadi tentang dirinya."
                .to_string(),
            "Rumah atau asal sama dengan alamat.".to_string(),
        ];
        for (number, fact) in facts.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", number + 1, fact);
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "**Contoh**:");
        let _ = writeln!(output, "- Pertanyaan: \"Berapa banyak mahasiswa dari Surabaya?\"");
        let _ = writeln!(output, "  Jawaban: \"Ada n mahasiswa dari Surabaya: [daftar]\"");
        let _ = writeln!(output, "- Pertanyaan: \"Siapa mahasiswa termuda?\"");
        let _ = writeln!(output, "  Jawaban: \"Mahasiswa termuda adalah 'nama' ('umur' tahun).\"");

        output
    }
}

fn instruction_policy(today: &str, profile: &AssistantProfile) -> Vec<String> {
    vec![
        "Pahami pertanyaan pengguna dengan mempertimbangkan riwayat percakapan.".to_string(),
        "Jawab HANYA berdasarkan data mahasiswa dan statistik di atas. Untuk pertanyaan \
         jumlah, hitung entri yang memenuhi kriteria; untuk kota asal, periksa field \
         \"Tempat Lahir\" atau \"Alamat\"."
            .to_string(),
        format!("Jika data tidak cukup untuk menjawab, katakan: \"{REFUSAL}\""),
        "Jawab dengan bahasa yang ramah dan alami, sertakan detail yang relevan seperti \
         nama mahasiswa jika diminta."
            .to_string(),
        "Jika diminta daftar nama, tulis sebagai daftar dengan tanda \"-\".".to_string(),
        "Jika pertanyaan merujuk ke topik atau orang dari riwayat percakapan (misalnya \
         \"mereka\" atau \"yang tadi\"), jaga agar jawaban konsisten dengan konteks sebelumnya."
            .to_string(),
        format!(
            "Jika rujukan pertanyaan ambigu atau tidak jelas, minta klarifikasi dengan ramah, \
             seperti: \"{CLARIFICATION}\""
        ),
        format!(
            "Untuk pertanyaan ulang tahun, cocokkan hari dan bulan pada field \"Tanggal Lahir\" \
             dengan tanggal hari ini ({today}). Jika tidak ada, jawab tidak ada; jika bulan \
             tertentu diminta, jawab berdasarkan bulan itu, baik yang sudah lewat maupun yang \
             akan datang."
        ),
        "Untuk pertanyaan tentang asal, alamat, atau rumah, periksa field \"Alamat\".".to_string(),
        format!(
            "Untuk perbandingan jarak, bandingkan jarak setiap alamat mahasiswa ke kampus {}.",
            profile.campus
        ),
    ]
}

fn write_statistics(output: &mut String, stats: &StatisticsSnapshot<'_>) {
    let figures = [
        ("Total mahasiswa", stats.total),
        ("Jumlah mahasiswa laki-laki", stats.male),
        ("Jumlah mahasiswa perempuan", stats.female),
        ("Jumlah mahasiswa laki-laki di Kelas A", stats.male_a),
        ("Jumlah mahasiswa perempuan di Kelas A", stats.female_a),
        ("Jumlah mahasiswa laki-laki di Kelas B", stats.male_b),
        ("Jumlah mahasiswa perempuan di Kelas B", stats.female_b),
        ("Mahasiswa di Kelas A", stats.section_a),
        ("Mahasiswa di Kelas B", stats.section_b),
    ];
    for (label, value) in figures {
        let _ = writeln!(output, "- {label}: {value}");
    }
    let _ = writeln!(output, "- Mahasiswa termuda: {}", describe_extreme(stats.youngest));
    let _ = writeln!(output, "- Mahasiswa tertua: {}", describe_extreme(stats.oldest));
}

fn describe_extreme(student: Option<&NormalizedStudent>) -> String {
    match student.and_then(|s| s.age.map(|age| (s, age))) {
        Some((student, age)) => format!("{} ({})", student.full_name, age),
        None => format!("{NOT_AVAILABLE} (-)"),
    }
}

/// `{"DD-MM": [names]}` in first-seen key order.
fn birthday_map(groups: &[BirthdayGroup]) -> serde_json::Map<String, serde_json::Value> {
    groups
        .iter()
        .map(|group| (group.day_month.clone(), serde_json::json!(group.names)))
        .collect()
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}
