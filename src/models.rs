use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One roster row as it arrives from the source dataset. Every key may be
/// missing; numbers are accepted wherever text is expected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStudentRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub nrp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nama: Option<String>,
    #[serde(default, rename = "program studi", deserialize_with = "lenient_text")]
    pub program_studi: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pararel: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dosen_wali: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tgllahir: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tmplahir: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tglmasuk: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub jenis_kelamin: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub warga: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub agama: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub golongan_darah: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub alamat: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notelp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub asal_sekolah: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tgllulus: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub jalur_penerimaan: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Canonical student entity. Serialized with the roster's display labels
/// because that is how the dataset is presented to the inference service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStudent {
    #[serde(rename = "NRP")]
    pub id: String,
    #[serde(rename = "Nama")]
    pub full_name: String,
    #[serde(rename = "Program Studi")]
    pub program: String,
    #[serde(rename = "Semester")]
    pub semester: String,
    #[serde(rename = "Pararel")]
    pub class_section: String,
    #[serde(rename = "Dosen Wali")]
    pub advisor: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(skip)]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "Tanggal Lahir")]
    pub birth_date_display: String,
    #[serde(rename = "Tempat Lahir")]
    pub birth_place: String,
    #[serde(rename = "Tanggal Masuk")]
    pub entry_date: String,
    #[serde(rename = "Jenis Kelamin")]
    pub sex: String,
    #[serde(rename = "Warga")]
    pub nationality: String,
    #[serde(rename = "Agama")]
    pub religion: String,
    #[serde(rename = "Golongan Darah")]
    pub blood_type: String,
    #[serde(rename = "Alamat")]
    pub address: String,
    #[serde(rename = "No. Telp")]
    pub phone: String,
    #[serde(rename = "WhatsApp Link")]
    pub messaging_link: String,
    #[serde(rename = "Asal Sekolah")]
    pub school_of_origin: String,
    #[serde(rename = "Tanggal Lulus")]
    pub graduation_date: String,
    #[serde(rename = "Jalur Penerimaan")]
    pub admission_pathway: String,
    #[serde(rename = "Umur")]
    pub age: Option<i32>,
}

/// Aggregate figures over one normalized roster. Borrowed from the list it
/// was computed from, so it cannot outlive a roster change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot<'a> {
    pub total: usize,
    pub male: usize,
    pub female: usize,
    pub section_a: usize,
    pub section_b: usize,
    pub male_a: usize,
    pub male_b: usize,
    pub female_a: usize,
    pub female_b: usize,
    pub oldest: Option<&'a NormalizedStudent>,
    pub youngest: Option<&'a NormalizedStudent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthdayGroup {
    pub day_month: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Pengguna",
            Role::Assistant => "Asisten",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
