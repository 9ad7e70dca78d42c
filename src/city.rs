use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::inference::{InferenceClient, InferenceError};
use crate::models::NormalizedStudent;
use crate::normalize::title_case;

/// Scanned in this order; the first keyword found in a text wins.
pub const REGION_KEYWORDS: [&str; 8] = ["kota", "kabupaten", "kab.", "kab", "kec.", "kec", "kel.", "kel"];

/// Resolves a student's city from their address or birthplace, asking the
/// inference service only when neither text settles it. Answers from the
/// service are remembered per address for the lifetime of the resolver.
pub struct CityResolver<'a> {
    client: &'a dyn InferenceClient,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl<'a> CityResolver<'a> {
    pub fn new(client: &'a dyn InferenceClient) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, student: &NormalizedStudent) -> Result<Option<String>, InferenceError> {
        if let Some(city) = city_from_text(student) {
            return Ok(Some(city));
        }
        self.resolve_address(&student.address).await
    }

    pub async fn resolve_address(&self, address: &str) -> Result<Option<String>, InferenceError> {
        if address.is_empty() {
            return Ok(None);
        }
        if let Some(cached) = self.cached(address) {
            debug!(address, "City fallback served from cache");
            return Ok(cached);
        }

        debug!(address, "Asking inference service for city");
        let prompt = format!(
            "Dari alamat berikut: '{address}', sebutkan nama kota atau kabupaten utamanya saja."
        );
        let answer = self.client.generate(&prompt).await?;
        let city = Some(title_case(answer.trim()));

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(address.to_string(), city.clone());
        }
        Ok(city)
    }

    fn cached(&self, address: &str) -> Option<Option<String>> {
        self.cache.lock().ok()?.get(address).cloned()
    }
}

/// The keyword heuristic over address then birthplace, falling back to the
/// birthplace itself. `None` means only the inference service can help.
pub fn city_from_text(student: &NormalizedStudent) -> Option<String> {
    let search_areas = [student.address.to_lowercase(), student.birth_place.to_lowercase()];

    for area in &search_areas {
        for keyword in REGION_KEYWORDS {
            if let Some(position) = area.find(keyword) {
                let rest = area[position + keyword.len()..].trim();
                let city = rest.split(',').next().unwrap_or_default();
                return Some(title_case(city));
            }
        }
    }

    if student.birth_place.is_empty() {
        None
    } else {
        Some(title_case(&student.birth_place))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::inference::testing::ScriptedClient;
    use crate::models::RawStudentRecord;
    use crate::normalize::normalize_record;

    fn sample_student(address: &str, birth_place: &str) -> NormalizedStudent {
        let raw = RawStudentRecord {
            nama: Some("avery".to_string()),
            alamat: Some(address.to_string()),
            tmplahir: Some(birth_place.to_string()),
            ..RawStudentRecord::default()
        };
        normalize_record(&raw, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[test]
    fn keyword_in_address_wins() {
        let student = sample_student("Jl. Merdeka, Kota Surabaya", "Malang");
        assert_eq!(city_from_text(&student).as_deref(), Some("Surabaya"));
    }

    #[test]
    fn text_after_keyword_stops_at_comma() {
        let student = sample_student("Jl. Kenanga 4, Kabupaten Sidoarjo, Jawa Timur", "");
        assert_eq!(city_from_text(&student).as_deref(), Some("Sidoarjo"));
    }

    #[test]
    fn keyword_order_is_respected() {
        // "kota" is tried before "kec." even though "kec." appears first.
        let student = sample_student("Kec. Rungkut, Kota Surabaya", "");
        assert_eq!(city_from_text(&student).as_deref(), Some("Surabaya"));
    }

    #[test]
    fn keyword_inside_a_word_still_matches() {
        let student = sample_student("Jl. Kelud 7", "");
        assert_eq!(city_from_text(&student).as_deref(), Some("Ud 7"));
    }

    #[test]
    fn birthplace_keywords_are_scanned_after_address() {
        let student = sample_student("Jl. Mawar 1", "Kabupaten Gresik");
        assert_eq!(city_from_text(&student).as_deref(), Some("Gresik"));
    }

    #[test]
    fn plain_birthplace_is_used_when_no_keyword_matches() {
        let student = sample_student("Jl. Mawar 1", "malang");
        assert_eq!(city_from_text(&student).as_deref(), Some("Malang"));
    }

    #[tokio::test]
    async fn empty_address_and_birthplace_resolve_to_none_without_calling() {
        let client = ScriptedClient::answering(&["Surabaya"]);
        let resolver = CityResolver::new(&client);

        let city = resolver.resolve(&sample_student("", "")).await.unwrap();
        assert!(city.is_none());
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn fallback_is_memoized_per_address() {
        let client = ScriptedClient::answering(&["  sidoarjo \n", "should not be used"]);
        let resolver = CityResolver::new(&client);
        let student = sample_student("Perumahan Griya Asri Blok C2", "");

        let first = resolver.resolve(&student).await.unwrap();
        let second = resolver.resolve(&student).await.unwrap();

        assert_eq!(first.as_deref(), Some("Sidoarjo"));
        assert_eq!(second, first);
        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Perumahan Griya Asri Blok C2"));
    }

    #[tokio::test]
    async fn fallback_errors_propagate_and_are_not_cached() {
        let client = ScriptedClient::default();
        client.push(Err(InferenceError::Network("connection reset".into())));
        client.push(Ok("Gresik".to_string()));
        let resolver = CityResolver::new(&client);

        assert!(resolver.resolve_address("Blok C2").await.is_err());
        let retry = resolver.resolve_address("Blok C2").await.unwrap();
        assert_eq!(retry.as_deref(), Some("Gresik"));
    }
}
