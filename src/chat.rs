use chrono::NaiveDate;
use tracing::{debug, info};

use crate::birthdays::group_shared_birthdays;
use crate::context::{AssistantProfile, QueryContext};
use crate::inference::{InferenceClient, InferenceError};
use crate::models::RawStudentRecord;
use crate::normalize::normalize_roster;
use crate::session::Session;
use crate::stats::compute_statistics;

/// Answers questions about one roster. Every question recomputes the
/// normalized roster, statistics and birthday groups from the raw records.
pub struct RosterChat<'a> {
    client: &'a dyn InferenceClient,
    profile: AssistantProfile,
    records: Vec<RawStudentRecord>,
}

impl<'a> RosterChat<'a> {
    pub fn new(client: &'a dyn InferenceClient, profile: AssistantProfile, records: Vec<RawStudentRecord>) -> Self {
        Self {
            client,
            profile,
            records,
        }
    }

    /// Records the question, asks the inference service and records its
    /// answer. On failure the question stays in the transcript unanswered.
    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
        today: NaiveDate,
    ) -> Result<String, InferenceError> {
        session.push_user(question);

        let prompt = self.build_prompt(session, question, today);
        debug!(session = %session.id(), prompt_chars = prompt.len(), "Prompt assembled");

        let answer = self.client.generate(&prompt).await?.trim().to_string();
        info!(session = %session.id(), answer_chars = answer.len(), "Answer received");

        session.push_assistant(answer.clone());
        Ok(answer)
    }

    pub fn build_prompt(&self, session: &Session, question: &str, today: NaiveDate) -> String {
        let students = normalize_roster(&self.records, today);
        let statistics = compute_statistics(&students);
        let birthdays = group_shared_birthdays(&students);

        QueryContext {
            today,
            session,
            students: &students,
            statistics: &statistics,
            birthdays: &birthdays,
            question,
        }
        .render(&self.profile)
    }
}
