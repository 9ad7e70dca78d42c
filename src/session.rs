use uuid::Uuid;

use crate::models::ConversationMessage;

pub const GREETING: &str =
    "Halo! 👋 Saya siap membantu menjawab pertanyaan tentang mahasiswa angkatan ini. Tanyakan apa saja ya!";

/// Offered to the user until their first question.
pub const STARTER_QUESTIONS: [&str; 6] = [
    "Siapa aja yang ulang tahun di bulan ini?",
    "Siapa mahasiswa paling muda?",
    "Berapa banyak mahasiswa dari Surabaya?",
    "Siapa yang tanggal ulang tahunnya bareng?",
    "Siapa yang asalnya dari luar pulau Jawa?",
    "Siapa yang rumahnya paling jauh dari kampus?",
];

/// One user's conversation. Messages are only ever appended.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    messages: Vec<ConversationMessage>,
    has_user_asked: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: vec![ConversationMessage::assistant(GREETING)],
            has_user_asked: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn has_user_asked(&self) -> bool {
        self.has_user_asked
    }

    pub fn starter_questions(&self) -> &'static [&'static str] {
        if self.has_user_asked {
            &[]
        } else {
            &STARTER_QUESTIONS
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage::user(content));
        self.has_user_asked = true;
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ConversationMessage::assistant(content));
    }

    /// Role-labelled transcript, one message per line.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|message| format!("{}: {}\n", message.role.label(), message.content))
            .collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
