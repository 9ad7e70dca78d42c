use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

mod birthdays;
mod chat;
mod city;
mod context;
mod dataset;
mod inference;
mod models;
mod normalize;
mod report;
mod session;
mod stats;

use chat::RosterChat;
use city::CityResolver;
use context::AssistantProfile;
use inference::{GeminiClient, InferenceConfig};
use models::RawStudentRecord;
use session::Session;

#[derive(Parser)]
#[command(name = "cohort-roster-chat")]
#[command(about = "Answer questions about a class roster with grounded statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Decrypted roster file (.json array or .csv)
    #[arg(long, env = "ROSTER_PATH", default_value = "data.json", global = true)]
    roster: PathBuf,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash", global = true)]
    model: String,

    /// Reference location for distance questions
    #[arg(long, env = "ROSTER_CAMPUS", default_value = "Politeknik Elektronika Negeri Surabaya", global = true)]
    campus: String,

    #[arg(long, env = "ROSTER_COHORT", default_value = "Teknik Komputer angkatan 2023", global = true)]
    cohort: String,

    #[arg(long, default_value_t = 60, global = true)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 2, global = true)]
    max_retries: u32,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        question: String,
    },
    /// Start an interactive conversation
    Chat,
    /// Print headcounts, age extremes and shared birthdays
    Stats,
    /// Generate a markdown roster report
    Report {
        #[arg(long, default_value = "roster-report.md")]
        out: PathBuf,
    },
    /// Resolve the home city of every student
    Cities {
        /// Ask the inference service when address and birthplace are not enough
        #[arg(long)]
        fallback: bool,
    },
}

impl Cli {
    fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }

    fn profile(&self) -> AssistantProfile {
        AssistantProfile {
            cohort: self.cohort.clone(),
            campus: self.campus.clone(),
            ..AssistantProfile::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let records = load_records(&cli)?;
    let today = Local::now().date_naive();

    match &cli.command {
        Commands::Ask { question } => {
            let client = GeminiClient::new(&cli.inference_config())?;
            let chat = RosterChat::new(&client, cli.profile(), records);
            let mut session = Session::new();
            let answer = chat
                .ask(&mut session, question, today)
                .await
                .context("failed to get an answer from the inference service")?;
            println!("{answer}");
        }
        Commands::Chat => {
            let client = GeminiClient::new(&cli.inference_config())?;
            let chat = RosterChat::new(&client, cli.profile(), records);
            run_chat(&chat, today).await?;
        }
        Commands::Stats => {
            let students = normalize::normalize_roster(&records, today);
            let stats = stats::compute_statistics(&students);
            let birthdays = birthdays::group_shared_birthdays(&students);
            let output = report::build_report(&cli.cohort, today, &students, &stats, &birthdays);
            print!("{output}");
        }
        Commands::Report { out } => {
            let students = normalize::normalize_roster(&records, today);
            let stats = stats::compute_statistics(&students);
            let birthdays = birthdays::group_shared_birthdays(&students);
            let output = report::build_report(&cli.cohort, today, &students, &stats, &birthdays);
            std::fs::write(out, output)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Cities { fallback } => {
            let students = normalize::normalize_roster(&records, today);
            if *fallback {
                let client = GeminiClient::new(&cli.inference_config())?;
                let resolver = CityResolver::new(&client);
                for student in &students {
                    let city = resolver
                        .resolve(student)
                        .await
                        .with_context(|| format!("failed to resolve city for {}", student.full_name))?;
                    print_city(&student.full_name, city.as_deref());
                }
            } else {
                for student in &students {
                    print_city(&student.full_name, city::city_from_text(student).as_deref());
                }
            }
        }
    }

    Ok(())
}

/// Dataset failures stop the command; nothing is answered from partial data.
fn load_records(cli: &Cli) -> anyhow::Result<Vec<RawStudentRecord>> {
    let records = match dataset::load_roster(&cli.roster) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "Roster unavailable");
            let message = err.user_message();
            return Err(err).context(message);
        }
    };
    if records.is_empty() {
        anyhow::bail!("Data mahasiswa tidak ditemukan.");
    }
    Ok(records)
}

fn print_city(name: &str, city: Option<&str>) {
    println!("- {}: {}", name, city.unwrap_or("-"));
}

async fn run_chat(chat: &RosterChat<'_>, today: NaiveDate) -> anyhow::Result<()> {
    let mut session = Session::new();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for message in session.messages() {
        stdout.write_all(format!("{}\n", message.content).as_bytes()).await?;
    }
    if !session.has_user_asked() {
        stdout.write_all(b"Contoh pertanyaan (ketik nomornya):\n").await?;
        for (number, suggestion) in session.starter_questions().iter().enumerate() {
            stdout
                .write_all(format!("  {}. {}\n", number + 1, suggestion).as_bytes())
                .await?;
        }
    }

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let question = pick_starter(&session, input).unwrap_or(input).to_string();
        match chat.ask(&mut session, &question, today).await {
            Ok(answer) => stdout.write_all(format!("{answer}\n").as_bytes()).await?,
            Err(err) => {
                warn!(error = %err, "Inference failed");
                stdout
                    .write_all(b"Maaf, layanan sedang tidak bisa menjawab. Coba lagi ya.\n")
                    .await?;
            }
        }
    }

    Ok(())
}

/// A bare number picks one of the starter questions while they are offered.
fn pick_starter(session: &Session, input: &str) -> Option<&'static str> {
    if session.has_user_asked() {
        return None;
    }
    let index: usize = input.parse().ok()?;
    session
        .starter_questions()
        .get(index.checked_sub(1)?)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_reads_global_options() {
        let cli = Cli::try_parse_from([
            "cohort-roster-chat",
            "--roster",
            "roster.csv",
            "--campus",
            "Kampus B",
            "ask",
            "Siapa mahasiswa tertua?",
        ])
        .unwrap();

        assert_eq!(cli.roster, PathBuf::from("roster.csv"));
        assert_eq!(cli.profile().campus, "Kampus B");
        assert!(matches!(cli.command, Commands::Ask { ref question } if question == "Siapa mahasiswa tertua?"));
    }

    #[test]
    fn starter_questions_are_picked_by_number() {
        let mut session = Session::new();
        assert_eq!(pick_starter(&session, "2"), Some(session::STARTER_QUESTIONS[1]));
        assert_eq!(pick_starter(&session, "0"), None);
        assert_eq!(pick_starter(&session, "halo"), None);

        session.push_user("halo");
        assert_eq!(pick_starter(&session, "2"), None);
    }
}
