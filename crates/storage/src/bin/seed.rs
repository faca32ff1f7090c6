use std::fmt;

use drill_core::{ProgressRecord, QuestionDraft, QuestionId, RecordId};
use storage::repository::Store;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    subject: String,
    questions: u32,
    tags: Vec<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuestions { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("DRILL_DB_URL").unwrap_or_else(|_| "sqlite:drill.sqlite3".into());
        let mut subject = std::env::var("DRILL_SUBJECT").unwrap_or_else(|_| "arithmetic".into());
        let mut questions = std::env::var("DRILL_QUESTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let mut tags = std::env::var("DRILL_TAGS")
            .map(|value| split_tags(&value))
            .unwrap_or_default();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--subject" => {
                    let value = require_value(&mut args, "--subject")?;
                    subject = value;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--tags" => {
                    let value = require_value(&mut args, "--tags")?;
                    tags = split_tags(&value);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            subject,
            questions,
            tags,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:drill.sqlite3)");
    eprintln!("  --subject <name>          Subject label for the sample set (default: arithmetic)");
    eprintln!("  --questions <n>           Number of sample questions to insert (default: 5)");
    eprintln!("  --tags <a,b,c>            Comma-separated tags for the progress records");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  DRILL_DB_URL, DRILL_SUBJECT, DRILL_QUESTIONS, DRILL_TAGS");
}

const SAMPLES: &[(&str, [&str; 4], usize, &str)] = &[
    (
        "What is 7 x 8?",
        ["54", "56", "64", "58"],
        1,
        "7 x 8 = 56",
    ),
    (
        "What is 12 + 15?",
        ["26", "28", "27", "25"],
        2,
        "12 + 15 = 27",
    ),
    (
        "What is 9 squared?",
        ["81", "72", "91", "79"],
        0,
        "9 x 9 = 81",
    ),
    (
        "What is 100 / 4?",
        ["20", "24", "25", "40"],
        2,
        "100 / 4 = 25",
    ),
    (
        "What is 3 cubed?",
        ["9", "27", "81", "6"],
        1,
        "3 x 3 x 3 = 27",
    ),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let store = Store::sqlite(&args.db_url).await?;

    for i in 0..args.questions {
        let (prompt, options, correct_answer, explanation) = SAMPLES[(i as usize) % SAMPLES.len()];
        let question = QuestionDraft::new(
            prompt,
            options.iter().map(|s| (*s).to_string()).collect(),
            correct_answer,
            explanation,
            args.subject.clone(),
        )
        .validate()?
        .assign_id(QuestionId::generate());

        store.questions.insert_question(&question).await?;
        store
            .records
            .insert_record(&ProgressRecord::new(
                RecordId::generate(),
                question.id().clone(),
                args.subject.clone(),
                args.tags.clone(),
            ))
            .await?;
    }

    println!(
        "Seeded {} questions for subject {} into {}",
        args.questions, args.subject, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
