//! # stack-quiz Binary
//!
//! The entry point that assembles the transport, the upstream settings and
//! the quiz services, then runs one flow:
//!
//! ```text
//! stack-quiz                   list the latest answered questions
//! stack-quiz question <id>     show a question with its answers shuffled
//! stack-quiz guess <answer-id> check whether an answer is the accepted one
//! ```

use anyhow::{bail, Context};
use configs::{LogFormat, Settings};
use sq_core::models::{AnswerId, QuestionAndAnswers, QuestionFeed, QuestionId};
use sq_http_reqwest::{ReqwestTransport, TransportOptions};
use sq_service::{DataService, QuizHome};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Feed,
    Question(QuestionId),
    Guess(AnswerId),
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Command> {
    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        None | Some("feed") => Command::Feed,
        Some("question") => Command::Question(QuestionId(parse_id(args.next(), "question")?)),
        Some("guess") => Command::Guess(AnswerId(parse_id(args.next(), "answer")?)),
        Some(other) => bail!("unknown command `{other}` (expected feed, question or guess)"),
    };
    if let Some(extra) = args.next() {
        bail!("unexpected argument `{extra}`");
    }
    Ok(command)
}

fn parse_id(arg: Option<String>, kind: &str) -> anyhow::Result<u64> {
    let raw = arg.with_context(|| format!("missing {kind} id"))?;
    let id: u64 = raw
        .parse()
        .with_context(|| format!("`{raw}` is not a valid {kind} id"))?;
    if id == 0 {
        bail!("{kind} id must be positive");
    }
    Ok(id)
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    match settings.log_format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_feed(feed: &QuestionFeed) {
    if let Some(alert) = &feed.alert_message {
        println!("*** {alert} ***\n");
    }
    for question in &feed.questions {
        println!(
            "[{}] {}  ({})",
            question.id(),
            question.title(),
            question.creation_time_or_epoch().format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_question(qa: &QuestionAndAnswers) {
    println!("[{}] {}\n", qa.question.id(), qa.question.title());
    if let Some(body) = qa.question.body_html() {
        println!("{body}\n");
    }
    for (n, answer) in qa.answers.iter().enumerate() {
        println!("--- #{} (guess with `stack-quiz guess {}`)", n + 1, answer.id());
        println!("{}\n", answer.body_html().unwrap_or("(no body)"));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = configs::load_env_file();
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings);
    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "ignoring unreadable .env file"),
    }

    let command = parse_args(std::env::args().skip(1))?;

    // 1. Transport with an explicit timeout
    let mut options = TransportOptions {
        timeout: settings.timeout(),
        ..TransportOptions::default()
    };
    if let Some(user_agent) = &settings.user_agent {
        options.user_agent = user_agent.clone();
    }
    let transport = ReqwestTransport::new(options)?;

    // 2. Services
    let service = DataService::new(Arc::new(transport), Arc::new(settings.api_settings()));
    let home = QuizHome::new(service, settings.feed_defaults());

    info!(site = %settings.site, ?command, "stack-quiz starting");

    match command {
        Command::Feed => print_feed(&home.index().await),
        Command::Question(id) => {
            let qa = home
                .question(id)
                .await
                .with_context(|| format!("could not load question {id}"))?;
            print_question(&qa);
        }
        Command::Guess(id) => print_feed(&home.answer_guess(id).await),
    }
    Ok(())
}
