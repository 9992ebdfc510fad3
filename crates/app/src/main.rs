use std::fmt;
use std::sync::Arc;

use services::{AppServices, Clock, DeckEditorController, FocusTimer, StudySessionController, StudyState};
use storage::{ApiConfig, AuthSession, InMemoryRepository};
use study_core::model::{DeckId, Step, TimerStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingDeckId { command: &'static str },
    InvalidDeckId { raw: String },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingDeckId { command } => write!(f, "{command} requires a deck id"),
            ArgsError::InvalidDeckId { raw } => write!(f, "invalid deck id: {raw:?}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- decks [--search <term>] [--api <url>] [--demo]");
    eprintln!("  cargo run -p app -- study <deck-id>         [--api <url>] [--demo]");
    eprintln!("  cargo run -p app -- edit  <deck-id>         [--api <url>] [--demo]");
    eprintln!("  cargo run -p app -- timer");
    eprintln!();
    eprintln!("Study commands: f flip, n next, p previous, q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_API_URL, STUDY_API_TIMEOUT_SECS, STUDY_USER_ID, STUDY_API_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Decks,
    Study(DeckId),
    Edit(DeckId),
    Timer,
}

struct Args {
    command: Command,
    api_url: Option<String>,
    search: String,
    demo: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let command = match args.next().as_deref() {
            None | Some("--help" | "-h") => return Ok(None),
            Some("decks") => Command::Decks,
            Some("study") => Command::Study(parse_deck_id(&mut args, "study")?),
            Some("edit") => Command::Edit(parse_deck_id(&mut args, "edit")?),
            Some("timer") => Command::Timer,
            Some(other) => return Err(ArgsError::UnknownArg(other.to_owned())),
        };

        let mut parsed = Self {
            command,
            api_url: None,
            search: String::new(),
            demo: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api_url = Some(require_value(&mut args, "--api")?),
                "--search" => parsed.search = require_value(&mut args, "--search")?,
                "--demo" => parsed.demo = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Some(parsed))
    }
}

fn parse_deck_id(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<DeckId, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingDeckId { command })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidDeckId { raw: raw.clone() })
}

fn build_services(args: &Args) -> Result<AppServices, Box<dyn std::error::Error>> {
    if args.demo {
        return Ok(AppServices::in_memory(demo_store(), Clock::system()));
    }
    let mut config = ApiConfig::from_env()?;
    if let Some(raw) = &args.api_url {
        config = ApiConfig::new(raw)?.with_timeout(config.timeout());
    }
    let auth = Arc::new(AuthSession::from_env()?);
    Ok(AppServices::http(config, auth, Clock::system())?)
}

fn demo_store() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    let _ = repo.seed_deck(
        "Biology",
        &[("mitosis", "cell division"), ("DNA", "genetic material")],
    );
    let _ = repo.seed_deck(
        "Capitals",
        &[("France", "Paris"), ("Japan", "Tokyo"), ("Kenya", "Nairobi")],
    );
    repo
}

async fn list_decks(services: &AppServices, search: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut dashboard = services.dashboard();
    dashboard.set_search(search);
    if let Err(err) = dashboard.search().await {
        if dashboard.requires_login() {
            eprintln!("sign in first: set STUDY_USER_ID and STUDY_API_TOKEN");
        }
        return Err(err.into());
    }
    if dashboard.decks().is_empty() {
        println!("no decks");
    }
    for deck in dashboard.decks() {
        println!("{}\t{}", deck.id(), deck.name());
    }
    Ok(())
}

fn render_card(study: &StudySessionController, timer: &FocusTimer) {
    let Some((position, total)) = study.progress() else {
        return;
    };
    let face = study.orientation().map(|face| face.to_string()).unwrap_or_default();
    let timer_state = timer.snapshot();
    println!(
        "[{position}/{total}] ({face}) {}    {} {timer_state}",
        study.displayed_text().unwrap_or_default(),
        timer_state.phase().label(),
    );
}

async fn study(services: &AppServices, deck_id: DeckId) -> Result<(), Box<dyn std::error::Error>> {
    let mut study = services.study_session();
    study.load(&deck_id).await?;
    let mut timer = services.focus_timer();
    timer.start();

    println!("{}", study.deck_name().unwrap_or_default());
    render_card(&study, &timer);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "f" => {
                study.flip()?;
            }
            "n" => {
                if study.next()? == Step::Exhausted {
                    println!("end of deck");
                }
            }
            "p" => {
                study.previous()?;
            }
            "q" => break,
            "" => {}
            other => {
                eprintln!("unknown command {other:?}: f flip, n next, p previous, q quit");
                continue;
            }
        }
        if study.state() == StudyState::Exhausted {
            break;
        }
        render_card(&study, &timer);
    }

    if let Some(elapsed) = study.elapsed() {
        println!("studied for {} s", elapsed.num_seconds());
    }
    study.end();
    timer.reset();
    Ok(())
}

async fn edit(services: &AppServices, deck_id: DeckId) -> Result<(), Box<dyn std::error::Error>> {
    let mut editor: DeckEditorController = services.deck_editor();
    editor.load(&deck_id).await?;
    let Some(session) = editor.session() else {
        return Ok(());
    };

    println!("{}", session.name().local());
    for card in session.cards() {
        let card = card.to_card();
        println!("{:>3}. {}\t{}\t({})", card.index, card.front, card.back, card.id);
    }
    match editor.exit() {
        Ok(_) => println!("deck is complete"),
        Err(err) => println!("not ready to leave: {err}"),
    }
    Ok(())
}

async fn run_timer() -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = FocusTimer::new();
    let mut updates = timer.subscribe();
    timer.start();
    let phase = timer.snapshot().phase();
    println!("{}", phase.label());

    while updates.changed().await.is_ok() {
        let state = *updates.borrow_and_update();
        println!("{state}");
        if state.status() == TimerStatus::Idle {
            println!("{} begins", state.phase().label());
            break;
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    if parsed.command == Command::Timer {
        return run_timer().await;
    }

    let services = build_services(&parsed)?;
    log::debug!("signed in as {}", services.auth().user_id());
    match parsed.command {
        Command::Decks => list_decks(&services, parsed.search).await,
        Command::Study(deck_id) => study(&services, deck_id).await,
        Command::Edit(deck_id) => edit(&services, deck_id).await,
        Command::Timer => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        // Binary glue: report once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
