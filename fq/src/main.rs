//! FlashQuest - flashcards in the terminal
//!
//! CLI entry point: account commands, deck management and the study views.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use flashquest::api::{ApiError, FlashcardApi, HttpApi, LoginRequest, NewCard, NewDeck, SignupRequest};
use flashquest::cli::{CardCommand, Cli, Command, DeckCommand};
use flashquest::config::Config;
use flashquest::domain::{DeckSummary, Tier, TierCounts, progress_by_card};
use flashquest::study::{LoadError, SessionData, load_all, load_deck};
use flashquest::tui;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashquest")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("flashquest.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(base_url = %config.api.base_url, "FlashQuest loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Signup {
            first_name,
            email,
            password,
        }) => cmd_signup(&config, first_name, email, password).await,
        Some(Command::Login { email, password }) => cmd_login(&config, email, password).await,
        Some(Command::Logout) => cmd_logout(&config).await,
        Some(Command::Whoami) => cmd_whoami(&config).await,
        Some(Command::Decks) | None => cmd_decks(&config).await,
        Some(Command::Deck { command }) => match command {
            DeckCommand::Show { deck } => cmd_deck_show(&config, &deck).await,
            DeckCommand::New {
                title,
                description,
                tags,
                public,
            } => {
                let deck = NewDeck {
                    title,
                    description,
                    is_public: public,
                    tags,
                };
                cmd_deck_new(&config, &deck).await
            }
        },
        Some(Command::Card { command }) => match command {
            CardCommand::New {
                deck,
                front,
                back,
                tags,
            } => cmd_card_new(&config, &deck, &NewCard { front, back, tags }).await,
            CardCommand::Delete { card } => cmd_card_delete(&config, &card).await,
        },
        Some(Command::Upload { deck, file }) => cmd_upload(&config, &deck, &file).await,
        Some(Command::Study { deck }) => cmd_study(&config, &deck).await,
        Some(Command::StudyAll { tags }) => cmd_study_all(&config, tags).await,
    }
}

/// Build a client without touching the session
fn anonymous_client(config: &Config) -> Result<HttpApi> {
    let api = HttpApi::from_config(&config.api).context("Failed to create API client")?;
    Ok(match config.api.session_cookie() {
        Some(cookie) => api.with_session(&cookie),
        None => api,
    })
}

/// Build a client carrying a session
///
/// Uses the session cookie from the environment, or logs in with the
/// configured credentials when no cookie is set.
async fn session_client(config: &Config) -> Result<Arc<HttpApi>> {
    debug!("session_client: called");
    let api = anonymous_client(config)?;
    if api.session_cookie().is_none()
        && let Some((email, password)) = config.auth.credentials()
    {
        info!(%email, "session_client: logging in with configured credentials");
        api.login(&LoginRequest { email, password })
            .await
            .map_err(explain)
            .context("Automatic login failed")?;
    }
    Ok(Arc::new(api))
}

/// Turn an API error into a user-facing report
fn explain(error: ApiError) -> eyre::Report {
    if error.is_unauthorized() {
        eyre!(
            "Not logged in. Run `fq login` and export the printed session, or set auth.email and the password variable."
        )
    } else {
        eyre::Report::new(error)
    }
}

fn load_failure(error: LoadError) -> eyre::Report {
    match error {
        LoadError::Api(e) => explain(e),
        other => eyre::Report::new(other),
    }
}

fn password_or_env(config: &Config, password: Option<String>) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => std::env::var(&config.auth.password_env)
            .with_context(|| format!("No --password given and {} is not set", config.auth.password_env)),
    }
}

async fn cmd_signup(config: &Config, first_name: String, email: String, password: Option<String>) -> Result<()> {
    debug!(%email, "cmd_signup: called");
    let api = anonymous_client(config)?;
    let request = SignupRequest {
        first_name,
        email,
        password: password_or_env(config, password)?,
    };
    let message = api.signup(&request).await.map_err(explain)?;
    println!("{} {}", "✓".green(), message);
    Ok(())
}

async fn cmd_login(config: &Config, email: Option<String>, password: Option<String>) -> Result<()> {
    debug!(?email, "cmd_login: called");
    let email = email
        .or_else(|| config.auth.email.clone())
        .ok_or_else(|| eyre!("No --email given and auth.email is not configured"))?;
    let password = password_or_env(config, password)?;

    let api = HttpApi::from_config(&config.api).context("Failed to create API client")?;
    let message = api.login(&LoginRequest { email, password }).await.map_err(explain)?;
    println!("{} {}", "✓".green(), message);

    match api.session_cookie() {
        Some(cookie) => {
            println!();
            println!("To reuse this session:");
            println!("  export {}='{}'", config.api.session_env, cookie);
        }
        None => warn!("cmd_login: server set no session cookie"),
    }
    Ok(())
}

async fn cmd_logout(config: &Config) -> Result<()> {
    debug!("cmd_logout: called");
    let api = anonymous_client(config)?;
    api.logout().await.map_err(explain)?;
    println!("{} Logged out", "✓".green());
    println!("  unset {}", config.api.session_env);
    Ok(())
}

async fn cmd_whoami(config: &Config) -> Result<()> {
    debug!("cmd_whoami: called");
    let api = session_client(config).await?;
    let user = api.me().await.map_err(explain)?;
    println!("{}", user.first_name.as_deref().unwrap_or("(no name)").bold());
    if let Some(email) = user.email {
        println!("{}", email);
    }
    println!("id: {}", user.id.dimmed());
    Ok(())
}

fn tier_counts_line(counts: &TierCounts) -> String {
    format!(
        "{} {} {}",
        format!("{} new", counts.new).red(),
        format!("{} learning", counts.learning).yellow(),
        format!("{} mastered", counts.mastered).green()
    )
}

async fn cmd_decks(config: &Config) -> Result<()> {
    debug!("cmd_decks: called");
    let api = session_client(config).await?;
    let decks = api.list_decks().await.map_err(explain)?;
    if decks.is_empty() {
        println!("No decks yet. Create one with `fq deck new <TITLE>`.");
        return Ok(());
    }

    let records = match api.list_progress().await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "cmd_decks: failed to fetch progress");
            Vec::new()
        }
    };
    let progress = progress_by_card(&records);

    let mut totals = TierCounts::default();
    println!("{}", "Decks".bold());
    println!("-----");
    for deck in decks {
        let cards = api.list_cards(&deck.id).await.map_err(explain)?;
        let summary = DeckSummary::new(deck, &cards, &progress);
        totals.new += summary.counts.new;
        totals.learning += summary.counts.learning;
        totals.mastered += summary.counts.mastered;

        println!(
            "{}  {}  Lv {} ({} xp)",
            summary.deck.title.bold(),
            summary.deck.id.dimmed(),
            summary.level,
            summary.xp
        );
        println!("    {} cards: {}", summary.card_count, tier_counts_line(&summary.counts));
    }
    println!();
    println!("Total {} cards: {}", totals.total(), tier_counts_line(&totals));
    Ok(())
}

async fn cmd_deck_show(config: &Config, deck_id: &str) -> Result<()> {
    debug!(%deck_id, "cmd_deck_show: called");
    let api = session_client(config).await?;
    let data = load_deck(api.as_ref(), deck_id).await.map_err(load_failure)?;

    let title = data.cards.first().map(|c| c.deck_title.clone());
    println!("{}", title.as_deref().unwrap_or(deck_id).bold());
    if let Some(xp) = data.experience.get(deck_id) {
        println!("Level {}  {}/{} xp", xp.level, xp.xp, xp.xp_to_next_level);
    }
    println!();

    if data.cards.is_empty() {
        println!("No cards in this deck.");
        return Ok(());
    }
    for card in &data.cards {
        let badge = match card.tier {
            Tier::New => card.tier.label().red(),
            Tier::Learning => card.tier.label().yellow(),
            Tier::Mastered => card.tier.label().green(),
        };
        println!("{}  [{}]", card.id().dimmed(), badge);
        println!("    Q: {}", card.card.front);
        println!("    A: {}", card.card.back);
        if !card.card.tags.is_empty() {
            println!("    tags: {}", card.card.tags.join(", "));
        }
    }
    Ok(())
}

async fn cmd_deck_new(config: &Config, deck: &NewDeck) -> Result<()> {
    debug!(title = %deck.title, "cmd_deck_new: called");
    let api = session_client(config).await?;
    let created = api.create_deck(deck).await.map_err(explain)?;
    println!("{} Created deck {} ({})", "✓".green(), created.title.bold(), created.id);
    Ok(())
}

async fn cmd_card_new(config: &Config, deck_id: &str, card: &NewCard) -> Result<()> {
    debug!(%deck_id, "cmd_card_new: called");
    let api = session_client(config).await?;
    let created = api.create_card(deck_id, card).await.map_err(explain)?;
    println!("{} Created card {}", "✓".green(), created.id);
    Ok(())
}

async fn cmd_card_delete(config: &Config, card_id: &str) -> Result<()> {
    debug!(%card_id, "cmd_card_delete: called");
    let api = session_client(config).await?;
    api.delete_card(card_id).await.map_err(explain)?;
    println!("{} Deleted card {}", "✓".green(), card_id);
    Ok(())
}

async fn cmd_upload(config: &Config, deck_id: &str, file: &Path) -> Result<()> {
    debug!(%deck_id, ?file, "cmd_upload: called");
    if !file.is_file() {
        return Err(eyre!("Not a file: {}", file.display()));
    }
    let api = session_client(config).await?;
    println!("Generating flashcards from {}...", file.display());
    let count = api.generate_cards(deck_id, file).await.map_err(explain)?;
    println!("{} Generated {} flashcards", "✓".green(), count);
    Ok(())
}

async fn cmd_study(config: &Config, deck_id: &str) -> Result<()> {
    debug!(%deck_id, "cmd_study: called");
    let api = session_client(config).await?;
    let data = load_deck(api.as_ref(), deck_id).await.map_err(load_failure)?;
    if data.cards.is_empty() {
        println!("No cards in this deck yet.");
        return Ok(());
    }
    run_study(config, api, data, Vec::new()).await
}

async fn cmd_study_all(config: &Config, tags: Vec<String>) -> Result<()> {
    debug!(?tags, "cmd_study_all: called");
    let api = session_client(config).await?;
    let data = load_all(api.as_ref()).await.map_err(load_failure)?;
    if data.cards.is_empty() {
        println!("No cards to study. Add cards to a deck first.");
        return Ok(());
    }
    run_study(config, api, data, tags).await
}

async fn run_study(config: &Config, api: Arc<HttpApi>, data: SessionData, tags: Vec<String>) -> Result<()> {
    let api: Arc<dyn FlashcardApi> = api;
    let summary = tui::run_study(config, api, data, tags).await?;

    println!(
        "Studied {} cards, earned {} XP",
        summary.completed,
        summary.session_xp.to_string().green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashquest::domain::{Card, Deck, ProgressRecord, classify};

    #[test]
    fn test_tier_counts_line_lists_every_tier() {
        colored::control::set_override(false);
        let counts = TierCounts {
            new: 1,
            learning: 2,
            mastered: 3,
        };
        assert_eq!(tier_counts_line(&counts), "1 new 2 learning 3 mastered");
    }

    #[test]
    fn test_explain_unauthorized() {
        let report = explain(ApiError::Unauthorized);
        assert!(report.to_string().contains("fq login"));
    }

    #[test]
    fn test_summary_uses_latest_progress() {
        let deck = Deck {
            id: "d1".to_string(),
            title: "Spanish".to_string(),
            description: None,
            level: None,
            xp: None,
            xp_to_next_level: None,
        };
        let cards = vec![Card {
            id: "c1".to_string(),
            deck_id: "d1".to_string(),
            front: "hola".to_string(),
            back: "hello".to_string(),
            tags: vec![],
        }];
        let records = vec![ProgressRecord {
            flashcard_id: "c1".to_string(),
            status: Tier::Mastered,
            correct_streak: 2,
        }];
        let progress = progress_by_card(&records);
        assert_eq!(classify(progress.get("c1").copied()).tier, Tier::Mastered);
        let summary = DeckSummary::new(deck, &cards, &progress);
        assert_eq!(summary.counts.mastered, 1);
    }
}
