//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// FlashQuest - flashcards in the terminal
#[derive(Parser)]
#[command(
    name = "fq",
    about = "Study FlashQuest flashcard decks from the terminal",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Signup {
        /// First name shown in the app
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        email: String,

        /// Password (read from the configured password variable when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and print the session cookie
    Login {
        /// Email (defaults to auth.email from the config)
        #[arg(long)]
        email: Option<String>,

        /// Password (read from the configured password variable when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the account owning the session
    Whoami,

    /// Dashboard: every deck with its card tiers
    Decks,

    /// Inspect or create a deck
    Deck {
        #[command(subcommand)]
        command: DeckCommand,
    },

    /// Create or delete cards
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },

    /// Generate cards in a deck from a document
    Upload {
        /// Deck ID
        deck: String,

        /// Document to generate cards from
        file: PathBuf,
    },

    /// Study one deck
    Study {
        /// Deck ID
        deck: String,
    },

    /// Study every deck, optionally filtered by tags
    StudyAll {
        /// Only study cards carrying one of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

/// Deck subcommands
#[derive(Debug, Subcommand)]
pub enum DeckCommand {
    /// Show a deck's cards, tiers and experience
    Show {
        /// Deck ID
        deck: String,
    },

    /// Create a deck
    New {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Make the deck visible to other users
        #[arg(long)]
        public: bool,
    },
}

/// Card subcommands
#[derive(Debug, Subcommand)]
pub enum CardCommand {
    /// Add a card to a deck
    New {
        /// Deck ID
        deck: String,

        #[arg(long)]
        front: String,

        #[arg(long)]
        back: String,

        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Delete a card
    Delete {
        /// Card ID
        card: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flashquest")
        .join("logs")
        .join("flashquest.log");
    debug!(?path, "get_log_path: returning path");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["fq"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_study_all_collects_tags() {
        let cli = Cli::try_parse_from(["fq", "study-all", "--tag", "x", "-t", "y"]).unwrap();
        match cli.command {
            Some(Command::StudyAll { tags }) => assert_eq!(tags, vec!["x".to_string(), "y".to_string()]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fq", "study", "d1", "-l", "DEBUG", "--config", "/tmp/fq.yml"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/fq.yml")));
        assert!(matches!(cli.command, Some(Command::Study { deck }) if deck == "d1"));
    }

    #[test]
    fn test_deck_new_defaults() {
        let cli = Cli::try_parse_from(["fq", "deck", "new", "Spanish"]).unwrap();
        match cli.command {
            Some(Command::Deck {
                command:
                    DeckCommand::New {
                        title,
                        description,
                        tags,
                        public,
                    },
            }) => {
                assert_eq!(title, "Spanish");
                assert!(description.is_empty());
                assert!(tags.is_empty());
                assert!(!public);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_path_under_flashquest() {
        let path = get_log_path();
        assert!(path.ends_with("flashquest/logs/flashquest.log"));
    }
}
