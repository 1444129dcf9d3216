// Interactive command-line game loop.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::error::StoreError;
use crate::scoring::is_valid_guess;
use crate::secret::generate_secret;
use crate::session::{ReplyKind, SecretFn, SessionManager};
use crate::store::SessionStore;

pub const PROMPT: &str = "guess> ";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("--secret must be a 4 digit number, got {0:?}")]
    InvalidSecret(String),
}

/// Command-line options for the interactive game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Secret for the first game only; later games are random.
    pub first_secret: Option<String>,
    /// Stop after this many wins.
    pub max_games: Option<u32>,
}

impl CliOptions {
    /// Parse `--secret NNNN` and `--max-games N`.
    pub fn from_args(args: &[String]) -> Result<Self, CliError> {
        let first_secret = crate::config::Config::parse_cli_value(args, "--secret");
        if let Some(secret) = &first_secret {
            if !is_valid_guess(secret) {
                return Err(CliError::InvalidSecret(secret.clone()));
            }
        }
        let max_games = crate::config::Config::parse_cli_value(args, "--max-games")
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0);
        Ok(Self {
            first_secret,
            max_games,
        })
    }

    /// Session manager over `store` honouring `first_secret`.
    pub fn session_manager(&self, store: Arc<dyn SessionStore>) -> SessionManager {
        match &self.first_secret {
            Some(secret) => SessionManager::with_secret_source(store, fixed_then_random(secret)),
            None => SessionManager::new(store),
        }
    }
}

/// Yield `first` once, then random secrets.
fn fixed_then_random(first: &str) -> SecretFn {
    let pending = Mutex::new(Some(first.to_string()));
    Arc::new(move || {
        pending
            .lock()
            .ok()
            .and_then(|mut p| p.take())
            .unwrap_or_else(generate_secret)
    })
}

/// What happened during a CLI run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliSummary {
    pub games_won: u32,
    pub guesses: u32,
}

/// Play until EOF, `quit`/`exit`, or `max_games` wins.
pub async fn run<R, W>(
    manager: &SessionManager,
    input: R,
    out: &mut W,
    max_games: Option<u32>,
) -> Result<CliSummary, CliError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = CliSummary::default();
    let mut token: Option<String> = None;

    writeln!(out, "Bulls and Cows: guess the 4 digit number.")?;
    writeln!(out, "B = right digit, right place. K = digit elsewhere. . = miss.")?;
    write!(out, "{PROMPT}")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let guess = line.trim();
        if guess.eq_ignore_ascii_case("quit") || guess.eq_ignore_ascii_case("exit") {
            break;
        }
        if guess.is_empty() {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            continue;
        }

        let outcome = manager.submit_guess(token.as_deref(), guess).await?;
        token = outcome.session;
        if is_valid_guess(guess) {
            summary.guesses += 1;
        }
        writeln!(out, "{}", outcome.reply.message)?;

        if outcome.reply.kind == ReplyKind::Win {
            summary.games_won += 1;
            if max_games.is_some_and(|max| summary.games_won >= max) {
                break;
            }
            writeln!(out, "New game! A fresh number has been picked.")?;
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }

    writeln!(out)?;
    writeln!(out, "Games won: {}", summary.games_won)?;
    Ok(summary)
}
