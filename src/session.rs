// Game session lifecycle: create, guess, delete on win.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;
use crate::metrics;
use crate::scoring::{is_valid_guess, score};
use crate::secret::generate_secret;
use crate::store::{NewSession, SessionStore};

pub const INVALID_GUESS_MESSAGE: &str = "You must enter 4 digit number";
pub const INVALID_SESSION_MESSAGE: &str = "Invalid game session";

/// Category of a guess reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// Bad input or unknown session.
    Err,
    /// Secret found; the session is gone.
    Win,
    /// Feedback string; the session continues.
    Info,
}

impl ReplyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyKind::Err => "err",
            ReplyKind::Win => "win",
            ReplyKind::Info => "info",
        }
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuessReply {
    pub message: String,
    pub kind: ReplyKind,
}

impl GuessReply {
    fn err(message: &str) -> Self {
        Self {
            message: message.to_string(),
            kind: ReplyKind::Err,
        }
    }
}

/// Result of a guess: the reply for the player plus the session token the
/// caller should hold from now on (`None` means forget it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub reply: GuessReply,
    pub session: Option<String>,
}

pub type SecretFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Runs guesses against a [`SessionStore`]. Holds no session state itself.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    secrets: SecretFn,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_secret_source(store, Arc::new(generate_secret))
    }

    /// Use `secrets` instead of the random generator for new sessions.
    pub fn with_secret_source(store: Arc<dyn SessionStore>, secrets: SecretFn) -> Self {
        Self { store, secrets }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Start a new game and return its session id.
    pub async fn create_session(&self) -> Result<String, StoreError> {
        let secret = (self.secrets)();
        let id = self.store.insert(NewSession::new(secret)).await?;
        metrics::SESSIONS_CREATED_TOTAL.inc();
        tracing::debug!(session = %id, "game session created");
        Ok(id)
    }

    /// Submit `guess` for the session identified by `token`, creating a
    /// session first when there is none.
    pub async fn submit_guess(
        &self,
        token: Option<&str>,
        guess: &str,
    ) -> Result<GuessOutcome, StoreError> {
        let outcome = self.run_guess(token, guess).await?;
        metrics::GUESSES_TOTAL
            .with_label_values(&[outcome.reply.kind.as_str()])
            .inc();
        tracing::debug!(kind = %outcome.reply.kind, "guess processed");
        Ok(outcome)
    }

    async fn run_guess(
        &self,
        token: Option<&str>,
        guess: &str,
    ) -> Result<GuessOutcome, StoreError> {
        if !is_valid_guess(guess) {
            return Ok(GuessOutcome {
                reply: GuessReply::err(INVALID_GUESS_MESSAGE),
                session: token.map(str::to_owned),
            });
        }

        let id = match token {
            Some(t) => t.to_owned(),
            None => self.create_session().await?,
        };

        let Some(session) = self.store.find_and_increment(&id, 1).await? else {
            tracing::info!(session = %id, "guess for unknown game session");
            return Ok(Self::invalid_session());
        };

        if session.secret != guess {
            return Ok(GuessOutcome {
                reply: GuessReply {
                    message: score(&session.secret, guess),
                    kind: ReplyKind::Info,
                },
                session: Some(id),
            });
        }

        // A concurrent winning guess may have deleted the record already;
        // only the call that removed it reports the win.
        if !self.store.delete(&id).await? {
            return Ok(Self::invalid_session());
        }

        metrics::SESSIONS_WON_TOTAL.inc();
        metrics::ATTEMPTS_TO_WIN.observe(session.attempts as f64);
        tracing::info!(session = %id, attempts = session.attempts, "game won");
        Ok(GuessOutcome {
            reply: GuessReply {
                message: format!("Correct! {} attempts.", session.attempts),
                kind: ReplyKind::Win,
            },
            session: None,
        })
    }

    fn invalid_session() -> GuessOutcome {
        GuessOutcome {
            reply: GuessReply::err(INVALID_SESSION_MESSAGE),
            session: None,
        }
    }
}
