//! Read-only AI query collaborator.
//!
//! # Responsibility
//! - Extract the context of a question from a snapshot (active tab content
//!   and `@mentioned` tabs).
//! - Assemble the informational-only prompt sent to a model.
//!
//! # Invariants
//! - Never issues commands; the assistant cannot change the workspace.
//! - A disabled assistant is reported before any context is gathered.

pub mod context;
pub mod prompt;

use std::error::Error;
use std::fmt::{Display, Formatter};

use log::warn;

use crate::model::snapshot::Snapshot;

pub use context::{parse_mentions, MentionedTab, QueryContext};
pub use prompt::build_prompt;

/// Answer returned when the model produced no text.
pub const EMPTY_ANSWER: &str = "No response generated.";

/// AI collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// `settings.aiEnabled` is off.
    Disabled,
    /// Query was blank.
    EmptyQuery,
    /// Model call failed.
    Client(String),
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "AI assistant is disabled"),
            Self::EmptyQuery => write!(f, "query is empty"),
            Self::Client(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AiError {}

/// Model backend.
pub trait AiClient {
    fn generate(&mut self, prompt: &str) -> Result<String, AiError>;
}

/// Answers `query` against `snapshot` through `client`.
///
/// Model failures become an `Error: ...` answer; only a disabled assistant
/// or a blank query is returned as `Err`.
pub fn answer(
    client: &mut dyn AiClient,
    snapshot: &Snapshot,
    query: &str,
) -> Result<String, AiError> {
    let context = QueryContext::from_snapshot(snapshot, query)?;
    let prompt = build_prompt(&context);
    match client.generate(&prompt) {
        Ok(text) if text.trim().is_empty() => Ok(EMPTY_ANSWER.to_string()),
        Ok(text) => Ok(text),
        Err(err) => {
            warn!(
                "event=ai_answer module=ai status=error mentioned={} error={err}",
                context.mentioned.len()
            );
            Ok(format!("Error: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{answer, AiClient, AiError, EMPTY_ANSWER};
    use crate::model::snapshot::Snapshot;
    use crate::model::tab::Tab;

    struct Canned(Result<String, AiError>);

    impl AiClient for Canned {
        fn generate(&mut self, _prompt: &str) -> Result<String, AiError> {
            self.0.clone()
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            tabs: vec![Tab::untitled("a", 0)],
            active_tab_id: Some("a".to_string()),
            ..Snapshot::default()
        }
    }

    #[test]
    fn client_failure_becomes_error_answer() {
        let mut client = Canned(Err(AiError::Client("quota exceeded".to_string())));
        let text = answer(&mut client, &snapshot(), "hi").unwrap();
        assert_eq!(text, "Error: quota exceeded");
    }

    #[test]
    fn blank_model_output_gets_placeholder() {
        let mut client = Canned(Ok("  ".to_string()));
        assert_eq!(answer(&mut client, &snapshot(), "hi").unwrap(), EMPTY_ANSWER);
    }
}
