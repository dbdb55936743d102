//! Query context extraction and `@mention` parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::AiError;
use crate::model::snapshot::Snapshot;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@"([^"]+)"|@([^\s@"]+)"#).expect("valid mention regex"));

const MENTION_TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', ')'];

/// Tab text handed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionedTab {
    pub name: String,
    pub content: String,
}

/// Everything the prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub ai_name: String,
    pub query: String,
    /// Content of the active tab; empty when none is selected.
    pub active_content: String,
    pub mentioned: Vec<MentionedTab>,
}

impl QueryContext {
    /// Gathers context for `query`.
    ///
    /// Mentioned tabs are matched by name, case-insensitively, in tab order.
    /// A query that mentions no existing tab gets every tab as context.
    pub fn from_snapshot(snapshot: &Snapshot, query: &str) -> Result<Self, AiError> {
        if !snapshot.settings.ai_enabled {
            return Err(AiError::Disabled);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(AiError::EmptyQuery);
        }

        let mentions = parse_mentions(query);
        let named: Vec<MentionedTab> = snapshot
            .tabs
            .iter()
            .filter(|tab| {
                mentions
                    .iter()
                    .any(|mention| mention.eq_ignore_ascii_case(tab.name.trim()))
            })
            .map(|tab| MentionedTab {
                name: tab.name.clone(),
                content: tab.content.clone(),
            })
            .collect();
        let mentioned = if named.is_empty() {
            snapshot
                .tabs
                .iter()
                .map(|tab| MentionedTab {
                    name: tab.name.clone(),
                    content: tab.content.clone(),
                })
                .collect()
        } else {
            named
        };

        Ok(Self {
            ai_name: snapshot.settings.ai_name.clone(),
            query: query.to_string(),
            active_content: snapshot
                .active_tab()
                .map(|tab| tab.content.clone())
                .unwrap_or_default(),
            mentioned,
        })
    }
}

/// Extracts mention names in query order: `@name` or `@"two words"`.
pub fn parse_mentions(query: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(query)
        .filter_map(|captures| {
            let raw = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str())?;
            let name = raw.trim().trim_end_matches(MENTION_TRAILING_PUNCTUATION);
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_mentions;

    #[test]
    fn parses_bare_and_quoted_mentions() {
        assert_eq!(
            parse_mentions(r#"compare @Todo and @"Shopping list", please"#),
            vec!["Todo".to_string(), "Shopping list".to_string()]
        );
    }

    #[test]
    fn strips_trailing_punctuation() {
        assert_eq!(parse_mentions("what is in @Ideas?"), vec!["Ideas".to_string()]);
    }

    #[test]
    fn text_without_at_sign_has_no_mentions() {
        assert!(parse_mentions("no mentions here").is_empty());
    }
}
