use tabnote_core::{answer, build_prompt, AiClient, AiError, QueryContext, Settings, Snapshot, Tab};

fn tab(id: &str, name: &str, content: &str) -> Tab {
    let mut tab = Tab::untitled(id, 0);
    tab.name = name.to_string();
    tab.content = content.to_string();
    tab
}

fn workspace() -> Snapshot {
    Snapshot {
        tabs: vec![
            tab("a", "Todo", "water plants"),
            tab("b", "Shopping list", "milk, eggs"),
            tab("c", "Journal", "dear diary"),
        ],
        active_tab_id: Some("c".to_string()),
        ..Snapshot::default()
    }
}

struct Recording {
    prompts: Vec<String>,
}

impl AiClient for Recording {
    fn generate(&mut self, prompt: &str) -> Result<String, AiError> {
        self.prompts.push(prompt.to_string());
        Ok("42".to_string())
    }
}

#[test]
fn mentioned_tabs_are_selected_case_insensitively() {
    let context =
        QueryContext::from_snapshot(&workspace(), r#"compare @todo with @"Shopping List""#)
            .unwrap();
    let names: Vec<&str> = context
        .mentioned
        .iter()
        .map(|tab| tab.name.as_str())
        .collect();
    assert_eq!(names, vec!["Todo", "Shopping list"]);
    assert_eq!(context.active_content, "dear diary");
    assert_eq!(context.ai_name, "Memo");
}

#[test]
fn query_without_mentions_uses_every_tab() {
    let context = QueryContext::from_snapshot(&workspace(), "what should I do today?").unwrap();
    assert_eq!(context.mentioned.len(), 3);
}

#[test]
fn disabled_assistant_is_rejected() {
    let snapshot = Snapshot {
        settings: Settings {
            ai_enabled: false,
            ..Settings::default()
        },
        ..workspace()
    };
    assert_eq!(
        QueryContext::from_snapshot(&snapshot, "hello"),
        Err(AiError::Disabled)
    );
    let mut client = Recording { prompts: Vec::new() };
    assert_eq!(answer(&mut client, &snapshot, "hello"), Err(AiError::Disabled));
    assert!(client.prompts.is_empty());
}

#[test]
fn blank_query_is_rejected() {
    assert_eq!(
        QueryContext::from_snapshot(&workspace(), "   "),
        Err(AiError::EmptyQuery)
    );
}

#[test]
fn answer_sends_informational_prompt() {
    let mut snapshot = workspace();
    snapshot.settings.ai_name = "Sage".to_string();
    let mut client = Recording { prompts: Vec::new() };

    let reply = answer(&mut client, &snapshot, "what is in @Journal").unwrap();
    assert_eq!(reply, "42");

    let prompt = &client.prompts[0];
    assert!(prompt.starts_with("Your name is Sage."));
    assert!(prompt.contains("--- Tab: \"Journal\" ---\ndear diary"));
    assert!(!prompt.contains("water plants"));
    assert!(prompt.contains("You have no control over the application."));

    let context = QueryContext::from_snapshot(&snapshot, "what is in @Journal").unwrap();
    assert_eq!(&build_prompt(&context), prompt);
}
