//! Prompt assembly.

use super::context::QueryContext;

/// Builds the single-shot, informational-only instruction for `context`.
pub fn build_prompt(context: &QueryContext) -> String {
    let mut prompt = format!(
        "Your name is {}. You are a helpful AI assistant for a notepad application.\n\n",
        context.ai_name
    );

    if !context.active_content.is_empty() {
        prompt.push_str(&format!(
            "The user's current note content (active tab):\n\n{}\n\n",
            context.active_content
        ));
    }

    if !context.mentioned.is_empty() {
        prompt.push_str("MENTIONED TABS:\n");
        for tab in &context.mentioned {
            let content = if tab.content.is_empty() {
                "(empty)"
            } else {
                tab.content.as_str()
            };
            prompt.push_str(&format!("\n--- Tab: \"{}\" ---\n{content}\n", tab.name));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "The user's question/request: {}\n\n",
        context.query
    ));
    prompt.push_str(RULES);
    prompt
}

const RULES: &str = "\
You only have ONE answer and the user cannot reply, so answer precisely, concisely and completely.

- Answer questions, calculations and explanations directly.
- \"This tab\", \"current tab\", \"active tab\" or \"my tab\" refers to the active note content above.
- Personal facts (such as the user's name) come only from the note content; if absent, say you don't know.
- You have no control over the application. You cannot create, delete, rename or modify tabs or groups, and cannot change settings.
- If asked to perform such an action, explain politely that you are an informational assistant only.";

#[cfg(test)]
mod tests {
    use super::build_prompt;
    use crate::ai::context::{MentionedTab, QueryContext};

    fn context() -> QueryContext {
        QueryContext {
            ai_name: "Memo".to_string(),
            query: "summarize".to_string(),
            active_content: String::new(),
            mentioned: vec![MentionedTab {
                name: "Ideas".to_string(),
                content: String::new(),
            }],
        }
    }

    #[test]
    fn prompt_names_assistant_and_marks_empty_tabs() {
        let prompt = build_prompt(&context());
        assert!(prompt.starts_with("Your name is Memo."));
        assert!(prompt.contains("--- Tab: \"Ideas\" ---\n(empty)"));
        assert!(!prompt.contains("active tab):"));
        assert!(prompt.contains("The user's question/request: summarize"));
    }

    #[test]
    fn prompt_includes_active_content_when_present() {
        let mut context = context();
        context.active_content = "buy milk".to_string();
        assert!(build_prompt(&context).contains("(active tab):\n\nbuy milk"));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let mut context = context();
        context.active_content = "buy milk".to_string();
        let prompt = build_prompt(&context);

        let active = prompt.find("(active tab):").unwrap();
        let mentioned = prompt.find("MENTIONED TABS:").unwrap();
        let question = prompt.find("The user's question/request:").unwrap();
        let rules = prompt.find("You only have ONE answer").unwrap();
        assert!(active < mentioned && mentioned < question && question < rules);
        assert!(prompt.contains("summarize\n\nYou only have ONE answer"));
    }
}
