use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{lookup, ArgShape};

/// One line of REPL input, classified.
///
/// `action` is `noop` for blank input, `ask` for free text (carried in
/// `prompt`), `unknown` for an unrecognised slash command, or the action of a
/// registered command with its arguments in `command_args`.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.command_args.insert(key.to_string(), value);
        self
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    let Some((name, arg)) = split_command(trimmed) else {
        let mut intent = Intent::new("ask", text);
        intent.prompt = Some(trimmed.to_string());
        return intent;
    };

    let Some(spec) = lookup(&name) else {
        return Intent::new("unknown", text)
            .with_arg("command", Value::String(name))
            .with_arg("arg", Value::String(arg.to_string()));
    };

    let intent = Intent::new(spec.action, text);
    match spec.shape {
        ArgShape::None => intent,
        ArgShape::Raw(key) => intent.with_arg(key, Value::String(arg.to_string())),
        ArgShape::Single => intent.with_arg("path", Value::String(shell_split(arg).join(" "))),
        ArgShape::List => intent.with_arg(
            "paths",
            Value::Array(shell_split(arg).into_iter().map(Value::String).collect()),
        ),
    }
}

/// `/name rest` with a lowercased name. `None` when the text is not a command.
fn split_command(text: &str) -> Option<(String, &str)> {
    let tail = text.strip_prefix('/')?;
    let end = tail
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(tail.len());
    if end == 0 {
        return None;
    }
    Some((tail[..end].to_ascii_lowercase(), tail[end..].trim()))
}

/// Shell-style split; unbalanced quotes fall back to whitespace splitting.
fn shell_split(arg: &str) -> Vec<String> {
    shell_words::split(arg)
        .unwrap_or_else(|_| arg.split_whitespace().map(str::to_string).collect())
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn plain_text_is_a_question() {
        let intent = parse_intent("  why is my skin so dry in winter?  ");
        assert_eq!(intent.action, "ask");
        assert_eq!(
            intent.prompt.as_deref(),
            Some("why is my skin so dry in winter?")
        );
        assert_eq!(parse_intent("   ").action, "noop");
        assert_eq!(parse_intent("/ not a command").action, "ask");
    }

    #[test]
    fn analyze_accepts_quoted_paths() {
        let intent = parse_intent("/analyze \"/tmp/left arm.jpg\"");
        assert_eq!(intent.action, "analyze");
        assert_eq!(intent.command_args["path"], json!("/tmp/left arm.jpg"));

        let unbalanced = parse_intent("/analyze \"/tmp/left arm.jpg");
        assert_eq!(unbalanced.command_args["path"], json!("\"/tmp/left arm.jpg"));
    }

    #[test]
    fn compare_takes_two_ids() {
        let intent = parse_intent("/compare analysis_1_a analysis_2_b");
        assert_eq!(intent.action, "compare");
        assert_eq!(
            intent.command_args["paths"],
            json!(["analysis_1_a", "analysis_2_b"])
        );
    }

    #[test]
    fn raw_arguments_are_kept_as_typed() {
        let model = parse_intent("/model gemini-1.5-pro");
        assert_eq!(model.action, "set_chat_model");
        assert_eq!(model.command_args["model"], json!("gemini-1.5-pro"));

        let search = parse_intent("/search contact dermatitis");
        assert_eq!(search.action, "search_history");
        assert_eq!(search.command_args["term"], json!("contact dermatitis"));

        let history = parse_intent("/history");
        assert_eq!(history.action, "list_history");
        assert_eq!(history.command_args["severity"], json!(""));
    }

    #[test]
    fn bare_commands_and_aliases() {
        assert_eq!(parse_intent("/progress").action, "progress");
        assert_eq!(parse_intent("/reset").action, "reset_conversation");
        assert_eq!(parse_intent("/exit").action, "quit");
        assert_eq!(parse_intent("/HELP").action, "help");
        assert!(parse_intent("/clear_history").command_args.is_empty());
    }

    #[test]
    fn unknown_command_keeps_its_name_and_argument() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }
}
