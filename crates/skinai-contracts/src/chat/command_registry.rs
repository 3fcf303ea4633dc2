/// How the text after a slash command is turned into arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArgShape {
    None,
    /// Kept as typed under the given key.
    Raw(&'static str),
    /// One shell-quoted value under `path`.
    Single,
    /// Shell-split values under `paths`.
    List,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub action: &'static str,
    pub shape: ArgShape,
    /// Empty for aliases, which stay out of the help listing.
    pub usage: &'static str,
}

const fn command(
    name: &'static str,
    action: &'static str,
    shape: ArgShape,
    usage: &'static str,
) -> CommandSpec {
    CommandSpec {
        name,
        action,
        shape,
        usage,
    }
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    command("analyze", "analyze", ArgShape::Single, "/analyze <image>"),
    command("history", "list_history", ArgShape::Raw("severity"), "/history [severity]"),
    command("search", "search_history", ArgShape::Raw("term"), "/search <term>"),
    command("show", "show_record", ArgShape::Single, "/show <id>"),
    command("delete", "delete_record", ArgShape::Single, "/delete <id>"),
    command("clear_history", "clear_history", ArgShape::None, "/clear_history"),
    command("compare", "compare", ArgShape::List, "/compare <before-id> <after-id>"),
    command("progress", "progress", ArgShape::None, "/progress"),
    command("model", "set_chat_model", ArgShape::Raw("model"), "/model <name>"),
    command("reset", "reset_conversation", ArgShape::None, "/reset"),
    command("help", "help", ArgShape::None, "/help"),
    command("quit", "quit", ArgShape::None, "/quit"),
    command("exit", "quit", ArgShape::None, ""),
];

pub(crate) fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// One line listing every command with its arguments.
pub fn chat_help() -> String {
    COMMANDS
        .iter()
        .filter(|spec| !spec.usage.is_empty())
        .map(|spec| spec.usage)
        .collect::<Vec<_>>()
        .join("  ")
}
