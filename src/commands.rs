/// Available commands and autocomplete logic

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Drop the whole cache and refetch
  Refresh,
  /// Refetch the current page, cache allowed
  Soft,
  /// Clear search conditions and go back to page 1
  Reset,
  /// Sweep expired cache entries
  Sweep,
  /// Empty the table and the cache
  Clear,
  /// Show every column again
  Columns,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: Action,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Drop cache and refetch",
    action: Action::Refresh,
  },
  Command {
    name: "soft",
    aliases: &["s"],
    description: "Refetch current page from upstream",
    action: Action::Soft,
  },
  Command {
    name: "reset",
    aliases: &["clear-search"],
    description: "Reset search and go to page 1",
    action: Action::Reset,
  },
  Command {
    name: "sweep",
    aliases: &["gc", "expire"],
    description: "Drop expired cache entries",
    action: Action::Sweep,
  },
  Command {
    name: "clear",
    aliases: &["c", "empty"],
    description: "Empty table and cache",
    action: Action::Clear,
  },
  Command {
    name: "columns",
    aliases: &["cols"],
    description: "Show all columns",
    action: Action::Columns,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit tabledeck",
    action: Action::Quit,
  },
];

/// Look up a command by exact name or alias
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &input_lower).map(|p| (cmd, p)))
    .collect();

  // Stable, so ties keep declaration order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better: exact name, exact alias, name prefix, alias prefix,
/// name substring, alias substring.
fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}
