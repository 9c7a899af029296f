use wander_session::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    /// Open the input line for a jump query.
    Search,
    Help,
    Quit,
    Unknown(String),
}

/// Single-key bindings available outside the input line.
pub fn parse_key(ch: char) -> Option<Command> {
    let cmd = match ch {
        'r' => Command::Act(Action::RandomStart),
        'b' => Command::Act(Action::Back),
        'x' => Command::Act(Action::Reset),
        's' => Command::Act(Action::Reshuffle),
        '/' => Command::Search,
        '?' | 'h' => Command::Help,
        'q' => Command::Quit,
        '1'..='9' => Command::Act(Action::Follow(ch as usize - '1' as usize)),
        _ => return None,
    };
    Some(cmd)
}

/// Parse a submitted input line. `/verb` lines are commands, anything else
/// is a jump query.
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Command::Act(Action::Jump(trimmed.to_string()));
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match (verb, rest) {
        ("/jump" | "/go", Some(q)) => Command::Act(Action::Jump(q.to_string())),
        ("/random", None) => Command::Act(Action::RandomStart),
        ("/back", None) => Command::Act(Action::Back),
        ("/reset", None) => Command::Act(Action::Reset),
        ("/shuffle", None) => Command::Act(Action::Reshuffle),
        ("/help", _) => Command::Help,
        ("/quit" | "/exit", _) => Command::Quit,
        _ => match verb[1..].parse::<usize>() {
            Ok(n) if n >= 1 && rest.is_none() => Command::Act(Action::Follow(n - 1)),
            _ => Command::Unknown(trimmed.to_string()),
        },
    }
}
