/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// New search box text
    Query(String),
    /// Zero-based dropdown index
    Select(usize),
    Retry,
    /// Empty line: reopen the dropdown
    Focus,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Focus;
        }

        let Some(rest) = trimmed.strip_prefix(':') else {
            return Command::Query(line.trim_end_matches(['\r', '\n']).to_string());
        };

        match rest {
            "q" | "quit" => Command::Quit,
            "r" | "retry" => Command::Retry,
            "h" | "help" | "?" => Command::Help,
            n => match n.parse::<usize>() {
                Ok(index) if index >= 1 => Command::Select(index - 1),
                _ => Command::Help,
            },
        }
    }
}
