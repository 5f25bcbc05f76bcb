//! Interpretation of the command text that follows a bot mention.

pub const HELP_COMMAND: &str = "help";
pub const LEVEL_COMMAND: &str = "level";
pub const STATUS_COMMAND: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Argument of a `level` command.
///
/// Out-of-range integers are kept verbatim; bad input is acknowledged and
/// recorded rather than refused.
pub enum LevelArgument {
    Value(i64),
    MissingArgument,
    InvalidArgument,
}

impl LevelArgument {
    pub const MISSING_SENTINEL: i64 = -2;
    pub const INVALID_SENTINEL: i64 = -1;

    /// Parses the second whitespace-separated token of `command_text`.
    pub fn parse(command_text: &str) -> Self {
        match command_text.split_whitespace().nth(1) {
            None => Self::MissingArgument,
            Some(token) => match token.parse::<i64>() {
                Ok(value) => Self::Value(value),
                Err(_) => saturating_integer(token).map_or(Self::InvalidArgument, Self::Value),
            },
        }
    }

    /// Integer echoed back to the user and recorded on the profile.
    pub fn response_value(self) -> i64 {
        match self {
            Self::Value(value) => value,
            Self::MissingArgument => Self::MISSING_SENTINEL,
            Self::InvalidArgument => Self::INVALID_SENTINEL,
        }
    }
}

/// Clamps a well-formed integer that overflows `i64` to the nearest bound.
fn saturating_integer(token: &str) -> Option<i64> {
    let (negative, digits) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    Help,
    SetLevel(LevelArgument),
    Status,
    Unrecognized,
}

impl ParsedCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => HELP_COMMAND,
            Self::SetLevel(_) => LEVEL_COMMAND,
            Self::Status => STATUS_COMMAND,
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Maps lower-cased command text to a command.
///
/// Matching is by literal prefix in priority order `help`, `level`,
/// `status`, so `levelheaded` is a `level` command with no argument.
pub fn interpret(command_text: &str) -> ParsedCommand {
    if command_text.starts_with(HELP_COMMAND) {
        ParsedCommand::Help
    } else if command_text.starts_with(LEVEL_COMMAND) {
        ParsedCommand::SetLevel(LevelArgument::parse(command_text))
    } else if command_text.starts_with(STATUS_COMMAND) {
        ParsedCommand::Status
    } else {
        ParsedCommand::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::{interpret, LevelArgument, ParsedCommand};

    #[test]
    fn unit_interpret_level_with_integer_argument() {
        assert_eq!(
            interpret("level 42"),
            ParsedCommand::SetLevel(LevelArgument::Value(42))
        );
    }

    #[test]
    fn unit_interpret_level_sentinels_for_missing_and_invalid_arguments() {
        assert_eq!(
            interpret("level"),
            ParsedCommand::SetLevel(LevelArgument::MissingArgument)
        );
        assert_eq!(
            interpret("level abc"),
            ParsedCommand::SetLevel(LevelArgument::InvalidArgument)
        );
        assert_eq!(LevelArgument::MissingArgument.response_value(), -2);
        assert_eq!(LevelArgument::InvalidArgument.response_value(), -1);
    }

    #[test]
    fn functional_interpret_keeps_out_of_range_levels_verbatim() {
        assert_eq!(
            interpret("level -7"),
            ParsedCommand::SetLevel(LevelArgument::Value(-7))
        );
        assert_eq!(
            interpret("level 250 extra words"),
            ParsedCommand::SetLevel(LevelArgument::Value(250))
        );
    }

    #[test]
    fn regression_interpret_saturates_integers_beyond_i64() {
        assert_eq!(
            interpret("level 99999999999999999999"),
            ParsedCommand::SetLevel(LevelArgument::Value(i64::MAX))
        );
        assert_eq!(
            interpret("level -99999999999999999999"),
            ParsedCommand::SetLevel(LevelArgument::Value(i64::MIN))
        );
        assert_eq!(
            interpret("level 9999999999999999999x"),
            ParsedCommand::SetLevel(LevelArgument::InvalidArgument)
        );
        assert_eq!(
            interpret("level -"),
            ParsedCommand::SetLevel(LevelArgument::InvalidArgument)
        );
    }

    #[test]
    fn unit_interpret_recognizes_help_status_and_unknown_text() {
        assert_eq!(interpret("help"), ParsedCommand::Help);
        assert_eq!(interpret("help me please"), ParsedCommand::Help);
        assert_eq!(interpret("status"), ParsedCommand::Status);
        assert_eq!(interpret("what is my level"), ParsedCommand::Unrecognized);
        assert_eq!(interpret(""), ParsedCommand::Unrecognized);
    }

    #[test]
    fn regression_interpret_prefix_match_treats_levelheaded_as_level() {
        assert_eq!(
            interpret("levelheaded"),
            ParsedCommand::SetLevel(LevelArgument::MissingArgument)
        );
        assert_eq!(interpret("statusbar"), ParsedCommand::Status);
    }

    #[test]
    fn unit_command_names_are_stable() {
        assert_eq!(ParsedCommand::Help.name(), "help");
        assert_eq!(
            ParsedCommand::SetLevel(LevelArgument::MissingArgument).name(),
            "level"
        );
        assert_eq!(ParsedCommand::Status.name(), "status");
        assert_eq!(ParsedCommand::Unrecognized.name(), "unrecognized");
    }
}
