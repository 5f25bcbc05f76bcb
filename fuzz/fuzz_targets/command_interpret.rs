#![no_main]

use levelbot_core::{interpret, LevelArgument, ParsedCommand};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    match interpret(&text) {
        ParsedCommand::Help => assert!(text.starts_with("help")),
        ParsedCommand::SetLevel(argument) => {
            assert!(text.starts_with("level"));
            let value = argument.response_value();
            match argument {
                LevelArgument::Value(parsed) => assert_eq!(parsed, value),
                LevelArgument::MissingArgument => assert_eq!(value, -2),
                LevelArgument::InvalidArgument => assert_eq!(value, -1),
            }
        }
        ParsedCommand::Status => assert!(text.starts_with("status")),
        ParsedCommand::Unrecognized => {}
    }
});
