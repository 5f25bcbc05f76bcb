#![no_main]

use levelbot_core::MentionParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parser = MentionParser::new("UFUZZ");
    let raw = String::from_utf8_lossy(data);

    if let Ok(event) = serde_json::from_str::<serde_json::Value>(&raw) {
        let _ = parser.extract(&event);
    }

    let event = serde_json::json!({ "text": raw, "user": "U1", "channel": "C1" });
    match parser.extract(&event) {
        Some(mention) => {
            assert!(raw.contains(parser.mention_token()));
            assert_eq!(mention.command_text, mention.command_text.trim());
        }
        None => assert!(!raw.contains(parser.mention_token())),
    }
});
