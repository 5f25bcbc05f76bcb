//! User-facing reply texts and the status upload payload.

use crate::command::{HELP_COMMAND, LEVEL_COMMAND, STATUS_COMMAND};
use crate::transport::{AttachmentField, FileUpload, MessageAttachment};

pub const HELP_RESPONSE_TEXT: &str = "Help is on the way!!!";
pub const HELP_ATTACHMENT_COLOR: &str = "#36a64f";
pub const STATUS_CHART_FILENAME: &str = "wtf-barchart.png";
pub const STATUS_CHART_TITLE: &str = "WTF!?! Status Graph";
pub const STATUS_CHART_COMMENT: &str =
    "Help your teammates with a big WTF Factor to make the team stronger.";

/// Help text plus the attachment listing the known commands.
pub fn help_response() -> (String, Vec<MessageAttachment>) {
    let attachment = MessageAttachment {
        color: HELP_ATTACHMENT_COLOR.to_string(),
        title: "Available Commands:".to_string(),
        fields: vec![
            AttachmentField {
                title: LEVEL_COMMAND.to_string(),
                value: "A number from 0 to 99".to_string(),
                short: false,
            },
            AttachmentField {
                title: STATUS_COMMAND.to_string(),
                value: "No parameters required".to_string(),
                short: false,
            },
        ],
    };
    (HELP_RESPONSE_TEXT.to_string(), vec![attachment])
}

pub fn level_recorded_response(display_name: &str, value: i64) -> String {
    format!("_<@{display_name}>_, level {value} recorded.  Thanks!")
}

pub fn unrecognized_response(display_name: &str) -> String {
    format!(
        "Not sure what you mean _<@{display_name}>_. Use the *{HELP_COMMAND}* to get a list of what you can do with me."
    )
}

pub fn status_chart_upload(bytes: Vec<u8>) -> FileUpload {
    FileUpload {
        filename: STATUS_CHART_FILENAME.to_string(),
        title: STATUS_CHART_TITLE.to_string(),
        initial_comment: STATUS_CHART_COMMENT.to_string(),
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        help_response, level_recorded_response, status_chart_upload, unrecognized_response,
    };

    #[test]
    fn unit_help_response_lists_level_and_status() {
        let (text, attachments) = help_response();
        assert_eq!(text, "Help is on the way!!!");
        assert_eq!(attachments.len(), 1);
        let titles = attachments[0]
            .fields
            .iter()
            .map(|field| field.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["level", "status"]);
        assert_eq!(attachments[0].color, "#36a64f");
    }

    #[test]
    fn unit_level_recorded_response_echoes_sentinels() {
        assert_eq!(
            level_recorded_response("alice", 7),
            "_<@alice>_, level 7 recorded.  Thanks!"
        );
        assert_eq!(
            level_recorded_response("alice", -2),
            "_<@alice>_, level -2 recorded.  Thanks!"
        );
    }

    #[test]
    fn unit_unrecognized_response_names_help_command() {
        let text = unrecognized_response("bob");
        assert!(text.starts_with("Not sure what you mean _<@bob>_."));
        assert!(text.contains("*help*"));
    }

    #[test]
    fn unit_status_chart_upload_uses_fixed_title_and_comment() {
        let upload = status_chart_upload(vec![9, 9]);
        assert_eq!(upload.filename, "wtf-barchart.png");
        assert_eq!(upload.title, "WTF!?! Status Graph");
        assert!(upload.initial_comment.contains("WTF Factor"));
        assert_eq!(upload.bytes, vec![9, 9]);
    }
}
