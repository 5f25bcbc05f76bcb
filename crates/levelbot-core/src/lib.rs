//! Event interpretation and stateful dispatch for the level bot.
//!
//! Extracts commands addressed to the bot from a raw chat event stream,
//! resolves and caches user identities, applies `level` updates to the
//! per-user state and decides when the status chart must be regenerated.
//! Transport, HTTP and rendering concerns live behind the traits in
//! [`transport`].

pub mod chart;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod mention;
pub mod responses;
pub mod state;
pub mod transport;
pub mod user_directory;

pub use chart::{ChartArtifact, ChartCache, ChartDataset, ChartEntry, ChartSpec};
pub use command::{interpret, LevelArgument, ParsedCommand};
pub use dispatcher::{Dispatcher, DispatcherCollaborators, DispatcherConfig, PollCycleReport};
pub use error::ResolutionError;
pub use mention::{Mention, MentionParser, RawEvent, ResolvedMention};
pub use state::{BotState, ChartDecision};
pub use transport::{
    AttachmentField, ChartRenderer, ChatApi, EventSource, FileUpload, MessageAttachment,
    UserDirectory,
};
pub use user_directory::{UserDirectoryCache, UserProfile};
