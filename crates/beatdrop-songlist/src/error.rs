use thiserror::Error;

/// Failures that degrade a single song or a single page.  None of them end
/// the list session.
#[derive(Debug, Error)]
pub enum SongListError {
    /// No hash or key to identify the song by.  Share and local
    /// cross-referencing fall back to best effort.
    #[error("no hash or key to identify \"{title}\"")]
    MissingIdentity { title: String },

    #[error("failed to load songs at offset {offset}: {reason}")]
    Fetch { offset: usize, reason: String },

    #[error("{command} failed: {reason}")]
    Command {
        command: &'static str,
        reason: String,
    },
}
