use thiserror::Error;

/// Failures the pipeline needs to tell apart from generic I/O errors
#[derive(Debug, Error)]
pub enum BriefingError {
    /// A required environment variable was not set
    #[error("{0} not found. Set it as an environment variable or add it to ~/.config/tech-briefing/.env")]
    MissingConfig(&'static str),

    /// An upstream API answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A feed body was neither RSS nor Atom
    #[error("Failed to parse feed: {0}")]
    FeedParse(String),
}
