use thiserror::Error;

/// Failures surfaced by the catalog client and the strategy selector.
///
/// The grouping engine itself never fails; everything here originates in
/// a collaborator and is passed up unchanged to the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect to Stash at {endpoint}: {message}")]
    UpstreamUnreachable { endpoint: String, message: String },

    #[error("GraphQL error: {}", .0.join("; "))]
    UpstreamGraphQl(Vec<String>),

    #[error("unexpected response from Stash: {0}")]
    InvalidResponse(String),

    #[error("duplicate type not found: {0}")]
    UnknownStrategy(String),

    #[error("Stash endpoint is not configured")]
    Unconfigured,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that come from bad user input or missing setup
    /// rather than from the upstream server.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::UnknownStrategy(_) | Error::Unconfigured)
    }
}
