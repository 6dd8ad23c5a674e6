use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error operating with settings: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("Error with diesel: {source}")]
    DieselError {
        #[from]
        source: diesel::result::Error,
    },
    #[error("Error with r2d2: {source}")]
    R2d2Error {
        #[from]
        source: r2d2::Error,
    },
    #[error("Error running migrations: {0}")]
    MigrationError(String),
    #[error("Issue type \"{name}\" is not present in the vocabulary")]
    IssueTypeNotFound { name: String },
    #[error("Block {block_id} already submitted a note for issue {issue_id}")]
    DuplicateNote { issue_id: Uuid, block_id: Uuid },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
