use thiserror::Error;

#[derive(Error, Debug)]
pub enum MindyError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("invalid conjunction for index {partition}: {token}")]
    InvalidConjunction { partition: String, token: String },
    #[error("getting frame {category} from index {partition}: frame not found")]
    UnknownCategory { partition: String, category: String },
    #[error("getting index {partition} from schema: index not found")]
    UnknownPartition { partition: String },
    #[error("invalid {kind} name: '{name}'")]
    InvalidName { kind: &'static str, name: String },
    #[error("getting schema: {0}")]
    SchemaResolution(String),
    #[error("getting max slices: {0}")]
    ShardResolution(String),
    #[error("querying index {partition}: {message}")]
    QueryExecution { partition: String, message: String },
    #[error("querying index {partition}: expected 1 result but got {count}")]
    MalformedResponse { partition: String, count: usize },
    #[error("mindy client: {0}")]
    Client(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MindyError {
    /// Errors caused by the request itself rather than by Pilosa or the proxy.
    /// The HTTP layer answers these with a 400.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidConjunction { .. }
                | Self::UnknownCategory { .. }
                | Self::UnknownPartition { .. }
                | Self::InvalidName { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MindyError>;

// Helper conversions
impl From<config::ConfigError> for MindyError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl From<tokio::task::JoinError> for MindyError {
    fn from(e: tokio::task::JoinError) -> Self { Self::Internal(format!("partition task: {e}")) }
}
