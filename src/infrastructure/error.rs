use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Planner API error: {0}")]
    Api(String),
    #[error("Invalid drop payload: {0}")]
    InvalidPayload(String),
    #[error("Task not found: {0}")]
    TaskNotFound(String),
}
