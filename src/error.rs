use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Error, Debug)]
pub enum ExpensiaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Transaction #{0} not found")]
    NotFound(i64),

    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    #[error("Mutation queue is flushing; try again once the save completes")]
    QueueBusy,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ExpensiaError>;
