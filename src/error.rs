use std::io;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::error;

use crate::query::TranslateError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("corruption detected: {0}")]
    Corruption(String),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

pub fn acquire_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| {
        error!("lock poisoned - fatal error");
        StoreError::Corruption("lock poisoned - fatal error".into())
    })
}
