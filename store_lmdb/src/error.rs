use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory is unusable: {0}")]
    Corrupted(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<std::io::Error> for LmdbError {
    fn from(e: std::io::Error) -> Self {
        LmdbError::Io(e.to_string())
    }
}

impl From<LmdbError> for refdb_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Corrupted(msg) => refdb_store::StoreError::Corruption(msg),
            other => refdb_store::StoreError::Backend(other.to_string()),
        }
    }
}
