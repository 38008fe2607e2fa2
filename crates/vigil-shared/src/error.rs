use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
