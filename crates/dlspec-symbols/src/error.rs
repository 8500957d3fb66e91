use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("invalid java type name: `{0}`")]
    InvalidTypeName(String),
    #[error("unknown access modifier `{0}`")]
    UnknownModifier(String),
}
