use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = SpecificationError> = std::result::Result<T, E>;

/// Where a specification document came from; attached to schema errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    #[default]
    Unknown,
    Path(PathBuf),
    Named(String),
}

impl Origin {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Origin::Path(path.as_ref().to_path_buf())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Origin::Named(name.into())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Unknown => f.write_str("<unknown origin>"),
            Origin::Path(path) => write!(f, "{}", path.display()),
            Origin::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpecificationError {
    #[error("failed to read desugared library specification {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}: malformed desugared library specification: {source}")]
    Json {
        origin: Origin,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: Invalid desugared library configuration. Expected required key '{key}'")]
    MissingKey { origin: Origin, key: String },

    #[error("{origin}: Invalid desugared library specification: expected {expected} for '{context}'")]
    UnexpectedValue {
        origin: Origin,
        context: String,
        expected: &'static str,
    },

    #[error("{origin}: Unsupported machine version number {version} not in [{min},{max}]")]
    UnsupportedVersion {
        origin: Origin,
        version: i64,
        min: i64,
        max: i64,
    },

    #[error("{origin}: Invalid desugared library specification: {description} (array of size {size})")]
    ArraySize {
        origin: Origin,
        description: &'static str,
        size: usize,
    },

    #[error("{origin}: Invalid desugared library specification: Missing package mapping for {token}")]
    MissingPackageMapping { origin: Origin, token: String },

    #[error("{origin}: Invalid desugared library specification: package map is not a bijection ({detail})")]
    PackageMapNotBijective { origin: Origin, detail: String },

    #[error("{origin}: Invalid desugared library specification: malformed symbol `{symbol}`: {reason}")]
    MalformedSymbol {
        origin: Origin,
        symbol: String,
        reason: String,
    },

    #[error("{origin}: Invalid desugared library specification: unknown synthetic kind id {id}")]
    UnknownSyntheticKind { origin: Origin, id: i64 },

    #[error(
        "custom conversion `{to}` / `{from}` is not a pair of inverse single-argument conversions"
    )]
    InvalidCustomConversion { to: String, from: String },

    #[error("conflicting {category} entries for `{key}`")]
    ConflictingEntry { category: &'static str, key: String },

    #[error(
        "The compilation cannot proceed because the desugared library specification contains \
         ambiguous flags that the compiler cannot interpret: The following types are both \
         rewritten and maintained [{}]",
        .types.join(", ")
    )]
    RewrittenAndMaintained { types: Vec<String> },

    #[error(transparent)]
    Symbol(#[from] dlspec_symbols::Error),

    #[error("synthetic kind {kind} cannot derive a holder for `{context}`")]
    UnsupportedHolderKind { kind: &'static str, context: String },

    #[error(
        "cannot encode the next package because the encoding ran out of characters; \
         extend the token alphabet to fix this"
    )]
    PackageTokensExhausted,
}
