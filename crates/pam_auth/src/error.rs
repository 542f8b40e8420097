use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load library '{library}'")]
    LibraryLoad {
        library: String,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol '{symbol}' not found in '{library}'")]
    SymbolNotFound { library: String, symbol: &'static str },

    #[error("native allocator returned null for {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("failed to read config '{}'", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
