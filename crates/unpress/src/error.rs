//! CLI error types.

use unpress_config::ConfigError;
use unpress_export::ExportError;
use unpress_site::SiteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("invalid export glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("{0} export file(s) failed to parse")]
    FailedExports(usize),
}
