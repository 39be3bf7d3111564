use thiserror::Error;
use upgrade_core::UpgradeError;

/// Error de nivel binario: agrega a `UpgradeError` los fallos propios del
/// arranque (logging).
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    #[error("Error de logging: {0}")]
    Logging(String),
}

pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CONNECTION: i32 = 3;
pub const EXIT_PRECONDITION: i32 = 4;
pub const EXIT_EXECUTION: i32 = 5;

impl RunError {
    /// Código de salida del proceso (siempre distinto de cero).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Logging(_) => EXIT_USAGE,
            RunError::Upgrade(e) => match e {
                UpgradeError::InvalidModule(_) | UpgradeError::Catalog(_) => EXIT_USAGE,
                UpgradeError::Connection(_) => EXIT_CONNECTION,
                UpgradeError::VersionMismatch { .. } | UpgradeError::NoTenant => EXIT_PRECONDITION,
                UpgradeError::Query { .. }
                | UpgradeError::StatementKind { .. }
                | UpgradeError::SpecialAction { .. }
                | UpgradeError::Io { .. } => EXIT_EXECUTION,
            },
        }
    }
}
