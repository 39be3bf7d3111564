//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y luego a
//! `UpgradeError` en la frontera con el core.

use diesel::result::{ConnectionError, DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use upgrade_core::UpgradeError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    /// Conexión cerrada, caída o imposible de establecer.
    #[error("connection: {0}")]
    Connection(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Convierte a `UpgradeError` adjuntando la sentencia que falló.
    ///
    /// Los fallos de conexión durante una sentencia se reportan como
    /// `UpgradeError::Connection`; el resto como `UpgradeError::Query`.
    pub fn into_upgrade(self, sql: &str) -> UpgradeError {
        match self {
            Self::Connection(msg) => UpgradeError::Connection(format!("{msg} (while executing: {sql})")),
            other => UpgradeError::query(sql, other),
        }
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand => {
                    Self::Connection(info.message().to_string())
                }
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Unknown(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::Connection("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::InvalidCString(e) => Self::Unknown(format!("invalid cstring: {e}")),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<ConnectionError> for PersistenceError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::BadConnection(msg) => Self::Connection(msg),
            ConnectionError::InvalidConnectionUrl(msg) => Self::Connection(format!("invalid connection url: {msg}")),
            other => Self::Connection(other.to_string()),
        }
    }
}
