//! Errores del runner de upgrade.
//!
//! Cada variante corresponde a una fase del orquestador. Ninguna se reintenta:
//! todo error es terminal y requiere juicio del operador, porque lo ya
//! commiteado no se deshace automáticamente.

use std::path::PathBuf;

use thiserror::Error;

use crate::TenantId;

#[derive(Debug, Error)]
pub enum UpgradeError {
    /// Fallo de transporte o autenticación al abrir/usar la conexión.
    #[error("connection error: {0}")]
    Connection(String),
    /// Los servidores del cluster no comparten el mismo prefijo de build.
    #[error("servers build_version not match: {prefixes:?}")]
    VersionMismatch { prefixes: Vec<String> },
    #[error("no tenant id")]
    NoTenant,
    #[error("invalid module: {0}")]
    InvalidModule(String),
    #[error("fail to execute sql: {sql}: {message}")]
    Query { sql: String, message: String },
    /// Sentencia rechazada antes de ejecutarse por no ser del tipo esperado.
    #[error("sql must be {expected}, sql=\"{sql}\"")]
    StatementKind { expected: &'static str, sql: String },
    /// Fallo dentro de la acción especial. `completed` lista los tenants que
    /// ya quedaron commiteados (autocommit) antes del fallo.
    #[error("special action failed at tenant {tenant_id} (completed tenants: {completed:?}): {source}")]
    SpecialAction {
        tenant_id: TenantId,
        completed: Vec<TenantId>,
        #[source]
        source: Box<UpgradeError>,
    },
    #[error("invalid action catalog: {0}")]
    Catalog(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UpgradeError {
    /// Construye un `Query` a partir de la sentencia y cualquier error mostrable.
    pub fn query(sql: &str, err: impl std::fmt::Display) -> Self {
        Self::Query { sql: sql.to_string(), message: err.to_string() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Verdadero si el error ocurrió antes de cualquier mutación del cluster.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. } | Self::NoTenant)
    }
}

pub type UpgradeResult<T> = Result<T, UpgradeError>;
