//! Abstracción de la conexión al cluster.
//!
//! Este trait permite:
//! - Inyectar la implementación real (Diesel/MySQL en `upgrade-persistence`).
//! - Simular un cluster en memoria en los tests del orquestador.
//!
//! Contrato de lectura: las consultas devuelven una sola columna con alias
//! `value`, y el resultado completo se materializa antes de retornar.

use std::fmt;

use crate::errors::UpgradeError;

/// Parámetros de conexión resueltos por la CLI.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Esquema fijo de metadatos del cluster.
pub const DEFAULT_DATABASE: &str = "oceanbase";

impl ConnectParams {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { host: host.into(),
               port,
               user: user.into(),
               password: password.into(),
               database: DEFAULT_DATABASE.to_string() }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials { user: self.user.clone(), password: self.password.clone() }
    }
}

// El password nunca se imprime.
impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
         .field("host", &self.host)
         .field("port", &self.port)
         .field("user", &self.user)
         .field("password", &"******")
         .field("database", &self.database)
         .finish()
    }
}

/// Credenciales entregadas a la acción especial (p.ej. para conexiones por tenant).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("user", &self.user).field("password", &"******").finish()
    }
}

/// Sesión única contra el cluster.
pub trait SqlSession {
    /// Ejecuta una sentencia DDL/DML y devuelve el número de filas afectadas.
    fn execute(&mut self, sql: &str) -> Result<usize, UpgradeError>;
    /// Consulta de una columna de texto (`value`).
    fn query_text(&mut self, sql: &str) -> Result<Vec<String>, UpgradeError>;
    /// Consulta de una columna entera (`value`).
    fn query_int(&mut self, sql: &str) -> Result<Vec<i64>, UpgradeError>;
    fn commit(&mut self) -> Result<(), UpgradeError>;
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), UpgradeError>;
    /// Cierra la sesión. Llamadas posteriores a cualquier método fallan con
    /// `UpgradeError::Connection`.
    fn close(&mut self) -> Result<(), UpgradeError>;
}

/// Fábrica de sesiones: la fase `CONNECT` del orquestador.
pub trait Connector {
    type Session: SqlSession + 'static;

    /// Abre una sesión con autocommit desactivado.
    fn connect(&self, params: &ConnectParams) -> Result<Self::Session, UpgradeError>;
}
