//! upgrade-persistence
//!
//! Implementación MySQL (Diesel) de la sesión usada por `upgrade-core`.
//!
//! Módulos:
//! - `mysql`: `MysqlSession` y `MysqlConnector`.
//! - `config`: carga de configuración desde .env y armado de la URL.
//! - `error`: mapeo de errores Diesel a variantes semánticas.

pub mod config;
pub mod error;
pub mod mysql;

pub use config::{database_url, DbConfig};
pub use error::PersistenceError;
pub use mysql::{MysqlConnector, MysqlSession};
