//! Implementación MySQL (Diesel) de la sesión del core.
//!
//! Objetivo general del módulo:
//! - Una única `MysqlConnection` por corrida, sin pool ni reintentos.
//! - Autocommit desactivado al conectar; `commit` emite `COMMIT` y el toggle
//!   de autocommit emite `SET autocommit = 0|1`.
//! - Lecturas de una sola columna `value`, materializadas completas con
//!   `load` (equivalente a un cursor buffered).
//! - DDL por el protocolo de texto (`batch_execute`); el resto como
//!   `sql_query(..).execute` para obtener el número de filas afectadas.

use diesel::connection::SimpleConnection;
use diesel::mysql::MysqlConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use log::{debug, warn};
use upgrade_core::cursor::check_is_ddl_sql;
use upgrade_core::{ConnectParams, Connector, SqlSession, UpgradeError};

use crate::config::database_url;
use crate::error::PersistenceError;

/// Fila de una consulta de texto (`... as value`).
#[derive(QueryableByName, Debug)]
pub struct TextRow {
    #[diesel(sql_type = Text)]
    pub value: String,
}

/// Fila de una consulta entera (`... as value`), p.ej. `tenant_id` o `count(*)`.
#[derive(QueryableByName, Debug)]
pub struct IntRow {
    #[diesel(sql_type = BigInt)]
    pub value: i64,
}

pub struct MysqlSession {
    conn: Option<MysqlConnection>,
}

impl MysqlSession {
    /// Abre la conexión y desactiva autocommit.
    pub fn establish(params: &ConnectParams) -> Result<Self, UpgradeError> {
        debug!("establish:start host={} port={} database={}", params.host, params.port, params.database);
        let mut conn = MysqlConnection::establish(&database_url(params))
            .map_err(|e| UpgradeError::Connection(PersistenceError::from(e).to_string()))?;
        batch(&mut conn, "SET autocommit = 0")?;
        debug!("establish:done host={} port={}", params.host, params.port);
        Ok(Self { conn: Some(conn) })
    }

    fn ensure_open(&mut self) -> Result<&mut MysqlConnection, UpgradeError> {
        self.conn.as_mut().ok_or_else(|| UpgradeError::Connection("connection already closed".into()))
    }
}

fn batch(conn: &mut MysqlConnection, sql: &str) -> Result<(), UpgradeError> {
    conn.batch_execute(sql).map_err(|e| PersistenceError::from(e).into_upgrade(sql))
}

impl SqlSession for MysqlSession {
    fn execute(&mut self, sql: &str) -> Result<usize, UpgradeError> {
        let conn = self.ensure_open()?;
        if check_is_ddl_sql(sql).is_ok() {
            batch(conn, sql)?;
            return Ok(0);
        }
        diesel::sql_query(sql).execute(conn).map_err(|e| PersistenceError::from(e).into_upgrade(sql))
    }

    fn query_text(&mut self, sql: &str) -> Result<Vec<String>, UpgradeError> {
        let conn = self.ensure_open()?;
        let rows: Vec<TextRow> =
            diesel::sql_query(sql).load(conn).map_err(|e| PersistenceError::from(e).into_upgrade(sql))?;
        Ok(rows.into_iter().map(|r| r.value).collect())
    }

    fn query_int(&mut self, sql: &str) -> Result<Vec<i64>, UpgradeError> {
        let conn = self.ensure_open()?;
        let rows: Vec<IntRow> =
            diesel::sql_query(sql).load(conn).map_err(|e| PersistenceError::from(e).into_upgrade(sql))?;
        Ok(rows.into_iter().map(|r| r.value).collect())
    }

    fn commit(&mut self) -> Result<(), UpgradeError> {
        batch(self.ensure_open()?, "COMMIT")?;
        debug!("commit:done");
        Ok(())
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), UpgradeError> {
        let sql = if enabled { "SET autocommit = 1" } else { "SET autocommit = 0" };
        batch(self.ensure_open()?, sql)
    }

    fn close(&mut self) -> Result<(), UpgradeError> {
        match self.conn.take() {
            Some(conn) => {
                drop(conn);
                debug!("close:done");
            }
            None => warn!("close called on an already closed connection"),
        }
        Ok(())
    }
}

/// `Connector` de producción: una `MysqlSession` nueva por llamada.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlConnector;

impl Connector for MysqlConnector {
    type Session = MysqlSession;

    fn connect(&self, params: &ConnectParams) -> Result<MysqlSession, UpgradeError> {
        MysqlSession::establish(params)
    }
}
