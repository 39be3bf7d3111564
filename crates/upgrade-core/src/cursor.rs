//! Cursor de ejecución: envuelve la sesión y registra cada sentencia exitosa
//! en el `Ledger`.
//!
//! - `exec_sql` / `exec_ddl` / `exec_dml`: sentencias mutantes, registradas
//!   como exitosas sólo si la sesión no devolvió error.
//! - `exec_query_*`: lecturas (no se registran, no tienen rollback).
//! - `commit`: commit de la sesión seguido de `Ledger::record_committed`.

use log::{error, info};

use crate::errors::UpgradeError;
use crate::ledger::{Ledger, StatementRecord};
use crate::session::SqlSession;

pub struct QueryCursor<'a> {
    session: &'a mut dyn SqlSession,
    ledger: &'a mut Ledger,
}

impl<'a> QueryCursor<'a> {
    pub fn new(session: &'a mut dyn SqlSession, ledger: &'a mut Ledger) -> Self {
        Self { session, ledger }
    }

    pub fn exec_sql(&mut self, record: StatementRecord) -> Result<usize, UpgradeError> {
        match self.session.execute(&record.sql) {
            Ok(rowcount) => {
                info!("succeed to execute sql: {}, rowcount = {}", record.sql, rowcount);
                self.ledger.record_succeeded(record);
                Ok(rowcount)
            }
            Err(e) => {
                error!("fail to execute sql: {}, err: {}", record.sql, e);
                Err(e)
            }
        }
    }

    /// Como `exec_sql`, pero rechaza todo lo que no sea DDL.
    pub fn exec_ddl(&mut self, record: StatementRecord) -> Result<usize, UpgradeError> {
        check_is_ddl_sql(&record.sql)?;
        self.exec_sql(record)
    }

    /// Como `exec_sql`, pero rechaza todo lo que no sea una actualización.
    pub fn exec_dml(&mut self, record: StatementRecord) -> Result<usize, UpgradeError> {
        check_is_dml_sql(&record.sql)?;
        self.exec_sql(record)
    }

    pub fn exec_query_text(&mut self, sql: &str) -> Result<Vec<String>, UpgradeError> {
        let rows = self.session.query_text(sql).inspect_err(|e| error!("fail to execute query: {sql}, err: {e}"))?;
        info!("succeed to execute query: {}, rowcount = {}", sql, rows.len());
        Ok(rows)
    }

    pub fn exec_query_int(&mut self, sql: &str) -> Result<Vec<i64>, UpgradeError> {
        let rows = self.session.query_int(sql).inspect_err(|e| error!("fail to execute query: {sql}, err: {e}"))?;
        info!("succeed to execute query: {}, rowcount = {}", sql, rows.len());
        Ok(rows)
    }

    /// Commit de la transacción en curso. Sólo si el commit tuvo éxito se
    /// trasladan las sentencias exitosas a la lista de commiteadas.
    pub fn commit(&mut self) -> Result<(), UpgradeError> {
        self.session.commit()?;
        self.ledger.record_committed();
        Ok(())
    }
}

fn first_keyword(sql: &str) -> Option<String> {
    sql.split_whitespace().next().map(|w| w.to_lowercase())
}

pub fn check_is_ddl_sql(sql: &str) -> Result<(), UpgradeError> {
    match first_keyword(sql).as_deref() {
        Some("create" | "alter" | "drop") => Ok(()),
        _ => Err(UpgradeError::StatementKind { expected: "ddl", sql: sql.to_string() }),
    }
}

/// Acepta `insert`, `update`, `replace`, `delete`, `set` y la asignación de
/// variable `select @v := expr`.
pub fn check_is_dml_sql(sql: &str) -> Result<(), UpgradeError> {
    let ok = match first_keyword(sql).as_deref() {
        Some("insert" | "update" | "replace" | "delete" | "set") => true,
        Some("select") => is_variable_assignment(sql),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(UpgradeError::StatementKind { expected: "dml", sql: sql.to_string() })
    }
}

// `select @v := expr`, con o sin espacios alrededor de `:=`.
fn is_variable_assignment(sql: &str) -> bool {
    let Some((_, rest)) = sql.trim_start().split_once(char::is_whitespace) else {
        return false;
    };
    let Some((var, _)) = rest.split_once(":=") else {
        return false;
    };
    let var = var.trim();
    var.len() > 1 && var.starts_with('@') && !var.contains(char::is_whitespace)
}
