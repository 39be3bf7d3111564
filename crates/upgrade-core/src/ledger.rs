//! Ledger de acciones: registro ordenado de sentencias ejecutadas y commiteadas.
//!
//! Invariantes:
//! - `committed` es siempre un prefijo de `succeeded`.
//! - Ambas listas son append-only salvo en `refresh()`.
//! - `refresh()` vacía ambas listas; lo commiteado hasta ese momento pasa a
//!   `retired` y sigue apareciendo en el archivo de rollback.
//! - El archivo de rollback se genera únicamente a partir de sentencias
//!   commiteadas (`retired` seguido de `committed`).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;

use crate::errors::UpgradeError;
use crate::module::Module;
use crate::TenantId;

/// Sentencia ejecutada junto con su sentencia inversa.
///
/// `rollback_sql` vacío significa que la sentencia es irreversible por diseño.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    pub module: Module,
    pub sql: String,
    pub rollback_sql: String,
    pub tenant_id: Option<TenantId>,
    pub executed_at: DateTime<Utc>,
}

impl StatementRecord {
    pub fn new(module: Module, sql: impl Into<String>, rollback_sql: impl Into<String>) -> Self {
        Self { module,
               sql: sql.into(),
               rollback_sql: rollback_sql.into(),
               tenant_id: None,
               executed_at: Utc::now() }
    }

    pub fn for_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn is_reversible(&self) -> bool {
        !self.rollback_sql.trim().is_empty()
    }
}

/// Representación legible de ambas listas para el reporte final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    pub succeeded: String,
    pub committed: String,
    pub succeeded_count: usize,
    pub committed_count: usize,
    /// Commiteadas antes del último `refresh()`.
    pub retired_count: usize,
}

#[derive(Debug, Default)]
pub struct Ledger {
    succeeded: Vec<StatementRecord>,
    committed: Vec<StatementRecord>,
    retired: Vec<StatementRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_succeeded(&mut self, record: StatementRecord) {
        self.succeeded.push(record);
    }

    /// Marca como commiteadas todas las sentencias exitosas aún no commiteadas.
    ///
    /// Debe llamarse justo después de un `commit()` exitoso de la sesión.
    pub fn record_committed(&mut self) {
        let from = self.committed.len();
        self.committed.extend(self.succeeded[from..].iter().cloned());
    }

    /// Vacía ambas listas. Las commiteadas se conservan en `retired` para el
    /// archivo de rollback; las exitosas sin commit se descartan.
    pub fn refresh(&mut self) {
        self.retired.append(&mut self.committed);
        self.succeeded.clear();
    }

    pub fn succeeded(&self) -> &[StatementRecord] {
        &self.succeeded
    }

    pub fn committed(&self) -> &[StatementRecord] {
        &self.committed
    }

    /// Todo lo commiteado en la corrida, en orden de commit.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &StatementRecord> {
        self.retired.iter().chain(self.committed.iter())
    }

    /// Sentencias ejecutadas que todavía no fueron commiteadas.
    pub fn uncommitted(&self) -> &[StatementRecord] {
        &self.succeeded[self.committed.len()..]
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats { succeeded: render(&self.succeeded),
                      committed: render(&self.committed),
                      succeeded_count: self.succeeded.len(),
                      committed_count: self.committed.len(),
                      retired_count: self.retired.len() }
    }

    /// Contenido del archivo de rollback: la sentencia commiteada más reciente
    /// primero, cada una como comentario seguida de su inversa.
    pub fn rollback_script(&self) -> String {
        let mut out = String::new();
        out.push_str("# rollback sql generated by upgrade-post\n");
        out.push_str("# commented lines are the committed sql; the line after each one is its rollback sql\n");
        out.push_str("# rollback order is the reverse of the commit order\n");
        out.push('\n');
        for record in self.history().rev() {
            let _ = writeln!(out, "# {}", record.sql);
            if record.is_reversible() {
                let _ = writeln!(out, "{}", record.rollback_sql);
            }
        }
        out
    }

    pub fn dump_rollback(&self, path: &Path) -> Result<(), UpgradeError> {
        info!("===================== begin to dump rollback sql file ============================");
        fs::write(path, self.rollback_script()).map_err(|e| UpgradeError::io(path, e))?;
        info!("=================== succeed to dump rollback sql file to {} ===================",
              path.display());
        Ok(())
    }
}

const EXECUTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn render(records: &[StatementRecord]) -> String {
    records.iter()
           .map(|r| {
               let at = r.executed_at.format(EXECUTED_AT_FORMAT);
               match r.tenant_id {
                   Some(t) => format!("[{at}] [{}] [tenant {t}] {}", r.module, r.sql),
                   None => format!("[{at}] [{}] {}", r.module, r.sql),
               }
           })
           .collect::<Vec<_>>()
           .join("\n")
}
