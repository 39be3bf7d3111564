//! Orquestador del upgrade.
//!
//! Máquina de estados lineal:
//!
//! `Connect → CheckVersion → FetchTenants → DumpSql → CommitCheckpoint →
//! [NormalDdl] → [NormalDml] → [EachTenantDml] → [SpecialAction] →
//! ReportStats → DumpRollback → Disconnect`
//!
//! Una vez abierta la sesión, `ReportStats`, `DumpRollback` y `Disconnect`
//! corren exactamente una vez sin importar el resultado de las fases
//! anteriores, y el error original se devuelve intacto.

use std::path::PathBuf;

use log::{error, info, warn};

use crate::catalog::{ActionCatalog, ActionSpec};
use crate::cluster::{check_server_version, fetch_tenant_ids};
use crate::cursor::QueryCursor;
use crate::errors::UpgradeError;
use crate::ledger::{Ledger, LedgerStats, StatementRecord};
use crate::module::{Module, ModuleSet};
use crate::session::{ConnectParams, Connector, Credentials, SqlSession};
use crate::special::{run_special_upgrade, NoopSpecialAction, SpecialAction};
use crate::TenantId;

/// Archivos de salida de la corrida. Inmutables una vez construidos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeParams {
    pub log_file: PathBuf,
    pub sql_dump_file: PathBuf,
    pub rollback_sql_file: PathBuf,
}

pub const DEFAULT_LOG_FILE: &str = "upgrade_post.log";
pub const DEFAULT_SQL_DUMP_FILE: &str = "upgrade_sql_post.txt";
pub const DEFAULT_ROLLBACK_SQL_FILE: &str = "rollback_sql_post.txt";

impl Default for UpgradeParams {
    fn default() -> Self {
        Self { log_file: PathBuf::from(DEFAULT_LOG_FILE),
               sql_dump_file: PathBuf::from(DEFAULT_SQL_DUMP_FILE),
               rollback_sql_file: PathBuf::from(DEFAULT_ROLLBACK_SQL_FILE) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    CheckVersion,
    FetchTenants,
    DumpSql,
    CommitCheckpoint,
    NormalDdl,
    NormalDml,
    EachTenantDml,
    SpecialAction,
    ReportStats,
    DumpRollback,
    Disconnect,
}

impl From<Module> for Phase {
    fn from(module: Module) -> Self {
        match module {
            Module::NormalDdl => Phase::NormalDdl,
            Module::NormalDml => Phase::NormalDml,
            Module::EachTenantDml => Phase::EachTenantDml,
            Module::SpecialAction => Phase::SpecialAction,
        }
    }
}

/// Resultado de una corrida exitosa.
#[derive(Debug, Clone, Default)]
pub struct UpgradeReport {
    pub build_version: String,
    pub tenant_ids: Vec<TenantId>,
    pub modules: ModuleSet,
    pub phases: Vec<Phase>,
    /// Todo lo commiteado en la corrida, incluido lo anterior a la acción especial.
    pub committed: Vec<StatementRecord>,
    /// Tenants procesados por la acción especial.
    pub special_tenants: Vec<TenantId>,
}

type StatsHook = Box<dyn Fn(&LedgerStats)>;

pub struct Orchestrator<C: Connector> {
    connector: C,
    params: UpgradeParams,
    catalog: ActionCatalog,
    special: Box<dyn SpecialAction>,
    on_stats: Option<StatsHook>,
}

impl<C: Connector> Orchestrator<C> {
    /// Orquestador con catálogo vacío y sin acción especial.
    pub fn new(connector: C, params: UpgradeParams) -> Self {
        Self { connector,
               params,
               catalog: ActionCatalog::default(),
               special: Box::new(NoopSpecialAction),
               on_stats: None }
    }

    pub fn with_catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_special_action(mut self, action: Box<dyn SpecialAction>) -> Self {
        self.special = action;
        self
    }

    /// Callback invocado con las estadísticas del ledger en `ReportStats`.
    pub fn on_stats<F>(mut self, hook: F) -> Self
        where F: Fn(&LedgerStats) + 'static
    {
        self.on_stats = Some(Box::new(hook));
        self
    }

    pub fn run(&self, connect: &ConnectParams, modules: &ModuleSet) -> Result<UpgradeReport, UpgradeError> {
        info!("begin upgrade: host={} port={} user={} modules={}",
              connect.host, connect.port, connect.user, modules);
        let mut session = self.connector.connect(connect).inspect_err(|e| error!("connection error: {e}"))?;
        let mut ledger = Ledger::new();
        let mut report = UpgradeReport { modules: modules.clone(),
                                         phases: vec![Phase::Connect],
                                         ..Default::default() };

        let outcome = self.run_phases(&mut session, &mut ledger, &connect.credentials(), &mut report);
        if let Err(e) = &outcome {
            error!("run error: {e}");
        }

        report.phases.push(Phase::ReportStats);
        self.print_stats(&ledger);
        report.phases.push(Phase::DumpRollback);
        if let Err(e) = ledger.dump_rollback(&self.params.rollback_sql_file) {
            error!("fail to dump rollback sql: {e}");
        }
        report.phases.push(Phase::Disconnect);
        if let Err(e) = session.close() {
            warn!("fail to close connection: {e}");
        }

        match outcome {
            Ok(()) => {
                report.committed = ledger.history().cloned().collect();
                info!("upgrade finished: tenants={:?} modules={}", report.tenant_ids, modules);
                Ok(report)
            }
            Err(e) => {
                error!("run error, maybe you can reference {} to rollback it",
                       self.params.rollback_sql_file.display());
                Err(e)
            }
        }
    }

    fn run_phases(&self,
                  session: &mut C::Session,
                  ledger: &mut Ledger,
                  credentials: &Credentials,
                  report: &mut UpgradeReport)
                  -> Result<(), UpgradeError> {
        let tenant_ids = {
            let mut cursor = QueryCursor::new(&mut *session, &mut *ledger);
            report.phases.push(Phase::CheckVersion);
            report.build_version = check_server_version(&mut cursor)?;

            report.phases.push(Phase::FetchTenants);
            let tenant_ids = fetch_tenant_ids(&mut cursor)?;
            if tenant_ids.is_empty() {
                error!("distinct tenant id count is <= 0, tenant_id_count: 0");
                return Err(UpgradeError::NoTenant);
            }
            info!("there has {} distinct tenant ids: [{}]",
                  tenant_ids.len(),
                  tenant_ids.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(","));

            report.phases.push(Phase::DumpSql);
            if let Err(e) = self.catalog.dump_sql_plan(&self.params.sql_dump_file, &tenant_ids) {
                warn!("fail to dump sql file: {e}");
            }

            report.phases.push(Phase::CommitCheckpoint);
            cursor.commit()?;
            tenant_ids
        };
        report.tenant_ids = tenant_ids.clone();

        let modules = report.modules.clone();
        for module in modules.iter() {
            report.phases.push(module.into());
            match module {
                Module::NormalDdl | Module::NormalDml => self.run_normal(session, ledger, module)?,
                Module::EachTenantDml => self.run_each_tenant(session, ledger, &tenant_ids)?,
                Module::SpecialAction => {
                    report.special_tenants = self.run_special(session, ledger, &tenant_ids, credentials)?;
                }
            }
        }
        Ok(())
    }

    /// DDL o DML normales: una transacción por módulo.
    fn run_normal(&self, session: &mut C::Session, ledger: &mut Ledger, module: Module) -> Result<(), UpgradeError> {
        info!("================begin to run {module}===============");
        let mut cursor = QueryCursor::new(&mut *session, &mut *ledger);
        for action in self.catalog.actions(module) {
            if already_applied(&mut cursor, action)? {
                continue;
            }
            let record = StatementRecord::new(module, action.sql.clone(), action.rollback_sql.clone());
            if module == Module::NormalDdl {
                cursor.exec_ddl(record)?;
            } else {
                cursor.exec_dml(record)?;
            }
        }
        cursor.commit()?;
        info!("================succeed to commit {module}===============");
        Ok(())
    }

    /// DML por tenant: una transacción por tenant.
    fn run_each_tenant(&self,
                       session: &mut C::Session,
                       ledger: &mut Ledger,
                       tenant_ids: &[TenantId])
                       -> Result<(), UpgradeError> {
        info!("================begin to run each_tenant_dml===============");
        let mut cursor = QueryCursor::new(&mut *session, &mut *ledger);
        for &tenant_id in tenant_ids {
            for action in self.catalog.each_tenant_dml.iter().map(|a| a.render(tenant_id)) {
                if already_applied(&mut cursor, &action)? {
                    continue;
                }
                let record = StatementRecord::new(Module::EachTenantDml, action.sql, action.rollback_sql)
                    .for_tenant(tenant_id);
                cursor.exec_dml(record)?;
            }
            cursor.commit()?;
            info!("succeed to commit each_tenant_dml for tenant {tenant_id}");
        }
        Ok(())
    }

    fn run_special(&self,
                   session: &mut C::Session,
                   ledger: &mut Ledger,
                   tenant_ids: &[TenantId],
                   credentials: &Credentials)
                   -> Result<Vec<TenantId>, UpgradeError> {
        info!("================begin to run special action===============");
        session.set_autocommit(true)?;
        let done = run_special_upgrade(&mut *session, tenant_ids, credentials, self.special.as_ref())?;
        session.set_autocommit(false)?;
        ledger.refresh();
        info!("================succeed to commit special action===============");
        Ok(done)
    }

    fn print_stats(&self, ledger: &Ledger) {
        let stats = ledger.stats();
        info!("==================================================================================");
        info!("============================== STATISTICS BEGIN ==================================");
        info!("==================================================================================");
        info!("succeed run sql(except sql of special actions): \n\n{}\n", stats.succeeded);
        info!("commited sql(except sql of special actions): \n\n{}\n", stats.committed);
        if stats.retired_count > 0 {
            info!("{} sql committed before special actions are kept for rollback", stats.retired_count);
        }
        info!("==================================================================================");
        info!("=============================== STATISTICS END ===================================");
        info!("==================================================================================");
        if let Some(hook) = &self.on_stats {
            hook(&stats);
        }
    }
}

/// Consulta la sonda de la acción (si tiene). `true` = ya aplicada, omitir.
fn already_applied(cursor: &mut QueryCursor<'_>, action: &ActionSpec) -> Result<bool, UpgradeError> {
    let Some(probe) = &action.applied_probe else {
        return Ok(false);
    };
    let applied = cursor.exec_query_int(probe)?.first().copied().unwrap_or(0) > 0;
    if applied {
        info!("action {} already applied, skip: {}", action.name, action.sql);
    }
    Ok(applied)
}
