//! Cluster en memoria para los tests del orquestador.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use upgrade_core::cluster::{SERVER_VERSION_SQL, TENANT_IDS_SQL};
use upgrade_core::{ConnectParams, Connector, Credentials, SpecialAction, SqlSession, TenantId, UpgradeError,
                   UpgradeParams};

#[derive(Debug, Default)]
pub struct ClusterState {
    pub build_version_prefixes: Vec<String>,
    pub tenant_ids: Vec<TenantId>,
    /// Sentencias mutantes en orden, con el estado de autocommit al ejecutarse.
    pub executed: Vec<(String, bool)>,
    pub commits: usize,
    pub autocommit: bool,
    pub autocommit_history: Vec<bool>,
    pub closes: usize,
    pub closed: bool,
    /// `execute` falla si la sentencia contiene este texto.
    pub fail_on: Option<String>,
    /// `commit` número N (1-based) falla.
    pub fail_commit_number: Option<usize>,
    /// `set_autocommit(v)` falla cuando `v` coincide.
    pub fail_autocommit: Option<bool>,
    pub probe_counts: HashMap<String, i64>,
    pub refuse_connect: bool,
}

pub type SharedState = Rc<RefCell<ClusterState>>;

pub fn cluster(prefixes: &[&str], tenant_ids: &[TenantId]) -> SharedState {
    Rc::new(RefCell::new(ClusterState { build_version_prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
                                        tenant_ids: tenant_ids.to_vec(),
                                        ..Default::default() }))
}

pub fn executed_sql(state: &SharedState) -> Vec<String> {
    state.borrow().executed.iter().map(|(sql, _)| sql.clone()).collect()
}

pub struct FakeSession {
    state: SharedState,
}

impl FakeSession {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn ensure_open(&self) -> Result<(), UpgradeError> {
        if self.state.borrow().closed {
            return Err(UpgradeError::Connection("session closed".into()));
        }
        Ok(())
    }
}

impl SqlSession for FakeSession {
    fn execute(&mut self, sql: &str) -> Result<usize, UpgradeError> {
        self.ensure_open()?;
        let mut st = self.state.borrow_mut();
        if st.fail_on.as_deref().is_some_and(|needle| sql.contains(needle)) {
            return Err(UpgradeError::query(sql, "injected failure"));
        }
        let autocommit = st.autocommit;
        st.executed.push((sql.to_string(), autocommit));
        Ok(1)
    }

    fn query_text(&mut self, sql: &str) -> Result<Vec<String>, UpgradeError> {
        self.ensure_open()?;
        if sql == SERVER_VERSION_SQL {
            return Ok(self.state.borrow().build_version_prefixes.clone());
        }
        Err(UpgradeError::query(sql, "unknown text query"))
    }

    fn query_int(&mut self, sql: &str) -> Result<Vec<i64>, UpgradeError> {
        self.ensure_open()?;
        let st = self.state.borrow();
        if sql == TENANT_IDS_SQL {
            return Ok(st.tenant_ids.clone());
        }
        Ok(vec![st.probe_counts.get(sql).copied().unwrap_or(0)])
    }

    fn commit(&mut self) -> Result<(), UpgradeError> {
        self.ensure_open()?;
        let mut st = self.state.borrow_mut();
        if st.fail_commit_number == Some(st.commits + 1) {
            return Err(UpgradeError::query("COMMIT", "injected commit failure"));
        }
        st.commits += 1;
        Ok(())
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), UpgradeError> {
        self.ensure_open()?;
        let mut st = self.state.borrow_mut();
        if st.fail_autocommit == Some(enabled) {
            return Err(UpgradeError::query(&format!("SET autocommit = {}", u8::from(enabled)), "injected failure"));
        }
        st.autocommit = enabled;
        st.autocommit_history.push(enabled);
        Ok(())
    }

    fn close(&mut self) -> Result<(), UpgradeError> {
        let mut st = self.state.borrow_mut();
        st.closes += 1;
        st.closed = true;
        Ok(())
    }
}

pub struct FakeConnector {
    pub state: SharedState,
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    fn connect(&self, _params: &ConnectParams) -> Result<FakeSession, UpgradeError> {
        if self.state.borrow().refuse_connect {
            return Err(UpgradeError::Connection("Access denied for user 'root'".into()));
        }
        Ok(FakeSession::new(self.state.clone()))
    }
}

/// Acción especial que registra cada tenant visitado y ejecuta una sentencia
/// por tenant para poder observar el estado de autocommit.
#[derive(Default, Clone)]
pub struct RecordingSpecial {
    pub tenants: Rc<RefCell<Vec<TenantId>>>,
    pub fail_at: Option<TenantId>,
}

impl SpecialAction for RecordingSpecial {
    fn name(&self) -> &str {
        "recording"
    }

    fn run_for_tenant(&self,
                      session: &mut dyn SqlSession,
                      tenant_id: TenantId,
                      _credentials: &Credentials)
                      -> Result<(), UpgradeError> {
        if self.fail_at == Some(tenant_id) {
            return Err(UpgradeError::query("special", format!("boom at {tenant_id}")));
        }
        session.execute(&format!("update special_flag set done = 1 where tenant_id = {tenant_id}"))?;
        self.tenants.borrow_mut().push(tenant_id);
        Ok(())
    }
}

pub fn connect_params() -> ConnectParams {
    ConnectParams::new("127.0.0.1", 2881, "root", "secret")
}

/// Rutas únicas en el directorio temporal para no pisar otras corridas.
pub fn temp_params() -> UpgradeParams {
    let dir = std::env::temp_dir();
    let id = uuid::Uuid::new_v4();
    UpgradeParams { log_file: dir.join(format!("upgrade_post_{id}.log")),
                    sql_dump_file: dir.join(format!("upgrade_sql_post_{id}.txt")),
                    rollback_sql_file: dir.join(format!("rollback_sql_post_{id}.txt")) }
}

/// Sentencias (no comentarios) del archivo de rollback, en orden.
pub fn rollback_statements(path: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(path).expect("rollback file")
                                 .lines()
                                 .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
                                 .map(String::from)
                                 .collect()
}

pub fn stats_counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

pub fn cleanup(params: &UpgradeParams) {
    let _ = std::fs::remove_file(&params.sql_dump_file);
    let _ = std::fs::remove_file(&params.rollback_sql_file);
}
