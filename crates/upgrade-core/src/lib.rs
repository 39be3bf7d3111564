//! upgrade-core: motor de ejecución del upgrade post-despliegue.
//!
//! Módulos:
//! - `module`: selección validada de módulos (`normal_ddl`, `normal_dml`,
//!   `each_tenant_dml`, `special_action`).
//! - `ledger`: sentencias exitosas/commiteadas y archivo de rollback.
//! - `session`: trait de conexión (`SqlSession`, `Connector`).
//! - `cursor`: ejecución registrada en el ledger.
//! - `cluster`: precondición de versión y descubrimiento de tenants.
//! - `catalog`: listas de acciones cargadas desde JSON.
//! - `special`: runner de la acción especial por tenant.
//! - `orchestrator`: máquina de estados de la corrida.

pub mod catalog;
pub mod cluster;
pub mod cursor;
pub mod errors;
pub mod ledger;
pub mod module;
pub mod orchestrator;
pub mod session;
pub mod special;

/// Identificador de tenant dentro del cluster.
pub type TenantId = i64;

pub use catalog::{ActionCatalog, ActionSpec};
pub use cursor::QueryCursor;
pub use errors::{UpgradeError, UpgradeResult};
pub use ledger::{Ledger, LedgerStats, StatementRecord};
pub use module::{Module, ModuleSet, ALL_MODULE};
pub use orchestrator::{Orchestrator, Phase, UpgradeParams, UpgradeReport};
pub use session::{ConnectParams, Connector, Credentials, SqlSession, DEFAULT_DATABASE};
pub use special::{run_special_upgrade, CatalogSpecialAction, NoopSpecialAction, SpecialAction};
