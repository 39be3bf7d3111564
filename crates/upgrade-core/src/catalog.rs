//! Catálogo de acciones de upgrade.
//!
//! Las listas de sentencias son datos: se cargan desde un JSON con secciones
//! `normal_ddl`, `normal_dml`, `each_tenant_dml` y `special_action`. En las dos
//! últimas `{tenant_id}` se sustituye por el id de cada tenant.
//!
//! ```json
//! {
//!   "normal_ddl": [
//!     { "name": "add_col", "sql": "alter table t add column c int",
//!       "rollback_sql": "alter table t drop column c",
//!       "applied_probe": "select count(*) as value from information_schema.columns where table_name = 't' and column_name = 'c'" }
//!   ]
//! }
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::cursor::{check_is_ddl_sql, check_is_dml_sql};
use crate::errors::UpgradeError;
use crate::module::Module;
use crate::TenantId;

pub const TENANT_ID_PLACEHOLDER: &str = "{tenant_id}";

/// Una acción: sentencia, su inversa y una sonda opcional de idempotencia.
///
/// `applied_probe` es una consulta `count(*) as value`; si devuelve un valor
/// mayor que cero la acción se considera ya aplicada y se omite, lo que hace
/// segura la re-ejecución tras un fallo parcial.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub name: String,
    pub sql: String,
    #[serde(default)]
    pub rollback_sql: String,
    #[serde(default)]
    pub applied_probe: Option<String>,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, sql: impl Into<String>, rollback_sql: impl Into<String>) -> Self {
        Self { name: name.into(),
               sql: sql.into(),
               rollback_sql: rollback_sql.into(),
               applied_probe: None }
    }

    pub fn with_probe(mut self, probe: impl Into<String>) -> Self {
        self.applied_probe = Some(probe.into());
        self
    }

    /// Copia con `{tenant_id}` sustituido en sentencia, rollback y sonda.
    pub fn render(&self, tenant_id: TenantId) -> ActionSpec {
        let id = tenant_id.to_string();
        ActionSpec { name: self.name.clone(),
                     sql: self.sql.replace(TENANT_ID_PLACEHOLDER, &id),
                     rollback_sql: self.rollback_sql.replace(TENANT_ID_PLACEHOLDER, &id),
                     applied_probe: self.applied_probe.as_ref().map(|p| p.replace(TENANT_ID_PLACEHOLDER, &id)) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionCatalog {
    #[serde(default)]
    pub normal_ddl: Vec<ActionSpec>,
    #[serde(default)]
    pub normal_dml: Vec<ActionSpec>,
    #[serde(default)]
    pub each_tenant_dml: Vec<ActionSpec>,
    #[serde(default)]
    pub special_action: Vec<ActionSpec>,
}

impl ActionCatalog {
    pub fn from_json_str(raw: &str) -> Result<Self, UpgradeError> {
        let catalog: ActionCatalog = serde_json::from_str(raw).map_err(|e| UpgradeError::Catalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, UpgradeError> {
        let raw = fs::read_to_string(path).map_err(|e| UpgradeError::io(path, e))?;
        let catalog = Self::from_json_str(&raw)?;
        info!("loaded action catalog from {}: ddl={} dml={} each_tenant_dml={} special={}",
              path.display(),
              catalog.normal_ddl.len(),
              catalog.normal_dml.len(),
              catalog.each_tenant_dml.len(),
              catalog.special_action.len());
        Ok(catalog)
    }

    pub fn actions(&self, module: Module) -> &[ActionSpec] {
        match module {
            Module::NormalDdl => &self.normal_ddl,
            Module::NormalDml => &self.normal_dml,
            Module::EachTenantDml => &self.each_tenant_dml,
            Module::SpecialAction => &self.special_action,
        }
    }

    /// Verifica el tipo de sentencia de cada sección antes de conectar.
    pub fn validate(&self) -> Result<(), UpgradeError> {
        for module in Module::ALL {
            for action in self.actions(module) {
                if action.name.trim().is_empty() || action.sql.trim().is_empty() {
                    return Err(UpgradeError::Catalog(format!("{module}: action with empty name or sql")));
                }
                let checked = match module {
                    Module::NormalDdl => check_is_ddl_sql(&action.sql),
                    Module::NormalDml | Module::EachTenantDml => check_is_dml_sql(&action.sql),
                    Module::SpecialAction => Ok(()),
                };
                checked.map_err(|e| UpgradeError::Catalog(format!("{module}/{}: {e}", action.name)))?;
            }
        }
        Ok(())
    }

    /// Texto del archivo de volcado de SQL: referencia para intervención manual.
    pub fn sql_plan(&self, tenant_ids: &[TenantId]) -> String {
        let mut out = String::new();
        out.push_str("# steps executed by upgrade-post\n");
        out.push_str("# for reference only, when the script fails and manual intervention is needed\n");
        out.push_str("\n\n");
        out.push_str("# normal ddl\n");
        push_statements(&mut out, self.normal_ddl.iter().map(|a| a.sql.clone()));
        out.push_str("\n\n");
        out.push_str("# normal dml\n");
        push_statements(&mut out, self.normal_dml.iter().map(|a| a.sql.clone()));
        out.push_str("\n\n");
        out.push_str("# each tenant dml\n");
        push_statements(&mut out,
                        tenant_ids.iter()
                                  .flat_map(|t| self.each_tenant_dml.iter().map(move |a| a.render(*t).sql)));
        out.push_str("\n\n");
        out.push_str("# do special upgrade actions\n");
        out.push_str("# please run ./upgrade-post -h [host] -P [port] -u [user] -p [password] -m special_action\n");
        out.push_str("\n\n");
        out
    }

    pub fn dump_sql_plan(&self, path: &Path, tenant_ids: &[TenantId]) -> Result<(), UpgradeError> {
        fs::write(path, self.sql_plan(tenant_ids)).map_err(|e| UpgradeError::io(path, e))?;
        info!("succeed to dump sql to {}", path.display());
        Ok(())
    }
}

fn push_statements(out: &mut String, sqls: impl Iterator<Item = String>) {
    for sql in sqls {
        let _ = writeln!(out, "{};", sql.trim_end_matches(';'));
    }
}
