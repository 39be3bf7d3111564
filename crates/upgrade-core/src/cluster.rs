//! Consultas de metadatos del cluster: precondición de versión y descubrimiento
//! de tenants. Ambas son sólo lectura y corren antes de cualquier mutación.

use log::{error, info};

use crate::cursor::QueryCursor;
use crate::errors::UpgradeError;
use crate::TenantId;

/// Prefijo de `build_version` (hasta el primer `_`) distinto por servidor.
pub const SERVER_VERSION_SQL: &str =
    "select distinct(substring_index(build_version, '_', 1)) as value from __all_server";

/// Lectura con consistencia débil (`read_consistency(WEAK)`).
///
/// Puede observar una réplica atrasada. Sólo es correcto bajo el invariante
/// operativo de que no se crean ni se borran tenants durante la corrida; este
/// programa no lo impone, lo debe garantizar el operador.
pub const TENANT_IDS_SQL: &str =
    "select /*+read_consistency(WEAK) */ distinct(tenant_id) as value from __all_tenant";

/// Falla con `VersionMismatch` salvo que exista exactamente un prefijo.
///
/// Ejecutar DDL/DML con binarios mezclados puede crear réplicas de tablas de
/// sistema con mayoría en la versión vieja que luego se recolectan.
pub fn check_server_version(cursor: &mut QueryCursor<'_>) -> Result<String, UpgradeError> {
    let mut prefixes = cursor.exec_query_text(SERVER_VERSION_SQL)?;
    if prefixes.len() != 1 {
        error!("servers build_version not match: {:?}", prefixes);
        return Err(UpgradeError::VersionMismatch { prefixes });
    }
    let prefix = prefixes.remove(0);
    info!("check server version success, build_version prefix: {prefix}");
    Ok(prefix)
}

/// Ids distintos de tenant, en el orden devuelto por el cluster.
///
/// Un resultado vacío no es un error aquí; el orquestador lo convierte en
/// `NoTenant`.
pub fn fetch_tenant_ids(cursor: &mut QueryCursor<'_>) -> Result<Vec<TenantId>, UpgradeError> {
    let mut ids = cursor.exec_query_int(TENANT_IDS_SQL)?;
    // distinct ya lo garantiza el servidor; se conserva el primer orden visto
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    Ok(ids)
}
