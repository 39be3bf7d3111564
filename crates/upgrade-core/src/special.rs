//! Acción especial: paso procedural por tenant que corre fuera del ledger.
//!
//! La sesión llega en autocommit: cada sentencia se confirma por separado, de
//! modo que un fallo a mitad de camino deja durables los cambios de los
//! tenants anteriores. Por eso el error reporta qué tenants completaron.
//! La contabilidad propia (si existe) es responsabilidad de la acción; el
//! ledger compartido no la registra.

use log::{error, info};

use crate::catalog::ActionSpec;
use crate::errors::UpgradeError;
use crate::session::{Credentials, SqlSession};
use crate::TenantId;

/// Procedimiento de upgrade escrito por el autor de cada versión.
pub trait SpecialAction {
    fn name(&self) -> &str;

    /// Ejecuta el procedimiento para un tenant. La sesión está en autocommit.
    fn run_for_tenant(&self,
                      session: &mut dyn SqlSession,
                      tenant_id: TenantId,
                      credentials: &Credentials)
                      -> Result<(), UpgradeError>;
}

/// Corre `action` una vez por tenant, en el orden de descubrimiento.
///
/// Devuelve los tenants procesados. Ante el primer fallo se detiene y
/// devuelve `SpecialAction { tenant_id, completed, .. }`.
pub fn run_special_upgrade(session: &mut dyn SqlSession,
                           tenant_ids: &[TenantId],
                           credentials: &Credentials,
                           action: &dyn SpecialAction)
                           -> Result<Vec<TenantId>, UpgradeError> {
    let mut completed = Vec::with_capacity(tenant_ids.len());
    for &tenant_id in tenant_ids {
        info!("special action {}: begin tenant {}", action.name(), tenant_id);
        if let Err(e) = action.run_for_tenant(session, tenant_id, credentials) {
            error!("special action {}: failed at tenant {}, already committed tenants: {:?}, err: {}",
                   action.name(),
                   tenant_id,
                   completed,
                   e);
            return Err(UpgradeError::SpecialAction { tenant_id, completed, source: Box::new(e) });
        }
        info!("special action {}: end tenant {}", action.name(), tenant_id);
        completed.push(tenant_id);
    }
    Ok(completed)
}

/// Acción especial sin trabajo (la versión no trae procedimiento propio).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpecialAction;

impl SpecialAction for NoopSpecialAction {
    fn name(&self) -> &str {
        "noop"
    }

    fn run_for_tenant(&self, _: &mut dyn SqlSession, tenant_id: TenantId, _: &Credentials) -> Result<(), UpgradeError> {
        info!("no special upgrade action for tenant {tenant_id}");
        Ok(())
    }
}

/// Acción especial definida por la sección `special_action` del catálogo.
///
/// Cada sentencia se ejecuta directamente sobre la sesión (sin cursor ni
/// ledger). Las que tengan sonda con resultado > 0 se omiten.
#[derive(Debug, Clone)]
pub struct CatalogSpecialAction {
    statements: Vec<ActionSpec>,
}

impl CatalogSpecialAction {
    pub fn new(statements: Vec<ActionSpec>) -> Self {
        Self { statements }
    }
}

impl SpecialAction for CatalogSpecialAction {
    fn name(&self) -> &str {
        "catalog"
    }

    fn run_for_tenant(&self,
                      session: &mut dyn SqlSession,
                      tenant_id: TenantId,
                      _credentials: &Credentials)
                      -> Result<(), UpgradeError> {
        for spec in self.statements.iter().map(|s| s.render(tenant_id)) {
            if let Some(probe) = &spec.applied_probe {
                let applied = session.query_int(probe)?.first().copied().unwrap_or(0) > 0;
                if applied {
                    info!("special statement {} already applied on tenant {}, skip", spec.name, tenant_id);
                    continue;
                }
            }
            let rowcount = session.execute(&spec.sql)?;
            info!("succeed to execute special sql: {}, rowcount = {}", spec.sql, rowcount);
        }
        Ok(())
    }
}
