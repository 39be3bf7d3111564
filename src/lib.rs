//! upgrade-runner
//!
//! Frontera del binario `upgrade-post`:
//! - `cli`: opciones de línea de comandos.
//! - `config`: rutas de salida desde `.env`/entorno.
//! - `logging`: subscriber a archivo y stdout.
//! - `errors`: `RunError` y códigos de salida.
//!
//! `run` arma el orquestador del core con el catálogo y la acción especial
//! que correspondan y lo ejecuta contra el `Connector` recibido.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;

use log::info;
use upgrade_core::{ActionCatalog, CatalogSpecialAction, Connector, NoopSpecialAction, Orchestrator, SpecialAction,
                   UpgradeParams, UpgradeReport};

use crate::cli::Cli;
use crate::errors::RunError;

pub fn run<C: Connector>(cli: &Cli, params: UpgradeParams, connector: C) -> Result<UpgradeReport, RunError> {
    let connect = cli.connect_params();
    let modules = cli.modules()?;
    info!("parameters from cmd: host=\"{}\", port={}, user=\"{}\", module=\"{}\", log-file=\"{}\"",
          connect.host,
          connect.port,
          connect.user,
          modules,
          params.log_file.display());

    let catalog = match &cli.actions {
        Some(path) => ActionCatalog::load(path)?,
        None => ActionCatalog::default(),
    };
    let special: Box<dyn SpecialAction> = if catalog.special_action.is_empty() {
        Box::new(NoopSpecialAction)
    } else {
        Box::new(CatalogSpecialAction::new(catalog.special_action.clone()))
    };

    let orchestrator = Orchestrator::new(connector, params).with_catalog(catalog).with_special_action(special);
    Ok(orchestrator.run(&connect, &modules)?)
}
