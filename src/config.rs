//! Configuración de archivos de salida.
//! Carga variables de entorno (.env) una sola vez y construye `UpgradeParams`
//! a partir de los valores por defecto del core.
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

use upgrade_core::UpgradeParams;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

pub const LOG_FILE_ENV: &str = "UPGRADE_POST_LOG_FILE";
pub const SQL_FILE_ENV: &str = "UPGRADE_POST_SQL_FILE";
pub const ROLLBACK_FILE_ENV: &str = "UPGRADE_POST_ROLLBACK_FILE";

/// `UpgradeParams` por defecto, con cada ruta sobreescribible por entorno.
pub fn upgrade_params_from_env() -> UpgradeParams {
    Lazy::force(&DOTENV_LOADED);
    let defaults = UpgradeParams::default();
    UpgradeParams { log_file: env_path(LOG_FILE_ENV).unwrap_or(defaults.log_file),
                    sql_dump_file: env_path(SQL_FILE_ENV).unwrap_or(defaults.sql_dump_file),
                    rollback_sql_file: env_path(ROLLBACK_FILE_ENV).unwrap_or(defaults.rollback_sql_file) }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}
