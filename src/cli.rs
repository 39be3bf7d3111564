//! Opciones de línea de comandos de `upgrade-post`.
//!
//! `-h` es el host (como en los clientes MySQL), por eso la ayuda va en `-I`.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use upgrade_core::{ConnectParams, ModuleSet, UpgradeError, UpgradeParams, ALL_MODULE};

#[derive(Parser, Debug, Clone)]
#[command(name = "upgrade-post", version, about = "Post-upgrade runner for a multi-tenant cluster")]
#[command(disable_help_flag = true)]
pub struct Cli {
    #[arg(short = 'I', long = "help", action = ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    /// Cluster host
    #[arg(short = 'h', long)]
    pub host: String,

    /// Cluster port
    #[arg(short = 'P', long)]
    pub port: u16,

    /// User
    #[arg(short = 'u', long)]
    pub user: String,

    /// Password
    #[arg(short = 'p', long, default_value = "")]
    pub password: String,

    /// Comma-separated modules: normal_ddl, normal_dml, each_tenant_dml, special_action or all
    #[arg(short = 'm', long, default_value = ALL_MODULE)]
    pub module: String,

    /// Log file (truncated on start)
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// JSON action catalog
    #[arg(short = 'a', long = "actions")]
    pub actions: Option<PathBuf>,
}

impl Cli {
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams::new(self.host.clone(), self.port, self.user.clone(), self.password.clone())
    }

    /// Falla con `InvalidModule` antes de abrir cualquier conexión.
    pub fn modules(&self) -> Result<ModuleSet, UpgradeError> {
        ModuleSet::parse(&self.module)
    }

    /// Parámetros por defecto/entorno con el log file de la CLI aplicado.
    pub fn upgrade_params(&self, mut base: UpgradeParams) -> UpgradeParams {
        if let Some(log_file) = &self.log_file {
            base.log_file = log_file.clone();
        }
        base
    }
}
