//! Logging de la corrida: misma línea a archivo (truncado) y a stdout, nivel
//! INFO en adelante. Los crates de librería loguean con `log`; el puente
//! `tracing-log` del subscriber reenvía esos registros.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::errors::RunError;

pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn init_logging(log_file: &Path) -> Result<(), RunError> {
    let file = File::create(log_file).map_err(|e| RunError::Logging(format!("{}: {e}", log_file.display())))?;

    let stdout_layer = fmt::layer().with_writer(std::io::stdout)
                                   .with_ansi(false)
                                   .with_target(false)
                                   .with_file(true)
                                   .with_line_number(true)
                                   .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()));
    let file_layer = fmt::layer().with_writer(Mutex::new(file))
                                 .with_ansi(false)
                                 .with_target(false)
                                 .with_file(true)
                                 .with_line_number(true)
                                 .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()));

    tracing_subscriber::registry().with(stdout_layer)
                                  .with(file_layer)
                                  .with(LevelFilter::INFO)
                                  .try_init()
                                  .map_err(|e| RunError::Logging(e.to_string()))
}
