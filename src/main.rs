use clap::Parser;
use log::{error, info};
use upgrade_persistence::MysqlConnector;
use upgrade_runner::cli::Cli;
use upgrade_runner::config::upgrade_params_from_env;
use upgrade_runner::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    let params = cli.upgrade_params(upgrade_params_from_env());
    // el logging se configura después de parsear para no truncar el log con --help
    if let Err(e) = init_logging(&params.log_file) {
        eprintln!("[upgrade-post] {e}");
        std::process::exit(e.exit_code());
    }

    match upgrade_runner::run(&cli, params, MysqlConnector) {
        Ok(report) => {
            info!("upgrade-post succeeded: tenants={:?} committed={} special_tenants={:?}",
                  report.tenant_ids,
                  report.committed.len(),
                  report.special_tenants);
        }
        Err(e) => {
            error!("upgrade-post failed: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
