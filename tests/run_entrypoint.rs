use std::cell::Cell;
use std::rc::Rc;

use clap::Parser;
use upgrade_core::{ConnectParams, Connector, SqlSession, UpgradeError, UpgradeParams};
use upgrade_runner::cli::Cli;
use upgrade_runner::errors::{RunError, EXIT_CONNECTION, EXIT_USAGE};

// Connector que sólo cuenta intentos y siempre rechaza la conexión.
struct CountingConnector {
    attempts: Rc<Cell<usize>>,
}

struct NeverSession;

impl SqlSession for NeverSession {
    fn execute(&mut self, _: &str) -> Result<usize, UpgradeError> {
        unreachable!()
    }
    fn query_text(&mut self, _: &str) -> Result<Vec<String>, UpgradeError> {
        unreachable!()
    }
    fn query_int(&mut self, _: &str) -> Result<Vec<i64>, UpgradeError> {
        unreachable!()
    }
    fn commit(&mut self) -> Result<(), UpgradeError> {
        unreachable!()
    }
    fn set_autocommit(&mut self, _: bool) -> Result<(), UpgradeError> {
        unreachable!()
    }
    fn close(&mut self) -> Result<(), UpgradeError> {
        unreachable!()
    }
}

impl Connector for CountingConnector {
    type Session = NeverSession;

    fn connect(&self, _: &ConnectParams) -> Result<NeverSession, UpgradeError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(UpgradeError::Connection("Can't connect to MySQL server".into()))
    }
}

fn temp_params() -> UpgradeParams {
    let dir = std::env::temp_dir();
    let id = uuid::Uuid::new_v4();
    UpgradeParams { log_file: dir.join(format!("upgrade_post_{id}.log")),
                    sql_dump_file: dir.join(format!("upgrade_sql_post_{id}.txt")),
                    rollback_sql_file: dir.join(format!("rollback_sql_post_{id}.txt")) }
}

#[test]
fn invalid_module_is_rejected_before_connecting() {
    let cli = Cli::parse_from(["upgrade-post", "-h", "127.0.0.1", "-P", "2881", "-u", "root", "-m", "normal_ddl,bogus"]);
    let attempts = Rc::new(Cell::new(0));
    let err = upgrade_runner::run(&cli, temp_params(), CountingConnector { attempts: attempts.clone() })
        .expect_err("must fail");
    assert!(matches!(err, RunError::Upgrade(UpgradeError::InvalidModule(ref t)) if t == "bogus"));
    assert_eq!(err.exit_code(), EXIT_USAGE);
    assert_eq!(attempts.get(), 0);
}

#[test]
fn broken_catalog_is_rejected_before_connecting() {
    let catalog = std::env::temp_dir().join(format!("actions_{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&catalog, r#"{ "normal_ddl": [ { "name": "x", "sql": "update t set v = 1" } ] }"#).expect("write catalog");
    let path = catalog.to_string_lossy().to_string();
    let cli = Cli::parse_from(["upgrade-post", "-h", "127.0.0.1", "-P", "2881", "-u", "root", "-a", path.as_str()]);
    let attempts = Rc::new(Cell::new(0));

    let err = upgrade_runner::run(&cli, temp_params(), CountingConnector { attempts: attempts.clone() })
        .expect_err("must fail");
    assert!(matches!(err, RunError::Upgrade(UpgradeError::Catalog(_))));
    assert_eq!(attempts.get(), 0);
    let _ = std::fs::remove_file(&catalog);
}

#[test]
fn connection_failure_maps_to_connection_exit_code() {
    let cli = Cli::parse_from(["upgrade-post", "-h", "127.0.0.1", "-P", "2881", "-u", "root"]);
    let attempts = Rc::new(Cell::new(0));
    let params = temp_params();
    let err = upgrade_runner::run(&cli, params.clone(), CountingConnector { attempts: attempts.clone() })
        .expect_err("must fail");
    assert_eq!(err.exit_code(), EXIT_CONNECTION);
    assert_eq!(attempts.get(), 1);
    // sin sesión abierta no hay archivo de rollback
    assert!(!params.rollback_sql_file.exists());
}
