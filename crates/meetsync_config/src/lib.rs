use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
pub mod models;
pub use models::*;

/// Loads the application configuration.
///
/// Sources, in increasing precedence: `config/default`, `config/{RUN_ENV}`,
/// then `MEETSYNC`-prefixed environment variables with `__` as the section
/// separator (e.g. `MEETSYNC_SERVER__PORT=8080`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "MEETSYNC".to_string());

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let workspace_root = manifest_dir
        .ancestors()
        .nth(2) // go from crates/meetsync_config to workspace root
        .unwrap_or_else(|| std::path::Path::new("."))
        .to_path_buf();

    let default_path = workspace_root.join("config/default");
    let env_path = workspace_root.join(format!("config/{}", run_env));

    let builder = Config::builder()
        .add_source(File::with_name(default_path.to_str().unwrap_or("config/default")).required(false))
        .add_source(File::with_name(env_path.to_str().unwrap_or("config/debug")).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(raw_config)
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is loaded once per process. `DOTENV_OVERRIDE` selects an
/// alternate file; otherwise `.env` is used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = std::env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
