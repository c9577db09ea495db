use dupsweep::config::{Config, ConfigError};
use dupsweep::scanner::HashAlgorithm;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

// Tests touching DUPSWEEP_* variables must not interleave.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 4] = [
    "DUPSWEEP_LANES",
    "DUPSWEEP_ALGORITHM",
    "DUPSWEEP_VERIFY",
    "DUPSWEEP_PROGRESS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    std::env::set_var("DUPSWEEP_LANES", "16");
    std::env::set_var("DUPSWEEP_ALGORITHM", "blake3");
    std::env::set_var("DUPSWEEP_VERIFY", "true");

    let config: Config = Config::figment(None).extract().unwrap();
    clear_env();

    assert_eq!(config.lanes, Some(16));
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert!(config.verify);
    assert!(config.progress);
}

#[test]
fn test_config_load_from_toml() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "lanes = 3\nalgorithm = \"blake3\"\nprogress = false\n",
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.lanes, Some(3));
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert!(!config.verify);
    assert!(!config.progress);
    assert_eq!(config.scan_config().lanes, 3);
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "lanes = 3\n").unwrap();
    std::env::set_var("DUPSWEEP_LANES", "5");

    let config = Config::load(Some(&config_path));
    clear_env();

    assert_eq!(config.unwrap().lanes, Some(5));
}

#[test]
fn test_config_invalid_value_is_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algorithm = \"md5\"\n").unwrap();

    let err = Config::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_malformed_toml_is_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "lanes = = 4").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_zero_lanes_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "lanes = 0\n").unwrap();

    let err = Config::load(Some(&config_path)).unwrap_err();
    assert!(err.to_string().contains("lanes"));
}

#[test]
fn test_rendered_toml_loads_back() {
    let config = Config {
        lanes: Some(7),
        algorithm: HashAlgorithm::Blake3,
        verify: true,
        progress: false,
    };
    let rendered = config.to_toml().unwrap();

    let reloaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(&rendered))
        .extract()
        .unwrap();

    assert_eq!(reloaded, config);
}
