use crate::config::{ensure_parent_exists, Config};

use anyhow::Result;
use log::LevelFilter;
use simplelog::{format_description, Config as LogConfig, ConfigBuilder};

#[cfg(debug_assertions)]
pub fn setup_logger() -> Result<()> {
    let config = build_config();
    let path = Config::local_path("debug.log")?;
    ensure_parent_exists(&path)?;
    let file = std::fs::File::create(path)?;
    simplelog::WriteLogger::init(LevelFilter::Debug, config, file)?;
    Ok(())
}

#[cfg(not(debug_assertions))]
pub fn setup_logger() -> Result<()> {
    let config = build_config();
    let path = Config::local_path("mcpdash.log")?;
    ensure_parent_exists(&path)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    simplelog::WriteLogger::init(LevelFilter::Info, config, file)?;
    Ok(())
}

fn build_config() -> LogConfig {
    let log_filter = match std::env::var(crate::utils::get_env_name("log_filter")) {
        Ok(v) => v,
        Err(_) => "mcpdash".into(),
    };
    ConfigBuilder::new()
        .add_filter_allow(log_filter)
        .set_time_format_custom(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .set_thread_level(LevelFilter::Off)
        .build()
}
