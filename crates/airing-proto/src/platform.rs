use std::path::PathBuf;

pub const APP_DIR: &str = "airing";

/// Env var carrying the simulated `HHMM` time.
pub const SIMULATED_TIME_ENV: &str = "AIRING_TIME";

pub fn data_dir() -> PathBuf {
    // XDG layout on every unix, macOS included
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        if let Some(dir) = portable_dir("data") {
            return dir;
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    // Portable install: config.toml beside the executable wins.
    if let Some(dir) = exe_dir().filter(|d| d.join("config.toml").exists()) {
        return dir;
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

fn exe_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(|p| p.to_path_buf())
}

#[cfg(windows)]
fn portable_dir(name: &str) -> Option<PathBuf> {
    exe_dir().map(|d| d.join(name)).filter(|p| p.exists())
}
