//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Application name used in CLI output and log messages.
pub const APP_NAME: &str = "appforge";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "appforge";

/// File name of the image-stream catalog inside the data directory.
pub const STREAM_CATALOG_FILE: &str = "streams.json";

/// File name of the registry index snapshot inside the data directory.
pub const REGISTRY_CATALOG_FILE: &str = "registry.json";

/// File name of the local-image catalog inside the data directory.
pub const LOCAL_CATALOG_FILE: &str = "images.json";

/// Default base directory for appforge data on Linux with root access.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/appforge";

/// Returns the data directory, preferring `$HOME/.appforge` for non-root
/// or non-Linux environments, falling back to `/var/lib/appforge`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".appforge");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default image-stream catalog path.
pub fn default_stream_catalog() -> PathBuf {
    data_dir().join(STREAM_CATALOG_FILE)
}

/// Returns the default registry index snapshot path.
pub fn default_registry_catalog() -> PathBuf {
    data_dir().join(REGISTRY_CATALOG_FILE)
}

/// Returns the default local-image catalog path.
pub fn default_local_catalog() -> PathBuf {
    data_dir().join(LOCAL_CATALOG_FILE)
}
