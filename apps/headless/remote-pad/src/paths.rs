use crate::error::RemotePadError;

use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "remote-pad";

const LOG_DIR_NAME: &str = "logs";

/// `{platform config dir}/remote-pad`, home of `remote-pad.json`.
pub fn config_dir() -> Result<PathBuf, RemotePadError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| RemotePadError::remote_pad("Failed to get config directory"))
}

/// `{platform local data dir}/remote-pad/logs`.
pub fn log_dir() -> Result<PathBuf, RemotePadError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(LOG_DIR_NAME))
        .ok_or_else(|| RemotePadError::remote_pad("Failed to get log directory"))
}
