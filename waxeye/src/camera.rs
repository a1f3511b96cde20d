//! Image capture
//!
//! Thin wrapper around an external camera utility. The configured command is
//! run through the shell with `{output}` replaced by a temporary JPEG path;
//! when no command is configured, a fixed still image is read instead (the
//! development setup, useful on machines without a camera). Either way the
//! result is base64-encoded image bytes for the recognizer.

use std::path::PathBuf;

use base64::{engine::general_purpose, Engine as _};
use tokio::process::Command;
use tracing::debug;
use waxeye_common::{Error, Result};

pub struct Camera {
    command: Option<String>,
    still_image: Option<PathBuf>,
}

impl Camera {
    pub fn new(command: Option<String>, still_image: Option<PathBuf>) -> Self {
        Self {
            command,
            still_image,
        }
    }

    /// Take a photograph and return it as base64-encoded bytes
    pub async fn capture(&self) -> Result<String> {
        let bytes = if let Some(command) = &self.command {
            self.run_capture_command(command).await?
        } else if let Some(path) = &self.still_image {
            debug!("no capture command configured, reading {:?}", path);
            tokio::fs::read(path)
                .await
                .map_err(|e| Error::Camera(format!("failed to read {:?}: {}", path, e)))?
        } else {
            return Err(Error::Camera(
                "no capture command or still image configured".to_string(),
            ));
        };

        Ok(general_purpose::STANDARD.encode(bytes))
    }

    async fn run_capture_command(&self, command: &str) -> Result<Vec<u8>> {
        let output_path = std::env::temp_dir().join(format!("waxeye-capture-{}.jpg", std::process::id()));
        let output_str = output_path.to_string_lossy();

        let line = if command.contains("{output}") {
            command.replace("{output}", &output_str)
        } else {
            format!("{} {}", command, output_str)
        };
        debug!("running capture command: {}", line);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .output()
            .await
            .map_err(|e| Error::Camera(format!("failed to spawn capture command: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Camera(format!(
                "capture command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| Error::Camera(format!("capture produced no image: {}", e)))?;
        let _ = tokio::fs::remove_file(&output_path).await;

        Ok(bytes)
    }
}
