//! Package downloads from an HTTP mirror.

use log::info;
use std::fs;
use std::path::Path;
use taskgraph::{PackageSource, Result, TaskError, package_file_name};
use topology::ComponentInfo;

/// Largest package we are willing to buffer
const MAX_PACKAGE_SIZE: u64 = 1024 * 1024 * 1024;

/// Fetches `<mirror>/<component>-<version>-linux-amd64.tar.gz`.
pub struct MirrorSource {
    agent: ureq::Agent,
    mirror: String,
}

impl MirrorSource {
    pub fn new(mirror: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            mirror: mirror.into(),
        }
    }

    pub fn package_url(&self, info: &ComponentInfo) -> String {
        format!(
            "{}/{}",
            self.mirror.trim_end_matches('/'),
            package_file_name(info)
        )
    }

    fn fetch_error(info: &ComponentInfo, message: String) -> TaskError {
        TaskError::Fetch {
            component: info.component.to_string(),
            version: info.version.clone(),
            message,
        }
    }
}

impl PackageSource for MirrorSource {
    fn fetch(&self, info: &ComponentInfo, dest: &Path) -> Result<()> {
        let url = self.package_url(info);
        info!("Downloading {url}");

        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", "dbfleet")
            .call()
            .map_err(|e| Self::fetch_error(info, e.to_string()))?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_PACKAGE_SIZE)
            .read_to_vec()
            .map_err(|e| Self::fetch_error(info, e.to_string()))?;

        // Write aside and rename so a partial download never looks cached
        let partial = dest.with_file_name(format!("{}.part", package_file_name(info)));
        fs::write(&partial, &bytes).map_err(|e| TaskError::io(&partial, e))?;
        fs::rename(&partial, dest).map_err(|e| TaskError::io(dest, e))?;
        Ok(())
    }
}
