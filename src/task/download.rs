use log::debug;
use taskgraph::{Context, Result, Task};
use topology::ComponentInfo;

/// Fetch a package into the shared local cache.
///
/// A no-op when the (component, version) key is already cached.
#[derive(Debug, Clone)]
pub struct Download {
    info: ComponentInfo,
}

impl From<ComponentInfo> for Download {
    fn from(info: ComponentInfo) -> Self {
        Self { info }
    }
}

impl Task for Download {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let path = ctx.packages().ensure(&self.info)?;
        debug!("{} ready at {}", self.info, path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("download {}", self.info)
    }
}
