use log::debug;
use taskgraph::{Context, Result, Task, TaskError, package_file_name, shell};
use topology::{ComponentInfo, Role};

/// Directory the installed binaries of `deploy_dir` are copied to before
/// an upgrade from `version`
pub fn backup_dir(deploy_dir: &str, version: &str) -> String {
    format!("{}.{version}.bak", deploy_dir.trim_end_matches('/'))
}

/// Copy a deploy directory's binaries aside before they are replaced.
///
/// Does nothing when there is no `bin/` to back up; an existing backup
/// for the same version is kept as is.
#[derive(Debug, Clone)]
pub struct BackupComponent {
    component: Role,
    from_version: String,
    host: String,
    deploy_dir: String,
}

impl BackupComponent {
    pub fn new(component: Role, from_version: &str, host: &str, deploy_dir: &str) -> Self {
        Self {
            component,
            from_version: from_version.to_string(),
            host: host.to_string(),
            deploy_dir: deploy_dir.to_string(),
        }
    }
}

impl Task for BackupComponent {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let executor = ctx.executor(&self.host)?;
        let bin = format!("{}/bin", self.deploy_dir);
        let quoted_bin = shell::quote(&bin);

        if !executor.execute(&format!("test -d {quoted_bin}"), false)?.success {
            debug!("{}: nothing installed under {bin}, skipping backup", self.host);
            return Ok(());
        }

        let backup = backup_dir(&self.deploy_dir, &self.from_version);
        let quoted_backup = shell::quote(&backup);
        executor.run_checked(
            &format!(
                "test -d {quoted_backup} || (mkdir -p {quoted_backup} && cp -r {quoted_bin} {})",
                shell::quote(&format!("{backup}/"))
            ),
            false,
        )?;
        debug!("{}: {} {} backed up to {backup}", self.host, self.component, self.from_version);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("backup {}:{} on {}", self.component, self.from_version, self.host)
    }
}

/// Ship a cached package to a host and unpack it into `<deploy_dir>/bin`.
#[derive(Debug, Clone)]
pub struct CopyComponent {
    info: ComponentInfo,
    host: String,
    deploy_dir: String,
}

impl CopyComponent {
    pub fn new(component: Role, to_version: &str, host: &str, deploy_dir: &str) -> Self {
        Self {
            info: ComponentInfo::new(component, to_version),
            host: host.to_string(),
            deploy_dir: deploy_dir.to_string(),
        }
    }
}

impl Task for CopyComponent {
    fn execute(&self, ctx: &Context) -> Result<()> {
        let local = ctx
            .packages()
            .cached(&self.info)
            .ok_or_else(|| TaskError::MissingPackage {
                component: self.info.component.to_string(),
                version: self.info.version.clone(),
            })?;
        let executor = ctx.executor(&self.host)?;

        let bin = format!("{}/bin", self.deploy_dir);
        let remote = format!("{}/{}", self.deploy_dir, package_file_name(&self.info));

        let quoted_bin = shell::quote(&bin);
        let quoted_remote = shell::quote(&remote);

        executor.run_checked(&format!("mkdir -p {quoted_bin}"), false)?;
        executor.transfer(&local, &remote)?;
        executor.run_checked(
            &format!("tar --no-same-owner -zxf {quoted_remote} -C {quoted_bin} && rm {quoted_remote}"),
            false,
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("copy {} to {}:{}", self.info, self.host, self.deploy_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Download;
    use std::sync::Arc;
    use taskgraph::{CommandOutput, MockConnector, MockExecutor, MockSource, PackageCache, Rule};

    fn context(dir: &std::path::Path) -> Context {
        Context::new(
            Arc::new(MockConnector::new()),
            PackageCache::new(dir, Arc::new(MockSource::new())),
        )
    }

    #[test]
    fn test_backup_dir_name() {
        assert_eq!(backup_dir("/data/storage-20160", "v3.0.0"), "/data/storage-20160.v3.0.0.bak");
        assert_eq!(backup_dir("/data/storage-20160/", "v3.0.0"), "/data/storage-20160.v3.0.0.bak");
    }

    #[test]
    fn test_backup_copies_bin() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());

        BackupComponent::new(Role::Storage, "v3.0.0", "h1", "/d/storage")
            .execute(&ctx)
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "test -d /d/storage/bin");
        assert!(calls[1].contains("cp -r /d/storage/bin /d/storage.v3.0.0.bak/"));
    }

    #[test]
    fn test_backup_quotes_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());

        BackupComponent::new(Role::Storage, "v3.0.0", "h1", "/d/my storage")
            .execute(&ctx)
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0], "test -d '/d/my storage/bin'");
        assert_eq!(
            calls[1],
            "test -d '/d/my storage.v3.0.0.bak' || (mkdir -p '/d/my storage.v3.0.0.bak' \
             && cp -r '/d/my storage/bin' '/d/my storage.v3.0.0.bak/')"
        );
    }

    #[test]
    fn test_backup_skips_fresh_host() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let executor = Arc::new(MockExecutor::new(
            "h1",
            vec![Rule::respond("test -d /d/storage/bin", CommandOutput::failed(""))],
        ));
        ctx.insert_executor("h1", executor.clone());

        BackupComponent::new(Role::Storage, "v3.0.0", "h1", "/d/storage")
            .execute(&ctx)
            .unwrap();

        assert_eq!(executor.calls(), vec!["test -d /d/storage/bin"]);
    }

    #[test]
    fn test_copy_requires_download() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.insert_executor("h1", Arc::new(MockExecutor::new("h1", vec![])));

        let err = CopyComponent::new(Role::Storage, "v4.0.0", "h1", "/d/storage")
            .execute(&ctx)
            .unwrap_err();
        assert!(matches!(err, TaskError::MissingPackage { .. }));
    }

    #[test]
    fn test_copy_transfers_and_unpacks() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());

        Download::from(ComponentInfo::new(Role::Storage, "v4.0.0")).execute(&ctx).unwrap();
        CopyComponent::new(Role::Storage, "v4.0.0", "h1", "/d/storage")
            .execute(&ctx)
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0], "mkdir -p /d/storage/bin");
        assert!(calls[1].starts_with("transfer "));
        assert!(calls[1].ends_with("-> /d/storage/storage-v4.0.0-linux-amd64.tar.gz"));
        assert_eq!(
            calls[2],
            "tar --no-same-owner -zxf /d/storage/storage-v4.0.0-linux-amd64.tar.gz -C /d/storage/bin \
             && rm /d/storage/storage-v4.0.0-linux-amd64.tar.gz"
        );
    }

    #[test]
    fn test_copy_quotes_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let executor = Arc::new(MockExecutor::new("h1", vec![]));
        ctx.insert_executor("h1", executor.clone());

        Download::from(ComponentInfo::new(Role::Compute, "v4.0.0")).execute(&ctx).unwrap();
        CopyComponent::new(Role::Compute, "v4.0.0", "h1", "/d/a b")
            .execute(&ctx)
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0], "mkdir -p '/d/a b/bin'");
        assert_eq!(
            calls[2],
            "tar --no-same-owner -zxf '/d/a b/compute-v4.0.0-linux-amd64.tar.gz' -C '/d/a b/bin' \
             && rm '/d/a b/compute-v4.0.0-linux-amd64.tar.gz'"
        );
    }
}
