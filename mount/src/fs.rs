use crate::MountSpec;
use crate::error::MountError;
use nix::mount::mount;
use std::path::Path;

/// Mount a filesystem described by `spec` at `target`.
///
/// The target directory is created first if the root filesystem lacks it.
pub fn mount_fs(spec: &MountSpec, target: &Path) -> Result<(), MountError> {
    std::fs::create_dir_all(target)?;

    tracing::debug!(
        "Mounting {} at {:?} with flags {:?}",
        spec.fs_type,
        target,
        spec.flags
    );

    mount(
        Some(spec.source.as_str()),
        target,
        Some(spec.fs_type.as_str()),
        spec.flags,
        None::<&str>,
    )
    .map_err(|source| MountError::MountFailed {
        fs_type: spec.fs_type.clone(),
        target: target.to_path_buf(),
        source,
    })?;

    tracing::info!("Mounted {} at {:?}", spec.fs_type, target);
    Ok(())
}

/// Create `link` as a symlink to `original`.
///
/// Fails with an already-exists error when `link` is taken; see
/// [`MountError::is_already_exists`].
pub fn link_alias(original: &Path, link: &Path) -> Result<(), MountError> {
    std::os::unix::fs::symlink(original, link).map_err(|source| MountError::LinkFailed {
        original: original.to_path_buf(),
        link: link.to_path_buf(),
        source,
    })?;

    tracing::debug!("Linked {:?} -> {:?}", link, original);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::mount::MsFlags;
    use tempfile::TempDir;

    #[test]
    fn test_proc_spec() {
        let spec = MountSpec::proc();

        assert_eq!(spec.fs_type, "proc");
        assert_eq!(spec.source, "proc");
        assert_eq!(
            spec.flags,
            MsFlags::MS_NODEV | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC | MsFlags::MS_RELATIME
        );
        assert!(!spec.flags.contains(MsFlags::MS_RDONLY));
    }

    #[test]
    fn test_link_alias() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("fd");

        link_alias(Path::new("/proc/self/fd"), &link).unwrap();

        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            Path::new("/proc/self/fd")
        );
    }

    #[test]
    fn test_link_alias_twice_reports_already_exists() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("fd");

        link_alias(Path::new("/proc/self/fd"), &link).unwrap();
        let err = link_alias(Path::new("/proc/self/fd"), &link).unwrap_err();

        assert!(err.is_already_exists());
    }

    #[test]
    fn test_mount_failure_keeps_errno() {
        let temp_dir = TempDir::new().unwrap();
        let spec = MountSpec::new("no-such-fs", "none", MsFlags::empty());

        let err = mount_fs(&spec, temp_dir.path()).unwrap_err();

        assert!(matches!(err, MountError::MountFailed { ref fs_type, .. } if fs_type == "no-such-fs"));
        assert!(!err.is_already_exists());
    }
}
