//! Free-space measurement for the volume a run reclaims space on.

use std::path::{Path, PathBuf};

use sysinfo::Disks;

use crate::error::VolumeError;

/// Reports available bytes on the volume containing `root`.
pub trait VolumeProbe: Send + Sync {
    fn available_bytes(&self, root: &Path) -> Result<u64, VolumeError>;
}

/// Probe backed by the OS disk list. The list is refreshed on every call so
/// before/after readings are independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeProbe for SystemVolumes {
    fn available_bytes(&self, root: &Path) -> Result<u64, VolumeError> {
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<(String, u64)> = disks
            .list()
            .iter()
            .map(|d| (d.mount_point().to_string_lossy().into_owned(), d.available_space()))
            .collect();
        if mounts.is_empty() {
            return Err(VolumeError::Query("no disks reported".to_string()));
        }
        pick_volume(&mounts, &root.to_string_lossy())
            .ok_or_else(|| VolumeError::NotFound(root.to_path_buf()))
    }
}

/// Available bytes of the mount whose path is the longest prefix of `root`.
pub fn pick_volume(mounts: &[(String, u64)], root: &str) -> Option<u64> {
    let root = normalize(root);
    mounts
        .iter()
        .map(|(mount, avail)| (normalize(mount), *avail))
        .filter(|(mount, _)| covers(mount, &root))
        .max_by_key(|(mount, _)| mount.len())
        .map(|(_, avail)| avail)
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.trim_end_matches('/');
    if cfg!(windows) {
        path.to_lowercase()
    } else {
        path.to_string()
    }
}

fn covers(mount: &str, root: &str) -> bool {
    mount.is_empty() || root == mount || root.starts_with(&format!("{mount}/"))
}

/// The system drive root: `%SystemDrive%\` on Windows, `/` elsewhere.
pub fn default_volume_root() -> PathBuf {
    crate::cleanup::paths::system_drive()
}

/// Space freed between two readings. Growth in used space reads as zero.
pub fn reclaimed(before: u64, after: u64) -> u64 {
    after.saturating_sub(before)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounts() -> Vec<(String, u64)> {
        vec![
            ("/".to_string(), 100),
            ("/home".to_string(), 200),
            ("/home/shared".to_string(), 300),
            ("/homework".to_string(), 400),
        ]
    }

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(pick_volume(&mounts(), "/home/user"), Some(200));
        assert_eq!(pick_volume(&mounts(), "/home/shared/x"), Some(300));
        assert_eq!(pick_volume(&mounts(), "/var/tmp"), Some(100));
        assert_eq!(pick_volume(&mounts(), "/homework"), Some(400));
    }

    #[test]
    fn test_drive_letter_mounts() {
        let mounts = vec![("C:\\".to_string(), 10), ("D:\\".to_string(), 20)];
        assert_eq!(pick_volume(&mounts, "C:\\"), Some(10));
        assert_eq!(pick_volume(&mounts, "D:\\Games"), Some(20));
        assert_eq!(pick_volume(&mounts, "E:\\"), None);
    }

    #[test]
    fn test_reclaimed_clamps_to_zero() {
        assert_eq!(reclaimed(10_000_000_000, 9_999_999_000), 0);
        assert_eq!(reclaimed(10_000_000_000, 10_050_000_000), 50_000_000);
        assert_eq!(reclaimed(5, 5), 0);
    }
}
