//! Browser profile cleanup. History, form data, caches and site storage are
//! removed; cookie and login databases are left alone.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::fs::{try_delete_dir, try_delete_file};
use super::paths::KnownFolders;

const CHROMIUM_FILES: &[&[&str]] = &[
    &["History"],
    &["History-journal"],
    &["History Provider Cache"],
    &["Web Data"],
    &["Web Data-journal"],
    &["Download Service", "downloads.json"],
];

const CHROMIUM_DIRS: &[&[&str]] = &[
    &["Cache"],
    &["Code Cache"],
    &["GPUCache"],
    &["Media Cache"],
    &["Service Worker", "CacheStorage"],
    &["Service Worker", "ScriptCache"],
    &["Local Storage"],
    &["Session Storage"],
    &["Crash Reports"],
    &["Crashpad"],
];

const FIREFOX_FILES: &[&str] = &[
    "downloads.sqlite",
    "downloads.json",
    "formhistory.sqlite",
    "webappsstore.sqlite",
    "places.sqlite",
    "places.sqlite-shm",
    "places.sqlite-wal",
];

const FIREFOX_DIRS: &[&[&str]] = &[
    &["cache2"],
    &["storage", "default"],
    &["extension-data"],
    &["crashes"],
    &["minidumps"],
];

/// User-data roots of Chromium-family browsers.
pub fn chromium_roots(folders: &KnownFolders) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = [
        folders.local(&["Google", "Chrome", "User Data"]),
        folders.local(&["Microsoft", "Edge", "User Data"]),
        folders.local(&["BraveSoftware", "Brave-Browser", "User Data"]),
        folders.local(&["Vivaldi", "User Data"]),
        folders.roaming(&["Opera Software", "Opera Stable"]),
        folders.roaming(&["Opera Software", "Opera GX Stable"]),
        folders.local(&["Opera Software", "Opera Stable"]),
        folders.local(&["Opera Software", "Opera GX Stable"]),
        folders.local(&["Arc", "User Data"]),
    ]
    .into_iter()
    .flatten()
    .collect();

    // Store-packaged Arc keeps its data under the package's LocalCache.
    if let Some(packages) = folders.local(&["Packages"]) {
        if let Ok(entries) = std::fs::read_dir(&packages) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with("TheBrowserCompany.Arc") {
                    roots.push(
                        entry
                            .path()
                            .join("LocalCache")
                            .join("Local")
                            .join("Arc")
                            .join("User Data"),
                    );
                }
            }
        }
    }
    roots
}

/// Profile directories of Firefox-family browsers.
pub fn firefox_profile_roots(folders: &KnownFolders) -> Vec<PathBuf> {
    [
        folders.roaming(&["Mozilla", "Firefox", "Profiles"]),
        folders.roaming(&["Waterfox", "Profiles"]),
        folders.roaming(&["Pale Moon", "Profiles"]),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn is_profile_dir_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("Default")
        || name.eq_ignore_ascii_case("Guest Profile")
        || name.eq_ignore_ascii_case("System Profile")
        || name
            .get(..8)
            .is_some_and(|p| p.eq_ignore_ascii_case("Profile "))
}

fn looks_like_profile(path: &Path) -> bool {
    path.join("History").is_file()
        || path.join("Web Data").is_file()
        || path.join("Local Storage").is_dir()
        || path.join("Session Storage").is_dir()
        || path.join("Extensions").is_dir()
}

/// Clean every profile under a Chromium user-data root. Returns the number of
/// paths removed.
pub fn clean_chromium_root(root: &Path, cancel: &CancellationToken) -> usize {
    if !root.is_dir() {
        return 0;
    }
    let mut profiles: Vec<PathBuf> = std::fs::read_dir(root)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .filter(|e| is_profile_dir_name(&e.file_name().to_string_lossy()))
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default();

    // Opera and some Arc installs keep the profile directly in the root.
    if profiles.is_empty() || looks_like_profile(root) {
        profiles.push(root.to_path_buf());
    }

    let mut removed = 0;
    for profile in &profiles {
        if cancel.is_cancelled() {
            return removed;
        }
        removed += clean_chromium_profile(profile, cancel);
    }
    removed += usize::from(try_delete_dir(&root.join("Crash Reports")));
    removed += usize::from(try_delete_dir(&root.join("Crashpad")));
    removed
}

pub fn clean_chromium_profile(profile: &Path, cancel: &CancellationToken) -> usize {
    let mut removed = 0;
    for parts in CHROMIUM_FILES {
        removed += usize::from(try_delete_file(&join(profile, parts)));
    }
    for parts in CHROMIUM_DIRS {
        if cancel.is_cancelled() {
            return removed;
        }
        removed += usize::from(try_delete_dir(&join(profile, parts)));
    }

    let extensions = profile.join("Extensions");
    for ext in subdirs(&extensions) {
        if cancel.is_cancelled() {
            break;
        }
        for version in subdirs(&ext) {
            removed += usize::from(try_delete_dir(&version.join("Cache")));
            removed += usize::from(try_delete_file(
                &version.join("_metadata").join("verified_contents.json"),
            ));
        }
    }
    removed
}

/// Clean every profile directory under a Firefox `Profiles` root.
pub fn clean_firefox_profiles(profiles_root: &Path, cancel: &CancellationToken) -> usize {
    let mut removed = 0;
    for profile in subdirs(profiles_root) {
        if cancel.is_cancelled() {
            break;
        }
        for name in FIREFOX_FILES {
            removed += usize::from(try_delete_file(&profile.join(name)));
        }
        for parts in FIREFOX_DIRS {
            removed += usize::from(try_delete_dir(&join(&profile, parts)));
        }
    }
    removed
}

fn join(base: &Path, parts: &[&str]) -> PathBuf {
    super::paths::join(base, parts)
}

fn subdirs(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_chromium_profiles_keep_cookies() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("User Data");
        let default = root.join("Default");
        let second = root.join("Profile 2");
        touch(&default.join("History"));
        touch(&default.join("Cookies"));
        touch(&default.join("Login Data"));
        touch(&default.join("Cache").join("data_0"));
        touch(&second.join("Web Data"));
        touch(&root.join("Crashpad").join("report.dmp"));
        touch(&root.join("Local State"));

        let removed = clean_chromium_root(&root, &CancellationToken::new());

        assert_eq!(removed, 4);
        assert!(!default.join("History").exists());
        assert!(!default.join("Cache").exists());
        assert!(default.join("Cookies").exists());
        assert!(default.join("Login Data").exists());
        assert!(!second.join("Web Data").exists());
        assert!(root.join("Local State").exists());
    }

    #[test]
    fn test_chromium_root_as_profile() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Opera Stable");
        touch(&root.join("History"));
        touch(&root.join("Session Storage").join("000003.log"));

        assert_eq!(clean_chromium_root(&root, &CancellationToken::new()), 2);
        assert!(!root.join("Session Storage").exists());
    }

    #[test]
    fn test_extension_caches() {
        let tmp = tempfile::tempdir().unwrap();
        let version = tmp.path().join("Extensions").join("abc").join("1.0");
        touch(&version.join("Cache").join("x"));
        touch(&version.join("_metadata").join("verified_contents.json"));
        touch(&version.join("manifest.json"));

        assert_eq!(clean_chromium_profile(tmp.path(), &CancellationToken::new()), 2);
        assert!(version.join("manifest.json").exists());
    }

    #[test]
    fn test_firefox_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = tmp.path().join("abcd.default-release");
        touch(&profile.join("places.sqlite"));
        touch(&profile.join("formhistory.sqlite"));
        touch(&profile.join("cookies.sqlite"));
        touch(&profile.join("cache2").join("entries").join("x"));

        assert_eq!(clean_firefox_profiles(tmp.path(), &CancellationToken::new()), 3);
        assert!(profile.join("cookies.sqlite").exists());
    }

    #[test]
    fn test_profile_dir_names() {
        assert!(is_profile_dir_name("Default"));
        assert!(is_profile_dir_name("profile 12"));
        assert!(!is_profile_dir_name("ShaderCache"));
        assert!(!is_profile_dir_name("Profile"));
    }

    #[test]
    fn test_cancelled_cleanup_keeps_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("User Data");
        touch(&root.join("Default").join("History"));
        touch(&root.join("Profile 1").join("History"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(clean_chromium_root(&root, &cancel), 0);
        assert!(root.join("Default").join("History").exists());
        assert!(root.join("Profile 1").join("History").exists());
    }
}
