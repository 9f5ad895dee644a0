//! One async body per catalogue task. Each resolves its locations at call
//! time, does its work on the blocking pool or through external tools, and
//! reports only failures that stopped it early.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CleanupError;

use super::browser;
use super::fs;
use super::paths::KnownFolders;
use super::recycle;
use super::registry::{self, RegKey, RegValue};
use super::shortcuts;
use super::tool::{parse_cmdkey_targets, run_tool, tool_output, with_service_stopped};
use super::{blocking, expand_env_vars, extract_executable_path, is_missing_file};

const EXPLORER: &str = r"Software\Microsoft\Windows\CurrentVersion\Explorer";
const RUN_KEYS: &[&str] = &[
    r"Software\Microsoft\Windows\CurrentVersion\Run",
    r"Software\Microsoft\Windows\CurrentVersion\RunOnce",
];
const UNINSTALL_KEYS: &[&str] = &[
    r"Software\Microsoft\Windows\CurrentVersion\Uninstall",
    r"Software\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];
const MRU_KEYS: &[&str] = &[
    r"ComDlg32\LastVisitedPidlMRU",
    r"ComDlg32\OpenSavePidlMRU",
    "RecentDocs",
    "RunMRU",
    "Map Network Drive MRU",
];

/// Empty a set of directories on the blocking pool.
async fn clear_dirs(targets: Vec<Option<PathBuf>>) -> Result<(), CleanupError> {
    let removed =
        blocking(move |cancel| fs::delete_targets(targets.into_iter().flatten(), cancel)).await?;
    tracing::trace!(removed, "directories cleared");
    Ok(())
}

async fn clear_value_lists(keys: &[RegKey], keep: &[&str]) -> Result<(), CleanupError> {
    for key in keys {
        if let Err(e) = registry::clear_values(key, keep).await {
            tracing::debug!(key = %key.full_path(), error = %e, "value clear failed");
        }
    }
    Ok(())
}

fn explorer(sub: &str) -> RegKey {
    RegKey::hkcu(format!(r"{EXPLORER}\{sub}"))
}

fn windir(folders: &KnownFolders) -> Result<PathBuf, CleanupError> {
    folders
        .system_root
        .clone()
        .ok_or(CleanupError::MissingLocation("SystemRoot"))
}

/// The part of `path` directly below `base`, compared case-insensitively.
fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    let head = path.get(..base.len())?;
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    path[base.len()..].strip_prefix('\\')
}

// Quick cleanup

pub async fn remove_junk_files() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![Some(folders.temp.clone()), folders.local(&["Temp"])]).await
}

pub async fn clean_system_temp() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![
        folders.local(&["Microsoft", "Windows", "INetCache"]),
        folders.windows(&["Temp"]),
        folders.windows(&["Prefetch"]),
        folders.windows(&["SoftwareDistribution", "Download"]),
        folders.windows(&["Downloaded Program Files"]),
        folders.common(&["Microsoft", "Windows", "DeliveryOptimization", "Cache"]),
    ])
    .await
}

pub async fn empty_recycle_bin() -> Result<(), CleanupError> {
    let drive = KnownFolders::detect().system_drive;
    blocking(move |_| recycle::empty_recycle_bin(&drive)).await?
}

pub async fn wipe_browser_data() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    let removed = blocking(move |cancel| {
        let chromium: usize = browser::chromium_roots(&folders)
            .iter()
            .map(|root| browser::clean_chromium_root(root, cancel))
            .sum();
        let firefox: usize = browser::firefox_profile_roots(&folders)
            .iter()
            .map(|root| browser::clean_firefox_profiles(root, cancel))
            .sum();
        chromium + firefox
    })
    .await?;
    tracing::debug!(removed, "browser data wiped");
    Ok(())
}

pub async fn clear_file_history() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![
        folders.roaming(&["Microsoft", "Windows", "Recent"]),
        folders.roaming(&["Microsoft", "Windows", "Recent", "AutomaticDestinations"]),
        folders.roaming(&["Microsoft", "Windows", "Recent", "CustomDestinations"]),
    ])
    .await?;
    clear_value_lists(&[explorer("RunMRU")], &["MRUList"]).await
}

// Privacy

pub async fn clear_defender_history() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![
        folders.common(&["Microsoft", "Windows Defender", "Scans", "History"]),
        folders.common(&["Microsoft", "Windows Defender", "Support"]),
    ])
    .await?;
    for channel in [
        "Microsoft-Windows-Windows Defender/Operational",
        "Microsoft-Windows-Windows Defender/WHC",
    ] {
        if let Err(e) = run_tool("wevtutil.exe", &["cl", channel]).await {
            tracing::debug!(channel, error = %e, "channel not cleared");
        }
    }
    Ok(())
}

pub async fn clear_userassist() -> Result<(), CleanupError> {
    let root = explorer("UserAssist");
    let Some(listing) = registry::query(&root).await? else {
        return Ok(());
    };
    let counts: Vec<RegKey> = listing
        .subkeys
        .iter()
        .map(|guid| root.child(guid).child("Count"))
        .collect();
    clear_value_lists(&counts, &[]).await
}

pub async fn clear_typed_paths() -> Result<(), CleanupError> {
    clear_value_lists(&[explorer("TypedPaths")], &[]).await
}

pub async fn clear_recent_apps() -> Result<(), CleanupError> {
    let start_page = explorer("StartPage");
    if let Err(e) = registry::delete_value(&start_page, "StartMenu_Start_Time").await {
        tracing::debug!(error = %e, "start page value not removed");
    }
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.local(&[
        "Microsoft",
        "Windows",
        "Recent",
        "AutomaticDestinations",
    ])])
    .await
}

pub async fn clear_clipboard_history() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.local(&["Microsoft", "Windows", "Clipboard"])]).await
}

pub async fn clear_mru_lists() -> Result<(), CleanupError> {
    let keys: Vec<RegKey> = MRU_KEYS.iter().map(|k| explorer(k)).collect();
    clear_value_lists(&keys, &["MRUList"]).await
}

// System maintenance

pub async fn clear_visual_cache() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    blocking(move |cancel| {
        if let Some(db) = folders.local(&["IconCache.db"]) {
            fs::try_delete_file(&db);
        }
        if let Some(dir) = folders.local(&["Microsoft", "Windows", "Explorer"]) {
            for pattern in ["iconcache*.db", "thumbcache*.db"] {
                if let Err(e) = fs::delete_matching(&dir, pattern, cancel) {
                    tracing::debug!(pattern, error = %e, "cache pattern skipped");
                }
            }
        }
    })
    .await?;
    run_tool("ie4uinit.exe", &["-ClearIconCache"]).await
}

pub async fn clear_font_cache() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    let windir = windir(&folders)?;
    with_service_stopped("FontCache", Duration::from_secs(1), || async move {
        blocking(move |cancel| {
            let service_cache = super::paths::join(
                &windir,
                &["ServiceProfiles", "LocalService", "AppData", "Local"],
            );
            let removed: usize = ["*FontCache*.dat", "FNTCACHE.DAT"]
                .iter()
                .map(|pattern| fs::delete_matching(&service_cache, pattern, cancel).unwrap_or(0))
                .sum();
            tracing::trace!(removed, "font cache files");
        })
        .await
    })
    .await
}

pub async fn clear_store_cache() -> Result<(), CleanupError> {
    run_tool("wsreset.exe", &[]).await
}

pub async fn clean_component_store() -> Result<(), CleanupError> {
    run_tool(
        "dism.exe",
        &["/Online", "/Cleanup-Image", "/StartComponentCleanup", "/Quiet"],
    )
    .await
}

pub async fn clean_windows_update() -> Result<(), CleanupError> {
    run_tool(
        "dism.exe",
        &[
            "/Online",
            "/Cleanup-Image",
            "/StartComponentCleanup",
            "/ResetBase",
            "/Quiet",
        ],
    )
    .await
}

// Logs and diagnostics

pub async fn remove_diagnostics() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![
        folders.local(&["D3DSCache"]),
        folders.local(&["Microsoft", "Windows", "WER"]),
        folders.common(&["Microsoft", "Windows", "WER"]),
        folders.windows(&["Logs"]),
    ])
    .await
}

pub async fn clear_event_logs() -> Result<(), CleanupError> {
    for log in ["Application", "System", "Security"] {
        if let Err(e) = run_tool("wevtutil.exe", &["cl", log]).await {
            tracing::debug!(log, error = %e, "event log not cleared");
        }
    }
    Ok(())
}

pub async fn clear_setup_logs() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    let windir = windir(&folders)?;
    blocking(move |cancel| {
        fs::delete_targets([windir.join("Panther")], cancel);
        for log in ["setupapi.dev.log", "setupapi.app.log"] {
            fs::try_delete_file(&windir.join("inf").join(log));
        }
    })
    .await
}

pub async fn clear_crash_dumps() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    blocking(move |cancel| {
        if let Some(dump) = folders.windows(&["MEMORY.DMP"]) {
            fs::try_delete_file(&dump);
        }
        fs::delete_targets(
            [folders.windows(&["Minidump"]), folders.local(&["CrashDumps"])]
                .into_iter()
                .flatten(),
            cancel,
        );
    })
    .await
}

pub async fn clear_perf_data() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.common(&["Microsoft", "Windows", "PLA"])]).await
}

pub async fn clear_cbs_logs() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.windows(&["Logs", "CBS"])]).await
}

// Network

pub async fn flush_dns() -> Result<(), CleanupError> {
    run_tool("ipconfig.exe", &["/flushdns"]).await
}

pub async fn clear_netbios_cache() -> Result<(), CleanupError> {
    run_tool("nbtstat.exe", &["-R"]).await
}

pub async fn clear_arp_cache() -> Result<(), CleanupError> {
    run_tool("arp.exe", &["-d", "*"]).await
}

pub async fn clear_network_cache() -> Result<(), CleanupError> {
    if let Err(e) = run_tool("net.exe", &["use", "*", "/delete", "/y"]).await {
        tracing::debug!(error = %e, "no mapped connections removed");
    }
    match tool_output("cmdkey.exe", &["/list"]).await {
        Ok(listing) => {
            for target in parse_cmdkey_targets(&listing) {
                let arg = format!("/delete:{target}");
                if let Err(e) = run_tool("cmdkey.exe", &[&arg]).await {
                    tracing::debug!(target = %target, error = %e, "credential not removed");
                }
            }
        }
        Err(e) => tracing::debug!(error = %e, "credential listing failed"),
    }
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.windows(&["CSC"])]).await
}

pub async fn clear_network_locations() -> Result<(), CleanupError> {
    let profiles =
        RegKey::hklm(r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\NetworkList\Profiles");
    let removed = registry::delete_subkeys_where(&profiles, |_| true).await?;
    tracing::debug!(removed, "network profiles removed");
    Ok(())
}

pub async fn clear_bits_queue() -> Result<(), CleanupError> {
    run_tool("bitsadmin.exe", &["/reset", "/allusers"]).await
}

// Registry

/// Run/RunOnce values whose executable no longer exists.
fn dead_run_entry(value: &RegValue) -> bool {
    if value.is_default() || value.data.trim().is_empty() {
        return false;
    }
    let exe = extract_executable_path(&expand_env_vars(&value.data));
    is_missing_file(&exe)
}

pub async fn clean_run_entries() -> Result<(), CleanupError> {
    let mut keys = Vec::new();
    for path in RUN_KEYS {
        keys.push(RegKey::hkcu(*path));
        keys.push(RegKey::hklm(*path));
        keys.push(RegKey::hklm(*path).wow32());
    }
    for key in &keys {
        match registry::delete_values_where(key, dead_run_entry).await {
            Ok(n) if n > 0 => tracing::debug!(key = %key.full_path(), removed = n, "run entries"),
            Ok(_) => {}
            Err(e) => tracing::debug!(key = %key.full_path(), error = %e, "run key skipped"),
        }
    }
    Ok(())
}

pub async fn clean_file_associations() -> Result<(), CleanupError> {
    let classes = RegKey::hkcu(r"Software\Classes");
    let Some(listing) = registry::query(&classes).await? else {
        return Ok(());
    };
    for ext in listing.subkeys.iter().filter(|k| k.starts_with('.')) {
        let key = classes.child(ext);
        let Ok(Some(ext_listing)) = registry::query(&key).await else {
            continue;
        };
        let prog_id = ext_listing
            .values
            .iter()
            .find(|v| v.is_default())
            .map(|v| v.data.trim())
            .unwrap_or_default();
        if prog_id.is_empty() || has_subkey(&listing.subkeys, prog_id) {
            continue;
        }
        if let Err(e) = registry::delete_tree(&key).await {
            tracing::debug!(ext = %ext, error = %e, "association not removed");
        }
    }
    Ok(())
}

fn has_subkey(subkeys: &[String], name: &str) -> bool {
    subkeys.iter().any(|k| k.eq_ignore_ascii_case(name))
}

pub async fn clean_uninstall_entries() -> Result<(), CleanupError> {
    for path in UNINSTALL_KEYS {
        let root = RegKey::hklm(*path);
        let blocks = match registry::query_tree(&root).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::debug!(key = %root.full_path(), error = %e, "uninstall key skipped");
                continue;
            }
        };
        let Some(base) = blocks.first().map(|b| b.path.clone()) else {
            continue;
        };
        let stale: Vec<String> = blocks
            .iter()
            .filter_map(|block| {
                let app = relative_to(&base, &block.path)?;
                if app.contains('\\') {
                    return None;
                }
                let command = block.value("UninstallString")?.trim();
                if command.is_empty() {
                    return None;
                }
                is_missing_file(&extract_executable_path(command)).then(|| app.to_string())
            })
            .collect();
        for app in stale {
            if let Err(e) = registry::delete_tree(&root.child(&app)).await {
                tracing::debug!(app = %app, error = %e, "uninstall entry not removed");
            }
        }
    }
    Ok(())
}

pub async fn clean_shared_dlls() -> Result<(), CleanupError> {
    let key = RegKey::hklm(r"Software\Microsoft\Windows\CurrentVersion\SharedDLLs");
    let removed =
        registry::delete_values_where(&key, |v| !v.is_default() && is_missing_file(&v.name))
            .await?;
    tracing::debug!(removed, "shared dll references");
    Ok(())
}

pub async fn clean_com_registrations() -> Result<(), CleanupError> {
    let clsid = RegKey::hkcr("CLSID");
    let blocks = registry::query_tree(&clsid).await?;
    let Some(base) = blocks.first().map(|b| b.path.clone()) else {
        return Ok(());
    };
    let orphaned: Vec<String> = blocks
        .iter()
        .filter_map(|block| {
            let rest = relative_to(&base, &block.path)?;
            let (id, sub) = rest.split_once('\\')?;
            if !sub.eq_ignore_ascii_case("InprocServer32") {
                return None;
            }
            let server = block.default_value()?;
            is_missing_file(&expand_env_vars(server.trim().trim_matches('"')))
                .then(|| id.to_string())
        })
        .collect();
    for id in orphaned {
        if let Err(e) = registry::delete_tree(&clsid.child(&id)).await {
            tracing::debug!(clsid = %id, error = %e, "registration not removed");
        }
    }
    Ok(())
}

pub async fn clear_mui_cache() -> Result<(), CleanupError> {
    let key = RegKey::hkcu(
        r"Software\Classes\Local Settings\Software\Microsoft\Windows\Shell\MuiCache",
    );
    clear_value_lists(&[key], &[]).await
}

// Advanced

pub async fn remove_empty_dirs() -> Result<(), CleanupError> {
    let root = KnownFolders::detect().system_drive;
    let removed = blocking(move |cancel| {
        let protected: Vec<PathBuf> = [
            "Windows",
            "Program Files",
            "Program Files (x86)",
            "ProgramData",
            "Users",
            "$Recycle.Bin",
            "System Volume Information",
        ]
        .iter()
        .map(|name| root.join(name))
        .collect();
        fs::remove_empty_dirs(&root, &protected, cancel)
    })
    .await?;
    tracing::debug!(removed, "empty directories");
    Ok(())
}

pub async fn remove_broken_shortcuts() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    for dir in shortcuts::shortcut_dirs(&folders) {
        match shortcuts::remove_broken_in(&dir).await {
            Ok(n) => tracing::debug!(dir = %dir.display(), removed = n, "shortcuts"),
            Err(e) => tracing::debug!(dir = %dir.display(), error = %e, "shortcut scan failed"),
        }
    }
    Ok(())
}

pub async fn remove_windows_old() -> Result<(), CleanupError> {
    let target = KnownFolders::detect().system_drive.join("Windows.old");
    blocking(move |_| fs::try_delete_dir(&target)).await?;
    Ok(())
}

pub async fn clean_driver_store() -> Result<(), CleanupError> {
    run_tool("pnputil.exe", &["/delete-driver", "*", "/uninstall", "/force"]).await
}

pub async fn clean_installer_cache() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    clear_dirs(vec![folders.windows(&["Installer", "$PatchCache$"])]).await
}

pub async fn disable_hibernation() -> Result<(), CleanupError> {
    run_tool("powercfg.exe", &["/hibernate", "off"]).await
}

pub async fn clean_restore_points() -> Result<(), CleanupError> {
    let target = format!("/for={}", KnownFolders::detect().drive_letter());
    run_tool(
        "vssadmin.exe",
        &["delete", "shadows", &target, "/oldest", "/quiet"],
    )
    .await
}

pub async fn rebuild_search_index() -> Result<(), CleanupError> {
    let folders = KnownFolders::detect();
    let data = folders.common(&["Microsoft", "Search", "Data", "Applications", "Windows"]);
    with_service_stopped("WSearch", Duration::from_secs(2), || clear_dirs(vec![data])).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(name: &str, data: &str) -> RegValue {
        RegValue {
            name: name.to_string(),
            kind: "REG_SZ".to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_relative_to() {
        let base = r"HKEY_CLASSES_ROOT\CLSID";
        assert_eq!(
            relative_to(base, r"HKEY_CLASSES_ROOT\clsid\{A}\InprocServer32"),
            Some(r"{A}\InprocServer32")
        );
        assert_eq!(relative_to(base, base), None);
        assert_eq!(relative_to(base, r"HKEY_CLASSES_ROOT\Other"), None);
    }

    #[test]
    fn test_dead_run_entry() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("live.exe");
        std::fs::write(&live, b"x").unwrap();
        let gone = dir.path().join("gone.exe");

        assert!(!dead_run_entry(&value(
            "Live",
            &format!("\"{}\" --tray", live.display())
        )));
        assert!(dead_run_entry(&value(
            "Gone",
            &format!("\"{}\" --tray", gone.display())
        )));
        assert!(!dead_run_entry(&value("Bare", "MsiExec.exe /X{GUID}")));
        assert!(!dead_run_entry(&value("", &gone.display().to_string())));
        assert!(!dead_run_entry(&value("Empty", "  ")));
    }

    #[test]
    fn test_has_subkey_ignores_case() {
        let keys = vec!["txtfile".to_string(), ".txt".to_string()];
        assert!(has_subkey(&keys, "TXTFILE"));
        assert!(!has_subkey(&keys, "docfile"));
    }

    #[test]
    fn test_explorer_key_path() {
        assert_eq!(
            explorer("RunMRU").full_path(),
            r"HKCU\Software\Microsoft\Windows\CurrentVersion\Explorer\RunMRU"
        );
    }
}
