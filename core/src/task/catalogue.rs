//! The built-in task catalogue. Registration order is run order.

use crate::cleanup::ops;
use crate::error::CatalogueError;

use super::{action, Category, Task, TaskRegistry};

macro_rules! task {
    ($id:literal, $title:literal, $label:literal, $category:expr, $body:path) => {
        Task::new($id, $title, $label, $category, action($id, $body))
    };
}

/// Every built-in cleanup task in canonical order.
#[rustfmt::skip]
pub fn builtin() -> Result<TaskRegistry, CatalogueError> {
    use Category::*;

    let tasks = [
        task!("remove-junk-files", "User temp files", "Removing user temp files...", QuickCleanup, ops::remove_junk_files),
        task!("clean-system-temp", "System temp/update caches", "Cleaning system temp/update caches...", QuickCleanup, ops::clean_system_temp),
        task!("empty-recycle-bin", "Recycle bin", "Emptying recycle bin...", QuickCleanup, ops::empty_recycle_bin),
        task!("wipe-browser-data", "Browser data", "Wiping browser data...", QuickCleanup, ops::wipe_browser_data)
            .locking_app_data(),
        task!("clear-file-history", "Explorer history", "Clearing Explorer history...", QuickCleanup, ops::clear_file_history),
        task!("clear-defender-history", "Defender history", "Clearing Defender history...", Privacy, ops::clear_defender_history),
        task!("clear-userassist", "UserAssist data", "Clearing UserAssist data...", Privacy, ops::clear_userassist),
        task!("clear-typed-paths", "Typed paths", "Clearing typed paths...", Privacy, ops::clear_typed_paths),
        task!("clear-recent-apps", "Recent apps", "Clearing recent apps...", Privacy, ops::clear_recent_apps),
        task!("clear-clipboard-history", "Clipboard history", "Clearing clipboard history...", Privacy, ops::clear_clipboard_history),
        task!("clear-mru-lists", "MRU lists", "Clearing MRU lists...", Privacy, ops::clear_mru_lists),
        task!("clear-visual-cache", "Icon/thumbnail cache", "Clearing icon/thumbnail cache...", SystemMaintenance, ops::clear_visual_cache),
        task!("clear-font-cache", "Font cache", "Clearing font cache...", SystemMaintenance, ops::clear_font_cache),
        task!("clear-store-cache", "Store cache", "Clearing Store cache...", SystemMaintenance, ops::clear_store_cache),
        task!("clean-component-store", "Component store", "Cleaning component store...", SystemMaintenance, ops::clean_component_store),
        task!("clean-windows-update", "Windows Update", "Cleaning Windows Update...", SystemMaintenance, ops::clean_windows_update),
        task!("remove-diagnostics", "Diagnostics/error reports", "Removing diagnostics/error reports...", Logs, ops::remove_diagnostics),
        task!("clear-event-logs", "Event logs", "Clearing event logs...", Logs, ops::clear_event_logs),
        task!("clear-setup-logs", "Setup logs", "Clearing setup logs...", Logs, ops::clear_setup_logs),
        task!("clear-crash-dumps", "Crash dumps", "Clearing crash dumps...", Logs, ops::clear_crash_dumps),
        task!("clear-perf-data", "Performance data", "Clearing performance data...", Logs, ops::clear_perf_data),
        task!("clear-cbs-logs", "CBS logs", "Clearing CBS logs...", Logs, ops::clear_cbs_logs),
        task!("flush-dns", "DNS cache", "Flushing DNS cache...", Network, ops::flush_dns),
        task!("clear-netbios-cache", "NetBIOS cache", "Clearing NetBIOS cache...", Network, ops::clear_netbios_cache),
        task!("clear-arp-cache", "ARP cache", "Clearing ARP cache...", Network, ops::clear_arp_cache),
        task!("clear-network-cache", "Network cache", "Clearing network cache...", Network, ops::clear_network_cache),
        task!("clear-network-locations", "Network location cache", "Clearing network location cache...", Network, ops::clear_network_locations),
        task!("clear-bits-queue", "BITS queue", "Clearing BITS queue...", Network, ops::clear_bits_queue),
        task!("clean-run-entries", "Registry run entries", "Cleaning registry run entries...", Registry, ops::clean_run_entries),
        task!("clean-file-associations", "File associations", "Cleaning file associations...", Registry, ops::clean_file_associations),
        task!("clean-uninstall-entries", "Uninstall entries", "Cleaning uninstall entries...", Registry, ops::clean_uninstall_entries),
        task!("clean-shared-dlls", "Shared DLLs", "Cleaning shared DLLs...", Registry, ops::clean_shared_dlls),
        task!("clean-com-registrations", "COM registrations", "Cleaning COM registrations...", Registry, ops::clean_com_registrations),
        task!("clear-mui-cache", "MUI cache", "Clearing MUI cache...", Registry, ops::clear_mui_cache),
        task!("remove-empty-dirs", "Empty directories", "Removing empty directories...", Advanced, ops::remove_empty_dirs),
        task!("remove-broken-shortcuts", "Broken shortcuts", "Removing broken shortcuts...", Advanced, ops::remove_broken_shortcuts),
        task!("remove-windows-old", "Windows.old", "Removing Windows.old...", Advanced, ops::remove_windows_old),
        task!("clean-driver-store", "Driver store", "Cleaning driver store...", Advanced, ops::clean_driver_store),
        task!("clean-installer-cache", "Installer cache", "Cleaning installer cache...", Advanced, ops::clean_installer_cache),
        task!("disable-hibernation", "Hibernation", "Disabling hibernation...", Advanced, ops::disable_hibernation),
        task!("clean-restore-points", "Restore points", "Cleaning restore points...", Advanced, ops::clean_restore_points),
        task!("rebuild-search-index", "Search index", "Rebuilding search index...", Advanced, ops::rebuild_search_index),
    ];

    let mut registry = TaskRegistry::new();
    for task in tasks {
        registry.register(task)?;
    }
    tracing::debug!(tasks = registry.len(), "catalogue loaded");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_every_task_once() {
        let registry = builtin().unwrap();
        assert_eq!(registry.len(), 42);
        let first = &registry.all()[0];
        assert_eq!(first.id, "remove-junk-files");
        assert_eq!(first.label, "Removing user temp files...");
        assert_eq!(registry.all()[41].id, "rebuild-search-index");
    }

    #[test]
    fn test_categories_are_contiguous_and_ordered() {
        let registry = builtin().unwrap();
        let mut seen: Vec<Category> = Vec::new();
        for task in registry.all() {
            if seen.last() != Some(&task.category) {
                assert!(!seen.contains(&task.category), "{} split", task.category);
                seen.push(task.category);
            }
        }
        assert_eq!(seen, Category::ALL.to_vec());
    }

    #[test]
    fn test_only_browser_wipe_locks_app_data() {
        let registry = builtin().unwrap();
        let locking: Vec<&str> = registry
            .all()
            .iter()
            .filter(|t| t.locks_app_data)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(locking, vec!["wipe-browser-data"]);
    }

    #[test]
    fn test_labels_are_progress_text() {
        let registry = builtin().unwrap();
        for task in registry.all() {
            assert!(task.label.ends_with("..."), "{}", task.id);
            assert!(!task.title.is_empty(), "{}", task.id);
        }
    }
}
