//! Broken `.lnk` removal. Shortcut targets are resolved through the
//! WScript.Shell COM object by a PowerShell one-shot per directory.

use std::path::{Path, PathBuf};

use crate::error::CleanupError;

use super::paths::KnownFolders;
use super::tool::tool_output;

const RESOLVE_TEMPLATE: &str = r#"$ErrorActionPreference='SilentlyContinue'
$shell = New-Object -ComObject WScript.Shell
Get-ChildItem -LiteralPath '{dir}' -Filter *.lnk -Recurse -File | ForEach-Object {
  $t = $shell.CreateShortcut($_.FullName).TargetPath
  Write-Output ($_.FullName + "`t" + $t)
}"#;

/// Directories scanned for shortcuts.
pub fn shortcut_dirs(folders: &KnownFolders) -> Vec<PathBuf> {
    [
        folders.desktop.clone(),
        folders.roaming(&["Microsoft", "Windows", "Start Menu"]),
        folders.common(&["Microsoft", "Windows", "Start Menu"]),
        folders.roaming(&["Microsoft", "Internet Explorer", "Quick Launch"]),
    ]
    .into_iter()
    .flatten()
    .filter(|d| d.is_dir())
    .collect()
}

/// Parse `path<TAB>target` lines into shortcuts whose target is gone. An empty
/// target counts as broken.
pub fn broken_from_listing(listing: &str) -> Vec<PathBuf> {
    listing
        .lines()
        .filter_map(|line| {
            let (lnk, target) = line.trim_end_matches('\r').split_once('\t')?;
            let target = target.trim();
            let broken = target.is_empty() || !Path::new(target).exists();
            broken.then(|| PathBuf::from(lnk))
        })
        .collect()
}

/// Single quotes are doubled inside a PowerShell literal string.
fn resolve_script(dir: &Path) -> String {
    let literal = dir.display().to_string().replace('\'', "''");
    RESOLVE_TEMPLATE.replace("{dir}", &literal)
}

pub async fn remove_broken_in(dir: &Path) -> Result<usize, CleanupError> {
    let script = resolve_script(dir);
    let listing = tool_output(
        "powershell.exe",
        &["-NoProfile", "-NonInteractive", "-Command", &script],
    )
    .await?;
    Ok(broken_from_listing(&listing)
        .iter()
        .filter(|lnk| std::fs::remove_file(lnk).is_ok())
        .count())
}
