use std::path::{Path, PathBuf};

/// Well-known locations the cleanup bodies resolve against. Missing entries
/// are `None`; bodies skip the targets that depend on them.
#[derive(Debug, Clone)]
pub struct KnownFolders {
    pub local_app_data: Option<PathBuf>,
    pub roaming_app_data: Option<PathBuf>,
    pub program_data: Option<PathBuf>,
    pub system_root: Option<PathBuf>,
    pub desktop: Option<PathBuf>,
    pub temp: PathBuf,
    pub system_drive: PathBuf,
}

impl KnownFolders {
    pub fn detect() -> Self {
        Self {
            local_app_data: dirs::data_local_dir(),
            roaming_app_data: dirs::data_dir(),
            program_data: env_path("ProgramData").or_else(|| env_path("ALLUSERSPROFILE")),
            system_root: env_path("SystemRoot").or_else(|| env_path("windir")),
            desktop: dirs::desktop_dir(),
            temp: std::env::temp_dir(),
            system_drive: system_drive(),
        }
    }

    pub fn local(&self, parts: &[&str]) -> Option<PathBuf> {
        self.local_app_data.as_deref().map(|base| join(base, parts))
    }

    pub fn roaming(&self, parts: &[&str]) -> Option<PathBuf> {
        self.roaming_app_data.as_deref().map(|base| join(base, parts))
    }

    pub fn common(&self, parts: &[&str]) -> Option<PathBuf> {
        self.program_data.as_deref().map(|base| join(base, parts))
    }

    pub fn windows(&self, parts: &[&str]) -> Option<PathBuf> {
        self.system_root.as_deref().map(|base| join(base, parts))
    }

    /// Drive letter form used by tools such as vssadmin, e.g. `C:`.
    pub fn drive_letter(&self) -> String {
        let s = self.system_drive.to_string_lossy();
        s.trim_end_matches(['\\', '/']).to_string()
    }
}

pub fn join(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |acc, p| acc.join(p))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Root of the system volume: `%SystemDrive%\` on Windows, `/` elsewhere.
pub fn system_drive() -> PathBuf {
    if cfg!(windows) {
        let drive = std::env::var("SystemDrive")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "C:".to_string());
        PathBuf::from(format!("{}\\", drive.trim_end_matches('\\')))
    } else {
        PathBuf::from("/")
    }
}
