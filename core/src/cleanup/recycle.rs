use std::path::Path;

use crate::error::CleanupError;

/// Empty the recycle bin of the volume rooted at `root`, silently.
#[cfg(windows)]
pub fn empty_recycle_bin(root: &Path) -> Result<(), CleanupError> {
    use std::os::windows::ffi::OsStrExt;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Shell::SHEmptyRecycleBinW;

    const SHERB_NOCONFIRMATION: u32 = 0x0000_0001;
    const SHERB_NOPROGRESSUI: u32 = 0x0000_0002;
    const SHERB_NOSOUND: u32 = 0x0000_0004;

    let wide: Vec<u16> = root
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();
    // SAFETY: `wide` is NUL-terminated and outlives the call.
    unsafe {
        SHEmptyRecycleBinW(
            HWND::default(),
            PCWSTR(wide.as_ptr()),
            SHERB_NOCONFIRMATION | SHERB_NOPROGRESSUI | SHERB_NOSOUND,
        )
    }
    .map_err(|e| shell_error("SHEmptyRecycleBinW", &e))
}

#[cfg_attr(not(windows), allow(dead_code))]
fn shell_error(call: &str, err: &dyn std::fmt::Display) -> CleanupError {
    CleanupError::Shell(format!("{call}: {err}"))
}

#[cfg(not(windows))]
pub fn empty_recycle_bin(_root: &Path) -> Result<(), CleanupError> {
    Err(CleanupError::Unsupported("recycle bin"))
}
