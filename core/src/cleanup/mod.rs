//! Platform bodies behind the catalogue's tasks. Everything here returns
//! `Result<_, CleanupError>`; the catalogue wraps each body in `BestEffort`
//! so none of these errors leave a task.

pub mod browser;
pub mod fs;
pub mod ops;
pub mod paths;
pub mod recycle;
pub mod registry;
pub mod shortcuts;
pub mod tool;

use tokio_util::sync::CancellationToken;

use crate::error::CleanupError;
use crate::task::TaskScope;

/// Run a blocking filesystem job on tokio's blocking pool, inside the current
/// task's scope. The job gets the scope's cancellation token and should check
/// it between entries: a timed-out task cancels it and waits for the job.
pub async fn blocking<F, T>(job: F) -> Result<T, CleanupError>
where
    F: FnOnce(&CancellationToken) -> T + Send + 'static,
    T: Send + 'static,
{
    let scope = TaskScope::current().unwrap_or_default();
    let cancel = scope.cancel_token().clone();
    scope
        .spawn_blocking(move || job(&cancel))
        .await
        .map_err(|e| CleanupError::Join(e.to_string()))
}

/// Pull the executable part out of a command line: the quoted path when the
/// command starts with a quote, otherwise the first token cut after `.exe`.
pub fn extract_executable_path(command: &str) -> String {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Some(rest) = trimmed.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            if end > 0 {
                return rest[..end].to_string();
            }
        }
    }
    let candidate = trimmed.split(' ').next().unwrap_or(trimmed);
    match candidate.to_ascii_lowercase().find(".exe") {
        Some(idx) => candidate[..idx + 4].to_string(),
        None => candidate.to_string(),
    }
}

/// Expand `%VAR%` references from the process environment. Unknown variables
/// are left as written.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A registered path counts as missing only when it is absolute and nothing
/// exists there; bare names like `MsiExec.exe` resolve through PATH.
pub fn is_missing_file(path: &str) -> bool {
    let p = std::path::Path::new(path);
    !path.is_empty() && p.is_absolute() && !p.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_quoted_path() {
        assert_eq!(
            extract_executable_path(r#""C:\Program Files\App\app.exe" --silent"#),
            r"C:\Program Files\App\app.exe"
        );
    }

    #[test]
    fn test_extract_unquoted_with_args() {
        assert_eq!(
            extract_executable_path(r"C:\Tools\run.exe /min"),
            r"C:\Tools\run.exe"
        );
        assert_eq!(
            extract_executable_path(r"C:\Tools\RUN.EXE,1"),
            r"C:\Tools\RUN.EXE"
        );
    }

    #[test]
    fn test_extract_without_exe() {
        assert_eq!(extract_executable_path("  rundll32 foo"), "rundll32");
        assert_eq!(extract_executable_path("   "), "");
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("WINSWEEP_TEST_ROOT", "/opt/win");
        assert_eq!(
            expand_env_vars("%WINSWEEP_TEST_ROOT%/system32/x.dll"),
            "/opt/win/system32/x.dll"
        );
        assert_eq!(
            expand_env_vars("%WINSWEEP_TEST_UNSET_VAR%/x"),
            "%WINSWEEP_TEST_UNSET_VAR%/x"
        );
        assert_eq!(expand_env_vars("100% sure"), "100% sure");
    }

    #[test]
    fn test_missing_file_requires_absolute_path() {
        assert!(!is_missing_file("MsiExec.exe"));
        assert!(!is_missing_file(""));
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.exe");
        assert!(is_missing_file(gone.to_str().unwrap()));
        std::fs::write(&gone, b"x").unwrap();
        assert!(!is_missing_file(gone.to_str().unwrap()));
    }
}
