//! Registry access through `reg.exe`. Queries are parsed from its text
//! output, which keeps this module free of platform bindings and lets the
//! parser be tested anywhere.

use crate::error::CleanupError;

use super::tool::{run_tool, tool_output};

const REG: &str = "reg.exe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    CurrentUser,
    LocalMachine,
    ClassesRoot,
}

impl Hive {
    fn short(self) -> &'static str {
        match self {
            Self::CurrentUser => "HKCU",
            Self::LocalMachine => "HKLM",
            Self::ClassesRoot => "HKCR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Native,
    Wow32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegKey {
    hive: Hive,
    path: String,
    view: View,
}

impl RegKey {
    pub fn new(hive: Hive, path: impl Into<String>) -> Self {
        Self {
            hive,
            path: path.into(),
            view: View::Native,
        }
    }

    pub fn hkcu(path: impl Into<String>) -> Self {
        Self::new(Hive::CurrentUser, path)
    }

    pub fn hklm(path: impl Into<String>) -> Self {
        Self::new(Hive::LocalMachine, path)
    }

    pub fn hkcr(path: impl Into<String>) -> Self {
        Self::new(Hive::ClassesRoot, path)
    }

    /// Address the 32-bit registry view on a 64-bit system.
    pub fn wow32(mut self) -> Self {
        self.view = View::Wow32;
        self
    }

    pub fn child(&self, name: &str) -> Self {
        Self {
            hive: self.hive,
            path: format!("{}\\{}", self.path, name),
            view: self.view,
        }
    }

    pub fn full_path(&self) -> String {
        format!("{}\\{}", self.hive.short(), self.path)
    }

    fn args<'a>(&'a self, path: &'a str, verb: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![verb, path];
        args.extend_from_slice(extra);
        if self.view == View::Wow32 {
            args.push("/reg:32");
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegValue {
    /// Empty for the key's default value.
    pub name: String,
    pub kind: String,
    pub data: String,
}

impl RegValue {
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// One key header from `reg query` output with the values printed under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBlock {
    pub path: String,
    pub values: Vec<RegValue>,
}

impl KeyBlock {
    pub fn default_value(&self) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.is_default())
            .map(|v| v.data.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.data.as_str())
    }

    pub fn leaf(&self) -> &str {
        self.path.rsplit('\\').next().unwrap_or(&self.path)
    }
}

/// Values and direct subkey names of a single key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyListing {
    pub values: Vec<RegValue>,
    pub subkeys: Vec<String>,
}

/// Split `reg query` output into key blocks.
pub fn parse_query(output: &str) -> Vec<KeyBlock> {
    let mut blocks: Vec<KeyBlock> = Vec::new();
    for raw in output.lines() {
        let line = raw.trim_end_matches('\r');
        if line.starts_with("HKEY_") {
            blocks.push(KeyBlock {
                path: line.trim().to_string(),
                values: Vec::new(),
            });
            continue;
        }
        if !line.starts_with("    ") {
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if let Some(value) = parse_value_line(line.trim_start()) {
            block.values.push(value);
        }
    }
    blocks
}

fn parse_value_line(body: &str) -> Option<RegValue> {
    let mut parts = body.splitn(3, "    ");
    let name = parts.next()?.trim();
    let kind = parts.next()?.trim();
    if !kind.starts_with("REG_") {
        return None;
    }
    let data = parts.next().unwrap_or("").trim();
    let name = if name == "(Default)" { "" } else { name };
    let data = if data == "(value not set)" { "" } else { data };
    Some(RegValue {
        name: name.to_string(),
        kind: kind.to_string(),
        data: data.to_string(),
    })
}

/// Non-recursive query output: the first block is the key itself, the rest
/// are its direct subkeys.
pub fn listing_from(blocks: Vec<KeyBlock>) -> KeyListing {
    let mut iter = blocks.into_iter();
    let values = iter.next().map(|b| b.values).unwrap_or_default();
    let subkeys = iter.map(|b| b.leaf().to_string()).collect();
    KeyListing { values, subkeys }
}

/// Read a key. `Ok(None)` when the key does not exist.
pub async fn query(key: &RegKey) -> Result<Option<KeyListing>, CleanupError> {
    let path = key.full_path();
    match tool_output(REG, &key.args(&path, "query", &[])).await {
        Ok(out) => Ok(Some(listing_from(parse_query(&out)))),
        Err(CleanupError::Tool { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read a key and everything below it.
pub async fn query_tree(key: &RegKey) -> Result<Vec<KeyBlock>, CleanupError> {
    let path = key.full_path();
    match tool_output(REG, &key.args(&path, "query", &["/s"])).await {
        Ok(out) => Ok(parse_query(&out)),
        Err(CleanupError::Tool { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

pub async fn delete_value(key: &RegKey, name: &str) -> Result<(), CleanupError> {
    let path = key.full_path();
    let extra: Vec<&str> = if name.is_empty() {
        vec!["/ve", "/f"]
    } else {
        vec!["/v", name, "/f"]
    };
    run_tool(REG, &key.args(&path, "delete", &extra))
        .await
        .map_err(|e| CleanupError::Registry(format!("{path} [{name}]: {e}")))
}

pub async fn delete_tree(key: &RegKey) -> Result<(), CleanupError> {
    let path = key.full_path();
    run_tool(REG, &key.args(&path, "delete", &["/f"]))
        .await
        .map_err(|e| CleanupError::Registry(format!("{path}: {e}")))
}

/// Delete the values of `key` for which `pred` holds. Returns how many went.
pub async fn delete_values_where<P>(key: &RegKey, pred: P) -> Result<usize, CleanupError>
where
    P: Fn(&RegValue) -> bool,
{
    let Some(listing) = query(key).await? else {
        return Ok(0);
    };
    let mut deleted = 0;
    for value in listing.values.iter().filter(|v| pred(v)) {
        match delete_value(key, &value.name).await {
            Ok(()) => deleted += 1,
            Err(e) => tracing::debug!(error = %e, "value delete failed"),
        }
    }
    Ok(deleted)
}

/// Delete every named value of `key` except those in `keep`.
pub async fn clear_values(key: &RegKey, keep: &[&str]) -> Result<usize, CleanupError> {
    delete_values_where(key, |v| {
        !v.is_default() && !keep.iter().any(|k| k.eq_ignore_ascii_case(&v.name))
    })
    .await
}

/// Delete the subtrees of `key`'s direct subkeys for which `pred` holds.
pub async fn delete_subkeys_where<P>(key: &RegKey, pred: P) -> Result<usize, CleanupError>
where
    P: Fn(&str) -> bool,
{
    let Some(listing) = query(key).await? else {
        return Ok(0);
    };
    let mut deleted = 0;
    for name in listing.subkeys.iter().filter(|n| pred(n)) {
        match delete_tree(&key.child(name)).await {
            Ok(()) => deleted += 1,
            Err(e) => tracing::debug!(error = %e, "subkey delete failed"),
        }
    }
    Ok(deleted)
}
