use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$GSTR_HOME`, or `~/.gstr` when unset.
pub fn gstr_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("GSTR_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or set GSTR_HOME)")?;
    Ok(PathBuf::from(home).join(".gstr"))
}

pub fn ensure_gstr_home() -> Result<PathBuf> {
    let dir = gstr_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
