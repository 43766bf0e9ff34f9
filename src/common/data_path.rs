// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::path::PathBuf;

const DATA_DIR_ENV: &str = "MINTWORX_DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the active data directory using precedence:
/// 1) explicit config `data_dir`
/// 2) `MINTWORX_DATA_DIR`
/// 3) cwd-relative `./data`
pub fn resolve_data_dir(explicit_data_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir)
    {
        return absolute(PathBuf::from(dir));
    }
    absolute(PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_data_dir(Some("/tmp/mintworx-state"));
        assert_eq!(dir, PathBuf::from("/tmp/mintworx-state"));
    }

    #[test]
    fn blank_explicit_dir_falls_back() {
        let dir = resolve_data_dir(Some("   "));
        assert!(dir.ends_with("data"));
    }
}
