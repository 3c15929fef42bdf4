//! Command availability cache.
//!
//! Looking a command up on `PATH` means a `stat` per directory. Alerts can
//! fire often, so lookups are remembered per command until [`CommandCache::reset`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Remembers which commands can be found in a set of directories.
#[derive(Debug, Default)]
pub struct CommandCache {
    search_dirs: Vec<PathBuf>,
    known: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl CommandCache {
    /// Cache searching `search_dirs`, in order.
    #[must_use]
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Cache searching the directories in `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        Self::new(dirs)
    }

    /// Executable that `command` resolves to.
    ///
    /// Commands containing a path separator are checked directly; bare names
    /// are searched for in the configured directories.
    pub fn resolve(&self, command: &str) -> Option<PathBuf> {
        if let Some(hit) = self.known.lock().get(command) {
            return hit.clone();
        }
        let found = self.lookup(command);
        let _ = self.known.lock().insert(command.to_owned(), found.clone());
        found
    }

    /// Whether `command` resolves to an executable file.
    pub fn is_available(&self, command: &str) -> bool {
        self.resolve(command).is_some()
    }

    /// First of `commands` that is available, with its resolved path.
    pub fn first_available<'a>(&self, commands: &'a [String]) -> Option<(&'a str, PathBuf)> {
        commands
            .iter()
            .find_map(|c| self.resolve(c).map(|path| (c.as_str(), path)))
    }

    /// Forget every cached answer.
    pub fn reset(&self) {
        self.known.lock().clear();
    }

    /// Number of cached answers.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.known.lock().len()
    }

    fn lookup(&self, command: &str) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }
        if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
            let path = PathBuf::from(command);
            return is_executable(&path).then_some(path);
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(command))
            .find(|path| is_executable(path))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    #[test]
    fn finds_command_in_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let _ = make_executable(dir.path(), "notify-send");
        let cache = CommandCache::new(vec![dir.path().to_path_buf()]);

        assert!(cache.is_available("notify-send"));
        assert!(!cache.is_available("osascript"));
        assert_eq!(cache.cached(), 2);
    }

    #[test]
    fn answers_are_cached_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CommandCache::new(vec![dir.path().to_path_buf()]);
        assert!(!cache.is_available("late-tool"));

        let _ = make_executable(dir.path(), "late-tool");
        assert!(!cache.is_available("late-tool"));

        cache.reset();
        assert_eq!(cache.cached(), 0);
        assert!(cache.is_available("late-tool"));
    }

    #[test]
    fn first_available_keeps_preference_order() {
        let dir = tempfile::tempdir().unwrap();
        let _ = make_executable(dir.path(), "terminal-notifier");
        let _ = make_executable(dir.path(), "osascript");
        let cache = CommandCache::new(vec![dir.path().to_path_buf()]);

        let commands = vec![
            "notify-send".to_string(),
            "osascript".to_string(),
            "terminal-notifier".to_string(),
        ];
        let (name, path) = cache.first_available(&commands).unwrap();
        assert_eq!(name, "osascript");
        assert_eq!(path, dir.path().join("osascript"));
    }

    #[test]
    fn explicit_path_is_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = make_executable(dir.path(), "alert.sh");
        let cache = CommandCache::new(Vec::new());
        assert_eq!(cache.resolve(path.to_str().unwrap()), Some(path.clone()));
        assert!(!cache.is_available(""));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain"), "data").unwrap();
        let cache = CommandCache::new(vec![dir.path().to_path_buf()]);
        assert!(!cache.is_available("plain"));
    }

    #[test]
    fn separate_caches_do_not_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let _ = make_executable(dir.path(), "tool");
        let a = CommandCache::new(vec![dir.path().to_path_buf()]);
        let b = CommandCache::new(Vec::new());
        assert!(a.is_available("tool"));
        assert!(!b.is_available("tool"));
    }
}
