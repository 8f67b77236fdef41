// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Change notification for a single JSON store
//!
//! Uses OS-level file watching (Linux inotify) via the notify crate. The
//! parent directory is watched rather than the file itself: atomic saves
//! replace the file by rename, and the file may not exist yet. The
//! directory is created when missing (a fresh config dir).

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    fs,
    path::Path,
    sync::mpsc::{channel, Receiver},
};

/// Watches one file and reports whether it changed since the last check
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl FileWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        // inotify cannot watch a directory that does not exist yet
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(notify::Error::io)?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            file_name: path.file_name().map(OsString::from).unwrap_or_default(),
        })
    }

    /// Drains pending events (non-blocking); true if any touched the file
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event_result) = self.rx.try_recv() {
            let Ok(event) = event_result else {
                continue;
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                continue;
            }
            if event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
            {
                changed = true;
            }
        }
        changed
    }
}
