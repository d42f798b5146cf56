use holdem_view_core::{MemorySessionStore, SessionStore};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// 保存在文件中的会话标识（浏览器中对应 localStorage 里的 `activeGame`）
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                (!id.is_empty()).then(|| id.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("无法读取会话文件 {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn clear(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("无法删除会话文件 {}: {}", self.path.display(), e),
        }
    }
}

/// 命令行可以直接给出会话标识，也可以从文件读取
#[derive(Debug, Clone)]
pub enum CliSessionStore {
    Given(MemorySessionStore),
    File(FileSessionStore),
}

impl SessionStore for CliSessionStore {
    fn load(&self) -> Option<String> {
        match self {
            CliSessionStore::Given(store) => store.load(),
            CliSessionStore::File(store) => store.load(),
        }
    }

    fn clear(&mut self) {
        match self {
            CliSessionStore::Given(store) => store.clear(),
            CliSessionStore::File(store) => store.clear(),
        }
    }
}
