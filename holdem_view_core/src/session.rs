use std::fmt;
use uuid::Uuid;

/// 牌局会话标识，由外部页面/流程提供，本库只读取和清除，从不生成。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// 校验并规范化会话标识。
    ///
    /// UUID 统一为小写连字符形式；其它标识只允许出现在 URL 路径段中安全的字符。
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Some(SessionId(uuid.hyphenated().to_string()));
        }
        let path_safe = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        (!raw.is_empty() && path_safe).then(|| SessionId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 日志里使用的短形式
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 保存会话标识的外部存储（浏览器里是 localStorage，命令行里是文件）
pub trait SessionStore {
    fn load(&self) -> Option<String>;
    fn clear(&mut self);
}

/// 内存中的会话存储
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    id: Option<String>,
    cleared: usize,
}

impl MemorySessionStore {
    pub fn new(id: impl Into<String>) -> Self {
        MemorySessionStore { id: Some(id.into()), cleared: 0 }
    }

    pub fn empty() -> Self {
        MemorySessionStore::default()
    }

    /// `clear` 被调用的次数
    pub fn clear_count(&self) -> usize {
        self.cleared
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.id.clone()
    }

    fn clear(&mut self) {
        self.id = None;
        self.cleared += 1;
    }
}
