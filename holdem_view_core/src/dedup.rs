use std::collections::VecDeque;

/// 去重时回看的历史深度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupWindow {
    /// 只和最近一条比较（当前引擎的行为）
    #[default]
    Last,
    /// 和最近两条比较（早期客户端的行为）
    LastTwo,
}

impl DedupWindow {
    pub fn depth(self) -> usize {
        match self {
            DedupWindow::Last => 1,
            DedupWindow::LastTwo => 2,
        }
    }
}

/// 丢弃与最近若干条完全相同的原始消息。
///
/// 按原始字节比较而不是按解码后的语义比较：不需要先解码，
/// 也不会把两条内容不同但语义相同的快照合并。
#[derive(Debug, Clone)]
pub struct DedupFilter {
    window: DedupWindow,
    history: VecDeque<String>,
}

impl DedupFilter {
    pub fn new(window: DedupWindow) -> Self {
        DedupFilter {
            window,
            history: VecDeque::with_capacity(window.depth()),
        }
    }

    /// 返回 `true` 表示这条消息应当继续处理，并把它记入历史
    pub fn should_process(&mut self, raw: &str) -> bool {
        if self.history.iter().any(|seen| seen == raw) {
            return false;
        }
        if self.history.len() == self.window.depth() {
            self.history.pop_back();
        }
        self.history.push_front(raw.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn window(&self) -> DedupWindow {
        self.window
    }
}

impl Default for DedupFilter {
    fn default() -> Self {
        DedupFilter::new(DedupWindow::default())
    }
}

impl TryFrom<u8> for DedupWindow {
    type Error = crate::error::ConfigError;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        match depth {
            1 => Ok(DedupWindow::Last),
            2 => Ok(DedupWindow::LastTwo),
            other => Err(crate::error::ConfigError::DedupDepth(other)),
        }
    }
}
