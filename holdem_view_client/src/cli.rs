use crate::session_file::{CliSessionStore, FileSessionStore};
use clap::Parser;
use holdem_view_core::{ConfigError, DedupWindow, ManagerConfig, MemorySessionStore, DEFAULT_API_BASE};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "holdem-view", about = "德州扑克牌桌同步客户端")]
pub struct Cli {
    /// API 地址，http 对应 ws，其它对应 wss
    #[arg(long, env = "HOLDEM_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// 直接指定会话标识，优先于会话文件
    #[arg(long, env = "HOLDEM_SESSION")]
    pub session: Option<String>,

    #[arg(long, env = "HOLDEM_SESSION_FILE", default_value = ".holdem_session")]
    pub session_file: PathBuf,

    /// 去重窗口：1 只比较上一条，2 比较上两条
    #[arg(long, env = "HOLDEM_DEDUP_DEPTH", default_value_t = 1)]
    pub dedup_depth: u8,

    #[arg(long, env = "HOLDEM_REDIRECT_DELAY_SECS", default_value_t = 5)]
    pub redirect_delay_secs: u64,

    #[arg(long, env = "HOLDEM_GAME_OVER_DELAY_SECS", default_value_t = 10)]
    pub game_over_delay_secs: u64,
}

impl Cli {
    pub fn manager_config(&self) -> Result<ManagerConfig, ConfigError> {
        Ok(ManagerConfig::new(&self.api_base)?
            .with_dedup(DedupWindow::try_from(self.dedup_depth)?)
            .with_redirect_delay(Duration::from_secs(self.redirect_delay_secs))
            .with_game_over_delay(Duration::from_secs(self.game_over_delay_secs)))
    }

    pub fn session_store(&self) -> CliSessionStore {
        match &self.session {
            Some(id) => CliSessionStore::Given(MemorySessionStore::new(id.as_str())),
            None => CliSessionStore::File(FileSessionStore::new(&self.session_file)),
        }
    }
}
