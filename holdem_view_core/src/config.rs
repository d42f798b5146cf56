use crate::dedup::DedupWindow;
use crate::error::ConfigError;
use crate::session::SessionId;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
/// 连接出错后跳转前的等待时间
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(5);
/// 牌局结束后跳转前的倒计时
pub const DEFAULT_GAME_OVER_DELAY: Duration = Duration::from_secs(10);

/// 一个牌桌视图的连接配置
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub api_base: Url,
    pub dedup: DedupWindow,
    pub redirect_delay: Duration,
    pub game_over_delay: Duration,
}

impl ManagerConfig {
    pub fn new(api_base: &str) -> Result<Self, ConfigError> {
        let api_base = Url::parse(api_base)?;
        if api_base.host_str().is_none() {
            return Err(ConfigError::MissingHost(api_base.to_string()));
        }
        Ok(ManagerConfig {
            api_base,
            dedup: DedupWindow::default(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            game_over_delay: DEFAULT_GAME_OVER_DELAY,
        })
    }

    pub fn with_dedup(mut self, dedup: DedupWindow) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn with_game_over_delay(mut self, delay: Duration) -> Self {
        self.game_over_delay = delay;
        self
    }

    /// 牌桌的 WebSocket 地址：`{ws|wss}://<api-host>/api/game/id/<id>`。
    /// API 地址为 http 时用 ws，否则用 wss。
    pub fn endpoint(&self, session: &SessionId) -> Result<Url, ConfigError> {
        let scheme = if self.api_base.scheme() == "http" { "ws" } else { "wss" };
        let host = self
            .api_base
            .host_str()
            .ok_or_else(|| ConfigError::MissingHost(self.api_base.to_string()))?;
        let authority = match self.api_base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Url::parse(&format!("{scheme}://{authority}/api/game/id/{session}"))?)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            api_base: Url::parse(DEFAULT_API_BASE).expect("默认 API 地址是合法的 URL"),
            dedup: DedupWindow::default(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            game_over_delay: DEFAULT_GAME_OVER_DELAY,
        }
    }
}
