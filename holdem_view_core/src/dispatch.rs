use crate::error::ParseError;
use crate::message::{parse_player_names, Envelope, GameResult, InputPrompt, MessageKind};
use tracing::{debug, info, warn};

/// 每种消息对应一个处理方法。
/// 除了牌桌快照，其余方法都有默认实现，可以单独替换。
pub trait MessageHandler {
    /// 应用一份快照。返回 `Ok(true)` 表示这份快照结束了本局。
    fn on_state(&mut self, data: &str) -> Result<bool, ParseError>;

    fn on_error(&mut self, message: &str) {
        warn!("引擎返回错误: {}", message);
    }

    fn on_input(&mut self, prompt: InputPrompt) {
        debug!("收到输入提示: {:?}", prompt);
    }

    fn on_status(&mut self, text: &str) {
        info!("状态: {}", text);
    }

    fn on_players(&mut self, names: Vec<String>) {
        debug!("玩家列表: {:?}", names);
    }

    fn on_start(&mut self, text: &str) {
        info!("新的一局开始: {}", text);
    }

    fn on_end(&mut self, result: GameResult) {
        info!("本局结束: {:?}", result);
    }

    fn on_unknown(&mut self, kind: &str, _data: &str) {
        warn!("未知消息类型: {}", kind);
    }
}

/// 一条信封的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Handled,
    /// 本条消息使牌局进入结束状态（只会出现一次）
    Terminal,
    /// 被忽略：牌局已结束后的快照、重复的结束消息或入站的 `action`
    Ignored,
    /// 快照解析失败，状态未改变
    Rejected,
    Unknown,
}

/// 按消息类型路由到处理器，并记住牌局是否已经结束。
#[derive(Debug, Default)]
pub struct Dispatcher {
    finished: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 会话重置后才会重新接受快照
    pub fn reset(&mut self) {
        self.finished = false;
    }

    pub fn dispatch<H: MessageHandler>(&mut self, envelope: &Envelope, handler: &mut H) -> Dispatched {
        let data = envelope.data.as_str();
        match &envelope.kind {
            MessageKind::State => {
                if self.finished {
                    debug!("牌局已结束，忽略新的快照");
                    return Dispatched::Ignored;
                }
                match handler.on_state(data) {
                    Ok(true) => self.finish(),
                    Ok(false) => Dispatched::Handled,
                    Err(e) => {
                        warn!("解析快照失败: {}", e);
                        Dispatched::Rejected
                    }
                }
            }
            MessageKind::End => {
                if self.finished {
                    debug!("牌局已结束，忽略重复的结束消息");
                    return Dispatched::Ignored;
                }
                // 旧版本引擎只发一句文本，同样结束本局
                let result = GameResult::parse(data).unwrap_or_else(|e| {
                    debug!("{}，按文本处理", e);
                    GameResult { winner: None, rank: data.to_string() }
                });
                handler.on_end(result);
                self.finish()
            }
            MessageKind::Error => {
                handler.on_error(data);
                Dispatched::Handled
            }
            MessageKind::Input => {
                handler.on_input(InputPrompt::parse(data));
                Dispatched::Handled
            }
            MessageKind::Status => {
                handler.on_status(data);
                Dispatched::Handled
            }
            MessageKind::Players => {
                handler.on_players(parse_player_names(data));
                Dispatched::Handled
            }
            MessageKind::Start => {
                handler.on_start(data);
                Dispatched::Handled
            }
            MessageKind::Action => {
                debug!("忽略入站的 action 消息");
                Dispatched::Ignored
            }
            MessageKind::Unknown(kind) => {
                handler.on_unknown(kind, data);
                Dispatched::Unknown
            }
        }
    }

    fn finish(&mut self) -> Dispatched {
        self.finished = true;
        Dispatched::Terminal
    }
}
