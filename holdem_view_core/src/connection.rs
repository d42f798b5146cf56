use crate::action::encode_action;
use crate::config::ManagerConfig;
use crate::dedup::DedupFilter;
use crate::dispatch::{Dispatched, Dispatcher, MessageHandler};
use crate::error::{ActionError, ParseError, TransportError};
use crate::message::{split_batch, Envelope, GameResult, InputPrompt};
use crate::reducer;
use crate::session::{SessionId, SessionStore};
use crate::state::{ActionKind, TableState};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

// --- 宿主需要实现的接口 ---

/// 一条已经发起的连接。关闭即取消，不需要额外的取消令牌。
pub trait SocketHandle {
    fn send(&mut self, text: String) -> Result<(), TransportError>;
    fn close(self);
}

/// 建立连接的传输层。
/// `open` 只负责发起连接，连接结果通过 `on_open` / `on_error` 回调回来。
pub trait Transport {
    type Socket: SocketHandle;

    fn open(&mut self, url: &Url) -> Result<Self::Socket, TransportError>;
}

/// 渲染层（不在本库范围内）接收状态与提示的接口
pub trait ViewSink {
    /// 新的牌桌状态，`seat` 为本地玩家的座位
    fn render(&mut self, table: &TableState, seat: Option<usize>);
    fn notice(&mut self, notice: Notice);
    /// 跳转回大厅
    fn redirect(&mut self, reason: RedirectReason);

    fn prompt(&mut self, _prompt: &InputPrompt) {}
    fn players(&mut self, _names: &[String]) {}
    fn game_over(&mut self, _result: &GameResult) {}
    /// 牌局结束后距离跳转的剩余秒数
    fn countdown(&mut self, _remaining_secs: u64) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    Idle,
    Connecting,
    Connected,
    Erroring,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingSession,
    InvalidSession,
    TransportError,
    GameOver,
}

/// 显示给用户的一行状态提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connecting(String),
    Connected,
    Status(String),
    /// 引擎拒绝了动作等
    EngineError(String),
    HandStarted(String),
    UnknownMessage(String),
    TransportError(String),
    RedirectScheduled(Duration),
    /// 连接已关闭（每个连接只提示一次）
    Closed,
}

// --- 牌桌状态同步 ---

/// 把分发后的消息应用到牌桌状态，并转发给渲染层
struct TableSync<V> {
    table: TableState,
    seat: Option<usize>,
    // 是否已经从进行中的快照确定过座位（观战时座位为 None）
    seat_known: bool,
    view: V,
}

impl<V: ViewSink> MessageHandler for TableSync<V> {
    fn on_state(&mut self, data: &str) -> Result<bool, ParseError> {
        let next = reducer::apply(&self.table, data)?;
        // 结束时引擎会公开所有人的底牌，沿用进行中得到的座位
        if !next.game_over {
            self.seat = next.my_seat();
            self.seat_known = true;
        } else if !self.seat_known {
            self.seat = next.my_seat();
        }
        self.table = next;
        self.view.render(&self.table, self.seat);

        if self.table.game_over {
            let result = GameResult {
                winner: self.table.winner_index(),
                rank: self.table.best_rank.clone(),
            };
            info!("牌局结束，获胜者: {}", self.table.game_winner);
            self.view.game_over(&result);
        }
        Ok(self.table.game_over)
    }

    fn on_error(&mut self, message: &str) {
        warn!("引擎返回错误: {}", message);
        self.view.notice(Notice::EngineError(message.to_string()));
    }

    fn on_input(&mut self, prompt: InputPrompt) {
        self.view.prompt(&prompt);
    }

    fn on_status(&mut self, text: &str) {
        self.view.notice(Notice::Status(text.to_string()));
    }

    fn on_players(&mut self, names: Vec<String>) {
        self.view.players(&names);
    }

    fn on_start(&mut self, text: &str) {
        info!("新的一局开始");
        self.view.notice(Notice::HandStarted(text.to_string()));
    }

    fn on_end(&mut self, result: GameResult) {
        info!("牌局结束: {:?}", result);
        self.view.game_over(&result);
    }

    fn on_unknown(&mut self, kind: &str, _data: &str) {
        warn!("未知消息类型: {}", kind);
        self.view.notice(Notice::UnknownMessage(kind.to_string()));
    }
}

#[derive(Debug)]
struct PendingRedirect {
    reason: RedirectReason,
    due: Instant,
    announced: Option<u64>,
}

// --- 连接管理 ---

/// 一个牌桌视图独占的连接管理器。
///
/// 所有入口（`connect`、传输层回调、用户动作、定时器 `on_tick`）都在同一个线程上
/// 同步执行完毕，入站消息按到达顺序逐条处理：拆分 -> 去重 -> 解码 -> 分发。
/// 时间由调用方传入，便于测试。
pub struct ConnectionManager<T: Transport, S: SessionStore, V: ViewSink> {
    config: ManagerConfig,
    transport: T,
    store: S,
    session: Option<SessionId>,
    socket: Option<T::Socket>,
    status: ConnStatus,
    dedup: DedupFilter,
    dispatcher: Dispatcher,
    sync: TableSync<V>,
    redirect: Option<PendingRedirect>,
    closed_notified: bool,
}

impl<T: Transport, S: SessionStore, V: ViewSink> ConnectionManager<T, S, V> {
    pub fn new(config: ManagerConfig, transport: T, store: S, view: V) -> Self {
        let dedup = DedupFilter::new(config.dedup);
        ConnectionManager {
            config,
            transport,
            store,
            session: None,
            socket: None,
            status: ConnStatus::Idle,
            dedup,
            dispatcher: Dispatcher::new(),
            sync: TableSync { table: TableState::default(), seat: None, seat_known: false, view },
            redirect: None,
            closed_notified: false,
        }
    }

    /// 读取会话标识并发起连接。
    /// 已经在连接中或已连接时什么也不做，保证最多只有一条连接。
    pub fn connect(&mut self, now: Instant) {
        match self.status {
            ConnStatus::Idle => {}
            ConnStatus::Connecting | ConnStatus::Connected => {
                debug!("已有连接，忽略重复的连接请求");
                return;
            }
            ConnStatus::Erroring | ConnStatus::Closed => {
                warn!("连接已结束，需要重新加载牌桌");
                return;
            }
        }

        let Some(raw) = self.store.load() else {
            warn!("没有找到会话标识");
            return self.abandon(RedirectReason::MissingSession);
        };
        let Some(session) = SessionId::parse(&raw) else {
            warn!("无效的会话标识: {:?}", raw);
            self.store.clear();
            return self.abandon(RedirectReason::InvalidSession);
        };
        let url = match self.config.endpoint(&session) {
            Ok(url) => url,
            Err(e) => {
                warn!("[{}] 无法生成连接地址: {}", session.short(), e);
                self.store.clear();
                return self.abandon(RedirectReason::InvalidSession);
            }
        };

        info!("[{}] 正在连接到: {}", session.short(), url);
        self.sync.view.notice(Notice::Connecting(url.to_string()));
        self.session = Some(session);
        self.status = ConnStatus::Connecting;
        match self.transport.open(&url) {
            Ok(socket) => self.socket = Some(socket),
            Err(e) => self.on_error(e, now),
        }
    }

    /// 传输层确认连接已建立
    pub fn on_open(&mut self) {
        if self.status != ConnStatus::Connecting {
            debug!("忽略状态 {:?} 下的连接确认", self.status);
            return;
        }
        self.status = ConnStatus::Connected;
        if let Some(session) = &self.session {
            info!("[{}] 连接成功", session.short());
        }
        self.sync.view.notice(Notice::Connected);
    }

    /// 传输层收到一帧数据，可能包含多条以换行分隔的信封
    pub fn on_message(&mut self, raw: &str, now: Instant) {
        if !matches!(self.status, ConnStatus::Connecting | ConnStatus::Connected) {
            debug!("连接状态为 {:?}，丢弃消息", self.status);
            return;
        }
        for line in split_batch(raw) {
            self.handle_line(line, now);
        }
    }

    fn handle_line(&mut self, line: &str, now: Instant) {
        if !self.dedup.should_process(line) {
            debug!("忽略重复消息");
            return;
        }
        let envelope = match Envelope::decode(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("{}，原始消息: {}", e, line);
                return;
            }
        };
        if self.dispatcher.dispatch(&envelope, &mut self.sync) == Dispatched::Terminal {
            self.schedule_redirect(RedirectReason::GameOver, self.config.game_over_delay, now);
            self.on_tick(now);
        }
    }

    /// 传输层错误。会话失效并在固定延迟后跳转，不会自动重连。
    /// 同一窗口内的多次错误只生效一次。
    pub fn on_error(&mut self, error: TransportError, now: Instant) {
        if matches!(self.status, ConnStatus::Erroring | ConnStatus::Closed) {
            debug!("忽略重复的连接错误: {}", error);
            return;
        }
        warn!("连接出错: {}", error);
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.status = ConnStatus::Erroring;
        self.session = None;
        self.sync.view.notice(Notice::TransportError(error.to_string()));
        self.schedule_redirect(RedirectReason::TransportError, self.config.redirect_delay, now);
    }

    /// 对端关闭了连接
    pub fn on_close(&mut self) {
        // 对端已关闭，直接丢弃句柄
        self.socket = None;
        match self.status {
            ConnStatus::Erroring | ConnStatus::Closed => {}
            _ => {
                info!("连接已被关闭");
                self.status = ConnStatus::Closed;
                self.notify_closed();
            }
        }
    }

    /// 推进定时器：到期时执行一次跳转，牌局结束的倒计时在秒数变化时通知渲染层
    pub fn on_tick(&mut self, now: Instant) {
        let Some(pending) = self.redirect.as_mut() else {
            return;
        };
        if now >= pending.due {
            let reason = pending.reason;
            self.redirect = None;
            self.fire_redirect(reason);
            return;
        }
        if pending.reason == RedirectReason::GameOver {
            let remaining = (pending.due - now).as_secs_f64().ceil() as u64;
            if pending.announced != Some(remaining) {
                pending.announced = Some(remaining);
                self.sync.view.countdown(remaining);
            }
        }
    }

    /// 发送一个玩家动作
    pub fn send_action(&mut self, kind: ActionKind, amount: Option<u32>) -> Result<(), ActionError> {
        let envelope = encode_action(kind, amount)?;
        let socket = match (self.status, self.socket.as_mut()) {
            (ConnStatus::Connected, Some(socket)) => socket,
            _ => return Err(TransportError::NotConnected.into()),
        };
        socket.send(envelope.encode())?;
        debug!("已发送动作: {} {:?}", kind, amount);
        Ok(())
    }

    /// 视图卸载：关闭连接并取消待执行的跳转
    pub fn teardown(&mut self) {
        if let Some(pending) = self.redirect.take() {
            debug!("取消待执行的跳转: {:?}", pending.reason);
        }
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.status = ConnStatus::Closed;
        self.notify_closed();
    }

    /// 外部重置会话：清空牌桌、去重历史和结束标记，回到初始状态
    pub fn reset(&mut self) {
        self.teardown();
        self.status = ConnStatus::Idle;
        self.session = None;
        self.dedup.reset();
        self.dispatcher.reset();
        self.sync.table = TableState::default();
        self.sync.seat = None;
        self.sync.seat_known = false;
        self.closed_notified = false;
    }

    pub fn status(&self) -> ConnStatus {
        self.status
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn table(&self) -> &TableState {
        &self.sync.table
    }

    pub fn local_seat(&self) -> Option<usize> {
        self.sync.seat
    }

    pub fn is_game_over(&self) -> bool {
        self.dispatcher.is_finished()
    }

    pub fn pending_redirect(&self) -> Option<RedirectReason> {
        self.redirect.as_ref().map(|p| p.reason)
    }

    /// 下一次需要调用 `on_tick` 的时间
    pub fn next_deadline(&self) -> Option<Instant> {
        self.redirect.as_ref().map(|p| p.due)
    }

    /// 连接已关闭且没有待执行的跳转，宿主可以退出事件循环
    pub fn is_done(&self) -> bool {
        self.status == ConnStatus::Closed && self.redirect.is_none()
    }

    pub fn view(&self) -> &V {
        &self.sync.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.sync.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- 内部方法 ---

    /// 会话缺失或无效：不建立连接，立即跳转
    fn abandon(&mut self, reason: RedirectReason) {
        self.status = ConnStatus::Closed;
        self.session = None;
        self.sync.view.redirect(reason);
    }

    /// 同时只保留一个跳转，取较早到期的那个
    fn schedule_redirect(&mut self, reason: RedirectReason, delay: Duration, now: Instant) {
        let due = now + delay;
        if let Some(pending) = &self.redirect {
            if pending.due <= due {
                debug!("已有更早的跳转 {:?}，忽略 {:?}", pending.reason, reason);
                return;
            }
            debug!("跳转 {:?} 被更早的 {:?} 取代", pending.reason, reason);
        }
        info!("{} 秒后跳转 ({:?})", delay.as_secs(), reason);
        self.redirect = Some(PendingRedirect { reason, due, announced: None });
        if reason != RedirectReason::GameOver {
            self.sync.view.notice(Notice::RedirectScheduled(delay));
        }
    }

    fn fire_redirect(&mut self, reason: RedirectReason) {
        info!("执行跳转: {:?}", reason);
        let had_socket = match self.socket.take() {
            Some(socket) => {
                socket.close();
                true
            }
            None => false,
        };
        self.session = None;
        self.store.clear();
        self.status = ConnStatus::Closed;
        if had_socket {
            self.notify_closed();
        }
        self.sync.view.redirect(reason);
    }

    fn notify_closed(&mut self) {
        if !self.closed_notified {
            self.closed_notified = true;
            self.sync.view.notice(Notice::Closed);
        }
    }
}
