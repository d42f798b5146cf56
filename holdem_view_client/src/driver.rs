use crate::transport::{TransportEvent, WsTransport};
use holdem_view_core::{ActionKind, ConnectionManager, ManagerConfig, SessionStore, ViewSink};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// 用户发出的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act { kind: ActionKind, amount: Option<u32> },
    Quit,
}

/// 牌局结束倒计时的刷新间隔
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// 驱动一个牌桌视图，直到连接关闭且没有待执行的跳转。
///
/// 连接事件、用户指令和定时器都在这一个循环里串行处理，
/// 连接管理器不会被并发访问。返回结束时的管理器，方便调用方查看最终状态。
pub async fn run<S, V>(
    config: ManagerConfig,
    store: S,
    view: V,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> ConnectionManager<WsTransport, S, V>
where
    S: SessionStore,
    V: ViewSink,
{
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut manager = ConnectionManager::new(config, WsTransport::new(events_tx), store, view);
    manager.connect(Instant::now());

    let mut ticker = tokio::time::interval(COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut commands_open = true;

    while !manager.is_done() {
        let deadline = manager.next_deadline();
        tokio::select! {
            Some(event) = events.recv() => handle_event(&mut manager, event),
            cmd = commands.recv(), if commands_open => match cmd {
                Some(Command::Act { kind, amount }) => {
                    if let Err(e) = manager.send_action(kind, amount) {
                        warn!("动作未发送: {}", e);
                    }
                }
                Some(Command::Quit) => {
                    info!("正在断开连接...");
                    manager.teardown();
                }
                None => {
                    // 输入端已关闭，继续观战直到连接结束
                    commands_open = false;
                }
            },
            _ = sleep_until(deadline) => manager.on_tick(Instant::now()),
            _ = ticker.tick() => manager.on_tick(Instant::now()),
        }
    }

    manager
}

fn handle_event<S, V>(manager: &mut ConnectionManager<WsTransport, S, V>, event: TransportEvent)
where
    S: SessionStore,
    V: ViewSink,
{
    let now = Instant::now();
    match event {
        TransportEvent::Opened => manager.on_open(),
        TransportEvent::Message(text) => manager.on_message(&text, now),
        TransportEvent::Error(e) => manager.on_error(e, now),
        TransportEvent::Closed => manager.on_close(),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
