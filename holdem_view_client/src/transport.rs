use futures_util::{SinkExt, StreamExt};
use holdem_view_core::{SocketHandle, Transport, TransportError};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, warn};
use url::Url;

/// 连接任务回传给事件循环的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(TransportError),
    Closed,
}

/// 基于 tokio-tungstenite 的传输层。
/// 每条连接由一个独立任务负责读写，事件统一发到同一个通道里，
/// 由事件循环按顺序交给连接管理器。
pub struct WsTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl WsTransport {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        WsTransport { events }
    }
}

pub struct WsSocket {
    outbound: mpsc::UnboundedSender<String>,
}

impl Transport for WsTransport {
    type Socket = WsSocket;

    fn open(&mut self, url: &Url) -> Result<WsSocket, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(run_socket(url.clone(), rx, self.events.clone()));
        Ok(WsSocket { outbound: tx })
    }
}

impl SocketHandle for WsSocket {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Send("连接任务已退出".to_string()))
    }

    fn close(self) {
        // 发送端被丢弃后，连接任务会发出 Close 帧并退出
        drop(self.outbound);
    }
}

/// 处理单条 WebSocket 连接的生命周期
async fn run_socket(
    url: Url,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            let _ = events.send(TransportEvent::Error(TransportError::Open(e.to_string())));
            return;
        }
    };
    let _ = events.send(TransportEvent::Opened);

    let (mut write, mut read) = ws_stream.split();
    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        let _ = events.send(TransportEvent::Error(TransportError::Send(e.to_string())));
                        break;
                    }
                }
                None => {
                    debug!("本地关闭连接");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!("发送关闭帧失败: {}", e);
                    }
                    break;
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    let _ = events.send(TransportEvent::Closed);
                    break;
                }
                // ping/pong 由 tungstenite 自动处理，二进制帧不属于本协议
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("接收消息时出错: {}", e);
                    let _ = events.send(TransportEvent::Error(TransportError::Socket(e.to_string())));
                    break;
                }
            },
        }
    }
}
