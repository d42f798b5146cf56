use holdem_view_core::{
    GameResult, InputPrompt, Notice, RedirectReason, TableState, ViewSink, UNKNOWN_CARD,
};
use std::io::Write;

/// 把牌桌打印到终端的简易渲染层
#[derive(Debug, Default)]
pub struct ConsoleView {
    redirected: Option<RedirectReason>,
}

impl ConsoleView {
    pub fn new() -> Self {
        ConsoleView::default()
    }

    pub fn redirected(&self) -> Option<RedirectReason> {
        self.redirected
    }
}

impl ViewSink for ConsoleView {
    fn render(&mut self, table: &TableState, seat: Option<usize>) {
        println!("\n{}", format_table(table, seat));
        prompt_marker();
    }

    fn notice(&mut self, notice: Notice) {
        println!("\n{}", format_notice(&notice));
        prompt_marker();
    }

    fn redirect(&mut self, reason: RedirectReason) {
        self.redirected = Some(reason);
        println!("\n正在返回大厅 ({})", format_reason(reason));
    }

    fn prompt(&mut self, prompt: &InputPrompt) {
        match prompt {
            InputPrompt::Actions(actions) => {
                let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                println!("\n可用动作: {}", names.join(" / "));
            }
            InputPrompt::Text(text) => println!("\n{}", text),
        }
        prompt_marker();
    }

    fn players(&mut self, names: &[String]) {
        println!("\n玩家: {}", names.join(", "));
        prompt_marker();
    }

    fn game_over(&mut self, result: &GameResult) {
        match result.winner {
            Some(idx) => println!("\n牌局结束，获胜座位 {} ({})", idx, result.rank),
            None if result.rank.is_empty() => println!("\n牌局结束，没有获胜者"),
            None => println!("\n牌局结束: {}", result.rank),
        }
    }

    fn countdown(&mut self, remaining_secs: u64) {
        println!("{} 秒后返回大厅", remaining_secs);
    }
}

fn prompt_marker() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub fn format_table(table: &TableState, seat: Option<usize>) -> String {
    let board: Vec<String> = table
        .community_cards
        .iter()
        .map(|c| if c == UNKNOWN_CARD { "[  ]".to_string() } else { format!("[{c}]") })
        .collect();

    let mut lines = vec![
        format!("--- {:?} | 底池 {} | 当前下注 {} ---", table.round, table.pot, table.active_bet),
        format!("公共牌: {}", board.join(" ")),
    ];
    for (idx, player) in table.players.iter().enumerate() {
        let marker = if table.current_player == Some(idx) { ">" } else { " " };
        let mut line = format!(
            "{marker} {idx} {:<10} 筹码 {:<6} 下注 {:<6} {}",
            player.name, player.assets, player.bet, player.action
        );
        if !player.active {
            line.push_str(" (离场)");
        }
        if !player.hole_cards.is_empty() {
            line.push_str(&format!(" [{}]", player.hole_cards.join(" ")));
        }
        if seat == Some(idx) {
            line.push_str(" <- 我");
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn format_notice(notice: &Notice) -> String {
    match notice {
        Notice::Connecting(url) => format!("正在连接到: {url}"),
        Notice::Connected => "连接成功!".to_string(),
        Notice::Status(text) => format!("状态: {text}"),
        Notice::EngineError(text) => format!("错误: {text}"),
        Notice::HandStarted(text) if text.is_empty() => "新的一局开始".to_string(),
        Notice::HandStarted(text) => format!("新的一局开始: {text}"),
        Notice::UnknownMessage(kind) => format!("收到未知消息 ({kind})，已忽略"),
        Notice::TransportError(text) => format!("连接出错: {text}"),
        Notice::RedirectScheduled(delay) => format!("{} 秒后返回大厅", delay.as_secs()),
        Notice::Closed => "连接已关闭。".to_string(),
    }
}

fn format_reason(reason: RedirectReason) -> &'static str {
    match reason {
        RedirectReason::MissingSession => "没有进行中的牌局",
        RedirectReason::InvalidSession => "会话标识无效",
        RedirectReason::TransportError => "连接中断",
        RedirectReason::GameOver => "牌局已结束",
    }
}
