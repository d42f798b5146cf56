use std::io::BufRead;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use holdem_view_client::cli::Cli;
use holdem_view_client::command::{parse_command, HELP};
use holdem_view_client::console::ConsoleView;
use holdem_view_client::driver::{self, Command};
use holdem_view_client::ClientError;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // 日志输出到 stderr，stdout 留给牌桌
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.manager_config()?;
    let store = cli.session_store();

    println!("--- 德州扑克客户端 ---");
    println!("{HELP}");

    // 终端输入在独立线程中阻塞读取，不占用运行时
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_commands(tx));

    let manager = driver::run(config, store, ConsoleView::new(), rx).await;
    if manager.view().redirected().is_none() {
        println!("已退出");
    }
    Ok(())
}

fn read_commands(tx: mpsc::UnboundedSender<Command>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if tx.send(command).is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                println!("{e}");
                println!("{HELP}");
            }
        }
    }
}
