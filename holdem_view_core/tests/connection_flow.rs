use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use holdem_view_core::*;
use serde_json::json;
use url::Url;

const SESSION: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

// --- 测试替身 ---

#[derive(Default)]
struct Wire {
    opened: Vec<String>,
    sent: Vec<String>,
    closed: usize,
    refuse: bool,
}

type SharedWire = Rc<RefCell<Wire>>;

struct FakeTransport(SharedWire);

struct FakeSocket(SharedWire);

impl SocketHandle for FakeSocket {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.0.borrow_mut().sent.push(text);
        Ok(())
    }

    fn close(self) {
        self.0.borrow_mut().closed += 1;
    }
}

impl Transport for FakeTransport {
    type Socket = FakeSocket;

    fn open(&mut self, url: &Url) -> Result<FakeSocket, TransportError> {
        let mut wire = self.0.borrow_mut();
        if wire.refuse {
            return Err(TransportError::Open("connection refused".to_string()));
        }
        wire.opened.push(url.to_string());
        Ok(FakeSocket(self.0.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Render { pot: u32, seat: Option<usize> },
    Notice(Notice),
    Redirect(RedirectReason),
    Prompt(InputPrompt),
    Players(Vec<String>),
    GameOver(GameResult),
    Countdown(u64),
}

#[derive(Default)]
struct Recorder {
    seen: Vec<Seen>,
}

impl Recorder {
    fn renders(&self) -> Vec<(u32, Option<usize>)> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Render { pot, seat } => Some((*pot, *seat)),
                _ => None,
            })
            .collect()
    }

    fn redirects(&self) -> Vec<RedirectReason> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Redirect(reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: &Seen) -> usize {
        self.seen.iter().filter(|s| *s == wanted).count()
    }
}

impl ViewSink for Recorder {
    fn render(&mut self, table: &TableState, seat: Option<usize>) {
        self.seen.push(Seen::Render { pot: table.pot, seat });
    }

    fn notice(&mut self, notice: Notice) {
        self.seen.push(Seen::Notice(notice));
    }

    fn redirect(&mut self, reason: RedirectReason) {
        self.seen.push(Seen::Redirect(reason));
    }

    fn prompt(&mut self, prompt: &InputPrompt) {
        self.seen.push(Seen::Prompt(prompt.clone()));
    }

    fn players(&mut self, names: &[String]) {
        self.seen.push(Seen::Players(names.to_vec()));
    }

    fn game_over(&mut self, result: &GameResult) {
        self.seen.push(Seen::GameOver(result.clone()));
    }

    fn countdown(&mut self, remaining_secs: u64) {
        self.seen.push(Seen::Countdown(remaining_secs));
    }
}

type Manager = ConnectionManager<FakeTransport, MemorySessionStore, Recorder>;

fn manager_with(store: MemorySessionStore) -> (Manager, SharedWire) {
    let wire = SharedWire::default();
    let config = ManagerConfig::new("http://localhost:8080").unwrap();
    let manager = ConnectionManager::new(config, FakeTransport(wire.clone()), store, Recorder::default());
    (manager, wire)
}

fn connected() -> (Manager, SharedWire, Instant) {
    let (mut manager, wire) = manager_with(MemorySessionStore::new(SESSION));
    let now = Instant::now();
    manager.connect(now);
    manager.on_open();
    (manager, wire, now)
}

fn state(pot: u32, holes: [&[&str]; 3], game_over: bool, winner: &str) -> String {
    let players: Vec<_> = ["alice", "bob", "carol"]
        .iter()
        .zip(holes)
        .map(|(name, cards)| {
            json!({"Name": name, "Active": true, "Action": "none", "Assets": 100, "Bet": 0, "HoleCards": cards})
        })
        .collect();
    let snapshot = json!({
        "ActiveBet": 0, "Pot": pot, "Round": "flop", "CurrentPlayer": 0,
        "CommunityCards": ["Ah", "Ks", "Qs"], "Players": players,
        "GameOver": game_over, "BestHand": null, "BestRank": "Pair", "GameWinner": winner
    });
    Envelope::new(MessageKind::State, snapshot.to_string()).encode()
}

fn live(pot: u32) -> String {
    state(pot, [&[], &[], &["Ah", "Ks"]], false, "")
}

// --- 连接生命周期 ---

#[test]
fn missing_session_redirects_immediately_without_a_socket() {
    let (mut manager, wire) = manager_with(MemorySessionStore::empty());
    manager.connect(Instant::now());

    assert_eq!(manager.status(), ConnStatus::Closed);
    assert_eq!(manager.view().redirects(), vec![RedirectReason::MissingSession]);
    assert!(wire.borrow().opened.is_empty());
    assert!(manager.is_done());
}

#[test]
fn invalid_session_is_cleared_and_redirects() {
    let (mut manager, wire) = manager_with(MemorySessionStore::new("../../etc"));
    manager.connect(Instant::now());

    assert_eq!(manager.status(), ConnStatus::Closed);
    assert_eq!(manager.view().redirects(), vec![RedirectReason::InvalidSession]);
    assert_eq!(manager.store().clear_count(), 1);
    assert!(wire.borrow().opened.is_empty());
}

#[test]
fn connect_opens_the_table_endpoint_once() {
    let (mut manager, wire) = manager_with(MemorySessionStore::new(SESSION.to_uppercase()));
    let now = Instant::now();
    manager.connect(now);
    assert_eq!(manager.status(), ConnStatus::Connecting);

    // 连接中与已连接时重复调用都不会新建连接
    manager.connect(now);
    manager.on_open();
    manager.connect(now);

    assert_eq!(manager.status(), ConnStatus::Connected);
    assert_eq!(wire.borrow().opened, vec![format!("ws://localhost:8080/api/game/id/{SESSION}")]);
    assert_eq!(manager.session().map(SessionId::as_str), Some(SESSION));
    assert_eq!(manager.view().count(&Seen::Notice(Notice::Connected)), 1);
}

#[test]
fn refused_open_goes_straight_to_erroring() {
    let (mut manager, wire) = manager_with(MemorySessionStore::new(SESSION));
    wire.borrow_mut().refuse = true;
    let now = Instant::now();
    manager.connect(now);

    assert_eq!(manager.status(), ConnStatus::Erroring);
    assert_eq!(manager.pending_redirect(), Some(RedirectReason::TransportError));
    assert_eq!(manager.next_deadline(), Some(now + Duration::from_secs(5)));
}

// --- 入站消息 ---

#[test]
fn snapshots_are_applied_and_rendered() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&live(30), now);

    assert_eq!(manager.view().renders(), vec![(30, Some(2))]);
    assert_eq!(manager.table().community_cards, vec!["Ah", "Ks", "Qs", "", ""]);
    assert_eq!(manager.local_seat(), Some(2));
}

#[test]
fn identical_redelivery_is_dropped() {
    let (mut manager, _wire, now) = connected();
    let raw = live(30);
    manager.on_message(&raw, now);
    manager.on_message(&raw, now);
    manager.on_message(&live(40), now);

    assert_eq!(manager.view().renders(), vec![(30, Some(2)), (40, Some(2))]);
}

#[test]
fn batched_frames_are_processed_in_order() {
    let (mut manager, _wire, now) = connected();
    let status = Envelope::new(MessageKind::Status, "waiting").encode();
    let frame = format!("{status}\n{}\n{}", live(10), live(20));
    manager.on_message(&frame, now);

    let seen = &manager.view().seen;
    let tail: Vec<_> = seen[seen.len() - 3..].to_vec();
    assert_eq!(
        tail,
        vec![
            Seen::Notice(Notice::Status("waiting".to_string())),
            Seen::Render { pot: 10, seat: Some(2) },
            Seen::Render { pot: 20, seat: Some(2) },
        ]
    );
}

#[test]
fn malformed_messages_leave_the_table_unchanged() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&live(30), now);
    let before = manager.table().clone();

    manager.on_message("{not json", now);
    manager.on_message(&Envelope::new(MessageKind::State, r#"{"Pot":"lots"}"#).encode(), now);
    manager.on_message(&Envelope::new(MessageKind::End, "nobody").encode(), now);

    assert_eq!(manager.table(), &before);
    assert_eq!(manager.view().renders().len(), 1);
    assert!(!manager.is_game_over());
}

#[test]
fn other_kinds_reach_the_view() {
    let (mut manager, _wire, now) = connected();
    let frame = [
        Envelope::new(MessageKind::Input, "fold:call:raise"),
        Envelope::new(MessageKind::Players, "alice:bob"),
        Envelope::new(MessageKind::Error, "Wrong turn"),
        Envelope::new(MessageKind::Unknown("chat".into()), "hello"),
        Envelope::new(MessageKind::Start, "hand 2"),
    ]
    .iter()
    .map(Envelope::encode)
    .collect::<Vec<_>>()
    .join("\n");
    manager.on_message(&frame, now);

    let view = manager.view();
    assert_eq!(
        view.count(&Seen::Prompt(InputPrompt::Actions(vec![
            ActionKind::Fold,
            ActionKind::Call,
            ActionKind::Raise
        ]))),
        1
    );
    assert_eq!(view.count(&Seen::Players(vec!["alice".into(), "bob".into()])), 1);
    assert_eq!(view.count(&Seen::Notice(Notice::EngineError("Wrong turn".into()))), 1);
    assert_eq!(view.count(&Seen::Notice(Notice::UnknownMessage("chat".into()))), 1);
    assert_eq!(view.count(&Seen::Notice(Notice::HandStarted("hand 2".into()))), 1);
    assert_eq!(manager.status(), ConnStatus::Connected);
}

// --- 牌局结束 ---

#[test]
fn game_over_latches_and_counts_down_to_one_redirect() {
    let (mut manager, wire, now) = connected();
    manager.on_message(&live(30), now);
    manager.on_message(&state(60, [&["2c", "2d"], &["7h", "8h"], &["Ah", "Ks"]], true, "carol"), now);

    assert!(manager.is_game_over());
    // 结束时所有底牌公开，座位沿用之前的
    assert_eq!(manager.local_seat(), Some(2));
    assert_eq!(
        manager.view().count(&Seen::GameOver(GameResult { winner: Some(2), rank: "Pair".into() })),
        1
    );
    assert_eq!(manager.view().count(&Seen::Countdown(10)), 1);

    // 迟到的快照被忽略
    manager.on_message(&live(90), now);
    assert_eq!(manager.view().renders(), vec![(30, Some(2)), (60, Some(2))]);

    manager.on_tick(now + Duration::from_millis(2500));
    assert_eq!(manager.view().count(&Seen::Countdown(8)), 1);
    manager.on_tick(now + Duration::from_millis(2600));
    assert_eq!(manager.view().count(&Seen::Countdown(8)), 1);

    manager.on_tick(now + Duration::from_secs(10));
    manager.on_tick(now + Duration::from_secs(11));
    assert_eq!(manager.view().redirects(), vec![RedirectReason::GameOver]);
    assert_eq!(manager.store().clear_count(), 1);
    assert_eq!(wire.borrow().closed, 1);
    assert!(manager.is_done());
}

#[test]
fn end_message_finishes_the_game() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&Envelope::new(MessageKind::End, "1:Straight").encode(), now);

    assert!(manager.is_game_over());
    assert_eq!(manager.pending_redirect(), Some(RedirectReason::GameOver));
    manager.on_message(&live(30), now);
    assert!(manager.view().renders().is_empty());
}

#[test]
fn plain_text_end_also_finishes_the_game() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&live(30), now);
    manager.on_message(&Envelope::new(MessageKind::End, "Game over").encode(), now);

    assert!(manager.is_game_over());
    assert_eq!(manager.pending_redirect(), Some(RedirectReason::GameOver));
    assert_eq!(
        manager.view().count(&Seen::GameOver(GameResult { winner: None, rank: "Game over".into() })),
        1
    );

    manager.on_message(&live(77), now);
    assert_eq!(manager.view().renders(), vec![(30, Some(2))]);
}

#[test]
fn spectator_keeps_no_seat_when_hands_are_revealed() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&state(30, [&[], &[], &[]], false, ""), now);
    assert_eq!(manager.local_seat(), None);

    manager.on_message(&state(60, [&["2c", "2d"], &["7h", "8h"], &["Ah", "Ks"]], true, "carol"), now);
    assert!(manager.is_game_over());
    assert_eq!(manager.local_seat(), None);
    assert_eq!(manager.view().renders(), vec![(30, None), (60, None)]);
}

#[test]
fn transport_error_during_countdown_redirects_at_the_earlier_deadline() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&Envelope::new(MessageKind::End, "1:Flush").encode(), now);
    manager.on_error(TransportError::Socket("reset by peer".into()), now + Duration::from_secs(1));

    assert_eq!(manager.pending_redirect(), Some(RedirectReason::TransportError));
    manager.on_tick(now + Duration::from_millis(5999));
    assert!(manager.view().redirects().is_empty());

    manager.on_tick(now + Duration::from_secs(6));
    manager.on_tick(now + Duration::from_secs(10));
    assert_eq!(manager.view().redirects(), vec![RedirectReason::TransportError]);
    assert_eq!(manager.store().clear_count(), 1);
    assert!(manager.is_done());
}

#[test]
fn reset_accepts_snapshots_again() {
    let (mut manager, _wire, now) = connected();
    manager.on_message(&state(60, [&[], &[], &["Ah", "Ks"]], true, "carol"), now);
    manager.reset();

    assert_eq!(manager.status(), ConnStatus::Idle);
    assert!(!manager.is_game_over());
    assert_eq!(manager.pending_redirect(), None);

    manager.connect(now);
    manager.on_open();
    manager.on_message(&live(5), now);
    assert_eq!(manager.table().pot, 5);
}

// --- 传输层错误与关闭 ---

#[test]
fn repeated_errors_produce_a_single_delayed_redirect() {
    let (mut manager, wire, now) = connected();
    manager.on_error(TransportError::Socket("reset by peer".into()), now);
    manager.on_error(TransportError::Socket("reset by peer".into()), now + Duration::from_secs(1));
    manager.on_close();
    manager.on_error(TransportError::Socket("again".into()), now + Duration::from_secs(2));

    assert_eq!(manager.status(), ConnStatus::Erroring);
    assert_eq!(manager.session(), None);
    assert_eq!(manager.view().count(&Seen::Notice(Notice::RedirectScheduled(Duration::from_secs(5)))), 1);

    manager.on_tick(now + Duration::from_millis(4999));
    assert!(manager.view().redirects().is_empty());
    assert_eq!(manager.store().clear_count(), 0);

    manager.on_tick(now + Duration::from_secs(5));
    manager.on_tick(now + Duration::from_secs(6));
    assert_eq!(manager.view().redirects(), vec![RedirectReason::TransportError]);
    assert_eq!(manager.store().clear_count(), 1);
    assert_eq!(wire.borrow().closed, 1);
    assert_eq!(manager.status(), ConnStatus::Closed);
}

#[test]
fn teardown_cancels_the_pending_redirect() {
    let (mut manager, _wire, now) = connected();
    manager.on_error(TransportError::Socket("boom".into()), now);
    manager.teardown();
    manager.on_tick(now + Duration::from_secs(30));

    assert!(manager.view().redirects().is_empty());
    assert_eq!(manager.store().clear_count(), 0);
    assert!(manager.is_done());
}

#[test]
fn closing_notifies_once() {
    let (mut manager, wire, now) = connected();
    manager.on_message(&live(30), now);
    manager.on_close();
    manager.teardown();
    manager.teardown();

    assert_eq!(manager.status(), ConnStatus::Closed);
    assert_eq!(manager.view().count(&Seen::Notice(Notice::Closed)), 1);
    // 对端已关闭的连接不会再次关闭
    assert_eq!(wire.borrow().closed, 0);

    manager.on_message(&live(40), now);
    assert_eq!(manager.view().renders().len(), 1);
}

#[test]
fn teardown_closes_the_live_socket() {
    let (mut manager, wire, _now) = connected();
    manager.teardown();

    assert_eq!(wire.borrow().closed, 1);
    assert_eq!(manager.view().count(&Seen::Notice(Notice::Closed)), 1);
}

// --- 出站动作 ---

#[test]
fn actions_are_encoded_onto_the_socket() {
    let (mut manager, wire, _now) = connected();
    manager.send_action(ActionKind::Raise, Some(50)).unwrap();
    manager.send_action(ActionKind::Check, None).unwrap();

    assert_eq!(
        wire.borrow().sent,
        vec![
            r#"{"type":"action","data":"{\"type\":\"raise\",\"data\":\"50\"}"}"#.to_string(),
            r#"{"type":"action","data":"{\"type\":\"check\",\"data\":\"\"}"}"#.to_string(),
        ]
    );
}

#[test]
fn invalid_actions_are_not_sent() {
    let (mut manager, wire, _now) = connected();
    assert_eq!(manager.send_action(ActionKind::Raise, None), Err(ActionError::MissingAmount));

    manager.teardown();
    assert_eq!(
        manager.send_action(ActionKind::Fold, None),
        Err(ActionError::Transport(TransportError::NotConnected))
    );
    assert!(wire.borrow().sent.is_empty());
}
