//! Game session: view flow, round lifecycle and frame-loop ownership
//!
//! ```text
//! Name ──submit_name──▶ Countdown ──3s──▶ Game ──clicked red──▶ GameOver
//!                           ▲                                   │    │
//!                           └─────────────replay────────────────┘    │ show_leaderboard
//!                           └─────────────replay──────────── Leaderboard ◀┘
//!                                                   exit_to_name ──▶ Name
//! ```
//!
//! The session never touches the platform. Every mutator returns the
//! [`SessionEvent`]s it produced and the host carries out the side effects
//! (scheduling frames, playing sounds, calling the leaderboard backend).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::consts::*;
use crate::leaderboard::{EndReason, Leaderboard, ScoreSubmission, sanitize_name};
use crate::sim::{
    BoardGeometry, GameEvent, HitOutcome, Packet, RoundState, resolve_pointer, seed_packets, tick,
};

/// Screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum View {
    /// Player enters a name
    Name,
    /// Timed lead-in before a round
    Countdown { remaining_ms: f32 },
    /// Round in progress
    Game,
    /// Round ended; score submitted
    GameOver,
    /// Top-10 board
    Leaderboard,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Name => "name",
            View::Countdown { .. } => "countdown",
            View::Game => "game",
            View::GameOver => "gameover",
            View::Leaderboard => "leaderboard",
        }
    }

    /// Whole seconds left on the countdown, rounded up (0 outside countdown)
    pub fn countdown_secs(&self) -> u32 {
        match self {
            View::Countdown { remaining_ms } => (remaining_ms / 1000.0).ceil().max(0.0) as u32,
            _ => 0,
        }
    }
}

/// Identifies one frame-loop registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopId(pub u64);

/// Identifies one leaderboard request; stale tickets are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardTicket(pub u64);

/// Outcome of a finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub score: i64,
    pub reason: EndReason,
    /// Seconds played
    pub duration: f32,
}

/// Side effects requested by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ViewChanged(View),
    /// The host should drive `tick` from frame callbacks tagged with this id
    LoopStarted(LoopId),
    /// The host should stop the loop with this id
    LoopCancelled(LoopId),
    RoundStarted { round: u32, seed: u64 },
    Game(GameEvent),
    /// Persist `submission`, then fetch the board and hand it back with `ticket`
    RoundOver {
        submission: ScoreSubmission,
        ticket: LeaderboardTicket,
    },
    /// Fetch the board and hand it back with the ticket
    LeaderboardRequested(LeaderboardTicket),
}

/// One player's session
#[derive(Debug, Clone)]
pub struct GameSession {
    view: View,
    player_name: String,
    default_name: String,
    seed: u64,
    rounds_played: u32,
    round: RoundState,
    geometry: BoardGeometry,
    active_loop: Option<LoopId>,
    next_loop_id: u64,
    ticket: Option<LeaderboardTicket>,
    /// The round-over submit-then-fetch has not answered yet
    submit_pending: bool,
    next_ticket: u64,
    leaderboard: Leaderboard,
    last_result: Option<RoundResult>,
}

impl GameSession {
    /// Create a session on the name screen
    pub fn new(seed: u64) -> Self {
        Self {
            view: View::Name,
            player_name: String::new(),
            default_name: GameConfig::default().default_name,
            seed,
            rounds_played: 0,
            round: RoundState::new(seed),
            geometry: BoardGeometry::default(),
            active_loop: None,
            next_loop_id: 1,
            ticket: None,
            submit_pending: false,
            next_ticket: 1,
            leaderboard: Leaderboard::new(),
            last_result: None,
        }
    }

    pub fn from_config(config: &GameConfig, seed: u64) -> Self {
        let mut session = Self::new(config.seed.unwrap_or(seed));
        let name = sanitize_name(&config.default_name);
        if !name.is_empty() {
            session.default_name = name;
        }
        session
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Packet snapshot for rendering
    pub fn packets(&self) -> &[Packet] {
        &self.round.packets
    }

    /// Packets to draw: the live round, or its frozen final frame on game over
    pub fn visible_packets(&self) -> &[Packet] {
        match self.view {
            View::Game | View::GameOver => &self.round.packets,
            _ => &[],
        }
    }

    pub fn score(&self) -> i64 {
        self.round.score
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn active_loop(&self) -> Option<LoopId> {
        self.active_loop
    }

    /// Whether frame callbacks tagged with `id` should keep running
    pub fn is_loop_active(&self, id: LoopId) -> bool {
        self.active_loop == Some(id)
    }

    /// Track a board resize
    ///
    /// Packets left past a raised floor are dropped without scoring. An
    /// unplayable size keeps them so the round resumes intact.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.geometry.resize(width, height);
        if !self.geometry.is_playable() {
            return;
        }
        let floor = self.geometry.floor_top();
        let before = self.round.packets.len();
        self.round.packets.retain(|p| p.bottom() < floor);
        let culled = before - self.round.packets.len();
        if culled > 0 {
            log::debug!("Resize culled {} packets below the floor", culled);
        }
    }

    /// Name screen → countdown
    pub fn submit_name(&mut self, name: &str) -> Vec<SessionEvent> {
        if self.view != View::Name {
            return Vec::new();
        }
        let name = sanitize_name(name);
        self.player_name = if name.is_empty() {
            self.default_name.clone()
        } else {
            name
        };
        log::info!("Player: {}", self.player_name);
        self.begin_countdown()
    }

    /// Game over or leaderboard → countdown
    pub fn replay(&mut self) -> Vec<SessionEvent> {
        match self.view {
            View::GameOver | View::Leaderboard => self.begin_countdown(),
            _ => Vec::new(),
        }
    }

    /// Game over → leaderboard, refreshing the board
    ///
    /// While the round's score is still being submitted no refresh is
    /// requested: the submit-then-fetch result is the fresher board.
    pub fn show_leaderboard(&mut self) -> Vec<SessionEvent> {
        if self.view != View::GameOver {
            return Vec::new();
        }
        if self.submit_pending {
            return self.set_view(View::Leaderboard);
        }
        let ticket = self.issue_ticket();
        let mut events = self.set_view(View::Leaderboard);
        events.push(SessionEvent::LeaderboardRequested(ticket));
        events
    }

    /// Leaderboard → name screen
    pub fn exit_to_name(&mut self) -> Vec<SessionEvent> {
        if self.view != View::Leaderboard {
            return Vec::new();
        }
        let mut events = self.cancel_loop();
        self.ticket = None;
        self.submit_pending = false;
        events.extend(self.set_view(View::Name));
        events
    }

    /// Advance by `dt` seconds: runs the countdown, or the round while in game
    pub fn tick(&mut self, dt: f32) -> Vec<SessionEvent> {
        match self.view {
            View::Countdown { remaining_ms } => {
                let dt = if dt.is_finite() {
                    dt.clamp(0.0, MAX_FRAME_DT)
                } else {
                    0.0
                };
                let remaining_ms = remaining_ms - dt * 1000.0;
                if remaining_ms > 0.0 {
                    self.view = View::Countdown { remaining_ms };
                    Vec::new()
                } else {
                    self.begin_round()
                }
            }
            View::Game => tick(&mut self.round, &self.geometry, dt)
                .into_iter()
                .map(SessionEvent::Game)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Pointer press at board coordinates `(x, y)`; only acts during a round
    pub fn on_pointer_down(&mut self, x: f32, y: f32) -> Vec<SessionEvent> {
        if self.view != View::Game {
            return Vec::new();
        }

        let outcome = resolve_pointer(&mut self.round, Vec2::new(x, y));
        let mut events: Vec<SessionEvent> = outcome
            .event()
            .map(SessionEvent::Game)
            .into_iter()
            .collect();
        if let HitOutcome::Corrupted { .. } = outcome {
            events.extend(self.end_round(EndReason::ClickedRed));
        }
        events
    }

    /// Deliver a fetched board
    ///
    /// Returns false (and drops the board) when `ticket` is not the latest
    /// request or the player has left the result screens.
    pub fn apply_leaderboard(&mut self, ticket: LeaderboardTicket, board: Leaderboard) -> bool {
        let showing = matches!(self.view, View::GameOver | View::Leaderboard);
        if !showing || self.ticket != Some(ticket) {
            log::debug!("Dropping stale leaderboard response {:?}", ticket);
            return false;
        }
        self.leaderboard = board;
        self.submit_pending = false;
        true
    }

    fn set_view(&mut self, view: View) -> Vec<SessionEvent> {
        log::info!("View: {} -> {}", self.view.as_str(), view.as_str());
        self.view = view;
        vec![SessionEvent::ViewChanged(view)]
    }

    fn issue_ticket(&mut self) -> LeaderboardTicket {
        let ticket = LeaderboardTicket(self.next_ticket);
        self.next_ticket += 1;
        self.ticket = Some(ticket);
        ticket
    }

    fn start_loop(&mut self) -> Vec<SessionEvent> {
        // At most one loop: retire the old one before registering the new one
        let mut events = self.cancel_loop();
        let id = LoopId(self.next_loop_id);
        self.next_loop_id += 1;
        self.active_loop = Some(id);
        events.push(SessionEvent::LoopStarted(id));
        events
    }

    fn cancel_loop(&mut self) -> Vec<SessionEvent> {
        self.active_loop
            .take()
            .map(SessionEvent::LoopCancelled)
            .into_iter()
            .collect()
    }

    fn begin_countdown(&mut self) -> Vec<SessionEvent> {
        self.ticket = None;
        self.submit_pending = false;
        let mut events = self.set_view(View::Countdown {
            remaining_ms: COUNTDOWN_MS,
        });
        events.extend(self.start_loop());
        events
    }

    /// Reset the round, seed the opening packets and enter play
    fn begin_round(&mut self) -> Vec<SessionEvent> {
        self.rounds_played += 1;
        let seed = round_seed(self.seed, self.rounds_played);
        self.round.reset(seed);
        let seeded = seed_packets(&mut self.round, &self.geometry, INITIAL_PACKETS);
        log::info!(
            "Round {} started (seed {}, {} packets seeded)",
            self.rounds_played,
            seed,
            seeded
        );

        let mut events = self.set_view(View::Game);
        events.push(SessionEvent::RoundStarted {
            round: self.rounds_played,
            seed,
        });
        events
    }

    /// Game → game over; a no-op outside a round so it fires once per round
    fn end_round(&mut self, reason: EndReason) -> Vec<SessionEvent> {
        if self.view != View::Game {
            return Vec::new();
        }

        let mut events = self.cancel_loop();
        let result = RoundResult {
            score: self.round.score,
            reason,
            duration: self.round.elapsed,
        };
        log::info!(
            "Round {} over: score {} ({}) after {:.1}s",
            self.rounds_played,
            result.score,
            reason.as_str(),
            result.duration
        );

        let submission = ScoreSubmission::new(&self.player_name, result.score, reason);
        self.last_result = Some(result);
        events.extend(self.set_view(View::GameOver));
        let ticket = self.issue_ticket();
        self.submit_pending = true;
        events.push(SessionEvent::RoundOver { submission, ticket });
        events
    }
}

/// Per-round seed derived from the session seed
fn round_seed(session_seed: u64, round: u32) -> u64 {
    session_seed ^ u64::from(round).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use crate::sim::Sprite;

    const FRAME: f32 = 1.0 / 60.0;

    fn session() -> GameSession {
        let mut session = GameSession::new(12345);
        session.resize(480.0, 560.0);
        session
    }

    /// Name → countdown → game
    fn playing() -> GameSession {
        let mut session = session();
        session.submit_name("Ada");
        run_countdown(&mut session);
        assert_eq!(session.view(), View::Game);
        session
    }

    fn run_countdown(session: &mut GameSession) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while matches!(session.view(), View::Countdown { .. }) {
            events.extend(session.tick(0.1));
        }
        events
    }

    fn push_packet(session: &mut GameSession, lane: usize, y: f32, valid: bool) -> Packet {
        let id = session.round.next_entity_id();
        let packet = Packet {
            id,
            lane,
            x: session.geometry.lane_x(lane),
            y,
            size: PACKET_SIZE,
            valid,
            sprite: valid.then_some(Sprite::Udp),
        };
        session.round.packets.push(packet.clone());
        packet
    }

    fn click_center(session: &mut GameSession, packet: &Packet) -> Vec<SessionEvent> {
        let center = packet.drawn_rect().min + packet.drawn_rect().size * 0.5;
        session.on_pointer_down(center.x, center.y)
    }

    fn round_over(events: &[SessionEvent]) -> Option<(ScoreSubmission, LeaderboardTicket)> {
        events.iter().find_map(|e| match e {
            SessionEvent::RoundOver { submission, ticket } => Some((submission.clone(), *ticket)),
            _ => None,
        })
    }

    #[test]
    fn test_name_to_countdown_starts_loop() {
        let mut session = session();
        assert_eq!(session.view(), View::Name);
        let events = session.submit_name("  Ada  ");
        assert_eq!(session.player_name(), "Ada");
        assert_eq!(
            events,
            vec![
                SessionEvent::ViewChanged(View::Countdown {
                    remaining_ms: COUNTDOWN_MS
                }),
                SessionEvent::LoopStarted(LoopId(1)),
            ]
        );
        assert!(session.is_loop_active(LoopId(1)));
        assert_eq!(session.view().countdown_secs(), 3);
    }

    #[test]
    fn test_empty_name_falls_back() {
        let mut session = session();
        session.submit_name("   ");
        assert_eq!(session.player_name(), "Player");

        let config = GameConfig {
            default_name: "Guest".to_string(),
            ..GameConfig::default()
        };
        let mut session = GameSession::from_config(&config, 1);
        session.submit_name("");
        assert_eq!(session.player_name(), "Guest");
    }

    #[test]
    fn test_countdown_lasts_three_seconds() {
        let mut session = session();
        session.submit_name("Ada");
        for _ in 0..29 {
            session.tick(0.1);
        }
        assert!(matches!(session.view(), View::Countdown { .. }));
        assert_eq!(session.view().countdown_secs(), 1);
        assert!(session.packets().is_empty());

        let events = run_countdown(&mut session);
        assert_eq!(session.view(), View::Game);
        assert!(events.contains(&SessionEvent::RoundStarted {
            round: 1,
            seed: round_seed(12345, 1)
        }));
    }

    #[test]
    fn test_round_start_seeds_packets() {
        let session = playing();
        assert_eq!(session.packets().len(), INITIAL_PACKETS);
        assert_eq!(session.score(), 0);
        // The countdown loop carries on into the round
        assert!(session.is_loop_active(LoopId(1)));
    }

    #[test]
    fn test_seeded_round_reaches_floor_in_100_ticks() {
        let mut session = playing();
        let mut landed = 0;
        for _ in 0..100 {
            landed += session
                .tick(FRAME)
                .iter()
                .filter(|e| matches!(e, SessionEvent::Game(GameEvent::Landed { .. })))
                .count();
        }
        assert!(landed >= 1);
    }

    #[test]
    fn test_click_valid_scores_exactly() {
        let mut session = playing();
        session.round.score = -20;
        let packet = push_packet(&mut session, 2, 300.0, true);
        let events = click_center(&mut session, &packet);

        assert_eq!(session.score(), -20 + SCORE_PER_HIT);
        assert!(session.round().packet(packet.id).is_none());
        assert_eq!(
            events,
            vec![SessionEvent::Game(GameEvent::Caught {
                id: packet.id,
                lane: 2
            })]
        );
        assert_eq!(session.view(), View::Game);
    }

    #[test]
    fn test_click_corrupted_ends_round_once() {
        let mut session = playing();
        session.round.score = 990;
        let packet = push_packet(&mut session, 4, 300.0, false);
        let events = click_center(&mut session, &packet);

        assert_eq!(session.view(), View::GameOver);
        assert!(events.contains(&SessionEvent::LoopCancelled(LoopId(1))));
        assert_eq!(session.active_loop(), None);
        let (submission, _) = round_over(&events).unwrap();
        assert_eq!(
            submission,
            ScoreSubmission::new("Ada", 990, EndReason::ClickedRed)
        );
        assert_eq!(session.last_result().unwrap().score, 990);

        // A second click on the frozen board changes nothing
        assert!(click_center(&mut session, &packet).is_empty());
        assert!(session.tick(FRAME).is_empty());
    }

    #[test]
    fn test_negative_score_submitted() {
        let mut session = playing();
        session.round.score = -45;
        let packet = push_packet(&mut session, 0, 300.0, false);
        let events = click_center(&mut session, &packet);
        assert_eq!(round_over(&events).unwrap().0.score, -45);
    }

    #[test]
    fn test_clicks_ignored_outside_game() {
        let mut session = session();
        assert!(session.on_pointer_down(100.0, 100.0).is_empty());
        session.submit_name("Ada");
        assert!(session.on_pointer_down(100.0, 100.0).is_empty());
    }

    #[test]
    fn test_replay_starts_single_new_loop() {
        let mut session = playing();
        let packet = push_packet(&mut session, 0, 300.0, false);
        click_center(&mut session, &packet);

        let events = session.replay();
        assert!(events.contains(&SessionEvent::LoopStarted(LoopId(2))));
        assert!(!session.is_loop_active(LoopId(1)));
        assert!(session.is_loop_active(LoopId(2)));

        run_countdown(&mut session);
        assert_eq!(session.rounds_played(), 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.packets().len(), INITIAL_PACKETS);
    }

    #[test]
    fn test_invalid_transitions_ignored() {
        let mut session = session();
        assert!(session.replay().is_empty());
        assert!(session.show_leaderboard().is_empty());
        assert!(session.exit_to_name().is_empty());

        let mut session = playing();
        assert!(session.submit_name("Bob").is_empty());
        assert!(session.replay().is_empty());
        assert_eq!(session.player_name(), "Ada");
    }

    #[test]
    fn test_leaderboard_flow() {
        let mut session = playing();
        let packet = push_packet(&mut session, 0, 300.0, false);
        let (_, ticket) = round_over(&click_center(&mut session, &packet)).unwrap();

        let board = Leaderboard::from_entries(vec![LeaderboardEntry::new("Ada", 0)]);
        assert!(session.apply_leaderboard(ticket, board.clone()));
        assert_eq!(session.leaderboard(), &board);

        let events = session.show_leaderboard();
        assert_eq!(session.view(), View::Leaderboard);
        let SessionEvent::LeaderboardRequested(refresh) = events[1].clone() else {
            panic!("expected a leaderboard request, got {:?}", events);
        };
        // The round-over ticket is superseded by the refresh
        assert!(!session.apply_leaderboard(ticket, Leaderboard::new()));
        assert!(session.apply_leaderboard(refresh, Leaderboard::new()));

        session.exit_to_name();
        assert_eq!(session.view(), View::Name);
        assert!(!session.apply_leaderboard(refresh, board));
    }

    #[test]
    fn test_leaderboard_waits_for_pending_submit() {
        let mut session = playing();
        let packet = push_packet(&mut session, 0, 300.0, false);
        let (_, ticket) = round_over(&click_center(&mut session, &packet)).unwrap();

        // Opening the board before the submit answers must not race it with a plain fetch
        let events = session.show_leaderboard();
        assert_eq!(events, vec![SessionEvent::ViewChanged(View::Leaderboard)]);

        let board = Leaderboard::from_entries(vec![LeaderboardEntry::new("Ada", 0)]);
        assert!(session.apply_leaderboard(ticket, board.clone()));
        assert_eq!(session.leaderboard(), &board);
    }

    #[test]
    fn test_packets_hidden_outside_round_screens() {
        let mut session = playing();
        assert_eq!(session.visible_packets().len(), INITIAL_PACKETS);

        let packet = push_packet(&mut session, 0, 300.0, false);
        click_center(&mut session, &packet);
        assert_eq!(session.view(), View::GameOver);
        assert!(!session.visible_packets().is_empty());

        // The previous round's frozen packets are not shown during the countdown
        session.replay();
        assert!(!session.packets().is_empty());
        assert!(session.visible_packets().is_empty());
    }

    #[test]
    fn test_shrinking_resize_culls_packets_past_floor() {
        let mut session = playing();
        session.round.packets.clear();
        push_packet(&mut session, 0, 20.0, true);
        push_packet(&mut session, 1, 400.0, true);
        let score = session.score();

        session.resize(480.0, 300.0);
        let floor = session.geometry().floor_top();
        assert_eq!(session.packets().len(), 1);
        assert!(session.packets().iter().all(|p| p.bottom() < floor));
        assert_eq!(session.score(), score);

        // A collapsed board keeps the round untouched
        session.resize(0.0, 0.0);
        assert_eq!(session.packets().len(), 1);
    }

    #[test]
    fn test_late_leaderboard_after_replay_dropped() {
        let mut session = playing();
        let packet = push_packet(&mut session, 0, 300.0, false);
        let (_, ticket) = round_over(&click_center(&mut session, &packet)).unwrap();

        session.replay();
        let board = Leaderboard::from_entries(vec![LeaderboardEntry::new("Ada", 0)]);
        assert!(!session.apply_leaderboard(ticket, board));
        assert!(session.leaderboard().is_empty());
    }

    #[test]
    fn test_leaderboard_replay() {
        let mut session = playing();
        let packet = push_packet(&mut session, 0, 300.0, false);
        click_center(&mut session, &packet);
        session.show_leaderboard();

        session.replay();
        assert!(matches!(session.view(), View::Countdown { .. }));
        assert_eq!(session.active_loop(), Some(LoopId(2)));
    }

    #[test]
    fn test_unplayable_board_holds_round() {
        let mut session = GameSession::new(1);
        session.submit_name("Ada");
        run_countdown(&mut session);
        assert_eq!(session.view(), View::Game);
        assert!(session.packets().is_empty());
        assert!(session.tick(FRAME).is_empty());

        // Spawning resumes once the board has a size
        session.resize(480.0, 560.0);
        let mut spawned = false;
        for _ in 0..120 {
            spawned |= session
                .tick(FRAME)
                .iter()
                .any(|e| matches!(e, SessionEvent::Game(GameEvent::Spawned { .. })));
        }
        assert!(spawned);
    }

    #[test]
    fn test_rounds_reproducible_from_seed() {
        let a = playing();
        let b = playing();
        assert_eq!(a.packets(), b.packets());
    }
}
