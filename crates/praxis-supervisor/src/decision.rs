// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Decision / Action Phase
//!
//! Runs on the loop thread after the perception barrier, in fixed priority:
//!
//! 1. a player inside the proximity radius preempts everything else
//! 2. unanswered chat mentions get one reply each
//! 3. the mining state machine advances
//!
//! Owns the [`HumanizationGenerator`]; nothing else may touch its fatigue
//! state or RNG.

use crate::perception::Perceived;
use crate::providers::{
    ActionCommand, ActionSink, BlockKind, BlockObservation, MouseButton, Observation,
    ParsedMessage,
};
use ahash::AHashMap;
use praxis_config::{BehaviorConfig, MiningMode, PraxisConfig};
use praxis_humanization::{ActionKind, HumanizationGenerator, HumanizationParams, Point2};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A new target must be at least this far from the one just finished
pub const MIN_RETARGET_DISTANCE_PX: f64 = 10.0;
/// Hotbar slot holding the pickaxe
const TOOL_SLOT_KEY: char = '1';
const ADDRESSING_WORDS: [&str; 5] = ["bot", "ai", "hey", "hello", "hi"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MiningState {
    Idle,
    Mining {
        target: Point2,
        kind: BlockKind,
        started_at: Instant,
    },
}

/// What one decision phase did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub blocks_mined: u64,
    pub players_detected: u32,
    pub yielded_to_player: bool,
    pub replies_sent: u32,
    pub actions_dispatched: u32,
}

/// Counts commands on their way to the sink
struct Dispatcher<'a> {
    sink: &'a dyn ActionSink,
    sent: u32,
}

impl Dispatcher<'_> {
    fn send(&mut self, command: ActionCommand) {
        trace!("[DECISION] -> {:?}", command);
        self.sink.dispatch(command);
        self.sent += 1;
    }
}

pub struct DecisionEngine {
    humanizer: HumanizationGenerator,
    mining: MiningState,
    cursor: Point2,
    /// (sender, text) of answered mentions, with the last time each was seen
    answered: AHashMap<(String, String), Instant>,
}

impl DecisionEngine {
    pub fn new(humanizer: HumanizationGenerator) -> Self {
        Self {
            humanizer,
            mining: MiningState::Idle,
            cursor: Point2::default(),
            answered: AHashMap::new(),
        }
    }

    pub fn humanizer(&self) -> &HumanizationGenerator {
        &self.humanizer
    }

    pub fn humanizer_mut(&mut self) -> &mut HumanizationGenerator {
        &mut self.humanizer
    }

    pub fn set_humanization(&mut self, params: HumanizationParams) {
        self.humanizer.set_params(params);
    }

    pub fn mining_state(&self) -> MiningState {
        self.mining
    }

    pub fn is_mining(&self) -> bool {
        matches!(self.mining, MiningState::Mining { .. })
    }

    /// Last position the cursor was sent to
    pub fn cursor(&self) -> Point2 {
        self.cursor
    }

    pub fn stop_mining(&mut self) {
        self.mining = MiningState::Idle;
    }

    pub fn decide(
        &mut self,
        perceived: &Perceived,
        config: &PraxisConfig,
        sink: &dyn ActionSink,
        now: Instant,
    ) -> TickOutcome {
        let behavior = &config.behavior;
        let mut out = Dispatcher { sink, sent: 0 };
        let mut outcome = TickOutcome::default();

        // Proximity is judged on every player seen, detection radius only bounds the count
        let players: Vec<f64> = perceived
            .observations
            .iter()
            .filter_map(|o| match o {
                Observation::Player(p) => Some(p.distance),
                _ => None,
            })
            .collect();
        let detection_radius = f64::from(behavior.detection_radius);
        outcome.players_detected = players.iter().filter(|d| **d <= detection_radius).count() as u32;

        if behavior.pause_on_player && players.iter().any(|d| *d <= behavior.proximity_radius) {
            if self.is_mining() {
                debug!("[DECISION] Player within {} blocks, stopping mining", behavior.proximity_radius);
            }
            self.mining = MiningState::Idle;
            let reaction = self.humanizer.delay_at(ActionKind::PlayerInteraction, now);
            out.send(ActionCommand::Wait(reaction));
            out.send(ActionCommand::Wait(Duration::from_millis(
                config.supervisor.proximity_hold_ms,
            )));
            outcome.yielded_to_player = true;
            outcome.actions_dispatched = out.sent;
            return outcome;
        }

        if behavior.chat_responses {
            outcome.replies_sent = self.answer_mentions(&perceived.messages, behavior, now, &mut out);
        }

        outcome.blocks_mined = self.advance_mining(&perceived.observations, behavior, now, &mut out);
        outcome.actions_dispatched = out.sent;
        outcome
    }

    fn answer_mentions(
        &mut self,
        messages: &[ParsedMessage],
        behavior: &BehaviorConfig,
        now: Instant,
        out: &mut Dispatcher<'_>,
    ) -> u32 {
        let window = Duration::from_secs(behavior.mention_window_secs);
        self.answered
            .retain(|_, seen| now.saturating_duration_since(*seen) <= window);

        let mut replies = 0;
        for message in messages {
            if message.sender.eq_ignore_ascii_case(&behavior.bot_username)
                || !mentions_bot(&message.text, &behavior.bot_username)
            {
                continue;
            }

            let key = (message.sender.clone(), message.text.clone());
            if let Some(seen) = self.answered.get_mut(&key) {
                *seen = now;
                continue;
            }
            self.answered.insert(key, now);

            let delay = self.humanizer.delay_at(ActionKind::Chat, now);
            out.send(ActionCommand::Wait(delay));
            out.send(ActionCommand::Type(reply_to(message, behavior)));
            debug!("[DECISION] Replied to {}", message.sender);
            replies += 1;
        }
        replies
    }

    fn advance_mining(
        &mut self,
        observations: &[Observation],
        behavior: &BehaviorConfig,
        now: Instant,
        out: &mut Dispatcher<'_>,
    ) -> u64 {
        match self.mining {
            MiningState::Idle => {
                if let Some(block) = select_block(observations, behavior, None) {
                    self.begin_mining(block, behavior, now, out);
                }
                0
            }
            MiningState::Mining {
                target,
                kind,
                started_at,
            } => {
                let skip_bedrock = behavior.avoid_bedrock && kind == BlockKind::Bedrock;
                let broken = !skip_bedrock
                    && now.saturating_duration_since(started_at)
                        >= mining_time(kind, behavior.mining_speed);
                if !skip_bedrock && !broken {
                    return 0;
                }

                self.mining = MiningState::Idle;
                if broken {
                    debug!("[DECISION] Finished {:?} at ({:.0}, {:.0})", kind, target.x, target.y);
                }
                if let Some(block) = select_block(observations, behavior, Some(target)) {
                    self.begin_mining(block, behavior, now, out);
                }
                u64::from(broken)
            }
        }
    }

    fn begin_mining(
        &mut self,
        block: &BlockObservation,
        behavior: &BehaviorConfig,
        now: Instant,
        out: &mut Dispatcher<'_>,
    ) {
        if behavior.auto_switch_tools {
            let delay = self.humanizer.delay_at(ActionKind::ToolSwitch, now);
            out.send(ActionCommand::Wait(delay));
            out.send(ActionCommand::KeyPress(TOOL_SLOT_KEY));
        }

        let target = block.bounds.center();
        let waypoint = self.humanizer.movement_waypoint(self.cursor, target);
        let landing = self.humanizer.jitter(waypoint);
        out.send(ActionCommand::MoveTo(landing));
        self.cursor = landing;

        let delay = self.humanizer.delay_at(ActionKind::Mining, now);
        out.send(ActionCommand::Wait(delay));
        out.send(ActionCommand::Click(MouseButton::Left));

        self.mining = MiningState::Mining {
            target,
            kind: block.kind,
            started_at: now,
        };
        debug!("[DECISION] Mining {:?} at ({:.0}, {:.0})", block.kind, target.x, target.y);
    }
}

/// Break time scaled by `mining_speed` percent
pub fn mining_time(kind: BlockKind, mining_speed: u32) -> Duration {
    let factor = f64::from(mining_speed.max(1)) / 100.0;
    kind.hardness().div_f64(factor)
}

pub fn is_eligible(kind: BlockKind, mode: MiningMode, avoid_bedrock: bool) -> bool {
    if kind == BlockKind::Bedrock && avoid_bedrock {
        return false;
    }
    match mode {
        MiningMode::Blocks => !kind.is_ore() && !kind.is_tree(),
        MiningMode::Ores => kind.is_ore(),
        MiningMode::Trees => kind.is_tree(),
        MiningMode::Mixed => true,
    }
}

/// First eligible block, skipping any within retarget distance of `previous`
fn select_block<'a>(
    observations: &'a [Observation],
    behavior: &BehaviorConfig,
    previous: Option<Point2>,
) -> Option<&'a BlockObservation> {
    observations.iter().find_map(|o| match o {
        Observation::Block(block)
            if is_eligible(block.kind, behavior.mining_mode, behavior.avoid_bedrock)
                && previous.map_or(true, |p| {
                    block.bounds.center().distance(p) > MIN_RETARGET_DISTANCE_PX
                }) =>
        {
            Some(block)
        }
        _ => None,
    })
}

/// Case-insensitive username match, or an addressing word on its own
pub fn mentions_bot(text: &str, bot_username: &str) -> bool {
    let lower = text.to_lowercase();
    if !bot_username.is_empty() && lower.contains(&bot_username.to_lowercase()) {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| ADDRESSING_WORDS.contains(&word))
}

fn reply_to(message: &ParsedMessage, behavior: &BehaviorConfig) -> String {
    let known = behavior
        .known_players
        .iter()
        .any(|p| p.eq_ignore_ascii_case(&message.sender));
    if known {
        format!("Welcome back {}!", message.sender)
    } else {
        format!("Hello {}! I'm just mining here.", message.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{PlayerObservation, Rect};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        commands: Mutex<Vec<ActionCommand>>,
    }

    impl ActionSink for RecordingSink {
        fn dispatch(&self, command: ActionCommand) {
            self.commands.lock().push(command);
        }
    }

    impl RecordingSink {
        fn take(&self) -> Vec<ActionCommand> {
            std::mem::take(&mut *self.commands.lock())
        }
    }

    fn engine() -> DecisionEngine {
        let params = HumanizationParams {
            seed: Some(11),
            ..HumanizationParams::default()
        };
        DecisionEngine::new(HumanizationGenerator::new(params))
    }

    fn config() -> PraxisConfig {
        let mut config = PraxisConfig::default();
        config.behavior.auto_switch_tools = false;
        config
    }

    fn block(kind: BlockKind, x: i32, y: i32) -> Observation {
        Observation::Block(BlockObservation {
            kind,
            bounds: Rect::new(x, y, 40, 40),
        })
    }

    fn player(distance: f64) -> Observation {
        Observation::Player(PlayerObservation {
            name: Some("Alex".to_string()),
            distance,
            bounds: Rect::new(300, 100, 30, 60),
        })
    }

    fn perceived(observations: Vec<Observation>, messages: Vec<ParsedMessage>) -> Perceived {
        Perceived {
            observations: Arc::from(observations),
            messages,
        }
    }

    #[test]
    fn test_idle_selects_first_block() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let now = Instant::now();
        let p = perceived(vec![block(BlockKind::Stone, 100, 100)], vec![]);

        let outcome = engine.decide(&p, &config(), &sink, now);

        assert_eq!(outcome.blocks_mined, 0);
        let commands = sink.take();
        assert!(matches!(commands[0], ActionCommand::MoveTo(_)));
        assert!(matches!(commands[1], ActionCommand::Wait(_)));
        assert_eq!(commands[2], ActionCommand::Click(MouseButton::Left));
        assert_eq!(outcome.actions_dispatched, 3);
        assert!(matches!(
            engine.mining_state(),
            MiningState::Mining { kind: BlockKind::Stone, .. }
        ));
    }

    #[test]
    fn test_tool_switch_precedes_move() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.auto_switch_tools = true;
        let p = perceived(vec![block(BlockKind::Stone, 100, 100)], vec![]);

        engine.decide(&p, &config, &sink, Instant::now());

        let commands = sink.take();
        assert!(matches!(commands[0], ActionCommand::Wait(_)));
        assert_eq!(commands[1], ActionCommand::KeyPress('1'));
        assert!(matches!(commands[2], ActionCommand::MoveTo(_)));
    }

    #[test]
    fn test_completed_block_counted_and_next_selected() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let config = config();
        let t0 = Instant::now();
        // First block re-observed beside a second one 60 px away
        let p = perceived(
            vec![block(BlockKind::Dirt, 100, 100), block(BlockKind::Dirt, 160, 100)],
            vec![],
        );

        engine.decide(&p, &config, &sink, t0);
        // Dirt at 150% speed breaks after 250 / 1.5 ≈ 167 ms
        let early = engine.decide(&p, &config, &sink, t0 + Duration::from_millis(100));
        assert_eq!(early.blocks_mined, 0);

        let done = engine.decide(&p, &config, &sink, t0 + Duration::from_millis(200));
        assert_eq!(done.blocks_mined, 1);
        match engine.mining_state() {
            MiningState::Mining { target, .. } => assert_eq!(target, Point2::new(180.0, 120.0)),
            MiningState::Idle => panic!("expected a new target"),
        }
    }

    #[test]
    fn test_proximity_preempts_mining() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let config = config();
        let now = Instant::now();
        engine.decide(&perceived(vec![block(BlockKind::Stone, 0, 0)], vec![]), &config, &sink, now);
        sink.take();

        let p = perceived(
            vec![player(2.0), block(BlockKind::Stone, 0, 0)],
            vec![ParsedMessage::new("Alex", "hey MinerBot")],
        );
        let outcome = engine.decide(&p, &config, &sink, now);

        assert!(outcome.yielded_to_player);
        assert_eq!(outcome.replies_sent, 0);
        assert!(!engine.is_mining());
        let commands = sink.take();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], ActionCommand::Wait(Duration::from_millis(1000)));
    }

    #[test]
    fn test_distant_player_only_counted() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let p = perceived(vec![player(10.0), player(40.0)], vec![]);

        let outcome = engine.decide(&p, &config(), &sink, Instant::now());

        assert!(!outcome.yielded_to_player);
        assert_eq!(outcome.players_detected, 1);
    }

    #[test]
    fn test_proximity_beyond_detection_radius_still_yields() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.detection_radius = 16;
        config.behavior.proximity_radius = 20.0;
        let p = perceived(vec![player(18.0), block(BlockKind::Stone, 100, 100)], vec![]);

        let outcome = engine.decide(&p, &config, &sink, Instant::now());

        assert!(outcome.yielded_to_player);
        assert_eq!(outcome.players_detected, 0);
        assert_eq!(engine.mining_state(), MiningState::Idle);
    }

    #[test]
    fn test_mention_answered_once_within_window() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.known_players = vec!["Notch".to_string()];
        let t0 = Instant::now();
        let p = perceived(
            vec![],
            vec![
                ParsedMessage::new("Notch", "minerbot are you there"),
                ParsedMessage::new("Herobrine", "hi"),
                ParsedMessage::new("Herobrine", "nice weather"),
            ],
        );

        let first = engine.decide(&p, &config, &sink, t0);
        assert_eq!(first.replies_sent, 2);
        let typed: Vec<_> = sink
            .take()
            .into_iter()
            .filter_map(|c| match c {
                ActionCommand::Type(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(
            typed,
            vec![
                "Welcome back Notch!".to_string(),
                "Hello Herobrine! I'm just mining here.".to_string()
            ]
        );

        let repeat = engine.decide(&p, &config, &sink, t0 + Duration::from_secs(5));
        assert_eq!(repeat.replies_sent, 0);
    }

    #[test]
    fn test_mention_forgotten_after_window() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let config = config();
        let t0 = Instant::now();
        let p = perceived(vec![], vec![ParsedMessage::new("Alex", "hello")]);

        engine.decide(&p, &config, &sink, t0);
        let empty = perceived(vec![], vec![]);
        engine.decide(&empty, &config, &sink, t0 + Duration::from_secs(10));
        let later = engine.decide(&p, &config, &sink, t0 + Duration::from_secs(45));

        assert_eq!(later.replies_sent, 1);
    }

    #[test]
    fn test_chat_disabled_sends_nothing() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.chat_responses = false;
        let p = perceived(vec![], vec![ParsedMessage::new("Alex", "hey bot")]);

        let outcome = engine.decide(&p, &config, &sink, Instant::now());
        assert_eq!(outcome.replies_sent, 0);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_bedrock_and_mode_filters() {
        assert!(!is_eligible(BlockKind::Bedrock, MiningMode::Mixed, true));
        assert!(is_eligible(BlockKind::Bedrock, MiningMode::Mixed, false));
        assert!(is_eligible(BlockKind::IronOre, MiningMode::Ores, true));
        assert!(!is_eligible(BlockKind::Stone, MiningMode::Ores, true));
        assert!(is_eligible(BlockKind::Wood, MiningMode::Trees, true));
        assert!(!is_eligible(BlockKind::Wood, MiningMode::Blocks, true));
    }

    #[test]
    fn test_bedrock_skipped_without_counting() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.avoid_bedrock = false;
        let t0 = Instant::now();
        let p = perceived(vec![block(BlockKind::Bedrock, 0, 0)], vec![]);
        engine.decide(&p, &config, &sink, t0);
        assert!(engine.is_mining());

        config.behavior.avoid_bedrock = true;
        let outcome = engine.decide(&p, &config, &sink, t0 + Duration::from_millis(10));
        assert_eq!(outcome.blocks_mined, 0);
        assert!(!engine.is_mining());
    }

    #[test]
    fn test_targeted_bedrock_completes_and_mining_moves_on() {
        let mut engine = engine();
        let sink = RecordingSink::default();
        let mut config = config();
        config.behavior.avoid_bedrock = false;
        config.behavior.mining_mode = MiningMode::Mixed;
        let t0 = Instant::now();
        let p = perceived(
            vec![block(BlockKind::Bedrock, 0, 0), block(BlockKind::Stone, 200, 200)],
            vec![],
        );

        engine.decide(&p, &config, &sink, t0);
        assert!(matches!(
            engine.mining_state(),
            MiningState::Mining { kind: BlockKind::Bedrock, .. }
        ));

        // One tick per second for a minute; bedrock takes under 2 s at 150%
        let mut mined = 0;
        let mut stone_targeted = false;
        for second in 1..=60 {
            mined += engine
                .decide(&p, &config, &sink, t0 + Duration::from_secs(second))
                .blocks_mined;
            if matches!(
                engine.mining_state(),
                MiningState::Mining { kind: BlockKind::Stone, .. }
            ) {
                stone_targeted = true;
            }
        }

        assert!(stone_targeted);
        assert!(mined >= 20);
    }

    #[test]
    fn test_mining_time_scales_with_speed() {
        assert_eq!(mining_time(BlockKind::Stone, 100), Duration::from_millis(750));
        assert_eq!(mining_time(BlockKind::Stone, 200), Duration::from_millis(375));
        assert_eq!(mining_time(BlockKind::Bedrock, 100), Duration::from_millis(2500));
    }

    #[test]
    fn test_mentions() {
        assert!(mentions_bot("yo MINERBOT", "MinerBot"));
        assert!(mentions_bot("hey, you", "MinerBot"));
        assert!(!mentions_bot("said something", "MinerBot"));
        assert!(!mentions_bot("this is fine", "MinerBot"));
    }
}
