use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crate::game::{Board, Player};
use crate::moves::{MoveSequence, all_turn_sequences};

/// Weights within this distance of the extremum count as equally good and
/// are tie-broken at random.
pub const WEIGHT_EPSILON: f64 = 1e-10;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Choose a full turn for `player` on the given board, or `None` when
    /// the side has no legal moves.
    fn get_move(&mut self, board: &Board, player: Player) -> Option<MoveSequence>;

    /// Notified when the game starts
    fn game_start(&mut self, _player: Player) {}

    /// Notified when a move is made (by either player)
    fn notify_move(&mut self, _sequence: &MoveSequence) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// Plays a uniformly random legal turn.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        RandomBot {
            name,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, player: Player) -> Option<MoveSequence> {
        let (_, trees) = board.possible_moves(player);
        if trees.is_empty() {
            return None;
        }
        let sequences = all_turn_sequences(&trees);
        let pick = self.rng.gen_range(0..sequences.len());
        Some(sequences[pick].clone())
    }
}

/// Completion gauge shared between a search and its observers. Stores the
/// fraction as `f64` bits in an atomic so readers never block the worker.
#[derive(Debug, Default)]
pub struct SearchProgress {
    bits: AtomicU64,
}

impl SearchProgress {
    pub fn new() -> Self {
        SearchProgress {
            bits: AtomicU64::new(0),
        }
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Current completion fraction in `[0, 1]`.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Board desirability from White's viewpoint: the ratio of white to black
/// material, a king counting as three men. Infinite once black has nothing
/// left.
pub fn material_ratio(board: &Board) -> f64 {
    let count = board.count_pieces();
    let white = (count.white_men + 3 * count.white_kings) as f64;
    let black = (count.black_men + 3 * count.black_kings) as f64;
    if black == 0.0 { f64::INFINITY } else { white / black }
}

/// Weigh every turn available to `color`, in enumeration order. At depth
/// zero a turn is worth the material ratio of the position it produces;
/// otherwise it is worth the extremum of the opponent's reply weights, the
/// reply side picking the direction that favors itself (White drives the
/// ratio up, Black down). A blocked side contributes a single pass.
///
/// `progress_base` and `importance` locate this call's slice of the overall
/// completion fraction; the gauge is advanced as each branch finishes.
pub fn find_move_weights(
    board: &Board,
    color: Player,
    depth: u32,
    progress_base: f64,
    importance: f64,
    progress: &SearchProgress,
) -> Vec<f64> {
    let (_, trees) = board.possible_moves(color);
    let sequences = all_turn_sequences(&trees);
    let share = importance / sequences.len() as f64;

    let mut weights = Vec::with_capacity(sequences.len());
    for (done, sequence) in sequences.iter().enumerate() {
        let mut next = board.clone();
        sequence.execute(&mut next);

        let weight = if depth == 0 {
            material_ratio(&next)
        } else {
            let replies =
                find_move_weights(&next, color.opponent(), depth - 1, progress.get(), share, progress);
            match color {
                // the opponent replying is White, who maximizes the ratio
                Player::Black => replies.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                Player::White => replies.iter().copied().fold(f64::INFINITY, f64::min),
            }
        };
        weights.push(weight);
        progress.set(progress_base + (done + 1) as f64 * share);
    }
    weights
}

/// Pick a turn for `color`: weigh every sequence to `depth` plies, take the
/// extremal weight for the side to move and choose uniformly at random among
/// the sequences tied for it. Any fault in selection falls back to the first
/// enumerable sequence; `None` only when the side has no moves at all.
pub fn find_optimal_move(
    board: &Board,
    color: Player,
    depth: u32,
    rng: &mut impl Rng,
    progress: &SearchProgress,
) -> Option<MoveSequence> {
    let (_, trees) = board.possible_moves(color);
    if trees.is_empty() {
        return None;
    }
    let sequences = all_turn_sequences(&trees);
    let weights = find_move_weights(board, color, depth, 0.0, 1.0, progress);

    let chosen = select_among(&sequences, &weights, color, rng)
        .unwrap_or_else(|| sequences[0].clone());
    Some(chosen)
}

fn select_among(
    sequences: &[MoveSequence],
    weights: &[f64],
    color: Player,
    rng: &mut impl Rng,
) -> Option<MoveSequence> {
    if sequences.is_empty() || sequences.len() != weights.len() {
        return None;
    }
    let target = match color {
        Player::White => weights.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Player::Black => weights.iter().copied().fold(f64::INFINITY, f64::min),
    };
    let ties: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter(|&(_, &w)| weights_equal(w, target))
        .map(|(i, _)| i)
        .collect();
    if ties.is_empty() {
        return None;
    }
    let pick = ties[rng.gen_range(0..ties.len())];
    Some(sequences[pick].clone())
}

/// Epsilon comparison that still holds for two infinite weights.
fn weights_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < WEIGHT_EPSILON
}

fn first_sequence(board: &Board, color: Player) -> Option<MoveSequence> {
    let (_, trees) = board.possible_moves(color);
    if trees.is_empty() {
        return None;
    }
    all_turn_sequences(&trees).into_iter().next()
}

/// Depth-limited search bot. The RNG used for tie-breaking is owned by the
/// bot, so a seeded instance plays deterministically.
pub struct MinimaxBot {
    name: String,
    depth: u32,
    rng: StdRng,
}

impl MinimaxBot {
    pub fn new(name: String, depth: u32) -> Self {
        MinimaxBot {
            name,
            depth,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(name: String, depth: u32, seed: u64) -> Self {
        MinimaxBot {
            name,
            depth,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for MinimaxBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, board: &Board, player: Player) -> Option<MoveSequence> {
        let progress = SearchProgress::new();
        find_optimal_move(board, player, self.depth, &mut self.rng, &progress)
    }
}

/// A search running on its own worker thread while the caller keeps going.
/// The caller polls `progress` and `is_finished` without blocking and
/// consumes the result exactly once; there is no way to cancel a running
/// computation. Starting a second task before consuming the first is a
/// caller error.
pub struct AiTask {
    progress: Arc<SearchProgress>,
    handle: Option<JoinHandle<Option<MoveSequence>>>,
    snapshot: Board,
    color: Player,
}

impl AiTask {
    /// Start computing a turn for `color` on a board the task now owns
    /// exclusively; the live board stays with the caller.
    pub fn spawn(board: Board, color: Player, depth: u32, seed: Option<u64>) -> Self {
        let progress = Arc::new(SearchProgress::new());
        let worker_progress = Arc::clone(&progress);
        let snapshot = board.clone();

        let handle = thread::spawn(move || {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            find_optimal_move(&board, color, depth, &mut rng, &worker_progress)
        });

        AiTask {
            progress,
            handle: Some(handle),
            snapshot,
            color,
        }
    }

    /// Completion fraction in `[0, 1]`, monotone over the task's lifetime.
    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Take the computed turn. Returns `None` on every call after the first,
    /// and `None` from the first call only if the side had no moves. A worker
    /// that died still yields a move: the first enumerable sequence of the
    /// retained snapshot.
    pub fn take_result(&mut self) -> Option<MoveSequence> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => first_sequence(&self.snapshot, self.color),
        }
    }
}
