use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::moves::{MoveNode, MoveSequence, MoveTree, tree_contains};

/// Board side length. Only squares with odd `row + col` are part of the
/// playable diagonal pattern.
pub const BOARD_SIZE: usize = 8;

/// Rows initially filled with pieces on each side of the board.
pub const PIECE_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    White,
    Black,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "White"),
            Player::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

/// One board cell. `Void` squares lie off the diagonal pattern and never
/// hold a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Square {
    Void,
    Empty,
    Piece { color: Player, rank: Rank },
}

impl Square {
    pub fn is_empty(&self) -> bool {
        matches!(self, Square::Empty)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Square::Void)
    }

    pub fn piece(&self) -> Option<(Player, Rank)> {
        match self {
            Square::Piece { color, rank } => Some((*color, *rank)),
            _ => None,
        }
    }

    pub fn has_color(&self, color: Player) -> bool {
        matches!(self, Square::Piece { color: c, .. } if *c == color)
    }

    /// True if this square holds a piece of the side opposing `color`.
    pub fn is_enemy_of(&self, color: Player) -> bool {
        matches!(self, Square::Piece { color: c, .. } if *c != color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Offset by `(dr, dc)`, `None` when the result falls off the board.
    pub fn step(self, dr: i32, dc: i32) -> Option<Position> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if row < 0 || row >= BOARD_SIZE as i32 || col < 0 || col >= BOARD_SIZE as i32 {
            return None;
        }
        Some(Position::new(row as usize, col as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

const KING_DIRECTIONS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const WHITE_MAN_DIRECTIONS: [(i32, i32); 2] = [(1, -1), (1, 1)];
const BLACK_MAN_DIRECTIONS: [(i32, i32); 2] = [(-1, -1), (-1, 1)];

/// Travel distance and diagonal directions available to a piece. Men slide a
/// single square along their two forward diagonals; kings travel any distance
/// along all four.
pub fn move_set(color: Player, rank: Rank) -> (usize, &'static [(i32, i32)]) {
    match rank {
        Rank::Man => match color {
            Player::White => (1, &WHITE_MAN_DIRECTIONS),
            Player::Black => (1, &BLACK_MAN_DIRECTIONS),
        },
        Rank::King => (BOARD_SIZE, &KING_DIRECTIONS),
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Game already over")]
    GameOver,
    #[error("Not your turn")]
    NotYourTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Undecided,
    Draw,
    WhiteWon,
    BlackWon,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Undecided => write!(f, "undecided"),
            GameStatus::Draw => write!(f, "draw"),
            GameStatus::WhiteWon => write!(f, "White won"),
            GameStatus::BlackWon => write!(f, "Black won"),
        }
    }
}

/// Piece totals per side and rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialCount {
    pub white_men: u32,
    pub white_kings: u32,
    pub black_men: u32,
    pub black_kings: u32,
}

impl MaterialCount {
    pub fn white_total(&self) -> u32 {
        self.white_men + self.white_kings
    }

    pub fn black_total(&self) -> u32 {
        self.black_men + self.black_kings
    }
}

/// Marks squares already captured in the current jump chain. A piece ringed
/// by enemies could otherwise re-capture the same square forever while the
/// generator recurses (captured pieces stay on the board during the search).
struct JumpGuard {
    marked: [[bool; BOARD_SIZE]; BOARD_SIZE],
}

impl JumpGuard {
    fn new() -> Self {
        JumpGuard {
            marked: [[false; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    fn is_marked(&self, pos: Position) -> bool {
        self.marked[pos.row][pos.col]
    }

    fn mark(&mut self, pos: Position) {
        self.marked[pos.row][pos.col] = true;
    }

    fn unmark(&mut self, pos: Position) {
        self.marked[pos.row][pos.col] = false;
    }
}

/// The playing surface: a fixed grid of squares. Cloning yields a fully
/// independent copy, which the search uses for hypothetical positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Square; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Board with no pieces: `Empty` on the playable pattern, `Void` elsewhere.
    pub fn empty() -> Self {
        let mut squares = [[Square::Void; BOARD_SIZE]; BOARD_SIZE];
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if (row + col) % 2 == 1 {
                    squares[row][col] = Square::Empty;
                }
            }
        }
        Board { squares }
    }

    /// Standard starting position: twelve men per side on the playable
    /// squares of the three rows nearest each player's edge.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for pos in Board::positions() {
            if board.at(pos).is_void() {
                continue;
            }
            if pos.row < PIECE_ROWS {
                board.set_at(
                    pos,
                    Square::Piece {
                        color: Player::White,
                        rank: Rank::Man,
                    },
                );
            } else if pos.row >= BOARD_SIZE - PIECE_ROWS {
                board.set_at(
                    pos,
                    Square::Piece {
                        color: Player::Black,
                        rank: Rank::Man,
                    },
                );
            }
        }
        board
    }

    /// Iterate every board position in row-major order.
    pub fn positions() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
    }

    pub fn at(&self, pos: Position) -> Square {
        self.squares[pos.row][pos.col]
    }

    pub fn set_at(&mut self, pos: Position, square: Square) {
        self.squares[pos.row][pos.col] = square;
    }

    /// Remove the piece at `pos`, leaving the square playable.
    pub fn kill(&mut self, pos: Position) {
        self.squares[pos.row][pos.col] = Square::Empty;
    }

    /// Crown the piece at `pos`. Leaves non-piece squares untouched.
    pub fn promote(&mut self, pos: Position) {
        if let Square::Piece { color, .. } = self.at(pos) {
            self.set_at(
                pos,
                Square::Piece {
                    color,
                    rank: Rank::King,
                },
            );
        }
    }

    /// Swap the contents of two squares. Moving a piece onto an empty square
    /// leaves the emptiness behind at its origin.
    pub fn swap(&mut self, from: Position, to: Position) {
        let a = self.at(to);
        self.set_at(to, self.at(from));
        self.set_at(from, a);
    }

    pub fn count_pieces(&self) -> MaterialCount {
        let mut count = MaterialCount::default();
        for pos in Board::positions() {
            match self.at(pos) {
                Square::Piece {
                    color: Player::White,
                    rank,
                } => match rank {
                    Rank::Man => count.white_men += 1,
                    Rank::King => count.white_kings += 1,
                },
                Square::Piece {
                    color: Player::Black,
                    rank,
                } => match rank {
                    Rank::Man => count.black_men += 1,
                    Rank::King => count.black_kings += 1,
                },
                _ => {}
            }
        }
        count
    }

    /// Derive the game outcome from piece counts alone. A side without
    /// pieces has lost; a board without any pieces (degenerate setups only)
    /// is a draw.
    pub fn game_status(&self) -> GameStatus {
        let count = self.count_pieces();
        let white = count.white_total();
        let black = count.black_total();
        if white == 0 {
            if black == 0 {
                return GameStatus::Draw;
            }
            return GameStatus::BlackWon;
        }
        if black == 0 {
            return GameStatus::WhiteWon;
        }
        GameStatus::Undecided
    }

    /// All legal root moves for `color` under the forced-capture rule: if
    /// any jump exists, only jumps are returned and the flag is true.
    pub fn possible_moves(&self, color: Player) -> (bool, Vec<MoveTree>) {
        let jumps = self.find_all_jumps(color);
        if !jumps.is_empty() {
            return (true, jumps);
        }
        (false, self.find_all_moves(color))
    }

    /// Plain (non-capturing) move trees for every piece of `color`.
    pub fn find_all_moves(&self, color: Player) -> Vec<MoveTree> {
        let mut trees = Vec::new();
        for pos in Board::positions() {
            if self.at(pos).has_color(color) {
                let branches = self.find_moves(pos);
                if !branches.is_empty() {
                    trees.push(MoveTree::new(pos, branches));
                }
            }
        }
        trees
    }

    /// Jump trees for every piece of `color`.
    pub fn find_all_jumps(&self, color: Player) -> Vec<MoveTree> {
        let mut guard = JumpGuard::new();
        let mut trees = Vec::new();
        for pos in Board::positions() {
            if let Some((c, rank)) = self.at(pos).piece() {
                if c == color {
                    let branches = self.find_jumps(color, rank, pos, &mut guard);
                    if !branches.is_empty() {
                        trees.push(MoveTree::new(pos, branches));
                    }
                }
            }
        }
        trees
    }

    fn find_moves(&self, from: Position) -> Vec<MoveNode> {
        let Some((color, rank)) = self.at(from).piece() else {
            return Vec::new();
        };
        let (max_dist, directions) = move_set(color, rank);
        let mut nodes = Vec::new();
        for &(dr, dc) in directions {
            for dist in 1..=max_dist as i32 {
                let Some(to) = from.step(dr * dist, dc * dist) else {
                    break;
                };
                // an occupied square ends the ray
                if !self.at(to).is_empty() {
                    break;
                }
                nodes.push(MoveNode::Slide { to });
            }
        }
        nodes
    }

    /// Jump branches for a piece of the given color and rank standing at
    /// `from`. Continuations are found by recursing from the landing square
    /// with the captured square marked in the guard; the board itself is
    /// never modified while searching.
    fn find_jumps(
        &self,
        color: Player,
        rank: Rank,
        from: Position,
        guard: &mut JumpGuard,
    ) -> Vec<MoveNode> {
        let (max_dist, directions) = move_set(color, rank);
        let mut nodes = Vec::new();
        for &(dr, dc) in directions {
            for dist in 1..=max_dist as i32 {
                let Some(over) = from.step(dr * dist, dc * dist) else {
                    break;
                };
                let target = self.at(over);
                if target.is_empty() {
                    continue;
                }
                // only the nearest occupied square on a ray can be captured
                if target.is_enemy_of(color) && !guard.is_marked(over) {
                    if let Some(to) = over.step(dr, dc) {
                        if self.at(to).is_empty() {
                            guard.mark(over);
                            let continuations = self.find_jumps(color, rank, to, guard);
                            guard.unmark(over);
                            nodes.push(MoveNode::Jump {
                                over,
                                to,
                                continuations,
                            });
                        }
                    }
                }
                break;
            }
        }
        nodes
    }

    /// Get a string representation of the board.
    pub fn display_board(&self) -> String {
        let mut result = String::new();
        result.push_str("   ");
        for col in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", col));
        }
        result.push('\n');

        for row in 0..BOARD_SIZE {
            result.push_str(&format!("{:2} ", row));
            for col in 0..BOARD_SIZE {
                let c = match self.at(Position::new(row, col)) {
                    Square::Void => ' ',
                    Square::Empty => '.',
                    Square::Piece {
                        color: Player::White,
                        rank: Rank::Man,
                    } => 'w',
                    Square::Piece {
                        color: Player::White,
                        rank: Rank::King,
                    } => 'W',
                    Square::Piece {
                        color: Player::Black,
                        rank: Rank::Man,
                    } => 'b',
                    Square::Piece {
                        color: Player::Black,
                        rank: Rank::King,
                    } => 'B',
                };
                result.push_str(&format!(" {} ", c));
            }
            result.push('\n');
        }

        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

/// Turn controller: owns the live board, tracks whose turn it is, validates
/// and applies submitted move sequences, crowns back-rank men and passes the
/// turn. A side with no legal turn is skipped.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    current_player: Player,
    must_jump: bool,
    possible_moves: Vec<MoveTree>,
    status: GameStatus,
    move_count: usize,
}

impl Game {
    /// Fresh game from the standard starting position, White to move.
    pub fn new() -> Self {
        Self::with_position(Board::standard(), Player::White)
    }

    /// Game from an arbitrary setup. The status is derived from the board
    /// immediately, and a blocked side to move is skipped as usual.
    pub fn with_position(board: Board, to_move: Player) -> Self {
        let mut game = Game {
            board,
            current_player: to_move,
            must_jump: false,
            possible_moves: Vec::new(),
            status: GameStatus::Undecided,
            move_count: 0,
        };
        game.status = game.board.game_status();
        game.refresh_moves();
        if game.status == GameStatus::Undecided && game.possible_moves.is_empty() {
            game.advance_turn();
            if game.possible_moves.is_empty() {
                game.status = GameStatus::Draw;
            }
        }
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status != GameStatus::Undecided
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Whether the current turn is under the forced-capture rule.
    pub fn must_jump(&self) -> bool {
        self.must_jump
    }

    /// True if `color` may submit a move right now.
    pub fn is_turn_of(&self, color: Player) -> bool {
        self.current_player == color && self.status == GameStatus::Undecided
    }

    /// Legal move trees for `color`; empty unless it is that side's turn.
    pub fn possible_moves(&self, color: Player) -> &[MoveTree] {
        if self.is_turn_of(color) {
            &self.possible_moves
        } else {
            &[]
        }
    }

    /// Apply one full turn submitted by `player`. The sequence must be a
    /// complete root-to-leaf path of the generated move trees.
    pub fn play_turn(&mut self, player: Player, sequence: &MoveSequence) -> Result<(), GameError> {
        if self.status != GameStatus::Undecided {
            return Err(GameError::GameOver);
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        if !tree_contains(&self.possible_moves, sequence) {
            return Err(GameError::InvalidMove(format!(
                "sequence from {} is not a legal turn",
                sequence.from
            )));
        }

        sequence.execute(&mut self.board);
        self.move_count += 1;
        self.promote_back_rank();
        self.pass_turn();
        Ok(())
    }

    /// Crown men standing on the far rank of their direction of travel.
    fn promote_back_rank(&mut self) {
        for i in 0..BOARD_SIZE / 2 {
            let pos = Position::new(0, 2 * i + 1);
            if let Some((Player::Black, Rank::Man)) = self.board.at(pos).piece() {
                self.board.promote(pos);
            }
            let pos = Position::new(BOARD_SIZE - 1, 2 * i);
            if let Some((Player::White, Rank::Man)) = self.board.at(pos).piece() {
                self.board.promote(pos);
            }
        }
    }

    fn pass_turn(&mut self) {
        self.status = self.board.game_status();
        if self.status != GameStatus::Undecided {
            self.possible_moves.clear();
            return;
        }
        self.advance_turn();
        if self.possible_moves.is_empty() {
            // the blocked side forfeits its turn
            self.advance_turn();
            if self.possible_moves.is_empty() {
                self.status = GameStatus::Draw;
            }
        }
    }

    fn advance_turn(&mut self) {
        self.current_player = self.current_player.opponent();
        self.refresh_moves();
    }

    fn refresh_moves(&mut self) {
        let (must_jump, moves) = self.board.possible_moves(self.current_player);
        self.must_jump = must_jump;
        self.possible_moves = moves;
    }

    pub fn display_board(&self) -> String {
        self.board.display_board()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Step, all_turn_sequences};

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn piece(color: Player, rank: Rank) -> Square {
        Square::Piece { color, rank }
    }

    /// Helper to build a board from a piece list.
    fn board_with(pieces: &[(Position, Player, Rank)]) -> Board {
        let mut board = Board::empty();
        for &(pos, color, rank) in pieces {
            board.set_at(pos, piece(color, rank));
        }
        board
    }

    /// Collect every node of a tree set, preorder.
    fn walk_nodes<'a>(trees: &'a [MoveTree]) -> Vec<&'a MoveNode> {
        fn visit<'a>(node: &'a MoveNode, out: &mut Vec<&'a MoveNode>) {
            out.push(node);
            for child in node.continuations() {
                visit(child, out);
            }
        }
        let mut out = Vec::new();
        for tree in trees {
            for branch in &tree.branches {
                visit(branch, &mut out);
            }
        }
        out
    }

    #[test]
    fn test_standard_setup() {
        let board = Board::standard();
        let count = board.count_pieces();

        assert_eq!(count.white_men, 12);
        assert_eq!(count.black_men, 12);
        assert_eq!(count.white_kings, 0);
        assert_eq!(count.black_kings, 0);

        assert_eq!(board.at(p(0, 1)), piece(Player::White, Rank::Man));
        assert_eq!(board.at(p(2, 7)), piece(Player::White, Rank::Man));
        assert_eq!(board.at(p(5, 0)), piece(Player::Black, Rank::Man));
        assert_eq!(board.at(p(7, 0)), piece(Player::Black, Rank::Man));
        assert_eq!(board.at(p(3, 0)), Square::Empty);
        assert_eq!(board.at(p(4, 1)), Square::Empty);
    }

    #[test]
    fn test_void_squares_off_the_pattern() {
        let board = Board::standard();
        for pos in Board::positions() {
            if (pos.row + pos.col) % 2 == 0 {
                assert!(board.at(pos).is_void(), "{} should be void", pos);
            } else {
                assert!(!board.at(pos).is_void(), "{} should be playable", pos);
            }
        }
    }

    #[test]
    fn test_opening_moves_white() {
        let board = Board::standard();
        let (must_jump, trees) = board.possible_moves(Player::White);

        assert!(!must_jump);
        // only the front row can move, one tree per piece
        let origins: Vec<Position> = trees.iter().map(|t| t.from).collect();
        assert_eq!(origins, vec![p(2, 1), p(2, 3), p(2, 5), p(2, 7)]);

        let nodes = walk_nodes(&trees);
        assert_eq!(nodes.len(), 7);
        for node in nodes {
            match node {
                MoveNode::Slide { to } => {
                    assert_eq!(to.row, 3);
                    assert!(board.at(*to).is_empty());
                }
                MoveNode::Jump { .. } => panic!("no jumps from the opening position"),
            }
        }
    }

    #[test]
    fn test_opening_moves_black() {
        let board = Board::standard();
        let (must_jump, trees) = board.possible_moves(Player::Black);

        assert!(!must_jump);
        let origins: Vec<Position> = trees.iter().map(|t| t.from).collect();
        assert_eq!(origins, vec![p(5, 0), p(5, 2), p(5, 4), p(5, 6)]);
        assert_eq!(walk_nodes(&trees).len(), 7);
    }

    #[test]
    fn test_man_single_jump() {
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(3, 2), Player::Black, Rank::Man),
        ]);

        let jumps = board.find_all_jumps(Player::White);
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].from, p(2, 1));
        assert_eq!(
            jumps[0].branches,
            vec![MoveNode::Jump {
                over: p(3, 2),
                to: p(4, 3),
                continuations: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_forced_capture_excludes_slides() {
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(2, 5), Player::White, Rank::Man),
            (p(3, 2), Player::Black, Rank::Man),
        ]);

        let (must_jump, trees) = board.possible_moves(Player::White);
        assert!(must_jump);
        // the piece at (2, 5) could slide, but the capture is mandatory
        assert_eq!(trees.len(), 1);
        for node in walk_nodes(&trees) {
            assert!(matches!(node, MoveNode::Jump { .. }));
        }
    }

    #[test]
    fn test_king_slides_all_directions() {
        let mut board = board_with(&[(p(3, 4), Player::White, Rank::King)]);

        let trees = board.find_all_moves(Player::White);
        assert_eq!(walk_nodes(&trees).len(), 13);

        // a friendly piece truncates the ray before itself
        board.set_at(p(5, 2), piece(Player::White, Rank::Man));
        let trees = board.find_all_moves(Player::White);
        let king_tree = trees.iter().find(|t| t.from == p(3, 4)).unwrap();
        let slides: Vec<Position> = king_tree.branches.iter().map(|n| n.end_pos()).collect();
        assert!(slides.contains(&p(4, 3)));
        assert!(!slides.contains(&p(5, 2)));
        assert!(!slides.contains(&p(6, 1)));
    }

    #[test]
    fn test_man_cannot_move_backwards() {
        let board = board_with(&[(p(4, 3), Player::White, Rank::Man)]);
        let trees = board.find_all_moves(Player::White);
        let targets: Vec<Position> = walk_nodes(&trees).iter().map(|n| n.end_pos()).collect();
        assert_eq!(targets, vec![p(5, 2), p(5, 4)]);
    }

    #[test]
    fn test_king_long_range_jump() {
        let board = board_with(&[
            (p(0, 1), Player::White, Rank::King),
            (p(3, 4), Player::Black, Rank::Man),
        ]);

        let jumps = board.find_all_jumps(Player::White);
        assert_eq!(jumps.len(), 1);
        assert_eq!(
            jumps[0].branches,
            vec![MoveNode::Jump {
                over: p(3, 4),
                to: p(4, 5),
                continuations: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_king_jumps_only_nearest_on_ray() {
        // the landing square behind the nearest enemy is occupied by a second
        // enemy; the king may not skip ahead and capture that one instead
        let board = board_with(&[
            (p(1, 2), Player::White, Rank::King),
            (p(3, 4), Player::Black, Rank::Man),
            (p(4, 5), Player::Black, Rank::Man),
        ]);

        assert!(board.find_all_jumps(Player::White).is_empty());
    }

    #[test]
    fn test_own_piece_blocks_ray() {
        // the friendly man sits between the king and the enemy further down
        // the same ray, so the king can neither reach nor capture it
        let board = board_with(&[
            (p(0, 1), Player::White, Rank::King),
            (p(2, 3), Player::White, Rank::Man),
            (p(4, 5), Player::Black, Rank::Man),
        ]);

        assert!(board.find_all_jumps(Player::White).is_empty());
        let trees = board.find_all_moves(Player::White);
        let king_tree = trees.iter().find(|t| t.from == p(0, 1)).unwrap();
        let targets: Vec<Position> = king_tree.branches.iter().map(|n| n.end_pos()).collect();
        assert!(targets.contains(&p(1, 2)));
        assert!(!targets.contains(&p(2, 3)));
    }

    #[test]
    fn test_capture_ring_terminates() {
        // four black men around the king form a closed capture loop; without
        // the guard the generator would recurse through it forever
        let board = board_with(&[
            (p(1, 2), Player::White, Rank::King),
            (p(2, 1), Player::Black, Rank::Man),
            (p(2, 3), Player::Black, Rank::Man),
            (p(4, 1), Player::Black, Rank::Man),
            (p(4, 3), Player::Black, Rank::Man),
        ]);

        let jumps = board.find_all_jumps(Player::White);
        let sequences = all_turn_sequences(&jumps);
        assert!(!sequences.is_empty());

        let mut longest = 0;
        for seq in &sequences {
            let mut captured: Vec<Position> = Vec::new();
            for step in &seq.steps {
                if let Step::Jump { over, .. } = step {
                    assert!(!captured.contains(over), "square captured twice");
                    captured.push(*over);
                }
            }
            longest = longest.max(captured.len());
        }
        assert_eq!(longest, 3);
    }

    #[test]
    fn test_multi_jump_chain_execution() {
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(3, 2), Player::Black, Rank::Man),
            (p(5, 4), Player::Black, Rank::Man),
        ]);

        let jumps = board.find_all_jumps(Player::White);
        let sequences = all_turn_sequences(&jumps);
        assert_eq!(sequences.len(), 1);
        let seq = &sequences[0];
        assert_eq!(seq.captures(), 2);
        assert_eq!(seq.landing(), p(6, 5));

        let mut after = board.clone();
        seq.execute(&mut after);
        assert_eq!(after.at(p(2, 1)), Square::Empty);
        assert_eq!(after.at(p(3, 2)), Square::Empty);
        assert_eq!(after.at(p(5, 4)), Square::Empty);
        assert_eq!(after.at(p(6, 5)), piece(Player::White, Rank::Man));
        assert_eq!(after.count_pieces().black_total(), 0);
    }

    #[test]
    fn test_generated_moves_land_on_empty_squares() {
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(4, 5), Player::White, Rank::King),
            (p(5, 2), Player::Black, Rank::Man),
            (p(1, 6), Player::Black, Rank::King),
        ]);

        for color in [Player::White, Player::Black] {
            let (_, trees) = board.possible_moves(color);
            for node in walk_nodes(&trees) {
                assert!(board.at(node.end_pos()).is_empty());
            }
        }
    }

    #[test]
    fn test_game_status_from_counts() {
        assert_eq!(Board::standard().game_status(), GameStatus::Undecided);
        assert_eq!(Board::empty().game_status(), GameStatus::Draw);

        let white_only = board_with(&[(p(2, 1), Player::White, Rank::Man)]);
        assert_eq!(white_only.game_status(), GameStatus::WhiteWon);

        let black_only = board_with(&[(p(5, 2), Player::Black, Rank::King)]);
        assert_eq!(black_only.game_status(), GameStatus::BlackWon);
    }

    #[test]
    fn test_promotion_on_far_rank() {
        let board = board_with(&[
            (p(6, 3), Player::White, Rank::Man),
            (p(5, 0), Player::Black, Rank::Man),
        ]);
        let mut game = Game::with_position(board, Player::White);

        let seq = MoveSequence {
            from: p(6, 3),
            steps: vec![Step::Slide { to: p(7, 2) }],
        };
        game.play_turn(Player::White, &seq).unwrap();

        assert_eq!(game.board().at(p(7, 2)), piece(Player::White, Rank::King));
        assert_eq!(game.current_player(), Player::Black);
    }

    #[test]
    fn test_king_is_never_demoted() {
        let board = board_with(&[
            (p(7, 2), Player::White, Rank::King),
            (p(5, 0), Player::Black, Rank::Man),
        ]);
        let mut game = Game::with_position(board, Player::White);

        let seq = MoveSequence {
            from: p(7, 2),
            steps: vec![Step::Slide { to: p(6, 1) }],
        };
        game.play_turn(Player::White, &seq).unwrap();
        assert_eq!(game.board().at(p(6, 1)), piece(Player::White, Rank::King));
    }

    #[test]
    fn test_play_turn_rejects_unknown_sequence() {
        let mut game = Game::new();
        let seq = MoveSequence {
            from: p(2, 1),
            steps: vec![Step::Slide { to: p(4, 3) }],
        };
        let result = game.play_turn(Player::White, &seq);
        assert!(matches!(result, Err(GameError::InvalidMove(_))));
    }

    #[test]
    fn test_play_turn_rejects_partial_jump_chain() {
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(3, 2), Player::Black, Rank::Man),
            (p(5, 4), Player::Black, Rank::Man),
        ]);
        let mut game = Game::with_position(board, Player::White);

        // stopping after the first capture is not a complete turn
        let prefix = MoveSequence {
            from: p(2, 1),
            steps: vec![Step::Jump {
                over: p(3, 2),
                to: p(4, 3),
            }],
        };
        let result = game.play_turn(Player::White, &prefix);
        assert!(matches!(result, Err(GameError::InvalidMove(_))));
    }

    #[test]
    fn test_play_turn_out_of_turn() {
        let mut game = Game::new();
        let (_, trees) = game.board().possible_moves(Player::Black);
        let seq = all_turn_sequences(&trees).remove(0);
        let result = game.play_turn(Player::Black, &seq);
        assert!(matches!(result, Err(GameError::NotYourTurn)));
    }

    #[test]
    fn test_play_turn_after_game_over() {
        let board = board_with(&[(p(2, 1), Player::White, Rank::Man)]);
        let mut game = Game::with_position(board, Player::White);
        assert_eq!(game.status(), GameStatus::WhiteWon);

        let seq = MoveSequence {
            from: p(2, 1),
            steps: vec![Step::Slide { to: p(3, 0) }],
        };
        let result = game.play_turn(Player::White, &seq);
        assert!(matches!(result, Err(GameError::GameOver)));
    }

    #[test]
    fn test_blocked_side_is_skipped() {
        // the black man on the back rank has no forward square and nothing
        // to jump, so after White's move the turn returns to White
        let board = board_with(&[
            (p(2, 1), Player::White, Rank::Man),
            (p(0, 1), Player::Black, Rank::Man),
        ]);
        let mut game = Game::with_position(board, Player::White);

        let seq = MoveSequence {
            from: p(2, 1),
            steps: vec![Step::Slide { to: p(3, 0) }],
        };
        game.play_turn(Player::White, &seq).unwrap();

        assert_eq!(game.status(), GameStatus::Undecided);
        assert_eq!(game.current_player(), Player::White);
        assert!(!game.possible_moves(Player::White).is_empty());
    }

    #[test]
    fn test_draw_when_neither_side_can_move() {
        let board = board_with(&[
            (p(7, 0), Player::White, Rank::Man),
            (p(0, 1), Player::Black, Rank::Man),
        ]);
        let game = Game::with_position(board, Player::White);
        assert_eq!(game.status(), GameStatus::Draw);
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = Game::new();
        assert_eq!(game.current_player(), Player::White);
        assert!(game.is_turn_of(Player::White));
        assert!(!game.is_turn_of(Player::Black));

        let seq = all_turn_sequences(game.possible_moves(Player::White))
            .into_iter()
            .next()
            .unwrap();
        game.play_turn(Player::White, &seq).unwrap();

        assert_eq!(game.current_player(), Player::Black);
        assert_eq!(game.move_count(), 1);
        assert!(game.possible_moves(Player::White).is_empty());
    }

    #[test]
    fn test_move_sets() {
        let (dist, dirs) = move_set(Player::White, Rank::Man);
        assert_eq!(dist, 1);
        assert_eq!(dirs, &[(1, -1), (1, 1)]);

        let (dist, dirs) = move_set(Player::Black, Rank::Man);
        assert_eq!(dist, 1);
        assert_eq!(dirs, &[(-1, -1), (-1, 1)]);

        let (dist, dirs) = move_set(Player::White, Rank::King);
        assert_eq!(dist, BOARD_SIZE);
        assert_eq!(dirs.len(), 4);
    }
}
