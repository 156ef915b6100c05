use crate::bot::Bot;
use crate::game::{Game, GameStatus, Player};

pub struct MatchConfig {
    pub max_moves: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig { max_moves: 200 }
    }
}

pub enum MatchResult {
    WhiteWins { winner_name: String, moves: usize },
    BlackWins { winner_name: String, moves: usize },
    Draw { moves: usize },
    IllegalMove { violator: String, winner: String },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::WhiteWins { winner_name, .. } => Some(winner_name),
            MatchResult::BlackWins { winner_name, .. } => Some(winner_name),
            MatchResult::IllegalMove { winner, .. } => Some(winner),
            MatchResult::Draw { .. } => None,
        }
    }
}

/// Plays two bots against each other through the turn controller.
pub struct Match {
    config: MatchConfig,
    game: Game,
    white_bot: Box<dyn Bot>,
    black_bot: Box<dyn Bot>,
    verbose: bool,
}

impl Match {
    pub fn new(
        white_bot: Box<dyn Bot>,
        black_bot: Box<dyn Bot>,
        config: MatchConfig,
        verbose: bool,
    ) -> Self {
        Match {
            config,
            game: Game::new(),
            white_bot,
            black_bot,
            verbose,
        }
    }

    pub fn play(&mut self) -> MatchResult {
        // Notify bots that game is starting
        self.white_bot.game_start(Player::White);
        self.black_bot.game_start(Player::Black);

        if self.verbose {
            println!("Match starting:");
            println!("  White: {}", self.white_bot.name());
            println!("  Black: {}", self.black_bot.name());
            println!("\nInitial board:");
            println!("{}", self.game.display_board());
        }

        while !self.game.is_game_over() && self.game.move_count() < self.config.max_moves {
            let current = self.game.current_player();
            if let Some(result) = self.play_move(current) {
                return result;
            }
        }

        // Game ended normally
        self.white_bot.game_end();
        self.black_bot.game_end();

        let moves = self.game.move_count();

        match self.game.status() {
            GameStatus::WhiteWon => {
                if self.verbose {
                    println!("\n{} wins as White!", self.white_bot.name());
                }
                MatchResult::WhiteWins {
                    winner_name: self.white_bot.name().to_string(),
                    moves,
                }
            }
            GameStatus::BlackWon => {
                if self.verbose {
                    println!("\n{} wins as Black!", self.black_bot.name());
                }
                MatchResult::BlackWins {
                    winner_name: self.black_bot.name().to_string(),
                    moves,
                }
            }
            GameStatus::Draw => {
                if self.verbose {
                    println!("\nGame is a draw!");
                }
                MatchResult::Draw { moves }
            }
            GameStatus::Undecided => {
                // Max moves reached
                if self.verbose {
                    println!("\nMax moves ({}) reached - Draw!", self.config.max_moves);
                }
                MatchResult::Draw { moves }
            }
        }
    }

    fn play_move(&mut self, current: Player) -> Option<MatchResult> {
        let bot = match current {
            Player::White => &mut self.white_bot,
            Player::Black => &mut self.black_bot,
        };

        if self.verbose {
            println!(
                "\nMove {}: {} to play{}",
                self.game.move_count() + 1,
                bot.name(),
                if self.game.must_jump() {
                    " (must capture)"
                } else {
                    ""
                }
            );
            println!("Legal moves: {}", self.game.possible_moves(current).len());
        }

        let sequence = bot.get_move(self.game.board(), current);

        let bot_name = match current {
            Player::White => self.white_bot.name(),
            Player::Black => self.black_bot.name(),
        };

        // Check if bot returned a move
        let sequence = match sequence {
            Some(sequence) => sequence,
            None => {
                // No legal moves or bot gave up
                if self.verbose {
                    println!("{} returned no move", bot_name);
                }

                return Some(MatchResult::Draw {
                    moves: self.game.move_count(),
                });
            }
        };

        if self.verbose {
            println!(
                "{} plays: {} -> {} ({} captured)",
                bot_name,
                sequence.from,
                sequence.landing(),
                sequence.captures()
            );
        }

        // Make the move
        if let Err(e) = self.game.play_turn(current, &sequence) {
            let violator = bot_name.to_string();
            let winner = match current {
                Player::White => self.black_bot.name().to_string(),
                Player::Black => self.white_bot.name().to_string(),
            };

            if self.verbose {
                println!("ILLEGAL MOVE: {} - {}", violator, e);
            }

            return Some(MatchResult::IllegalMove { violator, winner });
        }

        // Notify both bots of the move
        self.white_bot.notify_move(&sequence);
        self.black_bot.notify_move(&sequence);

        if self.verbose {
            println!("{}", self.game.display_board());
        }

        None
    }
}
