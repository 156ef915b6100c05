use draughts_arena::*;

fn main() {
    println!("Draughts Arena - Checkers Engine");
    println!("========================================\n");

    // Create the contestants
    let white = Box::new(MinimaxBot::new("Minimax (depth 2)".to_string(), 2));
    let black = Box::new(RandomBot::new("RandomBot".to_string()));

    // Configure match
    let config = MatchConfig { max_moves: 150 };

    // Play a match
    let mut match_game = Match::new(white, black, config, true);
    let result = match_game.play();

    // Display result
    println!("\n========================================");
    println!("Match Result:");
    match result {
        MatchResult::WhiteWins { winner_name, moves } => {
            println!("  {} wins as White in {} moves!", winner_name, moves);
        }
        MatchResult::BlackWins { winner_name, moves } => {
            println!("  {} wins as Black in {} moves!", winner_name, moves);
        }
        MatchResult::Draw { moves } => {
            println!("  Draw after {} moves", moves);
        }
        MatchResult::IllegalMove { violator, winner } => {
            println!("  {} wins by illegal move (opponent: {})", winner, violator);
        }
    }
    println!("========================================");
}
