use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::services::ServeDir;

use crate::bot::AiTask;
use crate::game::{BOARD_SIZE, Game, Player, Position, Rank, Square};
use crate::moves::{MoveSequence, Step, all_turn_sequences};

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<WebSession>>,
}

/// One human-vs-computer session. At most one `AiTask` is in flight at a
/// time; it is spawned when the turn passes to the computer and consumed by
/// the next game-state poll that sees it finished.
struct WebSession {
    game: Game,
    human_side: Player,
    search_depth: u32,
    ai: Option<AiTask>,
}

#[derive(Serialize, Deserialize)]
pub struct NewGameRequest {
    player_side: String,
    depth: u32,
}

#[derive(Serialize)]
pub struct GameResponse {
    board: Vec<Vec<String>>,
    current_player: String,
    status: String,
    must_jump: bool,
    your_turn: bool,
    ai_progress: Option<f64>,
    legal_moves: Vec<MovePath>,
    message: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PathSquare {
    row: usize,
    col: usize,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PathStep {
    to: PathSquare,
    capture: Option<PathSquare>,
}

/// A full turn as it travels over the wire: origin plus one entry per step,
/// captures marked explicitly.
#[derive(Serialize, Deserialize, Clone)]
pub struct MovePath {
    from: PathSquare,
    steps: Vec<PathStep>,
}

impl AppState {
    pub fn new() -> Self {
        let session = WebSession {
            game: Game::new(),
            human_side: Player::White,
            search_depth: 2,
            ai: None,
        };
        AppState {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn square_to_string(square: Square) -> String {
    match square {
        Square::Void => " ".to_string(),
        Square::Empty => ".".to_string(),
        Square::Piece {
            color: Player::White,
            rank: Rank::Man,
        } => "w".to_string(),
        Square::Piece {
            color: Player::White,
            rank: Rank::King,
        } => "W".to_string(),
        Square::Piece {
            color: Player::Black,
            rank: Rank::Man,
        } => "b".to_string(),
        Square::Piece {
            color: Player::Black,
            rank: Rank::King,
        } => "B".to_string(),
    }
}

fn string_to_player(s: &str) -> Player {
    match s.to_lowercase().as_str() {
        "black" => Player::Black,
        _ => Player::White,
    }
}

fn path_square(pos: Position) -> PathSquare {
    PathSquare {
        row: pos.row,
        col: pos.col,
    }
}

fn sequence_to_path(sequence: &MoveSequence) -> MovePath {
    MovePath {
        from: path_square(sequence.from),
        steps: sequence
            .steps
            .iter()
            .map(|step| match step {
                Step::Slide { to } => PathStep {
                    to: path_square(*to),
                    capture: None,
                },
                Step::Jump { over, to } => PathStep {
                    to: path_square(*to),
                    capture: Some(path_square(*over)),
                },
            })
            .collect(),
    }
}

fn path_to_sequence(path: &MovePath) -> Option<MoveSequence> {
    let in_bounds = |sq: &PathSquare| sq.row < BOARD_SIZE && sq.col < BOARD_SIZE;
    if !in_bounds(&path.from) {
        return None;
    }
    let mut steps = Vec::with_capacity(path.steps.len());
    for step in &path.steps {
        if !in_bounds(&step.to) {
            return None;
        }
        let step = match &step.capture {
            None => Step::Slide {
                to: Position::new(step.to.row, step.to.col),
            },
            Some(capture) => {
                if !in_bounds(capture) {
                    return None;
                }
                Step::Jump {
                    over: Position::new(capture.row, capture.col),
                    to: Position::new(step.to.row, step.to.col),
                }
            }
        };
        steps.push(step);
    }
    Some(MoveSequence {
        from: Position::new(path.from.row, path.from.col),
        steps,
    })
}

/// Spawn a background computation if the turn now belongs to the computer.
fn maybe_start_ai(session: &mut WebSession) {
    let ai_side = session.human_side.opponent();
    if session.ai.is_none() && session.game.is_turn_of(ai_side) {
        session.ai = Some(AiTask::spawn(
            session.game.board().clone(),
            ai_side,
            session.search_depth,
            None,
        ));
    }
}

/// Consume a finished computation and apply its move. Called on every poll;
/// does nothing while the worker is still running.
fn poll_ai(session: &mut WebSession) {
    let Some(task) = session.ai.as_mut() else {
        return;
    };
    if !task.is_finished() {
        return;
    }
    let result = task.take_result();
    session.ai = None;

    let ai_side = session.human_side.opponent();
    if let Some(sequence) = result {
        let _ = session.game.play_turn(ai_side, &sequence);
    }
    // the turn can come straight back if the human side is blocked
    maybe_start_ai(session);
}

fn game_response(session: &WebSession, message: String) -> GameResponse {
    let game = &session.game;
    let mut board = vec![vec![String::new(); BOARD_SIZE]; BOARD_SIZE];
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            board[row][col] = square_to_string(game.board().at(Position::new(row, col)));
        }
    }

    let your_turn = session.ai.is_none() && game.is_turn_of(session.human_side);
    let legal_moves = if your_turn {
        let trees = game.possible_moves(session.human_side);
        if trees.is_empty() {
            Vec::new()
        } else {
            all_turn_sequences(trees)
                .iter()
                .map(sequence_to_path)
                .collect()
        }
    } else {
        Vec::new()
    };

    GameResponse {
        board,
        current_player: game.current_player().to_string(),
        status: game.status().to_string(),
        must_jump: game.must_jump(),
        your_turn,
        ai_progress: session.ai.as_ref().map(|task| task.progress()),
        legal_moves,
        message,
    }
}

#[axum::debug_handler]
async fn new_game(State(app_state): State<AppState>, Json(req): Json<NewGameRequest>) -> Response {
    let mut session = app_state.session.lock().unwrap();

    session.game = Game::new();
    session.human_side = string_to_player(&req.player_side);
    session.search_depth = req.depth;
    session.ai = None;
    maybe_start_ai(&mut session);

    let message = if session.ai.is_some() {
        "Computer is thinking...".to_string()
    } else {
        "Your turn!".to_string()
    };
    Json(game_response(&session, message)).into_response()
}

#[axum::debug_handler]
async fn make_move(State(app_state): State<AppState>, Json(req): Json<MovePath>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    poll_ai(&mut session);

    if session.game.is_game_over() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Game is over"
            })),
        )
            .into_response();
    }

    if session.ai.is_some() || !session.game.is_turn_of(session.human_side) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Not your turn"
            })),
        )
            .into_response();
    }

    let Some(sequence) = path_to_sequence(&req) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Malformed move path"
            })),
        )
            .into_response();
    };

    let human_side = session.human_side;
    if let Err(e) = session.game.play_turn(human_side, &sequence) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("Invalid move: {}", e)
            })),
        )
            .into_response();
    }

    maybe_start_ai(&mut session);

    let message = if session.ai.is_some() {
        "Computer is thinking...".to_string()
    } else {
        String::new()
    };
    Json(game_response(&session, message)).into_response()
}

#[axum::debug_handler]
async fn get_game_state(State(app_state): State<AppState>) -> Json<GameResponse> {
    let mut session = app_state.session.lock().unwrap();
    poll_ai(&mut session);
    Json(game_response(&session, String::new()))
}

pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let app_state = AppState::new();

    let app = Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/move", post(make_move))
        .route("/api/game-state", get(get_game_state))
        .nest_service("/", ServeDir::new("static"))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    println!("🌐 Web server running at http://127.0.0.1:3000");
    println!("   Open your browser and start playing!");

    axum::serve(listener, app).await?;
    Ok(())
}
