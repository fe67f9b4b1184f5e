//! Command names and parameter keys understood by the host.

pub const SEND_CODE: &str = "send_code";
pub const START_GAME: &str = "start_game";
pub const GET_GAME_CODE: &str = "get_game_code";
pub const GET_REALTIME_GAME: &str = "get_realtime_game";
pub const GET_CALCULATOR_VALUE: &str = "get_calculator_value";

pub const GAME_CODE_ARG: &str = "gameCode";
pub const GAME_STATE_ARG: &str = "gameState";

/// Every command the facade can issue.
pub const ALL_COMMANDS: [&str; 5] = [
    SEND_CODE,
    START_GAME,
    GET_GAME_CODE,
    GET_REALTIME_GAME,
    GET_CALCULATOR_VALUE,
];
