//! Named entry points for every backend command the frontend uses.
//!
//! Call sites go through [`CommandFacade`] instead of spelling command
//! strings. Each method is one round trip through the [`Bridge`]; nothing
//! is validated, transformed, retried or cached here.

pub mod commands;

use crate::error::invoke::InvokeError;
use crate::invoke::{Args, Bridge};

use commands::{
    GAME_CODE_ARG, GAME_STATE_ARG, GET_CALCULATOR_VALUE, GET_GAME_CODE, GET_REALTIME_GAME,
    SEND_CODE, START_GAME,
};

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct CommandFacade {
    bridge: Bridge,
}

impl CommandFacade {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub async fn send_code(&self) -> Result<Option<Value>, InvokeError> {
        self.bridge.call(SEND_CODE, None).await
    }

    pub async fn start_game(&self) -> Result<Option<Value>, InvokeError> {
        self.bridge.call(START_GAME, None).await
    }

    /// Current game code held by the host; a string, a number, or nothing.
    pub async fn get_game_code(&self) -> Result<Option<Value>, InvokeError> {
        self.bridge.call(GET_GAME_CODE, None).await
    }

    pub async fn get_realtime_game(
        &self,
        game_code: impl Into<Value>,
    ) -> Result<Option<Value>, InvokeError> {
        self.bridge
            .call(GET_REALTIME_GAME, Some(single_arg(GAME_CODE_ARG, game_code)))
            .await
    }

    pub async fn get_calculator_value(
        &self,
        game_state: impl Into<Value>,
    ) -> Result<Option<Value>, InvokeError> {
        self.bridge
            .call(
                GET_CALCULATOR_VALUE,
                Some(single_arg(GAME_STATE_ARG, game_state)),
            )
            .await
    }
}

fn single_arg(key: &str, value: impl Into<Value>) -> Args {
    let mut args = Args::new();
    args.insert(key.to_string(), value.into());
    args
}
