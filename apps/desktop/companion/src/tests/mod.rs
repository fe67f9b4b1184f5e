mod error;
mod logger;
mod state;
