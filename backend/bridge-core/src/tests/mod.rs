mod client;
mod facade;
mod game_code;
mod highlight;
mod payload;
mod protocol;
mod support;
