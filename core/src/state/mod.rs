mod game;
mod player;

pub use game::GameState;
pub use player::{Discovery, Player, PlayerStatus};
