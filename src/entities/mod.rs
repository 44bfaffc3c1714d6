pub mod auth_provider;
pub mod game;
pub mod game_like;
pub mod game_type;
pub mod user;

pub use game_type::GameType;
