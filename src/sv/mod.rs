pub mod game;
pub mod token;

pub use game::Game;
pub use token::Token;
