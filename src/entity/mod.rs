pub mod game;
pub mod token;

pub use token::PlanType;
