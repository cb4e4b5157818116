pub mod comment;
pub mod game;
pub mod user;

pub use comment::Comment;
pub use game::{Game, GameResult, NewGame, NewGameResult};
pub use user::{NewUser, User, UserSummary};
