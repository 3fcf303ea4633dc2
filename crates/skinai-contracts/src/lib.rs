pub mod assessment;
pub mod chat;
pub mod errors;
pub mod events;
pub mod history;
pub mod knowledge;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod progress;
pub mod prompt;
