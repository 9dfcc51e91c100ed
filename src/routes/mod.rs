pub mod chat;
pub mod moods;
pub mod notes;
pub mod periods;
pub mod predictions;
pub mod settings;
pub mod symptoms;
pub mod user;
