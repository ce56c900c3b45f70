pub mod user;
pub mod word;
pub mod wordbook;
