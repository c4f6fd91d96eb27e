pub mod diagnose;
pub mod history;
pub mod lookup;
pub mod parse;
pub mod profile;
