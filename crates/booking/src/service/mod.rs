pub mod credits;
pub mod lessons;
