pub mod dates;
pub mod scores;
