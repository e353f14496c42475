pub mod domain;
pub mod error;
pub mod parse;
pub mod protocol;
