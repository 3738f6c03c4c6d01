pub mod benchmark;
pub mod consensus;
pub mod detect;
