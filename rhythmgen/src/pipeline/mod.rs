pub mod export;
pub mod loop_assembler;
pub mod midi;
pub mod pattern;
pub mod persistence;
pub mod project;
pub mod rhythm;
pub mod style;
