pub mod folder_match;
pub mod sample_loader;
