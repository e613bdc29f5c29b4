pub mod files;

pub use files::{format_path_with_tilde, open_document, read_document, validate_file_size};
