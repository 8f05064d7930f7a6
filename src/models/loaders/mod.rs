pub mod toml_loader;

pub use toml_loader::{load_profiles_file, parse_profile_document};
