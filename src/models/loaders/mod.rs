pub mod toml_loader;

pub use toml_loader::{append_rule, load_rules, parse_rules};
