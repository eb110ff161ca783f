//! Shell settings, loaded from a TOML file.

mod settings;

pub use settings::ShellSettings;
