pub mod changelog;
pub mod changes;
pub mod config;
pub mod diagnostics;
pub mod fragment;
pub mod galaxy;
pub mod plugins;
pub mod version;

pub mod testing;
