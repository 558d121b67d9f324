// plugin and module descriptions

pub mod discovery;
pub mod resolver;
pub mod types;

pub use discovery::{DOCUMENTABLE_PLUGINS, PluginCache, load_plugins};
pub use resolver::{PluginResolver, RecordedPluginResolver, SimplePluginResolver};
pub use types::{MODULE_TYPE, PluginDescription, PluginEntry, PluginKey, PluginRecord};
