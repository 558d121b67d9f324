// change metadata: which fragments and plugins went into which release

pub mod release;
pub mod store;
pub mod types;

pub use release::add_release;
pub use store::ChangesStore;
pub use types::{ClassicContent, CombinedContent, ReleaseContent, ReleaseEntry};
