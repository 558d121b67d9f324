// testing utilities for generating test collections

pub mod collection_builder;
pub mod scenarios;

pub use collection_builder::{TestCollection, TestCollectionBuilder};
pub use scenarios::TestScenario;
