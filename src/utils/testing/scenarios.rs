// pre-defined test scenarios

use super::collection_builder::{TestCollection, TestCollectionBuilder};
use crate::utils::changelog::{ChangelogConfig, ChangesFormat};

/// pre-defined test scenarios
pub enum TestScenario {
    /// combined storage, fragments deleted after release
    Combined,
    /// classic storage, fragments kept and resolved at render time
    Classic,
    /// combined storage with a fragment in an unknown section and a bad list item
    Invalid,
}

impl TestScenario {
    /// build a collection from a predefined scenario
    pub fn build(self) -> Result<TestCollection, Box<dyn std::error::Error>> {
        match self {
            TestScenario::Combined => Self::build_combined(),
            TestScenario::Classic => Self::build_classic(),
            TestScenario::Invalid => Self::build_invalid(),
        }
    }

    fn with_fragments(builder: TestCollectionBuilder) -> TestCollectionBuilder {
        builder
            .fragment("100-fix-y.yml", "bugfixes:\n  - fix Y\n")
            .fragment("101-fix-x.yml", "bugfixes:\n  - fix X\n")
            .fragment(
                "summary.yml",
                "release_summary: First release of the tools collection.\n",
            )
    }

    fn build_combined() -> Result<TestCollection, Box<dyn std::error::Error>> {
        Self::with_fragments(TestCollectionBuilder::new("acme", "tools").version("1.0.0")).build()
    }

    fn build_classic() -> Result<TestCollection, Box<dyn std::error::Error>> {
        let config = ChangelogConfig::default_for(Some("Acme.Tools".to_string()))
            .changes_format(ChangesFormat::Classic)
            .keep_fragments(true);
        Self::with_fragments(
            TestCollectionBuilder::new("acme", "tools")
                .version("1.0.0")
                .config(config),
        )
        .build()
    }

    fn build_invalid() -> Result<TestCollection, Box<dyn std::error::Error>> {
        TestCollectionBuilder::new("acme", "tools")
            .version("1.0.0")
            .fragment("bad-section.yml", "new_stuff:\n  - something\n")
            .fragment("bad-item.yml", "bugfixes:\n  - 42\n")
            .fragment("good.yml", "bugfixes:\n  - fine\n")
            .build()
    }
}
