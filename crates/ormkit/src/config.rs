//! Model builder configuration.

use ormkit_conventions::{
    ConventionSet, ConventionSetBuilder, CoreConventionSetBuilder, RelationalConventionSetBuilder,
    SqlServerConventionSetBuilder,
};

/// Which provider's conventions run on top of the core set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Provider-agnostic conventions only.
    Core,
    /// Core plus table mapping.
    #[default]
    Relational,
    /// Relational plus SQL Server value generation.
    SqlServer,
}

/// Options for [`ModelBuilder`](crate::ModelBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelBuilderConfig {
    /// Convention layer.
    pub provider: Provider,
    /// Pair navigations into relationships automatically.
    pub discover_relationships: bool,
}

impl Default for ModelBuilderConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            discover_relationships: true,
        }
    }
}

impl ModelBuilderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Enable or disable relationship discovery.
    pub fn discover_relationships(mut self, enabled: bool) -> Self {
        self.discover_relationships = enabled;
        self
    }

    /// Build the convention set this configuration describes.
    pub fn convention_set(&self) -> ConventionSet {
        let core = CoreConventionSetBuilder::new().discover_relationships(self.discover_relationships);
        match self.provider {
            Provider::Core => core.create_convention_set(),
            Provider::Relational => RelationalConventionSetBuilder::new(core).create_convention_set(),
            Provider::SqlServer => SqlServerConventionSetBuilder::new(
                RelationalConventionSetBuilder::new(core),
            )
            .create_convention_set(),
        }
    }
}
