use ormkit_core::providers::sql_server;
use ormkit_core::{ConfigurationSource, Result, SqlServerValueGeneration};

use crate::builder::InternalModelBuilder;
use crate::convention::ModelInitializedConvention;

/// Defaults the model to SQL Server identity columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerIdentityStrategyConvention;

impl ModelInitializedConvention for SqlServerIdentityStrategyConvention {
    fn apply(&self, builder: &mut InternalModelBuilder) -> Result<()> {
        sql_server::set_value_generation(
            builder.model_mut().annotations_mut(),
            SqlServerValueGeneration::IdentityColumn,
            ConfigurationSource::Convention,
        );
        Ok(())
    }
}
