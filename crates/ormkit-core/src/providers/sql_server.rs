//! SQL Server value generation and hi-lo sequence annotations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::error::{Error, Result};
use crate::metadata::Model;
use crate::source::ConfigurationSource;

/// Annotation names used by the SQL Server provider.
pub struct SqlServerNames;

impl SqlServerNames {
    /// Namespace prefix.
    pub const PREFIX: &'static str = "SqlServer:";
    /// Model-wide value generation strategy.
    pub const VALUE_GENERATION: &'static str = "SqlServer:ValueGeneration";
    /// Name of the sequence used by hi-lo generation.
    pub const DEFAULT_SEQUENCE_NAME: &'static str = "SqlServer:DefaultSequenceName";
    /// Prefix of serialized sequence definitions (`SqlServer:Sequence.<name>`).
    pub const SEQUENCE_PREFIX: &'static str = "SqlServer:Sequence.";

    /// Annotation name holding the definition of sequence `name`.
    pub fn sequence(name: &str) -> String {
        format!("{}{}", Self::SEQUENCE_PREFIX, name)
    }
}

/// How SQL Server generates key values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlServerValueGeneration {
    /// `IDENTITY` columns.
    IdentityColumn,
    /// Client-side hi-lo blocks drawn from a sequence.
    SequenceHiLo,
}

impl SqlServerValueGeneration {
    /// Annotation value.
    pub const fn as_str(self) -> &'static str {
        match self {
            SqlServerValueGeneration::IdentityColumn => "IdentityColumn",
            SqlServerValueGeneration::SequenceHiLo => "SequenceHiLo",
        }
    }
}

impl fmt::Display for SqlServerValueGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlServerValueGeneration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IdentityColumn" => Ok(SqlServerValueGeneration::IdentityColumn),
            "SequenceHiLo" => Ok(SqlServerValueGeneration::SequenceHiLo),
            other => Err(Error::invalid_argument(
                "value_generation",
                format!("unknown strategy '{}'", other),
            )),
        }
    }
}

/// A database sequence definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence name.
    pub name: String,
    /// Owning schema, `None` for the default schema.
    pub schema: Option<String>,
    /// First value handed out.
    pub start_value: i64,
    /// Block size per round trip.
    pub increment_by: i32,
}

impl Sequence {
    /// Name used when none is given.
    pub const DEFAULT_NAME: &'static str = "DefaultSequence";
    /// Default first value.
    pub const DEFAULT_START_VALUE: i64 = 1;
    /// Default block size.
    pub const DEFAULT_INCREMENT: i32 = 10;

    /// A sequence with default start and increment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            start_value: Self::DEFAULT_START_VALUE,
            increment_by: Self::DEFAULT_INCREMENT,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the start value.
    pub const fn start_value(mut self, start_value: i64) -> Self {
        self.start_value = start_value;
        self
    }

    /// Set the increment.
    pub const fn increment_by(mut self, increment_by: i32) -> Self {
        self.increment_by = increment_by;
        self
    }

    /// Annotation payload.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an annotation payload.
    pub fn from_payload(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

/// Guarded write of the model-wide value generation strategy.
pub fn set_value_generation(
    annotations: &mut Annotations,
    strategy: SqlServerValueGeneration,
    source: ConfigurationSource,
) -> bool {
    annotations.try_set(SqlServerNames::VALUE_GENERATION, strategy.as_str(), source)
}

/// Switch the model to hi-lo generation from `sequence`.
///
/// Writes the default sequence name, the serialized sequence and the
/// strategy, in that order. The strategy annotation is re-inserted after the
/// sequence so enumeration reads sequence first, strategy last. The
/// definition of a previously configured sequence is dropped. Nothing is
/// written unless every annotation involved accepts `source`.
pub fn use_sequence_hi_lo(
    annotations: &mut Annotations,
    sequence: &Sequence,
    source: ConfigurationSource,
) -> Result<bool> {
    let payload = sequence.to_payload()?;
    let sequence_annotation = SqlServerNames::sequence(&sequence.name);
    let previous = annotations
        .value(SqlServerNames::DEFAULT_SEQUENCE_NAME)
        .filter(|name| *name != sequence.name)
        .map(SqlServerNames::sequence);

    let allowed = annotations.can_set(SqlServerNames::VALUE_GENERATION, source)
        && annotations.can_set(SqlServerNames::DEFAULT_SEQUENCE_NAME, source)
        && annotations.can_set(&sequence_annotation, source)
        && previous
            .as_deref()
            .is_none_or(|name| annotations.can_set(name, source));
    if !allowed {
        tracing::trace!(
            sequence = %sequence.name,
            attempted = %source,
            "Hi-lo configuration rejected"
        );
        return Ok(false);
    }

    if let Some(previous) = previous {
        annotations.try_remove(&previous, source);
    }
    annotations.try_remove(SqlServerNames::VALUE_GENERATION, source);
    annotations.try_set(SqlServerNames::DEFAULT_SEQUENCE_NAME, sequence.name.as_str(), source);
    annotations.try_set(&sequence_annotation, payload, source);
    Ok(set_value_generation(
        annotations,
        SqlServerValueGeneration::SequenceHiLo,
        source,
    ))
}

/// SQL Server view of a model.
#[derive(Debug, Clone, Copy)]
pub struct SqlServerModel<'a> {
    annotations: &'a Annotations,
}

impl<'a> SqlServerModel<'a> {
    /// Configured value generation strategy.
    pub fn value_generation(&self) -> Option<SqlServerValueGeneration> {
        self.annotations
            .value(SqlServerNames::VALUE_GENERATION)
            .and_then(|v| v.parse().ok())
    }

    /// Name of the hi-lo sequence.
    pub fn default_sequence_name(&self) -> Option<&'a str> {
        self.annotations.value(SqlServerNames::DEFAULT_SEQUENCE_NAME)
    }

    /// Look up a sequence definition.
    pub fn find_sequence(&self, name: &str) -> Result<Option<Sequence>> {
        self.annotations
            .value(&SqlServerNames::sequence(name))
            .map(Sequence::from_payload)
            .transpose()
    }
}

/// SQL Server accessors on [`Model`].
pub trait SqlServerModelExt {
    /// Read-only SQL Server view.
    fn sql_server(&self) -> SqlServerModel<'_>;
}

impl SqlServerModelExt for Model {
    fn sql_server(&self) -> SqlServerModel<'_> {
        SqlServerModel {
            annotations: self.annotations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_defaults() {
        let sequence = Sequence::default();
        assert_eq!(sequence.name, "DefaultSequence");
        assert_eq!(sequence.start_value, 1);
        assert_eq!(sequence.increment_by, 10);
        assert_eq!(sequence.schema, None);
    }

    #[test]
    fn test_sequence_payload_parses_back() {
        let sequence = Sequence::new("Orders").schema("sales").increment_by(50);
        let payload = sequence.to_payload().unwrap();
        assert!(payload.contains("\"increment_by\":50"));
        assert_eq!(Sequence::from_payload(&payload).unwrap(), sequence);
        assert!(Sequence::from_payload("not json").is_err());
    }

    #[test]
    fn test_hi_lo_annotation_order() {
        let mut model = Model::new();
        set_value_generation(
            model.annotations_mut(),
            SqlServerValueGeneration::IdentityColumn,
            ConfigurationSource::Convention,
        );
        let applied = use_sequence_hi_lo(
            model.annotations_mut(),
            &Sequence::default(),
            ConfigurationSource::Explicit,
        )
        .unwrap();
        assert!(applied);

        let names: Vec<_> = model.annotations().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SqlServer:DefaultSequenceName",
                "SqlServer:Sequence.DefaultSequence",
                "SqlServer:ValueGeneration",
            ]
        );
        let view = model.sql_server();
        assert_eq!(view.value_generation(), Some(SqlServerValueGeneration::SequenceHiLo));
        assert_eq!(view.default_sequence_name(), Some("DefaultSequence"));
        assert_eq!(view.find_sequence("DefaultSequence").unwrap(), Some(Sequence::default()));
    }

    #[test]
    fn test_hi_lo_does_not_override_explicit_identity() {
        let mut annotations = Annotations::new();
        set_value_generation(
            &mut annotations,
            SqlServerValueGeneration::IdentityColumn,
            ConfigurationSource::Explicit,
        );
        let applied =
            use_sequence_hi_lo(&mut annotations, &Sequence::default(), ConfigurationSource::Convention)
                .unwrap();
        assert!(!applied);
        assert_eq!(annotations.len(), 1);
    }

    #[test]
    fn test_hi_lo_writes_nothing_when_any_annotation_is_stronger() {
        let mut annotations = Annotations::new();
        annotations.try_set(
            SqlServerNames::DEFAULT_SEQUENCE_NAME,
            "Pinned",
            ConfigurationSource::Explicit,
        );
        let applied = use_sequence_hi_lo(
            &mut annotations,
            &Sequence::new("Orders"),
            ConfigurationSource::DataAnnotation,
        )
        .unwrap();
        assert!(!applied);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations.value(SqlServerNames::DEFAULT_SEQUENCE_NAME), Some("Pinned"));
        assert!(annotations.get(&SqlServerNames::sequence("Orders")).is_none());
        assert!(annotations.get(SqlServerNames::VALUE_GENERATION).is_none());
    }

    #[test]
    fn test_hi_lo_replaces_previous_sequence() {
        let mut model = Model::new();
        let annotations = model.annotations_mut();
        assert!(
            use_sequence_hi_lo(annotations, &Sequence::default(), ConfigurationSource::Explicit)
                .unwrap()
        );
        assert!(
            use_sequence_hi_lo(annotations, &Sequence::new("Orders"), ConfigurationSource::Explicit)
                .unwrap()
        );

        let names: Vec<_> = model.annotations().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SqlServer:DefaultSequenceName",
                "SqlServer:Sequence.Orders",
                "SqlServer:ValueGeneration",
            ]
        );
        let view = model.sql_server();
        assert_eq!(view.default_sequence_name(), Some("Orders"));
        assert_eq!(view.find_sequence("DefaultSequence").unwrap(), None);
    }
}
