//! Class mapping registry.
//!
//! # Responsibility
//! - Record which classes have storage mapping information.
//! - Resolve a class to its table and mapped columns.
//!
//! # Invariants
//! - Class, table and field names are plain SQL identifiers.
//! - `id` is implicit for every class and never listed as a mapped field.

use super::{StorageError, StorageResult};
use crate::model::record::IDENTIFIER_FIELD;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Mapping information for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    class: String,
    table: String,
    fields: Vec<String>,
}

impl ClassMetadata {
    pub fn new<I, S>(class: impl Into<String>, table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Mapped columns, excluding the implicit identifier.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        field == IDENTIFIER_FIELD || self.fields.iter().any(|mapped| mapped == field)
    }

    fn validate(&self) -> StorageResult<()> {
        for name in [self.class.as_str(), self.table.as_str()]
            .into_iter()
            .chain(self.fields.iter().map(String::as_str))
        {
            if !IDENTIFIER_PATTERN.is_match(name) {
                return Err(StorageError::InvalidMapping(format!(
                    "`{name}` is not a valid identifier in mapping of `{}`",
                    self.class
                )));
            }
        }
        if self.fields.iter().any(|field| field == IDENTIFIER_FIELD) {
            return Err(StorageError::InvalidMapping(format!(
                "`{IDENTIFIER_FIELD}` is implicit and must not be mapped for `{}`",
                self.class
            )));
        }
        Ok(())
    }
}

/// Registry answering "does this class have mapping information".
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    classes: BTreeMap<String, ClassMetadata>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `metadata`, replacing any earlier mapping of the same class.
    pub fn register(&mut self, metadata: ClassMetadata) -> StorageResult<()> {
        metadata.validate()?;
        self.classes.insert(metadata.class.clone(), metadata);
        Ok(())
    }

    pub fn class_metadata(&self, class: &str) -> Option<&ClassMetadata> {
        self.classes.get(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassMetadata> {
        self.classes.values()
    }
}
