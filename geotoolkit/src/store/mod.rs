//! Definitions stores: lookup of WKT definitions by primary key.
//!
//! Two backends are provided:
//! * [`PropertiesStore`] reads `code = WKT` pairs from properties files;
//! * [`SqlDefinitionsStore`] queries a `spatial_ref_sys`-like table through `rusqlite`.

use std::collections::BTreeSet;

use geotoolkit_types::{Identifier, ObjectType};
use thiserror::Error;

use crate::code::PrimaryKey;

mod properties;
pub use properties::PropertiesStore;

mod sql;
pub use sql::{SqlDefinitionsStore, SqlTableConfig};

/// Error of a definitions store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database returned an error.
    #[error("database error")]
    Backend(#[from] rusqlite::Error),

    /// Reading a definitions file failed.
    #[error("failed to read definitions")]
    Io(#[from] std::io::Error),

    /// A lookup that must be unique returned several different values.
    #[error("{candidates} different values found for {}", display_code(.authority, .code))]
    Integrity {
        /// Authority of the looked up code, if the lookup was scoped.
        authority: Option<String>,
        /// Looked up code or primary key.
        code: String,
        /// Number of distinct values returned.
        candidates: usize,
    },

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

fn display_code(authority: &Option<String>, code: &str) -> String {
    match authority {
        Some(authority) => format!("{authority}:{code}"),
        None => code.to_string(),
    }
}

/// Authority present in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityName {
    /// Name as stored.
    pub name: String,
    /// True if every code of this authority is equal to the primary key of its definition, so
    /// a numeric code can be used as a primary key without a lookup.
    pub codes_are_primary_keys: bool,
}

/// Read-only source of WKT definitions.
///
/// Lookups never change what later lookups return. A missing definition is `Ok(None)`, not an
/// error.
pub trait DefinitionsStore: Send {
    /// Definition stored under the key.
    fn get(&self, key: &PrimaryKey) -> Result<Option<String>, StoreError>;

    /// Returns true if a definition is stored under the key.
    fn contains_key(&self, key: &PrimaryKey) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Every code the store can resolve.
    fn codes(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Authorities whose codes are stored along with the definitions. Stores that only know
    /// primary keys return an empty list.
    fn authority_names(&self) -> Result<Vec<AuthorityName>, StoreError> {
        Ok(vec![])
    }

    /// Codes of the objects of the given type, if the store can select them itself. `None`
    /// lets the caller classify the definitions.
    fn authority_codes(
        &self,
        _object_type: ObjectType,
    ) -> Result<Option<BTreeSet<String>>, StoreError> {
        Ok(None)
    }

    /// Primary key of the object with the given code. The code has already been stripped of
    /// its authority token; `authority` is the code space it belongs to.
    fn primary_key(
        &self,
        _authority: Option<&str>,
        code: &str,
    ) -> Result<Option<PrimaryKey>, StoreError> {
        Ok(Some(PrimaryKey::Text(code.trim().to_string())))
    }

    /// All identifiers the store knows for the definition with the given primary key.
    fn aliases(&self, _key: &PrimaryKey) -> Result<Vec<Identifier>, StoreError> {
        Ok(vec![])
    }

    /// Returns false if it is known that no definition declares axes.
    fn mentions_axes(&self) -> bool {
        true
    }

    /// Releases the resources of the store. Closing a closed store does nothing.
    fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: DefinitionsStore + ?Sized> DefinitionsStore for Box<S> {
    fn get(&self, key: &PrimaryKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn contains_key(&self, key: &PrimaryKey) -> Result<bool, StoreError> {
        (**self).contains_key(key)
    }

    fn codes(&self) -> Result<BTreeSet<String>, StoreError> {
        (**self).codes()
    }

    fn authority_names(&self) -> Result<Vec<AuthorityName>, StoreError> {
        (**self).authority_names()
    }

    fn authority_codes(
        &self,
        object_type: ObjectType,
    ) -> Result<Option<BTreeSet<String>>, StoreError> {
        (**self).authority_codes(object_type)
    }

    fn primary_key(
        &self,
        authority: Option<&str>,
        code: &str,
    ) -> Result<Option<PrimaryKey>, StoreError> {
        (**self).primary_key(authority, code)
    }

    fn aliases(&self, key: &PrimaryKey) -> Result<Vec<Identifier>, StoreError> {
        (**self).aliases(key)
    }

    fn mentions_axes(&self) -> bool {
        (**self).mentions_axes()
    }

    fn close(&mut self) -> Result<(), StoreError> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_message() {
        let error = StoreError::Integrity {
            authority: Some("EPSG".into()),
            code: "4326".into(),
            candidates: 2,
        };
        assert_eq!(error.to_string(), "2 different values found for EPSG:4326");

        let error = StoreError::Integrity {
            authority: None,
            code: "4326".into(),
            candidates: 3,
        };
        assert_eq!(error.to_string(), "3 different values found for 4326");
    }
}
