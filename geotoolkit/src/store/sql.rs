use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::path::Path;

use geotoolkit_types::{Identifier, ObjectType};
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::code::PrimaryKey;
use crate::store::{AuthorityName, DefinitionsStore, StoreError};

/// Names of the table and columns holding the definitions.
///
/// Defaults follow the PostGIS `spatial_ref_sys` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlTableConfig {
    /// Schema of the table, if it must be qualified.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Integer primary key column.
    pub primary_key_column: String,
    /// Authority name column.
    pub authority_column: String,
    /// Authority code column.
    pub code_column: String,
    /// WKT column.
    pub definition_column: String,
}

impl Default for SqlTableConfig {
    fn default() -> Self {
        Self {
            schema: None,
            table: "spatial_ref_sys".into(),
            primary_key_column: "srid".into(),
            authority_column: "auth_name".into(),
            code_column: "auth_srid".into(),
            definition_column: "srtext".into(),
        }
    }
}

impl SqlTableConfig {
    /// Sets the schema qualifier.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the column names: primary key, authority name, authority code and WKT.
    pub fn with_columns(
        mut self,
        primary_key: impl Into<String>,
        authority: impl Into<String>,
        code: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        self.primary_key_column = primary_key.into();
        self.authority_column = authority.into();
        self.code_column = code.into();
        self.definition_column = definition.into();
        self
    }

    fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.table)),
            None => quote(&self.table),
        }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

struct Statements {
    definition: String,
    primary_key: String,
    aliases: String,
    authority_names: String,
    codes: String,
}

impl Statements {
    fn new(config: &SqlTableConfig) -> Self {
        let table = config.qualified_table();
        let srid = quote(&config.primary_key_column);
        let auth_name = quote(&config.authority_column);
        let auth_srid = quote(&config.code_column);
        let srtext = quote(&config.definition_column);

        Self {
            definition: format!("SELECT DISTINCT {srtext} FROM {table} WHERE {srid} = ?1"),
            primary_key: format!(
                "SELECT DISTINCT {srid} FROM {table} \
                 WHERE UPPER({auth_name}) = UPPER(?1) AND CAST({auth_srid} AS TEXT) = ?2"
            ),
            aliases: format!(
                "SELECT {auth_name}, CAST({auth_srid} AS TEXT) FROM {table} \
                 WHERE {srid} = ?1 AND {auth_name} IS NOT NULL ORDER BY {auth_name}"
            ),
            authority_names: format!(
                "SELECT {auth_name}, SUM(CASE WHEN {auth_srid} = {srid} THEN 0 ELSE 1 END) \
                 FROM {table} WHERE {auth_name} IS NOT NULL \
                 GROUP BY {auth_name} ORDER BY MIN({srid}), {auth_name}"
            ),
            codes: format!(
                "SELECT {srid}, {auth_name}, CAST({auth_srid} AS TEXT) FROM {table} \
                 WHERE {auth_name} IS NOT NULL"
            ),
        }
    }

    fn codes_like(&self, config: &SqlTableConfig, patterns: usize) -> String {
        let srtext = quote(&config.definition_column);
        let clauses: Vec<String> = (1..=patterns)
            .map(|index| format!("LTRIM({srtext}) LIKE ?{index}"))
            .collect();
        format!("{} AND ({})", self.codes, clauses.join(" OR "))
    }
}

/// Definitions stored in a table with four columns: integer primary key, authority name,
/// authority code and WKT (the `spatial_ref_sys` layout of PostGIS and GeoPackage).
///
/// Statements are prepared on first use and cached by the connection.
pub struct SqlDefinitionsStore {
    connection: Option<Connection>,
    config: SqlTableConfig,
    statements: Statements,
    authority_names: OnceCell<Vec<AuthorityName>>,
}

impl std::fmt::Debug for SqlDefinitionsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDefinitionsStore")
            .field("config", &self.config)
            .field("closed", &self.connection.is_none())
            .finish()
    }
}

impl SqlDefinitionsStore {
    /// Creates a store reading from the given connection.
    pub fn new(connection: Connection, config: SqlTableConfig) -> Self {
        Self {
            connection: Some(connection),
            statements: Statements::new(&config),
            config,
            authority_names: OnceCell::new(),
        }
    }

    /// Opens an SQLite database read-only. `path` may be a `file:` URI.
    pub fn open(path: impl AsRef<Path>, config: SqlTableConfig) -> Result<Self, StoreError> {
        log::debug!("Opening definitions database {:?}", path.as_ref());
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self::new(connection, config))
    }

    /// Table configuration.
    pub fn config(&self) -> &SqlTableConfig {
        &self.config
    }

    fn connection(&self) -> Result<&Connection, StoreError> {
        self.connection.as_ref().ok_or(StoreError::Closed)
    }

    fn names(&self) -> Result<&[AuthorityName], StoreError> {
        if let Some(names) = self.authority_names.get() {
            return Ok(names);
        }

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&self.statements.authority_names)?;
        let names = statement
            .query_map([], |row| {
                Ok(AuthorityName {
                    name: row.get(0)?,
                    codes_are_primary_keys: row.get::<_, i64>(1)? == 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Authorities found in {}: {names:?}", self.config.table);
        Ok(self.authority_names.get_or_init(|| names))
    }

    fn collect_codes(
        &self,
        sql: &str,
        patterns: Vec<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let names = self.names()?;
        let coincides = |authority: &str| {
            names
                .iter()
                .any(|name| name.codes_are_primary_keys && name.name == authority)
        };

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(sql)?;
        let mut rows = statement.query(params_from_iter(patterns))?;

        let mut codes = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let srid: i64 = row.get(0)?;
            let authority: String = row.get(1)?;
            let code: Option<String> = row.get(2)?;

            match code {
                _ if coincides(&authority) => codes.insert(srid.to_string()),
                Some(code) => codes.insert(format!("{authority}:{code}")),
                None => {
                    log::debug!("Skipping {authority} row without code (primary key {srid})");
                    false
                }
            };
        }

        Ok(codes)
    }
}

impl DefinitionsStore for SqlDefinitionsStore {
    fn get(&self, key: &PrimaryKey) -> Result<Option<String>, StoreError> {
        let Some(srid) = key.as_integer() else {
            return Ok(None);
        };

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&self.statements.definition)?;
        let definitions = statement
            .query_map(params![srid], |row| row.get::<_, Option<String>>(0))?
            .filter_map(Result::transpose)
            .collect::<Result<Vec<String>, _>>()?;

        match definitions.len() {
            0 => Ok(None),
            1 => Ok(definitions.into_iter().next()),
            candidates => Err(StoreError::Integrity {
                authority: None,
                code: srid.to_string(),
                candidates,
            }),
        }
    }

    fn codes(&self) -> Result<BTreeSet<String>, StoreError> {
        self.collect_codes(&self.statements.codes, vec![])
    }

    fn authority_names(&self) -> Result<Vec<AuthorityName>, StoreError> {
        Ok(self.names()?.to_vec())
    }

    fn authority_codes(
        &self,
        object_type: ObjectType,
    ) -> Result<Option<BTreeSet<String>>, StoreError> {
        if object_type == ObjectType::IdentifiedObject {
            return self.codes().map(Some);
        }

        let patterns: Vec<String> = object_type
            .wkt_keywords()
            .into_iter()
            .map(|keyword| format!("{keyword}%"))
            .collect();
        if patterns.is_empty() {
            return Ok(Some(BTreeSet::new()));
        }

        let sql = self.statements.codes_like(&self.config, patterns.len());
        self.collect_codes(&sql, patterns).map(Some)
    }

    fn primary_key(
        &self,
        authority: Option<&str>,
        code: &str,
    ) -> Result<Option<PrimaryKey>, StoreError> {
        let code = code.trim();
        let Some(authority) = authority else {
            return Ok(code.parse().ok().map(PrimaryKey::Integer));
        };

        let coincides = self
            .names()?
            .iter()
            .any(|name| name.codes_are_primary_keys && name.name.eq_ignore_ascii_case(authority));
        if coincides {
            if let Ok(srid) = code.parse::<i64>() {
                return Ok(Some(PrimaryKey::Integer(srid)));
            }
        }

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&self.statements.primary_key)?;
        let keys = statement
            .query_map(params![authority, code], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        match keys.as_slice() {
            [] => Ok(None),
            [srid] => Ok(Some(PrimaryKey::Integer(*srid))),
            _ => Err(StoreError::Integrity {
                authority: Some(authority.to_string()),
                code: code.to_string(),
                candidates: keys.len(),
            }),
        }
    }

    fn aliases(&self, key: &PrimaryKey) -> Result<Vec<Identifier>, StoreError> {
        let Some(srid) = key.as_integer() else {
            return Ok(vec![]);
        };

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&self.statements.aliases)?;
        let aliases = statement
            .query_map(params![srid], |row| {
                let authority: String = row.get(0)?;
                let code: Option<String> = row.get(1)?;
                Ok(code.map(|code| Identifier::new(authority, code)))
            })?
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(aliases)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        connection.flush_prepared_statement_cache();
        connection.close().map_err(|(_, err)| StoreError::Backend(err))?;
        log::debug!("Closed definitions database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::tests::{sqlite_connection, DUPLICATED_DEFINITION_SQL, DUPLICATED_KEY_SQL};

    fn store() -> SqlDefinitionsStore {
        SqlDefinitionsStore::new(sqlite_connection(&[]), SqlTableConfig::default())
    }

    #[test]
    fn authority_names() {
        let names = store().authority_names().unwrap();
        assert_eq!(
            names,
            [
                AuthorityName {
                    name: "EPSG".into(),
                    codes_are_primary_keys: true
                },
                AuthorityName {
                    name: "ESRI".into(),
                    codes_are_primary_keys: false
                },
            ]
        );
    }

    #[test]
    fn primary_keys() {
        let store = store();

        assert_eq!(
            store.primary_key(Some("epsg"), "4326").unwrap(),
            Some(PrimaryKey::Integer(4326))
        );
        assert_eq!(
            store.primary_key(Some("ESRI"), "104326").unwrap(),
            Some(PrimaryKey::Integer(4326))
        );
        assert_eq!(store.primary_key(Some("ESRI"), "4326").unwrap(), None);
        assert_eq!(
            store.primary_key(None, "27700").unwrap(),
            Some(PrimaryKey::Integer(27700))
        );
        assert_eq!(store.primary_key(None, "abc").unwrap(), None);
    }

    #[test]
    fn definitions_and_aliases() {
        let store = store();

        assert!(store
            .get(&PrimaryKey::Integer(4326))
            .unwrap()
            .is_some_and(|wkt| wkt.starts_with("GEOGCS")));
        assert_eq!(store.get(&PrimaryKey::Integer(1)).unwrap(), None);
        assert_eq!(store.get(&"not a number".into()).unwrap(), None);

        assert_eq!(
            store.aliases(&PrimaryKey::Integer(4326)).unwrap(),
            [
                Identifier::new("EPSG", "4326"),
                Identifier::new("ESRI", "104326")
            ]
        );
    }

    #[test]
    fn codes() {
        let store = store();

        let all = store.codes().unwrap();
        assert!(all.contains("4326"));
        assert!(all.contains("ESRI:104326"));
        assert!(all.contains("5773"));

        let projected = store
            .authority_codes(ObjectType::ProjectedCrs)
            .unwrap()
            .unwrap();
        assert_eq!(projected.into_iter().collect::<Vec<_>>(), ["27700", "32632"]);

        let geographic = store
            .authority_codes(ObjectType::GeographicCrs)
            .unwrap()
            .unwrap();
        assert_eq!(
            geographic.into_iter().collect::<Vec<_>>(),
            ["4326", "ESRI:104326"]
        );

        let datums = store.authority_codes(ObjectType::Datum).unwrap().unwrap();
        assert!(datums.is_empty());
    }

    #[test]
    fn rows_without_code() {
        let store = SqlDefinitionsStore::new(
            sqlite_connection(&[
                "INSERT INTO spatial_ref_sys VALUES (4326, 'OGC', NULL, 'GEOGCS[\"WGS 84\"]');",
            ]),
            SqlTableConfig::default(),
        );

        let all = store.codes().unwrap();
        assert!(all.contains("4326"));
        assert!(!all.iter().any(|code| code.starts_with("OGC")));
        assert_eq!(
            store.aliases(&PrimaryKey::Integer(4326)).unwrap(),
            [
                Identifier::new("EPSG", "4326"),
                Identifier::new("ESRI", "104326")
            ]
        );
    }

    #[test]
    fn duplicated_primary_key() {
        let store = SqlDefinitionsStore::new(
            sqlite_connection(&[DUPLICATED_KEY_SQL]),
            SqlTableConfig::default(),
        );

        assert_matches!(
            store.primary_key(Some("ESRI"), "900913"),
            Err(StoreError::Integrity { authority: Some(authority), candidates: 2, .. }) if authority == "ESRI"
        );
    }

    #[test]
    fn duplicated_definition() {
        let store = SqlDefinitionsStore::new(
            sqlite_connection(&[DUPLICATED_DEFINITION_SQL]),
            SqlTableConfig::default(),
        );

        assert_matches!(
            store.get(&PrimaryKey::Integer(4326)),
            Err(StoreError::Integrity { authority: None, candidates: 2, .. })
        );
    }

    #[test]
    fn close_twice() {
        let mut store = store();
        store.close().unwrap();
        store.close().unwrap();

        assert_matches!(store.get(&PrimaryKey::Integer(4326)), Err(StoreError::Closed));
    }

    #[test]
    fn custom_table() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                r#"CREATE TABLE "crs defs" (id INTEGER, org TEXT, org_code INTEGER, wkt TEXT);
                INSERT INTO "crs defs" VALUES (1, 'LOCAL', 1, 'LOCAL_CS["site", LOCAL_DATUM["d", 0], UNIT["metre", 1]]');"#,
            )
            .unwrap();
        let config = SqlTableConfig::default()
            .with_table("crs defs")
            .with_columns("id", "org", "org_code", "wkt");
        let store = SqlDefinitionsStore::new(connection, config);

        assert_eq!(store.codes().unwrap().into_iter().collect::<Vec<_>>(), ["1"]);
        assert!(store.get(&PrimaryKey::Integer(1)).unwrap().is_some());
    }
}
