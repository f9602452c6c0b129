//! Assembly of ready to use CRS authority factories.

use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use geotoolkit_types::referencing::IdentifiedObject;
use geotoolkit_types::{Citation, ObjectType};
use rusqlite::Connection;

use crate::code::normalize_code;
use crate::error::FactoryError;
use crate::factory::{
    AuthorityCodes, AuthorityFactory, CachingAuthorityFactory, PoolStatistics,
    ThreadedAuthorityFactory, WktAuthorityFactory,
};
use crate::hints::{AxisOrder, Hints};
use crate::store::{
    DefinitionsStore, PropertiesStore, SqlDefinitionsStore, SqlTableConfig, StoreError,
};

type Connector = Arc<dyn Fn() -> rusqlite::Result<Connection> + Send + Sync>;
type BackingFactory = WktAuthorityFactory<Box<dyn DefinitionsStore>>;
type Constructor = Box<dyn Fn() -> Result<BackingFactory, FactoryError> + Send + Sync>;

enum Source {
    PropertiesFiles(Vec<PathBuf>),
    PropertiesSources(Vec<String>),
    Sql(Connector),
    SqliteFile(PathBuf),
}

/// Builder of [`CrsAuthorityFactory`].
///
/// ```
/// use geotoolkit::builder::AuthorityFactoryBuilder;
/// use geotoolkit::{AuthorityFactory, Citation};
///
/// let factory = AuthorityFactoryBuilder::from_properties_sources(vec![
///     "4326 = GEOGCS[\"WGS 84\", DATUM[\"WGS_1984\", SPHEROID[\"WGS 84\", 6378137, 298.257223563]], \
///      PRIMEM[\"Greenwich\", 0], UNIT[\"degree\", 0.0174532925199433]]".to_string(),
/// ])
/// .with_authority(Citation::epsg())
/// .build()
/// .unwrap();
///
/// let crs = factory.create_coordinate_reference_system("urn:ogc:def:crs:EPSG::4326").unwrap();
/// assert_eq!(crs.dimension(), 2);
/// ```
pub struct AuthorityFactoryBuilder {
    source: Option<Source>,
    authorities: Vec<Citation>,
    hints: Hints,
    table: SqlTableConfig,
}

impl AuthorityFactoryBuilder {
    fn with_source(source: Source) -> Self {
        Self {
            source: Some(source),
            authorities: vec![],
            hints: Hints::default(),
            table: SqlTableConfig::default(),
        }
    }

    /// Definitions read from properties files. When several files define the same code, the
    /// first file wins. Properties files require an authority.
    pub fn from_properties_files(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self::with_source(Source::PropertiesFiles(
            paths.into_iter().map(Into::into).collect(),
        ))
    }

    /// Definitions given as properties text, highest priority first.
    pub fn from_properties_sources(sources: Vec<String>) -> Self {
        Self::with_source(Source::PropertiesSources(sources))
    }

    /// Definitions read from an SQL table. `connector` opens a connection for every backing
    /// factory of the pool.
    pub fn from_sql(
        connector: impl Fn() -> rusqlite::Result<Connection> + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(Source::Sql(Arc::new(connector)))
    }

    /// Definitions read from an SQLite database file, opened read-only.
    pub fn from_sqlite_file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::SqliteFile(path.into()))
    }

    /// Adds an authority. The first authority is the one whose codes are primary keys. SQL
    /// sources without configured authorities use the authorities found in the table.
    pub fn with_authority(mut self, authority: Citation) -> Self {
        self.authorities.push(authority);
        self
    }

    /// Sets the hints.
    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    /// Sets the table layout of SQL sources.
    pub fn with_table(mut self, table: SqlTableConfig) -> Self {
        self.table = table;
        self
    }

    /// Builds the factory and creates its first backing factory, so that unreadable sources
    /// are reported here.
    pub fn build(self) -> Result<CrsAuthorityFactory, FactoryError> {
        let Self {
            source,
            authorities,
            hints,
            table,
        } = self;

        let source = source
            .ok_or_else(|| FactoryError::Configuration("no definitions source".into()))?;
        let constructor = constructor(source, authorities, table, &hints)?;

        let pool = ThreadedAuthorityFactory::new(constructor, &hints)?;
        pool.warm_up()?;

        Ok(CrsAuthorityFactory {
            inner: CachingAuthorityFactory::new(pool, &hints),
        })
    }
}

fn constructor(
    source: Source,
    authorities: Vec<Citation>,
    table: SqlTableConfig,
    hints: &Hints,
) -> Result<Constructor, FactoryError> {
    let hints = hints.clone();
    let load_failure =
        |err: StoreError| FactoryError::failure(ObjectType::IdentifiedObject, "", err);

    let store = match source {
        Source::PropertiesFiles(paths) => {
            PropertiesStore::from_files(&paths).map_err(load_failure)?
        }
        Source::PropertiesSources(sources) => {
            PropertiesStore::from_sources(sources.iter().map(String::as_str))
        }
        Source::Sql(connector) => {
            return Ok(Box::new(
                move || -> Result<BackingFactory, FactoryError> {
                    let connection = connector().map_err(|err| load_failure(err.into()))?;
                    let store = SqlDefinitionsStore::new(connection, table.clone());
                    Ok(WktAuthorityFactory::new(
                        Box::new(store) as Box<dyn DefinitionsStore>,
                        authorities.clone(),
                        &hints,
                    ))
                },
            ));
        }
        Source::SqliteFile(path) => {
            return Ok(Box::new(
                move || -> Result<BackingFactory, FactoryError> {
                    let store =
                        SqlDefinitionsStore::open(&path, table.clone()).map_err(load_failure)?;
                    Ok(WktAuthorityFactory::new(
                        Box::new(store) as Box<dyn DefinitionsStore>,
                        authorities.clone(),
                        &hints,
                    ))
                },
            ));
        }
    };

    if authorities.is_empty() {
        return Err(FactoryError::Configuration(
            "properties definitions require an authority".into(),
        ));
    }

    log::debug!("Loaded {} definitions", store.len());
    Ok(Box::new(move || -> Result<BackingFactory, FactoryError> {
        Ok(WktAuthorityFactory::new(
            Box::new(store.clone()) as Box<dyn DefinitionsStore>,
            authorities.clone(),
            &hints,
        ))
    }))
}

/// CRS authority factory made of a cache in front of a pool of WKT parsing factories.
///
/// Codes given in URN or URL form (`urn:ogc:def:crs:EPSG::4326`) are converted to
/// `AUTHORITY:CODE` before the lookup.
pub struct CrsAuthorityFactory {
    inner: CachingAuthorityFactory<ThreadedAuthorityFactory<BackingFactory>>,
}

impl CrsAuthorityFactory {
    /// Counters of the pool of backing factories.
    pub fn pool_statistics(&self) -> PoolStatistics {
        self.inner.backing().statistics()
    }

    /// Number of objects in the cache.
    pub fn cached(&self) -> usize {
        self.inner.cached()
    }
}

impl Debug for CrsAuthorityFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsAuthorityFactory")
            .field("axis_order", &self.inner.axis_order())
            .field("cached", &self.cached())
            .field("pool", &self.pool_statistics())
            .finish()
    }
}

impl AuthorityFactory for CrsAuthorityFactory {
    fn authority(&self) -> Result<Citation, FactoryError> {
        self.inner.authority()
    }

    fn axis_order(&self) -> AxisOrder {
        self.inner.axis_order()
    }

    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        self.inner
            .create_object_with(&normalize_code(code), axis_order)
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        self.inner.authority_codes(object_type)
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        self.inner.description_text(&normalize_code(code))
    }

    fn dispose(&self) {
        self.inner.dispose();
    }

    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        self.inner.trim_authority(&normalize_code(code))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use geotoolkit_types::referencing::Identified;

    use super::*;
    use crate::error::FailureCause;
    use crate::tests::{init_logger, sqlite_connection, test_data, FIXTURE_SQL};

    fn properties_factory() -> CrsAuthorityFactory {
        AuthorityFactoryBuilder::from_properties_files([
            test_data("override.properties"),
            test_data("epsg.properties"),
        ])
        .with_authority(Citation::epsg())
        .build()
        .unwrap()
    }

    #[test]
    fn configuration_errors() {
        assert_matches!(
            AuthorityFactoryBuilder::from_properties_sources(vec!["1 = GEOGCS[\"x\"]".into()])
                .build(),
            Err(FactoryError::Configuration(_))
        );

        assert_matches!(
            AuthorityFactoryBuilder::from_properties_files(["does/not/exist.properties"])
                .with_authority(Citation::epsg())
                .build(),
            Err(FactoryError::Failure {
                cause: FailureCause::Store(StoreError::Io(_)),
                ..
            })
        );
    }

    #[test]
    fn properties_files_by_priority() {
        init_logger();
        let factory = properties_factory();

        let crs = factory
            .create_coordinate_reference_system("urn:ogc:def:crs:EPSG::27700")
            .unwrap();
        assert!(crs.name().contains("overridden"));

        let again = factory
            .create_coordinate_reference_system("EPSG:27700")
            .unwrap();
        assert!(Arc::ptr_eq(&crs, &again));
        assert_eq!(factory.cached(), 1);
        assert!(format!("{factory:?}").contains("cached: 1"));

        assert_eq!(
            factory
                .description_text("http://www.opengis.net/def/crs/EPSG/0/32632")
                .unwrap(),
            "WGS 84 / UTM zone 32N"
        );
        assert_eq!(factory.pool_statistics().created, 1);
    }

    #[test]
    fn not_found_through_the_stack() {
        let factory = properties_factory();

        assert_matches!(
            factory.create_object("ZZZ:99999"),
            Err(FactoryError::NoSuchAuthorityCode { authority: Some(authority), .. }) if authority == "ZZZ"
        );
        assert_matches!(
            factory.create_object("99999"),
            Err(FactoryError::NoSuchAuthorityCode { authority: None, .. })
        );
    }

    #[test]
    fn hints_are_applied() {
        let factory = AuthorityFactoryBuilder::from_properties_files([test_data("epsg.properties")])
            .with_authority(Citation::epsg())
            .with_hints(
                Hints::default()
                    .with_axis_order(AxisOrder::LongitudeFirst)
                    .with_max_concurrency(1),
            )
            .build()
            .unwrap();

        assert_eq!(factory.axis_order(), AxisOrder::LongitudeFirst);
        assert!(factory
            .create_coordinate_reference_system("4326")
            .unwrap()
            .is_longitude_first());
    }

    #[test]
    fn sql_source() {
        init_logger();
        let factory = AuthorityFactoryBuilder::from_sql(|| Ok(sqlite_connection(&[])))
            .build()
            .unwrap();

        let epsg = factory.create_object("EPSG:4326").unwrap();
        let esri = factory.create_object("ESRI:104326").unwrap();
        assert_eq!(epsg, esri);
        assert_eq!(epsg.identifiers().len(), 2);

        let authority = factory.authority().unwrap();
        assert!(authority.identifies("ESRI"));

        let projected = factory
            .authority_codes(ObjectType::ProjectedCrs)
            .unwrap()
            .to_set()
            .unwrap();
        assert_eq!(projected.into_iter().collect::<Vec<_>>(), ["27700", "32632"]);
    }

    #[test]
    fn sqlite_file_source() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!(
            "geotoolkit-builder-{}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Connection::open(&path)?.execute_batch(FIXTURE_SQL)?;

        let factory = AuthorityFactoryBuilder::from_sqlite_file(&path)
            .with_authority(Citation::epsg())
            .build()?;
        assert_eq!(factory.description_text("EPSG:5773")?, "EGM96 height");

        factory.dispose();
        std::fs::remove_file(&path)?;

        assert_matches!(
            AuthorityFactoryBuilder::from_sqlite_file(&path).build(),
            Err(FactoryError::Failure {
                cause: FailureCause::Store(StoreError::Backend(_)),
                ..
            })
        );
        Ok(())
    }

    #[test]
    fn disposal() {
        let factory = properties_factory();
        factory.create_object("4326").unwrap();

        factory.dispose();
        assert_eq!(factory.pool_statistics().live, 0);
        assert_matches!(
            factory.create_object("4326"),
            Err(FactoryError::Failure {
                cause: FailureCause::Disposed,
                ..
            })
        );
    }
}
