use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use geotoolkit_types::referencing::{Ellipsoid, IdentifiedObject, ObjectProperties};
use geotoolkit_types::{Citation, ObjectType};
use rusqlite::Connection;
use web_time::Duration;

use crate::error::{FactoryError, FailureCause};
use crate::factory::{AuthorityCodes, AuthorityFactory, WktAuthorityFactory};
use crate::hints::{AxisOrder, Hints};
use crate::store::{PropertiesStore, SqlDefinitionsStore, SqlTableConfig};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

pub(crate) fn properties_factory(axis_order: AxisOrder) -> WktAuthorityFactory<PropertiesStore> {
    let store = PropertiesStore::from_sources([include_str!("../../test-data/epsg.properties")]);
    WktAuthorityFactory::new(
        store,
        vec![Citation::epsg()],
        &Hints::default().with_axis_order(axis_order),
    )
}

pub(crate) fn sql_factory(connection: Connection) -> WktAuthorityFactory<SqlDefinitionsStore> {
    WktAuthorityFactory::new(
        SqlDefinitionsStore::new(connection, SqlTableConfig::default()),
        vec![],
        &Hints::default(),
    )
}

/// `spatial_ref_sys` table in the PostGIS layout. WGS 84 is registered twice, by EPSG and by
/// ESRI under another code.
pub(crate) const FIXTURE_SQL: &str = r#"
CREATE TABLE spatial_ref_sys (
    srid INTEGER NOT NULL,
    auth_name TEXT,
    auth_srid INTEGER,
    srtext TEXT
);

INSERT INTO spatial_ref_sys VALUES (4326, 'EPSG', 4326,
    'GEOGCS["WGS 84", DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433], AXIS["Lat", NORTH], AXIS["Long", EAST]]');
INSERT INTO spatial_ref_sys VALUES (4326, 'ESRI', 104326,
    'GEOGCS["WGS 84", DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433], AXIS["Lat", NORTH], AXIS["Long", EAST]]');
INSERT INTO spatial_ref_sys VALUES (27700, 'EPSG', 27700,
    'PROJCS["OSGB 1936 / British National Grid", GEOGCS["OSGB 1936", DATUM["OSGB_1936", SPHEROID["Airy 1830", 6377563.396, 299.3249646]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433]], PROJECTION["Transverse_Mercator"], PARAMETER["latitude_of_origin", 49], PARAMETER["central_meridian", -2], PARAMETER["scale_factor", 0.9996012717], PARAMETER["false_easting", 400000], PARAMETER["false_northing", -100000], UNIT["metre", 1]]');
INSERT INTO spatial_ref_sys VALUES (32632, 'EPSG', 32632,
    'PROJCS["WGS 84 / UTM zone 32N", GEOGCS["WGS 84", DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433]], PROJECTION["Transverse_Mercator"], PARAMETER["central_meridian", 9], PARAMETER["scale_factor", 0.9996], PARAMETER["false_easting", 500000], UNIT["metre", 1]]');
INSERT INTO spatial_ref_sys VALUES (5773, 'EPSG', 5773,
    'VERT_CS["EGM96 height", VERT_DATUM["EGM96 geoid", 2005], UNIT["metre", 1], AXIS["Up", UP]]');
"#;

/// Two definitions registered by ESRI under the same code.
pub(crate) const DUPLICATED_KEY_SQL: &str = r#"
INSERT INTO spatial_ref_sys VALUES (900913, 'ESRI', 900913,
    'PROJCS["Google Maps Global Mercator", GEOGCS["WGS 84", DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433]], PROJECTION["Mercator_1SP"], UNIT["metre", 1]]');
INSERT INTO spatial_ref_sys VALUES (3857, 'ESRI', 900913,
    'PROJCS["WGS 84 / Pseudo-Mercator", GEOGCS["WGS 84", DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433]], PROJECTION["Mercator_1SP"], UNIT["metre", 1]]');
"#;

/// A second, different definition stored under primary key 4326.
pub(crate) const DUPLICATED_DEFINITION_SQL: &str = r#"
INSERT INTO spatial_ref_sys VALUES (4326, 'OGC', 84,
    'GEOGCS["other", DATUM["other", SPHEROID["other", 6378137, 298.257223563]], PRIMEM["Greenwich", 0], UNIT["degree", 0.0174532925199433]]');
"#;

/// In-memory database with the fixture table and the given additional statements.
pub(crate) fn sqlite_connection(extra: &[&str]) -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    connection.execute_batch(FIXTURE_SQL).unwrap();
    for sql in extra {
        connection.execute_batch(sql).unwrap();
    }

    connection
}

#[derive(Default)]
struct MockCounters {
    requests: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

/// Factory returning a new ellipsoid for every numeric code, after sleeping for a while.
///
/// Clones share the disposed flag. Siblings share only the request counters.
#[derive(Clone)]
pub(crate) struct MockFactory {
    delay: Duration,
    counters: Arc<MockCounters>,
    disposed: Arc<AtomicBool>,
}

impl MockFactory {
    pub(crate) fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            counters: Arc::default(),
            disposed: Arc::default(),
        }
    }

    pub(crate) fn sibling(&self) -> Self {
        Self {
            delay: self.delay,
            counters: self.counters.clone(),
            disposed: Arc::default(),
        }
    }

    pub(crate) fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn max_running(&self) -> usize {
        self.counters.max_running.load(Ordering::SeqCst)
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl AuthorityFactory for MockFactory {
    fn authority(&self) -> Result<Citation, FactoryError> {
        Ok(Citation::new("Mock"))
    }

    fn axis_order(&self) -> AxisOrder {
        AxisOrder::AsDeclared
    }

    fn create_object_with(
        &self,
        code: &str,
        _axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        if self.is_disposed() {
            return Err(FactoryError::failure(
                ObjectType::IdentifiedObject,
                code,
                FailureCause::Disposed,
            ));
        }

        let counters = &self.counters;
        counters.requests.fetch_add(1, Ordering::SeqCst);
        let running = counters.running.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_running.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        counters.running.fetch_sub(1, Ordering::SeqCst);

        if code.trim().parse::<u32>().is_err() {
            return Err(FactoryError::not_found(code, None));
        }

        Ok(Ellipsoid {
            properties: ObjectProperties::new(format!("Ellipsoid {code}")),
            ..Ellipsoid::wgs84()
        }
        .into())
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        Ok(AuthorityCodes::new(object_type, BTreeSet::new()))
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        Ok(format!("Mock {code}"))
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}
