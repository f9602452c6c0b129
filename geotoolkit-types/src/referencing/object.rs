use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{CoordinateReferenceSystem, Datum, Ellipsoid, PrimeMeridian};
use crate::{Citation, Identifier, ObjectType};

/// Name and identifiers of an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperties {
    /// Human-readable name.
    pub name: String,
    /// Codes assigned to the object by authorities.
    pub identifiers: Vec<Identifier>,
}

impl ObjectProperties {
    /// Creates properties with the given name and no identifiers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifiers: vec![],
        }
    }

    /// Adds an identifier.
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.add_identifier(identifier);
        self
    }

    /// Adds an identifier unless the same one is already present. Returns true if it was added.
    pub fn add_identifier(&mut self, identifier: Identifier) -> bool {
        if self.identifiers.contains(&identifier) {
            return false;
        }

        self.identifiers.push(identifier);
        true
    }
}

/// Objects that have a name and identifiers.
pub trait Identified {
    /// Name and identifiers of the object.
    fn properties(&self) -> &ObjectProperties;

    /// Name of the object.
    fn name(&self) -> &str {
        &self.properties().name
    }

    /// All identifiers of the object.
    fn identifiers(&self) -> &[Identifier] {
        &self.properties().identifiers
    }

    /// The first identifier issued by the given authority.
    fn identifier(&self, authority: &Citation) -> Option<&Identifier> {
        self.identifiers()
            .iter()
            .find(|identifier| identifier.is_issued_by(authority))
    }
}

/// Any object an authority factory can create.
///
/// Cloning is cheap: the objects are shared, and two handles to the same instance can be
/// compared with [`IdentifiedObject::ptr_eq`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdentifiedObject {
    /// Coordinate reference system.
    Crs(Arc<CoordinateReferenceSystem>),
    /// Datum.
    Datum(Arc<Datum>),
    /// Ellipsoid.
    Ellipsoid(Arc<Ellipsoid>),
    /// Prime meridian.
    PrimeMeridian(Arc<PrimeMeridian>),
}

impl IdentifiedObject {
    /// Most specific type of the object.
    pub fn object_type(&self) -> ObjectType {
        match self {
            IdentifiedObject::Crs(crs) => crs.object_type(),
            IdentifiedObject::Datum(datum) => datum.object_type(),
            IdentifiedObject::Ellipsoid(_) => ObjectType::Ellipsoid,
            IdentifiedObject::PrimeMeridian(_) => ObjectType::PrimeMeridian,
        }
    }

    /// The CRS, if the object is one.
    pub fn as_crs(&self) -> Option<&Arc<CoordinateReferenceSystem>> {
        match self {
            IdentifiedObject::Crs(crs) => Some(crs),
            _ => None,
        }
    }

    /// The datum, if the object is one.
    pub fn as_datum(&self) -> Option<&Arc<Datum>> {
        match self {
            IdentifiedObject::Datum(datum) => Some(datum),
            _ => None,
        }
    }

    /// Returns true if both handles point to the same instance.
    pub fn ptr_eq(&self, other: &IdentifiedObject) -> bool {
        match (self, other) {
            (IdentifiedObject::Crs(a), IdentifiedObject::Crs(b)) => Arc::ptr_eq(a, b),
            (IdentifiedObject::Datum(a), IdentifiedObject::Datum(b)) => Arc::ptr_eq(a, b),
            (IdentifiedObject::Ellipsoid(a), IdentifiedObject::Ellipsoid(b)) => Arc::ptr_eq(a, b),
            (IdentifiedObject::PrimeMeridian(a), IdentifiedObject::PrimeMeridian(b)) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl Identified for IdentifiedObject {
    fn properties(&self) -> &ObjectProperties {
        match self {
            IdentifiedObject::Crs(crs) => crs.properties(),
            IdentifiedObject::Datum(datum) => datum.properties(),
            IdentifiedObject::Ellipsoid(ellipsoid) => ellipsoid.properties(),
            IdentifiedObject::PrimeMeridian(prime_meridian) => prime_meridian.properties(),
        }
    }
}

impl From<CoordinateReferenceSystem> for IdentifiedObject {
    fn from(value: CoordinateReferenceSystem) -> Self {
        Self::Crs(Arc::new(value))
    }
}

impl From<Datum> for IdentifiedObject {
    fn from(value: Datum) -> Self {
        Self::Datum(Arc::new(value))
    }
}

impl From<Ellipsoid> for IdentifiedObject {
    fn from(value: Ellipsoid) -> Self {
        Self::Ellipsoid(Arc::new(value))
    }
}

impl From<PrimeMeridian> for IdentifiedObject {
    fn from(value: PrimeMeridian) -> Self {
        Self::PrimeMeridian(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn duplicated_identifiers_are_skipped() {
        let mut properties = ObjectProperties::new("WGS 84");
        assert!(properties.add_identifier(Identifier::new("EPSG", "4326")));
        assert!(!properties.add_identifier(Identifier::new("EPSG", "4326")));
        assert!(properties.add_identifier(Identifier::new("ESRI", "4326")));
        assert_eq!(properties.identifiers.len(), 2);
    }

    #[test]
    fn shared_instances() {
        let object = IdentifiedObject::from(Ellipsoid::wgs84());
        assert_matches!(
            &object,
            IdentifiedObject::Ellipsoid(ellipsoid) if ellipsoid.name() == "WGS 84"
        );
        assert_eq!(object.object_type(), ObjectType::Ellipsoid);
        assert!(object.as_crs().is_none());

        assert!(object.ptr_eq(&object.clone()));
        let equal = IdentifiedObject::from(Ellipsoid::wgs84());
        assert_eq!(object, equal);
        assert!(!object.ptr_eq(&equal));
    }

    #[test]
    fn serialized_form() {
        let object = IdentifiedObject::from(Ellipsoid {
            properties: ObjectProperties::new("WGS 84")
                .with_identifier(Identifier::new("EPSG", "7030")),
            ..Ellipsoid::wgs84()
        });

        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["Ellipsoid"]["properties"]["name"], "WGS 84");
        assert_eq!(
            json["Ellipsoid"]["properties"]["identifiers"][0],
            serde_json::json!({ "authority": "EPSG", "code": "7030" })
        );

        let restored: IdentifiedObject = serde_json::from_value(json).unwrap();
        assert_eq!(restored, object);
        assert_eq!(
            restored.identifier(&Citation::epsg()).map(Identifier::code),
            Some("7030")
        );
    }
}
