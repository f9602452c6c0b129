use geotoolkit_types::referencing::{
    Axis, AxisDirection, CompoundCrs, CoordinateReferenceSystem, Datum, Ellipsoid,
    EngineeringCrs, EngineeringDatum, GeocentricCrs, GeodeticDatum, GeographicCrs,
    IdentifiedObject, ObjectProperties, Parameter, PrimeMeridian, ProjectedCrs, Projection, Unit,
    VerticalCrs, VerticalDatum,
};
use geotoolkit_types::Identifier;

use crate::element::Element;
use crate::error::WktError;
use crate::PropertiesHook;

const CRS_KEYWORDS: &str = "GEOGCS, PROJCS, GEOCCS, VERT_CS, COMPD_CS or LOCAL_CS";
const COMPONENT_KEYWORDS: [&str; 6] = [
    "GEOGCS", "PROJCS", "GEOCCS", "VERT_CS", "COMPD_CS", "LOCAL_CS",
];

pub(crate) struct ObjectBuilder<'a> {
    pub(crate) ignore_axes: bool,
    pub(crate) hook: Option<&'a dyn PropertiesHook>,
}

impl ObjectBuilder<'_> {
    pub(crate) fn build(&self, root: &Element) -> Result<IdentifiedObject, WktError> {
        let object = match root.keyword.as_str() {
            "DATUM" => Datum::Geodetic(self.geodetic_datum(root, true)?).into(),
            "VERT_DATUM" => Datum::Vertical(self.vertical_datum(root, true)?).into(),
            "LOCAL_DATUM" => Datum::Engineering(self.engineering_datum(root, true)?).into(),
            "SPHEROID" => self.ellipsoid(root, true)?.into(),
            "PRIMEM" => self.prime_meridian(root, true)?.into(),
            _ => self.crs(root, true)?.into(),
        };

        Ok(object)
    }

    fn properties(&self, element: &Element, is_root: bool) -> Result<ObjectProperties, WktError> {
        let mut properties = ObjectProperties::new(element.text(0)?);
        for authority in element.children("AUTHORITY") {
            properties.add_identifier(Identifier::new(
                authority.text(0)?,
                authority.text_or_number(1)?,
            ));
        }

        if is_root {
            if let Some(hook) = self.hook {
                hook.complete(&element.keyword, &mut properties);
            }
        }

        Ok(properties)
    }

    fn crs(&self, element: &Element, is_root: bool) -> Result<CoordinateReferenceSystem, WktError> {
        let crs = match element.keyword.as_str() {
            "GEOGCS" => CoordinateReferenceSystem::Geographic(self.geographic(element, is_root)?),
            "PROJCS" => CoordinateReferenceSystem::Projected(self.projected(element, is_root)?),
            "GEOCCS" => CoordinateReferenceSystem::Geocentric(self.geocentric(element, is_root)?),
            "VERT_CS" => CoordinateReferenceSystem::Vertical(self.vertical(element, is_root)?),
            "COMPD_CS" => CoordinateReferenceSystem::Compound(self.compound(element, is_root)?),
            "LOCAL_CS" => {
                CoordinateReferenceSystem::Engineering(self.engineering(element, is_root)?)
            }
            other => {
                return Err(WktError::UnexpectedElement {
                    expected: CRS_KEYWORDS,
                    found: other.to_string(),
                })
            }
        };

        Ok(crs)
    }

    fn geographic(&self, element: &Element, is_root: bool) -> Result<GeographicCrs, WktError> {
        skip_unknown(element, &["DATUM", "PRIMEM", "UNIT", "AXIS", "AUTHORITY"]);
        Ok(GeographicCrs {
            properties: self.properties(element, is_root)?,
            datum: self.geodetic_datum(element.required_child("DATUM")?, false)?,
            prime_meridian: self.prime_meridian(element.required_child("PRIMEM")?, false)?,
            unit: unit(element.required_child("UNIT")?)?,
            axes: self.axes(element, 2, GeographicCrs::default_axes)?,
        })
    }

    fn projected(&self, element: &Element, is_root: bool) -> Result<ProjectedCrs, WktError> {
        skip_unknown(
            element,
            &["GEOGCS", "PROJECTION", "PARAMETER", "UNIT", "AXIS", "AUTHORITY"],
        );

        let projection_element = element.required_child("PROJECTION")?;
        let parameters = element
            .children("PARAMETER")
            .map(|parameter| {
                Ok(Parameter {
                    name: parameter.text(0)?.to_string(),
                    value: parameter.number(1)?,
                })
            })
            .collect::<Result<Vec<_>, WktError>>()?;

        Ok(ProjectedCrs {
            properties: self.properties(element, is_root)?,
            base: self.geographic(element.required_child("GEOGCS")?, false)?,
            projection: Projection {
                properties: self.properties(projection_element, false)?,
                parameters,
            },
            unit: unit(element.required_child("UNIT")?)?,
            axes: self.axes(element, 2, ProjectedCrs::default_axes)?,
        })
    }

    fn geocentric(&self, element: &Element, is_root: bool) -> Result<GeocentricCrs, WktError> {
        skip_unknown(element, &["DATUM", "PRIMEM", "UNIT", "AXIS", "AUTHORITY"]);
        Ok(GeocentricCrs {
            properties: self.properties(element, is_root)?,
            datum: self.geodetic_datum(element.required_child("DATUM")?, false)?,
            prime_meridian: self.prime_meridian(element.required_child("PRIMEM")?, false)?,
            unit: unit(element.required_child("UNIT")?)?,
            axes: self.axes(element, 3, GeocentricCrs::default_axes)?,
        })
    }

    fn vertical(&self, element: &Element, is_root: bool) -> Result<VerticalCrs, WktError> {
        skip_unknown(element, &["VERT_DATUM", "UNIT", "AXIS", "AUTHORITY"]);
        Ok(VerticalCrs {
            properties: self.properties(element, is_root)?,
            datum: self.vertical_datum(element.required_child("VERT_DATUM")?, false)?,
            unit: unit(element.required_child("UNIT")?)?,
            axes: self.axes(element, 1, VerticalCrs::default_axes)?,
        })
    }

    fn compound(&self, element: &Element, is_root: bool) -> Result<CompoundCrs, WktError> {
        skip_unknown(
            element,
            &["GEOGCS", "PROJCS", "GEOCCS", "VERT_CS", "COMPD_CS", "LOCAL_CS", "AUTHORITY"],
        );
        let components = element
            .elements()
            .filter(|child| COMPONENT_KEYWORDS.contains(&child.keyword.as_str()))
            .map(|child| self.crs(child, false))
            .collect::<Result<Vec<_>, WktError>>()?;

        if components.len() < 2 {
            return Err(element.invalid(format!(
                "expected at least 2 components, found {}",
                components.len()
            )));
        }

        Ok(CompoundCrs {
            properties: self.properties(element, is_root)?,
            components,
        })
    }

    fn engineering(&self, element: &Element, is_root: bool) -> Result<EngineeringCrs, WktError> {
        skip_unknown(element, &["LOCAL_DATUM", "UNIT", "AXIS", "AUTHORITY"]);

        // Declared local axes are kept even when other axes are ignored.
        let declared = element
            .children("AXIS")
            .map(axis)
            .collect::<Result<Vec<_>, WktError>>()?;
        Ok(EngineeringCrs {
            properties: self.properties(element, is_root)?,
            datum: self.engineering_datum(element.required_child("LOCAL_DATUM")?, false)?,
            unit: unit(element.required_child("UNIT")?)?,
            axes: if declared.is_empty() {
                ProjectedCrs::default_axes()
            } else {
                declared
            },
        })
    }

    fn geodetic_datum(&self, element: &Element, is_root: bool) -> Result<GeodeticDatum, WktError> {
        skip_unknown(element, &["SPHEROID", "TOWGS84", "AUTHORITY"]);

        let to_wgs84 = match element.child("TOWGS84") {
            Some(towgs84) => {
                let values = towgs84.numbers()?;
                if values.len() != 3 && values.len() != 7 {
                    return Err(towgs84.invalid(format!(
                        "expected 3 or 7 parameters, found {}",
                        values.len()
                    )));
                }
                Some(values)
            }
            None => None,
        };

        Ok(GeodeticDatum {
            properties: self.properties(element, is_root)?,
            ellipsoid: self.ellipsoid(element.required_child("SPHEROID")?, false)?,
            to_wgs84,
        })
    }

    fn vertical_datum(&self, element: &Element, is_root: bool) -> Result<VerticalDatum, WktError> {
        Ok(VerticalDatum {
            properties: self.properties(element, is_root)?,
            datum_type: datum_type(element)?,
        })
    }

    fn engineering_datum(
        &self,
        element: &Element,
        is_root: bool,
    ) -> Result<EngineeringDatum, WktError> {
        Ok(EngineeringDatum {
            properties: self.properties(element, is_root)?,
            datum_type: datum_type(element)?,
        })
    }

    fn ellipsoid(&self, element: &Element, is_root: bool) -> Result<Ellipsoid, WktError> {
        let semi_major_axis = element.number(1)?;
        if semi_major_axis <= 0.0 || !semi_major_axis.is_finite() {
            return Err(element.invalid(format!("invalid semi-major axis {semi_major_axis}")));
        }

        Ok(Ellipsoid {
            properties: self.properties(element, is_root)?,
            semi_major_axis,
            inverse_flattening: element.number(2)?,
        })
    }

    fn prime_meridian(&self, element: &Element, is_root: bool) -> Result<PrimeMeridian, WktError> {
        Ok(PrimeMeridian {
            properties: self.properties(element, is_root)?,
            longitude: element.number(1)?,
        })
    }

    fn axes(
        &self,
        element: &Element,
        expected: usize,
        default: fn() -> Vec<Axis>,
    ) -> Result<Vec<Axis>, WktError> {
        let declared: Vec<&Element> = element.children("AXIS").collect();
        if self.ignore_axes || declared.is_empty() {
            return Ok(default());
        }

        if declared.len() != expected {
            return Err(element.invalid(format!(
                "expected {expected} axes, found {}",
                declared.len()
            )));
        }

        declared.into_iter().map(axis).collect()
    }
}

fn axis(element: &Element) -> Result<Axis, WktError> {
    let direction: AxisDirection = element
        .word(1)?
        .parse()
        .map_err(|err| element.invalid(format!("{err}")))?;

    Ok(Axis::new(element.text(0)?, direction))
}

fn unit(element: &Element) -> Result<Unit, WktError> {
    let factor = element.number(1)?;
    if factor <= 0.0 || !factor.is_finite() {
        return Err(element.invalid(format!("invalid conversion factor {factor}")));
    }

    Ok(Unit::new(element.text(0)?, factor))
}

fn datum_type(element: &Element) -> Result<i32, WktError> {
    let value = element.number(1)?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(element.invalid(format!("invalid datum type {value}")));
    }

    Ok(value as i32)
}

fn skip_unknown(element: &Element, known: &[&str]) {
    for child in element.elements() {
        if !known.contains(&child.keyword.as_str()) {
            log::debug!(
                "Skipping unsupported element {} inside {}",
                child.keyword,
                element.keyword
            );
        }
    }
}
