use geotoolkit_types::referencing::{IdentifiedObject, ObjectProperties};
use geotoolkit_types::{Citation, Identifier};
use geotoolkit_wkt::{PropertiesHook, WktError, WktParser};

use crate::code::PrimaryKey;

/// Code of the object being parsed and how to parse it.
#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    /// Requested code, without its authority token.
    pub code: &'a str,
    /// Primary key the code resolved to.
    pub primary_key: &'a PrimaryKey,
    /// Identifiers the store knows for the primary key.
    pub aliases: &'a [Identifier],
    /// Discard axis declarations.
    pub ignore_axes: bool,
}

/// WKT parser attaching the identifiers of the requested code to the parsed object.
///
/// If the definition declares no `AUTHORITY`, the object gets the identifiers known by the
/// store for the primary key or, when there are none, one identifier per authority of the
/// factory. If the definition declares an identifier, only the identifier of the primary key
/// authority is added.
///
/// The adapter keeps no per-call state: everything about the parsed object comes with the
/// [`ParseRequest`].
#[derive(Debug, Clone)]
pub struct ParserAdapter {
    authorities: Vec<Citation>,
    primary_key_authority: Option<usize>,
}

impl ParserAdapter {
    /// Creates an adapter for a factory with the given authorities. `primary_key_authority`
    /// is the index of the authority whose codes are the primary keys.
    pub fn new(authorities: Vec<Citation>, primary_key_authority: Option<usize>) -> Self {
        let primary_key_authority =
            primary_key_authority.filter(|index| *index < authorities.len());
        Self {
            authorities,
            primary_key_authority,
        }
    }

    /// Authorities of the factory.
    pub fn authorities(&self) -> &[Citation] {
        &self.authorities
    }

    /// Authority whose codes are the primary keys, if any.
    pub fn primary_key_authority(&self) -> Option<&Citation> {
        self.primary_key_authority
            .and_then(|index| self.authorities.get(index))
    }

    /// Parses the definition of the requested object.
    pub fn parse(
        &self,
        text: &str,
        request: &ParseRequest<'_>,
    ) -> Result<IdentifiedObject, WktError> {
        let parser = WktParser::new().with_ignore_axes(request.ignore_axes);
        parser.parse_with(
            text,
            &IdentifierInjector {
                adapter: self,
                request,
            },
        )
    }
}

struct IdentifierInjector<'a> {
    adapter: &'a ParserAdapter,
    request: &'a ParseRequest<'a>,
}

impl PropertiesHook for IdentifierInjector<'_> {
    fn complete(&self, _keyword: &str, properties: &mut ObjectProperties) {
        let request = self.request;
        let primary_key = request.primary_key.to_string();

        if !properties.identifiers.is_empty() {
            if let Some(authority) = self.adapter.primary_key_authority() {
                properties.add_identifier(Identifier::from_citation(authority, primary_key));
            }
            return;
        }

        if !request.aliases.is_empty() {
            for alias in request.aliases {
                properties.add_identifier(alias.clone());
            }
            return;
        }

        for (index, authority) in self.adapter.authorities.iter().enumerate() {
            let code = if Some(index) == self.adapter.primary_key_authority {
                primary_key.clone()
            } else {
                request.code.trim().to_string()
            };

            properties.add_identifier(Identifier::from_citation(authority, code));
        }
    }
}

#[cfg(test)]
mod tests {
    use geotoolkit_types::referencing::Identified;

    use super::*;

    const NO_AUTHORITY: &str = r#"GEOGCS["WGS 84",
        DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]],
        PRIMEM["Greenwich", 0],
        UNIT["degree", 0.0174532925199433]]"#;

    const WITH_AUTHORITY: &str = r#"GEOGCS["WGS 84",
        DATUM["WGS_1984", SPHEROID["WGS 84", 6378137, 298.257223563]],
        PRIMEM["Greenwich", 0],
        UNIT["degree", 0.0174532925199433],
        AUTHORITY["OGC", "CRS84"]]"#;

    fn adapter() -> ParserAdapter {
        ParserAdapter::new(
            vec![Citation::new("Local").with_identifier("LOCAL"), Citation::epsg()],
            Some(1),
        )
    }

    fn identifiers(object: &IdentifiedObject) -> Vec<String> {
        object
            .identifiers()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn one_identifier_per_authority() {
        let primary_key = PrimaryKey::Integer(4326);
        let request = ParseRequest {
            code: " wgs84 ",
            primary_key: &primary_key,
            aliases: &[],
            ignore_axes: false,
        };

        let object = adapter().parse(NO_AUTHORITY, &request).unwrap();
        assert_eq!(identifiers(&object), ["LOCAL:wgs84", "EPSG:4326"]);
    }

    #[test]
    fn store_aliases_take_precedence() {
        let primary_key = PrimaryKey::Integer(4326);
        let aliases = [
            Identifier::new("EPSG", "4326"),
            Identifier::new("ESRI", "104326"),
        ];
        let request = ParseRequest {
            code: "104326",
            primary_key: &primary_key,
            aliases: &aliases,
            ignore_axes: false,
        };

        let object = adapter().parse(NO_AUTHORITY, &request).unwrap();
        assert_eq!(identifiers(&object), ["EPSG:4326", "ESRI:104326"]);
    }

    #[test]
    fn declared_identifier_gets_primary_key_only() {
        let primary_key = PrimaryKey::Integer(4326);
        let request = ParseRequest {
            code: "wgs84",
            primary_key: &primary_key,
            aliases: &[],
            ignore_axes: false,
        };

        let object = adapter().parse(WITH_AUTHORITY, &request).unwrap();
        assert_eq!(identifiers(&object), ["OGC:CRS84", "EPSG:4326"]);

        let without_primary_authority = ParserAdapter::new(vec![Citation::ogc()], None);
        let object = without_primary_authority
            .parse(WITH_AUTHORITY, &request)
            .unwrap();
        assert_eq!(identifiers(&object), ["OGC:CRS84"]);
    }

    #[test]
    fn out_of_range_primary_key_authority() {
        assert!(ParserAdapter::new(vec![Citation::epsg()], Some(3))
            .primary_key_authority()
            .is_none());
    }
}
