use std::collections::BTreeSet;
use std::sync::Arc;

use geotoolkit_types::referencing::IdentifiedObject;
use geotoolkit_types::{Citation, Identifier, ObjectType};
use parking_lot::Mutex;

use crate::code::{split_code, PrimaryKey};
use crate::error::{FactoryError, FailureCause};
use crate::factory::{
    AuthorityCodes, AuthorityFactory, DefinitionLookup, ParseRequest, ParserAdapter,
};
use crate::hints::{AxisOrder, Hints};
use crate::store::DefinitionsStore;

/// Authority factory parsing WKT definitions read from a [`DefinitionsStore`].
///
/// Codes are resolved in three steps:
/// 1. the authority token is removed if it names one of the factory authorities
///    (`EPSG:4326` becomes `4326`, `ZZZ:4326` is left as is);
/// 2. the store maps the code to a primary key;
/// 3. the definition stored under the key is parsed and the requested code is attached to the
///    object as an identifier (see [`ParserAdapter`]).
///
/// Store access is serialized: one lookup runs at a time per factory. Parsing runs outside the
/// lock.
///
/// Authorities are either given when the factory is created or, if none are given, read from
/// the store. In the latter case the primary key authority is the first authority whose codes
/// are equal to the primary keys.
pub struct WktAuthorityFactory<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for WktAuthorityFactory<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<S> {
    configured: Vec<Citation>,
    axis_order: AxisOrder,
    state: Mutex<State<S>>,
}

struct State<S> {
    store: Option<S>,
    parser: Option<Arc<ParserAdapter>>,
    authority: Option<Citation>,
    codes: Option<BTreeSet<String>>,
}

struct Fetched {
    text: String,
    code: String,
    primary_key: PrimaryKey,
    aliases: Vec<Identifier>,
    parser: Arc<ParserAdapter>,
    mentions_axes: bool,
}

impl<S: DefinitionsStore + 'static> WktAuthorityFactory<S> {
    /// Creates a factory. The first of `authorities` is the primary key authority. An empty
    /// list means the authorities are read from the store.
    pub fn new(store: S, authorities: Vec<Citation>, hints: &Hints) -> Self {
        Self {
            inner: Arc::new(Inner {
                configured: authorities,
                axis_order: hints.axis_order,
                state: Mutex::new(State {
                    store: Some(store),
                    parser: None,
                    authority: None,
                    codes: None,
                }),
            }),
        }
    }

    /// WKT definition of the object with the given code.
    pub fn definition(&self, code: &str) -> Result<String, FactoryError> {
        Ok(self.inner.fetch(code, false)?.text)
    }

    /// Returns true after [`AuthorityFactory::dispose`] was called.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().store.is_none()
    }
}

impl<S: DefinitionsStore + 'static> AuthorityFactory for WktAuthorityFactory<S> {
    fn authority(&self) -> Result<Citation, FactoryError> {
        let mut state = self.inner.state.lock();
        if let Some(authority) = &state.authority {
            return Ok(authority.clone());
        }

        let parser = state
            .parser(&self.inner.configured)
            .map_err(|cause| FactoryError::failure(ObjectType::IdentifiedObject, "", cause))?;
        let authority = Citation::merge(parser.authorities())
            .unwrap_or_else(|| Citation::new("Unnamed authority"));

        state.authority = Some(authority.clone());
        Ok(authority)
    }

    fn axis_order(&self) -> AxisOrder {
        self.inner.axis_order
    }

    fn create_object_with(
        &self,
        code: &str,
        axis_order: AxisOrder,
    ) -> Result<IdentifiedObject, FactoryError> {
        let fetched = self.inner.fetch(code, true)?;
        let request = ParseRequest {
            code: &fetched.code,
            primary_key: &fetched.primary_key,
            aliases: &fetched.aliases,
            ignore_axes: axis_order == AxisOrder::LongitudeFirst && fetched.mentions_axes,
        };

        log::debug!(
            "Parsing definition of {code} (primary key {})",
            fetched.primary_key
        );
        fetched
            .parser
            .parse(&fetched.text, &request)
            .map_err(|err| {
                let object_type = geotoolkit_wkt::classify(&fetched.text)
                    .unwrap_or(ObjectType::IdentifiedObject);
                FactoryError::failure(object_type, code, err)
            })
    }

    fn authority_codes(&self, object_type: ObjectType) -> Result<AuthorityCodes, FactoryError> {
        let failure = |cause: FailureCause| FactoryError::failure(object_type, "", cause);

        let mut state = self.inner.state.lock();
        if object_type != ObjectType::IdentifiedObject {
            let selected = state
                .store()
                .and_then(|store| Ok(store.authority_codes(object_type)?))
                .map_err(failure)?;
            if let Some(codes) = selected {
                return Ok(AuthorityCodes::new(object_type, codes));
            }
        }

        let all = state.codes().map_err(failure)?.clone();
        if object_type == ObjectType::IdentifiedObject {
            return Ok(AuthorityCodes::new(object_type, all));
        }

        let lookup: Arc<dyn DefinitionLookup> = self.inner.clone();
        Ok(AuthorityCodes::filtered(object_type, all, lookup))
    }

    fn description_text(&self, code: &str) -> Result<String, FactoryError> {
        let fetched = self.inner.fetch(code, false)?;
        geotoolkit_wkt::element_name(&fetched.text).map_err(|err| {
            let object_type =
                geotoolkit_wkt::classify(&fetched.text).unwrap_or(ObjectType::IdentifiedObject);
            FactoryError::failure(object_type, code, err)
        })
    }

    fn dispose(&self) {
        let mut state = self.inner.state.lock();
        state.parser = None;
        state.authority = None;
        state.codes = None;

        if let Some(mut store) = state.store.take() {
            match store.close() {
                Ok(()) => log::debug!("Authority factory disposed"),
                Err(err) => log::warn!("Failed to close definitions store: {err}"),
            }
        }
    }

    /// Removes the authority token from the code if it names any of the factory authorities.
    fn trim_authority(&self, code: &str) -> Result<String, FactoryError> {
        let mut state = self.inner.state.lock();
        let parser = state
            .parser(&self.inner.configured)
            .map_err(|cause| FactoryError::failure(ObjectType::IdentifiedObject, code, cause))?;

        Ok(trim(parser.authorities(), code).1.to_string())
    }
}

impl<S: DefinitionsStore> Inner<S> {
    fn fetch(&self, code: &str, with_aliases: bool) -> Result<Fetched, FactoryError> {
        let mut state = self.state.lock();
        match state.fetch(&self.configured, code, with_aliases) {
            Ok(Some(fetched)) => Ok(fetched),
            Ok(None) => {
                log::debug!("No definition found for {code}");
                Err(FactoryError::not_found(code, split_code(code).0))
            }
            Err(cause) => Err(FactoryError::failure(
                ObjectType::IdentifiedObject,
                code,
                cause,
            )),
        }
    }
}

impl<S: DefinitionsStore> DefinitionLookup for Inner<S> {
    fn definition(&self, code: &str) -> Result<String, FactoryError> {
        Ok(self.fetch(code, false)?.text)
    }
}

impl<S: DefinitionsStore> State<S> {
    fn store(&self) -> Result<&S, FailureCause> {
        self.store.as_ref().ok_or(FailureCause::Disposed)
    }

    fn parser(&mut self, configured: &[Citation]) -> Result<Arc<ParserAdapter>, FailureCause> {
        if let Some(parser) = &self.parser {
            return Ok(parser.clone());
        }

        let parser = if configured.is_empty() {
            let names = self.store()?.authority_names()?;
            let primary_key_authority = names
                .iter()
                .position(|name| name.codes_are_primary_keys)
                .or(if names.is_empty() { None } else { Some(0) });
            let authorities = names
                .into_iter()
                .map(|name| Citation::new(name.name))
                .collect();

            ParserAdapter::new(authorities, primary_key_authority)
        } else {
            ParserAdapter::new(configured.to_vec(), Some(0))
        };

        let parser = Arc::new(parser);
        self.parser = Some(parser.clone());
        Ok(parser)
    }

    fn codes(&mut self) -> Result<&BTreeSet<String>, FailureCause> {
        if self.codes.is_none() {
            let codes = self.store()?.codes()?;
            self.codes = Some(codes);
        }

        self.codes.as_ref().ok_or(FailureCause::Disposed)
    }

    fn fetch(
        &mut self,
        configured: &[Citation],
        code: &str,
        with_aliases: bool,
    ) -> Result<Option<Fetched>, FailureCause> {
        let parser = self.parser(configured)?;
        let store = self.store()?;

        let (authority, trimmed) = trim(parser.authorities(), code);
        let authority = authority.or_else(|| parser.primary_key_authority());

        let Some(primary_key) = store.primary_key(authority.map(Citation::code_space), trimmed)?
        else {
            return Ok(None);
        };
        let Some(text) = store.get(&primary_key)? else {
            return Ok(None);
        };
        let aliases = if with_aliases {
            store.aliases(&primary_key)?
        } else {
            vec![]
        };

        Ok(Some(Fetched {
            text,
            code: trimmed.to_string(),
            aliases,
            primary_key,
            mentions_axes: store.mentions_axes(),
            parser,
        }))
    }
}

fn trim<'a, 'c>(authorities: &'a [Citation], code: &'c str) -> (Option<&'a Citation>, &'c str) {
    match split_code(code) {
        (Some(token), rest) => match authorities.iter().find(|citation| citation.identifies(token)) {
            Some(citation) => (Some(citation), rest),
            None => (None, code.trim()),
        },
        (None, rest) => (None, rest),
    }
}
