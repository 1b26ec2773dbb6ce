//! Facets: the togglable categories of captured data

use serde::{Deserialize, Serialize};
use std::fmt;

/// One category of data that can be captured for a traffic pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    /// Request header mapping
    RequestHeaders,
    /// Response header mapping
    ResponseHeaders,
    /// Request body
    RequestBodies,
    /// Response body
    ResponseBodies,
}

impl Facet {
    /// All facets, in declaration order.
    pub const ALL: [Facet; 4] = [
        Facet::RequestHeaders,
        Facet::ResponseHeaders,
        Facet::RequestBodies,
        Facet::ResponseBodies,
    ];

    /// The configuration symbol naming this facet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::RequestHeaders => "request_headers",
            Facet::ResponseHeaders => "response_headers",
            Facet::RequestBodies => "request_bodies",
            Facet::ResponseBodies => "response_bodies",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Expand a facet or aggregate symbol (`headers`, `bodies`, `all`).
    ///
    /// Matching is case-insensitive. Returns `None` for anything else.
    pub fn expand(symbol: &str) -> Option<&'static [Facet]> {
        static REQUEST_HEADERS: [Facet; 1] = [Facet::RequestHeaders];
        static RESPONSE_HEADERS: [Facet; 1] = [Facet::ResponseHeaders];
        static REQUEST_BODIES: [Facet; 1] = [Facet::RequestBodies];
        static RESPONSE_BODIES: [Facet; 1] = [Facet::ResponseBodies];
        static HEADERS: [Facet; 2] = [Facet::RequestHeaders, Facet::ResponseHeaders];
        static BODIES: [Facet; 2] = [Facet::RequestBodies, Facet::ResponseBodies];

        match symbol.to_ascii_lowercase().as_str() {
            "request_headers" => Some(&REQUEST_HEADERS),
            "response_headers" => Some(&RESPONSE_HEADERS),
            "request_bodies" => Some(&REQUEST_BODIES),
            "response_bodies" => Some(&RESPONSE_BODIES),
            "headers" => Some(&HEADERS),
            "bodies" => Some(&BODIES),
            "all" => Some(&Facet::ALL),
            _ => None,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four independent capture switches.
///
/// The default set captures nothing beyond the basic request properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetSet {
    /// Capture request headers
    pub request_headers: bool,
    /// Capture response headers
    pub response_headers: bool,
    /// Capture request bodies
    pub request_bodies: bool,
    /// Capture response bodies
    pub response_bodies: bool,
}

impl FacetSet {
    /// Nothing selected.
    pub const NONE: FacetSet = FacetSet {
        request_headers: false,
        response_headers: false,
        request_bodies: false,
        response_bodies: false,
    };

    /// Everything selected.
    pub const ALL: FacetSet = FacetSet {
        request_headers: true,
        response_headers: true,
        request_bodies: true,
        response_bodies: true,
    };

    /// Whether `facet` is selected.
    pub fn contains(&self, facet: Facet) -> bool {
        match facet {
            Facet::RequestHeaders => self.request_headers,
            Facet::ResponseHeaders => self.response_headers,
            Facet::RequestBodies => self.request_bodies,
            Facet::ResponseBodies => self.response_bodies,
        }
    }

    /// Select or deselect a single facet.
    pub fn set(&mut self, facet: Facet, value: bool) {
        match facet {
            Facet::RequestHeaders => self.request_headers = value,
            Facet::ResponseHeaders => self.response_headers = value,
            Facet::RequestBodies => self.request_bodies = value,
            Facet::ResponseBodies => self.response_bodies = value,
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, facet: Facet, value: bool) -> Self {
        self.set(facet, value);
        self
    }

    /// Whether any facet is selected.
    pub fn any(&self) -> bool {
        Facet::ALL.iter().any(|f| self.contains(*f))
    }

    /// Whether every facet selected in `other` is selected here too.
    pub fn is_superset_of(&self, other: &FacetSet) -> bool {
        Facet::ALL
            .iter()
            .all(|f| !other.contains(*f) || self.contains(*f))
    }

    /// Selected facets, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Facet> + '_ {
        Facet::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<Facet> for FacetSet {
    fn from_iter<I: IntoIterator<Item = Facet>>(iter: I) -> Self {
        let mut set = FacetSet::NONE;
        for facet in iter {
            set.set(facet, true);
        }
        set
    }
}

/// A partial overwrite of a [`FacetSet`].
///
/// Facets the patch does not mention keep whatever value they already had.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacetPatch {
    fields: [Option<bool>; 4],
}

impl FacetPatch {
    /// A patch that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A patch selecting each of `facets`.
    pub fn grant(facets: impl IntoIterator<Item = Facet>) -> Self {
        let mut patch = Self::default();
        for facet in facets {
            patch.set(facet, true);
        }
        patch
    }

    /// Record a value for `facet`; later calls overwrite earlier ones.
    pub fn set(&mut self, facet: Facet, value: bool) {
        self.fields[facet.index()] = Some(value);
    }

    /// The value this patch assigns to `facet`, if any.
    pub fn get(&self, facet: Facet) -> Option<bool> {
        self.fields[facet.index()]
    }

    /// Whether the patch mentions no facet.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    /// Whether the patch only ever selects facets.
    pub fn is_grant_only(&self) -> bool {
        self.fields.iter().all(|v| *v != Some(false))
    }

    /// Overwrite `set` with every facet this patch mentions.
    pub fn apply(&self, set: &mut FacetSet) {
        for facet in Facet::ALL {
            if let Some(value) = self.get(facet) {
                set.set(facet, value);
            }
        }
    }
}
