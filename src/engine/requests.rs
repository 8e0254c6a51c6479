//! Backend request descriptions and response sequencing.
//!
//! The engine never performs I/O. It describes each request (method,
//! URL, optional JSON body) and tags it with a [`Ticket`]; the caller
//! performs the fetch and hands the response back with the same request
//! so the engine can decide whether it is still current.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::{Bounds, GeoPoint};

pub const SESSIONS_GEOJSON_PATH: &str = "/api/sessions/geojson/";
pub const SESSIONS_IN_BBOX_PATH: &str = "/api/sessions/in-bbox/";
pub const SESSIONS_NEAREST_PATH: &str = "/api/sessions/nearest/";
pub const DISTINCT_SYSTEMS_PATH: &str = "/api/sessions/distinct-systems/";
pub const DISTINCT_PROVINCES_PATH: &str = "/api/counties/distinct-provinces/";
pub const VENUES_GEOJSON_PATH: &str = "/api/venues/geojson/";

/// Sequence number of an issued request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(pub u64);

/// What a request fetches, and the context needed to apply its response.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    /// Text/filter search over all sessions
    Search,
    /// Sessions inside the viewport at request time
    Area(Bounds),
    /// Sessions nearest to the user's location
    Nearest(GeoPoint),
    Venues,
    Systems,
    Provinces,
}

impl RequestKind {
    /// Whether the response is a session `FeatureCollection`.
    pub fn returns_sessions(&self) -> bool {
        matches!(
            self,
            RequestKind::Search | RequestKind::Area(_) | RequestKind::Nearest(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request for the caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub ticket: Ticket,
    pub kind: RequestKind,
    pub method: HttpMethod,
    pub url: Url,
    /// JSON body for POST requests
    pub body: Option<Value>,
}

/// Body of the nearest-sessions POST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestBody {
    pub lat: f64,
    pub lng: f64,
    pub limit: u32,
    /// Selected system, empty for all
    pub system: String,
    /// 1 when only open sessions are wanted
    pub open: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

/// Search filters shared by the session requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFilters {
    /// Free-text query
    pub text: String,
    pub system: String,
    pub province: String,
    pub open_only: bool,
}

impl SessionFilters {
    /// Query pairs for the filter fields, skipping blank ones.
    ///
    /// `include_text` is false for area searches, which ignore the text box.
    pub fn query_pairs(&self, include_text: bool) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if include_text && !self.text.trim().is_empty() {
            pairs.push(("q", self.text.trim().to_string()));
        }
        if !self.system.is_empty() {
            pairs.push(("system", self.system.clone()));
        }
        if !self.province.is_empty() {
            pairs.push(("province", self.province.clone()));
        }
        if self.open_only {
            pairs.push(("open", "1".to_string()));
        }
        pairs
    }

    /// Clear every filter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Build an absolute endpoint URL with query pairs.
pub fn endpoint_url(base: &str, path: &str, pairs: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(base)?.join(path)?;
    if !pairs.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

/// Query pairs for a bounding-box search, in west/south/east/north order.
pub fn bbox_pairs(bounds: &Bounds) -> Vec<(&'static str, String)> {
    vec![
        ("west", bounds.min_lng.to_string()),
        ("south", bounds.min_lat.to_string()),
        ("east", bounds.max_lng.to_string()),
        ("north", bounds.max_lat.to_string()),
    ]
}

/// How to treat responses that arrive out of request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Every response replaces the snapshot, whenever it arrives.
    #[default]
    LastResponseWins,
    /// Responses older than the newest applied one are dropped.
    LastRequestWins,
}

/// Issues tickets and decides whether responses are still current.
#[derive(Debug, Default)]
pub struct RequestTracker {
    ordering: ResponseOrdering,
    next: u64,
    latest_applied: Option<Ticket>,
}

impl RequestTracker {
    pub fn new(ordering: ResponseOrdering) -> Self {
        Self {
            ordering,
            next: 0,
            latest_applied: None,
        }
    }

    /// Issue the next ticket.
    pub fn issue(&mut self) -> Ticket {
        self.next += 1;
        Ticket(self.next)
    }

    /// Decide whether a response for `ticket` should be applied, and record it if so.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        let stale = self.latest_applied.is_some_and(|latest| ticket < latest);
        if stale {
            match self.ordering {
                ResponseOrdering::LastResponseWins => {
                    warn!(
                        "[Requests] response {:?} arrived after {:?}; applying anyway",
                        ticket, self.latest_applied
                    );
                }
                ResponseOrdering::LastRequestWins => {
                    warn!(
                        "[Requests] dropping stale response {:?} (latest applied {:?})",
                        ticket, self.latest_applied
                    );
                    return false;
                }
            }
        }
        self.latest_applied = Some(ticket);
        true
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Newest ticket whose response was applied.
    pub fn latest_applied(&self) -> Option<Ticket> {
        self.latest_applied
    }

    /// Forget applied responses; tickets keep increasing.
    pub fn reset(&mut self) {
        self.latest_applied = None;
    }
}
