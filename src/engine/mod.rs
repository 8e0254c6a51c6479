//! # Map Engine
//!
//! Owns the state a session map widget needs between events and turns
//! those events into backend requests and render passes.
//!
//! ## Architecture
//!
//! The engine is composed of focused modules:
//! - `SessionStore` - The snapshot from the last accepted response
//! - `SpatialIndex` - Lazily rebuilt R-tree for viewport queries over the snapshot
//! - `RequestTracker` - Tickets and response-ordering policy
//!
//! ## Event flow
//!
//! viewport change → [`MapEngine::set_view`] → [`MapEngine::request_area`]
//! → caller fetches → [`MapEngine::apply_sessions`] → [`RenderPass`]

pub mod requests;
pub mod session_store;
pub mod spatial_index;

pub use requests::{
    HttpMethod, NearestBody, RequestKind, RequestTracker, ResponseOrdering, SessionFilters,
    SessionRequest, Ticket,
};
pub use session_store::SessionStore;
pub use spatial_index::{IndexedPosition, SpatialIndex};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clustering::{ClusterConfig, cluster_features_with_config};
use crate::error::{OptionExt, Result, SessionMapError};
use crate::geo_utils::{BOUNDS_MOVE_THRESHOLD, bounds_moved};
use crate::ranking::{RankedFeature, Ranker};
use crate::{Bounds, Cluster, GeoPoint, PointFeature};

use requests::{
    DISTINCT_PROVINCES_PATH, DISTINCT_SYSTEMS_PATH, SESSIONS_GEOJSON_PATH, SESSIONS_IN_BBOX_PATH,
    SESSIONS_NEAREST_PATH, VENUES_GEOJSON_PATH, bbox_pairs, endpoint_url,
};
use session_store::dedupe_labels;

/// Configuration for the map engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cluster: ClusterConfig,

    /// Zoom used before the map reports one.
    /// Default: 11.0
    pub initial_zoom: f64,

    /// Number of sessions asked for by a nearest search.
    /// Default: 10
    pub nearest_limit: u32,

    /// Zoom the map re-centres to after a nearest search.
    /// Default: 13.0
    pub locate_zoom: f64,

    /// Edge movement in degrees before offering a new area search.
    /// Default: 0.0005
    pub bounds_move_threshold: f64,

    /// Base URL the API paths are resolved against.
    pub api_base: String,

    pub response_ordering: ResponseOrdering,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            initial_zoom: 11.0,
            nearest_limit: 10,
            locate_zoom: 13.0,
            bounds_move_threshold: BOUNDS_MOVE_THRESHOLD,
            api_base: "http://localhost:8000/".to_string(),
            response_ordering: ResponseOrdering::default(),
        }
    }
}

/// Everything a rendering layer needs for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass<'a> {
    pub zoom: f64,
    pub clusters: Vec<Cluster<'a>>,
    /// Results list, nearest first when `uses_location`
    pub list: Vec<RankedFeature<'a>>,
    pub uses_location: bool,
}

impl RenderPass<'_> {
    /// Whether there is nothing to show ("No games found").
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Map widget state with explicit lifecycle.
///
/// Created with [`MapEngine::new`], mutated by events, and returned to
/// its initial state with [`MapEngine::reset`].
#[derive(Debug)]
pub struct MapEngine {
    // Core components; only `apply_sessions` and `reset` replace the snapshot
    sessions: SessionStore,
    spatial: SpatialIndex,
    requests: RequestTracker,
    ranker: Ranker,

    // View state
    zoom: f64,
    viewport: Option<Bounds>,
    last_fetched: Option<Bounds>,
    /// Set by a search response, cleared by the next viewport change
    area_prompt_hidden: bool,
    reference: Option<GeoPoint>,
    /// Map centre requested by the engine (after a nearest search)
    pending_center: Option<GeoPoint>,

    // Filter state
    pub filters: SessionFilters,
    systems: Vec<String>,
    provinces: Vec<String>,

    venues: Vec<PointFeature>,

    config: EngineConfig,
}

impl MapEngine {
    /// Create a new engine with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            sessions: SessionStore::new(),
            spatial: SpatialIndex::new(),
            requests: RequestTracker::new(config.response_ordering),
            ranker: Ranker::new()?,
            zoom: config.initial_zoom,
            viewport: None,
            last_fetched: None,
            area_prompt_hidden: false,
            reference: None,
            pending_center: None,
            filters: SessionFilters::default(),
            systems: Vec::new(),
            provinces: Vec::new(),
            venues: Vec::new(),
            config,
        })
    }

    /// Drop all state, keeping configuration.
    pub fn reset(&mut self) {
        self.sessions.clear();
        self.spatial.clear();
        self.requests.reset();
        self.zoom = self.config.initial_zoom;
        self.viewport = None;
        self.last_fetched = None;
        self.area_prompt_hidden = false;
        self.reference = None;
        self.pending_center = None;
        self.filters.reset();
        self.systems.clear();
        self.provinces.clear();
        self.venues.clear();
    }

    /// The current session snapshot.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    // ========================================================================
    // View State
    // ========================================================================

    /// Record the current viewport and zoom.
    ///
    /// Returns whether the "search this area" control should be offered:
    /// true when no area has been fetched yet or an edge has moved past
    /// the configured threshold.
    pub fn set_view(&mut self, viewport: Bounds, zoom: f64) -> bool {
        self.viewport = Some(viewport);
        self.zoom = zoom;
        self.area_prompt_hidden = false;
        self.should_offer_area_search()
    }

    /// See [`MapEngine::set_view`].
    ///
    /// A text/filter search response hides the control until the view changes.
    pub fn should_offer_area_search(&self) -> bool {
        if self.area_prompt_hidden {
            return false;
        }
        match (&self.viewport, &self.last_fetched) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(fetched)) => {
                bounds_moved(current, fetched, self.config.bounds_move_threshold)
            }
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    /// Bounds of the last applied area search.
    pub fn last_fetched_bounds(&self) -> Option<Bounds> {
        self.last_fetched
    }

    /// Take the centre the map should move to, if the engine asked for one.
    pub fn take_pending_center(&mut self) -> Option<GeoPoint> {
        self.pending_center.take()
    }

    // ========================================================================
    // Reference Point
    // ========================================================================

    pub fn reference(&self) -> Option<GeoPoint> {
        self.reference
    }

    /// Stop ranking by distance from the user.
    pub fn clear_reference(&mut self) {
        self.reference = None;
    }

    // ========================================================================
    // Requests
    // ========================================================================

    fn build(
        &mut self,
        kind: RequestKind,
        method: HttpMethod,
        path: &str,
        pairs: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<SessionRequest> {
        let url = endpoint_url(&self.config.api_base, path, pairs)?;
        let ticket = self.requests.issue();
        debug!("[Engine] issuing {:?} {:?} {}", ticket, method, url);
        Ok(SessionRequest {
            ticket,
            kind,
            method,
            url,
            body,
        })
    }

    /// Text and filter search over all sessions.
    pub fn request_search(&mut self) -> Result<SessionRequest> {
        let pairs = self.filters.query_pairs(true);
        self.build(
            RequestKind::Search,
            HttpMethod::Get,
            SESSIONS_GEOJSON_PATH,
            &pairs,
            None,
        )
    }

    /// Sessions inside the current viewport.
    pub fn request_area(&mut self) -> Result<SessionRequest> {
        let bounds = self.viewport.ok_or_missing_viewport()?;
        let mut pairs = bbox_pairs(&bounds);
        pairs.extend(self.filters.query_pairs(false));
        self.build(
            RequestKind::Area(bounds),
            HttpMethod::Get,
            SESSIONS_IN_BBOX_PATH,
            &pairs,
            None,
        )
    }

    /// Clear all filters and search the current viewport.
    pub fn refresh(&mut self) -> Result<SessionRequest> {
        self.filters.reset();
        self.request_area()
    }

    /// Handle a successful geolocation fix.
    ///
    /// Sets the reference point used for distance ranking and returns the
    /// nearest-sessions request.
    pub fn locate(&mut self, position: GeoPoint) -> Result<SessionRequest> {
        if !position.is_valid() {
            return Err(SessionMapError::InvalidCoordinate {
                latitude: position.latitude,
                longitude: position.longitude,
            });
        }
        self.reference = Some(position);
        info!(
            "[Engine] reference point set to ({:.5}, {:.5})",
            position.latitude, position.longitude
        );

        let province = if self.filters.province.is_empty() {
            None
        } else {
            Some(self.filters.province.clone())
        };
        let body = NearestBody {
            lat: position.latitude,
            lng: position.longitude,
            limit: self.config.nearest_limit,
            system: self.filters.system.clone(),
            open: u8::from(self.filters.open_only),
            province,
        };
        let body = serde_json::to_value(body)?;
        self.build(
            RequestKind::Nearest(position),
            HttpMethod::Post,
            SESSIONS_NEAREST_PATH,
            &[],
            Some(body),
        )
    }

    pub fn request_venues(&mut self) -> Result<SessionRequest> {
        self.build(
            RequestKind::Venues,
            HttpMethod::Get,
            VENUES_GEOJSON_PATH,
            &[],
            None,
        )
    }

    pub fn request_systems(&mut self) -> Result<SessionRequest> {
        self.build(
            RequestKind::Systems,
            HttpMethod::Get,
            DISTINCT_SYSTEMS_PATH,
            &[],
            None,
        )
    }

    pub fn request_provinces(&mut self) -> Result<SessionRequest> {
        self.build(
            RequestKind::Provinces,
            HttpMethod::Get,
            DISTINCT_PROVINCES_PATH,
            &[],
            None,
        )
    }

    // ========================================================================
    // Responses
    // ========================================================================

    /// Apply a session response.
    ///
    /// Returns `None` when the request does not return sessions or the
    /// response is dropped by the ordering policy; otherwise replaces the
    /// snapshot and returns the new render pass.
    pub fn apply_sessions(
        &mut self,
        request: &SessionRequest,
        features: Vec<PointFeature>,
    ) -> Option<RenderPass<'_>> {
        if !request.kind.returns_sessions() || !self.requests.accept(request.ticket) {
            return None;
        }

        let positioned = self.sessions.replace(features);
        self.spatial.invalidate();
        info!(
            "[Engine] {:?} applied: {} sessions ({} positioned)",
            request.ticket,
            self.sessions.len(),
            positioned
        );

        match &request.kind {
            RequestKind::Search => self.area_prompt_hidden = true,
            RequestKind::Area(bounds) => self.last_fetched = Some(*bounds),
            RequestKind::Nearest(position) => {
                self.zoom = self.config.locate_zoom;
                self.pending_center = Some(*position);
            }
            _ => {}
        }

        Some(self.render())
    }

    /// Replace the venue layer. Only point venues are kept.
    pub fn apply_venues(&mut self, features: Vec<PointFeature>) -> usize {
        self.venues = features
            .into_iter()
            .filter(|f| f.position().is_some())
            .collect();
        self.venues.len()
    }

    /// Replace the system filter options (trimmed, case-insensitively unique).
    pub fn apply_systems<'a, I>(&mut self, systems: I) -> &[String]
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.systems = dedupe_labels(systems);
        &self.systems
    }

    pub fn apply_provinces(&mut self, provinces: Vec<String>) -> &[String] {
        self.provinces = provinces;
        &self.provinces
    }

    pub fn venues(&self) -> &[PointFeature] {
        &self.venues
    }

    pub fn systems(&self) -> &[String] {
        &self.systems
    }

    pub fn provinces(&self) -> &[String] {
        &self.provinces
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Build clusters and the results list for the current snapshot and zoom.
    pub fn render(&self) -> RenderPass<'_> {
        let features = self.sessions.features();
        RenderPass {
            zoom: self.zoom,
            clusters: cluster_features_with_config(features, self.zoom, &self.config.cluster),
            list: self.ranker.rank(features, self.reference),
            uses_location: self.reference.is_some(),
        }
    }

    /// Sessions whose position lies in the current viewport, in snapshot order.
    pub fn sessions_in_view(&mut self) -> Vec<&PointFeature> {
        let Some(viewport) = self.viewport else {
            return Vec::new();
        };
        self.spatial
            .within(self.sessions.features(), &viewport)
            .into_iter()
            .filter_map(|i| self.sessions.get(i))
            .collect()
    }
}
