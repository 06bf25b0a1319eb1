//! # Telemap: the live map view
//!
//! This module defines the [`Telemap`] façade, which wires together:
//!
//! 1. **The loaded feature set** ([`FeatureSet`]) – the point and track snapshot of the last
//!    load, with its derived layers memoized per [`LayerQuery`].
//! 2. **The marker registry** ([`MarkerRegistry`]) – one marker per render object, rebuilt
//!    wholesale on every mount.
//! 3. **The interaction state** ([`MarkerState`]) – selection, focus, symbolize map, opacity.
//! 4. **The view parameters** ([`MapParams`]) – window size, initial opacity, palette.
//!
//! ## Event flow
//!
//! ```text
//! set_features ─▶ FeatureSet (cache cleared)
//! layers(query) ─▶ filter ─▶ group ─▶ window ─▶ split ─▶ MapLayers (memoized)
//! mount / load ─▶ build_markers ─▶ SetMarkers ─▶ reconcile
//! dispatch(action) ─▶ reduce ─▶ reconcile ─▶ ReconcileReport
//! ```
//!
//! Everything runs on the caller's thread; each call completes before the next one starts, so
//! reconciliation always sees a fully applied state. The façade is the only writer of its
//! [`MarkerState`].
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use telemap::telemap::{LayerQuery, Telemap};
//! use telemap::map_params::MapParams;
//! use telemap::state::MarkerAction;
//! # use telemap::reconcile::{LatestIcon, RenderHandle};
//! # struct Handle;
//! # impl RenderHandle for Handle {
//! #     fn is_attached(&self) -> bool { true }
//! #     fn restyle(&mut self, _: &str, _: &str, _: f64) {}
//! #     fn bring_to_front(&mut self) {}
//! #     fn replace_icon(&mut self, _: LatestIcon) {}
//! #     fn set_line_color(&mut self, _: &str) {}
//! # }
//! # let (points, tracks) = (Vec::new(), Vec::new());
//!
//! let mut map: Telemap<Handle> = Telemap::new(MapParams::default());
//! map.set_features(points, tracks);
//!
//! let query = LayerQuery::windowed(map.params().window_size);
//! map.mount(&query, |_kind, _id| Handle);
//!
//! let report = map.dispatch(MarkerAction::FocusAnimal("A1".into()));
//! println!("{report}");
//! ```
//!
//! ## See also
//! ------------
//! * [`reduce`] – Pure state transitions.
//! * [`reconcile`] – Diff-before-write render updates.
//! * [`build_markers`] – Registry construction.
use std::cell::RefCell;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

use crate::code_filter::{apply_filter, CategoryFilter};
use crate::constants::{AnimalId, FastHashMap, FeatureId};
use crate::features::{PropertyKey, TelemetryPoint, TelemetryTrack};
use crate::grouping::stats::{FixCountStats, GroupSetExt};
use crate::grouping::window::{split_all, window_last_n};
use crate::grouping::{group, TelemetryGroup};
use crate::map_params::MapParams;
use crate::markers::registry::{build_markers, MarkerRegistry, RenderObject};
use crate::markers::MarkerKind;
use crate::reconcile::{reconcile, ReconcileReport, RenderHandle};
use crate::state::{reduce, MarkerAction, MarkerState};

/// Parameters of one derived layer computation.
///
/// Fields
/// -----------------
/// * `filters` – category filters applied to points and tracks before grouping.
/// * `sort` – optional sort field of the groups.
/// * `group_by` – grouping field, the animal id by default.
/// * `last_n` – window size; `None` keeps every fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerQuery {
    pub filters: Vec<CategoryFilter>,
    pub sort: Option<PropertyKey>,
    pub group_by: PropertyKey,
    pub last_n: Option<usize>,
}

impl LayerQuery {
    /// Unfiltered query keeping the last `n` fixes per animal.
    pub fn windowed(n: usize) -> Self {
        LayerQuery {
            last_n: Some(n),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<CategoryFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn sorted_by(mut self, key: PropertyKey) -> Self {
        self.sort = Some(key);
        self
    }
}

/// Layers drawn on the map for one [`LayerQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLayers {
    pub groups: Vec<TelemetryGroup>,
    /// Most recent fix of each group.
    pub latest: Vec<TelemetryPoint>,
    /// All the other fixes.
    pub other: Vec<TelemetryPoint>,
    pub tracks: Vec<TelemetryTrack>,
}

/// Immutable snapshot of one load, with memoized derived layers.
///
/// Replacing the snapshot (a reload) means creating a new `FeatureSet`, which drops the cache.
#[derive(Debug, Default)]
pub struct FeatureSet {
    points: Vec<TelemetryPoint>,
    tracks: Vec<TelemetryTrack>,
    overview: OnceCell<Vec<TelemetryGroup>>,
    cache: RefCell<FastHashMap<LayerQuery, Rc<MapLayers>>>,
}

impl FeatureSet {
    pub fn new(points: Vec<TelemetryPoint>, tracks: Vec<TelemetryTrack>) -> Self {
        FeatureSet {
            points,
            tracks,
            overview: OnceCell::new(),
            cache: RefCell::new(FastHashMap::default()),
        }
    }

    pub fn points(&self) -> &[TelemetryPoint] {
        &self.points
    }

    pub fn tracks(&self) -> &[TelemetryTrack] {
        &self.tracks
    }

    /// All fixes grouped per animal, computed on first use.
    pub fn overview(&self) -> &[TelemetryGroup] {
        self.overview
            .get_or_init(|| group(&self.points, None, &PropertyKey::AnimalId))
    }

    /// Derived layers for `query`, computed once per snapshot and query.
    ///
    /// Pipeline
    /// -----------------
    /// 1. [`apply_filter`] on points and tracks,
    /// 2. [`group`] with the query's sort and grouping field,
    /// 3. [`window_last_n`] when `last_n` is set,
    /// 4. [`split_all`] into latest and other fixes.
    pub fn layers(&self, query: &LayerQuery) -> Rc<MapLayers> {
        if let Some(layers) = self.cache.borrow().get(query) {
            trace!("layer cache hit");
            return Rc::clone(layers);
        }

        let points = apply_filter(&query.filters, &self.points);
        let tracks = apply_filter(&query.filters, &self.tracks);
        let groups = group(&points, query.sort.as_ref(), &query.group_by);

        let (groups, tracks) = match query.last_n {
            Some(n) => {
                let windowed = window_last_n(&groups, &tracks, n);
                (windowed.groups, windowed.tracks)
            }
            None => (groups, tracks),
        };
        let (latest, other) = split_all(&groups);

        let layers = Rc::new(MapLayers {
            groups,
            latest,
            other,
            tracks,
        });
        self.cache
            .borrow_mut()
            .insert(query.clone(), Rc::clone(&layers));
        layers
    }

    /// Number of memoized queries.
    pub fn cached_queries(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// A live map view over render handles of type `H`.
#[derive(Debug)]
pub struct Telemap<H> {
    params: MapParams,
    state: MarkerState,
    registry: MarkerRegistry<H>,
    features: FeatureSet,
}

impl<H: RenderHandle> Telemap<H> {
    /// Construct an empty view.
    ///
    /// Arguments
    /// -----------------
    /// * `params` – validated view parameters; the initial opacity is taken from them.
    pub fn new(params: MapParams) -> Self {
        Telemap {
            state: MarkerState::with_opacity(params.default_opacity),
            params,
            registry: MarkerRegistry::new(),
            features: FeatureSet::default(),
        }
    }

    pub fn params(&self) -> &MapParams {
        &self.params
    }

    pub fn state(&self) -> &MarkerState {
        &self.state
    }

    pub fn registry(&self) -> &MarkerRegistry<H> {
        &self.registry
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Replace the loaded snapshot; derived layers are recomputed on demand.
    ///
    /// The markers on the map are not touched until the next [`mount`](Telemap::mount) or
    /// [`load`](Telemap::load).
    pub fn set_features(&mut self, points: Vec<TelemetryPoint>, tracks: Vec<TelemetryTrack>) {
        self.features = FeatureSet::new(points, tracks);
    }

    /// Derived layers of the loaded snapshot for `query`.
    pub fn layers(&self, query: &LayerQuery) -> Rc<MapLayers> {
        self.features.layers(query)
    }

    /// Animal ids of the loaded snapshot, in first-seen order.
    pub fn animals(&self) -> Vec<AnimalId> {
        self.features
            .overview()
            .iter()
            .filter_map(|g| g.animal_id.clone())
            .collect()
    }

    /// Fix count distribution of the loaded snapshot.
    pub fn fix_count_stats(&self) -> Option<FixCountStats> {
        self.features.overview().fix_count_stats()
    }

    /// Rebuild the registry from render objects and restyle them.
    ///
    /// Arguments
    /// -----------------
    /// * `tracks`, `points`, `latest` – render objects of each layer.
    ///
    /// Return
    /// ----------
    /// * The report of the reconciliation pass run against the new registry.
    pub fn load<T, P, L>(&mut self, tracks: T, points: P, latest: L) -> ReconcileReport
    where
        T: IntoIterator<Item = RenderObject<H>>,
        P: IntoIterator<Item = RenderObject<H>>,
        L: IntoIterator<Item = RenderObject<H>>,
    {
        self.registry = build_markers(tracks, points, latest, &self.params);
        self.dispatch(MarkerAction::SetMarkers(self.registry.references()))
    }

    /// Draw the layers of `query` and load their markers.
    ///
    /// Arguments
    /// -----------------
    /// * `query` – which derived layers to draw.
    /// * `attach` – creates the render object of one feature and returns its handle.
    ///
    /// See also
    /// ------------
    /// * [`load`](Telemap::load) – Same, from already created render objects.
    pub fn mount<F>(&mut self, query: &LayerQuery, mut attach: F) -> ReconcileReport
    where
        F: FnMut(MarkerKind, &FeatureId) -> H,
    {
        let layers = self.features.layers(query);
        let tracks: Vec<_> = layers
            .tracks
            .iter()
            .map(|t| RenderObject::from_track(t, attach(MarkerKind::Track, &t.id)))
            .collect();
        let points: Vec<_> = layers
            .other
            .iter()
            .map(|p| RenderObject::from_point(p, attach(MarkerKind::Point, &p.id)))
            .collect();
        let latest: Vec<_> = layers
            .latest
            .iter()
            .map(|p| RenderObject::from_point(p, attach(MarkerKind::LatestPoint, &p.id)))
            .collect();
        self.load(tracks, points, latest)
    }

    /// Apply one transition and reconcile the markers with the new state.
    ///
    /// `ResetAll` returns to the initial state of this view: the parameters' opacity and the
    /// markers currently loaded.
    pub fn dispatch(&mut self, action: MarkerAction) -> ReconcileReport {
        let reset_all = matches!(action, MarkerAction::ResetAll);
        let mut next = reduce(&self.state, action);
        if reset_all {
            next.opacity = self.params.default_opacity;
            next.markers = self.registry.references();
        }
        self.state = next;
        self.refresh()
    }

    /// Reconcile without a transition.
    pub fn refresh(&mut self) -> ReconcileReport {
        let report = reconcile(&mut self.registry, &self.state, &self.params.palette);
        debug!("telemap pass: {report}");
        report
    }
}
