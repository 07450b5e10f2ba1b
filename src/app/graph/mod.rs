mod interaction;
mod view;

use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisClient, ReadingChannel, SecondaryRequest};
use crate::fragments::{Fragment, GraphData};
use crate::graph::{BuiltGraph, build_from_data, partition};
use crate::interaction::{Action, InteractionState};
use crate::layout::{LayoutProfiles, Position, Simulation, layout};
use crate::render::{Canvas2d, Perspective3d, RenderBackend, ThumbnailCache, ViewMode};

use super::{GraphView, SearchMatchCache, Settings};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Fuzzy matches over node labels and descriptions.
pub(super) fn search_nodes(graph: &BuiltGraph, query: &str) -> HashSet<usize> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            fuzzy_match_score(&matcher, &node.label, query).is_some()
                || fuzzy_match_score(&matcher, &node.description, query).is_some()
        })
        .map(|(index, _)| index)
        .collect()
}

/// Builds the simulation for one layout run. Profiles that do not animate are
/// relaxed in one pass and handed over already at rest.
fn new_simulation(
    graph: &BuiltGraph,
    profiles: &LayoutProfiles,
    mode: ViewMode,
    seed: u64,
) -> Simulation {
    let components = partition(&graph.nodes, &graph.links);
    let dimensions = mode.dimensions();
    let config = profiles.for_dimensions(dimensions);
    debug!(
        components = components.len(),
        ?dimensions,
        animate = config.animate,
        "seeding layout"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    if config.animate {
        return Simulation::new(
            &graph.nodes,
            &graph.links,
            &components,
            config,
            dimensions,
            &mut rng,
        );
    }

    let positions = layout(
        &graph.nodes,
        &graph.links,
        &components,
        config,
        dimensions,
        &mut rng,
    );
    Simulation::settled(&graph.nodes, &graph.links, config, dimensions, &positions)
}

impl GraphView {
    pub(super) fn new(
        fragments: Vec<Fragment>,
        data: GraphData,
        client: Arc<dyn AnalysisClient>,
        settings: &Settings,
    ) -> Self {
        let graph = build_from_data(&fragments, &data);
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layout_seed = rng.next_u64();
        let simulation = new_simulation(&graph, &settings.profiles, settings.initial_view, layout_seed);
        info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            springs = simulation.spring_count(),
            view = settings.initial_view.label(),
            "graph built"
        );

        Self {
            client,
            profiles: settings.profiles.clone(),
            fragments,
            data,
            graph,
            simulation,
            rng,
            layout_seed,
            interaction: InteractionState::default(),
            reading: ReadingChannel::new(),
            view_mode: settings.initial_view,
            canvas: Canvas2d::default(),
            perspective: Perspective3d::default(),
            thumbnails: ThumbnailCache::default(),
            needs_fit: true,
            search: String::new(),
            search_match_cache: None,
            hovered: None,
            dragging: None,
        }
    }

    fn backend(&self) -> &dyn RenderBackend {
        match self.view_mode {
            ViewMode::Flat => &self.canvas,
            ViewMode::Spatial => &self.perspective,
        }
    }

    fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        match self.view_mode {
            ViewMode::Flat => &mut self.canvas,
            ViewMode::Spatial => &mut self.perspective,
        }
    }

    /// Applies an interaction and forwards open-set changes to the secondary reading.
    pub(super) fn dispatch(&mut self, action: Action) {
        let transition = self.interaction.apply(&action);
        self.interaction = transition.state;
        if let Some(open) = transition.opened {
            self.request_reading(&open);
        }
    }

    fn request_reading(&mut self, open: &[String]) {
        if open.is_empty() {
            self.reading.cancel();
            return;
        }

        match SecondaryRequest::for_open(open, &self.fragments, &self.data) {
            Ok(request) => {
                self.reading.request(Arc::clone(&self.client), request);
                debug!(
                    open = open.len(),
                    generation = self.reading.generation(),
                    "open set changed"
                );
            }
            Err(err) => {
                warn!(error = %err, "secondary reading not requested");
                self.reading.cancel();
            }
        }
    }

    /// Reseeds and relaxes from scratch in the current view's dimensions.
    /// Drag pins do not survive.
    pub(super) fn relayout(&mut self) {
        self.layout_seed = self.rng.next_u64();
        self.simulation = new_simulation(&self.graph, &self.profiles, self.view_mode, self.layout_seed);
        self.dragging = None;
        self.needs_fit = true;
        info!(view = self.view_mode.label(), "layout restarted");
    }

    /// Finishes the running layout in one pass. The result is the same
    /// layout the animation would reach from this run's seed, with any drag
    /// pins laid back on top.
    pub(super) fn settle_now(&mut self) {
        if self.simulation.is_settled() {
            return;
        }

        let dimensions = self.simulation.dimensions();
        let config = self.profiles.for_dimensions(dimensions);
        let components = partition(&self.graph.nodes, &self.graph.links);
        let positions = layout(
            &self.graph.nodes,
            &self.graph.links,
            &components,
            config,
            dimensions,
            &mut StdRng::seed_from_u64(self.layout_seed),
        );

        let mut settled =
            Simulation::settled(&self.graph.nodes, &self.graph.links, config, dimensions, &positions);
        for (id, position) in self.simulation.overrides().iter() {
            settled.pin(id, position);
        }
        self.simulation = settled;
        debug!(nodes = self.simulation.len(), "layout settled on request");
    }

    /// Switches backends. Positions carry over untouched.
    pub(super) fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        self.view_mode = mode;
        self.dragging = None;
        self.needs_fit = true;
        debug!(view = mode.label(), "view mode changed");
    }

    /// Drops anything still in flight before the view is discarded.
    pub(super) fn leave(&mut self) {
        self.reading.cancel();
    }

    fn positions(&self) -> Vec<Position> {
        self.graph
            .nodes
            .iter()
            .map(|node| self.simulation.position_of(&node.id).unwrap_or_default())
            .collect()
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(search_nodes(&self.graph, query));
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }
}
