use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Context};
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::analysis::{AnalysisClient, AnalyzeRequest, PrimaryJob, ReadingChannel, spawn_primary};
use crate::fragments::{Fragment, GraphData};
use crate::graph::BuiltGraph;
use crate::interaction::InteractionState;
use crate::layout::{LayoutProfiles, Simulation};
use crate::render::{Canvas2d, Perspective3d, ThumbnailCache, ViewMode};

mod canvas;
mod graph;
mod ui;

use canvas::CanvasModel;

/// Launch-time settings shared by every graph the session builds.
#[derive(Clone, Debug)]
pub struct Settings {
    pub profiles: LayoutProfiles,
    pub seed: Option<u64>,
    pub initial_view: ViewMode,
}

pub struct RhizomeApp {
    client: Arc<dyn AnalysisClient>,
    settings: Settings,
    canvas: CanvasModel,
    state: AppState,
}

enum AppState {
    Canvas,
    Analyzing {
        job: PrimaryJob,
        fragments: Vec<Fragment>,
    },
    Graph(Box<GraphView>),
}

/// One analysed graph: its layout, view state, cameras and secondary reading.
struct GraphView {
    client: Arc<dyn AnalysisClient>,
    profiles: LayoutProfiles,
    fragments: Vec<Fragment>,
    data: GraphData,
    graph: BuiltGraph,
    simulation: Simulation,
    rng: StdRng,
    /// Seed of the current layout run, so it can be recomputed in one pass.
    layout_seed: u64,
    interaction: InteractionState,
    reading: ReadingChannel,
    view_mode: ViewMode,
    canvas: Canvas2d,
    perspective: Perspective3d,
    thumbnails: ThumbnailCache,
    needs_fit: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    hovered: Option<Hover>,
    dragging: Option<usize>,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<usize>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hover {
    Node(usize),
    Link(usize),
}

impl RhizomeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        client: Arc<dyn AnalysisClient>,
        fragments: Vec<Fragment>,
        settings: Settings,
    ) -> Self {
        let canvas = CanvasModel::new(fragments, Arc::clone(&client), settings.seed);
        Self {
            client,
            settings,
            canvas,
            state: AppState::Canvas,
        }
    }

    fn start_analysis(&mut self) -> Option<AppState> {
        let fragments = self.canvas.selected_fragments();
        match AnalyzeRequest::new(&fragments) {
            Ok(request) => {
                self.canvas.last_error = None;
                Some(AppState::Analyzing {
                    job: spawn_primary(Arc::clone(&self.client), request),
                    fragments,
                })
            }
            Err(err) => {
                warn!(error = %err, "analysis not started");
                self.canvas.last_error = Some(err.to_string());
                None
            }
        }
    }
}

impl eframe::App for RhizomeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Canvas => {
                if self.canvas.show(ctx) {
                    transition = self.start_analysis();
                }
            }
            AppState::Analyzing { job, fragments } => {
                if let Some(result) = job.poll() {
                    transition = Some(match result {
                        Ok(data) => AppState::Graph(Box::new(GraphView::new(
                            std::mem::take(fragments),
                            data,
                            Arc::clone(&self.client),
                            &self.settings,
                        ))),
                        Err(err) => {
                            self.canvas.last_error = Some(format!("Analysis failed: {err}"));
                            AppState::Canvas
                        }
                    });
                }

                let count = job.fragment_count();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Reading {count} fragments..."));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Graph(view) => {
                if view.show(ctx) {
                    view.leave();
                    info!("returning to fragment canvas");
                    transition = Some(AppState::Canvas);
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
