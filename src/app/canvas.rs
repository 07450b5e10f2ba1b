use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui::{self, Color32, Context, RichText, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::analysis::{
    AnalysisClient, DescribeImageRequest, ImageJob, MIN_PRIMARY_FRAGMENTS, spawn_describe,
};
use crate::fragments::{Fragment, ImageReading, LIBRARY, load_image, random_diverse, random_mix};
use crate::render::ThumbnailCache;
use crate::util::truncate_words;

const SURPRISE_COUNT: usize = 5;
const MIX_COUNT: usize = 8;
const SHELF_PICK_COUNT: usize = 3;

/// Editable fragment list shown before analysis.
pub(super) struct CanvasModel {
    fragments: Vec<Fragment>,
    selected: BTreeSet<String>,
    draft: String,
    image_path: String,
    pub(super) last_error: Option<String>,
    next_id: usize,
    client: Arc<dyn AnalysisClient>,
    image_jobs: Vec<ImageJob>,
    rng: StdRng,
    show_library: bool,
    thumbnails: ThumbnailCache,
}

impl CanvasModel {
    pub(super) fn new(fragments: Vec<Fragment>, client: Arc<dyn AnalysisClient>, seed: Option<u64>) -> Self {
        let selected = fragments.iter().map(|fragment| fragment.id.clone()).collect();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            next_id: fragments.len() + 1,
            fragments,
            selected,
            draft: String::new(),
            image_path: String::new(),
            last_error: None,
            client,
            image_jobs: Vec::new(),
            rng,
            show_library: false,
            thumbnails: ThumbnailCache::default(),
        }
    }

    pub(super) fn selected_fragments(&self) -> Vec<Fragment> {
        self.fragments
            .iter()
            .filter(|fragment| self.selected.contains(&fragment.id))
            .cloned()
            .collect()
    }

    fn can_analyze(&self) -> bool {
        self.selected_fragments().len() >= MIN_PRIMARY_FRAGMENTS
    }

    fn toggle(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_owned());
        }
    }

    fn select_all(&mut self) {
        self.selected = self
            .fragments
            .iter()
            .map(|fragment| fragment.id.clone())
            .collect();
    }

    fn select_none(&mut self) {
        self.selected.clear();
    }

    fn fresh_id(&mut self) -> String {
        let mut id = format!("frag-{}", self.next_id);
        while self.fragments.iter().any(|fragment| fragment.id == id) {
            self.next_id += 1;
            id = format!("frag-{}", self.next_id);
        }
        self.next_id += 1;
        id
    }

    fn push_selected(&mut self, fragment: Fragment) -> String {
        let id = fragment.id.clone();
        self.fragments.push(fragment);
        self.selected.insert(id.clone());
        id
    }

    fn has_text(&self, text: &str) -> bool {
        self.fragments.iter().any(|fragment| fragment.text == text)
    }

    /// Appends `text` as a new selected fragment. Blank text is ignored.
    fn add_text(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let id = self.fresh_id();
        Some(self.push_selected(Fragment::text(id, text)))
    }

    /// Adds library picks, skipping any already on the canvas.
    fn add_many(&mut self, texts: &[&str]) -> Vec<String> {
        let added = texts
            .iter()
            .filter_map(|text| if self.has_text(text) { None } else { self.add_text(text) })
            .collect::<Vec<_>>();
        if !added.is_empty() {
            info!(count = added.len(), "library fragments added");
        }
        added
    }

    fn add_draft(&mut self) -> Option<String> {
        let draft = std::mem::take(&mut self.draft);
        let id = self.add_text(&draft);
        if id.is_none() {
            self.draft = draft;
        }
        id
    }

    /// Adds the picture at `path` as a fragment and asks the service to read it.
    /// The fragment's text is filled in when the reading arrives.
    fn add_image(&mut self, path: &Path) -> Option<String> {
        let image = match load_image(path) {
            Ok(image) => image,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "image not added");
                self.last_error = Some(format!("{err:#}"));
                return None;
            }
        };
        let request = DescribeImageRequest::new(&image);

        let id = self.fresh_id();
        self.push_selected(Fragment {
            id: id.clone(),
            text: String::new(),
            image: Some(image),
        });

        match request {
            Ok(request) => {
                self.image_jobs
                    .push(spawn_describe(Arc::clone(&self.client), id.clone(), request));
            }
            Err(err) => self.last_error = Some(err.to_string()),
        }
        Some(id)
    }

    fn add_image_from_field(&mut self) {
        let path = PathBuf::from(self.image_path.trim());
        if path.as_os_str().is_empty() {
            return;
        }
        if self.add_image(&path).is_some() {
            self.image_path.clear();
        }
    }

    fn apply_reading(&mut self, id: &str, reading: ImageReading) {
        let Some(fragment) = self.fragments.iter_mut().find(|fragment| fragment.id == id) else {
            return;
        };
        if fragment.text.trim().is_empty()
            && let Some(text) = reading.fragment_text()
        {
            fragment.text = text.to_owned();
        }
        if let Some(image) = fragment.image.as_mut() {
            image.reading = Some(reading);
        }
    }

    /// Collects finished image readings. A failed reading leaves the
    /// fragment in place without text.
    fn poll_images(&mut self) {
        let mut finished = Vec::new();
        self.image_jobs.retain(|job| match job.poll() {
            Some(result) => {
                finished.push((job.fragment_id().to_owned(), result));
                false
            }
            None => true,
        });

        for (id, result) in finished {
            match result {
                Ok(reading) => self.apply_reading(&id, reading),
                Err(err) => {
                    warn!(fragment = %id, error = %err, "image left without a reading");
                    self.last_error = Some(format!("Could not read image {id}: {err}"));
                }
            }
        }
    }

    fn show_library_panel(&mut self, ctx: &Context) {
        let mut picks = Vec::new();

        egui::SidePanel::right("library")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Library");
                    if ui.button("Surprise me").clicked() {
                        picks = random_diverse(SURPRISE_COUNT, &mut self.rng);
                    }
                    if ui.button(format!("Random mix ({MIX_COUNT})")).clicked() {
                        picks = random_mix(MIX_COUNT, &mut self.rng);
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for shelf in LIBRARY {
                            egui::CollapsingHeader::new(shelf.name).show(ui, |ui| {
                                if ui.small_button(format!("+ Random {SHELF_PICK_COUNT}")).clicked() {
                                    picks = shelf.pick(SHELF_PICK_COUNT, &mut self.rng);
                                }
                                for &text in shelf.fragments {
                                    let present = self.fragments.iter().any(|fragment| fragment.text == text);
                                    let button = egui::Button::new(RichText::new(text).small()).wrap();
                                    if ui.add_enabled(!present, button).clicked() {
                                        picks = vec![text];
                                    }
                                }
                            });
                        }
                    });
            });

        if !picks.is_empty() {
            self.add_many(&picks);
        }
    }

    /// Draws the canvas. Returns true when analysis was requested.
    pub(super) fn show(&mut self, ctx: &Context) -> bool {
        self.poll_images();
        if !self.image_jobs.is_empty() {
            ctx.request_repaint();
        }

        let dropped = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect::<Vec<_>>()
        });
        for path in dropped {
            self.add_image(&path);
        }

        let mut analyze_requested = false;

        egui::TopBottomPanel::top("canvas_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("rhizome");
                    ui.separator();
                    ui.label(format!(
                        "{} of {} fragments selected",
                        self.selected.len(),
                        self.fragments.len()
                    ));
                    if ui.button("Select all").clicked() {
                        self.select_all();
                    }
                    if ui.button("Select none").clicked() {
                        self.select_none();
                    }
                    ui.toggle_value(&mut self.show_library, "Library");

                    let analyze = ui
                        .add_enabled(self.can_analyze(), egui::Button::new("Analyze"))
                        .on_disabled_hover_text(format!(
                            "Select at least {MIN_PRIMARY_FRAGMENTS} fragments"
                        ));
                    if analyze.clicked() {
                        analyze_requested = true;
                    }
                });

                if let Some(error) = &self.last_error {
                    ui.colored_label(Color32::from_rgb(239, 68, 68), error.as_str());
                }
            });

        egui::TopBottomPanel::bottom("canvas_draft")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.label("New fragment");
                ui.add(
                    egui::TextEdit::multiline(&mut self.draft)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .hint_text("A line, a memory, a half-formed thought..."),
                );
                if ui.button("Add fragment").clicked() {
                    self.add_draft();
                }
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.image_path)
                            .desired_width(360.0)
                            .hint_text("Path to an image, or drop one on the window"),
                    );
                    if ui.button("Add image").clicked() {
                        self.add_image_from_field();
                    }
                });
                ui.add_space(4.0);
            });

        if self.show_library {
            self.show_library_panel(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.fragments.is_empty() {
                ui.label("No fragments yet. Add one below.");
                return;
            }

            let mut toggled = None;
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for fragment in &self.fragments {
                        let mut checked = self.selected.contains(&fragment.id);
                        ui.horizontal(|ui| {
                            if ui.checkbox(&mut checked, "").changed() {
                                toggled = Some(fragment.id.clone());
                            }
                            if let Some(image) = fragment
                                .image
                                .as_ref()
                                .and_then(|image| self.thumbnails.image(ctx, &fragment.id, &image.thumbnail))
                            {
                                ui.add(egui::Image::new((image.texture, vec2(48.0, 48.0))).uv(image.uv));
                            }
                            ui.vertical(|ui| {
                                let describing =
                                    self.image_jobs.iter().any(|job| job.fragment_id() == fragment.id);
                                if fragment.text.trim().is_empty() && describing {
                                    ui.horizontal(|ui| {
                                        ui.spinner();
                                        ui.weak("reading the image...");
                                    });
                                } else {
                                    ui.label(RichText::new(truncate_words(&fragment.text, 40)));
                                }
                                let mut meta = fragment.id.clone();
                                if fragment.image.is_some() {
                                    meta.push_str("  [image]");
                                }
                                ui.small(meta);
                            });
                        });
                        ui.separator();
                    }
                });

            if let Some(id) = toggled {
                self.toggle(&id);
            }
        });

        analyze_requested
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::analysis::FixtureAnalysisClient;
    use crate::fragments::sample_png;

    fn canvas_with(fragments: Vec<Fragment>, client: FixtureAnalysisClient) -> CanvasModel {
        CanvasModel::new(fragments, Arc::new(client), Some(11))
    }

    fn canvas(fragments: Vec<Fragment>) -> CanvasModel {
        canvas_with(fragments, FixtureAnalysisClient::default())
    }

    fn wait_for_readings(canvas: &mut CanvasModel) {
        for _ in 0..200 {
            canvas.poll_images();
            if canvas.image_jobs.is_empty() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("image readings never finished");
    }

    fn png_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("bowl.png");
        std::fs::write(&path, sample_png(64, 48)).unwrap();
        path
    }

    #[test]
    fn selection_and_drafts() {
        let mut canvas = canvas(vec![
            Fragment::text("frag-1", "a"),
            Fragment::text("frag-2", "b"),
        ]);
        assert_eq!(canvas.selected_fragments().len(), 2);
        assert!(canvas.can_analyze());

        canvas.toggle("frag-1");
        assert_eq!(canvas.selected_fragments()[0].id, "frag-2");
        assert!(!canvas.can_analyze());

        canvas.draft = "   ".to_owned();
        assert_eq!(canvas.add_draft(), None);

        canvas.draft = "  a new thought  ".to_owned();
        assert_eq!(canvas.add_draft().as_deref(), Some("frag-3"));
        assert_eq!(canvas.fragments[2].text, "a new thought");
        assert!(canvas.selected.contains("frag-3"));
        assert!(canvas.draft.is_empty());
        assert!(canvas.can_analyze());

        canvas.select_none();
        assert!(canvas.selected_fragments().is_empty());
        canvas.select_all();
        assert_eq!(canvas.selected_fragments().len(), 3);
    }

    #[test]
    fn draft_ids_skip_existing_ones() {
        let mut canvas = canvas(vec![Fragment::text("frag-2", "taken")]);
        canvas.draft = "next".to_owned();
        assert_eq!(canvas.add_draft().as_deref(), Some("frag-3"));
    }

    #[test]
    fn library_picks_join_the_canvas_once() {
        let mut canvas = canvas(Vec::new());
        let shelf = &LIBRARY[0];
        let picks = shelf.pick(SHELF_PICK_COUNT, &mut canvas.rng);

        let added = canvas.add_many(&picks);
        assert_eq!(added.len(), SHELF_PICK_COUNT);
        assert_eq!(canvas.selected_fragments().len(), SHELF_PICK_COUNT);
        assert!(picks.iter().all(|text| canvas.has_text(text)));

        assert!(canvas.add_many(&picks).is_empty());
        assert_eq!(canvas.fragments.len(), SHELF_PICK_COUNT);

        let surprise = random_diverse(SURPRISE_COUNT, &mut canvas.rng);
        let added = canvas.add_many(&surprise);
        assert_eq!(canvas.fragments.len(), SHELF_PICK_COUNT + added.len());
        assert!(canvas.can_analyze());
    }

    #[test]
    fn image_fragments_take_their_text_from_the_reading() {
        let dir = tempfile::tempdir().unwrap();
        let client = FixtureAnalysisClient::default()
            .with_image(r#"{"surface": "a bowl", "mood": "quiet", "fragment": "Repair is a kind of memory."}"#);
        let mut canvas = canvas_with(vec![Fragment::text("frag-1", "a")], client);

        canvas.image_path = png_file(&dir).display().to_string();
        canvas.add_image_from_field();
        assert!(canvas.image_path.is_empty());

        let fragment = &canvas.fragments[1];
        assert_eq!(fragment.id, "frag-2");
        assert!(fragment.text.is_empty());
        assert_eq!(fragment.image.as_ref().unwrap().mime_type, "image/png");
        assert_eq!(canvas.image_jobs[0].fragment_id(), "frag-2");
        assert!(canvas.can_analyze());

        wait_for_readings(&mut canvas);
        let fragment = &canvas.fragments[1];
        assert_eq!(fragment.text, "Repair is a kind of memory.");
        let reading = fragment.image.as_ref().unwrap().reading.as_ref().unwrap();
        assert_eq!(reading.mood, "quiet");
        assert!(canvas.last_error.is_none());
    }

    #[test]
    fn unreadable_images_keep_the_fragment_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut canvas = canvas(Vec::new());

        let id = canvas.add_image(&png_file(&dir)).unwrap();
        wait_for_readings(&mut canvas);
        assert_eq!(canvas.fragments.len(), 1);
        assert!(canvas.fragments[0].text.is_empty());
        assert!(canvas.last_error.as_deref().unwrap().contains(&id));

        let not_an_image = dir.path().join("notes.txt");
        std::fs::write(&not_an_image, "just words").unwrap();
        assert_eq!(canvas.add_image(&not_an_image), None);
        assert_eq!(canvas.fragments.len(), 1);
    }
}
