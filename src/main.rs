mod analysis;
mod app;
mod fragments;
mod graph;
mod interaction;
mod layout;
mod render;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis::{AnalysisClient, FixtureAnalysisClient, HttpAnalysisClient};
use layout::LayoutProfiles;
use render::ViewMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    #[default]
    #[value(name = "2d")]
    Flat,
    #[value(name = "3d")]
    Spatial,
}

impl From<ViewArg> for ViewMode {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Flat => Self::Flat,
            ViewArg::Spatial => Self::Spatial,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of fragments. The built-in demo set is used when omitted.
    #[arg(long)]
    fragments: Option<PathBuf>,
    /// Base URL of the analysis service.
    #[arg(long, default_value = "http://localhost:3001")]
    endpoint: String,
    /// Canned primary analysis response. Selects the offline client.
    #[arg(long)]
    analysis_fixture: Option<PathBuf>,
    /// Canned secondary reading response. Selects the offline client.
    #[arg(long)]
    secondary_fixture: Option<PathBuf>,
    /// Canned image reading response. Selects the offline client.
    #[arg(long)]
    image_fixture: Option<PathBuf>,
    /// Seed for layout placement. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = ViewArg::Flat)]
    view: ViewArg,
    /// JSON object overriding layout tuning constants.
    #[arg(long)]
    layout_config: Option<PathBuf>,
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

impl Args {
    fn analysis_client(&self) -> Result<Arc<dyn AnalysisClient>> {
        if self.analysis_fixture.is_some()
            || self.secondary_fixture.is_some()
            || self.image_fixture.is_some()
        {
            let client = FixtureAnalysisClient::load(
                self.analysis_fixture.as_deref(),
                self.secondary_fixture.as_deref(),
                self.image_fixture.as_deref(),
            )?;
            info!("using fixture analysis client");
            return Ok(Arc::new(client));
        }

        let client = HttpAnalysisClient::new(&self.endpoint, Duration::from_secs(self.timeout_secs))
            .context("failed to build the analysis HTTP client")?;
        info!(endpoint = client.base_url(), "using analysis service");
        Ok(Arc::new(client))
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rhizome=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let fragments = fragments::load_fragments(args.fragments.as_deref())?;
    let profiles = LayoutProfiles::load(args.layout_config.as_deref())?;
    let client = args.analysis_client()?;
    let settings = app::Settings {
        profiles,
        seed: args.seed,
        initial_view: args.view.into(),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "rhizome",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RhizomeApp::new(
                cc, client, fragments, settings,
            )))
        }),
    )
    .map_err(|err| anyhow!("failed to run the window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_arguments_have_working_defaults() {
        let args = Args::try_parse_from(["rhizome"]).unwrap();
        assert_eq!(args.endpoint, "http://localhost:3001");
        assert_eq!(args.view, ViewArg::Flat);
        assert_eq!(args.timeout_secs, 120);
        assert!(args.seed.is_none());
    }

    #[test]
    fn fixture_flags_select_the_offline_client() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("primary.json");
        std::fs::write(&primary, r#"{"connections": []}"#).unwrap();

        let args = Args::try_parse_from([
            "rhizome",
            "--analysis-fixture",
            primary.to_str().unwrap(),
            "--view",
            "3d",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(ViewMode::from(args.view), ViewMode::Spatial);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.analysis_client().unwrap().name(), "fixture");

        let image = dir.path().join("image.json");
        std::fs::write(&image, r#"{"fragment": "a"}"#).unwrap();
        let args = Args::try_parse_from(["rhizome", "--image-fixture", image.to_str().unwrap()]).unwrap();
        assert_eq!(args.analysis_client().unwrap().name(), "fixture");
    }
}
