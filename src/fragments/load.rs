use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use super::demo::demo_fragments;
use super::model::Fragment;
use super::parse::parse_fragments;

pub fn load_fragments(path: Option<&Path>) -> Result<Vec<Fragment>> {
    let Some(path) = path else {
        return Ok(demo_fragments());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fragments from {}", path.display()))?;
    let parsed = parse_fragments(&raw)
        .with_context(|| format!("failed to parse fragments in {}", path.display()))?;

    let mut seen = HashSet::with_capacity(parsed.len());
    let mut fragments = Vec::with_capacity(parsed.len());
    for fragment in parsed {
        if seen.insert(fragment.id.clone()) {
            fragments.push(fragment);
        } else {
            warn!(id = %fragment.id, "ignoring duplicate fragment id");
        }
    }

    if fragments.is_empty() {
        return Err(anyhow!("no fragments found in {}", path.display()));
    }

    info!(count = fragments.len(), path = %path.display(), "loaded fragments");
    Ok(fragments)
}
