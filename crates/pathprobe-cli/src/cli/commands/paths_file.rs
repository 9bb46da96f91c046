//! Candidate list loader.
//!
//! One candidate per line: `path[<TAB>description[<TAB>match]]`. Blank lines
//! and lines starting with `#` are ignored. A missing description defaults to
//! the path.

use anyhow::{Context, Result};
use pathprobe_core::DiscoveryTask;
use std::fs;
use std::path::Path;

pub fn parse_candidates(text: &str) -> Vec<DiscoveryTask> {
    text.lines().filter_map(parse_line).collect()
}

pub fn load_candidates(path: &Path) -> Result<Vec<DiscoveryTask>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let tasks = parse_candidates(&text);
    tracing::debug!(count = tasks.len(), file = %path.display(), "loaded candidates");
    Ok(tasks)
}

fn parse_line(line: &str) -> Option<DiscoveryTask> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        return None;
    }
    let mut fields = line.split('\t').map(str::trim);
    let raw_path = fields.next()?;
    let path = if raw_path.starts_with('/') {
        raw_path.to_string()
    } else {
        format!("/{raw_path}")
    };
    let description = match fields.next() {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => path.clone(),
    };
    let task = DiscoveryTask::new(path, description);
    Some(match fields.next() {
        Some(m) if !m.is_empty() => task.with_match_string(m),
        _ => task,
    })
}
