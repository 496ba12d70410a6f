//! Which snap points are exposed for interaction.

use crate::ids::SnapPointId;
use crate::registry::Registry;
use crate::scene::Scene;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Filter applied to the registry before points are shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Points of the selected segments.
    #[default]
    Selected,
    /// Every unconnected point, regardless of selection.
    Unconnected,
    /// Every point.
    All,
    /// Nothing.
    None,
}

impl ViewMode {
    /// Cycle to the next mode. `None` is never entered by cycling.
    pub fn next(self) -> Self {
        match self {
            ViewMode::Selected => ViewMode::Unconnected,
            ViewMode::Unconnected => ViewMode::All,
            ViewMode::All => ViewMode::Selected,
            ViewMode::None => ViewMode::Selected,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewMode::Selected => "View Selected",
            ViewMode::Unconnected => "View Open",
            ViewMode::All => "View All",
            ViewMode::None => "None",
        };
        f.write_str(label)
    }
}

/// Points exposed under `mode`, in registry order. Stale entries are skipped.
pub fn visible_points(
    scene: &Scene,
    registry: &Registry,
    selection: &Selection,
    mode: ViewMode,
) -> Vec<SnapPointId> {
    match mode {
        ViewMode::Selected => registry
            .live_points(scene)
            .filter(|&id| scene.owner(id).is_some_and(|owner| selection.contains(owner)))
            .collect(),
        ViewMode::Unconnected => registry
            .live_points(scene)
            .filter(|&id| !scene.is_connected(id))
            .collect(),
        ViewMode::All => registry.live_points(scene).collect(),
        ViewMode::None => Vec::new(),
    }
}

/// Connected pairs among `visible`, each reported once as `(visible point, partner)`.
pub fn visible_links(scene: &Scene, visible: &[SnapPointId]) -> Vec<(SnapPointId, SnapPointId)> {
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();
    for &id in visible {
        if seen.contains(&id) {
            continue;
        }
        if let Some(partner) = scene.connection(id) {
            seen.insert(partner);
            links.push((id, partner));
        }
    }
    links
}
