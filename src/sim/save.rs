/// Layer saves: the world as a flat JSON map of cells.
///
/// ## File format
///
/// ```json
/// { "tiles": { "3,-1": {"kind":"static","tile":{"t":"box"}},
///              "4,-1": {"kind":"timed","phase":0,"on_for":2,"off_for":2} },
///   "spawn": {"x":0,"y":0} }
/// ```
///
/// Keys are `"x,y"`. Only non-empty cells are written. Dynamic tiles are
/// stored unresolved, so timed and buttoned walls keep their wiring.
/// `spawn` is optional; levels loaded without one start at the origin.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::layer::{DynamicTile, Layer};
use crate::domain::point::{Point, PointParseError};

use super::world::{GameState, Terrain};

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct LayerSave {
    pub tiles: BTreeMap<String, DynamicTile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<Point>,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save key: {0}")]
    BadKey(#[from] PointParseError),
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Capture / restore
// ══════════════════════════════════════════════════════════════

/// Snapshot of everything placed in the world: the designed level with the
/// session overlay on top. Procedural terrain is not captured; only the
/// overlay is.
pub fn overlay_for_save(state: &GameState) -> LayerSave {
    let mut flat = match &state.terrain {
        Terrain::Level(stack) => stack.flatten(),
        Terrain::Procedural(_) => Layer::new(),
    };
    for (p, t) in state.overlay.iter() {
        flat.put(p, t.clone());
    }
    let mut save = save_from_layer(&flat);
    save.spawn = Some(state.last_save);
    save
}

pub fn save_from_layer(layer: &Layer) -> LayerSave {
    let tiles = layer
        .iter()
        .filter(|(_, t)| !t.is_static_empty())
        .map(|(p, t)| (p.to_string(), t.clone()))
        .collect();
    LayerSave { tiles, spawn: None }
}

pub fn layer_from_save(save: &LayerSave) -> Result<Layer, SaveError> {
    let mut layer = Layer::new();
    for (key, tile) in &save.tiles {
        let p: Point = key.parse()?;
        layer.put(p, tile.clone());
    }
    Ok(layer)
}

// ══════════════════════════════════════════════════════════════
// JSON / files
// ══════════════════════════════════════════════════════════════

pub fn to_json(save: &LayerSave) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(save)?)
}

pub fn from_json(text: &str) -> Result<LayerSave, SaveError> {
    Ok(serde_json::from_str(text)?)
}

pub fn write_save(path: &Path, state: &GameState) -> Result<(), SaveError> {
    let json = to_json(&overlay_for_save(state))?;
    std::fs::write(path, json).map_err(|source| SaveError::Io { path: path.to_path_buf(), source })
}

pub fn read_save(path: &Path) -> Result<LayerSave, SaveError> {
    let text = std::fs::read_to_string(path).map_err(|source| SaveError::Io { path: path.to_path_buf(), source })?;
    from_json(&text)
}
