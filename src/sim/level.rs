/// Level loader.
///
/// ## Sources (priority order):
///   1. Path given on the command line
///   2. `[general] level_path` from config
///   3. Built-in embedded level
///   or, with `[general] infinite = true`, the procedural chunk world.
///
/// ## Text format (`.txt`):
///   ```text
///   ; Level Name
///   ; further ';' lines are comments
///   ! timed 12,4 0 2 2        timed wall at 12,4: phase, on, off
///   ! button 20,3 17,6        wall at 20,3 closed while 17,6 is pressed
///   ! door 30,5 bonus         door at 30,5 leading to "bonus"
///   <map rows>
///   ```
///   Row `n` is `y = n`, column `m` is `x = m`. Directives are applied
///   after the rows and override whatever the row placed there.
///
/// ## JSON format (`.json`):
///   A layer save (see `save`), spawn taken from its `spawn` field.
///
/// ## Tile legend:
///   '#' = Box            '3' = Box3           '%' = Fragile box
///   'U' = Up box         'W' = Grip wall      '$' = Coin wall
///   'S' = Save point     'H' = Ladder         'o' = Coin
///   '*' = Impetus fruit  '^' 'v' '<' '>' = Spikes
///   'b' = Button (off)   'B' = Button (on)    'T' = Timed wall (0,2,2)
///   'R' 'G' 'L' = Red/green/blue bus blocks
///   'r' 'g' 'l' = Red/green/blue bus buttons
///   '@' = Player spawn   anything else = Empty

use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

use crate::config::GameConfig;
use crate::domain::chunk::ChunkCache;
use crate::domain::layer::{DynamicTile, Layer, LayerStack};
use crate::domain::point::Point;
use crate::domain::tile::{Bus, Dir, ItemKind, Tile};

use super::save::{from_json, layer_from_save, SaveError};
use super::world::{GameState, Terrain, Viewport};

pub struct LevelDef {
    pub name: String,
    pub layer: Layer,
    pub spawn: Point,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {msg}")]
    Directive { line: usize, msg: String },
    #[error("level has no spawn point '@'")]
    NoSpawn,
    #[error("second spawn point at {0}")]
    DuplicateSpawn(Point),
    #[error(transparent)]
    Save(#[from] SaveError),
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl LevelDef {
    pub fn into_state(self, viewport: Viewport) -> GameState {
        let terrain = Terrain::Level(Rc::new(LayerStack::base(self.layer)));
        GameState::new(terrain, self.spawn, viewport)
    }
}

/// Build the starting state the config asks for. `level_override` wins
/// over the configured level path.
pub fn new_game(config: &GameConfig, level_override: Option<&Path>) -> Result<GameState, LevelError> {
    let vp = &config.viewport;
    let viewport = Viewport::new(Point::new(vp.width, vp.height), vp.margin);

    if config.general.infinite && level_override.is_none() {
        info!(seed = config.general.seed, "starting procedural world");
        let cache = ChunkCache::new(config.general.seed, config.debug.log_chunks);
        return Ok(GameState::new(Terrain::Procedural(Rc::new(cache)), Point::ZERO, viewport));
    }

    let def = match level_override.or(config.general.level_path.as_deref()) {
        Some(path) => load_level_file(path)?,
        None => embedded_level()?,
    };
    info!(name = %def.name, cells = def.layer.len(), spawn = %def.spawn, "level loaded");
    Ok(def.into_state(viewport))
}

pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        level_from_json(&text, &stem)
    } else {
        parse_level(&text)
    }
}

pub fn level_from_json(text: &str, name: &str) -> Result<LevelDef, LevelError> {
    let save = from_json(text)?;
    Ok(LevelDef {
        name: name.to_string(),
        layer: layer_from_save(&save)?,
        spawn: save.spawn.unwrap_or(Point::ZERO),
    })
}

// ══════════════════════════════════════════════════════════════
// Text parsing
// ══════════════════════════════════════════════════════════════

pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = None;
    let mut layer = Layer::new();
    let mut spawn = None;
    let mut directives = vec![];
    let mut y = 0;

    for (idx, line) in content.lines().enumerate() {
        if let Some(rest) = line.strip_prefix(';') {
            if name.is_none() && !rest.trim().is_empty() {
                name = Some(rest.trim().to_string());
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix('!') {
            directives.push((idx + 1, rest));
            continue;
        }
        for (x, ch) in line.chars().enumerate() {
            let p = Point::new(x as i32, y);
            if ch == '@' {
                if spawn.replace(p).is_some() {
                    return Err(LevelError::DuplicateSpawn(p));
                }
            } else if let Some(tile) = legend(ch) {
                layer.put(p, tile);
            }
        }
        y += 1;
    }

    for (line, text) in directives {
        apply_directive(&mut layer, line, text)?;
    }

    Ok(LevelDef {
        name: name.unwrap_or_else(|| "Untitled".to_string()),
        layer,
        spawn: spawn.ok_or(LevelError::NoSpawn)?,
    })
}

fn legend(ch: char) -> Option<DynamicTile> {
    let tile = match ch {
        '#' => Tile::Box,
        '3' => Tile::Box3,
        '%' => Tile::FragileBox,
        'U' => Tile::UpBox,
        'W' => Tile::GripWall,
        '$' => Tile::CoinWall,
        'S' => Tile::SavePoint,
        'H' => Tile::Ladder,
        'o' => Tile::Item { kind: ItemKind::Coin },
        '*' => Tile::Item { kind: ItemKind::ImpetusFruit },
        '^' => Tile::Spike { dir: Dir::Up },
        'v' => Tile::Spike { dir: Dir::Down },
        '<' => Tile::Spike { dir: Dir::Left },
        '>' => Tile::Spike { dir: Dir::Right },
        'b' => Tile::ButtonOff,
        'B' => Tile::ButtonOn,
        'T' => return Some(DynamicTile::Timed { phase: 0, on_for: 2, off_for: 2 }),
        'R' => return Some(DynamicTile::BusBlock { bus: Bus::Red }),
        'G' => return Some(DynamicTile::BusBlock { bus: Bus::Green }),
        'L' => return Some(DynamicTile::BusBlock { bus: Bus::Blue }),
        'r' => return Some(DynamicTile::BusButton { bus: Bus::Red }),
        'g' => return Some(DynamicTile::BusButton { bus: Bus::Green }),
        'l' => return Some(DynamicTile::BusButton { bus: Bus::Blue }),
        _ => return None,
    };
    Some(DynamicTile::from(tile))
}

fn apply_directive(layer: &mut Layer, line: usize, text: &str) -> Result<(), LevelError> {
    let bad = |msg: String| LevelError::Directive { line, msg };
    let mut words = text.split_whitespace();
    let kind = words.next().ok_or_else(|| bad("empty directive".into()))?;
    let at: Point = words
        .next()
        .ok_or_else(|| bad(format!("{kind}: missing position")))?
        .parse()
        .map_err(|e| bad(format!("{kind}: {e}")))?;

    match kind {
        "timed" => {
            let mut num = |what: &str| -> Result<u32, LevelError> {
                words
                    .next()
                    .and_then(|w| w.parse().ok())
                    .ok_or_else(|| bad(format!("timed: bad or missing {what}")))
            };
            let phase = num("phase")?;
            let on_for = num("on_for")?;
            let off_for = num("off_for")?;
            layer.put(at, DynamicTile::Timed { phase, on_for, off_for });
        }
        "button" => {
            let source: Point = words
                .next()
                .ok_or_else(|| bad("button: missing source".into()))?
                .parse()
                .map_err(|e| bad(format!("button: {e}")))?;
            layer.put(at, DynamicTile::Buttoned { source });
        }
        "door" => {
            let dest = words.collect::<Vec<_>>().join(" ");
            if dest.is_empty() {
                return Err(bad("door: missing destination".into()));
            }
            layer.put(at, Tile::Door { dest });
        }
        other => return Err(bad(format!("unknown directive '{other}'"))),
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback level
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &str = "\
; Grid 1 - First Steps
; Crouch on a floor to charge, jump, and mind the spikes.
! timed 25,6 0 3 3
! button 34,5 30,7
! door 39,9 bonus
                                        
   o         $    S          *          
  ###       ###  ###       #####        
                                   W    
       U            %%%            W   o
      ###           # #   ^^^      W ###
 @          ###    TT        ###        
#####  #################  ####B##   ### 
    #  #                      ######### 
    ####              GGG     r         
";

pub fn embedded_level() -> Result<LevelDef, LevelError> {
    parse_level(EMBEDDED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_spawn() {
        let def = parse_level("; Tiny\n  #\n @%\n").unwrap();
        assert_eq!(def.name, "Tiny");
        assert_eq!(def.spawn, Point::new(1, 1));
        assert_eq!(def.layer.get(Point::new(2, 0)), Some(&DynamicTile::from(Tile::Box)));
        assert_eq!(def.layer.get(Point::new(2, 1)), Some(&DynamicTile::from(Tile::FragileBox)));
        assert_eq!(def.layer.len(), 2);
    }

    #[test]
    fn directives_override_rows() {
        let def = parse_level("! timed 0,0 1 2 3\n! button 1,0 2,0\n! door 0,1 far away\n#@B\n ").unwrap();
        assert_eq!(def.layer.get(Point::new(0, 0)), Some(&DynamicTile::Timed { phase: 1, on_for: 2, off_for: 3 }));
        assert_eq!(def.layer.get(Point::new(1, 0)), Some(&DynamicTile::Buttoned { source: Point::new(2, 0) }));
        assert_eq!(
            def.layer.get(Point::new(0, 1)),
            Some(&DynamicTile::from(Tile::Door { dest: "far away".into() }))
        );
    }

    #[test]
    fn dynamic_legend_entries() {
        let def = parse_level("@TRl").unwrap();
        assert_eq!(def.layer.get(Point::new(1, 0)), Some(&DynamicTile::Timed { phase: 0, on_for: 2, off_for: 2 }));
        assert_eq!(def.layer.get(Point::new(2, 0)), Some(&DynamicTile::BusBlock { bus: Bus::Red }));
        assert_eq!(def.layer.get(Point::new(3, 0)), Some(&DynamicTile::BusButton { bus: Bus::Blue }));
    }

    #[test]
    fn spawn_errors() {
        assert!(matches!(parse_level("###"), Err(LevelError::NoSpawn)));
        assert!(matches!(parse_level("@ @"), Err(LevelError::DuplicateSpawn(p)) if p == Point::new(2, 0)));
    }

    #[test]
    fn directive_errors_carry_line_numbers() {
        match parse_level("@\n! warp 1,1") {
            Err(LevelError::Directive { line, msg }) => {
                assert_eq!(line, 2);
                assert!(msg.contains("warp"));
            }
            _ => panic!("expected a directive error"),
        }
        assert!(matches!(parse_level("@\n! timed 1,1 0 x 2"), Err(LevelError::Directive { line: 2, .. })));
        assert!(matches!(parse_level("@\n! button a,b 1,1"), Err(LevelError::Directive { .. })));
    }

    #[test]
    fn embedded_level_is_valid() {
        let def = embedded_level().unwrap();
        assert_eq!(def.name, "Grid 1 - First Steps");
        assert_eq!(def.spawn, Point::new(1, 6));
        assert_eq!(def.layer.get(Point::new(39, 9)), Some(&DynamicTile::from(Tile::Door { dest: "bonus".into() })));
        let state = def.into_state(Viewport::new(Point::new(31, 17), 2));
        assert_eq!(state.tile_at(Point::new(1, 7)), Tile::Box);
    }

    #[test]
    fn json_levels() {
        let def = level_from_json(r#"{"tiles":{"0,1":{"kind":"static","tile":{"t":"box"}}},"spawn":{"x":0,"y":0}}"#, "saved").unwrap();
        assert_eq!(def.name, "saved");
        assert_eq!(def.spawn, Point::ZERO);
        assert_eq!(def.layer.len(), 1);
        assert!(matches!(level_from_json("[]", "x"), Err(LevelError::Save(_))));
    }

    #[test]
    fn infinite_config_starts_procedural() {
        let mut cfg = GameConfig::default();
        cfg.general.infinite = true;
        let state = new_game(&cfg, None).unwrap();
        assert!(matches!(state.terrain, Terrain::Procedural(_)));
        assert_eq!(state.player.pos, Point::ZERO);
    }
}
