/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The world part of the picture comes from an engine `Frame`: tiles from
/// its state, the player and viewport from its fractional positions, and
/// the reset fade from its blackout level.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use jumpgrid::domain::entity::{FlipState, Player, Sprite};
use jumpgrid::domain::point::Point;
use jumpgrid::domain::tile::{Bus, Dir, ItemKind, Tile};
use jumpgrid::sim::playback::Frame;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }
}

// ── Renderer ──

/// Each game cell is two terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HELP: &str = "arrows/wasd move  q/e diagonal jump  r reset  c center  p save  esc quit";

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal reports key releases.
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
            self.key_release = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    /// Whether `init` turned on release reporting.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_release = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, frame: &Frame, status: &str) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(frame, status);
        self.compose_world(frame);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, frame: &Frame, status: &str) {
        let s = &frame.state;
        let fruit = if s.inventory.impetus_fruit { "  fruit" } else { "" };
        let hud = format!(
            "JUMPGRID  coins {}{}  impetus {}  pos {}  moves {}",
            s.inventory.coins, fruit, s.player.impetus, s.player.pos, s.time
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::Yellow, Cell::BASE_BG);
        self.front.put_str(0, HUD_ROW + 1, status, Color::Grey, Cell::BASE_BG);
        if self.term_h > 0 {
            self.front.put_str(0, self.term_h - 1, HELP, Color::DarkGrey, Cell::BASE_BG);
        }
    }

    fn compose_world(&mut self, frame: &Frame) {
        let s = &frame.state;
        let origin = Point::new(frame.viewport.x.round() as i32, frame.viewport.y.round() as i32);
        let cols = (s.viewport.size.x.max(0) as usize).min(self.term_w / CELL_W);
        let rows = (s.viewport.size.y.max(0) as usize).min(self.term_h.saturating_sub(MAP_ROW + 1));
        let shade = 1.0 - frame.blackout.clamp(0.0, 1.0);

        for row in 0..rows {
            for col in 0..cols {
                let p = origin + Point::new(col as i32, row as i32);
                let (glyph, fg) = tile_glyph(&s.tile_at(p));
                self.put_cell(col, row, glyph, dim(fg, shade));
            }
        }

        let player = Point::new(frame.player_pos.x.round() as i32, frame.player_pos.y.round() as i32) - origin;
        if player.x >= 0 && player.y >= 0 && (player.x as usize) < cols && (player.y as usize) < rows {
            let (glyph, fg) = player_glyph(&s.player);
            self.put_cell(player.x as usize, player.y as usize, &glyph, dim(fg, shade));
        }
    }

    fn put_cell(&mut self, col: usize, row: usize, glyph: &str, fg: Color) {
        let bg = Cell::BASE_BG;
        let mut chars = glyph.chars();
        let a = chars.next().unwrap_or(' ');
        let b = chars.next().unwrap_or(' ');
        self.front.set(col * CELL_W, MAP_ROW + row, Cell { ch: a, fg, bg });
        self.front.set(col * CELL_W + 1, MAP_ROW + row, Cell { ch: b, fg, bg });
    }
}

// ── Glyphs ──

fn tile_glyph(tile: &Tile) -> (&'static str, Color) {
    match tile {
        Tile::Empty => ("  ", Color::White),
        Tile::Box => ("[]", rgb(170, 120, 70)),
        Tile::Box3 => ("[3", rgb(170, 120, 70)),
        Tile::FragileBox => ("%%", rgb(200, 170, 120)),
        Tile::BrokenBox => (": ", rgb(120, 100, 80)),
        Tile::UpBox => ("/\\", rgb(90, 200, 255)),
        Tile::SavePoint => ("S>", rgb(80, 255, 120)),
        Tile::GripWall => ("##", rgb(150, 150, 170)),
        Tile::CoinWall => ("$$", rgb(255, 210, 60)),
        Tile::ButtonOn => ("(o", rgb(255, 120, 120)),
        Tile::ButtonOff => ("(.", rgb(160, 90, 90)),
        Tile::TimedWall => ("==", rgb(200, 200, 255)),
        Tile::ButtonedWall => ("||", rgb(255, 120, 120)),
        Tile::Ladder => ("|-", rgb(200, 160, 90)),
        Tile::Spike { dir } => match dir {
            Dir::Up => ("^^", rgb(230, 60, 60)),
            Dir::Down => ("vv", rgb(230, 60, 60)),
            Dir::Left => ("<<", rgb(230, 60, 60)),
            Dir::Right => (">>", rgb(230, 60, 60)),
        },
        Tile::Item { kind: ItemKind::Coin } => (" o", rgb(255, 210, 60)),
        Tile::Item { kind: ItemKind::ImpetusFruit } => (" *", rgb(255, 90, 200)),
        Tile::BusBlock { bus, on } => (if *on { "[]" } else { ".." }, bus_color(*bus)),
        Tile::BusButton { bus, on } => (if *on { "(O" } else { "(." }, bus_color(*bus)),
        Tile::MotionBlock { bus, on } => (if *on { "<>" } else { ".." }, bus_color(*bus)),
        Tile::Door { .. } => ("[D", rgb(120, 255, 255)),
    }
}

fn player_glyph(player: &Player) -> (String, Color) {
    if player.dead {
        return ("X ".into(), rgb(230, 60, 60));
    }
    let mark = match player.anim_state {
        Sprite::Player => ' ',
        Sprite::PlayerRise => '^',
        Sprite::PlayerFall => 'v',
        Sprite::PlayerWall => '|',
        Sprite::PlayerCrouch => '_',
    };
    let glyph = match player.flip_state {
        FlipState::Right => format!("@{mark}"),
        FlipState::Left => format!("{mark}@"),
    };
    (glyph, Color::White)
}

fn bus_color(bus: Bus) -> Color {
    match bus {
        Bus::Red => rgb(230, 80, 80),
        Bus::Green => rgb(80, 220, 100),
        Bus::Blue => rgb(90, 130, 255),
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

/// Fade a colour towards black; `shade` 1 is untouched, 0 is black.
fn dim(color: Color, shade: f32) -> Color {
    let scale = |c: u8| (f32::from(c) * shade).round() as u8;
    match color {
        Color::Rgb { r, g, b } => Color::Rgb { r: scale(r), g: scale(g), b: scale(b) },
        Color::White => {
            let v = scale(255);
            Color::Rgb { r: v, g: v, b: v }
        }
        _ if shade < 0.5 => Color::Black,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_glyph_follows_facing_and_sprite() {
        let mut p = Player::new(Point::ZERO);
        p.anim_state = Sprite::PlayerRise;
        assert_eq!(player_glyph(&p).0, "@^");
        p.flip_state = FlipState::Left;
        assert_eq!(player_glyph(&p).0, "^@");
        p.dead = true;
        assert_eq!(player_glyph(&p).0, "X ");
    }

    #[test]
    fn full_blackout_is_black() {
        assert_eq!(dim(rgb(200, 100, 50), 0.0), rgb(0, 0, 0));
        assert_eq!(dim(rgb(200, 100, 50), 1.0), rgb(200, 100, 50));
    }
}
