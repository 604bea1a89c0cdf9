use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write, stdout};

use crossterm::{
    ExecutableCommand,
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tracing::warn;

use crate::coordinate::Coordinate;
use crate::drone::Drone;
use crate::map::Map;
use crate::overlord::Action;
use crate::types::{DroneId, Icon, MapId};

/// Receives notifications from the Overlord. It is never queried, so every method
/// defaults to doing nothing.
pub trait Dashboard {
    fn create_map_gui(&mut self, _map: &Map) {}
    fn update_maps(&mut self, _maps: &BTreeMap<MapId, Map>) {}
    fn update_drone_table(&mut self, _drones: &BTreeMap<DroneId, Drone>) {}
    fn insert_action(&mut self, _action: &Action, _tick: u64) {}
}

pub struct NullDashboard;

impl Dashboard for NullDashboard {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Absent,
    Unknown,
    Known(Icon),
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Cell::Absent => ' ',
            Cell::Unknown => '·',
            Cell::Known(icon) => icon.glyph(),
        }
    }

    fn color(self) -> Color {
        match self {
            Cell::Absent | Cell::Unknown => Color::DarkGrey,
            Cell::Known(Icon::Wall) => Color::Grey,
            Cell::Known(Icon::Acid) => Color::Green,
            Cell::Known(Icon::Mineral) => Color::Magenta,
            Cell::Known(Icon::DeployZone) => Color::Yellow,
            Cell::Known(Icon::Occupied) => Color::Red,
            Cell::Known(Icon::Empty) => Color::White,
        }
    }
}

/// Known part of a map as rows of cells, top (highest `y`) first.
fn map_cells(map: &Map) -> Vec<Vec<Cell>> {
    let mut tiles = map.tiles().peekable();
    let Some(first) = tiles.peek().map(|tile| tile.coordinate()) else {
        return Vec::new();
    };
    let (mut min, mut max) = (first, first);
    for tile in tiles {
        let at = tile.coordinate();
        min = Coordinate::new(min.x.min(at.x), min.y.min(at.y));
        max = Coordinate::new(max.x.max(at.x), max.y.max(at.y));
    }

    (min.y..=max.y)
        .rev()
        .map(|y| {
            (min.x..=max.x)
                .map(|x| match map.tile(Coordinate::new(x, y)) {
                    None => Cell::Absent,
                    Some(tile) => tile.icon().map_or(Cell::Unknown, Cell::Known),
                })
                .collect()
        })
        .collect()
}

/// Plain text rendering of what the Overlord knows about `map`.
pub fn map_rows(map: &Map) -> Vec<String> {
    map_cells(map)
        .into_iter()
        .map(|row| row.into_iter().map(Cell::glyph).collect())
        .collect()
}

/// Redraws the whole terminal once per Overlord step.
pub struct TerminalDashboard {
    maps: BTreeMap<MapId, Vec<Vec<Cell>>>,
    drone_rows: Vec<String>,
    log_messages: VecDeque<String>,
    max_log_lines: usize,
}

impl TerminalDashboard {
    pub fn new() -> Self {
        Self {
            maps: BTreeMap::new(),
            drone_rows: Vec::new(),
            log_messages: VecDeque::new(),
            max_log_lines: 8,
        }
    }

    fn add_log(&mut self, message: String) {
        self.log_messages.push_back(message);
        if self.log_messages.len() > self.max_log_lines {
            self.log_messages.pop_front();
        }
    }

    fn draw(&self, tick: u64) -> io::Result<()> {
        let mut stdout = stdout();
        stdout.execute(Clear(ClearType::All))?;
        stdout.execute(MoveTo(0, 0))?;
        stdout.execute(SetForegroundColor(Color::Cyan))?;
        stdout.execute(Print(format!("=== Overlord | tick {tick} ===\n")))?;

        for (id, rows) in &self.maps {
            stdout.execute(SetForegroundColor(Color::White))?;
            stdout.execute(Print(format!("\nMap {id}\n")))?;
            for row in rows {
                for cell in row {
                    stdout.execute(SetForegroundColor(cell.color()))?;
                    stdout.execute(Print(cell.glyph()))?;
                }
                stdout.execute(Print("\n"))?;
            }
        }

        stdout.execute(SetForegroundColor(Color::White))?;
        stdout.execute(Print("\n ID Kind  State      HP  Load   Map\n"))?;
        for row in &self.drone_rows {
            stdout.execute(Print(format!("{row}\n")))?;
        }

        stdout.execute(SetForegroundColor(Color::Yellow))?;
        stdout.execute(Print("\nOrders\n"))?;
        for message in &self.log_messages {
            stdout.execute(Print(format!("  {message}\n")))?;
        }
        stdout.execute(ResetColor)?;
        stdout.flush()
    }
}

impl Default for TerminalDashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard for TerminalDashboard {
    fn create_map_gui(&mut self, map: &Map) {
        self.maps.insert(map.id(), map_cells(map));
    }

    fn update_maps(&mut self, maps: &BTreeMap<MapId, Map>) {
        for (id, map) in maps {
            self.maps.insert(*id, map_cells(map));
        }
    }

    fn update_drone_table(&mut self, drones: &BTreeMap<DroneId, Drone>) {
        self.drone_rows = drones
            .values()
            .map(|drone| {
                let map = drone.map().map_or_else(|| "-".to_string(), |map| map.to_string());
                format!(
                    "{:>3} {:<5} {:<9} {:>4} {:>2}/{:<3} {}",
                    drone.id().to_string(),
                    drone.kind(),
                    drone.state(),
                    drone.health(),
                    drone.capacity(),
                    drone.stats().capacity,
                    map
                )
            })
            .collect();
    }

    fn insert_action(&mut self, action: &Action, tick: u64) {
        if *action != Action::Idle {
            self.add_log(format!("[{tick:>4}] {action}"));
        }
        if let Err(err) = self.draw(tick) {
            warn!(error = %err, "dashboard redraw failed");
        }
    }
}
