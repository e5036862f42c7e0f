//! The farm grid: fixed-size, row-major cells with single selection.

use bevy::prelude::*;
use std::collections::HashSet;

use super::growth::{self, GrowthReading};
use crate::data::CropCatalog;
use crate::shared::*;

/// A crop living in a cell. Growth is derived from `planted_at`, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantedCrop {
    pub crop_id: CropId,
    pub planted_at: Timestamp,
}

impl PlantedCrop {
    pub fn reading(
        &self,
        catalog: &CropCatalog,
        now: Timestamp,
    ) -> Result<GrowthReading, FarmError> {
        let def = catalog.get(self.crop_id.as_str())?;
        Ok(growth::phase(self.planted_at, def.growth_time_secs, now))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pos: GridPos,
    kind: CellKind,
    crop: Option<PlantedCrop>,
}

impl Cell {
    fn new(pos: GridPos, kind: CellKind) -> Self {
        Self {
            pos,
            kind,
            crop: None,
        }
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn crop(&self) -> Option<&PlantedCrop> {
        self.crop.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.crop.is_some()
    }

    /// Farm and empty.
    pub fn is_plantable(&self) -> bool {
        self.kind == CellKind::Farm && self.crop.is_none()
    }

    /// A crop whose id vanished from the catalog reads as still growing.
    pub fn state(&self, catalog: &CropCatalog, now: Timestamp) -> CellState {
        match &self.crop {
            None => CellState::Empty,
            Some(crop) => match crop.reading(catalog, now) {
                Ok(reading) if reading.is_ready() => CellState::ReadyToHarvest,
                _ => CellState::Growing,
            },
        }
    }
}

/// Result of a `select` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// The cell was already selected.
    Unchanged,
    Changed {
        previous: Option<GridPos>,
        current: GridPos,
    },
}

#[derive(Resource, Debug, Clone)]
pub struct FarmGrid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    selected: Option<GridPos>,
}

impl FarmGrid {
    /// All Ground except a centered `farm_columns` x `farm_rows` rectangle of Farm.
    pub fn seeded(width: u32, height: u32, farm_columns: u32, farm_rows: u32) -> Self {
        let mut grid = Self::blank(width, height);
        let columns = centered_span(width, farm_columns);
        let rows = centered_span(height, farm_rows);
        for cell in &mut grid.cells {
            if columns.contains(&cell.pos.x) && rows.contains(&cell.pos.y) {
                cell.kind = CellKind::Farm;
            }
        }
        grid
    }

    /// Grid with the default 2x3 farmland rectangle.
    pub fn new(width: u32, height: u32) -> Self {
        Self::seeded(width, height, 2, 3)
    }

    /// Every cell Ground and empty.
    pub fn blank(width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(Cell::new(GridPos::new(x, y), CellKind::Ground));
            }
        }
        Self {
            width,
            height,
            cells,
            selected: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: GridPos) -> Result<usize, FarmError> {
        if !self.contains(pos) {
            return Err(FarmError::OutOfRange {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn get(&self, pos: GridPos) -> Result<&Cell, FarmError> {
        let index = self.index(pos)?;
        Ok(&self.cells[index])
    }

    fn get_mut(&mut self, pos: GridPos) -> Result<&mut Cell, FarmError> {
        let index = self.index(pos)?;
        Ok(&mut self.cells[index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn state(
        &self,
        pos: GridPos,
        catalog: &CropCatalog,
        now: Timestamp,
    ) -> Result<CellState, FarmError> {
        Ok(self.get(pos)?.state(catalog, now))
    }

    // ── Selection ────────────────────────────────────────────────────────

    pub fn selected(&self) -> Option<GridPos> {
        self.selected
    }

    pub fn select(&mut self, pos: GridPos) -> Result<SelectionChange, FarmError> {
        self.index(pos)?;
        if self.selected == Some(pos) {
            return Ok(SelectionChange::Unchanged);
        }
        let previous = self.selected.replace(pos);
        Ok(SelectionChange::Changed {
            previous,
            current: pos,
        })
    }

    /// Returns the cell that was selected, if any.
    pub fn clear_selection(&mut self) -> Option<GridPos> {
        self.selected.take()
    }

    // ── Crops ────────────────────────────────────────────────────────────

    pub fn check_plantable(&self, pos: GridPos) -> Result<(), FarmError> {
        let cell = self.get(pos)?;
        if cell.is_plantable() {
            Ok(())
        } else {
            Err(FarmError::InvalidPlanting {
                cell: pos,
                kind: cell.kind,
                occupied: cell.is_occupied(),
            })
        }
    }

    pub fn plant(
        &mut self,
        pos: GridPos,
        crop_id: CropId,
        now: Timestamp,
    ) -> Result<&PlantedCrop, FarmError> {
        self.check_plantable(pos)?;
        let cell = self.get_mut(pos)?;
        Ok(cell.crop.insert(PlantedCrop {
            crop_id,
            planted_at: now,
        }))
    }

    /// Removes a mature crop and hands back its id. Crediting is the caller's job.
    pub fn harvest(
        &mut self,
        pos: GridPos,
        catalog: &CropCatalog,
        now: Timestamp,
    ) -> Result<CropId, FarmError> {
        let cell = self.get_mut(pos)?;
        let ready = cell
            .crop
            .as_ref()
            .map(|crop| crop.reading(catalog, now))
            .transpose()?
            .is_some_and(|reading| reading.is_ready());
        if !ready {
            return Err(FarmError::NotReady { cell: pos });
        }
        cell.crop
            .take()
            .map(|crop| crop.crop_id)
            .ok_or(FarmError::NotReady { cell: pos })
    }

    /// Removes whatever crop the cell holds, in any phase.
    pub fn clear_crop(&mut self, pos: GridPos) -> Result<Option<PlantedCrop>, FarmError> {
        Ok(self.get_mut(pos)?.crop.take())
    }

    /// Returns the previous kind, or `None` when the cell already had `kind`.
    ///
    /// Water and Ground convert freely. Farm is only reachable from Ground,
    /// and only an empty Farm cell may change kind.
    pub fn switch_kind(
        &mut self,
        pos: GridPos,
        kind: CellKind,
    ) -> Result<Option<CellKind>, FarmError> {
        let cell = self.get_mut(pos)?;
        let from = cell.kind;
        if from == kind {
            return Ok(None);
        }
        match (from, kind) {
            (CellKind::Farm, _) if cell.crop.is_some() => {
                return Err(FarmError::CellOccupied { cell: pos })
            }
            (CellKind::Water, CellKind::Farm) => {
                return Err(FarmError::InvalidTransition {
                    cell: pos,
                    from,
                    to: kind,
                })
            }
            _ => {}
        }
        cell.kind = kind;
        Ok(Some(from))
    }

    pub fn planted(&self) -> impl Iterator<Item = (GridPos, &PlantedCrop)> {
        self.cells
            .iter()
            .filter_map(|cell| cell.crop.as_ref().map(|crop| (cell.pos, crop)))
    }

    // ── Snapshot ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.cells
            .iter()
            .map(|cell| CellSnapshot {
                x: cell.pos.x,
                y: cell.pos.y,
                kind: cell.kind,
                crop_id: cell.crop.as_ref().map(|c| c.crop_id.clone()),
                planted_at: cell.crop.as_ref().map(|c| c.planted_at),
            })
            .collect()
    }

    /// Replaces every cell from `cells`. Cells missing from the list become
    /// empty Ground. Any bad entry rejects the whole list and leaves the grid
    /// untouched. Selection is cleared on success.
    pub fn restore(
        &mut self,
        cells: &[CellSnapshot],
        catalog: &CropCatalog,
    ) -> Result<(), FarmError> {
        let mut next = Self::blank(self.width, self.height);
        let mut seen = HashSet::with_capacity(cells.len());

        for entry in cells {
            let pos = GridPos::new(entry.x, entry.y);
            if !seen.insert(pos) {
                return Err(FarmError::InvalidSnapshot(format!("duplicate cell {pos}")));
            }
            let cell = next
                .get_mut(pos)
                .map_err(|err| FarmError::InvalidSnapshot(err.to_string()))?;
            cell.kind = entry.kind;

            match (&entry.crop_id, entry.planted_at) {
                (None, None) => {}
                (Some(crop_id), Some(planted_at)) => {
                    if entry.kind != CellKind::Farm {
                        return Err(FarmError::InvalidSnapshot(format!(
                            "crop '{crop_id}' on non-farm cell {pos}"
                        )));
                    }
                    let crop_id = catalog
                        .resolve(crop_id.as_str())
                        .map_err(|err| FarmError::InvalidSnapshot(err.to_string()))?;
                    cell.crop = Some(PlantedCrop {
                        crop_id,
                        planted_at,
                    });
                }
                (Some(crop_id), None) => {
                    return Err(FarmError::InvalidSnapshot(format!(
                        "crop '{crop_id}' at {pos} has no planting time"
                    )));
                }
                (None, Some(_)) => {
                    return Err(FarmError::InvalidSnapshot(format!(
                        "planting time without crop at {pos}"
                    )));
                }
            }
        }

        *self = next;
        Ok(())
    }
}

/// The `len` indices centered in `0..total`, e.g. 4..6 for (10, 2).
fn centered_span(total: u32, len: u32) -> std::ops::Range<i32> {
    let len = len.min(total) as i32;
    let start = total as i32 / 2 - len / 2;
    start..start + len
}
