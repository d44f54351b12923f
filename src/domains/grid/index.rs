use super::cache::{self, CacheHeader, CellRecord};
use super::cell::{Cell, CellCoord};
use super::ports::GridCacheStore;
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{Point, Rect, Size};
use crate::domains::obstacles::ObstacleLayout;
use crate::domains::DomainLogger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the grid index uses its persisted cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Load and validate; rebuild and store on mismatch.
    #[default]
    Read,
    /// Always rebuild, then store.
    Write,
    /// Always rebuild, never touch storage.
    Off,
}

/// Uniform partition of the domain into `cells_x * cells_y` cells.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cells_x: usize,
    cells_y: usize,
    cell_size: Size,
    cells: Vec<Cell>,
}

impl GridIndex {
    pub fn cell_size_for(domain: Size, cells_x: usize, cells_y: usize) -> DomainResult<Size> {
        if cells_x == 0 || cells_y == 0 {
            return Err(DomainError::InvalidGeometry {
                reason: format!("Grid needs at least one cell per axis, got {}x{}", cells_x, cells_y),
            });
        }
        Size::new(domain.width / cells_x as f64, domain.height / cells_y as f64)
    }

    fn empty(layout: &ObstacleLayout, cells_x: usize, cells_y: usize) -> DomainResult<Self> {
        let cell_size = Self::cell_size_for(layout.domain(), cells_x, cells_y)?;
        let mut cells = Vec::with_capacity(cells_x * cells_y);
        for x in 0..cells_x {
            for y in 0..cells_y {
                let begin = Point::new(cell_size.width * x as f64, cell_size.height * y as f64);
                cells.push(Cell::new(CellCoord(x, y), Rect::new(begin, cell_size)));
            }
        }
        Ok(Self {
            cells_x,
            cells_y,
            cell_size,
            cells,
        })
    }

    /// Builds every cell and computes its relevant obstacles.
    pub fn build(layout: &ObstacleLayout, cells_x: usize, cells_y: usize, logger: &dyn DomainLogger) -> DomainResult<Self> {
        logger.info("Started preprocessing cells");
        let mut index = Self::empty(layout, cells_x, cells_y)?;
        for cell in &mut index.cells {
            cell.obtain_relevant_obstacles(layout.obstacles());
        }
        logger.info("Finished preprocessing cells");
        Ok(index)
    }

    /// Loads the index from `store` according to `mode`, rebuilding and
    /// re-persisting whenever the stored cells do not match `layout`.
    pub fn load_or_build(
        layout: &ObstacleLayout,
        cells_x: usize,
        cells_y: usize,
        mode: CacheMode,
        store: &dyn GridCacheStore,
        cache_name: &str,
        logger: &dyn DomainLogger,
    ) -> DomainResult<Self> {
        match mode {
            CacheMode::Off => Self::build(layout, cells_x, cells_y, logger),
            CacheMode::Write => {
                let index = Self::build(layout, cells_x, cells_y, logger)?;
                store.save_cells(cache_name, &index.encode(layout)?)?;
                Ok(index)
            }
            CacheMode::Read => {
                logger.info("Loading cell objects from cache");
                match store.load_cells(cache_name) {
                    Ok(Some(bytes)) => match Self::decode_validated(&bytes, layout, cells_x, cells_y) {
                        Ok(Some(index)) => return Ok(index),
                        Ok(None) => logger.warn("Cells cache does not correspond to this scene"),
                        Err(e) => logger.warn(&format!("Cells cache is unreadable: {}", e)),
                    },
                    Ok(None) => logger.info("No cells cache stored yet"),
                    Err(e) => logger.warn(&format!("Failed to read cells cache: {}", e)),
                }
                logger.info("Creating new cells and storing those");
                let index = Self::build(layout, cells_x, cells_y, logger)?;
                match index.encode(layout) {
                    Ok(bytes) => {
                        if let Err(e) = store.save_cells(cache_name, &bytes) {
                            logger.error(&format!("Failed to store cells cache: {}", e));
                        }
                    }
                    Err(e) => logger.error(&format!("Failed to encode cells cache: {}", e)),
                }
                Ok(index)
            }
        }
    }

    pub fn cells_x(&self) -> usize {
        self.cells_x
    }

    pub fn cells_y(&self) -> usize {
        self.cells_y
    }

    pub fn cell_size(&self) -> Size {
        self.cell_size
    }

    fn slot(&self, coord: CellCoord) -> Option<usize> {
        (coord.0 < self.cells_x && coord.1 < self.cells_y).then(|| coord.0 * self.cells_y + coord.1)
    }

    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.slot(coord).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        self.slot(coord).map(move |i| &mut self.cells[i])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Floor-divided cell coordinate, which may fall outside the grid.
    pub fn floor_coord(&self, point: &Point) -> (i64, i64) {
        (
            (point.x / self.cell_size.width).floor() as i64,
            (point.y / self.cell_size.height).floor() as i64,
        )
    }

    pub fn coord_of(&self, point: &Point) -> Option<CellCoord> {
        let (x, y) = self.floor_coord(point);
        if x < 0 || y < 0 {
            return None;
        }
        let coord = CellCoord(x as usize, y as usize);
        self.slot(coord).map(|_| coord)
    }

    /// Like [`coord_of`](Self::coord_of) but pinned to the nearest edge cell.
    pub fn clamped_coord_of(&self, point: &Point) -> CellCoord {
        let (x, y) = self.floor_coord(point);
        CellCoord(
            x.clamp(0, self.cells_x as i64 - 1) as usize,
            y.clamp(0, self.cells_y as i64 - 1) as usize,
        )
    }

    pub fn cell_at(&self, point: &Point) -> Option<&Cell> {
        self.coord_of(point).and_then(|coord| self.cell(coord))
    }

    pub fn header(&self, layout: &ObstacleLayout) -> CacheHeader {
        CacheHeader {
            cells_x: self.cells_x as u32,
            cells_y: self.cells_y as u32,
            cell_width: self.cell_size.width,
            cell_height: self.cell_size.height,
            layout_digest: cache::layout_digest(&layout.names()),
        }
    }

    pub fn to_records(&self) -> Vec<CellRecord> {
        self.cells
            .iter()
            .map(|cell| CellRecord {
                coord: cell.coord(),
                begin: cell.bounds().begin,
                size: self.cell_size,
                obstacle_names: cell.obstacle_names().iter().cloned().collect(),
            })
            .collect()
    }

    pub fn encode(&self, layout: &ObstacleLayout) -> DomainResult<Vec<u8>> {
        cache::encode(&self.header(layout), &self.to_records())
    }

    /// Decodes a persisted index and checks it against the current layout.
    ///
    /// Returns `Ok(None)` when the blob is well-formed but describes another
    /// grid or obstacle set.
    pub fn decode_validated(
        bytes: &[u8],
        layout: &ObstacleLayout,
        cells_x: usize,
        cells_y: usize,
    ) -> DomainResult<Option<Self>> {
        let cell_size = Self::cell_size_for(layout.domain(), cells_x, cells_y)?;
        let names = layout.names();
        let (header, payload) = cache::decode_header(bytes)?;
        if header.cells_x as usize != cells_x
            || header.cells_y as usize != cells_y
            || header.layout_digest != cache::layout_digest(&names)
        {
            return Ok(None);
        }
        let records: Vec<CellRecord> = bincode::deserialize(payload)?;
        if !Self::records_match(&records, &names, cell_size, cells_x, cells_y) {
            return Ok(None);
        }

        let mut index = Self::empty(layout, cells_x, cells_y)?;
        let mut filled = vec![false; cells_x * cells_y];
        for record in records {
            let Some(slot) = index.slot(record.coord) else {
                return Ok(None);
            };
            if filled[slot] || !index.cells[slot].restore_obstacles(record.obstacle_names, layout) {
                return Ok(None);
            }
            filled[slot] = true;
        }
        Ok(Some(index))
    }

    /// Poll one cell for coordinate range and size, then compare the union of
    /// referenced obstacle names with the current set.
    fn records_match(
        records: &[CellRecord],
        names: &BTreeSet<String>,
        cell_size: Size,
        cells_x: usize,
        cells_y: usize,
    ) -> bool {
        let Some(first) = records.first() else {
            return false;
        };
        if records.len() != cells_x * cells_y {
            return false;
        }
        let correct_index = first.coord.0 < cells_x && first.coord.1 < cells_y;
        let correct_size = first.size == cell_size;
        let stored: BTreeSet<&String> = records.iter().flat_map(|r| r.obstacle_names.iter()).collect();
        let correct_obstacles = stored == names.iter().collect::<BTreeSet<_>>();
        correct_index && correct_size && correct_obstacles
    }
}
