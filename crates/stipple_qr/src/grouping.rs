//! Module grouping
//!
//! A single row-major pass over the grid decides which shape covers every
//! dark module. Finder patterns are claimed whole by their center module;
//! data modules are merged into blocks, runs or asset tiles according to the
//! dot style. Every emitted group consumes exactly the cells it covers, and a
//! module is never consumed twice.

use smallvec::{smallvec, SmallVec};

use crate::assets::AssetGate;
use crate::grid::{AvailabilityMask, ModuleGrid, ModuleKind};
use crate::random::RandomSource;
use crate::style::{DotStyle, EyeStyle, FragmentGrouping, LineDirection, TileSize};

/// Which end of a run a cap sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunEnd {
    Start,
    End,
}

/// What a placement draws
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// A block of data modules: a square, or the dot fragment
    Block,
    /// Filled 3×3 center of a finder pattern
    FinderCenter,
    /// Stroked ring around a finder center
    FinderRing,
    /// Eye asset or fragment over the full 7×7 pattern
    EyeGlyph,
    LineCap {
        end: RunEnd,
        direction: LineDirection,
    },
    /// Interior of a run of at least three modules
    LineBody {
        cells: usize,
        direction: LineDirection,
    },
    /// A run of a single module
    LineDot,
    /// A named asset tile
    Asset(String),
}

/// Where and at what size a shape is drawn, in modules
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub kind: ShapeKind,
}

impl Placement {
    pub fn new(x: i32, y: i32, width: u32, height: u32, kind: ShapeKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind,
        }
    }

    fn module(x: usize, y: usize, kind: ShapeKind) -> Self {
        Self::new(x as i32, y as i32, 1, 1, kind)
    }

    /// Center of the target block
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Cells consumed by one grouping decision and the shapes drawn for them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleGroup {
    pub cells: SmallVec<[(usize, usize); 9]>,
    pub placements: SmallVec<[Placement; 3]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FinderMode {
    /// Center block plus ring, border modules left to the ring
    Squares,
    /// Center block, border modules drawn one by one
    Modules,
    /// One glyph over the whole pattern
    Glyph,
}

#[derive(Clone, Copy, Debug)]
enum DotPolicy<'s> {
    Disabled,
    Merge { max: usize },
    Runs { direction: LineDirection },
    Tiles(&'s [TileSize]),
}

/// Groups dark modules into placements
#[derive(Clone, Copy, Debug)]
pub struct GroupingEngine<'s> {
    policy: DotPolicy<'s>,
    finder: FinderMode,
}

impl<'s> GroupingEngine<'s> {
    pub fn new(dots: &'s DotStyle, eye: &EyeStyle) -> Self {
        let policy = match dots {
            DotStyle::Square { max_group } => DotPolicy::Merge { max: *max_group },
            DotStyle::Fragment { grouping, .. } => match grouping {
                FragmentGrouping::None => DotPolicy::Disabled,
                FragmentGrouping::Group(n) => DotPolicy::Merge { max: *n },
            },
            DotStyle::Lines { direction, .. } => DotPolicy::Runs {
                direction: *direction,
            },
            DotStyle::Tiles(sizes) => DotPolicy::Tiles(sizes),
        };
        let finder = match eye {
            EyeStyle::Squares => FinderMode::Squares,
            EyeStyle::Modules => FinderMode::Modules,
            EyeStyle::Asset { .. } | EyeStyle::Fragment { .. } => FinderMode::Glyph,
        };
        Self { policy, finder }
    }

    /// Whether a dark module is drawn by some group
    ///
    /// Finder border modules away from the center are left undrawn unless the
    /// eye style draws them.
    pub fn is_in_scope(&self, grid: &ModuleGrid, x: usize, y: usize) -> bool {
        match grid.kind(x, y) {
            ModuleKind::FinderBorder => {
                grid.touches_finder_center(x, y) || self.finder == FinderMode::Modules
            }
            _ => true,
        }
    }

    /// Run the scan
    pub fn group(
        &self,
        grid: &ModuleGrid,
        mask: &mut AvailabilityMask,
        random: &mut dyn RandomSource,
        assets: &mut dyn AssetGate,
    ) -> Vec<ModuleGroup> {
        let size = grid.size();
        let mut groups = Vec::new();

        for y in 0..size {
            for x in 0..size {
                if !grid.is_dark(x, y) || !mask.is_available(x, y) {
                    continue;
                }

                let group = match grid.kind(x, y) {
                    ModuleKind::FinderCenter => Some(self.finder_center(grid, mask, x, y)),
                    ModuleKind::FinderBorder => {
                        // Modules next to the center belong to its 3×3 block
                        if grid.touches_finder_center(x, y) || self.finder != FinderMode::Modules
                        {
                            None
                        } else {
                            Some(single(mask, x, y, ShapeKind::Block))
                        }
                    }
                    ModuleKind::Data | ModuleKind::Reserved => {
                        self.data_module(grid, mask, x, y, random, assets)
                    }
                };

                if let Some(group) = group {
                    groups.push(group);
                }
            }
        }

        tracing::debug!(
            groups = groups.len(),
            consumed = mask.consumed_count(),
            "grouped modules"
        );
        groups
    }

    fn finder_center(
        &self,
        grid: &ModuleGrid,
        mask: &mut AvailabilityMask,
        x: usize,
        y: usize,
    ) -> ModuleGroup {
        let mut group = ModuleGroup::default();
        for cy in y.saturating_sub(1)..=y + 1 {
            for cx in x.saturating_sub(1)..=x + 1 {
                if grid.is_dark(cx, cy) && mask.is_available(cx, cy) {
                    mask.consume(cx, cy);
                    group.cells.push((cx, cy));
                }
            }
        }

        let (x, y) = (x as i32, y as i32);
        match self.finder {
            FinderMode::Squares => {
                group
                    .placements
                    .push(Placement::new(x - 1, y - 1, 3, 3, ShapeKind::FinderCenter));
                group
                    .placements
                    .push(Placement::new(x - 3, y - 3, 7, 7, ShapeKind::FinderRing));
            }
            FinderMode::Modules => {
                group
                    .placements
                    .push(Placement::new(x - 1, y - 1, 3, 3, ShapeKind::FinderCenter));
            }
            FinderMode::Glyph => {
                group
                    .placements
                    .push(Placement::new(x - 3, y - 3, 7, 7, ShapeKind::EyeGlyph));
            }
        }
        group
    }

    fn data_module(
        &self,
        grid: &ModuleGrid,
        mask: &mut AvailabilityMask,
        x: usize,
        y: usize,
        random: &mut dyn RandomSource,
        assets: &mut dyn AssetGate,
    ) -> Option<ModuleGroup> {
        match self.policy {
            DotPolicy::Disabled => Some(single(mask, x, y, ShapeKind::Block)),
            DotPolicy::Merge { max } => Some(merge(grid, mask, x, y, max)),
            DotPolicy::Runs { direction } => Some(run(grid, mask, x, y, direction)),
            DotPolicy::Tiles(sizes) => tile(grid, mask, x, y, sizes, random, assets),
        }
    }
}

fn single(mask: &mut AvailabilityMask, x: usize, y: usize, kind: ShapeKind) -> ModuleGroup {
    mask.consume(x, y);
    ModuleGroup {
        cells: smallvec![(x, y)],
        placements: smallvec![Placement::module(x, y, kind)],
    }
}

/// Whether a `w × h` block at `(x, y)` is in bounds, dark, available and of
/// an accepted kind
fn block_fits(
    grid: &ModuleGrid,
    mask: &AvailabilityMask,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    accept: impl Fn(ModuleKind) -> bool,
) -> bool {
    let size = grid.size();
    if x + w > size || y + h > size {
        return false;
    }
    (y..y + h).all(|cy| {
        (x..x + w).all(|cx| {
            grid.is_dark(cx, cy) && mask.is_available(cx, cy) && accept(grid.kind(cx, cy))
        })
    })
}

fn consume_block(
    mask: &mut AvailabilityMask,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    kind: ShapeKind,
) -> ModuleGroup {
    let mut cells = SmallVec::new();
    for cy in y..y + h {
        for cx in x..x + w {
            mask.consume(cx, cy);
            cells.push((cx, cy));
        }
    }
    ModuleGroup {
        cells,
        placements: smallvec![Placement::new(x as i32, y as i32, w as u32, h as u32, kind)],
    }
}

/// Largest square block of pure data modules, down to 2×2, else one module
fn merge(
    grid: &ModuleGrid,
    mask: &mut AvailabilityMask,
    x: usize,
    y: usize,
    max: usize,
) -> ModuleGroup {
    for n in (2..=max).rev() {
        if block_fits(grid, mask, x, y, n, n, |k| k == ModuleKind::Data) {
            return consume_block(mask, x, y, n, n, ShapeKind::Block);
        }
    }
    single(mask, x, y, ShapeKind::Block)
}

fn tile(
    grid: &ModuleGrid,
    mask: &mut AvailabilityMask,
    x: usize,
    y: usize,
    sizes: &[TileSize],
    random: &mut dyn RandomSource,
    assets: &mut dyn AssetGate,
) -> Option<ModuleGroup> {
    let fitting = sizes.iter().find(|t| {
        block_fits(grid, mask, x, y, t.width, t.height, |k| !k.is_finder())
    });

    let Some(tile) = fitting else {
        return Some(single(mask, x, y, ShapeKind::Block));
    };

    let name = random
        .pick(tile.assets.len())
        .and_then(|i| tile.assets.get(i))?;
    if !assets.resolves(name) {
        tracing::warn!(x, y, asset = %name, "skipping module, tile asset did not resolve");
        return None;
    }

    Some(consume_block(
        mask,
        x,
        y,
        tile.width,
        tile.height,
        ShapeKind::Asset(name.clone()),
    ))
}

/// Straight run from `(x, y)` along `direction`, capped at both ends
fn run(
    grid: &ModuleGrid,
    mask: &mut AvailabilityMask,
    x: usize,
    y: usize,
    direction: LineDirection,
) -> ModuleGroup {
    let (dx, dy) = direction.step();
    let mut cells: SmallVec<[(usize, usize); 9]> = smallvec![(x, y)];
    let (mut cx, mut cy) = (x as isize, y as isize);
    loop {
        let (nx, ny) = (cx + dx, cy + dy);
        if !grid.in_bounds(nx, ny) {
            break;
        }
        let (ux, uy) = (nx as usize, ny as usize);
        if !grid.is_dark(ux, uy) || !mask.is_available(ux, uy) || grid.kind(ux, uy).is_finder()
        {
            break;
        }
        cells.push((ux, uy));
        (cx, cy) = (nx, ny);
    }

    for &(cx, cy) in &cells {
        mask.consume(cx, cy);
    }

    let mut placements = SmallVec::new();
    match cells.as_slice() {
        [] => {}
        [only] => placements.push(Placement::module(only.0, only.1, ShapeKind::LineDot)),
        [first, interior @ .., last] => {
            placements.push(Placement::module(
                first.0,
                first.1,
                ShapeKind::LineCap {
                    end: RunEnd::Start,
                    direction,
                },
            ));
            if !interior.is_empty() {
                let min_x = interior.iter().map(|c| c.0).min().unwrap_or(first.0);
                let max_x = interior.iter().map(|c| c.0).max().unwrap_or(first.0);
                let min_y = interior.iter().map(|c| c.1).min().unwrap_or(first.1);
                let max_y = interior.iter().map(|c| c.1).max().unwrap_or(first.1);
                placements.push(Placement::new(
                    min_x as i32,
                    min_y as i32,
                    (max_x - min_x + 1) as u32,
                    (max_y - min_y + 1) as u32,
                    ShapeKind::LineBody {
                        cells: interior.len(),
                        direction,
                    },
                ));
            }
            placements.push(Placement::module(
                last.0,
                last.1,
                ShapeKind::LineCap {
                    end: RunEnd::End,
                    direction,
                },
            ));
        }
    }

    ModuleGroup { cells, placements }
}
