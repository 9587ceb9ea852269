//! QR module grid and the per-render availability mask
//!
//! The grid is produced by an external encoder: a square matrix of dark and
//! light modules plus a structural classification of every module. Both are
//! stored row-major and addressed as `(x, y)`, column first.

use crate::error::GridError;

/// Structural role of a module
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Center module of a finder pattern
    FinderCenter,
    /// Any other module of a finder pattern or its separator
    FinderBorder,
    #[default]
    Data,
    /// Timing, alignment and format modules
    Reserved,
}

impl ModuleKind {
    pub fn is_finder(&self) -> bool {
        matches!(self, ModuleKind::FinderCenter | ModuleKind::FinderBorder)
    }
}

/// Square matrix of QR modules
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleGrid {
    size: usize,
    dark: Vec<bool>,
    kinds: Vec<ModuleKind>,
}

impl ModuleGrid {
    /// Smallest QR symbol (version 1)
    pub const MIN_SIZE: usize = 21;

    /// Build from row-major matrices, `dark[y][x]` and `kinds[y][x]`
    ///
    /// Only the shape is checked here; [`ModuleGrid::validate`] checks that
    /// the size is one a QR encoder can produce.
    pub fn new(dark: Vec<Vec<bool>>, kinds: Vec<Vec<ModuleKind>>) -> Result<Self, GridError> {
        let size = dark.len();
        if size == 0 {
            return Err(GridError::Empty);
        }
        check_square(&dark, size)?;
        if kinds.len() != size {
            return Err(GridError::KindMismatch {
                size,
                kinds: kinds.len(),
            });
        }
        check_square(&kinds, size).map_err(|_| GridError::KindMismatch {
            size,
            kinds: kinds.len(),
        })?;

        Ok(Self {
            size,
            dark: dark.into_iter().flatten().collect(),
            kinds: kinds.into_iter().flatten().collect(),
        })
    }

    /// Build from row strings; `#` and `1` are dark, anything else is light
    ///
    /// Finder patterns are classified with [`ModuleGrid::with_finder_patterns`].
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        let dark = rows
            .iter()
            .map(|row| row.as_ref().chars().map(|c| c == '#' || c == '1').collect())
            .collect();
        Self::with_finder_patterns(dark)
    }

    /// Classify the three finder patterns the way QR encoders place them
    ///
    /// The module at offset (3, 3) of each 7×7 pattern is its center; every
    /// other module of the 9×9 area around the center (pattern plus
    /// separator) is a border module. Everything else is data.
    pub fn with_finder_patterns(dark: Vec<Vec<bool>>) -> Result<Self, GridError> {
        let size = dark.len();
        if size == 0 {
            return Err(GridError::Empty);
        }
        check_square(&dark, size)?;

        let mut kinds = vec![vec![ModuleKind::Data; size]; size];
        if size >= 7 {
            for (cx, cy) in finder_centers(size) {
                for y in cy.saturating_sub(4)..(cy + 5).min(size) {
                    for x in cx.saturating_sub(4)..(cx + 5).min(size) {
                        kinds[y][x] = ModuleKind::FinderBorder;
                    }
                }
                kinds[cy][cx] = ModuleKind::FinderCenter;
            }
        }

        Self::new(dark, kinds)
    }

    /// Check that the grid is a plausible QR symbol: odd and at least 21
    pub fn validate(&self) -> Result<(), GridError> {
        if self.size < Self::MIN_SIZE {
            return Err(GridError::TooSmall(self.size));
        }
        if self.size % 2 == 0 {
            return Err(GridError::EvenSize(self.size));
        }
        Ok(())
    }

    /// Modules per side
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    /// Whether the module is dark; out-of-range modules are light
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.dark[y * self.size + x]
    }

    /// Kind of the module; out-of-range modules report `Data`
    pub fn kind(&self, x: usize, y: usize) -> ModuleKind {
        if x < self.size && y < self.size {
            self.kinds[y * self.size + x]
        } else {
            ModuleKind::Data
        }
    }

    /// Number of dark modules
    pub fn dark_count(&self) -> usize {
        self.dark.iter().filter(|d| **d).count()
    }

    /// Whether any of the eight neighbours is a finder center
    pub fn touches_finder_center(&self, x: usize, y: usize) -> bool {
        (-1isize..=1).any(|dy| {
            (-1isize..=1).any(|dx| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                (dx, dy) != (0, 0)
                    && self.in_bounds(nx, ny)
                    && self.kind(nx as usize, ny as usize) == ModuleKind::FinderCenter
            })
        })
    }
}

/// Centers of the top-left, top-right and bottom-left finder patterns
pub fn finder_centers(size: usize) -> [(usize, usize); 3] {
    let far = size.saturating_sub(4);
    [(3, 3), (far, 3), (3, far)]
}

fn check_square<T>(rows: &[Vec<T>], size: usize) -> Result<(), GridError> {
    match rows.iter().enumerate().find(|(_, row)| row.len() != size) {
        Some((row, r)) => Err(GridError::NotSquare {
            row,
            len: r.len(),
            expected: size,
        }),
        None => Ok(()),
    }
}

/// Which modules are still free to be claimed by a shape
///
/// Every module starts available and is consumed at most once per render.
#[derive(Clone, Debug)]
pub struct AvailabilityMask {
    size: usize,
    available: Vec<bool>,
    consumed: usize,
}

impl AvailabilityMask {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            available: vec![true; size * size],
            consumed: 0,
        }
    }

    pub fn for_grid(grid: &ModuleGrid) -> Self {
        Self::new(grid.size())
    }

    /// Out-of-range modules are never available
    pub fn is_available(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.available[y * self.size + x]
    }

    /// Mark a module as claimed
    pub fn consume(&mut self, x: usize, y: usize) {
        if !self.is_available(x, y) {
            debug_assert!(false, "module ({x}, {y}) consumed twice or out of range");
            tracing::warn!(x, y, "module consumed twice or out of range");
            return;
        }
        self.available[y * self.size + x] = false;
        self.consumed += 1;
    }

    /// Number of modules consumed so far
    pub fn consumed_count(&self) -> usize {
        self.consumed
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Random modules with real finder patterns stamped in
#[cfg(test)]
pub(crate) fn sample_symbol(size: usize, seed: u64) -> ModuleGrid {
    use crate::random::{RandomSource, SeededRandom};

    let mut rng = SeededRandom::new(seed);
    let mut dark: Vec<Vec<bool>> = (0..size)
        .map(|_| (0..size).map(|_| rng.next_u32() % 2 == 0).collect())
        .collect();
    for (cx, cy) in finder_centers(size) {
        for y in cy.saturating_sub(4)..(cy + 5).min(size) {
            for x in cx.saturating_sub(4)..(cx + 5).min(size) {
                let ring = x.abs_diff(cx).max(y.abs_diff(cy));
                dark[y][x] = ring <= 1 || ring == 3;
            }
        }
    }
    ModuleGrid::with_finder_patterns(dark).unwrap()
}
