//! Per-dimension bounds of one rank's slice of a value layer.

use halo_core::ConfigError;

/// Derived bounds for one dimension of a rank's local array.
///
/// All coordinates are global cell coordinates. The local array for this
/// dimension is `left_buffer + local_width + right_buffer` cells wide and
/// starts at `simplified_min`. Halos are allocated on both sides even at a
/// non-periodic edge of the domain; there they are never refreshed.
///
/// The matching bounds extend the local bounds by the buffer only on sides
/// where a neighbor (not a periodic self-wrap across the domain edge) lies.
/// A coordinate outside them belongs to the far side of a periodic
/// boundary and is remapped by [`transform`](Self::transform).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionDatum {
    index: usize,
    global_min: i32,
    global_max: i32,
    local_min: i32,
    local_max: i32,
    simplified_min: i32,
    simplified_max: i32,
    matching_min: i32,
    matching_max: i32,
    left_buffer: usize,
    right_buffer: usize,
    local_width: usize,
    width: usize,
    at_left: bool,
    at_right: bool,
    periodic: bool,
}

impl DimensionDatum {
    /// Derive the bounds of dimension `index`.
    ///
    /// `global` and `local` are `(origin, extent)` pairs. Returns
    /// `Err(ConfigError::BufferTooLarge)` if `buffer` exceeds the local
    /// width, since neighbor slabs would then overlap.
    pub fn new(
        index: usize,
        global: (i32, i32),
        local: (i32, i32),
        buffer: usize,
        periodic: bool,
    ) -> Result<Self, ConfigError> {
        let local_width = usize::try_from(local.1).map_err(|_| ConfigError::NegativeExtent {
            dim: index,
            extent: local.1.to_string(),
        })?;
        if buffer > local_width {
            return Err(ConfigError::BufferTooLarge {
                dim: index,
                buffer,
                local_width: local_width.to_string(),
            });
        }
        let b = buffer as i32;
        let global_min = global.0;
        let global_max = global.0 + global.1;
        let local_min = local.0;
        let local_max = local.0 + local.1;
        let at_left = local_min == global_min;
        let at_right = local_max == global_max;
        let continues_left = !at_left || periodic;
        let continues_right = !at_right || periodic;
        let matching_min = if continues_left && !at_left {
            local_min - b
        } else {
            local_min
        };
        let matching_max = if continues_right && !at_right {
            local_max + b
        } else {
            local_max
        };
        Ok(Self {
            index,
            global_min,
            global_max,
            local_min,
            local_max,
            simplified_min: local_min - b,
            simplified_max: local_max + b,
            matching_min,
            matching_max,
            left_buffer: buffer,
            right_buffer: buffer,
            local_width,
            width: buffer + local_width + buffer,
            at_left,
            at_right,
            periodic,
        })
    }

    /// Dimension index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Global lower bound (inclusive).
    pub fn global_min(&self) -> i32 {
        self.global_min
    }

    /// Global upper bound (exclusive).
    pub fn global_max(&self) -> i32 {
        self.global_max
    }

    /// Global width.
    pub fn global_width(&self) -> usize {
        (self.global_max - self.global_min) as usize
    }

    /// Owned lower bound (inclusive).
    pub fn local_min(&self) -> i32 {
        self.local_min
    }

    /// Owned upper bound (exclusive).
    pub fn local_max(&self) -> i32 {
        self.local_max
    }

    /// Owned width.
    pub fn local_width(&self) -> usize {
        self.local_width
    }

    /// First coordinate of the local array, halo included.
    pub fn simplified_min(&self) -> i32 {
        self.simplified_min
    }

    /// One past the last coordinate of the local array, halo included.
    pub fn simplified_max(&self) -> i32 {
        self.simplified_max
    }

    /// Lower matching bound.
    pub fn matching_min(&self) -> i32 {
        self.matching_min
    }

    /// Upper matching bound.
    pub fn matching_max(&self) -> i32 {
        self.matching_max
    }

    /// Halo depth on the low side.
    pub fn left_buffer(&self) -> usize {
        self.left_buffer
    }

    /// Halo depth on the high side.
    pub fn right_buffer(&self) -> usize {
        self.right_buffer
    }

    /// Width of the local array, halo included.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the owned range starts at the global lower bound.
    pub fn at_left_bound(&self) -> bool {
        self.at_left
    }

    /// Whether the owned range ends at the global upper bound.
    pub fn at_right_bound(&self) -> bool {
        self.at_right
    }

    /// Whether the space continues below the owned range.
    pub fn space_continues_left(&self) -> bool {
        !self.at_left || self.periodic
    }

    /// Whether the space continues above the owned range.
    pub fn space_continues_right(&self) -> bool {
        !self.at_right || self.periodic
    }

    /// Cells exchanged in this dimension for a direction component `rel`.
    pub fn send_receive_size(&self, rel: i32) -> usize {
        match rel.signum() {
            -1 => self.left_buffer,
            1 => self.right_buffer,
            _ => self.local_width,
        }
    }

    /// Array index where the outgoing slab for `rel` starts.
    pub fn send_offset(&self, rel: i32) -> usize {
        if rel <= 0 {
            self.left_buffer
        } else {
            self.width - 2 * self.right_buffer
        }
    }

    /// Array index where the incoming slab for `rel` lands.
    pub fn receive_offset(&self, rel: i32) -> usize {
        match rel.signum() {
            -1 => 0,
            0 => self.left_buffer,
            _ => self.width - self.right_buffer,
        }
    }

    /// Remap a global coordinate across a periodic boundary.
    ///
    /// In a periodic dimension the coordinate is first reduced into the
    /// global range; one that then falls below the matching range is taken
    /// from the far side of the upper boundary, and vice versa. Bounded
    /// dimensions pass coordinates through unchanged. The result is wide
    /// so that remapping an extreme coordinate cannot overflow.
    pub fn transform(&self, coord: i32) -> i64 {
        let coord = i64::from(coord);
        if !self.periodic {
            return coord;
        }
        let (gmin, gmax) = (i64::from(self.global_min), i64::from(self.global_max));
        let span = gmax - gmin;
        let c = if span > 0 {
            gmin + (coord - gmin).rem_euclid(span)
        } else {
            coord
        };
        if c < i64::from(self.matching_min) {
            i64::from(self.matching_max) + (c - gmin)
        } else if c > i64::from(self.matching_max) {
            i64::from(self.matching_min) - (gmax - c)
        } else {
            c
        }
    }

    /// Array index of a global coordinate, or `None` if it is not addressable.
    pub fn indexed_coord(&self, coord: i32) -> Option<usize> {
        let idx = self.transform(coord) - i64::from(self.simplified_min);
        usize::try_from(idx).ok().filter(|&i| i < self.width)
    }

    /// Whether `coord` lies in the owned range `[local_min, local_max)`.
    pub fn in_local_bounds(&self, coord: i32) -> bool {
        coord >= self.local_min && coord < self.local_max
    }

    /// Whether array index `idx` is an owned cell rather than halo.
    pub fn is_local_index(&self, idx: usize) -> bool {
        idx >= self.left_buffer && idx < self.left_buffer + self.local_width
    }
}
