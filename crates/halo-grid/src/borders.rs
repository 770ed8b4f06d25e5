//! What happens to a point that leaves the global box.

use crate::error::GridError;
use halo_core::{Coordinate, GridDimensions, Point};

/// Border handling for placements and moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderPolicy {
    /// Points outside the global box are rejected.
    Strict,
    /// Points are clamped to the nearest position inside the global box.
    Sticky,
    /// Points wrap around, as on a torus.
    Wrap,
}

impl BorderPolicy {
    /// `Wrap` for a periodic mesh, `Strict` otherwise.
    pub fn for_mesh(periodic: bool) -> Self {
        if periodic {
            Self::Wrap
        } else {
            Self::Strict
        }
    }

    /// Bring `pt` inside `global` according to the policy.
    pub fn transform<C: Coordinate>(
        &self,
        pt: &[C],
        global: &GridDimensions<C>,
    ) -> Result<Point<C>, GridError> {
        if pt.len() != global.dimension_count() {
            return Err(GridError::DimensionMismatch {
                expected: global.dimension_count(),
                got: pt.len(),
            });
        }
        match self {
            Self::Strict => {
                if global.contains(pt) {
                    Ok(pt.iter().copied().collect())
                } else {
                    Err(GridError::OutOfBounds {
                        point: format!("{pt:?}"),
                        bounds: global.to_string(),
                    })
                }
            }
            Self::Sticky => Ok(pt
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let lo = global.origin_at(i);
                    if v < lo {
                        lo
                    } else if v >= global.upper_at(i) {
                        C::last_inside(lo, global.extent_at(i))
                    } else {
                        v
                    }
                })
                .collect()),
            Self::Wrap => Ok(pt
                .iter()
                .enumerate()
                .map(|(i, &v)| v.wrap(global.origin_at(i), global.extent_at(i)))
                .collect()),
        }
    }

    /// `pt + displacement`, brought inside `global`.
    pub fn translate<C: Coordinate>(
        &self,
        pt: &[C],
        displacement: &[C],
        global: &GridDimensions<C>,
    ) -> Result<Point<C>, GridError> {
        if displacement.len() != pt.len() {
            return Err(GridError::DimensionMismatch {
                expected: pt.len(),
                got: displacement.len(),
            });
        }
        let moved: Point<C> = pt.iter().zip(displacement).map(|(&p, &d)| p + d).collect();
        self.transform(&moved, global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridDimensions<i32> {
        GridDimensions::new(vec![0, -5], vec![10, 10]).unwrap()
    }

    fn space() -> GridDimensions<f64> {
        GridDimensions::new(vec![0.0], vec![4.0]).unwrap()
    }

    #[test]
    fn strict_rejects_outside() {
        let p = BorderPolicy::Strict;
        assert_eq!(p.transform(&[3, 0], &grid()).unwrap().as_slice(), &[3, 0]);
        assert!(matches!(
            p.transform(&[10, 0], &grid()),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(matches!(
            p.transform(&[1], &grid()),
            Err(GridError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn sticky_clamps_to_last_cell() {
        let p = BorderPolicy::Sticky;
        assert_eq!(p.transform(&[12, -9], &grid()).unwrap().as_slice(), &[9, -5]);
        let x = p.transform(&[7.5], &space()).unwrap()[0];
        assert!(x < 4.0 && x > 3.999);
    }

    #[test]
    fn wrap_is_periodic() {
        let p = BorderPolicy::Wrap;
        assert_eq!(p.transform(&[-1, 5], &grid()).unwrap().as_slice(), &[9, -5]);
        assert_eq!(p.translate(&[9, 0], &[3, -6], &grid()).unwrap().as_slice(), &[2, 4]);
        assert_eq!(p.transform(&[-0.5], &space()).unwrap()[0], 3.5);
    }

    #[test]
    fn mesh_periodicity_picks_policy() {
        assert_eq!(BorderPolicy::for_mesh(true), BorderPolicy::Wrap);
        assert_eq!(BorderPolicy::for_mesh(false), BorderPolicy::Strict);
    }
}
