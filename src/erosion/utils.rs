//! Utility functions for erosion calculations
//!
//! Provides gradient calculation, bilinear interpolation, surface normals and
//! erosion brush utilities.

use crate::tilemap::Tilemap;

/// Sample height at a floating-point position using bilinear interpolation.
/// The position is clamped into the grid.
pub fn height_at(heightmap: &Tilemap<f64>, x: f64, y: f64) -> f64 {
    heightmap.sample_bilinear(x, y)
}

/// Calculate gradient at a floating-point position using bilinear interpolation.
/// Returns (grad_x, grad_y) pointing in the direction of steepest ascent.
pub fn gradient_at(heightmap: &Tilemap<f64>, x: f64, y: f64) -> (f64, f64) {
    let (x0, y0, x1, y1, fx, fy) = heightmap.bilinear_corners(x, y);

    let h00 = *heightmap.get(x0, y0);
    let h10 = *heightmap.get(x1, y0);
    let h01 = *heightmap.get(x0, y1);
    let h11 = *heightmap.get(x1, y1);

    // dh/dx at y0 and y1, interpolated in y
    let gx0 = h10 - h00;
    let gx1 = h11 - h01;
    let grad_x = gx0 * (1.0 - fy) + gx1 * fy;

    // dh/dy at x0 and x1, interpolated in x
    let gy0 = h01 - h00;
    let gy1 = h11 - h10;
    let grad_y = gy0 * (1.0 - fx) + gy1 * fx;

    (grad_x, grad_y)
}

/// Calculate gradient at an integer cell position using central differences,
/// one-sided at the grid edges.
pub fn gradient_at_cell(heightmap: &Tilemap<f64>, x: usize, y: usize) -> (f64, f64) {
    let dim = heightmap.dim();

    let difference = |lo: (usize, usize), hi: (usize, usize), span: usize| -> f64 {
        if span == 0 {
            0.0
        } else {
            (*heightmap.get(hi.0, hi.1) - *heightmap.get(lo.0, lo.1)) / span as f64
        }
    };

    let x_lo = x.saturating_sub(1);
    let x_hi = (x + 1).min(dim.x - 1);
    let y_lo = y.saturating_sub(1);
    let y_hi = (y + 1).min(dim.y - 1);

    (
        difference((x_lo, y), (x_hi, y), x_hi - x_lo),
        difference((x, y_lo), (x, y_hi), y_hi - y_lo),
    )
}

/// Unit surface normal at a cell, with `y` pointing up.
///
/// `scale` is the vertical exaggeration applied to heights, so the normal
/// matches the rendered relief. The `y` component is the surface flatness:
/// 1.0 on level ground, approaching 0.0 on cliffs.
pub fn surface_normal(heightmap: &Tilemap<f64>, x: usize, y: usize, scale: f64) -> [f64; 3] {
    let (gx, gy) = gradient_at_cell(heightmap, x, y);
    let n = [-scale * gx, 1.0, -scale * gy];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    [n[0] / len, n[1] / len, n[2] / len]
}

/// Create a circular erosion brush with falloff.
/// Returns weights for cells within the radius, normalized to sum to 1.
pub fn create_erosion_brush(radius: usize) -> Vec<(i64, i64, f64)> {
    if radius == 0 {
        return vec![(0, 0, 1.0)];
    }

    let mut brush = Vec::new();
    let r = radius as i64;
    let r_sq = (r * r) as f64;
    let mut total_weight = 0.0;

    for dx in -r..=r {
        for dy in -r..=r {
            let dist_sq = (dx * dx + dy * dy) as f64;
            if dist_sq < r_sq {
                let weight = 1.0 - dist_sq / r_sq;
                brush.push((dx, dy, weight));
                total_weight += weight;
            }
        }
    }

    for (_, _, w) in brush.iter_mut() {
        *w /= total_weight;
    }

    brush
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Dim;

    #[test]
    fn test_gradient_flat() {
        let heightmap = Tilemap::new_with(Dim::new(4, 4), 5.0f64);
        let (gx, gy) = gradient_at(&heightmap, 1.5, 1.5);
        assert!(gx.abs() < 1e-12);
        assert!(gy.abs() < 1e-12);
    }

    #[test]
    fn test_gradient_points_uphill() {
        let mut heightmap = Tilemap::new_with(Dim::new(8, 8), 0.0f64);
        for (x, _, h) in heightmap.iter_mut() {
            *h = x as f64;
        }
        let (gx, gy) = gradient_at(&heightmap, 3.3, 4.7);
        assert!((gx - 1.0).abs() < 1e-12);
        assert!(gy.abs() < 1e-12);
    }

    #[test]
    fn test_gradient_clamps_outside_grid() {
        let heightmap = Tilemap::new_with(Dim::new(4, 4), 1.0f64);
        let (gx, gy) = gradient_at(&heightmap, 100.0, -100.0);
        assert!(gx.is_finite() && gy.is_finite());
    }

    #[test]
    fn test_normal_flat_points_up() {
        let heightmap = Tilemap::new_with(Dim::new(4, 4), 0.3f64);
        let n = surface_normal(&heightmap, 0, 3, 80.0);
        assert!((n[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_erosion_brush_normalized() {
        for radius in 0..4 {
            let brush = create_erosion_brush(radius);
            let total: f64 = brush.iter().map(|(_, _, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-12);
            assert!(brush.iter().all(|&(_, _, w)| w > 0.0));
        }
    }
}
