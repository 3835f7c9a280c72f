use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{Result, SimError};
use crate::snapshot::{HydroPalette, Snapshot};

#[inline]
fn channel(v: f64) -> u8 {
    if v.is_finite() {
        (v.clamp(0.0, 1.0) * 255.0) as u8
    } else {
        0
    }
}

fn save(img: RgbImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|source| SimError::Export {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the raw hydrology map: R = height, G = pool depth, B = waterpath.
/// Values are clamped to 0.0-1.0.
pub fn render_hydrology_map(snapshot: &Snapshot) -> RgbImage {
    ImageBuffer::from_fn(snapshot.dim.x as u32, snapshot.dim.y as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            channel(*snapshot.heightmap.get(x, y)),
            channel(*snapshot.waterpool.get(x, y)),
            channel(*snapshot.waterpath.get(x, y)),
        ])
    })
}

/// Render the hydro colour signal.
pub fn render_hydro_map(snapshot: &Snapshot, palette: &HydroPalette) -> RgbImage {
    ImageBuffer::from_fn(snapshot.dim.x as u32, snapshot.dim.y as u32, |x, y| {
        let [r, g, b] = snapshot.hydro_at(x as usize, y as usize, palette);
        Rgb([channel(r), channel(g), channel(b)])
    })
}

/// Export the hydrology map as a PNG.
pub fn export_hydrology_png(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    save(render_hydrology_map(snapshot), path.as_ref())
}

/// Export the hydro colour map as a PNG.
pub fn export_hydro_png(
    snapshot: &Snapshot,
    palette: &HydroPalette,
    path: impl AsRef<Path>,
) -> Result<()> {
    save(render_hydro_map(snapshot, palette), path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{Dim, Tilemap};

    fn snapshot() -> Snapshot {
        let dim = Dim::new(6, 3);
        let mut heightmap = Tilemap::new_with(dim, 0.0);
        heightmap.set(5, 2, 1.0);
        let mut waterpool = Tilemap::new_with(dim, 0.0);
        waterpool.set(1, 0, 2.0);
        Snapshot {
            dim,
            scale: 80.0,
            frame: 3,
            heightmap,
            waterpath: Tilemap::new_with(dim, 0.5),
            waterpool,
            plants: Vec::new(),
        }
    }

    #[test]
    fn test_hydrology_channels() {
        let img = render_hydrology_map(&snapshot());
        assert_eq!(img.dimensions(), (6, 3));
        assert_eq!(img.get_pixel(5, 2).0, [255, 0, 127]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 127]);
    }

    #[test]
    fn test_export_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hydro.png");
        export_hydro_png(&snapshot(), &HydroPalette::default(), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (6, 3));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("map.png");
        let err = export_hydrology_png(&snapshot(), &path).unwrap_err();
        assert!(matches!(err, SimError::Export { .. }));
    }
}
