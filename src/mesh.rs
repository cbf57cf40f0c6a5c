// mesh.rs — inside-out UV sphere that an equirectangular image is wrapped onto

#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Sphere whose triangles face the centre (counter-clockwise seen from inside).
///
/// `lon` segments run around the equator, `lat` segments pole to pole.
/// u follows longitude, v = 0 at the north pole so the first image row is the sky.
/// Degenerate pole triangles are skipped.
pub fn build_inverted_sphere(radius: f32, lon: usize, lat: usize) -> SphereMesh {
    let lon = lon.max(3);
    let lat = lat.max(2);

    let mut positions = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut uvs = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let v = i as f32 / lat as f32;
        let theta = std::f32::consts::PI * v;
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon {
            let u = j as f32 / lon as f32;
            let phi = 2.0 * std::f32::consts::PI * u;

            positions.push([radius * phi.cos() * sin_t, y, radius * phi.sin() * sin_t]);
            uvs.push([u, v]);
        }
    }

    let row = (lon + 1) as u32;
    for i in 0..lat {
        for j in 0..lon {
            let a = i as u32 * row + j as u32;
            let b = a + row;

            if i != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if i != lat - 1 {
                indices.extend_from_slice(&[b, b + 1, a + 1]);
            }
        }
    }

    SphereMesh {
        positions,
        uvs,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_counts_for_default_tessellation() {
        let mesh = build_inverted_sphere(500.0, 60, 40);
        assert_eq!(mesh.vertex_count(), 61 * 41);
        // two triangles per quad, minus one per quad on each pole row
        assert_eq!(mesh.triangle_count(), 60 * 40 * 2 - 2 * 60);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_vertices_on_radius() {
        let mesh = build_inverted_sphere(500.0, 16, 8);
        for p in &mesh.positions {
            assert!((Vec3::from(*p).length() - 500.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_triangles_face_inward() {
        let mesh = build_inverted_sphere(10.0, 24, 12);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            assert!(normal.length() > 1e-6, "degenerate triangle {tri:?}");
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) < 0.0, "triangle {tri:?} faces outward");
        }
    }

    #[test]
    fn test_uv_covers_unit_square() {
        let mesh = build_inverted_sphere(1.0, 8, 4);
        assert_eq!(mesh.uvs.first(), Some(&[0.0, 0.0]));
        assert_eq!(mesh.uvs.last(), Some(&[1.0, 1.0]));
    }
}
