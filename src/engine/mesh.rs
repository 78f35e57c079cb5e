use crate::error::AssetError;

/// Floats per vertex: position xyz + colour rgb.
pub const VERTEX_STRIDE: usize = 6;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh { vertices: Vec::new(), indices: Vec::new() }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn cube(size: f32, color: [f32; 3]) -> Self {
        let mut mesh = Mesh::new();
        mesh.add_box([0.0, 0.0, 0.0], [size, size, size], color);
        mesh
    }

    /// Appends an axis-aligned box with baked per-face shading.
    pub fn add_box(&mut self, origin: [f32; 3], size: [f32; 3], color: [f32; 3]) {
        let [ox, oy, oz] = origin;
        let (hx, hy, hz) = (size[0] / 2.0, size[1] / 2.0, size[2] / 2.0);
        let faces: [([[f32; 3]; 4], f32); 6] = [
            ([[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]], 0.9),
            ([[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]], 0.7),
            ([[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]], 1.1),
            ([[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]], 0.4),
            ([[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]], 0.8),
            ([[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]], 0.6),
        ];
        for (corners, brightness) in faces {
            let base = self.vertex_count() as u16;
            for [x, y, z] in corners {
                self.vertices.extend_from_slice(&[
                    ox + x,
                    oy + y,
                    oz + z,
                    color[0] * brightness,
                    color[1] * brightness,
                    color[2] * brightness,
                ]);
            }
            self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Procedural stand-in used when no car model could be loaded. Faces +Z.
    pub fn voxel_car(body: [f32; 3]) -> Self {
        let [r, g, b] = body;
        let tire = [0.1, 0.1, 0.1];
        let hub = [0.35, 0.35, 0.35];
        let mut mesh = Mesh::new();
        mesh.add_box([0.0, -0.1, 0.0], [0.55, 0.25, 0.9], body);
        mesh.add_box([0.0, -0.18, 0.0], [0.5, 0.08, 0.8], [r * 0.7, g * 0.7, b * 0.7]);
        mesh.add_box([0.0, 0.08, 0.02], [0.35, 0.2, 0.6], [r * 0.9, g * 0.9, b * 0.9]);
        mesh.add_box([0.0, 0.12, 0.02], [0.28, 0.1, 0.45], [0.55, 0.7, 0.85]);
        mesh.add_box([0.0, -0.03, -0.43], [0.5, 0.06, 0.06], [0.15, 0.15, 0.15]);
        mesh.add_box([0.0, -0.03, 0.43], [0.5, 0.05, 0.06], [0.15, 0.15, 0.15]);
        for (x, z) in [(-0.18, -0.3), (0.18, -0.3), (-0.18, 0.3), (0.18, 0.3)] {
            mesh.add_box([x, -0.2, z], [0.08, 0.22, 0.22], tire);
            mesh.add_box([x, -0.2, z], [0.1, 0.12, 0.12], hub);
        }
        mesh.add_box([-0.12, 0.0, 0.45], [0.08, 0.08, 0.04], [1.0, 1.0, 0.7]);
        mesh.add_box([0.12, 0.0, 0.45], [0.08, 0.08, 0.04], [1.0, 1.0, 0.7]);
        mesh.add_box([-0.12, -0.02, -0.45], [0.1, 0.1, 0.04], [0.9, 0.1, 0.1]);
        mesh.add_box([0.12, -0.02, -0.45], [0.1, 0.1, 0.04], [0.9, 0.1, 0.1]);
        mesh
    }

    pub fn from_gltf(bytes: &[u8]) -> Result<Self, AssetError> {
        let (document, buffers, _) = gltf::import_slice(bytes)?;
        let mut mesh = Mesh::new();

        for gltf_mesh in document.meshes() {
            for primitive in gltf_mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

                let positions: Vec<[f32; 3]> =
                    reader.read_positions().ok_or(AssetError::MissingPositions)?.collect();
                let colors: Vec<[f32; 3]> = match reader.read_colors(0) {
                    Some(iter) => iter.into_rgb_f32().collect(),
                    None => vec![[1.0, 1.0, 1.0]; positions.len()],
                };

                let base_index = mesh.vertex_count();
                if base_index + positions.len() > u16::MAX as usize {
                    return Err(AssetError::TooManyVertices(base_index + positions.len()));
                }
                for (pos, color) in positions.iter().zip(colors.iter()) {
                    mesh.vertices.extend_from_slice(&[pos[0], pos[1], pos[2], color[0], color[1], color[2]]);
                }
                if let Some(iter) = reader.read_indices() {
                    mesh.indices.extend(iter.into_u32().map(|i| (base_index as u32 + i) as u16));
                }
            }
        }

        Ok(mesh)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_shaded_faces() {
        let cube = Mesh::cube(1.0, [1.0, 1.0, 1.0]);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
        // top face is brightest
        assert!((cube.vertices[2 * 4 * VERTEX_STRIDE + 3] - 1.1).abs() < 1e-6);
    }

    #[test]
    fn voxel_car_indices_stay_in_range() {
        let car = Mesh::voxel_car([0.9, 0.2, 0.2]);
        assert!(car.vertex_count() > 0);
        assert!(car.indices.iter().all(|&i| (i as usize) < car.vertex_count()));
    }

    #[test]
    fn garbage_gltf_is_an_error() {
        assert!(matches!(Mesh::from_gltf(b"not a model"), Err(AssetError::Gltf(_))));
    }
}
