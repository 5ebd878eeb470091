use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use gltf::buffer;
use itertools::izip;

use crate::model_loader::LoadError;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: [f32; 4],
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Identifies a model for the lifetime of the process. The renderer keys its
/// GPU buffers by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey(u64);

impl ModelKey {
    fn next() -> Self {
        static NEXT_KEY: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Model {
    pub key: ModelKey,
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> Self {
        Self {
            key: ModelKey::next(),
            name: name.into(),
            primitives,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.indices.len() / 3).sum()
    }

    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> Result<Model, LoadError> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(LoadError::UnsupportedPrimitive(format!(
                    "{:?} in mesh {}",
                    primitive.mode(),
                    name
                )));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| LoadError::MissingAttribute("POSITION", name.clone()))?
                .map(Vec3::from)
                .collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(index_reader) => index_reader.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(normal_reader) => normal_reader.map(Vec3::from).collect(),
                None => calculate_vertex_normals(&positions, &indices),
            };

            let base_color =
                Vec4::from(primitive.material().pbr_metallic_roughness().base_color_factor());
            let colors: Vec<[f32; 4]> = match reader.read_colors(0) {
                Some(color_reader) => color_reader
                    .into_rgba_f32()
                    .map(|c| (Vec4::from(c) * base_color).to_array())
                    .collect(),
                None => vec![base_color.to_array(); positions.len()],
            };

            for (attribute, found) in [("NORMAL", normals.len()), ("COLOR_0", colors.len())] {
                if found != positions.len() {
                    return Err(LoadError::AttributeCountMismatch {
                        attribute,
                        mesh: name.clone(),
                        expected: positions.len(),
                        found,
                    });
                }
            }

            let vertices = izip!(positions, normals, colors)
                .map(|(position, normal, color)| Vertex {
                    position,
                    normal,
                    color,
                })
                .collect::<Vec<Vertex>>();

            primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        if primitives.is_empty() {
            return Err(LoadError::EmptyMesh(name));
        }

        Ok(Model::new(name, primitives))
    }

    pub fn from_obj(obj: &tobj::Model, color: Vec4) -> Model {
        let mesh = &obj.mesh;
        let positions: Vec<Vec3> = mesh
            .positions
            .chunks_exact(3)
            .map(Vec3::from_slice)
            .collect();

        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect()
        } else {
            calculate_vertex_normals(&positions, &mesh.indices)
        };

        let vertices = positions
            .into_iter()
            .zip(normals)
            .map(|(position, normal)| Vertex {
                position,
                normal,
                color: color.to_array(),
            })
            .collect();

        Model::new(
            obj.name.clone(),
            vec![ModelPrimitive {
                index: 0,
                vertices,
                indices: mesh.indices.clone(),
            }],
        )
    }
}

/// Averages the face normals of every triangle touching a vertex.
pub fn calculate_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let face_normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        for index in [i0, i1, i2] {
            normals[index] += face_normal;
        }
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or_zero())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computed_normals_face_out_of_ccw_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = calculate_vertex_normals(&positions, &[0, 1, 2]);
        for normal in normals {
            assert!((normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let positions = [Vec3::ZERO, Vec3::X];
        let normals = calculate_vertex_normals(&positions, &[0, 1, 5]);
        assert_eq!(normals, vec![Vec3::ZERO, Vec3::ZERO]);
    }

    const SHORT_NORMALS_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "meshes": [{
            "name": "Broken",
            "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }]
        }],
        "buffers": [{
            "byteLength": 60,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/"
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC3" }
        ]
    }"#;

    #[test]
    fn attribute_count_mismatch_is_rejected() {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(SHORT_NORMALS_GLTF.as_bytes()).unwrap();
        let buffers = gltf::import_buffers(&document, None, blob).unwrap();
        let mesh = document.meshes().next().unwrap();

        let error = Model::from_gltf("Broken", mesh, &buffers).err().unwrap();
        assert!(matches!(
            error,
            LoadError::AttributeCountMismatch {
                attribute: "NORMAL",
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn model_keys_are_unique() {
        let a = Model::new("a", Vec::new());
        let b = Model::new("b", Vec::new());
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn obj_model_gets_flat_color_and_normals() {
        let obj = tobj::Model::new(
            tobj::Mesh {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                indices: vec![0, 1, 2],
                ..Default::default()
            },
            "tri".to_string(),
        );
        let model = Model::from_obj(&obj, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(model.name, "tri");
        assert_eq!(model.triangle_count(), 1);
        let vertex = model.primitives[0].vertices[0];
        assert_eq!(vertex.color, [1.0, 0.0, 0.0, 1.0]);
        assert!((vertex.normal - Vec3::Z).length() < 1e-6);
    }
}
