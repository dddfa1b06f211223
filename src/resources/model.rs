//! glTF model decoding: fetch-then-parse, summarized into the scene-side
//! [`Model`].
//!
//! Geometry is summarized from accessor metadata (counts and names); vertex
//! data stays with the render backend. The root-node transform of the
//! document's scene becomes the model's initial placement, converted to
//! cgmath types the way the scene graph stores them.

use gltf::Gltf;

use crate::{
    resources::{LoadError, load_binary},
    scene::{MeshData, Model, Transform},
};

/// Decode an in-memory glTF document (JSON or binary) into a model summary.
pub fn decode_gltf(bytes: &[u8], name: &str) -> Result<Model, LoadError> {
    let gltf = Gltf::from_slice(bytes)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| LoadError::Decode(format!("{name}: glTF document contains no scene")))?;

    let mut meshes = Vec::new();
    let mut transform = Transform::default();
    for (index, node) in scene.nodes().enumerate() {
        if index == 0 {
            let decomposed = node.transform().decomposed();
            transform = Transform {
                position: decomposed.0.into(),
                rotation: decomposed.1.into(),
                scale: decomposed.2.into(),
            };
        }
        collect_meshes(&node, &mut meshes);
    }

    Ok(Model {
        name: scene.name().unwrap_or(name).to_string(),
        meshes,
        transform,
    })
}

fn collect_meshes(node: &gltf::Node, meshes: &mut Vec<MeshData>) {
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let vertex_count = primitive
                .get(&gltf::Semantic::Positions)
                .map(|accessor| accessor.count())
                .unwrap_or(0);
            let index_count = primitive
                .indices()
                .map(|accessor| accessor.count())
                .unwrap_or(0);
            meshes.push(MeshData {
                name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                vertex_count,
                index_count,
            });
        }
    }
    for child in node.children() {
        collect_meshes(&child, meshes);
    }
}

/// Fetch and decode a glTF model from disk.
pub async fn load_model_gltf(file_name: &str) -> Result<Model, LoadError> {
    let bytes = load_binary(file_name).await?;
    decode_gltf(&bytes, file_name)
}
