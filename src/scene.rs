//! Scene graph root and scene-side data model.
//!
//! [`Scene`] is the single root container of renderable objects: the frame
//! loop reads it for rendering, the attachment drain writes loaded assets
//! into it, and the composition layer populates it before the loop starts.
//! Objects carry a CPU-side model summary plus an instance transform.

use cgmath::{One, Quaternion, Vector3};

/// Stable handle to an object inserted into the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

/// Per-object placement: position, rotation and scale.
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Geometry summary for one mesh primitive of a loaded model.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// A decoded model: named mesh summaries plus the root-node transform it
/// arrived with. Vertex data itself stays with the render backend.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<MeshData>,
    pub transform: Transform,
}

/// Scene-wide lighting state decoded from an environment map.
#[derive(Clone, Debug)]
pub struct Environment {
    pub width: u32,
    pub height: u32,
    /// Average radiance of the map, used as the ambient tint.
    pub ambient: [f32; 3],
}

/// An object living in the scene graph.
#[derive(Clone, Debug)]
pub struct Object {
    pub model: Model,
    pub transform: Transform,
}

/// Root container of renderable objects plus scene-wide lighting state.
///
/// Exactly one `Scene` exists per running [`crate::world::World`]. Writes
/// happen either before the loop starts or at a frame boundary through the
/// attachment drain, never concurrently with a tick sweep.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<(ObjectId, Object)>,
    next_id: u32,
    environment: Option<Environment>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a loaded model, placed at its own root transform. Returns the
    /// handle updatables use to reach the object later.
    pub fn insert(&mut self, model: Model) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let transform = model.transform.clone();
        self.objects.push((id, Object { model, transform }));
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects
            .iter()
            .find(|(oid, _)| *oid == id)
            .map(|(_, object)| object)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects
            .iter_mut()
            .find(|(oid, _)| *oid == id)
            .map(|(_, object)| object)
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
    }

    /// Clear colour for the render target, derived from the environment's
    /// ambient tint. A dark neutral before any map is loaded.
    pub fn clear_color(&self) -> [f64; 4] {
        match &self.environment {
            Some(env) => [
                env.ambient[0] as f64,
                env.ambient[1] as f64,
                env.ambient[2] as f64,
                1.0,
            ],
            None => [0.05, 0.05, 0.08, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> Model {
        Model {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn insert_assigns_distinct_ids_in_order() {
        let mut scene = Scene::new();
        let a = scene.insert(model("a"));
        let b = scene.insert(model("b"));
        assert_ne!(a, b);
        let names: Vec<_> = scene
            .objects()
            .map(|(_, object)| object.model.name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn object_mut_reaches_the_inserted_object() {
        let mut scene = Scene::new();
        let id = scene.insert(model("a"));
        scene.object_mut(id).unwrap().transform.position.x = 3.0;
        assert_eq!(scene.object(id).unwrap().transform.position.x, 3.0);
    }

    #[test]
    fn environment_feeds_the_clear_color() {
        let mut scene = Scene::new();
        let neutral = scene.clear_color();
        scene.set_environment(Environment {
            width: 4,
            height: 2,
            ambient: [0.9, 0.5, 0.1],
        });
        assert!(scene.environment().is_some());
        let lit = scene.clear_color();
        assert_ne!(neutral, lit);
        assert!((lit[0] - 0.9).abs() < 1e-6);
    }
}
