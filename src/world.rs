//! World composition: one scene, one camera, one render target and the frame
//! loop tying them together, plus the asynchronous asset surface.
//!
//! Every moving part is an explicit field owned by [`World`]; components
//! receive references only to what they need, at the points they need them.

use cgmath::{Deg, Point3, Rad};
use instant::Instant;

use crate::{
    camera::{Camera, OrbitControls, Projection},
    frame::{AttachQueue, Attachment, FrameLoop, FrameStats, InputState, Updatable},
    render::RenderTarget,
    resources::{self, LoadError},
    scene::Scene,
};

/// Default spin applied to loaded models, in degrees per second.
const MODEL_SPIN_DEG_PER_SEC: f32 = 30.0;

/// Reacts to container size changes: keeps the camera's aspect ratio and the
/// render target's extent in sync with the host container.
///
/// Zero-area sizes are skipped outright so the projection never degenerates;
/// the previous valid state stays in place.
#[derive(Debug, Default)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Sync to the container's current size immediately, so the first frame
    /// never renders at a stale extent.
    pub fn new(camera: &mut Camera, target: &mut dyn RenderTarget) -> Self {
        let (width, height) = target.size();
        let mut viewport = Self::default();
        viewport.set_size(camera, target, width, height);
        viewport
    }

    /// Apply a container size change.
    pub fn set_size(
        &mut self,
        camera: &mut Camera,
        target: &mut dyn RenderTarget,
        width: u32,
        height: u32,
    ) {
        if width == 0 || height == 0 {
            log::debug!("skipping zero-area resize to {width}x{height}");
            return;
        }
        camera.projection.resize(width, height);
        target.resize(width, height);
        self.width = width;
        self.height = height;
    }

    /// Last applied size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Clonable handle for running loads independently of the world borrow.
///
/// Completions land in the attach queue and join the scene at the next frame
/// boundary; a load finishing after `stop()` simply waits there for the next
/// start. Decode failures surface to the caller and stage nothing.
#[derive(Clone)]
pub struct AssetLoader {
    pending: AttachQueue,
}

impl AssetLoader {
    /// Fetch, decode and stage a glTF model. The model picks up the default
    /// spin behavior when it attaches.
    pub async fn load_gltf(&self, file_name: &str) -> Result<(), LoadError> {
        let model = resources::load_model_gltf(file_name).await?;
        self.pending.push(Attachment::Model {
            model,
            spin: Rad::from(Deg(MODEL_SPIN_DEG_PER_SEC)),
        });
        Ok(())
    }

    /// Fetch, decode and stage an environment map as the scene's lighting
    /// state.
    pub async fn load_background(&self, file_name: &str) -> Result<(), LoadError> {
        let environment = resources::load_environment(file_name).await?;
        self.pending.push(Attachment::Environment(environment));
        Ok(())
    }
}

/// A live 3D world.
///
/// The render target doubles as the sizeable container: its current size
/// seeds the initial viewport sync, and the host forwards its resize events
/// to [`World::resize`]. One frame signal is one [`World::frame`] call.
pub struct World {
    scene: Scene,
    camera: Camera,
    viewport: Viewport,
    target: Box<dyn RenderTarget>,
    frames: FrameLoop,
    pending: AttachQueue,
    input: InputState,
}

impl World {
    /// Compose a world around the given render target. Registers the frame
    /// statistics and orbit controls updatables and performs the initial
    /// viewport sync.
    pub fn new(mut target: Box<dyn RenderTarget>) -> Self {
        let (width, height) = target.size();
        let projection = Projection::new(width.max(1), height.max(1), Deg(45.0), 0.1, 500.0);
        let mut camera = Camera::new(
            Point3::new(0.0, 4.0, 10.0),
            Deg(-90.0),
            Deg(-20.0),
            projection,
        );
        let viewport = Viewport::new(&mut camera, target.as_mut());

        let pending = AttachQueue::new();
        let mut frames = FrameLoop::new(pending.clone());
        frames.registry_mut().add(Box::new(FrameStats::new()));
        frames
            .registry_mut()
            .add(Box::new(OrbitControls::new(Point3::new(0.0, 0.0, 0.0), 10.0)));

        Self {
            scene: Scene::new(),
            camera,
            viewport,
            target,
            frames,
            pending,
            input: InputState::default(),
        }
    }

    /// Begin the frame loop. Idempotent.
    pub fn start(&mut self) {
        self.frames.start();
    }

    /// Halt the frame loop. Idempotent. In-flight loads are not cancelled;
    /// whatever they stage attaches after the next start.
    pub fn stop(&mut self) {
        self.frames.stop();
    }

    pub fn is_running(&self) -> bool {
        self.frames.is_running()
    }

    /// One host frame signal.
    pub fn frame(&mut self, now: Instant) {
        self.frames.frame(
            now,
            &mut self.scene,
            &mut self.camera,
            &self.input,
            self.target.as_mut(),
        );
        self.input.end_frame();
    }

    /// Container size change.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport
            .set_size(&mut self.camera, self.target.as_mut(), width, height);
    }

    /// Register an updatable. Composition-time entry point; runtime
    /// attachment of loaded assets goes through the attach queue instead.
    pub fn add_updatable(&mut self, entry: Box<dyn Updatable>) {
        self.frames.registry_mut().add(entry);
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.input.mouse_delta.0 += dx;
        self.input.mouse_delta.1 += dy;
    }

    pub fn set_orbiting(&mut self, orbiting: bool) {
        self.input.orbiting = orbiting;
    }

    /// Handle for spawning loads on an async runtime.
    pub fn assets(&self) -> AssetLoader {
        AssetLoader {
            pending: self.pending.clone(),
        }
    }

    /// Load a glTF model and stage it for attachment; see
    /// [`AssetLoader::load_gltf`].
    pub async fn load_gltf(&self, file_name: &str) -> Result<(), LoadError> {
        self.assets().load_gltf(file_name).await
    }

    /// Load an environment map and stage it as scene lighting; see
    /// [`AssetLoader::load_background`].
    pub async fn load_background(&self, file_name: &str) -> Result<(), LoadError> {
        self.assets().load_background(file_name).await
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Number of registered updatables.
    pub fn updatable_count(&self) -> usize {
        self.frames.registry().len()
    }

    /// Number of completed loads waiting for the next frame boundary.
    pub fn pending_attachments(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTarget {
        size: (u32, u32),
        resizes: Vec<(u32, u32)>,
    }
    impl StubTarget {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                resizes: Vec::new(),
            }
        }
    }
    impl RenderTarget for StubTarget {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.resizes.push((width, height));
        }
        fn render(&mut self, _scene: &Scene, _camera: &Camera) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn construction_syncs_the_viewport_to_the_container() {
        let world = World::new(Box::new(StubTarget::new(640, 480)));
        assert_eq!(world.viewport().size(), (640, 480));
        assert!((world.camera().projection.aspect - 640.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn zero_area_resize_leaves_the_previous_state() {
        let mut world = World::new(Box::new(StubTarget::new(640, 480)));
        world.resize(800, 600);
        let aspect = world.camera().projection.aspect;
        world.resize(0, 0);
        assert_eq!(world.viewport().size(), (800, 600));
        assert_eq!(world.camera().projection.aspect, aspect);
    }

    #[test]
    fn registers_stats_and_controls_at_construction() {
        let world = World::new(Box::new(StubTarget::new(640, 480)));
        assert_eq!(world.updatable_count(), 2);
    }

    #[tokio::test]
    async fn failing_load_stages_nothing() {
        let world = World::new(Box::new(StubTarget::new(640, 480)));
        let result = world.load_gltf("does/not/exist.gltf").await;
        assert!(matches!(result, Err(LoadError::Io(_))));
        assert_eq!(world.pending_attachments(), 0);
        assert!(world.scene().is_empty());
        assert_eq!(world.updatable_count(), 2);
    }
}
