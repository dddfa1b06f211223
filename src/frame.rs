//! Frame scheduling: the update loop, the updatable registry and the
//! attachment queue that splices asynchronously loaded assets into a running
//! scene.
//!
//! One [`FrameLoop::frame`] call is the unit of scheduler execution. Each
//! frame it drains completed loads, computes the elapsed time since the
//! previous frame, ticks every registered updatable in insertion order and
//! issues one render through the target. Asynchronous loads never touch the
//! scene or the registry directly; they push fully decoded [`Attachment`]s
//! which become visible at the start of a subsequent frame, so a sweep can
//! never observe a half-applied attachment.

use std::sync::{Arc, Mutex, MutexGuard};

use cgmath::{Quaternion, Rad, Rotation3};
use instant::{Duration, Instant};

use crate::{
    camera::Camera,
    render::RenderTarget,
    scene::{Environment, Model, ObjectId, Scene},
};

/// Per-frame capability: called once per frame with the elapsed time.
///
/// Implementers mutate themselves and whatever they reach through
/// [`FrameState`]. A returned error is logged by the loop and the sweep
/// continues with the next entry; one misbehaving updatable never brings the
/// loop down.
pub trait Updatable {
    fn tick(&mut self, frame: &mut FrameState<'_>, dt: Duration) -> anyhow::Result<()>;
}

/// What an updatable may reach during its tick.
pub struct FrameState<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub input: &'a InputState,
}

/// Mouse state accumulated by the host between frames.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    /// Mouse movement accumulated since the previous frame.
    pub mouse_delta: (f64, f64),
    /// Whether the orbit button is held.
    pub orbiting: bool,
}

impl InputState {
    pub(crate) fn end_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }
}

/// Ordered, append-only collection of tick-capable entities.
///
/// Insertion order is tick order. Nothing is deduplicated and nothing is
/// removed at this scale. Runtime additions go through [`AttachQueue`], so
/// the collection never changes mid-sweep.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Box<dyn Updatable>>,
}

impl Registry {
    pub fn add(&mut self, entry: Box<dyn Updatable>) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully decoded asset waiting to join the scene at the next frame
/// boundary.
pub enum Attachment {
    /// A model plus its default spin rate (radians per second).
    Model { model: Model, spin: Rad<f32> },
    /// Scene-wide lighting state; never becomes an updatable.
    Environment(Environment),
}

/// Hand-off point between asynchronous loads and the frame loop.
///
/// Loads push from whatever task completed them; the loop drains at the top
/// of a frame, so a completion is never visible mid-sweep. Entries survive a
/// stopped loop and attach on the first frame after the next start.
#[derive(Clone, Default)]
pub struct AttachQueue {
    inner: Arc<Mutex<Vec<Attachment>>>,
}

impl AttachQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, attachment: Attachment) {
        self.lock().push(attachment);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn drain(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Attachment>> {
        // A poisoning panic elsewhere must not take the queue with it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The frame scheduler: owns the clock and the updatable registry, and turns
/// one host frame signal into drain, tick sweep, render.
pub struct FrameLoop {
    registry: Registry,
    pending: AttachQueue,
    last_frame: Option<Instant>,
    running: bool,
}

impl FrameLoop {
    pub fn new(pending: AttachQueue) -> Self {
        Self {
            registry: Registry::default(),
            pending,
            last_frame: None,
            running: false,
        }
    }

    /// Begin looping. Idempotent: calling while running keeps the current
    /// clock instead of resetting it.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_frame = None;
    }

    /// Halt the loop. Idempotent. The clock resets so the first frame after
    /// a restart sees a zero delta.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// One host frame signal. Returns whether a frame actually ran; a
    /// stopped loop ignores the signal entirely, producing neither ticks nor
    /// a render.
    pub fn frame(
        &mut self,
        now: Instant,
        scene: &mut Scene,
        camera: &mut Camera,
        input: &InputState,
        target: &mut dyn RenderTarget,
    ) -> bool {
        if !self.running {
            return false;
        }

        self.attach_pending(scene);

        // First frame after start: no previous timestamp, delta stays zero so
        // animations do not jump. duration_since saturates, so the delta is
        // never negative even against a misbehaving host clock.
        let dt = match self.last_frame {
            Some(last) => now.duration_since(last),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);

        let mut frame = FrameState {
            scene: &mut *scene,
            camera: &mut *camera,
            input,
        };
        for entry in self.registry.entries.iter_mut() {
            if let Err(e) = entry.tick(&mut frame, dt) {
                log::error!("updatable tick failed: {e:#}");
            }
        }

        if let Err(e) = target.render(scene, camera) {
            log::error!("unable to render: {e:#}");
        }
        true
    }

    /// Drain completed loads into the scene and registry. Runs only at the
    /// top of a frame, the sole point where either may grow while the loop
    /// is live.
    fn attach_pending(&mut self, scene: &mut Scene) {
        for attachment in self.pending.drain() {
            match attachment {
                Attachment::Model { model, spin } => {
                    log::debug!(
                        "attaching model {:?} ({} meshes)",
                        model.name,
                        model.meshes.len()
                    );
                    let id = scene.insert(model);
                    self.registry.add(Box::new(Spinner::new(id, spin)));
                }
                Attachment::Environment(environment) => {
                    log::debug!(
                        "attaching environment map {}x{}",
                        environment.width,
                        environment.height
                    );
                    scene.set_environment(environment);
                }
            }
        }
    }
}

/// Default per-frame behavior for a loaded model: a fixed angular rate
/// around the Y axis, scaled by the elapsed time so the spin speed is
/// independent of the display refresh rate.
pub struct Spinner {
    object: ObjectId,
    rate: Rad<f32>,
}

impl Spinner {
    pub fn new(object: ObjectId, rate: Rad<f32>) -> Self {
        Self { object, rate }
    }
}

impl Updatable for Spinner {
    fn tick(&mut self, frame: &mut FrameState<'_>, dt: Duration) -> anyhow::Result<()> {
        if let Some(object) = frame.scene.object_mut(self.object) {
            let step = self.rate * dt.as_secs_f32();
            object.transform.rotation = Quaternion::from_angle_y(step) * object.transform.rotation;
        }
        Ok(())
    }
}

/// Frame statistics: counts frames and logs the rate once a second.
#[derive(Default)]
pub struct FrameStats {
    frames: u32,
    window: Duration,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Updatable for FrameStats {
    fn tick(&mut self, frame: &mut FrameState<'_>, dt: Duration) -> anyhow::Result<()> {
        self.frames += 1;
        self.window += dt;
        if self.window >= Duration::from_secs(1) {
            log::debug!(
                "{:.1} fps, {} objects",
                self.frames as f64 / self.window.as_secs_f64(),
                frame.scene.len()
            );
            self.frames = 0;
            self.window = Duration::ZERO;
        }
        Ok(())
    }
}
