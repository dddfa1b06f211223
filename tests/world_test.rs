use std::{cell::RefCell, path::PathBuf, rc::Rc};

use cgmath::{Deg, Quaternion, Rad, Rotation3};
use instant::{Duration, Instant};
use stagecraft::{
    frame::{FrameState, Updatable},
    world::World,
};

use crate::common::test_utils::TargetProbe;

mod common;

const TEST_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "scene": 0,
    "scenes": [{"nodes": [0], "name": "stage"}],
    "nodes": [{"mesh": 0, "name": "crate", "translation": [1.0, 2.0, 3.0]}],
    "meshes": [{"name": "crate", "primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
    "accessors": [
        {"bufferView": 0, "componentType": 5126, "count": 24, "type": "VEC3",
         "min": [-1.0, -1.0, -1.0], "max": [1.0, 1.0, 1.0]},
        {"bufferView": 1, "componentType": 5123, "count": 36, "type": "SCALAR"}
    ],
    "bufferViews": [
        {"buffer": 0, "byteOffset": 0, "byteLength": 288},
        {"buffer": 0, "byteOffset": 288, "byteLength": 72}
    ],
    "buffers": [{"byteLength": 360, "uri": "crate.bin"}]
}"#;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stagecraft-test-{}-{name}", std::process::id()))
}

struct Recorder {
    tag: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Updatable for Recorder {
    fn tick(&mut self, _frame: &mut FrameState<'_>, _dt: Duration) -> anyhow::Result<()> {
        self.log.borrow_mut().push(self.tag);
        Ok(())
    }
}

fn world_with_probe() -> (World, TargetProbe) {
    let probe = TargetProbe::with_size(640, 480);
    let world = World::new(Box::new(probe.clone()));
    (world, probe)
}

/// Simulate `frames` evenly spaced host signals after `start`, returning the
/// timestamp of the last one.
fn pump(world: &mut World, start: Instant, frames: u32, step: Duration) -> Instant {
    let mut last = start;
    for i in 1..=frames {
        last = start + step * i;
        world.frame(last);
    }
    last
}

#[test]
fn registered_updatables_tick_in_add_order() {
    let (mut world, _probe) = world_with_probe();
    let log = Rc::new(RefCell::new(Vec::new()));
    world.add_updatable(Box::new(Recorder {
        tag: "first",
        log: log.clone(),
    }));
    world.add_updatable(Box::new(Recorder {
        tag: "second",
        log: log.clone(),
    }));

    let t0 = Instant::now();
    world.start();
    world.frame(t0);
    pump(&mut world, t0, 1, Duration::from_millis(16));

    assert_eq!(*log.borrow(), vec!["first", "second", "first", "second"]);
}

#[test]
fn stop_halts_ticks_and_renders_until_restart() {
    let (mut world, probe) = world_with_probe();
    let t0 = Instant::now();

    world.start();
    world.frame(t0);
    pump(&mut world, t0, 1, Duration::from_millis(16));
    assert_eq!(probe.renders(), 2);

    world.stop();
    pump(&mut world, t0, 5, Duration::from_secs(1));
    assert_eq!(probe.renders(), 2);

    world.start();
    world.frame(t0 + Duration::from_secs(10));
    assert_eq!(probe.renders(), 3);
}

#[test]
fn resize_reaches_camera_and_target() {
    let (mut world, probe) = world_with_probe();
    world.resize(800, 600);
    assert_eq!(probe.current_size(), (800, 600));
    assert!((world.camera().projection.aspect - 800.0 / 600.0).abs() < 1e-6);

    world.resize(0, 0);
    assert_eq!(probe.current_size(), (800, 600));
}

#[tokio::test]
async fn loaded_model_attaches_once_and_spins_frame_rate_independently() {
    let path = temp_path("model.gltf");
    std::fs::write(&path, TEST_GLTF).unwrap();

    let spin = |frames: u32, step: Duration| {
        let path = path.clone();
        async move {
            let (mut world, _probe) = world_with_probe();
            world.load_gltf(path.to_str().unwrap()).await.unwrap();
            assert_eq!(world.pending_attachments(), 1);
            assert!(world.scene().is_empty());

            let before = world.updatable_count();
            let t0 = Instant::now();
            world.start();
            // The attachment drains at the top of this first frame (delta 0).
            world.frame(t0);
            assert_eq!(world.scene().len(), 1);
            assert_eq!(world.updatable_count(), before + 1);

            pump(&mut world, t0, frames, step);
            let (_, object) = world.scene().objects().next().unwrap();
            object.transform.rotation
        }
    };

    // Three simulated seconds, accumulated over many small frames and again
    // over a few large ones.
    let fine = spin(30, Duration::from_millis(100)).await;
    let coarse = spin(3, Duration::from_secs(1)).await;
    let expected = Quaternion::from_angle_y(Rad::from(Deg(90.0)));

    for (got, want) in [(fine, expected), (coarse, expected), (fine, coarse)] {
        assert!((got.s - want.s).abs() < 1e-3, "{got:?} vs {want:?}");
        assert!((got.v.x - want.v.x).abs() < 1e-3);
        assert!((got.v.y - want.v.y).abs() < 1e-3);
        assert!((got.v.z - want.v.z).abs() < 1e-3);
    }

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn loaded_background_sets_lighting_without_a_registry_entry() {
    let path = temp_path("environment.png");
    let map = image::RgbImage::from_pixel(8, 4, image::Rgb([64, 128, 192]));
    map.save(&path).unwrap();

    let (mut world, _probe) = world_with_probe();
    let before = world.updatable_count();

    world.load_background(path.to_str().unwrap()).await.unwrap();
    assert_eq!(world.pending_attachments(), 1);

    let t0 = Instant::now();
    world.start();
    world.frame(t0);

    let environment = world.scene().environment().expect("environment attached");
    assert_eq!((environment.width, environment.height), (8, 4));
    assert_eq!(world.updatable_count(), before);
    assert!(world.scene().is_empty());

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn a_load_that_completes_while_stopped_attaches_after_restart() {
    let path = temp_path("late-model.gltf");
    std::fs::write(&path, TEST_GLTF).unwrap();

    let (mut world, _probe) = world_with_probe();
    let t0 = Instant::now();
    world.start();
    world.frame(t0);
    world.stop();

    // Load completes while no frames run.
    world.load_gltf(path.to_str().unwrap()).await.unwrap();
    assert_eq!(world.pending_attachments(), 1);
    assert!(world.scene().is_empty());

    world.start();
    world.frame(t0 + Duration::from_secs(2));
    assert_eq!(world.scene().len(), 1);
    assert_eq!(world.pending_attachments(), 0);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn failing_load_leaves_scene_and_registry_untouched() {
    let (mut world, _probe) = world_with_probe();
    let before = world.updatable_count();

    let result = world.load_gltf(temp_path("missing.gltf").to_str().unwrap()).await;
    assert!(result.is_err());

    let t0 = Instant::now();
    world.start();
    world.frame(t0);
    assert!(world.scene().is_empty());
    assert_eq!(world.updatable_count(), before);
}
