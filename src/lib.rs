//! stagecraft
//!
//! A minimal 3D world runtime: a camera, a render target, a scene graph and a
//! set of independently updating entities, driven by a continuous frame loop
//! while asynchronously loaded assets (a glTF model, an environment map) are
//! spliced into the running scene at frame boundaries, never mid-frame.
//!
//! High-level modules
//! - `camera`: camera, projection and orbit controls
//! - `scene`: scene graph root and scene-side data model
//! - `frame`: the frame scheduler, updatable registry and attachment queue
//! - `render`: the render target seam and the wgpu-backed surface
//! - `resources`: asynchronous asset fetch and decode
//! - `world`: world composition, lifecycle and the async asset surface
//! - `app`: a native winit shell driving a world
//!

pub mod app;
pub mod camera;
pub mod frame;
pub mod render;
pub mod resources;
pub mod scene;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Deg, Point3, Quaternion, Rad, Vector3};
pub use instant::{Duration, Instant};
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
