use std::{cell::RefCell, rc::Rc};

use stagecraft::{camera::Camera, render::RenderTarget, scene::Scene};

#[derive(Default)]
struct ProbeState {
    size: (u32, u32),
    renders: usize,
    resizes: Vec<(u32, u32)>,
}

/// Render target stub that records resizes and render calls. Clones share
/// state, so a probe handed to the world stays observable from the test.
#[derive(Clone, Default)]
pub struct TargetProbe {
    inner: Rc<RefCell<ProbeState>>,
}

impl TargetProbe {
    pub fn with_size(width: u32, height: u32) -> Self {
        let probe = Self::default();
        probe.inner.borrow_mut().size = (width, height);
        probe
    }

    pub fn renders(&self) -> usize {
        self.inner.borrow().renders
    }

    pub fn current_size(&self) -> (u32, u32) {
        self.inner.borrow().size
    }

    #[allow(dead_code)]
    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.inner.borrow().resizes.clone()
    }
}

impl RenderTarget for TargetProbe {
    fn size(&self) -> (u32, u32) {
        self.inner.borrow().size
    }

    fn resize(&mut self, width: u32, height: u32) {
        let mut state = self.inner.borrow_mut();
        state.size = (width, height);
        state.resizes.push((width, height));
    }

    fn render(&mut self, _scene: &Scene, _camera: &Camera) -> anyhow::Result<()> {
        self.inner.borrow_mut().renders += 1;
        Ok(())
    }
}
