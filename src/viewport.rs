//! Viewport host: mounts the avatar into a host container and drives it
//! frame by frame until torn down.
//!
//! ```text
//!   Unmounted ──mount──▶ Mounted ──teardown──▶ TornDown
//!                          │  ▲                  │
//!                          └──┘ frame / resize   └──mount──▶ Mounted
//! ```
//!
//! The host never owns the container; every call that touches it borrows
//! it, so the shell keeps control of layout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::anim::{AnimationDriver, FrameReport};
use crate::config::{ParticleConfig, ViewportConfig};
use crate::error::{AvatarError, Result};
use crate::render::camera::Camera;
use crate::render::draw_list::DrawList;
use crate::render::lights::Lighting;
use crate::render::points::splat_points;
use crate::render::sdf_renderer::CpuRaymarcher;
use crate::render::{RenderBackend, Rasterizer};
use crate::scene::AvatarScene;
use crate::signals::SignalMailbox;

static NEXT_SURFACE: AtomicU64 = AtomicU64::new(1);

/// Identity of a render surface attached to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        Self(NEXT_SURFACE.fetch_add(1, Ordering::Relaxed))
    }
}

/// The host-side element the avatar renders into.
pub trait Container {
    /// Logical size, `None` (or a zero side) while not laid out.
    fn measure(&self) -> Option<[f32; 2]>;
    /// Physical pixels per logical unit.
    fn pixels_per_point(&self) -> f32;
    fn attach(&mut self, surface: SurfaceId);
    fn detach(&mut self, surface: SurfaceId);
    fn contains(&self, surface: SurfaceId) -> bool;
}

/// Pixel buffer presented into the container.
#[derive(Debug, Clone)]
pub struct Surface {
    pub id: SurfaceId,
    pub size: [u32; 2],
    /// RGBA8, row-major, empty until the first frame is presented
    pub pixels: Vec<u8>,
    /// Bumped on every present so the shell knows when to re-upload
    pub generation: u64,
}

/// Result of one [`ViewportHost::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Loop cancelled or never started; nothing touched.
    Cancelled,
    /// No usable surface yet; clock not advanced.
    Skipped,
    /// Scene animated but the rasterizer produced no pixels.
    Animated(FrameReport),
    /// Scene animated and a new frame presented.
    Presented(FrameReport),
}

/// Physical surface size for a container, honouring `render_scale` and the
/// `max_render_pixels` cap. `None` when the container has no area.
pub fn surface_size(
    logical: Option<[f32; 2]>,
    pixels_per_point: f32,
    config: &ViewportConfig,
) -> Option<[u32; 2]> {
    let [w, h] = logical?;
    let scale = pixels_per_point.max(0.0) * config.render_scale;
    let (mut pw, mut ph) = (w * scale, h * scale);
    if !(pw >= 1.0 && ph >= 1.0) {
        return None;
    }
    let area = pw * ph;
    let cap = config.max_render_pixels as f32;
    if area > cap {
        let k = (cap / area).sqrt();
        pw *= k;
        ph *= k;
    }
    Some([(pw.floor() as u32).max(1), (ph.floor() as u32).max(1)])
}

/// Pick the rasterizer for `config`: the GPU when requested and available,
/// otherwise the CPU raymarcher if fallback is allowed.
pub fn select_rasterizer(config: &ViewportConfig) -> Result<Box<dyn Rasterizer>> {
    if config.renderer == RenderBackend::Gpu {
        match try_gpu() {
            Ok(gpu) => {
                log::info!("rasterizer: {}", gpu.name());
                return Ok(gpu);
            }
            Err(e) if config.allow_cpu_fallback => {
                log::warn!("{e}; falling back to the CPU raymarcher");
            }
            Err(e) => return Err(e),
        }
    }
    log::info!("rasterizer: cpu");
    Ok(Box::new(CpuRaymarcher::new()))
}

#[cfg(feature = "gpu")]
fn try_gpu() -> Result<Box<dyn Rasterizer>> {
    Ok(Box::new(crate::render::gpu_renderer::GpuRaymarcher::new()?))
}

#[cfg(not(feature = "gpu"))]
fn try_gpu() -> Result<Box<dyn Rasterizer>> {
    Err(AvatarError::RenderUnavailable("built without the gpu feature".into()))
}

struct Mounted {
    scene: AvatarScene,
    driver: AnimationDriver,
    camera: Camera,
    lighting: Lighting,
    draw_list: DrawList,
    rasterizer: Box<dyn Rasterizer>,
    surface: Option<Surface>,
    signals: Arc<SignalMailbox>,
    running: bool,
    listening_for_resize: bool,
}

enum HostState {
    Unmounted,
    Mounted(Box<Mounted>),
    TornDown,
}

pub struct ViewportHost {
    config: ViewportConfig,
    particles: ParticleConfig,
    state: HostState,
    frames_presented: u64,
}

impl ViewportHost {
    pub fn new(config: ViewportConfig, particles: ParticleConfig) -> Self {
        Self {
            config,
            particles,
            state: HostState::Unmounted,
            frames_presented: 0,
        }
    }

    /// Build the scene, camera and lights, create the surface if the
    /// container is laid out, and start the frame loop.
    pub fn mount(
        &mut self,
        container: &mut dyn Container,
        signals: Arc<SignalMailbox>,
        rasterizer: Box<dyn Rasterizer>,
    ) -> Result<()> {
        if matches!(self.state, HostState::Mounted(_)) {
            return Err(AvatarError::RenderUnavailable("viewport already mounted".into()));
        }
        let seed = self.particles.seed.unwrap_or_else(rand::random);
        let scene = AvatarScene::new(self.particles.count, seed);
        log::info!(
            "mounting avatar: {} nodes, {} particles, {} rasterizer",
            scene.node_count(),
            scene.particles.len(),
            rasterizer.name()
        );

        let mut mounted = Box::new(Mounted {
            draw_list: DrawList::from_graph(&scene.graph),
            scene,
            driver: AnimationDriver::new(),
            camera: Camera::portrait(),
            lighting: Lighting::studio(),
            rasterizer,
            surface: None,
            signals,
            running: true,
            listening_for_resize: true,
        });
        if !ensure_surface(&mut mounted, container, &self.config) {
            log::debug!("container not laid out yet; surface deferred");
        }
        self.state = HostState::Mounted(mounted);
        Ok(())
    }

    /// Run one frame. See [`FrameOutcome`].
    pub fn frame(&mut self, container: &mut dyn Container) -> FrameOutcome {
        let HostState::Mounted(m) = &mut self.state else {
            return FrameOutcome::Cancelled;
        };
        let m = &mut **m;
        if !m.running {
            return FrameOutcome::Cancelled;
        }
        if !ensure_surface(m, container, &self.config) {
            log::debug!("frame skipped: no surface");
            return FrameOutcome::Skipped;
        }

        let signals = m.signals.snapshot();
        let report = m.driver.step(&mut m.scene, signals);
        m.draw_list.rebuild(&m.scene.graph);

        let Some(surface) = m.surface.as_mut() else {
            return FrameOutcome::Skipped;
        };
        match m.rasterizer.render(&m.draw_list, &m.camera, &m.lighting, surface.size) {
            Some(mut pixels) => {
                splat_points(&mut pixels, surface.size, &m.camera, m.scene.particles.positions());
                surface.pixels = pixels;
                surface.generation += 1;
                self.frames_presented += 1;
                FrameOutcome::Presented(report)
            }
            None => FrameOutcome::Animated(report),
        }
    }

    /// Follow a container size change. Zero sizes keep the old surface.
    pub fn resize(&mut self, container: &mut dyn Container) {
        let HostState::Mounted(m) = &mut self.state else {
            log::debug!("resize ignored: not mounted");
            return;
        };
        let m = &mut **m;
        if !m.listening_for_resize {
            return;
        }
        let measured = container.measure();
        let Some(size) = surface_size(measured, container.pixels_per_point(), &self.config) else {
            log::debug!("resize ignored: container has no area");
            return;
        };
        match m.surface.as_mut() {
            Some(surface) if surface.size == size => {}
            Some(surface) => {
                log::debug!("surface resized {:?} -> {:?}", surface.size, size);
                surface.size = size;
                surface.pixels.clear();
                m.camera.set_aspect(size[0], size[1]);
            }
            None => {
                ensure_surface(m, container, &self.config);
            }
        }
    }

    /// Stop the loop, detach the surface, release the rasterizer and drop
    /// the scene. Safe to call in any state, any number of times.
    pub fn teardown(&mut self, container: &mut dyn Container) {
        let mut m = match std::mem::replace(&mut self.state, HostState::TornDown) {
            HostState::Mounted(m) => m,
            HostState::Unmounted => {
                self.state = HostState::Unmounted;
                log::debug!("teardown: never mounted");
                return;
            }
            HostState::TornDown => {
                log::debug!("teardown: already torn down");
                return;
            }
        };
        m.running = false;
        m.listening_for_resize = false;
        if let Some(surface) = m.surface.take() {
            if container.contains(surface.id) {
                container.detach(surface.id);
            }
        }
        m.rasterizer.release();
        log::info!("avatar torn down after {} frames", m.driver.clock().frames());
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.state, HostState::Mounted(_))
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(self.state, HostState::TornDown)
    }

    /// Whether the shell should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        matches!(&self.state, HostState::Mounted(m) if m.running)
    }

    pub fn surface(&self) -> Option<&Surface> {
        match &self.state {
            HostState::Mounted(m) => m.surface.as_ref(),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.state {
            HostState::Mounted(m) => Some(&m.camera),
            _ => None,
        }
    }

    pub fn scene(&self) -> Option<&AvatarScene> {
        match &self.state {
            HostState::Mounted(m) => Some(&m.scene),
            _ => None,
        }
    }

    pub fn rasterizer_name(&self) -> Option<&'static str> {
        match &self.state {
            HostState::Mounted(m) => Some(m.rasterizer.name()),
            _ => None,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Drop for ViewportHost {
    fn drop(&mut self) {
        if let HostState::Mounted(mut m) = std::mem::replace(&mut self.state, HostState::TornDown) {
            m.running = false;
            m.rasterizer.release();
        }
    }
}

/// Create and attach the surface if it does not exist yet. Returns whether
/// a surface is available.
fn ensure_surface(m: &mut Mounted, container: &mut dyn Container, config: &ViewportConfig) -> bool {
    if m.surface.is_some() {
        return true;
    }
    let Some(size) = surface_size(container.measure(), container.pixels_per_point(), config) else {
        return false;
    };
    let id = SurfaceId::next();
    container.attach(id);
    m.camera.set_aspect(size[0], size[1]);
    log::debug!("surface {:?} created at {:?}", id, size);
    m.surface = Some(Surface {
        id,
        size,
        pixels: Vec::new(),
        generation: 0,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Panel {
        size: Option<[f32; 2]>,
        attached: Vec<SurfaceId>,
    }

    impl Container for Panel {
        fn measure(&self) -> Option<[f32; 2]> {
            self.size
        }
        fn pixels_per_point(&self) -> f32 {
            1.0
        }
        fn attach(&mut self, surface: SurfaceId) {
            self.attached.push(surface);
        }
        fn detach(&mut self, surface: SurfaceId) {
            self.attached.retain(|s| *s != surface);
        }
        fn contains(&self, surface: SurfaceId) -> bool {
            self.attached.contains(&surface)
        }
    }

    fn host() -> ViewportHost {
        ViewportHost::new(
            ViewportConfig {
                renderer: RenderBackend::Cpu,
                ..Default::default()
            },
            ParticleConfig {
                count: 8,
                seed: Some(1),
            },
        )
    }

    fn cpu() -> Box<dyn Rasterizer> {
        Box::new(CpuRaymarcher::new())
    }

    #[test]
    fn surface_size_caps_pixels() {
        let cfg = ViewportConfig {
            max_render_pixels: 10_000,
            ..Default::default()
        };
        let [w, h] = surface_size(Some([400.0, 400.0]), 2.0, &cfg).unwrap();
        assert!(w * h <= 10_000);
        assert_eq!(w, h);
        assert_eq!(surface_size(Some([0.0, 300.0]), 1.0, &cfg), None);
        assert_eq!(surface_size(None, 1.0, &cfg), None);
    }

    #[test]
    fn render_scale_shrinks_surface() {
        let cfg = ViewportConfig {
            render_scale: 0.5,
            ..Default::default()
        };
        assert_eq!(surface_size(Some([200.0, 100.0]), 2.0, &cfg), Some([200, 100]));
    }

    #[test]
    fn zero_size_mount_defers_surface() {
        let mut panel = Panel::default();
        let mut h = host();
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        assert!(h.is_mounted());
        assert!(h.surface().is_none());
        assert_eq!(h.frame(&mut panel), FrameOutcome::Skipped);
        assert!(panel.attached.is_empty());

        panel.size = Some([16.0, 12.0]);
        assert!(matches!(h.frame(&mut panel), FrameOutcome::Presented(_)));
        assert_eq!(panel.attached.len(), 1);
        assert_eq!(h.camera().unwrap().aspect(), 16.0 / 12.0);
    }

    #[test]
    fn skipped_frames_do_not_advance_clock() {
        let mut panel = Panel::default();
        let mut h = host();
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        h.frame(&mut panel);
        h.frame(&mut panel);
        panel.size = Some([8.0, 8.0]);
        match h.frame(&mut panel) {
            FrameOutcome::Presented(r) => assert_eq!(r.frame, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn teardown_is_idempotent_and_safe_unmounted() {
        let mut panel = Panel {
            size: Some([8.0, 8.0]),
            ..Default::default()
        };
        let mut h = host();
        h.teardown(&mut panel);
        assert!(!h.is_torn_down());

        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        h.teardown(&mut panel);
        h.teardown(&mut panel);
        assert!(h.is_torn_down());
        assert!(panel.attached.is_empty());
        assert!(!h.wants_frame());
        assert_eq!(h.frame(&mut panel), FrameOutcome::Cancelled);
    }

    #[test]
    fn teardown_tolerates_already_detached_surface() {
        let mut panel = Panel {
            size: Some([8.0, 8.0]),
            ..Default::default()
        };
        let mut h = host();
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        panel.attached.clear();
        h.teardown(&mut panel);
        assert!(h.is_torn_down());
    }

    #[test]
    fn resize_keeps_surface_on_zero_size() {
        let mut panel = Panel {
            size: Some([40.0, 20.0]),
            ..Default::default()
        };
        let mut h = host();
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        let before = h.surface().unwrap().size;
        panel.size = Some([0.0, 0.0]);
        h.resize(&mut panel);
        assert_eq!(h.surface().unwrap().size, before);
        assert_eq!(h.camera().unwrap().aspect(), 2.0);
    }

    #[test]
    fn remount_after_teardown() {
        let mut panel = Panel {
            size: Some([8.0, 8.0]),
            ..Default::default()
        };
        let mut h = host();
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        assert!(h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).is_err());
        h.teardown(&mut panel);
        h.mount(&mut panel, Arc::new(SignalMailbox::new()), cpu()).unwrap();
        assert!(h.wants_frame());
        assert_eq!(panel.attached.len(), 1);
    }

    #[test]
    fn cpu_renderer_selected_when_requested() {
        let r = select_rasterizer(&ViewportConfig {
            renderer: RenderBackend::Cpu,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(r.name(), "cpu");
    }
}
