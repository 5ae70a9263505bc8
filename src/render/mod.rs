pub mod camera;
pub mod draw_list;
pub mod lights;
pub mod points;
pub mod sdf_renderer;

#[cfg(feature = "gpu")]
pub mod gpu_renderer;

use camera::Camera;
use draw_list::DrawList;
use lights::Lighting;

/// A backend that turns a draw list into RGBA pixels.
pub trait Rasterizer {
    /// Short backend name for logs and the status line.
    fn name(&self) -> &'static str;

    /// Render `list` into a `size[0] × size[1]` RGBA buffer. `None` when the
    /// backend cannot produce a frame right now.
    fn render(
        &mut self,
        list: &DrawList,
        camera: &Camera,
        lighting: &Lighting,
        size: [u32; 2],
    ) -> Option<Vec<u8>>;

    /// Drop GPU or worker resources. Further renders return `None` or fall
    /// back to a cheap path.
    fn release(&mut self);
}

/// Which rasterizer backs the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    #[default]
    Gpu,
    Cpu,
}

impl std::str::FromStr for RenderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown renderer '{other}' (expected gpu or cpu)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!(" GPU ".parse::<RenderBackend>(), Ok(RenderBackend::Gpu));
        assert_eq!("cpu".parse::<RenderBackend>(), Ok(RenderBackend::Cpu));
        assert!("vulkan".parse::<RenderBackend>().is_err());
    }
}
