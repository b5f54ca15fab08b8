//! GPU side of the particle system: the shared buffer, the update and render
//! stages, and the manager that sequences them.

pub mod buffer;
pub mod limits;
pub mod manager;
pub mod programs;
pub mod render_stage;
pub mod update_stage;

pub use buffer::SharedParticleBuffer;
pub use limits::{PlatformLimits, dispatch_size};
pub use manager::{FramePhase, ParticleManager};
pub use programs::ParticlePrograms;
pub use render_stage::RenderStage;
pub use update_stage::{MemoryBarrier, UpdateStage};
