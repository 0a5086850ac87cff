//! The graphics device as seen by the simulation core.
//!
//! Sampling, parameter building and the per-frame step only ever talk to a
//! [`Device`]. [`crate::gpu::GpuState`] implements it on wgpu; [`MemoryDevice`]
//! keeps buffers in host memory and records every command, which is what the
//! tests and benches run against.
//!
//! Commands issued within one frame execute in issue order, so a dispatch
//! always completes before a later draw reads the same buffer.

use crate::error::GpuError;
use crate::particle::Particle;

/// What a buffer will be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Read-write compute storage that is also drawn as vertices.
    Particles,
    /// Draw-only vertices.
    Vertices,
}

/// Primitive assembly for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
}

/// Constant block slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantSlot {
    /// Read by the compute kernel.
    Simulation,
    /// Read by the vertex stage.
    Camera,
}

/// Buffer creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
}

/// Narrow device interface used by the core.
pub trait Device {
    type Buffer;
    type View;

    /// Creates a buffer initialised with `contents`.
    fn create_buffer(&mut self, desc: &BufferDesc<'_>, contents: &[u8]) -> Result<Self::Buffer, GpuError>;

    /// Creates a view that lets the compute kernel read and write `buffer`.
    fn create_compute_view(&mut self, buffer: &Self::Buffer) -> Result<Self::View, GpuError>;

    /// Size of `buffer` in bytes.
    fn buffer_size(&self, buffer: &Self::Buffer) -> u64;

    /// Largest buffer of this kind [`Device::create_buffer`] accepts, in bytes.
    fn max_buffer_size(&self, usage: BufferUsage) -> u64;

    /// Most particles one particle buffer can hold.
    fn max_particles(&self) -> usize {
        let count = self.max_buffer_size(BufferUsage::Particles) / Particle::STRIDE;
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Uploads a constant block for the rest of the frame.
    fn bind_constants(&mut self, slot: ConstantSlot, data: &[u8]);

    /// Selects the buffer the next dispatch operates on.
    fn bind_compute_view(&mut self, view: &Self::View);

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32);

    /// Selects the vertex buffer and topology for the next draw.
    fn bind_vertices(&mut self, buffer: &Self::Buffer, topology: Topology);

    fn draw(&mut self, vertex_count: u32);
}

/// Host-memory buffer handed out by [`MemoryDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBuffer {
    id: u64,
    usage: BufferUsage,
    bytes: Vec<u8>,
}

impl MemoryBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Compute view handed out by [`MemoryDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryView {
    buffer_id: u64,
}

impl MemoryView {
    pub fn buffer_id(&self) -> u64 {
        self.buffer_id
    }
}

/// A command recorded by [`MemoryDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Constants { slot: ConstantSlot, bytes: Vec<u8> },
    Dispatch { buffer_id: Option<u64>, groups: [u32; 3] },
    Draw { buffer_id: Option<u64>, topology: Topology, vertex_count: u32 },
}

/// In-memory [`Device`] that records what it is asked to do.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    next_id: u64,
    max_buffer_size: Option<u64>,
    bound_view: Option<u64>,
    bound_vertices: Option<(u64, Topology)>,
    commands: Vec<Command>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects buffers larger than `limit` bytes, like a real device would.
    pub fn with_max_buffer_size(mut self, limit: u64) -> Self {
        self.max_buffer_size = Some(limit);
        self
    }

    /// Number of buffers created so far.
    pub fn buffers_created(&self) -> u64 {
        self.next_id
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains recorded commands, as a frame submit would.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl Device for MemoryDevice {
    type Buffer = MemoryBuffer;
    type View = MemoryView;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>, contents: &[u8]) -> Result<MemoryBuffer, GpuError> {
        if contents.is_empty() {
            return Err(GpuError::EmptyBuffer {
                label: desc.label.to_string(),
            });
        }
        let size = contents.len() as u64;
        let limit = self.max_buffer_size(desc.usage);
        if size > limit {
            return Err(GpuError::BufferTooLarge {
                label: desc.label.to_string(),
                size,
                limit,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        Ok(MemoryBuffer {
            id,
            usage: desc.usage,
            bytes: contents.to_vec(),
        })
    }

    fn create_compute_view(&mut self, buffer: &MemoryBuffer) -> Result<MemoryView, GpuError> {
        Ok(MemoryView { buffer_id: buffer.id })
    }

    fn buffer_size(&self, buffer: &MemoryBuffer) -> u64 {
        buffer.bytes.len() as u64
    }

    fn max_buffer_size(&self, _usage: BufferUsage) -> u64 {
        self.max_buffer_size.unwrap_or(u64::MAX)
    }

    fn bind_constants(&mut self, slot: ConstantSlot, data: &[u8]) {
        self.commands.push(Command::Constants {
            slot,
            bytes: data.to_vec(),
        });
    }

    fn bind_compute_view(&mut self, view: &MemoryView) {
        self.bound_view = Some(view.buffer_id);
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(Command::Dispatch {
            buffer_id: self.bound_view,
            groups: [x, y, z],
        });
    }

    fn bind_vertices(&mut self, buffer: &MemoryBuffer, topology: Topology) {
        self.bound_vertices = Some((buffer.id, topology));
    }

    fn draw(&mut self, vertex_count: u32) {
        let (buffer_id, topology) = match self.bound_vertices {
            Some((id, topology)) => (Some(id), topology),
            None => (None, Topology::Points),
        };
        self.commands.push(Command::Draw {
            buffer_id,
            topology,
            vertex_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: BufferDesc<'static> = BufferDesc {
        label: "test",
        usage: BufferUsage::Particles,
    };

    #[test]
    fn test_buffers_get_distinct_ids() {
        let mut device = MemoryDevice::new();
        let a = device.create_buffer(&DESC, &[1, 2, 3]).unwrap();
        let b = device.create_buffer(&DESC, &[4]).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(device.buffer_size(&a), 3);
        assert_eq!(device.buffers_created(), 2);
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let mut device = MemoryDevice::new().with_max_buffer_size(4);
        assert!(matches!(device.create_buffer(&DESC, &[]), Err(GpuError::EmptyBuffer { .. })));
        assert!(matches!(
            device.create_buffer(&DESC, &[0; 5]),
            Err(GpuError::BufferTooLarge { size: 5, limit: 4, .. })
        ));
        assert!(device.create_buffer(&DESC, &[0; 4]).is_ok());
    }

    #[test]
    fn test_max_particles_follows_limit() {
        let device = MemoryDevice::new().with_max_buffer_size(128 * 1024 * 1024);
        assert_eq!(device.max_buffer_size(BufferUsage::Particles), 128 * 1024 * 1024);
        assert_eq!(device.max_particles(), 2 * 1024 * 1024);

        let tiny = MemoryDevice::new().with_max_buffer_size(Particle::STRIDE - 1);
        assert_eq!(tiny.max_particles(), 0);
        assert!(MemoryDevice::new().max_particles() > 4_000_000);
    }

    #[test]
    fn test_records_in_issue_order() {
        let mut device = MemoryDevice::new();
        let buffer = device.create_buffer(&DESC, &[0; 64]).unwrap();
        let view = device.create_compute_view(&buffer).unwrap();

        device.bind_compute_view(&view);
        device.dispatch_compute(2, 1, 1);
        device.bind_vertices(&buffer, Topology::Points);
        device.draw(1);

        let commands = device.take_commands();
        assert_eq!(
            commands,
            vec![
                Command::Dispatch { buffer_id: Some(buffer.id()), groups: [2, 1, 1] },
                Command::Draw { buffer_id: Some(buffer.id()), topology: Topology::Points, vertex_count: 1 },
            ]
        );
        assert!(device.commands().is_empty());
    }
}
