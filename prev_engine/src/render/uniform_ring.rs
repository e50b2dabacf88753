/// UniformRing: per-draw uniform slots in one buffer.
///
/// The buffer holds `slots_per_frame × frames_in_flight` slots, each padded
/// to the device's uniform offset alignment. Frame `f` owns slots
/// `[f × slots_per_frame, (f + 1) × slots_per_frame)`; a frame can never
/// claim a slot belonging to another frame still in flight.

use bytemuck::Pod;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::{engine_bail, engine_debug};
use super::gpu::{BufferDesc, BufferHandle, BufferUsage, GpuResourceProvider, UniformBinding};

/// One claimed slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub buffer: BufferHandle,
    /// Byte offset of the slot in the ring buffer
    pub offset: u64,
    /// Usable bytes (the uniform struct size)
    pub range: u64,
}

impl UniformSlot {
    pub fn binding(&self) -> UniformBinding {
        UniformBinding {
            buffer: self.buffer,
            offset: self.offset,
            range: self.range,
        }
    }
}

pub struct UniformRing {
    name: String,
    buffer: BufferHandle,
    slot_size: u64,
    stride: u64,
    slots_per_frame: u32,
    frames_in_flight: u32,
    frame: u32,
    claimed: u32,
}

fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl UniformRing {
    /// Allocate a ring of `slots_per_frame × frames_in_flight` slots of `slot_size` bytes
    pub fn new(
        gpu: &mut dyn GpuResourceProvider,
        name: &str,
        slot_size: u64,
        slots_per_frame: u32,
        frames_in_flight: u32,
    ) -> Result<Self> {
        if slot_size == 0 || slots_per_frame == 0 || frames_in_flight == 0 {
            engine_bail!("prev::UniformRing", @InvalidResource,
                "ring '{}' needs non-zero slot size, slots and frames", name);
        }
        let stride = align_up(slot_size, gpu.uniform_alignment());
        let capacity = u64::from(slots_per_frame) * u64::from(frames_in_flight);
        let buffer = gpu.create_buffer(&BufferDesc {
            name: format!("{} uniform ring", name),
            size: stride * capacity,
            usage: BufferUsage::Uniform,
        })?;

        engine_debug!("prev::UniformRing",
            "ring '{}': {} slots x {} frames, stride {} bytes",
            name, slots_per_frame, frames_in_flight, stride);

        Ok(Self {
            name: name.to_string(),
            buffer,
            slot_size,
            stride,
            slots_per_frame,
            frames_in_flight,
            frame: 0,
            claimed: 0,
        })
    }

    /// Ring sized for `T` from the configured draw budget
    pub fn for_uniform<T: Pod>(
        gpu: &mut dyn GpuResourceProvider,
        name: &str,
        config: &EngineConfig,
    ) -> Result<Self> {
        Self::for_passes::<T>(gpu, name, config, 1)
    }

    /// Ring holding the draw budget once for each of `passes` per frame
    pub fn for_passes<T: Pod>(
        gpu: &mut dyn GpuResourceProvider,
        name: &str,
        config: &EngineConfig,
        passes: u32,
    ) -> Result<Self> {
        Self::new(
            gpu,
            name,
            std::mem::size_of::<T>() as u64,
            config.max_draws_per_frame.saturating_mul(passes),
            config.frames_in_flight,
        )
    }

    /// Select the region of `frame_in_flight` and reset its counter
    pub fn begin_frame(&mut self, frame_in_flight: u32) -> Result<()> {
        if frame_in_flight >= self.frames_in_flight {
            engine_bail!("prev::UniformRing", @InvalidResource,
                "ring '{}': frame {} out of range ({} frames in flight)",
                self.name, frame_in_flight, self.frames_in_flight);
        }
        self.frame = frame_in_flight;
        self.claimed = 0;
        Ok(())
    }

    /// Take the next slot of the current frame
    ///
    /// # Errors
    ///
    /// `OutOfMemory` once the per-frame budget is exhausted.
    pub fn claim_next(&mut self) -> Result<UniformSlot> {
        if self.claimed >= self.slots_per_frame {
            engine_bail!("prev::UniformRing", @OutOfMemory,
                "ring '{}' exhausted its {} slots for frame {}",
                self.name, self.slots_per_frame, self.frame);
        }
        let index = u64::from(self.frame) * u64::from(self.slots_per_frame) + u64::from(self.claimed);
        self.claimed += 1;
        Ok(UniformSlot {
            buffer: self.buffer,
            offset: index * self.stride,
            range: self.slot_size,
        })
    }

    /// Copy `value` into `slot`
    pub fn write<T: Pod>(
        &self,
        gpu: &mut dyn GpuResourceProvider,
        slot: &UniformSlot,
        value: &T,
    ) -> Result<()> {
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() as u64 > slot.range {
            engine_bail!("prev::UniformRing", @InvalidResource,
                "ring '{}': {} bytes do not fit a {}-byte slot", self.name, bytes.len(), slot.range);
        }
        gpu.write_buffer(slot.buffer, slot.offset, bytes)
    }

    /// Release the ring buffer
    pub fn destroy(self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        gpu.destroy_buffer(self.buffer)
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn slots_per_frame(&self) -> u32 {
        self.slots_per_frame
    }

    /// Total slot count across all frames in flight
    pub fn capacity(&self) -> u64 {
        u64::from(self.slots_per_frame) * u64::from(self.frames_in_flight)
    }

    /// Slots claimed in the current frame
    pub fn claimed(&self) -> u32 {
        self.claimed
    }
}

#[cfg(test)]
#[path = "uniform_ring_tests.rs"]
mod tests;
