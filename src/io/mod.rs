// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

/// Planar output buffer: one `Vec<f32>` per channel, all sized up front.
///
/// `frames` may shrink and grow within the allocated capacity between
/// callbacks, so a host with a variable callback size reuses one block
/// without reallocating.
#[derive(Debug, Clone, Default)]
pub struct AudioBlock {
    buffers: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBlock {
    /// Allocate `num_channels` buffers of `max_frames` zeroed samples.
    pub fn new(num_channels: usize, max_frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; max_frames]; num_channels],
            frames: max_frames,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.buffers.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn capacity(&self) -> usize {
        self.buffers.first().map_or(0, Vec::len)
    }

    /// Set the number of frames in use, clamped to the allocated capacity.
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.capacity());
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.buffers[index][..self.frames]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        let frames = self.frames;
        &mut self.buffers[index][..frames]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        let frames = self.frames;
        self.buffers.iter().map(move |b| &b[..frames])
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        let frames = self.frames;
        self.buffers.iter_mut().map(move |b| &mut b[..frames])
    }

    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.fill(0.0);
        }
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        self.channels()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }
}
