use thiserror::Error;

pub const BYTES_PER_PIXEL: u32 = 4;

#[derive(Error, Debug)]
pub enum ScreenBufferError {
    #[error("Screen dimensions must be non-zero (got {width}x{height})")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("Screen of {width}x{height} is too large to address")]
    TooLarge { width: u32, height: u32 },
    #[error("Unable to allocate {0} bytes")]
    AllocationFailed(usize),
}

/// A 32-bit per pixel, top-down, row-major pixel buffer.
pub struct ScreenBuffer {
    width: u32,
    height: u32,
    pitch: u32,
    memory: Vec<u8>,
}

impl ScreenBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, ScreenBufferError> {
        if width == 0 || height == 0 {
            return Err(ScreenBufferError::EmptyDimensions { width, height });
        }

        let pitch = width.checked_mul(BYTES_PER_PIXEL)
            .ok_or(ScreenBufferError::TooLarge { width, height })?;
        let memory_count = (pitch as usize).checked_mul(height as usize)
            .ok_or(ScreenBufferError::TooLarge { width, height })?;

        let mut memory = Vec::new();
        memory.try_reserve_exact(memory_count)
            .map_err(|_| ScreenBufferError::AllocationFailed(memory_count))?;
        memory.resize(memory_count, 0);

        Ok(Self { width, height, pitch, memory })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn pitch(&self) -> u32 { self.pitch }
    pub fn bytes_per_pixel(&self) -> u32 { BYTES_PER_PIXEL }

    /// Size of the whole buffer in bytes.
    pub fn memory_count(&self) -> usize { self.memory.len() }

    fn pixel_offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }

        Some(y as usize * self.pitch as usize + x as usize * BYTES_PER_PIXEL as usize)
    }

    /// Pixels outside the buffer are dropped.
    #[inline(always)]
    pub fn draw_pixel(&mut self, x: i64, y: i64, color: u32) {
        if let Some(offset) = self.pixel_offset(x, y) {
            self.memory[offset .. offset + BYTES_PER_PIXEL as usize].copy_from_slice(&color.to_le_bytes());
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: i64, y: i64) -> Option<u32> {
        let offset = self.pixel_offset(x, y)?;
        let bytes = &self.memory[offset .. offset + BYTES_PER_PIXEL as usize];
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
