use super::error::FrameError;

pub struct FrameReader<'a> {
    payload: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), FrameError> {
        if self.payload.len() < needed {
            return Err(FrameError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, FrameError> {
        self.payload.get(offset).copied().ok_or(FrameError::TooShort {
            needed: offset + 1,
            actual: self.payload.len(),
        })
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16, FrameError> {
        let end = offset.checked_add(2).ok_or(FrameError::TooShort {
            needed: usize::MAX,
            actual: self.payload.len(),
        })?;
        let slice = self.payload.get(offset..end).ok_or(FrameError::TooShort {
            needed: end,
            actual: self.payload.len(),
        })?;
        Ok(u16::from_le_bytes([slice[0], slice[1]]))
    }
}
