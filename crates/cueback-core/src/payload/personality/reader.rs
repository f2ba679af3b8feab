use super::error::PersonalityError;

pub struct PersonalityReader<'a> {
    payload: &'a [u8],
}

impl<'a> PersonalityReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, PersonalityError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(PersonalityError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16, PersonalityError> {
        let bytes = self.read_array::<2>(offset)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32, PersonalityError> {
        let bytes = self.read_array::<4>(offset)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], PersonalityError> {
        let end = offset.checked_add(N).ok_or(PersonalityError::TooShort {
            needed: usize::MAX,
            actual: self.payload.len(),
        })?;
        let slice = self
            .payload
            .get(offset..end)
            .ok_or(PersonalityError::TooShort {
                needed: end,
                actual: self.payload.len(),
            })?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        Ok(bytes)
    }
}
