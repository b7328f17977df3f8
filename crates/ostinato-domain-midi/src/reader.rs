#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ReadError {
    #[error("read past end of buffer at offset {offset}")]
    TruncatedBuffer { offset: usize },
    #[error("variable-length integer wider than 32 bits at offset {offset}")]
    VarIntOverflow { offset: usize },
}

/// Sequential big-endian reader over a byte buffer with a movable cursor.
/// Every read is bounds-checked and fails instead of reading out of range.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor. The importer uses this to step back one byte when a
    /// data byte turns up in status position (running status).
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        match self.data.get(self.pos) {
            Some(byte) => {
                self.pos += 1;
                Ok(*byte)
            }
            None => Err(ReadError::TruncatedBuffer { offset: self.pos }),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24(&mut self) -> Result<u32, ReadError> {
        let bytes = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Returns a view into the buffer, not a copy.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = match self.pos.checked_add(len) {
            Some(end) if end <= self.data.len() => end,
            _ => return Err(ReadError::TruncatedBuffer { offset: self.pos }),
        };
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_string(&mut self, len: usize) -> Result<String, ReadError> {
        Ok(String::from_utf8_lossy(self.read_bytes(len)?).into_owned())
    }

    /// SMF variable-length quantity: seven payload bits per byte, high bit
    /// set on every byte but the last.
    pub fn read_var_uint(&mut self) -> Result<u32, ReadError> {
        let start = self.pos;
        let mut value: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if value > u32::MAX >> 7 {
                return Err(ReadError::VarIntOverflow { offset: start });
            }
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
    }
}
