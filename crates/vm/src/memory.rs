use crate::error::VmError;

/// Flat little-endian guest memory. Code is loaded at address 0 and the
/// stack grows down from the top.
#[derive(Debug, Clone)]
pub struct Memory {
    mem: Vec<u8>,
}

impl Memory {
    pub fn new(memory_size: usize) -> Self {
        Self {
            mem: vec![0u8; memory_size],
        }
    }

    pub fn size(&self) -> usize {
        self.mem.len()
    }

    /// Highest 16-byte aligned address, used as the initial stack pointer.
    pub fn stack_top(&self) -> u32 {
        (self.size() as u32) & !0xf
    }

    pub fn mem_slice(&self, start: usize, end: usize) -> Option<&[u8]> {
        if start > end || end > self.mem.len() {
            return None;
        }
        Some(&self.mem[start..end])
    }

    fn range(&self, addr: u32, len: u32) -> Result<core::ops::Range<usize>, VmError> {
        let start = addr as usize;
        match start.checked_add(len as usize) {
            Some(end) if end <= self.mem.len() => Ok(start..end),
            _ => Err(VmError::MemoryFault { addr, len }),
        }
    }

    pub fn write_code(&mut self, code: &[u8]) -> Result<(), VmError> {
        if code.len() > self.mem.len() {
            return Err(VmError::CodeTooLarge {
                len: code.len(),
                memory: self.mem.len(),
            });
        }
        self.mem[..code.len()].copy_from_slice(code);
        Ok(())
    }

    pub fn load_u8(&self, addr: u32) -> Result<u8, VmError> {
        let r = self.range(addr, 1)?;
        Ok(self.mem[r.start])
    }

    pub fn load_u16(&self, addr: u32) -> Result<u16, VmError> {
        let r = self.range(addr, 2)?;
        Ok(u16::from_le_bytes([self.mem[r.start], self.mem[r.start + 1]]))
    }

    pub fn load_u32(&self, addr: u32) -> Result<u32, VmError> {
        let r = self.range(addr, 4)?;
        let b = &self.mem[r];
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn store_u8(&mut self, addr: u32, value: u8) -> Result<(), VmError> {
        let r = self.range(addr, 1)?;
        self.mem[r.start] = value;
        Ok(())
    }

    pub fn store_u16(&mut self, addr: u32, value: u16) -> Result<(), VmError> {
        let r = self.range(addr, 2)?;
        self.mem[r].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn store_u32(&mut self, addr: u32, value: u32) -> Result<(), VmError> {
        let r = self.range(addr, 4)?;
        self.mem[r].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
