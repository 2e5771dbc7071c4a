/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Flat byte-addressed memory with typed little-endian accesses.

use crate::consts::MEM_SIZE;
use crate::errors::ExecError;

#[derive(Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            bytes: vec![0u8; MEM_SIZE],
        }
    }

    pub fn reset(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Read-only snapshot of the full memory array.
    pub fn snapshot(&self) -> &[u8] {
        &self.bytes
    }

    fn check_bounds(&self, addr: u64, size: u32) -> Result<usize, ExecError> {
        let addr = addr as usize;
        let end = addr
            .checked_add(size as usize)
            .ok_or(ExecError::MemoryOutOfBounds(addr as u64))?;
        if end > self.bytes.len() {
            return Err(ExecError::MemoryOutOfBounds(addr as u64));
        }
        Ok(addr)
    }

    pub fn read_bytes(&self, addr: u64, size: u32) -> Result<&[u8], ExecError> {
        let start = self.check_bounds(addr, size)?;
        Ok(&self.bytes[start..start + size as usize])
    }

    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) -> Result<(), ExecError> {
        let start = self.check_bounds(addr, data.len() as u32)?;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn read_u8(&self, addr: u64) -> Result<u8, ExecError> {
        Ok(self.read_bytes(addr, 1)?[0])
    }

    pub fn read_u16(&self, addr: u64) -> Result<u16, ExecError> {
        let b = self.read_bytes(addr, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&self, addr: u64) -> Result<u32, ExecError> {
        let b = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&self, addr: u64) -> Result<u64, ExecError> {
        let b = self.read_bytes(addr, 8)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> Result<(), ExecError> {
        self.write_bytes(addr, &[value])
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> Result<(), ExecError> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> Result<(), ExecError> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), ExecError> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    /// Reads a zero/sign-agnostic little-endian value of `size` bytes (1/2/4/8)
    /// zero-extended into a `u64`, as used by the load dispatcher.
    pub fn read_sized(&self, addr: u64, size: u32) -> Result<u64, ExecError> {
        Ok(match size {
            1 => self.read_u8(addr)? as u64,
            2 => self.read_u16(addr)? as u64,
            4 => self.read_u32(addr)? as u64,
            8 => self.read_u64(addr)?,
            _ => unreachable!("access size is always 1, 2, 4 or 8"),
        })
    }

    /// Writes the low `size` bytes of `value`, little-endian.
    pub fn write_sized(&mut self, addr: u64, value: u64, size: u32) -> Result<(), ExecError> {
        match size {
            1 => self.write_u8(addr, value as u8),
            2 => self.write_u16(addr, value as u16),
            4 => self.write_u32(addr, value as u32),
            8 => self.write_u64(addr, value),
            _ => unreachable!("access size is always 1, 2, 4 or 8"),
        }
    }

    /// Loads `words` starting at address 0, little-endian.
    pub fn load_program(&mut self, words: &[u32]) -> Result<(), ExecError> {
        let total = (words.len() as u64) * 4;
        if total as usize > self.bytes.len() {
            return Err(ExecError::MemoryOutOfBounds(total));
        }
        for (i, word) in words.iter().enumerate() {
            let addr = (i as u64) * 4;
            self.write_u32(addr, *word)?;
        }
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_every_byte() {
        let mut mem = Memory::new();
        mem.write_u32(0, 0xDEADBEEF).unwrap();
        mem.reset();
        assert!(mem.snapshot().iter().all(|&b| b == 0));
    }

    #[test]
    fn little_endian_round_trip_for_all_widths() {
        let mut mem = Memory::new();
        mem.write_u8(0, 0xAB).unwrap();
        assert_eq!(mem.read_u8(0).unwrap(), 0xAB);

        mem.write_u16(8, 0x1234).unwrap();
        assert_eq!(mem.read_u16(8).unwrap(), 0x1234);
        assert_eq!(mem.snapshot()[8], 0x34);
        assert_eq!(mem.snapshot()[9], 0x12);

        mem.write_u32(16, 0xDEADBEEF).unwrap();
        assert_eq!(mem.read_u32(16).unwrap(), 0xDEADBEEF);

        mem.write_u64(24, 0x0123456789ABCDEF).unwrap();
        assert_eq!(mem.read_u64(24).unwrap(), 0x0123456789ABCDEF);
    }

    #[test]
    fn out_of_bounds_access_fails_and_leaves_memory_unchanged() {
        let mut mem = Memory::new();
        let before = mem.snapshot().to_vec();
        let addr = (MEM_SIZE - 2) as u64;
        let result = mem.write_u32(addr, 0xFFFFFFFF);
        assert_eq!(result, Err(ExecError::MemoryOutOfBounds(addr)));
        assert_eq!(mem.snapshot(), before.as_slice());
    }

    #[test]
    fn load_program_too_large_fails() {
        let mut mem = Memory::new();
        let words = vec![0u32; MEM_SIZE / 4 + 1];
        assert!(mem.load_program(&words).is_err());
    }
}
