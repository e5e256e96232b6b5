//! Flat demo machine
//!
//! A minimal [`MachineState`] implementation so the binary, the shell, and
//! the integration tests have a concrete target: a register file in an
//! `FxHashMap` and one flat little-endian RAM window. There is no
//! instruction decoding — [`StepMachine::step`] only advances `pc` by one
//! word until it walks off the window.

use crate::machine::{MachineState, StepMachine, WORD_BYTES};
use rustc_hash::FxHashMap;

/// Default RAM window base, in the style of common RISC targets.
pub const DEFAULT_RAM_BASE: u64 = 0x8000_0000;

pub struct FlatMachine {
    registers: FxHashMap<String, i64>,
    ram: Vec<u8>,
    ram_base: u64,
}

impl FlatMachine {
    /// A machine with `ram_bytes` of zeroed RAM at [`DEFAULT_RAM_BASE`]
    /// and `pc` pointing at the window start.
    pub fn new(ram_bytes: usize) -> Self {
        Self::with_base(DEFAULT_RAM_BASE, ram_bytes)
    }

    pub fn with_base(ram_base: u64, ram_bytes: usize) -> Self {
        let mut registers = FxHashMap::default();
        registers.insert("pc".to_string(), ram_base as i64);
        Self {
            registers,
            ram: vec![0; ram_bytes],
            ram_base,
        }
    }

    /// Set (or create) a register.
    pub fn set_register(&mut self, name: &str, value: i64) {
        self.registers.insert(name.to_string(), value);
    }

    /// Write `width` bytes little-endian at `addr`. Bytes falling outside
    /// the RAM window are dropped.
    pub fn write_word(&mut self, addr: u64, width: u32, value: u64) {
        for i in 0..width as u64 {
            let Some(offset) = addr
                .checked_add(i)
                .and_then(|byte_addr| byte_addr.checked_sub(self.ram_base))
            else {
                continue;
            };
            if let Some(byte) = self.ram.get_mut(offset as usize) {
                *byte = (value >> (8 * i)) as u8;
            }
        }
    }

    /// Copy an image into RAM starting at the window base, truncating to
    /// the window size.
    pub fn load_image(&mut self, image: &[u8]) {
        let len = image.len().min(self.ram.len());
        self.ram[..len].copy_from_slice(&image[..len]);
    }

    pub fn ram_base(&self) -> u64 {
        self.ram_base
    }

    pub fn ram_len(&self) -> usize {
        self.ram.len()
    }
}

impl MachineState for FlatMachine {
    fn read_register(&self, name: &str) -> Option<i64> {
        self.registers.get(name).copied()
    }

    /// Little-endian read; bytes outside the RAM window read as 0.
    fn read_word(&self, addr: u64, width: u32) -> u64 {
        let mut word = 0u64;
        for i in 0..width as u64 {
            let Some(offset) = addr
                .checked_add(i)
                .and_then(|byte_addr| byte_addr.checked_sub(self.ram_base))
            else {
                continue;
            };
            let byte = self.ram.get(offset as usize).copied().unwrap_or(0);
            word |= (byte as u64) << (8 * i);
        }
        word
    }

    fn registers(&self) -> Vec<(String, i64)> {
        let mut all: Vec<(String, i64)> = self
            .registers
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        all.sort();
        all
    }
}

impl StepMachine for FlatMachine {
    fn step(&mut self) -> bool {
        let pc = self.read_register("pc").unwrap_or(0) as u64;
        if pc >= self.ram_base + self.ram.len() as u64 {
            return false;
        }
        self.set_register("pc", (pc + WORD_BYTES as u64) as i64);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_read_back_little_endian() {
        let mut machine = FlatMachine::new(64);
        machine.write_word(DEFAULT_RAM_BASE + 4, 4, 0x1234_5678);
        assert_eq!(machine.read_word(DEFAULT_RAM_BASE + 4, 4), 0x1234_5678);
        assert_eq!(machine.read_word(DEFAULT_RAM_BASE + 4, 1), 0x78);
        assert_eq!(machine.read_word(DEFAULT_RAM_BASE + 5, 1), 0x56);
    }

    #[test]
    fn test_out_of_window_reads_are_zero() {
        let machine = FlatMachine::new(16);
        assert_eq!(machine.read_word(0, 4), 0);
        assert_eq!(machine.read_word(DEFAULT_RAM_BASE + 16, 4), 0);
    }

    #[test]
    fn test_registers_round_trip() {
        let mut machine = FlatMachine::new(0);
        machine.set_register("a0", -3);
        assert_eq!(machine.read_register("a0"), Some(-3));
        assert_eq!(machine.read_register("a1"), None);
    }

    #[test]
    fn test_step_advances_pc_until_window_end() {
        let mut machine = FlatMachine::new(8);
        assert!(machine.step());
        assert_eq!(
            machine.read_register("pc"),
            Some((DEFAULT_RAM_BASE + 4) as i64)
        );
        assert!(machine.step());
        assert!(!machine.step());
    }

    #[test]
    fn test_image_loads_at_window_base() {
        let mut machine = FlatMachine::new(8);
        machine.load_image(&[0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(machine.read_word(DEFAULT_RAM_BASE, 4), 0xddcc_bbaa);
    }
}
