use crate::jvm::errors::MemoryError;
use std::fmt;

/// Type tag carried by a stack cell
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotType {
    /// Never written, or clobbered by a narrower write over half of a
    /// `Long`/`Double` pair
    Uninitialized,
    Int,
    Short,
    Byte,
    Boolean,
    Char,
    Float,
    Long,
    Double,
    Reference,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SlotType::Uninitialized => "uninitialized",
            SlotType::Int => "int",
            SlotType::Short => "short",
            SlotType::Byte => "byte",
            SlotType::Boolean => "boolean",
            SlotType::Char => "char",
            SlotType::Float => "float",
            SlotType::Long => "long",
            SlotType::Double => "double",
            SlotType::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone)]
struct Cell {
    tag: SlotType,
    bits: u64,
}

const EMPTY: Cell = Cell {
    tag: SlotType::Uninitialized,
    bits: 0,
};

/// Fixed-capacity sequence of typed cells, addressed by slot position
///
/// Reads check the stored tag exactly: no widening, no narrowing, no
/// reinterpretation. `long` and `double` values occupy two adjacent slots
/// and both slots carry the tag, so overwriting either half with a
/// one-slot value makes the pair unreadable as its old type.
pub struct Stack {
    cells: Vec<Cell>,
}

impl Stack {
    pub fn new(capacity: usize) -> Stack {
        Stack {
            cells: vec![EMPTY; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Tag currently stored at a slot
    pub fn slot_type(&self, slot: usize) -> Result<SlotType, MemoryError> {
        self.check_range(slot, 1)?;
        Ok(self.cells[slot].tag)
    }

    fn check_range(&self, slot: usize, width: usize) -> Result<(), MemoryError> {
        if slot + width > self.cells.len() {
            Err(MemoryError::SlotOutOfRange {
                slot,
                capacity: self.cells.len(),
            })
        } else {
            Ok(())
        }
    }

    fn get_one(&self, slot: usize, expected: SlotType) -> Result<u64, MemoryError> {
        self.check_range(slot, 1)?;
        let cell = self.cells[slot];
        if cell.tag != expected {
            Err(MemoryError::TypeMismatch {
                slot,
                expected,
                actual: cell.tag,
            })
        } else {
            Ok(cell.bits)
        }
    }

    fn get_two(&self, slot: usize, expected: SlotType) -> Result<u64, MemoryError> {
        self.check_range(slot, 2)?;
        let bits = self.get_one(slot, expected)?;
        self.get_one(slot + 1, expected)?;
        Ok(bits)
    }

    fn set_one(&mut self, slot: usize, tag: SlotType, bits: u64) -> Result<(), MemoryError> {
        self.check_range(slot, 1)?;
        self.cells[slot] = Cell { tag, bits };
        Ok(())
    }

    fn set_two(&mut self, slot: usize, tag: SlotType, bits: u64) -> Result<(), MemoryError> {
        self.check_range(slot, 2)?;
        self.cells[slot] = Cell { tag, bits };
        self.cells[slot + 1] = Cell { tag, bits };
        Ok(())
    }

    pub fn set_int(&mut self, slot: usize, value: i32) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Int, value as u32 as u64)
    }

    pub fn get_int(&self, slot: usize) -> Result<i32, MemoryError> {
        Ok(self.get_one(slot, SlotType::Int)? as u32 as i32)
    }

    pub fn set_short(&mut self, slot: usize, value: i16) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Short, value as u16 as u64)
    }

    pub fn get_short(&self, slot: usize) -> Result<i16, MemoryError> {
        Ok(self.get_one(slot, SlotType::Short)? as u16 as i16)
    }

    pub fn set_byte(&mut self, slot: usize, value: i8) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Byte, value as u8 as u64)
    }

    pub fn get_byte(&self, slot: usize) -> Result<i8, MemoryError> {
        Ok(self.get_one(slot, SlotType::Byte)? as u8 as i8)
    }

    pub fn set_boolean(&mut self, slot: usize, value: bool) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Boolean, value as u64)
    }

    pub fn get_boolean(&self, slot: usize) -> Result<bool, MemoryError> {
        Ok(self.get_one(slot, SlotType::Boolean)? != 0)
    }

    /// `char` slots hold UTF-16 code units, as `char` does on the JVM
    pub fn set_char(&mut self, slot: usize, value: u16) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Char, value as u64)
    }

    pub fn get_char(&self, slot: usize) -> Result<u16, MemoryError> {
        Ok(self.get_one(slot, SlotType::Char)? as u16)
    }

    pub fn set_float(&mut self, slot: usize, value: f32) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Float, value.to_bits() as u64)
    }

    pub fn get_float(&self, slot: usize) -> Result<f32, MemoryError> {
        Ok(f32::from_bits(self.get_one(slot, SlotType::Float)? as u32))
    }

    pub fn set_long(&mut self, slot: usize, value: i64) -> Result<(), MemoryError> {
        self.set_two(slot, SlotType::Long, value as u64)
    }

    pub fn get_long(&self, slot: usize) -> Result<i64, MemoryError> {
        Ok(self.get_two(slot, SlotType::Long)? as i64)
    }

    pub fn set_double(&mut self, slot: usize, value: f64) -> Result<(), MemoryError> {
        self.set_two(slot, SlotType::Double, value.to_bits())
    }

    pub fn get_double(&self, slot: usize) -> Result<f64, MemoryError> {
        Ok(f64::from_bits(self.get_two(slot, SlotType::Double)?))
    }

    /// References are heap addresses (see [`Heap`](crate::jvm::memory::Heap))
    pub fn set_reference(&mut self, slot: usize, address: u32) -> Result<(), MemoryError> {
        self.set_one(slot, SlotType::Reference, address as u64)
    }

    pub fn get_reference(&self, slot: usize) -> Result<u32, MemoryError> {
        Ok(self.get_one(slot, SlotType::Reference)? as u32)
    }
}
