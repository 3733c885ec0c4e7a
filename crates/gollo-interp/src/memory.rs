//! Simulated linear memory holding string literal bytes

/// Initial capacity of the string memory
pub const MEMORY_CAPACITY: usize = 640_000;

/// Append-only byte buffer; offsets handed out never overlap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(MEMORY_CAPACITY),
        }
    }

    /// Appends `data` and returns the offset it was stored at
    pub fn store(&mut self, data: &[u8]) -> usize {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        offset
    }

    /// The `len` bytes starting at `offset`, if all of them are in bounds
    pub fn slice(&self, offset: i64, len: i64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let len = usize::try_from(len).ok()?;
        self.bytes.get(start..start.checked_add(len)?)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
