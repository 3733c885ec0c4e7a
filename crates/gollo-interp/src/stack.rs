//! Operand stack

/// Growable stack of signed 64-bit values
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stack {
    values: Vec<i64>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: i64) {
        self.values.push(value);
    }

    /// Pops the top `N` values, returned in push order (the top of the
    /// stack is the last element). Leaves the stack untouched and returns
    /// `None` when fewer than `N` values are available.
    pub fn take<const N: usize>(&mut self) -> Option<[i64; N]> {
        let at = self.values.len().checked_sub(N)?;
        let mut out = [0; N];
        out.copy_from_slice(&self.values[at..]);
        self.values.truncate(at);
        Some(out)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bottom-to-top view of the stack
    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_take_returns_push_order() {
        let mut stack = Stack::new();
        for v in [1, 2, 3] {
            stack.push(v);
        }
        assert_eq!(stack.take::<2>(), Some([2, 3]));
        assert_eq!(stack.as_slice(), &[1]);
    }

    #[test]
    fn test_take_underflow_leaves_stack() {
        let mut stack = Stack::new();
        stack.push(7);
        assert_eq!(stack.take::<2>(), None);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.take::<0>(), Some([]));
    }
}
