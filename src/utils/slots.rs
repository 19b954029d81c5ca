use alloc::vec::Vec;
use core::mem;
use fixedbitset::FixedBitSet;

/// Positional storage for the values delivered into a group's slots.
///
/// Positions are handed out in reservation order, and a bitset tracks which
/// positions have been written so far.
#[derive(Debug)]
pub(crate) struct SlotTable<T> {
    reserved: usize,
    outstanding: usize,
    values: Vec<Option<T>>,
    filled: FixedBitSet,
}

impl<T> SlotTable<T> {
    /// Create a new table with room for `capacity` slots.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            reserved: 0,
            outstanding: 0,
            values: Vec::with_capacity(capacity),
            filled: FixedBitSet::with_capacity(capacity),
        }
    }

    /// Reserve the next position.
    ///
    /// Returns the index of the reserved position.
    pub(crate) fn reserve(&mut self) -> usize {
        let index = self.values.len();
        self.values.push(None);
        self.filled.grow(index + 1);
        self.reserved += 1;
        self.outstanding += 1;
        index
    }

    /// Write a value into a reserved position.
    ///
    /// Returns `true` if this was the last outstanding position.
    pub(crate) fn fill(&mut self, index: usize, value: T) -> bool {
        assert!(index < self.values.len(), "slot {index} was never reserved");
        assert!(!self.filled[index], "slot {index} filled more than once");
        self.filled.insert(index);
        self.values[index] = Some(value);
        self.outstanding -= 1;
        self.outstanding == 0
    }

    /// The number of reserved positions which have not been written yet.
    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// The number of positions reserved so far.
    ///
    /// Taking or clearing the values does not reset this count.
    pub(crate) fn len(&self) -> usize {
        self.reserved
    }

    /// Take all values out of the table, in reservation order.
    ///
    /// Must only be called once every reserved position has been written.
    pub(crate) fn take(&mut self) -> Vec<T> {
        debug_assert_eq!(self.outstanding, 0, "all slots should have been filled");
        self.filled.clear();
        mem::take(&mut self.values).into_iter().flatten().collect()
    }

    /// Drop every value written so far.
    pub(crate) fn clear(&mut self) {
        self.outstanding = 0;
        self.filled.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod test {
    use super::SlotTable;

    #[test]
    fn fill_in_any_order() {
        let mut table = SlotTable::with_capacity(0);
        let a = table.reserve();
        let b = table.reserve();
        assert_eq!(table.outstanding(), 2);

        assert!(!table.fill(b, "b"));
        assert!(table.fill(a, "a"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.take(), ["a", "b"]);
    }

    #[test]
    #[should_panic(expected = "filled more than once")]
    fn double_fill_panics() {
        let mut table = SlotTable::with_capacity(2);
        let a = table.reserve();
        table.reserve();
        table.fill(a, 1);
        table.fill(a, 2);
    }

    #[test]
    fn clear_drops_partial_values() {
        let mut table = SlotTable::with_capacity(2);
        let a = table.reserve();
        table.reserve();
        table.fill(a, 1);
        table.clear();
        assert_eq!(table.outstanding(), 0);
        assert_eq!(table.len(), 2);
    }
}
