//! Two-bank flat storage with O(1) role swap.

/// A pair of equally sized `f64` banks.
///
/// One bank is current (read by accessors and sent in halo exchange), the
/// other is the write target of the next update. [`swap`](Self::swap)
/// flips the roles without copying.
///
/// ```text
/// bank_a  ←── current while b_is_current == false
/// bank_b  ←── current while b_is_current == true
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DoubleBuffer {
    bank_a: Vec<f64>,
    bank_b: Vec<f64>,
    b_is_current: bool,
}

impl DoubleBuffer {
    /// Two banks of `len` cells, both filled with `fill`.
    pub fn new(len: usize, fill: f64) -> Self {
        Self {
            bank_a: vec![fill; len],
            bank_b: vec![fill; len],
            b_is_current: false,
        }
    }

    /// Cells per bank.
    pub fn len(&self) -> usize {
        self.bank_a.len()
    }

    /// Whether the banks hold no cells.
    pub fn is_empty(&self) -> bool {
        self.bank_a.is_empty()
    }

    /// The current bank.
    pub fn current(&self) -> &[f64] {
        if self.b_is_current {
            &self.bank_b
        } else {
            &self.bank_a
        }
    }

    /// The current bank, mutably.
    pub fn current_mut(&mut self) -> &mut [f64] {
        if self.b_is_current {
            &mut self.bank_b
        } else {
            &mut self.bank_a
        }
    }

    /// The other bank, mutably.
    pub fn other_mut(&mut self) -> &mut [f64] {
        if self.b_is_current {
            &mut self.bank_a
        } else {
            &mut self.bank_b
        }
    }

    /// Read the current bank while writing the other.
    pub fn read_write(&mut self) -> (&[f64], &mut [f64]) {
        if self.b_is_current {
            (&self.bank_b, &mut self.bank_a)
        } else {
            (&self.bank_a, &mut self.bank_b)
        }
    }

    /// Both banks, current first.
    pub fn banks_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        if self.b_is_current {
            (&mut self.bank_b, &mut self.bank_a)
        } else {
            (&mut self.bank_a, &mut self.bank_b)
        }
    }

    /// Make the other bank current.
    pub fn swap(&mut self) {
        self.b_is_current = !self.b_is_current;
    }

    /// Overwrite every cell of both banks.
    pub fn fill_both(&mut self, value: f64) {
        self.bank_a.fill(value);
        self.bank_b.fill(value);
    }
}
