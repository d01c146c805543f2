/// Sparse accumulator for a single output row.
///
/// Touched columns are threaded through `non_zeros` as a linked list starting
/// at `head`, so draining costs time proportional to the touched columns only.
pub(crate) struct RowAccumulator {
    sums: Vec<f64>,
    non_zeros: Vec<isize>,
    head: isize,
}

const NONE: f64 = 0.0;
const NOT_OCCUPIED: isize = -1;
const NO_HEAD: isize = -2;

impl RowAccumulator {

    pub(crate) fn new(num_columns: usize) -> Self {
        RowAccumulator {
            sums: vec![NONE; num_columns],
            non_zeros: vec![NOT_OCCUPIED; num_columns],
            head: NO_HEAD,
        }
    }

    pub(crate) fn add_to(&mut self, column: usize, value: f64) {
        self.sums[column] += value;

        if self.non_zeros[column] == NOT_OCCUPIED {
            self.non_zeros[column] = self.head;
            self.head = column as isize;
        }
    }

    /// Returns the accumulated `(column, sum)` pairs sorted by column and
    /// resets the accumulator. `excluded_column` and zero sums are dropped.
    pub(crate) fn drain_sorted(&mut self, excluded_column: usize) -> Vec<(usize, f64)> {
        let mut entries = Vec::new();

        while self.head != NO_HEAD {
            let column = self.head as usize;
            let sum = self.sums[column];

            if column != excluded_column && sum != NONE {
                entries.push((column, sum));
            }

            self.head = self.non_zeros[column];
            self.sums[column] = NONE;
            self.non_zeros[column] = NOT_OCCUPIED;
        }
        self.head = NO_HEAD;

        entries.sort_unstable_by_key(|&(column, _)| column);
        entries
    }
}
