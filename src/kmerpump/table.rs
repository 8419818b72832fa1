use crate::kmerpump::item::SketchItem;
use crate::kmerpump::tabulation::ValueHasher;
use fxhash::FxHashSet;
use std::mem;

/// One table of an invertible sketch: a fixed array of XOR-aggregating
/// cells, an indexer hash, and the set of cell indexes touched since the
/// last decode pass.
///
/// A cell is *pure* when it aggregates exactly one inserted item. That is
/// approximated by a self-consistency check: the aggregated hash, pushed
/// back through the indexer, must land on the cell's own index. A cell
/// whose XOR happens to look like such an item is a false positive; the
/// coordinator's tabu controller catches the livelocks this can cause, and
/// downstream consumers filter the spurious items.
pub struct Table<T> {
    cells: Vec<T>,
    touched: FxHashSet<u32>,
    indexer: ValueHasher,
    neutral: T,
}

impl<T: SketchItem> Table<T> {
    /// `n_cells` cells, all set to `neutral`. The backing array never
    /// resizes after this point.
    pub fn new(n_cells: usize, neutral: T, indexer_seed: u64) -> Table<T> {
        Table {
            cells: vec![neutral.clone(); n_cells],
            touched: FxHashSet::default(),
            indexer: ValueHasher::new(indexer_seed),
            neutral,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    fn index_of(&self, item_hash: u64) -> usize {
        (self.indexer.hash(item_hash) % self.cells.len() as u64) as usize
    }

    /// XOR every item into its cell and mark the cell modified. Encoding an
    /// item already present removes it again; this is what turns a second
    /// `encode` into a symmetric difference.
    pub fn encode(&mut self, items: &[T]) {
        for item in items {
            let idx = self.index_of(item.item_hash());
            self.cells[idx].xor_with(item);
            self.touched.insert(idx as u32);
        }
    }

    /// One peeling pass: emit and reset every currently-pure touched cell,
    /// then forget the touched set. Iterative peeling across tables lives
    /// in the coordinator.
    pub fn decode(&mut self, out: &mut Vec<T>) {
        let mut touched = mem::take(&mut self.touched);
        for &idx in touched.iter() {
            let idx = idx as usize;
            let hash = self.cells[idx].item_hash();
            if hash != 0 && self.index_of(hash) == idx {
                out.push(mem::replace(&mut self.cells[idx], self.neutral.clone()));
            }
        }
        // Hand the allocation back so later encodes reuse its capacity.
        touched.clear();
        self.touched = touched;
    }
}
