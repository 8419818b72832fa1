use crate::kmerpump::item::{KmerData, SketchItem};
use crate::kmerpump::pool::BufferPool;
use crate::kmerpump::table::Table;
use crate::{Result, SketchError};
use fxhash::FxHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Tables smaller than this degenerate into near-solid XOR soup; sizing
/// requests are clamped up to it.
pub const MIN_CELLS_PER_TABLE: usize = 100;

/// Default empty-step limit shared by both decode controllers.
pub const DEFAULT_STEP_LIMIT: u32 = 3;

/// Termination control for the coordinator's cross-peeling loop.
///
/// `Simple` stops after a run of empty steps. `Tabu` (the default)
/// additionally tracks the rolling XOR of every emitted item hash and stops
/// the moment that value repeats, the signature of a peeling cycle fed by
/// a false-positive pure cell.
pub enum Controller {
    Simple {
        limit: u32,
        empty_steps: u32,
    },
    Tabu {
        limit: u32,
        empty_steps: u32,
        rolling: u64,
        seen: FxHashSet<u64>,
    },
}

impl Controller {
    pub fn simple(limit: u32) -> Controller {
        Controller::Simple {
            limit,
            empty_steps: 0,
        }
    }

    pub fn tabu(limit: u32) -> Controller {
        let mut seen = FxHashSet::default();
        seen.insert(0);
        Controller::Tabu {
            limit,
            empty_steps: 0,
            rolling: 0,
            seen,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Controller::Simple { empty_steps, .. } => *empty_steps = 0,
            Controller::Tabu {
                empty_steps,
                rolling,
                seen,
                ..
            } => {
                *empty_steps = 0;
                *rolling = 0;
                seen.clear();
                seen.insert(0);
            }
        }
    }

    /// Feed one decode step's emissions; returns whether to keep peeling.
    pub fn observe<T: SketchItem>(&mut self, step: &[T]) -> bool {
        match self {
            Controller::Simple { limit, empty_steps } => {
                if step.is_empty() {
                    *empty_steps += 1;
                    *empty_steps < *limit
                } else {
                    *empty_steps = 0;
                    true
                }
            }
            Controller::Tabu {
                limit,
                empty_steps,
                rolling,
                seen,
            } => {
                if step.is_empty() {
                    *empty_steps += 1;
                    return *empty_steps < *limit;
                }
                *empty_steps = 0;
                for item in step {
                    *rolling ^= item.item_hash();
                }
                // A revisited rolling value means the same multiset of
                // items is circulating between tables.
                seen.insert(*rolling)
            }
        }
    }
}

impl Default for Controller {
    fn default() -> Controller {
        Controller::tabu(DEFAULT_STEP_LIMIT)
    }
}

/// Multi-table invertible sketch: N independent cell tables with distinct
/// indexer seeds and a shared decode controller.
///
/// Every item lands in one cell per table. Encode fans the tables out
/// across rayon workers (each table owns its backing memory, so the writes
/// are disjoint); decode round-robins a single-table peel and re-encodes
/// each emission into the other tables, again in parallel.
pub struct Sketch<T> {
    tables: Vec<Table<T>>,
    current: usize,
    controller: Controller,
    neutral: T,
    pool: BufferPool<T>,
}

impl Sketch<KmerData> {
    /// K-mer sketch with `total_cells` split evenly across `n_tables`.
    /// Lengths below one hash window are rejected: such k-mers hash to 0
    /// and the purity predicate could never fire.
    pub fn kmers(
        n_tables: usize,
        kmer_len: usize,
        total_cells: usize,
        seed: u64,
    ) -> Result<Sketch<KmerData>> {
        if kmer_len < 4 {
            return Err(SketchError::InvalidInput(format!(
                "k-mer sketches need kmer_len >= 4, got {kmer_len}"
            )));
        }
        Sketch::new(
            n_tables,
            total_cells,
            KmerData::neutral(kmer_len)?,
            seed,
            Controller::default(),
        )
    }
}

impl Sketch<u64> {
    /// Hash-only sketch: cells carry plain 64-bit XOR sums.
    pub fn hashes(n_tables: usize, total_cells: usize, seed: u64) -> Result<Sketch<u64>> {
        Sketch::new(n_tables, total_cells, 0u64, seed, Controller::default())
    }
}

impl<T: SketchItem> Sketch<T> {
    pub fn new(
        n_tables: usize,
        total_cells: usize,
        neutral: T,
        seed: u64,
        controller: Controller,
    ) -> Result<Sketch<T>> {
        if n_tables == 0 {
            return Err(SketchError::InvalidInput("sketch needs at least one table".into()));
        }
        let per_table = (total_cells / n_tables).max(MIN_CELLS_PER_TABLE);
        let mut rng = StdRng::seed_from_u64(seed);
        let tables = (0..n_tables)
            .map(|_| Table::new(per_table, neutral.clone(), rng.gen()))
            .collect();
        Ok(Sketch {
            tables,
            current: 0,
            controller,
            neutral,
            pool: BufferPool::new(),
        })
    }

    pub fn with_controller(mut self, controller: Controller) -> Sketch<T> {
        self.controller = controller;
        self
    }

    pub fn n_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn cells_per_table(&self) -> usize {
        self.tables[0].n_cells()
    }

    /// XOR `items` into every table, one rayon worker per table. Encoding
    /// a set already present yields the symmetric difference.
    pub fn encode(&mut self, items: &[T]) -> Result<()> {
        for item in items {
            if !item.shape_matches(&self.neutral) {
                return Err(SketchError::InvalidInput(
                    "item shape does not match this sketch".into(),
                ));
            }
        }
        self.tables
            .par_iter_mut()
            .for_each(|table| table.encode(items));
        Ok(())
    }

    /// Encode only the items whose hash is divisible by `modulus`, the
    /// sampling filter of the staged pipelines.
    pub fn encode_sampled(&mut self, items: &[T], modulus: u64) -> Result<()> {
        if modulus == 0 {
            return Err(SketchError::InvalidInput("zero sampling modulus".into()));
        }
        let mut sampled = self.pool.acquire(items.len() / modulus as usize + 1);
        sampled.extend(
            items
                .iter()
                .filter(|item| item.item_hash() % modulus == 0)
                .cloned(),
        );
        self.encode(&sampled)
    }

    /// One cross-peeling step: peel the current table, XOR the emissions
    /// out of every other table in parallel, advance the round-robin
    /// pointer. Emissions are appended to `out`.
    pub fn decode_step(&mut self, out: &mut Vec<T>) {
        let cur = self.current;
        let before = out.len();
        self.tables[cur].decode(out);
        let emitted = &out[before..];
        if !emitted.is_empty() {
            self.tables
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, table)| {
                    if i != cur {
                        table.encode(emitted);
                    }
                });
        }
        self.current = (cur + 1) % self.tables.len();
    }

    /// Run cross-peeling until the controller stops, returning everything
    /// peeled. An incomplete decode is a short return, not an error;
    /// callers compare against the expected count.
    pub fn decode(&mut self) -> Vec<T> {
        self.controller.reset();
        let mut out = self.pool.acquire(self.cells_per_table());
        let mut step = self.pool.acquire(64);
        loop {
            step.clear();
            self.decode_step(&mut step);
            let proceed = self.controller.observe(&step);
            out.extend(step.iter().cloned());
            if !proceed {
                break;
            }
        }
        out.detach()
    }
}
