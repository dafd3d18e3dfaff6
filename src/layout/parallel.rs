#![allow(unsafe_code)]

use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// A reusable barrier for a fixed party count.
///
/// The generation counter distinguishes release waves, so a thread that
/// wakes spuriously - or re-arrives before the slowest thread of the
/// previous wave has left - can never slip through the wrong release.
pub struct Barrier {
    state: Mutex<BarrierState>,
    cv: Condvar,
}

struct BarrierState {
    size: usize,
    remaining: usize,
    generation: u64,
}

impl Barrier {
    /// Creates a barrier for `size` parties.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "barrier needs at least one party");
        Self {
            state: Mutex::new(BarrierState {
                size,
                remaining: size,
                generation: 0,
            }),
            cv: Condvar::new(),
        }
    }

    /// Blocks until `size` parties have arrived. The last arriver resets
    /// the count, bumps the generation and wakes the others.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        let generation = state.generation;
        state.remaining -= 1;
        if state.remaining == 0 {
            state.generation += 1;
            state.remaining = state.size;
            self.cv.notify_all();
        } else {
            while state.generation == generation {
                self.cv.wait(&mut state);
            }
        }
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Slot {
    job: Option<Job>,
    run: bool,
}

struct PoolState {
    slots: Vec<Slot>,
    end: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    cv: Condvar,
    barrier: Barrier,
}

/// A fixed pool of worker threads with one job slot per thread.
///
/// Worker 0 is the calling thread; `count - 1` OS threads are spawned on
/// construction and suspend on a condition variable between dispatches.
/// [`perform`](Self::perform) raises every run flag, executes slot 0
/// inline and joins the workers on the internal barrier, so all assigned
/// jobs have finished when it returns. Dropping the pool raises the end
/// flag, wakes every worker and joins the threads.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    threads: Vec<JoinHandle<()>>,
    count: usize,
}

impl WorkerPool {
    /// Creates a pool of `count` workers (including the calling thread).
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "worker pool needs at least one thread");
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                slots: (0..count)
                    .map(|_| Slot {
                        job: None,
                        run: false,
                    })
                    .collect(),
                end: false,
            }),
            cv: Condvar::new(),
            barrier: Barrier::new(count),
        });
        let threads = (1..count)
            .map(|index| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || worker_loop(&shared, index))
            })
            .collect();
        debug!(threads = count, "worker pool started");
        Self {
            shared,
            threads,
            count,
        }
    }

    /// Number of workers, the calling thread included.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Assigns a job to a worker's slot without running it.
    fn set_job(&mut self, index: usize, job: Job) {
        self.shared.state.lock().slots[index].job = Some(job);
    }

    /// Runs all assigned jobs and waits for them to complete.
    fn perform(&mut self) {
        let main_job;
        {
            let mut state = self.shared.state.lock();
            main_job = state.slots[0].job.take();
            for slot in &mut state.slots {
                slot.run = true;
            }
        }
        self.shared.cv.notify_all();
        if let Some(job) = main_job {
            job();
        }
        self.shared.barrier.wait();
    }

    /// Runs `func(thread)` on every worker and waits for completion.
    pub fn for_each<F>(&mut self, func: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        let func: &(dyn Fn(usize) + Send + Sync) = &func;
        // SAFETY: perform() joins every worker on the barrier before
        // returning, so the jobs cannot outlive the borrow of `func`.
        let func: &'static (dyn Fn(usize) + Send + Sync) = unsafe { mem::transmute(func) };
        for index in 0..self.count {
            self.set_job(index, Box::new(move || func(index)));
        }
        self.perform();
    }

    /// Runs `func(begin, end)` on every worker, splitting `[0, size)` into
    /// contiguous per-worker chunks.
    pub fn for_each_chunk<F>(&mut self, size: usize, func: F)
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let count = self.count;
        self.for_each(move |thread| {
            let (begin, end) = chunk(thread, count, size);
            func(begin, end);
        });
    }

    /// Runs `func(start, step)` on every worker: worker `i` is meant to
    /// process indices `i, i + N, i + 2N, ...`. Balances naturally when
    /// the work grows with the index, as incrementally growing keyframe
    /// sequences do.
    pub fn for_each_interleaved<F>(&mut self, func: F)
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let count = self.count;
        self.for_each(move |thread| func(thread, count));
    }

    /// The contiguous `[begin, end)` slice of `[0, size)` that `thread`
    /// owns under [`for_each_chunk`](Self::for_each_chunk).
    pub fn chunk(&self, thread: usize, size: usize) -> (usize, usize) {
        chunk(thread, self.count, size)
    }
}

fn chunk(thread: usize, count: usize, size: usize) -> (usize, usize) {
    let per_thread = size.div_ceil(count);
    let begin = (thread * per_thread).min(size);
    let end = (begin + per_thread).min(size);
    (begin, end)
}

fn worker_loop(shared: &PoolShared, index: usize) {
    loop {
        let (job, end) = {
            let mut state = shared.state.lock();
            while !state.slots[index].run {
                shared.cv.wait(&mut state);
            }
            state.slots[index].run = false;
            (state.slots[index].job.take(), state.end)
        };
        if end {
            break;
        }
        if let Some(job) = job {
            job();
        }
        shared.barrier.wait();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.end = true;
            for slot in &mut state.slots {
                slot.run = true;
            }
        }
        self.shared.cv.notify_all();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Mutable view of every `step`-th element of a slice, starting at
/// `start`. Sibling views produced by [`split`](Self::split) cover
/// pairwise-disjoint indices, which is what makes handing one view per
/// worker race-free.
pub(crate) struct StridedMut<'a, T> {
    ptr: *mut T,
    len: usize,
    start: usize,
    step: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: a StridedMut only ever dereferences indices congruent to
// `start` modulo `step`; views from one split never alias each other.
unsafe impl<T: Send> Send for StridedMut<'_, T> {}

impl<'a, T> StridedMut<'a, T> {
    /// Splits `slice` into `step` views, the `i`-th covering indices
    /// `i, i + step, i + 2 * step, ...`.
    pub fn split(slice: &'a mut [T], step: usize) -> Vec<StridedMut<'a, T>> {
        assert!(step > 0, "stride must be positive");
        let ptr = slice.as_mut_ptr();
        let len = slice.len();
        (0..step)
            .map(|start| StridedMut {
                ptr,
                len,
                start,
                step,
                _marker: PhantomData,
            })
            .collect()
    }

    /// Iterates the view's elements together with their index in the
    /// original slice.
    pub fn iter_mut<'s>(&'s mut self) -> impl Iterator<Item = (usize, &'s mut T)> + 's {
        let ptr = self.ptr;
        (self.start..self.len).step_by(self.step).map(move |index| {
            // SAFETY: `index` is in bounds and owned exclusively by this
            // view for the lifetime of the borrow.
            (index, unsafe { &mut *ptr.add(index) })
        })
    }
}
