use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

/// Pool of reusable `Vec<T>` buffers for the variable-size item
/// collections that decode and pump churn through.
///
/// `acquire` hands out a cleared buffer with at least the hinted capacity;
/// the guard returns the storage on drop, so release happens exactly once
/// on every path, including unwinding.
pub struct BufferPool<T> {
    free: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T> BufferPool<T> {
    pub fn new() -> BufferPool<T> {
        BufferPool {
            free: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn acquire(&self, capacity_hint: usize) -> PooledBuf<T> {
        let mut buf = self
            .free
            .lock()
            .expect("buffer pool lock poisoned")
            .pop()
            .unwrap_or_default();
        if buf.capacity() < capacity_hint {
            buf.reserve(capacity_hint - buf.len());
        }
        PooledBuf {
            buf: Some(buf),
            free: Arc::clone(&self.free),
        }
    }
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        BufferPool::new()
    }
}

impl<T> Clone for BufferPool<T> {
    fn clone(&self) -> Self {
        BufferPool {
            free: Arc::clone(&self.free),
        }
    }
}

/// RAII guard around a pooled `Vec<T>`.
pub struct PooledBuf<T> {
    buf: Option<Vec<T>>,
    free: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T> PooledBuf<T> {
    /// Keep the contents and detach the buffer from the pool.
    pub fn detach(mut self) -> Vec<T> {
        self.buf.take().expect("buffer present until drop")
    }
}

impl<T> Deref for PooledBuf<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        self.buf.as_ref().expect("buffer present until drop")
    }
}

impl<T> DerefMut for PooledBuf<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        self.buf.as_mut().expect("buffer present until drop")
    }
}

impl<T> Drop for PooledBuf<T> {
    fn drop(&mut self) {
        if let Some(mut buf) = self.buf.take() {
            buf.clear();
            if let Ok(mut free) = self.free.lock() {
                free.push(buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_storage_is_reused() {
        let pool: BufferPool<u64> = BufferPool::new();
        let mut buf = pool.acquire(64);
        buf.extend([1, 2, 3]);
        let cap = buf.capacity();
        drop(buf);

        let again = pool.acquire(8);
        assert!(again.is_empty());
        assert!(again.capacity() >= cap.min(64));
    }
}
