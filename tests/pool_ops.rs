//! Pool behavior observed through the tensor API

use tensr::prelude::*;

#[test]
fn tensor_lifecycle_balances_the_pool() {
    let pool = BufferPool::new();
    {
        let a = Tensor::zeros(&[16, 16], &pool).unwrap();
        let b = Tensor::ones(&[4], &pool).unwrap();
        assert!(!pool.is_balanced());
        drop(a);
        drop(b);
    }
    assert!(pool.is_balanced());
    assert_eq!(pool.allocated_bytes(), pool.deallocated_bytes());
}

#[test]
fn shared_storage_returns_once() {
    let pool = BufferPool::new();
    let a = Tensor::zeros(&[8], &pool).unwrap();
    let allocated = pool.allocated_bytes();

    // Clones and views share the one buffer.
    let b = a.clone();
    let c = a.view(&[2, 4]).unwrap();
    assert_eq!(pool.allocated_bytes(), allocated);

    drop(a);
    drop(b);
    assert!(!pool.is_balanced());
    drop(c);
    assert!(pool.is_balanced());
}

#[test]
fn freed_buffers_are_recycled() {
    let pool = BufferPool::new();

    let a = Tensor::zeros(&[32], &pool).unwrap();
    drop(a);
    assert_eq!(pool.cached_buffers(), 1);

    // Same size class: served from the cache, zeroed again.
    let b = Tensor::zeros(&[32], &pool).unwrap();
    assert_eq!(pool.cached_buffers(), 0);
    assert!(b.iter().all(|v| v == 0.0));

    // A different size class misses the cache.
    drop(b);
    let _c = Tensor::zeros(&[33], &pool).unwrap();
    assert_eq!(pool.cached_buffers(), 1);
}

#[test]
fn recycled_buffer_not_polluted_by_old_values() {
    let pool = BufferPool::new();
    let mut a = Tensor::zeros(&[4], &pool).unwrap();
    for i in 0..4 {
        a.set(&[i], 1000.0 + i as Elem).unwrap();
    }
    drop(a);

    let b = Tensor::zeros(&[4], &pool).unwrap();
    assert!(b.iter().all(|v| v == 0.0));
}

#[test]
fn materialization_draws_from_operand_pool() {
    let pool = BufferPool::new();
    let a = Tensor::ones(&[4], &pool).unwrap();
    let before = pool.allocated_bytes();

    let out = Tensor::from_expr(&(&a + 1.0)).unwrap();
    assert!(pool.allocated_bytes() > before);
    assert_eq!(out.get(&[0]).unwrap(), 2.0);
}

#[test]
fn counters_only_grow() {
    let pool = BufferPool::new();
    let t = Tensor::zeros(&[8], &pool).unwrap();
    drop(t);
    let after_first = (pool.allocated_bytes(), pool.deallocated_bytes());

    // A cache hit still counts as an allocation and a deallocation.
    let t = Tensor::zeros(&[8], &pool).unwrap();
    assert!(pool.allocated_bytes() > after_first.0);
    drop(t);
    assert!(pool.deallocated_bytes() > after_first.1);
}

#[test]
fn drain_empties_the_cache() {
    let pool = BufferPool::new();
    for _ in 0..3 {
        let _ = Tensor::zeros(&[16], &pool).unwrap();
    }
    drop(Tensor::zeros(&[64], &pool).unwrap());
    assert!(pool.cached_buffers() >= 1);

    pool.drain();
    assert_eq!(pool.cached_buffers(), 0);
    assert!(pool.is_balanced());
}
