//! Sum reductions over dimensions and full tensors

use tensr::prelude::*;

fn arange(shape: &[usize], pool: &BufferPool) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<Elem> = (0..n).map(|i| i as Elem).collect();
    Tensor::from_slice(&data, shape, pool).unwrap()
}

#[test]
fn sum_dim_removes_dimension() {
    let pool = BufferPool::new();
    let t = arange(&[2, 3], &pool); // [[0,1,2],[3,4,5]]

    let cols = t.sum_dim(0).unwrap();
    assert_eq!(cols.shape(), &[3]);
    assert_eq!(cols.get(&[0]).unwrap(), 3.0);
    assert_eq!(cols.get(&[1]).unwrap(), 5.0);
    assert_eq!(cols.get(&[2]).unwrap(), 7.0);

    let rows = t.sum_dim(1).unwrap();
    assert_eq!(rows.shape(), &[2]);
    assert_eq!(rows.get(&[0]).unwrap(), 3.0);
    assert_eq!(rows.get(&[1]).unwrap(), 12.0);
}

#[test]
fn sum_dim_on_vector_keeps_rank_one() {
    let pool = BufferPool::new();
    let v = arange(&[4], &pool);
    let s = v.sum_dim(0).unwrap();
    assert_eq!(s.shape(), &[1]);
    assert_eq!(s.item().unwrap(), 6.0);
}

#[test]
fn sum_dim_middle_dimension() {
    let pool = BufferPool::new();
    let t = arange(&[2, 3, 2], &pool);
    let s = t.sum_dim(1).unwrap();
    assert_eq!(s.shape(), &[2, 2]);
    // s[i][k] = sum_j t[i][j][k]
    assert_eq!(s.get(&[0, 0]).unwrap(), 0.0 + 2.0 + 4.0);
    assert_eq!(s.get(&[1, 1]).unwrap(), 7.0 + 9.0 + 11.0);
}

#[test]
fn sum_dim_invalid_dimension() {
    let pool = BufferPool::new();
    let t = arange(&[2, 3], &pool);
    assert!(matches!(
        t.sum_dim(2),
        Err(Error::InvalidDimension { dim: 2, ndim: 2 })
    ));
}

#[test]
fn full_sum() {
    let pool = BufferPool::new();
    let t = arange(&[3, 4], &pool);
    assert_eq!(t.sum(), 66.0);

    let one = Tensor::full(&[1], 9.5, &pool).unwrap();
    assert_eq!(one.sum(), 9.5);
}

#[test]
fn sum_respects_view_transforms() {
    let pool = BufferPool::new();
    let t = arange(&[2, 3], &pool);

    // Transposition must not change the total.
    assert_eq!(t.transpose(0, 1).unwrap().sum(), t.sum());

    // Summing a slice only covers its elements.
    let row = t.slice(1, 0).unwrap();
    assert_eq!(row.sum(), 3.0 + 4.0 + 5.0);
}

#[test]
fn chained_reduction_to_scalar() {
    let pool = BufferPool::new();
    let t = arange(&[2, 2], &pool);
    let total = t.sum_dim(0).unwrap().sum_dim(0).unwrap();
    assert_eq!(total.shape(), &[1]);
    assert_eq!(total.item().unwrap(), 6.0);
}
