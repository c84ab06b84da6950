//! End-to-end: least-squares fit by gradient descent, exercising lazy
//! expressions, matmul, transposed views, reductions, and the pool

use tensr::prelude::*;

/// Fit y = 2x + 1 on noiseless data. With x centered around zero the
/// normal matrix is diagonal and plain gradient descent converges fast.
#[test]
fn gradient_descent_recovers_line() {
    let pool = BufferPool::new();

    let xs: Vec<Elem> = (0..9).map(|i| -1.0 + 0.25 * i as Elem).collect();
    let n = xs.len();

    // Design matrix [x, 1] and exact targets.
    let mut design = Vec::with_capacity(n * 2);
    let mut targets = Vec::with_capacity(n);
    for &x in &xs {
        design.push(x);
        design.push(1.0);
        targets.push(2.0 * x + 1.0);
    }
    let x = Tensor::from_slice(&design, &[n, 2], &pool).unwrap();
    let y = Tensor::from_slice(&targets, &[n, 1], &pool).unwrap();
    let xt = x.transpose(0, 1).unwrap();

    let mut w = Tensor::zeros(&[2, 1], &pool).unwrap();
    let lr = 0.4;
    let scale = 2.0 / n as Elem;

    let mut prev_loss = Elem::INFINITY;
    for step in 0..100 {
        let err = Tensor::from_expr(&(x.mm(&w).unwrap() - &y)).unwrap();
        let grad = Tensor::from_expr(&(xt.mm(&err).unwrap() * scale)).unwrap();
        w = Tensor::from_expr(&(&w - lr * &grad)).unwrap();

        let loss = Tensor::from_expr(&(&err * &err)).unwrap().sum() / n as Elem;
        if step < 10 {
            assert!(loss < prev_loss, "loss must decrease early on");
        }
        prev_loss = loss;
    }

    assert!(prev_loss < 1e-12, "final loss {prev_loss} too large");
    assert!((w.get(&[0, 0]).unwrap() - 2.0).abs() < 1e-6);
    assert!((w.get(&[1, 0]).unwrap() - 1.0).abs() < 1e-6);
}

/// Same fit written with in-place assignment and a persistent gradient
/// buffer, the shape a training loop would actually take. Intermediate
/// buffers cycle through the pool instead of the system allocator.
#[test]
fn training_loop_reuses_pooled_buffers() {
    let pool = BufferPool::new();

    let x = Tensor::from_slice(
        &[-1.0, 1.0, -0.5, 1.0, 0.0, 1.0, 0.5, 1.0, 1.0, 1.0],
        &[5, 2],
        &pool,
    )
    .unwrap();
    let y = Tensor::from_slice(&[-2.0, -0.5, 1.0, 2.5, 4.0], &[5, 1], &pool).unwrap();
    let xt = x.transpose(0, 1).unwrap();

    let mut w = Tensor::zeros(&[2, 1], &pool).unwrap();
    let mut err = Tensor::zeros(&[5, 1], &pool).unwrap();
    let mut grad = Tensor::zeros(&[2, 1], &pool).unwrap();

    for _ in 0..200 {
        err.assign(&(x.mm(&w).unwrap() - &y)).unwrap();
        grad.assign(&(xt.mm(&err).unwrap() * (2.0 / 5.0))).unwrap();
        w = Tensor::from_expr(&(&w - 0.3 * &grad)).unwrap();
    }

    // y = 3x + 1 exactly.
    assert!((w.get(&[0, 0]).unwrap() - 3.0).abs() < 1e-6);
    assert!((w.get(&[1, 0]).unwrap() - 1.0).abs() < 1e-6);

    // Every `w` replaced in the loop went back to the pool; the same
    // size class keeps getting recycled.
    assert!(pool.cached_buffers() > 0);
    drop(w);
    drop(err);
    drop(grad);
    drop(xt);
    drop(x);
    drop(y);
    pool.drain();
    assert!(pool.is_balanced());
}
