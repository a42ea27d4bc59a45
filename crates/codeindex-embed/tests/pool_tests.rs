use candle_core::{DType, Device, Tensor};
use codeindex_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; the second one is padding.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1i64, 0i64], (1, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();

    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v[0].iter().copied().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn masked_mean_l2_rejects_flat_input() {
    let dev = Device::Cpu;
    let h = Tensor::from_slice(&[1.0f32, 2.0], (1, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1.0f32, 1.0], (1, 2), &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}

#[test]
fn masked_mean_l2_pools_each_row_of_a_batch() {
    let dev = Device::Cpu;
    // [B=2, T=3, H=2]; row 0 keeps two tokens, row 1 keeps one.
    let h = Tensor::from_slice(
        &[1.0f32, 0.0, 3.0, 0.0, 100.0, 100.0, 0.0, 2.0, 50.0, 50.0, 50.0, 50.0],
        (2, 3, 2),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 0, 1, 0, 0], (2, 3), &dev).unwrap();
    let v: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();

    assert_eq!(v.len(), 2);
    for (row, expected) in v.iter().zip([[1.0f32, 0.0], [0.0, 1.0]]) {
        for (a, b) in row.iter().copied().zip(expected) {
            assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
        }
    }
}

#[test]
fn fully_padded_row_pools_to_zero() {
    let dev = Device::Cpu;
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], (2, 1, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0], (2, 1), &dev).unwrap();
    let v: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();
    assert!(v[1].iter().all(|x| *x == 0.0));
    assert!((v[0].iter().map(|x| x * x).sum::<f32>() - 1.0).abs() < 1e-5);
}

#[test]
fn masked_mean_l2_rejects_mismatched_mask() {
    let dev = Device::Cpu;
    let h = Tensor::zeros((2, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::ones((2, 2), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&h, &mask).is_err());
}
