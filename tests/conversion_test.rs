//! Integration tests for model conversions and transmission zeros

use approx::assert_abs_diff_eq;
use lti_rs::convert::{state_to_transfer_polynomials, transfer_to_state_matrices};
use lti_rs::{
    concatenate_state_matrices, state_to_transfer, transfer_to_state, transmission_zeros,
    Sampling, State, Tolerances, Transfer,
};
use ndarray::{arr2, Array2};
use num_complex::Complex64;

fn sorted_re(z: &[Complex64]) -> Vec<f64> {
    let mut v: Vec<f64> = z.iter().map(|z| z.re).collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

// ===== Round trips =====

#[test]
fn test_second_order_round_trip() {
    let g = Transfer::siso(&[1.0, 3.0], &[1.0, 3.0, 2.0]).unwrap();
    let ss = transfer_to_state(&g).unwrap();
    assert_eq!(ss.a(), &arr2(&[[0.0, 1.0], [-2.0, -3.0]]));
    assert_eq!(ss.b(), &arr2(&[[0.0], [1.0]]));
    assert_eq!(ss.c(), &arr2(&[[3.0, 1.0]]));
    assert_eq!(ss.d(), &arr2(&[[0.0]]));

    let back = state_to_transfer(&ss).unwrap();
    let (num, den) = back.entry(0, 0).unwrap();
    assert_eq!(num.len(), 2);
    assert_eq!(den.len(), 3);
    assert_abs_diff_eq!(num[0], 1.0, epsilon = 1e-8);
    assert_abs_diff_eq!(num[1], 3.0, epsilon = 1e-8);
    assert_abs_diff_eq!(den[1], 3.0, epsilon = 1e-10);
    assert_abs_diff_eq!(den[2], 2.0, epsilon = 1e-10);
}

#[test]
fn test_sampling_survives_conversion() {
    let g = Transfer::siso(&[0.5], &[1.0, -0.5])
        .unwrap()
        .with_sampling(Sampling::discrete(0.05).unwrap())
        .unwrap();
    let ss = transfer_to_state(&g).unwrap();
    assert_eq!(ss.sampling(), Sampling::Discrete(0.05));
    assert!(ss.is_stable());
    let back = state_to_transfer(&ss).unwrap();
    assert_eq!(back.sampling_period(), Some(0.05));
}

#[test]
fn test_gain_transfer_becomes_gain_state() {
    let g = Transfer::from_gain_matrix(&arr2(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
    let ss = transfer_to_state(&g).unwrap();
    assert!(ss.is_gain());
    assert_eq!(ss.to_array().unwrap(), arr2(&[[1.0, 2.0], [3.0, 4.0]]));
    let back = state_to_transfer(&ss).unwrap();
    assert!(back.is_gain());
}

#[test]
fn test_tall_system_with_distinct_denominators() {
    // [1/(s+1); (s+3)/((s+1)(s+2))]
    let num = vec![vec![vec![1.0]], vec![vec![1.0, 3.0]]];
    let den = vec![vec![vec![1.0, 1.0]], vec![vec![1.0, 3.0, 2.0]]];
    let (a, b, c, d) = transfer_to_state_matrices(&num, &den, &Tolerances::default()).unwrap();
    assert_eq!(a.dim(), (2, 2));
    assert_eq!(b.dim(), (2, 1));
    assert_eq!(c.dim(), (2, 2));
    assert_eq!(d, Array2::<f64>::zeros((2, 1)));

    let (num_back, den_back) = state_to_transfer_polynomials(&a, &b, &c, &d).unwrap();
    // first entry comes back over the common denominator: (s+2)/((s+1)(s+2))
    assert_abs_diff_eq!(num_back[0][0][0], 1.0, epsilon = 1e-8);
    assert_abs_diff_eq!(num_back[0][0][1], 2.0, epsilon = 1e-8);
    assert_abs_diff_eq!(num_back[1][0][0], 1.0, epsilon = 1e-8);
    assert_abs_diff_eq!(num_back[1][0][1], 3.0, epsilon = 1e-8);
    assert_abs_diff_eq!(den_back[1][0][2], 2.0, epsilon = 1e-8);
}

#[test]
fn test_mimo_with_feedthrough() {
    let g = Transfer::new(
        vec![
            vec![vec![1.0, 2.0], vec![1.0]],
            vec![vec![0.0], vec![3.0, 1.0]],
        ],
        vec![
            vec![vec![1.0, 1.0], vec![1.0, 2.0]],
            vec![vec![1.0], vec![1.0, 1.0]],
        ],
    )
    .unwrap();
    let ss = transfer_to_state(&g).unwrap();
    assert_eq!(ss.d(), &arr2(&[[1.0, 0.0], [0.0, 3.0]]));
    let p = sorted_re(ss.poles());
    assert!(p.iter().all(|&x| x < 0.0));
    assert!(ss.is_stable());
}

#[test]
fn test_repeated_pole_column_shares_states() {
    // [1/(s+1)^3; 1/(s+1)] needs only the triple pole
    let g = Transfer::new(
        vec![vec![vec![1.0]], vec![vec![1.0]]],
        vec![vec![vec![1.0, 3.0, 3.0, 1.0]], vec![vec![1.0, 1.0]]],
    )
    .unwrap();
    let ss = transfer_to_state(&g).unwrap();
    assert_eq!(ss.states(), 3);
    for p in ss.poles() {
        assert_abs_diff_eq!(p.re, -1.0, epsilon = 1e-3);
    }
}

// ===== Transmission zeros =====

#[test]
fn test_zeros_of_nonsquare_system() {
    // single output, two inputs; [1/(s+1), 1/(s+2)] has no transmission zeros
    let z = transmission_zeros(
        &arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
        &Array2::eye(2),
        &arr2(&[[1.0, 1.0]]),
        &arr2(&[[0.0, 0.0]]),
    )
    .unwrap();
    assert!(z.is_empty());
}

#[test]
fn test_zeros_match_transfer_numerator() {
    let g = Transfer::siso(&[2.0, 10.0, 12.0], &[1.0, 6.0, 11.0, 6.0]).unwrap();
    let ss = transfer_to_state(&g).unwrap();
    let z = sorted_re(ss.zeros());
    assert_eq!(z.len(), 2);
    assert_abs_diff_eq!(z[0], -3.0, epsilon = 1e-7);
    assert_abs_diff_eq!(z[1], -2.0, epsilon = 1e-7);
}

#[test]
fn test_concatenated_matrix_layout() {
    let g = State::new(
        arr2(&[[0.0, 1.0], [-2.0, -3.0]]),
        arr2(&[[0.0], [1.0]]),
        arr2(&[[3.0, 1.0]]),
        arr2(&[[0.5]]),
    )
    .unwrap();
    let m = concatenate_state_matrices(&g).unwrap();
    assert_eq!(
        m,
        arr2(&[[0.0, 1.0, 0.0], [-2.0, -3.0, 1.0], [3.0, 1.0, 0.5]])
    );
}
