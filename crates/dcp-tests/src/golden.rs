//! Golden values for the colour presets.
//!
//! Reference matrices are the published RGB to XYZ matrices for each set of
//! primaries and white point; reference samples are 12-bit DCI code values
//! for full-scale primaries, computed independently of this workspace.

use approx::assert_abs_diff_eq;
use dcp_color::{rgb_to_xyz, ColorConversion};
use dcp_core::Size;
use dcp_math::Mat3;

const MATRIX_EPSILON: f64 = 5e-5;

fn assert_matrix(name: &str, actual: Mat3, expected: [[f64; 3]; 3]) {
    for (row, expected_row) in expected.iter().enumerate() {
        for (col, e) in expected_row.iter().enumerate() {
            let a = actual.m[row][col];
            assert!(
                (a - e).abs() < MATRIX_EPSILON,
                "{} [{}][{}]: {} vs {}",
                name,
                row,
                col,
                a,
                e
            );
        }
    }
}

#[test]
fn test_srgb_matrix() {
    assert_matrix(
        "sRGB",
        ColorConversion::srgb_to_xyz().rgb_to_xyz(),
        [
            [0.412391, 0.357584, 0.180481],
            [0.212639, 0.715169, 0.072192],
            [0.019331, 0.119195, 0.950532],
        ],
    );
}

#[test]
fn test_rec2020_matrix() {
    assert_matrix(
        "Rec. 2020",
        ColorConversion::rec2020_to_xyz().rgb_to_xyz(),
        [
            [0.636958, 0.144617, 0.168881],
            [0.262700, 0.677998, 0.059302],
            [0.000000, 0.028073, 1.060985],
        ],
    );
}

#[test]
fn test_p3_matrix() {
    assert_matrix(
        "P3",
        ColorConversion::p3_to_xyz().rgb_to_xyz(),
        [
            [0.445170, 0.277134, 0.172283],
            [0.209492, 0.721595, 0.068913],
            [0.000000, 0.047061, 0.907355],
        ],
    );
}

#[test]
fn test_inverse_matrices() {
    for (name, conversion) in ColorConversion::presets() {
        let product = conversion.rgb_to_xyz() * conversion.xyz_to_rgb().unwrap();
        for row in 0..3 {
            for col in 0..3 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(product.m[row][col], expected, epsilon = 1e-9);
            }
        }
        assert!(!name.is_empty());
    }
}

/// Full-scale white through the P3 preset lands on the DCI white code
/// values: Y = 4095 * (48 / 52.37)^(1 / 2.6).
#[test]
fn test_p3_white_code_values() {
    let white = [0xffu8; 6];
    let xyz = rgb_to_xyz(&white, Size::new(1, 1), 6, ColorConversion::p3_to_xyz(), None).unwrap();

    let y = 4095.0 * (48.0f64 / 52.37).powf(1.0 / 2.6);
    assert!((xyz.data(1)[0] as f64 - y).abs() <= 1.0, "{} vs {}", xyz.data(1)[0], y);
    // DCI white is (0.314, 0.351): X/Y = 0.8946
    let x = 4095.0 * (48.0f64 / 52.37 * 0.314 / 0.351).powf(1.0 / 2.6);
    assert!((xyz.data(0)[0] as f64 - x).abs() <= 1.0, "{} vs {}", xyz.data(0)[0], x);
}
