pub(crate) use super::*;

#[test]
fn test_from_vec() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.shape(), (2, 3));
    assert!((m.get(0, 0) - 1.0).abs() < 1e-6);
    assert!((m.get(1, 2) - 6.0).abs() < 1e-6);
}

#[test]
fn test_from_vec_error() {
    let result = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0]);
    assert!(result.is_err());
}

#[test]
fn test_from_rows() {
    let m = Matrix::from_rows(2, &[vec![1.0_f32, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]])
        .expect("rows have equal width");
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.row(2), &[1.0, 1.0]);
}

#[test]
fn test_from_rows_ragged_error() {
    let result = Matrix::from_rows(2, &[vec![1.0_f32, 0.0], vec![0.0]]);
    assert!(result.is_err());
}

#[test]
fn test_zeros() {
    let z = Matrix::zeros(2, 3);
    assert_eq!(z.shape(), (2, 3));
    assert!(z.as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_set_and_get() {
    let mut m = Matrix::zeros(2, 2);
    m.set(1, 0, 1.0);
    assert_eq!(m.get(1, 0), 1.0);
    assert_eq!(m.get(0, 1), 0.0);
}

#[test]
fn test_row() {
    let m = Matrix::from_vec(2, 3, vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    let row = m.row(1);
    assert_eq!(row.len(), 3);
    assert!((row[0] - 4.0).abs() < 1e-6);
    assert!((row[2] - 6.0).abs() < 1e-6);
}

#[test]
fn test_rows_iterator() {
    let m = Matrix::from_vec(3, 2, vec![0.0_f32, 1.0, 1.0, 0.0, 1.0, 1.0])
        .expect("test data has correct dimensions");
    let collected: Vec<&[f32]> = m.rows().collect();
    assert_eq!(collected.len(), 3);
    assert_eq!(collected[1], &[1.0, 0.0]);
}

#[test]
fn test_rows_iterator_zero_width() {
    let m: Matrix<f32> = Matrix::from_vec(2, 0, vec![]).expect("empty rows are valid");
    assert_eq!(m.rows().count(), 2);
}

#[test]
fn test_select_rows_with_repeats() {
    let m = Matrix::from_vec(3, 2, vec![0.0_f32, 0.0, 1.0, 1.0, 2.0, 2.0])
        .expect("test data has correct dimensions");
    let picked = m.select_rows(&[2, 0, 2]);
    assert_eq!(picked.shape(), (3, 2));
    assert_eq!(picked.row(0), &[2.0, 2.0]);
    assert_eq!(picked.row(1), &[0.0, 0.0]);
    assert_eq!(picked.row(2), &[2.0, 2.0]);
}

#[test]
fn test_from_row() {
    let m = Matrix::from_row(vec![0.0_f32, 1.0, 1.0]);
    assert_eq!(m.shape(), (1, 3));
    assert_eq!(m.row(0), &[0.0, 1.0, 1.0]);
}
