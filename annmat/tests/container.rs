use annmat::{
    mapping, AnnotatedMatrix, AnnotationSource, ColumnData, Masked, Selector, SparseMatrix,
    StorageKind, Value,
};
use annmat_core::{AnnError, Shaped};
use ndarray::{array, Array2};

fn abc() -> AnnotatedMatrix {
    AnnotatedMatrix::new(
        array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
        AnnotationSource::mapping([("smp_names", vec!["A", "B"])]),
        AnnotationSource::mapping([("var_names", vec!["a", "b", "c"])]),
    )
    .unwrap()
}

fn x(m: &AnnotatedMatrix) -> Array2<f64> {
    m.matrix().to_dense()
}

#[test]
fn shape_round_trip_for_every_storage() {
    let dense = AnnotatedMatrix::new(
        Array2::<f64>::zeros((3, 4)),
        AnnotationSource::Absent,
        AnnotationSource::Absent,
    )
    .unwrap();
    assert_eq!(dense.shape(), (3, 4));
    assert_eq!(dense.row_table().len(), 3);
    assert_eq!(dense.col_table().len(), 4);
    assert!(dense.row_table().has_default_names());

    let masked = Masked::unmasked(Array2::<f64>::zeros((2, 5)));
    let masked =
        AnnotatedMatrix::new(masked, AnnotationSource::Absent, AnnotationSource::Absent).unwrap();
    assert_eq!(masked.shape(), (2, 5));
    assert_eq!(masked.storage_kind(), StorageKind::Masked);

    let sparse = AnnotatedMatrix::new(
        SparseMatrix::new(7, 2),
        AnnotationSource::Absent,
        AnnotationSource::Absent,
    )
    .unwrap();
    assert_eq!(sparse.shape(), (7, 2));
    assert_eq!(sparse.col_table().len(), 2);
}

#[test]
fn storage_kind_survives_slicing_and_transpose() {
    let sparse = AnnotatedMatrix::new(
        SparseMatrix::identity(3),
        AnnotationSource::Absent,
        AnnotationSource::Absent,
    )
    .unwrap();
    let sub = sparse.select(vec![0_usize, 2], ..).unwrap();
    assert_eq!(sub.storage_kind(), StorageKind::Sparse);
    assert_eq!(sub.transpose().storage_kind(), StorageKind::Sparse);
    assert_eq!(x(&sub), array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
}

#[test]
fn rank_three_matrix_is_rejected() {
    let cube = ndarray::ArrayD::<f64>::zeros(ndarray::IxDyn(&[2, 2, 2]));
    let r = AnnotatedMatrix::new(cube, AnnotationSource::Absent, AnnotationSource::Absent);
    assert!(matches!(r, Err(AnnError::Shape(_))));
}

#[test]
fn worked_scenario() {
    let m = abc();
    assert_eq!(x(&m.select("A", "a").unwrap()), array![[1.0]]);
    assert_eq!(x(&m.select("A", ..).unwrap()), array![[1.0, 2.0, 3.0]]);
    assert_eq!(x(&m.select(.., vec!["a", "b"]).unwrap()), array![[1.0, 2.0], [4.0, 5.0]]);
    assert_eq!(
        x(&m.select(.., vec![false, true, true]).unwrap()),
        array![[2.0, 3.0], [5.0, 6.0]]
    );
}

#[test]
fn label_ranges_include_stop() {
    let m = abc();
    let sub = m.select(.., "b"..="c").unwrap();
    assert_eq!(sub.col_names(), &ColumnData::from(vec!["b", "c"]));
    let sub = m.select(.., Selector::labels_between("a", "a")).unwrap();
    assert_eq!(sub.shape(), (2, 1));
}

#[test]
fn unknown_labels_fail_on_both_axes() {
    let m = abc();
    for r in [
        m.select(.., "X"),
        m.select("X", ..),
        m.select("A"..="X", ..),
        m.select(.., "a"..="X"),
        m.select(.., vec!["a", "X"]),
    ] {
        assert!(matches!(r, Err(AnnError::LabelNotFound { .. })));
    }
}

#[test]
fn position_and_label_agree() {
    let m = abc();
    for (i, row) in ["A", "B"].iter().enumerate() {
        for (j, col) in ["a", "b", "c"].iter().enumerate() {
            let by_label = m.select(*row, *col).unwrap();
            let by_pos = m.select(i, j).unwrap();
            assert_eq!(by_label.matrix(), by_pos.matrix());
            assert_eq!(by_label.row_names(), by_pos.row_names());
        }
    }
}

#[test]
fn negative_positions_and_steps() {
    let m = abc();
    assert_eq!(x(&m.select(-1_isize, ..).unwrap()), array![[4.0, 5.0, 6.0]]);
    let reversed = Selector::Range { start: None, stop: None, step: Some(-1) };
    let r = m.select(.., reversed).unwrap();
    assert_eq!(r.col_names(), &ColumnData::from(vec!["c", "b", "a"]));
    assert!(matches!(m.select(5_usize, ..), Err(AnnError::Index(_))));
}

#[test]
fn transpose_round_trip() {
    let m = abc().with_extra("iroot", 1_i64);
    let back = m.transpose().transpose();
    assert_eq!(back.matrix(), m.matrix());
    assert_eq!(back.row_names(), m.row_names());
    assert_eq!(back.col_names(), m.col_names());
    assert_eq!(back.get_extra("iroot"), Some(&Value::Int(1)));
}

#[test]
fn append_and_reject_long_column() {
    let mut m = AnnotatedMatrix::new(
        array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
        AnnotationSource::Absent,
        AnnotationSource::Absent,
    )
    .unwrap();
    m.add_row_column("new", vec![1_i64, 2]).unwrap();
    assert_eq!(m.row_table().column("new"), Some(&ColumnData::Integers(vec![1, 2])));
    assert!(m.add_row_column("new2", vec!["a", "b", "c"]).is_err());
    assert_eq!(m.row_keys(), vec!["new"]);
}

#[test]
fn auxiliary_only_table_keeps_labels() {
    let mut m = abc();
    m.set_row_table(AnnotationSource::mapping([("batch", vec![0_i64, 1])])).unwrap();
    assert_eq!(m.row_names(), &ColumnData::from(vec!["A", "B"]));
    assert_eq!(m.row_keys(), vec!["batch"]);

    m.set_col_table(AnnotationSource::mapping([("var_names", vec!["x", "y", "z"])])).unwrap();
    assert_eq!(m.col_names(), &ColumnData::from(vec!["x", "y", "z"]));
}

#[test]
fn combined_mapping_construction() {
    let m = AnnotatedMatrix::from_ddata(mapping([
        ("X", Value::from(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])),
        ("row_names", Value::from(vec!["A", "B"])),
        ("col_names", Value::from(vec!["a", "b", "c"])),
        ("var", Value::Map(mapping([("gene_ids", vec!["g1", "g2", "g3"])]))),
        ("clusters_names", Value::from(vec!["0", "1"])),
    ]))
    .unwrap();
    assert_eq!(m.col_keys(), vec!["gene_ids"]);
    assert!(m.contains("clusters_names"));
    assert_eq!(
        m.get("clusters_names").unwrap().as_extra(),
        Some(&Value::from(vec!["0", "1"]))
    );
}

#[test]
fn subsetting_keeps_annotations_aligned() {
    let mut m = abc();
    m.add_row_column("batch", vec!["b0", "b1"]).unwrap();
    m.add_col_column("kind", vec![1.0, 2.0, 3.0]).unwrap();
    let sub = m.select(vec!["B"], vec![2_usize, 0]).unwrap();
    assert_eq!(sub.row_table().column("batch"), Some(&ColumnData::from(vec!["b1"])));
    assert_eq!(sub.col_table().column("kind"), Some(&ColumnData::Numeric(vec![3.0, 1.0])));
    assert_eq!(x(&sub), array![[6.0, 4.0]]);
}

#[test]
fn masked_entries_survive_indexing() {
    let data = Masked::new(
        array![[1.0, 2.0], [3.0, 4.0]],
        array![[false, true], [false, false]],
    )
    .unwrap();
    let m = AnnotatedMatrix::new(data, AnnotationSource::Absent, AnnotationSource::Absent).unwrap();
    let t = m.transpose();
    assert_eq!(t.matrix().get(1, 0), None);
    assert_eq!(t.matrix().get(0, 1), Some(3.0));
    let sub = m.select(0, ..).unwrap();
    assert_eq!(sub.matrix().get(0, 1), None);
}
