use qlc_circuit::{GridQubit, MeasurementRecordsMap};

fn q(x: i64, y: i64) -> GridQubit {
    GridQubit::new(x, y)
}

#[test]
fn most_recent_measurement_is_minus_one() {
    let records = MeasurementRecordsMap::from_measured_qubits(&[q(0, 0), q(2, 0), q(0, 0)]);
    assert_eq!(records.get(&q(0, 0), -1), Some(-1));
    assert_eq!(records.get(&q(0, 0), -2), Some(-3));
    assert_eq!(records.get(&q(2, 0), -1), Some(-2));
    assert_eq!(records.get(&q(2, 0), -2), None);
    assert_eq!(records.get(&q(4, 0), -1), None);
    assert_eq!(records.get(&q(0, 0), 0), None);
}

#[test]
fn adding_measurements_shifts_older_offsets() {
    let older = MeasurementRecordsMap::from_measured_qubits(&[q(0, 0), q(2, 0)]);
    let newer = MeasurementRecordsMap::from_measured_qubits(&[q(0, 0)]);
    let merged = older.with_added_measurements(&newer);
    assert_eq!(merged.num_measurements(), 3);
    assert_eq!(merged.offsets(&q(0, 0)), &[-3, -1]);
    assert_eq!(merged.offsets(&q(2, 0)), &[-2]);
    assert_eq!(merged.get(&q(0, 0), -2), Some(-3));
}

#[test]
fn empty_records_merge_to_identity() {
    let records = MeasurementRecordsMap::from_measured_qubits(&[q(1, 1)]);
    let merged = records.with_added_measurements(&MeasurementRecordsMap::default());
    assert_eq!(merged, records);
}
