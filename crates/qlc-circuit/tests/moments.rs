use qlc_circuit::{merge_scheduled_circuits, Gate, GridQubit, Instruction, Moment, ScheduledCircuit};
use qlc_core::{QlcError, Shift2D};

fn q(x: i64, y: i64) -> GridQubit {
    GridQubit::new(x, y)
}

#[test]
fn identical_resets_collapse() {
    let moment = Moment::new(vec![
        Instruction::single(Gate::R, q(1, 1)),
        Instruction::single(Gate::R, q(1, 1)),
        Instruction::single(Gate::RX, q(2, 2)),
    ])
    .expect("mergeable resets");
    assert_eq!(moment.instructions().len(), 2);
}

#[test]
fn identical_hadamards_collapse() {
    let moment = Moment::new(vec![
        Instruction::single(Gate::H, q(1, 1)),
        Instruction::single(Gate::H, q(1, 1)),
        Instruction::single(Gate::M, q(0, 0)),
    ])
    .expect("mergeable hadamards");
    assert_eq!(moment.instructions().len(), 2);
    assert!(Moment::new(vec![
        Instruction::single(Gate::H, q(1, 1)),
        Instruction::single(Gate::M, q(1, 1)),
    ])
    .is_err());
}

#[test]
fn colliding_gates_are_rejected() {
    let cx = Instruction::pair(Gate::CX, q(0, 0), q(1, 1)).expect("cx");
    let err = Moment::new(vec![cx, Instruction::single(Gate::M, q(1, 1))])
        .expect_err("qubit (1, 1) used twice");
    match err {
        QlcError::Construction(info) => assert_eq!(info.code, "moment-qubit-collision"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn duplicated_two_qubit_gates_collide() {
    let cx = Instruction::pair(Gate::CX, q(0, 0), q(1, 1)).expect("cx");
    assert!(Moment::new(vec![cx.clone(), cx]).is_err());
}

#[test]
fn instruction_requires_distinct_qubits() {
    assert!(Instruction::pair(Gate::CZ, q(0, 0), q(0, 0)).is_err());
    assert!(Instruction::new(Gate::H, vec![q(0, 0), q(1, 0)]).is_err());
}

#[test]
fn normalized_moment_orders_measurements() {
    let moment = Moment::new(vec![
        Instruction::single(Gate::MX, q(0, 0)),
        Instruction::single(Gate::M, q(4, 0)),
        Instruction::single(Gate::M, q(2, 0)),
    ])
    .expect("moment");
    let measured: Vec<_> = moment.measured_qubits().collect();
    assert_eq!(measured, vec![q(2, 0), q(4, 0), q(0, 0)]);
}

#[test]
fn schedule_must_increase() {
    let err = ScheduledCircuit::new(vec![Moment::empty(), Moment::empty()], vec![1, 1])
        .expect_err("duplicate slot");
    assert_eq!(err.code(), "non-increasing-schedule");
}

#[test]
fn merge_unions_slots_and_keeps_gaps() {
    let first = ScheduledCircuit::new(
        vec![Moment::new(vec![Instruction::single(Gate::R, q(0, 0))]).expect("moment")],
        vec![0],
    )
    .expect("first");
    let second = ScheduledCircuit::new(
        vec![
            Moment::new(vec![Instruction::single(Gate::R, q(2, 0))]).expect("moment"),
            Moment::new(vec![Instruction::single(Gate::M, q(2, 0))]).expect("moment"),
        ],
        vec![0, 3],
    )
    .expect("second");
    let merged = merge_scheduled_circuits(&[first, second]).expect("disjoint qubits");
    assert_eq!(merged.schedule(), &[0, 3]);
    assert_eq!(merged.num_moments(), 4);
    assert_eq!(merged.dense_moments().len(), 4);
    assert_eq!(merged.qubits().len(), 2);
    assert_eq!(merged.measured_qubits(), vec![q(2, 0)]);
}

#[test]
fn shifting_moves_every_qubit() {
    let circuit = ScheduledCircuit::from_moments(vec![Moment::new(vec![Instruction::pair(
        Gate::CX,
        q(0, 0),
        q(1, 1),
    )
    .expect("cx")])
    .expect("moment")]);
    let shifted = circuit.shifted(Shift2D::new(4, 2));
    let qubits: Vec<_> = shifted.qubits().into_iter().collect();
    assert_eq!(qubits, vec![q(4, 2), q(5, 3)]);
}
