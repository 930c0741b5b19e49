use qlc_compile::blocks::Layer;
use qlc_compile::{
    compile_block_graph, BlockGraph, CompileConfig, DetectorEngine, LayerNode, LayerTree,
    PlaquetteLayer, StandardBlockBuilder,
};
use qlc_core::{Basis, BlockPosition3D, QlcError};
use qlc_plaquette::{surface_code_plaquettes, RectangularTemplate, RoundKind};

fn memory_tree(with_observable: bool) -> LayerTree {
    let mut graph = BlockGraph::new();
    let position = BlockPosition3D::new(0, 0, 0);
    graph.add_cube(position, "ZXZ".parse().unwrap()).unwrap();
    let observables = if with_observable {
        vec![graph.cube_readout(position).unwrap()]
    } else {
        Vec::new()
    };
    compile_block_graph(&graph, &StandardBlockBuilder, observables)
        .unwrap()
        .to_layer_tree()
        .unwrap()
}

#[test]
fn plaquette_layers_cannot_be_tree_nodes() {
    let plaquettes =
        surface_code_plaquettes(RectangularTemplate::Qubit, Basis::Z, RoundKind::Memory).unwrap();
    let layer =
        Layer::Plaquette(PlaquetteLayer::new(RectangularTemplate::Qubit, plaquettes).unwrap());
    let err = LayerNode::new(layer).unwrap_err();
    assert!(matches!(err, QlcError::Unsupported(_)));
    assert_eq!(err.code(), "unsupported-tree-layer");
}

#[test]
fn tree_mirrors_the_block_structure() {
    let tree = memory_tree(false);
    let root = tree.root();
    assert_eq!(root.children().len(), 1);
    let slice = &root.children()[0];
    assert_eq!(slice.children().len(), 3);
    assert!(slice.children()[1].is_repeated());
    assert_eq!(slice.children()[1].children().len(), 1);
    assert_eq!(root.leaves().len(), 3);
}

#[test]
fn annotations_must_follow_the_pipeline_order() {
    let mut tree = memory_tree(true);
    let engine = DetectorEngine::in_memory();

    let err = tree.annotate_detectors(1, 2, 2, &engine).unwrap_err();
    assert!(matches!(err, QlcError::Precondition(_)));
    assert_eq!(err.code(), "missing-circuit");

    let err = tree.annotate_observables(1).unwrap_err();
    assert!(matches!(err, QlcError::Precondition(_)));

    tree.annotate_circuits(1).unwrap();
    let err = tree.assemble_circuit(1, false).unwrap_err();
    assert!(matches!(err, QlcError::Precondition(_)));
    assert_eq!(err.code(), "missing-qubit-map");

    tree.annotate_qubit_map(1).unwrap();
    assert!(tree.assemble_circuit(1, false).is_ok());
}

#[test]
fn invalid_lookback_is_a_construction_error() {
    let mut tree = memory_tree(false);
    tree.annotate_circuits(1).unwrap();
    let err = tree
        .annotate_detectors(1, 2, 0, &DetectorEngine::in_memory())
        .unwrap_err();
    assert!(matches!(err, QlcError::Construction(_)));
}

#[test]
fn qubit_map_and_circuit_are_deterministic() {
    let config = CompileConfig::default();
    let engine = DetectorEngine::in_memory();
    let mut first = memory_tree(true);
    let mut second = memory_tree(true);
    let a = first.generate_circuit(1, &config, &engine).unwrap();
    let b = second.generate_circuit(1, &config, &engine).unwrap();
    assert_eq!(a.to_string(), b.to_string());

    let qubits: Vec<_> = first.qubit_map(1).unwrap().iter().collect();
    assert_eq!(qubits, second.qubit_map(1).unwrap().iter().collect::<Vec<_>>());
    assert_eq!(qubits.len(), 17);
    assert!(qubits.windows(2).all(|pair| pair[0].1 < pair[1].1));
}

#[test]
fn regenerating_does_not_duplicate_annotations() {
    let config = CompileConfig::default();
    let engine = DetectorEngine::in_memory();
    let mut tree = memory_tree(true);
    let once = tree.generate_circuit(1, &config, &engine).unwrap();
    let twice = tree.generate_circuit(1, &config, &engine).unwrap();
    assert_eq!(once.to_string(), twice.to_string());
}

#[test]
fn observable_annotations_are_never_empty() {
    let config = CompileConfig::default();
    let engine = DetectorEngine::in_memory();
    let mut tree = memory_tree(true);
    tree.generate_circuit(1, &config, &engine).unwrap();

    let mut total = 0;
    for leaf in tree.root().leaves() {
        let annotations = leaf.annotations(1).unwrap();
        for observable in &annotations.observables {
            assert!(!observable.measurement_offsets().is_empty());
            assert!(observable.measurement_offsets().iter().all(|offset| *offset < 0));
            total += 1;
        }
    }
    assert_eq!(total, 1);
    let last = tree.root().leaves().last().copied().unwrap();
    assert_eq!(last.annotations(1).unwrap().observables[0].measurement_offsets().len(), 3);
}

#[test]
fn polygons_are_emitted_on_request() {
    let config = CompileConfig {
        add_polygons: true,
        ..CompileConfig::default()
    };
    let engine = DetectorEngine::in_memory();
    let mut tree = memory_tree(false);
    let circuit = tree.generate_circuit(1, &config, &engine).unwrap();
    let text = circuit.to_string();
    assert!(text.contains("POLYGON"));
    let first = tree.root().leaves()[0];
    assert_eq!(first.annotations(1).unwrap().polygons.len(), 8);
}

#[test]
fn dictionary_describes_nodes_and_annotations() {
    let config = CompileConfig::default();
    let engine = DetectorEngine::in_memory();
    let mut tree = memory_tree(true);
    tree.generate_circuit(1, &config, &engine).unwrap();
    let dict = tree.to_dict().unwrap();
    assert_eq!(dict["root"]["layer"], "SequencedLayers");
    let slice = &dict["root"]["children"][0];
    assert_eq!(slice["children"][1]["layer"], "RepeatedLayer");
    let leaf = &slice["children"][0];
    assert_eq!(leaf["layer"], "LayoutLayer");
    assert!(leaf["annotations"]["1"]["circuit"].is_string());
    assert_eq!(dict["qubit_maps"]["1"].as_array().unwrap().len(), 17);
    assert_eq!(dict["z_levels"][0], 0);
}
