//! Editing sessions walked back and forth through the moment log.

use hydronet_core::asset::{LinkAsset, NodeAsset, NodeType};
use hydronet_core::builder::NetworkBuilder;
use hydronet_core::labels::LabelManager;
use hydronet_core::ops::{
    AddLink, AddNode, ConnectCustomers, DeactivateAssets, DeleteAssets, MergeNodes, MoveNode,
    Operation, ReplaceLink, ReplaceNode, ReverseLink,
};
use hydronet_core::{AssetId, CustomerPointId, Editor, HydraulicModel, ModelConfig, Position};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

const J1: AssetId = AssetId::new(1);
const J2: AssetId = AssetId::new(2);
const J3: AssetId = AssetId::new(3);
const P1: AssetId = AssetId::new(4);
const P2: AssetId = AssetId::new(5);
const R1: AssetId = AssetId::new(6);
const P3: AssetId = AssetId::new(7);
const CP1: CustomerPointId = CustomerPointId::new(1);
const CP2: CustomerPointId = CustomerPointId::new(2);

/// A reservoir feeding a line of three junctions, with one connected and one
/// loose customer.
#[fixture]
fn network() -> HydraulicModel {
    NetworkBuilder::new()
        .junction(J1, [0.0, 0.0])
        .junction(J2, [0.001, 0.0])
        .junction(J3, [0.002, 0.0])
        .reservoir(R1, [0.0, 0.001])
        .pipe(P1, J1, J2)
        .pipe(P2, J2, J3)
        .pipe(P3, R1, J1)
        .customer_point(CP1, [0.0002, 0.0001], 1.5, P1, J1)
        .disconnected_customer_point(CP2, [0.0019, 0.0001], 2.0)
        .build()
        .unwrap()
}

fn session() -> Vec<Operation> {
    vec![
        ConnectCustomers::new(P2, [(CP2, [0.0019, 0.0])]).into(),
        AddNode::new(NodeType::Junction, [0.0015, 0.0])
            .splitting(P2)
            .into(),
        MoveNode::new(J2, [0.001, 0.0005])
            .updating_customer_points()
            .into(),
        ReplaceNode::new(J3, NodeType::Tank).into(),
        DeactivateAssets::new([P3]).into(),
        ReverseLink::new(P1).into(),
        DeleteAssets::new([J1]).updating_customer_points().into(),
    ]
}

/// Draws over the network: a branch splitting P2, a pump off J3, P1 cut
/// short by a pipe ending on it, then J2 dropped onto J1.
fn drawing_session(network: &HydraulicModel) -> Vec<Operation> {
    let node = |id| network.node(id).unwrap().clone();
    let junction = |at: Position| NodeAsset::junction(AssetId::NONE, at);
    let pipe = |from: Position, to: Position| {
        LinkAsset::pipe(AssetId::NONE, vec![from, to]).unwrap()
    };
    vec![
        ConnectCustomers::new(P2, [(CP2, [0.0019, 0.0])]).into(),
        AddLink::new(
            pipe([0.0015, 0.0], [0.0015, 0.001]),
            junction([0.0015, 0.0]),
            junction([0.0015, 0.001]),
        )
        .splitting_start(P2)
        .into(),
        AddLink::new(
            LinkAsset::pump(AssetId::NONE, vec![[0.002, 0.0], [0.003, 0.0]]).unwrap(),
            node(J3),
            junction([0.003, 0.0]),
        )
        .into(),
        ReplaceLink {
            end_pipe_id: Some(P1),
            ..ReplaceLink::new(
                P1,
                pipe([0.0, 0.0], [0.0006, 0.0]),
                node(J1),
                junction([0.0006, 0.0]),
            )
        }
        .into(),
        MergeNodes::new(J2, J1).into(),
    ]
}

/// Runs `ops` through an editor, then walks the whole history back and
/// forth checking each state.
fn assert_reversible(network: &HydraulicModel, ops: Vec<Operation>) -> Editor {
    let mut editor = Editor::with_model(network.clone(), ModelConfig::default());
    let mut states = vec![editor.model().clone()];
    for op in ops {
        editor.transact(op).unwrap();
        editor.model().validate().unwrap();
        editor.model().validate_active_topology().unwrap();
        states.push(editor.model().clone());
    }
    assert_eq!(editor.log().len(), states.len() - 1);

    for expected in states.iter().rev().skip(1) {
        assert!(editor.undo());
        assert_eq!(editor.model(), expected);
    }
    assert!(!editor.undo());
    assert_eq!(editor.model(), network);

    for expected in states.iter().skip(1) {
        assert!(editor.redo());
        assert_eq!(editor.model(), expected);
    }
    assert!(!editor.redo());
    editor
}

#[rstest]
fn every_step_can_be_undone(network: HydraulicModel) {
    assert_reversible(&network, session());
}

#[rstest]
fn every_drawing_step_can_be_undone(network: HydraulicModel) {
    let editor = assert_reversible(&network, drawing_session(&network));
    let model = editor.model();

    assert!(model.node(J1).is_none());
    assert!(model.link(P1).is_none() && model.link(P2).is_none());
    assert_eq!(model.curves().count(), 1);

    // CP1 rode the overlap onto the new pipe, then the merge onto J2
    let point = model.customer_point(CP1).unwrap();
    assert_eq!(point.junction_id(), Some(J2));
    let pipe = model.link(point.pipe_id().unwrap()).unwrap();
    assert!(pipe.connects(J2));
    assert_eq!(model.customer_demand(J2), 1.5);
    assert!(model.customer_point(CP2).unwrap().is_connected());
}

#[rstest]
fn replaying_the_log_rebuilds_the_model(network: HydraulicModel) {
    let mut editor = Editor::with_model(network, ModelConfig::default());
    for op in session() {
        editor.transact(op).unwrap();
    }
    let at_end = editor.model().clone();
    editor.undo();
    editor.undo();

    let log = editor.log();
    let snapshot = log.snapshot().unwrap();
    let replayed = HydraulicModel::replay(
        editor.model().units(),
        std::iter::once(&snapshot.moment).chain(log.deltas()),
        &mut LabelManager::new(),
    );
    assert_eq!(&replayed, editor.model());

    // The reverse moments bring the last state back to the pointer
    let mut rewound = at_end;
    let mut labels = LabelManager::new();
    for moment in log.deltas_from(log.len() as isize - 1) {
        rewound.apply(moment, &mut labels);
    }
    assert_eq!(&rewound, editor.model());
}

#[rstest]
fn session_outcome(network: HydraulicModel) {
    let mut editor = Editor::with_model(network, ModelConfig::default());
    for op in session() {
        editor.transact(op).unwrap();
    }
    let model = editor.model();

    // J1 and its pipes are gone, the reservoir is isolated and active again
    assert!(model.node(J1).is_none());
    assert!(model.link(P1).is_none() && model.link(P3).is_none());
    assert!(model.node(R1).unwrap().is_active);
    assert!(!model.customer_point(CP1).unwrap().is_connected());

    // CP2 followed the split and feeds the new junction, the tank taking none
    let point = model.customer_point(CP2).unwrap();
    let junction = point.junction_id().unwrap();
    assert_eq!(model.node(junction).unwrap().label, "J4");
    assert_eq!(model.customer_demand(junction), 2.0);
    assert_eq!(model.total_demand(), 2.0);
}

#[rstest]
fn a_new_edit_discards_the_redo_tail(network: HydraulicModel) {
    let mut editor = Editor::with_model(network.clone(), ModelConfig::default());
    editor.transact(ReverseLink::new(P2)).unwrap();
    editor.transact(DeleteAssets::new([P1])).unwrap();
    editor.undo();
    editor.undo();

    let merged = editor.transact(MergeNodes::new(J1, J2)).unwrap();
    assert_eq!(editor.log().len(), 1);
    assert!(!editor.redo());
    assert_eq!(editor.version(), merged);
    assert_eq!(editor.model().link(P2).unwrap().connections, [J1, J3]);

    editor.undo();
    assert_eq!(editor.model(), &network);
}
