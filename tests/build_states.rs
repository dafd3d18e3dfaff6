mod common;

use kinema::{DynamicGraph, GraphError};

#[test]
fn build_materializes_every_step() {
    let mut dgraph = DynamicGraph::new();
    let a = dgraph.add_node(0);
    let b = dgraph.add_node(1);
    dgraph.add_edge(2, a, b);
    let c = dgraph.add_node(10);
    let e2 = dgraph.add_edge(5, a, b);
    let d = dgraph.add_node(1);
    dgraph.build().unwrap();

    assert_eq!(dgraph.states().len(), 11);
    assert!(!dgraph.states()[4].edge_exists(e2));
    assert!(dgraph.states()[5].edge_exists(e2));
    assert!(dgraph.states()[6].edge_exists(e2));
    assert!(!dgraph.states()[9].node_exists(c));
    assert!(dgraph.states()[10].node_exists(c));
    assert!(!dgraph.states()[0].node_exists(d));
    assert!(dgraph.states()[1].node_exists(d));
    assert!(dgraph.states()[2].node_exists(d));
    assert!(dgraph.states()[10].node_exists(d));
}

#[test]
fn build_from_adopts_prebuilt_states() {
    let mut dgraph = DynamicGraph::new();
    let a = dgraph.add_node(0);
    let b = dgraph.add_node(1);
    let e = dgraph.add_edge(2, a, b);
    let c = dgraph.add_node(4);
    dgraph.build().unwrap();

    let mut other = DynamicGraph::new();
    // queued modifications are dropped by build_from
    other.add_node(100);
    other.build_from(dgraph.states().to_vec());
    assert_eq!(other.states().len(), 5);
    assert!(other.states()[2].edge_exists(e));
    assert!(!other.states()[3].node_exists(c));
    assert!(other.states()[4].node_exists(c));
    assert_eq!(other.node_count(), dgraph.node_count());
    assert_eq!(other.edge_count(), dgraph.edge_count());
}

#[test]
fn edge_before_nodes_exist_fails() {
    let mut dgraph = DynamicGraph::new();
    let a = dgraph.add_node(3);
    let b = dgraph.add_node(3);
    dgraph.add_edge(2, a, b);
    assert!(matches!(
        dgraph.build(),
        Err(GraphError::InvalidGraph("node not available"))
    ));
}

#[test]
fn removals_of_absent_elements_fail() {
    let build = |mutate: &dyn Fn(&mut DynamicGraph, ScenarioIds)| {
        let mut dgraph = DynamicGraph::new();
        let a = dgraph.add_node(1);
        let b = dgraph.add_node(2);
        let c = dgraph.add_node(3);
        let ab = dgraph.add_edge(4, a, b);
        let bc = dgraph.add_edge(5, b, c);
        let ac = dgraph.add_edge(6, a, c);
        mutate(&mut dgraph, ScenarioIds { a, ab, bc, ac });
        dgraph.build()
    };

    // edge not created yet at that step
    assert!(build(&|g, ids| g.remove_edge(3, ids.ab)).is_err());
    assert!(build(&|g, ids| g.remove_edge(4, ids.bc)).is_err());
    assert!(build(&|g, ids| g.remove_edge(1, ids.ab)).is_err());
    // removing an existing edge later is fine
    assert!(build(&|g, ids| g.remove_edge(7, ids.ac)).is_ok());
    // node removal cascades its edges
    assert!(build(&|g, ids| g.remove_node(7, ids.a)).is_ok());
    // second removal of the same node fails
    assert!(build(&|g, ids| {
        g.remove_node(7, ids.a);
        g.remove_node(8, ids.a);
    })
    .is_err());
}

struct ScenarioIds {
    a: kinema::NodeId,
    ab: kinema::EdgeId,
    bc: kinema::EdgeId,
    ac: kinema::EdgeId,
}

#[test]
fn node_removal_cascades_and_graph_stays_consistent() {
    let mut dgraph = DynamicGraph::new();
    let one = dgraph.add_node(0);
    let two = dgraph.add_node(0);
    let edge = dgraph.add_edge(0, one, two);
    dgraph.add_node(3);
    dgraph.remove_node(1, one);
    dgraph.build().unwrap();

    assert!(!dgraph.states()[1].edge_exists(edge));
    assert!(!dgraph.states()[2].edge_exists(edge));
    // adjacency lookups for the removed node fail
    assert!(dgraph.states()[1].edge_between(one, two).is_err());
    assert!(dgraph.states()[1].edge_between(two, one).is_err());
}

#[test]
fn new_and_old_flags_match_neighbor_states() {
    let dgraph = common::sample_dynamic_graph(24, 7);
    let states = dgraph.states();
    for (i, state) in states.iter().enumerate() {
        for node in state.nodes() {
            let expect_new = i > 0 && !states[i - 1].node_exists(node.id);
            let expect_old = i + 1 < states.len() && !states[i + 1].node_exists(node.id);
            assert_eq!(node.is_new, expect_new, "node {} state {i}", node.id);
            assert_eq!(node.is_old, expect_old, "node {} state {i}", node.id);
        }
        for edge in state.edges() {
            let expect_new = i > 0 && !states[i - 1].edge_exists(edge.id);
            let expect_old = i + 1 < states.len() && !states[i + 1].edge_exists(edge.id);
            assert_eq!(edge.is_new, expect_new, "edge {} state {i}", edge.id);
            assert_eq!(edge.is_old, expect_old, "edge {} state {i}", edge.id);
        }
    }
}

#[test]
fn every_edge_endpoint_exists_in_its_state() {
    let dgraph = common::sample_dynamic_graph(30, 11);
    for state in dgraph.states() {
        for edge in state.edges() {
            assert!(state.node_exists(edge.one));
            assert!(state.node_exists(edge.two));
            assert!(state.edge_between(edge.one, edge.two).unwrap());
            assert!(state.edge_between(edge.two, edge.one).unwrap());
        }
        for (index, node) in state.nodes().iter().enumerate() {
            assert_eq!(state.node_index(node.id).unwrap(), index);
        }
        for (index, edge) in state.edges().iter().enumerate() {
            assert_eq!(state.edge_index(edge.id).unwrap(), index);
        }
    }
}

#[test]
fn flags_at_sequence_ends_are_clear() {
    let mut dgraph = DynamicGraph::new();
    let one = dgraph.add_node(0);
    let two = dgraph.add_node(0);
    dgraph.add_edge(0, one, two);
    dgraph.remove_node(1, one);
    dgraph.remove_node(2, two);
    dgraph.build().unwrap();

    let states = dgraph.states();
    for node in states[states.len() - 1].nodes() {
        assert!(!node.is_old);
    }
    for node in states[0].nodes() {
        assert!(!node.is_new);
    }
    for edge in states[0].edges() {
        assert!(!edge.is_new);
    }
}
