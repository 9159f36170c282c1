use std::fs;

use assert_matches::assert_matches;
use serde_json::json;

use poke_search::chain::{EvolutionNode, flatten, parse_chain};
use poke_search::error::SearchError;

fn fixture(name: &str) -> serde_json::Value {
    let raw = fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn linear_chain() {
    let chain = parse_chain(&fixture("evolution_chain_1.json")).unwrap();
    assert_eq!(flatten(&chain), vec!["bulbasaur", "ivysaur", "venusaur"]);
}

#[test]
fn branching_chain_keeps_listed_sibling_order() {
    let chain = parse_chain(&fixture("evolution_chain_67.json")).unwrap();
    let forms = flatten(&chain);

    assert_eq!(forms.len(), 9);
    assert_eq!(forms[0], "eevee");
    assert_eq!(forms[1], "vaporeon");
    assert_eq!(forms[8], "sylveon");
}

#[test]
fn nested_branches_are_pre_order() {
    let resource = json!({
        "chain": {
            "species": { "name": "a" },
            "evolves_to": [
                {
                    "species": { "name": "b" },
                    "evolves_to": [ { "species": { "name": "d" }, "evolves_to": [] } ]
                },
                { "species": { "name": "c" }, "evolves_to": [] }
            ]
        }
    });
    let chain = parse_chain(&resource).unwrap();
    assert_eq!(flatten(&chain), vec!["a", "b", "d", "c"]);
}

#[test]
fn deep_chain_flattens_and_drops_iteratively() {
    let mut node = EvolutionNode::leaf("n0");
    for depth in 1..10_000 {
        node = EvolutionNode::with_children(&format!("n{depth}"), vec![node]);
    }
    let forms = flatten(&node);

    assert_eq!(forms.len(), 10_000);
    assert_eq!(forms.first().map(String::as_str), Some("n9999"));
    assert_eq!(forms.last().map(String::as_str), Some("n0"));
    drop(node);
}

#[test]
fn wide_and_deep_chain_drops_cleanly() {
    let mut node = EvolutionNode::leaf("tail");
    for depth in 0..50_000 {
        node = EvolutionNode::with_children(
            &format!("n{depth}"),
            vec![node, EvolutionNode::leaf(&format!("side{depth}"))],
        );
    }
    assert_eq!(flatten(&node).len(), 100_001);
}

#[test]
fn resource_without_chain_is_rejected() {
    assert_matches!(
        parse_chain(&json!({ "id": 1 })),
        Err(SearchError::Parse(_))
    );
}
