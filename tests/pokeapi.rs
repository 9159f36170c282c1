use std::fs;

use poke_search::pokeapi::{evolution_chain_id, extract_display, parse_species_page};

fn fixture(name: &str) -> serde_json::Value {
    let raw = fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn species_points_at_its_chain() {
    let species = fixture("species_133.json");
    assert_eq!(evolution_chain_id(&species).unwrap(), "67");
}

#[test]
fn pokemon_display_fields() {
    let pokemon = fixture("pokemon_133.json");
    let display = extract_display(&pokemon).unwrap();

    assert_eq!(display.name, "eevee");
    assert_eq!(
        display.image_url.as_deref(),
        Some("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/133.png")
    );
}

#[test]
fn species_page_members_in_order() {
    let page = parse_species_page(&fixture("species_page.json")).unwrap();
    let names = page
        .results
        .iter()
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(page.count, Some(1025));
    assert_eq!(names, vec!["bulbasaur", "ivysaur", "venusaur", "charmander"]);
    assert_eq!(
        page.results[3].url,
        "https://pokeapi.co/api/v2/pokemon-species/4/"
    );
}
