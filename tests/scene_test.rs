//! Scene files driven through the full annotation lifecycle.

use mapnotate::cli::scene::Scene;
use mapnotate::{AnnotationState, Annotator, Settings};

const CITY_SCENE: &str = r#"
[[entity]]
kind = "marker"
id = "station"
itemtype = "Place"
dom_id = "central-station"
point = "51.514,7.466"

[entity.options]
title = "Central Station"
url = "https://example.org/station"

[[entity]]
kind = "popup"
id = "notice"
itemtype = "CreativeWork"
geoprop = "contentLocation"
point = "51.511,7.462"

[entity.options]
title = "Construction notice"
creator = "City of Dortmund"
published = "2016-12-01"

[[entity]]
kind = "vector"
id = "district"
itemtype = "AdministrativeArea"
vertices = "51.50,7.40 51.53,7.42 51.51,7.49"
"#;

fn annotate_scene(scene: &mut Scene) -> Annotator {
    let mut annotator = Annotator::new(Settings::default());
    for staged in scene.staged.clone() {
        annotator.request(&mut scene.host, &staged.entity, &scene.discovery);
    }
    annotator
}

#[test]
fn given_city_scene_when_annotating_then_every_entity_reaches_annotated() {
    let mut scene = Scene::from_toml(CITY_SCENE).unwrap();
    let annotator = annotate_scene(&mut scene);

    for staged in &scene.staged {
        assert!(
            matches!(
                annotator.state(&staged.entity.id),
                Some(AnnotationState::Annotated(_))
            ),
            "{} should be annotated",
            staged.entity.id
        );
    }
}

#[test]
fn given_city_scene_when_serializing_then_markup_carries_microdata() {
    let mut scene = Scene::from_toml(CITY_SCENE).unwrap();
    annotate_scene(&mut scene);

    let markup = scene.host.to_markup(scene.root);

    // Marker: article container with caller-assigned id and option metas.
    assert!(markup.contains("id=\"central-station\""));
    assert!(markup.contains("itemtype=\"http://schema.org/Place\""));
    assert!(markup.contains("itemprop=\"name\" content=\"Central Station\""));
    assert!(markup.contains("itemprop=\"url\" content=\"https://example.org/station\""));

    // Popup: place wrapper for the non-geo type, Dublin Core metas.
    assert!(markup.contains("itemprop=\"contentLocation\""));
    assert!(markup.contains("name=\"http://purl.org/dc/elements/1.1/creator\" content=\"City of Dortmund\""));
    assert!(markup.contains("name=\"http://purl.org/dc/elements/1.1/date\" content=\"2016-12-01\""));

    // Vector: metadata sub-tree with flattened polygon.
    assert!(markup.contains("<metadata"));
    assert!(markup.contains("itemprop=\"polygon\" content=\"51.5,7.4,51.53,7.42,51.51,7.49\""));
}

#[test]
fn given_scene_with_unknown_kind_when_parsing_then_error_names_the_kind() {
    let result = Scene::from_toml(
        r#"
        [[entity]]
        kind = "hologram"
        itemtype = "Place"
        point = "1,2"
        "#,
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("hologram"));
}

#[test]
fn given_empty_scene_when_annotating_then_host_stays_bare() {
    let mut scene = Scene::from_toml("").unwrap();
    annotate_scene(&mut scene);

    let markup = scene.host.to_markup(scene.root);
    assert!(!markup.contains("itemscope"));
    assert!(markup.contains("map-container"));
}
