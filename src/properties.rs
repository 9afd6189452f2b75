//! Mapping of declarative semantic options onto vocabulary terms.
//!
//! Schema.org `Thing` properties are emitted as `itemprop` meta nodes;
//! bibliographic options map onto the legacy Dublin Core namespaces and are
//! emitted as `name` meta nodes carrying the full term URI. Each recognized
//! option maps to exactly one term, in a fixed order; absent options emit
//! nothing; unrecognized keys in the input are ignored.

use serde::Deserialize;

use crate::builder::ElementBuilder;
use crate::config::Settings;

/// Declarative semantic option set of one entity. All fields optional,
/// string/URI valued. Unknown keys in source maps are skipped by serde.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SemanticOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "sameAs")]
    pub same_as: Option<String>,
    #[serde(rename = "alternateName")]
    pub alternate_name: Option<String>,
    pub image: Option<String>,
    pub creator: Option<String>,
    pub contributor: Option<String>,
    pub publisher: Option<String>,
    pub published: Option<String>,
    pub identifier: Option<String>,
    pub rights: Option<String>,
    #[serde(rename = "derivedFrom")]
    pub derived_from: Option<String>,
    pub format: Option<String>,
    pub language: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// Translate an option set into a flat, ordered list of meta nodes.
///
/// Order is fixed: Schema.org terms first (name, description, url, sameAs,
/// alternateName, image), then Dublin Core element terms (creator,
/// contributor, publisher, date, identifier, rights, source, format,
/// language), then Dublin Core terms (created, modified).
pub fn map_options(options: &SemanticOptions, settings: &Settings) -> Vec<ElementBuilder> {
    let mut nodes = Vec::new();

    let schema_terms = [
        ("name", &options.title),
        ("description", &options.description),
        ("url", &options.url),
        ("sameAs", &options.same_as),
        ("alternateName", &options.alternate_name),
        ("image", &options.image),
    ];
    for (term, value) in schema_terms {
        if let Some(value) = value {
            nodes.push(meta_itemprop(term, value));
        }
    }

    // Legacy namespace: Title, Description, Subject, Type and Coverage are
    // covered by Schema.org terms above; sameAs duplicates identifier.
    let dc_element_terms = [
        ("creator", &options.creator),
        ("contributor", &options.contributor),
        ("publisher", &options.publisher),
        ("date", &options.published),
        ("identifier", &options.identifier),
        ("rights", &options.rights),
        ("source", &options.derived_from),
        ("format", &options.format),
        ("language", &options.language),
    ];
    for (term, value) in dc_element_terms {
        if let Some(value) = value {
            nodes.push(meta_name(
                &format!("{}{}", settings.dc_elements_base, term),
                value,
            ));
        }
    }

    let dc_terms = [("created", &options.created), ("modified", &options.modified)];
    for (term, value) in dc_terms {
        if let Some(value) = value {
            nodes.push(meta_name(
                &format!("{}{}", settings.dc_terms_base, term),
                value,
            ));
        }
    }

    nodes
}

fn meta_itemprop(term: &str, content: &str) -> ElementBuilder {
    ElementBuilder::element("meta", &[("itemprop", term), ("content", content)])
}

fn meta_name(term_uri: &str, content: &str) -> ElementBuilder {
    ElementBuilder::element("meta", &[("name", term_uri), ("content", content)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_attr(builder: &ElementBuilder) -> (String, String) {
        let node = builder.build();
        node.attrs[0].clone()
    }

    #[test]
    fn given_empty_options_when_mapping_then_no_nodes_emitted() {
        let nodes = map_options(&SemanticOptions::default(), &Settings::default());
        assert!(nodes.is_empty());
    }

    #[test]
    fn given_schema_and_dc_options_when_mapping_then_fixed_order_and_terms() {
        let options = SemanticOptions {
            title: Some("City of Dortmund".into()),
            creator: Some("Malte".into()),
            modified: Some("2017-01-09".into()),
            ..Default::default()
        };
        let nodes = map_options(&options, &Settings::default());
        assert_eq!(nodes.len(), 3);

        assert_eq!(
            first_attr(&nodes[0]),
            ("itemprop".to_string(), "name".to_string())
        );
        assert_eq!(
            first_attr(&nodes[1]),
            (
                "name".to_string(),
                "http://purl.org/dc/elements/1.1/creator".to_string()
            )
        );
        assert_eq!(
            first_attr(&nodes[2]),
            (
                "name".to_string(),
                "http://purl.org/dc/terms/modified".to_string()
            )
        );
    }

    #[test]
    fn given_published_and_derived_from_when_mapping_then_legacy_terms_apply() {
        let options = SemanticOptions {
            published: Some("2016-12-01".into()),
            derived_from: Some("https://example.org/source".into()),
            ..Default::default()
        };
        let nodes = map_options(&options, &Settings::default());
        assert_eq!(
            first_attr(&nodes[0]).1,
            "http://purl.org/dc/elements/1.1/date"
        );
        assert_eq!(
            first_attr(&nodes[1]).1,
            "http://purl.org/dc/elements/1.1/source"
        );
    }

    #[test]
    fn given_unknown_keys_when_deserializing_then_they_are_ignored() {
        let parsed: SemanticOptions = toml::from_str(
            r#"
            title = "A"
            frobnicate = "ignored"
            color = "blue"
            "#,
        )
        .unwrap();
        let with_unknowns = map_options(&parsed, &Settings::default());

        let plain = map_options(
            &SemanticOptions {
                title: Some("A".into()),
                ..Default::default()
            },
            &Settings::default(),
        );

        // Unknown keys leave count and order unaffected.
        assert_eq!(with_unknowns.len(), plain.len());
        assert_eq!(with_unknowns[0].build(), plain[0].build());
    }
}
