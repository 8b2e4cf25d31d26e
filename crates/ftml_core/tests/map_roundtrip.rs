use std::sync::Once;

use ftml_core::{build_map, MapDocument, MapOptions, MetaValue, Metadata, Topic, TITLE_KEY};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ftml_logging::initialize_for_tests);
}

fn topic_metas(title: &str, audiences: &[&str]) -> Metadata {
    let mut metas = Metadata::with_title(title);
    for audience in audiences {
        metas.append("audience", *audience).unwrap();
    }
    metas
}

fn sample_tree() -> Vec<Topic> {
    vec![
        Topic::new("Index", "index-en.html")
            .with_id("B1_index-en")
            .with_metadata(topic_metas("Index", &["all"])),
        Topic::new("Installation", "install.html")
            .with_metadata(topic_metas("Installation", &["admin", "operator"]))
            .with_sub_topics(vec![
                Topic::new("Linux", "install-linux.html")
                    .with_metadata(topic_metas("Linux", &["admin", "operator", "dev"])),
                Topic::new("Windows", "install-windows.html")
                    .with_metadata(topic_metas("Windows", &[])),
            ]),
    ]
}

fn index_metadata() -> Metadata {
    let mut metas = Metadata::with_title("User Guide");
    metas.append("bundle-id", "B1").unwrap();
    metas.append("ft:lang", "en-GB").unwrap();
    metas.append("product", "Widget").unwrap();
    metas.append("product", "Gadget").unwrap();
    metas
}

#[test]
fn built_map_reads_back_identically() {
    init_logging();
    let built = build_map(&index_metadata(), &sample_tree(), &MapOptions::default()).unwrap();
    let xml = built.document.to_xml().unwrap();
    let parsed = MapDocument::from_xml(&xml).unwrap();

    assert_eq!(parsed, built.document);

    let summary: Vec<_> = parsed
        .flatten()
        .into_iter()
        .map(|n| (n.title.clone(), n.origin_id.clone(), n.href.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Index".to_string(), "B1_index-en".to_string(), "index-en.html".to_string()),
            ("Installation".to_string(), "install".to_string(), "install.html".to_string()),
            ("Linux".to_string(), "install-linux".to_string(), "install-linux.html".to_string()),
            (
                "Windows".to_string(),
                "install-windows".to_string(),
                "install-windows.html".to_string()
            ),
        ]
    );
}

#[test]
fn multi_valued_metas_become_repeated_elements() {
    init_logging();
    let built = build_map(&index_metadata(), &sample_tree(), &MapOptions::default()).unwrap();
    let xml = built.document.to_xml().unwrap();

    assert!(xml.contains(r#"<ft:meta key="audience">admin</ft:meta>"#));
    assert!(xml.contains(r#"<ft:meta key="product">Widget</ft:meta>"#));
    assert!(xml.contains(r#"<ft:meta key="product">Gadget</ft:meta>"#));
    assert!(!xml.contains(r#"key="ft:title""#));

    let parsed = MapDocument::from_xml(&xml).unwrap();
    assert_eq!(
        parsed.metas.get("product"),
        Some(&MetaValue::Multiple(vec!["Widget".into(), "Gadget".into()]))
    );
    assert_eq!(parsed.lang, "en-GB");
}

#[test]
fn custom_exclusions_are_honoured() {
    init_logging();
    let options = MapOptions {
        excluded_metas: vec![TITLE_KEY.to_string(), "audience".to_string()],
        ..MapOptions::default()
    };
    let built = build_map(&index_metadata(), &sample_tree(), &options).unwrap();
    assert!(built
        .document
        .flatten()
        .iter()
        .all(|node| !node.metas.contains_key("audience")));
    let xml = built.document.to_xml().unwrap();
    assert!(!xml.contains(r#"key="audience""#));
}

#[test]
fn serialization_is_deterministic() {
    init_logging();
    let first = build_map(&index_metadata(), &sample_tree(), &MapOptions::default())
        .unwrap()
        .document
        .to_xml()
        .unwrap();
    let second = build_map(&index_metadata(), &sample_tree(), &MapOptions::default())
        .unwrap()
        .document
        .to_xml()
        .unwrap();
    assert_eq!(first, second);
    assert!(first.ends_with("</ft:map>\n"));
}
