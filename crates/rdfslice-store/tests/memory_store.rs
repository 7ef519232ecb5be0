use rdfslice_store::{Literal, MemoryStore, Node, Object, RdfFormat, TripleStore};
use std::io::Write;

const GRAPH: &str = "http://ex.org/dataset/import";

const RECORDS_N3: &str = r#"
@prefix ex: <http://ex.org/> .
@prefix wsf: <http://purl.org/ontology/wsf#> .

ex:alpha a ex:Person ;
    ex:name "Alpha"@en ;
    wsf:crudAction "update" .

ex:beta a ex:Person ;
    ex:name "Beta" .

ex:gamma a ex:Organization .

ex:loose ex:name "not a record" .
"#;

#[test]
fn loads_an_n3_file_and_serves_windows() {
    let mut file = tempfile::Builder::new().suffix(".n3").tempfile().unwrap();
    file.write_all(RECORDS_N3.as_bytes()).unwrap();

    let store = MemoryStore::new();
    let format = RdfFormat::from_path(file.path());
    assert_eq!(format, RdfFormat::Turtle);
    store.load_file(file.path(), GRAPH, format).unwrap();

    assert_eq!(store.count_typed_subjects(GRAPH).unwrap(), 3);

    let first = store.window_rows(GRAPH, 0, 2).unwrap();
    let second = store.window_rows(GRAPH, 2, 2).unwrap();

    let subjects = |rows: &[rdfslice_store::TripleRow]| {
        let mut s: Vec<Node> = rows.iter().map(|r| r.subject.clone()).collect();
        s.dedup();
        s
    };
    let first_subjects = subjects(&first);
    let second_subjects = subjects(&second);
    assert_eq!(first_subjects.len(), 2);
    assert_eq!(second_subjects.len(), 1);
    assert!(first_subjects
        .iter()
        .all(|s| !second_subjects.contains(s)));

    let alpha = Node::iri("http://ex.org/alpha");
    assert!(first
        .iter()
        .chain(second.iter())
        .any(|r| r.subject == alpha
            && r.object == Object::Literal(Literal::lang("Alpha", "en"))));

    let types = store.distinct_types(GRAPH).unwrap();
    assert_eq!(
        types,
        vec![
            "http://ex.org/Organization".to_string(),
            "http://ex.org/Person".to_string()
        ]
    );

    store.clear_graph(GRAPH).unwrap();
    assert_eq!(store.graph_len(GRAPH), 0);
}

#[test]
fn unparsable_files_are_rejected() {
    let mut file = tempfile::Builder::new().suffix(".n3").tempfile().unwrap();
    file.write_all(b"<http://ex.org/a> <http://ex.org/p> .").unwrap();

    let store = MemoryStore::new();
    let err = store
        .load_file(file.path(), GRAPH, RdfFormat::Turtle)
        .unwrap_err();
    assert!(err.to_string().contains("Turtle"));
    assert_eq!(store.graph_len(GRAPH), 0);
}
