use myrica::{Config, FieldType, Metadata, Myrica, MyricaError};
use tempfile::TempDir;

fn myrica(dir: &TempDir) -> Myrica {
    Myrica::new(Config::new(dir.path().to_string_lossy().into_owned())).unwrap()
}

fn company_metadata() -> Metadata {
    Metadata::new()
        .with_field("id", FieldType::Uint)
        .with_field("name", FieldType::String)
}

const DOC1: &[u8] = br#"{"id": 1, "name": "Neoway Business Solution"}"#;
const DOC2: &[u8] = br#"{"id": 2, "name": "Google Inc."}"#;
const DOC3: &[u8] = br#"{"id": 3, "name": "Facebook Company"}"#;
const DOC4: &[u8] = br#"{"id": 4, "name": "Neoway Teste"}"#;

fn add_companies(index: &myrica::Index) {
    let metadata = company_metadata();
    index.add_with_metadata(1, DOC1, &metadata).unwrap();
    index.add_with_metadata(2, DOC2, &metadata).unwrap();
    index.add_with_metadata(3, DOC3, &metadata).unwrap();
    index.add_with_metadata(4, DOC4, &metadata).unwrap();
}

#[test]
fn test_create_index() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    for name in ["test", "test2"] {
        myrica.create_index(name).unwrap();
        assert!(dir.path().join(name).is_dir(), "missing index dir {name}");
    }

    // Already created, or invalid name.
    for name in ["test", "test/", "test/sub", "#", "a", "aa", "@", "$%&*"] {
        assert!(
            myrica.create_index(name).is_err(),
            "create_index should fail for {name}"
        );
    }

    myrica.close();
}

#[test]
fn test_open_index_reuses_handle() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    myrica.create_index("test-cache").unwrap();
    assert_eq!(myrica.open_indices_len(), 1);

    let first = myrica.open_index("test-cache").unwrap();
    let second = myrica.open_index("test-cache").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(myrica.open_indices_len(), 1);

    myrica.close();
    assert_eq!(myrica.open_indices_len(), 0);
}

#[test]
fn test_delete_index() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    assert!(matches!(
        myrica.delete_index("lsdlas"),
        Err(MyricaError::IndexNotFound(_))
    ));

    myrica.create_index("test").unwrap();
    assert!(myrica.index_exists("test").unwrap());

    myrica.delete_index("test").unwrap();
    assert!(!myrica.index_exists("test").unwrap());
    assert!(!dir.path().join("test").exists());
}

#[test]
fn test_add_document_and_filter() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("document-sample").unwrap();
    add_companies(&index);

    assert!(
        dir.path().join("document-sample/document.db").is_file(),
        "document.db not created"
    );
    assert!(
        dir.path().join("document-sample/name_string.idx").is_file(),
        "name_string.idx not created"
    );

    // Exact fetch returns the stored bytes unchanged.
    assert_eq!(index.get(1).unwrap().as_deref(), Some(DOC1));

    // Full-phrase term.
    let docs = index.filter_term("name", "neoway business solution").unwrap();
    assert_eq!(docs, vec![DOC1.to_vec()]);

    // Shared term, ascending ID order.
    let docs = index.filter_term("name", "neoway").unwrap();
    assert_eq!(docs, vec![DOC1.to_vec(), DOC4.to_vec()]);

    // Case-insensitive on the query side.
    let docs = index.filter_term("name", "NEOWAY").unwrap();
    assert_eq!(docs.len(), 2);

    // Unknown term.
    assert!(index.filter_term("name", "plan9").unwrap().is_empty());

    myrica.close();
}

#[test]
fn test_prefix_match() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("test-prefix").unwrap();
    add_companies(&index);

    let docs = index.match_prefix("name", "neoway").unwrap();
    assert_eq!(docs, vec![DOC1.to_vec(), DOC4.to_vec()]);

    // "Neo" also covers the phrase terms; the union stays deduplicated.
    let docs = index.match_prefix("name", "Neo").unwrap();
    assert_eq!(docs, vec![DOC1.to_vec(), DOC4.to_vec()]);

    let docs = index.match_prefix("name", "goo").unwrap();
    assert_eq!(docs, vec![DOC2.to_vec()]);

    assert!(index.match_prefix("name", "zzz").unwrap().is_empty());

    myrica.close();
    assert_eq!(myrica.open_indices_len(), 0);
}

#[test]
fn test_batch_add() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("test-batch").unwrap();

    index.batch();
    add_companies(&index);

    // Batched writes must be invisible to reads until the flush.
    assert_eq!(index.get(1).unwrap(), None, "batch mode not isolating reads");
    assert!(index.filter_term("name", "neoway").unwrap().is_empty());

    index.flush_batch().unwrap();

    assert_eq!(index.get(1).unwrap().as_deref(), Some(DOC1));
    let docs = index.filter_term("name", "google").unwrap();
    assert_eq!(docs, vec![DOC2.to_vec()]);

    myrica.close();
}

#[test]
fn test_add_without_metadata_infers_types() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("inferred").unwrap();
    index.add(1, DOC1).unwrap();
    index.add(4, DOC4).unwrap();

    let docs = index.filter_term("name", "neoway").unwrap();
    assert_eq!(docs, vec![DOC1.to_vec(), DOC4.to_vec()]);
    assert!(dir.path().join("inferred/id_uint.idx").is_file());

    myrica.close();
}

#[test]
fn test_date_indexing_layout() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("date-sample").unwrap();
    let metadata = Metadata::new()
        .with_field("id", FieldType::Uint)
        .with_field("createAt", FieldType::Date);

    index
        .add_with_metadata(
            1,
            br#"{"id": 1, "createAt": "Mon Jan  2 15:04:05 2006"}"#,
            &metadata,
        )
        .unwrap();

    // Dates are stored as int timestamps under `<field>_int.idx`.
    assert!(dir.path().join("date-sample/createat_int.idx").is_file());
    assert!(dir.path().join("date-sample/id_uint.idx").is_file());

    myrica.close();
}

#[test]
fn test_documents_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let myrica = myrica(&dir);
        let index = myrica.create_index("persistent").unwrap();
        add_companies(&index);
        myrica.close();
    }

    let myrica = myrica(&dir);
    let index = myrica.open_index("persistent").unwrap();
    assert_eq!(index.get(3).unwrap().as_deref(), Some(DOC3));
    let docs = index.filter_term("name", "facebook").unwrap();
    assert_eq!(docs, vec![DOC3.to_vec()]);

    myrica.close();
}

#[test]
fn test_operations_on_closed_index_fail() {
    let dir = TempDir::new().unwrap();
    let myrica = myrica(&dir);

    let index = myrica.create_index("closing").unwrap();
    index.close();

    assert!(matches!(
        index.get(1),
        Err(MyricaError::InvalidState(_))
    ));
    assert!(matches!(
        index.add(1, DOC1),
        Err(MyricaError::InvalidState(_))
    ));
}
