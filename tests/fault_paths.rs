// Fault locator coverage: nested containers, sibling faults, keys, scalars, rich objects.
use jsonstore::api::{
    AsDict, EncodeError, Encoder, JsonEncoder, Mapping, Object, SerializationFault, StoredValue,
    find_paths_unserializable_data, find_paths_unserializable_data_with,
};

struct State {
    entity_id: String,
    state: String,
    attributes: Mapping,
}

impl AsDict for State {
    fn type_name(&self) -> &str {
        "State"
    }

    fn identifier(&self) -> Option<String> {
        Some(self.entity_id.clone())
    }

    fn as_dict(&self) -> Mapping {
        Mapping::new()
            .with("entity_id", self.entity_id.as_str())
            .with("state", self.state.as_str())
            .with("attributes", self.attributes.clone())
    }
}

struct Event {
    event_type: String,
    data: Mapping,
}

impl AsDict for Event {
    fn type_name(&self) -> &str {
        "Event"
    }

    fn identifier(&self) -> Option<String> {
        Some(self.event_type.clone())
    }

    fn as_dict(&self) -> Mapping {
        Mapping::new()
            .with("event_type", self.event_type.as_str())
            .with("data", self.data.clone())
    }
}

struct BadData {
    bla: StoredValue,
}

impl AsDict for BadData {
    fn type_name(&self) -> &str {
        "BadData"
    }

    fn as_dict(&self) -> Mapping {
        Mapping::new().with("bla", self.bla.clone())
    }
}

fn bad_data() -> StoredValue {
    StoredValue::from(Object::opaque("object"))
}

fn entries(faults: &SerializationFault) -> Vec<(String, StoredValue)> {
    faults
        .iter()
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect()
}

fn empty_set() -> StoredValue {
    StoredValue::Set(Vec::new())
}

#[test]
fn serializable_values_have_no_faults() {
    assert!(find_paths_unserializable_data(&StoredValue::from(1)).is_empty());
    assert!(find_paths_unserializable_data(&StoredValue::from(vec![1, 2])).is_empty());
    let value = StoredValue::Map(Mapping::new().with("something", "yo"));
    assert!(find_paths_unserializable_data(&value).is_empty());
    let value = StoredValue::Map(Mapping::new().with("a", 1));
    assert!(find_paths_unserializable_data(&value).is_empty());
}

#[test]
fn direct_child_is_reported() {
    let value = StoredValue::Map(Mapping::new().with("something", empty_set()));
    assert_eq!(
        entries(&find_paths_unserializable_data(&value)),
        vec![("$.something".to_string(), empty_set())]
    );
}

#[test]
fn nested_fault_is_isolated() {
    let value = StoredValue::Map(
        Mapping::new().with("something", StoredValue::List(vec![1.into(), empty_set()])),
    );
    assert_eq!(
        entries(&find_paths_unserializable_data(&value)),
        vec![("$.something[1]".to_string(), empty_set())]
    );
}

#[test]
fn sibling_faults_are_all_reported() {
    let value = StoredValue::List(vec![
        1.into(),
        StoredValue::Map(Mapping::new().with("bla", empty_set()).with("blub", empty_set())),
    ]);
    assert_eq!(
        entries(&find_paths_unserializable_data(&value)),
        vec![
            ("$[1].bla".to_string(), empty_set()),
            ("$[1].blub".to_string(), empty_set()),
        ]
    );
}

#[test]
fn keys_without_json_form_are_reported() {
    let key = StoredValue::Tuple(vec!["A".into()]);
    let value = StoredValue::Map(Mapping::new().with(key.clone(), 1));
    assert_eq!(
        entries(&find_paths_unserializable_data(&value)),
        vec![("$<key: ('A',)>".to_string(), key)]
    );
}

#[test]
fn scalar_root_is_reported_when_dump_rejects_it() {
    let strict = JsonEncoder::new().allow_nan(false);
    let faults = find_paths_unserializable_data_with(&StoredValue::Float(f64::NAN), |value| {
        strict.encode(value)
    });
    assert_eq!(faults.len(), 1);
    assert!(faults.get("$").and_then(StoredValue::as_f64).expect("root").is_nan());

    let lenient = JsonEncoder::new().allow_nan(true);
    let faults = find_paths_unserializable_data_with(&StoredValue::Float(f64::NAN), |value| {
        lenient.encode(value)
    });
    assert!(faults.is_empty());
}

#[test]
fn tuples_are_walked_like_lists() {
    let value = StoredValue::Tuple(vec!["ok".into(), bad_data()]);
    assert_eq!(
        entries(&find_paths_unserializable_data(&value)),
        vec![("$[1]".to_string(), bad_data())]
    );
}

fn datetime_encoder() -> JsonEncoder {
    JsonEncoder::new().with_fallback(|value| match value {
        StoredValue::Object(object) if object.type_name() == "datetime" => {
            object.identifier().map(StoredValue::from)
        }
        _ => None,
    })
}

#[test]
fn state_path_carries_type_and_entity_id() {
    let encoder = datetime_encoder();
    let state = State {
        entity_id: "mock_domain.mock_entity".to_string(),
        state: "on".to_string(),
        attributes: Mapping::new()
            .with(
                "changed",
                Object::opaque("datetime").with_identifier("2026-01-01T00:00:00"),
            )
            .with("bad", bad_data()),
    };
    let value = StoredValue::List(vec![StoredValue::object(&state)]);
    let faults = find_paths_unserializable_data_with(&value, |value| encoder.encode(value));
    assert_eq!(
        entries(&faults),
        vec![(
            "$[0](State: mock_domain.mock_entity).attributes.bad".to_string(),
            bad_data()
        )]
    );
}

#[test]
fn event_path_carries_type_and_event_type() {
    let encoder = datetime_encoder();
    let event = Event {
        event_type: "bad_event".to_string(),
        data: Mapping::new().with("bad_attribute", bad_data()),
    };
    let value = StoredValue::List(vec![StoredValue::object(&event)]);
    let faults = find_paths_unserializable_data_with(&value, |value| encoder.encode(value));
    assert_eq!(
        entries(&faults),
        vec![(
            "$[0](Event: bad_event).data.bad_attribute".to_string(),
            bad_data()
        )]
    );
}

#[test]
fn object_without_identifier_uses_type_name_only() {
    let encoder = datetime_encoder();
    let value = StoredValue::object(&BadData { bla: bad_data() });
    let faults = find_paths_unserializable_data_with(&value, |value| encoder.encode(value));
    assert_eq!(
        entries(&faults),
        vec![("$(BadData).bla".to_string(), bad_data())]
    );
}

#[test]
fn object_accepted_by_dump_is_not_entered() {
    let encoder = JsonEncoder::extended();
    let value = StoredValue::Map(Mapping::new().with(
        "ok",
        StoredValue::object(&BadData {
            bla: StoredValue::from(1),
        }),
    ));
    let faults = find_paths_unserializable_data_with(&value, |value| encoder.encode(value));
    assert!(faults.is_empty());
}

#[test]
fn dump_errors_of_any_kind_count_as_rejection() {
    let value = StoredValue::List(vec![StoredValue::from("keep"), StoredValue::from("drop")]);
    let faults = find_paths_unserializable_data_with(&value, |value| match value.as_str() {
        Some("drop") | None => Err(EncodeError::Format("rejected".to_string())),
        Some(_) => Ok(()),
    });
    assert_eq!(
        entries(&faults),
        vec![("$[1]".to_string(), StoredValue::from("drop"))]
    );
}
