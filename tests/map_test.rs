use ebe::prelude::*;

fn round_trip_map<K, V>(entries: Vec<(K, V)>)
where
    K: Ser + De + Eq + std::hash::Hash + Clone + std::fmt::Debug,
    V: Ser + De + PartialEq + Clone + std::fmt::Debug,
{
    let m: HashMap<K, V> = entries.into_iter().collect();
    let enc = encode_full(&m).unwrap();
    let dec: HashMap<K, V> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);
}

#[test]
fn string_to_int() {
    round_trip_map(vec![
        ("one".to_string(), 1i64),
        ("two".to_string(), 2),
        ("negative".to_string(), -40),
    ]);
}

#[test]
fn string_to_string() {
    round_trip_map(vec![
        ("a".to_string(), "alpha".to_string()),
        ("b".to_string(), "beta".to_string()),
    ]);
}

#[test]
fn int_keys() {
    round_trip_map(vec![(1i64, "one".to_string()), (-2, "minus two".to_string())]);
    round_trip_map(vec![(10u32, true), (20, false)]);
}

#[test]
fn string_to_bool_and_floats() {
    round_trip_map(vec![("on".to_string(), true), ("off".to_string(), false)]);
    round_trip_map(vec![("pi".to_string(), 3.25f64)]);
}

#[test]
fn empty_map() {
    let enc = encode_full(&HashMap::<String, i64>::new()).unwrap();
    assert_eq!(enc, [0xb0]);
    let dec: HashMap<String, i64> = decode_full(&enc).unwrap();
    assert!(dec.is_empty());
}

#[test]
fn large_map_uses_overflow_count() {
    let m: HashMap<String, u64> = (0..200u64).map(|i| (format!("key{i}"), i)).collect();
    let enc = encode_full(&m).unwrap();
    // count 200 does not fit the nibble
    assert_eq!(&enc[..3], [0xb8, 0x31, 0xc8]);
    let dec: HashMap<String, u64> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);
}

#[test]
fn map_with_dynamic_values() {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("n".to_string(), Value::Int(-9));
    m.insert("s".to_string(), Value::Str("txt".into()));
    m.insert("xs".to_string(), Value::Array(vec![Value::Bool(true)]));

    let enc = encode_full(&m).unwrap();
    let dec: HashMap<String, Value> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);

    // the same bytes read back through the any decoder
    let dec = decode_full::<Value>(&enc).unwrap();
    assert_eq!(dec, Value::Map(m));
}

#[test]
fn nested_maps() {
    let mut inner: HashMap<String, i64> = HashMap::new();
    inner.insert("deep".to_string(), 1);
    let mut outer: HashMap<String, HashMap<String, i64>> = HashMap::new();
    outer.insert("inner".to_string(), inner);

    let enc = encode_full(&outer).unwrap();
    let dec: HashMap<String, HashMap<String, i64>> = decode_full(&enc).unwrap();
    assert_eq!(dec, outer);
}

#[test]
fn dynamic_map_requires_string_keys() {
    let mut m: HashMap<i64, String> = HashMap::new();
    m.insert(1, "x".to_string());
    let enc = encode_full(&m).unwrap();

    // typed decode accepts integer keys
    let dec: HashMap<i64, String> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);

    // the dynamic form is string-keyed
    assert!(matches!(
        decode_full::<Value>(&enc),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn map_keys_convert_like_any_integer() {
    // nibble-encoded keys narrow into the declared key type
    let mut m: HashMap<u8, u8> = HashMap::new();
    m.insert(3, 30);
    m.insert(200, 201);
    let enc = encode_full(&m).unwrap();
    let dec: HashMap<u8, u8> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);
}
