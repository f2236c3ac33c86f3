use bytes::Bytes;
use ebe::prelude::*;

#[derive(EbeSerDe, PartialEq, Debug, Clone)]
struct Sensor {
    pub id: u32,
    pub name: String,
    pub reading: f64,
    pub active: bool,
}

#[derive(EbeSerDe, PartialEq, Debug, Clone)]
struct Sample {
    pub sensor: Sensor,
    pub tags: Vec<String>,
    pub payload: Bytes,
}

#[derive(EbeSerDe, PartialEq, Debug)]
struct Pair(pub u8, pub bool);

#[derive(EbeSerDe, PartialEq, Debug, Default)]
struct Nothing;

#[derive(EbeSerDe, PartialEq, Debug, Default)]
struct Counted {
    pub visible: i32,
    hits: u64,
    pub label: String,
}

fn round_trip<T: Ser + De + PartialEq + std::fmt::Debug>(value: &T) {
    let enc = encode_full(value).unwrap();
    let dec: T = decode_full(&enc).unwrap();
    assert_eq!(&dec, value);
}

fn sensor() -> Sensor {
    Sensor {
        id: 7,
        name: "thermo".to_string(),
        reading: -40.25,
        active: true,
    }
}

#[test]
fn named_struct_round_trip() {
    round_trip(&sensor());
}

#[test]
fn struct_header_bytes() {
    let enc = encode_full(&Pair(5, true)).unwrap();
    assert_eq!(enc, [0xc2, 0x05, 0x61]);
}

#[test]
fn nested_struct_round_trip() {
    round_trip(&Sample {
        sensor: sensor(),
        tags: vec!["a".into(), "b".into()],
        payload: Bytes::from_static(b"\x00\x01\x02"),
    });
}

#[test]
fn tuple_struct_round_trip() {
    round_trip(&Pair(200, false));
}

#[test]
fn empty_struct_is_zero_bytes() {
    let enc = encode_full(&Nothing).unwrap();
    assert!(enc.is_empty());
    let dec: Nothing = decode_full(&enc).unwrap();
    assert_eq!(dec, Nothing);
}

#[test]
fn empty_struct_consumes_nothing() {
    // an empty struct before another value leaves the stream untouched
    let mut out = Vec::new();
    encode(&Nothing, &mut out).unwrap();
    encode(&9u64, &mut out).unwrap();

    let mut src = out.as_slice();
    let _: Nothing = decode(&mut src).unwrap();
    assert_eq!(decode_u64(&mut src).unwrap(), 9);
}

#[test]
fn private_fields_are_invisible() {
    let original = Counted {
        visible: -5,
        hits: 999,
        label: "kept".to_string(),
    };
    let enc = encode_full(&original).unwrap();
    // two visible fields only
    assert_eq!(enc[0], 0xc2);

    let dec: Counted = decode_full(&enc).unwrap();
    assert_eq!(dec.visible, -5);
    assert_eq!(dec.label, "kept");
    // skipped on the wire, so it comes back default
    assert_eq!(dec.hits, 0);
}

#[test]
fn field_count_mismatch() {
    let enc = encode_full(&Pair(1, true)).unwrap();
    assert!(matches!(
        decode_full::<Sensor>(&enc),
        Err(Error::FieldCountMismatch {
            wire: 2,
            expected: 4,
            ..
        })
    ));
}

#[test]
fn structurally_compatible_structs_interchange() {
    // no names on the wire: same shape decodes into either type
    #[derive(EbeSerDe, PartialEq, Debug)]
    struct Flag(pub u8, pub bool);

    let enc = encode_full(&Pair(3, true)).unwrap();
    let dec: Flag = decode_full(&enc).unwrap();
    assert_eq!(dec, Flag(3, true));
}

#[test]
fn struct_arrays_round_trip() {
    let samples = vec![Pair(1, true), Pair(2, false), Pair(3, true)];
    let enc = encode_full(&samples).unwrap();
    // element kind byte names the struct kind
    assert_eq!(enc[1], 0x0c);
    let dec: Vec<Pair> = decode_full(&enc).unwrap();
    assert_eq!(dec, samples);
}

#[test]
fn struct_as_map_value() {
    let mut m: HashMap<String, Pair> = HashMap::new();
    m.insert("left".to_string(), Pair(1, false));
    m.insert("right".to_string(), Pair(2, true));
    let enc = encode_full(&m).unwrap();
    let dec: HashMap<String, Pair> = decode_full(&enc).unwrap();
    assert_eq!(dec, m);
}

#[test]
fn struct_reads_as_dynamic_value() {
    let enc = encode_full(&Pair(5, true)).unwrap();
    let dec = decode_full::<Value>(&enc).unwrap();
    assert_eq!(
        dec,
        Value::Struct(vec![Value::Uint(5), Value::Bool(true)])
    );
}

#[test]
fn descriptors_list_visible_fields() {
    let desc = descriptor::of::<Sensor>();
    assert_eq!(desc.kind(), Kind::Struct);
    assert!(!desc.is_empty());
    assert_eq!(desc.field_count(), 4);
    let names: Vec<&str> = desc.fields().iter().map(|f| f.name).collect();
    assert_eq!(names, ["id", "name", "reading", "active"]);
    let kinds: Vec<Kind> = desc.fields().iter().map(|f| f.kind).collect();
    assert_eq!(kinds, [Kind::UInt, Kind::String, Kind::Float, Kind::Boolean]);

    let desc = descriptor::of::<Counted>();
    assert_eq!(desc.field_count(), 2);

    let desc = descriptor::of::<Nothing>();
    assert!(desc.is_empty());
}

#[test]
fn boxed_and_optional_fields_pass_through() {
    #[derive(EbeSerDe, PartialEq, Debug)]
    struct Wrapped {
        pub inner: Box<u32>,
    }

    round_trip(&Wrapped { inner: Box::new(77) });

    // an absent optional cannot be expressed on the wire
    #[derive(EbeSerDe, PartialEq, Debug)]
    struct MaybeNamed {
        pub name: Option<String>,
    }

    let present = MaybeNamed {
        name: Some("x".to_string()),
    };
    let enc = encode_full(&present).unwrap();
    // the optional is invisible on the wire
    #[derive(EbeSerDe, PartialEq, Debug)]
    struct Named {
        pub name: String,
    }
    let dec: Named = decode_full(&enc).unwrap();
    assert_eq!(dec.name, "x");
    // and a decoded optional is always populated
    let dec: MaybeNamed = decode_full(&enc).unwrap();
    assert_eq!(dec, present);

    let absent = MaybeNamed { name: None };
    assert!(matches!(encode_full(&absent), Err(Error::NullValue)));
}
