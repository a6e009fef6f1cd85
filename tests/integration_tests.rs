use serde::{Deserialize, Serialize};
use serde_lnt::{
    decode, decode_with_options, encode, encode_with_options, from_slice, root_header, to_vec,
    BinaryOptions, Decode, Encode, Error, ErrorKind, Header, Result, Tag, Value, ValueDecoder,
    ValueEncoder,
};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

fn sample_order() -> Order {
    Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string()],
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
    }
}

fn root_tag(bytes: &[u8]) -> Tag {
    root_header(bytes).unwrap().tag()
}

/// Prologue for a document whose string table holds only `"a"`.
fn doc_with_key_a(root: &[u8]) -> Vec<u8> {
    let mut bytes = vec![1, 0, 1, 0, 0, 0, 1, 0, 0, 0, b'a'];
    bytes.extend_from_slice(root);
    bytes
}

#[test]
fn test_simple_struct() {
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    };

    let bytes = to_vec(&user).unwrap();
    let user_back: User = from_slice(&bytes).unwrap();
    assert_eq!(user, user_back);
}

#[test]
fn test_nested_struct() {
    let order = sample_order();
    let bytes = to_vec(&order).unwrap();
    let order_back: Order = from_slice(&bytes).unwrap();
    assert_eq!(order, order_back);
}

#[test]
fn test_empty_containers() {
    let empty: Vec<u32> = Vec::new();
    let bytes = to_vec(&empty).unwrap();
    assert_eq!(root_tag(&bytes), Tag::RegularUnkeyed);
    assert_eq!(from_slice::<Vec<u32>>(&bytes).unwrap(), empty);

    let map: BTreeMap<String, u8> = BTreeMap::new();
    let bytes = to_vec(&map).unwrap();
    assert_eq!(root_tag(&bytes), Tag::RegularKeyed);
    assert_eq!(from_slice::<BTreeMap<String, u8>>(&bytes).unwrap(), map);
}

#[test]
fn test_identical_elements_share_a_header() {
    let bytes = to_vec(&vec![1i32, 1, 1]).unwrap();
    assert_eq!(bytes[6], 0x22);
    assert_eq!(root_tag(&bytes), Tag::UniformUnkeyed);
}

#[test]
fn test_single_element_is_uniform() {
    let bytes = to_vec(&vec![String::from("only")]).unwrap();
    assert_eq!(root_tag(&bytes), Tag::UniformUnkeyed);
}

#[test]
fn test_fixed_width_struct_is_uniform_keyed() {
    #[derive(Serialize)]
    struct Rgb {
        r: i32,
        g: i32,
        b: i32,
    }

    let bytes = to_vec(&Rgb { r: 1, g: 2, b: 3 }).unwrap();
    assert_eq!(root_tag(&bytes), Tag::UniformKeyed);
}

#[test]
fn test_same_size_different_headers_is_equisize() {
    let bytes = to_vec(&(1u8, -1i8)).unwrap();
    assert_eq!(bytes[6], 0x21);
    match root_header(&bytes).unwrap() {
        Header::EquisizeUnkeyed(h) => {
            assert_eq!(h.count, 2);
            assert_eq!(h.item_size, 2);
        }
        other => panic!("expected equisize, got {:?}", other),
    }
}

#[test]
fn test_mixed_sizes_are_regular() {
    let bytes = to_vec(&(1u8, 1u32)).unwrap();
    assert_eq!(bytes[6], 0x20);
    assert_eq!(from_slice::<(u8, u32)>(&bytes).unwrap(), (1, 1));
}

#[test]
fn test_uniform_layout_is_smallest() {
    let values = vec![7u32; 100];
    let bytes = to_vec(&values).unwrap();
    // version, empty table, tag, count, item size, shared header
    assert_eq!(bytes.len(), 2 + 4 + 1 + 4 + 4 + 1 + 400);
}

#[test]
fn test_last_key_wins_regular() {
    let bytes = doc_with_key_a(&[
        0x10, 2, 0, 0, 0, // regular keyed, two entries
        0, 2, 0, 0, 0, // "a", 2 bytes
        0, 2, 0, 0, 0, // "a", 2 bytes
        0x03, 1, 0x03, 2,
    ]);
    let map: BTreeMap<String, u8> = from_slice(&bytes).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["a"], 2);
}

#[test]
fn test_last_key_wins_equisize() {
    #[derive(Deserialize)]
    struct A {
        a: u8,
    }

    let bytes = doc_with_key_a(&[
        0x11, 2, 0, 0, 0, 2, 0, 0, 0, // equisize keyed, two entries of 2 bytes
        0, 0, // "a", "a"
        0x03, 1, 0x03, 2,
    ]);
    assert_eq!(from_slice::<A>(&bytes).unwrap().a, 2);
}

#[test]
fn test_last_key_wins_uniform() {
    let bytes = doc_with_key_a(&[
        0x12, 2, 0, 0, 0, 1, 0, 0, 0, // uniform keyed, two entries of 1 byte
        0, 0, // "a", "a"
        0x03, // shared header
        1, 2,
    ]);
    let value: Value = from_slice(&bytes).unwrap();
    let keyed = value.as_keyed().unwrap();
    assert_eq!(keyed.len(), 1);
    assert_eq!(keyed.get("a").and_then(Value::as_u64), Some(2));
}

#[test]
fn test_decode_subset_of_fields() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Summary {
        order_id: u32,
        total: f64,
    }

    let bytes = to_vec(&sample_order()).unwrap();
    let summary: Summary = from_slice(&bytes).unwrap();
    assert_eq!(
        summary,
        Summary {
            order_id: 12345,
            total: 109.97
        }
    );
}

#[test]
fn test_decode_superset_of_fields() {
    #[derive(Serialize)]
    struct V1 {
        id: u32,
    }

    #[derive(Deserialize, Debug)]
    struct V2 {
        id: u32,
        nickname: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    struct Strict {
        #[allow(dead_code)]
        id: u32,
        #[allow(dead_code)]
        nickname: String,
    }

    let bytes = to_vec(&V1 { id: 4 }).unwrap();
    let v2: V2 = from_slice(&bytes).unwrap();
    assert_eq!(v2.id, 4);
    assert_eq!(v2.nickname, None);

    let err = from_slice::<Strict>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyNotFound);
}

#[test]
fn test_corrupt_input_is_format_error() {
    let valid = to_vec(&vec![1u32, 2, 3]).unwrap();

    let cases: Vec<Vec<u8>> = vec![
        Vec::new(),
        vec![9, 9, 0, 0, 0, 0, 0x01],
        vec![1, 0, 3, 0, 0, 0],
        vec![1, 0, 0, 0, 0, 0, 0x7f],
        valid[..valid.len() - 1].to_vec(),
    ];
    for bytes in &cases {
        let err = from_slice::<Vec<u32>>(bytes).unwrap_err();
        assert!(err.is_format_error(), "{:?} gave {:?}", bytes, err);
    }

    let err = from_slice::<u32>(&[1, 0, 0, 0, 0, 0, 0x03, 1, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::InvalidScalarWidth(3)));

    let err = from_slice::<String>(&[1, 0, 0, 0, 0, 0, 0x04, 5]).unwrap_err();
    assert!(matches!(err, Error::StringIndexOutOfRange { index: 5, len: 0 }));
}

#[test]
fn test_bad_version_is_reported() {
    let mut bytes = to_vec(&1u8).unwrap();
    bytes[0] = 2;
    assert!(matches!(
        from_slice::<u8>(&bytes),
        Err(Error::UnsupportedVersion {
            major: 2,
            minor: 0,
            ..
        })
    ));
}

#[test]
fn test_type_mismatches() {
    let number = to_vec(&5u8).unwrap();
    assert_eq!(
        from_slice::<String>(&number).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        from_slice::<i32>(&number).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    assert_eq!(from_slice::<u64>(&number).unwrap(), 5);

    let wide = to_vec(&300u16).unwrap();
    assert_eq!(
        from_slice::<u8>(&wide).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );

    let text = to_vec("hello").unwrap();
    assert_eq!(
        from_slice::<Vec<u8>>(&text).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_mismatch_names_its_path() {
    #[derive(Serialize)]
    struct Loose {
        items: Vec<(u8, String)>,
    }

    #[derive(Deserialize, Debug)]
    struct Tight {
        #[allow(dead_code)]
        items: Vec<(u8, u8)>,
    }

    let bytes = to_vec(&Loose {
        items: vec![(1, "x".to_string())],
    })
    .unwrap();
    let err = from_slice::<Tight>(&bytes).unwrap_err();
    match err {
        Error::TypeMismatch { path, .. } => assert_eq!(path.to_string(), ".items[0][1]"),
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

#[test]
fn test_peek_nil_does_not_advance() {
    struct Gaps(Vec<Option<u8>>);

    impl<'de> Decode<'de> for Gaps {
        fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
            let mut seq = decoder.unkeyed()?;
            let mut out = Vec::new();
            while !seq.is_at_end() {
                if seq.is_next_nil()? {
                    assert!(seq.decode_nil()?);
                    out.push(None);
                } else {
                    let index = seq.current_index();
                    assert!(!seq.decode_nil()?);
                    assert_eq!(seq.current_index(), index);
                    out.push(Some(seq.decode()?));
                }
            }
            Ok(Gaps(out))
        }
    }

    let values = vec![None, Some(3u8), None, Some(4)];
    let bytes = to_vec(&values).unwrap();
    let gaps: Gaps = decode(&bytes).unwrap();
    assert_eq!(gaps.0, values);
}

#[test]
fn test_reading_past_the_end() {
    struct Three;

    impl<'de> Decode<'de> for Three {
        fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
            let mut seq = decoder.unkeyed()?;
            for _ in 0..3 {
                seq.decode::<u8>()?;
            }
            Ok(Three)
        }
    }

    let bytes = to_vec(&[1u8, 2]).unwrap();
    let err = decode::<Three>(&bytes).err().unwrap();
    assert!(matches!(err, Error::OutOfRange { index: 2, len: 2, .. }));
}

#[test]
fn test_strings_are_deduplicated() {
    let bytes = to_vec(&vec!["same", "same", "same"]).unwrap();
    assert_eq!(&bytes[2..6], &[1, 0, 0, 0]);

    #[derive(Serialize)]
    struct Named {
        name: &'static str,
    }
    let bytes = to_vec(&vec![Named { name: "name" }, Named { name: "name" }]).unwrap();
    assert_eq!(&bytes[2..6], &[1, 0, 0, 0]);
}

struct Animal {
    legs: u8,
}

struct Dog {
    animal: Animal,
    name: String,
}

impl Encode for Dog {
    fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
        let mut keyed = encoder.keyed();
        keyed.encode("name", &self.name)?;
        let mut base = keyed.base_layer().keyed();
        base.encode("legs", &self.animal.legs)
    }
}

impl<'de> Decode<'de> for Dog {
    fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
        let keyed = decoder.keyed()?;
        let base = keyed.base_layer()?.keyed()?;
        Ok(Dog {
            animal: Animal {
                legs: base.decode("legs")?,
            },
            name: keyed.decode("name")?,
        })
    }
}

#[test]
fn test_base_layer_round_trip() {
    let dog = Dog {
        animal: Animal { legs: 4 },
        name: "Rex".to_string(),
    };
    let bytes = encode(&dog).unwrap();
    let back: Dog = decode(&bytes).unwrap();
    assert_eq!(back.animal.legs, 4);
    assert_eq!(back.name, "Rex");

    let value: Value = from_slice(&bytes).unwrap();
    let legs = value
        .get("super")
        .and_then(|base| base.get("legs"))
        .and_then(Value::as_u64);
    assert_eq!(legs, Some(4));
}

#[test]
fn test_missing_base_layer() {
    let bytes = to_vec(&BTreeMap::from([("name".to_string(), "Rex".to_string())])).unwrap();
    let err = decode::<Dog>(&bytes).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::KeyNotFound);
}

#[test]
fn test_metadata_reaches_both_sides() {
    struct Scaled(u32);

    impl Encode for Scaled {
        fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
            let factor = encoder.metadata().get::<u32>("factor").copied().unwrap_or(1);
            let mut seq = encoder.unkeyed();
            {
                let nested = seq.nested_keyed();
                assert_eq!(nested.metadata().get::<u32>("factor"), Some(&factor));
            }
            seq.encode(&(self.0 * factor))
        }
    }

    impl<'de> Decode<'de> for Scaled {
        fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
            let factor = decoder.metadata().get::<u32>("factor").copied().unwrap_or(1);
            let mut seq = decoder.unkeyed()?;
            let _ = seq.nested_keyed()?;
            Ok(Scaled(seq.decode::<u32>()? / factor))
        }
    }

    let options = BinaryOptions::new().with_metadata("factor", 10u32);
    let bytes = encode_with_options(&Scaled(7), &options).unwrap();
    let plain: (BTreeMap<String, u8>, u32) = from_slice(&bytes).unwrap();
    assert_eq!(plain.1, 70);
    let back: Scaled = decode_with_options(&bytes, &options).unwrap();
    assert_eq!(back.0, 7);
}

#[test]
fn test_scalars_round_trip() {
    assert!(from_slice::<bool>(&to_vec(&true).unwrap()).unwrap());
    assert_eq!(from_slice::<f32>(&to_vec(&1.5f32).unwrap()).unwrap(), 1.5);
    assert_eq!(from_slice::<f64>(&to_vec(&-0.25f64).unwrap()).unwrap(), -0.25);
    assert_eq!(from_slice::<f64>(&to_vec(&0.5f32).unwrap()).unwrap(), 0.5);
    assert_eq!(from_slice::<char>(&to_vec(&'λ').unwrap()).unwrap(), 'λ');
    assert_eq!(
        from_slice::<i128>(&to_vec(&i128::MIN).unwrap()).unwrap(),
        i128::MIN
    );
    assert_eq!(
        from_slice::<u128>(&to_vec(&u128::MAX).unwrap()).unwrap(),
        u128::MAX
    );
    assert_eq!(from_slice::<i64>(&to_vec(&-7i8).unwrap()).unwrap(), -7);
    from_slice::<()>(&to_vec(&()).unwrap()).unwrap();
}

#[test]
fn test_enums_round_trip() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Shape {
        Empty,
        Circle(f64),
        Line(i32, i32),
        Rect { w: u16, h: u16 },
    }

    let shapes = vec![
        Shape::Empty,
        Shape::Circle(2.0),
        Shape::Line(-1, 1),
        Shape::Rect { w: 3, h: 4 },
    ];
    let bytes = to_vec(&shapes).unwrap();
    let back: Vec<Shape> = from_slice(&bytes).unwrap();
    assert_eq!(back, shapes);
}

#[test]
fn test_non_string_map_keys() {
    let mut scores = BTreeMap::new();
    scores.insert(3u32, "three".to_string());
    scores.insert(10u32, "ten".to_string());

    let bytes = to_vec(&scores).unwrap();
    let back: BTreeMap<u32, String> = from_slice(&bytes).unwrap();
    assert_eq!(back, scores);

    let as_strings: BTreeMap<String, String> = from_slice(&bytes).unwrap();
    assert!(as_strings.contains_key("10"));

    let tuple_keys = BTreeMap::from([((1u8, 2u8), 0u8)]);
    assert_eq!(
        to_vec(&tuple_keys).unwrap_err().kind(),
        ErrorKind::Encoding
    );
}

#[test]
fn test_value_re_encodes_with_minimal_widths() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Wide {
        a: u64,
        b: i64,
    }

    let original = Wide { a: 5, b: -5 };
    let bytes = to_vec(&original).unwrap();
    let value: Value = from_slice(&bytes).unwrap();
    let compact = to_vec(&value).unwrap();
    assert!(compact.len() < bytes.len());
    assert_eq!(from_slice::<Wide>(&compact).unwrap(), original);
}

#[test]
fn test_borrowed_strings() {
    #[derive(Deserialize)]
    struct View<'a> {
        #[serde(borrow)]
        names: Vec<&'a str>,
    }

    #[derive(Serialize)]
    struct Owned {
        names: Vec<String>,
    }

    let bytes = to_vec(&Owned {
        names: vec!["left".to_string(), "right".to_string()],
    })
    .unwrap();
    let view: View<'_> = from_slice(&bytes).unwrap();
    assert_eq!(view.names, ["left", "right"]);
}

#[test]
fn test_sequence_base_layer_is_trailing() {
    struct Path {
        points: Vec<(i16, i16)>,
        closed: bool,
    }

    impl Encode for Path {
        fn encode(&self, encoder: ValueEncoder<'_>) -> Result<()> {
            let mut seq = encoder.unkeyed();
            for point in &self.points {
                seq.encode(point)?;
            }
            seq.base_layer().encode_bool(self.closed)
        }
    }

    impl<'de> Decode<'de> for Path {
        fn decode(decoder: ValueDecoder<'_, 'de>) -> Result<Self> {
            let mut seq = decoder.unkeyed()?;
            let mut points = Vec::new();
            while seq.len() - seq.current_index() > 1 {
                points.push(seq.decode()?);
            }
            let closed = seq.base_layer()?.decode_bool()?;
            Ok(Path { points, closed })
        }
    }

    let path = Path {
        points: vec![(0, 0), (3, 4)],
        closed: true,
    };
    let bytes = encode(&path).unwrap();
    let back: Path = decode(&bytes).unwrap();
    assert_eq!(back.points, path.points);
    assert!(back.closed);

    let value: Value = from_slice(&bytes).unwrap();
    let items = value.as_unkeyed().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2], Value::Unsigned(1));
}

#[test]
fn test_container_kind_mismatches() {
    let scalar = to_vec(&1u8).unwrap();
    assert_eq!(
        from_slice::<BTreeMap<String, u8>>(&scalar).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );

    let seq = to_vec(&vec![1u8]).unwrap();
    assert_eq!(
        from_slice::<BTreeMap<String, u8>>(&seq).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );

    let signed = to_vec(&-1i32).unwrap();
    assert_eq!(
        from_slice::<u32>(&signed).unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_uniform_sequence_decodes_back() {
    let bytes = to_vec(&[1i8, 1, 1]).unwrap();
    assert_eq!(bytes[6], 0x22);
    assert_eq!(from_slice::<Vec<i8>>(&bytes).unwrap(), [1, 1, 1]);
}

/// `levels` regular sequences, each holding the next, around a nil.
fn nested_sequences(levels: usize) -> Vec<u8> {
    let mut bytes = vec![1, 0, 0, 0, 0, 0];
    for level in (1..=levels).rev() {
        let inner = 1 + 9 * (level as u32 - 1);
        bytes.extend_from_slice(&[0x20, 1, 0, 0, 0]);
        bytes.extend_from_slice(&inner.to_le_bytes());
    }
    bytes.push(0x01);
    bytes
}

#[test]
fn test_deep_nesting_is_rejected() {
    let bytes = nested_sequences(20_000);
    let err = from_slice::<Value>(&bytes).unwrap_err();
    assert!(matches!(err, Error::NestingTooDeep(_)));
    assert!(err.is_format_error());

    let mut chain = vec![1, 0, 0, 0, 0, 0];
    for _ in 0..20_000 {
        chain.extend_from_slice(&[0x22, 1, 0, 0, 0, 0, 0, 0, 0]);
    }
    chain.push(0x01);
    assert!(root_header(&chain).unwrap_err().is_format_error());
}

#[test]
fn test_nesting_limit_is_shared_by_both_sides() {
    let nest = |levels: usize| {
        let mut value = Value::Nil;
        for _ in 0..levels {
            value = Value::Unkeyed(vec![value]);
        }
        value
    };

    let deepest = nest(serde_lnt::MAX_DEPTH);
    let bytes = to_vec(&deepest).unwrap();
    assert_eq!(from_slice::<Value>(&bytes).unwrap(), deepest);
    assert!(from_slice::<Value>(&nested_sequences(serde_lnt::MAX_DEPTH)).is_ok());

    let err = to_vec(&nest(serde_lnt::MAX_DEPTH + 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

#[test]
fn test_option_of_nil_reads_back_as_none() {
    let bytes = to_vec(&Some(())).unwrap();
    assert_eq!(root_header(&bytes).unwrap(), Header::Nil);
    assert_eq!(from_slice::<Option<()>>(&bytes).unwrap(), None);

    let bytes = to_vec(&Some(None::<u8>)).unwrap();
    assert_eq!(from_slice::<Option<Option<u8>>>(&bytes).unwrap(), None);

    let bytes = to_vec(&Some(Some(3u8))).unwrap();
    assert_eq!(from_slice::<Option<Option<u8>>>(&bytes).unwrap(), Some(Some(3)));
}
