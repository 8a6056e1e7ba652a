use folders_pointer::{
    format_json_pointer, normalize, parse_json_pointer, parse_normalized, split_element_prefix,
    Segment,
};
use proptest::prelude::*;

#[test]
fn entity_collection_paths() {
    let path = parse_normalized("/3000000");
    let (prefix, rest) = split_element_prefix(&path);
    assert_eq!(prefix, Some("3000000"));
    assert!(rest.is_empty());

    let path = parse_normalized("/1/nestedThings/-");
    let (prefix, rest) = split_element_prefix(&path);
    assert_eq!(prefix, Some("1"));
    assert_eq!(rest, ["nestedThings".to_string(), "-".to_string()]);
    assert_eq!(Segment::parse(&rest[1]), Segment::End);
}

#[test]
fn escaped_keys_survive_normalization() {
    assert_eq!(parse_normalized("a~1b/"), vec!["a/b"]);
    assert_eq!(normalize("  /x/  "), "/x");
}

proptest! {
    #[test]
    fn format_then_parse_is_identity(steps in proptest::collection::vec("[a-z~/0-9-]{1,8}", 0..6)) {
        let pointer = format_json_pointer(&steps);
        prop_assert_eq!(parse_json_pointer(&pointer), steps);
    }
}
