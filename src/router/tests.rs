use super::Router;

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(!re.is_match("/x"));
    assert!(params.is_empty());
}

#[test]
fn test_colon_and_brace_params() {
    let (re, params) = Router::path_to_regex("/items/:id/tags/{tag}").unwrap();
    assert!(re.is_match("/items/123/tags/red"));
    assert!(!re.is_match("/items/123/tags"));
    let names: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
    assert_eq!(names, vec!["id", "tag"]);
}

#[test]
fn test_literal_segments_are_escaped() {
    let (re, _) = Router::path_to_regex("/v1.0/items").unwrap();
    assert!(re.is_match("/v1.0/items"));
    assert!(!re.is_match("/v1x0/items"));
}
