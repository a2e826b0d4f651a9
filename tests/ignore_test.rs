use codesmith::ignore::IgnoreRules;
use std::path::Path;

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_empty_rules_ignore_nothing() {
    let rules = IgnoreRules::empty("/proj/src");
    assert!(!rules.is_ignored(Path::new("/proj/src/anything")));
    assert_eq!(rules.base_dir(), Path::new("/proj/src"));
}

#[test]
fn test_ancestors_of_base_do_not_match() {
    // "proj" is an ancestor of the sync root, not part of the synchronized tree
    let rules = IgnoreRules::new("/proj/src", &patterns(&["proj", "src"])).unwrap();
    assert!(!rules.is_ignored(Path::new("/proj/src/users")));
    assert!(rules.is_ignored(Path::new("/proj/src/users/src")));
}

#[test]
fn test_double_star_crosses_segments() {
    let rules = IgnoreRules::new("/proj/src", &patterns(&["**/mocks/**"])).unwrap();
    assert!(rules.is_ignored(Path::new("/proj/src/a/mocks/b")));
    assert!(rules.is_ignored(Path::new("/proj/src/a/mocks/b/c")));
}

#[test]
fn test_windows_separators_are_normalized() {
    let rules = IgnoreRules::new("/proj/src", &patterns(&["users\\internal", "  "])).unwrap();
    assert!(rules.is_ignored(Path::new("/proj/src/users/internal")));
    assert!(!rules.is_ignored(Path::new("/proj/src/users")));
}
