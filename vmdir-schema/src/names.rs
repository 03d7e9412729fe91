//! Case-insensitive name-list helpers.
//!
//! LDAP descriptors compare without regard to ASCII case, so attribute and
//! class lists are treated as sets under that equivalence while keeping the
//! spelling and order of first appearance.

pub(crate) fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// `left ∪ right`, keeping `left`'s order and appending unseen names from `right`.
pub(crate) fn union(left: &[String], right: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(left.len() + right.len());
    for name in left.iter().chain(right) {
        if !contains(&out, name) {
            out.push(name.clone());
        }
    }
    out
}

/// `left − right`.
pub(crate) fn difference(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|n| !contains(right, n))
        .cloned()
        .collect()
}

pub(crate) fn is_superset(big: &[String], small: &[String]) -> bool {
    small.iter().all(|n| contains(big, n))
}

pub(crate) fn same_set(a: &[String], b: &[String]) -> bool {
    is_superset(a, b) && is_superset(b, a)
}

pub(crate) fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

pub(crate) fn eq_opt(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
