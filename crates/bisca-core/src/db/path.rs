// Dotted-path helpers shared by adapters that evaluate filters in process.
//
// Path resolution follows MongoDB: a segment applied to an array reaches
// into every element (`players.player_id`), and a numeric segment selects
// one element (`players.0`).

use std::cmp::Ordering;

use bson::{Bson, Document};

/// Every value reachable at `path` inside `doc`.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = doc.get(*first) {
            descend(value, rest, &mut out);
        }
    }
    out
}

fn descend<'a>(value: &'a Bson, rest: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((segment, tail)) = rest.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Bson::Document(doc) => {
            if let Some(next) = doc.get(*segment) {
                descend(next, tail, out);
            }
        }
        Bson::Array(items) => {
            if let Ok(i) = segment.parse::<usize>() {
                if let Some(next) = items.get(i) {
                    descend(next, tail, out);
                }
            } else {
                for item in items {
                    if let Bson::Document(doc) = item {
                        if let Some(next) = doc.get(*segment) {
                            descend(next, tail, out);
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

/// Equality with MongoDB's numeric widening: `int`, `long` and `double`
/// compare by value.
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Whether `doc` satisfies an equality filter.
///
/// A `null` condition also matches a missing field; an array field matches
/// when any element equals the condition.
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| {
        let found = lookup(doc, path);
        if found.is_empty() {
            return matches!(expected, Bson::Null);
        }
        found.iter().any(|value| match value {
            Bson::Array(items) if !matches!(expected, Bson::Array(_)) => {
                items.iter().any(|item| values_equal(item, expected))
            }
            other => values_equal(other, expected),
        })
    })
}

/// Index key tuples a document contributes to an index over `fields`.
///
/// A missing field indexes as `null`. A path that reaches several values
/// (through an array) contributes one tuple per value.
pub fn index_keys(doc: &Document, fields: &[&str]) -> Vec<Vec<Bson>> {
    let mut tuples: Vec<Vec<Bson>> = vec![Vec::new()];
    for field in fields {
        let mut values: Vec<Bson> = Vec::new();
        for value in lookup(doc, field) {
            match value {
                Bson::Array(items) if !items.is_empty() => values.extend(items.iter().cloned()),
                other => values.push(other.clone()),
            }
        }
        if values.is_empty() {
            values.push(Bson::Null);
        }

        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                values.iter().map(move |v| {
                    let mut next = prefix.clone();
                    next.push(v.clone());
                    next
                })
            })
            .collect();
    }
    tuples
}

/// Assign `value` at a dotted `path`, creating embedded documents as needed.
///
/// Returns `false` when the path crosses a scalar or an out-of-range array
/// index and nothing was written.
pub fn set_path(doc: &mut Document, path: &str, value: Bson) -> bool {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
            true
        }
        Some((head, tail)) => {
            if !doc.contains_key(head) {
                doc.insert(head, Document::new());
            }
            match doc.get_mut(head) {
                Some(next) => set_in(next, tail, value),
                None => false,
            }
        }
    }
}

fn set_in(target: &mut Bson, path: &str, value: Bson) -> bool {
    match target {
        Bson::Document(doc) => set_path(doc, path, value),
        Bson::Array(items) => {
            let (head, tail) = match path.split_once('.') {
                Some((h, t)) => (h, Some(t)),
                None => (path, None),
            };
            let Ok(i) = head.parse::<usize>() else {
                return false;
            };
            match (items.get_mut(i), tail) {
                (Some(slot), None) => {
                    *slot = value;
                    true
                }
                (Some(slot), Some(rest)) => set_in(slot, rest, value),
                (None, _) => false,
            }
        }
        _ => false,
    }
}

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Sort order across BSON values: by type class first, then by value.
pub fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        _ => Ordering::Equal,
    }
}

/// Compare two documents by the value at `path`; missing sorts as `null`.
pub fn compare_at(a: &Document, b: &Document, path: &str) -> Ordering {
    let null = Bson::Null;
    let left = lookup(a, path).into_iter().next().unwrap_or(&null);
    let right = lookup(b, path).into_iter().next().unwrap_or(&null);
    compare_values(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn game() -> Document {
        doc! {
            "game_id": "g1",
            "rules": { "max_players": 4 },
            "players": [
                { "player_id": "p1", "is_guest": false },
                { "player_id": "p2", "is_guest": true },
            ],
            "current_players": ["u1", "u2"],
        }
    }

    #[test]
    fn test_lookup_nested_and_array() {
        let g = game();
        assert_eq!(lookup(&g, "rules.max_players"), vec![&Bson::Int32(4)]);
        assert_eq!(
            lookup(&g, "players.player_id"),
            vec![&Bson::String("p1".into()), &Bson::String("p2".into())]
        );
        assert_eq!(lookup(&g, "players.1.is_guest"), vec![&Bson::Boolean(true)]);
        assert!(lookup(&g, "missing.path").is_empty());
    }

    #[test]
    fn test_filter_matching() {
        let g = game();
        assert!(matches_filter(&g, &doc! { "game_id": "g1" }));
        assert!(matches_filter(&g, &doc! { "players.player_id": "p2" }));
        assert!(matches_filter(&g, &doc! { "current_players": "u1" }));
        assert!(matches_filter(&g, &doc! { "rules.max_players": 4_i64 }));
        assert!(matches_filter(&g, &doc! { "trump_card": Bson::Null }));
        assert!(!matches_filter(&g, &doc! { "game_id": "g2" }));
        assert!(matches_filter(&g, &doc! {}));
    }

    #[test]
    fn test_index_keys_missing_is_null() {
        let keys = index_keys(&doc! { "user_id": "a" }, &["user_id", "friend_id"]);
        assert_eq!(keys, vec![vec![Bson::String("a".into()), Bson::Null]]);
    }

    #[test]
    fn test_index_keys_multikey() {
        let keys = index_keys(&game(), &["players.player_id"]);
        assert_eq!(keys.len(), 2);
        let keys = index_keys(&game(), &["current_players"]);
        assert_eq!(keys, vec![vec![Bson::from("u1")], vec![Bson::from("u2")]]);
    }

    #[test]
    fn test_set_path() {
        let mut g = game();
        assert!(set_path(&mut g, "game_status", "Playing".into()));
        assert!(set_path(&mut g, "rules.min_players", 2.into()));
        assert!(set_path(&mut g, "players.0.is_ready", true.into()));
        assert!(set_path(&mut g, "scores.p1", 3.into()));
        assert!(!set_path(&mut g, "game_id.sub", 1.into()));
        assert!(!set_path(&mut g, "players.9.is_ready", true.into()));

        assert_eq!(g.get_str("game_status").unwrap(), "Playing");
        assert_eq!(lookup(&g, "rules.min_players"), vec![&Bson::Int32(2)]);
        assert_eq!(lookup(&g, "players.0.is_ready"), vec![&Bson::Boolean(true)]);
        assert_eq!(lookup(&g, "scores.p1"), vec![&Bson::Int32(3)]);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&Bson::Int32(2), &Bson::Double(1.5)), Ordering::Greater);
        assert_eq!(compare_values(&Bson::Null, &Bson::Int32(0)), Ordering::Less);
        assert_eq!(
            compare_values(&Bson::from("a"), &Bson::from("b")),
            Ordering::Less
        );
        assert_eq!(
            compare_at(&doc! { "x": 1 }, &doc! {}, "x"),
            Ordering::Greater
        );
    }
}
