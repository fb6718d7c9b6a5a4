// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Path queries over nested variants.
//!
//! A path is `/`-separated segments. A segment is `*` (every child), a key (mapping lookup,
//! every match for bags), or a decimal index (sequence lookup), optionally followed by a
//! predicate `[@key=value]` that keeps only mapping nodes whose `key` entry renders to `value`.

use crate::{
    Error, List, Payload, Variant,
    error::ErrorCode::{FormatError, RangeError},
};
use once_cell::sync::Lazy;
use regex::Regex;

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\*|[^\[\]/]+)(?:\[@?([^=\]]+)="?([^"\]]*)"?\])?$"#)
        .unwrap_or_else(|e| panic!("select segment pattern: {e}"))
});

struct Segment<'a> {
    node: &'a str,
    predicate: Option<(&'a str, &'a str)>,
}

fn parse_segment(segment: &str) -> Result<Segment<'_>, Error> {
    let caps = SEGMENT
        .captures(segment)
        .ok_or_else(|| FormatError.with_msg(|| format!("Select path has invalid syntax: {segment}")))?;
    let node = caps.get(1).map(|m| m.as_str()).unwrap_or("*");
    let predicate = match (caps.get(2), caps.get(3)) {
        (Some(k), Some(v)) => Some((k.as_str(), v.as_str())),
        _ => None,
    };
    Ok(Segment { node, predicate })
}

fn children(node: &Variant, segment: &Segment) -> Result<Vec<Variant>, Error> {
    if segment.node == "*" {
        return match node.iter() {
            Ok(items) => Ok(items.map(|i| i.into_value()).collect()),
            Err(_) => Err(RangeError.with_msg(|| {
                format!("Select '*' reached non-collection {}", node.variant_type())
            })),
        };
    }
    let key = segment.node;
    let found: Vec<Variant> = match node.payload() {
        Payload::Dictionary(_) => node.at_key(key).ok().cloned().into_iter().collect(),
        Payload::Bag(b) => b.values_for(key).cloned().collect(),
        Payload::TimeSeries(t) => match t.range(key) {
            Ok(r) => r.iter().map(|(_, v)| v.clone()).collect(),
            Err(_) => vec![],
        },
        Payload::DataTable(d) => match key.parse::<usize>() {
            Ok(i) => d.row(i).ok().map(Variant::from).into_iter().collect(),
            Err(_) => vec![],
        },
        _ => match key.parse::<usize>() {
            Ok(i) => node.at(i).ok().cloned().into_iter().collect(),
            Err(_) => vec![],
        },
    };
    if found.is_empty() {
        return Err(RangeError.with_msg(|| {
            format!("Select segment '{key}' did not resolve in {}", node.variant_type())
        }));
    }
    Ok(found)
}

fn predicate_holds(node: &Variant, key: &str, expected: &str) -> bool {
    node.at_key(key)
        .and_then(|v| v.text_value())
        .is_ok_and(|text| text == expected)
}

impl Variant {
    /// Every node reached by following `path`, as a List.
    pub fn select(&self, path: &str) -> Result<Variant, Error> {
        let mut nodes = vec![self.clone()];
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            let segment = parse_segment(raw)?;
            let mut next = Vec::new();
            for node in &nodes {
                next.extend(children(node, &segment)?);
            }
            if let Some((key, expected)) = segment.predicate {
                next.retain(|n| predicate_holds(n, key, expected));
            }
            nodes = next;
        }
        Ok(Variant::from(nodes.into_iter().collect::<List>()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorCode::*, Sequence, Variant, v_bag, v_dict, v_int32, v_list, v_str};
    use pretty_assertions::assert_eq;

    fn catalogue() -> Variant {
        v_dict([(
            "books",
            v_bag([
                ("book", v_dict([("id", v_int32(1)), ("title", v_str("Dune"))])),
                ("book", v_dict([("id", v_int32(2)), ("title", v_str("Emma"))])),
                ("magazine", v_dict([("id", v_int32(3))])),
            ]),
        )])
    }

    #[test]
    fn test_select_descends_through_mappings() {
        let r = catalogue().select("books/book/title").unwrap();
        let titles = r.as_list().unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles.at(0).unwrap(), &v_str("Dune"));
        assert_eq!(titles.at(1).unwrap(), &v_str("Emma"));
    }

    #[test]
    fn test_select_wildcard_and_predicate() {
        let r = catalogue().select("books/*[@id=2]/title").unwrap();
        assert_eq!(r, v_list(&[v_str("Emma")]));

        let r = catalogue().select("books/*").unwrap();
        assert_eq!(r.len(), 3);

        let r = catalogue().select("books/book[id=\"9\"]").unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_select_indexes_sequences() {
        let v = v_dict([("xs", v_list(&[v_int32(10), v_int32(20)]))]);
        assert_eq!(v.select("xs/1").unwrap(), v_list(&[v_int32(20)]));
        assert_eq!(v.select("").unwrap(), v_list(&[v.clone()]));
    }

    #[test]
    fn test_select_failures() {
        assert_eq!(catalogue().select("books/nothing").unwrap_err().code, RangeError);
        assert_eq!(catalogue().select("books/book/title/*").unwrap_err().code, RangeError);
        assert_eq!(catalogue().select("books/book[").unwrap_err().code, FormatError);
        let v = v_dict([("xs", v_list(&[v_int32(10)]))]);
        assert_eq!(v.select("xs/5").unwrap_err().code, RangeError);
    }
}
