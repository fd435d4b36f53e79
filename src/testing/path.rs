//! Dotted/bracket path resolution into JSON bodies.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Parse `user.addresses[0].city` style paths. The empty path and `$` are
/// the root; a leading `$.` is accepted and ignored.
pub fn parse(path: &str) -> Result<Vec<Segment>, String> {
    let trimmed = path.trim();
    let trimmed = trimmed
        .strip_prefix("$.")
        .unwrap_or(trimmed.strip_prefix('$').unwrap_or(trimmed));
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for part in trimmed.split('.') {
        if part.is_empty() {
            return Err("empty segment".to_string());
        }

        let (name, mut brackets) = match part.find('[') {
            Some(open) => part.split_at(open),
            None => (part, ""),
        };
        if name.contains(']') {
            return Err(format!("unexpected `]` in `{part}`"));
        }
        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }

        while !brackets.is_empty() {
            let inner = brackets
                .strip_prefix('[')
                .ok_or_else(|| format!("unexpected `{brackets}` in `{part}`"))?;
            let close = inner
                .find(']')
                .ok_or_else(|| format!("unterminated `[` in `{part}`"))?;
            let index = inner[..close]
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid index `{}` in `{part}`", &inner[..close]))?;
            segments.push(Segment::Index(index));
            brackets = &inner[close + 1..];
        }
    }

    Ok(segments)
}

/// `Ok(None)` when the path is well formed but absent from `root`.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>, String> {
    let segments = parse(path)?;
    let mut current = root;

    for segment in &segments {
        let next = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        };

        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

/// How a path is named in descriptions and failure details.
pub fn display(path: &str) -> String {
    match path.trim() {
        "" | "$" => "body".to_string(),
        path => format!("`{path}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_segments() {
        assert_eq!(
            parse("items[0].tags[2]").unwrap(),
            vec![
                Segment::Key("items".into()),
                Segment::Index(0),
                Segment::Key("tags".into()),
                Segment::Index(2),
            ]
        );
        assert_eq!(
            parse("$.matrix[1][0]").unwrap(),
            vec![
                Segment::Key("matrix".into()),
                Segment::Index(1),
                Segment::Index(0),
            ]
        );
    }

    #[test]
    fn root_paths() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("$").unwrap().is_empty());
        let body = json!([1, 2]);
        assert_eq!(resolve(&body, "").unwrap(), Some(&body));
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(parse("user..id").is_err());
        assert!(parse("items[0").is_err());
        assert!(parse("items[x]").is_err());
        assert!(parse("items[0]x").is_err());
        assert!(parse("items]").is_err());
    }

    #[test]
    fn resolves_nested_values() {
        let body = json!({"user": {"id": 5, "roles": ["admin", "dev"]}});
        assert_eq!(resolve(&body, "user.id").unwrap(), Some(&json!(5)));
        assert_eq!(resolve(&body, "user.roles[1]").unwrap(), Some(&json!("dev")));
        assert_eq!(resolve(&body, "user.roles.0").unwrap(), Some(&json!("admin")));
    }

    #[test]
    fn absent_paths_resolve_to_none() {
        let body = json!({"user": {"id": 5}});
        assert_eq!(resolve(&body, "user.name").unwrap(), None);
        assert_eq!(resolve(&body, "user.id.value").unwrap(), None);
        assert_eq!(resolve(&body, "user[0]").unwrap(), None);
        assert_eq!(resolve(&json!({}), "user.id").unwrap(), None);
    }

    #[test]
    fn null_is_present() {
        let body = json!({"deleted_at": null});
        assert_eq!(resolve(&body, "deleted_at").unwrap(), Some(&Value::Null));
    }
}
