//! OPC part name helpers

/// Name of the `.rels` part holding relationships of `part`
pub fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns it
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(target) = target.strip_prefix('/') {
        return normalize(target);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// Numeric suffix of a part file name (`xl/drawings/drawing12.xml` -> 12)
pub fn part_number(part: &str) -> Option<u32> {
    let file_name = part.rsplit('/').next()?;
    let stem = file_name.strip_suffix(".xml")?;
    let digits_at = stem.rfind(|c: char| !c.is_ascii_digit()).map_or(0, |i| i + 1);
    stem[digits_at..].parse().ok()
}
