//! `{{ variable }}` substitution for message templates.

use crate::domain::foundation::AttributeMap;

/// Substitutes every `{{ name }}` token whose name is present in `data`.
///
/// Braces are stripped from substituted values and passes repeat until no
/// known token remains, so the output only contains tokens for names absent
/// from `data`. Unknown tokens are left verbatim.
pub fn render(template: &str, data: &AttributeMap) -> String {
    let mut text = template.to_string();
    loop {
        let (next, replaced) = substitute_once(&text, data);
        if !replaced {
            return next;
        }
        text = next;
    }
}

/// Names of all well-formed tokens in `text`, in order of appearance.
pub fn token_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open..];
        match parse_token(after) {
            Some((name, len)) => {
                names.push(name.to_string());
                rest = &after[len..];
            }
            None => rest = &after[1..],
        }
    }
    names
}

fn substitute_once(text: &str, data: &AttributeMap) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut replaced = false;
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        match parse_token(after) {
            Some((name, len)) => {
                match data.get(name) {
                    Some(value) => {
                        out.extend(value.render().chars().filter(|c| *c != '{' && *c != '}'));
                        replaced = true;
                    }
                    None => out.push_str(&after[..len]),
                }
                rest = &after[len..];
            }
            None => {
                out.push('{');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    (out, replaced)
}

/// Parses `{{\s*[A-Za-z0-9_]+\s*}}` at the start of `s`, returning the
/// name and the token's byte length.
fn parse_token(s: &str) -> Option<(&str, usize)> {
    let body = s.strip_prefix("{{")?;
    let trimmed = body.trim_start();
    let lead = body.len() - trimmed.len();
    let name_len = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    if name_len == 0 {
        return None;
    }
    let name = &trimmed[..name_len];
    let tail = &trimmed[name_len..];
    let tail_trimmed = tail.trim_start();
    if !tail_trimmed.starts_with("}}") {
        return None;
    }
    let trail = tail.len() - tail_trimmed.len();
    Some((name, 2 + lead + name_len + trail + 2))
}
