// Prompt-building utilities shared by every flow. The prompts themselves
// live next to the flows that use them.

/// Substitutes `{name}` placeholders in a single pass.
///
/// Unknown placeholders (and JSON braces in embedded schemas) are left as-is,
/// and substituted values are never re-scanned, so user text containing
/// `{job_description}` cannot inject into a later slot.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
