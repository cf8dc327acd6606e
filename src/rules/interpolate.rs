//! `${VAR}` interpolation against the process environment.

/// Expand every `${NAME}` sequence in `input` to the value of the
/// environment variable `NAME`.
///
/// Unset variables expand to the empty string. Expansion repeats until no
/// `${` remains or a `${` has no closing `}`, so values produced by one
/// pass are themselves expanded.
pub fn interpolate(input: &str) -> String {
    let mut result = input.to_string();

    loop {
        let Some(start) = result.find("${") else {
            break;
        };
        let Some(end_offset) = result[start..].find('}') else {
            break;
        };
        let end = start + end_offset;

        let name = &result[start + 2..end];
        let value = std::env::var(name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[end + 1..]);
    }

    result
}
