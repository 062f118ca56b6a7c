//! `${VAR}` macro substitution for configuration strings
//!
//! Targeting fields in the config (bucket, prefix, application name, ...) may
//! reference build-time environment variables. Both `${VAR}` and the bare
//! `$VAR` form are supported; `$$` produces a literal `$`. Unresolved
//! references are left verbatim so a typo is visible in the logs instead of
//! silently expanding to nothing.

use std::collections::HashMap;

/// Expand macro references in `input` against `vars`
pub fn expand(input: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                match vars.get(&name) {
                    Some(value) if closed => out.push_str(value),
                    _ => {
                        out.push_str("${");
                        out.push_str(&name);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() || *c == '_' => {
                let mut name = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match vars.get(&name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(&name);
                    }
                }
            }
            _ => out.push('$'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        HashMap::from([
            ("BUILD_NUMBER".to_string(), "42".to_string()),
            ("BRANCH".to_string(), "main".to_string()),
        ])
    }

    #[test]
    fn test_braced_expansion() {
        assert_eq!(expand("releases/${BUILD_NUMBER}", &vars()), "releases/42");
    }

    #[test]
    fn test_bare_expansion() {
        assert_eq!(expand("app-$BRANCH-$BUILD_NUMBER", &vars()), "app-main-42");
    }

    #[test]
    fn test_unknown_var_left_verbatim() {
        assert_eq!(expand("releases/${NOPE}", &vars()), "releases/${NOPE}");
        assert_eq!(expand("releases/$NOPE", &vars()), "releases/$NOPE");
    }

    #[test]
    fn test_dollar_escape() {
        assert_eq!(expand("cost: $$5", &vars()), "cost: $5");
    }

    #[test]
    fn test_unterminated_brace() {
        assert_eq!(expand("releases/${BUILD_NUMBER", &vars()), "releases/${BUILD_NUMBER");
    }

    #[test]
    fn test_trailing_dollar() {
        assert_eq!(expand("plain$", &vars()), "plain$");
    }
}
