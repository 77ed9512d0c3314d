/// Parameter binding
///
/// Substitutes `?` placeholders (positional) or `@name` / `:name` / `$name`
/// placeholders (named) with SQL literals. One regex pass finds either a
/// single quote or a placeholder; each bare quote flips an "inside string
/// literal" flag and placeholders seen while the flag is set pass through
/// untouched.
///
/// The flag is pure toggle parity. A doubled quote inside a literal
/// (`'it''s'`) flips it twice, which is a net no-op, so the common escape
/// form is handled. Quotes inside comments or double-quoted identifiers are
/// not understood and will desynchronise the flag.
///
/// Positional mode rejects both too few and too many values. Named mode only
/// rejects missing keys; unused entries in the map are ignored.

pub mod literal;

pub use literal::format_literal;

use crate::error::BindError;
use crate::types::{Param, Params};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

static POSITIONAL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"'|\?").unwrap());
static NAMED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'|[@:$][A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Bind `params` into `template`. `Params::None` returns the template as is.
pub fn bind<'a>(template: &'a str, params: &Params) -> Result<Cow<'a, str>, BindError> {
    match params {
        Params::None => Ok(Cow::Borrowed(template)),
        Params::Positional(values) => bind_positional(template, values).map(Cow::Owned),
        Params::Named(values) => bind_named(template, values).map(Cow::Owned),
    }
}

pub fn bind_positional(template: &str, values: &[Param]) -> Result<String, BindError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut in_string = false;
    let mut cursor = 0;

    for token in POSITIONAL_TOKEN.find_iter(template) {
        out.push_str(&template[last..token.start()]);
        last = token.end();

        if token.as_str() == "'" {
            in_string = !in_string;
            out.push('\'');
        } else if in_string {
            out.push_str(token.as_str());
        } else {
            let value = values
                .get(cursor)
                .ok_or(BindError::MissingPositionalParameter { index: cursor })?;
            out.push_str(&format_literal(value));
            cursor += 1;
        }
    }
    out.push_str(&template[last..]);

    if cursor != values.len() {
        return Err(BindError::UnconsumedParameters {
            template: template.to_string(),
        });
    }
    Ok(out)
}

pub fn bind_named(template: &str, values: &HashMap<String, Param>) -> Result<String, BindError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut in_string = false;

    for token in NAMED_TOKEN.find_iter(template) {
        out.push_str(&template[last..token.start()]);
        last = token.end();

        let text = token.as_str();
        if text == "'" {
            in_string = !in_string;
            out.push('\'');
        } else if in_string {
            out.push_str(text);
        } else {
            let name = &text[1..];
            let value = values
                .get(name)
                .or_else(|| values.get(text))
                .ok_or_else(|| BindError::MissingNamedParameter {
                    key: name.to_string(),
                })?;
            out.push_str(&format_literal(value));
        }
    }
    out.push_str(&template[last..]);

    Ok(out)
}
