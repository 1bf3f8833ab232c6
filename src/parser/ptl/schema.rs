use std::collections::HashSet;

use crate::database::ColumnSchema;
use crate::error::ParseError;

const REQUIRED_FIELDS: [&str; 5] = ["x", "y", "z", "i", "j"];

/// Splits a schema or record line on whitespace and commas, dropping empty tokens
pub(crate) fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

impl ColumnSchema {
    /// Parse a schema such as "x y z i j" or "i,j,x,y,z" into column positions.
    /// The tokens must be exactly x, y, z, i and j, each appearing once.
    pub fn parse(text: &str) -> Result<ColumnSchema, ParseError> {
        let tokens: Vec<&str> = tokenize(text).collect();

        let schema_error = |reason: String| ParseError::Schema {
            schema: text.to_string(),
            reason,
        };

        if tokens.len() != REQUIRED_FIELDS.len() {
            return Err(schema_error(format!(
                "expected {} fields, found {}",
                REQUIRED_FIELDS.len(),
                tokens.len()
            )));
        }

        let distinct: HashSet<&str> = tokens.iter().copied().collect();
        let required: HashSet<&str> = REQUIRED_FIELDS.into_iter().collect();
        if distinct != required {
            return Err(schema_error(format!(
                "fields must be exactly {}",
                REQUIRED_FIELDS.join(" ")
            )));
        }

        // Every token is known and appears once, so each lookup succeeds
        let position = |name: &str| tokens.iter().position(|&t| t == name).unwrap_or(0);

        Ok(ColumnSchema {
            x: position("x"),
            y: position("y"),
            z: position("z"),
            i: position("i"),
            j: position("j"),
        })
    }
}
