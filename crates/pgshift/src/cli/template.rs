//! `{{var}}` rendering for scaffolded files.

use std::collections::HashMap;

pub const UP_TEMPLATE: &str = "-- Migration: {{name}}
-- Created: {{created}}
--
-- Write the forward change below. Statements are separated by `;`.
-- This file is skipped while it holds only comments.
";

pub const DOWN_TEMPLATE: &str = "-- Revert: {{name}}
--
-- Undo everything up.sql does, in reverse order.
-- Leave it comment-only if the migration cannot be reverted.
";

/// Render a template by replacing `{{key}}` placeholders with values.
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

/// Helper macro to create a HashMap of template variables.
#[macro_export]
macro_rules! template_vars {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(map.insert($key, $value);)*
        map
    }};
}
