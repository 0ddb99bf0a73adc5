//! Catalog attribute enums.

use serde::{Deserialize, Serialize};

/// Product color options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Black,
    Red,
    Gray,
    White,
    Amber,
}

/// Garment size options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size {
    S,
    M,
    L,
    Xl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&Color::Amber).unwrap_or_default();
        assert_eq!(json, "\"AMBER\"");
    }

    #[test]
    fn test_size_serde() {
        let json = serde_json::to_string(&Size::Xl).unwrap_or_default();
        assert_eq!(json, "\"XL\"");
    }
}
