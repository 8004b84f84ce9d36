use serde::Serialize;

use crate::error::ValidationError;

/// A placement context for a mockup (t-shirt, billboard, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

/// Every category offered to the user, in display order.
pub const CATEGORIES: [Category; 8] = [
    Category {
        id: "stationery",
        name: "Stationery",
        icon: "\u{1F4C4}",
    },
    Category {
        id: "facade",
        name: "Facade",
        icon: "\u{1F3E2}",
    },
    Category {
        id: "packaging",
        name: "Packaging",
        icon: "\u{1F4E6}",
    },
    Category {
        id: "t-shirt",
        name: "T-Shirt",
        icon: "\u{1F455}",
    },
    Category {
        id: "mobile",
        name: "Mobile",
        icon: "\u{1F4F1}",
    },
    Category {
        id: "desktop",
        name: "Desktop",
        icon: "\u{1F4BB}",
    },
    Category {
        id: "tablet",
        name: "Tablet",
        icon: "\u{1F4F2}",
    },
    Category {
        id: "billboard",
        name: "Billboard",
        icon: "\u{1F3DE}\u{FE0F}",
    },
];

impl Category {
    /// Look up a category by id.
    pub fn find(id: &str) -> Option<&'static Category> {
        CATEGORIES.iter().find(|c| c.id == id)
    }

    /// Like [`find`](Self::find), but an unknown id is a validation failure.
    pub fn parse(id: &str) -> Result<&'static Category, ValidationError> {
        Self::find(id).ok_or_else(|| ValidationError::UnknownCategory(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known() {
        let c = Category::find("t-shirt").unwrap();
        assert_eq!(c.name, "T-Shirt");
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Category::parse("mug"),
            Err(ValidationError::UnknownCategory("mug".into()))
        );
    }

    #[test]
    fn test_ids_unique() {
        for (i, a) in CATEGORIES.iter().enumerate() {
            for b in &CATEGORIES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
