//! Divisions (sections) of the guide

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ContentError;

lazy_static! {
    /// Ordering prefix on content directories, e.g. `3_Silver`
    static ref ORDER_PREFIX: Regex = Regex::new(r"^\d+[_-]").unwrap();
}

/// A division of the curriculum, in curriculum order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    General,
    Bronze,
    Silver,
    Gold,
    Plat,
    Adv,
}

impl Division {
    /// All divisions in curriculum order
    pub const ALL: [Division; 6] = [
        Division::General,
        Division::Bronze,
        Division::Silver,
        Division::Gold,
        Division::Plat,
        Division::Adv,
    ];

    /// Human-readable section label
    pub fn section_label(self) -> &'static str {
        match self {
            Division::General => "General",
            Division::Bronze => "Bronze",
            Division::Silver => "Silver",
            Division::Gold => "Gold",
            Division::Plat => "Platinum",
            Division::Adv => "Advanced",
        }
    }

    /// URL segment for this division
    pub fn slug(self) -> &'static str {
        match self {
            Division::General => "general",
            Division::Bronze => "bronze",
            Division::Silver => "silver",
            Division::Gold => "gold",
            Division::Plat => "plat",
            Division::Adv => "adv",
        }
    }

    /// Resolve a division from a content directory name like `5_Platinum`
    pub fn from_dir_name(name: &str) -> Result<Self, ContentError> {
        ORDER_PREFIX.replace(name.trim(), "").parse()
    }
}

impl FromStr for Division {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Division::ALL
            .into_iter()
            .find(|d| d.slug() == needle || d.section_label().to_lowercase() == needle)
            .ok_or_else(|| ContentError::UnknownDivision(s.to_string()))
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_labels() {
        assert_eq!(Division::Plat.section_label(), "Platinum");
        assert_eq!(Division::Adv.section_label(), "Advanced");
        assert_eq!(Division::Bronze.section_label(), "Bronze");
    }

    #[test]
    fn test_parse_slug_and_label() {
        assert_eq!("plat".parse::<Division>().unwrap(), Division::Plat);
        assert_eq!("Platinum".parse::<Division>().unwrap(), Division::Plat);
        assert_eq!("GOLD".parse::<Division>().unwrap(), Division::Gold);
        assert!("diamond".parse::<Division>().is_err());
    }

    #[test]
    fn test_from_dir_name() {
        assert_eq!(Division::from_dir_name("1_General").unwrap(), Division::General);
        assert_eq!(Division::from_dir_name("5_Platinum").unwrap(), Division::Plat);
        assert_eq!(Division::from_dir_name("silver").unwrap(), Division::Silver);
        assert!(matches!(
            Division::from_dir_name("7_Extra"),
            Err(ContentError::UnknownDivision(_))
        ));
    }

    #[test]
    fn test_curriculum_order() {
        let mut divisions = vec![Division::Adv, Division::General, Division::Gold];
        divisions.sort();
        assert_eq!(
            divisions,
            vec![Division::General, Division::Gold, Division::Adv]
        );
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&Division::Plat).unwrap();
        assert_eq!(json, "\"plat\"");
    }
}
