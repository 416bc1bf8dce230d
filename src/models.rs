use chrono::NaiveDate;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// Path segment claimed by the toilet sign, which lives beside the parties.
pub const RESERVED_PARTY_ID: &str = "toilet";

#[derive(Debug, Deserialize, Serialize)]
pub struct Catalog {
    pub parties: Vec<Party>,
    #[serde(default)]
    pub envelopes: Vec<Envelope>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub title: String,
    pub date: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub photo_album_url: String,
    #[serde(default)]
    pub dress_code: String,
    #[serde(default)]
    pub welcome_message: String,
    pub menu: Menu,
    #[serde(default)]
    pub drinks: Vec<DrinkCategory>,
    #[serde(default)]
    pub schedule: Vec<ScheduleItem>,
    #[serde(default)]
    pub games: Vec<Game>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Menu {
    Courses {
        courses: Vec<Course>,
    },
    Taco {
        #[serde(default)]
        sections: Vec<TacoSection>,
        #[serde(default)]
        recipes: Vec<Recipe>,
    },
}

impl Menu {
    pub fn courses(&self) -> &[Course] {
        match self {
            Menu::Courses { courses } => courses,
            Menu::Taco { .. } => &[],
        }
    }

    pub fn taco_sections(&self) -> &[TacoSection] {
        match self {
            Menu::Courses { .. } => &[],
            Menu::Taco { sections, .. } => sections,
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        match self {
            Menu::Courses { .. } => &[],
            Menu::Taco { recipes, .. } => recipes,
        }
    }

    pub fn has_recipes(&self) -> bool {
        !self.recipes().is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Course {
    pub name: String,
    pub dish: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TacoSection {
    pub title: String,
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Recipe {
    pub name: String,
    pub color: String,
    pub ingredients: Vec<String>,
    pub method: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DrinkCategory {
    pub category: String,
    pub items: Vec<DrinkItem>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DrinkItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub time: String,
    pub activity: String,
    #[serde(default)]
    pub hide_until_release: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub has_identity_cards: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Envelope {
    pub id: u32,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Role {
    pub code: String,
    pub name: String,
    pub description: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Could not read party data from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed party data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid party data: {0}")]
    Invalid(String),
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Catalog, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: format!("{}", path.display()),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Catalog, LoadError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Rejects data that would produce broken routes or links.
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut seen = std::collections::HashSet::new();
        for party in &self.parties {
            if !is_slug(&party.id) {
                return Err(LoadError::Invalid(format!(
                    "party id {:?} must be a non-empty slug of a-z, 0-9 and -",
                    party.id
                )));
            }
            if party.id == RESERVED_PARTY_ID {
                return Err(LoadError::Invalid(format!(
                    "party id {:?} is reserved",
                    party.id
                )));
            }
            if !seen.insert(party.id.as_str()) {
                return Err(LoadError::Invalid(format!(
                    "duplicate party id {:?}",
                    party.id
                )));
            }
            if let Some(recipe) = party
                .menu
                .recipes()
                .iter()
                .find(|recipe| recipe.name.trim().is_empty())
            {
                return Err(LoadError::Invalid(format!(
                    "party {:?} has a recipe without a name ({:?})",
                    party.id, recipe.color
                )));
            }
        }
        Ok(())
    }

    pub fn party(&self, id: &str) -> Option<&Party> {
        self.parties.iter().find(|party| party.id == id)
    }
}

fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party_json(id: &str, release_date: &str) -> String {
        format!(
            r#"{{
                "id": "{}",
                "title": "Supper",
                "date": "Saturday 1st June",
                "releaseDate": "{}",
                "menu": {{ "type": "courses", "courses": [] }}
            }}"#,
            id, release_date
        )
    }

    #[test]
    fn parses_minimal_party() {
        let json = format!(r#"{{ "parties": [{}] }}"#, party_json("summer", "2025-06-01"));
        let catalog = Catalog::from_json_str(&json).unwrap();
        let party = catalog.party("summer").unwrap();
        assert_eq!(
            party.release_date,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(party.schedule.is_empty());
        assert!(party.photo_album_url.is_empty());
        assert!(catalog.party("winter").is_none());
    }

    #[test]
    fn parses_taco_menu() {
        let json = r##"{
            "parties": [{
                "id": "taco-night",
                "title": "Taco Night",
                "date": "Friday",
                "releaseDate": "2025-06-01",
                "menu": {
                    "type": "taco",
                    "sections": [{ "title": "Fillings", "items": ["Carnitas"] }],
                    "recipes": [{
                        "name": "Salsa Verde",
                        "color": "#2f6b3a",
                        "ingredients": ["Tomatillos"],
                        "method": ["Blend"]
                    }]
                },
                "schedule": [{ "time": "19:00", "activity": "Party Games", "hideUntilRelease": true }],
                "games": [{ "name": "Roles", "description": "Secret roles", "hasIdentityCards": true }]
            }]
        }"##;
        let catalog = Catalog::from_json_str(json).unwrap();
        let party = catalog.party("taco-night").unwrap();
        assert_eq!(party.menu.recipes().len(), 1);
        assert!(party.schedule[0].hide_until_release);
        assert!(party.games[0].has_identity_cards);
    }

    #[test]
    fn unparseable_release_date_fails_at_load() {
        let json = format!(r#"{{ "parties": [{}] }}"#, party_json("summer", "June 1st"));
        match Catalog::from_json_str(&json) {
            Err(LoadError::Parse(_)) => {}
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn bundled_data_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/parties.json");
        let catalog = Catalog::load(&path).unwrap();
        assert!(!catalog.parties.is_empty());
        assert!(catalog.envelopes.iter().all(|envelope| envelope.roles.len() == 3));
    }

    #[test]
    fn missing_file_is_reported() {
        match Catalog::load(Path::new("does/not/exist.json")) {
            Err(LoadError::Io { path, .. }) => assert_eq!(path, "does/not/exist.json"),
            other => panic!("Expected io error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = format!(
            r#"{{ "parties": [{}, {}] }}"#,
            party_json("summer", "2025-06-01"),
            party_json("summer", "2025-07-01")
        );
        assert!(matches!(
            Catalog::from_json_str(&json),
            Err(LoadError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_reserved_and_non_slug_ids() {
        for id in &["toilet", "", "Summer Party", "a/b"] {
            let json = format!(r#"{{ "parties": [{}] }}"#, party_json(id, "2025-06-01"));
            assert!(
                matches!(Catalog::from_json_str(&json), Err(LoadError::Invalid(_))),
                "id {:?} should be rejected",
                id
            );
        }
    }
}
