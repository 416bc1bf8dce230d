use url::form_urlencoded;

/// Builds links within one party, carrying the preview override along so it
/// survives browsing between sections.
#[derive(Clone, Debug)]
pub struct Nav<'a> {
    party_id: &'a str,
    preview: bool,
}

impl<'a> Nav<'a> {
    pub fn new(party_id: &'a str, preview: bool) -> Nav<'a> {
        Nav { party_id, preview }
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn party(&self) -> String {
        self.with(&format!("/party/{}", self.party_id), &[])
    }

    pub fn section(&self, section: &str) -> String {
        self.with(&self.path(section), &[])
    }

    /// The bare path of a section, for use as a form action.
    pub fn path(&self, section: &str) -> String {
        format!("/party/{}/{}", self.party_id, section)
    }

    pub fn with(&self, path: &str, pairs: &[(&str, &str)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
        if self.preview {
            query.append_pair("override", "true");
        }
        let query = query.finish();
        if query.is_empty() {
            path.to_owned()
        } else {
            format!("{}?{}", path, query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_links() {
        let nav = Nav::new("summer", false);
        assert_eq!(nav.party(), "/party/summer");
        assert_eq!(nav.section("menu"), "/party/summer/menu");
        assert_eq!(Nav::new("summer", true).path("menu"), "/party/summer/menu");
        assert_eq!(
            nav.with("/party/summer/menu/cooking", &[("recipe", "2")]),
            "/party/summer/menu/cooking?recipe=2"
        );
    }

    #[test]
    fn preview_links_keep_override() {
        let nav = Nav::new("summer", true);
        assert_eq!(nav.party(), "/party/summer?override=true");
        assert_eq!(
            nav.section("games/identity-cards"),
            "/party/summer/games/identity-cards?override=true"
        );
        assert_eq!(
            nav.with("/party/summer/menu", &[("angle", "45")]),
            "/party/summer/menu?angle=45&override=true"
        );
    }
}
