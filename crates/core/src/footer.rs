//! Site footer content managed from the admin panel.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::Violations;

pub const MAX_SECTIONS: usize = 6;
pub const MAX_LINKS_PER_SECTION: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterSection {
    pub title: String,
    #[serde(default)]
    pub links: Vec<FooterLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterContent {
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub sections: Vec<FooterSection>,
    #[serde(default)]
    pub social: Vec<SocialLink>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub copyright: String,
}

impl Default for FooterContent {
    /// Content served before an admin has saved anything.
    fn default() -> Self {
        let link = |label: &str, url: &str| FooterLink {
            label: label.to_string(),
            url: url.to_string(),
        };
        Self {
            about: String::new(),
            sections: vec![
                FooterSection {
                    title: "Shop".into(),
                    links: vec![link("All products", "/products"), link("Wishlist", "/wishlist")],
                },
                FooterSection {
                    title: "Help".into(),
                    links: vec![
                        link("Orders", "/orders"),
                        link("Returns", "/returns"),
                        link("Contact us", "/contact"),
                    ],
                },
            ],
            social: Vec::new(),
            contact_email: None,
            contact_phone: None,
            copyright: String::new(),
        }
    }
}

impl FooterContent {
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut v = Violations::new();

        v.check(
            self.sections.len() > MAX_SECTIONS,
            "sections",
            format!("at most {MAX_SECTIONS} sections are allowed"),
        );

        for (i, section) in self.sections.iter().enumerate() {
            let field = format!("sections[{i}]");
            v.check(section.title.trim().is_empty(), &field, "title is required");
            v.check(
                section.links.len() > MAX_LINKS_PER_SECTION,
                &field,
                format!("at most {MAX_LINKS_PER_SECTION} links per section"),
            );
            for (j, link) in section.links.iter().enumerate() {
                let field = format!("sections[{i}].links[{j}]");
                v.check(link.label.trim().is_empty(), &field, "label is required");
                v.check(!is_acceptable_url(&link.url), &field, "url must be absolute or start with /");
            }
        }

        for (i, social) in self.social.iter().enumerate() {
            let field = format!("social[{i}]");
            v.check(social.platform.trim().is_empty(), &field, "platform is required");
            v.check(!is_absolute_http(&social.url), &field, "url must be an http(s) URL");
        }

        if let Some(email) = self.contact_email.as_deref().filter(|e| !e.is_empty()) {
            v.check(!email.contains('@'), "contact_email", "must be a valid email");
        }

        v.into_result()
    }
}

fn is_absolute_http(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn is_acceptable_url(url: &str) -> bool {
    is_absolute_http(url) || (url.starts_with('/') && !url.starts_with("//"))
}
