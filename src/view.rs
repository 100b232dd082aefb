//! Result rendering.
//!
//! [`TaxonCard`] is a pure projection of an API record into display fields.
//! [`ResultsView`] is the headless results container the search flow writes
//! into; it renders to plain text, HTML or JSON.

use crate::api::TaxonRecord;
use serde::Serialize;
use std::fmt::Write as _;

pub const NO_COMMON_NAME: &str = "No common name";
pub const UNKNOWN_RANK: &str = "Unknown rank";
pub const PLACEHOLDER_PHOTO_URL: &str = "https://via.placeholder.com/200x200?text=No+Image";
pub const NO_RESULTS_MESSAGE: &str = "No results found.";

/// Display fields for one result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonCard {
    pub common_name: String,
    pub scientific_name: String,
    /// `None` when the taxon has no default photo
    pub photo_url: Option<String>,
    pub rank: String,
    pub category: Option<String>,
}

impl TaxonCard {
    /// Photo URL to show, falling back to the placeholder image.
    pub fn display_photo_url(&self) -> &str {
        self.photo_url.as_deref().unwrap_or(PLACEHOLDER_PHOTO_URL)
    }
}

impl From<&TaxonRecord> for TaxonCard {
    fn from(record: &TaxonRecord) -> Self {
        let common_name = record
            .preferred_common_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(NO_COMMON_NAME)
            .to_string();
        let rank = record
            .rank
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(UNKNOWN_RANK)
            .to_string();

        TaxonCard {
            common_name,
            scientific_name: record.name.clone(),
            photo_url: record.photo_url().map(str::to_string),
            rank,
            category: record.iconic_taxon_name.clone(),
        }
    }
}

/// Something shown in the results container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    Card(TaxonCard),
    Message { text: String },
}

/// Headless stand-in for the results area and its controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    items: Vec<ResultItem>,
    visible: bool,
    load_more_visible: bool,
    loading: bool,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn cards(&self) -> impl Iterator<Item = &TaxonCard> {
        self.items.iter().filter_map(|item| match item {
            ResultItem::Card(card) => Some(card),
            ResultItem::Message { .. } => None,
        })
    }

    pub fn card_count(&self) -> usize {
        self.cards().count()
    }

    /// Card by zero-based position among cards (messages are skipped).
    pub fn card(&self, index: usize) -> Option<&TaxonCard> {
        self.cards().nth(index)
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            ResultItem::Message { text } => Some(text.as_str()),
            ResultItem::Card(_) => None,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn load_more_visible(&self) -> bool {
        self.load_more_visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Loading indicator on; search and "load more" controls disabled.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Controls are enabled whenever nothing is loading.
    pub fn controls_enabled(&self) -> bool {
        !self.loading
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Show one page of results.
    pub fn apply_page(&mut self, cards: Vec<TaxonCard>, clear_previous: bool) {
        if clear_previous {
            self.items.clear();
        }
        self.visible = true;

        if cards.is_empty() {
            self.items.push(ResultItem::Message {
                text: NO_RESULTS_MESSAGE.to_string(),
            });
            self.load_more_visible = false;
            return;
        }

        self.items.extend(cards.into_iter().map(ResultItem::Card));
        self.load_more_visible = true;
    }

    /// Show an inline error, keeping whatever was already rendered.
    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.items.push(ResultItem::Message {
            text: message.into(),
        });
        self.visible = true;
    }

    /// Plain-text rendering for terminals. Cards are numbered from 1.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let mut n = 0usize;
        for item in &self.items {
            match item {
                ResultItem::Card(card) => {
                    n += 1;
                    let _ = writeln!(out, "[{}] {}", n, card.common_name);
                    let _ = writeln!(out, "    {}", card.scientific_name);
                    match &card.category {
                        Some(cat) => {
                            let _ = writeln!(out, "    Rank: {} ({})", card.rank, cat);
                        }
                        None => {
                            let _ = writeln!(out, "    Rank: {}", card.rank);
                        }
                    }
                    let _ = writeln!(out, "    Photo: {}", card.display_photo_url());
                }
                ResultItem::Message { text } => {
                    let _ = writeln!(out, "{}", text);
                }
            }
        }
        if self.loading {
            out.push_str("Loading...\n");
        } else if self.load_more_visible {
            out.push_str("(more results available)\n");
        }
        out
    }

    /// HTML fragment mirroring the page markup: `#results` with one
    /// `div.species` per card, then the continue button.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        let results_class = if self.visible { "" } else { " class=\"hidden\"" };
        let _ = writeln!(out, "<div id=\"results\"{}>", results_class);

        let mut index = 0usize;
        for item in &self.items {
            match item {
                ResultItem::Card(card) => {
                    let common = html_escape::encode_text(&card.common_name);
                    let _ = writeln!(out, "<div class=\"species\" data-index=\"{}\">", index);
                    let _ = writeln!(
                        out,
                        "  <img src=\"{}\" alt=\"{}\" crossorigin=\"anonymous\">",
                        html_escape::encode_double_quoted_attribute(card.display_photo_url()),
                        html_escape::encode_double_quoted_attribute(&card.common_name),
                    );
                    let _ = writeln!(out, "  <div class=\"species-info\">");
                    let _ = writeln!(out, "    <h3>{}</h3>", common);
                    let _ = writeln!(
                        out,
                        "    <p><em>{}</em></p>",
                        html_escape::encode_text(&card.scientific_name)
                    );
                    let _ = writeln!(out, "    <p>Rank: {}</p>", html_escape::encode_text(&card.rank));
                    let _ = writeln!(
                        out,
                        "    <button class=\"download-btn\">Download Postcard</button>"
                    );
                    let _ = writeln!(out, "  </div>");
                    let _ = writeln!(out, "</div>");
                    index += 1;
                }
                ResultItem::Message { text } => {
                    let _ = writeln!(out, "<p>{}</p>", html_escape::encode_text(text));
                }
            }
        }
        out.push_str("</div>\n");

        let loading_class = if self.loading { "" } else { " class=\"hidden\"" };
        let _ = writeln!(out, "<div id=\"loading\"{}>Loading...</div>", loading_class);

        let more_class = if self.load_more_visible { "" } else { " class=\"hidden\"" };
        let disabled = if self.loading { " disabled" } else { "" };
        let _ = writeln!(
            out,
            "<button id=\"continueSearch\"{}{}>Load more</button>",
            more_class, disabled
        );
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TaxonPhoto;

    fn record(common: Option<&str>, name: &str, photo: Option<&str>) -> TaxonRecord {
        TaxonRecord {
            id: None,
            name: name.to_string(),
            preferred_common_name: common.map(str::to_string),
            rank: Some("species".into()),
            rank_level: Some(10.0),
            iconic_taxon_name: Some("Plantae".into()),
            default_photo: photo.map(|u| TaxonPhoto {
                medium_url: Some(u.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn card_uses_defaults_for_missing_fields() {
        let mut r = record(None, "Quercus alba", None);
        r.rank = None;
        let card = TaxonCard::from(&r);
        assert_eq!(card.common_name, NO_COMMON_NAME);
        assert_eq!(card.rank, UNKNOWN_RANK);
        assert_eq!(card.photo_url, None);
        assert_eq!(card.display_photo_url(), PLACEHOLDER_PHOTO_URL);
        assert_eq!(card.category.as_deref(), Some("Plantae"));
    }

    #[test]
    fn page_appends_cards_and_shows_more() {
        let mut view = ResultsView::new();
        let cards = vec![
            TaxonCard::from(&record(Some("White Oak"), "Quercus alba", Some("https://x/1.jpg"))),
            TaxonCard::from(&record(Some("Red Oak"), "Quercus rubra", None)),
        ];
        view.apply_page(cards, true);
        assert_eq!(view.card_count(), 2);
        assert!(view.load_more_visible());
        assert!(view.is_visible());
        assert_eq!(view.card(1).unwrap().common_name, "Red Oak");
    }

    #[test]
    fn empty_page_shows_message_and_hides_more() {
        let mut view = ResultsView::new();
        view.apply_page(vec![TaxonCard::from(&record(Some("A"), "a", None))], true);
        view.apply_page(vec![], false);
        assert_eq!(view.card_count(), 1);
        assert_eq!(view.messages().collect::<Vec<_>>(), vec![NO_RESULTS_MESSAGE]);
        assert!(!view.load_more_visible());
    }

    #[test]
    fn error_keeps_existing_cards() {
        let mut view = ResultsView::new();
        view.apply_page(vec![TaxonCard::from(&record(Some("A"), "a", None))], true);
        view.apply_error("boom");
        assert_eq!(view.card_count(), 1);
        assert_eq!(view.messages().last(), Some("boom"));
        assert!(view.load_more_visible());
    }

    #[test]
    fn text_rendering_numbers_cards() {
        let mut view = ResultsView::new();
        view.apply_page(
            vec![TaxonCard::from(&record(Some("White Oak"), "Quercus alba", None))],
            true,
        );
        let text = view.render_text();
        assert!(text.starts_with("[1] White Oak\n    Quercus alba\n    Rank: species (Plantae)"));
        assert!(text.contains("(more results available)"));
    }

    #[test]
    fn html_escapes_names() {
        let mut view = ResultsView::new();
        view.apply_page(
            vec![TaxonCard::from(&record(Some("<b>Oak</b>"), "Quercus & co", None))],
            true,
        );
        let html = view.render_html();
        assert!(html.contains("&lt;b&gt;Oak&lt;/b&gt;"));
        assert!(html.contains("Quercus &amp; co"));
        assert!(!html.contains("<b>Oak"));
    }

    #[test]
    fn json_tags_items() {
        let mut view = ResultsView::new();
        view.apply_page(vec![], true);
        let json = view.to_json().unwrap();
        assert!(json.contains("\"kind\": \"message\""));
        assert!(json.contains(NO_RESULTS_MESSAGE));
    }
}
