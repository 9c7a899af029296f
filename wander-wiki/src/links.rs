//! Picks a handful of navigable article links out of rendered page HTML.
//!
//! Only in-wiki article paths survive: namespaced targets (`File:`,
//! `Category:`...), the home page, red links, self-links and boilerplate
//! labels are dropped. Survivors are deduplicated on their normalized title,
//! capped at [`OVERSAMPLE`] × `max_links`, shuffled and truncated.

use crate::types::LinkCandidate;
use percent_encoding::percent_decode_str;
use rand::Rng;
use rand::seq::SliceRandom;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;

/// Title of the wiki's front page; never offered as a lead.
pub const HOME_PAGE: &str = "Main_Page";

/// How many distinct candidates to collect per requested link.
pub const OVERSAMPLE: usize = 3;

const ARTICLE_PREFIXES: &[&str] = &["/wiki/", "./"];
const REDLINK_CLASS: &str = "new";
const REDLINK_PARAM: &str = "redlink=1";
const MIN_LABEL_CHARS: usize = 2;
const LABEL_STOPLIST: &[&str] = &[
    "edit",
    "help",
    "see also",
    "references",
    "external links",
    "citation needed",
];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed article html: {0}")]
    Parse(String),
}

/// Case-insensitive, underscore-insensitive, whitespace-collapsed key.
///
/// ```
/// use wander_wiki::links::normalize_title;
///
/// assert_eq!(normalize_title("Alan_Turing"), normalize_title("alan  turing"));
/// ```
pub fn normalize_title(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Up to `max_links` distinct article links from `html`, in random order.
///
/// An empty result is valid; callers decide whether to fall back to another
/// source.
pub fn extract_links<R: Rng + ?Sized>(
    html: &str,
    self_title: &str,
    max_links: usize,
    rng: &mut R,
) -> Result<Vec<LinkCandidate>, ExtractError> {
    if max_links == 0 {
        return Ok(Vec::new());
    }
    if html.trim().is_empty() {
        return Err(ExtractError::Parse("empty document".into()));
    }

    let doc = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").map_err(|e| ExtractError::Parse(e.to_string()))?;

    let self_key = normalize_title(self_title);
    let cap = max_links.saturating_mul(OVERSAMPLE);
    let mut seen = HashSet::new();
    let mut pool = Vec::new();

    for a in doc.select(&anchors) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let label = visible_text(&a);
        if label.chars().count() < MIN_LABEL_CHARS || is_redlink(&a, href) {
            continue;
        }
        let Some(target) = article_target(href) else {
            continue;
        };
        let key = normalize_title(&target);
        if key == self_key || is_noise_label(&label) {
            continue;
        }
        if !seen.insert(key) {
            continue;
        }
        pool.push(LinkCandidate {
            target_title: target,
            display_label: label,
        });
        if pool.len() >= cap {
            break;
        }
    }

    tracing::trace!(candidates = pool.len(), cap, "wiki.links.extracted");
    pool.shuffle(rng);
    pool.truncate(max_links);
    Ok(pool)
}

/// Same filtering for a plain list of titles (the page-links listing).
/// Labels are the titles with underscores shown as spaces.
pub fn sample_titles<R: Rng + ?Sized>(
    titles: impl IntoIterator<Item = String>,
    self_title: &str,
    max_links: usize,
    rng: &mut R,
) -> Vec<LinkCandidate> {
    let self_key = normalize_title(self_title);
    let home_key = normalize_title(HOME_PAGE);
    let mut seen = HashSet::new();

    let mut pool: Vec<LinkCandidate> = titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && !t.contains(':'))
        .filter(|t| {
            let key = normalize_title(t);
            key != self_key && key != home_key && seen.insert(key)
        })
        .map(|t| LinkCandidate {
            display_label: t.replace('_', " "),
            target_title: t,
        })
        .collect();

    pool.shuffle(rng);
    pool.truncate(max_links);
    pool
}

/// Decoded article title behind `href`, or `None` when it is not an article.
fn article_target(href: &str) -> Option<String> {
    let rest = ARTICLE_PREFIXES
        .iter()
        .find_map(|prefix| href.strip_prefix(prefix))?;
    let end = rest.find(|c: char| c == '#' || c == '?').unwrap_or(rest.len());
    let decoded = percent_decode_str(&rest[..end]).decode_utf8().ok()?;
    let title = decoded.trim();

    if title.is_empty() || title.contains(':') {
        return None;
    }
    if normalize_title(title) == normalize_title(HOME_PAGE) {
        return None;
    }
    Some(title.to_string())
}

fn is_redlink(a: &ElementRef<'_>, href: &str) -> bool {
    a.value().classes().any(|c| c == REDLINK_CLASS) || href.contains(REDLINK_PARAM)
}

fn visible_text(a: &ElementRef<'_>) -> String {
    a.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stoplisted boilerplate (`[edit]`, `See also`, ...) or footnote numbers.
fn is_noise_label(label: &str) -> bool {
    let bare = label.trim_matches(|c: char| c == '[' || c == ']').trim();
    if !bare.is_empty() && bare.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let lower = bare.to_lowercase();
    LABEL_STOPLIST.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn page(anchors: &str) -> String {
        format!("<html><body><section>{anchors}</section></body></html>")
    }

    fn targets(links: &[LinkCandidate]) -> Vec<String> {
        let mut t: Vec<String> = links.iter().map(|l| l.target_title.clone()).collect();
        t.sort();
        t
    }

    #[test]
    fn drops_self_namespace_and_home_page() {
        let html = page(
            r#"<a href="/wiki/Cat">Cat</a>
               <a href="/wiki/File:Cat.jpg">Cat photo</a>
               <a href="/wiki/Main_Page">Main page</a>
               <a href="/wiki/Cat#History">History of cats</a>"#,
        );
        let links = extract_links(&html, "Cat", 5, &mut rng()).unwrap();
        assert!(links.is_empty(), "{links:?}");
    }

    #[test]
    fn keeps_ordinary_articles_from_both_prefixes() {
        let html = page(
            r#"<a href="/wiki/Felidae">Felidae</a>
               <a href="./Domestication" rel="mw:WikiLink">domestication</a>
               <a href="/wiki/Cat">Cat</a>"#,
        );
        let links = extract_links(&html, "cat", 5, &mut rng()).unwrap();
        assert_eq!(targets(&links), vec!["Domestication", "Felidae"]);
    }

    #[test]
    fn self_link_match_ignores_case_and_underscores() {
        let html = page(
            r#"<a href="/wiki/Alan_Turing">Turing</a>
               <a href="./alan_turing#Early_life">his early life</a>
               <a href="/wiki/Enigma_machine">Enigma</a>"#,
        );
        let links = extract_links(&html, "Alan Turing", 5, &mut rng()).unwrap();
        assert_eq!(targets(&links), vec!["Enigma_machine"]);
    }

    #[test]
    fn red_links_are_excluded() {
        let html = page(
            r#"<a href="/wiki/Nonexistent_thing" class="new">ghost</a>
               <a href="./Another_ghost?action=edit&amp;redlink=1">another ghost</a>
               <a href="/wiki/Real_page">real page</a>"#,
        );
        let links = extract_links(&html, "Origin", 5, &mut rng()).unwrap();
        assert_eq!(targets(&links), vec!["Real_page"]);
    }

    #[test]
    fn short_stoplisted_and_numeric_labels_are_excluded() {
        let html = page(
            r#"<a href="/wiki/A">A</a>
               <a href="/wiki/Editing">edit</a>
               <a href="/wiki/Helping">[Help]</a>
               <a href="/wiki/Footnotes">[12]</a>
               <a href="/wiki/Year_1999">1999</a>
               <a href="/wiki/Aardvark">   aard
                   vark  </a>"#,
        );
        let links = extract_links(&html, "Origin", 5, &mut rng()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_title, "Aardvark");
        assert_eq!(links[0].display_label, "aard vark");
    }

    #[test]
    fn query_and_fragment_are_stripped_and_titles_decoded() {
        let html = page(
            r#"<a href="/wiki/Caf%C3%A9_culture?oldid=12#Paris">café culture</a>"#,
        );
        let links = extract_links(&html, "Origin", 5, &mut rng()).unwrap();
        assert_eq!(links[0].target_title, "Café_culture");
    }

    #[test]
    fn encoded_namespace_separator_is_rejected() {
        let html = page(r#"<a href="/wiki/Category%3ACats">all cats</a>"#);
        assert!(extract_links(&html, "Origin", 5, &mut rng()).unwrap().is_empty());
    }

    #[test]
    fn external_and_other_paths_are_ignored() {
        let html = page(
            r##"<a href="https://example.org/wiki/Cat">external</a>
               <a href="/w/index.php?title=Cat">index</a>
               <a href="#cite_note-1">cite</a>"##,
        );
        assert!(extract_links(&html, "Origin", 5, &mut rng()).unwrap().is_empty());
    }

    #[test]
    fn dedupes_on_normalized_target_first_wins() {
        let html = page(
            r#"<a href="/wiki/Big_cat">big cats</a>
               <a href="./big_cat">Big cat</a>
               <a href="/wiki/Big%20cat#x">the big cat</a>"#,
        );
        let links = extract_links(&html, "Origin", 5, &mut rng()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].display_label, "big cats");
    }

    #[test]
    fn respects_max_links_and_never_repeats() {
        let anchors: String = (0..40)
            .map(|i| format!(r#"<a href="/wiki/Topic_{i}">topic {i}</a>"#))
            .collect();
        let html = page(&anchors);
        for max in [1usize, 3, 5, 10] {
            let links = extract_links(&html, "Topic_0", max, &mut rng()).unwrap();
            assert_eq!(links.len(), max);
            let keys: HashSet<_> = links.iter().map(|l| normalize_title(&l.target_title)).collect();
            assert_eq!(keys.len(), links.len());
            assert!(!keys.contains("topic 0"));
        }
    }

    #[test]
    fn samples_only_from_the_oversampled_prefix() {
        let anchors: String = (1..=50)
            .map(|i| format!(r#"<a href="/wiki/Topic_{i}">topic {i}</a>"#))
            .collect();
        let html = page(&anchors);
        let links = extract_links(&html, "Origin", 2, &mut rng()).unwrap();
        for l in &links {
            let n: usize = l.target_title.trim_start_matches("Topic_").parse().unwrap();
            assert!(n <= 2 * OVERSAMPLE, "{n} outside the oversampled window");
        }
    }

    #[test]
    fn zero_max_links_is_empty() {
        let html = page(r#"<a href="/wiki/Dog">dog</a>"#);
        assert!(extract_links(&html, "Cat", 0, &mut rng()).unwrap().is_empty());
    }

    #[test]
    fn empty_document_is_a_parse_error() {
        let err = extract_links("   ", "Cat", 5, &mut rng()).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn sample_titles_filters_and_labels() {
        let titles = vec![
            "Cat".to_string(),
            "Dog".to_string(),
            "dog".to_string(),
            "Main Page".to_string(),
            "Big_cat".to_string(),
            "Help:Contents".to_string(),
        ];
        let links = sample_titles(titles, "cat", 10, &mut rng());
        let mut labels: Vec<_> = links.iter().map(|l| l.display_label.clone()).collect();
        labels.sort();
        assert_eq!(labels, vec!["Big cat", "Dog"]);
    }

    #[test]
    fn sample_titles_truncates() {
        let titles = (0..30).map(|i| format!("Page {i}"));
        assert_eq!(sample_titles(titles, "x", 4, &mut rng()).len(), 4);
    }
}
