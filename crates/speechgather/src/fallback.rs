use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::UNAVAILABLE_SPEECH;

pub const MAX_FALLBACK_CHARS: usize = 100_000;

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No speech text found on {0}")]
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMatcher {
    DivClass(String),
    DivId(String),
    Css(String),
}

impl ContentMatcher {
    fn css(&self) -> String {
        match self {
            ContentMatcher::DivClass(class) => format!("div.{class}"),
            ContentMatcher::DivId(id) => format!("div#{id}"),
            ContentMatcher::Css(css) => css.clone(),
        }
    }

    pub fn find<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let css = self.css();
        let selector = Selector::parse(&css)
            .inspect_err(|e| log::warn!("Skipping invalid selector '{css}': {e:?}"))
            .ok()?;
        document.select(&selector).next()
    }
}

pub fn default_matchers() -> Vec<ContentMatcher> {
    vec![
        ContentMatcher::DivClass("speech".to_string()),
        ContentMatcher::DivClass("speech_text".to_string()),
        ContentMatcher::DivId("speech".to_string()),
        ContentMatcher::DivClass("debate-body".to_string()),
        ContentMatcher::DivClass("debate-speech__content".to_string()),
    ]
}

pub fn resolve_url(base: &Url, raw: &str) -> Result<Url, url::ParseError> {
    let unescaped = decode_entities(raw);
    let without_fragment = unescaped.split('#').next().unwrap_or_default().trim();
    let mut url = base.join(without_fragment)?;
    url.set_fragment(None);
    Ok(url)
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    // Only character references are decoded; `<` must stay literal text.
    Html::parse_fragment(&raw.replace('<', "&lt;"))
        .root_element()
        .text()
        .collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn container_text(container: ElementRef) -> String {
    container
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn page_text(document: &Html, max_chars: usize) -> String {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?.value().as_element()?;
            (!SKIPPED_TAGS.contains(&parent.name())).then_some(&**text)
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

pub fn extract_full_text(html: &str, matchers: &[ContentMatcher], max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let text = match matchers
        .iter()
        .find_map(|matcher| matcher.find(&document).map(|el| (matcher, el)))
    {
        Some((matcher, container)) => {
            log::debug!("Speech container matched by {:?}", matcher);
            container_text(container)
        }
        None => {
            log::warn!("Could not find a speech container, extracting entire page text");
            page_text(&document, max_chars)
        }
    };

    normalize_whitespace(&text)
}

/// Implementations never fail: they degrade to [`UNAVAILABLE_SPEECH`].
pub trait FullTextSource: Sync {
    fn fetch_full_text(&self, url: &str) -> impl Future<Output = String> + Send;
}

#[derive(Debug, Clone)]
pub struct FullTextFetcher {
    client: Client,
    base_url: Url,
    matchers: Vec<ContentMatcher>,
    max_fallback_chars: usize,
}

impl FullTextFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: crate::build_http_client(Duration::from_secs(30))?,
            base_url: parse_base(crate::BASE_URL)?,
            matchers: default_matchers(),
            max_fallback_chars: MAX_FALLBACK_CHARS,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, FetchError> {
        self.base_url = parse_base(base_url)?;
        Ok(self)
    }

    pub fn with_matchers(mut self, matchers: Vec<ContentMatcher>) -> Self {
        self.matchers = matchers;
        self
    }

    pub fn with_max_fallback_chars(mut self, max_chars: usize) -> Self {
        self.max_fallback_chars = max_chars;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let full_url = resolve_url(&self.base_url, url).map_err(|source| FetchError::Url {
            url: url.to_string(),
            source,
        })?;
        log::info!("Fetching full speech from {}", full_url);

        let html = self
            .client
            .get(full_url.as_str())
            .header(USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        let text = extract_full_text(&html, &self.matchers, self.max_fallback_chars);
        if text.is_empty() {
            return Err(FetchError::Empty(full_url.to_string()));
        }
        Ok(text)
    }
}

impl FullTextSource for FullTextFetcher {
    async fn fetch_full_text(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Unable to retrieve full speech from {}: {}", url, e);
                UNAVAILABLE_SPEECH.to_string()
            }
        }
    }
}

fn parse_base(base_url: &str) -> Result<Url, FetchError> {
    Url::parse(base_url).map_err(|source| FetchError::Url {
        url: base_url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base() -> Url {
        Url::parse("https://www.openaustralia.org.au").unwrap()
    }

    #[test]
    fn test_resolve_relative_url_drops_fragment() {
        let url = resolve_url(&base(), "/speech/123#frag").unwrap();
        assert_eq!(url.as_str(), "https://www.openaustralia.org.au/speech/123");
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_resolve_unescapes_entities() {
        let url = resolve_url(
            &base(),
            "/debates/?id=2024-02-06.45.1&amp;s=speaker%3A10809#g45.2",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.openaustralia.org.au/debates/?id=2024-02-06.45.1&s=speaker%3A10809"
        );
    }

    #[test]
    fn test_resolve_keeps_angle_brackets_as_text() {
        let url = resolve_url(&base(), "/search/?q=a<b&amp;p=1").unwrap();
        assert_eq!(url.path(), "/search/");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("q".to_string(), "a<b".to_string()),
                ("p".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_host() {
        let url = resolve_url(&base(), "https://example.org/senate/?id=1#g1").unwrap();
        assert_eq!(url.as_str(), "https://example.org/senate/?id=1");
    }

    #[test]
    fn test_first_matcher_wins() {
        let html = r#"
            <html><body>
                <div class="debate-body"><p>Lower priority template.</p></div>
                <div class="speech_text"><p>Second template.</p></div>
                <div class="speech"><p>Preferred template.</p></div>
            </body></html>
        "#;

        let text = extract_full_text(html, &default_matchers(), MAX_FALLBACK_CHARS);
        assert_eq!(text, "Preferred template.");
    }

    #[test]
    fn test_falls_through_to_later_matchers() {
        let html = r#"
            <html><body>
                <div id="speech"><p>Identified by id.</p></div>
                <div class="debate-body"><p>Debate body.</p></div>
            </body></html>
        "#;

        let text = extract_full_text(html, &default_matchers(), MAX_FALLBACK_CHARS);
        assert_eq!(text, "Identified by id.");
    }

    #[test]
    fn test_class_matching_uses_class_tokens() {
        let html = r#"<div class="main speech highlighted"><p>Token match.</p></div>"#;
        let text = extract_full_text(html, &default_matchers(), MAX_FALLBACK_CHARS);
        assert_eq!(text, "Token match.");
    }

    #[test]
    fn test_container_paragraphs_are_joined() {
        let html = fs::read_to_string("fixtures/debate_page.html").expect("Failed to read fixture");

        let text = extract_full_text(&html, &default_matchers(), MAX_FALLBACK_CHARS);

        assert!(text.starts_with("Thank you Mr Speaker."), "got: {text}");
        assert!(text.contains("second reading. The measures"));
        assert!(text.ends_with("I commend the bill to the House."));
        assert!(!text.contains("Site navigation"));
        assert!(!text.contains("  "));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_no_container_uses_page_text() {
        let html = r#"
            <html><head><title>Hansard</title><script>var tracking = 1;</script></head>
            <body><h1>Senate</h1>
            <p>Some   remarks
               across lines.</p></body></html>
        "#;

        let text = extract_full_text(html, &default_matchers(), MAX_FALLBACK_CHARS);

        assert_eq!(text, "Hansard Senate Some remarks across lines.");
    }

    #[test]
    fn test_page_text_is_capped() {
        let body = "word ".repeat(1_000);
        let html = format!("<html><body><p>{body}</p></body></html>");

        let text = extract_full_text(&html, &default_matchers(), 50);

        assert!(text.chars().count() <= 50);
        assert!(text.starts_with("word word"));
    }

    #[test]
    fn test_custom_matchers() {
        let html = r#"<section data-role="remarks"><p>Custom.</p></section><div class="speech">Default.</div>"#;
        let matchers = vec![ContentMatcher::Css(r#"section[data-role="remarks"]"#.to_string())];

        assert_eq!(extract_full_text(html, &matchers, MAX_FALLBACK_CHARS), "Custom.");
    }

    #[test]
    fn test_invalid_matcher_is_skipped() {
        let html = r#"<div class="speech">Still found.</div>"#;
        let matchers = vec![
            ContentMatcher::Css("div[".to_string()),
            ContentMatcher::DivClass("speech".to_string()),
        ];

        assert_eq!(extract_full_text(html, &matchers, MAX_FALLBACK_CHARS), "Still found.");
    }

    #[tokio::test]
    async fn test_unreachable_page_yields_sentinel() {
        let fetcher = FullTextFetcher::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:1")
            .unwrap();

        let text = fetcher.fetch_full_text("/debates/?id=1").await;

        assert_eq!(text, UNAVAILABLE_SPEECH);
    }
}
