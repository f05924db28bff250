use fancy_regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::models::quote::Quote;

/// Pulls quotes out of a bash.im page.
///
/// Selectors and patterns are compiled once in [`QuoteExtractor::new`] and the
/// extractor holds no other state, so a single instance can be shared between
/// concurrent requests.
pub struct QuoteExtractor {
    base_url: String,
    quote: Selector,
    permalink: Selector,
    date: Selector,
    body: Selector,
    total: Selector,
    whitespace: Regex,
    line_break: Regex,
}

impl QuoteExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        QuoteExtractor {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            quote: Selector::parse("article.quote").unwrap(),
            permalink: Selector::parse(".quote__header_permalink").unwrap(),
            date: Selector::parse(".quote__header_date").unwrap(),
            body: Selector::parse(".quote__body").unwrap(),
            total: Selector::parse(".quote__total").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            line_break: Regex::new(r"(?i)<\s*/?\s*br\s*/?\s*>").unwrap(),
        }
    }

    /// Returns the quotes found in `html` in document order.
    ///
    /// A `max_items` of zero means no limit. Blocks that are missing a field or carry
    /// an unusable id are skipped; they never fail the whole page.
    pub fn extract(&self, html: &str, max_items: usize) -> Vec<Quote> {
        let document = Html::parse_document(html);
        let limit = if max_items == 0 { usize::MAX } else { max_items };

        document
            .select(&self.quote)
            .filter_map(|block| self.parse_block(block))
            .take(limit)
            .collect()
    }

    fn parse_block(&self, block: ElementRef<'_>) -> Option<Quote> {
        let raw_id = block.value().attr("data-quote").unwrap_or_default().trim();

        let id = match raw_id.parse::<u64>() {
            Ok(0) | Err(_) => {
                tracing::debug!(id = %raw_id, "skipping quote block without a usable id");
                return None;
            }
            Ok(id) => id,
        };

        let landmarks = (
            block.select(&self.permalink).next(),
            block.select(&self.date).next(),
            block.select(&self.body).next(),
            block.select(&self.total).next(),
        );

        let (Some(permalink), Some(date), Some(body), Some(total)) = landmarks else {
            tracing::debug!(id, "skipping quote block with missing fields");
            return None;
        };

        Some(Quote {
            id,
            created: self.collapse_whitespace(&date.text().collect::<String>()),
            rating: self.collapse_whitespace(&total.text().collect::<String>()),
            permalink: self.absolute_permalink(permalink.value().attr("href").unwrap_or_default()),
            text: self.body_text(body),
        })
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_owned()
    }

    fn absolute_permalink(&self, href: &str) -> String {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            String::new()
        } else if href.starts_with("http://") || href.starts_with("https://") {
            href.to_owned()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }

    fn body_text(&self, body: ElementRef<'_>) -> String {
        let mut text = String::new();
        collect_text(body, &mut text);

        // the parser has already decoded entities, so markup that was escaped in the
        // page (`&lt;br&gt;`) shows up here as literal text.
        let text = self.line_break.replace_all(text.trim(), "\n");

        escape_markdown(&text)
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for ch in text.chars() {
        if matches!(ch, '`' | '*' | '_') {
            escaped.push('\\');
        }

        escaped.push(ch);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::bashim::BASH_URL;

    fn block(id: &str, href: &str, date: &str, body: &str, total: &str) -> String {
        format!(
            r#"
            <article class="quote" data-quote="{id}">
              <div class="quote__frame">
                <header class="quote__header">
                  <a class="quote__header_permalink" href="{href}">#{id}</a>
                  <div class="quote__header_date">{date}</div>
                </header>
                <div class="quote__body">
                  {body}
                </div>
                <footer class="quote__footer">
                  <div class="quote__total">{total}</div>
                </footer>
              </div>
            </article>
            "#
        )
    }

    fn simple(id: u64) -> String {
        block(
            &id.to_string(),
            &format!("/quote/{id}"),
            "20.05.2020 в 10:06",
            &format!("quote number {id}"),
            "100",
        )
    }

    fn page(blocks: &[String]) -> String {
        format!(
            "<html><head><title>bash.im</title></head><body><main>{}</main></body></html>",
            blocks.concat()
        )
    }

    fn extract(html: &str, max_items: usize) -> Vec<Quote> {
        QuoteExtractor::new(BASH_URL).extract(html, max_items)
    }

    #[test]
    fn extracts_all_fields() {
        let html = page(&[block(
            "4242",
            "/quote/4242",
            "\n      20.05.2020 в   10:06\n    ",
            "first line<br>second line",
            "  1337 ",
        )]);

        let quotes = extract(&html, 0);

        assert_eq!(
            quotes,
            vec![Quote {
                id: 4242,
                created: "20.05.2020 в 10:06".to_string(),
                rating: "1337".to_string(),
                permalink: "https://bash.im/quote/4242".to_string(),
                text: "first line\nsecond line".to_string(),
            }]
        );
    }

    #[test]
    fn keeps_document_order() {
        let html = page(&[simple(3), simple(1), simple(2)]);

        let ids: Vec<u64> = extract(&html, 0).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn max_items_takes_first_quotes() {
        let html = page(&[simple(111), simple(222)]);

        let quotes = extract(&html, 1);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id, 111);
    }

    #[test]
    fn zero_max_items_means_unlimited() {
        let blocks: Vec<String> = (1..=30).map(simple).collect();

        assert_eq!(extract(&page(&blocks), 0).len(), 30);
        assert_eq!(extract(&page(&blocks), 25).len(), 25);
        assert_eq!(extract(&page(&blocks), 40).len(), 30);
    }

    #[test]
    fn limit_counts_only_valid_quotes() {
        let html = page(&[
            block("0", "/quote/0", "date", "zero", "1"),
            simple(5),
            simple(6),
        ]);

        let ids: Vec<u64> = extract(&html, 2).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn skips_blocks_with_missing_fields() {
        let no_total = r#"
            <article class="quote" data-quote="2">
              <a class="quote__header_permalink" href="/quote/2">#2</a>
              <div class="quote__header_date">date</div>
              <div class="quote__body">no rating here</div>
            </article>
        "#
        .to_string();
        let no_body = r#"
            <article class="quote" data-quote="3">
              <a class="quote__header_permalink" href="/quote/3">#3</a>
              <div class="quote__header_date">date</div>
              <div class="quote__total">5</div>
            </article>
        "#
        .to_string();
        let no_permalink = r#"
            <article class="quote" data-quote="4">
              <div class="quote__header_date">date</div>
              <div class="quote__body">text</div>
              <div class="quote__total">5</div>
            </article>
        "#
        .to_string();
        let no_date = r#"
            <article class="quote" data-quote="5">
              <a class="quote__header_permalink" href="/quote/5">#5</a>
              <div class="quote__body">text</div>
              <div class="quote__total">5</div>
            </article>
        "#
        .to_string();

        let html = page(&[simple(1), no_total, no_body, no_permalink, no_date, simple(6)]);

        let ids: Vec<u64> = extract(&html, 0).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![1, 6]);
    }

    #[test]
    fn skips_zero_and_non_numeric_ids() {
        let html = page(&[
            block("0", "/quote/0", "date", "zero", "1"),
            block("abc", "/quote/abc", "date", "letters", "1"),
            block("-7", "/quote/7", "date", "negative", "1"),
            block("", "/quote/", "date", "empty", "1"),
            simple(8),
        ]);

        let ids: Vec<u64> = extract(&html, 0).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![8]);
    }

    #[test]
    fn skips_blocks_without_id_attribute() {
        let html = page(&[
            r#"<article class="quote">
                 <a class="quote__header_permalink" href="/quote/1">#1</a>
                 <div class="quote__header_date">date</div>
                 <div class="quote__body">text</div>
                 <div class="quote__total">1</div>
               </article>"#
                .to_string(),
            simple(2),
        ]);

        let ids: Vec<u64> = extract(&html, 0).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn ignores_non_quote_articles() {
        let html = page(&[
            r#"<article class="news" data-quote="9"><div class="quote__body">ad</div></article>"#
                .to_string(),
            simple(10),
        ]);

        let ids: Vec<u64> = extract(&html, 0).iter().map(|q| q.id).collect();

        assert_eq!(ids, vec![10]);
    }

    #[test]
    fn line_break_spellings_become_newlines() {
        let html = page(&[block(
            "1",
            "/quote/1",
            "date",
            "one<br>two<br/>three<br />four<BR>five",
            "1",
        )]);

        let quotes = extract(&html, 0);

        assert_eq!(quotes[0].text, "one\ntwo\nthree\nfour\nfive");
    }

    #[test]
    fn escaped_line_breaks_become_newlines() {
        let html = page(&[block("1", "/quote/1", "date", "one&lt;br&gt;two", "1")]);

        assert_eq!(extract(&html, 0)[0].text, "one\ntwo");
    }

    #[test]
    fn decodes_entities() {
        let html = page(&[block(
            "1",
            "/quote/1",
            "date",
            "Tom &amp; Jerry &quot;quoted&quot; &lt;tag&gt; &#8212; done",
            "1",
        )]);

        assert_eq!(
            extract(&html, 0)[0].text,
            "Tom & Jerry \"quoted\" <tag> \u{2014} done"
        );
    }

    #[test]
    fn escapes_markdown_once() {
        let html = page(&[block("1", "/quote/1", "date", "a*b_c`d", "1")]);

        assert_eq!(extract(&html, 0)[0].text, "a\\*b\\_c\\`d");
    }

    #[test]
    fn escapes_only_the_body() {
        let html = page(&[block("1", "/quote/1", "10_05*", "body", "1_0")]);

        let quote = &extract(&html, 0)[0];

        assert_eq!(quote.created, "10_05*");
        assert_eq!(quote.rating, "1_0");
    }

    #[test]
    fn keeps_text_of_nested_markup() {
        let html = page(&[block(
            "1",
            "/quote/1",
            "date",
            "<b>xxx:</b> hello<br><span>yyy:</span> hi",
            "1",
        )]);

        assert_eq!(extract(&html, 0)[0].text, "xxx: hello\nyyy: hi");
    }

    #[test]
    fn fragment_permalink_is_empty() {
        let html = page(&[block("1", "#something", "date", "text", "1")]);

        assert_eq!(extract(&html, 0)[0].permalink, "");
    }

    #[test]
    fn relative_permalink_gets_base_url() {
        let html = page(&[block("123", "/quote/123", "date", "text", "1")]);

        assert_eq!(extract(&html, 0)[0].permalink, "https://bash.im/quote/123");
    }

    #[test]
    fn absolute_permalink_is_kept() {
        let html = page(&[block("1", "https://bash.im/quote/1", "date", "text", "1")]);

        assert_eq!(extract(&html, 0)[0].permalink, "https://bash.im/quote/1");
    }

    #[test]
    fn permalink_without_href_is_empty() {
        let html = page(&[r#"
            <article class="quote" data-quote="1">
              <span class="quote__header_permalink">#1</span>
              <div class="quote__header_date">date</div>
              <div class="quote__body">text</div>
              <div class="quote__total">1</div>
            </article>
        "#
        .to_string()]);

        let quotes = extract(&html, 0);

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].permalink, "");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let extractor = QuoteExtractor::new("http://localhost:8080/");

        let quotes = extractor.extract(&page(&[simple(7)]), 0);

        assert_eq!(quotes[0].permalink, "http://localhost:8080/quote/7");
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(extract("", 0).is_empty());
        assert!(extract("not html at all <<<>>>", 0).is_empty());
        assert!(extract("<article class=\"quote\" data-quote=\"1\"", 0).is_empty());
    }
}
