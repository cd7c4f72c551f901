//! Reward scanner for Kickstarter pledge pages.
//!
//! The page is tokenized by `scraper`, then walked once in document order as
//! a stream of start-tag / text / end-tag events. A [`RewardScanner`] owns all
//! scan state, so every call to [`parse`] starts from a fresh machine.

use crate::kickstarter::markers::{
    AMOUNT_ATTRS, AMOUNT_CLASS, AMOUNT_TAG, CONTAINER_TAG, ID_ATTR, SOLD_OUT_CLASS, TITLE_CLASS,
};
use crate::kickstarter::models::{Reward, Snapshot};
use scraper::node::Element;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

/// Parses a pledge page into the limited rewards it lists, in document order.
pub fn parse(html: &str) -> Snapshot {
    Snapshot::new(RewardScanner::new().scan(html))
}

/// Extracts a currency value by dropping everything but digits and `.`.
///
/// `"$1,234.50"` becomes `1234.5`. Returns `None` when nothing numeric is left
/// or the remainder is not a valid number (e.g. `"1.2.3"`).
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

enum Step<'a> {
    Open(ElementRef<'a>),
    Text(&'a str),
    Close(&'a str),
}

/// Finite-state scanner over tag and text events.
///
/// Element depth is tracked so that the reward block and the title block end
/// on the close of the element that opened them, regardless of what is nested
/// inside.
#[derive(Debug, Default)]
pub struct RewardScanner {
    depth: usize,
    reward_depth: Option<usize>,
    description_depth: Option<usize>,
    current_amount: Option<f64>,
    current_id: Option<String>,
    current_description: String,
    rewards: Vec<Reward>,
    skipped: usize,
}

impl RewardScanner {
    /// Creates a scanner in the outside-any-reward state.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while inside a sold-out reward container.
    pub fn in_reward_block(&self) -> bool {
        self.reward_depth.is_some()
    }

    /// True while inside the title of the current reward.
    pub fn in_description_block(&self) -> bool {
        self.description_depth.is_some()
    }

    /// Number of reward blocks dropped for missing an amount or id.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Runs the scanner over a whole document and returns the emitted rewards.
    pub fn scan(mut self, html: &str) -> Vec<Reward> {
        self.feed(html);

        debug!(
            "Parsed {} limited rewards ({} malformed blocks skipped)",
            self.rewards.len(),
            self.skipped
        );

        self.finish()
    }

    /// Tokenizes a document and drives the event handlers in document order.
    pub fn feed(&mut self, html: &str) {
        let document = Html::parse_document(html);
        let mut stack = vec![Step::Open(document.root_element())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open(element) => {
                    self.start_tag(element.value());
                    stack.push(Step::Close(element.value().name()));

                    let children: Vec<_> = element.children().collect();
                    for child in children.into_iter().rev() {
                        if let Some(child_element) = ElementRef::wrap(child) {
                            stack.push(Step::Open(child_element));
                        } else if let Some(text) = child.value().as_text() {
                            stack.push(Step::Text(&**text));
                        }
                    }
                }
                Step::Text(text) => self.text(text),
                Step::Close(name) => self.end_tag(name),
            }
        }
    }

    /// Handles a start tag.
    pub fn start_tag(&mut self, element: &Element) {
        self.depth += 1;
        let has_class = |class: &str| element.classes().any(|c| c == class);

        if !self.in_reward_block() {
            if element.name() == CONTAINER_TAG && has_class(SOLD_OUT_CLASS) {
                trace!("Entering sold-out reward block at depth {}", self.depth);
                self.reward_depth = Some(self.depth);
                self.description_depth = None;
                self.current_amount = None;
                self.current_id = None;
                self.current_description.clear();
            }
            return;
        }

        if !self.in_description_block() && has_class(TITLE_CLASS) {
            self.description_depth = Some(self.depth);
        }

        if element.name() == AMOUNT_TAG && has_class(AMOUNT_CLASS) {
            self.current_amount =
                AMOUNT_ATTRS.iter().filter_map(|attr| element.attr(attr)).find_map(parse_amount);
            self.current_id = element.attr(ID_ATTR).map(String::from);
        }
    }

    /// Handles character data.
    pub fn text(&mut self, text: &str) {
        if self.in_description_block() {
            self.current_description.extend(text.chars().filter(char::is_ascii));
        }
    }

    /// Handles an end tag.
    pub fn end_tag(&mut self, name: &str) {
        if self.description_depth == Some(self.depth) {
            self.description_depth = None;
        }

        if self.reward_depth == Some(self.depth) {
            trace!("Leaving reward block at </{}>", name);
            self.emit();
            self.reward_depth = None;
        }

        self.depth = self.depth.saturating_sub(1);
    }

    /// Consumes the scanner and returns the rewards emitted so far.
    pub fn finish(self) -> Vec<Reward> {
        self.rewards
    }

    fn emit(&mut self) {
        let description = self.current_description.split_whitespace().collect::<Vec<_>>().join(" ");

        let reward = match (self.current_amount.take(), self.current_id.take()) {
            (Some(amount), Some(id)) => Reward::new(amount, id, description),
            _ => None,
        };

        match reward {
            Some(reward) => {
                trace!("Parsed reward: {} ${:.2} {}", reward.id, reward.amount, reward.description);
                self.rewards.push(reward);
            }
            None => {
                trace!("Skipping reward block without a usable amount or id");
                self.skipped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward_block(amount: &str, id: &str, title: &str) -> String {
        format!(
            r#"<li class="pledge--all-gone pledge-selectable-sidebar">
                <input class="pledge__radio" id="{}" title="{}" type="radio" />
                <h3 class="pledge__title">{}</h3>
            </li>"#,
            id, amount, title
        )
    }

    fn page(body: &str) -> String {
        format!("<html><body><ol>{}</ol></body></html>", body)
    }

    // Amount extraction tests

    #[test]
    fn test_parse_amount_currency_formats() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.50));
        assert_eq!(parse_amount("$75.00"), Some(75.0));
        assert_eq!(parse_amount("US$ 10"), Some(10.0));
        assert_eq!(parse_amount("€29"), Some(29.0));
        assert_eq!(parse_amount("Pledge $5 or more"), Some(5.0));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("free"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    // Scanner tests

    #[test]
    fn test_parse_single_block() {
        let html = page(&reward_block("$75.00", "backer_reward_1", "Early &amp; Limited"));
        let snapshot = parse(&html);

        assert_eq!(snapshot.count(), 1);
        let reward = &snapshot.rewards[0];
        assert_eq!(reward.amount, 75.0);
        assert_eq!(reward.id, "backer_reward_1");
        assert_eq!(reward.description, "Early & Limited");
    }

    #[test]
    fn test_parse_keeps_document_order() {
        let html = page(&format!(
            "{}{}{}",
            reward_block("$10", "r1", "One"),
            reward_block("$20", "r2", "Two"),
            reward_block("$30", "r3", "Three")
        ));
        let ids: Vec<_> = parse(&html).rewards.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_parse_ignores_available_rewards() {
        let html = page(&format!(
            r#"<li class="pledge--available">
                <input class="pledge__radio" id="open" title="$5.00" />
                <h3 class="pledge__title">Open tier</h3>
            </li>{}"#,
            reward_block("$75.00", "gone", "Sold out")
        ));
        let snapshot = parse(&html);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.rewards[0].id, "gone");
    }

    #[test]
    fn test_parse_skips_block_missing_amount() {
        let html = page(&format!(
            r#"<li class="pledge--all-gone">
                <input class="pledge__radio" id="broken" />
                <h3 class="pledge__title">No price</h3>
            </li>{}"#,
            reward_block("$50.00", "good", "Fine")
        ));
        let snapshot = parse(&html);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.rewards[0].id, "good");
    }

    #[test]
    fn test_parse_skips_block_missing_id() {
        let html = page(
            r#"<li class="pledge--all-gone">
                <input class="pledge__radio" title="$50.00" />
            </li>"#,
        );
        assert!(parse(&html).is_empty());
    }

    #[test]
    fn test_scanner_counts_skipped_blocks() {
        let html = page(&format!(
            r#"<li class="pledge--all-gone"><h3 class="pledge__title">Empty</h3></li>{}"#,
            reward_block("$1", "ok", "Ok")
        ));
        let mut scanner = RewardScanner::new();
        scanner.feed(&html);
        assert_eq!(scanner.skipped(), 1);
        assert!(!scanner.in_reward_block());
        assert!(!scanner.in_description_block());
        assert_eq!(scanner.finish().len(), 1);
    }

    #[test]
    fn test_description_normalized() {
        let html = page(
            r#"<li class="pledge--all-gone">
                <input class="pledge__radio" id="r" title="$5" />
                <h3 class="pledge__title">
                    Caf&eacute;   edition
                    <span>with   extras</span>
                </h3>
                <p>Not part of the title</p>
            </li>"#,
        );
        let snapshot = parse(&html);
        assert_eq!(snapshot.rewards[0].description, "Caf edition with extras");
    }

    #[test]
    fn test_nested_list_does_not_end_block_early() {
        let html = page(
            r#"<li class="pledge--all-gone">
                <h3 class="pledge__title">Bundle</h3>
                <ul><li>Item one</li><li>Item two</li></ul>
                <input class="pledge__radio" id="bundle" title="$120.00" />
            </li>"#,
        );
        let snapshot = parse(&html);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.rewards[0].id, "bundle");
        assert_eq!(snapshot.rewards[0].amount, 120.0);
    }

    #[test]
    fn test_unrelated_malformed_markup_is_ignored() {
        let html = format!(
            "<html><body><div><span><p>unclosed</div></i></table>{}</body>",
            reward_block("$42.00", "r42", "Answer")
        );
        let snapshot = parse(&html);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.rewards[0].amount, 42.0);
    }

    #[test]
    fn test_amount_falls_back_to_alt() {
        let html = page(
            r#"<li class="pledge--all-gone">
                <input class="pledge__radio" id="r" alt="$15.00" />
            </li>"#,
        );
        assert_eq!(parse(&html).rewards[0].amount, 15.0);
    }

    #[test]
    fn test_amount_skips_empty_attribute() {
        let html = page(
            r#"<li class="pledge--all-gone">
                <input class="pledge__radio" id="r" title="" aria-label="Pledge" alt="$25.00" />
            </li>"#,
        );
        let snapshot = parse(&html);
        assert_eq!(snapshot.count(), 1);
        assert_eq!(snapshot.rewards[0].amount, 25.0);
    }

    #[test]
    fn test_parse_is_pure() {
        let html = page(&format!(
            "{}{}",
            reward_block("$10", "a", "A"),
            reward_block("$20", "b", "B")
        ));
        assert_eq!(parse(&html), parse(&html));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("").is_empty());
        assert!(parse("<html><body><p>No rewards</p></body></html>").is_empty());
    }
}
