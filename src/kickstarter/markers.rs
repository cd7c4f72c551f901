//! Markup markers for Kickstarter pledge pages.
//!
//! All class names and attributes the reward scanner keys on live here.
//! Update this file when Kickstarter changes their HTML structure.
//!
//! A sold-out reward looks like:
//!
//! ```html
//! <li class="pledge--all-gone" ...>
//!   <input class="pledge__radio" id="backer_reward_123" title="$75.00" ... />
//!   <h3 class="pledge__title">Limited edition</h3>
//! </li>
//! ```

/// Element that wraps one reward tier.
pub const CONTAINER_TAG: &str = "li";

/// Class on the container when the tier has no remaining quantity.
pub const SOLD_OUT_CLASS: &str = "pledge--all-gone";

/// Class on the heading that carries the reward title.
pub const TITLE_CLASS: &str = "pledge__title";

/// Element used as the pledge-amount control.
pub const AMOUNT_TAG: &str = "input";

/// Class on the pledge-amount control.
pub const AMOUNT_CLASS: &str = "pledge__radio";

/// Attributes holding the formatted amount, in order of preference.
pub const AMOUNT_ATTRS: &[&str] = &["title", "aria-label", "alt"];

/// Attribute holding the reward identifier.
pub const ID_ATTR: &str = "id";

/// Path appended to the project URL to reach the pledge page.
pub const PLEDGE_PATH: &str = "/pledge/new";
