// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Selector synthesis with tiered fallback strategies.
//!
//! Preference order: role/ARIA, data-test attributes, semantic HTML, CSS,
//! XPath (converted to CSS where simple). The emitted expression chains the
//! tiers with the `>>` then-try combinator, so a fallback only applies when
//! everything before it resolved nothing.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// Class-name shapes that are toolchain-generated and unstable across builds.
#[allow(clippy::unwrap_used)]
static DYNAMIC_CLASS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"^[a-f0-9]{8,}$", r"^\w{32,}$", r"\d{4,}", r"js-", r"react-"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Strategy tiers in strict preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectorStrategy {
    RoleAria,
    DataTestId,
    Semantic,
    CssFallback,
    XpathFallback,
}

impl SelectorStrategy {
    pub fn all() -> [SelectorStrategy; 5] {
        [
            Self::RoleAria,
            Self::DataTestId,
            Self::Semantic,
            Self::CssFallback,
            Self::XpathFallback,
        ]
    }
}

/// Everything known about the element a generated step interacts with.
#[derive(Debug, Clone, Default)]
pub struct ElementInfo {
    /// Element tag (`input`, `button`, `form`, ...).
    pub tag: String,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    pub aria_labelledby: Option<String>,
    pub label: Option<String>,
    /// `data-*` attributes present on the element.
    pub data: BTreeMap<String, String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub text: Option<String>,
    pub class: Option<String>,
}

impl ElementInfo {
    /// Minimal info for a form field referenced only by name.
    pub fn named_field(tag: &str, name: &str) -> Self {
        Self { tag: tag.to_string(), name: Some(name.to_string()), ..Default::default() }
    }
}

/// Build the chained locator expression across all strategies.
///
/// Falls back to a match-anything locator when no strategy produced a
/// selector, which only happens for an empty [`ElementInfo`].
pub fn locator_chain(element: &ElementInfo) -> String {
    let selectors: Vec<String> = SelectorStrategy::all()
        .iter()
        .filter_map(|s| selector_for(*s, element))
        .collect();
    if selectors.is_empty() {
        return r#"page.locator("*")"#.to_string();
    }
    selectors
        .iter()
        .map(|s| format!(r#"page.locator("{}")"#, s))
        .collect::<Vec<_>>()
        .join(" >> ")
}

/// Selector for one strategy tier, if the element carries enough information.
pub fn selector_for(strategy: SelectorStrategy, element: &ElementInfo) -> Option<String> {
    match strategy {
        SelectorStrategy::RoleAria => role_aria(element),
        SelectorStrategy::DataTestId => data_testid(element),
        SelectorStrategy::Semantic => semantic(element),
        SelectorStrategy::CssFallback => Some(css_fallback(element)),
        SelectorStrategy::XpathFallback => xpath_fallback(element),
    }
}

fn role_aria(element: &ElementInfo) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(role) = &element.role {
        parts.push(format!(r#"[role="{}"]"#, role));
    } else if matches!(element.tag.as_str(), "button" | "link" | "textbox" | "checkbox") {
        parts.push(format!(r#"[role="{}"]"#, element.tag));
    }

    if let Some(aria) = &element.aria_label {
        parts.push(format!(r#"[aria-label="{}"]"#, aria));
        parts.push(format!(r#"[aria-label*="{}"]"#, aria));
    }
    if let Some(label) = &element.label {
        if element.aria_label.as_deref() != Some(label) {
            parts.push(format!(r#"[aria-label*="{}"]"#, label));
        }
    }
    if let Some(labelledby) = &element.aria_labelledby {
        parts.push(format!(r#"[aria-labelledby*="{}"]"#, labelledby));
    }

    join_parts(parts)
}

fn data_testid(element: &ElementInfo) -> Option<String> {
    const TEST_ATTRS: [&str; 5] = ["data-testid", "data-cy", "data-test", "data-e2e", "data-qa"];
    let mut parts = Vec::new();

    for attr in TEST_ATTRS {
        if let Some(value) = element.data.get(attr) {
            parts.push(format!(r#"[{}="{}"]"#, attr, value));
        }
    }
    // Other data attributes that look identifying.
    for (key, value) in &element.data {
        if !TEST_ATTRS.contains(&key.as_str())
            && key.starts_with("data-")
            && ["id", "name", "key"].iter().any(|t| key.contains(t))
        {
            parts.push(format!(r#"[{}="{}"]"#, key, value));
        }
    }

    join_parts(parts)
}

fn semantic(element: &ElementInfo) -> Option<String> {
    let tag = &element.tag;
    let mut parts = Vec::new();

    if let Some(id) = &element.id {
        parts.push(format!("#{}", id));
        parts.push(format!(r#"{}[id="{}"]"#, tag, id));
    }
    if let Some(name) = &element.name {
        parts.push(format!(r#"{}[name="{}"]"#, tag, name));
    }
    if let Some(placeholder) = &element.placeholder {
        parts.push(format!(r#"{}[placeholder="{}"]"#, tag, placeholder));
        parts.push(format!(r#"{}[placeholder*="{}"]"#, tag, placeholder));
    }
    if let Some(text) = &element.text {
        match tag.as_str() {
            "button" => {
                parts.push(format!(r#"button:has-text("{}")"#, text));
                parts.push(format!(r#"[role="button"]:has-text("{}")"#, text));
            }
            _ => parts.push(format!(r#"{}:has-text("{}")"#, tag, text)),
        }
    }
    if let Some(class) = stable_first_class(element) {
        parts.push(format!("{}.{}", tag, class));
    }

    join_parts(parts)
}

fn css_fallback(element: &ElementInfo) -> String {
    let tag = &element.tag;
    let mut parts = vec![tag.clone()];

    if let Some(name) = &element.name {
        parts.push(format!(r#"{}[name="{}"]"#, tag, name));
    }
    if let Some(id) = &element.id {
        parts.push(format!("{}#{}", tag, id));
    }
    if let Some(class) = stable_first_class(element) {
        parts.push(format!("{}.{}", tag, class));
    }

    parts.join(" >> ")
}

fn xpath_fallback(element: &ElementInfo) -> Option<String> {
    let tag = &element.tag;
    let mut xpaths = vec![format!("//{}", tag)];

    if let Some(name) = &element.name {
        xpaths.push(format!(r#"//{}[contains(@name, "{}")]"#, tag, name));
    }
    if let Some(id) = &element.id {
        xpaths.push(format!(r#"//{}[contains(@id, "{}")]"#, tag, id));
    }
    if let Some(text) = &element.text {
        xpaths.push(format!(r#"//{}[contains(text(), "{}")]"#, tag, text));
    }

    let css: Vec<String> = xpaths.iter().filter_map(|x| xpath_to_css(x)).collect();
    if css.is_empty() {
        Some(format!("//{}", tag))
    } else {
        Some(css.join(" >> "))
    }
}

/// Convert a simple XPath into its CSS equivalent. Returns `None` for shapes
/// with no clean translation.
pub fn xpath_to_css(xpath: &str) -> Option<String> {
    let xpath = xpath.trim().strip_prefix("//").unwrap_or(xpath);

    if !xpath.contains('[') {
        if xpath.contains('/') {
            return None;
        }
        return Some(xpath.to_string());
    }

    let (element, rest) = xpath.split_once('[')?;
    let attr_content = rest.split(']').next()?;
    let quoted = attr_content.split('"').nth(1)?;

    if attr_content.starts_with("contains(@name,") {
        Some(format!(r#"{}[name*="{}"]"#, element, quoted))
    } else if attr_content.starts_with("contains(@id,") {
        Some(format!(r#"{}[id*="{}"]"#, element, quoted))
    } else if attr_content.starts_with("contains(text(),") {
        Some(format!(r#"{}:has-text("{}")"#, element, quoted))
    } else {
        None
    }
}

/// First class of the element, unless the class attribute as a whole looks
/// dynamically generated. The full string is checked first: one rotating
/// token poisons every class on the element.
fn stable_first_class(element: &ElementInfo) -> Option<String> {
    let class = element.class.as_ref()?;
    if is_dynamic_class(class) {
        return None;
    }
    class.split_whitespace().next().map(str::to_string)
}

/// Check if a class name appears to be dynamically generated.
pub fn is_dynamic_class(class_name: &str) -> bool {
    DYNAMIC_CLASS_PATTERNS.iter().any(|p| p.is_match(class_name))
}

fn join_parts(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" >> "))
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
