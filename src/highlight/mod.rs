//! Active-link marking for the sidebar.
//!
//! `mark_active` is the whole feature: given a parsed page and the route
//! name resolved for the request, it restyles the matching nav anchors and
//! their badges. It is a plain function over the tree so it can be tested
//! against hand-built DOMs, and it is idempotent: class adds are no-ops on
//! classes already present, so running it twice leaves the same markup.

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, NodeId};

/// The class vocabulary of the sidebar markup. The defaults are the
/// portal's actual classes; a deployment with a different stylesheet can
/// override them from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub container_id: String,
    pub link_class: String,
    pub route_attr: String,
    pub active_link_classes: Vec<String>,
    pub badge_marker_class: String,
    pub alert_class: String,
    pub muted_badge_classes: Vec<String>,
    pub active_badge_classes: Vec<String>,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        HighlightStyle {
            container_id: "sidebar-nav".to_string(),
            link_class: "nav-item".to_string(),
            route_attr: "data-url".to_string(),
            active_link_classes: vec![
                "bg-brand-600".to_string(),
                "text-white".to_string(),
                "shadow-lg".to_string(),
                "shadow-brand-900/20".to_string(),
            ],
            badge_marker_class: "rounded-full".to_string(),
            alert_class: "bg-red-500".to_string(),
            muted_badge_classes: vec!["bg-slate-700".to_string(), "text-slate-300".to_string()],
            active_badge_classes: vec!["bg-white".to_string(), "text-brand-700".to_string()],
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSummary {
    pub matched: usize,
    pub badges_recolored: usize,
    pub badges_skipped: usize,
}

/// Marks every nav anchor whose route attribute equals `current`.
///
/// A missing route (`None`), a page without the sidebar container, or a
/// sidebar with no matching anchor all degrade to a no-op summary; nothing
/// here can fail the request. Badges already carrying the alert class keep
/// it: alert state wins over highlight state.
pub fn mark_active(
    dom: &mut Dom,
    current: Option<&str>,
    style: &HighlightStyle,
) -> HighlightSummary {
    let mut summary = HighlightSummary::default();

    let Some(current) = current else {
        return summary;
    };
    let Some(container) = dom.find_by_id(&style.container_id) else {
        return summary;
    };

    let links = dom.elements_by_tag_class(container, "a", &style.link_class);
    for link in links {
        if dom.attr(link, &style.route_attr) != Some(current) {
            continue;
        }
        summary.matched += 1;
        for class in &style.active_link_classes {
            dom.class_add(link, class);
        }
        if let Some(badge) = first_badge(dom, link, style) {
            if dom.has_class(badge, &style.alert_class) {
                summary.badges_skipped += 1;
            } else {
                for class in &style.muted_badge_classes {
                    dom.class_remove(badge, class);
                }
                for class in &style.active_badge_classes {
                    dom.class_add(badge, class);
                }
                summary.badges_recolored += 1;
            }
        }
    }
    summary
}

// The original markup holds one badge per link; take the first in document
// order like querySelector does.
fn first_badge(dom: &Dom, link: NodeId, style: &HighlightStyle) -> Option<NodeId> {
    dom.elements_by_tag_class(link, "span", &style.badge_marker_class)
        .into_iter()
        .next()
}
