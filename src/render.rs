//! Builds the sidebar markup the highlighter operates on.
//!
//! Page shells carry an empty placeholder element marked with
//! `data-waypost-slot="sidebar"`; the renderer replaces its contents with
//! the `nav#sidebar-nav` region for the request's audience. The current
//! route is additionally written onto the container as
//! `data-current-route`, so anything downstream reads it from the page
//! itself instead of reaching for server state.

use std::collections::HashMap;

use crate::dom::{Dom, Element, NodeId};
use crate::highlight::HighlightStyle;
use crate::model::{AudienceNav, Badge};

pub const SLOT_ATTR: &str = "data-waypost-slot";
pub const SLOT_SIDEBAR: &str = "sidebar";
pub const CURRENT_ROUTE_ATTR: &str = "data-current-route";

pub fn find_sidebar_slot(dom: &Dom) -> Option<NodeId> {
    dom.find_by_attr(dom.root(), SLOT_ATTR, SLOT_SIDEBAR)
}

/// Replaces the slot's contents with the rendered sidebar and returns the
/// container node. Re-running on the same slot rebuilds from scratch, so
/// stale children never accumulate.
pub fn graft_sidebar(
    dom: &mut Dom,
    slot: NodeId,
    nav: &AudienceNav,
    badges: &HashMap<String, Badge>,
    style: &HighlightStyle,
) -> NodeId {
    dom.clear_children(slot);

    let mut container = Element::new("nav");
    container.set_attr("id", &style.container_id);
    container.set_attr("class", "flex flex-col gap-6");
    let container = dom.create_element(slot, container);

    for section in &nav.sections {
        let mut wrap = Element::new("div");
        wrap.set_attr("class", "nav-section flex flex-col gap-1");
        let wrap = dom.create_element(container, wrap);

        let mut title = Element::new("span");
        title.set_attr("class", "nav-section-title text-xs uppercase text-slate-500");
        let title = dom.create_element(wrap, title);
        dom.create_text(title, &section.title);

        for item in &section.items {
            let mut link = Element::new("a");
            link.set_attr(
                "class",
                &format!(
                    "{} flex items-center justify-between rounded-lg px-3 py-2 text-slate-300",
                    style.link_class
                ),
            );
            link.set_attr(&style.route_attr, &item.url_name);
            link.set_attr("href", &item.path);
            let link = dom.create_element(wrap, link);

            let label = dom.create_element(link, Element::new("span"));
            dom.create_text(label, &item.label);

            if item.badge {
                if let Some(badge) = badges.get(&item.url_name) {
                    append_badge(dom, link, badge, style);
                }
            }
        }
    }
    container
}

fn append_badge(dom: &mut Dom, link: NodeId, badge: &Badge, style: &HighlightStyle) {
    let colors = if badge.alert {
        format!("{} text-white", style.alert_class)
    } else {
        style.muted_badge_classes.join(" ")
    };
    let mut span = Element::new("span");
    span.set_attr(
        "class",
        &format!("{} {} text-xs px-2 py-0.5", style.badge_marker_class, colors),
    );
    let span = dom.create_element(link, span);
    dom.create_text(span, &badge.count.to_string());
}

/// Writes the resolved route onto the container. With no resolved route
/// there is nothing to write and the page is served untouched.
pub fn inject_current_route(dom: &mut Dom, style: &HighlightStyle, current: Option<&str>) {
    let Some(current) = current else {
        return;
    };
    if let Some(container) = dom.find_by_id(&style.container_id) {
        dom.set_attr(container, CURRENT_ROUTE_ATTR, current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use crate::highlight::{HighlightStyle, mark_active};
    use crate::model::NavManifest;

    const SHELL: &str =
        r#"<html><body><div data-waypost-slot="sidebar"></div><main>x</main></body></html>"#;

    fn client_nav(manifest: &NavManifest) -> &AudienceNav {
        manifest.audience_for("/dashboard/").unwrap()
    }

    #[test]
    fn graft_builds_the_sidebar_contract() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let mut dom = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&dom).unwrap();

        let container = graft_sidebar(
            &mut dom,
            slot,
            client_nav(&manifest),
            &HashMap::new(),
            &style,
        );

        assert_eq!(dom.attr(container, "id"), Some("sidebar-nav"));
        let links = dom.elements_by_tag_class(container, "a", "nav-item");
        let client_items: Vec<_> = client_nav(&manifest)
            .sections
            .iter()
            .flat_map(|s| s.items.iter())
            .collect();
        assert_eq!(links.len(), client_items.len());
        assert_eq!(dom.data(links[0], "url"), Some("dashboard"));
        assert_eq!(dom.attr(links[0], "href"), Some("/dashboard/"));
        // no badge feed, no badge spans
        assert!(dom.elements_by_tag_class(container, "span", "rounded-full").is_empty());
    }

    #[test]
    fn badges_render_muted_or_alert() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let mut dom = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&dom).unwrap();
        let badges = HashMap::from([
            ("ferries".to_string(), Badge { count: 3, alert: false }),
            ("visa".to_string(), Badge { count: 12, alert: true }),
        ]);

        let container = graft_sidebar(&mut dom, slot, client_nav(&manifest), &badges, &style);

        let spans = dom.elements_by_tag_class(container, "span", "rounded-full");
        assert_eq!(spans.len(), 2);
        let ferries = spans
            .iter()
            .copied()
            .find(|&s| dom.text_content(s) == "3")
            .unwrap();
        assert!(dom.has_class(ferries, "bg-slate-700"));
        assert!(dom.has_class(ferries, "text-slate-300"));
        let visa = spans
            .iter()
            .copied()
            .find(|&s| dom.text_content(s) == "12")
            .unwrap();
        assert!(dom.has_class(visa, "bg-red-500"));
        assert!(!dom.has_class(visa, "bg-slate-700"));
    }

    #[test]
    fn regraft_replaces_instead_of_appending() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let mut dom = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&dom).unwrap();

        graft_sidebar(&mut dom, slot, client_nav(&manifest), &HashMap::new(), &style);
        graft_sidebar(&mut dom, slot, client_nav(&manifest), &HashMap::new(), &style);
        assert_eq!(dom.children(slot).len(), 1);
    }

    #[test]
    fn injected_route_lands_on_the_container() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let mut dom = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&dom).unwrap();
        let container = graft_sidebar(&mut dom, slot, client_nav(&manifest), &HashMap::new(), &style);

        inject_current_route(&mut dom, &style, Some("ferries"));
        assert_eq!(dom.attr(container, CURRENT_ROUTE_ATTR), Some("ferries"));

        // absent route writes nothing
        let mut fresh = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&fresh).unwrap();
        let container = graft_sidebar(&mut fresh, slot, client_nav(&manifest), &HashMap::new(), &style);
        inject_current_route(&mut fresh, &style, None);
        assert_eq!(fresh.attr(container, CURRENT_ROUTE_ATTR), None);
    }

    #[test]
    fn grafted_sidebar_highlights_end_to_end() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let mut dom = parse(SHELL).unwrap();
        let slot = find_sidebar_slot(&dom).unwrap();
        let badges = HashMap::from([("accounting".to_string(), Badge { count: 2, alert: false })]);
        let container = graft_sidebar(&mut dom, slot, client_nav(&manifest), &badges, &style);

        let summary = mark_active(&mut dom, Some("accounting"), &style);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.badges_recolored, 1);

        let links = dom.elements_by_tag_class(container, "a", "nav-item");
        let accounting = links
            .into_iter()
            .find(|&l| dom.data(l, "url") == Some("accounting"))
            .unwrap();
        assert!(dom.has_class(accounting, "bg-brand-600"));
        let badge = dom.elements_by_tag_class(accounting, "span", "rounded-full")[0];
        assert!(dom.has_class(badge, "bg-white"));
    }
}
