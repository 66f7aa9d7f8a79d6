use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;

use waypost::dom;
use waypost::highlight::HighlightStyle;
use waypost::model::NavManifest;

#[derive(Parser)]
#[command(name = "navlint")]
#[command(about = "Check a navigation manifest (and optionally a page) for consistency")]
struct Cli {
    manifest_path: String,
    #[arg(short, long)]
    page: Option<String>,
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct Finding {
    kind: String,
    detail: String,
}

#[derive(Debug, Serialize)]
struct Report {
    manifest: String,
    findings: Vec<Finding>,
    ok: bool,
}

fn finding(kind: &str, detail: String) -> Finding {
    Finding {
        kind: kind.to_string(),
        detail,
    }
}

fn lint_manifest(manifest: &NavManifest) -> Vec<Finding> {
    let mut findings = Vec::new();

    let table = match manifest.route_table() {
        Ok(table) => table,
        Err(e) => {
            findings.push(finding("route_table", e.to_string()));
            return findings;
        }
    };

    for item in manifest.items() {
        // a path claimed by an earlier item resolves to that item's name
        match table.resolve(&item.path) {
            Some(name) if name == item.url_name => {}
            Some(name) => findings.push(finding(
                "path_conflict",
                format!(
                    "{} and {} both claim {}",
                    name, item.url_name, item.path
                ),
            )),
            None => findings.push(finding(
                "unresolvable_path",
                format!("{} does not resolve", item.path),
            )),
        }
        if table.reverse(&item.url_name).is_none() {
            findings.push(finding(
                "unreversible_route",
                format!("{} has no canonical path", item.url_name),
            ));
        }
        if item.label.trim().is_empty() {
            findings.push(finding(
                "empty_label",
                format!("{} has an empty label", item.url_name),
            ));
        }
    }
    findings
}

fn lint_page(source: &str, manifest: &NavManifest, style: &HighlightStyle) -> Vec<Finding> {
    let mut findings = Vec::new();

    let page = match dom::parse(source) {
        Ok(page) => page,
        Err(e) => {
            findings.push(finding("page_parse", e.to_string()));
            return findings;
        }
    };
    let Some(container) = page.find_by_id(&style.container_id) else {
        findings.push(finding(
            "missing_container",
            format!("no element with id {}", style.container_id),
        ));
        return findings;
    };

    for link in page.elements_by_tag_class(container, "a", &style.link_class) {
        match page.attr(link, &style.route_attr) {
            None => findings.push(finding(
                "missing_route_attr",
                format!("anchor {:?} has no {}", page.text_content(link).trim(), style.route_attr),
            )),
            Some(url_name) => {
                if !manifest.contains_route(url_name) {
                    findings.push(finding(
                        "unknown_route",
                        format!("anchor points at unknown route {}", url_name),
                    ));
                }
            }
        }
    }

    for badge in page.elements_by_tag_class(container, "span", &style.badge_marker_class) {
        let alert = page.has_class(badge, &style.alert_class);
        let muted = style
            .muted_badge_classes
            .iter()
            .any(|class| page.has_class(badge, class));
        if alert && muted {
            findings.push(finding(
                "badge_state_clash",
                format!(
                    "badge {:?} carries both alert and muted colors",
                    page.text_content(badge).trim()
                ),
            ));
        }
    }
    findings
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manifest = NavManifest::from_file(&cli.manifest_path)
        .with_context(|| format!("failed to load manifest {}", cli.manifest_path))?;

    let mut findings = lint_manifest(&manifest);
    if let Some(page_path) = &cli.page {
        let source = fs::read_to_string(page_path)
            .with_context(|| format!("failed to read page {}", page_path))?;
        findings.extend(lint_page(&source, &manifest, &HighlightStyle::default()));
    }

    let report = Report {
        manifest: cli.manifest_path.clone(),
        ok: findings.is_empty(),
        findings,
    };

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }

    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_manifest_has_no_findings() {
        let manifest = NavManifest::builtin().unwrap();
        assert!(lint_manifest(&manifest).is_empty());
    }

    #[test]
    fn conflicting_paths_are_reported() {
        let manifest = NavManifest::from_yaml(
            r#"
audiences:
  - audience: client
    sections:
      - title: A
        items:
          - { label: One, url_name: one, path: /shared/ }
          - { label: Two, url_name: two, path: /shared/ }
"#,
        )
        .unwrap();
        let findings = lint_manifest(&manifest);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "path_conflict");
    }

    #[test]
    fn page_anchors_are_checked_against_the_manifest() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let page = r#"<nav id="sidebar-nav">
  <a class="nav-item" data-url="dashboard">Dashboard</a>
  <a class="nav-item" data-url="retired_page">Retired</a>
  <a class="nav-item">Nameless</a>
</nav>"#;
        let findings = lint_page(page, &manifest, &style);
        let kinds: Vec<_> = findings.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["unknown_route", "missing_route_attr"]);
    }

    #[test]
    fn clashing_badge_colors_are_reported() {
        let manifest = NavManifest::builtin().unwrap();
        let style = HighlightStyle::default();
        let page = r#"<nav id="sidebar-nav">
  <a class="nav-item" data-url="ferries">Ferries
    <span class="rounded-full bg-red-500 bg-slate-700">3</span>
  </a>
</nav>"#;
        let findings = lint_page(page, &manifest, &style);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "badge_state_clash");
    }

    #[test]
    fn page_without_container_is_flagged() {
        let manifest = NavManifest::builtin().unwrap();
        let findings = lint_page("<main>nothing</main>", &manifest, &HighlightStyle::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "missing_container");
    }
}
