/// Breadth-first catalog expansion and rendering
use anyhow::Result;
use std::fmt::Write;
use subsonic_client::{CatalogEntry, CatalogTree, NodeKind, Parent, SubsonicService};
use tracing::info;

/// Listings requested at the same time.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Expand the catalog `depth` levels below the service root.
///
/// Depth 1 lists artists, 2 adds albums, 3 adds tracks, and so on.
pub async fn expand_to_depth(service: &SubsonicService, depth: usize) -> Result<()> {
    if depth == 0 {
        return Ok(());
    }

    if let Some(fetch) = service.expand_service().await {
        fetch.await?;
    }
    let mut frontier = expandable_ids(&service.children(&Parent::Root).await);

    for level in 2..=depth {
        if frontier.is_empty() {
            break;
        }
        info!(level, nodes = frontier.len(), "Expanding catalog level");

        for chunk in frontier.chunks(MAX_CONCURRENT_FETCHES) {
            let mut fetches = Vec::with_capacity(chunk.len());
            for id in chunk {
                if let Some(fetch) = service.expand_node(id).await {
                    fetches.push(fetch);
                }
            }
            for fetch in fetches {
                fetch.await?;
            }
        }

        let mut next = Vec::new();
        for id in frontier {
            next.extend(expandable_ids(&service.children(&Parent::Id(id)).await));
        }
        frontier = next;
    }

    Ok(())
}

fn expandable_ids(entries: &[CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.is_expandable())
        .map(|entry| entry.id.clone())
        .collect()
}

/// Render the catalog as an indented outline.
pub fn render_tree(tree: &CatalogTree) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, 0);
    out
}

fn write_node(out: &mut String, node: &CatalogTree, depth: usize) {
    let indent = "  ".repeat(depth);
    // Writing to a String cannot fail.
    let _ = match node.kind {
        NodeKind::Service => writeln!(out, "{}", node.name),
        kind => writeln!(out, "{}{} [{} {}]", indent, node.name, kind, node.id),
    };

    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, name: &str, kind: NodeKind) -> CatalogTree {
        CatalogTree {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            expandable: kind.is_expandable(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_render_tree() {
        let mut artist = leaf("1", "ABBA", NodeKind::Artist);
        artist
            .children
            .push(leaf("2", "Arrival", NodeKind::Album));
        artist
            .children
            .push(leaf("3", "Waterloo", NodeKind::Track));

        let mut root = leaf("", "Subsonic", NodeKind::Service);
        root.children.push(artist);

        assert_eq!(
            render_tree(&root),
            "Subsonic\n  ABBA [artist 1]\n    Arrival [album 2]\n    Waterloo [track 3]\n"
        );
    }

    #[test]
    fn test_expandable_ids_skip_tracks() {
        let entries = vec![
            CatalogEntry::new("1", "A", NodeKind::Artist),
            CatalogEntry::new("2", "B", NodeKind::Track),
            CatalogEntry::new("3", "C", NodeKind::Album),
        ];
        assert_eq!(expandable_ids(&entries), vec!["1", "3"]);
    }
}
