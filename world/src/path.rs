//! Path tree storage with live per-node danger counters.

use creep_defence_core::{Event, NodeId, PathLayout, Vec3};

/// Waypoint stored inside the path tree.
#[derive(Clone, Debug)]
pub(crate) struct PathNode {
    pub(crate) position: Vec3,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) danger: i32,
}

/// Tree of waypoints rooted at the spawner.
#[derive(Clone, Debug)]
pub(crate) struct PathTree {
    root: NodeId,
    nodes: Vec<PathNode>,
}

impl PathTree {
    /// Builds the tree from a validated layout, deriving parent links.
    pub(crate) fn from_layout(layout: &PathLayout) -> Self {
        let mut nodes: Vec<PathNode> = layout
            .nodes
            .iter()
            .map(|node| PathNode {
                position: node.position,
                children: node.children.clone(),
                parent: None,
                danger: 0,
            })
            .collect();

        for index in 0..layout.nodes.len() {
            let parent = NodeId::new(u32::try_from(index).unwrap_or(u32::MAX));
            for child in &layout.nodes[index].children {
                if let Some(node) = nodes.get_mut(child.index()) {
                    node.parent = Some(parent);
                }
            }
        }

        Self {
            root: layout.root,
            nodes,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, node: NodeId) -> Option<&PathNode> {
        self.nodes.get(node.index())
    }

    pub(crate) fn position(&self, node: NodeId) -> Option<Vec3> {
        self.node(node).map(|node| node.position)
    }

    /// Children of the node, empty for leaves and unknown identifiers.
    pub(crate) fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |node| node.children.as_slice())
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Increments the danger counter of a node a tower started threatening.
    pub(crate) fn enter_danger(&mut self, node: NodeId, out_events: &mut Vec<Event>) {
        if let Some(entry) = self.nodes.get_mut(node.index()) {
            entry.danger = entry.danger.saturating_add(1);
            out_events.push(Event::DangerChanged {
                node,
                danger: entry.danger,
            });
        }
    }

    /// Decrements the danger counter of a node a tower stopped threatening.
    pub(crate) fn exit_danger(&mut self, node: NodeId, out_events: &mut Vec<Event>) {
        if let Some(entry) = self.nodes.get_mut(node.index()) {
            entry.danger = entry.danger.saturating_sub(1);
            out_events.push(Event::DangerChanged {
                node,
                danger: entry.danger,
            });
        }
    }

    /// Nodes lying within `radius` of `center`, in identifier order.
    pub(crate) fn nodes_within(&self, center: Vec3, radius: f32) -> Vec<NodeId> {
        if !(radius >= 0.0) {
            return Vec::new();
        }

        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.position.distance(center) <= radius)
            .map(|(index, _)| NodeId::new(u32::try_from(index).unwrap_or(u32::MAX)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::PathNodeLayout;

    fn fork() -> PathTree {
        PathTree::from_layout(&PathLayout {
            root: NodeId::new(0),
            nodes: vec![
                PathNodeLayout {
                    position: Vec3::ZERO,
                    children: vec![NodeId::new(1), NodeId::new(2)],
                },
                PathNodeLayout {
                    position: Vec3::new(10.0, 0.0, 0.0),
                    children: Vec::new(),
                },
                PathNodeLayout {
                    position: Vec3::new(0.0, 0.0, 10.0),
                    children: Vec::new(),
                },
            ],
        })
    }

    #[test]
    fn parents_are_derived_from_children() {
        let tree = fork();
        assert_eq!(tree.node(NodeId::new(0)).and_then(|n| n.parent), None);
        assert_eq!(
            tree.node(NodeId::new(2)).and_then(|n| n.parent),
            Some(NodeId::new(0))
        );
    }

    #[test]
    fn danger_enter_and_exit_are_paired() {
        let mut tree = fork();
        let mut events = Vec::new();

        tree.enter_danger(NodeId::new(1), &mut events);
        tree.enter_danger(NodeId::new(1), &mut events);
        tree.exit_danger(NodeId::new(1), &mut events);

        assert_eq!(tree.node(NodeId::new(1)).map(|n| n.danger), Some(1));
        assert_eq!(
            events.last(),
            Some(&Event::DangerChanged {
                node: NodeId::new(1),
                danger: 1,
            })
        );
    }

    #[test]
    fn unknown_nodes_have_no_children() {
        let tree = fork();
        assert!(tree.children(NodeId::new(9)).is_empty());
        assert!(tree.children(NodeId::new(1)).is_empty());
    }

    #[test]
    fn nodes_within_radius_are_reported_in_order() {
        let tree = fork();
        assert_eq!(
            tree.nodes_within(Vec3::new(5.0, 0.0, 5.0), 7.1),
            vec![NodeId::new(0), NodeId::new(1), NodeId::new(2)]
        );
        assert_eq!(
            tree.nodes_within(Vec3::new(9.0, 0.0, 0.0), 1.5),
            vec![NodeId::new(1)]
        );
    }
}
