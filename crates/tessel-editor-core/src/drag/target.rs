//! Drop target tracking with hysteresis.

use crate::document::{NodeId, Scroll, class};

use super::DragItem;

impl DragItem {
    /// Follow the pointer at content-relative `y`.
    ///
    /// The target only changes when `y` enters another line's band; outside
    /// every band the old target stays. Returns the new target when it moved.
    pub fn track(&mut self, scroll: &mut Scroll, y: f64) -> Option<NodeId> {
        if self.drag_over.end {
            return None;
        }
        let hit = scroll.layout().into_iter().find(|line_box| line_box.contains_y(y))?.node;
        if self.drag_over.element == Some(hit) {
            return None;
        }

        scroll.batch_start();
        if let Some(previous) = self.drag_over.element
            && scroll.contains(previous)
        {
            scroll.state_mut(previous).remove_class(class::DRAGOVER);
        }
        scroll.state_mut(hit).add_class(class::DRAGOVER);
        scroll.batch_end();

        tracing::trace!(target: "tessel::drag", %hit, y, "drag target");
        self.drag_over.element = Some(hit);
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::drag::{classify, DragOver};
    use crate::schedule::Throttle;
    use tessel_delta::Delta;

    fn item(scroll: &Scroll) -> DragItem {
        let classified = classify(scroll, 0).expect("classify");
        DragItem {
            drag_over: DragOver::default(),
            first_dragging_node: classified.first_dragging_node,
            dragging_nodes: classified.dragging_nodes,
            drag_type: classified.drag_type,
            handler: Throttle::new(20.0),
            drag_handle: None,
            origin_index: 0,
            content: classified.content,
        }
    }

    #[test]
    fn test_hysteresis_and_marking() {
        // Three 24px paragraphs.
        let mut scroll = Scroll::from_delta(&Delta::new().insert("a\nb\nc\n"), &EditorConfig::default());
        let nodes: Vec<NodeId> = scroll.lines().map(|l| l.node).collect();
        let mut item = item(&scroll);

        assert_eq!(item.track(&mut scroll, 30.0), Some(nodes[1]));
        assert!(scroll.state(nodes[1]).has_class(class::DRAGOVER));
        // Moving inside the same band changes nothing.
        assert_eq!(item.track(&mut scroll, 40.0), None);
        // Below every band the target is kept.
        assert_eq!(item.track(&mut scroll, 500.0), None);
        assert_eq!(item.drag_over.element, Some(nodes[1]));

        assert_eq!(item.track(&mut scroll, 48.0), Some(nodes[2]));
        assert!(!scroll.state(nodes[1]).has_class(class::DRAGOVER));
        assert!(scroll.state(nodes[2]).has_class(class::DRAGOVER));

        item.drag_over.end = true;
        assert_eq!(item.track(&mut scroll, 0.0), None);
        assert_eq!(item.drag_over.element, Some(nodes[2]));
    }
}
