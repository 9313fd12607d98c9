use super::QueryNode;

impl QueryNode {
    /// Returns true if both trees select the same data, independent of sibling order.
    ///
    /// Nodes are compared by kind and selection key (storage key for fields and roots, type
    /// condition for fragments) along with the field metadata, the response type and, for
    /// roots, the operation kind and name. Children are matched by selection key at every level.
    pub fn equivalent(&self, other: &QueryNode) -> bool {
        let same_node = match (self, other) {
            (QueryNode::Root(this), QueryNode::Root(that)) => {
                this.operation == that.operation
                    && this.name == that.name
                    && this.type_name == that.type_name
                    && this.storage_key() == that.storage_key()
            }
            (QueryNode::Fragment(this), QueryNode::Fragment(that)) => {
                this.type_condition == that.type_condition
            }
            (QueryNode::Field(this), QueryNode::Field(that)) => {
                this.metadata == that.metadata
                    && this.type_name == that.type_name
                    && this.storage_key() == that.storage_key()
            }
            _ => false,
        };
        same_node && same_children(self.children(), other.children())
    }
}

fn same_children(left: &[QueryNode], right: &[QueryNode]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter().all(|left_child| {
        let key = left_child.key();
        right
            .iter()
            .any(|right_child| right_child.key() == key && left_child.equivalent(right_child))
    })
}
