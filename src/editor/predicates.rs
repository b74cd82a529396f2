use crate::*;

/// Edits on the `WHERE` tree.
pub struct Predicates;

impl Predicates {
    /// First leaf testing `column`, searching left before right.
    pub fn find<'a>(select: &'a Select, column: &str) -> Option<&'a Predicate> {
        select
            .selection
            .as_ref()
            .and_then(|root| Self::find_in(root, column))
    }

    fn find_in<'a>(node: &'a Predicate, column: &str) -> Option<&'a Predicate> {
        match node {
            Predicate::And { left, right } | Predicate::Or { left, right } => {
                Self::find_in(left, column).or_else(|| Self::find_in(right, column))
            }
            leaf => (leaf.column() == Some(column)).then_some(leaf),
        }
    }

    /// Add a leaf for `column`. When the root conjunction ends in a leaf, the new
    /// leaf is AND-ed with that leaf in place; otherwise the whole tree is AND-ed
    /// with it. Existing leaves are never dropped.
    pub fn append(
        select: &Select,
        column: &str,
        operator: FilterOperator,
        value: Literal,
    ) -> Result<Select> {
        select.validate()?;
        let leaf = match operator {
            FilterOperator::Like => Predicate::like(column, value),
            FilterOperator::Compare(op) => Predicate::comparison(column, op, value),
        };
        debug!(%leaf, "Appending predicate");
        let selection = match &select.selection {
            None => leaf,
            Some(root) => Self::attach(root, leaf),
        };
        Ok(Select {
            selection: Some(selection),
            ..select.clone()
        })
    }

    fn attach(root: &Predicate, leaf: Predicate) -> Predicate {
        match root {
            Predicate::And { left, right } if right.is_leaf() => Predicate::And {
                left: left.clone(),
                right: Box::new(Predicate::and((**right).clone(), leaf)),
            },
            Predicate::Or { left, right } if right.is_leaf() => Predicate::Or {
                left: left.clone(),
                right: Box::new(Predicate::and((**right).clone(), leaf)),
            },
            _ => Predicate::and(root.clone(), leaf),
        }
    }

    /// Remove the leaf testing `column` with an operator of the same kind,
    /// promoting its sibling. `WHERE` disappears when the only leaf goes.
    pub fn remove(select: &Select, column: &str, operator: FilterOperator) -> Result<Select> {
        select.validate()?;
        let selection = select.selection.as_ref().and_then(|root| {
            if root.is_leaf() {
                (!Self::is_target(root, column, operator)).then(|| root.clone())
            } else {
                Some(Self::collapse(root, column, operator))
            }
        });
        Ok(Select {
            selection,
            ..select.clone()
        })
    }

    fn is_target(node: &Predicate, column: &str, operator: FilterOperator) -> bool {
        operator.targets(node) && node.column() == Some(column)
    }

    fn collapse(node: &Predicate, column: &str, operator: FilterOperator) -> Predicate {
        match node {
            Predicate::And { left, right } => {
                Self::collapse_pair(left, right, column, operator, Predicate::and)
            }
            Predicate::Or { left, right } => {
                Self::collapse_pair(left, right, column, operator, Predicate::or)
            }
            leaf => leaf.clone(),
        }
    }

    fn collapse_pair(
        left: &Predicate,
        right: &Predicate,
        column: &str,
        operator: FilterOperator,
        join: fn(Predicate, Predicate) -> Predicate,
    ) -> Predicate {
        if Self::is_target(left, column, operator) {
            right.clone()
        } else if Self::is_target(right, column, operator) {
            left.clone()
        } else {
            join(
                Self::collapse(left, column, operator),
                Self::collapse(right, column, operator),
            )
        }
    }

    /// Keep only the leaves accepted by `keep`, collapsing conjunctions that
    /// lose a side. `None` when nothing survives.
    pub fn prune(predicate: &Predicate, keep: &impl Fn(&Predicate) -> bool) -> Option<Predicate> {
        match predicate {
            Predicate::And { left, right } => {
                Self::rejoin(Self::prune(left, keep), Self::prune(right, keep), Predicate::and)
            }
            Predicate::Or { left, right } => {
                Self::rejoin(Self::prune(left, keep), Self::prune(right, keep), Predicate::or)
            }
            leaf => keep(leaf).then(|| leaf.clone()),
        }
    }

    fn rejoin(
        left: Option<Predicate>,
        right: Option<Predicate>,
        join: fn(Predicate, Predicate) -> Predicate,
    ) -> Option<Predicate> {
        match (left, right) {
            (Some(left), Some(right)) => Some(join(left, right)),
            (side, None) | (None, side) => side,
        }
    }
}
