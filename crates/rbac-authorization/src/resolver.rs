//! Hierarchy resolution
//!
//! Access is reachability: a principal holds an item if the item is one of
//! its direct assignments or can be reached from one through parent → child
//! edges.
//!
//! The walk is breadth first over an explicit worklist, starting from every
//! directly assigned item at depth 0. Each item is expanded once, at the
//! shallowest depth it is found, and each expansion is one `children` read.
//! Expanding an item deeper than the cap is a breach if that item has
//! children. Breaches, cycles and rule failures are recorded rather than
//! returned, so a branch that reaches the target still grants access and the
//! outcome does not depend on the order branches are visited in. An item
//! whose rule could not be evaluated is not admitted. When no branch reaches
//! the target, a cycle in the walked subgraph is reported first, then a
//! breach, then a rule failure, and only then a plain denial.

use rbac_core::{
    AssignmentStore, HierarchyStore, Item, ItemName, PrincipalId, RbacConfig, RuleName,
    DEFAULT_MAX_DEPTH,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{AuthorizationError, Result};
use crate::rules::RuleEvaluator;

/// Resolves access through the item hierarchy
pub struct HierarchyResolver<S> {
    store: Arc<S>,
    max_depth: Option<usize>,
    rules: Option<Arc<dyn RuleEvaluator>>,
}

impl<S> Clone for HierarchyResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_depth: self.max_depth,
            rules: self.rules.clone(),
        }
    }
}

impl<S> HierarchyResolver<S>
where
    S: HierarchyStore + AssignmentStore,
{
    /// Create a resolver with the default depth cap and no rule evaluator
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            rules: None,
        }
    }

    /// Create a resolver using the configured depth cap
    pub fn from_config(store: Arc<S>, config: &RbacConfig) -> Self {
        Self::new(store).with_max_depth(config.max_depth())
    }

    /// Replace the depth cap; `None` relies on cycle detection alone
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Install the evaluator consulted for items that carry a rule
    pub fn with_rule_evaluator(mut self, rules: Arc<dyn RuleEvaluator>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Configured depth cap
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Whether `principal` holds `target`, directly or through the hierarchy
    ///
    /// # Errors
    ///
    /// - [`AuthorizationError::Store`] if a store read fails
    /// - [`AuthorizationError::HierarchyCycle`] or
    ///   [`AuthorizationError::RecursionLimitExceeded`] if the target was not
    ///   reached and the walk met a cycle or the depth cap
    /// - [`AuthorizationError::RuleUnavailable`] or
    ///   [`AuthorizationError::Rule`] if the target was not reached and a
    ///   rule met on the way could not be evaluated
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn has_access(&self, principal: &PrincipalId, target: &ItemName) -> Result<bool> {
        let assigned = self.store.assigned_items(principal, None).await?;

        let mut walk = Walk::new(self, principal, Some(target));
        if walk.run(assigned).await? {
            debug!(expanded = walk.children.len(), "Access granted");
            return Ok(true);
        }

        walk.finish()?;
        debug!(expanded = walk.children.len(), "Access denied");
        Ok(false)
    }

    /// Every item `principal` holds, in breadth-first order
    ///
    /// Fails under the same conditions as [`has_access`](Self::has_access)
    /// when the target is never found.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn accessible_items(&self, principal: &PrincipalId) -> Result<Vec<ItemName>> {
        let assigned = self.store.assigned_items(principal, None).await?;

        let mut walk = Walk::new(self, principal, None);
        walk.run(assigned).await?;
        walk.finish()?;

        debug!(count = walk.reached.len(), "Resolved accessible items");
        Ok(walk.reached)
    }
}

/// Per-call walk state
struct Walk<'a, S> {
    resolver: &'a HierarchyResolver<S>,
    principal: &'a PrincipalId,
    target: Option<&'a ItemName>,
    queue: VecDeque<(Item, usize)>,
    depths: HashMap<ItemName, usize>,
    reached: Vec<ItemName>,
    children: HashMap<ItemName, Vec<ItemName>>,
    admitted: HashMap<ItemName, bool>,
    breach: Option<(ItemName, usize)>,
    rule_failure: Option<AuthorizationError>,
}

impl<'a, S> Walk<'a, S>
where
    S: HierarchyStore + AssignmentStore,
{
    fn new(
        resolver: &'a HierarchyResolver<S>,
        principal: &'a PrincipalId,
        target: Option<&'a ItemName>,
    ) -> Self {
        Self {
            resolver,
            principal,
            target,
            queue: VecDeque::new(),
            depths: HashMap::new(),
            reached: Vec::new(),
            children: HashMap::new(),
            admitted: HashMap::new(),
            breach: None,
            rule_failure: None,
        }
    }

    /// Walk from `roots`; returns `true` as soon as the target is reached
    async fn run(&mut self, roots: Vec<Item>) -> Result<bool> {
        for root in roots {
            if self.discover(root, 0).await? {
                return Ok(true);
            }
        }

        while let Some((item, depth)) = self.queue.pop_front() {
            let children = self.resolver.store.children(&item.name).await?;

            if let Some(max_depth) = self.resolver.max_depth {
                if depth > max_depth {
                    if !children.is_empty() && self.breach.is_none() {
                        warn!(
                            item = %item.name,
                            depth,
                            max_depth,
                            "Hierarchy walk reached the depth cap"
                        );
                        self.breach = Some((item.name, max_depth));
                    }
                    continue;
                }
            }

            self.children.insert(
                item.name.clone(),
                children.iter().map(|child| child.name.clone()).collect(),
            );

            for child in children {
                if self.discover(child, depth + 1).await? {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Record `item` at `depth`; returns `true` if it is the target
    async fn discover(&mut self, item: Item, depth: usize) -> Result<bool> {
        if self.depths.contains_key(&item.name) || !self.admits(&item).await {
            return Ok(false);
        }

        self.depths.insert(item.name.clone(), depth);
        self.reached.push(item.name.clone());

        if self.target == Some(&item.name) {
            return Ok(true);
        }

        self.queue.push_back((item, depth));
        Ok(false)
    }

    /// Whether `item` may grant or be walked through
    ///
    /// A rule that cannot be evaluated rejects the item; the first such
    /// failure is kept for [`finish`](Self::finish).
    async fn admits(&mut self, item: &Item) -> bool {
        let Some(rule) = &item.rule else {
            return true;
        };
        if let Some(admitted) = self.admitted.get(&item.name) {
            return *admitted;
        }

        let admitted = match self.evaluate(rule, item).await {
            Ok(admitted) => admitted,
            Err(err) => {
                warn!(item = %item.name, rule = %rule, error = %err, "Rule could not be evaluated");
                self.rule_failure.get_or_insert(err);
                false
            }
        };
        if !admitted {
            debug!(item = %item.name, rule = %rule, "Rule rejected item");
        }

        self.admitted.insert(item.name.clone(), admitted);
        admitted
    }

    async fn evaluate(&self, rule: &RuleName, item: &Item) -> Result<bool> {
        let Some(rules) = &self.resolver.rules else {
            return Err(AuthorizationError::RuleUnavailable {
                rule: rule.clone(),
                item: item.name.clone(),
            });
        };

        rules
            .evaluate(rule, self.principal, item)
            .await
            .map_err(|source| AuthorizationError::Rule {
                rule: rule.clone(),
                source,
            })
    }

    /// Surface anomalies met by a walk that did not reach its target
    fn finish(&mut self) -> Result<()> {
        if let Some(path) = find_cycle(&self.reached, &self.children) {
            warn!(path = ?path, "Hierarchy cycle detected");
            return Err(AuthorizationError::HierarchyCycle { path });
        }

        if let Some((item, max_depth)) = self.breach.take() {
            return Err(AuthorizationError::RecursionLimitExceeded {
                target: self.target.cloned(),
                item,
                max_depth,
            });
        }

        if let Some(err) = self.rule_failure.take() {
            return Err(err);
        }

        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Find a cycle in the expanded subgraph, visiting starts in `order`
///
/// Iterative depth-first search; the returned path starts and ends on the
/// same item.
fn find_cycle(
    order: &[ItemName],
    adjacency: &HashMap<ItemName, Vec<ItemName>>,
) -> Option<Vec<ItemName>> {
    let mut marks: HashMap<&ItemName, Mark> = HashMap::new();

    for start in order {
        if marks.contains_key(start) {
            continue;
        }

        let mut stack: Vec<(&ItemName, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::OnPath);

        while let Some(&(node, next)) = stack.last() {
            let children = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);

            let Some(child) = children.get(next) else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match marks.get(child) {
                Some(Mark::OnPath) => {
                    let from = stack
                        .iter()
                        .position(|(item, _)| *item == child)
                        .unwrap_or(0);
                    let mut path: Vec<ItemName> =
                        stack[from..].iter().map(|(item, _)| (*item).clone()).collect();
                    path.push(child.clone());
                    return Some(path);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(child, Mark::OnPath);
                    stack.push((child, 0));
                }
            }
        }
    }

    None
}
