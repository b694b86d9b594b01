//! Taxonomy index built once per catalog snapshot.
//!
//! The index owns its snapshot and never changes after construction. When
//! the overlay changes, callers build a new index from the new snapshot.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use rollbook_core::defaults::PATH_SEPARATOR;
use rollbook_core::{Catalog, Error, OverlayDocument, Perspective, Position, Result, Technique};
use rollbook_core::logging::{
    COMPONENT, OPERATION, POSITION_COUNT, POSITION_ID, SUBSYSTEM, TECHNIQUE_COUNT, TECHNIQUE_ID,
};

/// Root positions split by perspective, each bucket name-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootsByPerspective<'a> {
    pub top: Vec<&'a Position>,
    pub bottom: Vec<&'a Position>,
    pub neutral: Vec<&'a Position>,
}

/// Hierarchical index over positions and their attached techniques.
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    positions: Vec<Position>,
    techniques: Vec<Technique>,
    position_by_id: HashMap<String, usize>,
    technique_by_id: HashMap<String, usize>,
    /// Parent id -> child indices, name-sorted.
    children: HashMap<String, Vec<usize>>,
    /// Root indices, name-sorted.
    roots: Vec<usize>,
    /// Position id -> owned technique indices, name-sorted.
    owned: HashMap<String, Vec<usize>>,
    /// Position id -> indices of techniques ending there, name-sorted.
    leading_to: HashMap<String, Vec<usize>>,
}

fn by_name(a: &str, a_id: &str, b: &str, b_id: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
        .then_with(|| a_id.cmp(b_id))
}

impl TaxonomyIndex {
    /// Build an index from the system catalog followed by the overlay.
    pub fn from_parts(system: &Catalog, overlay: &OverlayDocument) -> Self {
        Self::build(Catalog::merged(system, overlay))
    }

    /// Build an index from a merged catalog snapshot.
    ///
    /// Never fails: a technique whose owning position is missing is kept in
    /// the index (it can still be matched) but left out of position-scoped
    /// lookups. When two positions share an id, the first one wins.
    pub fn build(catalog: Catalog) -> Self {
        let Catalog {
            positions,
            techniques,
        } = catalog;

        let mut position_by_id = HashMap::with_capacity(positions.len());
        for (i, p) in positions.iter().enumerate() {
            if position_by_id.contains_key(&p.id) {
                warn!(
                    { SUBSYSTEM } = "taxonomy",
                    { POSITION_ID } = %p.id,
                    "Duplicate position id ignored"
                );
                continue;
            }
            position_by_id.insert(p.id.clone(), i);
        }

        let mut technique_by_id = HashMap::with_capacity(techniques.len());
        for (i, t) in techniques.iter().enumerate() {
            if technique_by_id.contains_key(&t.id) {
                warn!(
                    { SUBSYSTEM } = "taxonomy",
                    { TECHNIQUE_ID } = %t.id,
                    "Duplicate technique id ignored"
                );
                continue;
            }
            technique_by_id.insert(t.id.clone(), i);
        }

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (id, &i) in &position_by_id {
            debug_assert_eq!(&positions[i].id, id);
            match positions[i].parent_id.as_deref() {
                None => roots.push(i),
                Some(parent) => children.entry(parent.to_string()).or_default().push(i),
            }
        }

        let position_order = |a: &usize, b: &usize| {
            let (pa, pb) = (&positions[*a], &positions[*b]);
            by_name(&pa.name, &pa.id, &pb.name, &pb.id)
        };
        roots.sort_by(position_order);
        for bucket in children.values_mut() {
            bucket.sort_by(position_order);
        }

        let mut owned: HashMap<String, Vec<usize>> = HashMap::new();
        let mut leading_to: HashMap<String, Vec<usize>> = HashMap::new();
        let mut dangling = 0usize;
        for (id, &i) in &technique_by_id {
            let t = &techniques[i];
            debug_assert_eq!(&t.id, id);
            if position_by_id.contains_key(&t.position_from_id) {
                owned.entry(t.position_from_id.clone()).or_default().push(i);
            } else {
                dangling += 1;
                warn!(
                    { SUBSYSTEM } = "taxonomy",
                    { TECHNIQUE_ID } = %t.id,
                    { POSITION_ID } = %t.position_from_id,
                    "Technique references unknown position; omitted from position lookups"
                );
            }
            if let Some(to) = t.position_to_id.as_deref() {
                if position_by_id.contains_key(to) {
                    leading_to.entry(to.to_string()).or_default().push(i);
                }
            }
        }

        let technique_order = |a: &usize, b: &usize| {
            let (ta, tb) = (&techniques[*a], &techniques[*b]);
            by_name(&ta.name, &ta.id, &tb.name, &tb.id)
        };
        for bucket in owned.values_mut().chain(leading_to.values_mut()) {
            bucket.sort_by(technique_order);
        }

        info!(
            { SUBSYSTEM } = "taxonomy",
            { COMPONENT } = "index",
            { OPERATION } = "build",
            { POSITION_COUNT } = positions.len(),
            { TECHNIQUE_COUNT } = techniques.len(),
            root_count = roots.len(),
            dangling_techniques = dangling,
            "Taxonomy index built"
        );

        Self {
            positions,
            techniques,
            position_by_id,
            technique_by_id,
            children,
            roots,
            owned,
            leading_to,
        }
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub fn position(&self, id: &str) -> Option<&Position> {
        self.position_by_id.get(id).map(|&i| &self.positions[i])
    }

    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.technique_by_id.get(id).map(|&i| &self.techniques[i])
    }

    /// All positions in snapshot order (system first, then overlay).
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// All techniques in snapshot order (system first, then overlay).
    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    // -------------------------------------------------------------------------
    // Tree adjacency
    // -------------------------------------------------------------------------

    /// Direct children of `parent_id`, sorted by name. `None` yields the roots.
    pub fn children(&self, parent_id: Option<&str>) -> Vec<&Position> {
        let indices = match parent_id {
            None => Some(&self.roots),
            Some(id) => self.children.get(id),
        };
        indices
            .map(|v| v.iter().map(|&i| &self.positions[i]).collect())
            .unwrap_or_default()
    }

    /// Root positions, sorted by name.
    pub fn roots(&self) -> Vec<&Position> {
        self.children(None)
    }

    /// Roots split into top / bottom / neutral buckets.
    pub fn roots_by_perspective(&self) -> RootsByPerspective<'_> {
        let mut out = RootsByPerspective::default();
        for p in self.roots() {
            match p.perspective {
                Perspective::Top => out.top.push(p),
                Perspective::Bottom => out.bottom.push(p),
                Perspective::Neutral => out.neutral.push(p),
            }
        }
        out
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }

    // -------------------------------------------------------------------------
    // Upward walks
    // -------------------------------------------------------------------------

    /// Ids from `id` up to its root: self, parent, grandparent, ...
    ///
    /// Unknown ids yield an empty list. A parent id that points nowhere ends
    /// the walk early (partial result). A chain longer than the catalog can
    /// only be a cycle and is reported as [`Error::TaxonomyCycle`].
    pub fn ancestors_self_first(&self, id: &str) -> Result<Vec<&str>> {
        let mut out = Vec::new();
        let Some(mut current) = self.position(id) else {
            return Ok(out);
        };

        loop {
            if out.len() >= self.positions.len() {
                return Err(Error::TaxonomyCycle(id.to_string()));
            }
            out.push(current.id.as_str());

            let Some(parent_id) = current.parent_id.as_deref() else {
                break;
            };
            match self.position(parent_id) {
                Some(parent) => current = parent,
                None => {
                    debug!(
                        { SUBSYSTEM } = "taxonomy",
                        { POSITION_ID } = %current.id,
                        parent_id,
                        "Parent chain ends at unknown position"
                    );
                    break;
                }
            }
        }

        Ok(out)
    }

    /// Positions from the root down to `id`, inclusive.
    pub fn breadcrumb(&self, id: &str) -> Result<Vec<&Position>> {
        let mut crumbs: Vec<&Position> = self
            .ancestors_self_first(id)?
            .into_iter()
            .filter_map(|a| self.position(a))
            .collect();
        crumbs.reverse();
        Ok(crumbs)
    }

    /// Breadcrumb names joined by `" > "`. Empty for unknown ids.
    pub fn full_path(&self, id: &str) -> Result<String> {
        Ok(self
            .breadcrumb(id)?
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR))
    }

    /// Number of ancestors above `id` (0 for roots).
    pub fn depth(&self, id: &str) -> Result<usize> {
        let chain = self.ancestors_self_first(id)?;
        if chain.is_empty() {
            return Err(Error::NotFound(format!("position {}", id)));
        }
        Ok(chain.len() - 1)
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// Every position reachable from a root, depth-first, each node before
    /// its children and children in name order.
    ///
    /// Positions under a dangling parent or inside a parent cycle are not
    /// reachable and are not visited; [`TaxonomyIndex::diagnostics`] reports
    /// them.
    pub fn pre_order(&self) -> Vec<&Position> {
        let mut out = Vec::with_capacity(self.positions.len());
        let mut visited: HashSet<usize> = HashSet::with_capacity(self.positions.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();

        while let Some(i) = stack.pop() {
            if !visited.insert(i) {
                continue;
            }
            let position = &self.positions[i];
            out.push(position);
            if let Some(kids) = self.children.get(&position.id) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        out
    }

    // -------------------------------------------------------------------------
    // Technique lookups
    // -------------------------------------------------------------------------

    /// Techniques whose owning position is `position_id`, sorted by name.
    pub fn techniques_owned_by(&self, position_id: &str) -> Vec<&Technique> {
        self.owned
            .get(position_id)
            .map(|v| v.iter().map(|&i| &self.techniques[i]).collect())
            .unwrap_or_default()
    }

    /// Techniques whose destination is `position_id`, sorted by name.
    pub fn techniques_leading_to(&self, position_id: &str) -> Vec<&Technique> {
        self.leading_to
            .get(position_id)
            .map(|v| v.iter().map(|&i| &self.techniques[i]).collect())
            .unwrap_or_default()
    }

    /// Techniques usable from `position_id`: its own first, then those of
    /// each ancestor from nearest to root, without duplicate ids.
    pub fn techniques_visible_from(&self, position_id: &str) -> Result<Vec<&Technique>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();

        for ancestor in self.ancestors_self_first(position_id)? {
            for technique in self.techniques_owned_by(ancestor) {
                if seen.insert(technique.id.as_str()) {
                    out.push(technique);
                }
            }
        }

        Ok(out)
    }
}
