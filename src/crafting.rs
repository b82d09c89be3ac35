//! Crafting dependency tree / 制作材料依赖树
//!
//! Recursive recipe expansion with cycle and depth guards. The ancestor
//! set is copied on every recursive call, so a cycle is only a cycle
//! along the current root-to-node path; the same material reused in a
//! sibling branch expands normally. Sibling ingredients resolve
//! concurrently and join before the parent returns.

use futures::future::{try_join_all, BoxFuture};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::provider::{ItemId, RecipeProvider};

/// Hard recursion cap; malformed recipe graphs must terminate.
/// / 递归深度硬上限
pub const MAX_DEPTH: usize = 10;

/// Catalog ids never expanded as ingredients: the base currency and the
/// elemental shard/crystal/cluster rows. / 永不展开的基础材料 id
pub const DEFAULT_EXCLUDED_IDS: std::ops::RangeInclusive<ItemId> = 1..=19;

/// One node of the expansion. Built fresh per `build` call and never
/// mutated afterwards. / 展开树的一个节点
#[derive(Debug, Clone, Serialize)]
pub struct RecipeNode {
    pub item_id: ItemId,
    /// Total of this item needed by the parent craft. / 需求数量
    pub required_amount: u64,
    /// 0 for leaves (no recipe consulted or none found). / 单次产量
    pub recipe_yield: u32,
    pub crafts_needed: u64,
    pub children: Vec<RecipeNode>,
    pub is_base_material: bool,
    pub is_cyclic: bool,
    pub max_depth_reached: bool,
}

impl RecipeNode {
    fn leaf(item_id: ItemId, required_amount: u64) -> Self {
        Self {
            item_id,
            required_amount,
            recipe_yield: 0,
            crafts_needed: 0,
            children: Vec::new(),
            is_base_material: false,
            is_cyclic: false,
            max_depth_reached: false,
        }
    }

    /// Total required amount per distinct item id over every node in the
    /// tree (root included), sorted by id. Depth does not matter.
    /// / 按 id 汇总全树需求量
    pub fn flatten(&self) -> Vec<MaterialTotal> {
        let mut totals: BTreeMap<ItemId, u64> = BTreeMap::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            let total = totals.entry(node.item_id).or_default();
            *total = total.saturating_add(node.required_amount);
            stack.extend(node.children.iter());
        }
        totals
            .into_iter()
            .map(|(item_id, total_amount)| MaterialTotal {
                item_id,
                total_amount,
            })
            .collect()
    }
}

/// Flattened material requirement, ready for batch price fetching.
/// / 扁平化的材料需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialTotal {
    pub item_id: ItemId,
    pub total_amount: u64,
}

pub struct CraftingTreeBuilder {
    provider: Arc<dyn RecipeProvider>,
    excluded: HashSet<ItemId>,
    max_depth: usize,
}

impl CraftingTreeBuilder {
    pub fn new(provider: Arc<dyn RecipeProvider>) -> Self {
        Self {
            provider,
            excluded: DEFAULT_EXCLUDED_IDS.collect(),
            max_depth: MAX_DEPTH,
        }
    }

    /// Replace the never-expand id set. / 自定义排除 id 集
    pub fn with_excluded(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.excluded = ids.into_iter().collect();
        self
    }

    /// Expand the full material tree for `amount` of `item_id`.
    /// / 展开完整材料树
    pub async fn build(
        &self,
        item_id: ItemId,
        amount: u64,
        cancel: &CancelFlag,
    ) -> Result<RecipeNode> {
        self.build_node(item_id, amount, HashSet::new(), 0, cancel)
            .await
    }

    /// `ancestors` is owned per call: cloning it for each child keeps
    /// sibling branches blind to each other's visited state.
    /// / 祖先集按值传递，兄弟分支互不可见
    fn build_node<'a>(
        &'a self,
        item_id: ItemId,
        amount: u64,
        ancestors: HashSet<ItemId>,
        depth: usize,
        cancel: &'a CancelFlag,
    ) -> BoxFuture<'a, Result<RecipeNode>> {
        Box::pin(async move {
            cancel.check()?;

            if depth >= self.max_depth {
                tracing::warn!("材料树达到深度上限 / depth cap hit at item {}", item_id);
                return Ok(RecipeNode {
                    max_depth_reached: true,
                    ..RecipeNode::leaf(item_id, amount)
                });
            }
            if ancestors.contains(&item_id) {
                // stop this branch only; siblings keep expanding
                return Ok(RecipeNode {
                    is_cyclic: true,
                    ..RecipeNode::leaf(item_id, amount)
                });
            }

            let recipes = self
                .provider
                .recipes_for_result(item_id)
                .await
                .map_err(Error::Provider)?;
            cancel.check()?;

            // multiple crafting variants: first one wins, no comparison
            let Some(recipe) = recipes.first() else {
                return Ok(RecipeNode {
                    is_base_material: true,
                    ..RecipeNode::leaf(item_id, amount)
                });
            };

            let recipe_yield = recipe.yield_amount.max(1);
            let crafts_needed = amount.div_ceil(u64::from(recipe_yield));

            let mut next_ancestors = ancestors;
            next_ancestors.insert(item_id);

            let child_futures = recipe
                .ingredients
                .iter()
                .filter(|ing| !self.excluded.contains(&ing.id))
                .map(|ing| {
                    // amounts compound multiplicatively down the tree;
                    // malformed graphs can exceed u64 well inside the
                    // depth cap, so saturate instead of wrapping
                    self.build_node(
                        ing.id,
                        u64::from(ing.amount).saturating_mul(crafts_needed),
                        next_ancestors.clone(),
                        depth + 1,
                        cancel,
                    )
                });
            let children = try_join_all(child_futures).await?;

            Ok(RecipeNode {
                item_id,
                required_amount: amount,
                recipe_yield,
                crafts_needed,
                children,
                is_base_material: false,
                is_cyclic: false,
                max_depth_reached: false,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Ingredient, Recipe};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MockRecipes {
        recipes: HashMap<ItemId, Vec<Recipe>>,
    }

    impl MockRecipes {
        fn new(entries: Vec<(ItemId, u32, Vec<(ItemId, u32)>)>) -> Self {
            let mut recipes: HashMap<ItemId, Vec<Recipe>> = HashMap::new();
            for (id, yield_amount, ingredients) in entries {
                recipes.entry(id).or_default().push(Recipe {
                    id,
                    yield_amount,
                    ingredients: ingredients
                        .into_iter()
                        .map(|(id, amount)| Ingredient { id, amount })
                        .collect(),
                });
            }
            Self { recipes }
        }
    }

    #[async_trait]
    impl RecipeProvider for MockRecipes {
        async fn recipes_for_result(&self, id: ItemId) -> anyhow::Result<Vec<Recipe>> {
            Ok(self.recipes.get(&id).cloned().unwrap_or_default())
        }
    }

    fn builder(entries: Vec<(ItemId, u32, Vec<(ItemId, u32)>)>) -> CraftingTreeBuilder {
        CraftingTreeBuilder::new(Arc::new(MockRecipes::new(entries)))
    }

    #[tokio::test]
    async fn test_base_material_leaf() {
        let b = builder(vec![]);
        let tree = b.build(100, 3, &CancelFlag::new()).await.unwrap();
        assert!(tree.is_base_material);
        assert!(tree.children.is_empty());
        assert_eq!(tree.required_amount, 3);
        assert_eq!(tree.crafts_needed, 0);
    }

    #[tokio::test]
    async fn test_yield_rounding_propagates() {
        // yield 3, want 10 -> 4 crafts; every ingredient amount × 4
        let b = builder(vec![(100, 3, vec![(200, 2), (300, 1)])]);
        let tree = b.build(100, 10, &CancelFlag::new()).await.unwrap();
        assert_eq!(tree.crafts_needed, 4);
        assert_eq!(tree.recipe_yield, 3);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].required_amount, 8);
        assert_eq!(tree.children[1].required_amount, 4);
    }

    #[tokio::test]
    async fn test_first_recipe_variant_wins() {
        let b = builder(vec![
            (100, 1, vec![(200, 5)]),
            (100, 1, vec![(300, 9)]),
        ]);
        let tree = b.build(100, 1, &CancelFlag::new()).await.unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].item_id, 200);
    }

    #[tokio::test]
    async fn test_cycle_marks_branch_only() {
        // 100 -> 200 -> 100 (cycle), and 100 -> 300 (normal)
        let b = builder(vec![
            (100, 1, vec![(200, 1), (300, 1)]),
            (200, 1, vec![(100, 1)]),
        ]);
        let tree = b.build(100, 1, &CancelFlag::new()).await.unwrap();
        let n200 = &tree.children[0];
        assert_eq!(n200.children.len(), 1);
        assert!(n200.children[0].is_cyclic);
        assert!(n200.children[0].children.is_empty());
        // sibling branch unaffected
        let n300 = &tree.children[1];
        assert!(n300.is_base_material);
        assert!(!n300.is_cyclic);
    }

    #[tokio::test]
    async fn test_shared_material_across_siblings_expands_twice() {
        // both 200 and 300 consume 400; copy-on-recurse means the second
        // branch must still expand it
        let b = builder(vec![
            (100, 1, vec![(200, 1), (300, 1)]),
            (200, 1, vec![(400, 2)]),
            (300, 1, vec![(400, 3)]),
            (400, 1, vec![(500, 1)]),
        ]);
        let tree = b.build(100, 1, &CancelFlag::new()).await.unwrap();
        for child in &tree.children {
            assert_eq!(child.children.len(), 1);
            assert_eq!(child.children[0].item_id, 400);
            assert!(!child.children[0].is_cyclic);
            assert_eq!(child.children[0].children[0].item_id, 500);
        }
    }

    #[tokio::test]
    async fn test_self_referential_chain_hits_depth_cap() {
        // 1000 -> 1001 -> 1002 -> ... unbounded
        let entries: Vec<_> = (1000..1100u32)
            .map(|id| (id, 1, vec![(id + 1, 1)]))
            .collect();
        let b = builder(entries);
        let tree = b.build(1000, 1, &CancelFlag::new()).await.unwrap();

        let mut node = &tree;
        let mut depth = 0;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert!(node.max_depth_reached);
    }

    #[tokio::test]
    async fn test_compounding_amounts_saturate_instead_of_overflowing() {
        // 10 levels × amount 100 per level = 100^10, far beyond u64;
        // quantities must clamp at u64::MAX, never panic or wrap
        let entries: Vec<_> = (1000..1010u32)
            .map(|id| (id, 1, vec![(id + 1, 100)]))
            .collect();
        let b = builder(entries);
        let tree = b.build(1000, 100, &CancelFlag::new()).await.unwrap();

        let mut node = &tree;
        let mut deepest = tree.required_amount;
        while let Some(child) = node.children.first() {
            assert!(child.required_amount >= node.required_amount);
            node = child;
            deepest = node.required_amount;
        }
        assert_eq!(deepest, u64::MAX);
        assert!(node.max_depth_reached);

        // flatten must carry the clamped totals through as well
        let flat = tree.flatten();
        assert_eq!(flat.last().unwrap().total_amount, u64::MAX);
    }

    #[tokio::test]
    async fn test_excluded_ids_never_expanded() {
        // ingredient 8 (crystal range) must not appear at all
        let b = builder(vec![(100, 1, vec![(8, 99), (200, 1)])]);
        let tree = b.build(100, 1, &CancelFlag::new()).await.unwrap();
        let ids: Vec<ItemId> = tree.children.iter().map(|c| c.item_id).collect();
        assert_eq!(ids, vec![200]);
    }

    #[tokio::test]
    async fn test_flatten_sums_across_occurrences() {
        let b = builder(vec![
            (100, 1, vec![(200, 2), (300, 1)]),
            (200, 1, vec![(400, 2)]),
            (300, 1, vec![(400, 3)]),
        ]);
        let tree = b.build(100, 1, &CancelFlag::new()).await.unwrap();
        let flat = tree.flatten();
        assert_eq!(
            flat,
            vec![
                MaterialTotal { item_id: 100, total_amount: 1 },
                MaterialTotal { item_id: 200, total_amount: 2 },
                MaterialTotal { item_id: 300, total_amount: 1 },
                // 2 crafts of 200 need 4, 1 craft of 300 needs 3
                MaterialTotal { item_id: 400, total_amount: 7 },
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_build_propagates() {
        let b = builder(vec![(100, 1, vec![(200, 1)])]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let got = b.build(100, 1, &cancel).await;
        assert!(matches!(got, Err(Error::Cancelled)));
    }
}
