//! 供應鏈網路拓撲

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::attribute::{resolve, AttributeKey, AttributeValue, NodeAttribute};
use crate::bom::BomGraph;
use crate::node::{Node, NodeIndex};
use crate::product::{Product, ProductIndex};
use crate::{Result, SimError};

/// 供應鏈網路
///
/// 節點構成有向無環圖，產品與 BOM 存放在同一份目錄中。
/// 每次可變存取都會遞增 `revision`，供屬性快取判斷是否失效。
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: BTreeMap<NodeIndex, Node>,
    catalog: BomGraph,
    revision: u64,
}

impl Network {
    /// 創建空的網路
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入節點
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.index) {
            return Err(SimError::DuplicateNode(node.index));
        }
        self.nodes.insert(node.index, node);
        self.touch();
        Ok(())
    }

    /// 加入邊 `predecessor → successor`
    pub fn add_edge(&mut self, predecessor: NodeIndex, successor: NodeIndex) -> Result<()> {
        self.require_node(predecessor)?;
        self.require_node(successor)?;

        if predecessor == successor || self.reaches(successor, predecessor) {
            return Err(SimError::CyclicNetwork(format!(
                "{} -> {}",
                predecessor, successor
            )));
        }

        if let Some(node) = self.nodes.get_mut(&predecessor) {
            node.successors.insert(successor);
        }
        if let Some(node) = self.nodes.get_mut(&successor) {
            node.predecessors.insert(predecessor);
        }
        self.touch();
        Ok(())
    }

    /// 註冊產品
    pub fn add_product(&mut self, product: Product) -> Result<()> {
        self.catalog.add_product(product)?;
        self.touch();
        Ok(())
    }

    /// 設定 BOM 用量
    pub fn set_bill_of_materials(
        &mut self,
        product: ProductIndex,
        raw_material: ProductIndex,
        quantity: Decimal,
    ) -> Result<()> {
        self.catalog
            .set_bill_of_materials(product, raw_material, quantity)?;
        self.touch();
        Ok(())
    }

    /// 指派產品給節點
    ///
    /// 節點原本的虛擬產品會被移除。
    pub fn assign_product(&mut self, node: NodeIndex, product: ProductIndex) -> Result<()> {
        if !self.catalog.contains(product) || product.is_dummy() {
            return Err(SimError::ProductNotFound(product));
        }
        let dummy = node.dummy_product();
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(SimError::NodeNotFound(node))?;

        entry.products.insert(product);
        if entry.products.remove(&dummy) {
            self.catalog.remove_dummy(dummy);
        }
        self.touch();
        Ok(())
    }

    /// 指派多個產品給節點
    pub fn assign_products<I>(&mut self, node: NodeIndex, products: I) -> Result<()>
    where
        I: IntoIterator<Item = ProductIndex>,
    {
        for product in products {
            self.assign_product(node, product)?;
        }
        Ok(())
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(&index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.touch();
        self.nodes.get_mut(&index)
    }

    /// 依索引遞增順序列出節點
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn catalog(&self) -> &BomGraph {
        &self.catalog
    }

    pub fn product(&self, index: ProductIndex) -> Option<&Product> {
        self.catalog.product(index)
    }

    pub fn product_mut(&mut self, index: ProductIndex) -> Option<&mut Product> {
        self.touch();
        self.catalog.product_mut(index)
    }

    /// 修改版本號
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn source_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .values()
            .filter(|n| n.is_source())
            .map(|n| n.index)
            .collect()
    }

    pub fn sink_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .values()
            .filter(|n| n.is_sink())
            .map(|n| n.index)
            .collect()
    }

    /// 拓撲排序（上游到下游）
    ///
    /// 同一層級的節點依索引遞增，結果可重現。
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>> {
        let mut in_degree: BTreeMap<NodeIndex, usize> = self
            .nodes
            .values()
            .map(|n| (n.index, n.predecessors.len()))
            .collect();
        let mut ready: BTreeSet<NodeIndex> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&index, _)| index)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(current) = ready.pop_first() {
            order.push(current);
            for successor in self.nodes[&current].successors.iter() {
                if let Some(degree) = in_degree.get_mut(successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*successor);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let remaining: Vec<String> = in_degree
                .iter()
                .filter(|(_, &degree)| degree > 0)
                .map(|(index, _)| index.to_string())
                .collect();
            return Err(SimError::CyclicNetwork(remaining.join(", ")));
        }

        Ok(order)
    }

    /// 建構完成步驟：產生虛擬產品並驗證網路
    ///
    /// 沒有產品的節點取得虛擬產品 `-(2n + 2)`，外部供應節點的供應商取得
    /// 虛擬產品 `-(2n + 1)`。可重複呼叫。
    pub fn finalize(&mut self) -> Result<()> {
        for node in self.nodes.values_mut() {
            if node.products.is_empty() {
                let dummy = node.index.dummy_product();
                node.products.insert(dummy);
                self.catalog.insert_dummy(Product::dummy(
                    dummy,
                    format!("node {} dummy", node.index),
                ));
                tracing::debug!("節點 {} 沒有產品，建立虛擬產品 {}", node.index, dummy);
            }

            if node.is_external_supply() {
                let supplier = node.index.external_supplier_product();
                self.catalog.insert_dummy(Product::dummy(
                    supplier,
                    format!("node {} external supply", node.index),
                ));
            }
        }
        self.touch();
        self.validate()
    }

    /// 執行前驗證
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(SimError::InvalidConfig("網路沒有任何節點".to_string()));
        }

        self.topological_order()?;

        for node in self.nodes.values() {
            if node.products.is_empty() {
                return Err(SimError::InvalidConfig(format!(
                    "節點 {} 沒有產品，請先呼叫 finalize",
                    node.index
                )));
            }
            for product in node.products() {
                if !self.catalog.contains(product) {
                    return Err(SimError::ProductNotFound(product));
                }
            }
            if node.is_source() && !node.is_external_supply() {
                return Err(SimError::MissingSupply(node.index));
            }

            let attributes = &node.attributes;
            Self::check_overrides(
                node,
                AttributeKey::InventoryPolicy,
                &attributes.inventory_policy,
            )?;
            Self::check_overrides(
                node,
                AttributeKey::InitialInventoryLevel,
                &attributes.initial_inventory_level,
            )?;
            Self::check_overrides(node, AttributeKey::DemandSource, &attributes.demand_source)?;

            for product in node.products() {
                if let Some(AttributeValue::Policy(policy)) =
                    self.resolve_explicit(node.index, AttributeKey::InventoryPolicy, product)?
                {
                    policy.validate()?;
                }
                if let Some(AttributeValue::Demand(source)) =
                    self.resolve_explicit(node.index, AttributeKey::DemandSource, product)?
                {
                    source.validate()?;
                }
            }
        }

        Ok(())
    }

    /// 解析屬性並套用系統預設值
    pub fn get_attribute(
        &self,
        node: NodeIndex,
        key: AttributeKey,
        product: ProductIndex,
    ) -> Result<AttributeValue> {
        self.resolve_explicit(node, key, product)?
            .or_else(|| key.default_value())
            .ok_or(SimError::UnresolvedAttribute {
                node,
                attribute: key,
                product,
            })
    }

    /// 只解析三個層級中明確設定的值
    pub fn resolve_explicit(
        &self,
        node: NodeIndex,
        key: AttributeKey,
        product: ProductIndex,
    ) -> Result<Option<AttributeValue>> {
        let node_ref = self.nodes.get(&node).ok_or(SimError::NodeNotFound(node))?;
        let product_ref = self
            .catalog
            .product(product)
            .ok_or(SimError::ProductNotFound(product))?;
        let node_attrs = &node_ref.attributes;
        let product_attrs = &product_ref.attributes;

        let value = match key {
            AttributeKey::LocalHoldingCost => resolve(
                &node_attrs.local_holding_cost,
                product_attrs.local_holding_cost.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Amount(*v)),
            AttributeKey::StockoutCost => resolve(
                &node_attrs.stockout_cost,
                product_attrs.stockout_cost.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Amount(*v)),
            AttributeKey::ShipmentLeadTime => resolve(
                &node_attrs.shipment_lead_time,
                product_attrs.shipment_lead_time.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Periods(*v)),
            AttributeKey::InventoryPolicy => resolve(
                &node_attrs.inventory_policy,
                product_attrs.inventory_policy.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Policy(v.clone())),
            AttributeKey::InitialInventoryLevel => resolve(
                &node_attrs.initial_inventory_level,
                product_attrs.initial_inventory_level.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Amount(*v)),
            AttributeKey::DemandSource => resolve(
                &node_attrs.demand_source,
                product_attrs.demand_source.as_ref(),
                product,
            )
            .map(|v| AttributeValue::Demand(v.clone())),
        };

        Ok(value)
    }

    fn check_overrides<T>(node: &Node, key: AttributeKey, value: &NodeAttribute<T>) -> Result<()> {
        for product in value.overridden_products() {
            if !node.handles(product) {
                return Err(SimError::UnknownProductOverride {
                    node: node.index,
                    attribute: key,
                    product,
                });
            }
        }
        Ok(())
    }

    fn require_node(&self, index: NodeIndex) -> Result<()> {
        if self.nodes.contains_key(&index) {
            Ok(())
        } else {
            Err(SimError::NodeNotFound(index))
        }
    }

    /// `from` 沿下游方向是否可達 `to`
    fn reaches(&self, from: NodeIndex, to: NodeIndex) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.successors.iter().copied());
            }
        }

        false
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::DemandSource;
    use crate::node::SupplyType;
    use crate::policy::Policy;

    fn d(value: i64) -> Decimal {
        Decimal::from(value)
    }

    /// 節點 2（外部供應）→ 節點 1（面對顧客）
    fn two_stage() -> Network {
        let mut network = Network::new();
        network
            .add_node(
                Node::new(NodeIndex(1))
                    .with_local_holding_cost(d(5))
                    .with_stockout_cost(d(20))
                    .with_shipment_lead_time(1),
            )
            .unwrap();
        network
            .add_node(
                Node::new(NodeIndex(2))
                    .with_supply_type(SupplyType::Unlimited)
                    .with_shipment_lead_time(2),
            )
            .unwrap();
        network.add_edge(NodeIndex(2), NodeIndex(1)).unwrap();
        network
    }

    #[test]
    fn test_topological_order() {
        let mut network = two_stage();
        network.add_node(Node::new(NodeIndex(0))).unwrap();
        network.add_edge(NodeIndex(1), NodeIndex(0)).unwrap();

        assert_eq!(
            network.topological_order().unwrap(),
            vec![NodeIndex(2), NodeIndex(1), NodeIndex(0)]
        );
        assert_eq!(network.source_nodes(), vec![NodeIndex(2)]);
        assert_eq!(network.sink_nodes(), vec![NodeIndex(0)]);
    }

    #[test]
    fn test_reject_cyclic_edge() {
        let mut network = two_stage();
        assert!(matches!(
            network.add_edge(NodeIndex(1), NodeIndex(2)),
            Err(SimError::CyclicNetwork(_))
        ));
        assert!(matches!(
            network.add_edge(NodeIndex(1), NodeIndex(9)),
            Err(SimError::NodeNotFound(NodeIndex(9)))
        ));
    }

    #[test]
    fn test_finalize_creates_dummy_products() {
        let mut network = two_stage();
        network.finalize().unwrap();

        let node = network.node(NodeIndex(1)).unwrap();
        assert_eq!(node.products().collect::<Vec<_>>(), vec![ProductIndex(-4)]);
        assert!(network.product(ProductIndex(-4)).is_some());
        // 外部供應商的虛擬產品
        assert!(network.product(ProductIndex(-5)).is_some());

        // 再次呼叫不會重複建立
        let count = network.catalog().product_count();
        network.finalize().unwrap();
        assert_eq!(network.catalog().product_count(), count);
    }

    #[test]
    fn test_assign_product_replaces_dummy() {
        let mut network = two_stage();
        network.finalize().unwrap();
        network.add_product(Product::new(10)).unwrap();
        network.assign_product(NodeIndex(1), ProductIndex(10)).unwrap();

        let node = network.node(NodeIndex(1)).unwrap();
        assert_eq!(node.products().collect::<Vec<_>>(), vec![ProductIndex(10)]);
        assert!(network.product(ProductIndex(-4)).is_none());
    }

    #[test]
    fn test_missing_supply() {
        let mut network = Network::new();
        network.add_node(Node::new(NodeIndex(1))).unwrap();

        assert_eq!(
            network.finalize(),
            Err(SimError::MissingSupply(NodeIndex(1)))
        );
    }

    #[test]
    fn test_validate_requires_finalize() {
        let network = two_stage();
        assert!(matches!(network.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_attribute_precedence() {
        let mut network = two_stage();
        network
            .add_product(Product::new(20).with_local_holding_cost(d(2)))
            .unwrap();
        network.assign_product(NodeIndex(2), ProductIndex(20)).unwrap();

        // 產品層級優先於節點純量
        network.node_mut(NodeIndex(2)).unwrap().attributes.local_holding_cost =
            NodeAttribute::Scalar(d(9));
        let value = network
            .get_attribute(NodeIndex(2), AttributeKey::LocalHoldingCost, ProductIndex(20))
            .unwrap();
        assert_eq!(value.as_amount(), Some(d(2)));

        // (節點, 產品) 覆寫優先於一切
        network.node_mut(NodeIndex(2)).unwrap().attributes.local_holding_cost =
            NodeAttribute::per_product([(20, d(7))]);
        let value = network
            .get_attribute(NodeIndex(2), AttributeKey::LocalHoldingCost, ProductIndex(20))
            .unwrap();
        assert_eq!(value.as_amount(), Some(d(7)));
    }

    #[test]
    fn test_attribute_defaults_and_unresolved() {
        let mut network = two_stage();
        network.finalize().unwrap();

        let lead_time = network
            .get_attribute(NodeIndex(2), AttributeKey::ShipmentLeadTime, ProductIndex(-5))
            .unwrap();
        assert_eq!(lead_time.as_periods(), Some(2));

        let stockout = network
            .get_attribute(NodeIndex(2), AttributeKey::StockoutCost, ProductIndex(-5))
            .unwrap();
        assert_eq!(stockout.as_amount(), Some(Decimal::ZERO));

        assert_eq!(
            network
                .get_attribute(NodeIndex(1), AttributeKey::InventoryPolicy, ProductIndex(-4))
                .unwrap_err(),
            SimError::UnresolvedAttribute {
                node: NodeIndex(1),
                attribute: AttributeKey::InventoryPolicy,
                product: ProductIndex(-4),
            }
        );
    }

    #[test]
    fn test_reject_override_for_unhandled_product() {
        let mut network = two_stage();
        network.add_product(Product::new(10)).unwrap();
        network.add_product(Product::new(20)).unwrap();
        network.assign_product(NodeIndex(1), ProductIndex(10)).unwrap();
        network.node_mut(NodeIndex(1)).unwrap().attributes.inventory_policy =
            NodeAttribute::per_product([(20, Policy::base_stock(d(5)))]);

        assert_eq!(
            network.finalize(),
            Err(SimError::UnknownProductOverride {
                node: NodeIndex(1),
                attribute: AttributeKey::InventoryPolicy,
                product: ProductIndex(20),
            })
        );
    }

    #[test]
    fn test_reject_negative_demand() {
        let mut network = two_stage();
        network.node_mut(NodeIndex(1)).unwrap().attributes.demand_source =
            NodeAttribute::Scalar(DemandSource::sequence([1, -1]));

        assert!(matches!(network.finalize(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_revision_bumps_on_mutation() {
        let mut network = two_stage();
        let before = network.revision();
        network.node_mut(NodeIndex(1));
        assert!(network.revision() > before);
    }
}
