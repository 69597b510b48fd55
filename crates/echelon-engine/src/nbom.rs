//! 網路 BOM（NBOM）推導
//!
//! 對每一組 (上游, 節點)，若兩端產品之間存在任何明確的 BOM 關係，
//! 該通道只採用明確用量；否則節點上每個產品都需要上游每個產品各 1 單位。
//! 外部供應商以節點的外部供應虛擬產品作為唯一上游產品。

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use echelon_core::{Network, Node, NodeIndex, Partner, ProductIndex, Result, SimError};

/// 單一原料來源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMaterialLink {
    /// 供應商
    pub supplier: Partner,
    /// 原料
    pub raw_material: ProductIndex,
    /// 每單位成品所需數量
    pub quantity: Decimal,
}

/// 計算 `nbom(node, product, supplier, raw_material)`，沒有關係時回傳 0
pub fn nbom(
    network: &Network,
    node: NodeIndex,
    product: ProductIndex,
    supplier: Partner,
    raw_material: ProductIndex,
) -> Result<Decimal> {
    let node_ref = network.node(node).ok_or(SimError::NodeNotFound(node))?;
    let upstream = upstream_products(network, node_ref, supplier)?;

    if !upstream.contains(&raw_material) {
        return Ok(Decimal::ZERO);
    }

    if has_explicit_corridor(network, node_ref, &upstream) {
        Ok(network.catalog().bom_quantity(product, raw_material))
    } else {
        Ok(Decimal::ONE)
    }
}

/// 供應商端可提供的產品
fn upstream_products(
    network: &Network,
    node: &Node,
    supplier: Partner,
) -> Result<BTreeSet<ProductIndex>> {
    match supplier {
        Partner::External => {
            if node.is_external_supply() {
                Ok(BTreeSet::from([node.index.external_supplier_product()]))
            } else {
                Ok(BTreeSet::new())
            }
        }
        Partner::Node(index) => {
            if !node.predecessors().any(|p| p == index) {
                return Ok(BTreeSet::new());
            }
            let predecessor = network
                .node(index)
                .ok_or(SimError::NodeNotFound(index))?;
            Ok(predecessor.products().collect())
        }
    }
}

/// 節點產品與上游產品之間是否存在任何明確 BOM 關係
fn has_explicit_corridor(network: &Network, node: &Node, upstream: &BTreeSet<ProductIndex>) -> bool {
    let catalog = network.catalog();
    node.products().any(|product| {
        upstream
            .iter()
            .any(|&raw_material| catalog.has_relationship(product, raw_material))
    })
}

/// 整個網路的 NBOM 表
///
/// 模擬期間網路不會改變，執行前建立一次。
#[derive(Debug, Clone, Default)]
pub struct NetworkBom {
    links: BTreeMap<(NodeIndex, ProductIndex), Vec<RawMaterialLink>>,
}

impl NetworkBom {
    /// 為網路上每個 (節點, 產品) 建立原料來源
    ///
    /// 來源依供應商排序（外部供應商在前，其次為節點索引遞增），
    /// 同一供應商內依原料索引遞增。
    pub fn build(network: &Network) -> Result<Self> {
        let mut links = BTreeMap::new();

        for node in network.nodes() {
            let mut corridors = Vec::new();
            for supplier in node.suppliers() {
                let upstream = upstream_products(network, node, supplier)?;
                let explicit = has_explicit_corridor(network, node, &upstream);
                corridors.push((supplier, upstream, explicit));
            }

            for product in node.products() {
                let mut product_links = Vec::new();
                for (supplier, upstream, explicit) in &corridors {
                    for &raw_material in upstream {
                        let quantity = if *explicit {
                            network.catalog().bom_quantity(product, raw_material)
                        } else {
                            Decimal::ONE
                        };
                        if quantity > Decimal::ZERO {
                            product_links.push(RawMaterialLink {
                                supplier: *supplier,
                                raw_material,
                                quantity,
                            });
                        }
                    }
                }
                links.insert((node.index, product), product_links);
            }
        }

        tracing::debug!("NBOM 建立完成：{} 組 (節點, 產品)", links.len());
        Ok(Self { links })
    }

    /// (節點, 產品) 的所有原料來源
    pub fn links(&self, node: NodeIndex, product: ProductIndex) -> &[RawMaterialLink] {
        self.links
            .get(&(node, product))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 產品在節點上使用的原料
    pub fn raw_materials(&self, node: NodeIndex, product: ProductIndex) -> BTreeSet<ProductIndex> {
        self.links(node, product)
            .iter()
            .map(|link| link.raw_material)
            .collect()
    }

    /// 節點上所有產品使用的原料（即節點的原料池）
    pub fn raw_materials_at(&self, node: NodeIndex) -> BTreeSet<ProductIndex> {
        self.links
            .range((node, ProductIndex(i64::MIN))..=(node, ProductIndex(i64::MAX)))
            .flat_map(|(_, links)| links.iter().map(|link| link.raw_material))
            .collect()
    }

    /// 生產一單位成品所需的原料數量
    ///
    /// 取供應商排序中第一個非零的用量；沒有來源時為 0。
    pub fn unit_requirement(
        &self,
        node: NodeIndex,
        product: ProductIndex,
        raw_material: ProductIndex,
    ) -> Decimal {
        self.links(node, product)
            .iter()
            .find(|link| link.raw_material == raw_material)
            .map(|link| link.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// 可提供某原料的供應商
    pub fn suppliers_of(
        &self,
        node: NodeIndex,
        product: ProductIndex,
        raw_material: ProductIndex,
    ) -> Vec<Partner> {
        self.links(node, product)
            .iter()
            .filter(|link| link.raw_material == raw_material)
            .map(|link| link.supplier)
            .collect()
    }

    /// 節點是否向 `supplier` 取用 `raw_material`
    pub fn draws_from(&self, node: NodeIndex, supplier: Partner, raw_material: ProductIndex) -> bool {
        self.links
            .range((node, ProductIndex(i64::MIN))..=(node, ProductIndex(i64::MAX)))
            .flat_map(|(_, links)| links.iter())
            .any(|link| link.supplier == supplier && link.raw_material == raw_material)
    }

    /// 有多個供應商的 (節點, 產品, 原料)
    pub fn ambiguous_sources(&self) -> Vec<(NodeIndex, ProductIndex, ProductIndex, Vec<Partner>)> {
        let mut ambiguous = Vec::new();
        for (&(node, product), links) in &self.links {
            let raw_materials: BTreeSet<ProductIndex> =
                links.iter().map(|link| link.raw_material).collect();
            for raw_material in raw_materials {
                let suppliers = self.suppliers_of(node, product, raw_material);
                if suppliers.len() > 1 {
                    ambiguous.push((node, product, raw_material, suppliers));
                }
            }
        }
        ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{d, intro_network};
    use echelon_core::{Node, Product, SupplyType};

    #[test]
    fn test_explicit_bom_corridor() {
        let network = intro_network();

        assert_eq!(
            nbom(&network, NodeIndex(1), ProductIndex(10), Partner::Node(NodeIndex(2)), ProductIndex(20)).unwrap(),
            d(5)
        );
        assert_eq!(
            nbom(&network, NodeIndex(1), ProductIndex(10), Partner::Node(NodeIndex(2)), ProductIndex(30)).unwrap(),
            d(3)
        );
    }

    #[test]
    fn test_external_supply_is_implicit() {
        let network = intro_network();

        assert_eq!(
            nbom(&network, NodeIndex(2), ProductIndex(20), Partner::External, ProductIndex(-5)).unwrap(),
            Decimal::ONE
        );
        assert_eq!(
            nbom(&network, NodeIndex(2), ProductIndex(30), Partner::External, ProductIndex(-5)).unwrap(),
            Decimal::ONE
        );
        // 節點 1 沒有外部供應
        assert_eq!(
            nbom(&network, NodeIndex(1), ProductIndex(10), Partner::External, ProductIndex(-3)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_explicit_relation_suppresses_implicit_pairs() {
        // 節點 2 提供 20 與 21，只有 10 <- 20 是明確關係
        let mut network = Network::new();
        network.add_node(Node::new(NodeIndex(1))).unwrap();
        network
            .add_node(Node::new(NodeIndex(2)).with_supply_type(SupplyType::Unlimited))
            .unwrap();
        network.add_edge(NodeIndex(2), NodeIndex(1)).unwrap();
        for index in [10, 11, 20, 21] {
            network.add_product(Product::new(index)).unwrap();
        }
        network
            .set_bill_of_materials(ProductIndex(10), ProductIndex(20), d(2))
            .unwrap();
        network
            .assign_products(NodeIndex(1), [ProductIndex(10), ProductIndex(11)])
            .unwrap();
        network
            .assign_products(NodeIndex(2), [ProductIndex(20), ProductIndex(21)])
            .unwrap();
        network.finalize().unwrap();

        let upstream = Partner::Node(NodeIndex(2));
        assert_eq!(nbom(&network, NodeIndex(1), ProductIndex(10), upstream, ProductIndex(20)).unwrap(), d(2));
        assert_eq!(nbom(&network, NodeIndex(1), ProductIndex(10), upstream, ProductIndex(21)).unwrap(), Decimal::ZERO);
        assert_eq!(nbom(&network, NodeIndex(1), ProductIndex(11), upstream, ProductIndex(20)).unwrap(), Decimal::ZERO);

        let table = NetworkBom::build(&network).unwrap();
        assert!(table.links(NodeIndex(1), ProductIndex(11)).is_empty());
    }

    #[test]
    fn test_implicit_pairs_include_dummy_products() {
        // 節點 2 沒有宣告產品，取得虛擬產品 -6
        let mut network = Network::new();
        network.add_node(Node::new(NodeIndex(1))).unwrap();
        network
            .add_node(Node::new(NodeIndex(2)).with_supply_type(SupplyType::Unlimited))
            .unwrap();
        network.add_edge(NodeIndex(2), NodeIndex(1)).unwrap();
        network.add_product(Product::new(10)).unwrap();
        network.add_product(Product::new(11)).unwrap();
        network
            .assign_products(NodeIndex(1), [ProductIndex(10), ProductIndex(11)])
            .unwrap();
        network.finalize().unwrap();

        let upstream = Partner::Node(NodeIndex(2));
        for product in [10, 11] {
            assert_eq!(
                nbom(&network, NodeIndex(1), ProductIndex(product), upstream, ProductIndex(-6)).unwrap(),
                Decimal::ONE
            );
        }
    }

    #[test]
    fn test_network_bom_table() {
        let network = intro_network();
        let table = NetworkBom::build(&network).unwrap();

        assert_eq!(
            table.raw_materials(NodeIndex(1), ProductIndex(10)),
            BTreeSet::from([ProductIndex(20), ProductIndex(30)])
        );
        assert_eq!(
            table.raw_materials_at(NodeIndex(2)),
            BTreeSet::from([ProductIndex(-5)])
        );
        assert_eq!(table.unit_requirement(NodeIndex(1), ProductIndex(10), ProductIndex(20)), d(5));
        assert_eq!(table.unit_requirement(NodeIndex(1), ProductIndex(10), ProductIndex(99)), Decimal::ZERO);
        assert!(table.ambiguous_sources().is_empty());
    }

    #[test]
    fn test_ambiguous_sources() {
        // 節點 1 與節點 2 都提供產品 20 給節點 3
        let mut network = Network::new();
        for index in [1, 2] {
            network
                .add_node(Node::new(NodeIndex(index)).with_supply_type(SupplyType::Unlimited))
                .unwrap();
        }
        network.add_node(Node::new(NodeIndex(3))).unwrap();
        network.add_edge(NodeIndex(1), NodeIndex(3)).unwrap();
        network.add_edge(NodeIndex(2), NodeIndex(3)).unwrap();
        network.add_product(Product::new(20)).unwrap();
        network.add_product(Product::new(40)).unwrap();
        network
            .set_bill_of_materials(ProductIndex(40), ProductIndex(20), d(2))
            .unwrap();
        network.assign_product(NodeIndex(1), ProductIndex(20)).unwrap();
        network.assign_product(NodeIndex(2), ProductIndex(20)).unwrap();
        network.assign_product(NodeIndex(3), ProductIndex(40)).unwrap();
        network.finalize().unwrap();

        let table = NetworkBom::build(&network).unwrap();
        let ambiguous = table.ambiguous_sources();

        assert_eq!(ambiguous.len(), 1);
        assert_eq!(
            ambiguous[0],
            (
                NodeIndex(3),
                ProductIndex(40),
                ProductIndex(20),
                vec![Partner::Node(NodeIndex(1)), Partner::Node(NodeIndex(2))]
            )
        );
    }

    #[test]
    fn test_draws_from() {
        let network = intro_network();
        let table = NetworkBom::build(&network).unwrap();
        let upstream = Partner::Node(NodeIndex(2));

        assert!(table.draws_from(NodeIndex(1), upstream, ProductIndex(20)));
        assert!(table.draws_from(NodeIndex(2), Partner::External, ProductIndex(-5)));
        assert!(!table.draws_from(NodeIndex(1), Partner::External, ProductIndex(20)));
        assert!(!table.draws_from(NodeIndex(1), upstream, ProductIndex(10)));
    }
}
