//! Aggregate fixtures shared by the engine integration tests.

#![allow(dead_code)]

use relata_core::{
    AggregateNode, ConvertError, Entity, EntityDef, EntityRef, ScalarType, SqlValue,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNoId {
    pub content: String,
}

impl Entity for ElementNoId {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("ElementNoId").text("content")
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("content", self.content.as_str())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            content: node.take_value("content")?.into_text()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListParent {
    pub id: Option<i64>,
    pub name: String,
    pub content: Vec<ElementNoId>,
}

impl Entity for ListParent {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("ListParent")
            .id("id")
            .column("id4")
            .text("name")
            .list("content", EntityRef::of::<ElementNoId>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("id", self.id)
            .value("name", self.name.as_str())
            .many("content", self.content.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            id: node.take_value("id")?.into_opt_int()?,
            name: node.take_value("name")?.into_text()?,
            content: node
                .take_many("content")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Ordered scalar collection stored in one array column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListOwner {
    pub id: Option<i64>,
    pub digits: Vec<String>,
}

impl Entity for ListOwner {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("ListOwner")
            .table("array_owner")
            .id("id")
            .scalar_list("digits", ScalarType::Text)
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("id", self.id).value(
            "digits",
            SqlValue::Array(self.digits.iter().map(|d| d.as_str().into()).collect()),
        )
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            id: node.take_value("id")?.into_opt_int()?,
            digits: node.take_value("digits")?.into_text_array()?,
        })
    }
}

/// Unordered scalar collection stored in one array column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetOwner {
    pub id: Option<i64>,
    pub digits: Vec<String>,
}

impl Entity for SetOwner {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("SetOwner")
            .table("array_owner")
            .id("id")
            .scalar_set("digits", ScalarType::Text)
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("id", self.id).value(
            "digits",
            SqlValue::Array(self.digits.iter().map(|d| d.as_str().into()).collect()),
        )
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            id: node.take_value("id")?.into_opt_int()?,
            digits: node.take_value("digits")?.into_text_array()?,
        })
    }
}

// Identity-bearing one-to-one chain: Chain4 -> Chain3 -> ... -> Chain0.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain0 {
    pub zero: Option<i64>,
    pub zero_value: String,
}

impl Entity for Chain0 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("Chain0").id("zero").text("zero_value")
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("zero", self.zero)
            .value("zero_value", self.zero_value.as_str())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            zero: node.take_value("zero")?.into_opt_int()?,
            zero_value: node.take_value("zero_value")?.into_text()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain1 {
    pub one: Option<i64>,
    pub one_value: String,
    pub chain0: Option<Chain0>,
}

impl Entity for Chain1 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("Chain1")
            .id("one")
            .text("one_value")
            .one("chain0", EntityRef::of::<Chain0>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("one", self.one)
            .value("one_value", self.one_value.as_str())
            .one("chain0", self.chain0.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            one: node.take_value("one")?.into_opt_int()?,
            one_value: node.take_value("one_value")?.into_text()?,
            chain0: node.take_one("chain0")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain2 {
    pub two: Option<i64>,
    pub two_value: String,
    pub chain1: Option<Chain1>,
}

impl Entity for Chain2 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("Chain2")
            .id("two")
            .text("two_value")
            .one("chain1", EntityRef::of::<Chain1>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("two", self.two)
            .value("two_value", self.two_value.as_str())
            .one("chain1", self.chain1.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            two: node.take_value("two")?.into_opt_int()?,
            two_value: node.take_value("two_value")?.into_text()?,
            chain1: node.take_one("chain1")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain3 {
    pub three: Option<i64>,
    pub three_value: String,
    pub chain2: Option<Chain2>,
}

impl Entity for Chain3 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("Chain3")
            .id("three")
            .text("three_value")
            .one("chain2", EntityRef::of::<Chain2>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("three", self.three)
            .value("three_value", self.three_value.as_str())
            .one("chain2", self.chain2.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            three: node.take_value("three")?.into_opt_int()?,
            three_value: node.take_value("three_value")?.into_text()?,
            chain2: node.take_one("chain2")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain4 {
    pub four: Option<i64>,
    pub four_value: String,
    pub chain3: Option<Chain3>,
}

impl Entity for Chain4 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("Chain4")
            .id("four")
            .text("four_value")
            .one("chain3", EntityRef::of::<Chain3>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("four", self.four)
            .value("four_value", self.four_value.as_str())
            .one("chain3", self.chain3.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            four: node.take_value("four")?.into_opt_int()?,
            four_value: node.take_value("four_value")?.into_text()?,
            chain3: node.take_one("chain3")?.map(Entity::hydrate).transpose()?,
        })
    }
}

pub fn create_chain() -> Chain4 {
    Chain4 {
        four: None,
        four_value: "omega".to_string(),
        chain3: Some(Chain3 {
            three: None,
            three_value: "delta".to_string(),
            chain2: Some(Chain2 {
                two: None,
                two_value: "gamma".to_string(),
                chain1: Some(Chain1 {
                    one: None,
                    one_value: "beta".to_string(),
                    chain0: Some(Chain0 {
                        zero: None,
                        zero_value: "alpha".to_string(),
                    }),
                }),
            }),
        }),
    }
}

// One-to-one chain where only the root has an identity.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdChain0 {
    pub zero_value: String,
}

impl Entity for NoIdChain0 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdChain0").text("zero_value")
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("zero_value", self.zero_value.as_str())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            zero_value: node.take_value("zero_value")?.into_text()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdChain1 {
    pub one_value: String,
    pub chain0: Option<NoIdChain0>,
}

impl Entity for NoIdChain1 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdChain1")
            .text("one_value")
            .one("chain0", EntityRef::of::<NoIdChain0>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("one_value", self.one_value.as_str())
            .one("chain0", self.chain0.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            one_value: node.take_value("one_value")?.into_text()?,
            chain0: node.take_one("chain0")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdChain2 {
    pub two_value: String,
    pub chain1: Option<NoIdChain1>,
}

impl Entity for NoIdChain2 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdChain2")
            .text("two_value")
            .one("chain1", EntityRef::of::<NoIdChain1>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("two_value", self.two_value.as_str())
            .one("chain1", self.chain1.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            two_value: node.take_value("two_value")?.into_text()?,
            chain1: node.take_one("chain1")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdChain3 {
    pub three_value: String,
    pub chain2: Option<NoIdChain2>,
}

impl Entity for NoIdChain3 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdChain3")
            .text("three_value")
            .one("chain2", EntityRef::of::<NoIdChain2>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("three_value", self.three_value.as_str())
            .one("chain2", self.chain2.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            three_value: node.take_value("three_value")?.into_text()?,
            chain2: node.take_one("chain2")?.map(Entity::hydrate).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdChain4 {
    pub four: Option<i64>,
    pub four_value: String,
    pub chain3: Option<NoIdChain3>,
}

impl Entity for NoIdChain4 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdChain4")
            .id("four")
            .text("four_value")
            .one("chain3", EntityRef::of::<NoIdChain3>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("four", self.four)
            .value("four_value", self.four_value.as_str())
            .one("chain3", self.chain3.as_ref().map(Entity::dehydrate))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            four: node.take_value("four")?.into_opt_int()?,
            four_value: node.take_value("four_value")?.into_text()?,
            chain3: node.take_one("chain3")?.map(Entity::hydrate).transpose()?,
        })
    }
}

pub fn create_no_id_chain() -> NoIdChain4 {
    NoIdChain4 {
        four: None,
        four_value: "omega".to_string(),
        chain3: Some(NoIdChain3 {
            three_value: "delta".to_string(),
            chain2: Some(NoIdChain2 {
                two_value: "gamma".to_string(),
                chain1: Some(NoIdChain1 {
                    one_value: "beta".to_string(),
                    chain0: Some(NoIdChain0 {
                        zero_value: "alpha".to_string(),
                    }),
                }),
            }),
        }),
    }
}

// Chain of lists where only the root has an identity.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdListChain0 {
    pub zero_value: String,
}

impl Entity for NoIdListChain0 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdListChain0").text("zero_value")
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("zero_value", self.zero_value.as_str())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            zero_value: node.take_value("zero_value")?.into_text()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdListChain1 {
    pub one_value: String,
    pub chain0: Vec<NoIdListChain0>,
}

impl Entity for NoIdListChain1 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdListChain1")
            .text("one_value")
            .list("chain0", EntityRef::of::<NoIdListChain0>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("one_value", self.one_value.as_str())
            .many("chain0", self.chain0.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            one_value: node.take_value("one_value")?.into_text()?,
            chain0: node
                .take_many("chain0")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdListChain2 {
    pub two_value: String,
    pub chain1: Vec<NoIdListChain1>,
}

impl Entity for NoIdListChain2 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdListChain2")
            .text("two_value")
            .list("chain1", EntityRef::of::<NoIdListChain1>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("two_value", self.two_value.as_str())
            .many("chain1", self.chain1.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            two_value: node.take_value("two_value")?.into_text()?,
            chain1: node
                .take_many("chain1")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdListChain3 {
    pub three_value: String,
    pub chain2: Vec<NoIdListChain2>,
}

impl Entity for NoIdListChain3 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdListChain3")
            .text("three_value")
            .list("chain2", EntityRef::of::<NoIdListChain2>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("three_value", self.three_value.as_str())
            .many("chain2", self.chain2.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            three_value: node.take_value("three_value")?.into_text()?,
            chain2: node
                .take_many("chain2")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdListChain4 {
    pub four: Option<i64>,
    pub four_value: String,
    pub chain3: Vec<NoIdListChain3>,
}

impl Entity for NoIdListChain4 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdListChain4")
            .id("four")
            .text("four_value")
            .list("chain3", EntityRef::of::<NoIdListChain3>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("four", self.four)
            .value("four_value", self.four_value.as_str())
            .many("chain3", self.chain3.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            four: node.take_value("four")?.into_opt_int()?,
            four_value: node.take_value("four_value")?.into_text()?,
            chain3: node
                .take_many("chain3")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// A 4-level chain of lists with two children per level; each value is `v`
/// followed by the indices used to navigate to the element.
pub fn create_no_id_list_tree() -> NoIdListChain4 {
    let mut chain4 = NoIdListChain4 {
        four: None,
        four_value: "v".to_string(),
        chain3: Vec::new(),
    };
    for i in 0..2 {
        let mut c3 = NoIdListChain3 {
            three_value: format!("{}{i}", chain4.four_value),
            chain2: Vec::new(),
        };
        for j in 0..2 {
            let mut c2 = NoIdListChain2 {
                two_value: format!("{}{j}", c3.three_value),
                chain1: Vec::new(),
            };
            for k in 0..2 {
                let mut c1 = NoIdListChain1 {
                    one_value: format!("{}{k}", c2.two_value),
                    chain0: Vec::new(),
                };
                for m in 0..2 {
                    c1.chain0.push(NoIdListChain0 {
                        zero_value: format!("{}{m}", c1.one_value),
                    });
                }
                c2.chain1.push(c1);
            }
            c3.chain2.push(c2);
        }
        chain4.chain3.push(c3);
    }
    chain4
}

// Chain of maps where only the root has an identity.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdMapChain0 {
    pub zero_value: String,
}

impl Entity for NoIdMapChain0 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdMapChain0").text("zero_value")
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new().value("zero_value", self.zero_value.as_str())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            zero_value: node.take_value("zero_value")?.into_text()?,
        })
    }
}

fn map_entries<T: Entity>(entries: &[(String, T)]) -> Vec<(SqlValue, AggregateNode)> {
    entries
        .iter()
        .map(|(key, value)| (key.as_str().into(), value.dehydrate()))
        .collect()
}

fn hydrate_map<T: Entity>(
    entries: Vec<(SqlValue, AggregateNode)>,
) -> Result<Vec<(String, T)>, ConvertError> {
    entries
        .into_iter()
        .map(|(key, node)| Ok((key.into_text()?, T::hydrate(node)?)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdMapChain1 {
    pub one_value: String,
    pub chain0: Vec<(String, NoIdMapChain0)>,
}

impl Entity for NoIdMapChain1 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdMapChain1")
            .text("one_value")
            .map("chain0", ScalarType::Text, EntityRef::of::<NoIdMapChain0>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("one_value", self.one_value.as_str())
            .map("chain0", map_entries(&self.chain0))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            one_value: node.take_value("one_value")?.into_text()?,
            chain0: hydrate_map(node.take_map("chain0")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdMapChain2 {
    pub two_value: String,
    pub chain1: Vec<(String, NoIdMapChain1)>,
}

impl Entity for NoIdMapChain2 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdMapChain2")
            .text("two_value")
            .map("chain1", ScalarType::Text, EntityRef::of::<NoIdMapChain1>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("two_value", self.two_value.as_str())
            .map("chain1", map_entries(&self.chain1))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            two_value: node.take_value("two_value")?.into_text()?,
            chain1: hydrate_map(node.take_map("chain1")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdMapChain3 {
    pub three_value: String,
    pub chain2: Vec<(String, NoIdMapChain2)>,
}

impl Entity for NoIdMapChain3 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdMapChain3")
            .text("three_value")
            .map("chain2", ScalarType::Text, EntityRef::of::<NoIdMapChain2>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("three_value", self.three_value.as_str())
            .map("chain2", map_entries(&self.chain2))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            three_value: node.take_value("three_value")?.into_text()?,
            chain2: hydrate_map(node.take_map("chain2")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoIdMapChain4 {
    pub four: Option<i64>,
    pub four_value: String,
    pub chain3: Vec<(String, NoIdMapChain3)>,
}

impl Entity for NoIdMapChain4 {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("NoIdMapChain4")
            .id("four")
            .text("four_value")
            .map("chain3", ScalarType::Text, EntityRef::of::<NoIdMapChain3>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("four", self.four)
            .value("four_value", self.four_value.as_str())
            .map("chain3", map_entries(&self.chain3))
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            four: node.take_value("four")?.into_opt_int()?,
            four_value: node.take_value("four_value")?.into_text()?,
            chain3: hydrate_map(node.take_map("chain3")?)?,
        })
    }
}

/// The map analogue of [`create_no_id_list_tree`]: two entries per level
/// keyed `_0` and `_1`.
pub fn create_no_id_map_tree() -> NoIdMapChain4 {
    let key = |i: usize| format!("_{i}");
    let mut chain4 = NoIdMapChain4 {
        four: None,
        four_value: "v".to_string(),
        chain3: Vec::new(),
    };
    for i in 0..2 {
        let mut c3 = NoIdMapChain3 {
            three_value: format!("{}{i}", chain4.four_value),
            chain2: Vec::new(),
        };
        for j in 0..2 {
            let mut c2 = NoIdMapChain2 {
                two_value: format!("{}{j}", c3.three_value),
                chain1: Vec::new(),
            };
            for k in 0..2 {
                let mut c1 = NoIdMapChain1 {
                    one_value: format!("{}{k}", c2.two_value),
                    chain0: Vec::new(),
                };
                for m in 0..2 {
                    c1.chain0.push((
                        key(m),
                        NoIdMapChain0 {
                            zero_value: format!("{}{m}", c1.one_value),
                        },
                    ));
                }
                c2.chain1.push((key(k), c1));
            }
            c3.chain2.push((key(j), c2));
        }
        chain4.chain3.push((key(i), c3));
    }
    chain4
}

/// Unordered collection of identity-less entities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetParent {
    pub id: Option<i64>,
    pub name: String,
    pub elements: Vec<ElementNoId>,
}

impl Entity for SetParent {
    fn definition() -> EntityDef {
        EntityDef::new::<Self>("SetParent")
            .id("id")
            .text("name")
            .set("elements", EntityRef::of::<ElementNoId>())
    }

    fn dehydrate(&self) -> AggregateNode {
        AggregateNode::new()
            .value("id", self.id)
            .value("name", self.name.as_str())
            .many("elements", self.elements.iter().map(Entity::dehydrate).collect())
    }

    fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
        Ok(Self {
            id: node.take_value("id")?.into_opt_int()?,
            name: node.take_value("name")?.into_text()?,
            elements: node
                .take_many("elements")?
                .into_iter()
                .map(Entity::hydrate)
                .collect::<Result<_, _>>()?,
        })
    }
}
