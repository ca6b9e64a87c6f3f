use crate::error::ConvertError;
use crate::node::AggregateNode;
use crate::schema::EntityDef;

/// Trait implemented by every type that participates in aggregate
/// persistence, roots and nested entities alike.
///
/// `definition` declares the type's schema (one level; nested types are
/// referenced, not inlined). `dehydrate`/`hydrate` convert between the typed
/// struct and the engine's dynamic tree, one level of structure each —
/// nested entities delegate to the child type's own implementation.
///
/// # Example
///
/// ```ignore
/// impl Entity for ListParent {
///     fn definition() -> EntityDef {
///         EntityDef::new::<Self>("ListParent")
///             .id("id")
///             .text("name")
///             .list("content", EntityRef::of::<ElementNoId>())
///     }
///
///     fn dehydrate(&self) -> AggregateNode {
///         AggregateNode::new()
///             .value("id", self.id)
///             .value("name", self.name.as_str())
///             .many("content", self.content.iter().map(Entity::dehydrate).collect())
///     }
///
///     fn hydrate(mut node: AggregateNode) -> Result<Self, ConvertError> {
///         Ok(Self {
///             id: node.take_value("id")?.into_opt_int()?,
///             name: node.take_value("name")?.into_text()?,
///             content: node
///                 .take_many("content")?
///                 .into_iter()
///                 .map(Entity::hydrate)
///                 .collect::<Result<_, _>>()?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    fn definition() -> EntityDef;

    fn dehydrate(&self) -> AggregateNode;

    fn hydrate(node: AggregateNode) -> Result<Self, ConvertError>;
}
