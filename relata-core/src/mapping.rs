use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::entity::Entity;
use crate::error::MappingError;
use crate::naming::{DefaultNaming, NamingStrategy};
use crate::path::{self, PersistentPropertyPath};
use crate::schema::{EntityDef, EntityRef, PropertyKindDef, ScalarType};

/// A physical table identifier, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    schema: Option<String>,
    name: String,
}

impl TableId {
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unquoted `schema.table` rendering, used as a registry key and in
    /// diagnostics. SQL rendering (with quoting) lives with the statement
    /// generator.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// How a nested entity hangs off its parent.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationKind {
    One,
    List,
    Set,
    Map(ScalarType),
}

/// An entity-valued property, resolved.
#[derive(Debug, Clone)]
pub struct Association {
    pub kind: AssociationKind,
    pub entity: Arc<PersistentEntity>,
    /// Explicit back-reference column override in the child table.
    pub reverse_column: Option<String>,
    /// Explicit qualifier column override in the child table.
    pub key_column: Option<String>,
}

/// The resolved kind of a [`PersistentProperty`].
#[derive(Debug, Clone)]
pub enum PropertyKind {
    Id,
    Scalar(ScalarType),
    /// A scalar collection stored in one array column.
    Array { element: ScalarType, ordered: bool },
    Association(Association),
}

/// One resolved property slot of a [`PersistentEntity`].
#[derive(Debug, Clone)]
pub struct PersistentProperty {
    name: String,
    /// Resolved column name; `None` for associations, which occupy no
    /// column in the owning table.
    column: Option<String>,
    kind: PropertyKind,
}

impl PersistentProperty {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn association(&self) -> Option<&Association> {
        match &self.kind {
            PropertyKind::Association(a) => Some(a),
            _ => None,
        }
    }
}

/// One type's resolved persistence model: its table, its ordered property
/// list, and its identity property if it declares one.
///
/// An entity either declares an identity property or is identity-less; an
/// identity-less entity only exists as the child of exactly one parent, and
/// its rows are addressed by (back-reference, qualifier tuple) rather than
/// by primary key.
#[derive(Debug)]
pub struct PersistentEntity {
    name: String,
    type_id: TypeId,
    table: TableId,
    properties: Vec<PersistentProperty>,
    id_index: Option<usize>,
}

impl PersistentEntity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn table(&self) -> &TableId {
        &self.table
    }

    pub fn properties(&self) -> &[PersistentProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PersistentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn has_identity(&self) -> bool {
        self.id_index.is_some()
    }

    pub fn id_property(&self) -> Option<&PersistentProperty> {
        self.id_index.map(|i| &self.properties[i])
    }

    pub fn id_column(&self) -> Option<&str> {
        self.id_property().and_then(|p| p.column())
    }

    /// Properties that occupy a column in this entity's own table
    /// (identity, scalars, arrays).
    pub fn column_properties(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.properties.iter().filter(|p| p.column.is_some())
    }

    /// Entity-valued properties, in declaration order.
    pub fn associations(&self) -> impl Iterator<Item = (&PersistentProperty, &Association)> {
        self.properties
            .iter()
            .filter_map(|p| p.association().map(|a| (p, a)))
    }
}

/// The resolved model of one aggregate: the root entity plus the ordered
/// path list that drives every multi-table operation.
#[derive(Debug)]
pub struct AggregateModel {
    root: Arc<PersistentEntity>,
    root_path: Arc<PersistentPropertyPath>,
    paths: Vec<Arc<PersistentPropertyPath>>,
    root_children: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl AggregateModel {
    pub fn root(&self) -> &Arc<PersistentEntity> {
        &self.root
    }

    /// The empty path addressing the root table itself.
    pub fn root_path(&self) -> &Arc<PersistentPropertyPath> {
        &self.root_path
    }

    /// All non-root paths, depth-first, root-to-leaf, deterministic given
    /// entity shape. Save walks this order; delete walks the exact reverse.
    pub fn paths(&self) -> &[Arc<PersistentPropertyPath>] {
        &self.paths
    }

    pub fn path(&self, index: usize) -> &Arc<PersistentPropertyPath> {
        &self.paths[index]
    }

    /// Indices of the depth-1 paths.
    pub fn root_children(&self) -> &[usize] {
        &self.root_children
    }

    /// Indices of the paths directly below `paths()[index]`.
    pub fn children_of(&self, index: usize) -> &[usize] {
        &self.children[index]
    }
}

/// Resolves entity types into [`PersistentEntity`] models and aggregate
/// roots into [`AggregateModel`]s.
///
/// Resolution is memoized per `TypeId` in process-wide caches that are never
/// invalidated; entity shape is assumed static for the process lifetime.
pub struct MappingContext {
    naming: Arc<dyn NamingStrategy>,
    entities: RwLock<HashMap<TypeId, Arc<PersistentEntity>>>,
    aggregates: RwLock<HashMap<TypeId, Arc<AggregateModel>>>,
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingContext {
    pub fn new() -> Self {
        Self::with_naming(DefaultNaming)
    }

    pub fn with_naming(naming: impl NamingStrategy) -> Self {
        Self {
            naming: Arc::new(naming),
            entities: RwLock::new(HashMap::new()),
            aggregates: RwLock::new(HashMap::new()),
        }
    }

    pub fn naming(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    /// Resolve the persistent model of one entity type.
    pub fn entity_of<T: Entity>(&self) -> Result<Arc<PersistentEntity>, MappingError> {
        self.resolve(EntityRef::of::<T>())
    }

    /// Resolve the full aggregate model of a root type, including its path
    /// list. The root must declare an identity property.
    pub fn aggregate_of<T: Entity>(&self) -> Result<Arc<AggregateModel>, MappingError> {
        let type_id = TypeId::of::<T>();
        if let Some(hit) = self.aggregates.read().expect("mapping cache poisoned").get(&type_id) {
            return Ok(hit.clone());
        }
        let root = self.entity_of::<T>()?;
        if !root.has_identity() {
            return Err(MappingError::MissingIdentity {
                entity: root.name().to_string(),
            });
        }
        let built = path::build_paths(self.naming.as_ref(), &root)?;
        let model = Arc::new(AggregateModel {
            root,
            root_path: built.root_path,
            paths: built.paths,
            root_children: built.root_children,
            children: built.children,
        });
        Ok(self
            .aggregates
            .write()
            .expect("mapping cache poisoned")
            .entry(type_id)
            .or_insert(model)
            .clone())
    }

    pub fn resolve(&self, entity: EntityRef) -> Result<Arc<PersistentEntity>, MappingError> {
        let mut stack = Vec::new();
        self.resolve_ref(entity, &mut stack)
    }

    fn resolve_ref(
        &self,
        entity: EntityRef,
        stack: &mut Vec<TypeId>,
    ) -> Result<Arc<PersistentEntity>, MappingError> {
        if let Some(hit) = self
            .entities
            .read()
            .expect("mapping cache poisoned")
            .get(&entity.type_id())
        {
            return Ok(hit.clone());
        }
        let def = entity.definition();
        if stack.contains(&entity.type_id()) {
            return Err(MappingError::CyclicReference {
                entity: def.name().to_string(),
            });
        }
        stack.push(entity.type_id());
        let resolved = self.resolve_def(&def, stack);
        stack.pop();
        let resolved = resolved?;
        Ok(self
            .entities
            .write()
            .expect("mapping cache poisoned")
            .entry(entity.type_id())
            .or_insert(Arc::new(resolved))
            .clone())
    }

    fn resolve_def(
        &self,
        def: &EntityDef,
        stack: &mut Vec<TypeId>,
    ) -> Result<PersistentEntity, MappingError> {
        let table_name = def
            .table_override()
            .map(str::to_string)
            .unwrap_or_else(|| self.naming.table_name(def.name()));
        check_identifier(&table_name)?;

        let mut properties = Vec::with_capacity(def.properties().len());
        let mut id_index = None;

        for prop in def.properties() {
            let column = prop
                .column
                .map(str::to_string)
                .unwrap_or_else(|| self.naming.column_name(prop.name));
            let (column, kind) = match &prop.kind {
                PropertyKindDef::Id => {
                    if id_index.is_some() {
                        return Err(MappingError::DuplicateId {
                            entity: def.name().to_string(),
                        });
                    }
                    id_index = Some(properties.len());
                    (Some(column), PropertyKind::Id)
                }
                PropertyKindDef::Scalar(scalar) => (Some(column), PropertyKind::Scalar(*scalar)),
                PropertyKindDef::ScalarList(element) => (
                    Some(column),
                    PropertyKind::Array {
                        element: *element,
                        ordered: true,
                    },
                ),
                PropertyKindDef::ScalarSet(element) => (
                    Some(column),
                    PropertyKind::Array {
                        element: *element,
                        ordered: false,
                    },
                ),
                PropertyKindDef::One(child) => {
                    (None, self.resolve_association(prop, AssociationKind::One, *child, stack)?)
                }
                PropertyKindDef::List(child) => {
                    (None, self.resolve_association(prop, AssociationKind::List, *child, stack)?)
                }
                PropertyKindDef::Set(child) => {
                    (None, self.resolve_association(prop, AssociationKind::Set, *child, stack)?)
                }
                PropertyKindDef::Map(key, child) => {
                    if !matches!(key, ScalarType::Int | ScalarType::Text) {
                        return Err(MappingError::UnsupportedKeyType {
                            entity: def.name().to_string(),
                            property: prop.name.to_string(),
                        });
                    }
                    (
                        None,
                        self.resolve_association(prop, AssociationKind::Map(*key), *child, stack)?,
                    )
                }
            };
            if let Some(column) = &column {
                check_identifier(column)?;
            }
            properties.push(PersistentProperty {
                name: prop.name.to_string(),
                column,
                kind,
            });
        }

        let entity = PersistentEntity {
            name: def.name().to_string(),
            type_id: def.type_id(),
            table: TableId {
                schema: self.naming.schema().map(str::to_string),
                name: table_name,
            },
            properties,
            id_index,
        };
        validate_columns(&entity)?;
        validate_sibling_references(&entity)?;
        Ok(entity)
    }

    fn resolve_association(
        &self,
        prop: &crate::schema::PropertyDef,
        kind: AssociationKind,
        child: EntityRef,
        stack: &mut Vec<TypeId>,
    ) -> Result<PropertyKind, MappingError> {
        let entity = self.resolve_ref(child, stack)?;
        Ok(PropertyKind::Association(Association {
            kind,
            entity,
            reverse_column: prop.column.map(str::to_string),
            key_column: prop.key_column.map(str::to_string),
        }))
    }
}

fn validate_columns(entity: &PersistentEntity) -> Result<(), MappingError> {
    let mut seen: Vec<&str> = Vec::new();
    for prop in entity.column_properties() {
        let column = prop.column().expect("column property without column");
        if seen.contains(&column) {
            return Err(MappingError::DuplicateColumn {
                entity: entity.name().to_string(),
                column: column.to_string(),
            });
        }
        seen.push(column);
    }
    Ok(())
}

/// Two sibling references into the same child table need distinct
/// back-reference columns to stay distinguishable.
fn validate_sibling_references(entity: &PersistentEntity) -> Result<(), MappingError> {
    let assocs: Vec<_> = entity.associations().collect();
    for (i, (_, a)) in assocs.iter().enumerate() {
        for (_, b) in assocs.iter().skip(i + 1) {
            if a.entity.table() == b.entity.table() && a.reverse_column == b.reverse_column {
                return Err(MappingError::AmbiguousReference {
                    entity: entity.name().to_string(),
                    table: a.entity.table().qualified(),
                });
            }
        }
    }
    Ok(())
}

pub(crate) fn check_identifier(name: &str) -> Result<(), MappingError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MappingError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
