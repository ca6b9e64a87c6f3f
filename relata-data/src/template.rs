use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use relata_core::{
    row, AggregateModel, AggregateNode, AssociationKind, ConvertError, Entity, MappingContext,
    NodeValue, SqlValue,
};
use relata_events::{
    AggregateEvent, DeleteEventMode, EventFailurePolicy, EventPublisher, NoopPublisher,
};

use crate::error::DataError;
use crate::load;
use crate::strategy::{DataAccessStrategy, ParentRef};

/// The aggregate persistence engine: saves, loads, and deletes whole object
/// trees across tables.
///
/// The template composes a [`MappingContext`], a [`DataAccessStrategy`], and
/// an [`EventPublisher`]; it owns the traversal order, identity
/// back-propagation, and collection-element key assignment, and nothing
/// else. It performs its multi-statement sequences synchronously,
/// statement by statement, holds no locks, and leaves atomicity to the
/// ambient transaction.
///
/// # Example
///
/// ```ignore
/// let template = AggregateTemplate::new(Arc::new(MappingContext::new()), strategy);
/// let saved = template.save(&list_parent).await?;
/// let reloaded = template.find_by_id::<ListParent>(saved.id.unwrap()).await?;
/// ```
pub struct AggregateTemplate<S, P = NoopPublisher> {
    context: Arc<MappingContext>,
    strategy: S,
    publisher: P,
    failure_policy: EventFailurePolicy,
    delete_events: DeleteEventMode,
}

impl<S: DataAccessStrategy> AggregateTemplate<S, NoopPublisher> {
    pub fn new(context: Arc<MappingContext>, strategy: S) -> Self {
        Self {
            context,
            strategy,
            publisher: NoopPublisher,
            failure_policy: EventFailurePolicy::default(),
            delete_events: DeleteEventMode::default(),
        }
    }
}

impl<S: DataAccessStrategy, P: EventPublisher> AggregateTemplate<S, P> {
    /// Replace the event publisher.
    pub fn with_events<P2: EventPublisher>(self, publisher: P2) -> AggregateTemplate<S, P2> {
        AggregateTemplate {
            context: self.context,
            strategy: self.strategy,
            publisher,
            failure_policy: self.failure_policy,
            delete_events: self.delete_events,
        }
    }

    pub fn event_failure_policy(mut self, policy: EventFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn delete_event_mode(mut self, mode: DeleteEventMode) -> Self {
        self.delete_events = mode;
        self
    }

    pub fn context(&self) -> &Arc<MappingContext> {
        &self.context
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Save a whole aggregate.
    ///
    /// A root without an id is inserted and receives a generated identity;
    /// a root with an id is updated in place while all of its child rows
    /// are deleted and re-inserted (child collections are replaced, never
    /// diffed). Returns a new instance carrying every assigned identity;
    /// the input is not mutated.
    pub async fn save<T: Entity>(&self, root: &T) -> Result<T, DataError> {
        let model = self.context.aggregate_of::<T>()?;
        let root_entity = model.root().clone();
        let id_property = root_entity
            .id_property()
            .expect("aggregate root resolved without identity")
            .name()
            .to_string();
        let id_column = root_entity
            .id_column()
            .expect("aggregate root resolved without id column")
            .to_string();

        let mut tree = root.dehydrate();
        let current_id = match tree.get(&id_property) {
            Some(NodeValue::Value(v)) => v.clone(),
            Some(_) => {
                return Err(ConvertError::KindMismatch {
                    property: id_property.clone(),
                    expected: "scalar",
                }
                .into())
            }
            None => {
                return Err(ConvertError::MissingProperty {
                    property: id_property.clone(),
                }
                .into())
            }
        };
        let update_mode = !current_id.is_null();

        self.publish(AggregateEvent::BeforeSave {
            entity: root_entity.name().to_string(),
            table: root_entity.table().qualified(),
            id: update_mode.then(|| current_id.clone()),
        })
        .await?;

        let mut row = row::node_to_row(&root_entity, &tree)?;
        let root_id = if update_mode {
            debug!(aggregate = root_entity.name(), "replacing aggregate");
            row.remove(&id_column);
            let affected = self.strategy.update(&root_entity, &current_id, row).await?;
            if affected == 0 {
                return Err(DataError::State(format!(
                    "aggregate {} with id {:?} does not exist",
                    root_entity.name(),
                    current_id
                )));
            }
            for path in model.paths().iter().rev() {
                self.strategy.delete_by_parent(path, &current_id).await?;
            }
            current_id
        } else {
            debug!(aggregate = root_entity.name(), "inserting aggregate");
            row.remove(&id_column);
            let generated = self.strategy.insert(model.root_path(), row, None).await?;
            let id = generated.ok_or_else(|| {
                DataError::State(format!(
                    "storage returned no generated key for {}",
                    root_entity.table()
                ))
            })?;
            tree.set_value(&id_property, id.clone());
            id
        };

        self.save_children(&model, None, &mut tree, root_id.clone(), Vec::new())
            .await?;

        self.publish(AggregateEvent::AfterSave {
            entity: root_entity.name().to_string(),
            table: root_entity.table().qualified(),
            id: root_id,
        })
        .await?;

        Ok(T::hydrate(tree)?)
    }

    /// Load a whole aggregate by root identity. An unknown id is a normal
    /// outcome, not an error.
    pub async fn find_by_id<T: Entity>(
        &self,
        id: impl Into<SqlValue>,
    ) -> Result<Option<T>, DataError> {
        let model = self.context.aggregate_of::<T>()?;
        let id = id.into();
        match load::load_aggregate(&self.strategy, &model, &id).await? {
            Some(node) => Ok(Some(T::hydrate(node)?)),
            None => Ok(None),
        }
    }

    /// Delete a whole aggregate. The root must carry its identity.
    pub async fn delete<T: Entity>(&self, root: &T) -> Result<(), DataError> {
        let model = self.context.aggregate_of::<T>()?;
        let id_property = model
            .root()
            .id_property()
            .expect("aggregate root resolved without identity")
            .name()
            .to_string();
        let mut tree = root.dehydrate();
        let id = tree.take_value(&id_property).map_err(DataError::Convert)?;
        if id.is_null() {
            return Err(DataError::MissingId(format!(
                "cannot delete unsaved aggregate {}",
                model.root().name()
            )));
        }
        self.delete_by_id::<T>(id).await
    }

    /// Delete a whole aggregate by root identity: every path's table,
    /// deepest first, the root row last. Idempotent end to end; an unknown
    /// id deletes zero rows at every level without error.
    pub async fn delete_by_id<T: Entity>(
        &self,
        id: impl Into<SqlValue>,
    ) -> Result<(), DataError> {
        let model = self.context.aggregate_of::<T>()?;
        let id = id.into();
        let entity = model.root().name().to_string();
        let root_table = model.root().table().qualified();
        debug!(aggregate = %entity, "deleting aggregate");

        if self.delete_events == DeleteEventMode::PerAggregate {
            self.publish(AggregateEvent::BeforeDelete {
                entity: entity.clone(),
                table: root_table.clone(),
                id: id.clone(),
            })
            .await?;
        }

        for path in model.paths().iter().rev() {
            if self.delete_events == DeleteEventMode::PerPath {
                self.publish(AggregateEvent::BeforeDelete {
                    entity: entity.clone(),
                    table: path.table().qualified(),
                    id: id.clone(),
                })
                .await?;
            }
            self.strategy.delete_by_parent(path, &id).await?;
            if self.delete_events == DeleteEventMode::PerPath {
                self.publish(AggregateEvent::AfterDelete {
                    entity: entity.clone(),
                    table: path.table().qualified(),
                    id: id.clone(),
                })
                .await?;
            }
        }

        if self.delete_events == DeleteEventMode::PerPath {
            self.publish(AggregateEvent::BeforeDelete {
                entity: entity.clone(),
                table: root_table.clone(),
                id: id.clone(),
            })
            .await?;
        }
        self.strategy.delete_by_id(model.root(), &id).await?;
        self.publish(AggregateEvent::AfterDelete {
            entity,
            table: root_table,
            id,
        })
        .await?;
        Ok(())
    }

    pub async fn exists_by_id<T: Entity>(
        &self,
        id: impl Into<SqlValue>,
    ) -> Result<bool, DataError> {
        let model = self.context.aggregate_of::<T>()?;
        self.strategy.exists_by_id(model.root(), &id.into()).await
    }

    /// Row count of the root table.
    pub async fn count<T: Entity>(&self) -> Result<u64, DataError> {
        let model = self.context.aggregate_of::<T>()?;
        self.strategy.count(model.root()).await
    }

    async fn publish(&self, event: AggregateEvent) -> Result<(), DataError> {
        match self.publisher.publish(event).await {
            Ok(()) => Ok(()),
            Err(err) => match self.failure_policy {
                EventFailurePolicy::Ignore => {
                    tracing::warn!(error = %err, "ignoring event publisher failure");
                    Ok(())
                }
                EventFailurePolicy::Fatal => Err(DataError::Event(err)),
            },
        }
    }

    /// Write every child row below `node`, depth-first, parent rows always
    /// preceding the rows that reference them. `anchor` is the id of the
    /// nearest identity-bearing ancestor, `quals` the qualifier tuple
    /// accumulated since it.
    fn save_children<'a>(
        &'a self,
        model: &'a AggregateModel,
        parent: Option<usize>,
        node: &'a mut AggregateNode,
        anchor: SqlValue,
        quals: Vec<SqlValue>,
    ) -> Pin<Box<dyn Future<Output = Result<(), DataError>> + Send + 'a>> {
        Box::pin(async move {
            let child_indices = match parent {
                None => model.root_children(),
                Some(index) => model.children_of(index),
            };
            for &index in child_indices {
                let path = model.path(index);
                let segment = path.last_segment().expect("non-root path without segments");
                let property = segment.property.clone();
                match node.get_mut(&property) {
                    Some(NodeValue::One(child)) => {
                        if let Some(child) = child.as_deref_mut() {
                            self.save_element(model, index, child, &anchor, &quals, None)
                                .await?;
                        }
                    }
                    Some(NodeValue::Many(items)) => {
                        let ordered = matches!(segment.kind, AssociationKind::List);
                        for (position, child) in items.iter_mut().enumerate() {
                            let qual = ordered.then(|| SqlValue::Int(position as i64));
                            self.save_element(model, index, child, &anchor, &quals, qual)
                                .await?;
                        }
                    }
                    Some(NodeValue::Map(entries)) => {
                        for (key, child) in entries.iter_mut() {
                            let key = key.clone();
                            self.save_element(model, index, child, &anchor, &quals, Some(key))
                                .await?;
                        }
                    }
                    Some(NodeValue::Value(_)) => {
                        return Err(ConvertError::KindMismatch {
                            property,
                            expected: "entity-valued",
                        }
                        .into())
                    }
                    None => {
                        return Err(ConvertError::MissingProperty { property }.into());
                    }
                }
            }
            Ok(())
        })
    }

    /// Write one child row, then its own descendants. An identity-bearing
    /// child becomes the anchor for everything below it; an identity-less
    /// child passes anchor and qualifiers through.
    async fn save_element(
        &self,
        model: &AggregateModel,
        index: usize,
        node: &mut AggregateNode,
        anchor: &SqlValue,
        qual_prefix: &[SqlValue],
        own_qual: Option<SqlValue>,
    ) -> Result<(), DataError> {
        let path = model.path(index).clone();
        let leaf = path.leaf();
        let mut row = row::node_to_row(leaf, node)?;

        let mut quals = qual_prefix.to_vec();
        quals.extend(own_qual);
        let parent = ParentRef {
            anchor: anchor.clone(),
            qualifiers: quals.clone(),
        };

        if leaf.has_identity() {
            let id_property = leaf
                .id_property()
                .expect("identity-bearing entity without id property")
                .name()
                .to_string();
            let id_column = leaf
                .id_column()
                .expect("identity-bearing entity without id column")
                .to_string();
            let preset = row.get(&id_column).cloned().unwrap_or(SqlValue::Null);
            if preset.is_null() {
                row.remove(&id_column);
            }
            let generated = self.strategy.insert(&path, row, Some(&parent)).await?;
            let own_id = if preset.is_null() {
                generated.ok_or_else(|| {
                    DataError::State(format!(
                        "storage returned no generated key for {}",
                        path.table()
                    ))
                })?
            } else {
                preset
            };
            node.set_value(&id_property, own_id.clone());
            self.save_children(model, Some(index), node, own_id, Vec::new())
                .await?;
        } else {
            self.strategy.insert(&path, row, Some(&parent)).await?;
            self.save_children(model, Some(index), node, anchor.clone(), quals)
                .await?;
        }
        Ok(())
    }
}
