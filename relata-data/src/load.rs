//! Aggregate recomposition: path-by-path queries stitched back into one
//! in-memory tree.

use relata_core::{
    row, AggregateModel, AggregateNode, AssociationKind, ConvertError, NodeValue,
    PersistentPropertyPath, SqlRow, SqlValue,
};

use crate::error::DataError;
use crate::strategy::DataAccessStrategy;

/// One step of a node address inside the tree being composed.
#[derive(Debug, Clone)]
struct Crumb {
    property: String,
    selector: Selector,
}

#[derive(Debug, Clone)]
enum Selector {
    One,
    Index(usize),
    Key(SqlValue),
}

/// Load one aggregate: the root row first, then every path shallow-to-deep,
/// querying child rows by the id of the path's nearest identity-bearing
/// ancestor and attaching each row at the position its qualifier tuple
/// encodes.
pub(crate) async fn load_aggregate<S: DataAccessStrategy>(
    strategy: &S,
    model: &AggregateModel,
    id: &SqlValue,
) -> Result<Option<AggregateNode>, DataError> {
    let root_entity = model.root();
    let Some(root_row) = strategy.select_by_id(root_entity, id).await? else {
        return Ok(None);
    };
    let mut tree = row::row_to_node(root_entity, &root_row)?;

    // Per path, the materialized identity-bearing nodes: their address in
    // the tree and their id. Only paths whose entity bears identity get
    // entries; everything else is addressed through its owner.
    let root_owners = vec![(Vec::new(), id.clone())];
    let mut owners: Vec<Vec<(Vec<Crumb>, SqlValue)>> = vec![Vec::new(); model.paths().len()];

    for (index, path) in model.paths().iter().enumerate() {
        let owner_list = if path.owner_len() == 0 {
            root_owners.clone()
        } else {
            owners[owner_path_index(model, index)].clone()
        };

        let leaf_has_id = path.leaf().has_identity();
        for (owner_address, owner_id) in &owner_list {
            let rows = strategy.select_by_parent(path, owner_id).await?;
            for row in rows {
                let node = row::row_to_node(path.leaf(), &row)?;
                let quals = qualifier_values(path, &row)?;
                let address = attach(&mut tree, owner_address, path, &quals, node)?;
                if leaf_has_id {
                    let own_id = id_of(path, &row)?;
                    owners[index].push((address, own_id));
                }
            }
        }
    }

    Ok(Some(tree))
}

/// Index of the ancestor path that owns this path's rows. Pre-order
/// guarantees it was processed earlier.
fn owner_path_index(model: &AggregateModel, index: usize) -> usize {
    let owner_len = model.path(index).owner_len();
    let mut current = index;
    while model.path(current).depth() > owner_len {
        current = model
            .path(current)
            .parent_index()
            .expect("owner sub-path below the root must exist");
    }
    current
}

fn qualifier_values(
    path: &PersistentPropertyPath,
    row: &SqlRow,
) -> Result<Vec<SqlValue>, DataError> {
    let link = path.link().expect("child path without parent link");
    link.qualifiers
        .iter()
        .map(|q| {
            row.get(&q.column).cloned().ok_or_else(|| {
                ConvertError::MissingColumn {
                    table: path.table().qualified(),
                    column: q.column.clone(),
                }
                .into()
            })
        })
        .collect()
}

fn id_of(path: &PersistentPropertyPath, row: &SqlRow) -> Result<SqlValue, DataError> {
    let column = path
        .leaf()
        .id_column()
        .expect("identity-bearing entity without id column");
    row.get(column).cloned().ok_or_else(|| {
        ConvertError::MissingColumn {
            table: path.table().qualified(),
            column: column.to_string(),
        }
        .into()
    })
}

/// Attach `node` below the owner at `owner_address`, walking the hops
/// between the id-owner and the path's table while consuming the row's
/// qualifier tuple. Intermediate hops descend into elements attached by
/// earlier (shallower) paths; the final qualifier is the element's own
/// position or key. Returns the new node's address.
fn attach(
    tree: &mut AggregateNode,
    owner_address: &[Crumb],
    path: &PersistentPropertyPath,
    quals: &[SqlValue],
    node: AggregateNode,
) -> Result<Vec<Crumb>, DataError> {
    let hops = path.hops_after_owner();
    debug_assert!(!hops.is_empty());
    let orphan = || -> DataError {
        ConvertError::OrphanRow {
            table: path.table().qualified(),
        }
        .into()
    };

    let mut address = owner_address.to_vec();
    let mut quals = quals.iter();

    // Intermediate hops: locate the structural parent.
    for hop in &hops[..hops.len() - 1] {
        let selector = match hop.kind {
            AssociationKind::One => Selector::One,
            AssociationKind::List => {
                Selector::Index(position_value(hop, quals.next().ok_or_else(orphan)?)?)
            }
            AssociationKind::Map(_) => Selector::Key(quals.next().ok_or_else(orphan)?.clone()),
            // An id-less set element cannot own nested entities, and an
            // id-bearing one starts its own addressing scope.
            AssociationKind::Set => return Err(orphan()),
        };
        address.push(Crumb {
            property: hop.property.clone(),
            selector,
        });
    }

    let parent = node_at(tree, &address).ok_or_else(orphan)?;

    // Final hop: attach at the element's own position or key.
    let hop = hops.last().expect("checked non-empty");
    let property = hop.property.as_str();
    let selector = match (&hop.kind, parent.get_mut(property)) {
        (AssociationKind::One, Some(NodeValue::One(slot))) => {
            if slot.is_some() {
                return Err(ConvertError::DuplicateElement {
                    property: property.to_string(),
                }
                .into());
            }
            *slot = Some(Box::new(node));
            Selector::One
        }
        (AssociationKind::List, Some(NodeValue::Many(items))) => {
            let position = quals.next().ok_or_else(orphan)?;
            let position = position_value(hop, position)?;
            if position != items.len() {
                return Err(ConvertError::InvalidPosition {
                    property: property.to_string(),
                    expected: items.len(),
                    found: SqlValue::Int(position as i64),
                }
                .into());
            }
            items.push(node);
            Selector::Index(position)
        }
        (AssociationKind::Set, Some(NodeValue::Many(items))) => {
            items.push(node);
            Selector::Index(items.len() - 1)
        }
        (AssociationKind::Map(_), Some(NodeValue::Map(entries))) => {
            let key = quals.next().ok_or_else(orphan)?.clone();
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(ConvertError::DuplicateElement {
                    property: property.to_string(),
                }
                .into());
            }
            entries.push((key.clone(), node));
            Selector::Key(key)
        }
        _ => return Err(orphan()),
    };

    address.push(Crumb {
        property: property.to_string(),
        selector,
    });
    Ok(address)
}

fn position_value(
    hop: &relata_core::PathSegment,
    value: &SqlValue,
) -> Result<usize, DataError> {
    match value {
        SqlValue::Int(v) if *v >= 0 => Ok(*v as usize),
        other => Err(ConvertError::InvalidPosition {
            property: hop.property.clone(),
            expected: 0,
            found: other.clone(),
        }
        .into()),
    }
}

fn node_at<'a>(tree: &'a mut AggregateNode, address: &[Crumb]) -> Option<&'a mut AggregateNode> {
    let mut current = tree;
    for crumb in address {
        let entry = current.get_mut(&crumb.property)?;
        current = match (&crumb.selector, entry) {
            (Selector::One, NodeValue::One(Some(child))) => child.as_mut(),
            (Selector::Index(index), NodeValue::Many(items)) => items.get_mut(*index)?,
            (Selector::Key(key), NodeValue::Map(entries)) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, node)| node)?,
            _ => return None,
        };
    }
    Some(current)
}
