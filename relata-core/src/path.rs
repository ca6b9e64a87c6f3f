use std::sync::Arc;

use crate::error::MappingError;
use crate::mapping::{
    check_identifier, AssociationKind, PersistentEntity, TableId,
};
use crate::naming::NamingStrategy;
use crate::schema::ScalarType;

/// What a qualifier column of a child table holds.
#[derive(Debug, Clone, PartialEq)]
pub enum QualifierKind {
    /// Zero-based position of an ordered-collection element.
    Position,
    /// Map key, typed per the map's key scalar type.
    Key(ScalarType),
}

/// One qualifier column: a list position or map key discriminator stored in
/// the child table.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifierColumn {
    pub column: String,
    pub kind: QualifierKind,
}

/// How a path's table refers back to its aggregate: the back-reference
/// column holding the nearest identity-bearing ancestor's id, plus one
/// qualifier column per ordered-collection/map hop since that ancestor.
#[derive(Debug, Clone)]
pub struct ParentLink {
    pub back_ref_column: String,
    pub qualifiers: Vec<QualifierColumn>,
}

/// One identity-bearing ancestor level between a path's table and the
/// aggregate root. Deleting a deep table by root id walks this chain with
/// nested sub-selects, so no extra round trips are needed.
#[derive(Debug, Clone)]
pub struct AnchorStep {
    pub table: TableId,
    pub id_column: String,
    pub back_ref_column: String,
}

/// One hop of a path: a named entity-valued property and its target.
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub property: String,
    pub kind: AssociationKind,
    pub entity: Arc<PersistentEntity>,
}

/// An ordered hop sequence from the aggregate root to one entity-valued
/// property. The empty path addresses the root table itself.
///
/// Every multi-table operation is keyed by a path: save walks paths
/// shallow-to-deep (parent rows before the rows that reference them), delete
/// walks the exact reverse.
#[derive(Debug)]
pub struct PersistentPropertyPath {
    segments: Vec<PathSegment>,
    leaf: Arc<PersistentEntity>,
    link: Option<ParentLink>,
    owner_len: usize,
    anchors: Vec<AnchorStep>,
    parent_index: Option<usize>,
}

impl PersistentPropertyPath {
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The entity this path's table stores.
    pub fn leaf(&self) -> &Arc<PersistentEntity> {
        &self.leaf
    }

    pub fn table(&self) -> &TableId {
        self.leaf.table()
    }

    /// Back-reference and qualifier columns; `None` for the root path.
    pub fn link(&self) -> Option<&ParentLink> {
        self.link.as_ref()
    }

    /// Number of segments in the id-owner sub-path (the nearest
    /// identity-bearing ancestor; zero means the root owns this path's
    /// rows directly).
    pub fn owner_len(&self) -> usize {
        self.owner_len
    }

    /// The hops between the id-owner and this path's table, inclusive of
    /// the final hop.
    pub fn hops_after_owner(&self) -> &[PathSegment] {
        &self.segments[self.owner_len..]
    }

    /// Identity-bearing ancestor levels between this path's table and the
    /// root, nearest first; empty when the back-reference targets the root
    /// id itself.
    pub fn anchors(&self) -> &[AnchorStep] {
        &self.anchors
    }

    /// Index of the parent path in the aggregate's path list; `None` when
    /// the parent is the root.
    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    /// Dotted property rendering for diagnostics, e.g. `chain3.chain2`.
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.property.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

pub(crate) struct BuiltPaths {
    pub root_path: Arc<PersistentPropertyPath>,
    pub paths: Vec<Arc<PersistentPropertyPath>>,
    pub root_children: Vec<usize>,
    pub children: Vec<Vec<usize>>,
}

/// Enumerate every path of an aggregate, depth-first, root-to-leaf,
/// deterministic given entity shape.
pub(crate) fn build_paths(
    naming: &dyn NamingStrategy,
    root: &Arc<PersistentEntity>,
) -> Result<BuiltPaths, MappingError> {
    let mut builder = PathBuilder {
        naming,
        paths: Vec::new(),
        root_children: Vec::new(),
        children: Vec::new(),
    };
    builder.walk(root, &[], 0, None, &[], &[], None)?;
    Ok(BuiltPaths {
        root_path: Arc::new(PersistentPropertyPath {
            segments: Vec::new(),
            leaf: root.clone(),
            link: None,
            owner_len: 0,
            anchors: Vec::new(),
            parent_index: None,
        }),
        paths: builder.paths,
        root_children: builder.root_children,
        children: builder.children,
    })
}

struct PathBuilder<'a> {
    naming: &'a dyn NamingStrategy,
    paths: Vec<Arc<PersistentPropertyPath>>,
    root_children: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl PathBuilder<'_> {
    /// `entity` is the node whose associations are enumerated; the other
    /// arguments describe the path leading to it.
    #[allow(clippy::too_many_arguments)]
    fn walk(
        &mut self,
        entity: &Arc<PersistentEntity>,
        segments: &[PathSegment],
        owner_len: usize,
        back_ref: Option<&str>,
        qualifiers: &[QualifierColumn],
        anchors: &[AnchorStep],
        self_index: Option<usize>,
    ) -> Result<(), MappingError> {
        for (prop, assoc) in entity.associations() {
            let child = &assoc.entity;

            // Everything below an id-bearing node is keyed by that node's
            // id; id-less nodes pass their own addressing through.
            let (child_owner_len, child_back_ref, mut child_quals, child_anchors) =
                if entity.has_identity() {
                    let back_ref_column = assoc
                        .reverse_column
                        .clone()
                        .unwrap_or_else(|| {
                            self.naming.reverse_column_name(entity.table().name())
                        });
                    let mut chain = Vec::new();
                    if !segments.is_empty() {
                        chain.push(AnchorStep {
                            table: entity.table().clone(),
                            id_column: entity
                                .id_column()
                                .expect("identity-bearing entity without id column")
                                .to_string(),
                            back_ref_column: back_ref
                                .expect("non-root path without back-reference")
                                .to_string(),
                        });
                        chain.extend(anchors.iter().cloned());
                    }
                    (segments.len(), back_ref_column, Vec::new(), chain)
                } else {
                    (
                        owner_len,
                        back_ref
                            .expect("identity-less entity outside an aggregate")
                            .to_string(),
                        qualifiers.to_vec(),
                        anchors.to_vec(),
                    )
                };

            match &assoc.kind {
                AssociationKind::List => {
                    child_quals.push(QualifierColumn {
                        column: self.key_column(assoc, entity),
                        kind: QualifierKind::Position,
                    });
                }
                AssociationKind::Map(key) => {
                    child_quals.push(QualifierColumn {
                        column: self.key_column(assoc, entity),
                        kind: QualifierKind::Key(*key),
                    });
                }
                AssociationKind::Set => {
                    if !child.has_identity() && child.associations().next().is_some() {
                        return Err(MappingError::SetNesting {
                            entity: child.name().to_string(),
                        });
                    }
                }
                AssociationKind::One => {}
            }

            validate_link_columns(child, &child_back_ref, &child_quals)?;

            let mut child_segments = segments.to_vec();
            child_segments.push(PathSegment {
                property: prop.name().to_string(),
                kind: assoc.kind.clone(),
                entity: child.clone(),
            });

            let index = self.paths.len();
            self.paths.push(Arc::new(PersistentPropertyPath {
                segments: child_segments.clone(),
                leaf: child.clone(),
                link: Some(ParentLink {
                    back_ref_column: child_back_ref.clone(),
                    qualifiers: child_quals.clone(),
                }),
                owner_len: child_owner_len,
                anchors: child_anchors.clone(),
                parent_index: self_index,
            }));
            self.children.push(Vec::new());
            match self_index {
                Some(parent) => self.children[parent].push(index),
                None => self.root_children.push(index),
            }

            self.walk(
                child,
                &child_segments,
                child_owner_len,
                Some(&child_back_ref),
                &child_quals,
                &child_anchors,
                Some(index),
            )?;
        }
        Ok(())
    }

    fn key_column(
        &self,
        assoc: &crate::mapping::Association,
        owner: &PersistentEntity,
    ) -> String {
        assoc
            .key_column
            .clone()
            .unwrap_or_else(|| self.naming.key_column_name(owner.table().name()))
    }
}

/// Back-reference and qualifier columns share the child table with the
/// child's own columns; collisions would corrupt rows.
fn validate_link_columns(
    child: &PersistentEntity,
    back_ref: &str,
    qualifiers: &[QualifierColumn],
) -> Result<(), MappingError> {
    check_identifier(back_ref)?;
    let mut taken: Vec<&str> = child
        .column_properties()
        .filter_map(|p| p.column())
        .collect();
    for name in std::iter::once(back_ref).chain(qualifiers.iter().map(|q| q.column.as_str())) {
        check_identifier(name)?;
        if taken.contains(&name) {
            return Err(MappingError::DuplicateColumn {
                entity: child.name().to_string(),
                column: name.to_string(),
            });
        }
        taken.push(name);
    }
    Ok(())
}
