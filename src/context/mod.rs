//! Recovers entity context from `data-*` annotations.
//!
//! Resolution works on an ancestor chain: the triggering node first, then each
//! parent outward. Every lookup walks the chain independently, so the id and
//! the table may come from different containers.

use crate::error::ContextError;
use crate::models::{
    EditableField, EntityId, EntityRef, ImageAction, ImageAttachment, ImageType,
    NewEntityTemplate, SECTIONS_TABLE,
};

pub const TABLE_ATTR: &str = "data-table";
pub const ID_ATTR: &str = "data-id";
pub const FIELD_ATTR: &str = "data-field";
pub const TYPE_ATTR: &str = "data-type";
pub const ACTION_ATTR: &str = "data-action";
pub const SRC_ATTR: &str = "data-src";
/// Present on an add button when the new record needs link columns.
pub const LINKS_ATTR: &str = "data-links";

/// Form control carrying the image slot on upload forms.
pub const IMAGE_TYPE_CONTROL: &str = "image_type";

/// Anything that can answer attribute lookups.
pub trait Annotated {
    fn annotation(&self, name: &str) -> Option<String>;
}

/// Value of `name` on the closest node of `chain` that carries it.
pub fn nearest<N: Annotated>(chain: &[N], name: &str) -> Option<String> {
    chain.iter().find_map(|n| n.annotation(name))
}

fn parse_id(attribute: &'static str, raw: &str) -> Result<EntityId, ContextError> {
    raw.trim()
        .parse::<EntityId>()
        .map_err(|_| ContextError::InvalidId {
            attribute,
            value: raw.to_string(),
        })
}

fn own(chain: &[impl Annotated], name: &str) -> Option<String> {
    chain.first().and_then(|n| n.annotation(name))
}

pub fn resolve_entity_ref<N: Annotated>(chain: &[N]) -> Result<EntityRef, ContextError> {
    let id = nearest(chain, ID_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: ID_ATTR,
    })?;
    let table = nearest(chain, TABLE_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: TABLE_ATTR,
    })?;

    Ok(EntityRef {
        table,
        id: parse_id(ID_ATTR, &id)?,
    })
}

/// Id of the closest container whose table is `sections`.
pub fn resolve_section_id<N: Annotated>(chain: &[N]) -> Result<EntityId, ContextError> {
    let section = chain
        .iter()
        .find(|n| n.annotation(TABLE_ATTR).as_deref() == Some(SECTIONS_TABLE))
        .ok_or(ContextError::MissingSection)?;

    let id = section
        .annotation(ID_ATTR)
        .ok_or(ContextError::MissingAnnotation { attribute: ID_ATTR })?;
    parse_id(ID_ATTR, &id)
}

/// The field name must sit on the editable node itself.
pub fn resolve_editable_field<N: Annotated>(chain: &[N]) -> Result<EditableField, ContextError> {
    let field = own(chain, FIELD_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: FIELD_ATTR,
    })?;
    Ok(EditableField::new(resolve_entity_ref(chain)?, field))
}

/// Template for an add button: its own table, the enclosing section's id.
pub fn resolve_new_entity<N: Annotated>(chain: &[N]) -> Result<NewEntityTemplate, ContextError> {
    let table = own(chain, TABLE_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: TABLE_ATTR,
    })?;
    let template = NewEntityTemplate::new(resolve_section_id(chain)?, table);

    Ok(if own(chain, LINKS_ATTR).is_some() {
        template.with_links()
    } else {
        template
    })
}

pub fn resolve_image_attachment<N: Annotated>(
    chain: &[N],
) -> Result<ImageAttachment, ContextError> {
    let image_type = own(chain, TYPE_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: TYPE_ATTR,
    })?;
    let image_action = own(chain, ACTION_ATTR).ok_or(ContextError::MissingAnnotation {
        attribute: ACTION_ATTR,
    })?;

    Ok(ImageAttachment {
        entity: resolve_entity_ref(chain)?,
        image_type: ImageType(image_type),
        image_action: ImageAction(image_action),
        image_src: own(chain, SRC_ATTR),
    })
}
