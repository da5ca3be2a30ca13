//! Adding and removing static group members. Removing members never leaves
//! a group empty; only a delete clears one.

use tracing::{debug, info, warn};

use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::kind::{Namespace, ObjectKind};
use crate::objects::{AddressObject, AddressType, ConfigObject, Protocol, ServiceObject};
use crate::scope::Location;
use crate::tree::{ConfigTree, Push};

pub const ADDRESS_PLACEHOLDER: &str = "placeholder";
pub const SERVICE_PLACEHOLDER: &str = "placeholder-service";
/// Predefined application that stands in for the last removed member.
pub const APPLICATION_FILLER: &str = "ping";

const PLACEHOLDER_DESCRIPTION: &str = "placeholder object for empty groups";

/// What a membership edit changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEdit {
    pub changed: Vec<String>,
    /// Members left alone: already present on add, absent on remove.
    pub skipped: Vec<String>,
    /// `None` when there was nothing to push.
    pub push: Option<Push>,
}

/// Name of the stand-in member for an emptied group of `kind`.
pub fn placeholder_for(kind: ObjectKind) -> Option<&'static str> {
    match kind {
        ObjectKind::AddressGroup => Some(ADDRESS_PLACEHOLDER),
        ObjectKind::ServiceGroup => Some(SERVICE_PLACEHOLDER),
        ObjectKind::ApplicationGroup => Some(APPLICATION_FILLER),
        _ => None,
    }
}

/// The object backing a placeholder member, for kinds that need one.
pub fn placeholder_object(group: ObjectKind) -> Option<ConfigObject> {
    match group {
        ObjectKind::AddressGroup => Some(ConfigObject::Address(AddressObject {
            name: ADDRESS_PLACEHOLDER.to_string(),
            address_type: AddressType::IpNetmask,
            value: "169.254.1.1".to_string(),
            description: Some(PLACEHOLDER_DESCRIPTION.to_string()),
            tag: Vec::new(),
        })),
        ObjectKind::ServiceGroup => Some(ConfigObject::Service(ServiceObject {
            name: SERVICE_PLACEHOLDER.to_string(),
            protocol: Protocol::Tcp,
            source_port: None,
            destination_port: "0".to_string(),
            description: Some(PLACEHOLDER_DESCRIPTION.to_string()),
            tag: Vec::new(),
        })),
        _ => None,
    }
}

/// Members of a group object, or `Unsupported` for dynamic address groups.
fn static_members<'o>(
    group: &'o mut ConfigObject,
    location: &Location,
) -> Result<&'o mut Vec<String>, DeviceError> {
    let name = group.name().to_string();
    group.members_mut().ok_or_else(|| {
        DeviceError::Unsupported(format!(
            "'{name}' in {location} is a dynamic group and has no static members"
        ))
    })
}

pub fn add_members<D: DeviceClient>(
    tree: &mut ConfigTree<'_, D>,
    location: &Location,
    kind: ObjectKind,
    name: &str,
    members: &[String],
    description: Option<&str>,
) -> Result<GroupEdit, DeviceError> {
    let mut group = tree.locate(location, kind, name)?;
    let current = static_members(&mut group, location)?;

    let mut edit = GroupEdit {
        changed: Vec::new(),
        skipped: Vec::new(),
        push: None,
    };
    for member in members {
        if current.contains(member) {
            warn!(%location, group = name, member = %member, "member already in group, skipping");
            edit.skipped.push(member.clone());
        } else {
            current.push(member.clone());
            edit.changed.push(member.clone());
        }
    }
    if edit.changed.is_empty() {
        return Ok(edit);
    }

    // Address and service placeholders only; an application group keeps `ping`.
    if let Some(placeholder) = match kind {
        ObjectKind::AddressGroup => Some(ADDRESS_PLACEHOLDER),
        ObjectKind::ServiceGroup => Some(SERVICE_PLACEHOLDER),
        _ => None,
    } {
        if current.len() > 1 {
            current.retain(|member| member != placeholder);
        }
    }
    describe(&mut group, description);

    let push = tree.create(location, group)?;
    if push == Push::Live {
        info!(%location, group = name, added = ?edit.changed, "members added");
    }
    edit.push = Some(push);
    Ok(edit)
}

pub fn remove_members<D: DeviceClient>(
    tree: &mut ConfigTree<'_, D>,
    location: &Location,
    kind: ObjectKind,
    name: &str,
    members: &[String],
    description: Option<&str>,
) -> Result<GroupEdit, DeviceError> {
    let mut group = tree.locate(location, kind, name)?;
    let current = static_members(&mut group, location)?;

    let mut edit = GroupEdit {
        changed: Vec::new(),
        skipped: Vec::new(),
        push: None,
    };
    for member in members {
        match current.iter().position(|m| m == member) {
            Some(index) => {
                current.remove(index);
                edit.changed.push(member.clone());
            }
            None => {
                warn!(%location, group = name, member = %member, "member not in group, skipping");
                edit.skipped.push(member.clone());
            }
        }
    }
    if edit.changed.is_empty() {
        return Ok(edit);
    }

    let mut filled = false;
    if current.is_empty() {
        if let Some(filler) = placeholder_for(kind) {
            current.push(filler.to_string());
            filled = true;
            info!(%location, group = name, placeholder = filler, "group emptied, inserting placeholder");
        }
    }
    describe(&mut group, description);
    if filled {
        ensure_placeholder(tree, location, kind)?;
    }

    let push = tree.apply(location, group)?;
    if push == Push::Live {
        info!(%location, group = name, removed = ?edit.changed, "members removed");
    }
    edit.push = Some(push);
    Ok(edit)
}

/// Make sure the placeholder object for `group` kind exists at `location`:
/// the cache first, then live names here and in the parent scope, and only
/// then create it.
pub fn ensure_placeholder<D: DeviceClient>(
    tree: &mut ConfigTree<'_, D>,
    location: &Location,
    group: ObjectKind,
) -> Result<(), DeviceError> {
    let Some(object) = placeholder_object(group) else {
        return Ok(());
    };
    let kind = object.kind();
    if tree.find(location, kind, object.name()).is_some() {
        return Ok(());
    }
    let namespace: Namespace = kind.namespace(None);
    let mut scopes = vec![location.scope.clone()];
    scopes.extend(location.scope.parent());
    for scope in &scopes {
        if tree.device().names(scope, namespace)?.contains(object.name()) {
            return Ok(());
        }
    }
    info!(%location, name = object.name(), "creating placeholder object");
    tree.create(location, object)?;
    Ok(())
}

/// Empty a static group on the device ahead of deleting it. Dynamic address
/// groups and groups that are already empty are left alone.
pub fn clear_members<D: DeviceClient>(
    tree: &mut ConfigTree<'_, D>,
    location: &Location,
    kind: ObjectKind,
    name: &str,
) -> Result<Option<Push>, DeviceError> {
    let mut group = tree.locate(location, kind, name)?;
    let cleared = match group.members_mut() {
        Some(members) if !members.is_empty() => std::mem::take(members),
        _ => return Ok(None),
    };
    let push = tree.apply(location, group)?;
    debug!(%location, %kind, group = name, members = cleared.len(), "group emptied before delete");
    Ok(Some(push))
}

/// Address groups carry the row's audit description; other groups have none.
fn describe(group: &mut ConfigObject, description: Option<&str>) {
    if let (ConfigObject::AddressGroup(group), Some(text)) = (group, description) {
        group.description = Some(text.to_string());
    }
}
