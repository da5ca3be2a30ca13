use std::collections::BTreeMap;

use serde::Serialize;

/// Attribute carrying the identity of a PAN-OS `<entry>` element.
pub const NAME_ATTR: &str = "name";
/// Tag used for named list items (`<entry name="...">`).
pub const ENTRY_TAG: &str = "entry";
/// Tag used for plain list items (`<member>value</member>`).
pub const MEMBER_TAG: &str = "member";

/// One element of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create an element with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf element holding `text`.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Create an `<entry name="...">` element.
    pub fn entry(name: impl Into<String>) -> Self {
        let mut node = Self::new(ENTRY_TAG);
        node.attributes.insert(NAME_ATTR.to_string(), name.into());
        node
    }

    /// Value of the `name` attribute, if any.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get(NAME_ATTR).map(String::as_str)
    }

    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn get_child_mut(&mut self, tag: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return the terminal node.
    pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        Some(current)
    }

    pub fn descend_mut(&mut self, path: &[&str]) -> Option<&mut XmlNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child_mut(segment)?;
        }
        Some(current)
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        self.descend(path)?.text.as_deref()
    }

    /// Walk `path`, creating any missing elements, and return the terminal node.
    pub fn ensure_path(&mut self, path: &[&str]) -> &mut XmlNode {
        let mut current = self;
        for segment in path {
            let idx = match current.children.iter().position(|c| c.tag == *segment) {
                Some(idx) => idx,
                None => {
                    current.children.push(XmlNode::new(*segment));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }
        current
    }

    /// Remove every direct child with `tag`. Returns how many were removed.
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.tag != tag);
        before - self.children.len()
    }

    /// Named `<entry>` children in document order.
    pub fn entries(&self) -> impl Iterator<Item = &XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == ENTRY_TAG)
    }

    /// Names of all `<entry>` children in document order.
    pub fn entry_names(&self) -> Vec<String> {
        self.entries()
            .filter_map(|entry| entry.name().map(str::to_string))
            .collect()
    }

    pub fn find_entry(&self, name: &str) -> Option<&XmlNode> {
        self.entries().find(|entry| entry.name() == Some(name))
    }

    pub fn find_entry_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.children
            .iter_mut()
            .find(|child| child.tag == ENTRY_TAG && child.name() == Some(name))
    }

    /// Replace the entry with the same name in place, or append it.
    pub fn upsert_entry(&mut self, entry: XmlNode) {
        let name = entry.name().map(str::to_string);
        let slot = self
            .children
            .iter_mut()
            .find(|child| child.tag == ENTRY_TAG && child.name() == name.as_deref());
        match slot {
            Some(existing) => *existing = entry,
            None => self.children.push(entry),
        }
    }

    /// Remove the named entry. Returns the removed node.
    pub fn remove_entry(&mut self, name: &str) -> Option<XmlNode> {
        let idx = self
            .children
            .iter()
            .position(|child| child.tag == ENTRY_TAG && child.name() == Some(name))?;
        Some(self.children.remove(idx))
    }

    /// Text of every `<member>` child, in document order.
    pub fn members(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|child| child.tag == MEMBER_TAG)
            .filter_map(|child| child.text.clone())
            .collect()
    }

    /// Replace this element's content with one `<member>` per value.
    pub fn set_members<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text = None;
        self.children = values
            .into_iter()
            .map(|value| XmlNode::leaf(MEMBER_TAG, value))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn get_text_walks_nested_path() {
        let mut root = XmlNode::new("config");
        root.ensure_path(&["shared", "address"])
            .children
            .push(XmlNode::leaf("ip-netmask", "10.0.0.1/32"));

        assert_eq!(
            root.get_text(&["shared", "address", "ip-netmask"]),
            Some("10.0.0.1/32")
        );
        assert!(root.get_text(&["shared", "service"]).is_none());
    }

    #[test]
    fn upsert_entry_replaces_by_name() {
        let mut parent = XmlNode::new("address");
        parent.upsert_entry(XmlNode::entry("web"));
        let mut replacement = XmlNode::entry("web");
        replacement.children.push(XmlNode::leaf("fqdn", "example.com"));
        parent.upsert_entry(replacement);
        parent.upsert_entry(XmlNode::entry("db"));

        assert_eq!(parent.entry_names(), vec!["web", "db"]);
        assert_eq!(
            parent.find_entry("web").and_then(|e| e.get_text(&["fqdn"])),
            Some("example.com")
        );
    }

    #[test]
    fn members_round_trip_through_set_members() {
        let mut static_list = XmlNode::new("static");
        static_list.set_members(["a", "b"]);
        assert_eq!(static_list.members(), vec!["a", "b"]);

        static_list.set_members(Vec::<String>::new());
        assert!(static_list.members().is_empty());
    }

    #[test]
    fn remove_entry_returns_removed_node() {
        let mut parent = XmlNode::new("tag");
        parent.upsert_entry(XmlNode::entry("prod"));
        assert!(parent.remove_entry("prod").is_some());
        assert!(parent.remove_entry("prod").is_none());
    }
}
