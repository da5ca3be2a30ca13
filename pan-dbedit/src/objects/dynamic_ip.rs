use std::fmt::{self, Display, Formatter};

/// Tag-to-address registrations made through the User-ID channel. They are
/// not part of the persisted configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicIp {
    pub ips: Vec<String>,
    pub tags: Vec<String>,
}

impl DynamicIp {
    /// `ip1,ip2-tagA,tagB`
    pub fn identity(&self) -> String {
        format!("{}-{}", self.ips.join(","), self.tags.join(","))
    }

    /// One `ip-tag` identity per registered pair.
    pub fn pairs(&self) -> impl Iterator<Item = String> + '_ {
        self.ips
            .iter()
            .flat_map(move |ip| self.tags.iter().map(move |tag| format!("{ip}-{tag}")))
    }
}

impl Display for DynamicIp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_pairs() {
        let dip = DynamicIp {
            ips: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            tags: vec!["quarantine".into()],
        };
        assert_eq!(dip.identity(), "10.0.0.1,10.0.0.2-quarantine");
        assert_eq!(
            dip.pairs().collect::<Vec<_>>(),
            vec!["10.0.0.1-quarantine", "10.0.0.2-quarantine"]
        );
    }
}
